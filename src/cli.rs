use clap::{Parser, Subcommand};

use crate::storage::ActorId;

#[derive(Parser)]
#[command(name = "chanpost")]
#[command(author, version, about = "Telegram bot for composing and publishing channel posts", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the bot (long polling)
    Run,

    /// Load the storage document, migrate it to the current layout and persist it
    Migrate,

    /// Print an actor's template tree as JSON
    Export {
        /// Telegram id of the actor
        #[arg(long)]
        actor: ActorId,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_subcommands() {
        let cli = Cli::try_parse_from(["chanpost"]).unwrap();
        assert!(cli.command.is_none());

        let cli = Cli::try_parse_from(["chanpost", "export", "--actor", "123456"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Export { actor: 123456 })));

        let cli = Cli::try_parse_from(["chanpost", "export", "--actor", "-100123456"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Export { actor: -100123456 })));

        assert!(Cli::try_parse_from(["chanpost", "export"]).is_err());
    }
}
