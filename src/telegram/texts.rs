//! User-facing strings and small display helpers

use teloxide::utils::html;

use crate::compose::{Composer, Flow, Step, SKIP_SENTINEL};
use crate::storage::{ActorId, ChannelRef};

pub const DENIED: &str = "⛔️ Access is restricted to admins.";
pub const MAIN_MENU: &str = "🏠 <b>Main menu</b>\nChoose an action:";
pub const CANCELLED: &str = "❎ Cancelled.";
pub const USE_MENU: &str = "ℹ️ Use the menu buttons. /start opens the main menu.";
pub const SAVED: &str = "✅ Template saved.";
pub const SENT: &str = "✅ Sent to the channel.";
pub const NO_TEMPLATES: &str = "📭 You have no templates yet.";
pub const NOT_CONNECTED: &str = "not connected";
pub const TEST_POST: &str = "✅ Test: the bot can post here.";

pub const PROMPT_FORWARD: &str = "📨 Forward any post from your channel here.";
pub const PROMPT_USERNAME: &str = "✍️ Send the channel username, starting with @.";
pub const PROMPT_ADMIN_ADD: &str = "➕ Send the numeric Telegram id of the new admin.";
pub const PROMPT_ADMIN_REMOVE: &str = "➖ Send the numeric Telegram id of the admin to remove.";
pub const PROMPT_IMPORT: &str = "📥 Send a .json file with templates.";

pub const NOT_A_CHANNEL: &str = "❌ That is not a channel. Try again.";
pub const NEED_AT: &str = "❌ The username must start with @. Try again.";
pub const NEED_NUMERIC_ID: &str = "❌ The id must be a number. Try again.";
pub const NEED_DOCUMENT: &str = "❌ Send the templates as a .json document.";

/// Escapes operator-provided names for HTML parse mode
pub fn escape(raw: &str) -> String {
    html::escape(raw)
}

/// Shortens a label to `max` characters, marking the cut
pub fn truncate_label(raw: &str, max: usize) -> String {
    if raw.chars().count() <= max {
        return raw.to_string();
    }
    let mut out: String = raw.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}

pub fn channel_label(channel: Option<&ChannelRef>) -> String {
    channel.map(ChannelRef::label).unwrap_or_else(|| NOT_CONNECTED.to_string())
}

/// Prompt for the composer's current step
pub fn step_prompt(composer: &Composer) -> String {
    match composer.step() {
        Step::CollectingCategory => "📂 Enter the category name:".to_string(),
        Step::CollectingSubcategory => "📁 Enter the subcategory name:".to_string(),
        Step::CollectingName => "🏷 Enter the template name:".to_string(),
        Step::CollectingText => "📝 Send the post text.".to_string(),
        Step::CollectingPhotoOrSkip => format!("🖼 Send a photo, or {} to skip.", SKIP_SENTINEL),
        Step::Idle => draft_summary(composer),
        Step::CollectingButtonLabel => match composer.flow() {
            Flow::TemplateBuild => format!("🔘 Enter the button text, or {} to finish.", SKIP_SENTINEL),
            Flow::PostDraft => format!("🔘 Enter the button text, or {} to go back.", SKIP_SENTINEL),
        },
        Step::CollectingButtonUrl { label } => {
            format!("🔗 Send the link for «{}» (http:// or https://).", escape(label))
        }
        Step::ButtonMenu => format!(
            "🔘 Buttons so far:\n<code>{}</code>\n\nAdd to this row, start a new row, or finish.",
            escape(&composer.draft().render_matrix())
        ),
    }
}

/// Idle screen of a post draft
pub fn draft_summary(composer: &Composer) -> String {
    let draft = composer.draft();
    let photo = if draft.photo.is_some() { "yes" } else { "no" };
    format!(
        "📝 <b>Draft</b>\nPhoto: {}\nButtons:\n<code>{}</code>\n\nPreview it or send it to the channel.",
        photo,
        escape(&draft.render_matrix())
    )
}

pub fn admins_listing(admins: &[ActorId], owner: Option<ActorId>) -> String {
    if admins.is_empty() {
        return "👥 No admins.".to_string();
    }
    let lines: Vec<String> = admins
        .iter()
        .map(|id| {
            if Some(*id) == owner {
                format!("• <code>{}</code> (owner)", id)
            } else {
                format!("• <code>{}</code>", id)
            }
        })
        .collect();
    format!("👥 <b>Admins</b>\n{}", lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_label() {
        assert_eq!(truncate_label("short", 10), "short");
        assert_eq!(truncate_label("abcdefghij", 5), "abcd…");
        assert_eq!(truncate_label("привет мир", 4).chars().count(), 4);
    }

    #[test]
    fn test_admins_listing_tags_owner() {
        let text = admins_listing(&[1, 2], Some(2));
        assert!(text.contains("<code>2</code> (owner)"));
        assert!(!text.contains("<code>1</code> (owner)"));
    }

    #[test]
    fn test_escape_names() {
        assert_eq!(escape("<b>&"), "&lt;b&gt;&amp;");
    }
}
