//! Keyboard builders shared by several screens

use super::actions::{buttons, compose, menu, owner, NOOP};
use super::transport::{KeyButton, Keyboard};
use crate::compose::{Composer, Flow, Step};
use crate::core::Role;
use crate::storage::LinkButton;

pub fn back_to_main() -> KeyButton {
    KeyButton::callback("🏠 Main menu", menu::BACK)
}

pub fn back(data: impl Into<String>) -> KeyButton {
    KeyButton::callback("⬅️ Back", data)
}

pub fn main_menu(role: Role, channel_label: &str) -> Keyboard {
    let mut keyboard = Keyboard::new()
        .button(KeyButton::callback("📝 Create post", menu::CREATE))
        .button(KeyButton::callback("📚 Ready posts", menu::READY))
        .button(KeyButton::callback("🗂 Manage templates", menu::MANAGE))
        .button(KeyButton::callback(format!("⚙️ Channel: {}", channel_label), menu::SETTINGS));
    if role.is_owner() {
        keyboard = keyboard.row(vec![
            KeyButton::callback("👑 Admins & channels", owner::PANEL),
            KeyButton::callback("🧾 Audit log", owner::AUDIT),
        ]);
    }
    keyboard
}

/// URL buttons of a post, as they appear under it
pub fn post_buttons(rows: &[Vec<LinkButton>]) -> Option<Keyboard> {
    let keyboard = rows.iter().fold(Keyboard::new(), |kb, row| {
        kb.row(row.iter().map(|b| KeyButton::url(&b.label, &b.url)).collect())
    });
    (!keyboard.is_empty()).then_some(keyboard)
}

/// Keyboard attached to a composer prompt, if the step has one
pub fn for_step(composer: &Composer) -> Keyboard {
    match composer.step() {
        Step::Idle => Keyboard::new()
            .row(vec![
                KeyButton::callback("➕ Add button", compose::ADD_BUTTON),
                KeyButton::callback("↩️ New row", compose::NEW_ROW),
            ])
            .row(photo_toggle(composer.draft().photo.is_some()))
            .row(vec![
                KeyButton::callback("👁 Preview", compose::PREVIEW),
                KeyButton::callback("📤 Send to channel", compose::SEND),
            ])
            .button(back_to_main()),
        Step::ButtonMenu => {
            let finish = match composer.flow() {
                Flow::TemplateBuild => "💾 Save template",
                Flow::PostDraft => "✅ Done",
            };
            Keyboard::new()
                .row(vec![
                    KeyButton::callback("➕ Add to row", buttons::ADD_TO_ROW),
                    KeyButton::callback("↩️ New row", buttons::NEW_ROW),
                ])
                .button(KeyButton::callback(finish, buttons::FINISH))
                .button(back_to_main())
        }
        _ => Keyboard::new().button(back_to_main()),
    }
}

fn photo_toggle(has_photo: bool) -> Vec<KeyButton> {
    if has_photo {
        vec![KeyButton::callback("🗑 Remove photo", compose::REMOVE_PHOTO)]
    } else {
        vec![KeyButton::callback("🖼 Add photo", compose::ADD_PHOTO)]
    }
}

/// Inert page indicator
pub fn page_indicator(number: usize, total_pages: usize) -> KeyButton {
    KeyButton::callback(format!("{}/{}", number + 1, total_pages), NOOP)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owner_gets_extra_row() {
        let admin = main_menu(Role::Admin, "not connected");
        let full = main_menu(Role::Owner, "News (-100)");
        assert_eq!(full.rows.len(), admin.rows.len() + 1);
        assert!(full.callback_data().contains(&owner::AUDIT));
        assert!(!admin.callback_data().contains(&owner::AUDIT));
    }

    #[test]
    fn test_post_buttons_empty_is_none() {
        assert!(post_buttons(&[]).is_none());
        let kb = post_buttons(&[vec![LinkButton::new("Buy", "https://shop.example")]]).unwrap();
        assert_eq!(kb.rows[0][0], KeyButton::url("Buy", "https://shop.example"));
    }
}
