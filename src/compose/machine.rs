//! Step machine shared by the post draft and template build flows
//!
//! Template build:
//! `CollectingCategory → CollectingSubcategory → CollectingName → CollectingText
//!  → CollectingPhotoOrSkip → CollectingButtonLabel → CollectingButtonUrl → ButtonMenu`
//!
//! Post draft:
//! `CollectingText → CollectingPhotoOrSkip → Idle`, with the button loop
//! entered from `Idle` and `ButtonMenu.finish` returning to `Idle`.
//!
//! Every rejected input leaves the composer exactly as it was.

use super::draft::Draft;
use crate::core::error::AppError;
use crate::core::validation::{validate_button_url, validate_label, validate_name};
use crate::storage::{LinkButton, TemplateEntry, TemplatePath};

/// Text that skips the photo step, or finishes at the button label step
pub const SKIP_SENTINEL: &str = "0";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    PostDraft,
    TemplateBuild,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    CollectingCategory,
    CollectingSubcategory,
    CollectingName,
    CollectingText,
    CollectingPhotoOrSkip,
    /// Post draft only: buttons are optional, waiting for a menu choice
    Idle,
    CollectingButtonLabel,
    CollectingButtonUrl { label: String },
    ButtonMenu,
}

/// Menu buttons understood by the machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
    AddButton,
    AddToRow,
    NewRow,
    Finish,
    AddPhoto,
    RemovePhoto,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Text(String),
    Photo(String),
    Choice(Choice),
}

#[derive(Debug)]
pub enum Outcome {
    /// Advanced (or stayed, for idempotent choices); prompt for this step
    Prompt(Step),
    /// Input rejected, nothing changed; re-prompt with the error
    Retry(AppError),
    /// Template build finished; the caller persists it
    Complete { path: TemplatePath, entry: TemplateEntry },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Composer {
    flow: Flow,
    step: Step,
    draft: Draft,
    category: Option<String>,
    subcategory: Option<String>,
    name: Option<String>,
}

impl Composer {
    pub fn post() -> Self {
        Self::with_step(Flow::PostDraft, Step::CollectingText)
    }

    pub fn template() -> Self {
        Self::with_step(Flow::TemplateBuild, Step::CollectingCategory)
    }

    fn with_step(flow: Flow, step: Step) -> Self {
        Self {
            flow,
            step,
            draft: Draft::new(),
            category: None,
            subcategory: None,
            name: None,
        }
    }

    pub fn flow(&self) -> Flow {
        self.flow
    }

    pub fn step(&self) -> &Step {
        &self.step
    }

    pub fn draft(&self) -> &Draft {
        &self.draft
    }

    /// Taxonomy collected so far, if complete
    pub fn path(&self) -> Option<TemplatePath> {
        match (&self.category, &self.subcategory, &self.name) {
            (Some(c), Some(s), Some(n)) => Some(TemplatePath::new(c, s, n)),
            _ => None,
        }
    }

    /// Commits the open row and returns the entry to dispatch.
    /// The draft itself is kept until the caller confirms delivery.
    pub fn prepare_dispatch(&mut self) -> TemplateEntry {
        self.draft.close_row();
        self.draft.to_entry()
    }

    pub fn apply(&mut self, input: Input) -> Outcome {
        match self.transition(input) {
            Ok(outcome) => outcome,
            Err(e) => Outcome::Retry(e),
        }
    }

    fn advance(&mut self, step: Step) -> Result<Outcome, AppError> {
        self.step = step.clone();
        Ok(Outcome::Prompt(step))
    }

    /// Step after the photo question
    fn after_photo(&self) -> Step {
        match self.flow {
            Flow::PostDraft => Step::Idle,
            Flow::TemplateBuild => Step::CollectingButtonLabel,
        }
    }

    fn transition(&mut self, input: Input) -> Result<Outcome, AppError> {
        match (self.step.clone(), input) {
            (Step::CollectingCategory, Input::Text(raw)) => {
                self.category = Some(validate_name(&raw, "Category")?);
                self.advance(Step::CollectingSubcategory)
            }
            (Step::CollectingSubcategory, Input::Text(raw)) => {
                self.subcategory = Some(validate_name(&raw, "Subcategory")?);
                self.advance(Step::CollectingName)
            }
            (Step::CollectingName, Input::Text(raw)) => {
                self.name = Some(validate_name(&raw, "Template name")?);
                self.advance(Step::CollectingText)
            }
            (Step::CollectingText, Input::Text(raw)) => {
                if raw.trim().is_empty() {
                    return Err(AppError::Validation("Post text must not be empty".to_string()));
                }
                self.draft.text = raw;
                self.advance(Step::CollectingPhotoOrSkip)
            }

            (Step::CollectingPhotoOrSkip, Input::Photo(file_id)) => {
                self.draft.photo = Some(file_id);
                self.advance(self.after_photo())
            }
            (Step::CollectingPhotoOrSkip, Input::Text(raw)) if raw.trim() == SKIP_SENTINEL => {
                self.advance(self.after_photo())
            }
            (Step::CollectingPhotoOrSkip, _) => Err(AppError::Validation(format!(
                "Send a photo or {} to skip",
                SKIP_SENTINEL
            ))),

            (Step::Idle, Input::Choice(Choice::AddButton)) => self.advance(Step::CollectingButtonLabel),
            (Step::Idle, Input::Choice(Choice::NewRow)) => {
                self.draft.close_row();
                self.advance(Step::Idle)
            }
            (Step::Idle, Input::Choice(Choice::AddPhoto)) => self.advance(Step::CollectingPhotoOrSkip),
            (Step::Idle, Input::Choice(Choice::RemovePhoto)) => {
                self.draft.photo = None;
                self.advance(Step::Idle)
            }

            (Step::CollectingButtonLabel, Input::Text(raw)) if raw.trim() == SKIP_SENTINEL => self.finish(),
            (Step::CollectingButtonLabel, Input::Text(raw)) => {
                let label = validate_label(&raw)?;
                self.advance(Step::CollectingButtonUrl { label })
            }
            (Step::CollectingButtonUrl { label }, Input::Text(raw)) => {
                let url = validate_button_url(&raw)?;
                self.draft.push_button(LinkButton::new(label, url));
                self.advance(Step::ButtonMenu)
            }

            (Step::ButtonMenu, Input::Choice(Choice::AddToRow)) => self.advance(Step::CollectingButtonLabel),
            (Step::ButtonMenu, Input::Choice(Choice::NewRow)) => {
                self.draft.close_row();
                self.advance(Step::CollectingButtonLabel)
            }
            (Step::ButtonMenu, Input::Choice(Choice::Finish)) => self.finish(),

            (step, input) => Err(AppError::Validation(unexpected_input_message(&step, &input))),
        }
    }

    /// Closes the open row. Template builds complete and stay on the button
    /// menu so a failed save can be retried; post drafts return to `Idle`.
    fn finish(&mut self) -> Result<Outcome, AppError> {
        match self.flow {
            Flow::PostDraft => {
                self.draft.close_row();
                self.advance(Step::Idle)
            }
            Flow::TemplateBuild => {
                let path = self
                    .path()
                    .ok_or_else(|| AppError::Validation("Template placement is incomplete".to_string()))?;
                self.draft.close_row();
                self.step = Step::ButtonMenu;
                Ok(Outcome::Complete {
                    path,
                    entry: self.draft.to_entry(),
                })
            }
        }
    }
}

fn unexpected_input_message(step: &Step, input: &Input) -> String {
    match (step, input) {
        (_, Input::Choice(_)) => "This button is not available right now".to_string(),
        (Step::ButtonMenu | Step::Idle, _) => "Use the buttons below the message".to_string(),
        (Step::CollectingButtonUrl { .. }, _) => "Send the button link as text".to_string(),
        _ => "Send text for this step".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn text(s: &str) -> Input {
        Input::Text(s.to_string())
    }

    fn at_url_step() -> Composer {
        let mut c = Composer::post();
        c.apply(text("Hello"));
        c.apply(text("0"));
        c.apply(Input::Choice(Choice::AddButton));
        c.apply(text("Buy"));
        c
    }

    #[test]
    fn test_invalid_url_keeps_state() {
        let mut c = at_url_step();
        let before = c.clone();
        assert!(matches!(c.apply(text("ftp://x")), Outcome::Retry(AppError::Validation(_))));
        assert_eq!(c, before);
        assert_eq!(c.step(), &Step::CollectingButtonUrl { label: "Buy".into() });
    }

    #[test]
    fn test_valid_url_appends_to_open_row() {
        let mut c = at_url_step();
        assert!(matches!(c.apply(text("https://x")), Outcome::Prompt(Step::ButtonMenu)));
        assert_eq!(c.draft().open_row(), &[LinkButton::new("Buy", "https://x")]);
    }

    #[test]
    fn test_photo_step_rejects_other_text() {
        let mut c = Composer::post();
        c.apply(text("Hello"));
        assert!(matches!(c.apply(text("later")), Outcome::Retry(_)));
        assert_eq!(c.step(), &Step::CollectingPhotoOrSkip);
        assert!(matches!(c.apply(Input::Photo("AgAD".into())), Outcome::Prompt(Step::Idle)));
        assert_eq!(c.draft().photo.as_deref(), Some("AgAD"));
    }

    #[test]
    fn test_skip_keeps_existing_photo() {
        let mut c = Composer::post();
        c.apply(text("Hello"));
        c.apply(Input::Photo("first".into()));
        c.apply(Input::Choice(Choice::AddPhoto));
        assert!(matches!(c.apply(text("0")), Outcome::Prompt(Step::Idle)));
        assert_eq!(c.draft().photo.as_deref(), Some("first"));
        c.apply(Input::Choice(Choice::RemovePhoto));
        assert_eq!(c.draft().photo, None);
    }

    #[test]
    fn test_template_build_matrix() {
        let mut c = Composer::template();
        for s in ["Game", "Cheat", "Promo", "Hello", "0", "Buy", "https://shop.example"] {
            assert!(matches!(c.apply(text(s)), Outcome::Prompt(_)), "step input {}", s);
        }
        c.apply(Input::Choice(Choice::NewRow));
        c.apply(text("Info"));
        c.apply(text("https://info.example"));

        match c.apply(Input::Choice(Choice::Finish)) {
            Outcome::Complete { path, entry } => {
                assert_eq!(path, TemplatePath::new("Game", "Cheat", "Promo"));
                assert_eq!(entry.text, "Hello");
                assert_eq!(
                    entry.buttons,
                    vec![
                        vec![LinkButton::new("Buy", "https://shop.example")],
                        vec![LinkButton::new("Info", "https://info.example")],
                    ]
                );
            }
            other => panic!("expected completion, got {:?}", other),
        }
        assert_eq!(c.step(), &Step::ButtonMenu);
    }

    #[test]
    fn test_zero_label_finishes_keeping_buttons() {
        let mut c = Composer::template();
        for s in ["Game", "Cheat", "Promo", "Hello", "0", "Buy", "https://shop.example"] {
            c.apply(text(s));
        }
        c.apply(Input::Choice(Choice::AddToRow));
        match c.apply(text("0")) {
            Outcome::Complete { entry, .. } => assert_eq!(entry.button_count(), 1),
            other => panic!("expected completion, got {:?}", other),
        }
    }

    #[test]
    fn test_post_finish_returns_to_idle() {
        let mut c = at_url_step();
        c.apply(text("https://x"));
        assert!(matches!(c.apply(Input::Choice(Choice::Finish)), Outcome::Prompt(Step::Idle)));
        assert_eq!(c.draft().open_row().len(), 0);
        assert_eq!(c.prepare_dispatch().buttons, vec![vec![LinkButton::new("Buy", "https://x")]]);
    }

    #[test]
    fn test_blank_names_rejected() {
        let mut c = Composer::template();
        assert!(matches!(c.apply(text("   ")), Outcome::Retry(_)));
        assert_eq!(c.step(), &Step::CollectingCategory);
    }

    #[test]
    fn test_choice_out_of_place_is_rejected() {
        let mut c = Composer::template();
        let before = c.clone();
        assert!(matches!(c.apply(Input::Choice(Choice::Finish)), Outcome::Retry(_)));
        assert_eq!(c, before);
    }
}
