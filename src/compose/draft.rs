use crate::storage::{LinkButton, TemplateEntry};

/// Post under construction: text, optional photo and a button grid whose
/// last row may still be open.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Draft {
    pub text: String,
    pub photo: Option<String>,
    rows: Vec<Vec<LinkButton>>,
    open_row: Vec<LinkButton>,
}

impl Draft {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends to the open row without closing it.
    pub fn push_button(&mut self, button: LinkButton) {
        self.open_row.push(button);
    }

    /// Commits the open row to the matrix. An empty row is dropped.
    pub fn close_row(&mut self) {
        if !self.open_row.is_empty() {
            self.rows.push(std::mem::take(&mut self.open_row));
        }
    }

    pub fn open_row(&self) -> &[LinkButton] {
        &self.open_row
    }

    /// Committed rows followed by the open row, if it has buttons
    pub fn matrix(&self) -> Vec<Vec<LinkButton>> {
        let mut rows = self.rows.clone();
        if !self.open_row.is_empty() {
            rows.push(self.open_row.clone());
        }
        rows
    }

    pub fn button_count(&self) -> usize {
        self.rows.iter().map(Vec::len).sum::<usize>() + self.open_row.len()
    }

    /// Entry with the open row committed
    pub fn to_entry(&self) -> TemplateEntry {
        TemplateEntry {
            text: self.text.clone(),
            photo: self.photo.clone(),
            buttons: self.matrix(),
        }
    }

    /// Text sketch of the button layout, one line per row
    pub fn render_matrix(&self) -> String {
        if self.button_count() == 0 {
            return "(no buttons)".to_string();
        }
        self.matrix()
            .iter()
            .map(|row| {
                row.iter()
                    .map(|b| format!("[{}]", b.label))
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}
