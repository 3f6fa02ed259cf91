use serde::{Deserialize, Serialize};

use crate::model::card::User;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checklist {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(alias = "title", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub items: Vec<ChecklistItem>,
}

/// A checklist item. The API is inconsistent about which key carries the
/// label and which carries the completion flag, so all observed variants are
/// modeled and resolved by `label()` / `is_done()`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChecklistItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checked: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_checked: Option<bool>,
    #[serde(alias = "due", skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
}

impl ChecklistItem {
    /// First present of name/title/text, else a fixed placeholder.
    pub fn label(&self) -> &str {
        self.name
            .as_deref()
            .or(self.title.as_deref())
            .or(self.text.as_deref())
            .unwrap_or("Unnamed item")
    }

    /// Completion is flagged under any of three keys.
    pub fn is_done(&self) -> bool {
        [self.checked, self.completed, self.is_checked]
            .into_iter()
            .flatten()
            .any(|flag| flag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item() -> ChecklistItem {
        ChecklistItem {
            name: None,
            title: None,
            text: None,
            checked: None,
            completed: None,
            is_checked: None,
            due_date: None,
            user: None,
        }
    }

    #[test]
    fn label_first_present_wins() {
        let mut it = item();
        it.title = Some("from title".into());
        it.text = Some("from text".into());
        assert_eq!(it.label(), "from title");
        it.name = Some("from name".into());
        assert_eq!(it.label(), "from name");
    }

    #[test]
    fn label_falls_back_to_placeholder() {
        assert_eq!(item().label(), "Unnamed item");
    }

    #[test]
    fn done_is_disjunction_of_flags() {
        assert!(!item().is_done());
        let mut it = item();
        it.completed = Some(true);
        assert!(it.is_done());
        let mut it = item();
        it.checked = Some(false);
        it.is_checked = Some(true);
        assert!(it.is_done());
        let mut it = item();
        it.checked = Some(false);
        assert!(!it.is_done());
    }
}
