use serde::{Deserialize, Serialize};

use crate::model::attachment::CardFile;
use crate::model::checklist::{Checklist, ChecklistItem};

/// Member role type the Kaiten API uses for "responsible" members.
pub const RESPONSIBLE_ROLE: i64 = 2;

/// A Kaiten card as returned by `GET /cards/{id}`.
///
/// Every optional field is genuinely optional in API responses; absent
/// collections are treated as empty, never as an error. Requests always send
/// `title`; some API responses use `name` instead, which the alias folds in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Card {
    pub id: i64,
    #[serde(alias = "name")]
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<User>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<CardStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimate: Option<f64>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub card_type: Option<CardType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub board: Option<Board>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<Column>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lane: Option<Lane>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub members: Option<Vec<Member>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checklists: Option<Vec<Checklist>>,
    /// Flat checklist shape some responses use instead of `checklists`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checklist_items: Option<Vec<ChecklistItem>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub files: Option<Vec<CardFile>>,
    #[serde(default)]
    pub children_count: i64,
    #[serde(default)]
    pub children_done: i64,
}

impl Card {
    /// Members ordered for display: responsible members first, stable otherwise.
    pub fn members_for_display(&self) -> Vec<&Member> {
        let members = match &self.members {
            Some(m) if !m.is_empty() => m,
            _ => return Vec::new(),
        };
        let mut ordered: Vec<&Member> = Vec::with_capacity(members.len());
        ordered.extend(members.iter().filter(|m| m.is_responsible()));
        ordered.extend(members.iter().filter(|m| !m.is_responsible()));
        ordered
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardStatus {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardType {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub letter: Option<String>,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl User {
    /// `@username (Full Name) <email>` — each part included only if present,
    /// space-separated. None when every field is absent.
    pub fn display(&self) -> Option<String> {
        let mut parts: Vec<String> = Vec::new();
        if let Some(username) = &self.username {
            parts.push(format!("@{username}"));
        }
        if let Some(full_name) = &self.full_name {
            parts.push(format!("({full_name})"));
        }
        if let Some(email) = &self.email {
            parts.push(format!("<{email}>"));
        }
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(" "))
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Member {
    #[serde(flatten)]
    pub user: User,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub role_type: Option<i64>,
}

impl Member {
    pub fn is_responsible(&self) -> bool {
        self.role_type == Some(RESPONSIBLE_ROLE)
    }
}

/// Board metadata. Returned embedded in a card and by `GET /boards/{id}`;
/// the latter carries the column/lane lists used to place new cards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Board {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(alias = "name")]
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spaces: Option<Vec<Space>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub columns: Option<Vec<Column>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lanes: Option<Vec<Lane>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Column {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(alias = "name")]
    pub title: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lane {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(alias = "name")]
    pub title: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Space {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(alias = "name")]
    pub title: String,
    #[serde(default)]
    pub primary_path: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_display_all_parts() {
        let user = User {
            username: Some("jdoe".into()),
            full_name: Some("Jane Doe".into()),
            email: Some("jdoe@example.com".into()),
        };
        assert_eq!(
            user.display().unwrap(),
            "@jdoe (Jane Doe) <jdoe@example.com>"
        );
    }

    #[test]
    fn user_display_partial() {
        let user = User {
            username: None,
            full_name: Some("Jane Doe".into()),
            email: None,
        };
        assert_eq!(user.display().unwrap(), "(Jane Doe)");
    }

    #[test]
    fn user_display_empty_is_none() {
        let user = User {
            username: None,
            full_name: None,
            email: None,
        };
        assert_eq!(user.display(), None);
    }

    #[test]
    fn members_responsible_sort_is_stable() {
        let member = |name: &str, role: Option<i64>| Member {
            user: User {
                username: Some(name.into()),
                full_name: None,
                email: None,
            },
            role_type: role,
        };
        let card: Card = serde_json::from_value(serde_json::json!({
            "id": 1, "title": "t"
        }))
        .unwrap();
        let card = Card {
            members: Some(vec![
                member("a", Some(1)),
                member("b", Some(2)),
                member("c", None),
                member("d", Some(2)),
            ]),
            ..card
        };
        let names: Vec<_> = card
            .members_for_display()
            .iter()
            .map(|m| m.user.username.clone().unwrap())
            .collect();
        assert_eq!(names, vec!["b", "d", "a", "c"]);
    }

    #[test]
    fn card_accepts_name_alias_for_title() {
        let card: Card = serde_json::from_value(serde_json::json!({
            "id": 7, "name": "Aliased"
        }))
        .unwrap();
        assert_eq!(card.title, "Aliased");
        // Normalized back out as `title`.
        let json = serde_json::to_value(&card).unwrap();
        assert_eq!(json["title"], "Aliased");
        assert!(json.get("name").is_none());
    }

    #[test]
    fn card_json_round_trip() {
        let card: Card = serde_json::from_value(serde_json::json!({
            "id": 42,
            "title": "Round trip",
            "description": "<p>hi</p>",
            "owner": {"username": "jdoe"},
            "status": {"name": "In progress"},
            "estimate": 3.5,
            "type": {"letter": "B", "name": "Bug"},
            "children_count": 2,
            "children_done": 1
        }))
        .unwrap();
        let json = serde_json::to_string(&card).unwrap();
        let reparsed: Card = serde_json::from_str(&json).unwrap();
        assert_eq!(
            serde_json::to_value(&card).unwrap(),
            serde_json::to_value(&reparsed).unwrap()
        );
    }
}
