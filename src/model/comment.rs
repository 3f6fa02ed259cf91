use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::card::User;

/// A card comment from `GET /cards/{id}/comments`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<User>,
    pub created: DateTime<Utc>,
    /// Comment body, HTML as delivered by the API.
    pub text: String,
}

impl Comment {
    /// Display name: full name, falling back to username, then "Unknown".
    pub fn author_name(&self) -> &str {
        self.author
            .as_ref()
            .and_then(|a| a.full_name.as_deref().or(a.username.as_deref()))
            .unwrap_or("Unknown")
    }
}
