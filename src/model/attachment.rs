use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A file attached to a card.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardFile {
    pub id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub url: String,
    #[serde(default)]
    pub size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,
}

impl CardFile {
    /// Display name, falling back to `file_<id>` when absent.
    pub fn display_name(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("file_{}", self.id))
    }

    /// Image attachments are embedded in Markdown instead of linked.
    pub fn is_image(&self) -> bool {
        const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "svg"];
        self.display_name()
            .rsplit_once('.')
            .map(|(_, ext)| {
                let ext = ext.to_ascii_lowercase();
                IMAGE_EXTENSIONS.contains(&ext.as_str())
            })
            .unwrap_or(false)
    }
}
