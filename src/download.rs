//! Persist a card tree to disk: Markdown + JSON per card, one JSON file per
//! comment, attachments under `files/`, children recursively under
//! `children/` up to a depth bound.

use std::path::{Path, PathBuf};

use futures::future::BoxFuture;
use futures::FutureExt;
use tracing::{debug, info, warn};

use crate::api::CardSource;
use crate::error::Result;
use crate::markdown::render_card;
use crate::model::{Card, Comment};

pub const DEFAULT_MAX_DEPTH: usize = 3;

#[derive(Debug, Clone)]
pub struct DownloadOptions {
    /// How many child levels below the root to descend into.
    pub max_depth: usize,
    /// Skip attachment downloads entirely.
    pub skip_files: bool,
}

impl Default for DownloadOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            skip_files: false,
        }
    }
}

/// The in-memory result of a download, mirroring the on-disk tree.
#[derive(Debug)]
pub struct DownloadedCard {
    pub card: Card,
    pub comments: Vec<Comment>,
    pub children: Vec<DownloadedCard>,
}

/// Download `card_id` and its descendants into `<output_dir>/<card_id>/`.
///
/// A failed attachment or child download is logged and skipped; everything
/// else propagates. Fully sequential: one request and one open file at a
/// time, one child subtree completing before the next starts.
pub async fn download_card_tree(
    api: &dyn CardSource,
    card_id: i64,
    output_dir: &Path,
    options: &DownloadOptions,
) -> Result<DownloadedCard> {
    download_card(api, card_id, output_dir.to_path_buf(), options, 0).await
}

/// Recursion is bounded by `depth`, which strictly increases toward
/// `options.max_depth`; a card without children terminates immediately.
fn download_card<'a>(
    api: &'a dyn CardSource,
    card_id: i64,
    output_dir: PathBuf,
    options: &'a DownloadOptions,
    depth: usize,
) -> BoxFuture<'a, Result<DownloadedCard>> {
    async move {
        let card = api.get_card(card_id).await?;
        let comments = api.get_card_comments(card_id).await?;
        let child_cards = if card.children_count > 0 {
            api.get_card_children(card_id).await?
        } else {
            Vec::new()
        };

        let card_dir = output_dir.join(card_id.to_string());
        tokio::fs::create_dir_all(&card_dir).await?;

        let markdown = render_card(&card, &comments, &child_cards);
        tokio::fs::write(card_dir.join("card.md"), markdown).await?;
        tokio::fs::write(card_dir.join("card.json"), serde_json::to_string_pretty(&card)?)
            .await?;

        if !comments.is_empty() {
            write_comments(&card_dir, &comments).await?;
        }

        if !options.skip_files {
            download_attachments(api, &card, &card_dir).await?;
        }

        let mut children = Vec::new();
        if !child_cards.is_empty() {
            if depth < options.max_depth {
                let children_dir = card_dir.join("children");
                tokio::fs::create_dir_all(&children_dir).await?;
                for child in &child_cards {
                    match download_card(api, child.id, children_dir.clone(), options, depth + 1)
                        .await
                    {
                        Ok(subtree) => children.push(subtree),
                        Err(err) => {
                            warn!(child_id = child.id, error = %err, "child card download failed, skipping");
                        }
                    }
                }
            } else {
                info!(
                    card_id,
                    max_depth = options.max_depth,
                    "depth limit reached, skipping children"
                );
            }
        }

        Ok(DownloadedCard {
            card,
            comments,
            children,
        })
    }
    .boxed()
}

async fn write_comments(card_dir: &Path, comments: &[Comment]) -> Result<()> {
    let comments_dir = card_dir.join("comments");
    tokio::fs::create_dir_all(&comments_dir).await?;
    for (ordinal, comment) in comments.iter().enumerate() {
        let name = format!("{}_{}.json", ordinal + 1, comment.id);
        tokio::fs::write(
            comments_dir.join(name),
            serde_json::to_string_pretty(comment)?,
        )
        .await?;
    }
    Ok(())
}

async fn download_attachments(api: &dyn CardSource, card: &Card, card_dir: &Path) -> Result<()> {
    let files = match &card.files {
        Some(files) if !files.is_empty() => files,
        _ => return Ok(()),
    };

    let files_dir = card_dir.join("files");
    tokio::fs::create_dir_all(&files_dir).await?;
    for file in files {
        let name = safe_file_name(&file.display_name());
        let dest = files_dir.join(&name);
        match api.download_file(&file.url, &dest).await {
            Ok(written) => {
                debug!(card_id = card.id, file = %name, bytes = written, "attachment saved");
            }
            Err(err) => {
                warn!(card_id = card.id, file = %name, error = %err, "attachment download failed, skipping");
            }
        }
    }
    Ok(())
}

/// Attachment names come from the API; keep them inside `files/`.
fn safe_file_name(name: &str) -> String {
    name.replace(['/', '\\'], "_")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{HashMap, HashSet};

    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    use crate::error::ApiError;

    #[derive(Default)]
    struct MockSource {
        cards: HashMap<i64, Card>,
        comments: HashMap<i64, Vec<Comment>>,
        children: HashMap<i64, Vec<Card>>,
        fail_cards: HashSet<i64>,
        fail_urls: HashSet<String>,
    }

    impl MockSource {
        fn add_card(&mut self, value: serde_json::Value) -> &mut Self {
            let card: Card = serde_json::from_value(value).unwrap();
            self.cards.insert(card.id, card);
            self
        }

        fn add_child(&mut self, parent: i64, child: i64) {
            let card = self.cards.get(&child).cloned().unwrap();
            self.children.entry(parent).or_default().push(card);
        }
    }

    #[async_trait]
    impl CardSource for MockSource {
        async fn get_card(&self, card_id: i64) -> Result<Card> {
            if self.fail_cards.contains(&card_id) {
                return Err(ApiError::Data(format!("mock failure for card {card_id}")));
            }
            self.cards
                .get(&card_id)
                .cloned()
                .ok_or_else(|| ApiError::Data(format!("unknown card {card_id}")))
        }

        async fn get_card_comments(&self, card_id: i64) -> Result<Vec<Comment>> {
            Ok(self.comments.get(&card_id).cloned().unwrap_or_default())
        }

        async fn get_card_children(&self, card_id: i64) -> Result<Vec<Card>> {
            Ok(self.children.get(&card_id).cloned().unwrap_or_default())
        }

        async fn download_file(&self, url: &str, dest: &Path) -> Result<u64> {
            if self.fail_urls.contains(url) {
                return Err(ApiError::Data(format!("mock failure for {url}")));
            }
            std::fs::write(dest, b"attachment data")?;
            Ok(15)
        }
    }

    fn comment(id: i64, secs: i64) -> Comment {
        serde_json::from_value(json!({
            "id": id,
            "created": Utc.timestamp_opt(secs, 0).unwrap().to_rfc3339(),
            "text": "<p>hi</p>",
        }))
        .unwrap()
    }

    /// Cards 1 -> 2 -> 3 -> 4, one child each.
    fn chain() -> MockSource {
        let mut api = MockSource::default();
        api.add_card(json!({"id": 1, "title": "Root", "children_count": 1}))
            .add_card(json!({"id": 2, "title": "L1", "children_count": 1}))
            .add_card(json!({"id": 3, "title": "L2", "children_count": 1}))
            .add_card(json!({"id": 4, "title": "L3"}));
        api.add_child(1, 2);
        api.add_child(2, 3);
        api.add_child(3, 4);
        api
    }

    #[tokio::test]
    async fn writes_markdown_and_json() {
        let mut api = MockSource::default();
        api.add_card(json!({"id": 1, "title": "Demo"}));
        let dir = tempfile::tempdir().unwrap();

        let tree = download_card_tree(&api, 1, dir.path(), &DownloadOptions::default())
            .await
            .unwrap();

        let md = std::fs::read_to_string(dir.path().join("1/card.md")).unwrap();
        assert_eq!(md, "# Demo\n\n- **ID**: 1\n\n## Description\n\n\n");
        assert!(tree.children.is_empty());

        // The persisted JSON round-trips to the fetched card.
        let json = std::fs::read_to_string(dir.path().join("1/card.json")).unwrap();
        let reparsed: Card = serde_json::from_str(&json).unwrap();
        assert_eq!(
            serde_json::to_value(&reparsed).unwrap(),
            serde_json::to_value(api.cards.get(&1).unwrap()).unwrap()
        );
    }

    #[tokio::test]
    async fn comments_written_by_ordinal_and_id() {
        let mut api = MockSource::default();
        api.add_card(json!({"id": 1, "title": "Demo"}));
        api.comments.insert(1, vec![comment(10, 100), comment(11, 200)]);
        let dir = tempfile::tempdir().unwrap();

        let tree = download_card_tree(&api, 1, dir.path(), &DownloadOptions::default())
            .await
            .unwrap();

        assert_eq!(tree.comments.len(), 2);
        assert!(dir.path().join("1/comments/1_10.json").exists());
        assert!(dir.path().join("1/comments/2_11.json").exists());
    }

    #[tokio::test]
    async fn no_comment_dir_when_no_comments() {
        let mut api = MockSource::default();
        api.add_card(json!({"id": 1, "title": "Demo"}));
        let dir = tempfile::tempdir().unwrap();

        download_card_tree(&api, 1, dir.path(), &DownloadOptions::default())
            .await
            .unwrap();
        assert!(!dir.path().join("1/comments").exists());
        assert!(!dir.path().join("1/files").exists());
        assert!(!dir.path().join("1/children").exists());
    }

    #[tokio::test]
    async fn recursion_stops_at_max_depth() {
        let api = chain();
        let dir = tempfile::tempdir().unwrap();

        let options = DownloadOptions {
            max_depth: 2,
            ..DownloadOptions::default()
        };
        let tree = download_card_tree(&api, 1, dir.path(), &options).await.unwrap();

        assert!(dir.path().join("1/card.md").exists());
        assert!(dir.path().join("1/children/2/card.md").exists());
        assert!(dir.path().join("1/children/2/children/3/card.md").exists());
        // Depth 3 is beyond the bound: no directory at all.
        assert!(!dir.path().join("1/children/2/children/3/children").exists());

        assert_eq!(tree.children.len(), 1);
        assert_eq!(tree.children[0].children.len(), 1);
        assert!(tree.children[0].children[0].children.is_empty());
    }

    #[tokio::test]
    async fn full_tree_when_shallower_than_bound() {
        let api = chain();
        let dir = tempfile::tempdir().unwrap();

        download_card_tree(&api, 1, dir.path(), &DownloadOptions::default())
            .await
            .unwrap();
        assert!(dir
            .path()
            .join("1/children/2/children/3/children/4/card.md")
            .exists());
    }

    #[tokio::test]
    async fn failed_child_does_not_abort_siblings() {
        let mut api = MockSource::default();
        api.add_card(json!({"id": 1, "title": "Root", "children_count": 2}))
            .add_card(json!({"id": 2, "title": "Bad"}))
            .add_card(json!({"id": 3, "title": "Good"}));
        api.add_child(1, 2);
        api.add_child(1, 3);
        api.fail_cards.insert(2);
        let dir = tempfile::tempdir().unwrap();

        let tree = download_card_tree(&api, 1, dir.path(), &DownloadOptions::default())
            .await
            .unwrap();

        assert_eq!(tree.children.len(), 1);
        assert_eq!(tree.children[0].card.id, 3);
        assert!(!dir.path().join("1/children/2").exists());
        assert!(dir.path().join("1/children/3/card.md").exists());
    }

    #[tokio::test]
    async fn failed_attachment_is_skipped() {
        let mut api = MockSource::default();
        api.add_card(json!({
            "id": 1,
            "title": "Demo",
            "files": [
                {"id": 5, "name": "bad.bin", "url": "https://f/bad", "size": 1},
                {"id": 6, "name": "good.bin", "url": "https://f/good", "size": 1}
            ]
        }));
        api.fail_urls.insert("https://f/bad".into());
        let dir = tempfile::tempdir().unwrap();

        download_card_tree(&api, 1, dir.path(), &DownloadOptions::default())
            .await
            .unwrap();
        assert!(!dir.path().join("1/files/bad.bin").exists());
        assert!(dir.path().join("1/files/good.bin").exists());
    }

    #[tokio::test]
    async fn skip_files_leaves_no_files_dir() {
        let mut api = MockSource::default();
        api.add_card(json!({
            "id": 1,
            "title": "Demo",
            "files": [{"id": 5, "name": "a.bin", "url": "https://f/a", "size": 1}]
        }));
        let dir = tempfile::tempdir().unwrap();

        let options = DownloadOptions {
            skip_files: true,
            ..DownloadOptions::default()
        };
        download_card_tree(&api, 1, dir.path(), &options).await.unwrap();
        assert!(!dir.path().join("1/files").exists());
    }

    #[tokio::test]
    async fn root_fetch_failure_propagates() {
        let mut api = MockSource::default();
        api.fail_cards.insert(1);
        let dir = tempfile::tempdir().unwrap();

        let err = download_card_tree(&api, 1, dir.path(), &DownloadOptions::default())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("mock failure"));
    }

    #[test]
    fn attachment_names_cannot_escape_files_dir() {
        assert_eq!(safe_file_name("../../etc/passwd"), ".._.._etc_passwd");
        assert_eq!(safe_file_name("plain.txt"), "plain.txt");
    }
}
