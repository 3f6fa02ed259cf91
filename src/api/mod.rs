pub mod client;

pub use client::{KaitenClient, NewCard};

use std::path::Path;

use async_trait::async_trait;

use crate::error::Result;
use crate::model::{Card, Comment};

/// The read side of the Kaiten API, as the download path consumes it.
/// Tests substitute an in-memory implementation.
#[async_trait]
pub trait CardSource: Send + Sync {
    async fn get_card(&self, card_id: i64) -> Result<Card>;
    async fn get_card_comments(&self, card_id: i64) -> Result<Vec<Comment>>;
    async fn get_card_children(&self, card_id: i64) -> Result<Vec<Card>>;
    /// Stream an attachment URL to `dest`, returning the bytes written.
    async fn download_file(&self, url: &str, dest: &Path) -> Result<u64>;
}
