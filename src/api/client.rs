use std::path::Path;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::json;
use tokio::io::AsyncWriteExt;

use super::CardSource;
use crate::error::{ApiError, Result};
use crate::model::{Board, Card, Column, Comment, Space};

/// Thin authenticated wrapper over the Kaiten REST API.
///
/// `base_url` is the versioned API root, e.g. `https://acme.kaiten.ru/api/v1`.
/// No retries, timeouts, or pagination; every method is one request (card
/// creation may add one board lookup).
pub struct KaitenClient {
    base_url: String,
    token: Option<String>,
    client: reqwest::Client,
}

/// Payload for `POST /cards`. Column and lane are resolved from the board
/// when not supplied.
#[derive(Debug, Clone, Default)]
pub struct NewCard {
    pub board_id: i64,
    pub title: String,
    pub column_id: Option<i64>,
    pub lane_id: Option<i64>,
    pub description: Option<String>,
}

impl KaitenClient {
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            token,
            client: reqwest::Client::new(),
        }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let req = self
            .client
            .request(method, format!("{}{path}", self.base_url))
            .header("Accept", "application/json");
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    /// Surface non-2xx responses with their status and body.
    async fn check(resp: Response) -> Result<Response> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        Err(ApiError::Status { status, body })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let resp = self.request(Method::GET, path).send().await?;
        Ok(Self::check(resp).await?.json().await?)
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<T> {
        let resp = self.request(Method::POST, path).json(body).send().await?;
        Ok(Self::check(resp).await?.json().await?)
    }

    async fn delete(&self, path: &str) -> Result<()> {
        let resp = self.request(Method::DELETE, path).send().await?;
        Self::check(resp).await?;
        Ok(())
    }

    pub async fn create_space(&self, title: &str) -> Result<Space> {
        self.post_json("/spaces", &json!({ "title": title })).await
    }

    pub async fn create_board(&self, space_id: i64, title: &str) -> Result<Board> {
        self.post_json(&format!("/spaces/{space_id}/boards"), &json!({ "title": title }))
            .await
    }

    pub async fn create_column(&self, board_id: i64, title: &str) -> Result<Column> {
        self.post_json(&format!("/boards/{board_id}/columns"), &json!({ "title": title }))
            .await
    }

    pub async fn get_board(&self, board_id: i64) -> Result<Board> {
        self.get_json(&format!("/boards/{board_id}")).await
    }

    /// Create a card, placing it on the board's first column and lane when
    /// no explicit ones are given.
    pub async fn create_card(&self, draft: NewCard) -> Result<Card> {
        let (column_id, lane_id) = match (draft.column_id, draft.lane_id) {
            (Some(column_id), Some(lane_id)) => (column_id, lane_id),
            (column_id, lane_id) => {
                let board = self.get_board(draft.board_id).await?;
                let column_id = match column_id {
                    Some(id) => id,
                    None => first_column_id(&board, draft.board_id)?,
                };
                let lane_id = match lane_id {
                    Some(id) => id,
                    None => first_lane_id(&board, draft.board_id)?,
                };
                (column_id, lane_id)
            }
        };

        let mut body = json!({
            "board_id": draft.board_id,
            "title": draft.title,
            "column_id": column_id,
            "lane_id": lane_id,
        });
        if let Some(description) = &draft.description {
            body["description"] = json!(description);
        }
        self.post_json("/cards", &body).await
    }

    pub async fn delete_space(&self, space_id: i64) -> Result<()> {
        self.delete(&format!("/spaces/{space_id}")).await
    }

    pub async fn delete_board(&self, board_id: i64) -> Result<()> {
        self.delete(&format!("/boards/{board_id}")).await
    }

    pub async fn delete_column(&self, column_id: i64) -> Result<()> {
        self.delete(&format!("/columns/{column_id}")).await
    }

    pub async fn delete_card(&self, card_id: i64) -> Result<()> {
        self.delete(&format!("/cards/{card_id}")).await
    }
}

fn first_column_id(board: &Board, board_id: i64) -> Result<i64> {
    board
        .columns
        .as_deref()
        .and_then(|c| c.first())
        .and_then(|c| c.id)
        .ok_or_else(|| ApiError::Data(format!("board {board_id} has no columns to place the card")))
}

fn first_lane_id(board: &Board, board_id: i64) -> Result<i64> {
    board
        .lanes
        .as_deref()
        .and_then(|l| l.first())
        .and_then(|l| l.id)
        .ok_or_else(|| ApiError::Data(format!("board {board_id} has no lanes to place the card")))
}

#[async_trait]
impl CardSource for KaitenClient {
    async fn get_card(&self, card_id: i64) -> Result<Card> {
        self.get_json(&format!("/cards/{card_id}")).await
    }

    async fn get_card_comments(&self, card_id: i64) -> Result<Vec<Comment>> {
        self.get_json(&format!("/cards/{card_id}/comments")).await
    }

    async fn get_card_children(&self, card_id: i64) -> Result<Vec<Card>> {
        self.get_json(&format!("/cards/{card_id}/children")).await
    }

    async fn download_file(&self, url: &str, dest: &Path) -> Result<u64> {
        let req = self.client.get(url).header("Accept", "*/*");
        let req = match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        };
        let resp = Self::check(req.send().await?).await?;

        let mut out = tokio::fs::File::create(dest).await?;
        let mut stream = resp.bytes_stream();
        let mut written: u64 = 0;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            out.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        out.flush().await?;
        Ok(written)
    }
}
