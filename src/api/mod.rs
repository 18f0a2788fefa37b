//! Client side of the blog REST API.
//!
//! Every request is authenticated with a token obtained from the login
//! endpoint right before the call.

mod auth;
mod client;

use async_trait::async_trait;
use reqwest::StatusCode;
use thiserror::Error;

use crate::models::{ArticleSummary, Latest, Source};

pub use auth::TokenProvider;
pub use client::ArticleClient;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected HTTP {status} from {url}")]
    Status { status: StatusCode, url: String },

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Where new articles come from.
#[async_trait]
pub trait ArticleSource: Send + Sync {
    async fn fetch_latest(&self, source: Source) -> Result<Latest, FetchError>;

    /// Articles with `id_from <= id <= id_to`, in the order the API returns them.
    async fn fetch_range(
        &self,
        source: Source,
        id_from: i64,
        id_to: i64,
    ) -> Result<Vec<ArticleSummary>, FetchError>;
}
