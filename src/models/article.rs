use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::services::markdown;

use super::Source;

/// Article as reported by the blog API. Extra fields in the payload are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ArticleSummary {
    pub id: i64,
    pub title: String,
    pub url: String,
}

impl ArticleSummary {
    /// MarkdownV2 link used as the notification text.
    pub fn to_message(&self) -> String {
        markdown::link(&self.title, &self.url)
    }
}

/// Answer of the latest-article endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Latest {
    /// The source exists but holds no articles yet.
    Empty,
    Article(ArticleSummary),
}

impl Latest {
    pub fn id(&self) -> Option<i64> {
        match self {
            Latest::Empty => None,
            Latest::Article(article) => Some(article.id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Watermark {
    pub source: Source,
    pub last_article_id: i64,
    pub updated_at: DateTime<Utc>,
}
