use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use url::Url;

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::models::{ArticleSummary, Latest, Source};

use super::{ArticleSource, FetchError, TokenProvider};

struct ApiUrls {
    latest_native: Url,
    latest_scraped: Url,
    articles: Url,
}

pub struct ArticleClient {
    client: Client,
    urls: ApiUrls,
    tokens: TokenProvider,
}

impl ArticleClient {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .connect_timeout(config.request_timeout().min(std::time::Duration::from_secs(10)))
            .user_agent(concat!("blog-notifier/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let base = base_url(&config.api_base_url)?;
        let endpoints = &config.endpoints;
        let urls = ApiUrls {
            latest_native: join(&base, &endpoints.latest_native)?,
            latest_scraped: join(&base, &endpoints.latest_scraped)?,
            articles: join(&base, &endpoints.articles)?,
        };

        let tokens = TokenProvider::new(
            client.clone(),
            join(&base, &endpoints.login)?,
            config.api_username.clone(),
            config.api_password.clone(),
        );
        tracing::debug!("Article API at {}, tokens from {}", base, tokens.login_url());

        Ok(Self {
            client,
            urls,
            tokens,
        })
    }

    fn latest_url(&self, source: Source) -> Url {
        match source {
            Source::Native => self.urls.latest_native.clone(),
            Source::Scraped => self.urls.latest_scraped.clone(),
        }
    }

    fn range_url(&self, source: Source, id_from: i64, id_to: i64) -> Url {
        let mut url = self.urls.articles.clone();
        url.query_pairs_mut()
            .append_pair("source", source.as_str())
            .append_pair("id_from", &id_from.to_string())
            .append_pair("id_to", &id_to.to_string());
        url
    }

    /// Authenticated GET; anything but HTTP 200 is an error.
    async fn get(&self, url: Url) -> std::result::Result<String, FetchError> {
        let token = self.tokens.token().await?;

        let response = self
            .client
            .get(url.clone())
            .header(CONTENT_TYPE, "application/json; charset=utf-8")
            .header(AUTHORIZATION, token.header_value())
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(FetchError::Status {
                status,
                url: url.to_string(),
            });
        }

        Ok(response.text().await?)
    }
}

#[async_trait]
impl ArticleSource for ArticleClient {
    async fn fetch_latest(&self, source: Source) -> std::result::Result<Latest, FetchError> {
        let body = self.get(self.latest_url(source)).await?;
        let latest = parse_latest(&body)?;
        tracing::debug!("Latest {} article: {:?}", source, latest.id());
        Ok(latest)
    }

    async fn fetch_range(
        &self,
        source: Source,
        id_from: i64,
        id_to: i64,
    ) -> std::result::Result<Vec<ArticleSummary>, FetchError> {
        let body = self.get(self.range_url(source, id_from, id_to)).await?;
        let articles = parse_range(&body)?;
        tracing::debug!(
            "Fetched {} {} articles in [{}, {}]",
            articles.len(),
            source,
            id_from,
            id_to
        );
        Ok(articles)
    }
}

/// `Url::join` drops the last path segment unless it ends with a slash.
fn base_url(raw: &str) -> Result<Url> {
    let mut raw = raw.trim().to_string();
    if !raw.ends_with('/') {
        raw.push('/');
    }
    Url::parse(&raw).map_err(|e| AppError::Config(format!("invalid api_base_url {:?}: {}", raw, e)))
}

fn join(base: &Url, path: &str) -> Result<Url> {
    base.join(path.trim_start_matches('/'))
        .map_err(|e| AppError::Config(format!("invalid endpoint path {:?}: {}", path, e)))
}

/// An empty body, `null` or `{}` all mean the source has no articles yet.
fn parse_latest(body: &str) -> std::result::Result<Latest, FetchError> {
    let body = body.trim();
    if body.is_empty() {
        return Ok(Latest::Empty);
    }

    match serde_json::from_str::<Value>(body)? {
        Value::Null => Ok(Latest::Empty),
        Value::Object(map) if map.is_empty() => Ok(Latest::Empty),
        value => Ok(Latest::Article(serde_json::from_value(value)?)),
    }
}

fn parse_range(body: &str) -> std::result::Result<Vec<ArticleSummary>, FetchError> {
    let body = body.trim();
    if body.is_empty() {
        return Ok(Vec::new());
    }
    Ok(serde_json::from_str(body)?)
}
