//! In-process fakes for the article API and the chat transport.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use reqwest::StatusCode;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};

use crate::api::{ArticleSource, FetchError};
use crate::error::{AppError, Result};
use crate::models::{ArticleSummary, Latest, Source};
use crate::services::Messenger;

pub fn article(id: i64) -> ArticleSummary {
    ArticleSummary {
        id,
        title: format!("Article {}", id),
        url: format!("http://blog.test/web/article_detail/{}", id),
    }
}

/// Serves articles per source. Range answers are newest-first, like the blog API.
#[derive(Default)]
pub struct FakeSource {
    articles: Mutex<HashMap<Source, Vec<ArticleSummary>>>,
    failing: Mutex<HashMap<Source, StatusCode>>,
    range_calls: Mutex<Vec<(Source, i64, i64)>>,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the source contents with articles `1..=latest`.
    pub fn set_latest(&self, source: Source, latest: i64) {
        let articles = (1..=latest).map(article).collect();
        self.articles.lock().unwrap().insert(source, articles);
    }

    pub fn fail_with(&self, source: Source, status: StatusCode) {
        self.failing.lock().unwrap().insert(source, status);
    }

    pub fn recover(&self, source: Source) {
        self.failing.lock().unwrap().remove(&source);
    }

    pub fn range_calls(&self) -> Vec<(Source, i64, i64)> {
        self.range_calls.lock().unwrap().clone()
    }

    fn check(&self, source: Source) -> std::result::Result<(), FetchError> {
        match self.failing.lock().unwrap().get(&source) {
            Some(status) => Err(FetchError::Status {
                status: *status,
                url: format!("http://blog.test/{}", source),
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ArticleSource for FakeSource {
    async fn fetch_latest(&self, source: Source) -> std::result::Result<Latest, FetchError> {
        self.check(source)?;
        let articles = self.articles.lock().unwrap();
        Ok(articles
            .get(&source)
            .and_then(|list| list.last().cloned())
            .map(Latest::Article)
            .unwrap_or(Latest::Empty))
    }

    async fn fetch_range(
        &self,
        source: Source,
        id_from: i64,
        id_to: i64,
    ) -> std::result::Result<Vec<ArticleSummary>, FetchError> {
        self.range_calls.lock().unwrap().push((source, id_from, id_to));
        self.check(source)?;
        let articles = self.articles.lock().unwrap();
        Ok(articles
            .get(&source)
            .map(|list| {
                list.iter()
                    .rev()
                    .filter(|a| a.id >= id_from && a.id <= id_to)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}

/// Records every message; chats listed in `blocked` fail delivery.
#[derive(Default)]
pub struct RecordingMessenger {
    sent: Mutex<Vec<(i64, String)>>,
    blocked: Mutex<Vec<i64>>,
}

impl RecordingMessenger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn block(&self, chat_id: i64) {
        self.blocked.lock().unwrap().push(chat_id);
    }

    pub fn sent(&self) -> Vec<(i64, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Messenger for RecordingMessenger {
    async fn send(&self, chat_id: i64, text: &str) -> Result<()> {
        if self.blocked.lock().unwrap().contains(&chat_id) {
            return Err(AppError::Telegram(format!("chat {} blocked the bot", chat_id)));
        }
        self.sent.lock().unwrap().push((chat_id, text.to_string()));
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StubRequest {
    pub method: String,
    /// Path and query, as sent on the request line.
    pub target: String,
    pub authorization: Option<String>,
}

type Routes = Arc<Mutex<HashMap<String, (u16, String)>>>;
type Requests = Arc<Mutex<Vec<StubRequest>>>;

/// Minimal HTTP/1.1 server on a loopback port. Answers by path with canned
/// responses (404 when unrouted) and closes every connection.
pub struct StubApi {
    addr: SocketAddr,
    routes: Routes,
    requests: Requests,
}

impl StubApi {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let routes = Routes::default();
        let requests = Requests::default();

        let (served_routes, served_requests) = (routes.clone(), requests.clone());
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let routes = served_routes.clone();
                let requests = served_requests.clone();
                tokio::spawn(async move {
                    let _ = serve(stream, routes, requests).await;
                });
            }
        });

        Self {
            addr,
            routes,
            requests,
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}/api/", self.addr)
    }

    pub fn route(&self, path: &str, status: u16, body: &str) {
        self.routes
            .lock()
            .unwrap()
            .insert(path.to_string(), (status, body.to_string()));
    }

    pub fn requests(&self) -> Vec<StubRequest> {
        self.requests.lock().unwrap().clone()
    }
}

async fn serve(stream: TcpStream, routes: Routes, requests: Requests) -> std::io::Result<()> {
    let mut reader = BufReader::new(stream);

    let mut request_line = String::new();
    reader.read_line(&mut request_line).await?;
    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or_default().to_string();
    let target = parts.next().unwrap_or_default().to_string();

    let mut content_length = 0;
    let mut authorization = None;
    loop {
        let mut line = String::new();
        if reader.read_line(&mut line).await? == 0 {
            break;
        }
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            let value = value.trim();
            match name.to_ascii_lowercase().as_str() {
                "content-length" => content_length = value.parse().unwrap_or(0),
                "authorization" => authorization = Some(value.to_string()),
                _ => {}
            }
        }
    }
    let mut body = vec![0; content_length];
    reader.read_exact(&mut body).await?;

    let path = target.split('?').next().unwrap_or_default().to_string();
    requests.lock().unwrap().push(StubRequest {
        method,
        target,
        authorization,
    });
    let (status, body) = routes
        .lock()
        .unwrap()
        .get(&path)
        .cloned()
        .unwrap_or((404, String::new()));

    let response = format!(
        "HTTP/1.1 {} Stub\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        body.len(),
        body
    );
    let mut stream = reader.into_inner();
    stream.write_all(response.as_bytes()).await?;
    stream.shutdown().await
}
