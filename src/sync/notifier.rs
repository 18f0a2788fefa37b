use crate::api::ArticleSource;
use crate::db::Repository;
use crate::error::Result;
use crate::models::{ArticleSummary, Latest, Source};
use crate::registry::SubscriberRegistry;
use crate::services::Messenger;

use super::reconcile;

/// Outcome of one tick.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TickReport {
    pub new_native: usize,
    pub new_scraped: usize,
    pub subscribers: usize,
    pub sent: usize,
    pub failed: usize,
}

impl TickReport {
    pub fn new_articles(&self) -> usize {
        self.new_native + self.new_scraped
    }

    fn record_new(&mut self, source: Source, count: usize) {
        match source {
            Source::Native => self.new_native = count,
            Source::Scraped => self.new_scraped = count,
        }
    }
}

/// New articles of one source, and where its watermark moves once they are accepted.
struct Delta {
    source: Source,
    articles: Vec<ArticleSummary>,
    watermark: i64,
}

pub struct Notifier<'a> {
    repository: &'a Repository,
    articles: &'a dyn ArticleSource,
    messenger: &'a dyn Messenger,
}

impl<'a> Notifier<'a> {
    pub fn new(
        repository: &'a Repository,
        articles: &'a dyn ArticleSource,
        messenger: &'a dyn Messenger,
    ) -> Self {
        Self {
            repository,
            articles,
            messenger,
        }
    }

    /// Fetches what is new since each watermark, advances the watermarks and
    /// notifies every subscriber.
    ///
    /// Per-source API and storage failures are logged and skip that source
    /// only. The tick fails when the subscriber list cannot be read, before
    /// any watermark has moved.
    pub async fn tick(&self) -> Result<TickReport> {
        let mut deltas = Vec::new();
        for source in Source::ALL {
            if let Some(delta) = self.collect(source).await {
                deltas.push(delta);
            }
        }

        let subscribers = SubscriberRegistry::new(self.repository).all().await?;

        let mut report = TickReport {
            subscribers: subscribers.len(),
            ..TickReport::default()
        };

        let mut batch = Vec::new();
        for delta in deltas {
            if let Err(e) = self
                .repository
                .set_watermark(delta.source, delta.watermark)
                .await
            {
                tracing::error!(
                    "Could not advance {} watermark to {}, retrying next tick: {}",
                    delta.source,
                    delta.watermark,
                    e
                );
                continue;
            }
            tracing::debug!("{} watermark advanced to {}", delta.source, delta.watermark);
            report.record_new(delta.source, delta.articles.len());
            batch.extend(delta.articles);
        }

        for chat_id in subscribers {
            for article in &batch {
                match self.messenger.send(chat_id, &article.to_message()).await {
                    Ok(()) => report.sent += 1,
                    Err(e) => {
                        report.failed += 1;
                        tracing::warn!(chat_id, article = article.id, "Notification dropped: {}", e);
                    }
                }
            }
        }

        Ok(report)
    }

    async fn collect(&self, source: Source) -> Option<Delta> {
        let watermark = match self.repository.get_watermark(source).await {
            Ok(Some(id)) => id,
            Ok(None) => {
                // First sight of this source: baseline it without notifying.
                tracing::info!("No {} watermark yet, reconciling", source);
                if let Err(e) =
                    reconcile::reconcile_source(self.repository, self.articles, source).await
                {
                    tracing::warn!("Could not reconcile {} watermark: {}", source, e);
                }
                return None;
            }
            Err(e) => {
                tracing::error!("Could not read {} watermark: {}", source, e);
                return None;
            }
        };

        let latest = match self.articles.fetch_latest(source).await {
            Ok(Latest::Article(article)) => article.id,
            Ok(Latest::Empty) => return None,
            Err(e) => {
                tracing::warn!("Skipping {} this tick: {}", source, e);
                return None;
            }
        };

        if latest <= watermark {
            return None;
        }

        tracing::debug!("{} new {} article(s) announced", latest - watermark, source);

        let articles: Vec<ArticleSummary> = match self
            .articles
            .fetch_range(source, watermark + 1, latest)
            .await
        {
            Ok(articles) => articles
                .into_iter()
                .filter(|article| article.id > watermark)
                .collect(),
            Err(e) => {
                tracing::warn!("Skipping {} this tick: {}", source, e);
                return None;
            }
        };

        let newest = articles.iter().map(|article| article.id).max()?;
        Some(Delta {
            source,
            articles,
            watermark: newest,
        })
    }
}
