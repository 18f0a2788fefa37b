use crate::api::ArticleSource;
use crate::db::Repository;
use crate::error::Result;
use crate::models::{Latest, Source};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileAction {
    /// No row yet: seed the watermark.
    Create(i64),
    /// Row exists but disagrees with the API.
    Update(i64),
    Keep,
}

/// Decides how the stored watermark must change to match the API.
///
/// A source that became empty is re-baselined to zero, so articles
/// published afterwards are not hidden behind a stale high id.
pub fn plan(latest: &Latest, stored: Option<i64>) -> ReconcileAction {
    match (latest, stored) {
        (Latest::Empty, None) => ReconcileAction::Create(0),
        (Latest::Article(article), None) => ReconcileAction::Create(article.id),
        (Latest::Article(article), Some(id)) if article.id != id => {
            ReconcileAction::Update(article.id)
        }
        (Latest::Empty, Some(id)) if id != 0 => ReconcileAction::Update(0),
        _ => ReconcileAction::Keep,
    }
}

pub async fn reconcile_source(
    repository: &Repository,
    articles: &dyn ArticleSource,
    source: Source,
) -> Result<ReconcileAction> {
    let latest = articles.fetch_latest(source).await?;
    let stored = repository.get_watermark(source).await?;

    let action = plan(&latest, stored);
    match action {
        ReconcileAction::Create(id) => {
            repository.create_watermark(source, id).await?;
            tracing::info!("Seeded {} watermark at {}", source, id);
        }
        ReconcileAction::Update(id) => {
            repository.set_watermark(source, id).await?;
            tracing::info!("Moved {} watermark from {:?} to {}", source, stored, id);
        }
        ReconcileAction::Keep => {
            tracing::debug!("{} watermark already at {:?}", source, stored);
        }
    }
    Ok(action)
}

/// Reconciles every source. A failing source is logged and left as it was.
pub async fn reconcile_all(repository: &Repository, articles: &dyn ArticleSource) -> usize {
    let mut reconciled = 0;
    for source in Source::ALL {
        match reconcile_source(repository, articles, source).await {
            Ok(_) => reconciled += 1,
            Err(e) => tracing::warn!("Could not reconcile {} watermark: {}", source, e),
        }
    }
    reconciled
}
