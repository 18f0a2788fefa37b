use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};
use tokio_rusqlite::Connection;

use crate::error::Result;
use crate::models::{Source, Watermark};

use super::schema::SCHEMA;

/// Local state of the notifier: one watermark per source and the subscriber set.
///
/// All calls run on the single background thread owned by the
/// `tokio_rusqlite` connection, so concurrent callers are serialised.
pub struct Repository {
    conn: Connection,
}

impl Repository {
    pub async fn open(db_path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(db_path.as_ref()).await?;
        Self::init(conn).await
    }

    #[cfg(test)]
    pub async fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().await?;
        Self::init(conn).await
    }

    /// Runs raw SQL against the store, for tests that need to break or repair it.
    #[cfg(test)]
    pub async fn execute_batch(&self, sql: &'static str) -> Result<()> {
        self.conn
            .call(move |conn| {
                conn.execute_batch(sql)?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    async fn init(conn: Connection) -> Result<Self> {
        conn.call(|conn| {
            conn.execute_batch(SCHEMA)?;
            Ok(())
        })
        .await?;

        Ok(Self { conn })
    }

    pub async fn close(self) -> Result<()> {
        self.conn.close().await?;
        Ok(())
    }

    // Watermark operations

    /// `None` when the source was never recorded. Zero is a valid id.
    pub async fn get_watermark(&self, source: Source) -> Result<Option<i64>> {
        let id = self
            .conn
            .call(move |conn| {
                let id = conn
                    .query_row(
                        "SELECT last_article_id FROM watermarks WHERE source = ?1",
                        params![source.as_str()],
                        |row| row.get(0),
                    )
                    .optional()?;
                Ok(id)
            })
            .await?;
        Ok(id)
    }

    pub async fn set_watermark(&self, source: Source, last_article_id: i64) -> Result<()> {
        self.conn
            .call(move |conn| {
                conn.execute(
                    r#"INSERT INTO watermarks (source, last_article_id)
                       VALUES (?1, ?2)
                       ON CONFLICT(source) DO UPDATE SET
                           last_article_id = excluded.last_article_id,
                           updated_at = datetime('now')"#,
                    params![source.as_str(), last_article_id],
                )?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    /// Insert-only. Fails on the UNIQUE constraint when the source already has a row.
    pub async fn create_watermark(&self, source: Source, last_article_id: i64) -> Result<()> {
        self.conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO watermarks (source, last_article_id) VALUES (?1, ?2)",
                    params![source.as_str(), last_article_id],
                )?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    pub async fn list_watermarks(&self) -> Result<Vec<Watermark>> {
        let rows = self
            .conn
            .call(|conn| {
                let mut stmt = conn.prepare(
                    "SELECT source, last_article_id, updated_at FROM watermarks ORDER BY source",
                )?;
                let rows = stmt
                    .query_map([], |row| {
                        Ok((
                            row.get::<_, String>(0)?,
                            row.get::<_, i64>(1)?,
                            row.get::<_, String>(2)?,
                        ))
                    })?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await?;

        let watermarks = rows
            .into_iter()
            .filter_map(|(source, last_article_id, updated_at)| match source.parse() {
                Ok(source) => Some(Watermark {
                    source,
                    last_article_id,
                    updated_at: parse_datetime(&updated_at).unwrap_or_else(Utc::now),
                }),
                Err(_) => {
                    tracing::warn!("Ignoring watermark row for unknown source {}", source);
                    None
                }
            })
            .collect();
        Ok(watermarks)
    }

    // Subscriber operations

    /// Returns `true` when the chat was not registered before.
    pub async fn register_subscriber(&self, chat_id: i64) -> Result<bool> {
        let inserted = self
            .conn
            .call(move |conn| {
                let changed = conn.execute(
                    "INSERT OR IGNORE INTO subscribers (chat_id) VALUES (?1)",
                    params![chat_id],
                )?;
                Ok(changed > 0)
            })
            .await?;
        Ok(inserted)
    }

    pub async fn list_subscribers(&self) -> Result<Vec<i64>> {
        let chat_ids = self
            .conn
            .call(|conn| {
                let mut stmt = conn.prepare("SELECT chat_id FROM subscribers ORDER BY id")?;
                let chat_ids = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<std::result::Result<Vec<i64>, _>>()?;
                Ok(chat_ids)
            })
            .await?;
        Ok(chat_ids)
    }

    pub async fn subscriber_exists(&self, chat_id: i64) -> Result<bool> {
        let exists = self
            .conn
            .call(move |conn| {
                let count: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM subscribers WHERE chat_id = ?1",
                    params![chat_id],
                    |row| row.get(0),
                )?;
                Ok(count > 0)
            })
            .await?;
        Ok(exists)
    }

    pub async fn subscriber_count(&self) -> Result<usize> {
        let count = self
            .conn
            .call(|conn| {
                let count: i64 =
                    conn.query_row("SELECT COUNT(*) FROM subscribers", [], |row| row.get(0))?;
                Ok(count)
            })
            .await?;
        Ok(usize::try_from(count).unwrap_or_default())
    }
}

fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    // SQLite datetime('now') format, e.g. "2026-01-11 12:34:56"
    if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    None
}
