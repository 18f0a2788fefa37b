use crate::db::Repository;
use crate::error::Result;

/// Chats that opted in to notifications through `/start`.
pub struct SubscriberRegistry<'a> {
    repository: &'a Repository,
}

impl<'a> SubscriberRegistry<'a> {
    pub fn new(repository: &'a Repository) -> Self {
        Self { repository }
    }

    /// Registers the chat unless it is already known. Returns `true` for a new subscriber.
    pub async fn register(&self, chat_id: i64) -> Result<bool> {
        if self.repository.subscriber_exists(chat_id).await? {
            return Ok(false);
        }
        let added = self.repository.register_subscriber(chat_id).await?;
        if added {
            tracing::info!(chat_id, "New subscriber");
        }
        Ok(added)
    }

    pub async fn all(&self) -> Result<Vec<i64>> {
        self.repository.list_subscribers().await
    }
}
