use crate::api::ArticleClient;
use crate::bot::{self, BotHandler};
use crate::config::Config;
use crate::db::Repository;
use crate::error::Result;
use crate::models::Watermark;
use crate::registry::SubscriberRegistry;
use crate::services::{LogMessenger, Messenger, TelegramClient};
use crate::sync::{reconcile, scheduler, Notifier, Schedule, TickReport};

pub struct Status {
    pub watermarks: Vec<Watermark>,
    pub subscribers: usize,
}

pub struct App {
    config: Config,
    repository: Repository,
    articles: ArticleClient,
    telegram: Option<TelegramClient>,
    log_messenger: LogMessenger,
}

impl App {
    pub async fn new(config: Config) -> Result<Self> {
        let repository = Repository::open(&config.db_path).await?;
        tracing::debug!("Opened state database at {}", config.db_path);

        let articles = ArticleClient::new(&config)?;

        let telegram = config
            .telegram_token
            .as_deref()
            .map(|token| TelegramClient::new(token, config.request_timeout()))
            .transpose()?;

        Ok(Self {
            config,
            repository,
            articles,
            telegram,
            log_messenger: LogMessenger,
        })
    }

    fn messenger(&self) -> &dyn Messenger {
        match &self.telegram {
            Some(telegram) => telegram,
            None => &self.log_messenger,
        }
    }

    fn notifier(&self) -> Notifier<'_> {
        Notifier::new(&self.repository, &self.articles, self.messenger())
    }

    /// Returns how many sources were reconciled successfully.
    pub async fn reconcile(&self) -> usize {
        reconcile::reconcile_all(&self.repository, &self.articles).await
    }

    /// One-shot mode: reconcile, then a single tick.
    pub async fn run_once(&self) -> Result<TickReport> {
        self.reconcile().await;
        self.notifier().tick().await
    }

    /// Reconciles, then polls and serves bot commands until Ctrl-C.
    pub async fn run(&self) -> Result<()> {
        self.reconcile().await;

        let notifier = self.notifier();
        let schedule = Schedule {
            period: self.config.poll_interval(),
            backoff: self.config.retry_backoff(),
        };
        let handler = BotHandler::new(&self.repository, &self.articles);

        let commands = async {
            match &self.telegram {
                Some(telegram) => bot::run(telegram, &handler, self.config.retry_backoff()).await,
                None => {
                    tracing::warn!("No telegram_token configured, notifications are only logged");
                    std::future::pending::<()>().await
                }
            }
        };

        tracing::info!(
            "Polling {} every {} minute(s)",
            self.config.api_base_url,
            self.config.poll_interval_minutes
        );

        tokio::select! {
            _ = scheduler::run(&notifier, schedule, std::future::pending::<()>()) => {}
            _ = commands => {}
            signal = tokio::signal::ctrl_c() => {
                signal?;
                tracing::info!("Shutdown signal received, stopping");
            }
        }

        Ok(())
    }

    pub async fn subscribe(&self, chat_id: i64) -> Result<bool> {
        SubscriberRegistry::new(&self.repository)
            .register(chat_id)
            .await
    }

    pub async fn status(&self) -> Result<Status> {
        Ok(Status {
            watermarks: self.repository.list_watermarks().await?,
            subscribers: self.repository.subscriber_count().await?,
        })
    }

    pub async fn close(self) -> Result<()> {
        self.repository.close().await
    }
}
