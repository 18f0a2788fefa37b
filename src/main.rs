use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod api;
mod app;
mod bot;
mod cli;
mod config;
mod db;
mod error;
mod models;
mod registry;
mod services;
mod sync;
#[cfg(test)]
mod testing;

use app::App;
use cli::{Cli, Command};
use config::Config;
use models::Source;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Initialize logging (RUST_LOG overrides the default level)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let command = cli.command();

    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;

    if command == Command::Run && config.startup_delay_secs > 0 {
        tracing::info!("Waiting {}s for the blog API to come up", config.startup_delay_secs);
        tokio::time::sleep(Duration::from_secs(config.startup_delay_secs)).await;
    }

    let app = App::new(config).await.context("Failed to initialize")?;
    let result = execute(&app, command).await;
    app.close().await.context("Failed to close the state database")?;
    result
}

async fn execute(app: &App, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Run => {
            tracing::info!("Starting blog notifier");
            app.run().await?;
        }
        Command::Tick => {
            let report = app.run_once().await.context("Tick failed")?;
            println!(
                "{} new article(s) ({} native, {} scraped), {} message(s) sent, {} failed",
                report.new_articles(),
                report.new_native,
                report.new_scraped,
                report.sent,
                report.failed
            );
        }
        Command::Reconcile => {
            let reconciled = app.reconcile().await;
            println!("Reconciled {} of {} sources", reconciled, Source::ALL.len());
        }
        Command::Subscribe { chat_id } => {
            if app.subscribe(chat_id).await? {
                println!("Subscribed chat {}", chat_id);
            } else {
                println!("Chat {} was already subscribed", chat_id);
            }
        }
        Command::Status => {
            let status = app.status().await?;
            for watermark in &status.watermarks {
                println!(
                    "{:<8} last article {:>6}  (updated {})",
                    watermark.source,
                    watermark.last_article_id,
                    watermark.updated_at.format("%Y-%m-%d %H:%M:%S")
                );
            }
            if status.watermarks.is_empty() {
                println!("No watermarks recorded yet");
            }
            println!("{} subscriber(s)", status.subscribers);
        }
    }
    Ok(())
}
