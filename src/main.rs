use std::sync::Arc;

mod ai;
mod app;
mod config;
mod db;
mod error;
mod models;
mod server;
mod services;

use app::App;
use config::Config;
use error::{AppError, Result};
use models::NewQueueItem;

const USAGE: &str = "usage: portal-translations [--process-queue [N] | --drain-queue | --backfill | --retry-failed | --enqueue <content_key> <target_language> <text>]";

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging (info and above unless RUST_LOG says otherwise)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    // Parse command line arguments
    let args: Vec<String> = std::env::args().collect();

    // Load configuration
    let config = Config::load()?;

    // Initialize app
    let app = App::new(&config).await?;

    match args.get(1).map(String::as_str) {
        None => {
            server::serve(Arc::new(app), &config.bind_address).await?;
        }
        Some("--process-queue") => {
            let batch_size = match args.get(2) {
                Some(n) => Some(n.parse::<usize>().map_err(|_| {
                    AppError::Validation(format!("batch size must be a number, got {}", n))
                })?),
                None => None,
            };
            let summary = app.process_queue(batch_size).await?;
            println!(
                "Processed {} queued translations: {} completed, {} failed",
                summary.total, summary.completed, summary.failed
            );
        }
        Some("--drain-queue") => {
            let summary = app.drain_queue().await?;
            println!(
                "Drained {} queued translations in {} batches: {} completed, {} failed",
                summary.processed, summary.batches, summary.completed, summary.failed
            );
        }
        Some("--backfill") => {
            let summary = app.backfill().await?;
            println!(
                "Backfilled {} of {} missing translations",
                summary.completed, summary.total
            );
        }
        Some("--retry-failed") => {
            let count = app.retry_failed().await?;
            println!("Re-queued {} failed translations", count);
        }
        Some("--enqueue") if args.len() >= 5 => {
            let id = app
                .enqueue(NewQueueItem {
                    content_key: args[2].clone(),
                    target_language: args[3].clone(),
                    original_text: args[4..].join(" "),
                    page_path: None,
                })
                .await?;
            println!("Queued translation {}", id);
        }
        Some(_) => {
            eprintln!("{}", USAGE);
            std::process::exit(2);
        }
    }

    Ok(())
}
