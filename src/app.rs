use std::sync::Arc;
use std::time::Duration;

use crate::ai::{ChatTranslator, Translate};
use crate::config::Config;
use crate::db::Repository;
use crate::error::Result;
use crate::models::{NewQueueItem, QueueStats};
use crate::services::{
    Backfill, BackfillSummary, BatchSummary, DrainSummary, OnDemandTranslator, QueueWorker,
    TranslateRequest, TranslateResponse,
};

/// Everything one invocation needs, shared by the HTTP routes and the headless flags.
pub struct App {
    config: Config,
    repository: Arc<Repository>,
    worker: QueueWorker,
    backfill: Backfill,
    on_demand: OnDemandTranslator,
}

impl App {
    pub async fn new(config: &Config) -> Result<Self> {
        let repository = Arc::new(Repository::new(&config.db_path).await?);
        let translator = ChatTranslator::new(config)?;

        if config.api_key.is_none() {
            tracing::warn!("No translation API key configured, every translation will fail");
        }
        tracing::info!(
            "Using model {} at {}",
            translator.model_version(),
            config.api_base_url
        );

        Ok(Self::with_translator(config, repository, Arc::new(translator)))
    }

    pub fn with_translator(
        config: &Config,
        repository: Arc<Repository>,
        translator: Arc<dyn Translate>,
    ) -> Self {
        let worker = QueueWorker::new(repository.clone(), translator.clone());
        let backfill = Backfill::new(
            repository.clone(),
            translator.clone(),
            config.target_languages.clone(),
            config.backfill_batch_size,
            Duration::from_millis(config.backfill_delay_ms),
        );
        let on_demand = OnDemandTranslator::new(repository.clone(), translator);

        Self {
            config: config.clone(),
            repository,
            worker,
            backfill,
            on_demand,
        }
    }

    pub async fn process_queue(&self, batch_size: Option<usize>) -> Result<BatchSummary> {
        let batch_size = batch_size
            .filter(|n| *n > 0)
            .unwrap_or(self.config.queue_batch_size);
        self.worker.process_batch(batch_size).await
    }

    pub async fn drain_queue(&self) -> Result<DrainSummary> {
        self.worker
            .drain(
                self.config.queue_batch_size,
                self.config.drain_max_batches,
                self.config.drain_failure_limit,
            )
            .await
    }

    pub async fn backfill(&self) -> Result<BackfillSummary> {
        self.backfill.run().await
    }

    pub async fn translate_content(&self, request: TranslateRequest) -> Result<TranslateResponse> {
        self.on_demand.translate(request).await
    }

    pub async fn enqueue(&self, item: NewQueueItem) -> Result<i64> {
        self.repository.enqueue(item).await
    }

    pub async fn retry_failed(&self) -> Result<usize> {
        let count = self.repository.reset_failed().await?;
        tracing::info!("Reset {} failed queue items to pending", count);
        Ok(count)
    }

    pub async fn queue_stats(&self) -> Result<QueueStats> {
        self.repository.queue_stats().await
    }
}
