use std::sync::Arc;

use serde::Serialize;

use crate::ai::Translate;
use crate::db::Repository;
use crate::error::Result;
use crate::models::{NewTranslation, QueueItem};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub completed: usize,
    pub failed: usize,
    pub total: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DrainSummary {
    pub processed: usize,
    pub completed: usize,
    pub failed: usize,
    pub batches: usize,
}

enum ItemOutcome {
    AlreadyTranslated,
    Translated,
}

/// Drains the translation queue table, one item at a time.
pub struct QueueWorker {
    repository: Arc<Repository>,
    translator: Arc<dyn Translate>,
}

impl QueueWorker {
    pub fn new(repository: Arc<Repository>, translator: Arc<dyn Translate>) -> Self {
        Self {
            repository,
            translator,
        }
    }

    /// Processes up to `batch_size` pending items sequentially.
    ///
    /// Item failures are recorded on the item and never abort the batch. Only a
    /// failure to read the queue itself is returned as an error.
    pub async fn process_batch(&self, batch_size: usize) -> Result<BatchSummary> {
        let items = self.repository.get_pending_translations(batch_size).await?;
        let mut summary = BatchSummary {
            total: items.len(),
            ..BatchSummary::default()
        };

        if items.is_empty() {
            tracing::debug!("No pending translations");
            return Ok(summary);
        }

        tracing::info!("Processing {} queued translations", items.len());

        for item in items {
            match self.process_item(&item).await {
                Ok(ItemOutcome::AlreadyTranslated) => {
                    tracing::debug!(
                        "Translation for {} ({}) already exists, marked completed",
                        item.content_key,
                        item.target_language
                    );
                    summary.completed += 1;
                }
                Ok(ItemOutcome::Translated) => {
                    tracing::debug!("Translated {} to {}", item.content_key, item.target_language);
                    summary.completed += 1;
                }
                Err(e) => {
                    tracing::warn!(
                        "Failed to translate {} to {}: {}",
                        item.content_key,
                        item.target_language,
                        e
                    );
                    if let Err(mark_err) = self.repository.mark_failed(item.id, e.to_string()).await {
                        tracing::error!("Failed to mark queue item {} as failed: {}", item.id, mark_err);
                    }
                    summary.failed += 1;
                }
            }
        }

        tracing::info!(
            "Queue batch done: {} completed, {} failed, {} total",
            summary.completed,
            summary.failed,
            summary.total
        );

        Ok(summary)
    }

    async fn process_item(&self, item: &QueueItem) -> Result<ItemOutcome> {
        if self
            .repository
            .find_translation(&item.content_key, &item.target_language, &item.original_text)
            .await?
            .is_some()
        {
            self.repository.mark_completed(item.id).await?;
            return Ok(ItemOutcome::AlreadyTranslated);
        }

        let translated_text = self
            .translator
            .translate(&item.original_text, &item.target_language)
            .await?;

        self.repository
            .upsert_translation(NewTranslation {
                content_key: item.content_key.clone(),
                original_text: item.original_text.clone(),
                translated_text,
                target_language: item.target_language.clone(),
                page_path: item.page_path.clone(),
            })
            .await?;
        self.repository.mark_completed(item.id).await?;

        Ok(ItemOutcome::Translated)
    }

    /// Runs batches until the queue is empty, `max_batches` have run, or
    /// `failure_limit` failures have accumulated.
    pub async fn drain(
        &self,
        batch_size: usize,
        max_batches: usize,
        failure_limit: usize,
    ) -> Result<DrainSummary> {
        let mut summary = DrainSummary::default();

        while summary.batches < max_batches {
            let batch = self.process_batch(batch_size).await?;
            if batch.total == 0 {
                break;
            }

            summary.batches += 1;
            summary.processed += batch.total;
            summary.completed += batch.completed;
            summary.failed += batch.failed;

            if summary.failed >= failure_limit {
                tracing::warn!(
                    "Stopping queue drain after {} failures (limit {})",
                    summary.failed,
                    failure_limit
                );
                break;
            }
        }

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewQueueItem, QueueStatus};
    use crate::services::testing::FakeTranslator;

    fn item(key: &str, text: &str, lang: &str) -> NewQueueItem {
        NewQueueItem {
            content_key: key.to_string(),
            original_text: text.to_string(),
            target_language: lang.to_string(),
            page_path: Some("/jobs".to_string()),
        }
    }

    async fn setup(fake: FakeTranslator) -> (Arc<Repository>, Arc<FakeTranslator>, QueueWorker) {
        let repository = Arc::new(Repository::new(":memory:").await.unwrap());
        let fake = Arc::new(fake);
        let worker = QueueWorker::new(repository.clone(), fake.clone());
        (repository, fake, worker)
    }

    #[tokio::test]
    async fn translates_and_stores_pending_items() {
        let (repo, fake, worker) = setup(FakeTranslator::new()).await;
        let id = repo.enqueue(item("jobs.title", "Jobs", "es")).await.unwrap();

        let summary = worker.process_batch(10).await.unwrap();

        assert_eq!(summary, BatchSummary { completed: 1, failed: 0, total: 1 });
        assert_eq!(fake.calls(), 1);
        let stored = repo.find_translation("jobs.title", "es", "Jobs").await.unwrap().unwrap();
        assert_eq!(stored.translated_text, "[es] Jobs");
        assert_eq!(stored.page_path.as_deref(), Some("/jobs"));
        let queued = repo.get_queue_item(id).await.unwrap().unwrap();
        assert_eq!(queued.status, QueueStatus::Completed);
        assert!(queued.processed_at.is_some());
    }

    #[tokio::test]
    async fn existing_translation_short_circuits_and_reruns_are_noops() {
        let (repo, fake, worker) = setup(FakeTranslator::new()).await;
        repo.upsert_translation(NewTranslation {
            content_key: "nav.events".to_string(),
            original_text: "Events".to_string(),
            translated_text: "Eventos".to_string(),
            target_language: "es".to_string(),
            page_path: None,
        })
        .await
        .unwrap();
        let id = repo.enqueue(item("nav.events", "Events", "es")).await.unwrap();

        let first = worker.process_batch(10).await.unwrap();
        assert_eq!(first, BatchSummary { completed: 1, failed: 0, total: 1 });
        assert_eq!(fake.calls(), 0);
        assert_eq!(
            repo.get_queue_item(id).await.unwrap().unwrap().status,
            QueueStatus::Completed
        );

        let second = worker.process_batch(10).await.unwrap();
        assert_eq!(second, BatchSummary::default());
        assert_eq!(fake.calls(), 0);
        let stored = repo.find_translation("nav.events", "es", "Events").await.unwrap().unwrap();
        assert_eq!(stored.translated_text, "Eventos");
    }

    #[tokio::test]
    async fn one_failure_does_not_abort_the_batch() {
        let (repo, fake, worker) = setup(FakeTranslator::failing_on(&["Resources"])).await;
        let a = repo.enqueue(item("nav.events", "Events", "ht")).await.unwrap();
        let b = repo.enqueue(item("nav.resources", "Resources", "ht")).await.unwrap();
        let c = repo.enqueue(item("nav.jobs", "Jobs", "ht")).await.unwrap();

        let summary = worker.process_batch(10).await.unwrap();

        assert_eq!(summary, BatchSummary { completed: 2, failed: 1, total: 3 });
        assert_eq!(fake.calls(), 3);

        for id in [a, c] {
            let done = repo.get_queue_item(id).await.unwrap().unwrap();
            assert_eq!(done.status, QueueStatus::Completed);
            let record = repo
                .find_translation(&done.content_key, &done.target_language, &done.original_text)
                .await
                .unwrap()
                .unwrap();
            assert!(!record.translated_text.is_empty());
        }

        let failed = repo.get_queue_item(b).await.unwrap().unwrap();
        assert_eq!(failed.status, QueueStatus::Failed);
        assert!(failed.error_message.unwrap().contains("503"));
        assert!(repo.find_translation("nav.resources", "ht", "Resources").await.unwrap().is_none());

        // Failed items stay failed until something resets them
        assert_eq!(worker.process_batch(10).await.unwrap().total, 0);
        assert_eq!(fake.calls(), 3);
    }

    #[tokio::test]
    async fn drain_runs_until_queue_is_empty() {
        let (repo, _fake, worker) = setup(FakeTranslator::new()).await;
        for i in 0..5 {
            repo.enqueue(item(&format!("key.{}", i), "Hello", "he")).await.unwrap();
        }

        let summary = worker.drain(2, 10, 10).await.unwrap();

        assert_eq!(
            summary,
            DrainSummary { processed: 5, completed: 5, failed: 0, batches: 3 }
        );
        assert_eq!(repo.queue_stats().await.unwrap().pending, 0);
    }

    #[tokio::test]
    async fn drain_stops_at_failure_limit() {
        let (repo, _fake, worker) = setup(FakeTranslator::failing_on(&["Broken"])).await;
        for i in 0..4 {
            repo.enqueue(item(&format!("bad.{}", i), "Broken", "es")).await.unwrap();
        }
        repo.enqueue(item("good", "Fine", "es")).await.unwrap();

        let summary = worker.drain(2, 10, 2).await.unwrap();

        assert_eq!(summary.batches, 1);
        assert_eq!(summary.failed, 2);
        let stats = repo.queue_stats().await.unwrap();
        assert_eq!(stats.pending, 3);
        assert_eq!(stats.failed, 2);
    }
}
