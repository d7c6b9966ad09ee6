use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use serde::Serialize;

use crate::ai::Translate;
use crate::db::Repository;
use crate::error::Result;
use crate::models::{NewTranslation, TranslationRecord};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingTranslation {
    pub content_key: String,
    pub original_text: String,
    pub target_language: String,
    pub page_path: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BackfillSummary {
    pub total: usize,
    pub completed: usize,
}

#[derive(Default)]
struct SourceString {
    languages: BTreeSet<String>,
    page_path: Option<String>,
}

/// Every (source string, language) pair with no translation yet.
///
/// Source strings are the distinct `(content_key, original_text)` pairs seen in
/// `records`; each one needs every language in `languages` it does not already have.
pub fn missing_translations(
    records: &[TranslationRecord],
    languages: &[String],
) -> Vec<MissingTranslation> {
    let mut sources: BTreeMap<(&str, &str), SourceString> = BTreeMap::new();
    for record in records {
        let entry = sources
            .entry((record.content_key.as_str(), record.original_text.as_str()))
            .or_default();
        entry.languages.insert(record.target_language.clone());
        if entry.page_path.is_none() {
            entry.page_path = record.page_path.clone();
        }
    }

    sources
        .into_iter()
        .flat_map(|((content_key, original_text), source)| {
            languages
                .iter()
                .filter(|lang| !source.languages.contains(*lang))
                .map(|lang| MissingTranslation {
                    content_key: content_key.to_string(),
                    original_text: original_text.to_string(),
                    target_language: lang.clone(),
                    page_path: source.page_path.clone(),
                })
                .collect::<Vec<_>>()
        })
        .collect()
}

/// Fills gaps in the translations table for a fixed language list.
pub struct Backfill {
    repository: Arc<Repository>,
    translator: Arc<dyn Translate>,
    languages: Vec<String>,
    batch_size: usize,
    delay: Duration,
}

impl Backfill {
    pub fn new(
        repository: Arc<Repository>,
        translator: Arc<dyn Translate>,
        languages: Vec<String>,
        batch_size: usize,
        delay: Duration,
    ) -> Self {
        Self {
            repository,
            translator,
            languages,
            batch_size: batch_size.max(1),
            delay,
        }
    }

    /// Translates every missing pair, `batch_size` at a time, pausing between batches.
    pub async fn run(&self) -> Result<BackfillSummary> {
        let records = self.repository.source_translations().await?;
        let needed = missing_translations(&records, &self.languages);

        let mut summary = BackfillSummary {
            total: needed.len(),
            ..BackfillSummary::default()
        };

        if needed.is_empty() {
            tracing::info!("Backfill: all {} languages are covered", self.languages.len());
            return Ok(summary);
        }

        let batch_count = needed.len().div_ceil(self.batch_size);
        tracing::info!(
            "Backfill: {} translations needed in {} batches",
            needed.len(),
            batch_count
        );

        for (index, batch) in needed.chunks(self.batch_size).enumerate() {
            if index > 0 && !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }

            let results = join_all(batch.iter().map(|missing| self.fill(missing))).await;

            for (missing, result) in batch.iter().zip(results) {
                match result {
                    Ok(()) => summary.completed += 1,
                    Err(e) => tracing::warn!(
                        "Backfill failed for {} ({}): {}",
                        missing.content_key,
                        missing.target_language,
                        e
                    ),
                }
            }

            tracing::debug!("Backfill batch {}/{} done", index + 1, batch_count);
        }

        tracing::info!(
            "Backfill done: {}/{} translations stored",
            summary.completed,
            summary.total
        );

        Ok(summary)
    }

    async fn fill(&self, missing: &MissingTranslation) -> Result<()> {
        let translated_text = self
            .translator
            .translate(&missing.original_text, &missing.target_language)
            .await?;

        self.repository
            .upsert_translation(NewTranslation {
                content_key: missing.content_key.clone(),
                original_text: missing.original_text.clone(),
                translated_text,
                target_language: missing.target_language.clone(),
                page_path: missing.page_path.clone(),
            })
            .await
    }
}
