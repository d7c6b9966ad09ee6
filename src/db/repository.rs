use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};
use tokio_rusqlite::Connection;

use crate::error::Result;
use crate::models::{
    NewQueueItem, NewTranslation, QueueItem, QueueStats, QueueStatus, TranslationRecord,
    SOURCE_LANGUAGE,
};

use super::schema::SCHEMA;

pub struct Repository {
    conn: Connection,
}

impl Repository {
    pub async fn new(db_path: &str) -> Result<Self> {
        let conn = Connection::open(db_path).await?;

        conn.call(|conn| {
            conn.execute_batch(SCHEMA)?;
            Ok(())
        })
        .await?;

        Ok(Self { conn })
    }

    // Translation operations

    /// Translation for a key/language pair. A row made from `original_text` wins;
    /// otherwise the most recently updated row for the pair is returned.
    pub async fn find_translation(
        &self,
        content_key: &str,
        target_language: &str,
        original_text: &str,
    ) -> Result<Option<TranslationRecord>> {
        let content_key = content_key.to_string();
        let target_language = target_language.to_string();
        let original_text = original_text.to_string();
        let record = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    r#"SELECT id, content_key, original_text, translated_text, source_language,
                              target_language, page_path, created_at, updated_at
                       FROM translations
                       WHERE content_key = ?1 AND target_language = ?2
                       ORDER BY (original_text = ?3) DESC, updated_at DESC, id DESC
                       LIMIT 1"#,
                )?;
                let record = stmt
                    .query_row(
                        params![content_key, target_language, original_text],
                        translation_from_row,
                    )
                    .optional()?;
                Ok(record)
            })
            .await?;
        Ok(record)
    }

    pub async fn upsert_translation(&self, translation: NewTranslation) -> Result<()> {
        self.conn
            .call(move |conn| {
                conn.execute(
                    r#"INSERT INTO translations
                           (content_key, original_text, translated_text, source_language, target_language, page_path)
                       VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                       ON CONFLICT(content_key, target_language, source_language, original_text) DO UPDATE SET
                           translated_text = excluded.translated_text,
                           page_path = COALESCE(excluded.page_path, translations.page_path),
                           updated_at = datetime('now')"#,
                    params![
                        translation.content_key,
                        translation.original_text,
                        translation.translated_text,
                        SOURCE_LANGUAGE,
                        translation.target_language,
                        translation.page_path,
                    ],
                )?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    /// Every translation made from English, the input of the backfill job.
    pub async fn source_translations(&self) -> Result<Vec<TranslationRecord>> {
        let records = self
            .conn
            .call(|conn| {
                let mut stmt = conn.prepare(
                    r#"SELECT id, content_key, original_text, translated_text, source_language,
                              target_language, page_path, created_at, updated_at
                       FROM translations
                       WHERE source_language = ?1
                       ORDER BY content_key, id"#,
                )?;
                let records = stmt
                    .query_map(params![SOURCE_LANGUAGE], translation_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(records)
            })
            .await?;
        Ok(records)
    }

    // Queue operations

    pub async fn enqueue(&self, item: NewQueueItem) -> Result<i64> {
        let id = self
            .conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO translation_queue (content_key, original_text, target_language, page_path) VALUES (?1, ?2, ?3, ?4)",
                    params![item.content_key, item.original_text, item.target_language, item.page_path],
                )?;
                Ok(conn.last_insert_rowid())
            })
            .await?;
        Ok(id)
    }

    /// Pending items, oldest first.
    pub async fn get_pending_translations(&self, batch_size: usize) -> Result<Vec<QueueItem>> {
        let limit = i64::try_from(batch_size).unwrap_or(i64::MAX);
        let items = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    r#"SELECT id, content_key, original_text, target_language, page_path,
                              status, error_message, processed_at, created_at
                       FROM translation_queue
                       WHERE status = 'pending'
                       ORDER BY created_at, id
                       LIMIT ?1"#,
                )?;
                let items = stmt
                    .query_map(params![limit], queue_item_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(items)
            })
            .await?;
        Ok(items)
    }

    pub async fn get_queue_item(&self, id: i64) -> Result<Option<QueueItem>> {
        let item = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    r#"SELECT id, content_key, original_text, target_language, page_path,
                              status, error_message, processed_at, created_at
                       FROM translation_queue WHERE id = ?1"#,
                )?;
                let item = stmt.query_row(params![id], queue_item_from_row).optional()?;
                Ok(item)
            })
            .await?;
        Ok(item)
    }

    pub async fn mark_completed(&self, id: i64) -> Result<()> {
        let processed_at = Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| {
                conn.execute(
                    "UPDATE translation_queue SET status = ?1, error_message = NULL, processed_at = ?2 WHERE id = ?3",
                    params![QueueStatus::Completed.as_str(), processed_at, id],
                )?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    pub async fn mark_failed(&self, id: i64, error_message: String) -> Result<()> {
        let processed_at = Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| {
                conn.execute(
                    "UPDATE translation_queue SET status = ?1, error_message = ?2, processed_at = ?3 WHERE id = ?4",
                    params![QueueStatus::Failed.as_str(), error_message, processed_at, id],
                )?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    /// Puts every failed item back to pending. Returns how many were reset.
    pub async fn reset_failed(&self) -> Result<usize> {
        let count = self
            .conn
            .call(|conn| {
                let count = conn.execute(
                    "UPDATE translation_queue SET status = 'pending', error_message = NULL, processed_at = NULL WHERE status = 'failed'",
                    [],
                )?;
                Ok(count)
            })
            .await?;
        Ok(count)
    }

    pub async fn queue_stats(&self) -> Result<QueueStats> {
        let stats = self
            .conn
            .call(|conn| {
                let mut stmt =
                    conn.prepare("SELECT status, COUNT(*) FROM translation_queue GROUP BY status")?;
                let rows = stmt
                    .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?
                    .collect::<std::result::Result<Vec<_>, _>>()?;

                let mut stats = QueueStats::default();
                for (status, count) in rows {
                    let count = u64::try_from(count).unwrap_or(0);
                    match QueueStatus::parse(&status) {
                        QueueStatus::Pending => stats.pending += count,
                        QueueStatus::Completed => stats.completed += count,
                        QueueStatus::Failed => stats.failed += count,
                    }
                }
                Ok(stats)
            })
            .await?;
        Ok(stats)
    }
}

fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    // Try RFC3339 first (e.g., "2026-01-11T12:34:56+00:00")
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    // Try SQLite datetime format (e.g., "2026-01-11 12:34:56")
    if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    None
}

fn timestamp(row: &Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    Ok(row
        .get::<_, String>(idx)
        .ok()
        .and_then(|s| parse_datetime(&s))
        .unwrap_or_else(Utc::now))
}

fn translation_from_row(row: &Row) -> rusqlite::Result<TranslationRecord> {
    Ok(TranslationRecord {
        id: row.get(0)?,
        content_key: row.get(1)?,
        original_text: row.get(2)?,
        translated_text: row.get(3)?,
        source_language: row.get(4)?,
        target_language: row.get(5)?,
        page_path: row.get(6)?,
        created_at: timestamp(row, 7)?,
        updated_at: timestamp(row, 8)?,
    })
}

fn queue_item_from_row(row: &Row) -> rusqlite::Result<QueueItem> {
    Ok(QueueItem {
        id: row.get(0)?,
        content_key: row.get(1)?,
        original_text: row.get(2)?,
        target_language: row.get(3)?,
        page_path: row.get(4)?,
        status: QueueStatus::parse(&row.get::<_, String>(5)?),
        error_message: row.get(6)?,
        processed_at: row
            .get::<_, Option<String>>(7)?
            .and_then(|s| parse_datetime(&s)),
        created_at: timestamp(row, 8)?,
    })
}
