use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Every stored translation is made from English.
pub const SOURCE_LANGUAGE: &str = "en";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationRecord {
    pub id: i64,
    pub content_key: String,
    pub original_text: String,
    pub translated_text: String,
    pub source_language: String,
    pub target_language: String,
    pub page_path: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewTranslation {
    pub content_key: String,
    pub original_text: String,
    pub translated_text: String,
    pub target_language: String,
    pub page_path: Option<String>,
}
