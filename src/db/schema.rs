pub const SCHEMA: &str = r#"
-- translations table
CREATE TABLE IF NOT EXISTS translations (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    content_key TEXT NOT NULL,
    original_text TEXT NOT NULL,
    translated_text TEXT NOT NULL,
    source_language TEXT NOT NULL DEFAULT 'en',
    target_language TEXT NOT NULL,
    page_path TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now')),
    UNIQUE(content_key, target_language, source_language, original_text)
);

CREATE INDEX IF NOT EXISTS idx_translations_key_lang ON translations(content_key, target_language);
CREATE INDEX IF NOT EXISTS idx_translations_source ON translations(source_language);

-- translation_queue table (rows are inserted by content-authoring flows)
CREATE TABLE IF NOT EXISTS translation_queue (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    content_key TEXT NOT NULL,
    original_text TEXT NOT NULL,
    target_language TEXT NOT NULL,
    page_path TEXT,
    status TEXT NOT NULL DEFAULT 'pending' CHECK (status IN ('pending', 'completed', 'failed')),
    error_message TEXT,
    processed_at TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_translation_queue_status ON translation_queue(status, created_at);
"#;
