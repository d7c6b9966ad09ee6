mod queue;
mod translation;

pub use queue::{NewQueueItem, QueueItem, QueueStats, QueueStatus};
pub use translation::{NewTranslation, TranslationRecord, SOURCE_LANGUAGE};
