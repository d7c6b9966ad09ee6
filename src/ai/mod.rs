mod languages;
mod reply;
mod translator;

pub use languages::BACKFILL_LANGUAGES;
pub use translator::{ChatTranslator, Translate};
