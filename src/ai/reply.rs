use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

use crate::error::{AppError, Result};

static CODE_FENCE: OnceLock<Option<Regex>> = OnceLock::new();

/// Content of a chat completion, classified by whether it carried structured output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelReply {
    /// A JSON object with a `translated_text` or `translation` field.
    Parsed(String),
    /// Anything else: the raw content as returned.
    Unparsed(String),
}

impl ModelReply {
    pub fn classify(content: &str) -> Self {
        let trimmed = content.trim();
        if trimmed.starts_with('{') {
            if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(trimmed) {
                let field = map
                    .get("translated_text")
                    .or_else(|| map.get("translation"))
                    .and_then(Value::as_str);
                if let Some(text) = field {
                    return ModelReply::Parsed(text.to_string());
                }
            }
        }
        ModelReply::Unparsed(content.to_string())
    }

    /// Final translation text. Unparsed replies go through the plain-text cleanup.
    pub fn into_text(self) -> Result<String> {
        let text = match self {
            ModelReply::Parsed(text) => text.trim().to_string(),
            ModelReply::Unparsed(raw) => clean_plain_text(&raw),
        };
        if text.is_empty() {
            return Err(AppError::EmptyTranslation);
        }
        Ok(text)
    }
}

fn clean_plain_text(raw: &str) -> String {
    let mut text = raw.trim();

    let fence = CODE_FENCE.get_or_init(|| Regex::new(r"(?s)^```[A-Za-z0-9_-]*\s*\n(.*?)\n?```$").ok());
    let unfenced;
    if let Some(caps) = fence.as_ref().and_then(|re| re.captures(text)) {
        unfenced = caps.get(1).map(|m| m.as_str().to_string()).unwrap_or_default();
        text = unfenced.trim();
    }

    for (open, close) in [('"', '"'), ('“', '”'), ('\'', '\'')] {
        if text.chars().count() >= 2 && text.starts_with(open) && text.ends_with(close) {
            let inner = &text[open.len_utf8()..text.len() - close.len_utf8()];
            // Only strip when the quotes wrap the whole reply
            if !inner.contains(close) {
                text = inner.trim();
            }
            break;
        }
    }

    text.to_string()
}
