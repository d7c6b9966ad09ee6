use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::ai::Translate;
use crate::db::Repository;
use crate::error::{AppError, Result};
use crate::models::NewTranslation;

/// Body of a translate-content call. Required fields are optional here so a
/// missing one is reported as a validation error rather than a parse failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TranslateRequest {
    pub content_key: Option<String>,
    pub original_text: Option<String>,
    pub target_language: Option<String>,
    pub page_path: Option<String>,
    pub element_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TranslateResponse {
    pub translated_text: String,
    pub cached: bool,
}

struct ValidRequest {
    content_key: String,
    original_text: String,
    target_language: String,
    page_path: Option<String>,
}

impl TranslateRequest {
    fn validate(self) -> Result<ValidRequest> {
        fn required(value: Option<String>, name: &str, missing: &mut Vec<String>) -> String {
            match value {
                Some(v) if !v.trim().is_empty() => v,
                _ => {
                    missing.push(name.to_string());
                    String::new()
                }
            }
        }

        let mut missing = Vec::new();
        let content_key = required(self.content_key, "content_key", &mut missing);
        let original_text = required(self.original_text, "original_text", &mut missing);
        let target_language = required(self.target_language, "target_language", &mut missing);

        if !missing.is_empty() {
            return Err(AppError::Validation(format!(
                "missing required fields: {}",
                missing.join(", ")
            )));
        }

        Ok(ValidRequest {
            content_key,
            original_text,
            target_language,
            page_path: self.page_path,
        })
    }
}

/// Synchronous cache-or-translate path used by the UI.
pub struct OnDemandTranslator {
    repository: Arc<Repository>,
    translator: Arc<dyn Translate>,
}

impl OnDemandTranslator {
    pub fn new(repository: Arc<Repository>, translator: Arc<dyn Translate>) -> Self {
        Self {
            repository,
            translator,
        }
    }

    pub async fn translate(&self, request: TranslateRequest) -> Result<TranslateResponse> {
        let element_type = request.element_type.clone();
        let request = request.validate()?;

        if let Some(record) = self
            .repository
            .find_translation(
                &request.content_key,
                &request.target_language,
                &request.original_text,
            )
            .await?
        {
            tracing::debug!(
                "Cache hit for {} ({})",
                request.content_key,
                request.target_language
            );
            return Ok(TranslateResponse {
                translated_text: record.translated_text,
                cached: true,
            });
        }

        tracing::debug!(
            "Cache miss for {} ({}), element {:?}",
            request.content_key,
            request.target_language,
            element_type
        );

        let translated_text = self
            .translator
            .translate(&request.original_text, &request.target_language)
            .await?;

        // Caching is best-effort; the caller still gets its translation.
        if let Err(e) = self
            .repository
            .upsert_translation(NewTranslation {
                content_key: request.content_key.clone(),
                original_text: request.original_text,
                translated_text: translated_text.clone(),
                target_language: request.target_language,
                page_path: request.page_path,
            })
            .await
        {
            tracing::error!("Failed to cache translation for {}: {}", request.content_key, e);
        }

        Ok(TranslateResponse {
            translated_text,
            cached: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::FakeTranslator;

    fn request(key: &str, text: &str, lang: Option<&str>) -> TranslateRequest {
        TranslateRequest {
            content_key: Some(key.to_string()),
            original_text: Some(text.to_string()),
            target_language: lang.map(|l| l.to_string()),
            page_path: Some("/".to_string()),
            element_type: Some("heading".to_string()),
        }
    }

    async fn setup(fake: FakeTranslator) -> (Arc<Repository>, Arc<FakeTranslator>, OnDemandTranslator) {
        let repository = Arc::new(Repository::new(":memory:").await.unwrap());
        let fake = Arc::new(fake);
        let service = OnDemandTranslator::new(repository.clone(), fake.clone());
        (repository, fake, service)
    }

    #[tokio::test]
    async fn second_call_is_served_from_cache() {
        let (_repo, fake, service) = setup(FakeTranslator::new()).await;

        let first = service
            .translate(request("hero.title", "Welcome", Some("he")))
            .await
            .unwrap();
        assert_eq!(
            first,
            TranslateResponse { translated_text: "[he] Welcome".to_string(), cached: false }
        );

        let second = service
            .translate(request("hero.title", "Welcome", Some("he")))
            .await
            .unwrap();
        assert!(second.cached);
        assert_eq!(second.translated_text, "[he] Welcome");
        assert_eq!(fake.calls(), 1);
    }

    #[tokio::test]
    async fn missing_target_language_is_rejected_without_writes() {
        let (repo, fake, service) = setup(FakeTranslator::new()).await;

        let err = service
            .translate(request("hero.title", "Welcome", None))
            .await
            .unwrap_err();

        match err {
            AppError::Validation(msg) => assert!(msg.contains("target_language")),
            other => panic!("expected validation error, got {:?}", other),
        }
        assert_eq!(fake.calls(), 0);
        assert!(repo.source_translations().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn blank_fields_count_as_missing() {
        let (_repo, _fake, service) = setup(FakeTranslator::new()).await;
        let err = service
            .translate(request("  ", "", Some("es")))
            .await
            .unwrap_err();
        match err {
            AppError::Validation(msg) => {
                assert!(msg.contains("content_key"));
                assert!(msg.contains("original_text"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn upstream_failure_is_returned_and_nothing_cached() {
        let (repo, _fake, service) = setup(FakeTranslator::failing_on(&["Welcome"])).await;

        let err = service
            .translate(request("hero.title", "Welcome", Some("es")))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::TranslationApi(_)));
        assert!(repo.find_translation("hero.title", "es", "Welcome").await.unwrap().is_none());
    }
}
