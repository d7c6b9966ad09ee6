use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::{AppError, Result};

use super::languages::language_name;
use super::reply::ModelReply;

/// Something that turns English text into the target language.
#[async_trait]
pub trait Translate: Send + Sync {
    async fn translate(&self, text: &str, target_language: &str) -> Result<String>;
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Client for an OpenAI-compatible chat completions endpoint.
pub struct ChatTranslator {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl ChatTranslator {
    pub fn new(config: &Config) -> Result<Self> {
        // No client-side timeouts; the hosting platform bounds each request.
        let client = Client::builder().build()?;
        Ok(Self {
            client,
            endpoint: config.api_base_url.clone(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }

    pub fn model_version(&self) -> &str {
        &self.model
    }
}

pub(crate) fn system_prompt(target_language: &str) -> String {
    format!(
        r#"You are a professional translator for a community information portal.
Translate the user's text from English to {}.
Preserve the original tone, meaning, punctuation and any formatting such as line breaks, lists or markdown.
Do not translate URLs, email addresses, phone numbers or placeholders in curly braces.
Respond with the translated text only, without quotes or explanations."#,
        language_name(target_language)
    )
}

#[async_trait]
impl Translate for ChatTranslator {
    async fn translate(&self, text: &str, target_language: &str) -> Result<String> {
        let api_key = self.api_key.as_deref().ok_or(AppError::MissingApiKey)?;

        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                Message {
                    role: "system".to_string(),
                    content: system_prompt(target_language),
                },
                Message {
                    role: "user".to_string(),
                    content: text.to_string(),
                },
            ],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(AppError::TranslationApi(format!("{}: {}", status, error_text)));
        }

        let chat_response: ChatResponse = response.json().await?;

        let content = chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| AppError::TranslationApi("No choices returned from API".to_string()))?;

        ModelReply::classify(&content).into_text()
    }
}
