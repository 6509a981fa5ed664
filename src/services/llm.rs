//! LLM text generation integration (chat-completions style API)

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::IntegrationsConfig;
use crate::utils::errors::{IntegrationError, IntegrationResult, Result, TeachersPetError};
use crate::utils::helpers::truncate_text;

use super::email::{classify, MAX_ERROR_BODY_CHARS};

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
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

#[derive(Clone, Debug)]
pub struct LlmService {
    client: Client,
    api_url: Option<String>,
    api_key: Option<String>,
    model: String,
}

impl LlmService {
    pub fn new(config: &IntegrationsConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent("TeachersPet/0.1")
            .build()
            .map_err(TeachersPetError::Http)?;

        Ok(Self {
            client,
            api_url: config.llm_api_url.clone(),
            api_key: config.llm_api_key.clone(),
            model: config.llm_model.clone(),
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.api_url.is_some()
    }

    /// Send a single-turn prompt and return the generated text
    pub async fn complete(&self, prompt: &str) -> IntegrationResult<String> {
        let url = self.api_url.as_deref().ok_or(IntegrationError::NotConfigured("llm"))?;
        debug!(model = %self.model, prompt_chars = prompt.len(), "Invoking LLM");

        let mut request = self.client.post(url).json(&ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage { role: "user", content: prompt }],
        });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| classify(e, IntegrationError::LlmFailed))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            warn!(status = %status, "LLM request rejected");
            return Err(IntegrationError::LlmFailed(format!(
                "HTTP {}: {}",
                status,
                truncate_text(&error_text, MAX_ERROR_BODY_CHARS)
            )));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| IntegrationError::InvalidResponse(e.to_string()))?;

        body.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or_else(|| IntegrationError::InvalidResponse("no completion text".to_string()))
    }
}
