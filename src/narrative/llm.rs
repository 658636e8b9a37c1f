//! HTTP narrator backed by a hosted language model
//!
//! Speaks both the Anthropic messages format and the OpenAI-compatible chat
//! format; the format is picked from the endpoint URL.

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::core::error::{EngineError, Result};
use crate::narrative::prompt::{build_prompt, SYSTEM_PROMPT};
use crate::narrative::{NarrativeRequest, Narrator};

/// Dispatches are short
const MAX_TOKENS: u32 = 400;

#[derive(Debug, Clone, PartialEq)]
pub enum ApiFormat {
    Anthropic,
    OpenAI,
}

pub struct LlmNarrator {
    client: Client,
    api_key: String,
    api_url: String,
    model: String,
    api_format: ApiFormat,
    /// Names and context baked into each prompt
    preamble: String,
}

impl LlmNarrator {
    pub fn new(api_key: String, api_url: String, model: String) -> Self {
        let api_format = Self::detect_api_format(&api_url);
        Self {
            client: Client::new(),
            api_key,
            api_url,
            model,
            api_format,
            preamble: String::new(),
        }
    }

    /// Extra context prepended to every turn's prompt (world names, factions)
    pub fn with_preamble(mut self, preamble: String) -> Self {
        self.preamble = preamble;
        self
    }

    fn detect_api_format(url: &str) -> ApiFormat {
        if url.contains("anthropic.com") {
            ApiFormat::Anthropic
        } else {
            ApiFormat::OpenAI
        }
    }

    /// Build from `LLM_API_KEY`, `LLM_API_URL` and `LLM_MODEL`
    ///
    /// Only the key is required; the URL defaults to the Anthropic
    /// messages endpoint.
    pub fn from_env() -> Result<Self> {
        let api_key =
            std::env::var("LLM_API_KEY").map_err(|_| EngineError::Narrative("LLM_API_KEY not set".into()))?;
        let api_url =
            std::env::var("LLM_API_URL").unwrap_or_else(|_| "https://api.anthropic.com/v1/messages".into());
        let model = std::env::var("LLM_MODEL").unwrap_or_else(|_| "claude-3-haiku-20240307".into());
        Ok(Self::new(api_key, api_url, model))
    }

    fn user_prompt(&self, request: &NarrativeRequest) -> String {
        let mut prompt = self.preamble.clone();
        prompt.push_str(&build_prompt(
            request.turn,
            request.faction_name.as_deref(),
            &request.lines,
        ));
        prompt
    }

    async fn complete_anthropic(&self, user: String) -> Result<String> {
        let body = AnthropicRequest {
            model: self.model.clone(),
            max_tokens: MAX_TOKENS,
            system: SYSTEM_PROMPT.into(),
            messages: vec![Message {
                role: "user".into(),
                content: user,
            }],
        };
        let response = self
            .client
            .post(&self.api_url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| EngineError::Narrative(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(EngineError::Narrative(format!("API error {status}: {text}")));
        }
        let completion: AnthropicResponse = response
            .json()
            .await
            .map_err(|e| EngineError::Narrative(e.to_string()))?;
        completion
            .content
            .into_iter()
            .next()
            .map(|c| c.text)
            .ok_or_else(|| EngineError::Narrative("empty response".into()))
    }

    async fn complete_openai(&self, user: String) -> Result<String> {
        let body = OpenAIRequest {
            model: self.model.clone(),
            max_tokens: MAX_TOKENS,
            messages: vec![
                Message {
                    role: "system".into(),
                    content: SYSTEM_PROMPT.into(),
                },
                Message {
                    role: "user".into(),
                    content: user,
                },
            ],
        };
        let response = self
            .client
            .post(&self.api_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| EngineError::Narrative(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(EngineError::Narrative(format!("API error {status}: {text}")));
        }
        let completion: OpenAIResponse = response
            .json()
            .await
            .map_err(|e| EngineError::Narrative(e.to_string()))?;
        completion
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| EngineError::Narrative("empty response".into()))
    }
}

impl Narrator for LlmNarrator {
    async fn generate(&self, request: &NarrativeRequest) -> Result<String> {
        let user = self.user_prompt(request);
        let text = match self.api_format {
            ApiFormat::Anthropic => self.complete_anthropic(user).await?,
            ApiFormat::OpenAI => self.complete_openai(user).await?,
        };
        Ok(text.trim().to_string())
    }
}

// Anthropic messages format
#[derive(Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    system: String,
    messages: Vec<Message>,
}

#[derive(Deserialize)]
struct AnthropicResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    text: String,
}

// OpenAI-compatible chat format
#[derive(Serialize)]
struct OpenAIRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<Message>,
}

#[derive(Deserialize)]
struct OpenAIResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: String,
}

#[derive(Serialize)]
struct Message {
    role: String,
    content: String,
}
