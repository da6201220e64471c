//! Chat-completion seam used by the assist endpoints.

use async_trait::async_trait;
use reqwest::header;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::config::AssistConfig;

/// User turn of a completion: either plain text or a single image reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserContent {
    Text(String),
    /// `http(s)://` URL or a `data:` URL carrying base64 bytes.
    ImageUrl(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    pub model: String,
    pub system: String,
    pub user: UserContent,
    pub max_tokens: Option<u32>,
    /// Asks the model for a single JSON object.
    pub json_object: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    #[error("błąd połączenia z modelem: {0}")]
    Transport(String),
    #[error("model odrzucił zapytanie ({status}): {body}")]
    Api { status: u16, body: String },
    #[error("nieprawidłowa odpowiedź modelu: {0}")]
    Malformed(String),
}

/// Returns the text of the first choice, trimmed. An empty string means the model said nothing.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<String, ModelError>;
}

/// Client for the OpenAI `chat/completions` endpoint.
#[derive(Clone)]
pub struct OpenAiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl OpenAiClient {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// `None` when no API key is configured.
    pub fn from_config(config: &AssistConfig) -> Option<Self> {
        config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .map(|key| Self::new(key, config.base_url.clone()))
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

pub(crate) fn request_body(request: &CompletionRequest) -> Value {
    let user = match &request.user {
        UserContent::Text(text) => json!(text),
        UserContent::ImageUrl(url) => json!([{ "type": "image_url", "image_url": { "url": url } }]),
    };
    let mut body = json!({
        "model": request.model,
        "messages": [
            { "role": "system", "content": request.system },
            { "role": "user", "content": user },
        ],
    });
    if let Some(max_tokens) = request.max_tokens {
        body["max_tokens"] = json!(max_tokens);
    }
    if request.json_object {
        body["response_format"] = json!({ "type": "json_object" });
    }
    body
}

#[async_trait]
impl CompletionClient for OpenAiClient {
    async fn complete(&self, request: CompletionRequest) -> Result<String, ModelError> {
        debug!(model = %request.model, "requesting chat completion");
        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .header(header::AUTHORIZATION, format!("Bearer {}", self.api_key))
            .json(&request_body(&request))
            .send()
            .await
            .map_err(|err| ModelError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ModelError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|err| ModelError::Malformed(err.to_string()))?;
        Ok(parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .unwrap_or_default())
    }
}
