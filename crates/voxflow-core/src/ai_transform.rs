//! AI Transformer contract (§4.5). The provider itself is an external
//! collaborator — only its request/response shape and failure modes are
//! specified here. On any failure the Flow Supervisor falls back to the
//! untransformed text (§4.5, §7).

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// Image bytes + MIME tag for optional screenshot context (§4.5, §9
/// "Screenshot context"). Providers that don't accept images silently
/// ignore this field.
#[derive(Debug, Clone)]
pub struct Screenshot {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Default)]
pub struct TransformRequest {
    pub text: String,
    pub selected_text: Option<String>,
    pub context: Option<String>,
    pub writing_style: Option<String>,
    pub screenshot: Option<Screenshot>,
}

#[derive(Debug, Error)]
pub enum TransformError {
    #[error("authentication failed")]
    AuthFailed,

    #[error("rate limited, retry after {retry_after_ms:?}ms")]
    RateLimited { retry_after_ms: Option<u64> },

    #[error("network error: {0}")]
    NetworkError(String),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("invalid response from provider: {0}")]
    InvalidResponse(String),
}

/// Single request-per-dictation endpoint. Streaming output is permitted
/// but not required; callers treat the final concatenated text as the
/// transformed result (§4.5).
#[async_trait]
pub trait AiTransformer: Send + Sync {
    async fn transform(&self, request: TransformRequest) -> Result<String, TransformError>;
}

/// Settings carried in the configuration file's `ai` block (§6).
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct AiSettings {
    pub enabled: bool,
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
    pub prompt: String,
    pub message_prompt: String,
    pub writing_style: Option<String>,
}

impl Default for AiSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            max_tokens: 1024,
            temperature: 0.3,
            top_p: 1.0,
            prompt: "Clean up the dictated text: fix punctuation and casing, keep the meaning \
                     and wording intact."
                .to_string(),
            message_prompt: "{text}".to_string(),
            writing_style: None,
        }
    }
}

/// OpenAI-compatible chat-completions transformer: the default concrete
/// implementation of [`AiTransformer`], matching `base_url`/`model` from
/// [`AiSettings`]. Any provider exposing the same wire shape (the common
/// case for "OpenAI-compatible" endpoints) works without a new impl.
pub struct HttpAiTransformer {
    client: reqwest::Client,
    settings: AiSettings,
    api_key: Option<String>,
    timeout: Duration,
}

impl HttpAiTransformer {
    /// Transformer timeout per §5: 10s, falls back to raw text on the
    /// Flow Supervisor side if this elapses.
    const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

    pub fn new(settings: AiSettings, api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            settings,
            api_key,
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    fn build_message(&self, request: &TransformRequest) -> String {
        let mut message = self.settings.message_prompt.replace("{text}", &request.text);
        if let Some(selected) = &request.selected_text {
            message = format!("{message}\n\nSelected context: {selected}");
        }
        if let Some(context) = &request.context {
            message = format!("{message}\n\nAdditional context: {context}");
        }
        message
    }
}

#[async_trait]
impl AiTransformer for HttpAiTransformer {
    async fn transform(&self, request: TransformRequest) -> Result<String, TransformError> {
        let writing_style = request
            .writing_style
            .clone()
            .or_else(|| self.settings.writing_style.clone());
        let mut system_prompt = self.settings.prompt.clone();
        if let Some(style) = writing_style {
            system_prompt = format!("{system_prompt}\n\nWriting style: {style}");
        }

        let mut content: Vec<serde_json::Value> = vec![serde_json::json!({
            "type": "text",
            "text": self.build_message(&request),
        })];
        if let Some(shot) = &request.screenshot {
            content.push(serde_json::json!({
                "type": "image_url",
                "image_url": {
                    "url": format!(
                        "data:{};base64,{}",
                        shot.mime_type,
                        base64_encode(&shot.bytes)
                    ),
                },
            }));
        }

        let body = serde_json::json!({
            "model": self.settings.model,
            "max_tokens": self.settings.max_tokens,
            "temperature": self.settings.temperature,
            "top_p": self.settings.top_p,
            "messages": [
                {"role": "system", "content": system_prompt},
                {"role": "user", "content": content},
            ],
        });

        let url = format!(
            "{}/chat/completions",
            self.settings.base_url.trim_end_matches('/')
        );
        let mut req = self.client.post(url).json(&body).timeout(self.timeout);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }

        let response = req.send().await.map_err(|e| {
            if e.is_timeout() {
                TransformError::Timeout(self.timeout)
            } else {
                TransformError::NetworkError(e.to_string())
            }
        })?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(TransformError::AuthFailed);
        }
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after_ms = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .map(|secs| secs * 1000);
            return Err(TransformError::RateLimited { retry_after_ms });
        }
        if !status.is_success() {
            return Err(TransformError::InvalidResponse(format!(
                "http status {status}"
            )));
        }

        let payload: serde_json::Value = response
            .json()
            .await
            .map_err(|e| TransformError::InvalidResponse(e.to_string()))?;

        payload["choices"][0]["message"]["content"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| TransformError::InvalidResponse("missing choices[0].message.content".into()))
    }
}

fn base64_encode(bytes: &[u8]) -> String {
    use base64::Engine as _;
    base64::engine::general_purpose::STANDARD.encode(bytes)
}
