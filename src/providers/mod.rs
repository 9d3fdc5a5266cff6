//! Completion backends.
//!
//! Lead sourcing and email drafting each send one prompt and read back one
//! text reply, so the request type is a single prompt plus an optional
//! system instruction rather than a full conversation. [`openai`] is the
//! only wire implementation.

use async_trait::async_trait;
use regex::Regex;

pub mod openai;

/// Longest upstream error text kept in a [`ProviderError::Rejected`].
const MAX_ERROR_CHARS: usize = 256;

/// Secret shapes scrubbed from upstream error text: OpenRouter and OpenAI
/// keys, Google access tokens and Google API keys.
const SECRET_PATTERNS: [&str; 4] = [
    r"sk-or-v1-[A-Za-z0-9]{16,}",
    r"sk-[A-Za-z0-9_\-]{20,}",
    r"ya29\.[A-Za-z0-9_\-]{10,}",
    r"AIza[A-Za-z0-9_\-]{20,}",
];

/// One prompt for the model.
#[derive(Debug, Clone, Default)]
pub struct CompletionRequest {
    /// Instruction sent ahead of the prompt.
    pub system: Option<String>,
    /// The user prompt.
    pub prompt: String,
    /// Reply length cap.
    pub max_tokens: Option<u32>,
    /// Ask the backend to constrain the reply to a single JSON object.
    pub json_object: bool,
}

/// Token counts reported by the backend (zero when not reported).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenUsage {
    /// Tokens in the prompt.
    pub prompt_tokens: u32,
    /// Tokens in the reply.
    pub completion_tokens: u32,
}

/// The model's answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionResponse {
    /// Reply text of the first choice.
    pub text: String,
    /// Model that actually served the request.
    pub model: String,
    /// Token accounting.
    pub usage: TokenUsage,
}

/// Failure talking to a completion backend.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// Network or TLS failure, including timeouts.
    #[error("completion request failed: {0}")]
    Transport(#[from] reqwest::Error),
    /// The backend answered 2xx with a body we cannot use.
    #[error("malformed completion reply: {0}")]
    MalformedReply(String),
    /// The backend answered with a non-2xx status.
    #[error("completion service returned {status}: {message}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Upstream `error.message`, or the scrubbed raw body.
        message: String,
    },
    /// The provider is missing configuration it needs (e.g. an API key).
    #[error("completion service not configured: {0}")]
    NotConfigured(String),
}

/// Read a response body, turning non-2xx statuses into
/// [`ProviderError::Rejected`].
///
/// A JSON body shaped `{"error": {"message": ...}}` contributes only its
/// message. Secrets are scrubbed and the text is capped before it lands in
/// the error.
///
/// # Errors
///
/// [`ProviderError::Transport`] when the body cannot be read,
/// [`ProviderError::Rejected`] for any non-success status.
pub async fn check_http_response(response: reqwest::Response) -> Result<String, ProviderError> {
    let status = response.status();
    let body = response.text().await?;
    if status.is_success() {
        return Ok(body);
    }
    let message = upstream_error_message(&body).unwrap_or(body);
    Err(ProviderError::Rejected {
        status: status.as_u16(),
        message: scrub_error_text(&message),
    })
}

fn upstream_error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .pointer("/error/message")
        .and_then(serde_json::Value::as_str)
        .map(str::to_owned)
}

fn scrub_error_text(raw: &str) -> String {
    let mut text = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    for pattern in SECRET_PATTERNS {
        if let Ok(secret) = Regex::new(pattern) {
            text = secret.replace_all(&text, "[REDACTED]").into_owned();
        }
    }
    match text.char_indices().nth(MAX_ERROR_CHARS) {
        Some((cut, _)) => format!("{}...[truncated]", &text[..cut]),
        None => text,
    }
}

/// A backend that turns one prompt into one text reply.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Send `request` and wait for the reply.
    ///
    /// # Errors
    ///
    /// Any [`ProviderError`].
    async fn complete(&self, request: CompletionRequest)
        -> Result<CompletionResponse, ProviderError>;

    /// Model identifier requests are sent to, for logs.
    fn model_id(&self) -> &str;
}
