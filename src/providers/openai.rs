//! `/chat/completions` client for OpenRouter and other OpenAI-compatible
//! gateways.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::CompletionConfig;

use super::{
    check_http_response, CompletionProvider, CompletionRequest, CompletionResponse,
    ProviderError, TokenUsage,
};

// Wire types are public so the request/response mapping can be tested
// without a server.

/// Request body.
#[doc(hidden)]
#[derive(Debug, Serialize)]
pub struct ChatBody {
    /// Model identifier.
    pub model: String,
    /// System message (if any) followed by the prompt.
    pub messages: Vec<ChatTurn>,
    /// Reply length cap.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// `{"type": "json_object"}` when JSON output was requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<ResponseFormat>,
}

/// One `messages[]` entry.
#[doc(hidden)]
#[derive(Debug, Serialize)]
pub struct ChatTurn {
    /// `system` or `user`.
    pub role: &'static str,
    /// Text.
    pub content: String,
}

/// `response_format` request field.
#[doc(hidden)]
#[derive(Debug, Serialize)]
pub struct ResponseFormat {
    /// Format name.
    #[serde(rename = "type")]
    pub kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    choices: Vec<ReplyChoice>,
    model: Option<String>,
    #[serde(default)]
    usage: Option<ReplyUsage>,
}

#[derive(Debug, Deserialize)]
struct ReplyChoice {
    message: Option<ReplyMessage>,
}

#[derive(Debug, Deserialize)]
struct ReplyMessage {
    content: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ReplyUsage {
    prompt_tokens: Option<u32>,
    completion_tokens: Option<u32>,
}

/// Completion backend speaking the OpenAI chat dialect.
#[derive(Clone)]
pub struct OpenAiCompatProvider {
    endpoint: String,
    model: String,
    api_key: String,
    referer: Option<String>,
    title: Option<String>,
    client: reqwest::Client,
}

impl std::fmt::Debug for OpenAiCompatProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiCompatProvider")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("api_key", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl OpenAiCompatProvider {
    /// Build a provider from the `[completion]` section.
    ///
    /// Blank `referer`/`title` values are dropped so no empty attribution
    /// headers are sent.
    ///
    /// # Errors
    ///
    /// [`ProviderError::NotConfigured`] for a blank key,
    /// [`ProviderError::Transport`] if the HTTP client cannot be built.
    pub fn from_config(config: &CompletionConfig, api_key: String) -> Result<Self, ProviderError> {
        if api_key.trim().is_empty() {
            return Err(ProviderError::NotConfigured(format!(
                "{} is empty",
                config.api_key_env
            )));
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        let non_blank = |value: &Option<String>| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_owned)
        };
        Ok(Self {
            endpoint: chat_completions_url(&config.base_url),
            model: config.model.clone(),
            api_key,
            referer: non_blank(&config.referer),
            title: non_blank(&config.title),
            client,
        })
    }

    /// Full URL requests are posted to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

/// `{base_url}/chat/completions`, ignoring a trailing slash on the base.
#[doc(hidden)]
pub fn chat_completions_url(base_url: &str) -> String {
    format!("{}/chat/completions", base_url.trim_end_matches('/'))
}

/// Map a [`CompletionRequest`] onto the wire body.
#[doc(hidden)]
pub fn build_request(model: &str, request: &CompletionRequest) -> ChatBody {
    let system = request.system.iter().map(|text| ChatTurn {
        role: "system",
        content: text.clone(),
    });
    let prompt = std::iter::once(ChatTurn {
        role: "user",
        content: request.prompt.clone(),
    });
    ChatBody {
        model: model.to_owned(),
        messages: system.chain(prompt).collect(),
        max_tokens: request.max_tokens,
        response_format: request
            .json_object
            .then_some(ResponseFormat { kind: "json_object" }),
    }
}

/// Pull the first choice's text out of a reply body.
///
/// # Errors
///
/// [`ProviderError::MalformedReply`] when the body is not JSON or the first
/// choice has no non-blank content.
#[doc(hidden)]
pub fn parse_response(body: &str) -> Result<CompletionResponse, ProviderError> {
    let reply: ChatReply =
        serde_json::from_str(body).map_err(|e| ProviderError::MalformedReply(e.to_string()))?;

    let Some(text) = reply
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message)
        .and_then(|message| message.content)
        .filter(|content| !content.trim().is_empty())
    else {
        return Err(ProviderError::MalformedReply(
            "no text in choices[0].message.content".to_owned(),
        ));
    };

    let usage = reply.usage.unwrap_or_default();
    Ok(CompletionResponse {
        text,
        model: reply.model.unwrap_or_default(),
        usage: TokenUsage {
            prompt_tokens: usage.prompt_tokens.unwrap_or(0),
            completion_tokens: usage.completion_tokens.unwrap_or(0),
        },
    })
}

#[async_trait::async_trait]
impl CompletionProvider for OpenAiCompatProvider {
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, ProviderError> {
        let mut post = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&build_request(&self.model, &request));
        if let Some(referer) = &self.referer {
            post = post.header("HTTP-Referer", referer);
        }
        if let Some(title) = &self.title {
            post = post.header("X-Title", title);
        }

        let body = check_http_response(post.send().await?).await?;
        let reply = parse_response(&body)?;
        tracing::debug!(
            model = %reply.model,
            prompt_tokens = reply.usage.prompt_tokens,
            completion_tokens = reply.usage.completion_tokens,
            "completion received"
        );
        Ok(reply)
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}
