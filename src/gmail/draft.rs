//! Gmail draft creation via `users.drafts.create`.

use base64::engine::general_purpose::{STANDARD, URL_SAFE};
use base64::Engine as _;
use serde::Deserialize;
use tracing::info;

use super::GmailError;

/// Recipient, subject and plain-text body of a draft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftDetails {
    /// Recipient address.
    pub to: String,
    /// Subject line (any Unicode).
    pub subject: String,
    /// Plain-text body; newlines become `<br>`.
    pub body: String,
}

/// Render an RFC 2822 HTML message with CRLF line endings.
pub fn build_mime_message(details: &DraftDetails) -> String {
    let subject = STANDARD.encode(details.subject.as_bytes());
    [
        format!("To: {}", details.to),
        "Content-type: text/html;charset=utf-8".to_owned(),
        "MIME-Version: 1.0".to_owned(),
        format!("Subject: =?utf-8?B?{subject}?="),
        String::new(),
        details.body.replace('\n', "<br>"),
    ]
    .join("\r\n")
}

/// URL-safe base64 of the message, as the `raw` field expects.
pub fn encode_raw(message: &str) -> String {
    URL_SAFE.encode(message.as_bytes())
}

#[derive(Debug, Deserialize)]
struct DraftResponse {
    id: Option<String>,
}

/// Create a draft in the signed-in user's mailbox. Returns the draft id.
///
/// # Errors
///
/// Returns [`GmailError::MissingRecipient`] for a blank address,
/// [`GmailError::PermissionDenied`] on 401/403, or
/// [`GmailError::DraftFailed`] for any other unsuccessful response.
pub async fn create_draft(
    http: &reqwest::Client,
    api_base: &str,
    access_token: &str,
    details: &DraftDetails,
) -> Result<String, GmailError> {
    if details.to.trim().is_empty() {
        return Err(GmailError::MissingRecipient);
    }

    let url = format!("{}/gmail/v1/users/me/drafts", api_base.trim_end_matches('/'));
    let raw = encode_raw(&build_mime_message(details));
    let payload = serde_json::json!({ "message": { "raw": raw } });

    let response = http
        .post(&url)
        .bearer_auth(access_token)
        .json(&payload)
        .send()
        .await?;
    let status = response.status();
    let text = response.text().await?;

    if status.as_u16() == 401 || status.as_u16() == 403 {
        return Err(GmailError::PermissionDenied);
    }
    if !status.is_success() {
        return Err(GmailError::DraftFailed {
            status: status.as_u16(),
            message: api_error_message(&text),
        });
    }

    let id = serde_json::from_str::<DraftResponse>(&text)
        .ok()
        .and_then(|r| r.id)
        .unwrap_or_default();
    info!(draft_id = %id, to = %details.to, "gmail draft created");
    Ok(id)
}

fn api_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .map(str::to_owned)
        })
        .unwrap_or_else(|| body.chars().take(200).collect())
}
