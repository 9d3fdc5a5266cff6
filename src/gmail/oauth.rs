//! Installed-app OAuth2 flow for Google: PKCE, loopback redirect, token
//! exchange, refresh and revocation.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{DateTime, Duration, Utc};
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tracing::{debug, warn};

use super::{GmailError, GMAIL_COMPOSE_SCOPE};
use crate::types::GmailToken;

/// Seconds before expiry at which a token is refreshed.
pub const REFRESH_BUFFER_SECS: i64 = 60;

const VERIFIER_LEN: usize = 64;
const STATE_LEN: usize = 32;
const MAX_REQUEST_BYTES: usize = 8192;

// ---------------------------------------------------------------------------
// PKCE and authorization URL
// ---------------------------------------------------------------------------

/// PKCE verifier and its S256 challenge.
#[derive(Clone)]
pub struct PkcePair {
    /// Secret sent with the code exchange.
    pub verifier: String,
    /// `BASE64URL(SHA256(verifier))`, sent with the authorization request.
    pub challenge: String,
}

impl std::fmt::Debug for PkcePair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PkcePair")
            .field("verifier", &"[REDACTED]")
            .field("challenge", &self.challenge)
            .finish()
    }
}

impl PkcePair {
    /// Generate a fresh random verifier.
    pub fn generate() -> Self {
        Self::from_verifier(random_token(VERIFIER_LEN))
    }

    /// Derive the challenge for a known verifier.
    pub fn from_verifier(verifier: String) -> Self {
        let digest = Sha256::digest(verifier.as_bytes());
        let challenge = URL_SAFE_NO_PAD.encode(digest);
        Self {
            verifier,
            challenge,
        }
    }
}

/// Random `state` value binding the redirect to this sign-in attempt.
pub fn random_state() -> String {
    random_token(STATE_LEN)
}

fn random_token(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// Build the Google consent URL for the `gmail.compose` scope.
///
/// # Errors
///
/// Returns [`GmailError::Configuration`] when `auth_url` is not a valid URL.
pub fn authorization_url(
    auth_url: &str,
    client_id: &str,
    redirect_uri: &str,
    state: &str,
    challenge: &str,
) -> Result<String, GmailError> {
    let url = url::Url::parse_with_params(
        auth_url,
        &[
            ("client_id", client_id),
            ("redirect_uri", redirect_uri),
            ("response_type", "code"),
            ("scope", GMAIL_COMPOSE_SCOPE),
            ("code_challenge", challenge),
            ("code_challenge_method", "S256"),
            ("state", state),
            ("access_type", "offline"),
            ("prompt", "consent"),
        ],
    )
    .map_err(|e| GmailError::Configuration(format!("invalid auth_url {auth_url:?}: {e}")))?;
    Ok(url.into())
}

// ---------------------------------------------------------------------------
// Loopback redirect
// ---------------------------------------------------------------------------

/// Outcome of one request hitting the loopback listener.
#[derive(Debug, PartialEq, Eq)]
pub enum RedirectRequest {
    /// A redirect carrying an authorization code.
    Code(String),
    /// Something else (favicon, bare `/`); keep waiting.
    Unrelated,
}

/// Interpret the request line of a loopback redirect.
///
/// # Errors
///
/// Returns [`GmailError::OAuth`] when Google reported an `error`,
/// [`GmailError::StateMismatch`] when `state` does not match, or
/// [`GmailError::FlowCancelled`] when the redirect carries no code.
pub fn parse_redirect_request(
    request_line: &str,
    expected_state: &str,
) -> Result<RedirectRequest, GmailError> {
    let Some(target) = request_line.split_whitespace().nth(1) else {
        return Ok(RedirectRequest::Unrelated);
    };
    let Ok(url) = url::Url::parse(&format!("http://localhost{target}")) else {
        return Ok(RedirectRequest::Unrelated);
    };

    let mut code = None;
    let mut state = None;
    let mut error = None;
    let mut error_description = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" => code = Some(value.into_owned()),
            "state" => state = Some(value.into_owned()),
            "error" => error = Some(value.into_owned()),
            "error_description" => error_description = Some(value.into_owned()),
            _ => {}
        }
    }

    if code.is_none() && error.is_none() && state.is_none() {
        return Ok(RedirectRequest::Unrelated);
    }
    if state.as_deref() != Some(expected_state) {
        return Err(GmailError::StateMismatch);
    }
    if let Some(error) = error {
        return Err(GmailError::OAuth(describe_oauth_error(
            &error,
            error_description.as_deref(),
        )));
    }
    match code {
        Some(code) if !code.is_empty() => Ok(RedirectRequest::Code(code)),
        _ => Err(GmailError::FlowCancelled(
            "no authorization code received".to_owned(),
        )),
    }
}

/// Serve the loopback listener until the OAuth redirect arrives.
///
/// Unrelated requests get a 404 and are skipped. The browser receives a short
/// page describing the outcome.
///
/// # Errors
///
/// Returns [`GmailError::Io`] on socket failure or whatever
/// [`parse_redirect_request`] reports for the redirect.
pub async fn wait_for_redirect(
    listener: &TcpListener,
    expected_state: &str,
) -> Result<String, GmailError> {
    loop {
        let (mut stream, peer) = listener.accept().await?;
        let request = read_request_head(&mut stream).await?;
        let request_line = request.lines().next().unwrap_or_default();
        debug!(%peer, "loopback request received");

        match parse_redirect_request(request_line, expected_state) {
            Ok(RedirectRequest::Code(code)) => {
                respond(
                    &mut stream,
                    "200 OK",
                    "Gmail access granted. You can close this tab and return to the terminal.",
                )
                .await;
                return Ok(code);
            }
            Ok(RedirectRequest::Unrelated) => {
                respond(&mut stream, "404 Not Found", "Not found.").await;
            }
            Err(e) => {
                respond(&mut stream, "400 Bad Request", &e.to_string()).await;
                return Err(e);
            }
        }
    }
}

async fn read_request_head(stream: &mut tokio::net::TcpStream) -> Result<String, GmailError> {
    let mut buf = Vec::with_capacity(1024);
    let mut chunk = [0_u8; 1024];
    loop {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(chunk.get(..n).unwrap_or_default());
        if buf.windows(4).any(|w| w == b"\r\n\r\n") || buf.len() >= MAX_REQUEST_BYTES {
            break;
        }
    }
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

async fn respond(stream: &mut tokio::net::TcpStream, status: &str, message: &str) {
    let body = format!(
        "<html><body style=\"font-family: system-ui; text-align: center; padding: 40px;\">\
         <h2>{}</h2></body></html>",
        html_escape(message)
    );
    let response = format!(
        "HTTP/1.1 {status}\r\nContent-Type: text/html; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    if let Err(e) = stream.write_all(response.as_bytes()).await {
        warn!(error = %e, "failed to answer loopback request");
    }
    let _ = stream.flush().await;
}

fn html_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

// ---------------------------------------------------------------------------
// Error mapping
// ---------------------------------------------------------------------------

/// User-facing explanation of a Google OAuth error code.
pub fn describe_oauth_error(code: &str, description: Option<&str>) -> String {
    match code {
        "invalid_client" | "invalid_request" => format!(
            "Configuration error ({code}): check that your Google client id is correct and \
             that the OAuth client type in Google Cloud is 'Desktop app'."
        ),
        "unauthorized_client" => "Unauthorized client: make sure this client id is allowed to \
                                  use the Gmail API."
            .to_owned(),
        "access_denied" => {
            "Access denied: permission to access your Gmail account was refused.".to_owned()
        }
        "redirect_uri_mismatch" | "origin_mismatch" => format!(
            "Configuration error ({code}): the OAuth client must accept loopback redirects \
             (http://127.0.0.1). Use a 'Desktop app' client in the Google Cloud console."
        ),
        _ => format!(
            "Google error: {}. Please check your configuration.",
            description.filter(|d| !d.trim().is_empty()).unwrap_or(code)
        ),
    }
}

// ---------------------------------------------------------------------------
// Token endpoint
// ---------------------------------------------------------------------------

/// Token endpoint response (success or error shape).
#[doc(hidden)]
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    /// New access token.
    pub access_token: Option<String>,
    /// Refresh token (first consent only).
    pub refresh_token: Option<String>,
    /// Lifetime in seconds.
    pub expires_in: Option<i64>,
    /// OAuth error code.
    pub error: Option<String>,
    /// Human-readable error detail.
    pub error_description: Option<String>,
}

/// Whether `token` expires within [`REFRESH_BUFFER_SECS`] of `now`.
///
/// A token without a known expiry is treated as expired.
pub fn needs_refresh(token: &GmailToken, now: DateTime<Utc>) -> bool {
    match token.expires_at {
        Some(expires_at) => now
            .checked_add_signed(Duration::seconds(REFRESH_BUFFER_SECS))
            .map_or(true, |threshold| expires_at <= threshold),
        None => true,
    }
}

/// Client for Google's token and revocation endpoints.
#[derive(Clone)]
pub struct OAuthClient {
    http: reqwest::Client,
    token_url: String,
    revoke_url: String,
    client_id: String,
    client_secret: Option<String>,
}

impl std::fmt::Debug for OAuthClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthClient")
            .field("token_url", &self.token_url)
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "[REDACTED]"))
            .finish_non_exhaustive()
    }
}

impl OAuthClient {
    /// Create a client for the given endpoints and OAuth client.
    pub fn new(
        http: reqwest::Client,
        token_url: impl Into<String>,
        revoke_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: Option<String>,
    ) -> Self {
        Self {
            http,
            token_url: token_url.into(),
            revoke_url: revoke_url.into(),
            client_id: client_id.into(),
            client_secret,
        }
    }

    /// Exchange an authorization code for tokens.
    ///
    /// # Errors
    ///
    /// Returns [`GmailError::OAuth`] with a user-facing message when Google
    /// rejects the exchange, or [`GmailError::Http`] on transport failure.
    pub async fn exchange_code(
        &self,
        code: &str,
        verifier: &str,
        redirect_uri: &str,
    ) -> Result<GmailToken, GmailError> {
        let mut form = vec![
            ("grant_type", "authorization_code"),
            ("code", code),
            ("code_verifier", verifier),
            ("redirect_uri", redirect_uri),
            ("client_id", self.client_id.as_str()),
        ];
        if let Some(secret) = self.client_secret.as_deref() {
            form.push(("client_secret", secret));
        }

        let body = self.post_token_form(&form).await?;
        let access_token = body
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| GmailError::TokenExchange("no access_token in response".to_owned()))?;
        Ok(GmailToken {
            access_token,
            refresh_token: body.refresh_token,
            expires_at: expiry_from(body.expires_in),
        })
    }

    /// Obtain a new access token from the stored refresh token.
    ///
    /// The returned token keeps the old refresh token unless Google rotated it.
    ///
    /// # Errors
    ///
    /// Returns [`GmailError::AuthExpired`] when there is no refresh token or
    /// Google reports `invalid_grant`.
    pub async fn refresh(&self, token: &GmailToken) -> Result<GmailToken, GmailError> {
        let refresh_token = token
            .refresh_token
            .as_deref()
            .ok_or(GmailError::AuthExpired)?;

        let mut form = vec![
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", self.client_id.as_str()),
        ];
        if let Some(secret) = self.client_secret.as_deref() {
            form.push(("client_secret", secret));
        }

        let body = match self.post_token_form(&form).await {
            Err(GmailError::OAuth(message)) if message.contains("invalid_grant") => {
                return Err(GmailError::AuthExpired)
            }
            other => other?,
        };
        let access_token = body
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| GmailError::TokenExchange("no access_token in response".to_owned()))?;
        debug!("gmail access token refreshed");
        Ok(GmailToken {
            access_token,
            refresh_token: body.refresh_token.or_else(|| token.refresh_token.clone()),
            expires_at: expiry_from(body.expires_in),
        })
    }

    /// Revoke a token. Google revokes the whole grant.
    ///
    /// # Errors
    ///
    /// Returns [`GmailError::Http`] on transport failure or
    /// [`GmailError::TokenExchange`] when Google rejects the request.
    pub async fn revoke(&self, token: &str) -> Result<(), GmailError> {
        let response = self
            .http
            .post(&self.revoke_url)
            .form(&[("token", token)])
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GmailError::TokenExchange(format!(
                "revocation failed with HTTP {}: {}",
                status.as_u16(),
                body.trim()
            )));
        }
        Ok(())
    }

    async fn post_token_form(&self, form: &[(&str, &str)]) -> Result<TokenResponse, GmailError> {
        let response = self.http.post(&self.token_url).form(form).send().await?;
        let status = response.status();
        let text = response.text().await?;
        let body: TokenResponse = serde_json::from_str(&text).map_err(|e| {
            GmailError::TokenExchange(format!("HTTP {}: unreadable response: {e}", status.as_u16()))
        })?;

        if let Some(code) = body.error.as_deref() {
            let mut message = describe_oauth_error(code, body.error_description.as_deref());
            if code == "invalid_grant" {
                message = format!("invalid_grant: {message}");
            }
            return Err(GmailError::OAuth(message));
        }
        if !status.is_success() {
            return Err(GmailError::TokenExchange(format!(
                "HTTP {}",
                status.as_u16()
            )));
        }
        Ok(body)
    }
}

fn expiry_from(expires_in: Option<i64>) -> Option<DateTime<Utc>> {
    let secs = expires_in?;
    Utc::now().checked_add_signed(Duration::try_seconds(secs)?)
}
