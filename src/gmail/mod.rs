//! Gmail integration: OAuth sign-in and draft creation.
//!
//! [`GmailAuth`] ties the OAuth flow in [`oauth`] to the token persisted in
//! the [`Workspace`], refreshing it before it expires. [`draft`] builds and
//! uploads the MIME message.

pub mod draft;
pub mod oauth;

use std::time::Duration;

use chrono::Utc;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::config::GmailConfig;
use crate::store::{StoreError, Workspace};
use crate::types::GmailToken;

use self::draft::DraftDetails;
use self::oauth::{OAuthClient, PkcePair};

/// OAuth scope allowing draft creation.
pub const GMAIL_COMPOSE_SCOPE: &str = "https://www.googleapis.com/auth/gmail.compose";

/// How long sign-in waits for the browser redirect.
const SIGN_IN_TIMEOUT: Duration = Duration::from_secs(300);

/// Errors from Gmail authorization and draft creation.
#[derive(Debug, thiserror::Error)]
pub enum GmailError {
    /// No Google OAuth client id has been stored.
    #[error("Google is not set up: run `leadscout gmail client-id <CLIENT_ID>` first")]
    NotConfigured,

    /// No token has been stored.
    #[error("not signed in to Gmail: run `leadscout gmail sign-in` first")]
    NotSignedIn,

    /// The stored grant can no longer be refreshed.
    #[error("Gmail session expired or revoked: run `leadscout gmail sign-in` again")]
    AuthExpired,

    /// Google rejected the draft request with 401/403.
    #[error("permission denied: please sign in to Google again")]
    PermissionDenied,

    /// Draft creation failed for another reason.
    #[error("could not create the Gmail draft (HTTP {status}): {message}")]
    DraftFailed {
        /// HTTP status code.
        status: u16,
        /// Upstream error message.
        message: String,
    },

    /// The draft has no recipient address.
    #[error("the lead has no contact email to address the draft to")]
    MissingRecipient,

    /// Google reported an OAuth error (already user-facing).
    #[error("{0}")]
    OAuth(String),

    /// The redirect's `state` did not match this sign-in attempt.
    #[error("OAuth state mismatch; sign-in aborted")]
    StateMismatch,

    /// Sign-in did not complete.
    #[error("Google sign-in cancelled: {0}")]
    FlowCancelled(String),

    /// Token endpoint returned an unusable response.
    #[error("token request failed: {0}")]
    TokenExchange(String),

    /// Invalid endpoint configuration.
    #[error("invalid Gmail configuration: {0}")]
    Configuration(String),

    /// HTTP transport failure.
    #[error("Gmail request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Loopback socket failure.
    #[error("loopback listener error: {0}")]
    Io(#[from] std::io::Error),

    /// Token persistence failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Readiness and sign-in state, as shown by `gmail status`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthStatus {
    /// A client id is configured so sign-in can start.
    pub ready: bool,
    /// A token is stored.
    pub signed_in: bool,
    /// What the user should fix, if anything.
    pub error: Option<String>,
}

/// Gmail authorization bound to the configured endpoints.
#[derive(Debug, Clone)]
pub struct GmailAuth {
    config: GmailConfig,
    client_secret: Option<String>,
    http: reqwest::Client,
}

impl GmailAuth {
    /// Create an authorizer for `config`.
    pub fn new(config: GmailConfig, client_secret: Option<String>, http: reqwest::Client) -> Self {
        Self {
            config,
            client_secret,
            http,
        }
    }

    fn oauth_client(&self, client_id: &str) -> OAuthClient {
        OAuthClient::new(
            self.http.clone(),
            self.config.token_url.clone(),
            self.config.revoke_url.clone(),
            client_id,
            self.client_secret.clone(),
        )
    }

    fn client_id<'w>(&self, workspace: &'w Workspace) -> Result<&'w str, GmailError> {
        let id = workspace.google_client_id();
        if id.is_empty() {
            return Err(GmailError::NotConfigured);
        }
        Ok(id)
    }

    /// Report readiness and sign-in state.
    ///
    /// # Errors
    ///
    /// Returns [`GmailError::Store`] if the token cannot be read.
    pub async fn status(&self, workspace: &Workspace) -> Result<AuthStatus, GmailError> {
        let ready = !workspace.google_client_id().is_empty();
        let signed_in = workspace.gmail_token().await?.is_some();
        let error = (!ready).then(|| GmailError::NotConfigured.to_string());
        Ok(AuthStatus {
            ready,
            signed_in,
            error,
        })
    }

    /// Run the consent flow and persist the resulting token.
    ///
    /// `announce` receives the consent URL for the user to open.
    ///
    /// # Errors
    ///
    /// Returns [`GmailError`] when not configured, when the user denies
    /// access, on timeout, or when the code exchange fails.
    pub async fn sign_in(
        &self,
        workspace: &Workspace,
        announce: impl FnOnce(&str),
    ) -> Result<GmailToken, GmailError> {
        let client_id = self.client_id(workspace)?;

        let listener = TcpListener::bind((
            self.config.redirect_host.as_str(),
            self.config.redirect_port,
        ))
        .await?;
        let port = listener.local_addr()?.port();
        let redirect_uri = format!("http://{}:{port}", self.config.redirect_host);

        let pkce = PkcePair::generate();
        let state = oauth::random_state();
        let url = oauth::authorization_url(
            &self.config.auth_url,
            client_id,
            &redirect_uri,
            &state,
            &pkce.challenge,
        )?;
        announce(&url);

        let redirect = oauth::wait_for_redirect(&listener, &state);
        let code = tokio::time::timeout(SIGN_IN_TIMEOUT, redirect)
            .await
            .map_err(|_| {
                GmailError::FlowCancelled("timed out waiting for the browser".to_owned())
            })??;

        let token = self
            .oauth_client(client_id)
            .exchange_code(&code, &pkce.verifier, &redirect_uri)
            .await?;
        workspace.set_gmail_token(Some(&token)).await?;
        info!("gmail sign-in complete");
        Ok(token)
    }

    /// Revoke and forget the stored token.
    ///
    /// A failed revocation is logged; the local token is removed regardless.
    ///
    /// # Errors
    ///
    /// Returns [`GmailError::Store`] if the token cannot be removed.
    pub async fn sign_out(&self, workspace: &Workspace) -> Result<bool, GmailError> {
        let Some(token) = workspace.gmail_token().await? else {
            return Ok(false);
        };
        let client_id = workspace.google_client_id();
        if let Err(e) = self.oauth_client(client_id).revoke(&token.access_token).await {
            warn!(error = %e, "token revocation failed, removing local token anyway");
        }
        workspace.set_gmail_token(None).await?;
        info!("gmail sign-out complete");
        Ok(true)
    }

    /// A usable access token, refreshed and re-persisted when it expires
    /// within the refresh buffer.
    ///
    /// # Errors
    ///
    /// Returns [`GmailError::NotSignedIn`] without a token,
    /// [`GmailError::AuthExpired`] when it cannot be refreshed.
    pub async fn access_token(&self, workspace: &Workspace) -> Result<String, GmailError> {
        let token = workspace
            .gmail_token()
            .await?
            .ok_or(GmailError::NotSignedIn)?;

        if !oauth::needs_refresh(&token, Utc::now()) {
            return Ok(token.access_token);
        }
        if token.refresh_token.is_none() {
            if token.expires_at.is_none() {
                return Ok(token.access_token);
            }
            return Err(GmailError::AuthExpired);
        }

        let client_id = self.client_id(workspace)?;
        let refreshed = self.oauth_client(client_id).refresh(&token).await?;
        workspace.set_gmail_token(Some(&refreshed)).await?;
        Ok(refreshed.access_token)
    }

    /// Create a Gmail draft with a fresh access token. Returns the draft id.
    ///
    /// # Errors
    ///
    /// Returns [`GmailError`] from token handling or draft creation.
    pub async fn create_draft(
        &self,
        workspace: &Workspace,
        details: &DraftDetails,
    ) -> Result<String, GmailError> {
        let token = self.access_token(workspace).await?;
        draft::create_draft(&self.http, &self.config.api_base, &token, details).await
    }
}
