//! Local session: a simulated login plus the guard every user-data command
//! runs first.
//!
//! There is no account backend. Logging in only records who is using this
//! data directory; no password is ever checked.

use tracing::info;
use uuid::Uuid;

use crate::store::{DocumentKey, DocumentStore, StoreError, Workspace};
use crate::types::SessionUser;

/// Errors from session operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// A user-data command ran without a session.
    #[error("not logged in; run `leadscout login --email <address>` first")]
    NotLoggedIn,

    /// The login email is empty or has no `@`.
    #[error("a valid email address is required to log in, got {0:?}")]
    InvalidEmail(String),

    /// Registration without a display name.
    #[error("a name is required to register")]
    MissingName,

    /// Persistence failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Start a session for `email`; the display name is the address's local part.
///
/// # Errors
///
/// Returns [`SessionError::InvalidEmail`] for an empty address or one without
/// `@`, or [`SessionError::Store`] on persistence failure.
pub async fn login(store: &DocumentStore, email: &str) -> Result<SessionUser, SessionError> {
    let email = checked_email(email)?;
    let name = email.split('@').next().unwrap_or_default().to_owned();
    start(store, name, email).await
}

/// Start a session with an explicit display name.
///
/// # Errors
///
/// Returns [`SessionError::MissingName`] or [`SessionError::InvalidEmail`]
/// for bad input, or [`SessionError::Store`] on persistence failure.
pub async fn register(
    store: &DocumentStore,
    name: &str,
    email: &str,
) -> Result<SessionUser, SessionError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(SessionError::MissingName);
    }
    let email = checked_email(email)?;
    start(store, name.to_owned(), email).await
}

/// End the session and drop every per-user collection.
///
/// # Errors
///
/// Returns [`SessionError::Store`] on persistence failure.
pub async fn logout(workspace: &mut Workspace) -> Result<(), SessionError> {
    workspace
        .store()
        .remove(&[DocumentKey::SessionUser])
        .await?;
    workspace.clear_user_data().await?;
    info!("session ended");
    Ok(())
}

/// The current session user, if any.
///
/// # Errors
///
/// Returns [`SessionError::Store`] on query failure.
pub async fn current_user(store: &DocumentStore) -> Result<Option<SessionUser>, SessionError> {
    Ok(store.get(DocumentKey::SessionUser).await?)
}

/// Session guard: the current user, or [`SessionError::NotLoggedIn`].
///
/// # Errors
///
/// Returns [`SessionError::NotLoggedIn`] without a session, or
/// [`SessionError::Store`] on query failure.
pub async fn require_user(store: &DocumentStore) -> Result<SessionUser, SessionError> {
    current_user(store).await?.ok_or(SessionError::NotLoggedIn)
}

fn checked_email(email: &str) -> Result<String, SessionError> {
    let email = email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(SessionError::InvalidEmail(email.to_owned()));
    }
    Ok(email.to_owned())
}

async fn start(
    store: &DocumentStore,
    name: String,
    email: String,
) -> Result<SessionUser, SessionError> {
    let user = SessionUser {
        id: Uuid::new_v4().to_string(),
        name,
        email,
    };
    store.put(DocumentKey::SessionUser, &user).await?;
    info!(user = %user.email, "session started");
    Ok(user)
}
