//! Typed document store backed by SQLite.
//!
//! The [`DocumentStore`] keeps one JSON document per [`DocumentKey`] in the
//! `documents` table. Callers read and write whole documents through serde
//! types; the store never interprets their contents.
//!
//! [`Workspace`] layers the application state on top: it loads every
//! document once at startup and writes back the touched key after each
//! mutation. Concurrent processes are not coordinated (last write wins).

pub mod workspace;

use std::path::Path;

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::{debug, warn};

use crate::types::ValidationError;

pub use self::workspace::Workspace;

/// Schema applied on every open. Idempotent.
const SCHEMA_SQL: &str = include_str!("../../migrations/001_documents.sql");

// ---------------------------------------------------------------------------
// Keys
// ---------------------------------------------------------------------------

/// Every document the application persists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentKey {
    /// [`crate::types::UserProfile`].
    Profile,
    /// `Vec<`[`crate::types::GeneratedEmail`]`>`.
    Emails,
    /// `Vec<`[`crate::types::Lead`]`>`.
    Leads,
    /// `Vec<`[`crate::types::LoggedCall`]`>`.
    Calls,
    /// Google OAuth client id (`String`).
    GoogleClientId,
    /// `Vec<`[`crate::types::Service`]`>`.
    Services,
    /// [`crate::types::SessionUser`].
    SessionUser,
    /// [`crate::types::GmailToken`].
    GmailToken,
}

impl DocumentKey {
    /// Keys holding data that belongs to the logged-in user.
    ///
    /// The OAuth client id is application configuration and survives logout.
    pub const USER_DATA: [Self; 6] = [
        Self::Profile,
        Self::Emails,
        Self::Leads,
        Self::Calls,
        Self::Services,
        Self::GmailToken,
    ];

    /// The fixed name the document is stored under.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Profile => "profile",
            Self::Emails => "emails",
            Self::Leads => "leads",
            Self::Calls => "calls",
            Self::GoogleClientId => "google_client_id",
            Self::Services => "services",
            Self::SessionUser => "session_user",
            Self::GmailToken => "gmail_token",
        }
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors from store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Database operation failed.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A document could not be encoded.
    #[error("failed to encode {key} document: {source}")]
    Encode {
        /// Document key.
        key: &'static str,
        /// Underlying serde error.
        source: serde_json::Error,
    },

    /// The store directory could not be created.
    #[error("failed to prepare store directory {path}: {source}")]
    Directory {
        /// Directory path.
        path: String,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// A mutation was rejected by record validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// Key-value store of JSON documents.
#[derive(Debug, Clone)]
pub struct DocumentStore {
    db: SqlitePool,
}

impl DocumentStore {
    /// Open (or create) the store file at `path` and apply the schema.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the parent directory cannot be created or
    /// the database cannot be opened.
    pub async fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|source| StoreError::Directory {
                    path: parent.display().to_string(),
                    source,
                })?;
            }
        }

        let opts = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(opts)
            .await?;
        debug!(path = %path.display(), "document store opened");
        Self::with_pool(pool).await
    }

    /// Open a private in-memory store.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if SQLite cannot be initialised.
    pub async fn open_in_memory() -> Result<Self, StoreError> {
        let opts = SqliteConnectOptions::new()
            .filename(":memory:")
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(opts)
            .await?;
        Self::with_pool(pool).await
    }

    async fn with_pool(db: SqlitePool) -> Result<Self, StoreError> {
        sqlx::raw_sql(SCHEMA_SQL).execute(&db).await?;
        Ok(Self { db })
    }

    /// Read and decode a document.
    ///
    /// A document that no longer decodes as `T` is logged and treated as
    /// absent, so callers fall back to their default.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] on query failure.
    pub async fn get<T: DeserializeOwned>(
        &self,
        key: DocumentKey,
    ) -> Result<Option<T>, StoreError> {
        let row: Option<(String,)> = sqlx::query_as("SELECT value FROM documents WHERE key = ?1")
            .bind(key.as_str())
            .fetch_optional(&self.db)
            .await?;

        let Some((raw,)) = row else {
            return Ok(None);
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                warn!(key = key.as_str(), error = %e, "stored document is unreadable, ignoring");
                Ok(None)
            }
        }
    }

    /// Encode and write a document, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on encoding or query failure.
    pub async fn put<T: Serialize + ?Sized>(
        &self,
        key: DocumentKey,
        value: &T,
    ) -> Result<(), StoreError> {
        let raw = serde_json::to_string(value).map_err(|source| StoreError::Encode {
            key: key.as_str(),
            source,
        })?;

        sqlx::query(
            "INSERT INTO documents (key, value, updated_at) VALUES (?1, ?2, ?3) \
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        )
        .bind(key.as_str())
        .bind(raw)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.db)
        .await?;
        Ok(())
    }

    /// Delete the given documents. Missing keys are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] on query failure.
    pub async fn remove(&self, keys: &[DocumentKey]) -> Result<(), StoreError> {
        for key in keys {
            sqlx::query("DELETE FROM documents WHERE key = ?1")
                .bind(key.as_str())
                .execute(&self.db)
                .await?;
        }
        Ok(())
    }

    /// Whether a document exists under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] on query failure.
    pub async fn contains(&self, key: DocumentKey) -> Result<bool, StoreError> {
        let row: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM documents WHERE key = ?1")
            .bind(key.as_str())
            .fetch_optional(&self.db)
            .await?;
        Ok(row.is_some())
    }
}
