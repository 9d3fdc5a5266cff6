//! Secrets from `~/.leadscout/.env`.
//!
//! The file holds the completion API key (`OPENROUTER_API_KEY` unless
//! `completion.api_key_env` says otherwise) and, optionally, the Google
//! OAuth client secret. Values set in the file take precedence over the
//! process environment. On unix the file must not be readable by group or
//! others.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

/// Key of the optional Google OAuth client secret.
pub const GOOGLE_CLIENT_SECRET: &str = "GOOGLE_CLIENT_SECRET";

/// Problems with the credentials file.
#[derive(Debug, thiserror::Error)]
pub enum CredentialsError {
    /// The file exists but could not be read or inspected.
    #[error("cannot read {}: {source}", .path.display())]
    Read {
        /// File path.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },
    /// A line is not a valid `KEY=value` entry.
    #[error("cannot parse {}: {source}", .path.display())]
    Parse {
        /// File path.
        path: PathBuf,
        /// dotenvy parse error.
        source: dotenvy::Error,
    },
    /// Group or other permission bits are set.
    #[error(
        "{} must be readable only by you (chmod 600), found mode {mode:o}",
        .path.display()
    )]
    TooOpen {
        /// File path.
        path: PathBuf,
        /// Permission bits found.
        mode: u32,
    },
    /// A required key is absent or blank in both the file and the environment.
    #[error("{0} is not set in ~/.leadscout/.env or the environment")]
    Missing(String),
}

/// Loaded secrets. `Debug` lists key names only.
#[derive(Clone, Default)]
pub struct Credentials {
    values: BTreeMap<String, String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.values.keys()).finish()
    }
}

impl FromIterator<(String, String)> for Credentials {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

impl Credentials {
    /// The file value for `key`. Blank values count as absent.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values
            .get(key)
            .map(String::as_str)
            .filter(|value| !value.trim().is_empty())
    }

    /// Like [`Credentials::resolve`] but absent is an error.
    ///
    /// # Errors
    ///
    /// [`CredentialsError::Missing`].
    pub fn require(&self, key: &str) -> Result<String, CredentialsError> {
        self.resolve(key)
            .ok_or_else(|| CredentialsError::Missing(key.to_owned()))
    }

    /// File value for `key`, else the process environment.
    pub fn resolve(&self, key: &str) -> Option<String> {
        self.resolve_with(key, |name| std::env::var(name).ok())
    }

    /// [`Credentials::resolve`] with an injectable environment.
    pub fn resolve_with(
        &self,
        key: &str,
        env: impl Fn(&str) -> Option<String>,
    ) -> Option<String> {
        match self.get(key) {
            Some(value) => Some(value.to_owned()),
            None => env(key).filter(|value| !value.trim().is_empty()),
        }
    }

    /// Google OAuth client secret, if any.
    pub fn google_client_secret(&self) -> Option<String> {
        self.resolve(GOOGLE_CLIENT_SECRET)
    }
}

/// Read the `.env` file at `path`. A missing file gives empty credentials.
///
/// # Errors
///
/// [`CredentialsError::TooOpen`] on unix when group/other bits are set,
/// [`CredentialsError::Read`] or [`CredentialsError::Parse`] otherwise.
pub fn load_credentials(path: &Path) -> Result<Credentials, CredentialsError> {
    let metadata = match std::fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "no credentials file");
            return Ok(Credentials::default());
        }
        Err(source) => {
            return Err(CredentialsError::Read {
                path: path.to_owned(),
                source,
            })
        }
    };
    check_private(path, &metadata)?;

    let parse_error = |source| CredentialsError::Parse {
        path: path.to_owned(),
        source,
    };
    let entries = dotenvy::from_path_iter(path).map_err(parse_error)?;
    let credentials = entries
        .collect::<Result<Credentials, _>>()
        .map_err(parse_error)?;
    tracing::debug!(keys = credentials.values.len(), "credentials loaded");
    Ok(credentials)
}

#[cfg(unix)]
fn check_private(path: &Path, metadata: &std::fs::Metadata) -> Result<(), CredentialsError> {
    use std::os::unix::fs::PermissionsExt;

    let mode = metadata.permissions().mode() & 0o777;
    if mode & 0o077 == 0 {
        return Ok(());
    }
    Err(CredentialsError::TooOpen {
        path: path.to_owned(),
        mode,
    })
}

#[cfg(not(unix))]
fn check_private(_path: &Path, _metadata: &std::fs::Metadata) -> Result<(), CredentialsError> {
    Ok(())
}
