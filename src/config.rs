//! Configuration loading.
//!
//! leadscout reads `config.toml` from its runtime directory (`~/.leadscout/`
//! or the file named by `$LEADSCOUT_CONFIG`). Secrets never live here; see
//! [`crate::credentials`].
//!
//! Precedence: env vars > config file > defaults.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

/// Name of the store file inside the data directory.
pub const STORE_FILE: &str = "leadscout.db";

// ── Top-level config ────────────────────────────────────────────

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Chat completion endpoint settings.
    pub completion: CompletionConfig,
    /// Google OAuth and Gmail API settings.
    pub gmail: GmailConfig,
    /// Filesystem locations.
    pub paths: PathsConfig,
    /// Log output settings.
    pub logging: LoggingConfig,
    /// Env overrides that failed to parse, kept until logging is up.
    #[serde(skip)]
    rejected_overrides: Vec<RejectedOverride>,
}

/// An environment override whose value could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedOverride {
    /// Variable name.
    pub var: &'static str,
    /// Raw value found in the environment.
    pub value: String,
}

impl Config {
    /// Load `config.toml` from `dir` (or `$LEADSCOUT_CONFIG`) and apply
    /// environment overrides.
    ///
    /// A missing file yields defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(dir: &Path) -> anyhow::Result<Self> {
        Self::load_with(dir, |key| std::env::var(key).ok())
    }

    /// Same as [`Config::load`] with a custom env resolver (for testing).
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_with(dir: &Path, env: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let path = config_path_with(dir, &env);
        let mut config = match std::fs::read_to_string(&path) {
            Ok(contents) => {
                tracing::debug!(path = %path.display(), "loading config from file");
                Self::from_toml(&contents)
                    .with_context(|| format!("failed to parse config at {}", path.display()))?
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file found, using defaults");
                Self::default()
            }
            Err(e) => {
                return Err(anyhow::anyhow!(
                    "failed to read config at {}: {e}",
                    path.display()
                ))
            }
        };
        config.apply_overrides(env);
        Ok(config)
    }

    /// Parse a TOML string into config.
    ///
    /// # Errors
    ///
    /// Returns an error on invalid TOML or mistyped fields.
    pub fn from_toml(toml_str: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(toml_str).context("failed to parse config TOML")?;
        Ok(config)
    }

    /// Apply environment variable overrides (env > config > defaults).
    ///
    /// Takes a resolver function so tests never mutate the process env.
    /// Unparsable numeric values leave the setting unchanged and are
    /// recorded in [`Config::rejected_overrides`]; config loads before the
    /// log subscriber exists, so the caller reports them.
    pub fn apply_overrides(&mut self, env: impl Fn(&str) -> Option<String>) {
        if let Some(v) = env("LEADSCOUT_COMPLETION_URL") {
            self.completion.base_url = v;
        }
        if let Some(v) = env("LEADSCOUT_MODEL") {
            self.completion.model = v;
        }
        if let Some(v) = env("LEADSCOUT_TIMEOUT_SECS") {
            match v.trim().parse() {
                Ok(n) => self.completion.timeout_secs = n,
                Err(_) => self.rejected_overrides.push(RejectedOverride {
                    var: "LEADSCOUT_TIMEOUT_SECS",
                    value: v,
                }),
            }
        }
        if let Some(v) = env("LEADSCOUT_MAX_RESULTS") {
            match v.trim().parse() {
                Ok(n) => self.completion.max_results = n,
                Err(_) => self.rejected_overrides.push(RejectedOverride {
                    var: "LEADSCOUT_MAX_RESULTS",
                    value: v,
                }),
            }
        }
        if let Some(v) = env("LEADSCOUT_GMAIL_API_BASE") {
            self.gmail.api_base = v;
        }
        if let Some(v) = env("LEADSCOUT_DATA_DIR") {
            self.paths.data_dir = Some(v);
        }
        if let Some(v) = env("LEADSCOUT_LOG_LEVEL") {
            self.logging.level = v;
        }
    }

    /// Overrides ignored by the last [`Config::apply_overrides`] calls.
    pub fn rejected_overrides(&self) -> &[RejectedOverride] {
        &self.rejected_overrides
    }
}

// ── Completion ──────────────────────────────────────────────────

/// OpenAI-compatible chat completion endpoint (`[completion]`).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CompletionConfig {
    /// API base URL; `/chat/completions` is appended.
    pub base_url: String,
    /// Model identifier.
    pub model: String,
    /// Credential key holding the API key.
    pub api_key_env: String,
    /// Optional `HTTP-Referer` attribution header.
    pub referer: Option<String>,
    /// Optional `X-Title` attribution header.
    pub title: Option<String>,
    /// Upper bound on leads requested per search.
    pub max_results: u32,
    /// HTTP request timeout in seconds.
    pub timeout_secs: u64,
    /// Description of the service being sold, quoted in every prompt.
    pub service_description: String,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            base_url: "https://openrouter.ai/api/v1".to_owned(),
            model: "deepseek/deepseek-chat-v3.1:free".to_owned(),
            api_key_env: "OPENROUTER_API_KEY".to_owned(),
            referer: None,
            title: Some("leadscout".to_owned()),
            max_results: 30,
            timeout_secs: 120,
            service_description: "Build custom applications on top of large language models \
                                  that solve the specific needs of an industry or business."
                .to_owned(),
        }
    }
}

// ── Gmail ───────────────────────────────────────────────────────

/// Google OAuth endpoints and Gmail API base (`[gmail]`).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GmailConfig {
    /// Authorization endpoint opened in the browser.
    pub auth_url: String,
    /// Token endpoint for code exchange and refresh.
    pub token_url: String,
    /// Token revocation endpoint.
    pub revoke_url: String,
    /// Gmail REST API base URL.
    pub api_base: String,
    /// Loopback host the redirect listener binds to.
    pub redirect_host: String,
    /// Loopback port; 0 picks an ephemeral port.
    pub redirect_port: u16,
}

impl Default for GmailConfig {
    fn default() -> Self {
        Self {
            auth_url: "https://accounts.google.com/o/oauth2/v2/auth".to_owned(),
            token_url: "https://oauth2.googleapis.com/token".to_owned(),
            revoke_url: "https://oauth2.googleapis.com/revoke".to_owned(),
            api_base: "https://gmail.googleapis.com".to_owned(),
            redirect_host: "127.0.0.1".to_owned(),
            redirect_port: 0,
        }
    }
}

// ── Paths and logging ───────────────────────────────────────────

/// Filesystem overrides (`[paths]`). Relative paths resolve against the
/// runtime directory.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Directory holding the store file.
    pub data_dir: Option<String>,
    /// Directory for rotated log files.
    pub logs_dir: Option<String>,
}

/// Log output settings (`[logging]`).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset.
    pub level: String,
    /// Also write JSON logs to a daily-rotated file.
    pub file: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_owned(),
            file: false,
        }
    }
}

// ── Runtime paths ───────────────────────────────────────────────

/// Resolved on-disk locations for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimePaths {
    /// Runtime directory (`~/.leadscout/`).
    pub root: PathBuf,
    /// Credentials file.
    pub env_file: PathBuf,
    /// SQLite document store.
    pub store_db: PathBuf,
    /// Log directory.
    pub logs_dir: PathBuf,
}

/// Resolve the default runtime directory (`~/.leadscout/`).
///
/// # Errors
///
/// Returns an error if the home directory cannot be determined.
pub fn config_dir() -> anyhow::Result<PathBuf> {
    let home = directories::BaseDirs::new()
        .ok_or_else(|| anyhow::anyhow!("cannot determine home directory"))?;
    Ok(home.home_dir().join(".leadscout"))
}

/// Resolve every runtime file location from `root` and the `[paths]` section.
pub fn runtime_paths(root: &Path, config: &Config) -> RuntimePaths {
    let resolve = |configured: &Option<String>, fallback: &str| match configured {
        Some(p) if !p.trim().is_empty() => root.join(p),
        _ => root.join(fallback),
    };
    let data_dir = resolve(&config.paths.data_dir, "");
    RuntimePaths {
        root: root.to_path_buf(),
        env_file: root.join(".env"),
        store_db: data_dir.join(STORE_FILE),
        logs_dir: resolve(&config.paths.logs_dir, "logs"),
    }
}

fn config_path_with(dir: &Path, env: impl Fn(&str) -> Option<String>) -> PathBuf {
    match env("LEADSCOUT_CONFIG") {
        Some(p) if !p.trim().is_empty() => PathBuf::from(p),
        _ => dir.join("config.toml"),
    }
}
