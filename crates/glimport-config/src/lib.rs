//! Configuration for glimport.
//!
//! TOML config file plus `GLIMPORT_` environment overrides, and resolution
//! of the GitLab connection (base URL, token, transport) from explicit
//! input, environment, config file and built-in defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use glimport_api::{TlsMode, TransportConfig};
use glimport_core::ExistenceMatcher;

/// Instance used when nothing else names one.
pub const DEFAULT_BASE_URL: &str = "https://gitlab.com/";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no GitLab token found (set ${env} or gitlab.token in {path})")]
    NoCredentials { env: String, path: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub gitlab: GitLabSettings,

    #[serde(default)]
    pub import: ImportSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct GitLabSettings {
    /// Instance root, e.g. "https://gitlab.example.com".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Access token (plaintext, prefer `token_env`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Environment variable holding the token.
    #[serde(default = "default_token_env")]
    pub token_env: String,

    /// Environment variable holding the instance URL.
    #[serde(default = "default_url_env")]
    pub url_env: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    #[serde(default)]
    pub insecure: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca_cert: Option<PathBuf>,
}

impl Default for GitLabSettings {
    fn default() -> Self {
        Self {
            base_url: None,
            token: None,
            token_env: default_token_env(),
            url_env: default_url_env(),
            timeout: default_timeout(),
            insecure: false,
            ca_cert: None,
        }
    }
}

fn default_token_env() -> String {
    "GITLAB_API_KEY".into()
}
fn default_url_env() -> String {
    "GITLAB_URL".into()
}
fn default_timeout() -> u64 {
    30
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ImportSettings {
    /// Substrings of the `Synced` message that mean "already exists".
    #[serde(default = "default_taken_markers")]
    pub taken_markers: Vec<String>,

    /// Policies for imported resources when the function input has none.
    #[serde(default = "default_management_policies")]
    pub management_policies: Vec<String>,
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            taken_markers: default_taken_markers(),
            management_policies: default_management_policies(),
        }
    }
}

fn default_taken_markers() -> Vec<String> {
    vec![glimport_core::handler::DEFAULT_TAKEN_MARKER.into()]
}
fn default_management_policies() -> Vec<String> {
    glimport_core::reconcile::DEFAULT_MANAGEMENT_POLICIES
        .iter()
        .map(|p| (*p).to_owned())
        .collect()
}

impl ImportSettings {
    pub fn matcher(&self) -> ExistenceMatcher {
        ExistenceMatcher::new(self.taken_markers.iter().cloned())
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "glimport", "glimport").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("glimport");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load from an explicit file. A missing file yields the defaults.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("GLIMPORT_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

// ── Config saving ───────────────────────────────────────────────────

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Connection resolution ───────────────────────────────────────────

/// Values given explicitly by the caller (CLI flags).
#[derive(Debug, Clone, Default)]
pub struct ConnectionOverrides {
    pub base_url: Option<String>,
    pub token: Option<SecretString>,
    pub timeout: Option<u64>,
    pub insecure: bool,
}

/// Everything needed to build a `GitLabClient`.
#[derive(Debug, Clone)]
pub struct Connection {
    pub base_url: String,
    pub token: SecretString,
    pub timeout: Duration,
    pub tls: TlsMode,
}

impl Connection {
    pub fn transport(&self) -> TransportConfig {
        TransportConfig {
            tls: self.tls.clone(),
            timeout: self.timeout,
        }
    }
}

/// Resolve against the process environment.
pub fn resolve_connection(
    config: &Config,
    input_base_url: Option<&str>,
    overrides: &ConnectionOverrides,
) -> Result<Connection, ConfigError> {
    resolve_connection_with(config, input_base_url, overrides, |name| {
        std::env::var(name).ok()
    })
}

/// Resolve with an injected environment lookup.
///
/// Base URL: function input > override > `url_env` > config > default.
/// Token: override > `token_env` > config. Empty values count as unset.
pub fn resolve_connection_with<F>(
    config: &Config,
    input_base_url: Option<&str>,
    overrides: &ConnectionOverrides,
    env: F,
) -> Result<Connection, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let settings = &config.gitlab;
    let env = |name: &str| env(name).filter(|v| !v.is_empty());

    let base_url = input_base_url
        .filter(|url| !url.is_empty())
        .map(String::from)
        .or_else(|| overrides.base_url.clone().filter(|url| !url.is_empty()))
        .or_else(|| env(&settings.url_env))
        .or_else(|| settings.base_url.clone().filter(|url| !url.is_empty()))
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_owned());
    validate_url(&base_url)?;

    let token = overrides
        .token
        .clone()
        .or_else(|| env(&settings.token_env).map(SecretString::from))
        .or_else(|| {
            settings
                .token
                .clone()
                .filter(|t| !t.is_empty())
                .map(SecretString::from)
        })
        .ok_or_else(|| ConfigError::NoCredentials {
            env: settings.token_env.clone(),
            path: config_path().display().to_string(),
        })?;

    let tls = if overrides.insecure || settings.insecure {
        TlsMode::DangerAcceptInvalid
    } else if let Some(ref ca) = settings.ca_cert {
        TlsMode::CustomCa(ca.clone())
    } else {
        TlsMode::System
    };

    let timeout = Duration::from_secs(overrides.timeout.unwrap_or(settings.timeout));

    Ok(Connection {
        base_url,
        token,
        timeout,
        tls,
    })
}

fn validate_url(raw: &str) -> Result<(), ConfigError> {
    let url = url::Url::parse(raw).map_err(|e| ConfigError::Validation {
        field: "base_url".into(),
        reason: format!("{raw}: {e}"),
    })?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(ConfigError::Validation {
            field: "base_url".into(),
            reason: format!("unsupported scheme {other:?}"),
        }),
    }
}
