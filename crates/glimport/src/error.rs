//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use glimport_config::ConfigError;
use glimport_core::CoreError;

pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach GitLab: {message}")]
    #[diagnostic(
        code(glimport::connection_failed),
        help(
            "Check the instance URL (--gitlab-url or $GITLAB_URL).\n\
             Self-signed certificate? Try --insecure or set gitlab.ca_cert."
        )
    )]
    ConnectionFailed { message: String },

    #[error("Request timed out")]
    #[diagnostic(
        code(glimport::timeout),
        help("Increase the timeout with --timeout or gitlab.timeout.")
    )]
    Timeout,

    // ── Authentication ───────────────────────────────────────────────
    #[error("GitLab rejected the access token")]
    #[diagnostic(
        code(glimport::auth_failed),
        help("The token needs the read_api scope. Check $GITLAB_API_KEY or --token.")
    )]
    AuthFailed,

    #[error("No GitLab token configured")]
    #[diagnostic(
        code(glimport::no_credentials),
        help(
            "Set ${env}, pass --token, or add gitlab.token to {path}."
        )
    )]
    NoCredentials { env: String, path: String },

    // ── Resolution ───────────────────────────────────────────────────
    #[error("{message}")]
    #[diagnostic(
        code(glimport::not_found),
        help("Paths match exactly, including case. Check the parent id.")
    )]
    NotFound { message: String },

    #[error("GitLab API error: {message}")]
    #[diagnostic(code(glimport::api_error))]
    ApiError {
        message: String,
        #[help]
        request_id: Option<String>,
    },

    #[error("Function run reported {count} fatal result(s)")]
    #[diagnostic(code(glimport::fatal_result))]
    FatalResult { count: usize },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(glimport::validation))]
    Validation { field: String, reason: String },

    #[error("Invalid request document: {message}")]
    #[diagnostic(
        code(glimport::invalid_request),
        help("Expected a RunFunctionRequest in JSON or YAML.")
    )]
    InvalidRequest { message: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Config file already exists at {path}")]
    #[diagnostic(code(glimport::config_exists), help("Use --force to overwrite it."))]
    ConfigExists { path: String },

    #[error(transparent)]
    #[diagnostic(code(glimport::config))]
    Config(Box<figment::Error>),

    // ── IO / Serialization ────────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("JSON serialization failed: {0}")]
    #[diagnostic(code(glimport::json))]
    Json(#[from] serde_json::Error),

    #[error("YAML serialization failed: {0}")]
    #[diagnostic(code(glimport::yaml))]
    Yaml(#[from] serde_yaml::Error),

    #[error("TOML serialization failed: {0}")]
    #[diagnostic(code(glimport::toml))]
    Toml(#[from] toml::ser::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout => exit_code::TIMEOUT,
            Self::AuthFailed | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Validation { .. } | Self::InvalidRequest { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            err @ CoreError::NotFound { .. } => CliError::NotFound {
                message: err.to_string(),
            },

            CoreError::Remote {
                status: Some(401), ..
            } => CliError::AuthFailed,

            CoreError::Remote {
                message,
                status: None,
                transient: true,
                ..
            } => {
                if message.starts_with(glimport_core::error::TIMEOUT_PREFIX) {
                    CliError::Timeout
                } else {
                    CliError::ConnectionFailed { message }
                }
            }

            CoreError::Remote {
                message,
                request_id,
                ..
            } => CliError::ApiError {
                message,
                request_id: request_id.map(|id| format!("GitLab request id: {id}")),
            },

            CoreError::Extraction { field, reason, .. } => CliError::Validation { field, reason },

            CoreError::Annotation { message } => CliError::Validation {
                field: "annotation".into(),
                reason: message,
            },

            CoreError::InvalidRequest { message } => CliError::InvalidRequest { message },

            CoreError::ClientUnavailable { .. } => CliError::NoCredentials {
                env: "GITLAB_API_KEY".into(),
                path: glimport_config::config_path().display().to_string(),
            },
        }
    }
}

impl From<glimport_api::Error> for CliError {
    fn from(err: glimport_api::Error) -> Self {
        match err {
            glimport_api::Error::InvalidUrl(e) => CliError::Validation {
                field: "gitlab-url".into(),
                reason: e.to_string(),
            },
            glimport_api::Error::Tls(message) => CliError::ConnectionFailed { message },
            glimport_api::Error::Transport(ref e) if e.is_timeout() => CliError::Timeout,
            other => CoreError::from(other).into(),
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::NoCredentials { env, path } => CliError::NoCredentials { env, path },
            ConfigError::Serialization(e) => CliError::Toml(e),
            ConfigError::Figment(e) => CliError::Config(e),
            ConfigError::Io(e) => CliError::Io(e),
        }
    }
}
