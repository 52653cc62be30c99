//! CLI configuration: a thin wrapper around `glimport_config`.
//!
//! Adds `GlobalOpts`-aware loading (--config) and connection resolution
//! that layers --gitlab-url / --token / --timeout / --insecure on top.

use std::path::PathBuf;

use secrecy::SecretString;
use tracing::{debug, warn};

use glimport_api::GitLabClient;
use glimport_config::ConnectionOverrides;
use glimport_core::Reconciler;

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use glimport_config::{Config, save_config_to};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Config file in effect: --config, else the platform default.
pub fn config_path(global: &GlobalOpts) -> PathBuf {
    global
        .config
        .clone()
        .unwrap_or_else(glimport_config::config_path)
}

pub fn load(global: &GlobalOpts) -> Result<Config, CliError> {
    let path = config_path(global);
    debug!(path = %path.display(), "loading config");
    Ok(glimport_config::load_config_from(&path)?)
}

fn overrides(global: &GlobalOpts) -> ConnectionOverrides {
    ConnectionOverrides {
        base_url: global.gitlab_url.clone(),
        token: global.token.clone().map(SecretString::from),
        timeout: global.timeout,
        insecure: global.insecure,
    }
}

/// Build a GitLab client. `input_base_url` is the function input's
/// `baseURL`, which outranks every other source.
pub fn build_client(
    global: &GlobalOpts,
    config: &Config,
    input_base_url: Option<&str>,
) -> Result<GitLabClient, CliError> {
    let conn = glimport_config::resolve_connection(config, input_base_url, &overrides(global))?;
    debug!(base_url = %conn.base_url, timeout = ?conn.timeout, "connecting to GitLab");
    Ok(GitLabClient::from_token(
        &conn.base_url,
        &conn.token,
        &conn.transport(),
    )?)
}

/// A reconciler wired with the configured import settings. When no client
/// can be built (no token, bad URL, unreadable CA) it runs offline: copy
/// paths work, remote lookups fail per resource.
pub fn build_reconciler(
    global: &GlobalOpts,
    config: &Config,
    input_base_url: Option<&str>,
) -> Reconciler {
    let reconciler = match build_client(global, config, input_base_url) {
        Ok(client) => Reconciler::new(client),
        Err(CliError::NoCredentials { env, .. }) => {
            warn!("no GitLab token (${env}); remote lookups are disabled");
            Reconciler::offline(format!("no GitLab token, set ${env} or --token"))
        }
        Err(err) => {
            warn!(error = %err, "cannot build GitLab client; remote lookups are disabled");
            Reconciler::offline(err.to_string())
        }
    };

    reconciler
        .with_matcher(config.import.matcher())
        .with_management_policies(config.import.management_policies.clone())
}
