//! Config file discovery and layered merging.
//!
//! Resolution order (later overrides earlier):
//! 1. Built-in local-development defaults
//! 2. `~/.config/fintrust/fintrust.toml` (or `$FINTRUST_CONFIG_DIR/fintrust.toml`)
//! 3. `FINTRUST_*` environment variables

use std::path::{Path, PathBuf};

use crate::{ConfigError, FintrustConfig, Result};

/// Config filename within the config directory.
const USER_CONFIG_FILE: &str = "fintrust.toml";

/// Application name for XDG directory resolution.
const APP_NAME: &str = "fintrust";

/// Environment variable to override the config directory.
///
/// Also decides where credentials and logs are stored.
const CONFIG_DIR_ENV: &str = "FINTRUST_CONFIG_DIR";

/// Variables read by [`apply_env_overrides`].
pub const ENV_KEYCLOAK_URL: &str = "FINTRUST_KEYCLOAK_URL";
pub const ENV_KEYCLOAK_REALM: &str = "FINTRUST_KEYCLOAK_REALM";
pub const ENV_KEYCLOAK_CLIENT_ID: &str = "FINTRUST_KEYCLOAK_CLIENT_ID";
pub const ENV_REDIRECT_URI: &str = "FINTRUST_REDIRECT_URI";
pub const ENV_API_BASE: &str = "FINTRUST_API_BASE";
pub const ENV_AUDIT_URL: &str = "FINTRUST_AUDIT_URL";
pub const ENV_LOAN_THRESHOLD: &str = "FINTRUST_LOAN_THRESHOLD";
pub const ENV_DP_SENSITIVITY: &str = "FINTRUST_DP_SENSITIVITY";
pub const ENV_DP_EPSILON: &str = "FINTRUST_DP_EPSILON";
pub const ENV_EVALUATION_KEY: &str = "FINTRUST_EVALUATION_KEY";

/// Result of config discovery and loading.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// The merged configuration.
    pub config: FintrustConfig,
    /// Config file that was read, if any.
    pub source: Option<PathBuf>,
    /// Warnings generated during loading (ignored overrides, plaintext keys).
    pub warnings: Vec<String>,
}

/// Load configuration from the default config directory and the process environment.
pub fn load_config() -> Result<LoadedConfig> {
    load_config_with_options(None, |name| std::env::var(name).ok())
}

/// Load configuration with explicit control over the config directory and
/// the environment lookup.
///
/// `config_dir` overrides both `FINTRUST_CONFIG_DIR` and the platform default.
pub fn load_config_with_options<F>(config_dir: Option<&Path>, env: F) -> Result<LoadedConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let mut warnings = Vec::new();

    let path = match config_dir {
        Some(dir) => Some(dir.join(USER_CONFIG_FILE)),
        None => xdg_config_path(),
    };

    let (mut config, source) = match path {
        Some(path) if path.is_file() => {
            let config = load_config_file(&path)?;
            if config.crypto.evaluation_key.is_some() {
                warnings.push(format!(
                    "{} contains a plaintext evaluation key. \
                     Consider setting {} instead.",
                    path.display(),
                    ENV_EVALUATION_KEY
                ));
            }
            (config, Some(path))
        }
        _ => (FintrustConfig::new(), None),
    };

    apply_env_overrides(&mut config, env, &mut warnings);
    config.validate()?;

    Ok(LoadedConfig {
        config,
        source,
        warnings,
    })
}

/// Load config from a specific file path (no discovery).
pub fn load_config_file(path: &Path) -> Result<FintrustConfig> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.display().to_string(),
        source: e,
    })?;
    FintrustConfig::from_toml(&contents)
}

/// Apply `FINTRUST_*` overrides on top of `config`.
///
/// Overrides are best-effort: unparsable or out-of-range numbers are skipped
/// and reported in `warnings`.
pub fn apply_env_overrides<F>(config: &mut FintrustConfig, env: F, warnings: &mut Vec<String>)
where
    F: Fn(&str) -> Option<String>,
{
    let text = |name: &str| env(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

    if let Some(v) = text(ENV_KEYCLOAK_URL) {
        config.identity.keycloak_url = v;
    }
    if let Some(v) = text(ENV_KEYCLOAK_REALM) {
        config.identity.realm = v;
    }
    if let Some(v) = text(ENV_KEYCLOAK_CLIENT_ID) {
        config.identity.client_id = v;
    }
    if let Some(v) = text(ENV_REDIRECT_URI) {
        config.identity.redirect_uri = v;
    }
    if let Some(v) = text(ENV_API_BASE) {
        config.backend.base_url = v;
    }
    if let Some(v) = text(ENV_AUDIT_URL) {
        config.backend.audit_url = v;
    }
    if let Some(v) = text(ENV_EVALUATION_KEY) {
        config.crypto.evaluation_key = Some(v);
    }

    let number = |name: &str, accept: fn(f64) -> bool, warnings: &mut Vec<String>| {
        let raw = text(name)?;
        match raw.parse::<f64>() {
            Ok(x) if accept(x) => Some(x),
            _ => {
                warnings.push(format!("Ignoring {}={}: not a usable number", name, raw));
                None
            }
        }
    };

    if let Some(x) = number(ENV_LOAN_THRESHOLD, f64::is_finite, warnings) {
        config.policy.threshold = x;
    }
    if let Some(x) = number(ENV_DP_SENSITIVITY, |x| x.is_finite() && x >= 0.0, warnings) {
        config.policy.sensitivity = x;
    }
    if let Some(x) = number(ENV_DP_EPSILON, |x| x.is_finite() && x > 0.0, warnings) {
        config.policy.epsilon = x;
    }
}

/// Get the config file path for fintrust.
pub fn xdg_config_path() -> Option<PathBuf> {
    xdg_config_dir().map(|d| d.join(USER_CONFIG_FILE))
}

/// Get the config directory for fintrust.
///
/// Checks `FINTRUST_CONFIG_DIR` first, then falls back to the platform default.
pub fn xdg_config_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var(CONFIG_DIR_ENV)
        && !dir.is_empty()
    {
        return Some(PathBuf::from(dir));
    }
    dirs::config_dir().map(|d| d.join(APP_NAME))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
