//! Configuration system for the FinTrust gateway client.
//!
//! Provides TOML-based configuration with:
//! - Identity provider settings (`[identity]`): Keycloak URL, realm, client id, redirect URI
//! - Backend settings (`[backend]`): API base URL, audit endpoint, request timeout
//! - Decision policy (`[policy]`): eligibility threshold and differential-privacy constants
//! - Evaluation key (`[crypto]`), preferably supplied through the environment
//!
//! Layering (later overrides earlier): built-in local-development defaults,
//! the user config file, then `FINTRUST_*` environment variables.

pub mod discovery;
pub mod error;
pub mod types;

pub use discovery::{
    LoadedConfig, apply_env_overrides, load_config, load_config_file, load_config_with_options,
    xdg_config_dir, xdg_config_path,
};
pub use error::{ConfigError, Result};
pub use types::*;
