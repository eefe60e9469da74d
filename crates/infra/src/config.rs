//! Application configuration.
//!
//! Sources, later overriding earlier:
//! 1. `AppConfig::default()`
//! 2. `pbac.toml` in the working directory (optional)
//! 3. `PBAC_*` environment variables, nested keys split on `__`
//!    (e.g. `PBAC_JWT__SECRET`, `PBAC_JWT__ACCESS_TOKEN_TTL_SECS`)

use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use pbac_auth::{TokenCodec, TokenConfigError};

pub const DEFAULT_CONFIG_FILE: &str = "pbac.toml";
pub const ENV_PREFIX: &str = "PBAC_";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),

    #[error("jwt.secret is not set")]
    MissingSecret,

    #[error("invalid jwt settings: {0}")]
    Jwt(#[from] TokenConfigError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    pub bind_addr: String,
    pub log_filter: String,
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub jwt: JwtConfig,
    pub seed: SeedConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
            log_filter: "info".to_string(),
            database_url: None,
            database_max_connections: 10,
            jwt: JwtConfig::default(),
            seed: SeedConfig::default(),
        }
    }
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtConfig {
    /// Base64-encoded HMAC key material.
    pub secret: String,
    pub access_token_ttl_secs: i64,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            access_token_ttl_secs: 900,
        }
    }
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"<redacted>")
            .field("access_token_ttl_secs", &self.access_token_ttl_secs)
            .finish()
    }
}

#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedConfig {
    pub admin_password: Option<String>,
}

impl std::fmt::Debug for SeedConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SeedConfig")
            .field("admin_password", &self.admin_password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl AppConfig {
    /// Load from defaults, `pbac.toml` and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(DEFAULT_CONFIG_FILE)
    }

    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path: PathBuf = path.as_ref().to_path_buf();
        let config: AppConfig = Figment::new()
            .merge(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .map_err(Box::new)?;

        if config.jwt.secret.trim().is_empty() {
            return Err(ConfigError::MissingSecret);
        }
        Ok(config)
    }

    /// Build the token codec described by the `jwt` section.
    pub fn token_codec(&self) -> Result<TokenCodec, ConfigError> {
        Ok(TokenCodec::from_base64_secret(
            &self.jwt.secret,
            chrono::Duration::seconds(self.jwt.access_token_ttl_secs),
        )?)
    }
}
