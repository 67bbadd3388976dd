//! Configuration loading and representation.
//!
//! Everything comes from environment variables; optional JSON files hold the
//! identity seed and the operation policy.

use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

use tessera_auth::{OperationPolicy, PermissionAllowList};
use tessera_observability::{LogFormat, UnknownLogFormat};

use crate::identity::{IdentitySeed, SeedError};

pub const ENV_BIND_ADDR: &str = "TESSERA_BIND_ADDR";
pub const ENV_JWT_SECRET: &str = "JWT_SECRET";
pub const ENV_DATABASE_URL: &str = "DATABASE_URL";
pub const ENV_IDENTITY_SEED: &str = "TESSERA_IDENTITY_SEED";
pub const ENV_POLICY_FILE: &str = "TESSERA_POLICY_FILE";
pub const ENV_ALLOW_LIST: &str = "TESSERA_PERMISSION_ALLOW_LIST";
pub const ENV_LOG_FORMAT: &str = "TESSERA_LOG_FORMAT";

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEV_JWT_SECRET: &str = "dev-secret";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid bind address '{0}': {1}")]
    BindAddr(String, std::net::AddrParseError),

    #[error("TESSERA_PERMISSION_ALLOW_LIST is set but contains no tokens")]
    EmptyAllowList,

    #[error(transparent)]
    LogFormat(#[from] UnknownLogFormat),

    #[error("failed to read policy file {}: {1}", .0.display())]
    PolicyIo(PathBuf, std::io::Error),

    #[error("invalid policy file {}: {1}", .0.display())]
    PolicyJson(PathBuf, serde_json::Error),

    #[error(transparent)]
    Seed(#[from] SeedError),
}

/// Process configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub jwt_secret: String,
    /// Postgres connection string; `None` selects the in-memory identity store.
    pub database_url: Option<String>,
    pub identity_seed: Option<PathBuf>,
    pub policy_file: Option<PathBuf>,
    pub allow_list: PermissionAllowList,
    pub log_format: LogFormat,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source (tests pass a map).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bind_raw = var(ENV_BIND_ADDR).unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_raw
            .parse()
            .map_err(|e| ConfigError::BindAddr(bind_raw.clone(), e))?;

        let jwt_secret = var(ENV_JWT_SECRET).unwrap_or_else(|| DEV_JWT_SECRET.to_string());

        let allow_list = match var(ENV_ALLOW_LIST) {
            Some(raw) => parse_allow_list(&raw)?,
            None => PermissionAllowList::default(),
        };

        let log_format = match var(ENV_LOG_FORMAT) {
            Some(raw) => raw.parse()?,
            None => LogFormat::default(),
        };

        Ok(Self {
            bind_addr,
            jwt_secret,
            database_url: var(ENV_DATABASE_URL),
            identity_seed: var(ENV_IDENTITY_SEED).map(PathBuf::from),
            policy_file: var(ENV_POLICY_FILE).map(PathBuf::from),
            allow_list,
            log_format,
        })
    }

    /// Whether `JWT_SECRET` was left unset and the insecure dev default is in use.
    pub fn uses_dev_jwt_secret(&self) -> bool {
        self.jwt_secret == DEV_JWT_SECRET
    }

    /// Operation policy from the configured file, if any.
    pub fn load_policy(&self) -> Result<Option<OperationPolicy>, ConfigError> {
        let Some(path) = &self.policy_file else {
            return Ok(None);
        };
        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::PolicyIo(path.clone(), e))?;
        let policy =
            OperationPolicy::from_json(&raw).map_err(|e| ConfigError::PolicyJson(path.clone(), e))?;
        Ok(Some(policy))
    }

    /// Identity seed from the configured file, if any.
    pub fn load_seed(&self) -> Result<Option<IdentitySeed>, ConfigError> {
        self.identity_seed
            .as_ref()
            .map(IdentitySeed::from_path)
            .transpose()
            .map_err(ConfigError::from)
    }
}

/// Split an allow-list override on spaces and commas.
fn parse_allow_list(raw: &str) -> Result<PermissionAllowList, ConfigError> {
    let tokens: Vec<&str> = raw
        .split([' ', ','])
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect();
    if tokens.is_empty() {
        return Err(ConfigError::EmptyAllowList);
    }
    Ok(PermissionAllowList::new(tokens))
}
