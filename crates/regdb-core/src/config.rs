//! Module: config
//! Responsibility: registry configuration loaded from TOML, with a default
//! for every field.
//! Does not own: wiring components together; the facade does that.

use crate::{
    accounting::LocalPersonalObjectAccounting,
    auth::{OverrideUser, PrincipalPolicy},
    model::CiString,
    retry::RetryPolicy,
};
use serde::{Deserialize, Serialize};
use std::{
    fs, io,
    path::{Path, PathBuf},
    time::Duration,
};
use thiserror::Error as ThisError;

///
/// ConfigError
///

#[derive(Debug, ThisError)]
pub enum ConfigError {
    #[error("cannot read config file '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

///
/// RegistryConfig
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct RegistryConfig {
    pub retry: RetryConfig,
    pub principals: PrincipalsConfig,
    pub accounting: AccountingConfig,
    pub source: SourceConfig,
}

impl RegistryConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;

        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.retry.attempts == 0 {
            return Err(ConfigError::Invalid(
                "retry.attempts must be at least 1".to_string(),
            ));
        }
        if self.source.name.trim().is_empty() {
            return Err(ConfigError::Invalid("source.name is empty".to_string()));
        }
        for user in &self.principals.override_users {
            let hash = &user.password_sha256;
            if hash.len() != 64 || !hash.chars().all(|c| c.is_ascii_hexdigit()) {
                return Err(ConfigError::Invalid(format!(
                    "override user '{}' has a malformed password_sha256",
                    user.name
                )));
            }
        }

        Ok(())
    }

    #[must_use]
    pub fn principal_policy(&self) -> PrincipalPolicy {
        PrincipalPolicy::new(
            self.principals
                .alloc_maintainers
                .iter()
                .map(|key| CiString::new(key.as_str())),
            self.principals
                .override_users
                .iter()
                .map(|user| OverrideUser {
                    name: user.name.clone(),
                    password_sha256: user.password_sha256.to_ascii_lowercase(),
                })
                .collect(),
        )
    }

    #[must_use]
    pub const fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.retry.attempts,
            Duration::from_millis(self.retry.interval_ms),
        )
    }

    /// The read-path accounting collaborator, when enabled.
    #[must_use]
    pub fn accounting(&self) -> Option<LocalPersonalObjectAccounting> {
        self.accounting.enabled.then(|| {
            LocalPersonalObjectAccounting::new(Duration::from_millis(
                self.accounting.lock_timeout_ms,
            ))
        })
    }
}

///
/// RetryConfig
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetryConfig {
    pub attempts: u32,
    pub interval_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            attempts: crate::DEFAULT_PERSIST_ATTEMPTS,
            interval_ms: 100,
        }
    }
}

///
/// PrincipalsConfig
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct PrincipalsConfig {
    pub alloc_maintainers: Vec<String>,
    pub override_users: Vec<OverrideUserConfig>,
}

///
/// OverrideUserConfig
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OverrideUserConfig {
    pub name: String,
    pub password_sha256: String,
}

///
/// AccountingConfig
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct AccountingConfig {
    pub enabled: bool,
    pub lock_timeout_ms: u64,
}

impl Default for AccountingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            lock_timeout_ms: 3_000,
        }
    }
}

///
/// SourceConfig
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct SourceConfig {
    pub name: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            name: "TEST".to_string(),
        }
    }
}
