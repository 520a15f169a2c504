// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Configuration is read from the environment at startup. A `.env` file in
//! the working directory is loaded first (see `main.rs`), so local
//! development does not need exported variables.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `DATA_DIR` | Directory holding the redb database | `/data` |
//! | `VAULT_ADDR` | Vault server address | Required |
//! | `VAULT_TOKEN` | Vault token | Required |
//! | `VAULT_TRANSIT_MOUNT` | Transit engine mount | `transit` |
//! | `VAULT_KV_MOUNT` | KV v2 engine mount | `secret` |
//! | `KEYCLOAK_URL` | Keycloak base URL | Required |
//! | `KEYCLOAK_REALM` | Keycloak realm | Required |
//! | `AUTH_ISSUER` | Expected JWT issuer claim | Optional |
//! | `AUTH_AUDIENCE` | Expected JWT audience claim | Optional |
//! | `TLS_CERT_PATH` | PEM certificate chain (enables HTTPS with `TLS_KEY_PATH`) | Optional |
//! | `TLS_KEY_PATH` | PEM private key | Optional |
//! | `SEED_USER_SUBJECT` | Keycloak subject registered at startup | Optional |
//! | `ORPHAN_SWEEP_INTERVAL_SECS` | Interval of the orphaned secret sweep | `60` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::storage::paths::DATA_ROOT;
use crate::telemetry::LogFormat;

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";

/// Environment variable name for the data directory path.
///
/// # Default
/// `/data`
pub const DATA_DIR_ENV: &str = "DATA_DIR";

pub const VAULT_ADDR_ENV: &str = "VAULT_ADDR";
pub const VAULT_TOKEN_ENV: &str = "VAULT_TOKEN";
pub const VAULT_TRANSIT_MOUNT_ENV: &str = "VAULT_TRANSIT_MOUNT";
pub const VAULT_KV_MOUNT_ENV: &str = "VAULT_KV_MOUNT";

pub const KEYCLOAK_URL_ENV: &str = "KEYCLOAK_URL";
pub const KEYCLOAK_REALM_ENV: &str = "KEYCLOAK_REALM";
pub const AUTH_ISSUER_ENV: &str = "AUTH_ISSUER";
pub const AUTH_AUDIENCE_ENV: &str = "AUTH_AUDIENCE";

pub const TLS_CERT_PATH_ENV: &str = "TLS_CERT_PATH";
pub const TLS_KEY_PATH_ENV: &str = "TLS_KEY_PATH";

/// Keycloak subject registered as a user at startup.
///
/// User provisioning is otherwise out of band; this makes a fresh
/// deployment usable.
pub const SEED_USER_SUBJECT_ENV: &str = "SEED_USER_SUBJECT";

pub const ORPHAN_SWEEP_INTERVAL_ENV: &str = "ORPHAN_SWEEP_INTERVAL_SECS";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_ORPHAN_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

/// PEM files for HTTPS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsPaths {
    pub cert: PathBuf,
    pub key: PathBuf,
}

/// Fully resolved server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub data_dir: PathBuf,
    pub vault_addr: String,
    pub vault_token: String,
    pub vault_transit_mount: String,
    pub vault_kv_mount: String,
    pub keycloak_url: String,
    pub keycloak_realm: String,
    pub auth_issuer: Option<String>,
    pub auth_audience: Option<String>,
    /// `None` serves plain HTTP
    pub tls: Option<TlsPaths>,
    pub seed_user_subject: Option<String>,
    pub orphan_sweep_interval: Duration,
    pub log_format: LogFormat,
}

impl Config {
    /// Read the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read the configuration through `lookup`, which returns the value of a
    /// variable if set.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Empty values count as unset.
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let require = |name: &'static str| get(name).ok_or(ConfigError::Missing(name));

        let port = match get(PORT_ENV) {
            Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
                var: PORT_ENV,
                reason: format!("{raw:?} is not a port number"),
            })?,
            None => DEFAULT_PORT,
        };

        let vault_addr = require(VAULT_ADDR_ENV)?;
        check_url(VAULT_ADDR_ENV, &vault_addr)?;
        let keycloak_url = require(KEYCLOAK_URL_ENV)?;
        check_url(KEYCLOAK_URL_ENV, &keycloak_url)?;

        let tls = match (get(TLS_CERT_PATH_ENV), get(TLS_KEY_PATH_ENV)) {
            (Some(cert), Some(key)) => Some(TlsPaths {
                cert: cert.into(),
                key: key.into(),
            }),
            (None, None) => None,
            (Some(_), None) => return Err(ConfigError::Missing(TLS_KEY_PATH_ENV)),
            (None, Some(_)) => return Err(ConfigError::Missing(TLS_CERT_PATH_ENV)),
        };

        let orphan_sweep_interval = match get(ORPHAN_SWEEP_INTERVAL_ENV) {
            Some(raw) => match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    return Err(ConfigError::Invalid {
                        var: ORPHAN_SWEEP_INTERVAL_ENV,
                        reason: format!("{raw:?} is not a positive number of seconds"),
                    })
                }
            },
            None => DEFAULT_ORPHAN_SWEEP_INTERVAL,
        };

        let log_format = match get(LOG_FORMAT_ENV) {
            Some(raw) => raw.parse().map_err(|reason| ConfigError::Invalid {
                var: LOG_FORMAT_ENV,
                reason,
            })?,
            None => LogFormat::default(),
        };

        Ok(Self {
            host: get(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            data_dir: get(DATA_DIR_ENV).unwrap_or_else(|| DATA_ROOT.to_string()).into(),
            vault_addr,
            vault_token: require(VAULT_TOKEN_ENV)?,
            vault_transit_mount: get(VAULT_TRANSIT_MOUNT_ENV).unwrap_or_else(|| "transit".to_string()),
            vault_kv_mount: get(VAULT_KV_MOUNT_ENV).unwrap_or_else(|| "secret".to_string()),
            keycloak_url,
            keycloak_realm: require(KEYCLOAK_REALM_ENV)?,
            auth_issuer: get(AUTH_ISSUER_ENV),
            auth_audience: get(AUTH_AUDIENCE_ENV),
            tls,
            seed_user_subject: get(SEED_USER_SUBJECT_ENV),
            orphan_sweep_interval,
            log_format,
        })
    }

    /// `host:port` to bind.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn check_url(var: &'static str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value).map_err(|e| ConfigError::Invalid {
        var,
        reason: e.to_string(),
    })?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(ConfigError::Invalid {
            var,
            reason: format!("unsupported scheme {other:?}"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    const REQUIRED: &[(&str, &str)] = &[
        (VAULT_ADDR_ENV, "http://vault:8200"),
        (VAULT_TOKEN_ENV, "root"),
        (KEYCLOAK_URL_ENV, "http://keycloak:8080"),
        (KEYCLOAK_REALM_ENV, "cards"),
    ];

    /// Required variables plus `extra`, which wins on conflict.
    fn with(extra: &[(&'static str, &'static str)]) -> Vec<(&'static str, &'static str)> {
        REQUIRED.iter().chain(extra.iter()).copied().collect()
    }

    #[test]
    fn defaults_apply() {
        let config = Config::from_lookup(env(REQUIRED)).unwrap();
        assert_eq!(config.bind_address(), "0.0.0.0:8080");
        assert_eq!(config.data_dir, PathBuf::from("/data"));
        assert_eq!(config.vault_transit_mount, "transit");
        assert_eq!(config.vault_kv_mount, "secret");
        assert!(config.tls.is_none());
        assert!(config.auth_issuer.is_none());
        assert_eq!(config.orphan_sweep_interval, Duration::from_secs(60));
        assert_eq!(config.log_format, LogFormat::Pretty);
    }

    #[test]
    fn missing_required_variable() {
        let err = Config::from_lookup(env(&REQUIRED[1..])).unwrap_err();
        assert_eq!(err, ConfigError::Missing(VAULT_ADDR_ENV));
    }

    #[test]
    fn empty_value_counts_as_missing() {
        let err = Config::from_lookup(env(&with(&[(VAULT_TOKEN_ENV, "  ")]))).unwrap_err();
        assert_eq!(err, ConfigError::Missing(VAULT_TOKEN_ENV));
    }

    #[test]
    fn invalid_values_are_reported() {
        let err = Config::from_lookup(env(&with(&[(PORT_ENV, "http")]))).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: PORT_ENV, .. }));

        let err = Config::from_lookup(env(&with(&[(VAULT_ADDR_ENV, "vault:8200")]))).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: VAULT_ADDR_ENV, .. }));

        let err = Config::from_lookup(env(&with(&[(ORPHAN_SWEEP_INTERVAL_ENV, "0")]))).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: ORPHAN_SWEEP_INTERVAL_ENV, .. }));
    }

    #[test]
    fn tls_requires_both_paths() {
        let err = Config::from_lookup(env(&with(&[(TLS_CERT_PATH_ENV, "/tls/cert.pem")]))).unwrap_err();
        assert_eq!(err, ConfigError::Missing(TLS_KEY_PATH_ENV));

        let config = Config::from_lookup(env(&with(&[
            (TLS_CERT_PATH_ENV, "/tls/cert.pem"),
            (TLS_KEY_PATH_ENV, "/tls/key.pem"),
        ])))
        .unwrap();
        assert_eq!(
            config.tls,
            Some(TlsPaths {
                cert: "/tls/cert.pem".into(),
                key: "/tls/key.pem".into(),
            })
        );
    }

    #[test]
    fn optional_settings_are_read() {
        let config = Config::from_lookup(env(&with(&[
            (AUTH_ISSUER_ENV, "http://keycloak:8080/realms/cards"),
            (AUTH_AUDIENCE_ENV, "card-vault"),
            (SEED_USER_SUBJECT_ENV, "kc-ada"),
            (LOG_FORMAT_ENV, "json"),
            (DATA_DIR_ENV, "/var/lib/card-vault"),
        ])))
        .unwrap();

        assert_eq!(config.auth_audience.as_deref(), Some("card-vault"));
        assert_eq!(config.seed_user_subject.as_deref(), Some("kc-ada"));
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.data_dir, PathBuf::from("/var/lib/card-vault"));
    }
}
