// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! This module defines environment variable names, default values and the
//! [`Config`] loaded from the environment at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind IP address (v4 or v6) | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `DATA_DIR` | Directory holding `ledger.redb` | `./data` |
//! | `DIGEST_SECRET` | Shared secret for `X-Digest` signatures | Required |
//! | `SEED_FILE` | JSON file with limits and wallets to provision | Optional |
//! | `MIN_DEPOSIT` | Smallest accepted top-up, in currency units | `1.00` |
//! | `REVALIDATE_LIMIT_IN_UNIT` | Re-check the limit inside the unit of work | `false` |
//! | `REQUEST_TIMEOUT_SECS` | Per-request timeout, at least 1 | `4` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use crate::ledger::DepositPolicy;
use crate::logging::LogFormat;

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";

/// Environment variable name for the data directory path.
///
/// The ledger database file `ledger.redb` is created inside it.
pub const DATA_DIR_ENV: &str = "DATA_DIR";

/// Shared secret used to verify `X-Digest`. Never logged.
pub const DIGEST_SECRET_ENV: &str = "DIGEST_SECRET";

pub const SEED_FILE_ENV: &str = "SEED_FILE";
pub const MIN_DEPOSIT_ENV: &str = "MIN_DEPOSIT";
pub const REVALIDATE_LIMIT_ENV: &str = "REVALIDATE_LIMIT_IN_UNIT";
pub const REQUEST_TIMEOUT_ENV: &str = "REQUEST_TIMEOUT_SECS";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_HOST: IpAddr = IpAddr::V4(Ipv4Addr::UNSPECIFIED);
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_DATA_DIR: &str = "./data";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(4);
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

/// Database file name inside the data directory.
pub const DATABASE_FILE: &str = "ledger.redb";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),

    #[error("{name} has invalid value {value:?}")]
    Invalid { name: &'static str, value: String },
}

/// Service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub data_dir: PathBuf,
    pub digest_secret: String,
    pub seed_file: Option<PathBuf>,
    pub deposit_policy: DepositPolicy,
    pub request_timeout: Duration,
    pub log_format: LogFormat,
}

impl Config {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(std::env::vars().collect())
    }

    /// Load configuration from an explicit variable map.
    pub fn from_vars(vars: HashMap<String, String>) -> Result<Self, ConfigError> {
        let get = |name: &'static str| lookup(&vars, name);

        let host: IpAddr = parse_or(get(HOST_ENV), HOST_ENV, DEFAULT_HOST)?;
        let port: u16 = parse_or(get(PORT_ENV), PORT_ENV, DEFAULT_PORT)?;
        let bind_addr = SocketAddr::new(host, port);

        let digest_secret = get(DIGEST_SECRET_ENV)
            .ok_or(ConfigError::Missing(DIGEST_SECRET_ENV))?
            .to_string();

        let min_amount: f64 = parse_or(
            get(MIN_DEPOSIT_ENV),
            MIN_DEPOSIT_ENV,
            DepositPolicy::default().min_amount,
        )?;
        if !min_amount.is_finite() || min_amount < 0.0 {
            return Err(ConfigError::Invalid {
                name: MIN_DEPOSIT_ENV,
                value: min_amount.to_string(),
            });
        }

        let revalidate_in_unit = match get(REVALIDATE_LIMIT_ENV) {
            None => false,
            Some(v) => parse_bool(v).ok_or_else(|| ConfigError::Invalid {
                name: REVALIDATE_LIMIT_ENV,
                value: v.to_string(),
            })?,
        };

        let timeout_secs: u64 = parse_or(
            get(REQUEST_TIMEOUT_ENV),
            REQUEST_TIMEOUT_ENV,
            DEFAULT_REQUEST_TIMEOUT.as_secs(),
        )?;
        if timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                name: REQUEST_TIMEOUT_ENV,
                value: timeout_secs.to_string(),
            });
        }

        let log_format: LogFormat =
            parse_or(get(LOG_FORMAT_ENV), LOG_FORMAT_ENV, LogFormat::default())?;

        Ok(Self {
            bind_addr,
            data_dir: PathBuf::from(get(DATA_DIR_ENV).unwrap_or(DEFAULT_DATA_DIR)),
            digest_secret,
            seed_file: get(SEED_FILE_ENV).map(PathBuf::from),
            deposit_policy: DepositPolicy {
                min_amount,
                revalidate_in_unit,
            },
            request_timeout: Duration::from_secs(timeout_secs),
            log_format,
        })
    }

    /// Path of the ledger database file.
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(DATABASE_FILE)
    }
}

/// Non-empty, trimmed value of a variable.
fn lookup<'a>(vars: &'a HashMap<String, String>, name: &str) -> Option<&'a str> {
    vars.get(name).map(|v| v.trim()).filter(|v| !v.is_empty())
}

fn parse_or<T: std::str::FromStr>(
    value: Option<&str>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match value {
        None => Ok(default),
        Some(v) => v.parse().map_err(|_| ConfigError::Invalid {
            name,
            value: v.to_string(),
        }),
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn defaults_apply() {
        let config = Config::from_vars(vars(&[(DIGEST_SECRET_ENV, "s3cret")])).unwrap();
        assert_eq!(config.bind_addr, "0.0.0.0:8080".parse().unwrap());
        assert_eq!(config.database_path(), PathBuf::from("./data/ledger.redb"));
        assert_eq!(config.deposit_policy, DepositPolicy::default());
        assert_eq!(config.request_timeout, Duration::from_secs(4));
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert!(config.seed_file.is_none());
    }

    #[test]
    fn digest_secret_is_required() {
        assert_eq!(
            Config::from_vars(vars(&[])).unwrap_err(),
            ConfigError::Missing(DIGEST_SECRET_ENV)
        );
    }

    #[test]
    fn overrides_are_parsed() {
        let config = Config::from_vars(vars(&[
            (DIGEST_SECRET_ENV, "s3cret"),
            (HOST_ENV, "127.0.0.1"),
            (PORT_ENV, "9000"),
            (MIN_DEPOSIT_ENV, "0.01"),
            (REVALIDATE_LIMIT_ENV, "true"),
            (REQUEST_TIMEOUT_ENV, "10"),
            (LOG_FORMAT_ENV, "JSON"),
            (SEED_FILE_ENV, "/etc/ledger/seed.json"),
        ]))
        .unwrap();

        assert_eq!(config.bind_addr, "127.0.0.1:9000".parse().unwrap());
        assert_eq!(config.deposit_policy.min_amount, 0.01);
        assert!(config.deposit_policy.revalidate_in_unit);
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.seed_file, Some(PathBuf::from("/etc/ledger/seed.json")));
    }

    #[test]
    fn invalid_values_are_reported() {
        let err = Config::from_vars(vars(&[(DIGEST_SECRET_ENV, "s"), (PORT_ENV, "http")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: PORT_ENV, .. }));

        let err = Config::from_vars(vars(&[
            (DIGEST_SECRET_ENV, "s"),
            (REVALIDATE_LIMIT_ENV, "maybe"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: REVALIDATE_LIMIT_ENV, .. }));

        let err = Config::from_vars(vars(&[(DIGEST_SECRET_ENV, "s"), (MIN_DEPOSIT_ENV, "-1")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: MIN_DEPOSIT_ENV, .. }));

        let err = Config::from_vars(vars(&[
            (DIGEST_SECRET_ENV, "s"),
            (REQUEST_TIMEOUT_ENV, "0"),
        ]))
        .unwrap_err();
        assert_eq!(
            err,
            ConfigError::Invalid {
                name: REQUEST_TIMEOUT_ENV,
                value: "0".to_string(),
            }
        );

        let err = Config::from_vars(vars(&[(DIGEST_SECRET_ENV, "s"), (HOST_ENV, "localhost")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: HOST_ENV, .. }));
    }

    #[test]
    fn unknown_log_format_is_rejected() {
        let err = Config::from_vars(vars(&[(DIGEST_SECRET_ENV, "s"), (LOG_FORMAT_ENV, "xml")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: LOG_FORMAT_ENV, .. }));
    }

    #[test]
    fn ipv6_host_is_accepted() {
        let config = Config::from_vars(vars(&[
            (DIGEST_SECRET_ENV, "s"),
            (HOST_ENV, "::"),
            (PORT_ENV, "9000"),
        ]))
        .unwrap();
        assert_eq!(config.bind_addr, "[::]:9000".parse().unwrap());
    }
}
