//! Runtime configuration from environment variables.
//!
//! | Variable | Default |
//! |---|---|
//! | `DUET_BIND_ADDR` | `0.0.0.0:3000` |
//! | `JWT_SECRET` | unset (identify disabled) |
//! | `DUET_PING_INTERVAL_SECS` | `30` |
//! | `DUET_LOG_LEVEL` | `info` (`RUST_LOG` wins if set) |
//! | `DUET_LOG_FORMAT` | `text` (`text` or `json`) |

use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key}: invalid value {value:?}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub jwt_secret: Option<String>,
    pub ping_interval: Duration,
    pub log_level: String,
    pub log_format: LogFormat,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let bind_addr = match lookup("DUET_BIND_ADDR") {
            Some(value) => value.parse().map_err(|_| ConfigError::Invalid {
                key: "DUET_BIND_ADDR",
                value,
            })?,
            None => SocketAddr::from(([0, 0, 0, 0], 3000)),
        };

        let ping_interval = match lookup("DUET_PING_INTERVAL_SECS") {
            Some(value) => match value.parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    return Err(ConfigError::Invalid {
                        key: "DUET_PING_INTERVAL_SECS",
                        value,
                    });
                }
            },
            None => Duration::from_secs(30),
        };

        let log_level = lookup("DUET_LOG_LEVEL").unwrap_or_else(|| "info".to_string());
        if !matches!(log_level.as_str(), "trace" | "debug" | "info" | "warn" | "error") {
            return Err(ConfigError::Invalid {
                key: "DUET_LOG_LEVEL",
                value: log_level,
            });
        }

        let log_format = match lookup("DUET_LOG_FORMAT").as_deref() {
            None | Some("text") => LogFormat::Text,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    key: "DUET_LOG_FORMAT",
                    value: other.to_string(),
                });
            }
        };

        let jwt_secret = lookup("JWT_SECRET").filter(|secret| !secret.is_empty());

        Ok(Self {
            bind_addr,
            jwt_secret,
            ping_interval,
            log_level,
            log_format,
        })
    }
}
