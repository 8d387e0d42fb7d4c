//! Server configuration parsed from environment variables.

use std::path::PathBuf;

use crate::store::postgres::DEFAULT_COLLECTION;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 5;
pub const DEFAULT_UPLOAD_LIMIT_BYTES: usize = 200 * 1024 * 1024;
pub const DEFAULT_STATIC_DIR: &str = "public";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid {var}: {value:?}")]
    Invalid { var: &'static str, value: String },
    #[error("{0} required")]
    Missing(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres { database_url: String, max_connections: u32 },
    Memory,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub port: u16,
    pub backend: StoreBackend,
    pub collection: String,
    pub upload_limit: usize,
    pub static_dir: PathBuf,
}

impl ServerConfig {
    /// Build typed server config from the process environment.
    ///
    /// Optional:
    /// - `PORT`: default 8080
    /// - `STORE_BACKEND`: `postgres` (default) or `memory`
    /// - `DATABASE_URL`: required when the backend is `postgres`
    /// - `DB_MAX_CONNECTIONS`: default 5
    /// - `MESSAGE_COLLECTION`: default `messages`
    /// - `UPLOAD_LIMIT_BYTES`: default 200 MiB
    /// - `STATIC_DIR`: default `public`
    ///
    /// # Errors
    ///
    /// Returns an error if a value fails to parse or `DATABASE_URL` is
    /// missing for the postgres backend.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ServerConfig::from_env`], reading values through `lookup`.
    ///
    /// # Errors
    ///
    /// See [`ServerConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = parse_or(&lookup, "PORT", DEFAULT_PORT)?;
        let upload_limit = parse_or(&lookup, "UPLOAD_LIMIT_BYTES", DEFAULT_UPLOAD_LIMIT_BYTES)?;

        let backend = match lookup("STORE_BACKEND").as_deref().map(str::trim) {
            None | Some("" | "postgres") => {
                let database_url = lookup("DATABASE_URL")
                    .filter(|v| !v.trim().is_empty())
                    .ok_or(ConfigError::Missing("DATABASE_URL"))?;
                // Pool size is a tuning knob; a bad value falls back quietly.
                let max_connections = lookup("DB_MAX_CONNECTIONS")
                    .and_then(|v| v.parse::<u32>().ok())
                    .unwrap_or(DEFAULT_DB_MAX_CONNECTIONS);
                StoreBackend::Postgres { database_url, max_connections }
            }
            Some("memory") => StoreBackend::Memory,
            Some(other) => {
                return Err(ConfigError::Invalid { var: "STORE_BACKEND", value: other.to_owned() });
            }
        };

        let collection = lookup("MESSAGE_COLLECTION")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_COLLECTION.to_owned());
        let static_dir = lookup("STATIC_DIR").map_or_else(|| PathBuf::from(DEFAULT_STATIC_DIR), PathBuf::from);

        Ok(Self { port, backend, collection, upload_limit, static_dir })
    }
}

fn parse_or<T, F>(lookup: &F, var: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        None => Ok(default),
        Some(raw) => match raw.trim().parse::<T>() {
            Ok(value) => Ok(value),
            Err(_) => Err(ConfigError::Invalid { var, value: raw }),
        },
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
