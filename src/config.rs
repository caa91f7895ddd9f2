//! Configuration loading from environment variables and command-line flags.

use crate::limiter::Strategy;
use crate::telemetry::LogFormat;

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

/// Which `FilmStore` backend serves requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Memory,
    Postgres,
}

impl FromStr for StoreKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "memory" => Ok(StoreKind::Memory),
            "postgres" | "postgresql" => Ok(StoreKind::Postgres),
            other => Err(format!("unknown store '{}'", other)),
        }
    }
}

/// Film service configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP listen address
    pub bind_addr: SocketAddr,
    /// Store backend
    pub store: StoreKind,
    /// PostgreSQL connection URL, required for the postgres store
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    /// Deadline applied to every database statement
    pub db_timeout: Duration,
    /// Create the `films` table at startup if it is missing
    pub db_init_schema: bool,
    /// Seed the in-memory store with demo films
    pub seed: bool,
    pub rate_limit_max: u32,
    pub rate_limit_window: Duration,
    pub rate_limit_strategy: Strategy,
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            store: StoreKind::Memory,
            database_url: None,
            db_max_connections: 10,
            db_timeout: Duration::from_millis(5000),
            db_init_schema: true,
            seed: true,
            rate_limit_max: 4,
            rate_limit_window: Duration::from_secs(20),
            rate_limit_strategy: Strategy::Sliding,
            log_format: LogFormat::Text,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Optional (with defaults):
    /// - `FILMS_BIND`: listen address (default: 0.0.0.0:3000)
    /// - `FILMS_STORE`: `memory` or `postgres` (default: memory)
    /// - `FILMS_DATABASE_URL`: PostgreSQL URL, required when the store is postgres
    /// - `FILMS_DB_MAX_CONNECTIONS`: pool size (default: 10)
    /// - `FILMS_DB_TIMEOUT_MS`: per-statement deadline (default: 5000)
    /// - `FILMS_DB_INIT_SCHEMA`: create the table at startup (default: true)
    /// - `FILMS_SEED`: seed the in-memory store (default: true)
    /// - `FILMS_RATE_LIMIT_MAX`: requests per window (default: 4)
    /// - `FILMS_RATE_LIMIT_WINDOW_SECS`: window length (default: 20)
    /// - `FILMS_RATE_LIMIT_STRATEGY`: `sliding` or `fixed` (default: sliding)
    /// - `FILMS_LOG_FORMAT`: `text` or `json` (default: text)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env`, reading variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(v) = lookup("FILMS_BIND") {
            config.bind_addr = parse_var("FILMS_BIND", &v)?;
        }
        if let Some(v) = lookup("FILMS_STORE") {
            config.store = parse_var("FILMS_STORE", &v)?;
        }
        config.database_url = lookup("FILMS_DATABASE_URL").filter(|url| !url.is_empty());
        if let Some(v) = lookup("FILMS_DB_MAX_CONNECTIONS") {
            config.db_max_connections = parse_var("FILMS_DB_MAX_CONNECTIONS", &v)?;
            if config.db_max_connections == 0 {
                return Err(ConfigError::Invalid(
                    "FILMS_DB_MAX_CONNECTIONS",
                    "must be at least 1".to_string(),
                ));
            }
        }
        if let Some(v) = lookup("FILMS_DB_TIMEOUT_MS") {
            let ms: u64 = parse_var("FILMS_DB_TIMEOUT_MS", &v)?;
            if ms == 0 {
                return Err(ConfigError::Invalid(
                    "FILMS_DB_TIMEOUT_MS",
                    "must be a positive number of milliseconds".to_string(),
                ));
            }
            config.db_timeout = Duration::from_millis(ms);
        }
        if let Some(v) = lookup("FILMS_DB_INIT_SCHEMA") {
            config.db_init_schema = parse_bool("FILMS_DB_INIT_SCHEMA", &v)?;
        }
        if let Some(v) = lookup("FILMS_SEED") {
            config.seed = parse_bool("FILMS_SEED", &v)?;
        }
        if let Some(v) = lookup("FILMS_RATE_LIMIT_MAX") {
            config.rate_limit_max = parse_var("FILMS_RATE_LIMIT_MAX", &v)?;
        }
        if let Some(v) = lookup("FILMS_RATE_LIMIT_WINDOW_SECS") {
            let secs: u64 = parse_var("FILMS_RATE_LIMIT_WINDOW_SECS", &v)?;
            if secs == 0 {
                return Err(ConfigError::Invalid(
                    "FILMS_RATE_LIMIT_WINDOW_SECS",
                    "must be a positive number of seconds".to_string(),
                ));
            }
            config.rate_limit_window = Duration::from_secs(secs);
        }
        if let Some(v) = lookup("FILMS_RATE_LIMIT_STRATEGY") {
            config.rate_limit_strategy = parse_var("FILMS_RATE_LIMIT_STRATEGY", &v)?;
        }
        if let Some(v) = lookup("FILMS_LOG_FORMAT") {
            config.log_format = parse_var("FILMS_LOG_FORMAT", &v)?;
        }

        Ok(config)
    }

    /// Applies command-line overrides (`args` excludes the program name).
    ///
    /// Supported: `--bind <addr:port>`, `--store <memory|postgres>`,
    /// `--database-url <url>`, `--log-format <text|json>`.
    pub fn apply_args(&mut self, args: &[String]) -> Result<(), ConfigError> {
        let mut i = 0;
        while i < args.len() {
            let flag = args[i].as_str();
            let value = match flag {
                "--bind" | "--store" | "--database-url" | "--log-format" => args
                    .get(i + 1)
                    .ok_or_else(|| ConfigError::MissingValue(flag.to_string()))?,
                other => return Err(ConfigError::UnknownFlag(other.to_string())),
            };
            match flag {
                "--bind" => self.bind_addr = parse_var("--bind", value)?,
                "--store" => self.store = parse_var("--store", value)?,
                "--database-url" => self.database_url = Some(value.clone()),
                _ => self.log_format = parse_var("--log-format", value)?,
            }
            i += 2;
        }
        Ok(())
    }

    /// Checks settings that depend on each other.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.store == StoreKind::Postgres && self.database_url.is_none() {
            return Err(ConfigError::Missing("FILMS_DATABASE_URL"));
        }
        Ok(())
    }
}

fn parse_var<T>(name: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e: T::Err| ConfigError::Invalid(name, e.to_string()))
}

fn parse_bool(name: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid(name, "must be true or false".to_string())),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required setting is missing.
    #[error("missing required setting: {0}")]
    Missing(&'static str),

    /// A setting has an invalid value.
    #[error("invalid value for {0}: {1}")]
    Invalid(&'static str, String),

    #[error("flag {0} expects a value")]
    MissingValue(String),

    #[error("unknown flag: {0}")]
    UnknownFlag(String),
}
