use std::collections::HashMap;
use std::str::FromStr;

use crate::config::db::{ConnectionDescriptor, DbKind, PoolSettings};
use crate::error::AppError;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;

/// Settings read once from the environment at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database: ConnectionDescriptor,
    pub pool: PoolSettings,
}

impl AppConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary lookup (tests pass a map).
    pub fn from_vars<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let raw_url = non_empty("DATABASE_URL")
            .or_else(|| non_empty("NEON_DB_URL"))
            .ok_or_else(|| AppError::config("DATABASE_URL must be set"))?;
        let database = ConnectionDescriptor::parse(&raw_url)?;

        // In-memory SQLite has no TLS and loses every row on restart.
        let local = is_local_runtime(non_empty("RUNTIME_ENV"));
        if database.kind() == DbKind::SqliteMemory && !local {
            return Err(AppError::config(
                "sqlite::memory: requires RUNTIME_ENV=dev or RUNTIME_ENV=test",
            ));
        }

        let host = non_empty("APP_HOST")
            .unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = parse_var(&lookup, "PORT")?.unwrap_or(DEFAULT_PORT);

        let defaults = PoolSettings::default();
        let pool = PoolSettings {
            max_connections: parse_var(&lookup, "DB_POOL_MAX")?
                .unwrap_or(defaults.max_connections),
            min_connections: parse_var(&lookup, "DB_POOL_MIN")?
                .unwrap_or(defaults.min_connections),
            acquire_timeout_ms: parse_var(&lookup, "DB_ACQUIRE_TIMEOUT_MS")?
                .unwrap_or(defaults.acquire_timeout_ms),
            statement_timeout: non_empty("DB_STATEMENT_TIMEOUT")
                .unwrap_or(defaults.statement_timeout),
            app_name: defaults.app_name,
        };

        if pool.max_connections == 0 {
            return Err(AppError::config("DB_POOL_MAX must be at least 1"));
        }
        if pool.min_connections > pool.max_connections {
            return Err(AppError::config(format!(
                "DB_POOL_MIN ({}) exceeds DB_POOL_MAX ({})",
                pool.min_connections, pool.max_connections
            )));
        }
        if !is_valid_pg_interval(&pool.statement_timeout) {
            return Err(AppError::config(format!(
                "DB_STATEMENT_TIMEOUT '{}' is not a valid interval",
                pool.statement_timeout
            )));
        }

        Ok(Self {
            host,
            port,
            database,
            pool,
        })
    }

    /// Convenience for tests building config without an environment.
    pub fn from_map(vars: &HashMap<String, String>) -> Result<Self, AppError> {
        Self::from_vars(|key| vars.get(key).cloned())
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>, AppError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| AppError::config(format!("{key} has an invalid value '{raw}'"))),
    }
}

fn is_local_runtime(runtime_env: Option<String>) -> bool {
    runtime_env.is_some_and(|env| {
        let env = env.trim();
        env.eq_ignore_ascii_case("dev") || env.eq_ignore_ascii_case("test")
    })
}

/// Accepts values like `30s`, `500ms`, `0`, `2min`; these end up inside a
/// quoted `SET statement_timeout`, so quotes are never allowed.
fn is_valid_pg_interval(value: &str) -> bool {
    let digits = value.chars().take_while(char::is_ascii_digit).count();
    if digits == 0 {
        return false;
    }
    matches!(&value[digits..], "" | "ms" | "s" | "min" | "h")
}
