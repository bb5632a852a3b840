use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};

use forma_api::TaskSchema;
use forma_db::DEFAULT_READER_POOL_SIZE;

/// Placeholder JWT secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &[
    "change-me-to-a-random-string",
    "dev-secret-change-me",
    "secret",
];

const DEFAULT_TOKEN_TTL_SECS: i64 = 3600;
const MAX_TOKEN_TTL_SECS: i64 = 365 * 24 * 3600;

/// Process configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub db_readers: usize,
    pub jwt_secret: String,
    pub token_ttl: chrono::Duration,
    pub task_schema: TaskSchema,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let jwt_secret = get("FORMA_JWT_SECRET").unwrap_or_default();
        if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            bail!("FORMA_JWT_SECRET is unset or still a placeholder");
        }

        let port: u16 = match get("FORMA_PORT") {
            Some(v) => v.parse().with_context(|| format!("invalid FORMA_PORT '{v}'"))?,
            None => 3000,
        };

        let db_readers: usize = match get("FORMA_DB_READERS") {
            Some(v) => v.parse().with_context(|| format!("invalid FORMA_DB_READERS '{v}'"))?,
            None => DEFAULT_READER_POOL_SIZE,
        };

        let ttl_secs: i64 = match get("FORMA_TOKEN_TTL_SECS") {
            Some(v) => v.parse().with_context(|| format!("invalid FORMA_TOKEN_TTL_SECS '{v}'"))?,
            None => DEFAULT_TOKEN_TTL_SECS,
        };
        if !(1..=MAX_TOKEN_TTL_SECS).contains(&ttl_secs) {
            bail!("FORMA_TOKEN_TTL_SECS must be between 1 and {MAX_TOKEN_TTL_SECS}");
        }

        let task_schema: TaskSchema = match get("FORMA_TASK_SCHEMA") {
            Some(v) => v.parse()?,
            None => TaskSchema::default(),
        };

        Ok(Self {
            host: get("FORMA_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port,
            db_path: get("FORMA_DB_PATH").unwrap_or_else(|| "forma.db".into()).into(),
            db_readers,
            jwt_secret,
            token_ttl: chrono::Duration::seconds(ttl_secs),
            task_schema,
        })
    }

    pub fn addr(&self) -> Result<SocketAddr> {
        let addr = format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", self.host, self.port))?;
        Ok(addr)
    }
}
