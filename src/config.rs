use serde::Deserialize;
use std::str::FromStr;
use std::time::Duration;

/// Model code of the product pinned to the top of the catalog.
pub const DEFAULT_FLAGSHIP_MODEL: &str = "TBP-2025-I7";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub port: u16,
    pub database: DatabaseConfig,
    pub flagship_model: String,
    pub rate_limit: RateLimitConfig,
    pub request_body_limit_bytes: usize,
}

/// Connection settings for the relational store.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Full connection URL; when set it replaces host/port/credentials.
    pub url: Option<String>,
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
    /// Require TLS for the connection.
    pub tls_enabled: bool,
    /// Verify the server certificate and host name (only with TLS).
    pub tls_verify: bool,
    /// Longest wait for a pooled connection, which includes opening one.
    pub acquire_timeout: Duration,
    /// Upper bound of a health probe, independent of `acquire_timeout`.
    pub health_timeout: Duration,
    pub statement_timeout: Duration,
    pub pool_size: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    /// Sustained requests per second allowed for one client address.
    pub per_second: u64,
    pub burst_size: u32,
}

impl RateLimitConfig {
    /// Time to replenish one request slot, in milliseconds (at least 1).
    pub fn replenish_interval_ms(&self) -> u64 {
        (1000 / self.per_second.max(1)).max(1)
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            host: "localhost".to_string(),
            port: 5432,
            user: "postgres".to_string(),
            password: "postgres".to_string(),
            database: "techbook_store".to_string(),
            tls_enabled: false,
            tls_verify: false,
            acquire_timeout: Duration::from_millis(60_000),
            health_timeout: Duration::from_millis(3_000),
            statement_timeout: Duration::from_millis(60_000),
            pool_size: 10,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 3000,
            database: DatabaseConfig::default(),
            flagship_model: DEFAULT_FLAGSHIP_MODEL.to_string(),
            rate_limit: RateLimitConfig {
                per_second: 10,
                burst_size: 20,
            },
            request_body_limit_bytes: 1024 * 1024,
        }
    }
}

impl Config {
    /// Loads configuration from the process environment (and `.env`, if present).
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    ///
    /// Every variable is optional; unset or blank values fall back to the
    /// local development defaults.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Config::default();
        let db = defaults.database;

        let database = DatabaseConfig {
            url: get("DATABASE_URL")
                .map(|url| {
                    if !url.starts_with("postgresql://") && !url.starts_with("postgres://") {
                        anyhow::bail!("DATABASE_URL must start with postgresql:// or postgres://");
                    }
                    Ok(url)
                })
                .transpose()?,
            host: get("DB_HOST").unwrap_or(db.host),
            port: parse_or("DB_PORT", get("DB_PORT"), db.port)?,
            user: get("DB_USER").unwrap_or(db.user),
            password: get("DB_PASSWORD").unwrap_or(db.password),
            database: get("DB_DATABASE").unwrap_or(db.database),
            tls_enabled: parse_flag("DB_TLS_ENABLED", get("DB_TLS_ENABLED"), db.tls_enabled)?,
            tls_verify: parse_flag("DB_TLS_VERIFY", get("DB_TLS_VERIFY"), db.tls_verify)?,
            // sqlx opens connections inside acquire, so one bound covers both;
            // DB_CONNECT_TIMEOUT_MS applies when DB_ACQUIRE_TIMEOUT_MS is unset.
            acquire_timeout: match get("DB_ACQUIRE_TIMEOUT_MS") {
                Some(raw) => parse_millis("DB_ACQUIRE_TIMEOUT_MS", Some(raw), db.acquire_timeout)?,
                None => parse_millis(
                    "DB_CONNECT_TIMEOUT_MS",
                    get("DB_CONNECT_TIMEOUT_MS"),
                    db.acquire_timeout,
                )?,
            },
            health_timeout: parse_millis(
                "DB_HEALTH_TIMEOUT_MS",
                get("DB_HEALTH_TIMEOUT_MS"),
                db.health_timeout,
            )?,
            statement_timeout: parse_millis(
                "DB_STATEMENT_TIMEOUT_MS",
                get("DB_STATEMENT_TIMEOUT_MS"),
                db.statement_timeout,
            )?,
            pool_size: parse_or("DB_POOL_SIZE", get("DB_POOL_SIZE"), db.pool_size)?,
        };

        if database.pool_size == 0 {
            anyhow::bail!("DB_POOL_SIZE must be at least 1");
        }
        if database.health_timeout.is_zero() {
            anyhow::bail!("DB_HEALTH_TIMEOUT_MS must be positive");
        }

        let config = Self {
            port: parse_or("PORT", get("PORT"), defaults.port)
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?,
            database,
            flagship_model: get("FLAGSHIP_MODEL").unwrap_or(defaults.flagship_model),
            rate_limit: RateLimitConfig {
                per_second: parse_or(
                    "RATE_LIMIT_PER_SECOND",
                    get("RATE_LIMIT_PER_SECOND"),
                    defaults.rate_limit.per_second,
                )?,
                burst_size: parse_or(
                    "RATE_LIMIT_BURST",
                    get("RATE_LIMIT_BURST"),
                    defaults.rate_limit.burst_size,
                )?,
            },
            request_body_limit_bytes: parse_or(
                "REQUEST_BODY_LIMIT_BYTES",
                get("REQUEST_BODY_LIMIT_BYTES"),
                defaults.request_body_limit_bytes,
            )?,
        };

        if config.rate_limit.per_second == 0 || config.rate_limit.burst_size == 0 {
            anyhow::bail!("RATE_LIMIT_PER_SECOND and RATE_LIMIT_BURST must be positive");
        }

        // Log successful configuration load (without sensitive values)
        tracing::debug!(
            "Database: {}:{}/{} (tls: {}, pool: {})",
            config.database.host,
            config.database.port,
            config.database.database,
            config.database.tls_enabled,
            config.database.pool_size
        );
        if config.database.url.is_some() {
            tracing::debug!("DATABASE_URL set, overriding host/port/credentials");
        }
        tracing::debug!("Flagship model: {}", config.flagship_model);
        tracing::debug!("Server Port: {}", config.port);

        Ok(config)
    }
}

fn parse_or<T: FromStr>(key: &str, value: Option<String>, default: T) -> anyhow::Result<T> {
    match value {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("{} has an invalid value: {}", key, raw)),
        None => Ok(default),
    }
}

fn parse_flag(key: &str, value: Option<String>, default: bool) -> anyhow::Result<bool> {
    match value.as_deref().map(|v| v.trim().to_ascii_lowercase()) {
        None => Ok(default),
        Some(v) => match v.as_str() {
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" => Ok(false),
            _ => anyhow::bail!("{} must be true or false, got {}", key, v),
        },
    }
}

fn parse_millis(key: &str, value: Option<String>, default: Duration) -> anyhow::Result<Duration> {
    parse_or(key, value, default.as_millis() as u64).map(Duration::from_millis)
}
