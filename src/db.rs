//! Data store adapter: the bounded PostgreSQL pool and the primitives the
//! relational store is built on.

use sqlx::postgres::{PgArguments, PgConnectOptions, PgPoolOptions, PgRow, PgSslMode};
use sqlx::query::QueryAs;
use sqlx::{FromRow, PgPool, Postgres};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::config::DatabaseConfig;
use crate::errors::AppError;
use crate::models::CountRow;

/// SQLSTATE of `RAISE EXCEPTION` without an explicit code. Stored procedures
/// use it to reject business rule violations.
const RAISE_EXCEPTION: &str = "P0001";

/// A positional statement parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    BigInt(Option<i64>),
    Int(Option<i32>),
    Text(Option<String>),
}

impl SqlParam {
    fn bind_to<'q, O>(
        &self,
        query: QueryAs<'q, Postgres, O, PgArguments>,
    ) -> QueryAs<'q, Postgres, O, PgArguments> {
        match self {
            SqlParam::BigInt(v) => query.bind(*v),
            SqlParam::Int(v) => query.bind(*v),
            SqlParam::Text(v) => query.bind(v.clone()),
        }
    }
}

impl From<i64> for SqlParam {
    fn from(v: i64) -> Self {
        SqlParam::BigInt(Some(v))
    }
}

impl From<i32> for SqlParam {
    fn from(v: i32) -> Self {
        SqlParam::Int(Some(v))
    }
}

impl From<&str> for SqlParam {
    fn from(v: &str) -> Self {
        SqlParam::Text(Some(v.to_string()))
    }
}

impl From<Option<String>> for SqlParam {
    fn from(v: Option<String>) -> Self {
        SqlParam::Text(v)
    }
}

impl From<Option<i64>> for SqlParam {
    fn from(v: Option<i64>) -> Self {
        SqlParam::BigInt(v)
    }
}

impl fmt::Display for SqlParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlParam::BigInt(Some(v)) => write!(f, "{}", v),
            SqlParam::Int(Some(v)) => write!(f, "{}", v),
            SqlParam::Text(Some(v)) => write!(f, "{:?}", v),
            SqlParam::BigInt(None) | SqlParam::Int(None) | SqlParam::Text(None) => {
                f.write_str("NULL")
            }
        }
    }
}

/// Renders parameters for logs and error annotations.
pub fn render_params(params: &[SqlParam]) -> String {
    let rendered: Vec<String> = params.iter().map(|p| p.to_string()).collect();
    format!("[{}]", rendered.join(", "))
}

pub struct Database {
    pub pool: PgPool,
    health_timeout: Duration,
}

impl Database {
    /// Builds the pool without opening a connection, so the process can boot
    /// while the database is unreachable.
    pub fn connect_lazy(config: &DatabaseConfig) -> anyhow::Result<Self> {
        let options = connect_options(config)?;

        let pool = PgPoolOptions::new()
            .max_connections(config.pool_size)
            .acquire_timeout(config.acquire_timeout)
            .idle_timeout(Duration::from_secs(60))
            .connect_lazy_with(options);

        Ok(Self {
            pool,
            health_timeout: config.health_timeout,
        })
    }

    /// Runs a parameterized statement and decodes every returned row.
    ///
    /// The connection is acquired for this call only and goes back to the
    /// pool when it drops, on success and failure alike.
    pub async fn fetch_all<T>(&self, sql: &str, params: &[SqlParam]) -> Result<Vec<T>, AppError>
    where
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| data_access_failure(sql, params, e))?;

        let query = params
            .iter()
            .fold(sqlx::query_as::<Postgres, T>(sql), |query, param| {
                param.bind_to(query)
            });

        query
            .fetch_all(&mut *conn)
            .await
            .map_err(|e| data_access_failure(sql, params, e))
    }

    /// Invokes a stored function returning a row set: `SELECT * FROM name($1, ...)`.
    pub async fn call_procedure<T>(
        &self,
        name: &str,
        params: &[SqlParam],
    ) -> Result<Vec<T>, AppError>
    where
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        if !is_identifier(name) {
            return Err(AppError::InternalError(format!(
                "Invalid procedure name: {}",
                name
            )));
        }

        let sql = procedure_statement(name, params.len());
        tracing::debug!("Calling procedure {} with {}", name, render_params(params));
        self.fetch_all(&sql, params).await
    }

    /// Round-trips `SELECT 1`. Never fails: any error reads as unhealthy.
    ///
    /// Bounded by the health timeout rather than the acquire timeout, since
    /// sqlx keeps retrying a refused connect until acquisition gives up.
    pub async fn check_health(&self) -> bool {
        let probe = sqlx::query("SELECT 1").execute(&self.pool);

        match tokio::time::timeout(self.health_timeout, probe).await {
            Ok(Ok(_)) => true,
            Ok(Err(e)) => {
                tracing::warn!("Database health check failed: {}", e);
                false
            }
            Err(_) => {
                tracing::warn!(
                    "Database health check timed out after {:?}",
                    self.health_timeout
                );
                false
            }
        }
    }

    /// Checks that the catalog tables exist in the current schema.
    pub async fn verify_schema(&self) -> bool {
        let rows: Result<Vec<CountRow>, AppError> = self
            .fetch_all(
                "SELECT COUNT(*) AS total FROM information_schema.tables \
                 WHERE table_schema = current_schema() AND table_name IN ('produtos', 'contatos')",
                &[],
            )
            .await;

        match rows {
            Ok(rows) if rows.first().map(|r| r.total) == Some(2) => {
                tracing::info!("Database schema verified");
                true
            }
            Ok(_) => {
                tracing::warn!("Tables produtos/contatos not found. Apply sql/schema.sql first");
                false
            }
            Err(e) => {
                tracing::warn!("Could not verify database schema: {}", e);
                false
            }
        }
    }

    /// Closes the pool, waiting for checked-out connections to return.
    /// Safe to call more than once.
    pub async fn close(&self) {
        if self.pool.is_closed() {
            tracing::debug!("Connection pool already closed");
            return;
        }
        self.pool.close().await;
        tracing::info!("Connection pool closed");
    }
}

fn connect_options(config: &DatabaseConfig) -> anyhow::Result<PgConnectOptions> {
    let options = match &config.url {
        Some(url) => PgConnectOptions::from_str(url)
            .map_err(|e| anyhow::anyhow!("Invalid DATABASE_URL: {}", e))?,
        None => PgConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.user)
            .password(&config.password)
            .database(&config.database),
    };

    // A URL may carry its own sslmode; only the explicit flag overrides it.
    let options = if config.url.is_none() || config.tls_enabled {
        options.ssl_mode(ssl_mode(config))
    } else {
        options
    };

    Ok(options
        .application_name("techbook-api")
        .options([(
            "statement_timeout",
            format!("{}ms", config.statement_timeout.as_millis()),
        )]))
}

fn ssl_mode(config: &DatabaseConfig) -> PgSslMode {
    match (config.tls_enabled, config.tls_verify) {
        (true, true) => PgSslMode::VerifyFull,
        (true, false) => PgSslMode::Require,
        (false, _) => PgSslMode::Disable,
    }
}

fn data_access_failure(sql: &str, params: &[SqlParam], err: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.code().as_deref() == Some(RAISE_EXCEPTION) {
            return AppError::BadRequest(db_err.message().to_string());
        }
    }
    AppError::database(sql, render_params(params), err)
}

fn procedure_statement(name: &str, arity: usize) -> String {
    let placeholders: Vec<String> = (1..=arity).map(|i| format!("${}", i)).collect();
    format!("SELECT * FROM {}({})", name, placeholders.join(", "))
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn procedure_statement_numbers_placeholders() {
        assert_eq!(
            procedure_statement("registrar_contato", 3),
            "SELECT * FROM registrar_contato($1, $2, $3)"
        );
        assert_eq!(procedure_statement("ping", 0), "SELECT * FROM ping()");
    }

    #[test]
    fn procedure_names_must_be_identifiers() {
        assert!(is_identifier("atualizar_estoque"));
        assert!(is_identifier("_internal2"));
        assert!(!is_identifier("x; DROP TABLE produtos"));
        assert!(!is_identifier("1abc"));
        assert!(!is_identifier(""));
    }

    #[test]
    fn params_render_for_diagnostics() {
        let params = vec![
            SqlParam::from(7i64),
            SqlParam::from("remover"),
            SqlParam::Text(None),
        ];
        assert_eq!(render_params(&params), r#"[7, "remover", NULL]"#);
    }

    #[test]
    fn tls_mode_follows_explicit_flags() {
        let mut config = DatabaseConfig::default();
        assert!(matches!(ssl_mode(&config), PgSslMode::Disable));
        config.tls_enabled = true;
        assert!(matches!(ssl_mode(&config), PgSslMode::Require));
        config.tls_verify = true;
        assert!(matches!(ssl_mode(&config), PgSslMode::VerifyFull));
    }

    #[tokio::test]
    async fn unreachable_database_reports_unhealthy() {
        let config = DatabaseConfig {
            host: "127.0.0.1".to_string(),
            port: 1,
            health_timeout: Duration::from_millis(500),
            ..DatabaseConfig::default()
        };
        let db = Database::connect_lazy(&config).unwrap();

        assert!(!db.check_health().await);
        db.close().await;
        db.close().await;
    }

    #[tokio::test]
    async fn health_check_does_not_wait_for_the_acquire_timeout() {
        let config = DatabaseConfig {
            host: "127.0.0.1".to_string(),
            port: 1,
            acquire_timeout: Duration::from_secs(30),
            health_timeout: Duration::from_millis(500),
            ..DatabaseConfig::default()
        };
        let db = Database::connect_lazy(&config).unwrap();

        let started = std::time::Instant::now();
        assert!(!db.check_health().await);
        assert!(
            started.elapsed() < Duration::from_secs(5),
            "health check took {:?}",
            started.elapsed()
        );
    }
}
