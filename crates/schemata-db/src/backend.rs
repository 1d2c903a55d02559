//! PostgreSQL implementation of the `SchemaBackend` trait.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{ConnectOptions, Connection, PgConnection, PgPool};
use tracing::debug;
use url::Url;

use schemata_core::{BackendError, SchemaBackend, SchemaName, ScopedTarget, domain::SCHEMA_PREFIX};

/// SQLSTATE raised when two sessions race on `CREATE SCHEMA IF NOT EXISTS`.
const UNIQUE_VIOLATION: &str = "23505";

/// Pool settings for the long-lived, schema-scoped handle.
#[derive(Debug, Clone)]
pub struct PoolSettings {
    /// Upper bound on connections per worker.
    pub max_connections: u32,
    /// How long a query waits for a free connection.
    pub acquire_timeout: Duration,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_connections: 5,
            acquire_timeout: Duration::from_secs(30),
        }
    }
}

/// Handle bound to one worker schema.
///
/// Every connection in the pool runs with `search_path` set to the schema,
/// so unqualified table names resolve inside it.
#[derive(Debug, Clone)]
pub struct ScopedPool {
    pool: PgPool,
    schema: SchemaName,
}

impl ScopedPool {
    /// The underlying pool; use it as an executor.
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// The schema every connection is confined to.
    pub const fn schema(&self) -> &SchemaName {
        &self.schema
    }
}

impl AsRef<PgPool> for ScopedPool {
    fn as_ref(&self) -> &PgPool {
        &self.pool
    }
}

/// `sqlx`-backed schema administration.
#[derive(Debug, Clone, Default)]
pub struct PgSchemaBackend {
    settings: PoolSettings,
}

impl PgSchemaBackend {
    /// Create a backend with custom pool settings.
    pub const fn new(settings: PoolSettings) -> Self {
        Self { settings }
    }

    async fn admin_connection(base: &Url) -> Result<PgConnection, BackendError> {
        PgConnection::connect_with(&admin_options(base)?)
            .await
            .map_err(|e| BackendError::Connection(e.to_string()))
    }

    /// Run one statement on a transient connection, then close it.
    async fn execute_transient(base: &Url, sql: &str) -> Result<(), BackendError> {
        let mut conn = Self::admin_connection(base).await?;
        debug!("{}", sql);
        let result = sqlx::query(sql).execute(&mut conn).await;
        close_quietly(conn).await;
        result.map(|_| ()).map_err(statement_error)
    }
}

#[async_trait]
impl SchemaBackend for PgSchemaBackend {
    type Handle = ScopedPool;

    async fn create_schema(&self, target: &ScopedTarget) -> Result<(), BackendError> {
        let sql = create_schema_sql(target.schema());
        let mut conn = Self::admin_connection(target.base()).await?;
        debug!("{}", sql);
        let result = sqlx::query(&sql).execute(&mut conn).await;
        close_quietly(conn).await;

        match result {
            Ok(_) => Ok(()),
            Err(e) if is_unique_violation(&e) => {
                debug!(schema = %target.schema(), "Schema created concurrently, treating as existing");
                Ok(())
            }
            Err(e) => Err(statement_error(e)),
        }
    }

    async fn connect(&self, target: &ScopedTarget) -> Result<ScopedPool, BackendError> {
        let options = scoped_options(target.base(), target.schema())?;
        let pool = PgPoolOptions::new()
            .max_connections(self.settings.max_connections)
            .acquire_timeout(self.settings.acquire_timeout)
            .connect_with(options)
            .await
            .map_err(|e| BackendError::Connection(e.to_string()))?;

        let current: Option<String> = sqlx::query_scalar("SELECT current_schema()::text")
            .fetch_one(&pool)
            .await
            .map_err(statement_error)?;

        if current.as_deref() != Some(target.schema().as_str()) {
            pool.close().await;
            return Err(BackendError::Connection(format!(
                "search_path did not select {} (current schema: {})",
                target.schema(),
                current.unwrap_or_else(|| "none".to_string())
            )));
        }

        Ok(ScopedPool {
            pool,
            schema: target.schema().clone(),
        })
    }

    async fn release(&self, handle: ScopedPool, target: &ScopedTarget) -> Result<(), BackendError> {
        let sql = drop_schema_sql(target.schema());
        debug!("{}", sql);
        let result = sqlx::query(&sql).execute(&handle.pool).await;
        handle.pool.close().await;
        result.map(|_| ()).map_err(statement_error)
    }

    async fn drop_schema(&self, target: &ScopedTarget) -> Result<(), BackendError> {
        Self::execute_transient(target.base(), &drop_schema_sql(target.schema())).await
    }

    async fn schema_exists(&self, target: &ScopedTarget) -> Result<bool, BackendError> {
        let mut conn = Self::admin_connection(target.base()).await?;
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM information_schema.schemata WHERE schema_name = $1)",
        )
        .bind(target.schema().as_str())
        .fetch_one(&mut conn)
        .await;
        close_quietly(conn).await;
        exists.map_err(statement_error)
    }

    async fn list_worker_schemas(&self, base: &Url) -> Result<Vec<SchemaName>, BackendError> {
        let mut conn = Self::admin_connection(base).await?;
        let names = sqlx::query_scalar::<_, String>(
            "SELECT nspname::text FROM pg_namespace WHERE starts_with(nspname::text, $1) ORDER BY nspname",
        )
        .bind(SCHEMA_PREFIX)
        .fetch_all(&mut conn)
        .await;
        close_quietly(conn).await;

        Ok(names
            .map_err(statement_error)?
            .iter()
            .filter_map(|name| SchemaName::parse(name).ok())
            .collect())
    }
}

/// Connect options for administrative statements (default `search_path`).
pub fn admin_options(base: &Url) -> Result<PgConnectOptions, BackendError> {
    PgConnectOptions::from_url(base).map_err(|e| BackendError::Connection(e.to_string()))
}

/// Connect options whose sessions start with `search_path = schema`.
pub fn scoped_options(base: &Url, schema: &SchemaName) -> Result<PgConnectOptions, BackendError> {
    Ok(admin_options(base)?.options([("search_path", schema.as_str())]))
}

fn create_schema_sql(schema: &SchemaName) -> String {
    format!("CREATE SCHEMA IF NOT EXISTS {}", schema.quoted())
}

fn drop_schema_sql(schema: &SchemaName) -> String {
    format!("DROP SCHEMA IF EXISTS {} CASCADE", schema.quoted())
}

fn statement_error(e: sqlx::Error) -> BackendError {
    match &e {
        sqlx::Error::Database(db) => BackendError::Statement(format!(
            "{} (SQLSTATE {})",
            db.message(),
            db.code().unwrap_or_default()
        )),
        _ => BackendError::Statement(e.to_string()),
    }
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    match e {
        sqlx::Error::Database(db) => db.code().as_deref() == Some(UNIQUE_VIOLATION),
        _ => false,
    }
}

async fn close_quietly(conn: PgConnection) {
    if let Err(e) = conn.close().await {
        debug!("Ignoring error while closing admin connection: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use schemata_core::WorkerId;

    fn schema(id: &str) -> SchemaName {
        SchemaName::for_worker(&WorkerId::new(id).unwrap())
    }

    #[test]
    fn test_statements_quote_the_schema() {
        assert_eq!(
            create_schema_sql(&schema("2")),
            "CREATE SCHEMA IF NOT EXISTS \"test_schema_2\""
        );
        assert_eq!(
            drop_schema_sql(&schema("2")),
            "DROP SCHEMA IF EXISTS \"test_schema_2\" CASCADE"
        );
    }

    #[test]
    fn test_only_database_errors_count_as_concurrent_create() {
        assert!(!is_unique_violation(&sqlx::Error::RowNotFound));
        assert!(!is_unique_violation(&sqlx::Error::Protocol(
            "duplicate key value violates unique constraint (SQLSTATE 23505)".to_string()
        )));
        assert!(!is_unique_violation(&sqlx::Error::PoolTimedOut));
    }

    #[test]
    fn test_scoped_options_keep_base_target() {
        let base = Url::parse("postgres://user:pw@db.internal:6543/yourdb_test").unwrap();
        let options = scoped_options(&base, &schema("1")).unwrap();

        assert_eq!(options.get_host(), "db.internal");
        assert_eq!(options.get_port(), 6543);
        assert_eq!(options.get_database(), Some("yourdb_test"));
    }

    #[test]
    fn test_default_pool_settings() {
        let settings = PoolSettings::default();
        assert!(settings.max_connections > 0);
        assert!(settings.acquire_timeout > Duration::ZERO);
    }
}
