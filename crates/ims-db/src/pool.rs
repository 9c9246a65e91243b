//! # Database Pool Management
//!
//! Connection pool creation and configuration for SQLite.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Database Connection Pool                           │
//! │                                                                         │
//! │  Service startup                                                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DbConfig::from_env() / DbConfig::new(path)                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Database::new(config).await ← Create pool + run migrations            │
//! │       │                                                                 │
//! │       ├──► products() / sales() / returns()      stores                │
//! │       └──► reconciler() / sales_service()        transactional writes  │
//! │                                                                         │
//! │  Concurrent writers queue on the SQLite write lock; busy_timeout       │
//! │  bounds how long a writer waits before failing with Internal.          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## WAL Mode
//! Readers don't block the writer and the writer doesn't block readers.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::product::ProductRepository;
use crate::repository::returns::ReturnRepository;
use crate::repository::sale::SaleRepository;
use crate::service::reconciler::StockReconciler;
use crate::service::sales::SalesService;

/// Environment variable holding the database file path.
pub const ENV_DB_PATH: &str = "IMS_DB_PATH";

/// Environment variable overriding the pool size.
pub const ENV_DB_MAX_CONNECTIONS: &str = "IMS_DB_MAX_CONNECTIONS";

/// Database file used when `IMS_DB_PATH` is unset.
pub const DEFAULT_DB_PATH: &str = "./ims.db";

// =============================================================================
// Configuration
// =============================================================================

/// Database configuration.
///
/// ## Example
/// ```rust,ignore
/// let config = DbConfig::new("/var/lib/ims/ims.db")
///     .max_connections(8)
///     .busy_timeout(Duration::from_secs(10));
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Path to the SQLite database file.
    pub database_path: PathBuf,

    /// Maximum number of connections in the pool.
    /// Default: 5
    pub max_connections: u32,

    /// Minimum number of connections to keep alive.
    /// Default: 1
    pub min_connections: u32,

    /// Connection acquire timeout.
    /// Default: 30 seconds
    pub connect_timeout: Duration,

    /// Idle timeout before closing a connection.
    /// Default: 10 minutes
    pub idle_timeout: Duration,

    /// How long a writer waits for the write lock.
    /// Default: 5 seconds
    pub busy_timeout: Duration,

    /// Whether to run migrations on connect.
    /// Default: true
    pub run_migrations: bool,
}

impl DbConfig {
    /// Creates a configuration for the given file. The file is created if missing.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: path.into(),
            max_connections: 5,
            min_connections: 1,
            connect_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600),
            busy_timeout: Duration::from_secs(5),
            run_migrations: true,
        }
    }

    /// Reads `IMS_DB_PATH` and `IMS_DB_MAX_CONNECTIONS`.
    ///
    /// A missing path falls back to [`DEFAULT_DB_PATH`]; a pool size that is
    /// not a positive integer is rejected.
    pub fn from_env() -> DbResult<Self> {
        Self::from_vars(
            std::env::var(ENV_DB_PATH).ok(),
            std::env::var(ENV_DB_MAX_CONNECTIONS).ok(),
        )
    }

    fn from_vars(path: Option<String>, max_connections: Option<String>) -> DbResult<Self> {
        let path = path.unwrap_or_else(|| DEFAULT_DB_PATH.to_string());
        let mut config = DbConfig::new(path);

        if let Some(raw) = max_connections {
            config = config.max_connections(parse_pool_size(&raw)?);
        }

        Ok(config)
    }

    /// Sets the maximum number of connections.
    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self.min_connections = self.min_connections.min(max);
        self
    }

    /// Sets the minimum number of connections.
    pub fn min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    /// Sets the connection timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the write-lock wait.
    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    /// Sets whether to run migrations on connect.
    pub fn run_migrations(mut self, run: bool) -> Self {
        self.run_migrations = run;
        self
    }

    /// Creates an in-memory database configuration (for testing).
    pub fn in_memory() -> Self {
        DbConfig {
            database_path: PathBuf::from(":memory:"),
            max_connections: 1, // In-memory requires single connection
            min_connections: 1,
            connect_timeout: Duration::from_secs(5),
            idle_timeout: Duration::from_secs(60),
            busy_timeout: Duration::from_secs(5),
            run_migrations: true,
        }
    }
}

fn parse_pool_size(raw: &str) -> DbResult<u32> {
    raw.trim()
        .parse::<u32>()
        .ok()
        .filter(|n| *n > 0)
        .ok_or_else(|| {
            DbError::InvalidConfig(format!(
                "{} must be a positive integer, got '{}'",
                ENV_DB_MAX_CONNECTIONS, raw
            ))
        })
}

// =============================================================================
// Database
// =============================================================================

/// Main database handle providing store and service access.
///
/// Cheap to clone; every accessor hands out a handle over the same pool.
///
/// ```rust,ignore
/// let db = Database::new(DbConfig::from_env()?).await?;
/// let record = db.reconciler().reconcile(request).await?;
/// ```
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Creates the pool and, if enabled, applies migrations.
    ///
    /// SQLite is configured with WAL journaling, NORMAL synchronous,
    /// foreign keys on and the configured busy timeout.
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        info!(
            path = %config.database_path.display(),
            "Initializing database connection"
        );

        let connect_url = format!("sqlite://{}?mode=rwc", config.database_path.display());

        let connect_options = SqliteConnectOptions::from_str(&connect_url)
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            // SQLite has them disabled by default
            .foreign_keys(true)
            .busy_timeout(config.busy_timeout)
            .create_if_missing(true);

        debug!("Connection options configured");

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.connect_timeout)
            .idle_timeout(Some(config.idle_timeout))
            .connect_with(connect_options)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        info!(
            max_connections = config.max_connections,
            "Database pool created"
        );

        let db = Database { pool };

        if config.run_migrations {
            db.run_migrations().await?;
        }

        Ok(db)
    }

    /// Applies pending migrations. Idempotent.
    pub async fn run_migrations(&self) -> DbResult<()> {
        info!("Running database migrations");
        migrations::run_migrations(&self.pool).await?;
        info!("Migrations complete");
        Ok(())
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Returns the product store.
    pub fn products(&self) -> ProductRepository {
        ProductRepository::new(self.pool.clone())
    }

    /// Returns the sale store.
    pub fn sales(&self) -> SaleRepository {
        SaleRepository::new(self.pool.clone())
    }

    /// Returns the return store.
    pub fn returns(&self) -> ReturnRepository {
        ReturnRepository::new(self.pool.clone())
    }

    /// Returns the service that applies returns to stock.
    pub fn reconciler(&self) -> StockReconciler {
        StockReconciler::new(self.pool.clone())
    }

    /// Returns the service that records sales.
    pub fn sales_service(&self) -> SalesService {
        SalesService::new(self.pool.clone())
    }

    /// Closes the pool. Subsequent operations fail.
    pub async fn close(&self) {
        info!("Closing database connection pool");
        self.pool.close().await;
    }

    /// Checks if the database can execute queries.
    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .is_ok()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
