//! # ims-db: Database Layer for the Inventory Backend
//!
//! SQLite persistence for products, sales and returns, and the transactional
//! services that move stock between them.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        IMS Data Flow                                    │
//! │                                                                         │
//! │  Web handler (returns endpoint)                                        │
//! │       │  ReturnRequest                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     ims-db (THIS CRATE)                         │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Services    │    │  Repositories │    │   Database   │  │   │
//! │  │   │               │    │               │    │   (pool.rs)  │  │   │
//! │  │   │ Reconciler ───┼───►│ ProductRepo   │───►│  SqlitePool  │  │   │
//! │  │   │ SalesService  │    │ SaleRepo      │    │  migrations  │  │   │
//! │  │   │               │    │ ReturnRepo    │    │              │  │   │
//! │  │   └───────┬───────┘    └───────────────┘    └──────────────┘  │   │
//! │  │           │ plan_return / plan_sale                            │   │
//! │  └───────────┼─────────────────────────────────────────────────────┘   │
//! │              ▼                                                          │
//! │         ims-core (pure rules)                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Product, sale and return stores
//! - [`service`] - `StockReconciler`, `SalesService` and their error type
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ims_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::from_env()?).await?;
//! let record = db.reconciler().reconcile(request).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod service;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::{ProductRepository, ReturnRepository, SaleRepository};
pub use service::{
    ErrorBody, ErrorCode, SalesService, ServiceError, ServiceResult, StockReconciler,
};

/// Default log filter when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "info,ims=debug,sqlx=warn";

/// Initializes the tracing subscriber.
///
/// `RUST_LOG` overrides [`DEFAULT_LOG_FILTER`]. Safe to call more than once;
/// later calls are ignored.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
