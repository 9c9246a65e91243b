//! # ims-core: Pure Business Logic for the Inventory Backend
//!
//! Stock arithmetic and the return/stock reconciliation rules, as pure
//! functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        IMS Architecture                                 │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │               Web layer (outside this workspace)                │   │
//! │  │        returns, sales, products endpoints → status codes        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │        ims-db: StockReconciler, SalesService, stores           │   │
//! │  │        (transactions, SQLite)                                   │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ ims-core (THIS CRATE) ★                         │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │ quantity  │  │   types   │  │ reconcile │  │ validation│  │   │
//! │  │   │StockLevel │  │  Product  │  │plan_return│  │   rules   │  │   │
//! │  │   │  sizes    │  │ Sale, ... │  │ plan_sale │  │  checks   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`quantity`] - `StockLevel` (sized or flat) and `SizeQuantities`
//! - [`types`] - Domain types (Product, Sale, ReturnRecord, ReturnCondition)
//! - [`reconcile`] - Return planning
//! - [`sale`] - Sale planning
//! - [`validation`] - Input validation
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use ims_core::{SizeQuantities, StockLevel};
//!
//! let mut stock = StockLevel::Flat(10);
//! stock.increase(&SizeQuantities::single("N/A", 2)).unwrap();
//! assert_eq!(stock.total(), 12);
//! assert!(stock.in_stock());
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod quantity;
pub mod reconcile;
pub mod sale;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use quantity::{SizeQuantities, StockLevel, UNSIZED_LABEL};
pub use reconcile::{plan_return, ReturnPlan, ReturnRequest};
pub use sale::{plan_sale, SalePlan, SaleRequest};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum length of a product name.
pub const MAX_NAME_LEN: usize = 200;

/// Maximum length of a return reason.
pub const MAX_REASON_LEN: usize = 500;

/// Maximum length of a size label.
pub const MAX_SIZE_LABEL_LEN: usize = 20;
