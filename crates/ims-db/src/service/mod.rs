//! # Services
//!
//! Transactional operations built on the stores. Each public method runs in
//! exactly one transaction and either commits every write or none.
//!
//! - [`StockReconciler`] - apply a return to product and/or sale stock
//! - [`SalesService`] - record a sale against product stock

pub mod error;
pub mod reconciler;
pub mod sales;

pub use error::{ErrorBody, ErrorCode, ServiceError, ServiceResult};
pub use reconciler::StockReconciler;
pub use sales::SalesService;
