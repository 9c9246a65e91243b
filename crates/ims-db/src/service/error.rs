//! # Service Error Type
//!
//! The error returned by [`StockReconciler`](super::StockReconciler) and
//! [`SalesService`](super::SalesService).
//!
//! ## Taxonomy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ServiceError              ErrorCode               http_status()       │
//! │  ───────────────────────   ─────────────────────   ─────────────       │
//! │  Validation                VALIDATION_ERROR        400                 │
//! │  InsufficientQuantity      INSUFFICIENT_QUANTITY   400                 │
//! │  NotFound                  NOT_FOUND               404                 │
//! │  Internal                  INTERNAL                500                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Nothing is retried; every error aborts the enclosing transaction and is
//! handed to the caller unchanged. Internal errors are logged here and carry
//! only a generic message outward.

use serde::Serialize;
use thiserror::Error;

use crate::error::DbError;
use ims_core::{CoreError, ValidationError};

/// Machine-readable error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Malformed or incomplete request (400)
    ValidationError,
    /// Dangling product or sale reference (404)
    NotFound,
    /// Stock would go negative (400)
    InsufficientQuantity,
    /// Persistence or infrastructure fault (500)
    Internal,
}

impl ErrorCode {
    /// Status code the web layer should answer with.
    pub const fn http_status(&self) -> u16 {
        match self {
            ErrorCode::ValidationError | ErrorCode::InsufficientQuantity => 400,
            ErrorCode::NotFound => 404,
            ErrorCode::Internal => 500,
        }
    }
}

/// Errors surfaced by the services.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    #[error("Insufficient quantity for size {size}: requested {requested}, available {available}")]
    InsufficientQuantity {
        size: String,
        requested: u32,
        available: u32,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Serializable error body: `{"code": "NOT_FOUND", "message": "..."}`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub code: ErrorCode,
    pub message: String,
}

impl ServiceError {
    pub fn code(&self) -> ErrorCode {
        match self {
            ServiceError::Validation(_) => ErrorCode::ValidationError,
            ServiceError::NotFound { .. } => ErrorCode::NotFound,
            ServiceError::InsufficientQuantity { .. } => ErrorCode::InsufficientQuantity,
            ServiceError::Internal(_) => ErrorCode::Internal,
        }
    }

    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            code: self.code(),
            message: self.to_string(),
        }
    }
}

impl From<CoreError> for ServiceError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ProductNotFound(id) => ServiceError::NotFound {
                entity: "Product".to_string(),
                id,
            },
            CoreError::SaleNotFound(id) => ServiceError::NotFound {
                entity: "Sale".to_string(),
                id,
            },
            CoreError::InsufficientQuantity {
                size,
                requested,
                available,
            } => ServiceError::InsufficientQuantity {
                size,
                requested,
                available,
            },
            CoreError::QuantityOverflow { size } => {
                ServiceError::Validation(ValidationError::OutOfRange {
                    field: format!("quantity for size {}", size),
                    min: 0,
                    max: i64::from(u32::MAX),
                })
            }
            CoreError::Validation(e) => ServiceError::Validation(e),
        }
    }
}

impl From<DbError> for ServiceError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ServiceError::NotFound { entity, id },
            DbError::Invalid(e) => ServiceError::Validation(e),
            other => {
                // Log the actual error but return a generic message
                tracing::error!(error = %other, "Database operation failed");
                ServiceError::Internal("Database operation failed".to_string())
            }
        }
    }
}

impl From<sqlx::Error> for ServiceError {
    fn from(err: sqlx::Error) -> Self {
        DbError::from(err).into()
    }
}

/// Result type for service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_errors_map_to_codes() {
        let err: ServiceError = CoreError::SaleNotFound("s1".to_string()).into();
        assert_eq!(err.code(), ErrorCode::NotFound);
        assert_eq!(err.code().http_status(), 404);

        let err: ServiceError = CoreError::insufficient("M", 4, 1).into();
        assert_eq!(err.code(), ErrorCode::InsufficientQuantity);
        assert_eq!(err.code().http_status(), 400);

        let err: ServiceError = CoreError::Validation(ValidationError::required("sale_id")).into();
        assert_eq!(err.code(), ErrorCode::ValidationError);
    }

    #[test]
    fn test_db_errors_are_opaque() {
        let err: ServiceError = DbError::QueryFailed("no such table: returns".to_string()).into();
        assert_eq!(err.code(), ErrorCode::Internal);
        assert!(!err.to_string().contains("returns"));
    }

    #[test]
    fn test_error_body_serialization() {
        let err: ServiceError = CoreError::ProductNotFound("p1".to_string()).into();
        let json = serde_json::to_value(err.body()).unwrap();
        assert_eq!(json["code"], "NOT_FOUND");
        assert_eq!(json["message"], "Product not found: p1");
    }
}
