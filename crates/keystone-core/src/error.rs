//! # Error Types
//!
//! Domain error taxonomy shared by every engine operation.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  keystone-core (this file)                                             │
//! │  ├── CoreError        - NotFound / InvalidState / Forbidden / Conflict │
//! │  └── ValidationError  - Malformed input                                │
//! │                                                                         │
//! │  keystone-db                                                           │
//! │  └── DbError          - Storage failures                               │
//! │                                                                         │
//! │  keystone-engine                                                       │
//! │  └── EngineError      - What a transport layer renders                 │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError ─┐                                  │
//! │                          DbError ───┴──► EngineError ──► caller        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Business rule violations, one variant per error kind of the taxonomy.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A referenced entity does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// The operation is not valid for the entity's current lifecycle state.
    ///
    /// ## When This Occurs
    /// - Submitting an order that is not pending
    /// - Paying for an order that was never submitted
    /// - Confirming a payment twice
    /// - Resolving a discount request that was already resolved
    #[error("{entity} {id} is {status}, cannot {operation}")]
    InvalidState {
        entity: &'static str,
        id: String,
        status: String,
        operation: &'static str,
    },

    /// The caller lacks the role or ownership for the target entity.
    #[error("{caller_id} is not allowed to {action}")]
    Forbidden { caller_id: String, action: String },

    /// A uniqueness invariant would be violated.
    #[error("{0}")]
    Conflict(String),

    /// Malformed input.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        CoreError::NotFound {
            entity,
            id: id.into(),
        }
    }

    pub fn invalid_state(
        entity: &'static str,
        id: impl Into<String>,
        status: impl std::fmt::Display,
        operation: &'static str,
    ) -> Self {
        CoreError::InvalidState {
            entity,
            id: id.into(),
            status: status.to_string(),
            operation,
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors, raised before any state is touched.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid UUID, malformed email).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// An order must carry at least one line item.
    #[error("order must contain at least one item")]
    EmptyItems,

    /// A line item references a product that does not exist.
    #[error("unknown product: {product_id}")]
    UnknownProduct { product_id: String },

    /// A discount may not exceed the order total it is requested against.
    #[error("discount {amount_cents} exceeds order total {total_cents}")]
    DiscountExceedsTotal { amount_cents: i64, total_cents: i64 },

    /// Date range filter with `from` after `to`.
    #[error("date range start is after its end")]
    InvertedDateRange,
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_state_message() {
        let err = CoreError::invalid_state("Order", "o-1", "submitted", "submit");
        assert_eq!(err.to_string(), "Order o-1 is submitted, cannot submit");
    }

    #[test]
    fn test_validation_messages() {
        assert_eq!(
            ValidationError::EmptyItems.to_string(),
            "order must contain at least one item"
        );
        let err = ValidationError::DiscountExceedsTotal {
            amount_cents: 500,
            total_cents: 330,
        };
        assert_eq!(err.to_string(), "discount 500 exceeds order total 330");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let core_err: CoreError = ValidationError::UnknownProduct {
            product_id: "p-9".to_string(),
        }
        .into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
