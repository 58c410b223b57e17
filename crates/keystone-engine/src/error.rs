//! # Engine Error Type
//!
//! Every ledger operation returns [`EngineResult`].
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in the Engine                             │
//! │                                                                         │
//! │  ValidationError ──► CoreError ──┐                                      │
//! │                                  ├──► EngineError ──► kind() ──► code  │
//! │  sqlx::Error ──► DbError ────────┤         │                            │
//! │                                  │         └──► ErrorBody (serialised)  │
//! │  ReceiptIssuer failure ──────────┘                                      │
//! │                                                                         │
//! │  A transport layer renders ErrorBody:                                   │
//! │    { "code": "INVALID_STATE",                                           │
//! │      "message": "Order 8c1f... is paid, cannot submit" }                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use thiserror::Error;

use keystone_core::{CoreError, ValidationError};
use keystone_db::DbError;

use crate::receipt::ReceiptError;

/// Engine operation errors.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Business rule outcome (not found, wrong state, forbidden, ...).
    #[error(transparent)]
    Domain(#[from] CoreError),

    /// Storage failure not already translated into a domain error.
    #[error(transparent)]
    Storage(#[from] DbError),

    /// The receipt issuer failed; the confirmation was rolled back.
    #[error("Receipt issuer failed: {0}")]
    Receipt(String),
}

/// Error kinds exposed to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// Referenced entity does not exist (404)
    NotFound,

    /// Operation not valid in the entity's current state (409)
    InvalidState,

    /// Malformed input (400)
    #[serde(rename = "VALIDATION_ERROR")]
    Validation,

    /// Caller lacks role or ownership (403)
    Forbidden,

    /// Uniqueness would be violated (409)
    Conflict,

    /// Storage or collaborator failure (500)
    Infrastructure,
}

impl ErrorKind {
    pub const fn code(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::InvalidState => "INVALID_STATE",
            ErrorKind::Validation => "VALIDATION_ERROR",
            ErrorKind::Forbidden => "FORBIDDEN",
            ErrorKind::Conflict => "CONFLICT",
            ErrorKind::Infrastructure => "INFRASTRUCTURE",
        }
    }
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::Domain(err) => match err {
                CoreError::NotFound { .. } => ErrorKind::NotFound,
                CoreError::InvalidState { .. } => ErrorKind::InvalidState,
                CoreError::Forbidden { .. } => ErrorKind::Forbidden,
                CoreError::Conflict(_) => ErrorKind::Conflict,
                CoreError::Validation(_) => ErrorKind::Validation,
            },
            EngineError::Storage(err) => match err {
                DbError::NotFound { .. } => ErrorKind::NotFound,
                DbError::UniqueViolation { .. } => ErrorKind::Conflict,
                _ => ErrorKind::Infrastructure,
            },
            EngineError::Receipt(_) => ErrorKind::Infrastructure,
        }
    }

    /// Machine-readable code, e.g. `"INVALID_STATE"`.
    pub fn code(&self) -> &'static str {
        self.kind().code()
    }

    /// Renders the error for a transport layer.
    ///
    /// Infrastructure details are logged, not returned.
    pub fn to_body(&self) -> ErrorBody {
        let kind = self.kind();
        let message = match kind {
            ErrorKind::Infrastructure => {
                tracing::error!(error = %self, "Infrastructure failure");
                match self {
                    EngineError::Receipt(_) => "Receipt could not be issued".to_string(),
                    _ => "Storage operation failed".to_string(),
                }
            }
            _ => self.to_string(),
        };
        ErrorBody {
            code: kind,
            message,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }
}

impl From<ValidationError> for EngineError {
    fn from(err: ValidationError) -> Self {
        EngineError::Domain(CoreError::Validation(err))
    }
}

impl From<ReceiptError> for EngineError {
    fn from(err: ReceiptError) -> Self {
        EngineError::Receipt(err.0)
    }
}

/// Serialised error.
///
/// ```json
/// {
///   "code": "CONFLICT",
///   "message": "order 8c1f... already has a payment"
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub code: ErrorKind,
    pub message: String,
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
