use bookswap_db::StoreError;
use bookswap_http::AppError;
use serde_json::json;
use thiserror::Error;

use super::models::{ExchangeId, ExchangeStatus};
use crate::modules::books::models::BookId;
use crate::modules::users::models::UserId;
use crate::store::DirectoryError;

/// Failures of the exchange lifecycle. None are retried internally.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExchangeError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: u64 },

    #[error("user {actor} may not act on exchange {exchange}")]
    Forbidden { actor: UserId, exchange: ExchangeId },

    #[error("invalid selection: {0}")]
    InvalidSelection(String),

    #[error("book {book} is not owned by user {user}")]
    NotOwner { user: UserId, book: BookId },

    #[error("book {0} is not available")]
    NotAvailable(BookId),

    #[error("exchange {id} is already {status}")]
    AlreadyResolved { id: ExchangeId, status: ExchangeStatus },
}

impl ExchangeError {
    pub fn invalid_selection(reason: impl Into<String>) -> Self {
        Self::InvalidSelection(reason.into())
    }

    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            ExchangeError::NotFound { .. } => "not_found",
            ExchangeError::Forbidden { .. } => "forbidden",
            ExchangeError::InvalidSelection(_) => "invalid_selection",
            ExchangeError::NotOwner { .. } => "not_owner",
            ExchangeError::NotAvailable(_) => "not_available",
            ExchangeError::AlreadyResolved { .. } => "already_resolved",
        }
    }
}

impl From<StoreError> for ExchangeError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { table, id } => ExchangeError::NotFound { entity: table, id },
            // Only books carry store-level conflicts: a traded book cannot be re-listed.
            StoreError::Conflict { id, .. } => ExchangeError::NotAvailable(BookId(id)),
        }
    }
}

impl From<DirectoryError> for ExchangeError {
    fn from(err: DirectoryError) -> Self {
        match err {
            DirectoryError::Store(inner) => inner.into(),
            other => ExchangeError::InvalidSelection(other.to_string()),
        }
    }
}

impl From<ExchangeError> for AppError {
    fn from(err: ExchangeError) -> Self {
        let code = err.code();
        let message = err.to_string();
        match err {
            ExchangeError::NotFound { .. } => AppError::not_found(message),
            ExchangeError::Forbidden { .. } => AppError::forbidden(message),
            ExchangeError::InvalidSelection(_) => {
                AppError::validation_with_code(code, vec![], message)
            }
            ExchangeError::NotOwner { user, book } => AppError::validation_with_code(
                code,
                vec![json!({ "field": "offered_book_id", "book_id": book, "user_id": user })],
                message,
            ),
            ExchangeError::NotAvailable(book) => {
                AppError::conflict_with_code(code, vec![json!({ "book_id": book })], message)
            }
            ExchangeError::AlreadyResolved { id, status } => AppError::conflict_with_code(
                code,
                vec![json!({ "exchange_id": id, "status": status })],
                message,
            ),
        }
    }
}
