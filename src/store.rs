//! Process-local record store backing the user, book, and exchange
//! directories.

use bookswap_db::{Store, StoreError, Table};
use bookswap_http::AppError;
use thiserror::Error;

use crate::modules::books::models::Book;
use crate::modules::exchanges::models::ExchangeRequest;
use crate::modules::users::models::User;

pub const USERS: &str = "user";
pub const BOOKS: &str = "book";
pub const EXCHANGES: &str = "exchange";

#[derive(Debug, Default)]
pub struct Tables {
    pub users: Table<User>,
    pub books: Table<Book>,
    pub exchanges: Table<ExchangeRequest>,
}

/// All service records behind one unit-of-work lock.
#[derive(Debug, Default)]
pub struct MemoryStore {
    pub(crate) db: Store<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Failures of the user and book directories.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("{field} '{value}' is already taken")]
    Taken { field: &'static str, value: String },

    #[error("invalid {field}: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

impl DirectoryError {
    pub fn invalid(field: &'static str, reason: &'static str) -> Self {
        Self::Invalid { field, reason }
    }
}

impl From<DirectoryError> for AppError {
    fn from(err: DirectoryError) -> Self {
        match err {
            DirectoryError::Store(StoreError::NotFound { .. }) => {
                AppError::not_found(err.to_string())
            }
            DirectoryError::Store(StoreError::Conflict { table, id, .. }) => AppError::conflict(
                vec![serde_json::json!({ "table": table, "id": id })],
                err.to_string(),
            ),
            DirectoryError::Taken { field, ref value } => AppError::conflict(
                vec![serde_json::json!({ "field": field, "value": value })],
                err.to_string(),
            ),
            DirectoryError::Invalid { field, reason } => AppError::validation(
                vec![serde_json::json!({ "field": field, "error": reason })],
                err.to_string(),
            ),
        }
    }
}
