use std::fmt;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::modules::books::models::BookId;
use crate::modules::users::models::UserId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExchangeId(pub u64);

impl fmt::Display for ExchangeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// `pending` is initial; `accepted` and `rejected` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExchangeStatus {
    #[default]
    Pending,
    Accepted,
    Rejected,
}

impl ExchangeStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, ExchangeStatus::Pending)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ExchangeStatus::Pending => "pending",
            ExchangeStatus::Accepted => "accepted",
            ExchangeStatus::Rejected => "rejected",
        }
    }

    /// Human-readable label for read models.
    pub fn label(self) -> &'static str {
        match self {
            ExchangeStatus::Pending => "Pending",
            ExchangeStatus::Accepted => "Accepted",
            ExchangeStatus::Rejected => "Rejected",
        }
    }
}

impl fmt::Display for ExchangeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The owner's decision on a pending request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExchangeAction {
    Accept,
    Reject,
}

impl ExchangeAction {
    pub fn outcome(self) -> ExchangeStatus {
        match self {
            ExchangeAction::Accept => ExchangeStatus::Accepted,
            ExchangeAction::Reject => ExchangeStatus::Rejected,
        }
    }
}

/// A proposal to trade `offered_book_id` for `book_id` at `place`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeRequest {
    pub id: ExchangeId,
    pub requester_id: UserId,
    pub book_id: BookId,
    pub offered_book_id: BookId,
    pub place: String,
    pub status: ExchangeStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Body of `POST /api/exchanges`. Both books are optional on the wire so a
/// missing choice surfaces as an invalid selection rather than a parse error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateExchange {
    #[serde(default)]
    pub book_id: Option<BookId>,
    #[serde(default)]
    pub offered_book_id: Option<BookId>,
    #[serde(default)]
    pub place: String,
}

/// Body of `PUT /api/exchanges/{id}`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ResolveExchange {
    pub action: ExchangeAction,
}

/// Request enriched with titles and labels for display.
#[derive(Debug, Clone, Serialize)]
pub struct ExchangeView {
    #[serde(flatten)]
    pub request: ExchangeRequest,
    pub book_title: String,
    pub offered_book_title: String,
    pub status_label: &'static str,
    /// Current availability of the requested book. A pending request on an
    /// unavailable book can no longer be accepted.
    pub book_available: bool,
}
