//! Client-side exchange form state and the read models each exchange
//! mutation makes stale.
//!
//! The form is a single state value rather than a handful of flags, so states
//! like "submitting while closed" cannot be represented. Every transition takes
//! the current state by value and returns the next one; a transition that does
//! not apply to the current state returns it unchanged.

use super::models::CreateExchange;
use super::places::PlaceCatalog;
use crate::modules::books::models::BookId;
use crate::refresh::ReadModel;

/// Read models a successful create leaves stale for the requester.
pub const AFTER_CREATE: &[ReadModel] = &[ReadModel::OutgoingExchanges];

/// Read models a successful accept or reject leaves stale. Availability may
/// have changed, and the requester's outgoing list shows the new status.
pub const AFTER_RESOLVE: &[ReadModel] = &[
    ReadModel::IncomingExchanges,
    ReadModel::Books,
    ReadModel::OutgoingExchanges,
];

const NOTHING: &[ReadModel] = &[];

pub const NO_OFFER_MESSAGE: &str = "choose one of your books to offer";

/// What the requester has picked so far.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub target: BookId,
    pub offered: Option<BookId>,
    pub place: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ExchangeModal {
    #[default]
    Closed,
    SelectingBook(Selection),
    Submitting {
        target: BookId,
        offered: BookId,
        place: String,
    },
    Error {
        selection: Selection,
        message: String,
    },
}

impl ExchangeModal {
    /// Open the form for `target` with the first configured place preselected.
    pub fn open(target: BookId, places: &PlaceCatalog) -> Self {
        ExchangeModal::SelectingBook(Selection {
            target,
            offered: None,
            place: places.default_place().to_string(),
        })
    }

    pub fn choose_offered(self, book: BookId) -> Self {
        match self {
            ExchangeModal::SelectingBook(selection) => ExchangeModal::SelectingBook(Selection {
                offered: Some(book),
                ..selection
            }),
            other => other,
        }
    }

    pub fn choose_place(self, place: impl Into<String>) -> Self {
        match self {
            ExchangeModal::SelectingBook(selection) => ExchangeModal::SelectingBook(Selection {
                place: place.into(),
                ..selection
            }),
            other => other,
        }
    }

    /// Move to `Submitting` and hand back the request body to send. Without an
    /// offered book the form stays open in `Error` and nothing is sent.
    pub fn submit(self) -> (Self, Option<CreateExchange>) {
        match self {
            ExchangeModal::SelectingBook(Selection {
                target,
                offered: Some(offered),
                place,
            }) => {
                let body = CreateExchange {
                    book_id: Some(target),
                    offered_book_id: Some(offered),
                    place: place.clone(),
                };
                (
                    ExchangeModal::Submitting {
                        target,
                        offered,
                        place,
                    },
                    Some(body),
                )
            }
            ExchangeModal::SelectingBook(selection) => (
                ExchangeModal::Error {
                    selection,
                    message: NO_OFFER_MESSAGE.to_string(),
                },
                None,
            ),
            other => (other, None),
        }
    }

    /// Apply the server's answer. Success closes the form and names the read
    /// models to fetch again; failure keeps the selection and shows the message.
    pub fn finish(self, outcome: Result<(), String>) -> (Self, &'static [ReadModel]) {
        match (self, outcome) {
            (ExchangeModal::Submitting { .. }, Ok(())) => (ExchangeModal::Closed, AFTER_CREATE),
            (
                ExchangeModal::Submitting {
                    target,
                    offered,
                    place,
                },
                Err(message),
            ) => (
                ExchangeModal::Error {
                    selection: Selection {
                        target,
                        offered: Some(offered),
                        place,
                    },
                    message,
                },
                NOTHING,
            ),
            (other, _) => (other, NOTHING),
        }
    }

    pub fn retry(self) -> Self {
        match self {
            ExchangeModal::Error { selection, .. } => ExchangeModal::SelectingBook(selection),
            other => other,
        }
    }

    /// Dismiss the form. An in-flight submission cannot be dismissed.
    pub fn close(self) -> Self {
        match self {
            submitting @ ExchangeModal::Submitting { .. } => submitting,
            _ => ExchangeModal::Closed,
        }
    }

    pub fn is_open(&self) -> bool {
        !matches!(self, ExchangeModal::Closed)
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            ExchangeModal::Error { message, .. } => Some(message),
            _ => None,
        }
    }
}
