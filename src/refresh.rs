//! Client cache-invalidation contract.
//!
//! The service never pushes updates. Every mutation response names the read
//! models the caller has to fetch again.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadModel {
    /// Book listings, including availability flags.
    Books,
    /// The caller's sent exchange requests.
    OutgoingExchanges,
    /// Requests addressed to the caller's books.
    IncomingExchanges,
}

/// A mutation result plus the read models it made stale.
#[derive(Debug, Clone, Serialize)]
pub struct Mutation<T> {
    #[serde(flatten)]
    pub data: T,
    pub refresh: Vec<ReadModel>,
}

impl<T> Mutation<T> {
    pub fn new(data: T, refresh: &[ReadModel]) -> Self {
        Self {
            data,
            refresh: refresh.to_vec(),
        }
    }
}
