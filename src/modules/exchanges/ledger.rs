use async_trait::async_trait;
use bookswap_db::StoreError;
use time::OffsetDateTime;

use super::error::ExchangeError;
use super::models::{ExchangeAction, ExchangeId, ExchangeRequest, ExchangeStatus};
use crate::modules::books::models::BookId;
use crate::modules::users::models::UserId;
use crate::store::{MemoryStore, BOOKS, EXCHANGES};

/// A validated request waiting to be stored.
#[derive(Debug, Clone)]
pub struct ExchangeDraft {
    pub requester_id: UserId,
    pub book_id: BookId,
    pub offered_book_id: BookId,
    pub place: String,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Default)]
pub struct ExchangeFilter {
    pub requester: Option<UserId>,
    pub books: Option<Vec<BookId>>,
    pub status: Option<ExchangeStatus>,
}

impl ExchangeFilter {
    pub fn matches(&self, request: &ExchangeRequest) -> bool {
        self.requester.map_or(true, |r| request.requester_id == r)
            && self
                .books
                .as_ref()
                .map_or(true, |books| books.contains(&request.book_id))
            && self.status.map_or(true, |s| request.status == s)
    }
}

/// One owner decision, applied as a single unit.
#[derive(Debug, Clone, Copy)]
pub struct Resolution {
    pub request: ExchangeId,
    pub action: ExchangeAction,
    /// Reject the other pending requests on the same book when accepting.
    pub reject_siblings: bool,
}

#[derive(Debug, Clone)]
pub struct Committed {
    pub request: ExchangeRequest,
    pub auto_rejected: Vec<ExchangeId>,
}

/// Storage for exchange requests.
///
/// `insert` and `commit` must each be atomic with respect to every other
/// ledger and book-directory call: readers never see a request accepted while
/// its book is still available, or the other way round.
#[async_trait]
pub trait ExchangeLedger: Send + Sync {
    /// Store a pending request. Fails with `NotAvailable` when the target book
    /// is unavailable at the moment of insertion.
    async fn insert(&self, draft: ExchangeDraft) -> Result<ExchangeRequest, ExchangeError>;

    async fn get(&self, id: ExchangeId) -> Result<ExchangeRequest, ExchangeError>;

    /// Matching requests in creation order.
    async fn list(&self, filter: &ExchangeFilter) -> Result<Vec<ExchangeRequest>, ExchangeError>;

    /// Re-check that the request is pending (and, for accepts, that its book is
    /// available), then write status, availability, and sibling rejections.
    async fn commit(&self, resolution: &Resolution) -> Result<Committed, ExchangeError>;
}

#[async_trait]
impl ExchangeLedger for MemoryStore {
    async fn insert(&self, draft: ExchangeDraft) -> Result<ExchangeRequest, ExchangeError> {
        self.db
            .write(|tables| -> Result<ExchangeRequest, ExchangeError> {
                let book = tables
                    .books
                    .get(draft.book_id.0)
                    .ok_or(StoreError::not_found(BOOKS, draft.book_id.0))?;
                if !book.is_available {
                    return Err(ExchangeError::NotAvailable(draft.book_id));
                }

                let request = tables.exchanges.insert_with(|id| ExchangeRequest {
                    id: ExchangeId(id),
                    requester_id: draft.requester_id,
                    book_id: draft.book_id,
                    offered_book_id: draft.offered_book_id,
                    place: draft.place,
                    status: ExchangeStatus::Pending,
                    created_at: draft.created_at,
                });
                Ok(request.clone())
            })
            .await
    }

    async fn get(&self, id: ExchangeId) -> Result<ExchangeRequest, ExchangeError> {
        self.db
            .read(|tables| tables.exchanges.get(id.0).cloned())
            .await
            .ok_or_else(|| StoreError::not_found(EXCHANGES, id.0).into())
    }

    async fn list(&self, filter: &ExchangeFilter) -> Result<Vec<ExchangeRequest>, ExchangeError> {
        Ok(self
            .db
            .read(|tables| {
                tables
                    .exchanges
                    .values()
                    .filter(|request| filter.matches(request))
                    .cloned()
                    .collect()
            })
            .await)
    }

    async fn commit(&self, resolution: &Resolution) -> Result<Committed, ExchangeError> {
        let id = resolution.request;

        self.db
            .write(|tables| -> Result<Committed, ExchangeError> {
                let (status, book_id) = tables
                    .exchanges
                    .get(id.0)
                    .map(|request| (request.status, request.book_id))
                    .ok_or(StoreError::not_found(EXCHANGES, id.0))?;
                if status.is_terminal() {
                    return Err(ExchangeError::AlreadyResolved { id, status });
                }

                let accepting = resolution.action == ExchangeAction::Accept;
                if accepting {
                    let book = tables
                        .books
                        .get_mut(book_id.0)
                        .ok_or(StoreError::not_found(BOOKS, book_id.0))?;
                    if !book.is_available {
                        return Err(ExchangeError::NotAvailable(book_id));
                    }
                    // Only the requested book flips; the offered one is left as is.
                    book.is_available = false;
                }

                let mut auto_rejected = Vec::new();
                if accepting && resolution.reject_siblings {
                    for sibling in tables.exchanges.values_mut().filter(|r| {
                        r.book_id == book_id && r.id != id && r.status == ExchangeStatus::Pending
                    }) {
                        sibling.status = ExchangeStatus::Rejected;
                        auto_rejected.push(sibling.id);
                    }
                }

                let request = tables
                    .exchanges
                    .get_mut(id.0)
                    .ok_or(StoreError::not_found(EXCHANGES, id.0))?;
                request.status = resolution.action.outcome();

                Ok(Committed {
                    request: request.clone(),
                    auto_rejected,
                })
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::books::directory::BookDirectory;
    use crate::modules::books::models::CreateBook;
    use crate::modules::users::models::CreateUser;
    use bookswap_authz::Role;

    struct Fixture {
        store: MemoryStore,
        owner: UserId,
        requester: UserId,
        target: BookId,
        offered: BookId,
    }

    async fn fixture() -> Fixture {
        let store = MemoryStore::new();
        let mut ids = Vec::new();
        for name in ["owner", "reader"] {
            let user = store
                .register_user(
                    CreateUser {
                        username: name.to_string(),
                        email: format!("{name}@campus.edu"),
                    },
                    Role::Member,
                )
                .await
                .unwrap();
            ids.push(user.id);
        }
        let (owner, requester) = (ids[0], ids[1]);

        let book = |title: &str| CreateBook {
            title: title.to_string(),
            author: "Author".to_string(),
            description: None,
        };
        let target = store.create_book(owner, book("Dune")).await.unwrap().id;
        let offered = store.create_book(requester, book("Emma")).await.unwrap().id;

        Fixture {
            store,
            owner,
            requester,
            target,
            offered,
        }
    }

    fn draft(f: &Fixture) -> ExchangeDraft {
        ExchangeDraft {
            requester_id: f.requester,
            book_id: f.target,
            offered_book_id: f.offered,
            place: "Room B104".to_string(),
            created_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    fn accept(request: ExchangeId, reject_siblings: bool) -> Resolution {
        Resolution {
            request,
            action: ExchangeAction::Accept,
            reject_siblings,
        }
    }

    #[tokio::test]
    async fn insert_refuses_unavailable_book() {
        let f = fixture().await;
        f.store.set_availability(f.target, false).await.unwrap();

        let err = f.store.insert(draft(&f)).await.unwrap_err();
        assert_eq!(err, ExchangeError::NotAvailable(f.target));
        assert!(f.store.list(&ExchangeFilter::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn accept_flips_only_the_requested_book() {
        let f = fixture().await;
        let request = f.store.insert(draft(&f)).await.unwrap();

        let committed = f.store.commit(&accept(request.id, true)).await.unwrap();

        assert_eq!(committed.request.status, ExchangeStatus::Accepted);
        assert!(!f.store.get_book(f.target).await.unwrap().is_available);
        assert!(f.store.get_book(f.offered).await.unwrap().is_available);
    }

    #[tokio::test]
    async fn commit_rechecks_pending_status() {
        let f = fixture().await;
        let request = f.store.insert(draft(&f)).await.unwrap();
        f.store
            .commit(&Resolution {
                request: request.id,
                action: ExchangeAction::Reject,
                reject_siblings: false,
            })
            .await
            .unwrap();

        let err = f.store.commit(&accept(request.id, false)).await.unwrap_err();
        assert_eq!(
            err,
            ExchangeError::AlreadyResolved {
                id: request.id,
                status: ExchangeStatus::Rejected
            }
        );
        assert!(f.store.get_book(f.target).await.unwrap().is_available);
    }

    #[tokio::test]
    async fn sibling_rejection_is_part_of_the_accept() {
        let f = fixture().await;
        let first = f.store.insert(draft(&f)).await.unwrap();
        let second = f.store.insert(draft(&f)).await.unwrap();

        let committed = f.store.commit(&accept(first.id, true)).await.unwrap();

        assert_eq!(committed.auto_rejected, vec![second.id]);
        assert_eq!(
            f.store.get(second.id).await.unwrap().status,
            ExchangeStatus::Rejected
        );
    }

    #[tokio::test]
    async fn siblings_stay_pending_without_rejection_and_cannot_be_accepted() {
        let f = fixture().await;
        let first = f.store.insert(draft(&f)).await.unwrap();
        let second = f.store.insert(draft(&f)).await.unwrap();

        let committed = f.store.commit(&accept(first.id, false)).await.unwrap();
        assert!(committed.auto_rejected.is_empty());
        assert_eq!(
            f.store.get(second.id).await.unwrap().status,
            ExchangeStatus::Pending
        );

        let err = f.store.commit(&accept(second.id, false)).await.unwrap_err();
        assert_eq!(err, ExchangeError::NotAvailable(f.target));
        assert_eq!(
            f.store.get(second.id).await.unwrap().status,
            ExchangeStatus::Pending
        );
    }

    #[tokio::test]
    async fn list_filters_compose() {
        let f = fixture().await;
        let first = f.store.insert(draft(&f)).await.unwrap();
        f.store.insert(draft(&f)).await.unwrap();
        f.store.commit(&accept(first.id, false)).await.unwrap();

        let by_requester = ExchangeFilter {
            requester: Some(f.requester),
            ..ExchangeFilter::default()
        };
        assert_eq!(f.store.list(&by_requester).await.unwrap().len(), 2);

        let accepted_on_target = ExchangeFilter {
            books: Some(vec![f.target]),
            status: Some(ExchangeStatus::Accepted),
            ..ExchangeFilter::default()
        };
        let accepted = f.store.list(&accepted_on_target).await.unwrap();
        assert_eq!(accepted.len(), 1);
        assert_eq!(accepted[0].id, first.id);

        let by_owner = ExchangeFilter {
            requester: Some(f.owner),
            ..ExchangeFilter::default()
        };
        assert!(f.store.list(&by_owner).await.unwrap().is_empty());
    }
}
