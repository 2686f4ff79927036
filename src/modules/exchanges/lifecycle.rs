use std::collections::HashMap;
use std::sync::Arc;

use bookswap_db::LockTable;
use bookswap_kernel::settings::SiblingPolicy;
use time::OffsetDateTime;
use tracing::{debug, info, warn};

use super::error::ExchangeError;
use super::ledger::{ExchangeDraft, ExchangeFilter, ExchangeLedger, Resolution};
use super::models::{
    CreateExchange, ExchangeAction, ExchangeId, ExchangeRequest, ExchangeStatus, ExchangeView,
};
use super::places::PlaceCatalog;
use crate::modules::books::directory::BookDirectory;
use crate::modules::books::models::{Book, BookId};
use crate::modules::users::directory::UserDirectory;
use crate::modules::users::models::UserId;

/// Exchange request lifecycle: creation, owner resolution, and the enriched
/// listings both sides of a trade look at.
///
/// Resolutions touching the same book are serialized through a per-book lock,
/// and the final write goes through [`ExchangeLedger::commit`], which re-checks
/// the request is still pending. Two concurrent accepts of one request, or of
/// two requests for one book, therefore produce exactly one winner.
pub struct ExchangeService {
    books: Arc<dyn BookDirectory>,
    users: Arc<dyn UserDirectory>,
    ledger: Arc<dyn ExchangeLedger>,
    places: PlaceCatalog,
    sibling_policy: SiblingPolicy,
    book_locks: LockTable<BookId>,
}

impl ExchangeService {
    pub fn new(
        books: Arc<dyn BookDirectory>,
        users: Arc<dyn UserDirectory>,
        ledger: Arc<dyn ExchangeLedger>,
        places: PlaceCatalog,
        sibling_policy: SiblingPolicy,
    ) -> Self {
        Self {
            books,
            users,
            ledger,
            places,
            sibling_policy,
            book_locks: LockTable::new(),
        }
    }

    pub fn places(&self) -> &PlaceCatalog {
        &self.places
    }

    pub fn sibling_policy(&self) -> SiblingPolicy {
        self.sibling_policy
    }

    /// Propose trading one of the requester's books for someone else's
    /// available book. The new request starts out pending.
    pub async fn create_request(
        &self,
        requester: UserId,
        input: CreateExchange,
    ) -> Result<ExchangeRequest, ExchangeError> {
        let result = self.try_create(requester, input).await;
        match &result {
            Ok(request) => info!(
                exchange_id = %request.id,
                requester_id = %requester,
                book_id = %request.book_id,
                offered_book_id = %request.offered_book_id,
                place = %request.place,
                "exchange request created"
            ),
            Err(err) => warn!(
                requester_id = %requester,
                code = err.code(),
                error = %err,
                "exchange request refused"
            ),
        }
        result
    }

    async fn try_create(
        &self,
        requester: UserId,
        input: CreateExchange,
    ) -> Result<ExchangeRequest, ExchangeError> {
        let book_id = input
            .book_id
            .ok_or_else(|| ExchangeError::invalid_selection("choose a book to request"))?;
        let offered_id = input
            .offered_book_id
            .ok_or_else(|| ExchangeError::invalid_selection("choose one of your books to offer"))?;
        if !self.places.contains(&input.place) {
            return Err(ExchangeError::invalid_selection(format!(
                "unknown exchange place '{}'",
                input.place
            )));
        }

        self.users.get_user(requester).await?;
        let book = self.books.get_book(book_id).await?;
        let offered = self.books.get_book(offered_id).await?;

        if book.is_owned_by(requester) {
            return Err(ExchangeError::invalid_selection(
                "you cannot request your own book",
            ));
        }
        if !offered.is_owned_by(requester) {
            return Err(ExchangeError::NotOwner {
                user: requester,
                book: offered_id,
            });
        }
        if !book.is_available {
            return Err(ExchangeError::NotAvailable(book_id));
        }

        // The ledger re-checks availability inside the insert, so an accept
        // landing between here and there still wins.
        self.ledger
            .insert(ExchangeDraft {
                requester_id: requester,
                book_id,
                offered_book_id: offered_id,
                place: input.place,
                created_at: OffsetDateTime::now_utc(),
            })
            .await
    }

    /// Accept or reject a pending request. Only the owner of the requested
    /// book may do this, and only once.
    pub async fn resolve(
        &self,
        id: ExchangeId,
        action: ExchangeAction,
        actor: UserId,
    ) -> Result<ExchangeRequest, ExchangeError> {
        let result = self.try_resolve(id, action, actor).await;
        if let Err(err) = &result {
            warn!(
                exchange_id = %id,
                actor_id = %actor,
                ?action,
                code = err.code(),
                error = %err,
                "exchange resolution refused"
            );
        }
        result
    }

    async fn try_resolve(
        &self,
        id: ExchangeId,
        action: ExchangeAction,
        actor: UserId,
    ) -> Result<ExchangeRequest, ExchangeError> {
        let request = self.ledger.get(id).await?;
        let book = self.books.get_book(request.book_id).await?;
        if !book.is_owned_by(actor) {
            return Err(ExchangeError::Forbidden { actor, exchange: id });
        }

        let _guard = self.book_locks.lock(&request.book_id).await;
        debug!(exchange_id = %id, book_id = %request.book_id, "book lock acquired");

        let current = self.ledger.get(id).await?;
        if current.status.is_terminal() {
            return Err(ExchangeError::AlreadyResolved {
                id,
                status: current.status,
            });
        }
        if action == ExchangeAction::Accept {
            let book = self.books.get_book(current.book_id).await?;
            if !book.is_available {
                return Err(ExchangeError::NotAvailable(current.book_id));
            }
        }

        let committed = self
            .ledger
            .commit(&Resolution {
                request: id,
                action,
                reject_siblings: action == ExchangeAction::Accept
                    && self.sibling_policy == SiblingPolicy::AutoReject,
            })
            .await?;

        info!(
            exchange_id = %id,
            book_id = %committed.request.book_id,
            status = %committed.request.status,
            auto_rejected = ?committed.auto_rejected,
            "exchange resolved"
        );
        Ok(committed.request)
    }

    /// Requests the user has sent, in creation order.
    pub async fn list_by_requester(
        &self,
        requester: UserId,
        status: Option<ExchangeStatus>,
    ) -> Result<Vec<ExchangeView>, ExchangeError> {
        let requests = self
            .ledger
            .list(&ExchangeFilter {
                requester: Some(requester),
                status,
                ..ExchangeFilter::default()
            })
            .await?;
        self.enrich(requests).await
    }

    /// Requests addressed to books the user owns, in creation order.
    pub async fn list_by_owner(
        &self,
        owner: UserId,
        status: Option<ExchangeStatus>,
    ) -> Result<Vec<ExchangeView>, ExchangeError> {
        let owned: Vec<BookId> = self
            .books
            .list_books_by_owner(owner)
            .await?
            .into_iter()
            .map(|book| book.id)
            .collect();
        if owned.is_empty() {
            return Ok(Vec::new());
        }

        let requests = self
            .ledger
            .list(&ExchangeFilter {
                books: Some(owned),
                status,
                ..ExchangeFilter::default()
            })
            .await?;
        self.enrich(requests).await
    }

    /// Every request in `status`, for moderation.
    pub async fn list_by_status(
        &self,
        status: ExchangeStatus,
    ) -> Result<Vec<ExchangeView>, ExchangeError> {
        let requests = self
            .ledger
            .list(&ExchangeFilter {
                status: Some(status),
                ..ExchangeFilter::default()
            })
            .await?;
        self.enrich(requests).await
    }

    /// One request, visible to its requester and to the owner of the
    /// requested book.
    pub async fn get_view(
        &self,
        id: ExchangeId,
        viewer: UserId,
    ) -> Result<ExchangeView, ExchangeError> {
        let request = self.ledger.get(id).await?;
        let book = self.books.get_book(request.book_id).await?;
        if request.requester_id != viewer && !book.is_owned_by(viewer) {
            return Err(ExchangeError::Forbidden {
                actor: viewer,
                exchange: id,
            });
        }

        let offered = self.books.get_book(request.offered_book_id).await?;
        Ok(view(request, &book, &offered))
    }

    // Requests are read before books, so a view never pairs an accepted
    // status with a still-available book.
    async fn enrich(
        &self,
        requests: Vec<ExchangeRequest>,
    ) -> Result<Vec<ExchangeView>, ExchangeError> {
        let mut books: HashMap<BookId, Book> = HashMap::new();
        let mut views = Vec::with_capacity(requests.len());

        for request in requests {
            for id in [request.book_id, request.offered_book_id] {
                if !books.contains_key(&id) {
                    let book = self.books.get_book(id).await?;
                    books.insert(id, book);
                }
            }
            let (book, offered) = (&books[&request.book_id], &books[&request.offered_book_id]);
            views.push(view(request, book, offered));
        }

        Ok(views)
    }
}

fn view(request: ExchangeRequest, book: &Book, offered: &Book) -> ExchangeView {
    ExchangeView {
        book_title: book.title.clone(),
        offered_book_title: offered.title.clone(),
        status_label: request.status.label(),
        book_available: book.is_available,
        request,
    }
}
