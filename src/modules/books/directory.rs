use async_trait::async_trait;
use bookswap_db::StoreError;

use super::models::{Book, BookId, CreateBook};
use crate::modules::exchanges::models::ExchangeStatus;
use crate::modules::users::models::UserId;
use crate::store::{DirectoryError, MemoryStore, BOOKS, USERS};

/// Book lookups and availability writes consumed by the exchange lifecycle.
#[async_trait]
pub trait BookDirectory: Send + Sync {
    async fn get_book(&self, id: BookId) -> Result<Book, DirectoryError>;

    /// Books owned by `owner`, in listing order.
    async fn list_books_by_owner(&self, owner: UserId) -> Result<Vec<Book>, DirectoryError>;

    /// Refuses to re-list a book that is the subject of an accepted exchange.
    async fn set_availability(&self, id: BookId, available: bool) -> Result<(), DirectoryError>;
}

#[async_trait]
impl BookDirectory for MemoryStore {
    async fn get_book(&self, id: BookId) -> Result<Book, DirectoryError> {
        self.db
            .read(|tables| tables.books.get(id.0).cloned())
            .await
            .ok_or_else(|| StoreError::not_found(BOOKS, id.0).into())
    }

    async fn list_books_by_owner(&self, owner: UserId) -> Result<Vec<Book>, DirectoryError> {
        Ok(self
            .list_books(&BookFilter {
                owner_id: Some(owner),
                available: None,
            })
            .await)
    }

    async fn set_availability(&self, id: BookId, available: bool) -> Result<(), DirectoryError> {
        self.db
            .write(|tables| -> Result<(), DirectoryError> {
                let traded = tables.exchanges.values().any(|request| {
                    request.book_id == id && request.status == ExchangeStatus::Accepted
                });
                let book = tables
                    .books
                    .get_mut(id.0)
                    .ok_or(StoreError::not_found(BOOKS, id.0))?;
                if available && traded {
                    return Err(
                        StoreError::conflict(BOOKS, id.0, "book has an accepted exchange").into(),
                    );
                }
                book.is_available = available;
                Ok(())
            })
            .await
    }
}

#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct BookFilter {
    pub owner_id: Option<UserId>,
    pub available: Option<bool>,
}

impl BookFilter {
    fn matches(&self, book: &Book) -> bool {
        self.owner_id.map_or(true, |owner| book.owner_id == owner)
            && self.available.map_or(true, |a| book.is_available == a)
    }
}

impl MemoryStore {
    /// List a new, available book for `owner`.
    pub async fn create_book(&self, owner: UserId, input: CreateBook) -> Result<Book, DirectoryError> {
        let input = input.normalized()?;

        self.db
            .write(|tables| -> Result<Book, DirectoryError> {
                if !tables.users.contains(owner.0) {
                    return Err(StoreError::not_found(USERS, owner.0).into());
                }
                let book = tables.books.insert_with(|id| Book {
                    id: BookId(id),
                    title: input.title,
                    author: input.author,
                    description: input.description,
                    owner_id: owner,
                    is_available: true,
                });
                Ok(book.clone())
            })
            .await
    }

    pub async fn list_books(&self, filter: &BookFilter) -> Vec<Book> {
        self.db
            .read(|tables| {
                tables
                    .books
                    .values()
                    .filter(|book| filter.matches(book))
                    .cloned()
                    .collect()
            })
            .await
    }

    pub async fn book_count(&self) -> usize {
        self.db.read(|tables| tables.books.len()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::users::models::CreateUser;
    use bookswap_authz::Role;

    async fn store_with_owner() -> (MemoryStore, UserId) {
        let store = MemoryStore::new();
        let owner = store
            .register_user(
                CreateUser {
                    username: "anna".to_string(),
                    email: "anna@campus.edu".to_string(),
                },
                Role::Member,
            )
            .await
            .unwrap();
        (store, owner.id)
    }

    fn book(title: &str) -> CreateBook {
        CreateBook {
            title: title.to_string(),
            author: "Author".to_string(),
            description: None,
        }
    }

    #[tokio::test]
    async fn new_books_are_available() {
        let (store, owner) = store_with_owner().await;
        let created = store.create_book(owner, book("Dune")).await.unwrap();

        let fetched = store.get_book(created.id).await.unwrap();
        assert!(fetched.is_available);
        assert!(fetched.is_owned_by(owner));
    }

    #[tokio::test]
    async fn unknown_owner_cannot_list_books() {
        let store = MemoryStore::new();
        let err = store.create_book(UserId(5), book("Dune")).await.unwrap_err();
        assert_eq!(err, DirectoryError::Store(StoreError::not_found(USERS, 5)));
    }

    #[tokio::test]
    async fn availability_can_be_toggled() {
        let (store, owner) = store_with_owner().await;
        let created = store.create_book(owner, book("Dune")).await.unwrap();

        store.set_availability(created.id, false).await.unwrap();
        assert!(!store.get_book(created.id).await.unwrap().is_available);

        let missing = store.set_availability(BookId(99), false).await;
        assert_eq!(
            missing,
            Err(DirectoryError::Store(StoreError::not_found(BOOKS, 99)))
        );
    }

    #[tokio::test]
    async fn listing_by_owner_and_availability() {
        let (store, owner) = store_with_owner().await;
        let first = store.create_book(owner, book("Dune")).await.unwrap();
        store.create_book(owner, book("Emma")).await.unwrap();
        store.set_availability(first.id, false).await.unwrap();

        let owned = store.list_books_by_owner(owner).await.unwrap();
        assert_eq!(
            owned.iter().map(|b| b.title.as_str()).collect::<Vec<_>>(),
            vec!["Dune", "Emma"]
        );

        let available = store
            .list_books(&BookFilter {
                owner_id: None,
                available: Some(true),
            })
            .await;
        assert_eq!(available.len(), 1);
        assert_eq!(available[0].title, "Emma");
        assert!(store.list_books_by_owner(UserId(42)).await.unwrap().is_empty());
    }
}
