use async_trait::async_trait;
use bookswap_authz::Role;
use bookswap_db::StoreError;

use super::models::{CreateUser, User, UserId};
use crate::store::{DirectoryError, MemoryStore, USERS};

/// Identity lookup consumed by the exchange lifecycle.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn get_user(&self, id: UserId) -> Result<User, DirectoryError>;
}

#[async_trait]
impl UserDirectory for MemoryStore {
    async fn get_user(&self, id: UserId) -> Result<User, DirectoryError> {
        self.db
            .read(|tables| tables.users.get(id.0).cloned())
            .await
            .ok_or_else(|| StoreError::not_found(USERS, id.0).into())
    }
}

impl MemoryStore {
    /// Store a new user. Usernames and e-mails are unique, e-mail case-insensitively.
    pub async fn register_user(&self, input: CreateUser, role: Role) -> Result<User, DirectoryError> {
        let input = input.normalized()?;

        self.db
            .write(|tables| {
                if tables.users.values().any(|u| u.username == input.username) {
                    return Err(DirectoryError::Taken {
                        field: "username",
                        value: input.username,
                    });
                }
                if tables
                    .users
                    .values()
                    .any(|u| u.email.eq_ignore_ascii_case(&input.email))
                {
                    return Err(DirectoryError::Taken {
                        field: "email",
                        value: input.email,
                    });
                }

                let user = tables.users.insert_with(|id| User {
                    id: UserId(id),
                    username: input.username,
                    email: input.email,
                    role,
                });
                Ok(user.clone())
            })
            .await
    }

    /// Users in registration order, optionally narrowed to one e-mail.
    pub async fn list_users(&self, email: Option<&str>) -> Vec<User> {
        self.db
            .read(|tables| {
                tables
                    .users
                    .values()
                    .filter(|u| match email {
                        Some(e) => u.email.eq_ignore_ascii_case(e.trim()),
                        None => true,
                    })
                    .cloned()
                    .collect()
            })
            .await
    }

    pub async fn user_count(&self) -> usize {
        self.db.read(|tables| tables.users.len()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(username: &str, email: &str) -> CreateUser {
        CreateUser {
            username: username.to_string(),
            email: email.to_string(),
        }
    }

    #[tokio::test]
    async fn registered_user_can_be_looked_up() {
        let store = MemoryStore::new();
        let user = store
            .register_user(input("anna", "anna@campus.edu"), Role::Member)
            .await
            .unwrap();

        assert_eq!(user.id, UserId(1));
        assert_eq!(store.get_user(user.id).await.unwrap(), user);
    }

    #[tokio::test]
    async fn unknown_user_is_not_found() {
        let store = MemoryStore::new();
        assert_eq!(
            store.get_user(UserId(9)).await.unwrap_err(),
            DirectoryError::Store(StoreError::not_found(USERS, 9))
        );
    }

    #[tokio::test]
    async fn duplicate_username_or_email_is_taken() {
        let store = MemoryStore::new();
        store
            .register_user(input("anna", "anna@campus.edu"), Role::Member)
            .await
            .unwrap();

        let same_name = store
            .register_user(input("anna", "other@campus.edu"), Role::Member)
            .await;
        assert!(matches!(
            same_name,
            Err(DirectoryError::Taken { field: "username", .. })
        ));

        let same_email = store
            .register_user(input("anya", "ANNA@campus.edu"), Role::Member)
            .await;
        assert!(matches!(
            same_email,
            Err(DirectoryError::Taken { field: "email", .. })
        ));
        assert_eq!(store.user_count().await, 1);
    }

    #[tokio::test]
    async fn list_filters_by_email() {
        let store = MemoryStore::new();
        store
            .register_user(input("anna", "anna@campus.edu"), Role::Member)
            .await
            .unwrap();
        store
            .register_user(input("boris", "boris@campus.edu"), Role::Member)
            .await
            .unwrap();

        assert_eq!(store.list_users(None).await.len(), 2);
        let found = store.list_users(Some("boris@campus.edu")).await;
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].username, "boris");
    }
}
