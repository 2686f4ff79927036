use std::fmt;

use bookswap_authz::{Role, Subject};
use serde::{Deserialize, Serialize};

use crate::store::DirectoryError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub u64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A registered user. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub role: Role,
}

impl Subject for User {
    fn subject_id(&self) -> u64 {
        self.id.0
    }

    fn role(&self) -> Role {
        self.role
    }
}

/// Registration payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    pub username: String,
    pub email: String,
}

impl CreateUser {
    /// Trim both fields and check they are usable.
    pub fn normalized(self) -> Result<Self, DirectoryError> {
        let username = self.username.trim().to_string();
        let email = self.email.trim().to_string();

        if username.is_empty() {
            return Err(DirectoryError::invalid("username", "must not be empty"));
        }
        let Some((local, domain)) = email.split_once('@') else {
            return Err(DirectoryError::invalid("email", "must contain '@'"));
        };
        if local.is_empty() || domain.is_empty() {
            return Err(DirectoryError::invalid("email", "must look like name@domain"));
        }

        Ok(Self { username, email })
    }
}
