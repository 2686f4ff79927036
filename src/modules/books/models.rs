use std::fmt;

use serde::{Deserialize, Serialize};

use crate::modules::users::models::UserId;
use crate::store::DirectoryError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookId(pub u64);

impl fmt::Display for BookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A book listed for exchange by its owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub id: BookId,
    pub title: String,
    pub author: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub owner_id: UserId,
    /// False once the book is promised through an accepted exchange.
    pub is_available: bool,
}

impl Book {
    pub fn is_owned_by(&self, user: UserId) -> bool {
        self.owner_id == user
    }
}

/// Request model for listing a new book; the owner is the acting user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBook {
    pub title: String,
    pub author: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl CreateBook {
    pub fn normalized(self) -> Result<Self, DirectoryError> {
        let title = self.title.trim().to_string();
        let author = self.author.trim().to_string();
        if title.is_empty() {
            return Err(DirectoryError::invalid("title", "must not be empty"));
        }
        if author.is_empty() {
            return Err(DirectoryError::invalid("author", "must not be empty"));
        }

        let description = self
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());

        Ok(Self {
            title,
            author,
            description,
        })
    }
}

/// Body of the owner's direct availability edit.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SetAvailability {
    pub is_available: bool,
}
