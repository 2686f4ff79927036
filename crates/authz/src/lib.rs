//! Role-based capability checks.
//!
//! Roles are an attribute stored on the user record. Call sites ask whether a
//! [`Subject`] holds a [`Capability`] instead of comparing identities inline.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Member,
    Admin,
}

/// Actions gated by role rather than by resource ownership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Read service-wide counters.
    ViewStatistics,
    /// Read every exchange regardless of participant.
    ViewAllExchanges,
}

impl Capability {
    pub fn as_str(self) -> &'static str {
        match self {
            Capability::ViewStatistics => "view_statistics",
            Capability::ViewAllExchanges => "view_all_exchanges",
        }
    }
}

impl Role {
    pub fn grants(self, capability: Capability) -> bool {
        match self {
            Role::Admin => true,
            Role::Member => match capability {
                Capability::ViewStatistics | Capability::ViewAllExchanges => false,
            },
        }
    }
}

/// Anything that can act: carries an id and a role.
pub trait Subject {
    fn subject_id(&self) -> u64;
    fn role(&self) -> Role;
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("subject {subject} lacks capability {}", capability.as_str())]
    Denied {
        subject: u64,
        capability: Capability,
    },
}

/// Fail with [`AuthzError::Denied`] unless the subject's role grants `capability`.
pub fn require<S: Subject + ?Sized>(subject: &S, capability: Capability) -> Result<(), AuthzError> {
    if subject.role().grants(capability) {
        return Ok(());
    }

    tracing::warn!(
        target: "bookswap-authz",
        subject = subject.subject_id(),
        capability = capability.as_str(),
        "capability denied"
    );
    Err(AuthzError::Denied {
        subject: subject.subject_id(),
        capability,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Person(u64, Role);

    impl Subject for Person {
        fn subject_id(&self) -> u64 {
            self.0
        }

        fn role(&self) -> Role {
            self.1
        }
    }

    #[test]
    fn admin_holds_every_capability() {
        let admin = Person(1, Role::Admin);
        assert!(require(&admin, Capability::ViewStatistics).is_ok());
        assert!(require(&admin, Capability::ViewAllExchanges).is_ok());
    }

    #[test]
    fn member_is_denied_admin_capabilities() {
        let member = Person(7, Role::Member);
        let err = require(&member, Capability::ViewStatistics).unwrap_err();

        assert_eq!(
            err,
            AuthzError::Denied {
                subject: 7,
                capability: Capability::ViewStatistics
            }
        );
        assert_eq!(err.to_string(), "subject 7 lacks capability view_statistics");
    }

    #[test]
    fn role_defaults_to_member_and_serializes_lowercase() {
        assert_eq!(Role::default(), Role::Member);
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"admin\"");
    }
}
