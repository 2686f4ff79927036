use std::collections::HashSet;
use std::sync::Arc;

use anyhow::Context;
use bookswap_authz::Role;
use bookswap_http::{Actor, AppError};
use bookswap_kernel::settings::Settings;

use crate::modules::exchanges::lifecycle::ExchangeService;
use crate::modules::exchanges::places::PlaceCatalog;
use crate::modules::users::directory::UserDirectory;
use crate::modules::users::models::{User, UserId};
use crate::store::MemoryStore;

/// Shared handles every module's handlers work against.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<MemoryStore>,
    pub exchanges: Arc<ExchangeService>,
    admin_emails: Arc<HashSet<String>>,
}

impl AppState {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let store = Arc::new(MemoryStore::new());
        let places = PlaceCatalog::new(settings.exchange.places.clone())
            .context("invalid exchange place configuration")?;

        let exchanges = ExchangeService::new(
            store.clone(),
            store.clone(),
            store.clone(),
            places,
            settings.exchange.sibling_policy,
        );

        Ok(Self {
            store,
            exchanges: Arc::new(exchanges),
            admin_emails: Arc::new(
                settings
                    .auth
                    .admin_emails
                    .iter()
                    .map(|email| email.trim().to_ascii_lowercase())
                    .collect(),
            ),
        })
    }

    /// Role assigned at registration.
    pub fn role_for(&self, email: &str) -> Role {
        if self.admin_emails.contains(&email.trim().to_ascii_lowercase()) {
            Role::Admin
        } else {
            Role::Member
        }
    }

    /// Resolve the acting user's record; unknown ids are unauthorized.
    pub async fn acting_user(&self, actor: Actor) -> Result<User, AppError> {
        self.store
            .get_user(UserId(actor.0))
            .await
            .map_err(|_| AppError::unauthorized(format!("unknown user {}", actor.0)))
    }
}
