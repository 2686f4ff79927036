use async_trait::async_trait;
use axum::{extract::State, routing::get, Json, Router};
use bookswap_authz::{require, AuthzError, Capability};
use bookswap_http::{Actor, AppError};
use bookswap_kernel::{InitCtx, Module};
use serde::Serialize;
use serde_json::json;

use crate::modules::exchanges::models::{ExchangeStatus, ExchangeView};
use crate::modules::exchanges::ledger::{ExchangeFilter, ExchangeLedger};
use crate::state::AppState;

/// Read-only moderation views, gated by role
pub struct AdminModule {
    state: AppState,
}

impl AdminModule {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

#[async_trait]
impl Module for AdminModule {
    fn name(&self) -> &'static str {
        "admin"
    }

    async fn init(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "admin module initialized");
        Ok(())
    }

    fn routes(&self) -> Router {
        Router::new()
            .route("/stats", get(stats))
            .route("/exchanges", get(accepted_exchanges))
            .with_state(self.state.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        let actor = json!({ "name": "x-user-id", "in": "header", "required": true, "schema": { "type": "integer" } });
        let forbidden = json!({
            "description": "Acting user is not an administrator",
            "content": { "application/json": { "schema": { "$ref": "#/components/schemas/ErrorResponse" } } }
        });

        Some(json!({
            "paths": {
                "/stats": {
                    "get": {
                        "summary": "Service-wide counters",
                        "tags": ["Admin"],
                        "parameters": [actor],
                        "responses": {
                            "200": {
                                "description": "Counts of users, books, and completed exchanges",
                                "content": {
                                    "application/json": { "schema": { "$ref": "#/components/schemas/Stats" } }
                                }
                            },
                            "403": forbidden
                        }
                    }
                },
                "/exchanges": {
                    "get": {
                        "summary": "Every completed exchange",
                        "tags": ["Admin"],
                        "parameters": [actor],
                        "responses": {
                            "200": {
                                "description": "Accepted requests in creation order",
                                "content": {
                                    "application/json": {
                                        "schema": { "type": "array", "items": { "$ref": "#/components/schemas/ExchangeView" } }
                                    }
                                }
                            },
                            "403": forbidden
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "Stats": {
                        "type": "object",
                        "properties": {
                            "users": { "type": "integer" },
                            "books": { "type": "integer" },
                            "exchanges": { "type": "integer" }
                        },
                        "required": ["users", "books", "exchanges"]
                    }
                }
            }
        }))
    }
}

#[derive(Debug, Serialize)]
struct Stats {
    users: usize,
    books: usize,
    /// Accepted exchanges only.
    exchanges: usize,
}

fn denied(err: AuthzError) -> AppError {
    AppError::forbidden(err.to_string())
}

async fn stats(State(state): State<AppState>, actor: Actor) -> Result<Json<Stats>, AppError> {
    let user = state.acting_user(actor).await?;
    require(&user, Capability::ViewStatistics).map_err(denied)?;

    let accepted = state
        .store
        .list(&ExchangeFilter {
            status: Some(ExchangeStatus::Accepted),
            ..ExchangeFilter::default()
        })
        .await?;

    Ok(Json(Stats {
        users: state.store.user_count().await,
        books: state.store.book_count().await,
        exchanges: accepted.len(),
    }))
}

async fn accepted_exchanges(
    State(state): State<AppState>,
    actor: Actor,
) -> Result<Json<Vec<ExchangeView>>, AppError> {
    let user = state.acting_user(actor).await?;
    require(&user, Capability::ViewAllExchanges).map_err(denied)?;

    Ok(Json(
        state
            .exchanges
            .list_by_status(ExchangeStatus::Accepted)
            .await?,
    ))
}

/// Create a new instance of the admin module
pub fn create_module(state: AppState) -> std::sync::Arc<dyn Module> {
    std::sync::Arc::new(AdminModule::new(state))
}
