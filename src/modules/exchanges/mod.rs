pub mod error;
pub mod ledger;
pub mod lifecycle;
pub mod models;
pub mod places;
pub mod workflow;

use async_trait::async_trait;
use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use bookswap_http::{Actor, AppError, JsonBody, PathParam, QueryParams};
use bookswap_kernel::{InitCtx, Module};
use serde::Deserialize;
use serde_json::json;

use crate::refresh::Mutation;
use crate::state::AppState;
use models::{
    CreateExchange, ExchangeId, ExchangeRequest, ExchangeStatus, ExchangeView, ResolveExchange,
};
use workflow::{AFTER_CREATE, AFTER_RESOLVE};

/// Exchange requests between book owners
pub struct ExchangesModule {
    state: AppState,
}

impl ExchangesModule {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

#[async_trait]
impl Module for ExchangesModule {
    fn name(&self) -> &'static str {
        "exchanges"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            places = self.state.exchanges.places().as_slice().len(),
            sibling_policy = ?ctx.settings.exchange.sibling_policy,
            "exchanges module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        Router::new()
            .route("/", post(create_exchange))
            .route("/places", get(list_places))
            .route("/outgoing", get(list_outgoing))
            .route("/incoming", get(list_incoming))
            .route("/{id}", get(get_exchange).put(resolve_exchange))
            .with_state(self.state.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        let actor = json!({ "name": "x-user-id", "in": "header", "required": true, "schema": { "type": "integer" } });
        let status = json!({
            "name": "status", "in": "query", "required": false,
            "schema": { "type": "string", "enum": ["pending", "accepted", "rejected"] }
        });
        let id = json!({ "name": "id", "in": "path", "required": true, "schema": { "type": "integer" } });
        let error = json!({
            "description": "Error envelope with a machine-readable code",
            "content": { "application/json": { "schema": { "$ref": "#/components/schemas/ErrorResponse" } } }
        });
        let views = json!({
            "description": "Exchange requests in creation order",
            "content": {
                "application/json": {
                    "schema": { "type": "array", "items": { "$ref": "#/components/schemas/ExchangeView" } }
                }
            }
        });

        Some(json!({
            "paths": {
                "/": {
                    "post": {
                        "summary": "Request a book in exchange for one of your own",
                        "tags": ["Exchanges"],
                        "parameters": [actor],
                        "requestBody": {
                            "required": true,
                            "content": {
                                "application/json": { "schema": { "$ref": "#/components/schemas/CreateExchange" } }
                            }
                        },
                        "responses": {
                            "201": {
                                "description": "Pending request plus the read models to refresh",
                                "content": {
                                    "application/json": { "schema": { "$ref": "#/components/schemas/ExchangeRequest" } }
                                }
                            },
                            "404": error,
                            "409": error,
                            "422": error
                        }
                    }
                },
                "/places": {
                    "get": {
                        "summary": "Places an exchange can be arranged at",
                        "tags": ["Exchanges"],
                        "responses": {
                            "200": {
                                "description": "Configured places; the first is the default",
                                "content": {
                                    "application/json": { "schema": { "type": "array", "items": { "type": "string" } } }
                                }
                            }
                        }
                    }
                },
                "/outgoing": {
                    "get": {
                        "summary": "Requests sent by the acting user",
                        "tags": ["Exchanges"],
                        "parameters": [actor, status],
                        "responses": { "200": views }
                    }
                },
                "/incoming": {
                    "get": {
                        "summary": "Requests for books the acting user owns",
                        "tags": ["Exchanges"],
                        "parameters": [actor, status],
                        "responses": { "200": views }
                    }
                },
                "/{id}": {
                    "get": {
                        "summary": "One request, for its participants",
                        "tags": ["Exchanges"],
                        "parameters": [id, actor],
                        "responses": {
                            "200": {
                                "description": "Exchange request",
                                "content": {
                                    "application/json": { "schema": { "$ref": "#/components/schemas/ExchangeView" } }
                                }
                            },
                            "403": error,
                            "404": error
                        }
                    },
                    "put": {
                        "summary": "Accept or reject a pending request",
                        "tags": ["Exchanges"],
                        "parameters": [id, actor],
                        "requestBody": {
                            "required": true,
                            "content": {
                                "application/json": {
                                    "schema": {
                                        "type": "object",
                                        "properties": { "action": { "type": "string", "enum": ["accept", "reject"] } },
                                        "required": ["action"]
                                    }
                                }
                            }
                        },
                        "responses": {
                            "200": {
                                "description": "Resolved request plus the read models to refresh",
                                "content": {
                                    "application/json": { "schema": { "$ref": "#/components/schemas/ExchangeRequest" } }
                                }
                            },
                            "403": error,
                            "404": error,
                            "409": error
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "ExchangeRequest": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "integer" },
                            "requester_id": { "type": "integer" },
                            "book_id": { "type": "integer" },
                            "offered_book_id": { "type": "integer" },
                            "place": { "type": "string" },
                            "status": { "type": "string", "enum": ["pending", "accepted", "rejected"] },
                            "created_at": { "type": "string", "format": "date-time" }
                        },
                        "required": ["id", "requester_id", "book_id", "offered_book_id", "place", "status", "created_at"]
                    },
                    "ExchangeView": {
                        "allOf": [
                            { "$ref": "#/components/schemas/ExchangeRequest" },
                            {
                                "type": "object",
                                "properties": {
                                    "book_title": { "type": "string" },
                                    "offered_book_title": { "type": "string" },
                                    "status_label": { "type": "string" },
                                    "book_available": { "type": "boolean" }
                                }
                            }
                        ]
                    },
                    "CreateExchange": {
                        "type": "object",
                        "properties": {
                            "book_id": { "type": "integer" },
                            "offered_book_id": { "type": "integer" },
                            "place": { "type": "string" }
                        },
                        "required": ["book_id", "offered_book_id", "place"]
                    }
                }
            }
        }))
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "exchanges module stopped");
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct StatusQuery {
    status: Option<ExchangeStatus>,
}

async fn create_exchange(
    State(state): State<AppState>,
    actor: Actor,
    JsonBody(input): JsonBody<CreateExchange>,
) -> Result<(StatusCode, Json<Mutation<ExchangeRequest>>), AppError> {
    let requester = state.acting_user(actor).await?;
    let request = state.exchanges.create_request(requester.id, input).await?;

    Ok((
        StatusCode::CREATED,
        Json(Mutation::new(request, AFTER_CREATE)),
    ))
}

async fn list_places(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.exchanges.places().as_slice().to_vec())
}

async fn list_outgoing(
    State(state): State<AppState>,
    actor: Actor,
    QueryParams(query): QueryParams<StatusQuery>,
) -> Result<Json<Vec<ExchangeView>>, AppError> {
    let user = state.acting_user(actor).await?;
    Ok(Json(
        state
            .exchanges
            .list_by_requester(user.id, query.status)
            .await?,
    ))
}

async fn list_incoming(
    State(state): State<AppState>,
    actor: Actor,
    QueryParams(query): QueryParams<StatusQuery>,
) -> Result<Json<Vec<ExchangeView>>, AppError> {
    let user = state.acting_user(actor).await?;
    Ok(Json(
        state.exchanges.list_by_owner(user.id, query.status).await?,
    ))
}

async fn get_exchange(
    State(state): State<AppState>,
    actor: Actor,
    PathParam(id): PathParam<u64>,
) -> Result<Json<ExchangeView>, AppError> {
    let user = state.acting_user(actor).await?;
    Ok(Json(state.exchanges.get_view(ExchangeId(id), user.id).await?))
}

async fn resolve_exchange(
    State(state): State<AppState>,
    actor: Actor,
    PathParam(id): PathParam<u64>,
    JsonBody(body): JsonBody<ResolveExchange>,
) -> Result<Json<Mutation<ExchangeRequest>>, AppError> {
    let owner = state.acting_user(actor).await?;
    let request = state
        .exchanges
        .resolve(ExchangeId(id), body.action, owner.id)
        .await?;

    Ok(Json(Mutation::new(request, AFTER_RESOLVE)))
}

/// Create a new instance of the exchanges module
pub fn create_module(state: AppState) -> std::sync::Arc<dyn Module> {
    std::sync::Arc::new(ExchangesModule::new(state))
}
