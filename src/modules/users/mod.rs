pub mod directory;
pub mod models;

use async_trait::async_trait;
use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Json, Router,
};
use bookswap_http::{AppError, JsonBody, PathParam, QueryParams};
use bookswap_kernel::{InitCtx, Module};
use serde::Deserialize;
use serde_json::json;

use crate::state::AppState;
use directory::UserDirectory;
use models::{CreateUser, User, UserId};

/// User directory: registration and identity lookup
pub struct UsersModule {
    state: AppState,
}

impl UsersModule {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

#[async_trait]
impl Module for UsersModule {
    fn name(&self) -> &'static str {
        "users"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            admin_emails = ctx.settings.auth.admin_emails.len(),
            "users module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        Router::new()
            .route("/", get(list_users).post(register_user))
            .route("/{id}", get(get_user))
            .with_state(self.state.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(json!({
            "paths": {
                "/": {
                    "get": {
                        "summary": "List users, optionally by e-mail",
                        "tags": ["Users"],
                        "parameters": [
                            { "name": "email", "in": "query", "required": false, "schema": { "type": "string" } }
                        ],
                        "responses": {
                            "200": {
                                "description": "Users in registration order",
                                "content": {
                                    "application/json": {
                                        "schema": { "type": "array", "items": { "$ref": "#/components/schemas/User" } }
                                    }
                                }
                            }
                        }
                    },
                    "post": {
                        "summary": "Register a user",
                        "tags": ["Users"],
                        "requestBody": {
                            "required": true,
                            "content": {
                                "application/json": { "schema": { "$ref": "#/components/schemas/CreateUser" } }
                            }
                        },
                        "responses": {
                            "201": {
                                "description": "Registered user",
                                "content": {
                                    "application/json": { "schema": { "$ref": "#/components/schemas/User" } }
                                }
                            },
                            "409": {
                                "description": "Username or e-mail already taken",
                                "content": {
                                    "application/json": { "schema": { "$ref": "#/components/schemas/ErrorResponse" } }
                                }
                            },
                            "422": {
                                "description": "Blank username or malformed e-mail",
                                "content": {
                                    "application/json": { "schema": { "$ref": "#/components/schemas/ErrorResponse" } }
                                }
                            }
                        }
                    }
                },
                "/{id}": {
                    "get": {
                        "summary": "Get a user",
                        "tags": ["Users"],
                        "parameters": [
                            { "name": "id", "in": "path", "required": true, "schema": { "type": "integer" } }
                        ],
                        "responses": {
                            "200": {
                                "description": "User",
                                "content": {
                                    "application/json": { "schema": { "$ref": "#/components/schemas/User" } }
                                }
                            },
                            "404": {
                                "description": "User not found",
                                "content": {
                                    "application/json": { "schema": { "$ref": "#/components/schemas/ErrorResponse" } }
                                }
                            }
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "User": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "integer" },
                            "username": { "type": "string" },
                            "email": { "type": "string", "format": "email" },
                            "role": { "type": "string", "enum": ["member", "admin"] }
                        },
                        "required": ["id", "username", "email", "role"]
                    },
                    "CreateUser": {
                        "type": "object",
                        "properties": {
                            "username": { "type": "string" },
                            "email": { "type": "string", "format": "email" }
                        },
                        "required": ["username", "email"]
                    }
                }
            }
        }))
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "users module stopped");
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct UserQuery {
    email: Option<String>,
}

async fn list_users(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<UserQuery>,
) -> Json<Vec<User>> {
    Json(state.store.list_users(query.email.as_deref()).await)
}

async fn register_user(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<CreateUser>,
) -> Result<(StatusCode, Json<User>), AppError> {
    let role = state.role_for(&input.email);
    let user = state.store.register_user(input, role).await?;

    tracing::info!(user_id = %user.id, role = ?user.role, "user registered");
    Ok((StatusCode::CREATED, Json(user)))
}

async fn get_user(
    State(state): State<AppState>,
    PathParam(id): PathParam<u64>,
) -> Result<Json<User>, AppError> {
    Ok(Json(state.store.get_user(UserId(id)).await?))
}

/// Create a new instance of the users module
pub fn create_module(state: AppState) -> std::sync::Arc<dyn Module> {
    std::sync::Arc::new(UsersModule::new(state))
}
