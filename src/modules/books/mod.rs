pub mod directory;
pub mod models;

use async_trait::async_trait;
use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use bookswap_http::{Actor, AppError, JsonBody, PathParam, QueryParams};
use bookswap_kernel::{InitCtx, Module};
use serde_json::json;

use crate::refresh::{Mutation, ReadModel};
use crate::state::AppState;
use directory::{BookDirectory, BookFilter};
use models::{Book, BookId, CreateBook, SetAvailability};

/// Book directory: listing books and the owner's availability edits
pub struct BooksModule {
    state: AppState,
}

impl BooksModule {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        "books"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        Router::new()
            .route("/", get(list_books).post(create_book))
            .route("/{id}", get(get_book))
            .route("/{id}/availability", put(set_availability))
            .with_state(self.state.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(json!({
            "paths": {
                "/": {
                    "get": {
                        "summary": "List books",
                        "tags": ["Books"],
                        "parameters": [
                            { "name": "owner_id", "in": "query", "required": false, "schema": { "type": "integer" } },
                            { "name": "available", "in": "query", "required": false, "schema": { "type": "boolean" } }
                        ],
                        "responses": {
                            "200": {
                                "description": "Books in listing order",
                                "content": {
                                    "application/json": {
                                        "schema": { "type": "array", "items": { "$ref": "#/components/schemas/Book" } }
                                    }
                                }
                            }
                        }
                    },
                    "post": {
                        "summary": "List a book owned by the acting user",
                        "tags": ["Books"],
                        "parameters": [
                            { "name": "x-user-id", "in": "header", "required": true, "schema": { "type": "integer" } }
                        ],
                        "requestBody": {
                            "required": true,
                            "content": {
                                "application/json": { "schema": { "$ref": "#/components/schemas/CreateBook" } }
                            }
                        },
                        "responses": {
                            "201": {
                                "description": "Listed book",
                                "content": {
                                    "application/json": { "schema": { "$ref": "#/components/schemas/Book" } }
                                }
                            },
                            "422": {
                                "description": "Missing title or author",
                                "content": {
                                    "application/json": { "schema": { "$ref": "#/components/schemas/ErrorResponse" } }
                                }
                            }
                        }
                    }
                },
                "/{id}": {
                    "get": {
                        "summary": "Get a book",
                        "tags": ["Books"],
                        "parameters": [
                            { "name": "id", "in": "path", "required": true, "schema": { "type": "integer" } }
                        ],
                        "responses": {
                            "200": {
                                "description": "Book",
                                "content": {
                                    "application/json": { "schema": { "$ref": "#/components/schemas/Book" } }
                                }
                            },
                            "404": {
                                "description": "Book not found",
                                "content": {
                                    "application/json": { "schema": { "$ref": "#/components/schemas/ErrorResponse" } }
                                }
                            }
                        }
                    }
                },
                "/{id}/availability": {
                    "put": {
                        "summary": "Owner's direct availability edit",
                        "tags": ["Books"],
                        "parameters": [
                            { "name": "id", "in": "path", "required": true, "schema": { "type": "integer" } },
                            { "name": "x-user-id", "in": "header", "required": true, "schema": { "type": "integer" } }
                        ],
                        "requestBody": {
                            "required": true,
                            "content": {
                                "application/json": {
                                    "schema": {
                                        "type": "object",
                                        "properties": { "is_available": { "type": "boolean" } },
                                        "required": ["is_available"]
                                    }
                                }
                            }
                        },
                        "responses": {
                            "200": {
                                "description": "Updated book",
                                "content": {
                                    "application/json": { "schema": { "$ref": "#/components/schemas/Book" } }
                                }
                            },
                            "403": {
                                "description": "Acting user does not own the book",
                                "content": {
                                    "application/json": { "schema": { "$ref": "#/components/schemas/ErrorResponse" } }
                                }
                            },
                            "409": {
                                "description": "Book has an accepted exchange and cannot be re-listed",
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
                    "Book": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "integer" },
                            "title": { "type": "string" },
                            "author": { "type": "string" },
                            "description": { "type": "string" },
                            "owner_id": { "type": "integer" },
                            "is_available": { "type": "boolean" }
                        },
                        "required": ["id", "title", "author", "owner_id", "is_available"]
                    },
                    "CreateBook": {
                        "type": "object",
                        "properties": {
                            "title": { "type": "string" },
                            "author": { "type": "string" },
                            "description": { "type": "string" }
                        },
                        "required": ["title", "author"]
                    }
                }
            }
        }))
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module stopped");
        Ok(())
    }
}

async fn list_books(
    State(state): State<AppState>,
    QueryParams(filter): QueryParams<BookFilter>,
) -> Json<Vec<Book>> {
    Json(state.store.list_books(&filter).await)
}

async fn create_book(
    State(state): State<AppState>,
    actor: Actor,
    JsonBody(input): JsonBody<CreateBook>,
) -> Result<(StatusCode, Json<Mutation<Book>>), AppError> {
    let owner = state.acting_user(actor).await?;
    let book = state.store.create_book(owner.id, input).await?;

    tracing::info!(book_id = %book.id, owner_id = %owner.id, "book listed");
    Ok((
        StatusCode::CREATED,
        Json(Mutation::new(book, &[ReadModel::Books])),
    ))
}

async fn get_book(
    State(state): State<AppState>,
    PathParam(id): PathParam<u64>,
) -> Result<Json<Book>, AppError> {
    Ok(Json(state.store.get_book(BookId(id)).await?))
}

async fn set_availability(
    State(state): State<AppState>,
    actor: Actor,
    PathParam(id): PathParam<u64>,
    JsonBody(body): JsonBody<SetAvailability>,
) -> Result<Json<Mutation<Book>>, AppError> {
    let owner = state.acting_user(actor).await?;
    let id = BookId(id);
    let book = state.store.get_book(id).await?;
    if !book.is_owned_by(owner.id) {
        return Err(AppError::forbidden(format!(
            "user {} does not own book {}",
            owner.id, id
        )));
    }

    state.store.set_availability(id, body.is_available).await?;
    let book = state.store.get_book(id).await?;

    tracing::info!(book_id = %id, is_available = body.is_available, "book availability edited by owner");
    Ok(Json(Mutation::new(book, &[ReadModel::Books])))
}

/// Create a new instance of the books module
pub fn create_module(state: AppState) -> std::sync::Arc<dyn Module> {
    std::sync::Arc::new(BooksModule::new(state))
}
