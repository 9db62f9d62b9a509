//! Store HTTP handlers.
//!
//! This module implements the store-related API endpoints:
//! - POST /api/stores - Register a store (returns the edit key once)
//! - GET /api/stores - Search and paginate live stores
//! - GET /api/stores/{id} - Store details with review statistics
//! - PATCH /api/stores/{id} - Update a store (edit key required)
//! - DELETE /api/stores/{id} - Logically delete a store (edit key required)

use axum::{
    Json,
    body::Bytes,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use uuid::Uuid;

use crate::{
    error::AppError,
    models::{
        credentials::{self, KeyQuery},
        pagination::Paginated,
        store::{
            CreateStoreRequest, ListStoresParams, StoreSummary, UpdateStoreRequest,
            UpdatedStoreResponse,
        },
    },
    services::store_service,
    state::AppState,
};

/// Register a new store.
///
/// # Endpoint
///
/// `POST /api/stores`
///
/// # Request Body
///
/// ```json
/// {
///   "name": "Menya Hoshi",
///   "address": "1-2-3 Shibuya, Tokyo",
///   "genre": "Ramen"
/// }
/// ```
///
/// # Response
///
/// - **Success (201 Created)**: The store and its plaintext edit key
/// - **Error (400)**: Missing name/address or invalid field
///
/// ```json
/// {
///   "store": { "id": "550e8400-...", "name": "Menya Hoshi", "...": "..." },
///   "editKey": "9f86d081884c7d659a2feaa0c55ad015"
/// }
/// ```
///
/// The key is never returned again; losing it means losing edit rights.
pub async fn create_store(
    State(state): State<AppState>,
    payload: Result<Json<CreateStoreRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(request) = payload?;
    let created = store_service::create_store(state.repo.as_ref(), request).await?;

    Ok((StatusCode::CREATED, Json(created)))
}

/// List live stores.
///
/// # Endpoint
///
/// `GET /api/stores?page=1&limit=10&query=ramen`
///
/// `query` is matched case-insensitively against name, address and genre.
/// Stores are ordered by most recent activity (`updatedAt` descending).
pub async fn list_stores(
    State(state): State<AppState>,
    params: Result<Query<ListStoresParams>, QueryRejection>,
) -> Result<Json<Paginated<StoreSummary>>, AppError> {
    let Query(params) = params?;
    let page = state.page_request(params.page, params.limit);

    let stores =
        store_service::list_stores(state.repo.as_ref(), params.query.as_deref(), page).await?;

    Ok(Json(stores))
}

/// Get a store with `reviewCount` and `averageRating`.
///
/// # Response
///
/// - **Success (200 OK)**: Store details
/// - **Error (404)**: Store not found or deleted
pub async fn get_store(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<StoreSummary>, AppError> {
    let Path(store_id) = path?;
    let store = store_service::get_store(state.repo.as_ref(), store_id).await?;

    Ok(Json(store))
}

/// Update a store.
///
/// # Endpoint
///
/// `PATCH /api/stores/{id}`
///
/// # Request Body
///
/// ```json
/// {
///   "editKey": "9f86d081884c7d659a2feaa0c55ad015",
///   "businessHours": "11:00-15:00, 18:00-22:00"
/// }
/// ```
///
/// # Response
///
/// - **Success (200 OK)**: `{ "store": { ... } }`
/// - **Error (403)**: Edit key missing (`key_required`) or wrong (`invalid_key`)
/// - **Error (404)**: Store not found or deleted
pub async fn update_store(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<UpdateStoreRequest>, JsonRejection>,
) -> Result<Json<UpdatedStoreResponse>, AppError> {
    let Path(store_id) = path?;
    let Json(request) = payload?;
    let store = store_service::update_store(state.repo.as_ref(), store_id, request).await?;

    Ok(Json(UpdatedStoreResponse { store }))
}

/// Logically delete a store.
///
/// # Endpoint
///
/// `DELETE /api/stores/{id}?key=<edit key>`
///
/// The key may also be sent in a JSON body as `key` or `editKey`.
pub async fn delete_store(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
    query: Result<Query<KeyQuery>, QueryRejection>,
    body: Bytes,
) -> Result<Json<serde_json::Value>, AppError> {
    let Path(store_id) = path?;
    let Query(query) = query?;
    let key = credentials::supplied_key(query, &body);

    store_service::delete_store(state.repo.as_ref(), store_id, key.as_deref()).await?;

    Ok(Json(json!({ "message": "Store deleted" })))
}
