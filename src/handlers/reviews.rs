//! Review HTTP handlers.
//!
//! - GET /api/stores/{id}/reviews - Live reviews of a store
//! - POST /api/stores/{id}/reviews - Post a review (returns the edit key once)
//! - GET /api/reviews - Newest reviews across all stores
//! - GET /api/reviews/{id} - A single review
//! - PATCH /api/reviews/{id} - Update a review (edit key required)
//! - DELETE /api/reviews/{id} - Logically delete a review (edit key required)

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
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::{
    error::AppError,
    models::{
        credentials::{self, KeyQuery},
        pagination::Paginated,
        review::{
            CreateReviewRequest, RecentReviewResponse, RecentReviewsParams, ReviewResponse,
            UpdateReviewRequest, UpdatedReviewResponse,
        },
    },
    services::review_service,
    state::AppState,
};

#[derive(Debug, Default, Deserialize)]
pub struct ListReviewsParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// List reviews of a store, newest first.
///
/// # Endpoint
///
/// `GET /api/stores/{id}/reviews?page=1&limit=10`
pub async fn list_reviews(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
    params: Result<Query<ListReviewsParams>, QueryRejection>,
) -> Result<Json<Paginated<ReviewResponse>>, AppError> {
    let Path(store_id) = path?;
    let Query(params) = params?;
    let page = state.page_request(params.page, params.limit);

    let reviews = review_service::list_reviews(state.repo.as_ref(), store_id, page).await?;

    Ok(Json(reviews))
}

/// Post a review.
///
/// # Request Body
///
/// ```json
/// {
///   "rating": 5,
///   "body": "Best tonkotsu in the neighbourhood.",
///   "authorName": "Ken",
///   "visitedAt": "2025-12-01"
/// }
/// ```
///
/// # Response
///
/// - **Success (201 Created)**: `{ "review": { ... }, "editKey": "..." }`
/// - **Error (400)**: Missing rating/body or a field out of range
/// - **Error (404)**: Store not found or deleted
pub async fn create_review(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<CreateReviewRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Path(store_id) = path?;
    let Json(request) = payload?;
    let created = review_service::create_review(state.repo.as_ref(), store_id, request).await?;

    Ok((StatusCode::CREATED, Json(created)))
}

/// Front page feed.
///
/// # Endpoint
///
/// `GET /api/reviews?limit=6`
///
/// # Response (200 OK)
///
/// ```json
/// {
///   "data": [
///     { "id": "...", "storeId": "...", "rating": 5, "storeName": "Menya Hoshi", "...": "..." }
///   ]
/// }
/// ```
pub async fn recent_reviews(
    State(state): State<AppState>,
    params: Result<Query<RecentReviewsParams>, QueryRejection>,
) -> Result<Json<serde_json::Value>, AppError> {
    let Query(params) = params?;
    let limit = params
        .limit
        .unwrap_or(review_service::RECENT_REVIEWS_DEFAULT)
        .clamp(1, state.config.max_page_size.max(1));

    let data: Vec<RecentReviewResponse> =
        review_service::recent_reviews(state.repo.as_ref(), limit).await?;

    Ok(Json(json!({ "data": data })))
}

pub async fn get_review(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<ReviewResponse>, AppError> {
    let Path(review_id) = path?;
    let review = review_service::get_review(state.repo.as_ref(), review_id).await?;

    Ok(Json(review))
}

/// Update a review.
///
/// # Endpoint
///
/// `PATCH /api/reviews/{id}`
///
/// Requires `editKey` in the body. Accepted fields: `rating`, `body`,
/// `authorName`, `visitedAt`.
pub async fn update_review(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<UpdateReviewRequest>, JsonRejection>,
) -> Result<Json<UpdatedReviewResponse>, AppError> {
    let Path(review_id) = path?;
    let Json(request) = payload?;
    let review = review_service::update_review(state.repo.as_ref(), review_id, request).await?;

    Ok(Json(UpdatedReviewResponse { review }))
}

/// Logically delete a review.
///
/// `DELETE /api/reviews/{id}?key=<edit key>`, or the key in a JSON body.
pub async fn delete_review(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
    query: Result<Query<KeyQuery>, QueryRejection>,
    body: Bytes,
) -> Result<Json<serde_json::Value>, AppError> {
    let Path(review_id) = path?;
    let Query(query) = query?;
    let key = credentials::supplied_key(query, &body);

    review_service::delete_review(state.repo.as_ref(), review_id, key.as_deref()).await?;

    Ok(Json(json!({ "message": "Review deleted" })))
}
