//! Review service.
//!
//! Same ownership model as stores: a review gets its own edit key on creation
//! and every update or delete is gated on it. Each review write also bumps the
//! owning store's `updated_at`; the repository does both in one unit of work.

use uuid::Uuid;

use crate::{
    error::AppError,
    models::{
        pagination::{PageRequest, Paginated, Pagination},
        review::{
            CreateReviewRequest, CreatedReviewResponse, RecentReviewResponse, ReviewResponse,
            UpdateReviewRequest,
        },
    },
    repository::Repository,
    services::{edit_key, gate},
};

/// Default number of reviews on the front page feed.
pub const RECENT_REVIEWS_DEFAULT: i64 = 6;

/// Post a review for a live store.
///
/// # Errors
///
/// - `Validation`: Missing rating/body or a field out of range
/// - `StoreNotFound`: Store doesn't exist or was deleted
pub async fn create_review(
    repo: &dyn Repository,
    store_id: Uuid,
    request: CreateReviewRequest,
) -> Result<CreatedReviewResponse, AppError> {
    let fields = request.into_fields()?;
    let key = edit_key::issue_key();

    let review = repo.insert_review(store_id, &fields, &key.digest).await?;
    tracing::info!(review_id = %review.id, store_id = %store_id, "Review posted");

    Ok(CreatedReviewResponse {
        review: review.into(),
        edit_key: key.plaintext,
    })
}

pub async fn get_review(
    repo: &dyn Repository,
    review_id: Uuid,
) -> Result<ReviewResponse, AppError> {
    repo.find_review(review_id)
        .await?
        .filter(|review| !review.is_deleted)
        .map(Into::into)
        .ok_or(AppError::ReviewNotFound)
}

/// Live reviews of one store, newest first.
pub async fn list_reviews(
    repo: &dyn Repository,
    store_id: Uuid,
    page: PageRequest,
) -> Result<Paginated<ReviewResponse>, AppError> {
    let result = repo.list_reviews(store_id, page).await?;

    Ok(Paginated {
        data: result.items.into_iter().map(Into::into).collect(),
        pagination: Pagination::new(result.total, page),
    })
}

/// Newest reviews across all live stores.
pub async fn recent_reviews(
    repo: &dyn Repository,
    limit: i64,
) -> Result<Vec<RecentReviewResponse>, AppError> {
    let rows = repo.recent_reviews(limit).await?;

    Ok(rows
        .into_iter()
        .map(|(review, store_name)| RecentReviewResponse {
            review: review.into(),
            store_name,
        })
        .collect())
}

pub async fn update_review(
    repo: &dyn Repository,
    review_id: Uuid,
    request: UpdateReviewRequest,
) -> Result<ReviewResponse, AppError> {
    let loaded = repo.find_review(review_id).await?;
    let review = gate::authorize(loaded, request.edit_key.as_deref())?;

    let fields = request.apply_to(&review.fields)?;
    let updated = repo.update_review(review.id, &fields).await?;
    tracing::info!(review_id = %updated.id, store_id = %updated.store_id, "Review updated");

    Ok(updated.into())
}

pub async fn delete_review(
    repo: &dyn Repository,
    review_id: Uuid,
    key: Option<&str>,
) -> Result<(), AppError> {
    let loaded = repo.find_review(review_id).await?;
    let review = gate::authorize(loaded, key)?;

    repo.mark_review_deleted(review.id).await?;
    tracing::info!(review_id = %review.id, store_id = %review.store_id, "Review deleted");

    Ok(())
}
