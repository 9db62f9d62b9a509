//! Persistence layer.
//!
//! Handlers and services only talk to [`Repository`]. Two implementations exist:
//! - [`postgres::PgRepository`]: PostgreSQL through sqlx, used in production
//! - [`memory::MemoryRepository`]: process-local tables, used when no database
//!   is configured and by the test suite
//!
//! Lookups by id (`find_store`, `find_review`) return logically deleted rows
//! too, so the mutation gate can decide. Every other read excludes them.
//!
//! Writes are conditional on the row still being live: a row deleted between
//! the gate's load and the write produces the entity's NotFound error.

pub mod memory;
pub mod postgres;

use std::collections::HashMap;

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    error::AppError,
    models::{
        pagination::{Page, PageRequest},
        review::{Review, ReviewFields},
        store::{Store, StoreFields},
    },
};

#[async_trait]
pub trait Repository: Send + Sync {
    /// Connectivity check for the health endpoint.
    ///
    /// Returns the storage status label: `"connected"` for a database,
    /// `"memory"` for the in-process tables.
    async fn ping(&self) -> Result<&'static str, AppError>;

    async fn insert_store(
        &self,
        fields: &StoreFields,
        edit_key_hash: &str,
    ) -> Result<Store, AppError>;

    async fn find_store(&self, id: Uuid) -> Result<Option<Store>, AppError>;

    /// Overwrite the editable columns and bump `updated_at`.
    async fn update_store(&self, id: Uuid, fields: &StoreFields) -> Result<Store, AppError>;

    async fn mark_store_deleted(&self, id: Uuid) -> Result<(), AppError>;

    /// Live stores, most recently updated first.
    ///
    /// `query` is a case-insensitive substring matched against name, address
    /// and genre.
    async fn search_stores(
        &self,
        query: Option<&str>,
        page: PageRequest,
    ) -> Result<Page<Store>, AppError>;

    /// Ratings of live reviews, grouped by store. Stores without reviews are absent.
    async fn live_ratings(&self, store_ids: &[Uuid]) -> Result<HashMap<Uuid, Vec<i32>>, AppError>;

    /// Insert a review for a live store and touch the store's `updated_at`,
    /// atomically.
    ///
    /// # Errors
    ///
    /// `StoreNotFound` if the store is absent or deleted.
    async fn insert_review(
        &self,
        store_id: Uuid,
        fields: &ReviewFields,
        edit_key_hash: &str,
    ) -> Result<Review, AppError>;

    async fn find_review(&self, id: Uuid) -> Result<Option<Review>, AppError>;

    /// Overwrite the editable columns and touch the owning store, atomically.
    async fn update_review(&self, id: Uuid, fields: &ReviewFields) -> Result<Review, AppError>;

    /// Flag the review deleted and touch the owning store, atomically.
    async fn mark_review_deleted(&self, id: Uuid) -> Result<(), AppError>;

    /// Live reviews of one store, newest first.
    async fn list_reviews(
        &self,
        store_id: Uuid,
        page: PageRequest,
    ) -> Result<Page<Review>, AppError>;

    /// Newest live reviews of live stores, paired with the store name.
    async fn recent_reviews(&self, limit: i64) -> Result<Vec<(Review, String)>, AppError>;
}

/// Escape `%`, `_` and `\` so user input is matched literally by `ILIKE`.
pub(crate) fn like_pattern(query: &str) -> String {
    let mut pattern = String::with_capacity(query.len() + 2);
    pattern.push('%');
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[cfg(test)]
mod tests {
    use super::like_pattern;

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("ramen"), "%ramen%");
        assert_eq!(like_pattern("100%_off"), "%100\\%\\_off%");
        assert_eq!(like_pattern("a\\b"), "%a\\\\b%");
    }
}
