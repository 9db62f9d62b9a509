//! In-memory repository.
//!
//! Both tables sit behind one `RwLock`, so a review write and the touch of its
//! store happen under the same write guard. Search folds case with
//! `str::to_lowercase`, which lines up with `ILIKE` in the Postgres backend.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    error::AppError,
    models::{
        pagination::{Page, PageRequest},
        review::{Review, ReviewFields},
        store::{Store, StoreFields},
    },
    repository::Repository,
};

#[derive(Default)]
struct Tables {
    stores: HashMap<Uuid, Store>,
    reviews: HashMap<Uuid, Review>,
}

impl Tables {
    fn live_store_mut(&mut self, id: Uuid) -> Option<&mut Store> {
        self.stores.get_mut(&id).filter(|store| !store.is_deleted)
    }

    fn live_review_mut(&mut self, id: Uuid) -> Option<&mut Review> {
        self.reviews.get_mut(&id).filter(|review| !review.is_deleted)
    }

    fn touch_store(&mut self, id: Uuid) {
        if let Some(store) = self.stores.get_mut(&id) {
            store.updated_at = Utc::now();
        }
    }
}

#[derive(Default)]
pub struct MemoryRepository {
    tables: RwLock<Tables>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn matches_query(store: &Store, needle: &str) -> bool {
    let fields = &store.fields;
    [Some(&fields.name), Some(&fields.address), fields.genre.as_ref()]
        .into_iter()
        .flatten()
        .any(|value| value.to_lowercase().contains(needle))
}

fn paginate<T: Clone>(rows: &[T], page: PageRequest) -> Vec<T> {
    rows.iter()
        .skip(usize::try_from(page.offset()).unwrap_or(usize::MAX))
        .take(usize::try_from(page.limit).unwrap_or(0))
        .cloned()
        .collect()
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn ping(&self) -> Result<&'static str, AppError> {
        Ok("memory")
    }

    async fn insert_store(
        &self,
        fields: &StoreFields,
        edit_key_hash: &str,
    ) -> Result<Store, AppError> {
        let now = Utc::now();
        let store = Store {
            id: Uuid::new_v4(),
            fields: fields.clone(),
            edit_key_hash: edit_key_hash.to_string(),
            is_deleted: false,
            created_at: now,
            updated_at: now,
        };

        let mut tables = self.tables.write().await;
        tables.stores.insert(store.id, store.clone());

        Ok(store)
    }

    async fn find_store(&self, id: Uuid) -> Result<Option<Store>, AppError> {
        Ok(self.tables.read().await.stores.get(&id).cloned())
    }

    async fn update_store(&self, id: Uuid, fields: &StoreFields) -> Result<Store, AppError> {
        let mut tables = self.tables.write().await;
        let store = tables.live_store_mut(id).ok_or(AppError::StoreNotFound)?;

        store.fields = fields.clone();
        store.updated_at = Utc::now();

        Ok(store.clone())
    }

    async fn mark_store_deleted(&self, id: Uuid) -> Result<(), AppError> {
        let mut tables = self.tables.write().await;
        let store = tables.live_store_mut(id).ok_or(AppError::StoreNotFound)?;

        store.is_deleted = true;
        store.updated_at = Utc::now();

        Ok(())
    }

    async fn search_stores(
        &self,
        query: Option<&str>,
        page: PageRequest,
    ) -> Result<Page<Store>, AppError> {
        let needle = query.map(str::to_lowercase);
        let tables = self.tables.read().await;

        let mut rows: Vec<&Store> = tables
            .stores
            .values()
            .filter(|store| !store.is_deleted)
            .filter(|store| needle.as_deref().is_none_or(|n| matches_query(store, n)))
            .collect();
        rows.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then(a.id.cmp(&b.id)));

        Ok(Page {
            total: rows.len() as i64,
            items: paginate(&rows, page).into_iter().cloned().collect(),
        })
    }

    async fn live_ratings(&self, store_ids: &[Uuid]) -> Result<HashMap<Uuid, Vec<i32>>, AppError> {
        let tables = self.tables.read().await;

        let mut grouped: HashMap<Uuid, Vec<i32>> = HashMap::new();
        for review in tables.reviews.values() {
            if !review.is_deleted && store_ids.contains(&review.store_id) {
                grouped
                    .entry(review.store_id)
                    .or_default()
                    .push(review.fields.rating);
            }
        }

        Ok(grouped)
    }

    async fn insert_review(
        &self,
        store_id: Uuid,
        fields: &ReviewFields,
        edit_key_hash: &str,
    ) -> Result<Review, AppError> {
        let mut tables = self.tables.write().await;
        if tables.live_store_mut(store_id).is_none() {
            return Err(AppError::StoreNotFound);
        }

        let now = Utc::now();
        let review = Review {
            id: Uuid::new_v4(),
            store_id,
            fields: fields.clone(),
            edit_key_hash: edit_key_hash.to_string(),
            is_deleted: false,
            created_at: now,
            updated_at: now,
        };

        tables.reviews.insert(review.id, review.clone());
        tables.touch_store(store_id);

        Ok(review)
    }

    async fn find_review(&self, id: Uuid) -> Result<Option<Review>, AppError> {
        Ok(self.tables.read().await.reviews.get(&id).cloned())
    }

    async fn update_review(&self, id: Uuid, fields: &ReviewFields) -> Result<Review, AppError> {
        let mut tables = self.tables.write().await;
        let review = tables.live_review_mut(id).ok_or(AppError::ReviewNotFound)?;

        review.fields = fields.clone();
        review.updated_at = Utc::now();
        let updated = review.clone();

        tables.touch_store(updated.store_id);

        Ok(updated)
    }

    async fn mark_review_deleted(&self, id: Uuid) -> Result<(), AppError> {
        let mut tables = self.tables.write().await;
        let review = tables.live_review_mut(id).ok_or(AppError::ReviewNotFound)?;

        review.is_deleted = true;
        review.updated_at = Utc::now();
        let store_id = review.store_id;

        tables.touch_store(store_id);

        Ok(())
    }

    async fn list_reviews(
        &self,
        store_id: Uuid,
        page: PageRequest,
    ) -> Result<Page<Review>, AppError> {
        let tables = self.tables.read().await;

        let mut rows: Vec<&Review> = tables
            .reviews
            .values()
            .filter(|review| review.store_id == store_id && !review.is_deleted)
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));

        Ok(Page {
            total: rows.len() as i64,
            items: paginate(&rows, page).into_iter().cloned().collect(),
        })
    }

    async fn recent_reviews(&self, limit: i64) -> Result<Vec<(Review, String)>, AppError> {
        let tables = self.tables.read().await;

        let mut rows: Vec<(&Review, &Store)> = tables
            .reviews
            .values()
            .filter(|review| !review.is_deleted)
            .filter_map(|review| {
                tables
                    .stores
                    .get(&review.store_id)
                    .filter(|store| !store.is_deleted)
                    .map(|store| (review, store))
            })
            .collect();
        rows.sort_by(|a, b| b.0.created_at.cmp(&a.0.created_at));

        Ok(rows
            .into_iter()
            .take(usize::try_from(limit).unwrap_or(0))
            .map(|(review, store)| (review.clone(), store.fields.name.clone()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::edit_key;

    fn store_fields(name: &str, address: &str, genre: Option<&str>) -> StoreFields {
        StoreFields {
            name: name.to_string(),
            address: address.to_string(),
            phone: None,
            business_hours: None,
            closed_days: None,
            website_url: None,
            genre: genre.map(str::to_string),
            description: None,
        }
    }

    fn review_fields(rating: i32) -> ReviewFields {
        ReviewFields {
            rating,
            body: "Worth the queue outside.".to_string(),
            author_name: None,
            visited_at: None,
        }
    }

    fn first_page() -> PageRequest {
        PageRequest::new(None, None, 100)
    }

    #[tokio::test]
    async fn search_is_case_insensitive_over_name_address_and_genre() {
        let repo = MemoryRepository::new();
        let digest = edit_key::digest("k");
        repo.insert_store(&store_fields("Ramen Taro", "Osaka", None), &digest)
            .await
            .unwrap();
        repo.insert_store(&store_fields("Blue Bottle", "Kiyosumi", Some("Cafe")), &digest)
            .await
            .unwrap();
        repo.insert_store(&store_fields("Sushi Dai", "TSUKIJI Market", Some("Sushi")), &digest)
            .await
            .unwrap();

        let by_name = repo.search_stores(Some("rAmEn"), first_page()).await.unwrap();
        assert_eq!(by_name.total, 1);
        assert_eq!(by_name.items[0].fields.name, "Ramen Taro");

        let by_genre = repo.search_stores(Some("CAFE"), first_page()).await.unwrap();
        assert_eq!(by_genre.items[0].fields.name, "Blue Bottle");

        let by_address = repo.search_stores(Some("tsukiji"), first_page()).await.unwrap();
        assert_eq!(by_address.items[0].fields.name, "Sushi Dai");

        let none = repo.search_stores(None, first_page()).await.unwrap();
        assert_eq!(none.total, 3);
    }

    #[tokio::test]
    async fn deleted_rows_are_found_by_id_but_not_listed() {
        let repo = MemoryRepository::new();
        let store = repo
            .insert_store(&store_fields("Izakaya Ten", "Fukuoka", None), &edit_key::digest("k"))
            .await
            .unwrap();

        repo.mark_store_deleted(store.id).await.unwrap();

        let found = repo.find_store(store.id).await.unwrap().unwrap();
        assert!(found.is_deleted);
        assert_eq!(repo.search_stores(None, first_page()).await.unwrap().total, 0);
        assert!(matches!(
            repo.mark_store_deleted(store.id).await,
            Err(AppError::StoreNotFound)
        ));
        assert!(matches!(
            repo.update_store(store.id, &found.fields).await,
            Err(AppError::StoreNotFound)
        ));
    }

    #[tokio::test]
    async fn review_writes_touch_the_store() {
        let repo = MemoryRepository::new();
        let digest = edit_key::digest("k");
        let store = repo
            .insert_store(&store_fields("Yakiniku Go", "Sendai", None), &digest)
            .await
            .unwrap();

        let review = repo.insert_review(store.id, &review_fields(4), &digest).await.unwrap();
        let after_insert = repo.find_store(store.id).await.unwrap().unwrap().updated_at;
        assert!(after_insert >= store.updated_at);

        repo.mark_review_deleted(review.id).await.unwrap();
        let after_delete = repo.find_store(store.id).await.unwrap().unwrap().updated_at;
        assert!(after_delete >= after_insert);

        assert!(repo.live_ratings(&[store.id]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn reviews_cannot_be_added_to_deleted_store() {
        let repo = MemoryRepository::new();
        let digest = edit_key::digest("k");
        let store = repo
            .insert_store(&store_fields("Closed Down", "Nagoya", None), &digest)
            .await
            .unwrap();
        repo.mark_store_deleted(store.id).await.unwrap();

        let result = repo.insert_review(store.id, &review_fields(5), &digest).await;
        assert!(matches!(result, Err(AppError::StoreNotFound)));
    }

    #[tokio::test]
    async fn recent_reviews_skip_deleted_stores() {
        let repo = MemoryRepository::new();
        let digest = edit_key::digest("k");
        let open = repo
            .insert_store(&store_fields("Open", "Kobe", None), &digest)
            .await
            .unwrap();
        let closing = repo
            .insert_store(&store_fields("Closing", "Kobe", None), &digest)
            .await
            .unwrap();
        repo.insert_review(open.id, &review_fields(5), &digest).await.unwrap();
        repo.insert_review(closing.id, &review_fields(2), &digest).await.unwrap();
        repo.mark_store_deleted(closing.id).await.unwrap();

        let recent = repo.recent_reviews(6).await.unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].1, "Open");
    }
}
