//! PostgreSQL repository.
//!
//! Review writes run inside a database transaction together with the update
//! of the owning store's `updated_at`, so both happen or neither does.

use std::collections::HashMap;

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    db::DbPool,
    error::AppError,
    models::{
        pagination::{Page, PageRequest},
        review::{Review, ReviewFields},
        store::{Store, StoreFields},
    },
    repository::{Repository, like_pattern},
};

const STORE_COLUMNS: &str = "id, name, address, phone, business_hours, closed_days, website_url, \
     genre, description, edit_key_hash, is_deleted, created_at, updated_at";

const REVIEW_COLUMNS: &str = "id, store_id, rating, body, author_name, visited_at, \
     edit_key_hash, is_deleted, created_at, updated_at";

/// Row shape for the recent reviews query.
#[derive(sqlx::FromRow)]
struct RecentReviewRow {
    #[sqlx(flatten)]
    review: Review,
    store_name: String,
}

#[derive(Clone)]
pub struct PgRepository {
    pool: DbPool,
}

impl PgRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository for PgRepository {
    async fn ping(&self) -> Result<&'static str, AppError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok("connected")
    }

    async fn insert_store(
        &self,
        fields: &StoreFields,
        edit_key_hash: &str,
    ) -> Result<Store, AppError> {
        let store = sqlx::query_as::<_, Store>(&format!(
            r#"
            INSERT INTO stores (
                name, address, phone, business_hours, closed_days,
                website_url, genre, description, edit_key_hash
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {STORE_COLUMNS}
            "#
        ))
        .bind(&fields.name)
        .bind(&fields.address)
        .bind(&fields.phone)
        .bind(&fields.business_hours)
        .bind(&fields.closed_days)
        .bind(&fields.website_url)
        .bind(&fields.genre)
        .bind(&fields.description)
        .bind(edit_key_hash)
        .fetch_one(&self.pool)
        .await?;

        Ok(store)
    }

    async fn find_store(&self, id: Uuid) -> Result<Option<Store>, AppError> {
        let store = sqlx::query_as::<_, Store>(&format!(
            "SELECT {STORE_COLUMNS} FROM stores WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(store)
    }

    async fn update_store(&self, id: Uuid, fields: &StoreFields) -> Result<Store, AppError> {
        // edit_key_hash is intentionally absent from the SET list
        sqlx::query_as::<_, Store>(&format!(
            r#"
            UPDATE stores
            SET name = $2,
                address = $3,
                phone = $4,
                business_hours = $5,
                closed_days = $6,
                website_url = $7,
                genre = $8,
                description = $9,
                updated_at = NOW()
            WHERE id = $1 AND is_deleted = false
            RETURNING {STORE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&fields.name)
        .bind(&fields.address)
        .bind(&fields.phone)
        .bind(&fields.business_hours)
        .bind(&fields.closed_days)
        .bind(&fields.website_url)
        .bind(&fields.genre)
        .bind(&fields.description)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::StoreNotFound)
    }

    async fn mark_store_deleted(&self, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE stores SET is_deleted = true, updated_at = NOW() \
             WHERE id = $1 AND is_deleted = false",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::StoreNotFound);
        }

        Ok(())
    }

    async fn search_stores(
        &self,
        query: Option<&str>,
        page: PageRequest,
    ) -> Result<Page<Store>, AppError> {
        let pattern = query.map(like_pattern);

        // $1 is NULL when no search term was given
        const FILTER: &str = "is_deleted = false \
             AND ($1::text IS NULL OR name ILIKE $1 OR address ILIKE $1 OR genre ILIKE $1)";

        let select_sql = format!(
            "SELECT {STORE_COLUMNS} FROM stores WHERE {FILTER} \
             ORDER BY updated_at DESC, id LIMIT $2 OFFSET $3"
        );
        let count_sql = format!("SELECT COUNT(*) FROM stores WHERE {FILTER}");

        let rows = sqlx::query_as::<_, Store>(&select_sql)
            .bind(&pattern)
            .bind(page.limit)
            .bind(page.offset())
            .fetch_all(&self.pool);

        let total = sqlx::query_scalar::<_, i64>(&count_sql)
            .bind(&pattern)
            .fetch_one(&self.pool);

        let (items, total) = tokio::try_join!(rows, total)?;

        Ok(Page { items, total })
    }

    async fn live_ratings(&self, store_ids: &[Uuid]) -> Result<HashMap<Uuid, Vec<i32>>, AppError> {
        if store_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query_as::<_, (Uuid, i32)>(
            "SELECT store_id, rating FROM reviews WHERE is_deleted = false AND store_id = ANY($1)",
        )
        .bind(store_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut grouped: HashMap<Uuid, Vec<i32>> = HashMap::new();
        for (store_id, rating) in rows {
            grouped.entry(store_id).or_default().push(rating);
        }

        Ok(grouped)
    }

    async fn insert_review(
        &self,
        store_id: Uuid,
        fields: &ReviewFields,
        edit_key_hash: &str,
    ) -> Result<Review, AppError> {
        let mut tx = self.pool.begin().await?;

        // Lock the store row so it cannot be deleted while the review is added
        let live_store: Option<Uuid> = sqlx::query_scalar(
            "SELECT id FROM stores WHERE id = $1 AND is_deleted = false FOR UPDATE",
        )
        .bind(store_id)
        .fetch_optional(&mut *tx)
        .await?;

        if live_store.is_none() {
            tx.rollback().await?;
            return Err(AppError::StoreNotFound);
        }

        let review = sqlx::query_as::<_, Review>(&format!(
            r#"
            INSERT INTO reviews (store_id, rating, body, author_name, visited_at, edit_key_hash)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {REVIEW_COLUMNS}
            "#
        ))
        .bind(store_id)
        .bind(fields.rating)
        .bind(&fields.body)
        .bind(&fields.author_name)
        .bind(fields.visited_at)
        .bind(edit_key_hash)
        .fetch_one(&mut *tx)
        .await?;

        touch_store(&mut tx, store_id).await?;

        tx.commit().await?;

        Ok(review)
    }

    async fn find_review(&self, id: Uuid) -> Result<Option<Review>, AppError> {
        let review = sqlx::query_as::<_, Review>(&format!(
            "SELECT {REVIEW_COLUMNS} FROM reviews WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(review)
    }

    async fn update_review(&self, id: Uuid, fields: &ReviewFields) -> Result<Review, AppError> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query_as::<_, Review>(&format!(
            r#"
            UPDATE reviews
            SET rating = $2,
                body = $3,
                author_name = $4,
                visited_at = $5,
                updated_at = NOW()
            WHERE id = $1 AND is_deleted = false
            RETURNING {REVIEW_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(fields.rating)
        .bind(&fields.body)
        .bind(&fields.author_name)
        .bind(fields.visited_at)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(review) = updated else {
            tx.rollback().await?;
            return Err(AppError::ReviewNotFound);
        };

        touch_store(&mut tx, review.store_id).await?;

        tx.commit().await?;

        Ok(review)
    }

    async fn mark_review_deleted(&self, id: Uuid) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        let store_id: Option<Uuid> = sqlx::query_scalar(
            r#"
            UPDATE reviews
            SET is_deleted = true, updated_at = NOW()
            WHERE id = $1 AND is_deleted = false
            RETURNING store_id
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(store_id) = store_id else {
            tx.rollback().await?;
            return Err(AppError::ReviewNotFound);
        };

        touch_store(&mut tx, store_id).await?;

        tx.commit().await?;

        Ok(())
    }

    async fn list_reviews(
        &self,
        store_id: Uuid,
        page: PageRequest,
    ) -> Result<Page<Review>, AppError> {
        let select_sql = format!(
            r#"
            SELECT {REVIEW_COLUMNS}
            FROM reviews
            WHERE store_id = $1 AND is_deleted = false
            ORDER BY created_at DESC, id
            LIMIT $2 OFFSET $3
            "#
        );

        let rows = sqlx::query_as::<_, Review>(&select_sql)
            .bind(store_id)
            .bind(page.limit)
            .bind(page.offset())
            .fetch_all(&self.pool);

        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM reviews WHERE store_id = $1 AND is_deleted = false",
        )
        .bind(store_id)
        .fetch_one(&self.pool);

        let (items, total) = tokio::try_join!(rows, total)?;

        Ok(Page { items, total })
    }

    async fn recent_reviews(&self, limit: i64) -> Result<Vec<(Review, String)>, AppError> {
        let rows = sqlx::query_as::<_, RecentReviewRow>(
            r#"
            SELECT r.id, r.store_id, r.rating, r.body, r.author_name, r.visited_at,
                   r.edit_key_hash, r.is_deleted, r.created_at, r.updated_at,
                   s.name AS store_name
            FROM reviews r
            JOIN stores s ON s.id = r.store_id
            WHERE r.is_deleted = false AND s.is_deleted = false
            ORDER BY r.created_at DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| (row.review, row.store_name))
            .collect())
    }
}

/// Bump a store's `updated_at` so recently reviewed stores sort first.
async fn touch_store(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    store_id: Uuid,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE stores SET updated_at = NOW() WHERE id = $1")
        .bind(store_id)
        .execute(&mut **tx)
        .await?;

    Ok(())
}

/// These run against a live database and return early when `DATABASE_URL`
/// is not set. Every test uses its own unique search token, so a shared
/// database is fine.
#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    async fn repo() -> Option<PgRepository> {
        let _ = dotenvy::dotenv();
        let Ok(url) = std::env::var("DATABASE_URL") else {
            eprintln!("DATABASE_URL not set, skipping PostgreSQL test");
            return None;
        };

        let pool = db::create_pool(&url, 2).await.unwrap();
        db::run_migrations(&pool).await.unwrap();
        Some(PgRepository::new(pool))
    }

    fn token() -> String {
        Uuid::new_v4().simple().to_string()
    }

    fn store_fields(name: &str) -> StoreFields {
        StoreFields {
            name: name.to_string(),
            address: "1-2-3 Jingumae, Tokyo".to_string(),
            phone: None,
            business_hours: None,
            closed_days: None,
            website_url: None,
            genre: Some("Ramen".to_string()),
            description: None,
        }
    }

    fn review_fields(rating: i32) -> ReviewFields {
        ReviewFields {
            rating,
            body: "Rich broth, firm noodles.".to_string(),
            author_name: Some("Ken".to_string()),
            visited_at: None,
        }
    }

    fn names(page: &Page<Store>) -> Vec<&str> {
        page.items.iter().map(|s| s.fields.name.as_str()).collect()
    }

    #[tokio::test]
    async fn search_is_case_insensitive_in_postgres() {
        let Some(repo) = repo().await else { return };
        let token = token();
        let name = format!("Menya {} Hoshi", token.to_uppercase());
        repo.insert_store(&store_fields(&name), "digest").await.unwrap();

        let page = PageRequest::new(None, None, 100);
        let found = repo.search_stores(Some(&token), page).await.unwrap();

        assert_eq!(found.total, 1);
        assert_eq!(names(&found), vec![name.as_str()]);
    }

    #[tokio::test]
    async fn search_treats_wildcards_literally() {
        let Some(repo) = repo().await else { return };
        let token = token();
        for suffix in ["100% natural", "1000 natural", "a_b", "axb"] {
            let name = format!("{token} {suffix}");
            repo.insert_store(&store_fields(&name), "digest").await.unwrap();
        }
        let page = PageRequest::new(None, None, 100);

        let percent = repo
            .search_stores(Some(&format!("{token} 100%")), page)
            .await
            .unwrap();
        assert_eq!(names(&percent), vec![format!("{token} 100% natural").as_str()]);

        let underscore = repo
            .search_stores(Some(&format!("{token} a_b")), page)
            .await
            .unwrap();
        assert_eq!(names(&underscore), vec![format!("{token} a_b").as_str()]);
    }

    #[tokio::test]
    async fn writes_after_delete_are_not_found() {
        let Some(repo) = repo().await else { return };
        let store = repo
            .insert_store(&store_fields(&token()), "digest")
            .await
            .unwrap();
        let review = repo
            .insert_review(store.id, &review_fields(4), "digest")
            .await
            .unwrap();

        repo.mark_review_deleted(review.id).await.unwrap();
        assert!(matches!(
            repo.update_review(review.id, &review_fields(5)).await,
            Err(AppError::ReviewNotFound)
        ));
        assert!(matches!(
            repo.mark_review_deleted(review.id).await,
            Err(AppError::ReviewNotFound)
        ));

        repo.mark_store_deleted(store.id).await.unwrap();
        assert!(matches!(
            repo.update_store(store.id, &store_fields("Renamed")).await,
            Err(AppError::StoreNotFound)
        ));
        assert!(matches!(
            repo.mark_store_deleted(store.id).await,
            Err(AppError::StoreNotFound)
        ));
        assert!(matches!(
            repo.insert_review(store.id, &review_fields(3), "digest").await,
            Err(AppError::StoreNotFound)
        ));

        // Lookups by id still see the deleted rows
        assert!(repo.find_store(store.id).await.unwrap().unwrap().is_deleted);
        assert!(repo.find_review(review.id).await.unwrap().unwrap().is_deleted);
    }

    #[tokio::test]
    async fn review_write_and_store_touch_share_a_transaction() {
        let Some(repo) = repo().await else { return };
        let store = repo
            .insert_store(&store_fields(&token()), "digest")
            .await
            .unwrap();

        // NOW() is the transaction start time, so equal timestamps mean one transaction
        let review = repo
            .insert_review(store.id, &review_fields(5), "digest")
            .await
            .unwrap();
        let touched = repo.find_store(store.id).await.unwrap().unwrap();
        assert!(touched.updated_at > store.updated_at);
        assert_eq!(touched.updated_at, review.created_at);

        let updated = repo
            .update_review(review.id, &review_fields(2))
            .await
            .unwrap();
        let touched = repo.find_store(store.id).await.unwrap().unwrap();
        assert_eq!(touched.updated_at, updated.updated_at);

        let ratings = repo.live_ratings(&[store.id]).await.unwrap();
        assert_eq!(ratings.get(&store.id), Some(&vec![2]));

        let feed = repo.recent_reviews(100).await.unwrap();
        assert!(
            feed.iter()
                .any(|(r, name)| r.id == review.id && *name == store.fields.name)
        );
    }

    #[tokio::test]
    async fn list_reviews_pages_live_rows() {
        let Some(repo) = repo().await else { return };
        let store = repo
            .insert_store(&store_fields(&token()), "digest")
            .await
            .unwrap();
        for rating in [5, 3, 4] {
            repo.insert_review(store.id, &review_fields(rating), "digest")
                .await
                .unwrap();
        }

        let page = repo
            .list_reviews(store.id, PageRequest::new(Some(2), Some(2), 100))
            .await
            .unwrap();

        assert_eq!(page.total, 3);
        assert_eq!(page.items.len(), 1);
    }
}
