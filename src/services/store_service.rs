//! Store service - registration, lookup, search and key-gated mutation.
//!
//! Creation issues a fresh edit key and stores only its digest. Updates and
//! deletes go through [`gate::authorize`] before anything is written.

use uuid::Uuid;

use crate::{
    error::AppError,
    models::{
        pagination::{PageRequest, Paginated, Pagination},
        store::{
            CreateStoreRequest, CreatedStoreResponse, Store, StoreResponse, StoreSummary,
            UpdateStoreRequest,
        },
    },
    repository::Repository,
    services::{edit_key, gate, ratings},
};

/// Register a new store.
///
/// # Process
///
/// 1. Validate and normalize the submitted fields
/// 2. Issue an edit key
/// 3. Insert the store with the key digest
/// 4. Return the store and the plaintext key (the only time it is shown)
pub async fn create_store(
    repo: &dyn Repository,
    request: CreateStoreRequest,
) -> Result<CreatedStoreResponse, AppError> {
    let fields = request.into_fields()?;
    let key = edit_key::issue_key();

    let store = repo.insert_store(&fields, &key.digest).await?;
    tracing::info!(store_id = %store.id, "Store registered");

    Ok(CreatedStoreResponse {
        store: store.into(),
        edit_key: key.plaintext,
    })
}

/// Fetch a live store with its review statistics.
///
/// # Errors
///
/// - `StoreNotFound`: Store doesn't exist or was deleted
pub async fn get_store(repo: &dyn Repository, store_id: Uuid) -> Result<StoreSummary, AppError> {
    let store = repo
        .find_store(store_id)
        .await?
        .filter(|store| !store.is_deleted)
        .ok_or(AppError::StoreNotFound)?;

    let mut ratings_by_store = repo.live_ratings(&[store.id]).await?;
    let ratings = ratings_by_store.remove(&store.id).unwrap_or_default();

    Ok(StoreSummary {
        store: store.into(),
        stats: ratings::summarize(&ratings),
    })
}

/// Search live stores, each with review statistics.
///
/// A blank `query` lists everything.
pub async fn list_stores(
    repo: &dyn Repository,
    query: Option<&str>,
    page: PageRequest,
) -> Result<Paginated<StoreSummary>, AppError> {
    let query = query.map(str::trim).filter(|q| !q.is_empty());
    let result = repo.search_stores(query, page).await?;

    let ids: Vec<Uuid> = result.items.iter().map(|store| store.id).collect();
    let ratings_by_store = repo.live_ratings(&ids).await?;

    let data = result
        .items
        .into_iter()
        .map(|store: Store| {
            let ratings = ratings_by_store
                .get(&store.id)
                .map(Vec::as_slice)
                .unwrap_or_default();
            StoreSummary {
                stats: ratings::summarize(ratings),
                store: store.into(),
            }
        })
        .collect();

    Ok(Paginated {
        data,
        pagination: Pagination::new(result.total, page),
    })
}

/// Update the allow-listed fields of a store.
///
/// # Errors
///
/// - `StoreNotFound`: Store doesn't exist or was deleted
/// - `KeyRequired` / `InvalidKey`: Edit key missing or wrong
/// - `Validation`: A submitted field is invalid
pub async fn update_store(
    repo: &dyn Repository,
    store_id: Uuid,
    request: UpdateStoreRequest,
) -> Result<StoreResponse, AppError> {
    let loaded = repo.find_store(store_id).await?;
    let store = gate::authorize(loaded, request.edit_key.as_deref())?;

    let fields = request.apply_to(&store.fields)?;
    let updated = repo.update_store(store.id, &fields).await?;
    tracing::info!(store_id = %updated.id, "Store updated");

    Ok(updated.into())
}

/// Logically delete a store. Its reviews are left as they are.
pub async fn delete_store(
    repo: &dyn Repository,
    store_id: Uuid,
    key: Option<&str>,
) -> Result<(), AppError> {
    let loaded = repo.find_store(store_id).await?;
    let store = gate::authorize(loaded, key)?;

    repo.mark_store_deleted(store.id).await?;
    tracing::info!(store_id = %store.id, "Store deleted");

    Ok(())
}
