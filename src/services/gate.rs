//! Mutation gate for key-protected entities.
//!
//! Every update or delete of a store or review goes through [`authorize`]:
//!
//! 1. Entity missing or logically deleted → the entity's NotFound error
//! 2. No key supplied → `KeyRequired`
//! 3. Key digest mismatch → `InvalidKey`
//!
//! Only after all three pass may the caller write.

use crate::{
    error::AppError,
    models::{review::Review, store::Store},
    services::edit_key,
};

/// An entity that can only be changed by the holder of its edit key.
pub trait KeyProtected {
    fn edit_key_hash(&self) -> &str;
    fn is_deleted(&self) -> bool;
    /// Error reported when the entity is absent or deleted.
    fn not_found() -> AppError;
}

impl KeyProtected for Store {
    fn edit_key_hash(&self) -> &str {
        &self.edit_key_hash
    }

    fn is_deleted(&self) -> bool {
        self.is_deleted
    }

    fn not_found() -> AppError {
        AppError::StoreNotFound
    }
}

impl KeyProtected for Review {
    fn edit_key_hash(&self) -> &str {
        &self.edit_key_hash
    }

    fn is_deleted(&self) -> bool {
        self.is_deleted
    }

    fn not_found() -> AppError {
        AppError::ReviewNotFound
    }
}

/// Check that `supplied_key` may mutate the loaded entity and hand it back.
pub fn authorize<T: KeyProtected>(
    loaded: Option<T>,
    supplied_key: Option<&str>,
) -> Result<T, AppError> {
    let entity = loaded
        .filter(|entity| !entity.is_deleted())
        .ok_or_else(T::not_found)?;

    edit_key::check(supplied_key, entity.edit_key_hash())?;

    Ok(entity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::store::StoreFields;
    use chrono::Utc;
    use uuid::Uuid;

    fn store(digest: &str, is_deleted: bool) -> Store {
        Store {
            id: Uuid::new_v4(),
            fields: StoreFields {
                name: "Kissa Hana".to_string(),
                address: "Kyoto".to_string(),
                phone: None,
                business_hours: None,
                closed_days: None,
                website_url: None,
                genre: Some("Cafe".to_string()),
                description: None,
            },
            edit_key_hash: digest.to_string(),
            is_deleted,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn missing_entity_is_not_found_even_without_key() {
        let result = authorize::<Store>(None, None);
        assert!(matches!(result, Err(AppError::StoreNotFound)));
    }

    #[test]
    fn deleted_entity_is_not_found_with_correct_key() {
        let key = edit_key::issue_key();
        let result = authorize(Some(store(&key.digest, true)), Some(&key.plaintext));
        assert!(matches!(result, Err(AppError::StoreNotFound)));
    }

    #[test]
    fn live_entity_requires_key() {
        let key = edit_key::issue_key();
        let result = authorize(Some(store(&key.digest, false)), None);
        assert!(matches!(result, Err(AppError::KeyRequired)));
    }

    #[test]
    fn wrong_key_is_invalid() {
        let key = edit_key::issue_key();
        let other = edit_key::issue_key();
        let result = authorize(Some(store(&key.digest, false)), Some(&other.plaintext));
        assert!(matches!(result, Err(AppError::InvalidKey)));
    }

    #[test]
    fn correct_key_passes_entity_through() {
        let key = edit_key::issue_key();
        let loaded = store(&key.digest, false);
        let id = loaded.id;
        let entity = authorize(Some(loaded), Some(&key.plaintext)).unwrap();
        assert_eq!(entity.id, id);
    }
}
