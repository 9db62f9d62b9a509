//! Store data models and API request/response types.
//!
//! This module defines:
//! - `Store`: Database entity representing a registered store
//! - `StoreFields`: The public, editable part of a store
//! - `CreateStoreRequest` / `UpdateStoreRequest`: Request bodies
//! - `StoreResponse` and friends: Response bodies (never carry the key digest)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::AppError,
    models::validation::{self, STORE_ADDRESS_MAX, STORE_NAME_MAX},
    services::ratings::ReviewStats,
};

/// Editable store columns.
///
/// This is exactly the update allow-list: anything not in this struct can
/// never be written through an update.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreFields {
    pub name: String,
    pub address: String,
    pub phone: Option<String>,
    pub business_hours: Option<String>,
    pub closed_days: Option<String>,
    pub website_url: Option<String>,
    pub genre: Option<String>,
    pub description: Option<String>,
}

/// Represents a store record from the database.
///
/// # Database Table
///
/// Maps to the `stores` table. Each store:
/// - Is owned by whoever holds the edit key issued at registration
/// - Is never physically removed; `is_deleted` hides it from every public read
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Store {
    pub id: Uuid,

    #[sqlx(flatten)]
    pub fields: StoreFields,

    /// Hex SHA-256 digest of the edit key.
    ///
    /// Written once at creation. Deliberately not `Serialize`.
    pub edit_key_hash: String,

    pub is_deleted: bool,

    pub created_at: DateTime<Utc>,

    /// Bumped on every store mutation and whenever one of its reviews changes.
    pub updated_at: DateTime<Utc>,
}

/// Request body for registering a store.
///
/// # JSON Example
///
/// ```json
/// {
///   "name": "Menya Hoshi",
///   "address": "1-2-3 Shibuya, Tokyo",
///   "genre": "Ramen",
///   "websiteUrl": "https://example.com"
/// }
/// ```
///
/// # Validation
///
/// - `name`: Required, 1-80 characters
/// - `address`: Required, 1-120 characters
/// - `websiteUrl`: Optional, must be an http(s) URL
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateStoreRequest {
    pub name: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub business_hours: Option<String>,
    pub closed_days: Option<String>,
    pub website_url: Option<String>,
    pub genre: Option<String>,
    pub description: Option<String>,
}

impl CreateStoreRequest {
    /// Validate and normalize into the columns to insert.
    pub fn into_fields(self) -> Result<StoreFields, AppError> {
        let (Some(name), Some(address)) = (self.name.as_deref(), self.address.as_deref()) else {
            return Err(AppError::Validation(
                "Name and address are required".to_string(),
            ));
        };

        Ok(StoreFields {
            name: validation::required_text(name, "name", STORE_NAME_MAX)?,
            address: validation::required_text(address, "address", STORE_ADDRESS_MAX)?,
            phone: validation::optional_text(self.phone.as_deref()),
            business_hours: validation::optional_text(self.business_hours.as_deref()),
            closed_days: validation::optional_text(self.closed_days.as_deref()),
            website_url: validation::website_url(self.website_url.as_deref())?,
            genre: validation::optional_text(self.genre.as_deref()),
            description: validation::optional_text(self.description.as_deref()),
        })
    }
}

/// Request body for updating a store.
///
/// Only the allow-listed fields are deserialized; any other key in the body
/// (`editKeyHash`, `isDeleted`, `id`, ...) is dropped by serde. Absent fields
/// keep their current value. An empty string clears an optional field.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStoreRequest {
    pub edit_key: Option<String>,
    pub name: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub business_hours: Option<String>,
    pub closed_days: Option<String>,
    pub website_url: Option<String>,
    pub genre: Option<String>,
    pub description: Option<String>,
}

impl UpdateStoreRequest {
    /// Apply the submitted changes on top of the current values.
    pub fn apply_to(&self, current: &StoreFields) -> Result<StoreFields, AppError> {
        let mut next = current.clone();

        if let Some(name) = &self.name {
            next.name = validation::required_text(name, "name", STORE_NAME_MAX)?;
        }
        if let Some(address) = &self.address {
            next.address = validation::required_text(address, "address", STORE_ADDRESS_MAX)?;
        }
        if let Some(phone) = &self.phone {
            next.phone = validation::optional_text(Some(phone));
        }
        if let Some(hours) = &self.business_hours {
            next.business_hours = validation::optional_text(Some(hours));
        }
        if let Some(days) = &self.closed_days {
            next.closed_days = validation::optional_text(Some(days));
        }
        if let Some(url) = &self.website_url {
            next.website_url = validation::website_url(Some(url))?;
        }
        if let Some(genre) = &self.genre {
            next.genre = validation::optional_text(Some(genre));
        }
        if let Some(description) = &self.description {
            next.description = validation::optional_text(Some(description));
        }

        Ok(next)
    }
}

/// Public view of a store.
///
/// # JSON Example
///
/// ```json
/// {
///   "id": "550e8400-e29b-41d4-a716-446655440000",
///   "name": "Menya Hoshi",
///   "address": "1-2-3 Shibuya, Tokyo",
///   "phone": null,
///   "businessHours": "11:00-21:00",
///   "closedDays": "Tuesday",
///   "websiteUrl": null,
///   "genre": "Ramen",
///   "description": null,
///   "createdAt": "2025-12-20T10:00:00Z",
///   "updatedAt": "2025-12-20T10:00:00Z"
/// }
/// ```
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreResponse {
    pub id: Uuid,
    #[serde(flatten)]
    pub fields: StoreFields,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Drops `edit_key_hash` and `is_deleted`.
impl From<Store> for StoreResponse {
    fn from(store: Store) -> Self {
        Self {
            id: store.id,
            fields: store.fields,
            created_at: store.created_at,
            updated_at: store.updated_at,
        }
    }
}

/// A store together with its live review statistics.
///
/// Used by the detail and list endpoints; adds `reviewCount` and `averageRating`.
#[derive(Debug, Serialize)]
pub struct StoreSummary {
    #[serde(flatten)]
    pub store: StoreResponse,
    #[serde(flatten)]
    pub stats: ReviewStats,
}

/// Response for `POST /api/stores`. The only place the plaintext key ever appears.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedStoreResponse {
    pub store: StoreResponse,
    pub edit_key: String,
}

#[derive(Debug, Serialize)]
pub struct UpdatedStoreResponse {
    pub store: StoreResponse,
}

/// Query parameters for `GET /api/stores`.
#[derive(Debug, Default, Deserialize)]
pub struct ListStoresParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub query: Option<String>,
}
