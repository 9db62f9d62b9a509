//! Review data models and API request/response types.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::{
    error::AppError,
    models::validation::{self, AUTHOR_NAME_MAX},
};

/// Author name stored when the reviewer leaves the field blank.
pub const ANONYMOUS_AUTHOR: &str = "Anonymous";

/// Editable review columns.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewFields {
    /// 1 to 5, enforced by a CHECK constraint as well.
    pub rating: i32,
    pub body: String,
    pub author_name: Option<String>,
    pub visited_at: Option<NaiveDate>,
}

/// Represents a review record from the database.
///
/// # Database Table
///
/// Maps to the `reviews` table. `store_id` references `stores.id`; deleting a
/// store does not touch its reviews.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Review {
    pub id: Uuid,
    pub store_id: Uuid,
    #[sqlx(flatten)]
    pub fields: ReviewFields,
    pub edit_key_hash: String,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request body for `POST /api/stores/{id}/reviews`.
///
/// # JSON Example
///
/// ```json
/// {
///   "rating": 4,
///   "body": "Rich broth, firm noodles.",
///   "authorName": "Ken",
///   "visitedAt": "2025-12-01"
/// }
/// ```
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReviewRequest {
    /// Integer, or a numeric string as submitted by HTML forms.
    pub rating: Option<Value>,
    pub body: Option<String>,
    pub author_name: Option<String>,
    pub visited_at: Option<String>,
}

impl CreateReviewRequest {
    pub fn into_fields(self) -> Result<ReviewFields, AppError> {
        let (Some(rating), Some(body)) = (self.rating.filter(|r| !r.is_null()), self.body) else {
            return Err(AppError::Validation(
                "Rating and body are required".to_string(),
            ));
        };

        Ok(ReviewFields {
            rating: validation::rating(&rating)?,
            body: validation::review_body(&body)?,
            author_name: Some(author_name(self.author_name.as_deref())?),
            visited_at: validation::visited_at(self.visited_at.as_deref())?,
        })
    }
}

/// Request body for `PATCH /api/reviews/{id}`.
///
/// Absent fields keep their current value; a blank `visitedAt` is treated as absent.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateReviewRequest {
    pub edit_key: Option<String>,
    pub rating: Option<Value>,
    pub body: Option<String>,
    pub author_name: Option<String>,
    pub visited_at: Option<String>,
}

impl UpdateReviewRequest {
    pub fn apply_to(&self, current: &ReviewFields) -> Result<ReviewFields, AppError> {
        let mut next = current.clone();

        if let Some(rating) = self.rating.as_ref().filter(|r| !r.is_null()) {
            next.rating = validation::rating(rating)?;
        }
        if let Some(body) = &self.body {
            next.body = validation::review_body(body)?;
        }
        if let Some(name) = &self.author_name {
            next.author_name = Some(author_name(Some(name))?);
        }
        if let Some(date) = validation::visited_at(self.visited_at.as_deref())? {
            next.visited_at = Some(date);
        }

        Ok(next)
    }
}

fn author_name(value: Option<&str>) -> Result<String, AppError> {
    match validation::optional_text(value) {
        Some(name) => {
            validation::check_max_chars(&name, "authorName", AUTHOR_NAME_MAX)?;
            Ok(name)
        }
        None => Ok(ANONYMOUS_AUTHOR.to_string()),
    }
}

/// Public view of a review. The key digest is dropped.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewResponse {
    pub id: Uuid,
    pub store_id: Uuid,
    #[serde(flatten)]
    pub fields: ReviewFields,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Review> for ReviewResponse {
    fn from(review: Review) -> Self {
        Self {
            id: review.id,
            store_id: review.store_id,
            fields: review.fields,
            created_at: review.created_at,
            updated_at: review.updated_at,
        }
    }
}

/// A review listed on the front page, with the name of its store.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentReviewResponse {
    #[serde(flatten)]
    pub review: ReviewResponse,
    pub store_name: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedReviewResponse {
    pub review: ReviewResponse,
    pub edit_key: String,
}

#[derive(Debug, Serialize)]
pub struct UpdatedReviewResponse {
    pub review: ReviewResponse,
}

/// Query parameters for `GET /api/reviews`.
#[derive(Debug, Default, Deserialize)]
pub struct RecentReviewsParams {
    pub limit: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn current() -> ReviewFields {
        ReviewFields {
            rating: 3,
            body: "Decent gyoza, slow service.".to_string(),
            author_name: Some("Ken".to_string()),
            visited_at: NaiveDate::from_ymd_opt(2025, 1, 2),
        }
    }

    #[test]
    fn create_requires_rating_and_body() {
        let request: CreateReviewRequest =
            serde_json::from_value(json!({ "body": "Long enough body text" })).unwrap();
        let err = request.into_fields().unwrap_err();
        assert_eq!(err.to_string(), "Rating and body are required");
    }

    #[test]
    fn create_defaults_blank_author_to_anonymous() {
        let request: CreateReviewRequest = serde_json::from_value(json!({
            "rating": "4",
            "body": "Crispy karaage, great value.",
            "authorName": "  "
        }))
        .unwrap();
        let fields = request.into_fields().unwrap();
        assert_eq!(fields.rating, 4);
        assert_eq!(fields.author_name.as_deref(), Some(ANONYMOUS_AUTHOR));
        assert_eq!(fields.visited_at, None);
    }

    #[test]
    fn create_rejects_short_body() {
        let request: CreateReviewRequest =
            serde_json::from_value(json!({ "rating": 5, "body": "Yum" })).unwrap();
        assert!(matches!(
            request.into_fields(),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn update_keeps_visit_date_when_blank() {
        let request = UpdateReviewRequest {
            rating: Some(json!(5)),
            visited_at: Some(String::new()),
            ..Default::default()
        };
        let next = request.apply_to(&current()).unwrap();
        assert_eq!(next.rating, 5);
        assert_eq!(next.visited_at, current().visited_at);
        assert_eq!(next.body, current().body);
    }

    #[test]
    fn update_rejects_out_of_range_rating() {
        let request = UpdateReviewRequest {
            rating: Some(json!(9)),
            ..Default::default()
        };
        assert!(request.apply_to(&current()).is_err());
    }
}
