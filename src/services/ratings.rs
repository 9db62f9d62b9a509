//! Review statistics for a store.
//!
//! Always computed from the current non-deleted reviews at read time; nothing
//! is cached or stored.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewStats {
    pub review_count: i64,
    /// Mean rating rounded to one decimal place, `0.0` when there are no reviews.
    pub average_rating: f64,
}

/// Summarize the ratings of a store's live reviews.
pub fn summarize(ratings: &[i32]) -> ReviewStats {
    let count = ratings.len() as i64;
    if count == 0 {
        return ReviewStats {
            review_count: 0,
            average_rating: 0.0,
        };
    }

    let sum: i64 = ratings.iter().map(|&r| i64::from(r)).sum();
    let average = sum as f64 / count as f64;

    ReviewStats {
        review_count: count,
        average_rating: (average * 10.0).round() / 10.0,
    }
}
