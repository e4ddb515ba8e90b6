//! Product reviews.
//!
//! Reviews are only ever read as a whole list per product. After posting one,
//! clients re-read the list instead of inserting the answer locally.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

use crate::model::{id_type, ProductId};

id_type!(
    /// Type-safe identifier for Reviews.
    ReviewId
);

/// Star ratings a review may carry.
pub const RATING_RANGE: RangeInclusive<u8> = 1..=5;

/// A review as listed by `GET /reviews/product/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: ReviewId,
    #[serde(default)]
    pub username: String,
    pub rating: u8,
    #[serde(default)]
    pub comment: String,
    pub created_at: NaiveDateTime,
}

/// Body of `POST /reviews`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReview {
    pub product_id: ProductId,
    pub rating: u8,
    pub comment: String,
}

/// Mean rating of `reviews`, or `None` when there are none.
pub fn average_rating(reviews: &[Review]) -> Option<f64> {
    if reviews.is_empty() {
        return None;
    }
    let sum: u32 = reviews.iter().map(|review| u32::from(review.rating)).sum();
    Some(f64::from(sum) / reviews.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_review_list_payload() {
        let json = r#"[
            {"id": 1, "username": "lan", "rating": 5, "comment": "Rất chắc chắn", "createdAt": "2024-05-01T09:30:00"},
            {"id": 2, "username": "minh", "rating": 4, "createdAt": "2024-05-02T10:00:00"}
        ]"#;

        let reviews: Vec<Review> = serde_json::from_str(json).unwrap();
        assert_eq!(reviews[0].id, ReviewId(1));
        assert_eq!(reviews[1].comment, "");
        assert_eq!(average_rating(&reviews), Some(4.5));
        assert_eq!(average_rating(&[]), None);
    }

    #[test]
    fn test_new_review_body_is_camel_case() {
        let body = serde_json::to_value(NewReview {
            product_id: ProductId(3),
            rating: 5,
            comment: "Đẹp".into(),
        })
        .unwrap();
        assert_eq!(
            body,
            serde_json::json!({"productId": 3, "rating": 5, "comment": "Đẹp"})
        );
    }
}
