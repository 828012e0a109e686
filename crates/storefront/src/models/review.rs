//! Review domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use emporium_core::review::{Rating, VoteCounts};
use emporium_core::{ProductId, ReviewId, UserId};

/// Reviewer details shown next to a review.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reviewer {
    pub id: UserId,
    pub name: String,
}

/// A product review.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: ReviewId,
    pub user: Reviewer,
    pub product_id: ProductId,
    pub rating: Rating,
    pub title: String,
    pub comment: String,
    pub pros: Vec<String>,
    pub cons: Vec<String>,
    pub images: Vec<String>,
    pub verified: bool,
    #[serde(flatten)]
    pub votes: VoteCounts,
    pub approved: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
