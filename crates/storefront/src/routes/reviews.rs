//! Review route handlers.

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use emporium_core::review::{Rating, ReviewDraft, ReviewSort, VoteKind};
use emporium_core::{Pagination, ProductId, ReviewId, UserId};

use super::{ApiJson, ApiPath, ApiQuery, find_user, require_email, resolve_user};
use crate::db::reviews::ReviewListQuery;
use crate::db::{RepositoryError, ReviewRepository};
use crate::error::{AppError, Result};
use crate::models::Review;
use crate::state::AppState;

const DEFAULT_LIMIT: u32 = 10;

/// Review listing query parameters.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewQuery {
    pub product_id: Option<ProductId>,
    pub user_id: Option<UserId>,
    pub rating: Option<String>,
    pub sort: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl ReviewQuery {
    fn to_list_query(&self) -> ReviewListQuery {
        ReviewListQuery {
            product_id: self.product_id,
            user_id: self.user_id,
            rating: Rating::from_filter(self.rating.as_deref()),
            sort: ReviewSort::parse(self.sort.as_deref()),
            page: self.page.unwrap_or(1).max(1),
            limit: self
                .limit
                .unwrap_or(DEFAULT_LIMIT)
                .clamp(1, Pagination::MAX_LIMIT),
        }
    }
}

/// A page of reviews.
#[derive(Debug, Serialize)]
pub struct ReviewListResponse {
    pub reviews: Vec<Review>,
    pub pagination: Pagination,
}

/// List approved reviews.
///
/// GET /api/reviews
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ReviewQuery>,
) -> Result<Json<ReviewListResponse>> {
    let query = query.to_list_query();
    let (reviews, total) = ReviewRepository::new(state.pool()).list(&query).await?;

    Ok(Json(ReviewListResponse {
        reviews,
        pagination: Pagination::new(query.page, query.limit, total),
    }))
}

/// Review submission body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReviewRequest {
    pub user_email: Option<String>,
    #[serde(flatten)]
    pub review: ReviewDraft,
}

/// A stored review.
#[derive(Debug, Serialize)]
pub struct CreatedReview {
    pub message: &'static str,
    pub review: Review,
}

/// Submit a review.
///
/// POST /api/reviews
///
/// # Errors
///
/// Returns 401 without an email, 404 for an unknown customer or product,
/// and 400 for invalid input or a second review of the same product.
#[instrument(skip(state, body))]
pub async fn create(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CreateReviewRequest>,
) -> Result<(StatusCode, Json<CreatedReview>)> {
    let user = resolve_user(&state, body.user_email.as_deref()).await?;
    let review = body.review.validate()?;

    let created = ReviewRepository::new(state.pool())
        .create(&user, &review)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => AppError::NotFound("Product not found".to_owned()),
            e => e.into(),
        })?;

    Ok((
        StatusCode::CREATED,
        Json(CreatedReview {
            message: "Review created successfully",
            review: created,
        }),
    ))
}

/// Vote body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteRequest {
    pub user_email: Option<String>,
    pub vote: Option<String>,
}

/// Counters after a vote.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteResponse {
    pub message: &'static str,
    pub helpful: i32,
    pub not_helpful: i32,
}

/// Vote a review helpful or not helpful; repeating a vote withdraws it.
///
/// POST /api/reviews/{id}/vote
#[instrument(skip(state, body))]
pub async fn vote(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ReviewId>,
    ApiJson(body): ApiJson<VoteRequest>,
) -> Result<Json<VoteResponse>> {
    let email = require_email(body.user_email.as_deref())?;
    let vote: VoteKind = body.vote.as_deref().unwrap_or_default().parse()?;
    let user = find_user(&state, &email).await?;

    let counts = ReviewRepository::new(state.pool())
        .vote(id, user.id, vote)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => AppError::NotFound("Review not found".to_owned()),
            e => e.into(),
        })?;

    Ok(Json(VoteResponse {
        message: "Vote recorded",
        helpful: counts.helpful,
        not_helpful: counts.not_helpful,
    }))
}
