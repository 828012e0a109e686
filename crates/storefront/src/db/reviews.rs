//! Review and helpfulness vote storage.

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder, Transaction};
use tracing::{debug, instrument};

use emporium_core::review::{
    Rating, ReviewSort, ValidReview, VoteCounts, VoteKind, average_rating, cast_vote,
};
use emporium_core::{Pagination, ProductId, ReviewId, UserId};

use super::{RepositoryError, parse_column};
use crate::models::{Review, User};
use crate::models::review::Reviewer;

const REVIEW_COLUMNS: &str = "r.id, r.user_id, u.name AS user_name, r.product_id, r.rating, \
     r.title, r.comment, r.pros, r.cons, r.images, r.verified, r.helpful, r.not_helpful, \
     r.approved, r.created_at, r.updated_at";

/// Filters and paging for [`ReviewRepository::list`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ReviewListQuery {
    pub product_id: Option<ProductId>,
    pub user_id: Option<UserId>,
    pub rating: Option<Rating>,
    pub sort: ReviewSort,
    pub page: u32,
    pub limit: u32,
}

#[derive(sqlx::FromRow)]
struct ReviewRow {
    id: ReviewId,
    user_id: UserId,
    user_name: String,
    product_id: ProductId,
    rating: i16,
    title: String,
    comment: String,
    pros: Vec<String>,
    cons: Vec<String>,
    images: Vec<String>,
    verified: bool,
    helpful: i32,
    not_helpful: i32,
    approved: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ReviewRow> for Review {
    type Error = RepositoryError;

    fn try_from(row: ReviewRow) -> Result<Self, Self::Error> {
        let rating = Rating::try_from(i64::from(row.rating)).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid rating in database: {e}"))
        })?;

        Ok(Self {
            id: row.id,
            user: Reviewer {
                id: row.user_id,
                name: row.user_name,
            },
            product_id: row.product_id,
            rating,
            title: row.title,
            comment: row.comment,
            pros: row.pros,
            cons: row.cons,
            images: row.images,
            verified: row.verified,
            votes: VoteCounts {
                helpful: row.helpful,
                not_helpful: row.not_helpful,
            },
            approved: row.approved,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Repository for review database operations.
pub struct ReviewRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ReviewRepository<'a> {
    /// Create a new review repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// One page of approved reviews plus the total number of matches.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    #[instrument(skip(self))]
    pub async fn list(
        &self,
        query: &ReviewListQuery,
    ) -> Result<(Vec<Review>, u64), RepositoryError> {
        let mut count: QueryBuilder<'_, Postgres> =
            QueryBuilder::new("SELECT COUNT(*) FROM storefront.review r WHERE r.approved");
        push_filters(&mut count, query);
        let (total,): (i64,) = count.build_query_as().fetch_one(self.pool).await?;

        let mut select: QueryBuilder<'_, Postgres> = QueryBuilder::new("SELECT ");
        select.push(REVIEW_COLUMNS);
        select.push(
            " FROM storefront.review r JOIN storefront.user u ON u.id = r.user_id WHERE r.approved",
        );
        push_filters(&mut select, query);
        select.push(match query.sort {
            ReviewSort::Newest => " ORDER BY r.created_at DESC, r.id DESC",
            ReviewSort::Oldest => " ORDER BY r.created_at ASC, r.id ASC",
            ReviewSort::HighestRating => " ORDER BY r.rating DESC, r.created_at DESC",
            ReviewSort::LowestRating => " ORDER BY r.rating ASC, r.created_at DESC",
            ReviewSort::MostHelpful => " ORDER BY r.helpful DESC, r.created_at DESC",
        });
        select.push(" LIMIT ");
        select.push_bind(i64::from(query.limit.clamp(1, Pagination::MAX_LIMIT)));
        select.push(" OFFSET ");
        select.push_bind(Pagination::offset(query.page, query.limit));

        let rows = select
            .build_query_as::<ReviewRow>()
            .fetch_all(self.pool)
            .await?;
        let reviews = rows
            .into_iter()
            .map(Review::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        let total = u64::try_from(total).unwrap_or_default();
        debug!(count = reviews.len(), total, "Listed reviews");
        Ok((reviews, total))
    }

    /// Store a review and refresh the product's rating and review count.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    /// Returns `RepositoryError::Conflict` if the user already reviewed it.
    /// Returns `RepositoryError::Database` for other database errors.
    #[instrument(skip(self, user, review), fields(user_id = %user.id, product_id = %review.product_id))]
    pub async fn create(&self, user: &User, review: &ValidReview) -> Result<Review, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let product: Option<(ProductId,)> =
            sqlx::query_as("SELECT id FROM storefront.product WHERE id = $1 FOR UPDATE")
                .bind(review.product_id)
                .fetch_optional(&mut *tx)
                .await?;
        if product.is_none() {
            return Err(RepositoryError::NotFound);
        }

        let row = sqlx::query_as::<_, ReviewRow>(
            r"
            INSERT INTO storefront.review
                (user_id, product_id, rating, title, comment, pros, cons, images)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, user_id, ''::text AS user_name, product_id, rating, title, comment,
                      pros, cons, images, verified, helpful, not_helpful, approved,
                      created_at, updated_at
            ",
        )
        .bind(user.id)
        .bind(review.product_id)
        .bind(i16::from(review.rating))
        .bind(&review.title)
        .bind(&review.comment)
        .bind(&review.pros)
        .bind(&review.cons)
        .bind(&review.images)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict(
                    "You have already reviewed this product".to_owned(),
                );
            }
            RepositoryError::Database(e)
        })?;

        refresh_product_rating(&mut tx, review.product_id).await?;
        tx.commit().await?;

        let mut created = Review::try_from(row)?;
        created.user.name.clone_from(&user.name);
        debug!(id = %created.id, "Created review");
        Ok(created)
    }

    /// Record a helpfulness vote with toggle semantics.
    ///
    /// Returns the review's counters after the vote.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the review does not exist.
    /// Returns `RepositoryError::Database` for other database errors.
    #[instrument(skip(self))]
    pub async fn vote(
        &self,
        review_id: ReviewId,
        user_id: UserId,
        vote: VoteKind,
    ) -> Result<VoteCounts, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let counts: Option<(i32, i32)> = sqlx::query_as(
            r"
            SELECT helpful, not_helpful
            FROM storefront.review
            WHERE id = $1
            FOR UPDATE
            ",
        )
        .bind(review_id)
        .fetch_optional(&mut *tx)
        .await?;
        let Some((helpful, not_helpful)) = counts else {
            return Err(RepositoryError::NotFound);
        };

        let previous: Option<(String,)> = sqlx::query_as(
            r"
            SELECT vote
            FROM storefront.review_vote
            WHERE review_id = $1 AND user_id = $2
            ",
        )
        .bind(review_id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;
        let previous = previous
            .map(|(raw,)| parse_column::<VoteKind>(&raw, "vote"))
            .transpose()?;

        let outcome = cast_vote(
            VoteCounts {
                helpful,
                not_helpful,
            },
            previous,
            vote,
        );

        match outcome.recorded {
            Some(kind) => {
                sqlx::query(
                    r"
                    INSERT INTO storefront.review_vote (review_id, user_id, vote)
                    VALUES ($1, $2, $3)
                    ON CONFLICT (review_id, user_id)
                    DO UPDATE SET vote = EXCLUDED.vote, created_at = now()
                    ",
                )
                .bind(review_id)
                .bind(user_id)
                .bind(kind.as_str())
                .execute(&mut *tx)
                .await?;
            }
            None => {
                sqlx::query(
                    "DELETE FROM storefront.review_vote WHERE review_id = $1 AND user_id = $2",
                )
                .bind(review_id)
                .bind(user_id)
                .execute(&mut *tx)
                .await?;
            }
        }

        sqlx::query(
            r"
            UPDATE storefront.review
            SET helpful = $2, not_helpful = $3, updated_at = now()
            WHERE id = $1
            ",
        )
        .bind(review_id)
        .bind(outcome.counts.helpful)
        .bind(outcome.counts.not_helpful)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        debug!(recorded = ?outcome.recorded, "Recorded vote");
        Ok(outcome.counts)
    }
}

fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, query: &ReviewListQuery) {
    if let Some(product_id) = query.product_id {
        builder.push(" AND r.product_id = ");
        builder.push_bind(product_id);
    }
    if let Some(user_id) = query.user_id {
        builder.push(" AND r.user_id = ");
        builder.push_bind(user_id);
    }
    if let Some(rating) = query.rating {
        builder.push(" AND r.rating = ");
        builder.push_bind(i16::from(rating));
    }
}

async fn refresh_product_rating(
    tx: &mut Transaction<'_, Postgres>,
    product_id: ProductId,
) -> Result<(), RepositoryError> {
    let (count, sum): (i64, i64) = sqlx::query_as(
        r"
        SELECT COUNT(*), COALESCE(SUM(rating), 0)::bigint
        FROM storefront.review
        WHERE product_id = $1 AND approved
        ",
    )
    .bind(product_id)
    .fetch_one(&mut **tx)
    .await?;

    let out_of_range =
        |_| RepositoryError::DataCorruption("review totals out of range".to_owned());
    let count = u32::try_from(count).map_err(out_of_range)?;
    let sum = u32::try_from(sum).map_err(out_of_range)?;
    let num_reviews = i32::try_from(count).map_err(out_of_range)?;

    sqlx::query(
        r"
        UPDATE storefront.product
        SET rating = $2, num_reviews = $3
        WHERE id = $1
        ",
    )
    .bind(product_id)
    .bind(average_rating(sum, count))
    .bind(num_reviews)
    .execute(&mut **tx)
    .await?;

    Ok(())
}
