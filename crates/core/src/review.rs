//! Product reviews: submission rules, helpful votes and rating summaries.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::ProductId;

static IMAGE_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^https?://.+\.(jpg|jpeg|png|gif|webp)$").expect("Invalid regex")
});

const TITLE_MAX: usize = 100;
const COMMENT_MAX: usize = 1000;
const POINT_MAX: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReviewError {
    #[error("Missing required fields")]
    MissingFields,

    #[error("Rating must be between 1 and 5")]
    RatingOutOfRange,

    #[error("{field} must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },

    #[error("Invalid image URL: {0}")]
    InvalidImageUrl(String),

    #[error("Invalid vote type")]
    InvalidVote,
}

/// Star rating, 1 to 5 inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i16")]
pub struct Rating(u8);

impl Rating {
    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }

    /// Read a rating filter from a query string, ignoring anything that is
    /// not a whole number from 1 to 5.
    #[must_use]
    pub fn from_filter(raw: Option<&str>) -> Option<Self> {
        raw?.trim().parse::<i64>().ok()?.try_into().ok()
    }
}

impl TryFrom<i64> for Rating {
    type Error = ReviewError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match u8::try_from(value) {
            Ok(v @ 1..=5) => Ok(Self(v)),
            _ => Err(ReviewError::RatingOutOfRange),
        }
    }
}

impl From<Rating> for i16 {
    fn from(rating: Rating) -> Self {
        Self::from(rating.0)
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A review as submitted by a customer.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewDraft {
    pub product_id: Option<ProductId>,
    pub rating: Option<i64>,
    pub title: Option<String>,
    pub comment: Option<String>,
    #[serde(default)]
    pub pros: Vec<String>,
    #[serde(default)]
    pub cons: Vec<String>,
    #[serde(default)]
    pub images: Vec<String>,
}

/// A review ready to store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidReview {
    pub product_id: ProductId,
    pub rating: Rating,
    pub title: String,
    pub comment: String,
    pub pros: Vec<String>,
    pub cons: Vec<String>,
    pub images: Vec<String>,
}

impl ReviewDraft {
    /// # Errors
    ///
    /// Returns [`ReviewError::MissingFields`] when the product, rating, title
    /// or comment is absent or blank, and the matching variant for range,
    /// length and image URL problems.
    pub fn validate(&self) -> Result<ValidReview, ReviewError> {
        let title = self.title.as_deref().map(str::trim).unwrap_or_default();
        let comment = self.comment.as_deref().map(str::trim).unwrap_or_default();
        let (Some(product_id), Some(rating)) = (self.product_id, self.rating) else {
            return Err(ReviewError::MissingFields);
        };
        if rating == 0 || title.is_empty() || comment.is_empty() {
            return Err(ReviewError::MissingFields);
        }

        let rating = Rating::try_from(rating)?;
        check_len(title, "title", TITLE_MAX)?;
        check_len(comment, "comment", COMMENT_MAX)?;

        let pros = clean_points(&self.pros, "pros")?;
        let cons = clean_points(&self.cons, "cons")?;

        let images: Vec<String> = self
            .images
            .iter()
            .map(|url| url.trim())
            .filter(|url| !url.is_empty())
            .map(str::to_owned)
            .collect();
        if let Some(bad) = images.iter().find(|url| !IMAGE_URL.is_match(url)) {
            return Err(ReviewError::InvalidImageUrl(bad.clone()));
        }

        Ok(ValidReview {
            product_id,
            rating,
            title: title.to_owned(),
            comment: comment.to_owned(),
            pros,
            cons,
            images,
        })
    }
}

fn check_len(value: &str, field: &'static str, max: usize) -> Result<(), ReviewError> {
    if value.chars().count() > max {
        return Err(ReviewError::TooLong { field, max });
    }
    Ok(())
}

fn clean_points(points: &[String], field: &'static str) -> Result<Vec<String>, ReviewError> {
    points
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .map(|p| check_len(p, field, POINT_MAX).map(|()| p.to_owned()))
        .collect()
}

/// Direction of a helpfulness vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VoteKind {
    Helpful,
    NotHelpful,
}

impl VoteKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Helpful => "helpful",
            Self::NotHelpful => "not-helpful",
        }
    }
}

impl FromStr for VoteKind {
    type Err = ReviewError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "helpful" => Ok(Self::Helpful),
            "not-helpful" => Ok(Self::NotHelpful),
            _ => Err(ReviewError::InvalidVote),
        }
    }
}

/// Helpful / not-helpful counters of a review.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteCounts {
    pub helpful: i32,
    pub not_helpful: i32,
}

impl VoteCounts {
    fn bump(&mut self, kind: VoteKind) {
        match kind {
            VoteKind::Helpful => self.helpful = self.helpful.saturating_add(1),
            VoteKind::NotHelpful => self.not_helpful = self.not_helpful.saturating_add(1),
        }
    }

    fn drop_one(&mut self, kind: VoteKind) {
        match kind {
            VoteKind::Helpful => self.helpful = (self.helpful - 1).max(0),
            VoteKind::NotHelpful => self.not_helpful = (self.not_helpful - 1).max(0),
        }
    }
}

/// Result of casting a vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoteOutcome {
    pub counts: VoteCounts,
    /// The customer's vote afterwards; `None` when the vote was withdrawn.
    pub recorded: Option<VoteKind>,
}

/// Cast `vote` on a review where the customer previously voted `previous`.
///
/// Repeating a vote withdraws it; voting the other way switches it.
/// Counters never drop below zero.
#[must_use]
pub fn cast_vote(counts: VoteCounts, previous: Option<VoteKind>, vote: VoteKind) -> VoteOutcome {
    let mut counts = counts;
    let recorded = match previous {
        Some(prev) if prev == vote => {
            counts.drop_one(vote);
            None
        }
        Some(prev) => {
            counts.bump(vote);
            counts.drop_one(prev);
            Some(vote)
        }
        None => {
            counts.bump(vote);
            Some(vote)
        }
    };
    VoteOutcome { counts, recorded }
}

/// Listing order for reviews.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReviewSort {
    #[default]
    Newest,
    Oldest,
    HighestRating,
    LowestRating,
    MostHelpful,
}

impl ReviewSort {
    /// Parse a sort key; unknown keys fall back to newest first.
    #[must_use]
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("oldest") => Self::Oldest,
            Some("highest-rating") => Self::HighestRating,
            Some("lowest-rating") => Self::LowestRating,
            Some("most-helpful") => Self::MostHelpful,
            _ => Self::Newest,
        }
    }
}

/// Count of reviews per star, serialized from five stars down.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RatingBreakdown {
    #[serde(rename = "5")]
    pub five: u32,
    #[serde(rename = "4")]
    pub four: u32,
    #[serde(rename = "3")]
    pub three: u32,
    #[serde(rename = "2")]
    pub two: u32,
    #[serde(rename = "1")]
    pub one: u32,
}

impl RatingBreakdown {
    fn add(&mut self, rating: Rating) {
        let slot = match rating.get() {
            5 => &mut self.five,
            4 => &mut self.four,
            3 => &mut self.three,
            2 => &mut self.two,
            _ => &mut self.one,
        };
        *slot += 1;
    }
}

/// Aggregate of a product's approved reviews.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingSummary {
    /// Mean rating rounded to one decimal; zero without reviews.
    pub average_rating: Decimal,
    pub total_reviews: u32,
    pub rating_breakdown: RatingBreakdown,
}

impl RatingSummary {
    #[must_use]
    pub fn from_ratings<I>(ratings: I) -> Self
    where
        I: IntoIterator<Item = Rating>,
    {
        let mut summary = Self::default();
        let mut sum = 0u32;
        for rating in ratings {
            summary.total_reviews += 1;
            sum += u32::from(rating.get());
            summary.rating_breakdown.add(rating);
        }
        summary.average_rating = average_rating(sum, summary.total_reviews);
        summary
    }
}

/// Mean of `count` ratings summing to `sum`, rounded half-up to one decimal.
#[must_use]
pub fn average_rating(sum: u32, count: u32) -> Decimal {
    if count == 0 {
        return Decimal::ZERO;
    }
    let mean = Decimal::from(sum) / Decimal::from(count);
    let ten = Decimal::TEN;
    let mut rounded = ((mean * ten) + Decimal::new(5, 1)).floor() / ten;
    rounded.rescale(1);
    rounded
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn draft() -> ReviewDraft {
        ReviewDraft {
            product_id: Some(ProductId::new(3)),
            rating: Some(4),
            title: Some(" Solid ".to_owned()),
            comment: Some("Works as described.".to_owned()),
            pros: vec![" light ".to_owned(), "  ".to_owned(), "cheap".to_owned()],
            cons: vec![String::new()],
            images: vec!["https://cdn.example.com/a.JPG".to_owned()],
        }
    }

    fn r(v: i64) -> Rating {
        Rating::try_from(v).unwrap()
    }

    #[test]
    fn test_validate_cleans_lists() {
        let review = draft().validate().unwrap();
        assert_eq!(review.title, "Solid");
        assert_eq!(review.pros, vec!["light", "cheap"]);
        assert!(review.cons.is_empty());
        assert_eq!(review.images.len(), 1);
    }

    #[test]
    fn test_validate_missing_fields() {
        let mut d = draft();
        d.comment = Some("   ".to_owned());
        assert_eq!(d.validate().unwrap_err(), ReviewError::MissingFields);

        let mut d = draft();
        d.product_id = None;
        assert_eq!(d.validate().unwrap_err(), ReviewError::MissingFields);
    }

    #[test]
    fn test_validate_rating_range() {
        let mut d = draft();
        d.rating = Some(6);
        assert_eq!(d.validate().unwrap_err(), ReviewError::RatingOutOfRange);
        d.rating = Some(-1);
        assert_eq!(d.validate().unwrap_err(), ReviewError::RatingOutOfRange);
    }

    #[test]
    fn test_validate_image_urls() {
        let mut d = draft();
        d.images = vec!["ftp://x.com/a.png".to_owned()];
        assert!(matches!(
            d.validate().unwrap_err(),
            ReviewError::InvalidImageUrl(_)
        ));
        d.images = vec!["http://x.com/a.webp".to_owned(), "https://x.com/b.gif".to_owned()];
        assert!(d.validate().is_ok());
    }

    #[test]
    fn test_rating_filter_ignores_out_of_range() {
        assert_eq!(Rating::from_filter(Some("5")), Some(r(5)));
        assert_eq!(Rating::from_filter(Some("0")), None);
        assert_eq!(Rating::from_filter(Some("nine")), None);
        assert_eq!(Rating::from_filter(None), None);
    }

    #[test]
    fn test_new_vote_increments() {
        let outcome = cast_vote(VoteCounts::default(), None, VoteKind::Helpful);
        assert_eq!(outcome.counts.helpful, 1);
        assert_eq!(outcome.recorded, Some(VoteKind::Helpful));
    }

    #[test]
    fn test_repeat_vote_withdraws() {
        let counts = VoteCounts {
            helpful: 3,
            not_helpful: 0,
        };
        let outcome = cast_vote(counts, Some(VoteKind::Helpful), VoteKind::Helpful);
        assert_eq!(outcome.counts.helpful, 2);
        assert_eq!(outcome.recorded, None);
    }

    #[test]
    fn test_switched_vote_moves_count_with_floor() {
        let counts = VoteCounts {
            helpful: 0,
            not_helpful: 0,
        };
        let outcome = cast_vote(counts, Some(VoteKind::Helpful), VoteKind::NotHelpful);
        assert_eq!(
            outcome.counts,
            VoteCounts {
                helpful: 0,
                not_helpful: 1
            }
        );
        assert_eq!(outcome.recorded, Some(VoteKind::NotHelpful));
    }

    #[test]
    fn test_vote_kind_parse() {
        assert_eq!("not-helpful".parse::<VoteKind>().unwrap(), VoteKind::NotHelpful);
        assert_eq!("meh".parse::<VoteKind>(), Err(ReviewError::InvalidVote));
    }

    #[test]
    fn test_summary() {
        let summary = RatingSummary::from_ratings([r(5), r(4), r(4)]);
        assert_eq!(summary.total_reviews, 3);
        // 13 / 3 = 4.333..
        assert_eq!(summary.average_rating, Decimal::new(43, 1));
        assert_eq!(summary.rating_breakdown.four, 2);

        let json = serde_json::to_value(summary).unwrap();
        assert_eq!(json["ratingBreakdown"]["5"], 1);
        assert_eq!(json["totalReviews"], 3);
    }

    #[test]
    fn test_empty_summary() {
        let summary = RatingSummary::from_ratings(Vec::<Rating>::new());
        assert!(summary.average_rating.is_zero());
        assert_eq!(summary.total_reviews, 0);
    }

    #[test]
    fn test_average_rounds_half_up() {
        // 4.25 -> 4.3
        assert_eq!(average_rating(17, 4), Decimal::new(43, 1));
        assert_eq!(average_rating(9, 2), Decimal::new(45, 1));
    }

    #[test]
    fn test_sort_parse_defaults_to_newest() {
        assert_eq!(ReviewSort::parse(Some("most-helpful")), ReviewSort::MostHelpful);
        assert_eq!(ReviewSort::parse(Some("random")), ReviewSort::Newest);
        assert_eq!(ReviewSort::parse(None), ReviewSort::Newest);
    }
}
