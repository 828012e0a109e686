//! HTTP route handlers for storefront.
//!
//! Every endpoint speaks JSON. Errors are `{"message": "..."}` with the status
//! chosen by [`crate::error::AppError`]. Customers identify themselves with a
//! `userEmail` query parameter or body field.
//!
//! # Route Structure
//!
//! ```text
//! # Products
//! GET    /api/products                 - List (search, category, minPrice, maxPrice, sortBy)
//! POST   /api/products                 - Create
//! GET    /api/products/{id}            - Detail
//! GET    /api/products/{id}/rating     - Rating summary over approved reviews
//!
//! # Reviews
//! GET    /api/reviews                  - Paginated list (productId, userId, rating, sort)
//! POST   /api/reviews                  - Submit a review
//! POST   /api/reviews/{id}/vote        - Helpful / not-helpful toggle
//!
//! # Addresses
//! GET    /api/addresses                - List (type filter)
//! POST   /api/addresses                - Create
//! GET    /api/addresses/{id}           - Detail
//! PUT    /api/addresses/{id}           - Partial update
//! DELETE /api/addresses/{id}           - Soft delete
//!
//! # Cart
//! GET    /api/cart                     - Saved cart
//! DELETE /api/cart                     - Empty the cart
//! POST   /api/cart/items               - Add one unit of a product
//! PUT    /api/cart/items/{productId}   - Set quantity
//! DELETE /api/cart/items/{productId}   - Remove product
//!
//! # Pricing
//! GET    /api/shipping                 - Shipping options for an order
//! POST   /api/shipping/calculate       - Quote one shipping method
//! GET    /api/payment/methods          - Payment options for an amount
//!
//! # Checkout
//! POST   /api/checkout                 - Run the checkout wizard and clear the cart
//! ```

pub mod addresses;
pub mod cart;
pub mod checkout;
pub mod payment;
pub mod products;
pub mod reviews;
pub mod shipping;

use axum::{
    Router,
    extract::{
        FromRequest, FromRequestParts,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    routing::{get, post, put},
};
use rust_decimal::Decimal;

use emporium_core::{Email, parse_amount};

use crate::db::UserRepository;
use crate::error::{AppError, Result, set_sentry_user};
use crate::models::User;
use crate::state::AppState;

/// JSON body extractor whose rejections use the API error format.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// Query string extractor whose rejections use the API error format.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);

/// Path extractor whose rejections use the API error format.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct ApiPath<T>(pub T);

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        Self::NotFound(rejection.body_text())
    }
}

/// Read the caller's email.
///
/// # Errors
///
/// Returns `AppError::Unauthorized` when the email is missing or blank and
/// `AppError::BadRequest` when it is malformed.
pub fn require_email(raw: Option<&str>) -> Result<Email> {
    let raw = raw
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .ok_or_else(|| AppError::Unauthorized("User email required".to_owned()))?;
    Email::parse(raw).map_err(|e| AppError::BadRequest(e.to_string()))
}

/// Load the customer with `email` and tag the Sentry scope with them.
///
/// # Errors
///
/// Returns `AppError::NotFound` when no customer has the email.
pub async fn find_user(state: &AppState, email: &Email) -> Result<User> {
    let user = UserRepository::new(state.pool())
        .get_by_email(email)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_owned()))?;

    set_sentry_user(&user.id, Some(user.email.as_str()));
    Ok(user)
}

/// [`require_email`] followed by [`find_user`].
///
/// # Errors
///
/// See both functions.
pub async fn resolve_user(state: &AppState, email: Option<&str>) -> Result<User> {
    let email = require_email(email)?;
    find_user(state, &email).await
}

/// Read a strictly positive amount from a query value.
///
/// # Errors
///
/// Returns `AppError::BadRequest` with `message` when the value is missing,
/// not a number, not above zero or larger than a stored amount.
pub fn positive_amount(raw: Option<&str>, message: &str) -> Result<Decimal> {
    raw.and_then(|raw| parse_amount(raw).ok())
        .filter(|amount| *amount > Decimal::ZERO)
        .ok_or_else(|| AppError::BadRequest(message.to_owned()))
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index).post(products::create))
        .route("/{id}", get(products::show))
        .route("/{id}/rating", get(products::rating))
}

/// Create the review routes router.
pub fn review_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(reviews::index).post(reviews::create))
        .route("/{id}/vote", post(reviews::vote))
}

/// Create the address routes router.
pub fn address_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(addresses::index).post(addresses::create))
        .route(
            "/{id}",
            get(addresses::show)
                .put(addresses::update)
                .delete(addresses::delete),
        )
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show).delete(cart::clear))
        .route("/items", post(cart::add))
        .route(
            "/items/{product_id}",
            put(cart::update_quantity).delete(cart::remove),
        )
}

/// Create the shipping routes router.
pub fn shipping_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(shipping::index))
        .route("/calculate", post(shipping::calculate))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/api/products", product_routes())
        .nest("/api/reviews", review_routes())
        .nest("/api/addresses", address_routes())
        .nest("/api/cart", cart_routes())
        .nest("/api/shipping", shipping_routes())
        .route("/api/payment/methods", get(payment::index))
        .route("/api/checkout", post(checkout::create))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_require_email() {
        let err = require_email(None).unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(ref m) if m == "User email required"));

        let err = require_email(Some("   ")).unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));

        let err = require_email(Some("not-an-email")).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        assert_eq!(
            require_email(Some(" ayse@example.com ")).unwrap().as_str(),
            "ayse@example.com"
        );
    }

    #[test]
    fn test_positive_amount() {
        assert_eq!(
            positive_amount(Some(" 250.50 "), "Invalid order value").unwrap(),
            Decimal::new(25050, 2)
        );

        for raw in [
            None,
            Some(""),
            Some("0"),
            Some("-5"),
            Some("abc"),
            Some("50000000000000000000000000000"),
        ] {
            let err = positive_amount(raw, "Invalid order value").unwrap_err();
            assert!(matches!(err, AppError::BadRequest(ref m) if m == "Invalid order value"));
        }
    }
}
