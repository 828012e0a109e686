//! Cart route handlers.
//!
//! Each change runs inside [`CartRepository::update`]: the customer's saved
//! items are loaded under a lock into a [`CartState`], checked, changed by one
//! [`CartAction`] and saved back when they changed.

use axum::{Json, extract::State};
use serde::Deserialize;
use tracing::{debug, instrument};

use emporium_core::cart::{CartAction, CartSnapshot, CartState, require_session};
use emporium_core::{ProductId, UserId};

use super::{ApiJson, ApiPath, ApiQuery, resolve_user};
use crate::db::{CartRepository, ProductRepository};
use crate::error::{AppError, Result};
use crate::state::AppState;

/// Customer identification in the query string.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartQuery {
    pub user_email: Option<String>,
}

/// Load the saved cart of `user_id`.
pub(crate) async fn load_cart(state: &AppState, user_id: UserId) -> Result<CartState> {
    let items = CartRepository::new(state.pool()).load(user_id).await?;
    let mut cart = CartState::new();
    cart.apply(CartAction::Load(items));
    Ok(cart)
}

/// Run `change` on the locked cart of `user_id` and return the result.
async fn update_cart<F>(
    state: &AppState,
    user_id: UserId,
    change: F,
) -> Result<Json<CartSnapshot>>
where
    F: FnOnce(CartState) -> Result<CartState>,
{
    let cart = CartRepository::new(state.pool())
        .update(user_id, change)
        .await?;
    Ok(Json(cart.snapshot()))
}

/// Check that one more unit of a product fits in its known stock.
fn check_stock(cart: &CartState, product_id: ProductId, stock: i32) -> Result<()> {
    if stock <= 0 {
        return Err(AppError::BadRequest("Product is out of stock".to_owned()));
    }
    let in_cart = cart.get(product_id).map_or(0, |item| item.quantity);
    if i64::from(in_cart) >= i64::from(stock) {
        return Err(AppError::BadRequest(format!("Only {stock} left in stock")));
    }
    Ok(())
}

/// Check an absolute quantity against the stock recorded on the cart line.
fn check_quantity(cart: &CartState, product_id: ProductId, quantity: i64) -> Result<()> {
    let stock = cart.get(product_id).and_then(|item| item.stock);
    match stock {
        Some(stock) if quantity > i64::from(stock) => {
            Err(AppError::BadRequest(format!("Only {stock} left in stock")))
        }
        _ => Ok(()),
    }
}

/// Show the saved cart.
///
/// GET /api/cart?userEmail=
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<CartQuery>,
) -> Result<Json<CartSnapshot>> {
    let user = resolve_user(&state, query.user_email.as_deref()).await?;
    let cart = load_cart(&state, user.id).await?;
    Ok(Json(cart.snapshot()))
}

/// Add-to-cart body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddItemRequest {
    pub user_email: Option<String>,
    pub product_id: ProductId,
    /// Page to come back to after signing in.
    pub return_to: Option<String>,
}

/// Add one unit of a product.
///
/// POST /api/cart/items
///
/// # Errors
///
/// Returns 401 with a login redirect when no customer is given, 404 for an
/// unknown product and 400 when the product is out of stock.
#[instrument(skip(state, body), fields(product_id = %body.product_id))]
pub async fn add(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<AddItemRequest>,
) -> Result<Json<CartSnapshot>> {
    let return_to = body
        .return_to
        .clone()
        .unwrap_or_else(|| format!("/product/{}", body.product_id));

    let user = match body.user_email.as_deref().map(str::trim) {
        Some(email) if !email.is_empty() => Some(resolve_user(&state, Some(email)).await?),
        _ => None,
    };
    let user_id = require_session(user.map(|u| u.id), &return_to)?;

    let product = ProductRepository::new(state.pool())
        .get(body.product_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".to_owned()))?;

    debug!("Adding product to cart");
    update_cart(&state, user_id, |cart| {
        check_stock(&cart, product.id, product.stock)?;
        Ok(cart.reduce(CartAction::AddItem(product.to_cart_product())))
    })
    .await
}

/// Quantity change body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateQuantityRequest {
    pub user_email: Option<String>,
    pub quantity: i64,
}

/// Set the quantity of a product; zero or less removes it.
///
/// PUT /api/cart/items/{productId}
#[instrument(skip(state, body))]
pub async fn update_quantity(
    State(state): State<AppState>,
    ApiPath(product_id): ApiPath<ProductId>,
    ApiJson(body): ApiJson<UpdateQuantityRequest>,
) -> Result<Json<CartSnapshot>> {
    let user = resolve_user(&state, body.user_email.as_deref()).await?;
    update_cart(&state, user.id, |cart| {
        check_quantity(&cart, product_id, body.quantity)?;
        Ok(cart.reduce(CartAction::UpdateQuantity {
            product_id,
            quantity: body.quantity,
        }))
    })
    .await
}

/// Remove a product.
///
/// DELETE /api/cart/items/{productId}?userEmail=
#[instrument(skip(state))]
pub async fn remove(
    State(state): State<AppState>,
    ApiPath(product_id): ApiPath<ProductId>,
    ApiQuery(query): ApiQuery<CartQuery>,
) -> Result<Json<CartSnapshot>> {
    let user = resolve_user(&state, query.user_email.as_deref()).await?;
    update_cart(&state, user.id, |cart| {
        Ok(cart.reduce(CartAction::RemoveItem(product_id)))
    })
    .await
}

/// Empty the cart.
///
/// DELETE /api/cart?userEmail=
#[instrument(skip(state))]
pub async fn clear(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<CartQuery>,
) -> Result<Json<CartSnapshot>> {
    let user = resolve_user(&state, query.user_email.as_deref()).await?;
    update_cart(&state, user.id, |cart| Ok(cart.reduce(CartAction::Clear))).await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use emporium_core::cart::{CartItem, CartProduct};
    use rust_decimal::Decimal;

    use super::*;

    fn cart_with(quantity: u32, stock: Option<i32>) -> CartState {
        CartState::from_items(vec![CartItem {
            product_id: ProductId::new(1),
            name: "Kahve Makinesi".to_owned(),
            price: Decimal::new(1299, 0),
            category: "Home".to_owned(),
            image: "/images/1.jpg".to_owned(),
            quantity,
            stock,
        }])
    }

    #[test]
    fn test_out_of_stock_rejected() {
        let err = check_stock(&CartState::new(), ProductId::new(1), 0).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(ref m) if m == "Product is out of stock"));
    }

    #[test]
    fn test_add_beyond_stock_rejected() {
        let cart = cart_with(3, Some(3));
        let err = check_stock(&cart, ProductId::new(1), 3).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(ref m) if m == "Only 3 left in stock"));

        assert!(check_stock(&cart_with(2, Some(3)), ProductId::new(1), 3).is_ok());
    }

    #[test]
    fn test_quantity_above_known_stock_rejected() {
        let cart = cart_with(1, Some(4));
        assert!(check_quantity(&cart, ProductId::new(1), 4).is_ok());
        assert!(check_quantity(&cart, ProductId::new(1), 5).is_err());

        // Unknown stock and absent products are not limited.
        assert!(check_quantity(&cart_with(1, None), ProductId::new(1), 99).is_ok());
        assert!(check_quantity(&cart, ProductId::new(2), 99).is_ok());
    }

    #[test]
    fn test_add_action_opens_cart() {
        let cart = CartState::new().reduce(CartAction::AddItem(CartProduct {
            product_id: ProductId::new(9),
            name: "Defter".to_owned(),
            price: Decimal::new(45, 0),
            category: "Office".to_owned(),
            image: "/images/9.jpg".to_owned(),
            stock: Some(10),
        }));
        let snapshot = cart.snapshot();
        assert!(snapshot.is_open);
        assert_eq!(snapshot.item_count, 1);
    }
}
