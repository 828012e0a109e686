//! Cart state machine.
//!
//! [`CartState`] holds the items in display order plus the drawer visibility
//! flag. It changes only through [`CartState::apply`]; totals are computed
//! from the items on demand and never stored.
//!
//! Adding to the cart requires a signed-in customer. That check lives in
//! [`require_session`], which callers run before dispatching
//! [`CartAction::AddItem`]; the reducer itself never looks at identity.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{ProductId, UserId};

/// Path of the sign-in page.
pub const LOGIN_PATH: &str = "/login";

/// A product line in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub product_id: ProductId,
    pub name: String,
    pub price: Decimal,
    pub category: String,
    pub image: String,
    pub quantity: u32,
    /// Known stock when the item was added, if any.
    #[serde(default)]
    pub stock: Option<i32>,
}

impl CartItem {
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

/// Product details carried by an add action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartProduct {
    pub product_id: ProductId,
    pub name: String,
    pub price: Decimal,
    pub category: String,
    pub image: String,
    #[serde(default)]
    pub stock: Option<i32>,
}

/// Everything that can happen to a cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartAction {
    /// Add one unit, appending the product if it is not in the cart yet.
    /// Opens the cart.
    AddItem(CartProduct),
    /// Drop a product. Absent products are ignored.
    RemoveItem(ProductId),
    /// Set an absolute quantity; zero or less removes the product.
    UpdateQuantity { product_id: ProductId, quantity: i64 },
    /// Empty the cart without touching visibility.
    Clear,
    Toggle,
    SetOpen(bool),
    /// Replace the items wholesale, e.g. when restoring a saved cart.
    Load(Vec<CartItem>),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CartState {
    items: Vec<CartItem>,
    is_open: bool,
}

impl CartState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore a cart from saved items, closed.
    #[must_use]
    pub fn from_items(items: Vec<CartItem>) -> Self {
        Self::new().reduce(CartAction::Load(items))
    }

    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    #[must_use]
    pub fn into_items(self) -> Vec<CartItem> {
        self.items
    }

    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.is_open
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sum of price x quantity over all items.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.items.iter().map(CartItem::line_total).sum()
    }

    /// Sum of quantities over all items.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }

    #[must_use]
    pub fn get(&self, product_id: ProductId) -> Option<&CartItem> {
        self.items.iter().find(|item| item.product_id == product_id)
    }

    /// Apply an action in place.
    pub fn apply(&mut self, action: CartAction) {
        match action {
            CartAction::AddItem(product) => {
                if let Some(item) = self
                    .items
                    .iter_mut()
                    .find(|item| item.product_id == product.product_id)
                {
                    item.quantity = item.quantity.saturating_add(1);
                } else {
                    self.items.push(CartItem {
                        product_id: product.product_id,
                        name: product.name,
                        price: product.price,
                        category: product.category,
                        image: product.image,
                        quantity: 1,
                        stock: product.stock,
                    });
                }
                self.is_open = true;
            }
            CartAction::RemoveItem(product_id) => {
                self.items.retain(|item| item.product_id != product_id);
            }
            CartAction::UpdateQuantity {
                product_id,
                quantity,
            } => {
                if quantity <= 0 {
                    self.apply(CartAction::RemoveItem(product_id));
                } else if let Some(item) = self
                    .items
                    .iter_mut()
                    .find(|item| item.product_id == product_id)
                {
                    item.quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
                }
            }
            CartAction::Clear => self.items.clear(),
            CartAction::Toggle => self.is_open = !self.is_open,
            CartAction::SetOpen(open) => self.is_open = open,
            CartAction::Load(items) => self.items = items,
        }
    }

    /// Consume the state and return it with `action` applied.
    #[must_use]
    pub fn reduce(mut self, action: CartAction) -> Self {
        self.apply(action);
        self
    }

    #[must_use]
    pub fn snapshot(&self) -> CartSnapshot {
        CartSnapshot {
            items: self.items.clone(),
            total: self.total(),
            item_count: self.item_count(),
            is_open: self.is_open,
        }
    }
}

/// Serializable view of a cart with its derived totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartSnapshot {
    pub items: Vec<CartItem>,
    pub total: Decimal,
    pub item_count: u32,
    pub is_open: bool,
}

/// The customer must sign in before the cart can change.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Sign in to add items to your cart")]
pub struct SignInRequired {
    /// Login page URL that returns the customer to where they were.
    pub redirect: String,
}

/// Check that a customer is signed in before adding to the cart.
///
/// # Errors
///
/// Returns [`SignInRequired`] pointing at the login page with `return_to` as
/// the callback when `user` is `None`.
pub fn require_session(user: Option<UserId>, return_to: &str) -> Result<UserId, SignInRequired> {
    user.ok_or_else(|| SignInRequired {
        redirect: format!(
            "{LOGIN_PATH}?callbackUrl={}",
            urlencoding::encode(return_to)
        ),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn product(id: i32, price: i64) -> CartProduct {
        CartProduct {
            product_id: ProductId::new(id),
            name: format!("Product {id}"),
            price: Decimal::new(price, 0),
            category: "Electronics".to_owned(),
            image: format!("/images/{id}.jpg"),
            stock: Some(10),
        }
    }

    #[test]
    fn test_repeated_add_accumulates_one_line() {
        let mut cart = CartState::new();
        for _ in 0..5 {
            cart.apply(CartAction::AddItem(product(1, 100)));
        }
        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.items()[0].quantity, 5);
    }

    #[test]
    fn test_add_keeps_existing_fields_and_opens() {
        let mut cart = CartState::new();
        cart.apply(CartAction::AddItem(product(1, 100)));
        cart.apply(CartAction::SetOpen(false));

        let mut renamed = product(1, 999);
        renamed.name = "Renamed".to_owned();
        cart.apply(CartAction::AddItem(renamed));

        let item = cart.get(ProductId::new(1)).unwrap();
        assert_eq!(item.name, "Product 1");
        assert_eq!(item.price, Decimal::new(100, 0));
        assert!(cart.is_open());
    }

    #[test]
    fn test_totals_are_derived() {
        let cart = CartState::new()
            .reduce(CartAction::AddItem(product(1, 100)))
            .reduce(CartAction::AddItem(product(1, 100)))
            .reduce(CartAction::AddItem(product(2, 50)));
        assert_eq!(cart.total(), Decimal::new(250, 0));
        assert_eq!(cart.item_count(), 3);

        let cart = cart.reduce(CartAction::UpdateQuantity {
            product_id: ProductId::new(2),
            quantity: 4,
        });
        assert_eq!(cart.total(), Decimal::new(400, 0));
        assert_eq!(cart.item_count(), 6);
    }

    #[test]
    fn test_update_to_zero_equals_remove() {
        let base = CartState::new()
            .reduce(CartAction::AddItem(product(1, 100)))
            .reduce(CartAction::AddItem(product(2, 50)));

        let updated = base.clone().reduce(CartAction::UpdateQuantity {
            product_id: ProductId::new(1),
            quantity: 0,
        });
        let removed = base.clone().reduce(CartAction::RemoveItem(ProductId::new(1)));
        assert_eq!(updated, removed);

        let negative = base.reduce(CartAction::UpdateQuantity {
            product_id: ProductId::new(1),
            quantity: -3,
        });
        assert_eq!(negative, removed);
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let cart = CartState::new().reduce(CartAction::AddItem(product(1, 100)));
        let after = cart.clone().reduce(CartAction::RemoveItem(ProductId::new(99)));
        assert_eq!(cart, after);
    }

    #[test]
    fn test_clear_keeps_visibility() {
        let cart = CartState::new()
            .reduce(CartAction::AddItem(product(1, 100)))
            .reduce(CartAction::Clear);
        assert!(cart.is_empty());
        assert!(cart.is_open());
        assert!(cart.total().is_zero());
    }

    #[test]
    fn test_toggle_does_not_touch_items() {
        let cart = CartState::new().reduce(CartAction::AddItem(product(1, 100)));
        let toggled = cart.clone().reduce(CartAction::Toggle);
        assert_eq!(toggled.items(), cart.items());
        assert!(!toggled.is_open());
    }

    #[test]
    fn test_load_replaces_items_in_order() {
        let items = vec![
            CartItem {
                product_id: ProductId::new(3),
                name: "C".to_owned(),
                price: Decimal::new(1999, 2),
                category: "Books".to_owned(),
                image: String::new(),
                quantity: 2,
                stock: None,
            },
            CartItem {
                product_id: ProductId::new(1),
                name: "A".to_owned(),
                price: Decimal::new(500, 2),
                category: "Books".to_owned(),
                image: String::new(),
                quantity: 1,
                stock: None,
            },
        ];
        let cart = CartState::new()
            .reduce(CartAction::AddItem(product(7, 1)))
            .reduce(CartAction::Load(items.clone()));
        assert_eq!(cart.items(), items.as_slice());
        assert_eq!(cart.total(), Decimal::new(4498, 2));
    }

    #[test]
    fn test_snapshot_serializes_camel_case() {
        let cart = CartState::new().reduce(CartAction::AddItem(product(1, 100)));
        let json = serde_json::to_value(cart.snapshot()).unwrap();
        assert_eq!(json["itemCount"], 1);
        assert_eq!(json["isOpen"], true);
        assert_eq!(json["items"][0]["productId"], 1);
    }

    #[test]
    fn test_require_session() {
        assert_eq!(
            require_session(Some(UserId::new(4)), "/").unwrap(),
            UserId::new(4)
        );

        let err = require_session(None, "/product/12?tab=reviews").unwrap_err();
        assert_eq!(
            err.redirect,
            "/login?callbackUrl=%2Fproduct%2F12%3Ftab%3Dreviews"
        );
    }
}
