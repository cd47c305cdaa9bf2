//! Cart line items.
//!
//! A cart line associates one product with a quantity for the signed-in user.
//! Rows come back from the hosted table API joined with a snapshot of the
//! product's display fields; the snapshot is read-only and never written back.

use serde::{Deserialize, Serialize};

use super::id::{CartItemId, ProductId};
use super::price::Price;

/// One product line in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    /// Line identifier assigned by the backend.
    pub id: CartItemId,
    /// Referenced product.
    pub product_id: ProductId,
    /// Number of units. Positive by contract; not validated here.
    pub quantity: u32,
    /// Product display fields joined at fetch time.
    pub product: ProductSnapshot,
}

/// Denormalized product fields carried on a cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSnapshot {
    /// Display name.
    pub name: String,
    /// Unit price.
    pub price: Price,
    /// Image URLs, first is the primary image.
    #[serde(default)]
    pub image_urls: Vec<String>,
}

impl CartItem {
    /// Unit price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Price {
        let amount = self.product.price.amount() * rust_decimal::Decimal::from(self.quantity);
        Price::new(amount).unwrap_or(Price::ZERO)
    }

    /// First product image, if any.
    #[must_use]
    pub fn primary_image(&self) -> Option<&str> {
        self.product.image_urls.first().map(String::as_str)
    }
}
