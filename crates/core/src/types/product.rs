//! Catalog products.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

use super::id::ProductId;
use super::price::Price;

/// A product row from the catalog table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: Price,
    /// Struck-through "was" price, shown when above `price`.
    #[serde(default)]
    pub compare_at_price: Option<Price>,
    #[serde(default)]
    pub image_urls: Vec<String>,
    #[serde(default)]
    pub category: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Product {
    /// Percentage off the compare-at price, rounded down.
    ///
    /// Returns `None` when there is no compare-at price or it is not above the
    /// current price.
    #[must_use]
    pub fn discount_percent(&self) -> Option<u32> {
        let was = self.compare_at_price?.amount();
        let now = self.price.amount();
        if was <= now || was.is_zero() {
            return None;
        }
        ((was - now) * Decimal::ONE_HUNDRED / was).floor().to_u32()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn product(price: &str, was: Option<&str>) -> Product {
        Product {
            id: ProductId::new("p"),
            name: "Headphones".to_string(),
            description: None,
            price: price.parse().unwrap(),
            compare_at_price: was.map(|w| w.parse().unwrap()),
            image_urls: Vec::new(),
            category: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_discount_percent() {
        assert_eq!(product("199.99", Some("249.99")).discount_percent(), Some(20));
        assert_eq!(product("10", Some("10")).discount_percent(), None);
        assert_eq!(product("10", None).discount_percent(), None);
    }
}
