//! Display data shared by page templates.

use shophub_core::Product;

use crate::remote::AuthSession;
use crate::state::AppState;

/// Category filter offered by the header search select, as `(value, label)`.
pub const SEARCH_CATEGORIES: &[(&str, &str)] = &[
    ("electronics", "Electronics"),
    ("fashion", "Fashion"),
    ("home-living", "Home & Living"),
    ("books", "Books"),
    ("sports", "Sports"),
];

/// Entries in the header's categories bar. Entries without a page render as
/// plain text.
pub const CATEGORY_BAR: &[(Option<&str>, &str)] = &[
    (Some("/search?q=deal"), "Today's Deals"),
    (Some("/search"), "New Arrivals"),
    (Some("/#trending"), "Trending Now"),
    (None, "Customer Service"),
    (None, "Gift Cards"),
    (None, "Sell with Us"),
];

/// Header state: who is signed in, the cart badge and the search box.
#[derive(Clone, Debug, Default)]
pub struct HeaderView {
    /// Registered user's short name; `None` shows "Sign in / Register".
    pub account_name: Option<String>,
    /// Number of cart lines.
    pub cart_count: usize,
    /// Current search term, echoed into the search box.
    pub query: String,
    /// Current category filter value.
    pub category: String,
}

impl HeaderView {
    /// Build the header for a request.
    ///
    /// Loads the user's cart once if their store has never synced; visitors
    /// without a session show an empty badge and get no guest user.
    pub async fn load(state: &AppState, auth: Option<&AuthSession>) -> Self {
        let Some(auth) = auth else {
            return Self::default();
        };

        let store = state.carts().store_for(auth).await;
        store.ensure_loaded().await;

        Self {
            account_name: (!auth.is_anonymous()).then(|| auth.display_name()),
            cart_count: store.snapshot().item_count(),
            query: String::new(),
            category: String::new(),
        }
    }

    #[must_use]
    pub fn search_categories(&self) -> &'static [(&'static str, &'static str)] {
        SEARCH_CATEGORIES
    }

    #[must_use]
    pub fn category_bar(&self) -> &'static [(Option<&'static str>, &'static str)] {
        CATEGORY_BAR
    }

    /// Whether `value` is the category currently selected in the search box.
    #[must_use]
    pub fn is_selected(&self, value: &str) -> bool {
        self.category == value
    }

    /// Echo a search into the header's search box.
    #[must_use]
    pub fn with_search(mut self, query: &str, category: &str) -> Self {
        self.query = query.to_string();
        self.category = category.to_string();
        self
    }
}

/// Product card data for the trending grid and search results.
#[derive(Clone, Debug)]
pub struct ProductView {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: String,
    pub compare_at_price: Option<String>,
    pub discount_percent: Option<u32>,
    pub image: Option<String>,
}

impl From<&Product> for ProductView {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.to_string(),
            name: product.name.clone(),
            description: product.description.clone().unwrap_or_default(),
            price: product.price.display(),
            compare_at_price: product
                .compare_at_price
                .filter(|c| c.amount() > product.price.amount())
                .map(|c| c.display()),
            discount_percent: product.discount_percent(),
            image: product.image_urls.first().cloned(),
        }
    }
}
