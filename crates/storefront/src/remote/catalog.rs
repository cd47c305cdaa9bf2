//! Catalog reads on the `products` table.
//!
//! Listings are cached with `moka` for the configured TTL. Search results are
//! never cached since the key space is unbounded.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use reqwest::Method;
use tracing::{debug, instrument};

use shophub_core::Product;

use super::RemoteError;
use super::client::RestClient;

const PRODUCT_TABLE: &str = "products";
const PRODUCT_SELECT: &str =
    "id,name,description,price,compare_at_price,image_urls,category,created_at";

/// Upper bound on search results per page.
pub const SEARCH_LIMIT: usize = 48;

/// Client for catalog listings and search.
#[derive(Clone)]
pub struct CatalogClient {
    client: RestClient,
    cache: Cache<String, Arc<Vec<Product>>>,
}

impl CatalogClient {
    #[must_use]
    pub fn new(client: RestClient, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(100)
            .time_to_live(ttl)
            .build();
        Self { client, cache }
    }

    /// Newest products, for the "Trending Now" grid.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn trending(&self, limit: usize) -> Result<Arc<Vec<Product>>, RemoteError> {
        let cache_key = format!("trending:{limit}");

        if let Some(products) = self.cache.get(&cache_key).await {
            debug!("Cache hit for trending products");
            return Ok(products);
        }

        let request = self
            .client
            .table(Method::GET, PRODUCT_TABLE, None)
            .query(&[
                ("select", PRODUCT_SELECT.to_string()),
                ("order", "created_at.desc".to_string()),
                ("limit", limit.to_string()),
            ]);
        let products: Arc<Vec<Product>> = Arc::new(self.client.execute_json(request).await?);

        self.cache.insert(cache_key, Arc::clone(&products)).await;
        Ok(products)
    }

    /// Products whose name contains `term` (case-insensitive), optionally
    /// restricted to one category.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn search(
        &self,
        term: &str,
        category: Option<&str>,
    ) -> Result<Vec<Product>, RemoteError> {
        let mut params = vec![
            ("select", PRODUCT_SELECT.to_string()),
            ("order", "name.asc".to_string()),
            ("limit", SEARCH_LIMIT.to_string()),
        ];

        let pattern = ilike_pattern(term);
        if !pattern.is_empty() {
            params.push(("name", format!("ilike.*{pattern}*")));
        }
        if let Some(category) = category.filter(|c| !c.is_empty()) {
            params.push(("category", format!("eq.{category}")));
        }

        let request = self
            .client
            .table(Method::GET, PRODUCT_TABLE, None)
            .query(&params);
        self.client.execute_json(request).await
    }
}

/// Strip characters that carry meaning in filter syntax.
///
/// `*` is the wildcard, `,` `(` `)` delimit logical filters.
fn ilike_pattern(term: &str) -> String {
    term.trim()
        .chars()
        .filter(|c| !matches!(c, '*' | '%' | ',' | '(' | ')' | '"' | '\\'))
        .collect()
}
