//! Product search route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Query, State};
use serde::Deserialize;
use tracing::instrument;

use super::views::{HeaderView, ProductView, SEARCH_CATEGORIES};
use crate::error::Result;
use crate::filters;
use crate::middleware::{CspNonce, OptionalAuth};
use crate::state::AppState;

/// Longest search term passed to the backend.
const MAX_QUERY_LEN: usize = 100;

/// Search query parameters.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
    #[serde(default)]
    pub category: String,
}

/// Search results page template.
#[derive(Template, WebTemplate)]
#[template(path = "search.html")]
pub struct SearchTemplate {
    pub header: HeaderView,
    pub nonce: String,
    pub query: String,
    /// Label of the selected category, if one is applied.
    pub category_label: Option<&'static str>,
    pub products: Vec<ProductView>,
}

/// Resolve a category select value. Unknown values (including "All
/// Categories") mean no filter.
fn known_category(value: &str) -> Option<(&'static str, &'static str)> {
    SEARCH_CATEGORIES
        .iter()
        .copied()
        .find(|(slug, _)| *slug == value)
}

/// Display search results.
///
/// # Errors
///
/// Returns an error if the catalog cannot be queried.
#[instrument(skip(state, auth, nonce))]
pub async fn search(
    State(state): State<AppState>,
    OptionalAuth(auth): OptionalAuth,
    CspNonce(nonce): CspNonce,
    Query(params): Query<SearchQuery>,
) -> Result<SearchTemplate> {
    let query: String = params.q.trim().chars().take(MAX_QUERY_LEN).collect();
    let category = known_category(params.category.trim());

    let products = state
        .catalog()
        .search(&query, category.map(|(slug, _)| slug))
        .await?;
    tracing::debug!(results = products.len(), "Search complete");

    Ok(SearchTemplate {
        header: HeaderView::load(&state, auth.as_ref())
            .await
            .with_search(&query, category.map_or("", |(slug, _)| slug)),
        nonce,
        query,
        category_label: category.map(|(_, label)| label),
        products: products.iter().map(ProductView::from).collect(),
    })
}
