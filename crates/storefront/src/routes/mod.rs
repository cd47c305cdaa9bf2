//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Home page (hero, categories, trending)
//! GET  /search?q=&category=    - Product search results
//!
//! # Cart (HTMX fragments, rate limited mutations)
//! GET  /cart                   - Cart page (refetches)
//! POST /cart/add               - Add to cart (add-to-cart status fragment)
//! POST /cart/update            - Update quantity (cart_items fragment)
//! POST /cart/remove            - Remove item (cart_items fragment)
//! POST /cart/clear             - Remove every item (cart_items fragment)
//! GET  /cart/count             - Cart count badge (fragment)
//! GET  /cart/events            - Cart count badge (server-sent events)
//!
//! # Auth (rate limited)
//! GET  /auth/login             - Login page
//! POST /auth/login             - Login action
//! GET  /auth/register          - Register page
//! POST /auth/register          - Register action
//! POST /auth/logout            - Logout action
//! ```
//!
//! Health checks and static files are mounted in `main`.

pub mod auth;
pub mod cart;
pub mod home;
pub mod search;
pub mod views;

use axum::{
    Router,
    routing::{get, post},
};

use crate::middleware::{auth_rate_limiter, cart_rate_limiter};
use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    let actions = Router::new()
        .route("/login", post(auth::login))
        .route("/register", post(auth::register))
        .route_layer(auth_rate_limiter());

    Router::new()
        .route("/login", get(auth::login_page))
        .route("/register", get(auth::register_page))
        .route("/logout", post(auth::logout))
        .merge(actions)
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    let mutations = Router::new()
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/clear", post(cart::clear))
        .route_layer(cart_rate_limiter());

    Router::new()
        .route("/", get(cart::show))
        .route("/count", get(cart::count))
        .route("/events", get(cart::events))
        .merge(mutations)
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .route("/search", get(search::search))
        .nest("/cart", cart_routes())
        .nest("/auth", auth_routes())
}
