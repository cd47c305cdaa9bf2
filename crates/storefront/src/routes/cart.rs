//! Cart route handlers.
//!
//! Each action runs one cart store operation and renders from the store's
//! state afterwards. Store failures are not HTTP errors: the store keeps the
//! previous items and records a message, which the fragment shows. HTMX
//! requests get fragments; plain form posts are redirected to the cart page.

use std::convert::Infallible;
use std::pin::Pin;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::HeaderMap,
    response::{
        AppendHeaders, IntoResponse, Redirect, Response,
        sse::{Event, KeepAlive, KeepAliveStream, Sse},
    },
};
use serde::Deserialize;
use tokio_stream::wrappers::WatchStream;
use tokio_stream::{Stream, StreamExt};
use tracing::instrument;

use shophub_core::ProductId;

use super::views::HeaderView;
use crate::cart::CartState;
use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::middleware::{CartContext, CspNonce, OptionalAuth};
use crate::state::AppState;

/// Largest quantity accepted from a form.
pub const MAX_QUANTITY: u32 = 99;

/// SSE event name carrying the badge count.
pub const CART_COUNT_EVENT: &str = "cart-count";

/// Cart line display data for templates.
#[derive(Clone, Debug)]
pub struct CartLineView {
    pub product_id: String,
    pub name: String,
    pub image: Option<String>,
    pub quantity: u32,
    pub price: String,
    pub line_total: String,
}

/// Cart display data for templates.
#[derive(Clone, Debug)]
pub struct CartView {
    pub items: Vec<CartLineView>,
    pub subtotal: String,
    pub item_count: usize,
    /// Message from the last failed cart operation.
    pub error: Option<String>,
}

impl CartView {
    /// Create an empty cart.
    #[must_use]
    pub fn empty() -> Self {
        Self::from(&CartState::default())
    }
}

impl From<&CartState> for CartView {
    fn from(state: &CartState) -> Self {
        Self {
            items: state
                .items
                .iter()
                .map(|item| CartLineView {
                    product_id: item.product_id.to_string(),
                    name: item.product.name.clone(),
                    image: item.primary_image().map(str::to_string),
                    quantity: item.quantity,
                    price: item.product.price.display(),
                    line_total: item.line_total().display(),
                })
                .collect(),
            subtotal: state.subtotal().display(),
            item_count: state.item_count(),
            error: state.error.clone(),
        }
    }
}

// =============================================================================
// Forms
// =============================================================================

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub product_id: String,
    pub quantity: Option<String>,
}

/// Update cart form data.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub product_id: String,
    pub quantity: Option<String>,
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub product_id: String,
}

fn parse_product_id(raw: &str) -> Result<ProductId> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(AppError::BadRequest("product_id is required".to_string()));
    }
    Ok(ProductId::new(raw))
}

/// Quantities must be present and within `1..=MAX_QUANTITY`.
fn parse_quantity(raw: Option<&str>) -> Result<u32> {
    let raw = raw
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::BadRequest("quantity is required".to_string()))?;

    let quantity: u32 = raw
        .parse()
        .map_err(|_| AppError::BadRequest(format!("invalid quantity: {raw}")))?;

    if !(1..=MAX_QUANTITY).contains(&quantity) {
        return Err(AppError::BadRequest(format!(
            "quantity must be between 1 and {MAX_QUANTITY}"
        )));
    }
    Ok(quantity)
}

fn is_htmx(headers: &HeaderMap) -> bool {
    headers.contains_key("hx-request")
}

// =============================================================================
// Templates
// =============================================================================

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub header: HeaderView,
    pub nonce: String,
    pub cart: CartView,
}

/// Cart items fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_items.html")]
pub struct CartItemsTemplate {
    pub cart: CartView,
}

/// Cart count badge fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: usize,
}

/// Inline result of an "Add to Cart" button (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/add_to_cart.html")]
pub struct AddToCartTemplate {
    pub error: Option<String>,
}

/// Fragment response that also tells the page the cart changed.
fn fragment(headers: &HeaderMap, body: impl IntoResponse) -> Response {
    if !is_htmx(headers) {
        return Redirect::to("/cart").into_response();
    }
    (AppendHeaders([("HX-Trigger", "cart-updated")]), body).into_response()
}

// =============================================================================
// Handlers
// =============================================================================

/// Display cart page. Always refetches so the page shows the backend's view.
#[instrument(skip_all)]
pub async fn show(
    State(state): State<AppState>,
    OptionalAuth(auth): OptionalAuth,
    CspNonce(nonce): CspNonce,
) -> impl IntoResponse {
    let cart = match &auth {
        Some(auth) => {
            let store = state.carts().store_for(auth).await;
            store.fetch().await;
            CartView::from(&store.snapshot())
        }
        None => CartView::empty(),
    };

    CartShowTemplate {
        header: HeaderView::load(&state, auth.as_ref()).await,
        nonce,
        cart,
    }
}

/// Add item to cart.
#[instrument(skip_all, fields(user_id = %ctx.auth.user_id))]
pub async fn add(
    ctx: CartContext,
    headers: HeaderMap,
    Form(form): Form<AddToCartForm>,
) -> Result<Response> {
    let product_id = parse_product_id(&form.product_id)?;
    let quantity = parse_quantity(form.quantity.as_deref())?;

    add_breadcrumb("cart", "Add to cart", &[("product_id", product_id.as_str())]);
    ctx.store.add(&product_id, quantity).await;

    let error = ctx.store.snapshot().error;
    Ok(fragment(&headers, AddToCartTemplate { error }))
}

/// Update cart item quantity.
#[instrument(skip_all, fields(user_id = %ctx.auth.user_id))]
pub async fn update(
    ctx: CartContext,
    headers: HeaderMap,
    Form(form): Form<UpdateCartForm>,
) -> Result<Response> {
    let product_id = parse_product_id(&form.product_id)?;
    let quantity = parse_quantity(form.quantity.as_deref())?;

    ctx.store.set_quantity(&product_id, quantity).await;

    let cart = CartView::from(&ctx.store.snapshot());
    Ok(fragment(&headers, CartItemsTemplate { cart }))
}

/// Remove item from cart.
#[instrument(skip_all, fields(user_id = %ctx.auth.user_id))]
pub async fn remove(
    ctx: CartContext,
    headers: HeaderMap,
    Form(form): Form<RemoveFromCartForm>,
) -> Result<Response> {
    let product_id = parse_product_id(&form.product_id)?;

    add_breadcrumb("cart", "Remove from cart", &[("product_id", product_id.as_str())]);
    ctx.store.remove(&product_id).await;

    let cart = CartView::from(&ctx.store.snapshot());
    Ok(fragment(&headers, CartItemsTemplate { cart }))
}

/// Remove every item from the cart.
#[instrument(skip_all, fields(user_id = %ctx.auth.user_id))]
pub async fn clear(ctx: CartContext, headers: HeaderMap) -> Response {
    ctx.store.clear().await;

    let cart = CartView::from(&ctx.store.snapshot());
    fragment(&headers, CartItemsTemplate { cart })
}

/// Get cart count badge (HTMX).
#[instrument(skip_all)]
pub async fn count(
    State(state): State<AppState>,
    OptionalAuth(auth): OptionalAuth,
) -> impl IntoResponse {
    let header = HeaderView::load(&state, auth.as_ref()).await;
    CartCountTemplate {
        count: header.cart_count,
    }
}

type CountStream = Pin<Box<dyn Stream<Item = std::result::Result<Event, Infallible>> + Send>>;

fn count_event(count: usize) -> Event {
    Event::default()
        .event(CART_COUNT_EVENT)
        .data(count.to_string())
}

/// Stream the cart badge count as server-sent events.
///
/// Emits the current count, then a new count whenever an operation on the
/// user's store settles. The stream ends when the store is retired (token
/// refresh, sign-out, idle eviction) so the browser reconnects to the current
/// one. Visitors without a session get a single `0`; the page reopens the
/// stream after its first cart update.
#[instrument(skip_all)]
pub async fn events(
    State(state): State<AppState>,
    OptionalAuth(auth): OptionalAuth,
) -> Sse<KeepAliveStream<CountStream>> {
    let stream: CountStream = match auth {
        Some(auth) => {
            let store = state.carts().store_for(&auth).await;
            store.ensure_loaded().await;

            let counts = WatchStream::new(store.subscribe())
                .filter(|s| !s.loading)
                .map(|s| Some(s.item_count()));
            let retired = WatchStream::new(store.retired())
                .filter(|retired| *retired)
                .map(|_| None);

            Box::pin(
                counts
                    .merge(retired)
                    .map_while(|count| count.map(|c| Ok::<_, Infallible>(count_event(c)))),
            )
        }
        None => Box::pin(tokio_stream::once(Ok(count_event(0))).chain(tokio_stream::pending())),
    };

    Sse::new(stream).keep_alive(KeepAlive::default())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use axum::{
        Router,
        body::Body,
        http::{Request, StatusCode, header},
        routing::get,
    };
    use chrono::{Duration, Utc};
    use tower::ServiceExt;
    use tower_sessions::Session;

    use super::*;
    use crate::cart::{CartStores, MemoryRemote};
    use crate::config::tests::test_config;
    use crate::middleware::{create_session_layer, set_auth_session};
    use crate::remote::{AccessToken, AuthSession, CartRemote, RestClient};

    /// Backend address nothing listens on; only the cart remote is used.
    const DEAD_BACKEND: &str = "http://127.0.0.1:9";

    fn shopper() -> AuthSession {
        AuthSession {
            user_id: shophub_core::UserId::new("u-1"),
            email: None,
            access_token: AccessToken::new("token"),
            refresh_token: AccessToken::new("refresh"),
            expires_at: Utc::now() + Duration::hours(1),
        }
    }

    async fn sign_in_for_test(session: Session) -> StatusCode {
        set_auth_session(&session, &shopper()).await.unwrap();
        StatusCode::NO_CONTENT
    }

    fn app(remote: Arc<MemoryRemote>) -> Router {
        app_with_state(remote).0
    }

    fn app_with_state(remote: Arc<MemoryRemote>) -> (Router, AppState) {
        let config = test_config(DEAD_BACKEND);
        let rest = RestClient::new(&config.supabase).unwrap();
        let carts = CartStores::with_factory(Arc::new(move |_: &AuthSession| {
            Arc::clone(&remote) as Arc<dyn CartRemote>
        }));
        let state = AppState::with_carts(config, rest, carts);

        let router = Router::new()
            .route("/test/sign-in", get(sign_in_for_test))
            .merge(crate::routes::routes())
            .layer(create_session_layer(state.config()))
            .with_state(state.clone());
        (router, state)
    }

    type Frames = std::pin::Pin<Box<axum::body::BodyDataStream>>;

    /// Open the badge stream.
    async fn open_events(app: &Router, cookie: Option<&str>) -> Frames {
        let response = app
            .clone()
            .oneshot(request("GET", "/cart/events", cookie).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        Box::pin(response.into_body().into_data_stream())
    }

    /// Next SSE frame; `Ok(None)` when the stream ended, `Err` on timeout.
    async fn next_frame(frames: &mut Frames) -> std::result::Result<Option<String>, ()> {
        tokio::time::timeout(std::time::Duration::from_millis(500), frames.next())
            .await
            .map(|frame| frame.map(|bytes| String::from_utf8(bytes.unwrap().to_vec()).unwrap()))
            .map_err(|_| ())
    }

    fn request(method: &str, uri: &str, cookie: Option<&str>) -> axum::http::request::Builder {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("x-forwarded-for", "203.0.113.50");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder
    }

    /// Sign in and return the session cookie.
    async fn signed_in(app: &Router) -> String {
        let response = app
            .clone()
            .oneshot(request("GET", "/test/sign-in", None).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let set_cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
        set_cookie.split(';').next().unwrap().to_string()
    }

    async fn post_form(app: &Router, uri: &str, cookie: &str, body: &str, htmx: bool) -> Response {
        let mut builder = request("POST", uri, Some(cookie))
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if htmx {
            builder = builder.header("hx-request", "true");
        }
        app.clone()
            .oneshot(builder.body(Body::from(body.to_string())).unwrap())
            .await
            .unwrap()
    }

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[test]
    fn test_parse_quantity_bounds() {
        assert_eq!(parse_quantity(Some("1")).unwrap(), 1);
        assert_eq!(parse_quantity(Some(" 99 ")).unwrap(), 99);
        assert!(parse_quantity(Some("0")).is_err());
        assert!(parse_quantity(Some("100")).is_err());
        assert!(parse_quantity(Some("-1")).is_err());
        assert!(parse_quantity(Some("two")).is_err());
        assert!(parse_quantity(Some("")).is_err());
        assert!(parse_quantity(None).is_err());
    }

    #[test]
    fn test_cart_view_from_state() {
        let view = CartView::empty();
        assert!(view.items.is_empty());
        assert_eq!(view.subtotal, "$0.00");
        assert_eq!(view.item_count, 0);
    }

    #[tokio::test]
    async fn test_add_then_count_shows_one_line() {
        let app = app(Arc::new(MemoryRemote::default()));
        let cookie = signed_in(&app).await;

        let response = post_form(&app, "/cart/add", &cookie, "product_id=C&quantity=3", true).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["hx-trigger"], "cart-updated");

        let response = app
            .clone()
            .oneshot(request("GET", "/cart/count", Some(&cookie)).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert!(body_text(response).await.contains(">1<"));
    }

    #[tokio::test]
    async fn test_add_rejects_zero_and_missing_quantity() {
        let app = app(Arc::new(MemoryRemote::default()));
        let cookie = signed_in(&app).await;

        let zero = post_form(&app, "/cart/add", &cookie, "product_id=C&quantity=0", true).await;
        assert_eq!(zero.status(), StatusCode::BAD_REQUEST);

        let missing = post_form(&app, "/cart/add", &cookie, "product_id=C", true).await;
        assert_eq!(missing.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_plain_form_post_redirects_to_cart() {
        let app = app(Arc::new(MemoryRemote::default()));
        let cookie = signed_in(&app).await;

        let response = post_form(&app, "/cart/add", &cookie, "product_id=C&quantity=1", false).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/cart");
    }

    #[tokio::test]
    async fn test_remote_failure_is_rendered_not_returned() {
        let remote = Arc::new(MemoryRemote::with_lines(&[("A", 2)]));
        let app = app(Arc::clone(&remote));
        let cookie = signed_in(&app).await;

        remote.fail_next("cart service unavailable");
        let response =
            post_form(&app, "/cart/update", &cookie, "product_id=A&quantity=5", true).await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_text(response).await;
        assert!(body.contains("cart service unavailable"));
    }

    #[tokio::test]
    async fn test_remove_and_clear_render_items() {
        let remote = Arc::new(MemoryRemote::with_lines(&[("A", 2), ("B", 1)]));
        let app = app(remote);
        let cookie = signed_in(&app).await;

        let response = post_form(&app, "/cart/remove", &cookie, "product_id=A", true).await;
        let body = body_text(response).await;
        assert!(!body.contains("Product A"));
        assert!(body.contains("Product B"));

        let response = post_form(&app, "/cart/clear", &cookie, "", true).await;
        assert!(body_text(response).await.contains("Your cart is empty"));
    }

    #[tokio::test]
    async fn test_count_without_session_is_zero() {
        let app = app(Arc::new(MemoryRemote::with_lines(&[("A", 1)])));
        let response = app
            .oneshot(request("GET", "/cart/count", None).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert!(body_text(response).await.contains(">0<"));
    }

    #[tokio::test]
    async fn test_count_fragment_refreshes_on_cart_updates() {
        let app = app(Arc::new(MemoryRemote::default()));
        let response = app
            .oneshot(request("GET", "/cart/count", None).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body = body_text(response).await;
        assert!(body.contains(r#"hx-get="/cart/count""#));
        assert!(body.contains(r#"hx-trigger="cart-updated from:body""#));
    }

    #[tokio::test]
    async fn test_events_stream_current_count_then_changes() {
        let app = app(Arc::new(MemoryRemote::with_lines(&[("A", 1)])));
        let cookie = signed_in(&app).await;

        let mut frames = open_events(&app, Some(&cookie)).await;
        let first = next_frame(&mut frames).await.unwrap().unwrap();
        assert!(first.contains("event: cart-count"));
        assert!(first.contains("data: 1"));

        let response = post_form(&app, "/cart/add", &cookie, "product_id=B&quantity=2", true).await;
        assert_eq!(response.status(), StatusCode::OK);

        let next = next_frame(&mut frames).await.unwrap().unwrap();
        assert!(next.contains("data: 2"));
    }

    #[tokio::test]
    async fn test_events_end_when_store_is_replaced() {
        let (app, state) = app_with_state(Arc::new(MemoryRemote::default()));
        let cookie = signed_in(&app).await;

        let mut frames = open_events(&app, Some(&cookie)).await;
        assert!(next_frame(&mut frames).await.unwrap().unwrap().contains("data: 0"));

        state.carts().invalidate(&shopper().user_id).await;
        assert_eq!(next_frame(&mut frames).await, Ok(None));

        // A reconnect follows the rebuilt store.
        post_form(&app, "/cart/add", &cookie, "product_id=C&quantity=1", true).await;
        let mut frames = open_events(&app, Some(&cookie)).await;
        assert!(next_frame(&mut frames).await.unwrap().unwrap().contains("data: 1"));
    }

    #[tokio::test]
    async fn test_events_without_session_send_zero_and_wait() {
        let app = app(Arc::new(MemoryRemote::with_lines(&[("A", 1)])));

        let mut frames = open_events(&app, None).await;
        assert!(next_frame(&mut frames).await.unwrap().unwrap().contains("data: 0"));
        assert_eq!(next_frame(&mut frames).await, Err(()));
    }

    #[tokio::test]
    async fn test_cart_page_header_has_no_placeholder_links() {
        let app = app(Arc::new(MemoryRemote::default()));
        let response = app
            .oneshot(request("GET", "/cart", None).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_text(response).await;
        assert!(!body.contains(r##"href="#""##));
        assert!(body.contains("Customer Service"));
        assert!(body.contains(r#"id="cart-count""#));
    }
}
