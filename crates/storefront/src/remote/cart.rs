//! Cart line persistence on the table API.
//!
//! Four query shapes are used, all on the `cart_items` table:
//!
//! ```text
//! select  GET    ?select=<CART_SELECT>&user_id=eq.U&order=created_at.asc
//! upsert  POST   ?on_conflict=user_id,product_id   Prefer: resolution=merge-duplicates
//! update  PATCH  ?user_id=eq.U&product_id=eq.P     {"quantity": n}
//! delete  DELETE ?user_id=eq.U&product_id=eq.P     (or only user_id=eq.U for all)
//! ```

use async_trait::async_trait;
use reqwest::Method;
use serde_json::json;
use tracing::instrument;

use shophub_core::{CartItem, ProductId, UserId};

use super::RemoteError;
use super::auth::{AccessToken, AuthSession};
use super::client::RestClient;

const CART_TABLE: &str = "cart_items";

/// Columns selected for a cart line, joined with the product's display fields.
pub const CART_SELECT: &str = "id,product_id,quantity,product:products(name,price,image_urls)";

/// Remote operations the cart store depends on.
///
/// Implementations are scoped to one user; the store never passes identity.
#[async_trait]
pub trait CartRemote: Send + Sync {
    /// All lines for the user, joined with product fields, oldest first.
    async fn select_lines(&self) -> Result<Vec<CartItem>, RemoteError>;

    /// Insert a line, or overwrite its quantity if the product is already in
    /// the cart.
    async fn upsert_line(&self, product_id: &ProductId, quantity: u32) -> Result<(), RemoteError>;

    /// Set the quantity of the line for `product_id`.
    async fn update_quantity(
        &self,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<(), RemoteError>;

    /// Delete the line for `product_id`.
    async fn delete_line(&self, product_id: &ProductId) -> Result<(), RemoteError>;

    /// Delete every line belonging to the user.
    async fn delete_all(&self) -> Result<(), RemoteError>;
}

/// [`CartRemote`] backed by the hosted table API.
pub struct RestCartRemote {
    client: RestClient,
    user_id: UserId,
    token: AccessToken,
}

impl RestCartRemote {
    /// Bind a client to one user's session.
    #[must_use]
    pub fn new(client: RestClient, session: &AuthSession) -> Self {
        Self {
            client,
            user_id: session.user_id.clone(),
            token: session.access_token.clone(),
        }
    }

    fn user_filter(&self) -> (&'static str, String) {
        ("user_id", format!("eq.{}", self.user_id))
    }

    fn request(&self, method: Method) -> reqwest::RequestBuilder {
        self.client
            .table(method, CART_TABLE, Some(&self.token))
            .query(&[self.user_filter()])
    }
}

#[async_trait]
impl CartRemote for RestCartRemote {
    #[instrument(skip(self), fields(user_id = %self.user_id))]
    async fn select_lines(&self) -> Result<Vec<CartItem>, RemoteError> {
        let request = self
            .request(Method::GET)
            .query(&[("select", CART_SELECT), ("order", "created_at.asc")]);
        self.client.execute_json(request).await
    }

    #[instrument(skip(self), fields(user_id = %self.user_id, product_id = %product_id))]
    async fn upsert_line(&self, product_id: &ProductId, quantity: u32) -> Result<(), RemoteError> {
        // The conflict target must be a bare column list, so no user filter here.
        let request = self
            .client
            .table(Method::POST, CART_TABLE, Some(&self.token))
            .query(&[("on_conflict", "user_id,product_id")])
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(&json!({
                "user_id": self.user_id,
                "product_id": product_id,
                "quantity": quantity,
            }));
        self.client.execute_empty(request).await
    }

    #[instrument(skip(self), fields(user_id = %self.user_id, product_id = %product_id))]
    async fn update_quantity(
        &self,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<(), RemoteError> {
        let request = self
            .request(Method::PATCH)
            .query(&[("product_id", format!("eq.{product_id}"))])
            .header("Prefer", "return=minimal")
            .json(&json!({ "quantity": quantity }));
        self.client.execute_empty(request).await
    }

    #[instrument(skip(self), fields(user_id = %self.user_id, product_id = %product_id))]
    async fn delete_line(&self, product_id: &ProductId) -> Result<(), RemoteError> {
        let request = self
            .request(Method::DELETE)
            .query(&[("product_id", format!("eq.{product_id}"))]);
        self.client.execute_empty(request).await
    }

    #[instrument(skip(self), fields(user_id = %self.user_id))]
    async fn delete_all(&self) -> Result<(), RemoteError> {
        let request = self.request(Method::DELETE);
        self.client.execute_empty(request).await
    }
}
