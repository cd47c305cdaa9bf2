//! Application state shared across handlers.

use std::sync::Arc;

use crate::cart::CartStores;
use crate::config::StorefrontConfig;
use crate::remote::{AuthClient, CatalogClient, RemoteError, RestClient};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// backend clients, the per-user cart stores and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    rest: RestClient,
    auth: AuthClient,
    catalog: CatalogClient,
    carts: CartStores,
}

impl AppState {
    /// Create a new application state backed by the hosted API.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: StorefrontConfig) -> Result<Self, RemoteError> {
        let rest = RestClient::new(&config.supabase)?;
        let carts = CartStores::rest(rest.clone());
        Ok(Self::with_carts(config, rest, carts))
    }

    /// Create state with a custom cart registry (tests swap in an
    /// in-memory remote here).
    #[must_use]
    pub fn with_carts(config: StorefrontConfig, rest: RestClient, carts: CartStores) -> Self {
        let auth = AuthClient::new(rest.clone());
        let catalog = CatalogClient::new(rest.clone(), config.catalog_cache_ttl);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                rest,
                auth,
                catalog,
                carts,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the raw backend client.
    #[must_use]
    pub fn rest(&self) -> &RestClient {
        &self.inner.rest
    }

    /// Get a reference to the auth API client.
    #[must_use]
    pub fn auth(&self) -> &AuthClient {
        &self.inner.auth
    }

    /// Get a reference to the catalog client.
    #[must_use]
    pub fn catalog(&self) -> &CatalogClient {
        &self.inner.catalog
    }

    /// Get a reference to the per-user cart stores.
    #[must_use]
    pub fn carts(&self) -> &CartStores {
        &self.inner.carts
    }
}
