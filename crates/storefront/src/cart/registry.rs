//! Per-user cart stores, created lazily and evicted when idle.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;

use shophub_core::UserId;

use super::store::CartStore;
use crate::remote::{AuthSession, CartRemote, RestCartRemote, RestClient};

/// Stores idle this long are dropped; the next request rebuilds and refetches.
pub const STORE_IDLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Builds the remote a new store talks to.
pub type RemoteFactory = Arc<dyn Fn(&AuthSession) -> Arc<dyn CartRemote> + Send + Sync>;

/// Registry holding exactly one [`CartStore`] per signed-in user.
///
/// All requests from the same user share the store, so a mutation issued from
/// one tab is visible to the cart badge streaming in another.
#[derive(Clone)]
pub struct CartStores {
    stores: Cache<UserId, Arc<CartStore>>,
    factory: RemoteFactory,
}

impl CartStores {
    /// Registry whose stores talk to the hosted table API.
    #[must_use]
    pub fn rest(client: RestClient) -> Self {
        Self::with_factory(Arc::new(move |session: &AuthSession| {
            Arc::new(RestCartRemote::new(client.clone(), session)) as Arc<dyn CartRemote>
        }))
    }

    #[must_use]
    pub fn with_factory(factory: RemoteFactory) -> Self {
        let stores = Cache::builder()
            .max_capacity(10_000)
            .time_to_idle(STORE_IDLE_TIMEOUT)
            .eviction_listener(|user_id, store: Arc<CartStore>, cause| {
                tracing::debug!(user_id = %user_id, ?cause, "Cart store evicted");
                store.retire();
            })
            .build();
        Self { stores, factory }
    }

    /// The store for `session`'s user, creating it on first use.
    pub async fn store_for(&self, session: &AuthSession) -> Arc<CartStore> {
        let factory = Arc::clone(&self.factory);
        self.stores
            .get_with(session.user_id.clone(), async move {
                tracing::debug!(user_id = %session.user_id, "Creating cart store");
                Arc::new(CartStore::new(factory(session)))
            })
            .await
    }

    /// Existing store for a user, without creating one.
    pub async fn existing(&self, user_id: &UserId) -> Option<Arc<CartStore>> {
        self.stores.get(user_id).await
    }

    /// Drop a user's store, e.g. after sign-out or when its token changed.
    ///
    /// The store is retired right away so open badge streams end without
    /// waiting for the cache's eviction notification.
    pub async fn invalidate(&self, user_id: &UserId) {
        if let Some(store) = self.stores.remove(user_id).await {
            store.retire();
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use shophub_core::ProductId;

    use super::*;
    use crate::cart::store::tests::MemoryRemote;
    use crate::remote::AccessToken;

    fn session(user: &str) -> AuthSession {
        AuthSession {
            user_id: UserId::new(user),
            email: None,
            access_token: AccessToken::new(format!("token-{user}")),
            refresh_token: AccessToken::new("refresh"),
            expires_at: Utc::now(),
        }
    }

    fn memory_stores() -> CartStores {
        CartStores::with_factory(Arc::new(|_: &AuthSession| {
            Arc::new(MemoryRemote::default()) as Arc<dyn CartRemote>
        }))
    }

    #[tokio::test]
    async fn test_same_user_shares_store() {
        let stores = memory_stores();
        let a = stores.store_for(&session("u1")).await;
        let b = stores.store_for(&session("u1")).await;
        assert!(Arc::ptr_eq(&a, &b));

        a.add(&ProductId::new("P"), 1).await;
        assert_eq!(b.snapshot().item_count(), 1);
    }

    #[tokio::test]
    async fn test_users_are_isolated() {
        let stores = memory_stores();
        let a = stores.store_for(&session("u1")).await;
        let b = stores.store_for(&session("u2")).await;
        assert!(!Arc::ptr_eq(&a, &b));

        a.add(&ProductId::new("P"), 1).await;
        b.fetch().await;
        assert_eq!(b.snapshot().item_count(), 0);
    }

    #[tokio::test]
    async fn test_invalidate_creates_fresh_store() {
        let stores = memory_stores();
        let user = session("u1");
        let first = stores.store_for(&user).await;
        stores.invalidate(&user.user_id).await;

        assert!(stores.existing(&user.user_id).await.is_none());
        let second = stores.store_for(&user).await;
        assert!(!Arc::ptr_eq(&first, &second));
        assert!(second.snapshot().last_synced.is_none());
        assert!(*first.retired().borrow());
        assert!(!*second.retired().borrow());
    }
}
