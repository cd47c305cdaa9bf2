//! The cart store: one user's cart snapshot plus busy/error flags.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::instrument;

use shophub_core::{CartItem, Price, ProductId};

use crate::remote::{CartRemote, RemoteError};

/// Observable cart state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CartState {
    /// Lines in backend order (oldest first). Always a full snapshot.
    pub items: Vec<CartItem>,
    /// An operation is in flight.
    pub loading: bool,
    /// Message from the most recent failed operation.
    pub error: Option<String>,
    /// When the items were last replaced from the backend.
    pub last_synced: Option<DateTime<Utc>>,
}

impl CartState {
    /// Number of lines (not units), as shown on the header badge.
    #[must_use]
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Sum of line totals.
    #[must_use]
    pub fn subtotal(&self) -> Price {
        let amount = self.items.iter().map(|i| i.line_total().amount()).sum();
        Price::new(amount).unwrap_or(Price::ZERO)
    }

    /// The line for `product_id`, if present.
    #[must_use]
    pub fn line(&self, product_id: &ProductId) -> Option<&CartItem> {
        self.items.iter().find(|i| &i.product_id == product_id)
    }
}

/// Synchronizes one user's cart with the backend.
///
/// Every operation performs exactly one remote mutation (or read), and
/// mutations other than [`clear`](Self::clear) are followed by a full refetch.
/// Failures never escape: they land in [`CartState::error`] and the item list
/// keeps its previous snapshot.
///
/// Operations are not serialized against each other. Two concurrent calls
/// each refetch, and whichever refetch settles last determines the final
/// items.
///
/// A store is retired when the registry stops handing it out (sign-out,
/// token refresh, idle eviction). Subscribers watch [`retired`](Self::retired)
/// to know they must resubscribe to the user's current store.
pub struct CartStore {
    remote: Arc<dyn CartRemote>,
    state: watch::Sender<CartState>,
    retired: watch::Sender<bool>,
}

/// Clears `loading` when dropped, including when the operation's future is
/// dropped mid-flight.
struct BusyGuard<'a> {
    state: &'a watch::Sender<CartState>,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.state.send_modify(|s| s.loading = false);
    }
}

impl CartStore {
    #[must_use]
    pub fn new(remote: Arc<dyn CartRemote>) -> Self {
        Self {
            remote,
            state: watch::Sender::new(CartState::default()),
            retired: watch::Sender::new(false),
        }
    }

    /// Mark the store as replaced. Idempotent.
    pub fn retire(&self) {
        self.retired.send_if_modified(|retired| !std::mem::replace(retired, true));
    }

    /// Receiver that turns `true` once the store is retired.
    #[must_use]
    pub fn retired(&self) -> watch::Receiver<bool> {
        self.retired.subscribe()
    }

    /// Current state.
    #[must_use]
    pub fn snapshot(&self) -> CartState {
        self.state.borrow().clone()
    }

    /// Receiver that observes every state transition.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<CartState> {
        self.state.subscribe()
    }

    /// Fetch once if this store has never synchronized.
    pub async fn ensure_loaded(&self) {
        if self.state.borrow().last_synced.is_none() {
            self.fetch().await;
        }
    }

    /// Replace the items with the backend's current lines.
    #[instrument(skip(self))]
    pub async fn fetch(&self) {
        let _busy = self.begin();
        self.reload().await;
    }

    /// Add `quantity` units of a product. Re-adding a product sets its
    /// quantity rather than summing.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn add(&self, product_id: &ProductId, quantity: u32) {
        let _busy = self.begin();
        let result = self.remote.upsert_line(product_id, quantity).await;
        self.settle(result, "add").await;
    }

    /// Set the quantity of an existing line.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn set_quantity(&self, product_id: &ProductId, quantity: u32) {
        let _busy = self.begin();
        let result = self.remote.update_quantity(product_id, quantity).await;
        self.settle(result, "set_quantity").await;
    }

    /// Remove a product's line.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn remove(&self, product_id: &ProductId) {
        let _busy = self.begin();
        let result = self.remote.delete_line(product_id).await;
        self.settle(result, "remove").await;
    }

    /// Remove every line. Empties the items directly, without a refetch.
    #[instrument(skip(self))]
    pub async fn clear(&self) {
        let _busy = self.begin();
        match self.remote.delete_all().await {
            Ok(()) => self.state.send_modify(|s| {
                s.items = Vec::new();
                s.last_synced = Some(Utc::now());
            }),
            Err(e) => self.fail("clear", &e),
        }
    }

    fn begin(&self) -> BusyGuard<'_> {
        self.state.send_modify(|s| {
            s.loading = true;
            s.error = None;
        });
        BusyGuard { state: &self.state }
    }

    /// Refetch after a successful mutation, or record its failure.
    async fn settle(&self, result: Result<(), RemoteError>, op: &'static str) {
        match result {
            Ok(()) => self.reload().await,
            Err(e) => self.fail(op, &e),
        }
    }

    async fn reload(&self) {
        match self.remote.select_lines().await {
            Ok(items) => {
                tracing::debug!(lines = items.len(), "Cart synchronized");
                self.state.send_modify(|s| {
                    s.items = items;
                    s.last_synced = Some(Utc::now());
                });
            }
            Err(e) => self.fail("fetch", &e),
        }
    }

    fn fail(&self, op: &'static str, error: &RemoteError) {
        tracing::warn!(op, error = %error, "Cart operation failed");
        let message = error.to_string();
        self.state.send_modify(|s| s.error = Some(message));
    }
}
