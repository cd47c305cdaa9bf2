//! Cart state synchronized with the hosted backend.
//!
//! # Model
//!
//! - [`CartStore`] holds one user's cart snapshot, a busy flag and the last
//!   error, and exposes `fetch`, `add`, `set_quantity`, `remove` and `clear`
//! - Each operation is one remote call; mutations then refetch the full list
//!   (no optimistic updates, no local patching)
//! - State lives in a `tokio::sync::watch` channel so pages read snapshots and
//!   the header badge streams changes
//! - [`CartStores`] lazily creates one store per user and evicts idle ones

mod registry;
mod store;

pub use registry::{CartStores, RemoteFactory, STORE_IDLE_TIMEOUT};
pub use store::{CartState, CartStore};

#[cfg(test)]
pub(crate) use store::tests::MemoryRemote;
