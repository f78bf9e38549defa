//! # Cart Handle
//!
//! One open cart (the walk-in counter or a dine-in table) shared between
//! the UI handlers that touch it.
//!
//! ## Mutation Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    CartHandle::apply(|cart| ...)                        │
//! │                                                                         │
//! │  lock ──► run closure on CartService ──► Err? ──► return, no write     │
//! │                         │                                               │
//! │                         ▼ Ok                                            │
//! │              save snapshot (tally-db)                                   │
//! │                         │                                               │
//! │           ┌─────────────┴──────────────┐                               │
//! │           ▼ saved                      ▼ failed                        │
//! │    version recorded             warn!, error recorded,                 │
//! │                                 in-memory cart stays authoritative     │
//! │                                                                         │
//! │  The lock is held until the write finishes, so snapshots land in the   │
//! │  same order as the mutations that produced them.                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use tally_core::{Cart, CartEvent, CartResult, CartService, CartTotals, PricingPolicy};
use tally_core::{SessionKey, SubscriptionId};
use tally_db::CartSnapshotRepository;

use crate::error::{SessionError, SessionResult};

#[derive(Debug)]
struct SessionState {
    service: CartService,
    /// Version of the last snapshot written, if any.
    persisted_version: Option<i64>,
    last_persist_error: Option<String>,
}

/// Shared handle to one session's cart.
///
/// Cloning is cheap; every clone points at the same cart.
#[derive(Debug, Clone)]
pub struct CartHandle {
    key: SessionKey,
    state: Arc<Mutex<SessionState>>,
    store: Option<CartSnapshotRepository>,
}

impl CartHandle {
    pub fn new(key: SessionKey, service: CartService, store: Option<CartSnapshotRepository>) -> Self {
        CartHandle {
            key,
            state: Arc::new(Mutex::new(SessionState {
                service,
                persisted_version: None,
                last_persist_error: None,
            })),
            store,
        }
    }

    /// A handle that never touches storage.
    pub fn in_memory(key: SessionKey, policy: PricingPolicy) -> Self {
        CartHandle::new(key, CartService::new(policy), None)
    }

    pub fn key(&self) -> &SessionKey {
        &self.key
    }

    pub fn is_persistent(&self) -> bool {
        self.store.is_some()
    }

    /// Runs a cart mutation and persists the result.
    ///
    /// A rejected mutation returns [`SessionError::Cart`] and writes nothing.
    /// A failed write does not fail the call; see [`Self::last_persist_error`].
    ///
    /// ```rust,ignore
    /// let index = handle.apply(|cart| cart.add_item(item)).await?;
    /// handle.apply(|cart| cart.apply_discount(discount)).await?;
    /// ```
    pub async fn apply<T, F>(&self, mutation: F) -> SessionResult<T>
    where
        F: FnOnce(&mut CartService) -> CartResult<T>,
    {
        let mut state = self.state.lock().await;
        let value = mutation(&mut state.service).map_err(|e| {
            debug!(session = %self.key, error = %e, "Cart mutation rejected");
            SessionError::from(e)
        })?;
        self.persist(&mut state).await;
        Ok(value)
    }

    /// Reads the cart without mutating it.
    pub async fn read<R, F>(&self, reader: F) -> R
    where
        F: FnOnce(&CartService) -> R,
    {
        let state = self.state.lock().await;
        reader(&state.service)
    }

    pub async fn snapshot(&self) -> Cart {
        self.read(|service| service.cart().clone()).await
    }

    pub async fn totals(&self) -> CartTotals {
        self.read(|service| service.cart().totals().clone()).await
    }

    pub async fn policy(&self) -> PricingPolicy {
        self.read(|service| service.policy().clone()).await
    }

    /// Reprices the cart under new settings and persists it.
    pub async fn set_policy(&self, policy: PricingPolicy) {
        let mut state = self.state.lock().await;
        state.service.set_policy(policy);
        self.persist(&mut state).await;
    }

    pub async fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: FnMut(&CartEvent, &Cart) + Send + 'static,
    {
        self.state.lock().await.service.subscribe(listener)
    }

    pub async fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.state.lock().await.service.unsubscribe(id)
    }

    /// Empties the cart after the bill is settled and drops its snapshot.
    pub async fn clear(&self) {
        let mut state = self.state.lock().await;
        state.service.clear_cart();

        if let Some(store) = &self.store {
            match store.delete(&self.key).await {
                Ok(_) => {
                    state.persisted_version = None;
                    state.last_persist_error = None;
                }
                Err(e) => {
                    warn!(session = %self.key, error = %e, "Failed to drop cart snapshot");
                    state.last_persist_error = Some(e.to_string());
                }
            }
        }
        info!(session = %self.key, "Cart cleared");
    }

    /// Writes the current cart, returning the write error if any.
    ///
    /// Use after [`Self::last_persist_error`] reported a failure.
    pub async fn flush(&self) -> SessionResult<()> {
        let Some(store) = &self.store else {
            return Ok(());
        };
        let mut state = self.state.lock().await;
        let cart = state.service.cart().clone();
        match store.save(&self.key, &cart).await {
            Ok(version) => {
                state.persisted_version = Some(version);
                state.last_persist_error = None;
                Ok(())
            }
            Err(e) => {
                state.last_persist_error = Some(e.to_string());
                Err(e.into())
            }
        }
    }

    /// Message of the most recent failed write, cleared by the next success.
    pub async fn last_persist_error(&self) -> Option<String> {
        self.state.lock().await.last_persist_error.clone()
    }

    pub async fn persisted_version(&self) -> Option<i64> {
        self.state.lock().await.persisted_version
    }

    async fn persist(&self, state: &mut SessionState) {
        let Some(store) = &self.store else {
            return;
        };
        let cart = state.service.cart().clone();
        match store.save(&self.key, &cart).await {
            Ok(version) => {
                state.persisted_version = Some(version);
                state.last_persist_error = None;
            }
            Err(e) => {
                warn!(
                    session = %self.key,
                    error = %e,
                    transient = e.is_transient(),
                    "Failed to persist cart; keeping in-memory state"
                );
                state.last_persist_error = Some(e.to_string());
            }
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
