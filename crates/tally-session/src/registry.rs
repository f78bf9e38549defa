//! # Session Registry
//!
//! Every cart open on this device: the walk-in counter plus one per
//! dine-in table. Carts are independent; the registry only hands out
//! handles and shares the pricing settings.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  app start ──► restore_all() ──► one handle per stored snapshot        │
//! │                                                                         │
//! │  open(Table("T4"))                                                     │
//! │     ├── already open?  ──► same handle                                 │
//! │     ├── snapshot?      ──► load, reprice under current policy          │
//! │     └── otherwise      ──► empty cart                                  │
//! │                                                                         │
//! │  bill paid ──► settle(key) ──► cart cleared, snapshot dropped,         │
//! │                                handle forgotten                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;

use tokio::sync::RwLock;
use tracing::{info, warn};

use tally_core::{CartService, PricingPolicy, SessionKey};
use tally_db::{CartSnapshotRepository, Database, DbConfig};

use crate::config::SessionConfig;
use crate::error::SessionResult;
use crate::session::CartHandle;

#[derive(Debug)]
pub struct SessionRegistry {
    policy: RwLock<PricingPolicy>,
    store: Option<CartSnapshotRepository>,
    sessions: RwLock<HashMap<SessionKey, CartHandle>>,
}

impl SessionRegistry {
    pub fn new(policy: PricingPolicy, store: Option<CartSnapshotRepository>) -> Self {
        SessionRegistry {
            policy: RwLock::new(policy),
            store,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Registry whose carts live only in memory.
    pub fn in_memory(policy: PricingPolicy) -> Self {
        SessionRegistry::new(policy, None)
    }

    /// Opens the configured database and restores every stored cart.
    pub async fn from_config(config: &SessionConfig) -> SessionResult<Self> {
        let policy = config.pricing_policy();
        if !config.storage.persist {
            info!("Cart persistence disabled; sessions are in-memory only");
            return Ok(SessionRegistry::in_memory(policy));
        }

        let path = config.storage.resolved_database_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let db = Database::new(DbConfig::new(&path)).await?;

        let registry = SessionRegistry::new(policy, Some(db.carts()));
        let restored = registry.restore_all().await?;
        info!(?path, restored, "Session registry ready");
        Ok(registry)
    }

    pub async fn policy(&self) -> PricingPolicy {
        self.policy.read().await.clone()
    }

    /// Changes the pricing settings and reprices every open cart.
    pub async fn set_policy(&self, policy: PricingPolicy) {
        *self.policy.write().await = policy.clone();
        let handles: Vec<CartHandle> = self.sessions.read().await.values().cloned().collect();
        for handle in handles {
            handle.set_policy(policy.clone()).await;
        }
        info!(vat_mode = %policy.vat_mode, "Pricing policy updated for open carts");
    }

    /// Returns the handle for `key`, loading or creating the cart.
    pub async fn open(&self, key: SessionKey) -> SessionResult<CartHandle> {
        if let Some(handle) = self.sessions.read().await.get(&key) {
            return Ok(handle.clone());
        }

        let mut sessions = self.sessions.write().await;
        // Another caller may have opened it between the two locks
        if let Some(handle) = sessions.get(&key) {
            return Ok(handle.clone());
        }

        let handle = self.load_handle(key.clone()).await?;
        sessions.insert(key, handle.clone());
        Ok(handle)
    }

    pub async fn walk_in(&self) -> SessionResult<CartHandle> {
        self.open(SessionKey::WalkIn).await
    }

    pub async fn table(&self, table_id: impl Into<String>) -> SessionResult<CartHandle> {
        self.open(SessionKey::table(table_id)).await
    }

    /// The handle for `key` if it is already open.
    pub async fn get(&self, key: &SessionKey) -> Option<CartHandle> {
        self.sessions.read().await.get(key).cloned()
    }

    /// Forgets the in-memory handle; a stored snapshot stays on disk.
    pub async fn close(&self, key: &SessionKey) -> bool {
        self.sessions.write().await.remove(key).is_some()
    }

    /// Clears a paid cart and forgets it.
    pub async fn settle(&self, key: &SessionKey) -> bool {
        let handle = self.sessions.write().await.remove(key);
        match handle {
            Some(handle) => {
                handle.clear().await;
                info!(session = %key, "Session settled");
                true
            }
            None => false,
        }
    }

    /// Open sessions, walk-in first, then tables by id.
    pub async fn open_keys(&self) -> Vec<SessionKey> {
        let mut keys: Vec<SessionKey> = self.sessions.read().await.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// Opens a handle for every stored snapshot. Returns how many were
    /// restored.
    ///
    /// Rows with an unknown key format are skipped.
    pub async fn restore_all(&self) -> SessionResult<usize> {
        let Some(store) = &self.store else {
            return Ok(0);
        };

        let mut restored = 0;
        for row in store.list().await? {
            match row.key() {
                Some(key) => {
                    self.open(key).await?;
                    restored += 1;
                }
                None => warn!(session = %row.session_key, "Skipping snapshot with unknown key"),
            }
        }
        Ok(restored)
    }

    async fn load_handle(&self, key: SessionKey) -> SessionResult<CartHandle> {
        let policy = self.policy().await;
        let service = match &self.store {
            Some(store) => match store.load(&key).await? {
                Some(cart) => {
                    info!(session = %key, items = cart.items().len(), "Restored cart from snapshot");
                    CartService::from_cart(cart, policy)
                }
                None => CartService::new(policy),
            },
            None => CartService::new(policy),
        };
        Ok(CartHandle::new(key, service, self.store.clone()))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tally_core::{LineItem, Money, Rate, VatMode};

    fn karahi() -> LineItem {
        LineItem::new("KARAHI", "Chicken Karahi", Money::from_cents(20_000), Rate::from_percent(16), 1)
    }

    async fn persistent_registry(db: &Database) -> SessionRegistry {
        SessionRegistry::new(PricingPolicy::default(), Some(db.carts()))
    }

    #[tokio::test]
    async fn test_open_returns_same_handle() {
        let registry = SessionRegistry::in_memory(PricingPolicy::default());

        let first = registry.table("T4").await.unwrap();
        first.apply(|cart| cart.add_item(karahi())).await.unwrap();
        let second = registry.table("T4").await.unwrap();

        assert_eq!(second.snapshot().await.items().len(), 1);
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn test_sessions_are_independent() {
        let registry = SessionRegistry::in_memory(PricingPolicy::default());
        let walk_in = registry.walk_in().await.unwrap();
        let table = registry.table("T1").await.unwrap();

        table.apply(|cart| cart.add_item(karahi())).await.unwrap();

        assert!(walk_in.snapshot().await.is_empty());
        assert_eq!(
            registry.open_keys().await,
            vec![SessionKey::WalkIn, SessionKey::table("T1")]
        );
    }

    #[tokio::test]
    async fn test_restore_after_restart() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        {
            let registry = persistent_registry(&db).await;
            let table = registry.table("T7").await.unwrap();
            table.apply(|cart| cart.add_item(karahi())).await.unwrap();
            registry.walk_in().await.unwrap();
        }

        // Same database, fresh registry: only carts that were written come back
        let registry = persistent_registry(&db).await;
        assert_eq!(registry.restore_all().await.unwrap(), 1);

        let table = registry.get(&SessionKey::table("T7")).await.unwrap();
        assert_eq!(table.totals().await.total_amount, Money::from_cents(23_200));
    }

    #[tokio::test]
    async fn test_restored_cart_uses_current_policy() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let registry = persistent_registry(&db).await;
        registry
            .table("T2")
            .await
            .unwrap()
            .apply(|cart| cart.add_item(karahi()))
            .await
            .unwrap();

        let inclusive = PricingPolicy {
            vat_mode: VatMode::Inclusive,
            ..PricingPolicy::default()
        };
        let registry = SessionRegistry::new(inclusive, Some(db.carts()));
        let table = registry.table("T2").await.unwrap();

        assert_eq!(table.totals().await.total_amount, Money::from_cents(20_000));
    }

    #[tokio::test]
    async fn test_settle_clears_and_forgets() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let registry = persistent_registry(&db).await;
        let key = SessionKey::table("T3");
        registry
            .open(key.clone())
            .await
            .unwrap()
            .apply(|cart| cart.add_item(karahi()))
            .await
            .unwrap();

        assert!(registry.settle(&key).await);
        assert!(!registry.settle(&key).await);
        assert!(registry.get(&key).await.is_none());
        assert!(db.carts().load(&key).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_close_keeps_snapshot() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let registry = persistent_registry(&db).await;
        let key = SessionKey::table("T5");
        registry
            .open(key.clone())
            .await
            .unwrap()
            .apply(|cart| cart.add_item(karahi()))
            .await
            .unwrap();

        assert!(registry.close(&key).await);
        assert!(registry.is_empty().await);

        let reopened = registry.open(key).await.unwrap();
        assert_eq!(reopened.snapshot().await.items().len(), 1);
    }

    #[tokio::test]
    async fn test_set_policy_reaches_open_carts() {
        let registry = SessionRegistry::in_memory(PricingPolicy::default());
        let table = registry.table("T8").await.unwrap();
        table.apply(|cart| cart.add_item(karahi())).await.unwrap();
        assert_eq!(table.totals().await.total_amount, Money::from_cents(23_200));

        registry
            .set_policy(PricingPolicy {
                vat_mode: VatMode::Inclusive,
                ..PricingPolicy::default()
            })
            .await;

        assert_eq!(table.totals().await.total_amount, Money::from_cents(20_000));
        assert_eq!(registry.policy().await.vat_mode, VatMode::Inclusive);
    }

    #[tokio::test]
    async fn test_from_config_in_memory_when_persistence_off() {
        let mut config = SessionConfig::default();
        config.storage.persist = false;

        let registry = SessionRegistry::from_config(&config).await.unwrap();
        let handle = registry.walk_in().await.unwrap();
        assert!(!handle.is_persistent());
    }

    #[tokio::test]
    async fn test_from_config_with_file_database() {
        let dir = std::env::temp_dir().join(format!("tally-{}", uuid::Uuid::new_v4()));
        let mut config = SessionConfig::default();
        config.storage.database_path = Some(dir.join("tally.db"));

        {
            let registry = SessionRegistry::from_config(&config).await.unwrap();
            registry
                .table("T1")
                .await
                .unwrap()
                .apply(|cart| cart.add_item(karahi()))
                .await
                .unwrap();
        }

        let registry = SessionRegistry::from_config(&config).await.unwrap();
        assert_eq!(registry.open_keys().await, vec![SessionKey::table("T1")]);

        std::fs::remove_dir_all(&dir).ok();
    }
}
