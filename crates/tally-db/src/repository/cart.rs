//! # Cart Snapshot Repository
//!
//! Stores each open cart as one JSON row keyed by its session key.
//!
//! ## Row Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  session_key   kind      table_id  payload   total  items  version     │
//! │  ───────────   ───────   ────────  ───────   ─────  ─────  ───────     │
//! │  walk-in       walk_in   NULL      {...}      1150      2        7     │
//! │  table:T4      table     T4        {...}      8420      6       19     │
//! │                                                                         │
//! │  payload  = serde_json(Cart)  (source of truth)                        │
//! │  total / items = copies of the cart totals for the open-tables list    │
//! │  version  = bumped on every save                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use tally_core::{Cart, Money, SessionKey};

/// Listing row: everything but the payload.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct CartSessionSummary {
    pub session_key: String,
    pub kind: String,
    pub table_id: Option<String>,
    pub total_amount_cents: i64,
    pub item_count: i64,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CartSessionSummary {
    /// Parsed session key, `None` for rows written with an unknown format.
    pub fn key(&self) -> Option<SessionKey> {
        self.session_key.parse().ok()
    }

    pub fn total_amount(&self) -> Money {
        Money::from_cents(self.total_amount_cents)
    }
}

/// Repository for cart snapshots.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.carts();
/// let version = repo.save(&SessionKey::table("T4"), service.cart()).await?;
/// let cart = repo.load(&SessionKey::table("T4")).await?;
/// ```
#[derive(Debug, Clone)]
pub struct CartSnapshotRepository {
    pool: SqlitePool,
}

impl CartSnapshotRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CartSnapshotRepository { pool }
    }

    /// Writes the cart, replacing any earlier snapshot for `key`.
    ///
    /// Returns the row's new version (1 on first save).
    pub async fn save(&self, key: &SessionKey, cart: &Cart) -> DbResult<i64> {
        let payload = serde_json::to_string(cart)?;
        let session_key = key.to_string();
        let totals = cart.totals();

        let version: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO cart_sessions (
                session_key, kind, table_id, payload,
                total_amount_cents, item_count, version, created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4,
                ?5, ?6, 1, ?7, ?8
            )
            ON CONFLICT(session_key) DO UPDATE SET
                payload = excluded.payload,
                total_amount_cents = excluded.total_amount_cents,
                item_count = excluded.item_count,
                version = cart_sessions.version + 1,
                updated_at = excluded.updated_at
            RETURNING version
            "#,
        )
        .bind(&session_key)
        .bind(key.kind())
        .bind(key.table_id())
        .bind(&payload)
        .bind(totals.total_amount.cents())
        .bind(totals.item_count as i64)
        .bind(cart.created_at())
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        debug!(
            session = %session_key,
            version,
            total = %totals.total_amount,
            "Cart snapshot saved"
        );
        Ok(version)
    }

    /// Reads the cart saved under `key`.
    ///
    /// Totals are as they were saved; callers recompute under the current
    /// pricing policy.
    pub async fn load(&self, key: &SessionKey) -> DbResult<Option<Cart>> {
        let payload: Option<String> =
            sqlx::query_scalar("SELECT payload FROM cart_sessions WHERE session_key = ?1")
                .bind(key.to_string())
                .fetch_optional(&self.pool)
                .await?;

        match payload {
            Some(json) => {
                let cart: Cart = serde_json::from_str(&json)?;
                debug!(session = %key, items = cart.items().len(), "Cart snapshot loaded");
                Ok(Some(cart))
            }
            None => Ok(None),
        }
    }

    pub async fn summary(&self, key: &SessionKey) -> DbResult<CartSessionSummary> {
        sqlx::query_as::<_, CartSessionSummary>(
            r#"
            SELECT session_key, kind, table_id, total_amount_cents, item_count,
                   version, created_at, updated_at
            FROM cart_sessions
            WHERE session_key = ?1
            "#,
        )
        .bind(key.to_string())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("Cart session", key.to_string()))
    }

    /// Every stored cart, walk-in first, then tables by most recent change.
    pub async fn list(&self) -> DbResult<Vec<CartSessionSummary>> {
        let rows = sqlx::query_as::<_, CartSessionSummary>(
            r#"
            SELECT session_key, kind, table_id, total_amount_cents, item_count,
                   version, created_at, updated_at
            FROM cart_sessions
            ORDER BY CASE kind WHEN 'walk_in' THEN 0 ELSE 1 END, updated_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        debug!(count = rows.len(), "Listed cart sessions");
        Ok(rows)
    }

    /// Returns `false` if nothing was stored under `key`.
    pub async fn delete(&self, key: &SessionKey) -> DbResult<bool> {
        let result = sqlx::query("DELETE FROM cart_sessions WHERE session_key = ?1")
            .bind(key.to_string())
            .execute(&self.pool)
            .await?;

        debug!(session = %key, deleted = result.rows_affected(), "Cart snapshot deleted");
        Ok(result.rows_affected() > 0)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use tally_core::{CartService, Discount, LineItem, Modifier, PricingPolicy, Rate};

    async fn repo() -> CartSnapshotRepository {
        Database::new(DbConfig::in_memory()).await.unwrap().carts()
    }

    fn sample_cart() -> Cart {
        let mut svc = CartService::new(PricingPolicy::default());
        svc.add_item(
            LineItem::new("KARAHI", "Chicken Karahi", Money::from_cents(1_800), Rate::from_percent(16), 1)
                .with_modifiers(vec![Modifier::new("XTRA", "Extra gravy", Money::from_cents(150))]),
        )
        .unwrap();
        svc.add_item(LineItem::new("NAAN", "Naan", Money::from_cents(80), Rate::from_percent(16), 3))
            .unwrap();
        svc.apply_discount(Discount::percentage("TEN", "10% off", Rate::from_percent(10)))
            .unwrap();
        svc.void_item(1, "V-1", Some("burnt".into())).unwrap();
        svc.into_cart()
    }

    #[tokio::test]
    async fn test_save_and_load_round_trip() {
        let repo = repo().await;
        let key = SessionKey::table("T4");
        let cart = sample_cart();

        assert_eq!(repo.save(&key, &cart).await.unwrap(), 1);
        let loaded = repo.load(&key).await.unwrap().unwrap();

        assert_eq!(loaded, cart);
    }

    #[tokio::test]
    async fn test_save_bumps_version() {
        let repo = repo().await;
        let key = SessionKey::WalkIn;
        let cart = sample_cart();

        repo.save(&key, &cart).await.unwrap();
        repo.save(&key, &cart).await.unwrap();
        let version = repo.save(&key, &cart).await.unwrap();
        assert_eq!(version, 3);

        let summary = repo.summary(&key).await.unwrap();
        assert_eq!(summary.version, 3);
        assert_eq!(summary.kind, "walk_in");
        assert_eq!(summary.table_id, None);
        assert_eq!(summary.total_amount(), cart.totals().total_amount);
        assert_eq!(summary.item_count, 1);
    }

    #[tokio::test]
    async fn test_load_missing_is_none() {
        let repo = repo().await;
        assert!(repo.load(&SessionKey::table("T99")).await.unwrap().is_none());
        assert!(matches!(
            repo.summary(&SessionKey::table("T99")).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_list_puts_walk_in_first() {
        let repo = repo().await;
        let cart = Cart::new();
        repo.save(&SessionKey::table("T1"), &cart).await.unwrap();
        repo.save(&SessionKey::WalkIn, &cart).await.unwrap();
        repo.save(&SessionKey::table("T2"), &cart).await.unwrap();

        let rows = repo.list().await.unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].key(), Some(SessionKey::WalkIn));
        assert_eq!(rows[1].table_id.as_deref(), Some("T2"));
    }

    #[tokio::test]
    async fn test_delete() {
        let repo = repo().await;
        let key = SessionKey::table("T7");
        repo.save(&key, &Cart::new()).await.unwrap();

        assert!(repo.delete(&key).await.unwrap());
        assert!(!repo.delete(&key).await.unwrap());
        assert!(repo.load(&key).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_corrupt_payload_is_serialization_error() {
        let repo = repo().await;
        let now = Utc::now();
        sqlx::query(
            "INSERT INTO cart_sessions (session_key, kind, table_id, payload, created_at, updated_at)
             VALUES ('table:T3', 'table', 'T3', '{\"items\": 5}', ?1, ?1)",
        )
        .bind(now)
        .execute(&repo.pool)
        .await
        .unwrap();

        let err = repo.load(&SessionKey::table("T3")).await.unwrap_err();
        assert!(matches!(err, DbError::Serialization(_)));
    }
}
