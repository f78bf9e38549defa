//! # Cart Events
//!
//! Typed change notifications. Each accepted mutation emits exactly one
//! event after the cart has been recomputed; rejected mutations emit none.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  CartService::apply_discount(..)                                       │
//! │       │                                                                 │
//! │       ├── rejected ──► Err(CartError), no event                        │
//! │       │                                                                 │
//! │       └── accepted ──► recompute ──► swap ──► notify(event, &cart)     │
//! │                                                 │                       │
//! │                      ┌──────────────────────────┼──────────────┐       │
//! │                      ▼                          ▼              ▼       │
//! │                 cart footer              bill preview     persistence  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::cart::Cart;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CartEvent {
    ItemAdded { index: usize, item_id: String },
    /// A re-added product was folded into an existing line.
    ItemMerged { index: usize, item_id: String },
    ItemUpdated { index: usize, item_id: String },
    ItemRemoved { index: usize, item_id: String },
    ItemVoided { index: usize, item_id: String },
    ItemComped { index: usize, item_id: String },
    ItemRestored { index: usize, item_id: String },
    DiscountApplied { id: String },
    DiscountRemoved { id: String },
    ChargeApplied { id: String },
    ChargeRemoved { id: String },
    TenderAdded { id: String },
    TenderRemoved { id: String },
    WalletChanged,
    SentToKitchen { indices: Vec<usize> },
    Cleared,
}

/// Handle returned by `subscribe`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// A cart observer. Receives the event and the cart after the change.
pub type Listener = Box<dyn FnMut(&CartEvent, &Cart) + Send>;

/// Registered listeners of one cart, notified in subscription order.
#[derive(Default)]
pub struct Observers {
    next_id: u64,
    listeners: Vec<(SubscriptionId, Listener)>,
}

impl Observers {
    pub fn new() -> Self {
        Observers::default()
    }

    pub fn subscribe(&mut self, listener: Listener) -> SubscriptionId {
        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        self.listeners.push((id, listener));
        id
    }

    /// Returns `false` if the id was not subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sub, _)| *sub != id);
        self.listeners.len() != before
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    pub fn notify(&mut self, event: &CartEvent, cart: &Cart) {
        for (_, listener) in self.listeners.iter_mut() {
            listener(event, cart);
        }
    }
}

impl fmt::Debug for Observers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observers")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_subscribe_notify_unsubscribe() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut observers = Observers::new();

        let sink = Arc::clone(&seen);
        let id = observers.subscribe(Box::new(move |event: &CartEvent, _: &Cart| {
            sink.lock().unwrap().push(event.clone());
        }));

        let cart = Cart::new();
        observers.notify(&CartEvent::Cleared, &cart);
        assert!(observers.unsubscribe(id));
        assert!(!observers.unsubscribe(id));
        observers.notify(&CartEvent::WalletChanged, &cart);

        assert_eq!(*seen.lock().unwrap(), vec![CartEvent::Cleared]);
        assert!(observers.is_empty());
    }

    #[test]
    fn test_event_serializes_tagged() {
        let json = serde_json::to_value(CartEvent::DiscountApplied { id: "d1".into() }).unwrap();
        assert_eq!(json["type"], "discount_applied");
        assert_eq!(json["id"], "d1");
    }
}
