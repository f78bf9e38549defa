//! # Repository Module
//!
//! Database repositories for Tally POS.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  CartHandle (tally-session)                                            │
//! │       │                                                                 │
//! │       │  db.carts().save(&key, cart)                                   │
//! │       ▼                                                                 │
//! │  CartSnapshotRepository                                                │
//! │  ├── save(&self, key, cart)        upsert, bumps version               │
//! │  ├── load(&self, key)              Option<Cart>                        │
//! │  ├── summary(&self, key)           totals without decoding payload     │
//! │  ├── list(&self)                   every open cart                     │
//! │  └── delete(&self, key)                                                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite (cart_sessions)                                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod cart;
