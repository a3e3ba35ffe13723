//! # Foodtoken Store
//!
//! Storage abstraction for the token ledger. Provides a trait-based
//! interface with SQLite and in-memory implementations.
//!
//! ## Overview
//!
//! The ledger is one durable table of entries plus a redemption audit
//! table, shared by independent short-lived processes. The [`Store`] trait
//! abstracts it; [`SqliteStore`] is the primary backend, [`MemoryStore`]
//! backs tests.
//!
//! ## Key Types
//!
//! - [`Store`] - The async trait for all storage operations
//! - [`SqliteStore`] - SQLite-based persistent storage
//! - [`MemoryStore`] - In-memory storage for tests
//! - [`InsertOutcome`] / [`RedeemOutcome`] - Results of the two mutating ops
//!
//! ## Design Notes
//!
//! - **Atomic issuance**: identity-collision check + insert in one
//!   transaction; uniqueness also enforced by schema constraints
//! - **Atomic redemption**: conditional update keyed on current state, so
//!   concurrent redeems of one token cannot both succeed
//! - **Audit**: every successful redemption appends a `redemptions` row

pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{
    DuplicateGroup, InsertOutcome, LedgerStats, NewEntry, RedeemKey, RedeemOutcome,
    RedemptionEvent, Store,
};
