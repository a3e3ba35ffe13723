//! # Foodtoken
//!
//! The student token ledger: one QR-encoded food token per unique student,
//! redeemed exactly once at the point of service.
//!
//! ## Overview
//!
//! Raw import records (CSV exports, manual lists, re-runs of the same
//! import) are normalized, deduplicated by identity key (email OR
//! enrollment id), and issued one durable entry each with a high-entropy
//! token. Redemption is an atomic one-shot state transition; a second
//! attempt is an error reported to the operator, never a silent success.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use foodtoken::{Ledger, StudentRecord};
//! use foodtoken_store::SqliteStore;
//!
//! async fn example() {
//!     let store = SqliteStore::open("food_tokens.db").unwrap();
//!     let ledger = Ledger::new(store);
//!
//!     let batch = vec![StudentRecord::new(
//!         "Tarun G",
//!         "tarun.ds22@sahyadri.edu.in",
//!         "4SF22CD053",
//!         "7DS",
//!         "Non-Veg",
//!     )];
//!     let report = ledger.import(&batch).await.unwrap();
//!     println!("issued {}", report.issued.len());
//!
//!     let entry = &report.issued[0];
//!     ledger.redeem(&entry.token, "counter-1").await.unwrap();
//! }
//! ```
//!
//! ## Key Types
//!
//! - [`Ledger`] - The facade over a [`Store`](foodtoken_store::Store)
//! - [`ImportReport`] - Per-record outcome of a batch import
//! - [`ReconcileReport`] - Ledger vs filesystem vs import discrepancies
//! - [`LedgerError`] - The error taxonomy

pub mod error;
pub mod ledger;
pub mod maintenance;
pub mod report;

pub use error::{LedgerError, Result};
pub use ledger::{ImportReport, Ledger};
pub use maintenance::CleanupReport;
pub use report::{reconcile, ReconcileReport};

// Re-export the core vocabulary so most callers need only this crate.
pub use foodtoken_core::{
    CredentialPayload, Duplicate, DuplicateReason, EntryId, FoodPreference, IdentityKey,
    LedgerEntry, StudentRecord, Token, TokenState, ValidationError,
};
