//! # Foodtoken Core
//!
//! Pure primitives for the student token ledger: records, normalization,
//! identity keys, deduplication, and the credential payload contract.
//!
//! This crate contains no I/O and no storage. It is pure computation over
//! student data, which keeps the deduplication and classification rules in
//! one place for every caller (import jobs, the redemption service, and
//! reporting tools all reach the same answers).
//!
//! ## Key Types
//!
//! - [`StudentRecord`] - Raw, transient import record
//! - [`IdentityKey`] - The (email, enrollment-id) uniqueness boundary
//! - [`LedgerEntry`] - One persistent row per unique student
//! - [`Token`] - The single-use redemption credential
//! - [`CredentialPayload`] - The QR wire contract

pub mod dedupe;
pub mod entry;
pub mod error;
pub mod identity;
pub mod normalize;
pub mod payload;
pub mod record;
pub mod types;

pub use dedupe::{dedupe, DedupeOutcome, Duplicate, DuplicateReason};
pub use entry::LedgerEntry;
pub use error::ValidationError;
pub use identity::IdentityKey;
pub use payload::{CredentialPayload, PAYLOAD_TYPE};
pub use record::{FieldKind, StudentRecord};
pub use types::{EntryId, FoodPreference, Token, TokenState};
