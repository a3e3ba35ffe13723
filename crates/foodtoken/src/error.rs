//! Error taxonomy for ledger operations.

use foodtoken_core::{EntryId, LedgerEntry, ValidationError};
use foodtoken_store::StoreError;
use thiserror::Error;

/// Errors returned by the ledger facade.
///
/// Import-time validation and duplication are collected per record by
/// [`crate::ledger::Ledger::import`] rather than surfaced through this type;
/// redemption errors come back synchronously for operator feedback and are
/// never retried automatically.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Malformed input record; no identity key derivable.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Issuance attempted for an identity already in the ledger.
    #[error("identity already issued: entry {existing}")]
    DuplicateIdentity {
        /// The entry occupying the colliding identity.
        existing: EntryId,
    },

    /// Redemption against an unknown token or fallback key.
    #[error("token not found: {0}")]
    TokenNotFound(String),

    /// Second redemption attempt. Double-redemption is the abuse this
    /// system exists to prevent, so this is an error, not a no-op.
    #[error("token already redeemed for {}", entry.name)]
    AlreadyRedeemed {
        /// The consumed entry, so the operator sees who redeemed and when.
        entry: Box<LedgerEntry>,
    },

    /// No entry with the given surrogate id.
    #[error("no ledger entry with id {0}")]
    EntryNotFound(EntryId),

    /// Underlying persistence failure. Fatal to the current operation.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),
}

/// Result type for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;
