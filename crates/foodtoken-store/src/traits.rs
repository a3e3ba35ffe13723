//! Store trait: the abstract interface for ledger persistence.
//!
//! The ledger is a single shared persistent store accessed by independent,
//! short-lived processes (batch imports, the redemption service, reporting
//! tools). Implementations include SQLite (primary) and in-memory (tests).

use async_trait::async_trait;

use foodtoken_core::{EntryId, IdentityKey, LedgerEntry, Token};

use crate::error::Result;

/// Candidate row for insertion. The store assigns the surrogate id.
#[derive(Debug, Clone)]
pub struct NewEntry {
    pub name: String,
    pub email: String,
    pub usn: String,
    pub class_name: String,
    pub food_preference: foodtoken_core::FoodPreference,
    pub token: Token,
    pub created_at: i64,
}

/// Result of attempting to insert a new entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The entry was created; the returned row carries its assigned id.
    Inserted(LedgerEntry),
    /// An entry with a colliding identity key already exists. Nothing was
    /// written; re-running an import is a no-op.
    DuplicateIdentity {
        /// The existing entry occupying this identity.
        existing: EntryId,
    },
}

/// How a redemption call identifies its target entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedeemKey {
    /// Exact token match (QR scan path).
    Token(Token),
    /// Normalized enrollment id (manual operator entry when the scan fails).
    Usn(String),
}

/// Result of an atomic redemption attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedeemOutcome {
    /// This call performed the one transition to Redeemed.
    Redeemed(LedgerEntry),
    /// The entry was already redeemed; state is unchanged.
    AlreadyRedeemed(LedgerEntry),
    /// No entry matches the key.
    NotFound,
}

/// One row of the redemption audit trail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedemptionEvent {
    pub entry_id: EntryId,
    pub redeemed_at: i64,
    /// Free-form caller identification (e.g. scanner station or remote IP).
    pub scanner_info: String,
}

/// Aggregate counts over the ledger.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LedgerStats {
    pub total: u64,
    pub issued: u64,
    pub redeemed: u64,
    pub veg: u64,
    pub non_veg: u64,
    pub veg_redeemed: u64,
    pub non_veg_redeemed: u64,
}

/// A set of entries sharing the same (name, email), found by the
/// maintenance scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateGroup {
    pub name: String,
    pub email: String,
    /// Ids in ascending order; the first is kept by cleanup.
    pub ids: Vec<EntryId>,
}

/// The Store trait: async interface for ledger persistence.
///
/// # Design Notes
///
/// - **Atomic issuance**: `insert_entry` checks identity collision and
///   inserts in one transaction, so concurrent imports cannot double-issue.
/// - **Atomic redemption**: `redeem` performs the read-compare-write as a
///   single conditional update; two concurrent calls for the same token
///   yield exactly one `Redeemed` and one `AlreadyRedeemed`.
/// - **No silent deletion**: rows leave the ledger only through
///   `delete_entries` (maintenance) or `clear_all` (explicit reset).
#[async_trait]
pub trait Store: Send + Sync {
    // ─────────────────────────────────────────────────────────────────────
    // Issuance
    // ─────────────────────────────────────────────────────────────────────

    /// Insert a new entry unless its identity collides with an existing row.
    ///
    /// Collision rule: non-empty normalized email OR non-empty normalized
    /// enrollment id matches an existing entry.
    async fn insert_entry(&self, entry: &NewEntry) -> Result<InsertOutcome>;

    // ─────────────────────────────────────────────────────────────────────
    // Lookup (read-only)
    // ─────────────────────────────────────────────────────────────────────

    /// Get an entry by surrogate id.
    async fn get_entry(&self, id: EntryId) -> Result<Option<LedgerEntry>>;

    /// Get an entry by exact token.
    async fn get_by_token(&self, token: &Token) -> Result<Option<LedgerEntry>>;

    /// Get an entry by normalized enrollment id (case-insensitive).
    async fn get_by_usn(&self, usn_norm: &str) -> Result<Option<LedgerEntry>>;

    /// All entries, ordered by surrogate id.
    async fn list_entries(&self) -> Result<Vec<LedgerEntry>>;

    /// Identity keys of every entry, for batch deduplication.
    async fn identity_keys(&self) -> Result<Vec<IdentityKey>>;

    /// Aggregate counts.
    async fn stats(&self) -> Result<LedgerStats>;

    // ─────────────────────────────────────────────────────────────────────
    // Redemption
    // ─────────────────────────────────────────────────────────────────────

    /// Atomically transition the matched entry to Redeemed and append an
    /// audit event. State is written only when the entry is still Issued.
    async fn redeem(
        &self,
        key: &RedeemKey,
        redeemed_at: i64,
        scanner_info: &str,
    ) -> Result<RedeemOutcome>;

    /// Audit trail, optionally filtered to one entry, ordered by time.
    async fn list_redemptions(&self, entry_id: Option<EntryId>) -> Result<Vec<RedemptionEvent>>;

    // ─────────────────────────────────────────────────────────────────────
    // Credential reference
    // ─────────────────────────────────────────────────────────────────────

    /// Record the rendered credential file for an entry. Returns false when
    /// no entry has this id.
    async fn set_credential_path(&self, id: EntryId, path: &str) -> Result<bool>;

    // ─────────────────────────────────────────────────────────────────────
    // Maintenance
    // ─────────────────────────────────────────────────────────────────────

    /// Groups of entries sharing (name, email) with more than one row.
    async fn duplicate_groups(&self) -> Result<Vec<DuplicateGroup>>;

    /// Delete the given entries and their audit rows. Returns the number of
    /// entries removed. The only sanctioned deletion path.
    async fn delete_entries(&self, ids: &[EntryId]) -> Result<usize>;

    /// Remove every entry and audit row.
    async fn clear_all(&self) -> Result<()>;
}
