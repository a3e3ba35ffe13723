//! The Ledger: unified API over the persistent token store.
//!
//! One entry per unique student, one token per entry, exactly-once
//! redemption. Batch import jobs, the redemption service, and reporting
//! tools all go through this facade.

use std::sync::Arc;

use tracing::{info, warn};

use foodtoken_core::{
    dedupe, Duplicate, DuplicateReason, EntryId, IdentityKey, LedgerEntry, StudentRecord, Token,
    ValidationError,
};
use foodtoken_store::{
    InsertOutcome, LedgerStats, NewEntry, RedeemKey, RedeemOutcome, RedemptionEvent, Store,
};

use crate::error::{LedgerError, Result};

/// Outcome of one batch import.
///
/// A batch never aborts on the first bad record: every record lands in
/// exactly one of the three buckets.
#[derive(Debug, Default)]
pub struct ImportReport {
    /// Entries issued by this run, in input order.
    pub issued: Vec<LedgerEntry>,
    /// Records collapsed into an earlier record or already in the ledger.
    pub duplicates: Vec<Duplicate>,
    /// Records with no derivable identity key.
    pub rejected: Vec<(StudentRecord, ValidationError)>,
}

/// The main ledger struct, generic over the storage backend.
pub struct Ledger<S: Store> {
    store: Arc<S>,
}

impl<S: Store> Clone for Ledger<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

impl<S: Store> Ledger<S> {
    /// Wrap a storage backend.
    pub fn new(store: S) -> Self {
        Self {
            store: Arc::new(store),
        }
    }

    /// Get the store reference.
    pub fn store(&self) -> &S {
        &self.store
    }

    // ─────────────────────────────────────────────────────────────────────
    // Issuance
    // ─────────────────────────────────────────────────────────────────────

    /// Issue a token for one student.
    ///
    /// Creates a new entry in state Issued with a freshly generated token.
    /// Fails with [`LedgerError::DuplicateIdentity`] when an entry with a
    /// colliding identity key already exists; re-issuing the same identity
    /// is therefore safe to retry.
    pub async fn issue(&self, record: &StudentRecord) -> Result<LedgerEntry> {
        let record = record.normalized();
        IdentityKey::derive(&record)?;

        let new_entry = NewEntry {
            name: record.name.clone(),
            email: record.email.clone(),
            usn: record.usn.clone(),
            class_name: record.class_name.clone(),
            food_preference: record.food_preference(),
            token: Token::generate(),
            created_at: now_millis(),
        };

        match self.store.insert_entry(&new_entry).await? {
            InsertOutcome::Inserted(entry) => {
                info!(id = entry.id.0, name = %entry.name, "issued token");
                Ok(entry)
            }
            InsertOutcome::DuplicateIdentity { existing } => {
                Err(LedgerError::DuplicateIdentity { existing })
            }
        }
    }

    /// Import a batch of raw records.
    ///
    /// Deduplicates within the batch and against the current ledger, then
    /// issues one entry per unique student. Records already issued in a
    /// previous run come back as duplicates with reason `exists`, which
    /// makes re-running the same import a no-op.
    pub async fn import(&self, batch: &[StudentRecord]) -> Result<ImportReport> {
        let existing = self.store.identity_keys().await?;
        let outcome = dedupe(batch, &existing);

        let mut report = ImportReport {
            issued: Vec::with_capacity(outcome.unique.len()),
            duplicates: outcome.duplicates,
            rejected: outcome.rejected,
        };

        for record in outcome.unique {
            match self.issue(&record).await {
                Ok(entry) => report.issued.push(entry),
                // A concurrent import can win the race between our dedupe
                // snapshot and the insert; that record is a duplicate, not
                // a batch failure.
                Err(LedgerError::DuplicateIdentity { .. }) => {
                    report.duplicates.push(Duplicate {
                        record,
                        reason: DuplicateReason::Exists,
                    });
                }
                Err(err) => return Err(err),
            }
        }

        info!(
            issued = report.issued.len(),
            duplicates = report.duplicates.len(),
            rejected = report.rejected.len(),
            "import finished"
        );
        Ok(report)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Redemption
    // ─────────────────────────────────────────────────────────────────────

    /// Redeem a token scanned at the point of service.
    ///
    /// One-shot: the first call transitions the entry to Redeemed and
    /// stamps `redeemed_at`; every later call fails with
    /// [`LedgerError::AlreadyRedeemed`] and leaves state unchanged.
    /// `scanner_info` identifies the caller in the audit trail.
    pub async fn redeem(&self, token: &Token, scanner_info: &str) -> Result<LedgerEntry> {
        self.redeem_key(RedeemKey::Token(*token), scanner_info, &token.as_string())
            .await
    }

    /// Redeem by manually typed enrollment id, for when the QR scan fails.
    ///
    /// Same one-shot semantics as [`Ledger::redeem`]; the key is matched
    /// case-insensitively.
    pub async fn redeem_by_fallback_key(
        &self,
        enrollment_id: &str,
        scanner_info: &str,
    ) -> Result<LedgerEntry> {
        self.redeem_key(
            RedeemKey::Usn(enrollment_id.to_string()),
            scanner_info,
            enrollment_id,
        )
        .await
    }

    async fn redeem_key(
        &self,
        key: RedeemKey,
        scanner_info: &str,
        shown: &str,
    ) -> Result<LedgerEntry> {
        match self.store.redeem(&key, now_millis(), scanner_info).await? {
            RedeemOutcome::Redeemed(entry) => {
                info!(id = entry.id.0, name = %entry.name, "redeemed");
                Ok(entry)
            }
            RedeemOutcome::AlreadyRedeemed(entry) => {
                warn!(id = entry.id.0, name = %entry.name, "second redemption attempt");
                Err(LedgerError::AlreadyRedeemed {
                    entry: Box::new(entry),
                })
            }
            RedeemOutcome::NotFound => Err(LedgerError::TokenNotFound(shown.to_string())),
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Queries (read-only, never mutate state)
    // ─────────────────────────────────────────────────────────────────────

    /// Look up an entry by token or enrollment id, whichever matches.
    ///
    /// Token form is tried first; anything that does not parse as a token,
    /// or parses but matches nothing, falls back to enrollment-id lookup.
    pub async fn lookup(&self, token_or_key: &str) -> Result<Option<LedgerEntry>> {
        if let Ok(token) = Token::parse(token_or_key) {
            if let Some(entry) = self.store.get_by_token(&token).await? {
                return Ok(Some(entry));
            }
        }
        Ok(self.store.get_by_usn(token_or_key).await?)
    }

    /// All entries, ordered by surrogate id.
    pub async fn entries(&self) -> Result<Vec<LedgerEntry>> {
        Ok(self.store.list_entries().await?)
    }

    /// Aggregate counts: total, issued, redeemed, veg/non-veg breakdown.
    pub async fn stats(&self) -> Result<LedgerStats> {
        Ok(self.store.stats().await?)
    }

    /// The redemption audit trail, optionally for one entry.
    pub async fn redemptions(&self, entry_id: Option<EntryId>) -> Result<Vec<RedemptionEvent>> {
        Ok(self.store.list_redemptions(entry_id).await?)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Credential reference
    // ─────────────────────────────────────────────────────────────────────

    /// Record the rendered credential file for an entry.
    ///
    /// Called by the renderer at render time; the stored path is the only
    /// association between entries and files, never re-derived from
    /// filename patterns.
    pub async fn set_credential_path(&self, id: EntryId, path: &str) -> Result<()> {
        if self.store.set_credential_path(id, path).await? {
            Ok(())
        } else {
            Err(LedgerError::EntryNotFound(id))
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Reset
    // ─────────────────────────────────────────────────────────────────────

    /// Remove every entry and audit row.
    ///
    /// Destructive; a no-op returning false unless `force` is set. Whether
    /// to confirm interactively is the caller's concern.
    pub async fn clear(&self, force: bool) -> Result<bool> {
        if !force {
            return Ok(false);
        }
        let before = self.store.stats().await?.total;
        self.store.clear_all().await?;
        warn!(removed = before, "ledger cleared");
        Ok(true)
    }
}

/// Get current time in milliseconds.
pub(crate) fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time went backwards")
        .as_millis() as i64
}
