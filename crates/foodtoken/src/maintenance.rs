//! Operator-invoked maintenance: the audited duplicate-cleanup pass.
//!
//! Normal operation never deletes ledger rows. This pass handles databases
//! that accumulated duplicates before the identity constraints existed (or
//! through identity-field drift): groups sharing (name, email) with more
//! than one row are collapsed to the entry with the lowest surrogate id.

use tracing::{info, warn};

use foodtoken_core::EntryId;
use foodtoken_store::Store;

use crate::error::Result;
use crate::ledger::Ledger;

/// What the cleanup pass found and (unless a dry run) removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupReport {
    /// Number of (name, email) groups holding more than one row.
    pub groups: usize,
    /// Ids slated for removal (all but the lowest id of each group).
    pub candidates: Vec<EntryId>,
    /// Rows actually deleted; zero on a dry run.
    pub removed: usize,
    /// Entry count before the pass.
    pub before: u64,
    /// Entry count after the pass.
    pub after: u64,
    /// True when `force` was not set and nothing was deleted.
    pub dry_run: bool,
}

impl<S: Store> Ledger<S> {
    /// Scan for duplicated entries and delete all but the lowest-id row per
    /// group. The only sanctioned deletion path.
    ///
    /// With `force = false` this is a dry run: the report lists what would
    /// be removed and the ledger is untouched. Whether to confirm
    /// interactively before passing `force = true` is the caller's concern.
    pub async fn cleanup_duplicates(&self, force: bool) -> Result<CleanupReport> {
        let before = self.store().stats().await?.total;
        let groups = self.store().duplicate_groups().await?;

        // Keep the lowest id of each group; ids come back ascending.
        let candidates: Vec<EntryId> = groups
            .iter()
            .flat_map(|g| g.ids.iter().skip(1).copied())
            .collect();

        if !force {
            info!(
                groups = groups.len(),
                candidates = candidates.len(),
                "duplicate cleanup dry run"
            );
            return Ok(CleanupReport {
                groups: groups.len(),
                candidates,
                removed: 0,
                before,
                after: before,
                dry_run: true,
            });
        }

        let removed = self.store().delete_entries(&candidates).await?;
        let after = self.store().stats().await?.total;

        warn!(
            groups = groups.len(),
            removed, before, after, "duplicate cleanup applied"
        );

        Ok(CleanupReport {
            groups: groups.len(),
            candidates,
            removed,
            before,
            after,
            dry_run: false,
        })
    }
}
