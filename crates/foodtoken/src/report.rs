//! Reconciliation: ledger vs rendered credential files vs import results.
//!
//! Pure read/aggregate over inputs the caller collects; never mutates the
//! ledger. The credential association comes only from `credential_path`
//! stored at render time; files are never matched back to students by
//! guessing filename patterns.

use std::collections::{BTreeMap, HashSet};

use foodtoken_core::{Duplicate, EntryId, LedgerEntry, StudentRecord, ValidationError};

/// Discrepancies and counts for operator visibility.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Entries whose `credential_path` is unset or names no existing file.
    pub missing_credentials: Vec<EntryId>,
    /// Rendered files no entry refers to.
    pub orphan_files: Vec<String>,
    /// Import records the deduplicator discarded, grouped by reason.
    pub rejected_by_reason: BTreeMap<String, Vec<StudentRecord>>,
    pub total: u64,
    pub issued: u64,
    pub redeemed: u64,
    pub veg: u64,
    pub non_veg: u64,
}

/// Compute the reconciliation report.
///
/// `rendered_files` holds the paths of credential images that actually
/// exist on disk, as enumerated by the caller (the ledger core does no
/// filesystem I/O).
pub fn reconcile(
    entries: &[LedgerEntry],
    rendered_files: &[String],
    duplicates: &[Duplicate],
    rejected: &[(StudentRecord, ValidationError)],
) -> ReconcileReport {
    let mut report = ReconcileReport::default();

    let file_set: HashSet<&str> = rendered_files.iter().map(String::as_str).collect();
    let mut referenced: HashSet<&str> = HashSet::new();

    for entry in entries {
        report.total += 1;
        if entry.is_redeemed() {
            report.redeemed += 1;
        } else {
            report.issued += 1;
        }
        match entry.food_preference {
            foodtoken_core::FoodPreference::Veg => report.veg += 1,
            foodtoken_core::FoodPreference::NonVeg => report.non_veg += 1,
        }

        match entry.credential_path.as_deref() {
            Some(path) if file_set.contains(path) => {
                referenced.insert(path);
            }
            _ => report.missing_credentials.push(entry.id),
        }
    }

    report.orphan_files = rendered_files
        .iter()
        .filter(|path| !referenced.contains(path.as_str()))
        .cloned()
        .collect();

    for dup in duplicates {
        report
            .rejected_by_reason
            .entry(dup.reason.to_string())
            .or_default()
            .push(dup.record.clone());
    }
    for (record, err) in rejected {
        report
            .rejected_by_reason
            .entry(err.to_string())
            .or_default()
            .push(record.clone());
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use foodtoken_core::{
        DuplicateReason, FoodPreference, Token, TokenState,
    };

    fn entry(id: i64, path: Option<&str>, state: TokenState) -> LedgerEntry {
        LedgerEntry {
            id: EntryId(id),
            name: format!("Student {id}"),
            email: format!("s{id}@x.in"),
            usn: format!("U{id}"),
            class_name: "7DS".into(),
            food_preference: if id % 2 == 0 {
                FoodPreference::Veg
            } else {
                FoodPreference::NonVeg
            },
            token: Token::generate(),
            credential_path: path.map(str::to_string),
            state,
            redeemed_at: (state == TokenState::Redeemed).then_some(1),
            created_at: 0,
        }
    }

    #[test]
    fn flags_missing_and_orphans() {
        let entries = vec![
            entry(1, Some("qr/a.jpg"), TokenState::Issued),
            entry(2, Some("qr/gone.jpg"), TokenState::Issued),
            entry(3, None, TokenState::Redeemed),
        ];
        let files = vec!["qr/a.jpg".to_string(), "qr/stray.jpg".to_string()];

        let report = reconcile(&entries, &files, &[], &[]);
        assert_eq!(report.missing_credentials, vec![EntryId(2), EntryId(3)]);
        assert_eq!(report.orphan_files, vec!["qr/stray.jpg".to_string()]);
        assert_eq!(report.total, 3);
        assert_eq!(report.issued, 2);
        assert_eq!(report.redeemed, 1);
    }

    #[test]
    fn groups_rejects_by_reason() {
        let dup = Duplicate {
            record: StudentRecord::new("A", "a@x.in", "U1", "7DS", "veg"),
            reason: DuplicateReason::Exists,
        };
        let reject = (
            StudentRecord::new("B", "", "", "7DS", "veg"),
            ValidationError::NoIdentity,
        );

        let report = reconcile(&[], &[], &[dup], &[reject]);
        assert_eq!(report.rejected_by_reason["exists"].len(), 1);
        assert_eq!(report.rejected_by_reason.len(), 2);
    }

    #[test]
    fn counts_food_breakdown() {
        let entries = vec![
            entry(2, None, TokenState::Issued),
            entry(4, None, TokenState::Issued),
            entry(5, None, TokenState::Issued),
        ];
        let report = reconcile(&entries, &[], &[], &[]);
        assert_eq!(report.veg, 2);
        assert_eq!(report.non_veg, 1);
    }
}
