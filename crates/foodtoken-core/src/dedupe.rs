//! Batch deduplication: collapse records denoting the same student.
//!
//! Collision is transitive: records sharing an email form a group, records
//! sharing an enrollment id form a group, and overlapping groups merge. A
//! plain pairwise scan misses the transitive case ({a@x,U1}, {a@x,U2},
//! {b@x,U1} are all one student), so grouping uses union-find keyed on both
//! components.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::identity::IdentityKey;
use crate::record::StudentRecord;

/// Why a record was not admitted as unique.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicateReason {
    /// The student already exists, either earlier in this batch or in the
    /// ledger from a previous import run.
    Exists,
}

impl fmt::Display for DuplicateReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DuplicateReason::Exists => f.write_str("exists"),
        }
    }
}

/// A record discarded by deduplication, with the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Duplicate {
    pub record: StudentRecord,
    pub reason: DuplicateReason,
}

/// Result of deduplicating one import batch.
#[derive(Debug, Clone, Default)]
pub struct DedupeOutcome {
    /// One canonical record per student, in first-encountered input order.
    pub unique: Vec<StudentRecord>,
    /// Records collapsed into an earlier record or already in the ledger.
    pub duplicates: Vec<Duplicate>,
    /// Records with no derivable identity key. Collected, never aborting
    /// the batch.
    pub rejected: Vec<(StudentRecord, ValidationError)>,
}

/// Deduplicate a batch against itself and against the existing ledger.
///
/// `existing` holds the identity keys of entries already issued; any batch
/// record colliding with one of them is reported as a duplicate and must
/// never be re-inserted or re-tokenized, which is what makes a re-run of the
/// same import a no-op.
///
/// Tie-break within a collision group: the first-encountered record in input
/// order is kept; conflicting field values on later records are discarded
/// along with the records themselves.
pub fn dedupe(batch: &[StudentRecord], existing: &[IdentityKey]) -> DedupeOutcome {
    let mut outcome = DedupeOutcome::default();

    // Normalize and key every record up front; rejects drop out here.
    let mut keyed: Vec<(StudentRecord, IdentityKey)> = Vec::with_capacity(batch.len());
    for raw in batch {
        let record = raw.normalized();
        match IdentityKey::derive(&record) {
            Ok(key) => keyed.push((record, key)),
            Err(err) => outcome.rejected.push((record, err)),
        }
    }

    // Union-find over batch indices, linking on shared email or shared USN.
    let mut uf = UnionFind::new(keyed.len());
    let mut by_email: HashMap<&str, usize> = HashMap::new();
    let mut by_usn: HashMap<&str, usize> = HashMap::new();
    for (i, (_, key)) in keyed.iter().enumerate() {
        if !key.email.is_empty() {
            match by_email.get(key.email.as_str()) {
                Some(&j) => uf.union(i, j),
                None => {
                    by_email.insert(&key.email, i);
                }
            }
        }
        if !key.usn.is_empty() {
            match by_usn.get(key.usn.as_str()) {
                Some(&j) => uf.union(i, j),
                None => {
                    by_usn.insert(&key.usn, i);
                }
            }
        }
    }

    // A group is already in the ledger when any of its members collides with
    // an existing identity.
    let mut group_exists: HashMap<usize, bool> = HashMap::new();
    for (i, (_, key)) in keyed.iter().enumerate() {
        let root = uf.find(i);
        let hit = existing.iter().any(|e| e.collides(key));
        *group_exists.entry(root).or_insert(false) |= hit;
    }

    // First-encountered member represents its group, unless the group is
    // already present in the ledger.
    let mut seen_roots: HashMap<usize, ()> = HashMap::new();
    for (i, (record, _)) in keyed.iter().enumerate() {
        let root = uf.find(i);
        let in_ledger = group_exists.get(&root).copied().unwrap_or(false);
        let first = seen_roots.insert(root, ()).is_none();
        if first && !in_ledger {
            outcome.unique.push(record.clone());
        } else {
            outcome.duplicates.push(Duplicate {
                record: record.clone(),
                reason: DuplicateReason::Exists,
            });
        }
    }

    outcome
}

/// Minimal union-find with path compression.
struct UnionFind {
    parent: Vec<usize>,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            // Lower root wins so group representatives keep input order.
            let (keep, drop) = if ra < rb { (ra, rb) } else { (rb, ra) };
            self.parent[drop] = keep;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(name: &str, email: &str, usn: &str) -> StudentRecord {
        StudentRecord::new(name, email, usn, "7DS", "veg")
    }

    #[test]
    fn exact_repeat_is_collapsed() {
        let batch = vec![
            rec("A", "a@x.in", "U1"),
            rec("A", "a@x.in", "U1"),
        ];
        let out = dedupe(&batch, &[]);
        assert_eq!(out.unique.len(), 1);
        assert_eq!(out.duplicates.len(), 1);
        assert_eq!(out.duplicates[0].reason, DuplicateReason::Exists);
    }

    #[test]
    fn transitive_collision_collapses_to_one() {
        let batch = vec![
            rec("A", "a@x.in", "U1"),
            rec("B", "a@x.in", "U2"),
            rec("C", "b@x.in", "U1"),
        ];
        let out = dedupe(&batch, &[]);
        assert_eq!(out.unique.len(), 1);
        assert_eq!(out.unique[0].name, "A");
        assert_eq!(out.duplicates.len(), 2);
    }

    #[test]
    fn first_encountered_record_wins() {
        let batch = vec![
            rec("Original", "a@x.in", "U1"),
            rec("Conflicting Class", "a@x.in", "U1"),
        ];
        let out = dedupe(&batch, &[]);
        assert_eq!(out.unique[0].name, "Original");
    }

    #[test]
    fn ledger_match_suppresses_whole_group() {
        let existing = vec![IdentityKey::from_parts("a@x.in".into(), "u1".into())];
        let batch = vec![rec("A", "A@X.IN", "U9"), rec("B", "b@x.in", "u9")];
        let out = dedupe(&batch, &existing);
        // A matches the ledger by email; B shares A's USN, so the group is
        // already present and nothing is admitted.
        assert!(out.unique.is_empty());
        assert_eq!(out.duplicates.len(), 2);
    }

    #[test]
    fn case_and_whitespace_variants_collide() {
        let batch = vec![
            rec("A", " A@X.In ", "u1"),
            rec("A again", "a@x.in", "U1"),
        ];
        let out = dedupe(&batch, &[]);
        assert_eq!(out.unique.len(), 1);
    }

    #[test]
    fn rejects_are_collected_not_fatal() {
        let batch = vec![
            rec("No Identity", "", ""),
            rec("Fine", "f@x.in", "U3"),
        ];
        let out = dedupe(&batch, &[]);
        assert_eq!(out.unique.len(), 1);
        assert_eq!(out.rejected.len(), 1);
        assert_eq!(out.rejected[0].1, ValidationError::NoIdentity);
    }

    #[test]
    fn disjoint_records_all_unique() {
        let batch = vec![
            rec("A", "a@x.in", "U1"),
            rec("B", "b@x.in", "U2"),
            rec("C", "c@x.in", "U3"),
        ];
        let out = dedupe(&batch, &[]);
        assert_eq!(out.unique.len(), 3);
        assert!(out.duplicates.is_empty());
    }
}
