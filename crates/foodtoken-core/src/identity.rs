//! Identity keys: the uniqueness boundary between student records.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::normalize;
use crate::record::StudentRecord;

/// The (normalized email, normalized enrollment id) pair that decides whether
/// two records denote the same student.
///
/// Two keys collide when at least one non-empty component matches: a shared
/// email OR a shared enrollment id is sufficient to merge. This is a policy
/// choice inherited from the source data (either field alone may be miskeyed)
/// and it can over-merge when two genuinely different students share an email
/// address; the reconciliation report and the audited duplicate-cleanup pass
/// are the recourse in that case.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IdentityKey {
    /// Lower-cased, trimmed email; empty when the source had none.
    pub email: String,
    /// Lower-cased, trimmed enrollment id; empty when the source had none.
    pub usn: String,
}

impl IdentityKey {
    /// Derive the identity key for a record.
    ///
    /// Fails when both components would be empty: such a record has no
    /// viable identity and must be surfaced to the caller, not dropped.
    pub fn derive(record: &StudentRecord) -> Result<Self, ValidationError> {
        let email = normalize::fold(&record.email);
        let usn = normalize::fold(&record.usn);
        if email.is_empty() && usn.is_empty() {
            return Err(ValidationError::NoIdentity);
        }
        Ok(Self { email, usn })
    }

    /// Construct from already-normalized components (e.g. storage columns).
    pub fn from_parts(email: String, usn: String) -> Self {
        Self { email, usn }
    }

    /// Whether two keys denote the same student.
    ///
    /// Match on non-empty email OR non-empty enrollment id.
    pub fn collides(&self, other: &IdentityKey) -> bool {
        (!self.email.is_empty() && self.email == other.email)
            || (!self.usn.is_empty() && self.usn == other.usn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(email: &str, usn: &str) -> StudentRecord {
        StudentRecord::new("X", email, usn, "7DS", "veg")
    }

    #[test]
    fn derive_folds_case_and_whitespace() {
        let key = IdentityKey::derive(&record(" A@X.In ", " U1 ")).unwrap();
        assert_eq!(key.email, "a@x.in");
        assert_eq!(key.usn, "u1");
    }

    #[test]
    fn derive_rejects_empty_identity() {
        assert_eq!(
            IdentityKey::derive(&record("  ", "")),
            Err(ValidationError::NoIdentity)
        );
    }

    #[test]
    fn collides_on_email_or_usn() {
        let a = IdentityKey::from_parts("a@x.in".into(), "u1".into());
        let b = IdentityKey::from_parts("a@x.in".into(), "u2".into());
        let c = IdentityKey::from_parts("c@x.in".into(), "u1".into());
        let d = IdentityKey::from_parts("d@x.in".into(), "u4".into());
        assert!(a.collides(&b));
        assert!(a.collides(&c));
        assert!(!a.collides(&d));
    }

    #[test]
    fn empty_components_never_match() {
        let a = IdentityKey::from_parts(String::new(), "u1".into());
        let b = IdentityKey::from_parts(String::new(), "u2".into());
        assert!(!a.collides(&b));

        let c = IdentityKey::from_parts("c@x.in".into(), String::new());
        let d = IdentityKey::from_parts("d@x.in".into(), String::new());
        assert!(!c.collides(&d));
    }
}
