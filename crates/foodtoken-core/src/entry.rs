//! The persistent ledger entry: one row per unique student.

use serde::{Deserialize, Serialize};

use crate::identity::IdentityKey;
use crate::normalize;
use crate::types::{EntryId, FoodPreference, Token, TokenState};

/// One row of the token ledger.
///
/// Created exactly once when a student's identity key has no existing match;
/// mutated only by redemption (state transition) or maintenance merges;
/// never deleted outside the audited duplicate-cleanup pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Surrogate key, assigned once by storage.
    pub id: EntryId,
    /// Display name, original casing.
    pub name: String,
    /// Email, original casing (compared case-insensitively).
    pub email: String,
    /// Enrollment id, original casing (compared case-insensitively).
    pub usn: String,
    /// Class/section label.
    pub class_name: String,
    /// Normalized food preference.
    pub food_preference: FoodPreference,
    /// The redemption credential. Globally unique, never reused.
    pub token: Token,
    /// Path of the externally rendered QR image, set at render time.
    pub credential_path: Option<String>,
    /// Issued until redeemed; Redeemed is terminal.
    pub state: TokenState,
    /// Unix ms; set if and only if `state == Redeemed`.
    pub redeemed_at: Option<i64>,
    /// Unix ms, set at creation.
    pub created_at: i64,
}

impl LedgerEntry {
    /// The identity key this entry occupies in the uniqueness boundary.
    pub fn identity_key(&self) -> IdentityKey {
        IdentityKey::from_parts(normalize::fold(&self.email), normalize::fold(&self.usn))
    }

    pub fn is_redeemed(&self) -> bool {
        self.state == TokenState::Redeemed
    }

    /// Stem for the rendered credential file:
    /// `{safe name}_{class with underscores}_{token prefix}`.
    pub fn credential_file_stem(&self) -> String {
        format!(
            "{}_{}_{}",
            normalize::safe_name(&self.name),
            normalize::underscored(&self.class_name),
            self.token.short()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry() -> LedgerEntry {
        LedgerEntry {
            id: EntryId(7),
            name: "Shivaraj Sadashiv Chigare".into(),
            email: "Shivaraj.DS22@sahyadri.edu.in".into(),
            usn: "4SF23CD404".into(),
            class_name: "ISE 3A".into(),
            food_preference: FoodPreference::Veg,
            token: Token::generate(),
            credential_path: None,
            state: TokenState::Issued,
            redeemed_at: None,
            created_at: 1_700_000_000_000,
        }
    }

    #[test]
    fn identity_key_is_case_folded() {
        let e = entry();
        let key = e.identity_key();
        assert_eq!(key.email, "shivaraj.ds22@sahyadri.edu.in");
        assert_eq!(key.usn, "4sf23cd404");
    }

    #[test]
    fn credential_stem_shape() {
        let e = entry();
        let stem = e.credential_file_stem();
        assert!(stem.starts_with("Shivaraj_Sadashiv_Chigare_ISE_3A_"));
        assert!(stem.ends_with(&e.token.short()));
    }
}
