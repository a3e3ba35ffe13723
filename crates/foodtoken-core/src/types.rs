//! Strong type definitions for the food token ledger.
//!
//! Identifiers are newtypes to prevent misuse at compile time.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// The opaque, single-use redemption credential assigned to one student.
///
/// A token is a 128-bit random value (UUID v4) rendered in canonical
/// hyphenated form. It is the sole redemption credential, so sequential or
/// otherwise guessable identifiers are deliberately not supported.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Token(Uuid);

impl Token {
    /// Generate a fresh random token.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID (e.g. read back from storage).
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Parse from the canonical hyphenated string form.
    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Uuid::parse_str(s.trim()).map(Self)
    }

    /// The canonical string form, as embedded in credentials.
    pub fn as_string(&self) -> String {
        self.0.to_string()
    }

    /// Short prefix used in credential filenames (first 8 hex chars).
    pub fn short(&self) -> String {
        self.as_string()[..8].to_string()
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Token({})", self.short())
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Token {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Surrogate key for a ledger entry, assigned once by storage, immutable.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(pub i64);

impl fmt::Debug for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntryId({})", self.0)
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle state of a ledger entry. `Redeemed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenState {
    /// Entered at creation; the token may still be redeemed.
    Issued,
    /// The token has been consumed exactly once.
    Redeemed,
}

impl TokenState {
    /// Integer form used by storage (0 = issued, 1 = redeemed).
    pub fn to_i64(self) -> i64 {
        match self {
            TokenState::Issued => 0,
            TokenState::Redeemed => 1,
        }
    }

    /// Parse the storage integer form.
    pub fn from_i64(v: i64) -> Option<Self> {
        match v {
            0 => Some(TokenState::Issued),
            1 => Some(TokenState::Redeemed),
            _ => None,
        }
    }
}

/// Normalized food preference.
///
/// Source data is free text from a form; classification happens in exactly
/// one place, [`FoodPreference::classify`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FoodPreference {
    #[serde(rename = "veg")]
    Veg,
    #[serde(rename = "non-veg")]
    NonVeg,
}

impl FoodPreference {
    /// Classify free-text preference input.
    ///
    /// Rule: the lower-cased text contains `"veg"` and does not contain
    /// `"non"` → `Veg`; everything else, including empty input, is `NonVeg`.
    pub fn classify(text: &str) -> Self {
        let lower = text.trim().to_lowercase();
        if lower.contains("veg") && !lower.contains("non") {
            FoodPreference::Veg
        } else {
            FoodPreference::NonVeg
        }
    }

    /// The storage/wire string form.
    pub fn as_str(&self) -> &'static str {
        match self {
            FoodPreference::Veg => "veg",
            FoodPreference::NonVeg => "non-veg",
        }
    }

    /// Parse the storage string form.
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "veg" => Some(FoodPreference::Veg),
            "non-veg" => Some(FoodPreference::NonVeg),
            _ => None,
        }
    }
}

impl fmt::Display for FoodPreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_are_unique_and_roundtrip() {
        let a = Token::generate();
        let b = Token::generate();
        assert_ne!(a, b);

        let parsed = Token::parse(&a.as_string()).unwrap();
        assert_eq!(a, parsed);
    }

    #[test]
    fn token_short_is_eight_chars() {
        let t = Token::generate();
        assert_eq!(t.short().len(), 8);
        assert!(t.as_string().starts_with(&t.short()));
    }

    #[test]
    fn classify_veg_variants() {
        assert_eq!(FoodPreference::classify("Veg"), FoodPreference::Veg);
        assert_eq!(FoodPreference::classify("vegetarian"), FoodPreference::Veg);
        assert_eq!(FoodPreference::classify(" VEG "), FoodPreference::Veg);
    }

    #[test]
    fn classify_non_veg_variants() {
        assert_eq!(FoodPreference::classify("Non-Veg"), FoodPreference::NonVeg);
        assert_eq!(FoodPreference::classify("non veg"), FoodPreference::NonVeg);
        assert_eq!(FoodPreference::classify("NONVEG"), FoodPreference::NonVeg);
    }

    #[test]
    fn classify_empty_defaults_to_non_veg() {
        assert_eq!(FoodPreference::classify(""), FoodPreference::NonVeg);
    }

    #[test]
    fn state_integer_roundtrip() {
        assert_eq!(TokenState::from_i64(0), Some(TokenState::Issued));
        assert_eq!(TokenState::from_i64(1), Some(TokenState::Redeemed));
        assert_eq!(TokenState::from_i64(7), None);
        assert_eq!(TokenState::Redeemed.to_i64(), 1);
    }
}
