//! The credential payload: the exact bytes embedded in a student's QR code.
//!
//! This field set is the wire contract between the ledger and the external
//! redemption-point service, which decodes it independently. Changing field
//! names or the `type` marker breaks deployed scanners.

use serde::{Deserialize, Serialize};

use crate::entry::LedgerEntry;
use crate::types::{FoodPreference, Token};

/// Marker distinguishing food-token payloads from other QR content a
/// scanner might see.
pub const PAYLOAD_TYPE: &str = "food-token";

/// Structured record serialized into the QR image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialPayload {
    /// The redemption credential, canonical string form.
    pub token: Token,
    /// Display name, original casing.
    pub name: String,
    /// Email, original casing.
    pub email: String,
    /// `veg` / `non-veg`.
    pub food_preference: FoodPreference,
    /// Class/section label.
    pub class: String,
    /// Always [`PAYLOAD_TYPE`].
    #[serde(rename = "type")]
    pub kind: String,
}

impl CredentialPayload {
    /// Build the payload for a ledger entry.
    pub fn from_entry(entry: &LedgerEntry) -> Self {
        Self {
            token: entry.token,
            name: entry.name.clone(),
            email: entry.email.clone(),
            food_preference: entry.food_preference,
            class: entry.class_name.clone(),
            kind: PAYLOAD_TYPE.to_string(),
        }
    }

    /// Serialize to the JSON form the QR renderer embeds.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Decode a scanned payload.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Whether this payload carries the food-token marker.
    pub fn is_food_token(&self) -> bool {
        self.kind == PAYLOAD_TYPE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EntryId, TokenState};

    fn entry() -> LedgerEntry {
        LedgerEntry {
            id: EntryId(1),
            name: "Madeeha Zahoor".into(),
            email: "madeeha.is23@sahyadri.edu.in".into(),
            usn: "4SF23IS055".into(),
            class_name: "ISE 5B".into(),
            food_preference: FoodPreference::NonVeg,
            token: Token::generate(),
            credential_path: None,
            state: TokenState::Issued,
            redeemed_at: None,
            created_at: 0,
        }
    }

    #[test]
    fn payload_carries_wire_field_set() {
        let e = entry();
        let json = CredentialPayload::from_entry(&e).to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let obj = value.as_object().unwrap();

        for field in ["token", "name", "email", "food_preference", "class", "type"] {
            assert!(obj.contains_key(field), "missing wire field {field}");
        }
        assert_eq!(obj["type"], "food-token");
        assert_eq!(obj["food_preference"], "non-veg");
        assert_eq!(obj["token"], e.token.as_string());
    }

    #[test]
    fn scanner_side_decode() {
        let e = entry();
        let json = CredentialPayload::from_entry(&e).to_json().unwrap();
        let decoded = CredentialPayload::from_json(&json).unwrap();
        assert!(decoded.is_food_token());
        assert_eq!(decoded.token, e.token);
        assert_eq!(decoded.name, e.name);
    }

    #[test]
    fn foreign_json_is_rejected() {
        assert!(CredentialPayload::from_json("{\"hello\":\"world\"}").is_err());
        assert!(CredentialPayload::from_json("not json at all").is_err());
    }
}
