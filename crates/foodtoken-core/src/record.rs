//! Raw student records and import-row field mapping.

use serde::{Deserialize, Serialize};

use crate::normalize;
use crate::types::FoodPreference;

/// A raw student record as it arrives from an import source.
///
/// Transient and unvalidated: fields may be malformed or incomplete. The
/// `food_choice` field is free text until classified.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentRecord {
    /// Display name, free text.
    pub name: String,
    /// Email, case-insensitive for identity purposes.
    pub email: String,
    /// Institution-issued enrollment id ("USN"), case-insensitive.
    pub usn: String,
    /// Class/section label, e.g. "ISE 3A".
    pub class_name: String,
    /// Free-text food preference as entered on the form.
    pub food_choice: String,
}

impl StudentRecord {
    /// Convenience constructor for tests and manual lists.
    pub fn new(name: &str, email: &str, usn: &str, class_name: &str, food_choice: &str) -> Self {
        Self {
            name: name.to_string(),
            email: email.to_string(),
            usn: usn.to_string(),
            class_name: class_name.to_string(),
            food_choice: food_choice.to_string(),
        }
    }

    /// Canonicalize for display and comparison: trim every text field.
    ///
    /// Case folding of email/USN happens only when deriving identity keys;
    /// original casing stays on the record for rendered credentials.
    pub fn normalized(&self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            usn: self.usn.trim().to_string(),
            class_name: self.class_name.trim().to_string(),
            food_choice: self.food_choice.trim().to_string(),
        }
    }

    /// Classify the free-text food preference.
    pub fn food_preference(&self) -> FoodPreference {
        FoodPreference::classify(&self.food_choice)
    }

    /// Build a record from (header, value) cells of one tabular import row.
    ///
    /// Header names vary across import variants; this tolerates the known
    /// synonyms. Unrecognized columns are ignored. Later duplicate columns
    /// do not overwrite an already-populated field.
    pub fn from_row<'a>(cells: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut record = StudentRecord::default();
        for (header, value) in cells {
            let Some(kind) = FieldKind::match_header(header) else {
                continue;
            };
            let slot = match kind {
                FieldKind::Name => &mut record.name,
                FieldKind::Email => &mut record.email,
                FieldKind::Usn => &mut record.usn,
                FieldKind::Class => &mut record.class_name,
                FieldKind::FoodChoice => &mut record.food_choice,
            };
            if slot.is_empty() {
                *slot = value.trim().to_string();
            }
        }
        record
    }

    /// Filesystem-safe identifier derived from the display name.
    pub fn safe_name(&self) -> String {
        normalize::safe_name(&self.name)
    }
}

/// The logical fields a tabular import row can populate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Name,
    Email,
    Usn,
    Class,
    FoodChoice,
}

impl FieldKind {
    /// Map a raw column header to a record field.
    ///
    /// Headers are compared after lower-casing, trimming, and collapsing
    /// whitespace to underscores, so `"Enter Your Name"` and
    /// `"enter_your_name"` are the same column.
    pub fn match_header(header: &str) -> Option<Self> {
        let key = header.trim().to_lowercase();
        let key = key.split_whitespace().collect::<Vec<_>>().join("_");
        match key.as_str() {
            "name" | "full_name" | "participant_name" | "your_name" | "student_name"
            | "enter_your_name" => Some(FieldKind::Name),
            "email" | "email_address" | "email_id" | "college_mail_id"
            | "enter_your_college_mail_id" => Some(FieldKind::Email),
            "usn" | "enrollment_id" | "enter_your_usn" => Some(FieldKind::Usn),
            "class" | "class_name" | "section" => Some(FieldKind::Class),
            "food_preference" | "food_choice" | "preference" | "veg_non_veg"
            | "what_kind_of_food_do_you_prefer" => Some(FieldKind::FoodChoice),
            _ => None,
        }
    }
}
