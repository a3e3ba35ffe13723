//! Text normalization for identity comparison and filesystem identifiers.
//!
//! Display casing is preserved everywhere a human sees the value (rendered
//! credentials, email bodies); normalization applies to comparison keys and
//! derived filenames only.

/// Fold a free-text field for comparison: trim and lower-case.
///
/// Used for email and enrollment-id identity components.
pub fn fold(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Derive a filesystem-safe identifier from a display name.
///
/// Strips everything that is not alphanumeric, space, hyphen, or
/// underscore, then collapses runs of whitespace to single underscores.
pub fn safe_name(name: &str) -> String {
    let kept: String = name
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == ' ' || *c == '-' || *c == '_')
        .collect();
    kept.split_whitespace().collect::<Vec<_>>().join("_")
}

/// Replace whitespace runs with underscores, keeping all other characters.
///
/// Class labels go through this milder form (they are operator-controlled,
/// not form free-text).
pub fn underscored(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join("_")
}
