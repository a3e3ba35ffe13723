//! Error types for core record validation.

use thiserror::Error;

/// Validation errors for raw student records.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Both email and enrollment id are empty, so no identity key can be
    /// derived. Such records are rejected, never silently dropped.
    #[error("no identity key: email and enrollment id are both empty")]
    NoIdentity,
}
