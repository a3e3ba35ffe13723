//! # Food-Token Testkit
//!
//! Testing utilities for the food-token ledger.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Fixtures**: Helper structs for setting up ledger test scenarios
//! - **Generators**: Proptest strategies for property-based testing
//!
//! ## Test Fixtures
//!
//! Quickly set up test scenarios:
//!
//! ```rust
//! use foodtoken_testkit::fixtures::{sample_roster, TestFixture};
//!
//! let fixture = TestFixture::new();
//! let roster = sample_roster();
//! assert!(!roster.is_empty());
//! # drop(fixture);
//! ```
//!
//! ## Property Testing
//!
//! Use the generators with proptest:
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use foodtoken_testkit::generators::student_record;
//!
//! proptest! {
//!     #[test]
//!     fn every_record_normalizes(record in student_record()) {
//!         let normalized = record.normalized();
//!         prop_assert_eq!(normalized.email.trim(), normalized.email);
//!     }
//! }
//! ```

pub mod fixtures;
pub mod generators;

pub use fixtures::{record, sample_roster, TestFixture};
