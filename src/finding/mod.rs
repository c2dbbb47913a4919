//! Finding post-processing: stable identity and text sanitization.
//!
//! The [`crate::models::finding::Finding`] and [`crate::models::finding::Severity`]
//! types themselves live in `models::finding`; this module holds the
//! operations applied to them after an agent produces them and before a
//! reporter ever sees them.

pub mod fingerprint;
pub mod sanitize;

pub use fingerprint::{dedupe_key, fingerprint_finding, DedupeKey};
pub use sanitize::sanitize_finding;
