//! Anomaly detection and repair for street-address fields.
//!
//! - [`tokens`]: whitespace tokenization and token predicates.
//! - [`classifier`]: selects the records whose address matches an
//!   [`AnomalyMarker`](crate::models::AnomalyMarker) and optionally trims them.
//! - [`pobox`]: rewrites addresses carrying an embedded P.O. Box reference.

pub mod classifier;
pub mod pobox;
pub mod tokens;
