use std::collections::BTreeMap;

use serde::Serialize;

use crate::anomaly::tokens::{is_alphanumeric, tokenize, DEFAULT_PREFIXES};
use crate::error::FixError;
use crate::models::{
    NormalizationOutcome, Record, RecordKey, Records, Unfixed, UnfixedReason, FIXED_ADDRESS_FIELD,
};

/// Result of normalizing a batch: every input record lands in exactly one map,
/// both keyed by the record's primary key.
#[derive(Debug, Default, Serialize)]
pub struct NormalizationReport {
    /// Input records with a `fixedAddress` field appended.
    pub fixed: Records,
    pub unfixed: BTreeMap<RecordKey, Unfixed>,
}

impl NormalizationReport {
    pub fn total(&self) -> usize {
        self.fixed.len() + self.unfixed.len()
    }

    fn insert(&mut self, record: &Record, outcome: NormalizationOutcome) {
        let key = record.key().clone();
        match outcome {
            NormalizationOutcome::Fixed(address) => {
                self.fixed
                    .insert(key, record.clone().with(FIXED_ADDRESS_FIELD, address));
            }
            NormalizationOutcome::Unfixed(reason) => {
                self.unfixed.insert(
                    key,
                    Unfixed {
                        record: record.clone(),
                        reason,
                    },
                );
            }
        }
    }
}

/// Rewrites addresses such as `"P O Box 337 216 West Front Street #11"` into
/// the street address they contain (`"216 west front street #11"`).
///
/// The box number after the marker and any run of "P.O." prefix tokens
/// directly before it are dropped along with the marker itself.
#[derive(Debug, Clone)]
pub struct BoxNormalizer {
    marker: String,
    prefixes: Vec<String>,
}

impl Default for BoxNormalizer {
    fn default() -> Self {
        Self::new("box", DEFAULT_PREFIXES)
    }
}

impl BoxNormalizer {
    pub fn new<I, S>(marker: &str, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            marker: marker.trim().to_lowercase(),
            prefixes: prefixes
                .into_iter()
                .map(|p| p.as_ref().trim().to_lowercase())
                .collect(),
        }
    }

    /// Normalize a single address string.
    pub fn normalize_address(&self, address: &str) -> NormalizationOutcome {
        let tokens = tokenize(address);

        let Some(at) = tokens.iter().position(|t| *t == self.marker) else {
            return NormalizationOutcome::Unfixed(UnfixedReason::NoMarker);
        };

        // Needs a token on each side to look at
        if at == 0 || at + 1 == tokens.len() {
            return NormalizationOutcome::Unfixed(UnfixedReason::Boundary);
        }

        let mut dropped = vec![false; tokens.len()];
        dropped[at] = true;

        if is_alphanumeric(&tokens[at + 1]) {
            dropped[at + 1] = true;
        }

        // Only the run directly before the marker; a lone "o" further back is
        // part of the street.
        for i in (0..at).rev() {
            if !self.prefixes.contains(&tokens[i]) {
                break;
            }
            dropped[i] = true;
        }

        let kept: Vec<&str> = tokens
            .iter()
            .zip(&dropped)
            .filter(|(_, drop)| !**drop)
            .map(|(token, _)| token.as_str())
            .collect();

        NormalizationOutcome::Fixed(kept.join(" ").trim().to_string())
    }

    /// Normalize `field` of one record.
    pub fn normalize_record(
        &self,
        record: &Record,
        field: &str,
    ) -> Result<NormalizationOutcome, FixError> {
        Ok(self.normalize_address(record.require(field)?))
    }

    /// Normalize `field` of every record and partition them into fixed and
    /// unfixed. `observe` is called once per record with its outcome.
    ///
    /// Only a missing field aborts the batch.
    pub fn normalize_box_addresses<F>(
        &self,
        records: &Records,
        field: &str,
        mut observe: F,
    ) -> Result<NormalizationReport, FixError>
    where
        F: FnMut(&RecordKey, &NormalizationOutcome),
    {
        let mut report = NormalizationReport::default();
        for record in records.values() {
            let outcome = self.normalize_record(record, field)?;
            observe(record.key(), &outcome);
            report.insert(record, outcome);
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed(address: &str) -> NormalizationOutcome {
        NormalizationOutcome::Fixed(address.to_string())
    }

    fn unfixed(reason: UnfixedReason) -> NormalizationOutcome {
        NormalizationOutcome::Unfixed(reason)
    }

    fn records(addresses: &[&str]) -> Records {
        addresses
            .iter()
            .enumerate()
            .map(|(i, addr)| {
                let key = RecordKey::Int(i as i64 + 1);
                let rec = Record::new(
                    key.clone(),
                    vec![
                        ("FID".to_string(), (i + 1).to_string()),
                        ("street_add".to_string(), addr.to_string()),
                    ],
                );
                (key, rec)
            })
            .collect()
    }

    #[test]
    fn test_leading_po_box() {
        let n = BoxNormalizer::default();
        assert_eq!(
            n.normalize_address("P O Box 337  216 West Front Street #11"),
            fixed("216 west front street #11")
        );
    }

    #[test]
    fn test_trailing_po_box() {
        let n = BoxNormalizer::default();
        assert_eq!(
            n.normalize_address("15355 Doc Rd Hwy 89 P.O. Box 717"),
            fixed("15355 doc rd hwy 89")
        );
    }

    #[test]
    fn test_rural_route_box() {
        let n = BoxNormalizer::default();
        assert_eq!(n.normalize_address("Rte 1 Box 147"), fixed("rte 1"));
    }

    #[test]
    fn test_alphanumeric_box_number() {
        let n = BoxNormalizer::default();
        assert_eq!(
            n.normalize_address("PO Box 106B 12 Elm St"),
            fixed("12 elm st")
        );
    }

    #[test]
    fn test_non_alphanumeric_follower_is_kept() {
        let n = BoxNormalizer::default();
        assert_eq!(
            n.normalize_address("PO Box #5 12 Elm St"),
            fixed("#5 12 elm st")
        );
    }

    #[test]
    fn test_backward_scan_stops_at_first_street_token() {
        // The "o" in the street name is not adjacent to the prefix run
        let n = BoxNormalizer::default();
        assert_eq!(
            n.normalize_address("Rd O Main P O Box 9"),
            fixed("rd o main")
        );
    }

    #[test]
    fn test_duplicate_prefix_tokens_removed_by_position() {
        let n = BoxNormalizer::default();
        assert_eq!(
            n.normalize_address("12 o st o box 4"),
            fixed("12 o st")
        );
    }

    #[test]
    fn test_only_marker_is_boundary() {
        let n = BoxNormalizer::default();
        assert_eq!(n.normalize_address("box"), unfixed(UnfixedReason::Boundary));
        assert_eq!(n.normalize_address(" BOX "), unfixed(UnfixedReason::Boundary));
    }

    #[test]
    fn test_marker_last_is_boundary() {
        let n = BoxNormalizer::default();
        assert_eq!(
            n.normalize_address("Rte 1 Box"),
            unfixed(UnfixedReason::Boundary)
        );
    }

    #[test]
    fn test_marker_first_is_boundary() {
        let n = BoxNormalizer::default();
        assert_eq!(
            n.normalize_address("Box 147 Rte 1"),
            unfixed(UnfixedReason::Boundary)
        );
    }

    #[test]
    fn test_marker_must_be_whole_token() {
        let n = BoxNormalizer::default();
        assert_eq!(
            n.normalize_address("14 Boxwood Ln"),
            unfixed(UnfixedReason::NoMarker)
        );
    }

    #[test]
    fn test_nothing_left_is_fixed_empty() {
        let n = BoxNormalizer::default();
        assert_eq!(n.normalize_address("P.O. Box 12"), fixed(""));
    }

    #[test]
    fn test_empty_result_lands_in_fixed() {
        let data = records(&["P O Box 12"]);
        let report = BoxNormalizer::default()
            .normalize_box_addresses(&data, "street_add", |_, _| {})
            .unwrap();
        assert!(report.unfixed.is_empty());
        assert_eq!(report.fixed[&RecordKey::Int(1)].fixed_address(), Some(""));
    }

    #[test]
    fn test_custom_marker_and_prefixes() {
        let n = BoxNormalizer::new("BIN", ["rr"]);
        assert_eq!(n.normalize_address("40 Hill Rd RR Bin 3"), fixed("40 hill rd"));
    }

    #[test]
    fn test_partition_is_total_and_disjoint() {
        let data = records(&[
            "P O Box 337 216 West Front Street #11",
            "15355 Doc Rd Hwy 89 P.O. Box 717",
            "Rte 1 Box 147",
            "box",
            "14 Boxwood Ln",
        ]);
        let mut seen = Vec::new();
        let report = BoxNormalizer::default()
            .normalize_box_addresses(&data, "street_add", |key, _| seen.push(key.clone()))
            .unwrap();

        assert_eq!(report.total(), data.len());
        assert_eq!(seen.len(), data.len());
        for key in data.keys() {
            assert_ne!(
                report.fixed.contains_key(key),
                report.unfixed.contains_key(key)
            );
        }

        assert_eq!(
            report.fixed[&RecordKey::Int(3)].fixed_address(),
            Some("rte 1")
        );
        assert_eq!(report.unfixed[&RecordKey::Int(4)].reason, UnfixedReason::Boundary);
        assert_eq!(report.unfixed[&RecordKey::Int(5)].reason, UnfixedReason::NoMarker);
    }

    #[test]
    fn test_records_without_marker_are_never_fixed() {
        let data = records(&["12 Main St", "Lot 4 Pine Rd"]);
        let report = BoxNormalizer::default()
            .normalize_box_addresses(&data, "street_add", |_, _| {})
            .unwrap();
        assert!(report.fixed.is_empty());
        assert_eq!(report.unfixed.len(), 2);
    }

    #[test]
    fn test_unfixed_record_is_untouched() {
        let data = records(&["box"]);
        let report = BoxNormalizer::default()
            .normalize_box_addresses(&data, "street_add", |_, _| {})
            .unwrap();
        let entry = &report.unfixed[&RecordKey::Int(1)];
        assert_eq!(entry.record, data[&RecordKey::Int(1)]);
        assert!(entry.record.fixed_address().is_none());
    }

    #[test]
    fn test_missing_field_aborts_batch() {
        let data = records(&["Rte 1 Box 147"]);
        let err = BoxNormalizer::default()
            .normalize_box_addresses(&data, "address", |_, _| {})
            .unwrap_err();
        assert!(matches!(err, FixError::MissingField { .. }));
    }
}
