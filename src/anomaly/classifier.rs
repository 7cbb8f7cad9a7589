use tracing::info;

use crate::error::FixError;
use crate::models::{AnomalyMarker, Records};

/// Records whose address matched one [`AnomalyMarker`].
#[derive(Debug, Clone)]
pub struct AnomalySubset {
    pub label: String,
    /// Size of the collection the subset was drawn from.
    pub population: usize,
    pub records: Records,
}

impl AnomalySubset {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Share of the source collection selected, in percent.
    pub fn percentage(&self) -> f64 {
        if self.population == 0 {
            return 0.0;
        }
        self.records.len() as f64 / self.population as f64 * 100.0
    }
}

/// Select every record whose lower-cased `field` matches `marker` anywhere.
///
/// An empty result is not an error. Fails on the first record lacking
/// `field`, since that means the table does not have the expected schema.
pub fn classify(
    records: &Records,
    field: &str,
    marker: &AnomalyMarker,
) -> Result<AnomalySubset, FixError> {
    let mut selected = Records::new();

    for (key, record) in records {
        let value = record.require(field)?.to_lowercase();
        if marker.find(&value).is_some() {
            selected.insert(key.clone(), record.clone());
        }
    }

    let subset = AnomalySubset {
        label: marker.label().to_string(),
        population: records.len(),
        records: selected,
    };

    if subset.is_empty() {
        info!(group = marker.label(), pattern = marker.pattern(), "no records");
    } else {
        info!(
            group = marker.label(),
            pattern = marker.pattern(),
            "{} of {} records ({:.2}%)",
            subset.len(),
            subset.population,
            subset.percentage()
        );
    }

    Ok(subset)
}

/// [`classify`], then trim the anomaly out of each selected address.
///
/// The untouched value is kept under `<field>_old`. When the first match
/// starts after the beginning of the value, everything from the match onwards
/// is cut off and the preceding text is kept as is. When it starts at index 0 there would be nothing left, so only
/// the matched text itself is removed.
pub fn identify_anomaly(
    records: &Records,
    field: &str,
    marker: &AnomalyMarker,
) -> Result<AnomalySubset, FixError> {
    let mut subset = classify(records, field, marker)?;
    let old_field = format!("{}_old", field);

    for record in subset.records.values_mut() {
        let original = record.require(field)?.to_string();
        // The marker is case-insensitive, so offsets index `original` directly
        let Some(found) = marker.find(&original) else {
            continue;
        };

        let trimmed = if found.start > 0 {
            original[..found.start].to_string()
        } else {
            marker.strip(&original)
        };

        record.set(&old_field, original);
        record.set(field, trimmed);
    }

    Ok(subset)
}

/// Run [`identify_anomaly`] once per marker, in the order given.
pub fn parse_anomalies(
    records: &Records,
    field: &str,
    markers: &[AnomalyMarker],
) -> Result<Vec<AnomalySubset>, FixError> {
    markers
        .iter()
        .map(|marker| identify_anomaly(records, field, marker))
        .collect()
}
