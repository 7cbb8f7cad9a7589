//! Report renderers for a repair run.
//!
//! - [`terminal`]: colored summary box plus tables of unfixed (and, with
//!   `--verbose`, fixed) records; `--quiet` prints one line.
//! - JSON output is [`RunSummary`] serialized with `serde_json`.

pub mod terminal;

use std::path::Path;

use serde::Serialize;

use crate::anomaly::classifier::AnomalySubset;
use crate::anomaly::pobox::NormalizationReport;
use crate::dataset::LocatorCount;

/// Size of one anomaly class among the unmatched records.
#[derive(Debug, Clone, Serialize)]
pub struct AnomalyCount {
    pub label: String,
    pub count: usize,
    pub percentage: f64,
}

impl From<&AnomalySubset> for AnomalyCount {
    fn from(subset: &AnomalySubset) -> Self {
        AnomalyCount {
            label: subset.label.clone(),
            count: subset.len(),
            percentage: subset.percentage(),
        }
    }
}

/// Everything a renderer needs to describe one run.
#[derive(Debug, Serialize)]
pub struct RunSummary<'a> {
    pub input: &'a Path,
    pub total: usize,
    pub locators: Vec<LocatorCount>,
    pub unmatched: usize,
    pub anomalies: Vec<AnomalyCount>,
    /// Unmatched records selected for P.O. Box repair.
    pub box_candidates: usize,
    pub normalization: &'a NormalizationReport,
}
