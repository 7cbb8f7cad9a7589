//! CSV ingestion and egestion for geocoding result tables, plus the
//! locator statistics computed over them.

use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::Serialize;

use crate::error::FixError;
use crate::models::{Record, RecordKey, Records};

/// A table read from disk: header order plus the rows keyed by primary key.
#[derive(Debug)]
pub struct Dataset {
    pub headers: Vec<String>,
    pub records: Records,
}

/// Read a CSV whose header row names every field.
///
/// Fails when `primary_key` is not a column or when two rows share a key.
pub fn read_csv(path: &Path, primary_key: &str) -> Result<Dataset, FixError> {
    let file = File::open(path)?;
    let mut reader = csv::Reader::from_reader(BufReader::new(file));

    let headers: Vec<String> = reader.headers()?.iter().map(String::from).collect();
    let key_idx = headers
        .iter()
        .position(|h| h == primary_key)
        .ok_or_else(|| FixError::MissingColumn(primary_key.to_string()))?;

    let mut records = Records::new();
    for result in reader.records() {
        let row = result?;
        let key = RecordKey::parse(row.get(key_idx).unwrap_or_default());
        let fields = headers
            .iter()
            .cloned()
            .zip(row.iter().map(String::from))
            .collect();

        if records.contains_key(&key) {
            return Err(FixError::DuplicateKey(key));
        }
        records.insert(key.clone(), Record::new(key, fields));
    }

    Ok(Dataset { headers, records })
}

/// Write records as CSV, using the first record's fields as the header row.
///
/// Returns the number of rows written. Nothing is written, and no file is
/// created, when `records` is empty.
pub fn write_csv<'a, I>(path: &Path, records: I) -> Result<usize, FixError>
where
    I: IntoIterator<Item = &'a Record>,
{
    let mut records = records.into_iter().peekable();
    let Some(first) = records.peek() else {
        return Ok(0);
    };
    let headers: Vec<String> = first.field_names().map(String::from).collect();

    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(&headers)?;

    let mut written = 0;
    for record in records {
        writer.write_record(headers.iter().map(|h| record.get(h).unwrap_or_default()))?;
        written += 1;
    }
    writer.flush()?;

    Ok(written)
}

/// How many rows one locator matched.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocatorCount {
    pub locator: String,
    pub count: usize,
    pub percentage: f64,
}

/// Count rows per locator value, most frequent first (ties by name).
pub fn locator_summary(
    records: &Records,
    locator_field: &str,
) -> Result<Vec<LocatorCount>, FixError> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for record in records.values() {
        let locator = record.require(locator_field)?.trim().to_string();
        *counts.entry(locator).or_insert(0) += 1;
    }

    let total = records.len() as f64;
    let mut summary: Vec<LocatorCount> = counts
        .into_iter()
        .map(|(locator, count)| LocatorCount {
            locator,
            count,
            percentage: count as f64 / total * 100.0,
        })
        .collect();
    summary.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.locator.cmp(&b.locator)));

    Ok(summary)
}

/// Records the geocoder could not place: the locator field is blank.
pub fn filter_unmatched(records: &Records, locator_field: &str) -> Result<Records, FixError> {
    let mut unmatched = Records::new();
    for (key, record) in records {
        if record.require(locator_field)?.trim().is_empty() {
            unmatched.insert(key.clone(), record.clone());
        }
    }
    Ok(unmatched)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SAMPLE: &str = "\
FID,Loc_name,street_add
1,Streets,12 Main St
2, ,P O Box 337 216 West Front Street #11
3,,Rte 1 Box 147
10,Streets,9 Elm Ave
4,ZIP,Lot 4 Pine Rd
";

    fn sample() -> Dataset {
        let mut f = NamedTempFile::new().unwrap();
        write!(f, "{}", SAMPLE).unwrap();
        read_csv(f.path(), "FID").unwrap()
    }

    #[test]
    fn test_read_csv() {
        let data = sample();
        assert_eq!(data.headers, vec!["FID", "Loc_name", "street_add"]);
        assert_eq!(data.records.len(), 5);

        let keys: Vec<String> = data.records.keys().map(ToString::to_string).collect();
        assert_eq!(keys, vec!["1", "2", "3", "4", "10"]);

        let rec = &data.records[&RecordKey::Int(3)];
        assert_eq!(rec.get("street_add"), Some("Rte 1 Box 147"));
    }

    #[test]
    fn test_read_csv_missing_primary_key() {
        let mut f = NamedTempFile::new().unwrap();
        write!(f, "{}", SAMPLE).unwrap();
        let err = read_csv(f.path(), "OBJECTID").unwrap_err();
        assert!(matches!(err, FixError::MissingColumn(c) if c == "OBJECTID"));
    }

    #[test]
    fn test_read_csv_duplicate_key() {
        let mut f = NamedTempFile::new().unwrap();
        write!(f, "FID,street_add\n1,a\n1,b\n").unwrap();
        let err = read_csv(f.path(), "FID").unwrap_err();
        assert!(matches!(err, FixError::DuplicateKey(RecordKey::Int(1))));
    }

    #[test]
    fn test_filter_unmatched_blank_locators() {
        let data = sample();
        let unmatched = filter_unmatched(&data.records, "Loc_name").unwrap();
        let keys: Vec<_> = unmatched.keys().cloned().collect();
        assert_eq!(keys, vec![RecordKey::Int(2), RecordKey::Int(3)]);
    }

    #[test]
    fn test_locator_summary() {
        let data = sample();
        let summary = locator_summary(&data.records, "Loc_name").unwrap();

        assert_eq!(summary[0].locator, "");
        assert_eq!(summary[0].count, 2);
        assert_eq!(summary[1].locator, "Streets");
        assert_eq!(summary[1].count, 2);
        assert_eq!(summary[2].locator, "ZIP");
        assert!((summary[2].percentage - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_write_csv_round_trip_order() {
        let data = sample();
        let out = NamedTempFile::new().unwrap();
        let fixed: Vec<Record> = data
            .records
            .values()
            .take(2)
            .map(|r| r.clone().with("fixedAddress", "x"))
            .collect();

        let written = write_csv(out.path(), &fixed).unwrap();
        assert_eq!(written, 2);

        let content = std::fs::read_to_string(out.path()).unwrap();
        let first_line = content.lines().next().unwrap();
        assert_eq!(first_line, "FID,Loc_name,street_add,fixedAddress");
    }

    #[test]
    fn test_write_csv_empty_creates_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("none.csv");
        let written = write_csv(&path, std::iter::empty::<&Record>()).unwrap();
        assert_eq!(written, 0);
        assert!(!path.exists());
    }
}
