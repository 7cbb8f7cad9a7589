//! Point lookup for geocoded records and the matched-records projection.

use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use tracing::warn;

use crate::error::FixError;
use crate::models::{Record, RecordKey, Records};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// Load `key,x,y` rows from a CSV.
///
/// The key column is `primary_key` when the header has it, otherwise the
/// first column. `x` and `y` are matched case-insensitively.
pub fn load_geometry(
    path: &Path,
    primary_key: &str,
) -> Result<HashMap<RecordKey, Point>, FixError> {
    let file = File::open(path)?;
    let mut reader = csv::Reader::from_reader(BufReader::new(file));
    let headers = reader.headers()?.clone();

    let key_idx = headers.iter().position(|h| h == primary_key).unwrap_or(0);
    let column = |name: &str| {
        headers
            .iter()
            .position(|h| h.eq_ignore_ascii_case(name))
            .ok_or_else(|| FixError::MissingColumn(name.to_string()))
    };
    let x_idx = column("x")?;
    let y_idx = column("y")?;

    let mut points = HashMap::new();
    for result in reader.records() {
        let row = result?;
        let key = RecordKey::parse(row.get(key_idx).unwrap_or_default());
        let x = parse_coordinate(&key, row.get(x_idx))?;
        let y = parse_coordinate(&key, row.get(y_idx))?;
        points.insert(key, Point { x, y });
    }

    Ok(points)
}

fn parse_coordinate(key: &RecordKey, raw: Option<&str>) -> Result<f64, FixError> {
    let raw = raw.unwrap_or_default().trim();
    raw.parse().map_err(|_| FixError::InvalidCoordinate {
        key: key.clone(),
        value: raw.to_string(),
    })
}

/// Project every record not in `unmatched` through `columns`
/// (`(output, source)` pairs) and append its `x`/`y`.
///
/// A record without geometry keeps blank coordinates.
pub fn matched_table(
    records: &Records,
    unmatched: &Records,
    columns: &[(String, String)],
    geometry: &HashMap<RecordKey, Point>,
) -> Result<Vec<Record>, FixError> {
    let mut table = Vec::new();
    let mut missing = 0usize;

    for (key, record) in records {
        if unmatched.contains_key(key) {
            continue;
        }

        let mut fields = Vec::with_capacity(columns.len() + 2);
        for (output, source) in columns {
            fields.push((output.clone(), record.require(source)?.to_string()));
        }

        let (x, y) = match geometry.get(key) {
            Some(p) => (p.x.to_string(), p.y.to_string()),
            None => {
                missing += 1;
                (String::new(), String::new())
            }
        };
        fields.push(("x".to_string(), x));
        fields.push(("y".to_string(), y));

        table.push(Record::new(key.clone(), fields));
    }

    if missing > 0 {
        warn!("{} matched records have no geometry", missing);
    }

    Ok(table)
}
