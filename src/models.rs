use std::collections::BTreeMap;
use std::ops::Range;

use regex::{Regex, RegexBuilder};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::error::FixError;

/// Name of the field the normalizer writes the repaired address into.
pub const FIXED_ADDRESS_FIELD: &str = "fixedAddress";

/// A record collection keyed by primary key.
pub type Records = BTreeMap<RecordKey, Record>;

/// Primary-key value of a [`Record`].
///
/// Integer-looking keys order numerically, everything else lexically, and all
/// integer keys sort before text keys.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RecordKey {
    Int(i64),
    Text(String),
}

impl RecordKey {
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed.parse::<i64>() {
            Ok(n) => RecordKey::Int(n),
            Err(_) => RecordKey::Text(trimmed.to_string()),
        }
    }
}

impl std::fmt::Display for RecordKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordKey::Int(n) => write!(f, "{}", n),
            RecordKey::Text(s) => write!(f, "{}", s),
        }
    }
}

impl Serialize for RecordKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            RecordKey::Int(n) => serializer.serialize_i64(*n),
            RecordKey::Text(s) => serializer.serialize_str(s),
        }
    }
}

/// One row of the geocoding table: ordered `(field, value)` pairs plus the
/// primary key the row is identified by.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    key: RecordKey,
    fields: Vec<(String, String)>,
}

impl Record {
    pub fn new(key: RecordKey, fields: Vec<(String, String)>) -> Self {
        Self { key, fields }
    }

    pub fn key(&self) -> &RecordKey {
        &self.key
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value.as_str())
    }

    /// Like [`Record::get`] but a missing field is a [`FixError::MissingField`].
    pub fn require(&self, field: &str) -> Result<&str, FixError> {
        self.get(field).ok_or_else(|| FixError::MissingField {
            key: self.key.clone(),
            field: field.to_string(),
        })
    }

    /// Overwrite `field` in place, or append it at the end when absent.
    pub fn set(&mut self, field: &str, value: impl Into<String>) {
        let value = value.into();
        match self.fields.iter_mut().find(|(name, _)| name == field) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((field.to_string(), value)),
        }
    }

    /// Builder form of [`Record::set`].
    pub fn with(mut self, field: &str, value: impl Into<String>) -> Self {
        self.set(field, value);
        self
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn fixed_address(&self) -> Option<&str> {
        self.get(FIXED_ADDRESS_FIELD)
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// A labeled pattern describing one class of malformed address.
///
/// Literal patterns are matched as plain substrings; regex patterns use the
/// [`regex`] syntax. Both are matched case-insensitively.
#[derive(Debug, Clone)]
pub struct AnomalyMarker {
    label: String,
    pattern: String,
    matcher: Regex,
}

impl AnomalyMarker {
    pub fn literal(label: &str, text: &str) -> Result<Self, FixError> {
        Self::build(label, text, &regex::escape(&text.to_lowercase()))
    }

    pub fn regex(label: &str, pattern: &str) -> Result<Self, FixError> {
        Self::build(label, pattern, pattern)
    }

    fn build(label: &str, pattern: &str, source: &str) -> Result<Self, FixError> {
        let matcher = RegexBuilder::new(source)
            .case_insensitive(true)
            .build()
            .map_err(|source| FixError::InvalidPattern {
                label: label.to_string(),
                source,
            })?;

        Ok(Self {
            label: label.to_string(),
            pattern: pattern.to_string(),
            matcher,
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Byte range of the first match in `text`.
    pub fn find(&self, text: &str) -> Option<Range<usize>> {
        self.matcher.find(text).map(|m| m.range())
    }

    /// `text` with every match removed.
    pub fn strip(&self, text: &str) -> String {
        self.matcher.replace_all(text, "").into_owned()
    }
}

/// Why a record could not be rewritten.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnfixedReason {
    /// No token equal to the marker.
    NoMarker,
    /// Marker is the first or last token.
    Boundary,
}

impl std::fmt::Display for UnfixedReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnfixedReason::NoMarker => write!(f, "no marker"),
            UnfixedReason::Boundary => write!(f, "marker at boundary"),
        }
    }
}

/// Terminal result of normalizing one address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NormalizationOutcome {
    Fixed(String),
    Unfixed(UnfixedReason),
}

/// A record left for manual follow-up, untouched, with the reason.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Unfixed {
    pub record: Record,
    pub reason: UnfixedReason,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_key_ordering() {
        let mut keys = vec![
            RecordKey::parse("b"),
            RecordKey::parse("10"),
            RecordKey::parse("9"),
            RecordKey::parse("a"),
        ];
        keys.sort();
        let rendered: Vec<String> = keys.iter().map(ToString::to_string).collect();
        assert_eq!(rendered, vec!["9", "10", "a", "b"]);
    }

    #[test]
    fn test_record_set_keeps_field_order() {
        let mut rec = Record::new(
            RecordKey::Int(1),
            vec![
                ("FID".into(), "1".into()),
                ("street_add".into(), "Rte 1 Box 147".into()),
            ],
        );
        rec.set("street_add", "rte 1");
        rec.set(FIXED_ADDRESS_FIELD, "rte 1");

        let names: Vec<&str> = rec.field_names().collect();
        assert_eq!(names, vec!["FID", "street_add", FIXED_ADDRESS_FIELD]);
        assert_eq!(rec.get("street_add"), Some("rte 1"));
    }

    #[test]
    fn test_require_missing_field() {
        let rec = Record::new(RecordKey::Int(7), vec![]);
        let err = rec.require("street_add").unwrap_err();
        assert!(matches!(err, FixError::MissingField { .. }));
        assert_eq!(err.to_string(), "record 7 has no field 'street_add'");
    }

    #[test]
    fn test_literal_marker_escapes_metacharacters() {
        let marker = AnomalyMarker::literal("dot", "p.o.").unwrap();
        assert!(marker.find("pxox").is_none());
        assert_eq!(marker.find("12 P.O. box"), Some(3..7));
    }

    #[test]
    fn test_invalid_regex_marker() {
        let err = AnomalyMarker::regex("broken", "(unclosed").unwrap_err();
        assert!(matches!(err, FixError::InvalidPattern { .. }));
    }
}
