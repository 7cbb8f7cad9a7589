use std::path::Path;

use anyhow::Result;
use serde::Deserialize;

use crate::anomaly::pobox::BoxNormalizer;
use crate::anomaly::tokens::DEFAULT_PREFIXES;
use crate::error::FixError;
use crate::models::AnomalyMarker;

/// Root configuration structure, deserialized from `.address-fixr/config.toml`.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Column names in the geocoding table.
    pub fields: FieldConfig,
    /// P.O. Box repair settings.
    #[serde(rename = "box")]
    pub pobox: BoxConfig,
    /// Anomaly classes, reported and written out in this order.
    pub anomalies: Vec<AnomalyConfig>,
    /// Column projection for the matched-records output.
    pub matched: MatchedConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct FieldConfig {
    /// Column holding each row's unique identifier.
    pub primary_key: String,
    /// Free-text street address column that gets scanned and repaired.
    pub address: String,
    /// Locator name written by the geocoder; blank means unmatched.
    pub locator: String,
}

impl Default for FieldConfig {
    fn default() -> Self {
        FieldConfig {
            primary_key: "FID".to_string(),
            address: "street_add".to_string(),
            locator: "Loc_name".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct BoxConfig {
    /// Token that introduces the box number.
    pub marker: String,
    /// Tokens stripped when they directly precede the marker.
    pub prefixes: Vec<String>,
}

impl Default for BoxConfig {
    fn default() -> Self {
        BoxConfig {
            marker: "box".to_string(),
            prefixes: DEFAULT_PREFIXES.iter().map(|p| p.to_string()).collect(),
        }
    }
}

/// One anomaly class: `pattern` is a plain substring unless `regex = true`.
#[derive(Debug, Deserialize, Clone)]
pub struct AnomalyConfig {
    pub label: String,
    pub pattern: String,
    #[serde(default)]
    pub regex: bool,
}

impl AnomalyConfig {
    fn literal(label: &str, pattern: &str) -> Self {
        AnomalyConfig {
            label: label.to_string(),
            pattern: pattern.to_string(),
            regex: false,
        }
    }

    pub fn to_marker(&self) -> Result<AnomalyMarker, FixError> {
        if self.regex {
            AnomalyMarker::regex(&self.label, &self.pattern)
        } else {
            AnomalyMarker::literal(&self.label, &self.pattern)
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct MatchedConfig {
    /// `(output column, source column)` pairs; `x` and `y` are appended.
    pub columns: Vec<(String, String)>,
}

impl Default for MatchedConfig {
    fn default() -> Self {
        let columns = [
            ("FID", "FID"),
            ("LocatorName", "Loc_name"),
            ("Score", "Score"),
            ("Address", "Match_addr"),
            ("Stand_add", "ARC_Street"),
            ("city", "ARC_City"),
            ("state", "ARC_State"),
            ("zip", "ARC_ZIP"),
            ("address_id", "address_id"),
        ];
        MatchedConfig {
            columns: columns
                .iter()
                .map(|(out, src)| (out.to_string(), src.to_string()))
                .collect(),
        }
    }
}

impl Default for Config {
    /// Built-in settings used when no config file is found: the four anomaly
    /// classes lot, hashtag, apt and box over an Esri-style results table.
    fn default() -> Self {
        Config {
            fields: FieldConfig::default(),
            pobox: BoxConfig::default(),
            anomalies: vec![
                AnomalyConfig::literal("lot", "lot"),
                AnomalyConfig::literal("hashtag", "#"),
                AnomalyConfig::literal("apt", "apt"),
                AnomalyConfig::literal("box", "box"),
            ],
            matched: MatchedConfig::default(),
        }
    }
}

impl Config {
    /// Compile every configured anomaly pattern.
    pub fn markers(&self) -> Result<Vec<AnomalyMarker>, FixError> {
        self.anomalies.iter().map(AnomalyConfig::to_marker).collect()
    }

    /// Marker selecting the records handed to the box normalizer.
    pub fn box_marker(&self) -> Result<AnomalyMarker, FixError> {
        AnomalyMarker::literal("box", &self.pobox.marker)
    }

    pub fn box_normalizer(&self) -> BoxNormalizer {
        BoxNormalizer::new(&self.pobox.marker, &self.pobox.prefixes)
    }
}

/// Load the configuration, searching in order:
///
/// 1. `config_override`: path passed via `--config`
/// 2. `<input_dir>/.address-fixr/config.toml`
/// 3. `~/.config/address-fixr/config.toml`
/// 4. Built-in [`Config::default`]
pub fn load_config(input_dir: &Path, config_override: Option<&Path>) -> Result<Config> {
    if let Some(path) = config_override {
        let content = std::fs::read_to_string(path)?;
        return Ok(toml::from_str(&content)?);
    }

    let local_config = input_dir.join(".address-fixr").join("config.toml");
    if local_config.exists() {
        let content = std::fs::read_to_string(&local_config)?;
        return Ok(toml::from_str(&content)?);
    }

    if let Some(home) = dirs::home_dir() {
        let home_config = home
            .join(".config")
            .join("address-fixr")
            .join("config.toml");
        if home_config.exists() {
            let content = std::fs::read_to_string(&home_config)?;
            return Ok(toml::from_str(&content)?);
        }
    }

    Ok(Config::default())
}
