use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "address-fixr",
    about = "Find anomalous addresses among unmatched geocoding results and repair P.O. Box entries",
    version
)]
pub struct Cli {
    /// Geocoding results table (CSV with a header row)
    pub input: PathBuf,

    /// Config file [default: <input dir>/.address-fixr/config.toml, fallback ~/.config/address-fixr/config.toml]
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Primary-key column (overrides config)
    #[arg(long, value_name = "COLUMN")]
    pub primary_key: Option<String>,

    /// Street address column to scan and repair (overrides config)
    #[arg(long, value_name = "COLUMN")]
    pub field: Option<String>,

    /// Directory for fixed.csv, unfixed.csv and anomaly files [default: input's directory]
    #[arg(long, value_name = "DIR")]
    pub out_dir: Option<PathBuf>,

    /// Report format
    #[arg(long, default_value = "terminal", value_name = "FORMAT")]
    pub report: ReportFormat,

    /// Write one geocode_<label>_<date>.csv per anomaly class
    #[arg(long)]
    pub anomalies: bool,

    /// Write matched records, with coordinates, to FILE
    #[arg(long, value_name = "FILE")]
    pub matched: Option<PathBuf>,

    /// CSV of key,x,y points joined onto --matched output
    #[arg(long, value_name = "FILE", requires = "matched")]
    pub geometry: Option<PathBuf>,

    /// Show fixed records too, and debug logs
    #[arg(short, long)]
    pub verbose: bool,

    /// Only print summary line
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, clap::ValueEnum)]
pub enum ReportFormat {
    Terminal,
    Json,
}
