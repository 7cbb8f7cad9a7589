//! `address-fixr`: find anomalous street addresses among records a geocoder
//! could not match, and rewrite P.O. Box entries into geocodable addresses.
//!
//! # Flow
//! 1. Parse CLI arguments ([`cli`]).
//! 2. Load config ([`config::load_config`]).
//! 3. Read the results table and report locator match rates ([`dataset`]).
//! 4. Keep the unmatched rows and classify them by anomaly ([`anomaly::classifier`]).
//! 5. Repair the box subset ([`anomaly::pobox`]).
//! 6. Write `fixed.csv` / `unfixed.csv`, optional anomaly and matched files.
//! 7. Render the requested report ([`report`]).

mod anomaly;
mod cli;
mod config;
mod dataset;
mod error;
mod geometry;
mod models;
mod report;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info, warn, Level};

use anomaly::classifier::{classify, parse_anomalies};
use cli::{Cli, ReportFormat};
use config::load_config;
use dataset::{filter_unmatched, locator_summary, read_csv, write_csv};
use models::{NormalizationOutcome, Record};
use report::{AnomalyCount, RunSummary};

/// Batches smaller than this are normalized without a progress bar.
const PROGRESS_THRESHOLD: usize = 500;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else if cli.quiet {
        Level::WARN
    } else {
        Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let input_dir = cli
        .input
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));

    let mut config = load_config(&input_dir, cli.config.as_deref())?;
    if let Some(pk) = &cli.primary_key {
        config.fields.primary_key = pk.clone();
    }
    if let Some(field) = &cli.field {
        config.fields.address = field.clone();
    }
    let fields = &config.fields;

    let out_dir = cli.out_dir.clone().unwrap_or_else(|| input_dir.clone());
    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("creating output directory {}", out_dir.display()))?;

    let data = read_csv(&cli.input, &fields.primary_key)
        .with_context(|| format!("reading {}", cli.input.display()))?;
    info!("Read {} records from {}", data.records.len(), cli.input.display());
    for column in [&fields.address, &fields.locator] {
        if !data.headers.contains(column) {
            return Err(error::FixError::MissingColumn(column.clone()))
                .with_context(|| format!("reading {}", cli.input.display()));
        }
    }

    let locators = locator_summary(&data.records, &fields.locator)?;
    for loc in &locators {
        info!(
            "Locator: {:?} matched {} cases, {:.2}%",
            loc.locator, loc.count, loc.percentage
        );
    }

    let unmatched = filter_unmatched(&data.records, &fields.locator)?;

    // Per-class subsets; the address field is trimmed in these copies only
    let markers = config.markers()?;
    let subsets = parse_anomalies(&unmatched, &fields.address, &markers)?;
    if cli.anomalies {
        let stamp = chrono::Local::now().format("%Y_%m_%d").to_string();
        for subset in &subsets {
            let path = out_dir.join(format!("geocode_{}_{}.csv", subset.label, stamp));
            write_output(&path, subset.records.values())?;
        }
    }

    let box_subset = classify(&unmatched, &fields.address, &config.box_marker()?)?;
    let normalizer = config.box_normalizer();

    let pb = progress_bar(box_subset.len(), cli.quiet)?;
    let normalized = normalizer.normalize_box_addresses(
        &box_subset.records,
        &fields.address,
        |key, outcome| {
            match outcome {
                NormalizationOutcome::Fixed(address) if address.is_empty() => {
                    warn!("{} fixed to an empty address", key)
                }
                NormalizationOutcome::Fixed(address) => debug!("{} -> {}", key, address),
                NormalizationOutcome::Unfixed(reason) => debug!("{} unfixed: {}", key, reason),
            }
            if let Some(pb) = &pb {
                pb.inc(1);
            }
        },
    )?;
    if let Some(pb) = pb {
        pb.finish_with_message("Done");
    }
    info!(
        "Normalized {} box records: {} fixed, {} unfixed",
        normalized.total(),
        normalized.fixed.len(),
        normalized.unfixed.len()
    );

    write_output(&out_dir.join("fixed.csv"), normalized.fixed.values())?;
    let unfixed: Vec<Record> = normalized
        .unfixed
        .values()
        .map(|u| u.record.clone().with("reason", u.reason.to_string()))
        .collect();
    write_output(&out_dir.join("unfixed.csv"), &unfixed)?;

    if let Some(matched_path) = &cli.matched {
        let geometry = match &cli.geometry {
            Some(path) => geometry::load_geometry(path, &fields.primary_key)
                .with_context(|| format!("reading geometry {}", path.display()))?,
            None => {
                warn!("No --geometry given; x/y will be blank");
                HashMap::new()
            }
        };
        let table = geometry::matched_table(
            &data.records,
            &unmatched,
            &config.matched.columns,
            &geometry,
        )?;
        write_output(matched_path, &table)?;
    }

    let summary = RunSummary {
        input: &cli.input,
        total: data.records.len(),
        locators,
        unmatched: unmatched.len(),
        anomalies: subsets.iter().map(AnomalyCount::from).collect(),
        box_candidates: box_subset.len(),
        normalization: &normalized,
    };

    match cli.report {
        ReportFormat::Terminal => {
            report::terminal::render(&summary, &fields.address, cli.verbose, cli.quiet)?;
        }
        ReportFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
    }

    Ok(())
}

fn write_output<'a, I>(path: &Path, records: I) -> Result<()>
where
    I: IntoIterator<Item = &'a Record>,
{
    let written = write_csv(path, records)
        .with_context(|| format!("writing {}", path.display()))?;
    if written == 0 {
        info!("Not writing out file {}, no records", path.display());
    } else {
        info!("Wrote {} records to {}", written, path.display());
    }
    Ok(())
}

fn progress_bar(len: usize, quiet: bool) -> Result<Option<ProgressBar>> {
    if quiet || len < PROGRESS_THRESHOLD {
        return Ok(None);
    }
    let pb = ProgressBar::new(len as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );
    Ok(Some(pb))
}
