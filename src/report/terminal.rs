use anyhow::Result;
use colored::*;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use crate::models::UnfixedReason;
use crate::report::RunSummary;

/// Render a colored terminal report.
pub fn render(
    summary: &RunSummary,
    address_field: &str,
    verbose: bool,
    quiet: bool,
) -> Result<()> {
    let fixed_count = summary.normalization.fixed.len();
    let unfixed_count = summary.normalization.unfixed.len();

    if quiet {
        println!(
            "Total: {}  Unmatched: {}  Box: {}  Fixed: {}  Unfixed: {}",
            summary.total,
            summary.unmatched.to_string().yellow(),
            summary.box_candidates,
            fixed_count.to_string().green(),
            unfixed_count.to_string().red(),
        );
        return Ok(());
    }

    println!(
        "\n {} v{}",
        "address-fixr".bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!(" Input: {}\n", summary.input.display());

    println!("{}", TOP_BORDER);
    println!("{}", bold_row("SUMMARY"));
    println!("{}", box_row(&format!("Total records      : {}", summary.total)));
    println!(
        "{}",
        box_row(&format!(
            "Unmatched          : {} ({:.1}%)",
            summary.unmatched,
            percent(summary.unmatched, summary.total)
        ))
    );
    for anomaly in &summary.anomalies {
        println!(
            "{}",
            box_row(&format!(
                "  {:<17}: {:>4} ({:.1}%)",
                anomaly.label, anomaly.count, anomaly.percentage
            ))
        );
    }
    println!(
        "{}",
        status_row("✓".green(), &format!("Fixed           : {:>4}", fixed_count))
    );
    println!(
        "{}",
        status_row("✗".red(), &format!("Unfixed         : {:>4}", unfixed_count))
    );
    println!("{}\n", BOTTOM_BORDER);

    if !summary.locators.is_empty() {
        render_locators(summary);
        println!();
    }

    if unfixed_count > 0 {
        println!(
            " {} Box addresses needing manual follow-up:\n",
            "[UNFIXED]".red().bold()
        );
        render_unfixed(summary, address_field);
        println!();
    }

    if verbose && fixed_count > 0 {
        println!(" {} Repaired box addresses:\n", "[FIXED]".green().bold());
        render_fixed(summary, address_field);
        println!();
    }

    Ok(())
}

const TOP_BORDER: &str = " ┌────────────────────────────────────────────────────┐";
const BOTTOM_BORDER: &str = " └────────────────────────────────────────────────────┘";

/// Inner width of the summary box, between the left padding and the `│`.
const BOX_WIDTH: usize = 49;

// Padding is applied to plain text before any color, since `{:<N}` counts
// the bytes of ANSI escapes as width.

fn box_row(text: &str) -> String {
    format!(" │  {:<width$} │", text, width = BOX_WIDTH)
}

fn bold_row(text: &str) -> String {
    format!(" │  {} │", format!("{:<width$}", text, width = BOX_WIDTH).bold())
}

/// A row led by a one-column status mark.
fn status_row(mark: ColoredString, text: &str) -> String {
    format!(" │  {}  {:<width$} │", mark, text, width = BOX_WIDTH - 3)
}

fn header(names: &[&str]) -> Vec<Cell> {
    names
        .iter()
        .map(|n| Cell::new(n).add_attribute(Attribute::Bold))
        .collect()
}

fn new_table(names: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header(names));
    table
}

fn render_locators(summary: &RunSummary) {
    let mut table = new_table(&["Locator", "Matched", "%"]);

    for loc in &summary.locators {
        let (name, color) = if loc.locator.is_empty() {
            ("(unmatched)", Color::Red)
        } else {
            (loc.locator.as_str(), Color::Reset)
        };
        table.add_row(vec![
            Cell::new(name).fg(color),
            Cell::new(loc.count).set_alignment(CellAlignment::Right),
            Cell::new(format!("{:.2}", loc.percentage)).set_alignment(CellAlignment::Right),
        ]);
    }

    println!("{}", table);
}

fn render_unfixed(summary: &RunSummary, address_field: &str) {
    let mut table = new_table(&["Key", "Address", "Reason"]);

    for (key, entry) in &summary.normalization.unfixed {
        let reason_color = match entry.reason {
            UnfixedReason::NoMarker => Color::DarkGrey,
            UnfixedReason::Boundary => Color::Yellow,
        };
        table.add_row(vec![
            Cell::new(key),
            Cell::new(entry.record.get(address_field).unwrap_or_default()),
            Cell::new(entry.reason.to_string()).fg(reason_color),
        ]);
    }

    println!("{}", table);
}

fn render_fixed(summary: &RunSummary, address_field: &str) {
    let mut table = new_table(&["Key", "Original", "Fixed"]);

    for (key, record) in &summary.normalization.fixed {
        table.add_row(vec![
            Cell::new(key),
            Cell::new(record.get(address_field).unwrap_or_default()),
            Cell::new(record.fixed_address().unwrap_or_default()).fg(Color::Green),
        ]);
    }

    println!("{}", table);
}

fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}
