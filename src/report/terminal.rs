use std::path::Path;

use anyhow::Result;
use colored::*;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use crate::collection::AppCollection;
use crate::models::{RiskLevel, ScoredApp};

/// Render a colored terminal report.
pub fn render(collection: &AppCollection, path: &Path, verbose: bool, quiet: bool) -> Result<()> {
    let total = collection.len();
    let high_count = collection.count_level(RiskLevel::High);
    let medium_count = collection.count_level(RiskLevel::Medium);
    let low_count = collection.count_level(RiskLevel::Low);

    if quiet {
        println!(
            "Total: {}  High: {}  Medium: {}  Low: {}",
            total,
            high_count.to_string().red(),
            medium_count.to_string().yellow(),
            low_count.to_string().green(),
        );
        return Ok(());
    }

    println!("\n {} v{}", "spyscan".bold(), env!("CARGO_PKG_VERSION"));
    println!(" Scanning: {}\n", path.display());

    let ranked = collection.ranked();
    let high_publishers = summarize_publishers(&ranked, RiskLevel::High);
    let medium_publishers = summarize_publishers(&ranked, RiskLevel::Medium);
    let low_publishers = summarize_publishers(&ranked, RiskLevel::Low);

    println!(" ┌────────────────────────────────────────────────────┐");
    println!(" │  {:<48} │", "SUMMARY".bold());
    println!(" │  {:<48} │", format!("Applications scanned : {}", total));
    println!(
        " │  {:<48} │",
        format!(
            "{}  High risk       : {:>4}  {}",
            "✗".red(),
            high_count,
            high_publishers
        )
    );
    println!(
        " │  {:<48} │",
        format!(
            "{}  Medium risk     : {:>4}  {}",
            "⚠".yellow(),
            medium_count,
            medium_publishers
        )
    );
    println!(
        " │  {:<48} │",
        format!(
            "{}  Low risk        : {:>4}  {}",
            "✓".green(),
            low_count,
            low_publishers
        )
    );
    println!(" └────────────────────────────────────────────────────┘\n");

    if high_count > 0 {
        println!(
            " {} Applications needing immediate review:\n",
            "[HIGH]".red().bold()
        );
        render_table(&ranked, RiskLevel::High);
        println!();
    }

    if medium_count > 0 {
        println!(
            " {} Applications worth a closer look:\n",
            "[MEDIUM]".yellow().bold()
        );
        render_table(&ranked, RiskLevel::Medium);
        println!();
    }

    // Verbose: show everything that passed quietly too.
    if verbose && low_count > 0 {
        println!(" {} Low-risk applications:\n", "[LOW]".green().bold());
        render_table(&ranked, RiskLevel::Low);
        println!();
    }

    Ok(())
}

fn render_table(ranked: &[&ScoredApp], level_filter: RiskLevel) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Application").add_attribute(Attribute::Bold),
            Cell::new("Package").add_attribute(Attribute::Bold),
            Cell::new("Score").add_attribute(Attribute::Bold),
            Cell::new("Level").add_attribute(Attribute::Bold),
            Cell::new("Reasons").add_attribute(Attribute::Bold),
        ]);

    for app in ranked.iter().filter(|a| a.risk_level == level_filter) {
        let (level_str, level_color) = match app.risk_level {
            RiskLevel::High => ("✗ high", Color::Red),
            RiskLevel::Medium => ("⚠ medium", Color::Yellow),
            RiskLevel::Low => ("✓ low", Color::Green),
        };

        table.add_row(vec![
            Cell::new(&app.app.app_name),
            Cell::new(&app.app.package_name),
            Cell::new(format!("{:.0}", app.risk_score)).set_alignment(CellAlignment::Right),
            Cell::new(level_str)
                .fg(level_color)
                .set_alignment(CellAlignment::Center),
            Cell::new(summarize_reasons(app)),
        ]);
    }

    println!("{}", table);
}

/// At most three reasons per row; the full list lives in the JSON report.
fn summarize_reasons(app: &ScoredApp) -> String {
    const SHOWN: usize = 3;
    let mut lines: Vec<String> = app
        .risk_reasons
        .iter()
        .take(SHOWN)
        .map(|r| format!("• {}", r))
        .collect();
    if app.risk_reasons.len() > SHOWN {
        lines.push(format!("… and {} more", app.risk_reasons.len() - SHOWN));
    }
    lines.join("\n")
}

fn summarize_publishers(ranked: &[&ScoredApp], level: RiskLevel) -> String {
    let mut counts: std::collections::HashMap<String, usize> = std::collections::HashMap::new();
    for app in ranked.iter().filter(|a| a.risk_level == level) {
        let publisher = app
            .app
            .publisher
            .as_deref()
            .unwrap_or("unknown")
            .to_string();
        *counts.entry(publisher).or_insert(0) += 1;
    }

    let mut pairs: Vec<(String, usize)> = counts.into_iter().collect();
    pairs.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    let summary: Vec<String> = pairs
        .iter()
        .take(3)
        .map(|(publisher, count)| format!("{} ({})", publisher, count))
        .collect();

    if summary.is_empty() {
        String::new()
    } else {
        format!("[{}]", summary.join(", "))
    }
}
