//! `spyscan` — scan installed-application inventories and score spyware risk.
//!
//! # Flow
//! 1. Parse CLI arguments ([`cli`]).
//! 2. Load heuristics config ([`config::load_config`]).
//! 3. Auto-detect source files ([`detector::detect_sources`]).
//! 4. Scan each source into canonical records ([`scanner`]).
//! 5. Score and aggregate into the keyed collection ([`risk`], [`collection`]).
//! 6. Render the requested report ([`report`]).
//! 7. Exit `0` (clean) or `1` (at least one high-risk application).

mod cli;
mod collection;
mod config;
mod detector;
mod models;
mod report;
mod risk;
mod scanner;

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use cli::{Cli, ReportFormat};
use collection::{AppCollection, AppStore};
use config::{load_config, Config};
use detector::{detect_sources, Source};
use models::{AppInfo, RiskLevel, SourceKind};
use scanner::registry::RegistryScanner;
use scanner::snapshot::SnapshotScanner;
use scanner::Scanner;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // Resolve scan path
    let path = cli.path.canonicalize().unwrap_or_else(|_| cli.path.clone());

    // Load heuristics config
    let config = load_config(&path, cli.config.as_deref())?;

    // Detect source files (always automatic; --exclude-source opts out)
    let excluded: Vec<SourceKind> = cli.exclude_source.iter().map(Into::into).collect();

    let sources: Vec<Source> = detect_sources(&path)
        .into_iter()
        .filter(|s| !excluded.contains(&s.kind))
        .collect();

    if sources.is_empty() {
        eprintln!(
            "No snapshot (.json) or registry export (.reg) files found in {}",
            path.display()
        );
        std::process::exit(1);
    }

    // Scan all sources, then score once for the process lifetime.
    let records = scan_sources(&sources, &config, cli.quiet).await;

    let store = AppStore::new();
    let apps = store.load_with(|| Ok(AppCollection::collect(records)))?;

    // Resolve effective report format: --pdf implies PDF format
    let report_format = match &cli.pdf {
        Some(_) => ReportFormat::Pdf,
        None => cli.report,
    };
    let pdf_path = cli
        .pdf
        .unwrap_or_else(|| std::path::PathBuf::from("spyscan-report.pdf"));

    // Render report
    match report_format {
        ReportFormat::Terminal => {
            report::terminal::render(&apps, &path, cli.verbose, cli.quiet)?;
        }
        ReportFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&apps.ranked())?);
        }
        ReportFormat::Pdf => {
            report::pdf::render(&apps, &path, &pdf_path)?;
        }
    }

    // Exit code: 1 if any high-risk application found
    if apps.count_level(RiskLevel::High) > 0 {
        std::process::exit(1);
    }

    Ok(())
}

/// Scan every detected source on a blocking task, in parallel, and merge the
/// results in detector order so concurrency never changes the output.
async fn scan_sources(sources: &[Source], config: &Config, quiet: bool) -> Vec<AppInfo> {
    use futures::future::join_all;

    let pb = if !quiet && sources.len() > 1 {
        let pb = ProgressBar::new(sources.len() as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} sources")
        {
            pb.set_style(style.progress_chars("#>-"));
        }
        Some(pb)
    } else {
        None
    };

    let tasks: Vec<_> = sources
        .iter()
        .map(|source| {
            let source = source.clone();
            let heuristics = config.heuristics.clone();
            let pb = pb.clone();
            tokio::task::spawn_blocking(move || {
                let result = match source.kind {
                    SourceKind::Snapshot => SnapshotScanner::new().scan(&source.path),
                    SourceKind::Registry => RegistryScanner::new(heuristics).scan(&source.path),
                };
                if let Some(pb) = &pb {
                    pb.inc(1);
                }
                (source, result)
            })
        })
        .collect();

    let mut records = Vec::new();
    for joined in join_all(tasks).await {
        let Ok((source, result)) = joined else {
            continue;
        };
        match result {
            Ok(apps) => {
                if !quiet {
                    eprintln!("  {} {} {} records", "→".cyan(), source.kind, apps.len());
                }
                records.extend(apps);
            }
            Err(err) => {
                // An unreadable source degrades to empty rather than failing
                // the whole scan.
                warn!(path = %source.path.display(), error = %err, "source skipped");
            }
        }
    }

    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    records
}
