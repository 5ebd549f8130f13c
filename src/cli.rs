use std::path::PathBuf;

use clap::Parser;

use crate::models::SourceKind;

#[derive(Parser, Debug)]
#[command(
    name = "spyscan",
    about = "Scan installed applications and assess spyware risk",
    version
)]
pub struct Cli {
    /// Source file or directory to scan
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Heuristics config file [default: ./.spyscan/config.toml, fallback ~/.config/spyscan/config.toml]
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Report format
    #[arg(long, default_value = "terminal", value_name = "FORMAT")]
    pub report: ReportFormat,

    /// PDF output path; use without value to default to spyscan-report.pdf
    #[arg(long, value_name = "FILE", num_args = 0..=1, default_missing_value = "spyscan-report.pdf")]
    pub pdf: Option<PathBuf>,

    /// Exclude a source kind from scanning (repeatable)
    #[arg(long = "exclude-source", value_name = "SOURCE")]
    pub exclude_source: Vec<SourceArg>,

    /// Show all apps (not just medium/high risk)
    #[arg(short, long)]
    pub verbose: bool,

    /// Only print summary line
    #[arg(short, long)]
    pub quiet: bool,
}

#[derive(Debug, Clone, clap::ValueEnum)]
pub enum ReportFormat {
    Terminal,
    Json,
    Pdf,
}

#[derive(Debug, Clone, clap::ValueEnum)]
pub enum SourceArg {
    Snapshot,
    Registry,
}

impl From<&SourceArg> for SourceKind {
    fn from(arg: &SourceArg) -> Self {
        match arg {
            SourceArg::Snapshot => SourceKind::Snapshot,
            SourceArg::Registry => SourceKind::Registry,
        }
    }
}
