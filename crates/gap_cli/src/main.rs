//! Gap CLI
//!
//! Decoded match JSON → gameplay gap report (text on stdout, JSON on request)

#[cfg(feature = "cli")]
mod text;

#[cfg(feature = "cli")]
use anyhow::{Context, Result};
#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};
#[cfg(feature = "cli")]
use std::path::{Path, PathBuf};

#[cfg(feature = "cli")]
#[derive(Parser)]
#[command(name = "gap")]
#[command(about = "Find gameplay gaps in a decoded FPS match", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[cfg(feature = "cli")]
#[derive(Subcommand)]
enum Commands {
    /// Analyse one player in a match
    Analyze {
        /// Decoded match JSON file
        #[arg(long)]
        r#match: PathBuf,

        /// Exact player name (case-sensitive)
        #[arg(long)]
        player: String,

        /// YAML threshold overrides (defaults to the GAP_CONFIG_PROFILE preset)
        #[arg(long)]
        config: Option<PathBuf>,

        /// YAML zone, price and rank tables
        #[arg(long)]
        tables: Option<PathBuf>,

        /// Write the full JSON report here
        #[arg(long)]
        out: Option<PathBuf>,

        /// Print JSON instead of text
        #[arg(long, default_value = "false")]
        json: bool,
    },

    /// Fold several matches for one player into a trend report
    Aggregate {
        /// Decoded match JSON files, oldest first
        #[arg(long = "match", num_args = 1.., required = true)]
        matches: Vec<PathBuf>,

        /// Exact player name (case-sensitive)
        #[arg(long)]
        player: String,

        /// YAML threshold overrides (defaults to the GAP_CONFIG_PROFILE preset)
        #[arg(long)]
        config: Option<PathBuf>,

        /// YAML zone, price and rank tables
        #[arg(long)]
        tables: Option<PathBuf>,

        /// Write the full JSON report here
        #[arg(long)]
        out: Option<PathBuf>,

        /// Print JSON instead of text
        #[arg(long, default_value = "false")]
        json: bool,
    },

    /// Print the JSON schema of the report
    Schema,
}

#[cfg(feature = "cli")]
fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze { r#match, player, config, tables, out, json } => {
            let config = load_config(config.as_deref())?;
            let tables = match tables {
                Some(path) => load_tables(&path)?,
                None => gap_core::StaticTables::default(),
            };
            let data = load_match(&r#match)?;
            tracing::info!(player = %player, map = %data.map_name, "analysing");

            let report = gap_core::analyze_match_with_tables(&data, &player, &config, &tables)?;

            if let Some(path) = out {
                std::fs::write(&path, report.to_json_pretty()?)
                    .with_context(|| format!("writing {}", path.display()))?;
                eprintln!("Report saved to: {}", path.display());
            }

            if json {
                println!("{}", report.to_json_pretty()?);
            } else {
                print!("{}", text::render(&report));
            }
        }

        Commands::Aggregate { matches, player, config, tables, out, json } => {
            let config = load_config(config.as_deref())?;
            let tables = match tables {
                Some(path) => load_tables(&path)?,
                None => gap_core::StaticTables::default(),
            };

            let mut reports = Vec::with_capacity(matches.len());
            for path in &matches {
                let data = load_match(path)?;
                tracing::info!(player = %player, map = %data.map_name, demo = %path.display(), "analysing");
                let report = gap_core::analyze_match_with_tables(&data, &player, &config, &tables)
                    .with_context(|| format!("analysing {}", path.display()))?;
                reports.push((demo_name(path), report));
            }

            let aggregate = gap_core::aggregate_reports(&reports, &tables.ranks)?;

            if let Some(path) = out {
                std::fs::write(&path, aggregate.to_json_pretty()?)
                    .with_context(|| format!("writing {}", path.display()))?;
                eprintln!("Report saved to: {}", path.display());
            }

            if json {
                println!("{}", aggregate.to_json_pretty()?);
            } else {
                print!("{}", text::render_aggregate(&aggregate));
            }
        }

        Commands::Schema => {
            println!("{}", serde_json::to_string_pretty(&gap_core::report_schema())?);
        }
    }

    Ok(())
}

#[cfg(feature = "cli")]
fn load_match(path: &Path) -> Result<gap_core::MatchData> {
    let raw = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing match {}", path.display()))
}

#[cfg(feature = "cli")]
fn load_config(path: Option<&Path>) -> Result<gap_core::AnalysisConfig> {
    match path {
        Some(path) => gap_core::AnalysisConfig::from_yaml_file(path)
            .with_context(|| format!("loading config {}", path.display())),
        None => Ok(gap_core::AnalysisConfig::from_env_or_default()),
    }
}

/// File stem, or the whole path when there is none.
#[cfg(feature = "cli")]
fn demo_name(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(feature = "cli")]
fn load_tables(path: &Path) -> Result<gap_core::StaticTables> {
    let raw = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    Ok(gap_core::StaticTables::from_yaml_str(&raw)?)
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("gap CLI is not available. Enable the 'cli' feature to use it.");
    std::process::exit(1);
}
