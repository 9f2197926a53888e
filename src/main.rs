use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use modality_insights::models::{Distinction, ModalityStatus, ModalityType};
use modality_insights::{
    build_report, normalize_all, EngineConfig, FilterSpec, NormalizedBatch, RawModalityRecord, ReportKind,
    ReportRequest, ReportScope,
};

#[derive(Parser)]
#[command(name = "modality-insights")]
#[command(about = "Statistics, trends and projections over degree-modality records", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Normalize a CSV export and list the rows that would be skipped
    Validate {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Build one report as JSON
    Report {
        #[arg(long)]
        csv: PathBuf,
        /// Academic program the report is scoped to
        #[arg(long)]
        program: u64,
        #[arg(long, default_value = "global_summary")]
        kind: ReportKind,
        /// Reference date for the current period (defaults to today, UTC)
        #[arg(long)]
        as_of: Option<NaiveDate>,
        /// JSON engine configuration; missing keys keep their defaults
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long = "type")]
        types: Vec<ModalityType>,
        #[arg(long = "status")]
        statuses: Vec<ModalityStatus>,
        #[arg(long)]
        year: Option<i32>,
        #[arg(long, value_parser = clap::value_parser!(u8).range(1..=2))]
        half: Option<u8>,
        #[arg(long = "director")]
        director_ids: Vec<u64>,
        #[arg(long)]
        min_grade: Option<f64>,
        #[arg(long)]
        max_grade: Option<f64>,
        #[arg(long = "distinction")]
        distinctions: Vec<Distinction>,
        /// Write to this file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { csv } => {
            let batch = load_records(&csv)?;
            println!(
                "{} records accepted, {} rejected.",
                batch.records.len(),
                batch.rejected.len()
            );
            for (index, err) in &batch.rejected {
                println!("- row {}: {err}", index + 1);
            }
        }
        Commands::Report {
            csv,
            program,
            kind,
            as_of,
            config,
            types,
            statuses,
            year,
            half,
            director_ids,
            min_grade,
            max_grade,
            distinctions,
            out,
        } => {
            let config = match config {
                Some(path) => load_config(&path)?,
                None => EngineConfig::default(),
            };
            config.validate().context("invalid engine configuration")?;

            let batch = load_records(&csv)?;
            let scope = ReportScope {
                program_id: program,
                as_of: as_of.unwrap_or_else(|| Utc::now().date_naive()),
            };
            let request = ReportRequest::new(scope).with_filter(FilterSpec {
                types: types.into_iter().collect(),
                statuses: statuses.into_iter().collect(),
                year,
                half,
                director_ids: director_ids.into_iter().collect(),
                min_grade,
                max_grade,
                distinctions: distinctions.into_iter().collect(),
            });

            let report = build_report(kind, &batch.records, &request, &config);
            let json = serde_json::to_string_pretty(&report).context("failed to serialize report")?;
            match out {
                Some(path) => {
                    std::fs::write(&path, json)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    eprintln!("Report written to {}.", path.display());
                }
                None => println!("{json}"),
            }
        }
    }

    Ok(())
}

fn load_records(path: &Path) -> anyhow::Result<NormalizedBatch> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    let mut raws = Vec::new();
    for result in reader.deserialize::<RawModalityRecord>() {
        let raw = result.with_context(|| format!("failed to read a row of {}", path.display()))?;
        raws.push(raw);
    }
    Ok(normalize_all(&raws))
}

fn load_config(path: &Path) -> anyhow::Result<EngineConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("failed to parse config {}", path.display()))
}
