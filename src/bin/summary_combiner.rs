//! Summary Combiner CLI
//!
//! `inspect` prints the horizon coverage of a set of summary files;
//! `combine` generates one workbook per enabled combination.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use futures::executor::block_on_stream;
use std::path::{Path, PathBuf};
use summary_combiner::combination::parse_combination_spec;
use summary_combiner::config::CombinerConfig;
use summary_combiner::coverage::{ConflictState, CoverageReport};
use summary_combiner::{
    spawn_combination, CombinationDefinition, CombineEvent, CombineRequest, CoverageModel,
    SaveLocation,
};

#[derive(Parser)]
#[command(name = "summary-combiner")]
#[command(about = "Combine weekly forecast summary workbooks by planning horizon")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show planning week, horizon coverage and combination status
    Inspect {
        /// Summary files (.xlsx / .xls)
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Generate combined workbooks
    Combine {
        /// Summary files (.xlsx / .xls)
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Directory for generated files (default: config default_output_dir)
        #[arg(short, long, env = "SUMMARY_COMBINER_OUTPUT_DIR")]
        output_dir: Option<PathBuf>,

        /// Combination to generate: a preset (A, B, C, D, All) or a range like 2-6.
        /// Repeatable; defaults to the configured presets.
        #[arg(short, long = "combo")]
        combos: Vec<String>,

        /// Resolve a duplicate horizon: H=PATH picks PATH as the source of W-H
        #[arg(short, long = "resolve")]
        resolutions: Vec<String>,

        /// Share of available memory one write batch may use
        #[arg(long)]
        memory_fraction: Option<f64>,

        /// Fixed rows per write batch (skips memory estimation)
        #[arg(long)]
        chunk_rows: Option<usize>,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let config = CombinerConfig::load();

    match cli.command {
        Commands::Inspect { files } => {
            let model = build_model(&files)?;
            let report = model.report();
            print_coverage(&report);
            println!();
            println!("Combinations:");
            for def in config.initial_combinations() {
                let status = def.validity(&report);
                println!("  {}  [{}]", def.describe(&report), status);
            }
        }
        Commands::Combine {
            files,
            output_dir,
            combos,
            resolutions,
            memory_fraction,
            chunk_rows,
        } => {
            let mut model = build_model(&files)?;
            for spec in &resolutions {
                let (horizon, path) = parse_resolution(spec)?;
                model
                    .resolve(horizon, &path)
                    .with_context(|| format!("Cannot apply --resolve {}", spec))?;
            }
            print_coverage(&model.report());

            let combinations: Vec<CombinationDefinition> = if combos.is_empty() {
                config.initial_combinations()
            } else {
                combos
                    .iter()
                    .map(|c| parse_combination_spec(c))
                    .collect::<Result<_, _>>()?
            };

            let mut options = config.combine_options();
            if let Some(f) = memory_fraction {
                if !(f > 0.0 && f <= 1.0) {
                    bail!("--memory-fraction must be in (0, 1], got {}", f);
                }
                options.target_memory_fraction = f;
            }
            options.fixed_chunk_rows = chunk_rows;

            let request = CombineRequest::from_model(&model, &combinations, options)?;
            let output_dir = output_dir.or_else(|| config.default_output_dir.clone());
            combine(request, output_dir.as_deref())?;
        }
    }

    Ok(())
}

fn build_model(files: &[PathBuf]) -> Result<CoverageModel> {
    let mut model = CoverageModel::new();
    for file in files {
        let added = model.add_file(file.clone())?;
        for issue in &added.issues {
            eprintln!("Warning: {}: {}", added.file_name(), issue);
        }
    }
    Ok(model)
}

/// `H=PATH` → (H, PATH).
fn parse_resolution(spec: &str) -> Result<(u32, PathBuf)> {
    let (horizon, path) = spec
        .split_once('=')
        .ok_or_else(|| anyhow::anyhow!("Expected H=PATH, got '{}'", spec))?;
    let horizon: u32 = horizon
        .trim()
        .trim_start_matches(['W', 'w', '-'])
        .parse()
        .with_context(|| format!("Invalid horizon in '{}'", spec))?;
    Ok((horizon, PathBuf::from(path.trim())))
}

fn print_coverage(report: &CoverageReport) {
    match (&report.conflict, report.planning_week) {
        (ConflictState::Conflicting { weeks }, _) => {
            println!("Planning week: conflict between weeks {:?}", weeks)
        }
        (_, Some(week)) => println!("Planning week: {}", week),
        (_, None) => println!("Planning week: not set"),
    }
    for slot in &report.slots {
        let week = slot
            .assigned_week
            .map(|w| format!("week {:>2}", w))
            .unwrap_or_else(|| "week  -".to_string());
        println!("  W-{:<2} {}  {}", slot.horizon, week, slot.status);
    }
}

/// Run the combination on the worker and print its events.
fn combine(request: CombineRequest, output_dir: Option<&Path>) -> Result<()> {
    let mut task = spawn_combination(request);
    let events = task
        .take_events()
        .ok_or_else(|| anyhow::anyhow!("Combination event stream unavailable"))?;

    let mut outcome = Ok(());
    for event in block_on_stream(events) {
        match event {
            CombineEvent::Progress(p) => eprintln!("[{:>3}%] {}", p.percent, p.message),
            CombineEvent::SaveLocationRequested => {
                let location = match output_dir {
                    Some(dir) => SaveLocation::Selected(dir.to_path_buf()),
                    None => SaveLocation::NotProvided,
                };
                task.provide_save_location(location);
            }
            CombineEvent::Completed(summary) => {
                println!("Generated in {}:", summary.save_dir.display());
                for (name, rows) in summary.row_counts() {
                    println!("  {} ({} rows)", name, rows);
                }
            }
            CombineEvent::Failed(e) => outcome = Err(anyhow::Error::new(e)),
            CombineEvent::Cancelled => outcome = Err(anyhow::anyhow!("Combination cancelled")),
        }
    }
    task.join();
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_resolution() {
        assert_eq!(
            parse_resolution("3=/in/a.xlsx").unwrap(),
            (3, PathBuf::from("/in/a.xlsx"))
        );
        assert_eq!(parse_resolution("W-4 = b.xlsx").unwrap().0, 4);
        assert!(parse_resolution("3").is_err());
        assert!(parse_resolution("x=a.xlsx").is_err());
    }
}
