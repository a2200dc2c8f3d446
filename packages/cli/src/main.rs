#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for the gehl map toolchain.
//!
//! Each subcommand is one batch step: categorise places, join the building
//! registers, elaborate the joined buildings, or clean an auxiliary layer.
//! Without a subcommand an interactive menu is shown.
//!
//! Uses `indicatif-log-bridge` (via [`gehl_map_cli_utils::init_logger`])
//! so log lines and progress bars share the terminal.

mod interactive;
mod paths;

use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, Subcommand};
use gehl_map_buildings::elaborate::ElaborateArgs;
use gehl_map_buildings::join::JoinArgs;
use gehl_map_cli_utils::{IndicatifProgress, MultiProgress};
use gehl_map_places::{CategoriseArgs, DEFAULT_CONFIDENCE_THRESHOLD};

use crate::paths::DataDir;

#[derive(Parser)]
#[command(name = "gehl_map", about = "Gehl activity map data processing")]
struct Cli {
    /// Data directory containing `raw/`, `processed/` and `util/`
    /// (default: `<workspace>/data`)
    #[arg(long, env = "GEHL_MAP_DATA_DIR", global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Clone, PartialEq, Subcommand)]
enum Commands {
    /// Map Overture Maps places to Gehl activity categories
    CategorisePlaces {
        /// Raw places `GeoJSON`
        #[arg(long)]
        places: Option<PathBuf>,
        /// Category mapping config (JSON)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Categorised places output
        #[arg(long)]
        output: Option<PathBuf>,
        /// Where to write the list of raw categories without a mapping
        #[arg(long)]
        unmapped_output: Option<PathBuf>,
        /// Places at or below this confidence are dropped
        #[arg(long, default_value_t = DEFAULT_CONFIDENCE_THRESHOLD)]
        confidence_threshold: f64,
    },
    /// Join the Helsinki and Espoo building registers
    JoinBuildings {
        /// Input override as `<source>=<path>` (e.g., `espoo=raw/espoo.geojson`).
        /// May be repeated.
        #[arg(long = "input", value_parser = parse_source_override)]
        inputs: Vec<(String, PathBuf)>,
        /// Purpose-of-use code table (JSON)
        #[arg(long)]
        purpose_codes: Option<PathBuf>,
        /// Purpose-of-use grouping (JSON)
        #[arg(long)]
        grouping: Option<PathBuf>,
        /// Joined buildings output
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Add place counts, diversity and derived metrics to joined buildings
    ElaborateBuildings {
        /// Joined buildings `GeoJSON`
        #[arg(long)]
        buildings: Option<PathBuf>,
        /// Categorised places `GeoJSON`
        #[arg(long)]
        places: Option<PathBuf>,
        /// Elaborated buildings output
        #[arg(long)]
        output: Option<PathBuf>,
        /// Buffer radius in metres. May be repeated (default: study area radii).
        #[arg(long = "radius")]
        radii: Vec<f64>,
        /// Assumed storey height in metres (default: study area value)
        #[arg(long)]
        storey_height: Option<f64>,
        /// Confidence threshold the default places file was produced with
        #[arg(long, default_value_t = DEFAULT_CONFIDENCE_THRESHOLD)]
        confidence_threshold: f64,
    },
    /// Clean one registered auxiliary dataset
    Clean {
        /// Dataset identifier (e.g., "`hsl_boardings`")
        dataset: String,
        /// Input override (default: `raw/<dataset input>`)
        #[arg(long)]
        input: Option<PathBuf>,
        /// Output override (default: `processed/<dataset output>`)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// List the registered datasets and building sources
    Datasets,
}

/// Parses `<source>=<path>`.
fn parse_source_override(value: &str) -> Result<(String, PathBuf), String> {
    let (id, path) = value
        .split_once('=')
        .ok_or_else(|| format!("expected <source>=<path>, got {value:?}"))?;
    if id.is_empty() || path.is_empty() {
        return Err(format!("expected <source>=<path>, got {value:?}"));
    }
    Ok((id.to_string(), PathBuf::from(path)))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = gehl_map_cli_utils::init_logger();
    let cli = Cli::parse();
    let data = DataDir::resolve(cli.data_dir);

    let Some(command) = cli.command else {
        return interactive::run(&data, &multi);
    };

    execute(command, &data, &multi)
}

/// Runs one command against a data directory.
fn execute(
    command: Commands,
    data: &DataDir,
    multi: &MultiProgress,
) -> Result<(), Box<dyn std::error::Error>> {
    let start = Instant::now();
    log::debug!("Data directory: {}", data.root().display());

    match command {
        Commands::CategorisePlaces {
            places,
            config,
            output,
            unmapped_output,
            confidence_threshold,
        } => {
            let args = CategoriseArgs {
                places_path: places.unwrap_or_else(|| data.places()),
                config_path: config.unwrap_or_else(|| data.mapping_config()),
                output_path: output.unwrap_or_else(|| data.categorised_places(confidence_threshold)),
                unmapped_output_path: unmapped_output
                    .unwrap_or_else(|| data.unmapped_categories()),
                confidence_threshold,
            };
            let summary = gehl_map_places::run(&args)?;
            log::info!(
                "Categorised {} of {} places ({} unmapped categories)",
                summary.retained_records,
                summary.input_records,
                summary.unmapped.len()
            );
        }
        Commands::JoinBuildings {
            inputs,
            purpose_codes,
            grouping,
            output,
        } => {
            for (id, _) in &inputs {
                gehl_map_buildings::registry::source(id)?;
            }
            let inputs = gehl_map_buildings::registry::all_sources()
                .into_iter()
                .map(|source| {
                    let path = inputs
                        .iter()
                        .rev()
                        .find(|(id, _)| *id == source.id)
                        .map_or_else(|| data.raw().join(&source.input), |(_, p)| p.clone());
                    (source, path)
                })
                .collect();
            let args = JoinArgs {
                inputs,
                purpose_codes_path: purpose_codes.unwrap_or_else(|| data.purpose_codes()),
                grouping_path: grouping.unwrap_or_else(|| data.purpose_grouping()),
                output_path: output.unwrap_or_else(|| data.joined_buildings()),
            };
            let summary = gehl_map_buildings::join::run(&args)?;
            log::info!(
                "Joined {} of {} buildings",
                summary.output_records,
                summary.input_records
            );
        }
        Commands::ElaborateBuildings {
            buildings,
            places,
            output,
            radii,
            storey_height,
            confidence_threshold,
        } => {
            let mut study_area = gehl_map_buildings::registry::study_area();
            if !radii.is_empty() {
                study_area.buffer_radii = radii;
            }
            if let Some(height) = storey_height {
                study_area.storey_height = height;
            }
            let args = ElaborateArgs {
                buildings_path: buildings.unwrap_or_else(|| data.joined_buildings()),
                places_path: places.unwrap_or_else(|| data.categorised_places(confidence_threshold)),
                output_path: output.unwrap_or_else(|| data.elaborated_buildings()),
                study_area,
            };
            let progress = IndicatifProgress::records_bar(multi, "Elaborating buildings");
            let summary = gehl_map_buildings::elaborate::run(&args, progress.as_ref())?;
            log::info!(
                "Elaborated {} of {} buildings against {} places",
                summary.output_buildings,
                summary.input_buildings,
                summary.indexed_places
            );
        }
        Commands::Clean {
            dataset,
            input,
            output,
        } => {
            let dataset = gehl_map_clean::registry::dataset(&dataset)?;
            let (default_input, default_output) =
                gehl_map_clean::dataset_paths(&dataset, &data.raw(), &data.processed());
            gehl_map_clean::run(
                &dataset,
                &input.unwrap_or(default_input),
                &output.unwrap_or(default_output),
            )?;
        }
        Commands::Datasets => list_datasets(),
    }

    log::info!("Done in {:.1}s", start.elapsed().as_secs_f64());
    Ok(())
}

/// Prints the registered clean datasets and building sources.
fn list_datasets() {
    println!("{:<24} NAME", "DATASET");
    println!("{}", "-".repeat(60));
    for dataset in gehl_map_clean::registry::all_datasets() {
        println!("{:<24} {}", dataset.id, dataset.name);
    }
    println!();
    println!("{:<24} NAME", "BUILDING SOURCE");
    println!("{}", "-".repeat(60));
    for source in gehl_map_buildings::registry::all_sources() {
        println!("{:<24} {}", source.id(), source.name());
    }
}
