#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Cleaning of auxiliary map layers.
//!
//! Each dataset is described by a TOML definition: which columns to rename,
//! which of the renamed columns to keep, the target CRS and optionally which
//! geometry types survive. [`clean_dataset`] applies a definition to a
//! table; [`run`] does the same between files.

pub mod registry;

use std::path::{Path, PathBuf};

use gehl_map_crs::Crs;
use gehl_map_features::io::{read_feature_table, write_feature_table};
use gehl_map_features::{ColumnRename, FeatureError, FeatureTable, GeometryType};
use serde::{Deserialize, Serialize};

/// Errors that can occur while cleaning a dataset.
#[derive(Debug, thiserror::Error)]
pub enum CleanError {
    #[error(transparent)]
    Features(#[from] FeatureError),

    #[error(transparent)]
    Crs(#[from] gehl_map_crs::CrsError),

    /// No dataset with this identifier is registered.
    #[error("Unknown dataset: {id}")]
    UnknownDataset { id: String },
}

/// A raw dataset and how to clean it, deserialized from TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanDataset {
    /// Unique dataset identifier (e.g., `"hsl_boardings"`).
    pub id: String,
    pub name: String,
    /// Input file name under `data/raw`.
    pub input: String,
    /// Output file name under `data/processed`.
    pub output: String,
    pub target_crs: String,
    /// Geometry types to keep. Absent means all.
    #[serde(default)]
    pub geometry_types: Option<Vec<GeometryType>>,
    /// Raw column -> renamed column. Every source column must exist.
    pub columns: Vec<ColumnRename>,
    /// Renamed columns written to the output, in order.
    pub keep: Vec<String>,
}

/// Applies a dataset definition to a table in place.
///
/// # Errors
///
/// Returns [`FeatureError::MissingColumn`] (wrapped) if a renamed or kept
/// column is absent, or [`CleanError::Crs`] if the target CRS is
/// unsupported.
pub fn clean_dataset(table: &mut FeatureTable, dataset: &CleanDataset) -> Result<(), CleanError> {
    let target = Crs::parse(&dataset.target_crs)?;

    table.select_columns(&dataset.columns)?;
    table.keep_columns(&dataset.keep)?;
    table.reproject(target);

    if let Some(types) = &dataset.geometry_types {
        let before = table.len();
        table.retain_geometry_types(types);
        log::debug!(
            "Dropped {} features of other geometry types than {types:?}",
            before - table.len()
        );
    }

    Ok(())
}

/// Input and output paths for a dataset under a data directory.
#[must_use]
pub fn dataset_paths(dataset: &CleanDataset, raw_dir: &Path, processed_dir: &Path) -> (PathBuf, PathBuf) {
    (raw_dir.join(&dataset.input), processed_dir.join(&dataset.output))
}

/// Reads, cleans and writes one dataset. Returns the written record count.
///
/// # Errors
///
/// Returns an error if the input cannot be read, cleaning fails, or the
/// output cannot be written.
pub fn run(dataset: &CleanDataset, input: &Path, output: &Path) -> Result<usize, CleanError> {
    log::info!("Cleaning {} from {}", dataset.name, input.display());
    let mut table = read_feature_table(input)?;
    let input_records = table.len();

    clean_dataset(&mut table, dataset)?;

    write_feature_table(output, &table)?;
    log::info!(
        "Wrote {} of {input_records} features to {}",
        table.len(),
        output.display()
    );
    Ok(table.len())
}
