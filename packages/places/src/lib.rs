#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Categorises Overture Maps places into Gehl activity categories.
//!
//! Reads the raw places export, drops low-confidence records, tags each
//! remaining place with a `GehlCategory` column and writes the result plus
//! a JSON list of the raw categories the mapping table did not cover.

pub mod mapper;

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use gehl_map_features::attributes::{as_f64, as_str};
use gehl_map_features::io::{read_feature_table, read_json, write_feature_table, write_json};
use gehl_map_features::{ColumnRename, FeatureError, FeatureTable};
use gehl_map_places_models::CategoryMappingConfig;

pub use mapper::{Categorised, CategoryMapper};

/// Column holding the raw Overture category.
pub const RAW_CATEGORY_COLUMN: &str = "mainCategory";
/// Column holding the classifier confidence.
pub const CONFIDENCE_COLUMN: &str = "confidence";
/// Column the Gehl category is written to.
pub const GEHL_CATEGORY_COLUMN: &str = "GehlCategory";
/// Default minimum confidence (exclusive).
pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.6;

/// Columns retained from the raw export.
const RETAINED_COLUMNS: &[&str] = &["commonName", RAW_CATEGORY_COLUMN, CONFIDENCE_COLUMN];

/// Errors that can occur during place categorisation.
#[derive(Debug, thiserror::Error)]
pub enum PlacesError {
    /// Reading or writing features failed.
    #[error(transparent)]
    Features(#[from] FeatureError),

    /// The mapping config is inconsistent.
    #[error("Invalid category mapping: {message}")]
    InvalidMapping {
        /// Description of what went wrong.
        message: String,
    },
}

/// Inputs and outputs of one categorisation run.
#[derive(Debug, Clone)]
pub struct CategoriseArgs {
    /// Raw Overture places `GeoJSON`.
    pub places_path: PathBuf,
    /// Mapping config JSON.
    pub config_path: PathBuf,
    /// Categorised places output.
    pub output_path: PathBuf,
    /// Unmapped categories diagnostic output.
    pub unmapped_output_path: PathBuf,
    /// Records with confidence at or below this value are dropped.
    pub confidence_threshold: f64,
}

/// Summary of a finished run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoriseSummary {
    pub input_records: usize,
    pub retained_records: usize,
    pub unmapped: BTreeSet<String>,
}

/// Output file name for a threshold, e.g.
/// `places-helsinki-2023-10-19-alpha-gehl-cat-min-60per-confidence.geojson`.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn output_file_name(stem: &str, confidence_threshold: f64) -> String {
    let percent = (confidence_threshold * 100.0).floor() as i64;
    format!("{stem}-gehl-cat-min-{percent}per-confidence.geojson")
}

/// Loads and validates a mapping config file.
///
/// # Errors
///
/// Returns [`FeatureError::NotFound`] (wrapped) if the file is missing and
/// [`PlacesError::InvalidMapping`] if its content is inconsistent.
pub fn load_mapper(config_path: &Path) -> Result<CategoryMapper, PlacesError> {
    let config: CategoryMappingConfig = read_json(config_path)?;
    log::info!(
        "Loaded {} category mappings from {}",
        config.gehl_category_mappings.len(),
        config_path.display()
    );
    CategoryMapper::new(config)
}

/// Filters by confidence and tags every remaining record with its Gehl
/// category.
///
/// Confidence filtering happens first so the category column and the
/// diagnostic set only reflect retained places. Records whose confidence is
/// missing or non-numeric are dropped.
///
/// # Errors
///
/// Returns [`FeatureError::MissingColumn`] (wrapped) if the table lacks one
/// of the retained columns.
pub fn categorise_places(
    table: &mut FeatureTable,
    mapper: &CategoryMapper,
    confidence_threshold: f64,
) -> Result<BTreeSet<String>, PlacesError> {
    let retained: Vec<ColumnRename> = RETAINED_COLUMNS
        .iter()
        .map(|c| ColumnRename::new(*c, *c))
        .collect();
    table.select_columns(&retained)?;

    let before = table.len();
    table.retain(|record| {
        as_f64(record.get(CONFIDENCE_COLUMN)).is_some_and(|c| c > confidence_threshold)
    });
    log::debug!(
        "Dropped {} places at or below confidence {confidence_threshold}",
        before - table.len()
    );

    let categorised = mapper.categorise(
        table
            .records
            .iter()
            .map(|r| as_str(r.get(RAW_CATEGORY_COLUMN))),
    );

    for (record, category) in table.records.iter_mut().zip(&categorised.categories) {
        record.set(GEHL_CATEGORY_COLUMN, mapper.label(*category));
    }

    Ok(categorised.unmapped)
}

/// Runs the full categorisation: read, filter, map, write both outputs.
///
/// # Errors
///
/// Returns an error if any input is missing or invalid, or if an output
/// cannot be written.
pub fn run(args: &CategoriseArgs) -> Result<CategoriseSummary, PlacesError> {
    let mapper = load_mapper(&args.config_path)?;
    let mut table = read_feature_table(&args.places_path)?;
    let input_records = table.len();

    let unmapped = categorise_places(&mut table, &mapper, args.confidence_threshold)?;

    if !unmapped.is_empty() {
        log::warn!(
            "{} raw categories have no Gehl mapping (see {})",
            unmapped.len(),
            args.unmapped_output_path.display()
        );
    }

    write_feature_table(&args.output_path, &table)?;
    write_json(&args.unmapped_output_path, &unmapped)?;
    log::info!(
        "Unmapped categories written to {}",
        args.unmapped_output_path.display()
    );

    Ok(CategoriseSummary {
        input_records,
        retained_records: table.len(),
        unmapped,
    })
}
