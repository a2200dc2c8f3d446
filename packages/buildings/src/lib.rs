#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Building dataset processing.
//!
//! Two steps: [`join`] merges the Helsinki and Espoo building registers
//! into one table with canonical columns, and [`elaborate`] enriches the
//! joined buildings with nearby-place counts, Simpson diversity and
//! per-building ratios. Source definitions and the study area are TOML
//! files embedded at compile time (see [`registry`]).

pub mod dates;
pub mod elaborate;
pub mod join;
pub mod metrics;
pub mod registry;

use gehl_map_features::FeatureError;

/// Errors that can occur while joining or elaborating buildings.
#[derive(Debug, thiserror::Error)]
pub enum BuildingsError {
    /// Reading, transforming or writing features failed.
    #[error(transparent)]
    Features(#[from] FeatureError),

    /// Buffer configuration is invalid.
    #[error(transparent)]
    Spatial(#[from] gehl_map_spatial::SpatialError),

    /// The study area CRS is unsupported.
    #[error(transparent)]
    Crs(#[from] gehl_map_crs::CrsError),

    /// A completion date is in none of the known formats.
    #[error("Date format for {value} not recognized")]
    UnrecognizedDate {
        /// The offending value as it appeared in the input.
        value: String,
    },

    /// No building source with this identifier is registered.
    #[error("Unknown building source: {id}")]
    UnknownSource {
        /// The requested identifier.
        id: String,
    },

    /// The join was given no inputs.
    #[error("At least one building source is required")]
    NoSources,
}
