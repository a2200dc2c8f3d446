#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! In-memory feature tables shared by every gehl-map command.
//!
//! A [`FeatureTable`] is the whole content of one `GeoJSON` file: its
//! records (geometry plus attribute map) and the CRS they share. Commands
//! read a table, filter and relabel it, add derived columns and write it
//! back out.

pub mod attributes;
pub mod io;
pub mod progress;
pub mod table;

use std::path::PathBuf;

pub use gehl_map_crs::Crs;
pub use table::{ColumnRename, FeatureRecord, FeatureTable, GeometryType, Properties};

/// Errors that can occur while reading, transforming or writing features.
#[derive(Debug, thiserror::Error)]
pub enum FeatureError {
    /// A required input or configuration file does not exist.
    #[error("File not found: {}", path.display())]
    NotFound {
        /// The path that was looked up.
        path: PathBuf,
    },

    /// I/O error (file read/write).
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// The file being read or written.
        path: PathBuf,
        /// The underlying error.
        source: std::io::Error,
    },

    /// JSON parse error.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// `GeoJSON` structure or geometry error.
    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] Box<geojson::Error>),

    /// The file parsed as `GeoJSON` but is not a `FeatureCollection`.
    #[error("{} is not a GeoJSON FeatureCollection", path.display())]
    NotAFeatureCollection {
        /// The offending file.
        path: PathBuf,
    },

    /// A column named by a mapping does not exist in the table.
    #[error("Missing column: {column}")]
    MissingColumn {
        /// The column that was requested.
        column: String,
    },

    /// Two tables that must share a CRS do not.
    #[error("CRS mismatch: {left} vs {right}")]
    CrsMismatch {
        /// CRS of the first table.
        left: Crs,
        /// CRS of the second table.
        right: Crs,
    },

    /// The CRS named in the file is not supported.
    #[error(transparent)]
    Crs(#[from] gehl_map_crs::CrsError),
}

impl From<geojson::Error> for FeatureError {
    fn from(error: geojson::Error) -> Self {
        Self::GeoJson(Box::new(error))
    }
}
