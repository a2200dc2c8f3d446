#![allow(clippy::module_name_repetitions)]
//! Canonical file paths under the data directory.
//!
//! Raw downloads live in `raw/`, outputs in `processed/`, and hand-written
//! lookup tables and diagnostics in `util/`.

use std::path::{Path, PathBuf};

use gehl_map_places::output_file_name;

pub const PLACES_STEM: &str = "places-helsinki-2023-10-19-alpha";
const PLACES_FILE: &str = "places-helsinki-2023-10-19-alpha.geojson";
const MAPPING_CONFIG_FILE: &str = "overture-maps-places-gehl-mapping-config.json";
const UNMAPPED_CATEGORIES_FILE: &str = "unmapped-categories.json";
const PURPOSE_CODES_FILE: &str = "RA-KAYTTARK-HEL.json";
const PURPOSE_GROUPING_FILE: &str = "purpose-of-use-groupings-hel-espoo.json";
const JOINED_BUILDINGS_FILE: &str = "helsinki-espoo-buildings-joined-16-11-2023.geojson";
const ELABORATED_BUILDINGS_FILE: &str = "bay-buildings-joined-16-11-2023-elaborated.geojson";

/// Returns the workspace root directory.
///
/// Resolved at compile time from `CARGO_MANIFEST_DIR`.
#[must_use]
pub fn project_root() -> PathBuf {
    let manifest = Path::new(env!("CARGO_MANIFEST_DIR"));
    manifest
        .ancestors()
        .nth(2)
        .unwrap_or(manifest)
        .to_path_buf()
}

/// A data directory and the well-known files inside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataDir {
    root: PathBuf,
}

impl DataDir {
    #[must_use]
    pub const fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Uses `root` when given, otherwise `<workspace>/data`.
    #[must_use]
    pub fn resolve(root: Option<PathBuf>) -> Self {
        Self::new(root.unwrap_or_else(|| project_root().join("data")))
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn raw(&self) -> PathBuf {
        self.root.join("raw")
    }

    #[must_use]
    pub fn processed(&self) -> PathBuf {
        self.root.join("processed")
    }

    #[must_use]
    pub fn util(&self) -> PathBuf {
        self.root.join("util")
    }

    #[must_use]
    pub fn places(&self) -> PathBuf {
        self.raw().join(PLACES_FILE)
    }

    #[must_use]
    pub fn mapping_config(&self) -> PathBuf {
        self.util().join(MAPPING_CONFIG_FILE)
    }

    #[must_use]
    pub fn unmapped_categories(&self) -> PathBuf {
        self.util().join(UNMAPPED_CATEGORIES_FILE)
    }

    /// Categorised places written for (and read back at) a given
    /// confidence threshold.
    #[must_use]
    pub fn categorised_places(&self, confidence_threshold: f64) -> PathBuf {
        self.processed()
            .join(output_file_name(PLACES_STEM, confidence_threshold))
    }

    #[must_use]
    pub fn purpose_codes(&self) -> PathBuf {
        self.util().join(PURPOSE_CODES_FILE)
    }

    #[must_use]
    pub fn purpose_grouping(&self) -> PathBuf {
        self.util().join(PURPOSE_GROUPING_FILE)
    }

    #[must_use]
    pub fn joined_buildings(&self) -> PathBuf {
        self.raw().join(JOINED_BUILDINGS_FILE)
    }

    #[must_use]
    pub fn elaborated_buildings(&self) -> PathBuf {
        self.processed().join(ELABORATED_BUILDINGS_FILE)
    }
}
