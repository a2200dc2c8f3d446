//! Compile-time registry of building register sources and the study area.
//!
//! Each entry is a `(name, toml_content)` pair embedded via `include_str!`.
//! Adding a municipality requires creating a TOML file in `sources/` and
//! adding a corresponding entry here.

use gehl_map_buildings_models::{BuildingSource, StudyArea};

use crate::BuildingsError;

/// Number of registered building sources. Enforced by a test.
#[cfg(test)]
const EXPECTED_SOURCE_COUNT: usize = 2;

/// Embedded TOML source definitions, in join order.
const SOURCE_TOMLS: &[(&str, &str)] = &[
    ("helsinki", include_str!("../sources/helsinki.toml")),
    ("espoo", include_str!("../sources/espoo.toml")),
];

const STUDY_AREA_TOML: &str = include_str!("../sources/study_area.toml");

/// Returns all registered building sources, in join order.
///
/// # Panics
///
/// Panics if any embedded TOML file fails to parse. Since these are
/// compile-time constants, parse failures indicate a development error
/// and are caught by the tests below.
#[must_use]
pub fn all_sources() -> Vec<BuildingSource> {
    SOURCE_TOMLS
        .iter()
        .map(|(name, toml_str)| {
            toml::de::from_str(toml_str)
                .unwrap_or_else(|e| panic!("Failed to parse building source '{name}': {e}"))
        })
        .collect()
}

/// Looks up one source by identifier.
///
/// # Errors
///
/// Returns [`BuildingsError::UnknownSource`] if no source has this id.
pub fn source(id: &str) -> Result<BuildingSource, BuildingsError> {
    all_sources()
        .into_iter()
        .find(|s| s.id == id)
        .ok_or_else(|| BuildingsError::UnknownSource { id: id.to_string() })
}

/// Returns the default study area.
///
/// # Panics
///
/// Panics if the embedded study area TOML fails to parse.
#[must_use]
pub fn study_area() -> StudyArea {
    toml::de::from_str(STUDY_AREA_TOML)
        .unwrap_or_else(|e| panic!("Failed to parse study area: {e}"))
}
