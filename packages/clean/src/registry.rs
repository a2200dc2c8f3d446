//! Compile-time registry of cleanable datasets.
//!
//! Each entry is a `(name, toml_content)` pair embedded via `include_str!`.

use crate::{CleanDataset, CleanError};

/// Number of registered datasets. Enforced by a test.
#[cfg(test)]
const EXPECTED_DATASET_COUNT: usize = 2;

const DATASET_TOMLS: &[(&str, &str)] = &[
    (
        "espoo_traffic_volumes",
        include_str!("../datasets/espoo_traffic_volumes.toml"),
    ),
    ("hsl_boardings", include_str!("../datasets/hsl_boardings.toml")),
];

/// Returns all registered datasets.
///
/// # Panics
///
/// Panics if any embedded TOML file fails to parse.
#[must_use]
pub fn all_datasets() -> Vec<CleanDataset> {
    DATASET_TOMLS
        .iter()
        .map(|(name, toml_str)| {
            toml::de::from_str(toml_str)
                .unwrap_or_else(|e| panic!("Failed to parse dataset '{name}': {e}"))
        })
        .collect()
}

/// Looks up a dataset by identifier.
///
/// # Errors
///
/// Returns [`CleanError::UnknownDataset`] if nothing is registered under
/// `id`.
pub fn dataset(id: &str) -> Result<CleanDataset, CleanError> {
    all_datasets()
        .into_iter()
        .find(|d| d.id == id)
        .ok_or_else(|| CleanError::UnknownDataset { id: id.to_string() })
}
