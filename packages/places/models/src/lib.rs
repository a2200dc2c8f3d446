#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Gehl activity category types.
//!
//! Jan Gehl splits outdoor activity into necessary, optional and social
//! activities. Every Overture Maps place is normalized into one of those
//! classes, `other`, or the `unmapped` fallback when its raw category is
//! not in the mapping table.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString, IntoStaticStr};

/// Gehl activity category of a point of interest.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum GehlCategory {
    /// Social activities (cafés, bars, community venues)
    Social,
    /// Necessary activities (groceries, pharmacies, schools)
    Necessary,
    /// Optional activities (parks, museums, sports)
    Optional,
    /// Places that belong to none of the three activity classes
    Other,
    /// Raw category absent from the mapping table
    Unmapped,
}

impl GehlCategory {
    /// The categories places are counted under, in output column order.
    pub const TARGETS: [Self; 4] = [Self::Social, Self::Necessary, Self::Optional, Self::Other];

    /// Returns all variants of this enum, fallback last.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Social,
            Self::Necessary,
            Self::Optional,
            Self::Other,
            Self::Unmapped,
        ]
    }

    /// Position within [`Self::TARGETS`], or `None` for the fallback.
    #[must_use]
    pub const fn target_index(self) -> Option<usize> {
        match self {
            Self::Social => Some(0),
            Self::Necessary => Some(1),
            Self::Optional => Some(2),
            Self::Other => Some(3),
            Self::Unmapped => None,
        }
    }

    /// Returns `true` for the four counted categories.
    #[must_use]
    pub const fn is_target(self) -> bool {
        self.target_index().is_some()
    }
}

/// Place category mapping configuration, deserialized from JSON.
///
/// ```json
/// {
///   "gehl_category_mappings": {"cafe": "social", "supermarket": "necessary"},
///   "unmapped_category": "unmapped"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryMappingConfig {
    /// Raw Overture `mainCategory` -> Gehl category.
    pub gehl_category_mappings: BTreeMap<String, GehlCategory>,
    /// Label written for places whose category is not in the table.
    pub unmapped_category: String,
}
