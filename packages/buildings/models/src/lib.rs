#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Building dataset definition types.
//!
//! Defines the TOML schema for municipal building register sources and the
//! study area, plus the JSON purpose-of-use tables used when joining the
//! Helsinki and Espoo registers.

use std::collections::BTreeMap;
use std::fmt;

use gehl_map_features::ColumnRename;
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

/// Canonical building columns shared by every source after the join.
pub mod columns {
    pub const PERMANENT_BUILDING_IDENTIFIER: &str = "permanent_building_identifier";
    pub const TOTAL_AREA: &str = "total_area";
    pub const FLOOR_AREA: &str = "floor_area";
    pub const VOLUME: &str = "volume";
    pub const NUMBER_OF_FLOORS: &str = "number_of_floors";
    pub const NUMBER_OF_DWELLINGS: &str = "number_of_dwellings";
    pub const COMPLETION_DATE: &str = "completion_date";
    pub const PURPOSE_OF_USE: &str = "purpose_of_use";
    pub const GROUPED_PURPOSE_OF_USE: &str = "grouped_purpose_of_use";
}

/// A municipal building register export, deserialized from TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildingSource {
    /// Unique source identifier (e.g., `"helsinki"`).
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Default input file name under `data/raw`.
    pub input: String,
    /// Whether `purpose_of_use` holds register codes that must be decoded
    /// through the purpose-of-use code table.
    #[serde(default)]
    pub decode_purpose_of_use: bool,
    /// Raw column -> canonical column, in output order.
    pub columns: Vec<ColumnRename>,
}

impl BuildingSource {
    /// Returns the source identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the human-readable source name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Purpose-of-use register code table (`RA_KAYTTARK`), e.g.
/// `"011" -> "Yhden asunnon talot"`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PurposeCodes {
    #[serde(rename = "RA_KAYTTARK")]
    pub codes: BTreeMap<String, String>,
}

impl PurposeCodes {
    /// Looks up a code's description.
    #[must_use]
    pub fn describe(&self, code: &str) -> Option<&str> {
        self.codes.get(code).map(String::as_str)
    }
}

/// One named group of purpose-of-use descriptions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PurposeGroup {
    pub name: String,
    pub purposes: Vec<String>,
}

/// Ordered purpose-of-use groups, deserialized from a JSON object of
/// `group name -> [purpose, ...]`. File order is kept because the first
/// matching group wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PurposeGrouping {
    pub groups: Vec<PurposeGroup>,
}

/// Group assigned to purposes no group lists.
pub const FALLBACK_PURPOSE_GROUP: &str = "Other";

impl PurposeGrouping {
    /// Returns the first group listing `purpose`, or
    /// [`FALLBACK_PURPOSE_GROUP`].
    #[must_use]
    pub fn group_of(&self, purpose: Option<&str>) -> &str {
        purpose
            .and_then(|p| {
                self.groups
                    .iter()
                    .find(|g| g.purposes.iter().any(|candidate| candidate == p))
            })
            .map_or(FALLBACK_PURPOSE_GROUP, |g| g.name.as_str())
    }
}

impl<'de> Deserialize<'de> for PurposeGrouping {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct GroupingVisitor;

        impl<'de> Visitor<'de> for GroupingVisitor {
            type Value = PurposeGrouping;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an object mapping group names to lists of purposes")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut groups = Vec::new();
                while let Some((name, purposes)) = map.next_entry::<String, Vec<String>>()? {
                    groups.push(PurposeGroup { name, purposes });
                }
                Ok(PurposeGrouping { groups })
            }
        }

        deserializer.deserialize_map(GroupingVisitor)
    }
}

/// Study area and elaboration parameters, deserialized from TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudyArea {
    /// Identifier used in logs.
    pub id: String,
    /// CRS of the corner coordinates.
    pub crs: String,
    /// South-west corner `[x, y]`.
    pub south_west: [f64; 2],
    /// North-east corner `[x, y]`.
    pub north_east: [f64; 2],
    /// Buffer radii in the buildings' linear unit, in output order.
    pub buffer_radii: Vec<f64>,
    /// Assumed storey height used to estimate building height.
    pub storey_height: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grouping_keeps_file_order() {
        let grouping: PurposeGrouping = serde_json::from_str(
            r#"{
                "Residential": ["Yhden asunnon talot", "Rivitalot"],
                "Mixed": ["Rivitalot", "Liikerakennukset"]
            }"#,
        )
        .unwrap();
        assert_eq!(grouping.groups.len(), 2);
        assert_eq!(grouping.groups[0].name, "Residential");
        assert_eq!(grouping.group_of(Some("Rivitalot")), "Residential");
        assert_eq!(grouping.group_of(Some("Liikerakennukset")), "Mixed");
        assert_eq!(grouping.group_of(Some("Kirkot")), FALLBACK_PURPOSE_GROUP);
        assert_eq!(grouping.group_of(None), FALLBACK_PURPOSE_GROUP);
    }

    #[test]
    fn purpose_codes_from_register_table() {
        let codes: PurposeCodes = serde_json::from_str(
            r#"{"RA_KAYTTARK": {"011": "Yhden asunnon talot", "039": "Muut asuinkerrostalot"}}"#,
        )
        .unwrap();
        assert_eq!(codes.describe("011"), Some("Yhden asunnon talot"));
        assert_eq!(codes.describe("999"), None);
    }

    #[test]
    fn building_source_from_toml() {
        let source: BuildingSource = toml::from_str(
            r#"
            id = "test"
            name = "Test register"
            input = "test.geojson"

            [[columns]]
            source = "ID"
            target = "permanent_building_identifier"
            "#,
        )
        .unwrap();
        assert!(!source.decode_purpose_of_use);
        assert_eq!(source.columns[0].target, columns::PERMANENT_BUILDING_IDENTIFIER);
    }
}
