//! The feature table and its row/column operations.

use std::collections::BTreeSet;

use geo::Geometry;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum_macros::{AsRefStr, Display, EnumString};

use crate::{Crs, FeatureError};

/// Attribute map of a single record. Insertion order is preserved so that
/// output columns appear in the order they were added.
pub type Properties = serde_json::Map<String, Value>;

/// `GeoJSON` geometry type names.
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
)]
pub enum GeometryType {
    Point,
    MultiPoint,
    LineString,
    MultiLineString,
    Polygon,
    MultiPolygon,
    GeometryCollection,
}

impl GeometryType {
    /// Returns the type of a geometry. `geo`-only shapes map to the
    /// `GeoJSON` type they serialize as.
    #[must_use]
    pub const fn of(geometry: &Geometry<f64>) -> Self {
        match geometry {
            Geometry::Point(_) => Self::Point,
            Geometry::MultiPoint(_) => Self::MultiPoint,
            Geometry::Line(_) | Geometry::LineString(_) => Self::LineString,
            Geometry::MultiLineString(_) => Self::MultiLineString,
            Geometry::Polygon(_) | Geometry::Rect(_) | Geometry::Triangle(_) => Self::Polygon,
            Geometry::MultiPolygon(_) => Self::MultiPolygon,
            Geometry::GeometryCollection(_) => Self::GeometryCollection,
        }
    }
}

/// One renamed column: `source` in the input becomes `target` in the
/// output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnRename {
    /// Column name in the input file.
    pub source: String,
    /// Column name written to the output.
    pub target: String,
}

impl ColumnRename {
    #[must_use]
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }
}

/// A geometry plus its attributes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeatureRecord {
    pub geometry: Option<Geometry<f64>>,
    pub properties: Properties,
}

impl FeatureRecord {
    #[must_use]
    pub const fn new(geometry: Option<Geometry<f64>>, properties: Properties) -> Self {
        Self {
            geometry,
            properties,
        }
    }

    /// Returns an attribute, treating absent keys as null.
    #[must_use]
    pub fn get(&self, column: &str) -> &Value {
        self.properties.get(column).unwrap_or(&Value::Null)
    }

    /// Sets an attribute, appending the column if it is new.
    pub fn set(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        self.properties.insert(column.into(), value.into());
    }

    /// Returns the geometry type, if the record has a geometry.
    #[must_use]
    pub fn geometry_type(&self) -> Option<GeometryType> {
        self.geometry.as_ref().map(GeometryType::of)
    }
}

/// All records of one file and the CRS they share.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureTable {
    pub crs: Crs,
    pub records: Vec<FeatureRecord>,
}

impl FeatureTable {
    #[must_use]
    pub const fn new(crs: Crs, records: Vec<FeatureRecord>) -> Self {
        Self { crs, records }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns the union of attribute names across all records.
    #[must_use]
    pub fn columns(&self) -> BTreeSet<&str> {
        self.records
            .iter()
            .flat_map(|r| r.properties.keys().map(String::as_str))
            .collect()
    }

    /// Keeps exactly the columns named in `mapping`, renamed and in mapping
    /// order. Records lacking a column get null for it.
    ///
    /// # Errors
    ///
    /// Returns [`FeatureError::MissingColumn`] if a source column is not
    /// present on any record of a non-empty table.
    pub fn select_columns(&mut self, mapping: &[ColumnRename]) -> Result<(), FeatureError> {
        if !self.is_empty() {
            let columns = self.columns();
            if let Some(missing) = mapping
                .iter()
                .find(|m| !columns.contains(m.source.as_str()))
            {
                return Err(FeatureError::MissingColumn {
                    column: missing.source.clone(),
                });
            }
        }

        for record in &mut self.records {
            let mut old = std::mem::take(&mut record.properties);
            record.properties = mapping
                .iter()
                .map(|m| {
                    (
                        m.target.clone(),
                        old.remove(&m.source).unwrap_or(Value::Null),
                    )
                })
                .collect();
        }

        Ok(())
    }

    /// Keeps the named columns (without renaming).
    ///
    /// # Errors
    ///
    /// Returns [`FeatureError::MissingColumn`] as for
    /// [`Self::select_columns`].
    pub fn keep_columns<S: AsRef<str>>(&mut self, columns: &[S]) -> Result<(), FeatureError> {
        let mapping: Vec<ColumnRename> = columns
            .iter()
            .map(|c| ColumnRename::new(c.as_ref(), c.as_ref()))
            .collect();
        self.select_columns(&mapping)
    }

    /// Keeps only records whose geometry is one of `types`. Records without
    /// geometry are dropped.
    pub fn retain_geometry_types(&mut self, types: &[GeometryType]) {
        self.records
            .retain(|r| r.geometry_type().is_some_and(|t| types.contains(&t)));
    }

    /// Keeps only records matching `predicate`.
    pub fn retain(&mut self, predicate: impl FnMut(&FeatureRecord) -> bool) {
        self.records.retain(predicate);
    }

    /// Reprojects every geometry into `target` and updates the table CRS.
    pub fn reproject(&mut self, target: Crs) {
        if self.crs == target {
            return;
        }
        let from = self.crs;
        for record in &mut self.records {
            if let Some(geometry) = &record.geometry {
                record.geometry = Some(gehl_map_crs::reproject(geometry, from, target));
            }
        }
        self.crs = target;
    }

    /// Appends the records of `other`.
    ///
    /// # Errors
    ///
    /// Returns [`FeatureError::CrsMismatch`] if the tables are in different
    /// systems.
    pub fn append(&mut self, other: Self) -> Result<(), FeatureError> {
        if self.crs != other.crs {
            return Err(FeatureError::CrsMismatch {
                left: self.crs,
                right: other.crs,
            });
        }
        self.records.extend(other.records);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{Coord, LineString, point};
    use serde_json::json;

    fn record(geometry: Option<Geometry<f64>>, properties: Value) -> FeatureRecord {
        let Value::Object(properties) = properties else {
            panic!("properties must be an object");
        };
        FeatureRecord::new(geometry, properties)
    }

    fn sample_table() -> FeatureTable {
        FeatureTable::new(
            Crs::WGS84,
            vec![
                record(
                    Some(point!(x: 24.9, y: 60.2).into()),
                    json!({"Nimi": "Kamppi", "Nousijamaa": 120, "extra": 1}),
                ),
                record(
                    Some(
                        LineString::from(vec![Coord { x: 24.8, y: 60.1 }, Coord { x: 24.81, y: 60.11 }])
                            .into(),
                    ),
                    json!({"Nimi": "Tapiola"}),
                ),
                record(None, json!({"Nimi": "Nowhere", "Nousijamaa": 3})),
            ],
        )
    }

    #[test]
    fn select_renames_and_orders_columns() {
        let mut table = sample_table();
        table
            .select_columns(&[
                ColumnRename::new("Nousijamaa", "passengers"),
                ColumnRename::new("Nimi", "name"),
            ])
            .unwrap();

        let keys: Vec<&str> = table.records[0]
            .properties
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(keys, ["passengers", "name"]);
        assert_eq!(table.records[0].get("passengers"), &json!(120));
        assert_eq!(table.records[1].get("passengers"), &Value::Null);
        assert!(table.records[0].properties.get("extra").is_none());
    }

    #[test]
    fn select_fails_on_unknown_column() {
        let mut table = sample_table();
        let err = table
            .select_columns(&[ColumnRename::new("Lyhyt_tunn", "lyhyt_tunn")])
            .unwrap_err();
        assert!(matches!(err, FeatureError::MissingColumn { column } if column == "Lyhyt_tunn"));
    }

    #[test]
    fn select_on_empty_table_is_a_no_op() {
        let mut table = FeatureTable::new(Crs::WGS84, vec![]);
        table.keep_columns(&["anything"]).unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn geometry_type_filter_drops_missing_geometry() {
        let mut table = sample_table();
        table.retain_geometry_types(&[GeometryType::LineString]);
        assert_eq!(table.len(), 1);
        assert_eq!(table.records[0].get("Nimi"), &json!("Tapiola"));
    }

    #[test]
    fn append_requires_matching_crs() {
        let mut table = sample_table();
        let other = FeatureTable::new(gehl_map_crs::Crs::from_epsg(3067).unwrap(), vec![]);
        assert!(matches!(
            table.append(other),
            Err(FeatureError::CrsMismatch { .. })
        ));

        let same = sample_table();
        table.append(same).unwrap();
        assert_eq!(table.len(), 6);
    }

    #[test]
    fn reproject_updates_crs_and_coordinates() {
        let mut table = sample_table();
        let tm35 = gehl_map_crs::Crs::from_epsg(3067).unwrap();
        table.reproject(tm35);
        assert_eq!(table.crs, tm35);
        let Some(Geometry::Point(p)) = &table.records[0].geometry else {
            panic!("expected point");
        };
        assert!(p.x() > 300_000.0 && p.x() < 400_000.0);
        assert!(table.records[2].geometry.is_none());
    }

    #[test]
    fn geometry_type_names() {
        assert_eq!(GeometryType::LineString.to_string(), "LineString");
        assert_eq!("Polygon".parse::<GeometryType>().unwrap(), GeometryType::Polygon);
    }
}
