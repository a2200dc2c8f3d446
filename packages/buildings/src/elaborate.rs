//! Building elaboration: study-area clipping, buffer counts around each
//! building, Simpson diversity and derived metrics.

use std::path::PathBuf;
use std::str::FromStr;

use gehl_map_buildings_models::StudyArea;
use gehl_map_crs::{Crs, transform_rect};
use gehl_map_features::attributes::as_str;
use gehl_map_features::io::{read_feature_table, write_feature_table};
use gehl_map_features::progress::ProgressCallback;
use gehl_map_features::{FeatureRecord, FeatureTable};
use gehl_map_places::GEHL_CATEGORY_COLUMN;
use gehl_map_places_models::GehlCategory;
use gehl_map_spatial::{BufferRadius, PlaceIndex, annotate_buildings};
use geo::{Centroid, Contains, Coord, Rect};

use crate::BuildingsError;
use crate::metrics::derive_metrics;

/// Inputs and outputs of one elaboration run.
#[derive(Debug, Clone)]
pub struct ElaborateArgs {
    pub buildings_path: PathBuf,
    pub places_path: PathBuf,
    pub output_path: PathBuf,
    pub study_area: StudyArea,
}

/// Record counts reported after elaboration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElaborateSummary {
    pub input_buildings: usize,
    pub output_buildings: usize,
    pub indexed_places: usize,
}

/// Elaborated buildings and the number of places they were counted against.
#[derive(Debug, Clone)]
pub struct Elaborated {
    pub buildings: FeatureTable,
    /// Places that made it into the spatial index.
    pub indexed_places: usize,
}

/// Keeps buildings whose centroid lies strictly inside the study area.
///
/// # Errors
///
/// Returns [`BuildingsError::Crs`] if the study area CRS is unsupported.
pub fn clip_to_study_area(
    buildings: &mut FeatureTable,
    area: &StudyArea,
) -> Result<(), BuildingsError> {
    let area_crs = Crs::parse(&area.crs)?;
    let rect = Rect::new(
        Coord {
            x: area.south_west[0],
            y: area.south_west[1],
        },
        Coord {
            x: area.north_east[0],
            y: area.north_east[1],
        },
    );
    let bounds = transform_rect(rect, area_crs, buildings.crs);

    let before = buildings.len();
    buildings.retain(|record| {
        record
            .geometry
            .as_ref()
            .and_then(Centroid::centroid)
            .is_some_and(|c| bounds.contains(&c))
    });
    log::info!(
        "{} of {before} buildings inside study area {}",
        buildings.len(),
        area.id
    );
    Ok(())
}

/// Reads a place's Gehl category label. Labels that are not one of the
/// known categories (a custom unmapped label, for instance) yield `None`.
fn place_category(record: &FeatureRecord) -> Option<GehlCategory> {
    as_str(record.get(GEHL_CATEGORY_COLUMN)).and_then(|label| GehlCategory::from_str(label).ok())
}

/// Elaborates joined buildings with categorised places.
///
/// Places are reprojected into the buildings' CRS, buildings are clipped to
/// the study area, annotated with buffer counts and diversity, given the
/// derived metrics, and finally reprojected to WGS84. Places without a
/// target category or a geometry are not indexed.
///
/// # Errors
///
/// Returns an error if the study area CRS or a buffer radius is invalid.
pub fn elaborate(
    mut buildings: FeatureTable,
    mut places: FeatureTable,
    area: &StudyArea,
    progress: &dyn ProgressCallback,
) -> Result<Elaborated, BuildingsError> {
    let radii = BufferRadius::parse_all(&area.buffer_radii)?;

    if buildings.crs.is_geographic() {
        log::warn!(
            "Buildings are in geographic {}; buffer radii will be read as degrees",
            buildings.crs
        );
    }

    if places.crs != buildings.crs {
        log::debug!("Reprojecting places from {} to {}", places.crs, buildings.crs);
        places.reproject(buildings.crs);
    }

    clip_to_study_area(&mut buildings, area)?;

    let index = PlaceIndex::from_table(&places, place_category);
    annotate_buildings(&mut buildings, &index, &radii, progress);
    derive_metrics(&mut buildings, area.storey_height);

    buildings.reproject(Crs::WGS84);
    Ok(Elaborated {
        buildings,
        indexed_places: index.len(),
    })
}

/// Reads both inputs, elaborates and writes the result.
///
/// # Errors
///
/// Returns an error if an input cannot be read, elaboration fails, or the
/// output cannot be written.
pub fn run(
    args: &ElaborateArgs,
    progress: &dyn ProgressCallback,
) -> Result<ElaborateSummary, BuildingsError> {
    let buildings = read_feature_table(&args.buildings_path)?;
    let places = read_feature_table(&args.places_path)?;
    let input_buildings = buildings.len();

    let Elaborated {
        buildings,
        indexed_places,
    } = elaborate(buildings, places, &args.study_area, progress)?;
    write_feature_table(&args.output_path, &buildings)?;
    log::info!(
        "Wrote {} elaborated buildings to {}",
        buildings.len(),
        args.output_path.display()
    );

    Ok(ElaborateSummary {
        input_buildings,
        output_buildings: buildings.len(),
        indexed_places,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use gehl_map_buildings_models::columns;
    use gehl_map_features::progress::NullProgress;
    use gehl_map_features::Properties;
    use gehl_map_features::attributes::as_f64;
    use geo::{Geometry, point, polygon};
    use serde_json::{Value, json};

    const X: f64 = 25_496_000.0;
    const Y: f64 = 6_673_000.0;

    fn gk25() -> Crs {
        Crs::from_epsg(3879).unwrap()
    }

    fn props(value: Value) -> Properties {
        let Value::Object(map) = value else {
            panic!("expected an object");
        };
        map
    }

    fn building(id: &str, x: f64, y: f64) -> FeatureRecord {
        let square = polygon![
            (x: x - 5.0, y: y - 5.0),
            (x: x + 5.0, y: y - 5.0),
            (x: x + 5.0, y: y + 5.0),
            (x: x - 5.0, y: y + 5.0),
            (x: x - 5.0, y: y - 5.0),
        ];
        FeatureRecord::new(
            Some(Geometry::Polygon(square)),
            props(json!({
                columns::PERMANENT_BUILDING_IDENTIFIER: id,
                columns::FLOOR_AREA: 400,
                columns::NUMBER_OF_FLOORS: 4,
                columns::NUMBER_OF_DWELLINGS: 8,
                columns::COMPLETION_DATE: "1990-01-01",
            })),
        )
    }

    fn place(x: f64, y: f64, category: &str) -> FeatureRecord {
        FeatureRecord::new(
            Some(Geometry::Point(point!(x: x, y: y))),
            props(json!({ GEHL_CATEGORY_COLUMN: category })),
        )
    }

    fn area() -> StudyArea {
        StudyArea {
            id: "test".to_string(),
            crs: "EPSG:3879".to_string(),
            south_west: [X - 1_000.0, Y - 1_000.0],
            north_east: [X + 1_000.0, Y + 1_000.0],
            buffer_radii: vec![500.0],
            storey_height: 3.3,
        }
    }

    #[test]
    fn clips_by_centroid() {
        let mut buildings = FeatureTable::new(
            gk25(),
            vec![building("in", X, Y), building("out", X + 5_000.0, Y)],
        );
        clip_to_study_area(&mut buildings, &area()).unwrap();
        assert_eq!(buildings.len(), 1);
        assert_eq!(
            buildings.records[0].get(columns::PERMANENT_BUILDING_IDENTIFIER),
            &json!("in")
        );
    }

    #[test]
    fn clips_with_geographic_study_area() {
        let centre = gk25().to_wgs84(Coord { x: X, y: Y });
        let geographic = StudyArea {
            crs: "EPSG:4326".to_string(),
            south_west: [centre.x - 0.01, centre.y - 0.01],
            north_east: [centre.x + 0.01, centre.y + 0.01],
            ..area()
        };
        let mut buildings = FeatureTable::new(
            gk25(),
            vec![building("in", X, Y), building("out", X, Y + 5_000.0)],
        );
        clip_to_study_area(&mut buildings, &geographic).unwrap();
        assert_eq!(buildings.len(), 1);
    }

    #[test]
    fn elaborates_counts_diversity_and_metrics() {
        let buildings = FeatureTable::new(gk25(), vec![building("b1", X, Y)]);
        let places = FeatureTable::new(
            gk25(),
            vec![
                place(X + 100.0, Y, "social"),
                place(X, Y + 200.0, "necessary"),
                place(X + 499.0, Y, "social"),
                place(X - 50.0, Y, "unmapped"),
                place(X + 600.0, Y, "optional"),
            ],
        );

        let out = elaborate(buildings, places, &area(), &NullProgress)
            .unwrap()
            .buildings;
        assert_eq!(out.crs, Crs::WGS84);
        let record = &out.records[0];

        assert_eq!(record.get("social_places_within_500m"), &json!(2));
        assert_eq!(record.get("necessary_places_within_500m"), &json!(1));
        assert_eq!(record.get("optional_places_within_500m"), &json!(0));
        assert_eq!(record.get("other_places_within_500m"), &json!(0));
        assert_eq!(record.get("places_within_500m"), &json!(3));

        // 1 - ((2/3)^2 + (1/3)^2)
        let diversity = as_f64(record.get("simpson_diversity_within_500m")).unwrap();
        assert!((diversity - 4.0 / 9.0).abs() < 1e-12);

        assert_eq!(as_f64(record.get("dwellings_per_floors")), Some(2.0));
        assert_eq!(as_f64(record.get("floor_area_per_dwelling")), Some(50.0));

        let Some(Geometry::Polygon(polygon)) = &record.geometry else {
            panic!("expected polygon");
        };
        let first = polygon.exterior().0[0];
        assert!((24.0..26.0).contains(&first.x));
        assert!((60.0..61.0).contains(&first.y));
    }

    #[test]
    fn places_in_other_crs_are_reprojected() {
        let buildings = FeatureTable::new(gk25(), vec![building("b1", X, Y)]);
        let near = gk25().to_wgs84(Coord { x: X + 100.0, y: Y });
        let places = FeatureTable::new(
            Crs::WGS84,
            vec![place(near.x, near.y, "optional")],
        );

        let out = elaborate(buildings, places, &area(), &NullProgress)
            .unwrap()
            .buildings;
        assert_eq!(out.records[0].get("optional_places_within_500m"), &json!(1));
        assert_eq!(
            as_f64(out.records[0].get("simpson_diversity_within_500m")),
            Some(0.0)
        );
    }

    #[test]
    fn indexed_places_excludes_places_without_geometry() {
        let buildings = FeatureTable::new(gk25(), vec![building("b1", X, Y)]);
        let places = FeatureTable::new(
            gk25(),
            vec![
                place(X + 10.0, Y, "social"),
                FeatureRecord::new(None, props(json!({ GEHL_CATEGORY_COLUMN: "social" }))),
                place(X, Y, "unmapped"),
            ],
        );

        let out = elaborate(buildings, places, &area(), &NullProgress).unwrap();
        assert_eq!(out.indexed_places, 1);
        assert_eq!(
            out.buildings.records[0].get("social_places_within_500m"),
            &json!(1)
        );
    }

    #[test]
    fn invalid_radius_is_rejected() {
        let bad = StudyArea {
            buffer_radii: vec![-1.0],
            ..area()
        };
        let buildings = FeatureTable::new(gk25(), vec![building("b1", X, Y)]);
        let places = FeatureTable::new(gk25(), Vec::new());
        let err = elaborate(buildings, places, &bad, &NullProgress).unwrap_err();
        assert!(matches!(err, BuildingsError::Spatial(_)));
    }

    #[test]
    fn run_round_trips_through_files() {
        let dir = tempfile::tempdir().unwrap();
        let buildings_path = dir.path().join("buildings.geojson");
        let places_path = dir.path().join("places.geojson");
        let output_path = dir.path().join("processed/elaborated.geojson");

        write_feature_table(
            &buildings_path,
            &FeatureTable::new(gk25(), vec![building("b1", X, Y)]),
        )
        .unwrap();
        write_feature_table(
            &places_path,
            &FeatureTable::new(
                gk25(),
                vec![place(X + 10.0, Y, "social"), place(X, Y, "unmapped")],
            ),
        )
        .unwrap();

        let summary = run(
            &ElaborateArgs {
                buildings_path,
                places_path,
                output_path: output_path.clone(),
                study_area: area(),
            },
            &NullProgress,
        )
        .unwrap();

        assert_eq!(
            summary,
            ElaborateSummary {
                input_buildings: 1,
                output_buildings: 1,
                indexed_places: 1,
            }
        );
        let written = read_feature_table(&output_path).unwrap();
        assert_eq!(written.crs, Crs::WGS84);
        assert_eq!(written.records[0].get("places_within_500m"), &json!(1));
    }
}
