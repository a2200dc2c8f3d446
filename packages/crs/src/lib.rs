#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Coordinate reference systems used by the Helsinki/Espoo datasets.
//!
//! Covers geographic WGS84 (EPSG:4326) and the transverse Mercator grids
//! the source files are published in: ETRS-TM35FIN (EPSG:3067), the
//! ETRS-GK zones (EPSG:3873-3885, Helsinki uses GK25 = 3879) and UTM
//! (EPSG:326xx / 327xx). No external C dependencies (no libproj).
//!
//! ETRS89 and WGS84 are treated as the same datum; the sub-metre offset
//! between them is irrelevant at the scale of building buffers.

pub mod tm;

use std::fmt;

use geo::{Coord, Geometry, MapCoords, Rect};

use crate::tm::{GRS80, TransverseMercator, WGS84};

/// Errors that can occur when resolving a CRS.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CrsError {
    /// The identifier does not name a supported EPSG code.
    #[error("Unsupported CRS: {identifier}")]
    Unsupported {
        /// The identifier as it appeared in the input.
        identifier: String,
    },
}

/// A coordinate reference system, identified by its EPSG code.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Crs {
    epsg: u32,
    projection: Option<TransverseMercator>,
}

impl Crs {
    /// Geographic WGS84 longitude/latitude, the `GeoJSON` default.
    pub const WGS84: Self = Self {
        epsg: 4326,
        projection: None,
    };

    /// Resolves an EPSG code.
    ///
    /// # Errors
    ///
    /// Returns [`CrsError::Unsupported`] for codes outside the supported
    /// set.
    pub fn from_epsg(epsg: u32) -> Result<Self, CrsError> {
        let projection = match epsg {
            4326 => None,
            3067 => Some(TransverseMercator {
                ellipsoid: GRS80,
                central_meridian: 27.0,
                scale_factor: 0.9996,
                false_easting: 500_000.0,
                false_northing: 0.0,
            }),
            3873..=3885 => {
                // ETRS-GK19 .. ETRS-GK31: the zone number is the central
                // meridian and prefixes the false easting.
                let zone = f64::from(epsg - 3873 + 19);
                Some(TransverseMercator {
                    ellipsoid: GRS80,
                    central_meridian: zone,
                    scale_factor: 1.0,
                    false_easting: zone.mul_add(1_000_000.0, 500_000.0),
                    false_northing: 0.0,
                })
            }
            32601..=32660 | 32701..=32760 => {
                let north = epsg < 32700;
                let zone = f64::from(if north { epsg - 32600 } else { epsg - 32700 });
                Some(TransverseMercator {
                    ellipsoid: WGS84,
                    central_meridian: zone.mul_add(6.0, -183.0),
                    scale_factor: 0.9996,
                    false_easting: 500_000.0,
                    false_northing: if north { 0.0 } else { 10_000_000.0 },
                })
            }
            _ => {
                return Err(CrsError::Unsupported {
                    identifier: format!("EPSG:{epsg}"),
                });
            }
        };

        Ok(Self { epsg, projection })
    }

    /// Parses a CRS identifier as found in `GeoJSON` `crs` members and
    /// configuration files.
    ///
    /// Accepts `EPSG:3067`, `epsg:3067`, `urn:ogc:def:crs:EPSG::3067`,
    /// `urn:ogc:def:crs:EPSG:6.3:3067`, bare codes and the `CRS84` aliases
    /// of WGS84.
    ///
    /// # Errors
    ///
    /// Returns [`CrsError::Unsupported`] if the identifier cannot be parsed
    /// or names an unsupported code.
    pub fn parse(identifier: &str) -> Result<Self, CrsError> {
        let trimmed = identifier.trim();
        let upper = trimmed.to_ascii_uppercase();

        if upper.ends_with("CRS84") {
            return Ok(Self::WGS84);
        }

        let code = upper
            .rsplit(':')
            .next()
            .filter(|_| upper.contains("EPSG") || !upper.contains(':'))
            .and_then(|code| code.parse::<u32>().ok())
            .ok_or_else(|| CrsError::Unsupported {
                identifier: trimmed.to_string(),
            })?;

        Self::from_epsg(code).map_err(|_| CrsError::Unsupported {
            identifier: trimmed.to_string(),
        })
    }

    /// Returns the EPSG code.
    #[must_use]
    pub const fn epsg(&self) -> u32 {
        self.epsg
    }

    /// Returns `true` for geographic (degree-based) systems.
    #[must_use]
    pub const fn is_geographic(&self) -> bool {
        self.projection.is_none()
    }

    /// OGC URN form used in legacy `GeoJSON` `crs` members.
    #[must_use]
    pub fn urn(&self) -> String {
        format!("urn:ogc:def:crs:EPSG::{}", self.epsg)
    }

    /// Converts a coordinate in this CRS to WGS84 longitude/latitude.
    #[must_use]
    pub fn to_wgs84(&self, coord: Coord<f64>) -> Coord<f64> {
        self.projection.map_or(coord, |tm| tm.unproject(coord))
    }

    /// Converts a WGS84 longitude/latitude coordinate into this CRS.
    #[must_use]
    pub fn project_wgs84(&self, coord: Coord<f64>) -> Coord<f64> {
        self.projection.map_or(coord, |tm| tm.project(coord))
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.epsg)
    }
}

/// Transforms a single coordinate between two systems.
#[must_use]
pub fn transform_coord(coord: Coord<f64>, from: Crs, to: Crs) -> Coord<f64> {
    if from == to {
        return coord;
    }
    to.project_wgs84(from.to_wgs84(coord))
}

/// Reprojects every coordinate of a geometry.
#[must_use]
pub fn reproject(geometry: &Geometry<f64>, from: Crs, to: Crs) -> Geometry<f64> {
    if from == to {
        return geometry.clone();
    }
    geometry.map_coords(move |coord| transform_coord(coord, from, to))
}

/// Transforms a rectangle by transforming its four corners.
///
/// The result is a polygon because a rectangle in one system is generally
/// not axis-aligned in another.
#[must_use]
pub fn transform_rect(rect: Rect<f64>, from: Crs, to: Crs) -> geo::Polygon<f64> {
    rect.to_polygon()
        .map_coords(move |coord| transform_coord(coord, from, to))
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;
    use proptest::prelude::*;

    /// Grid-to-grid round trips drift by micrometres.
    const GRID_ROUND_TRIP_TOLERANCE_M: f64 = 1e-4;

    #[test]
    fn parses_identifier_forms() {
        assert_eq!(Crs::parse("EPSG:3067").unwrap().epsg(), 3067);
        assert_eq!(Crs::parse("epsg:3879").unwrap().epsg(), 3879);
        assert_eq!(
            Crs::parse("urn:ogc:def:crs:EPSG::3067").unwrap().epsg(),
            3067
        );
        assert_eq!(
            Crs::parse("urn:ogc:def:crs:EPSG:6.3:3879").unwrap().epsg(),
            3879
        );
        assert_eq!(Crs::parse("4326").unwrap(), Crs::WGS84);
        assert_eq!(Crs::parse("urn:ogc:def:crs:OGC:1.3:CRS84").unwrap(), Crs::WGS84);
    }

    #[test]
    fn rejects_unsupported_identifiers() {
        assert!(matches!(
            Crs::parse("EPSG:3857"),
            Err(CrsError::Unsupported { .. })
        ));
        assert!(Crs::parse("urn:ogc:def:crs:OGC:1.3:FOO").is_err());
        assert!(Crs::parse("").is_err());
    }

    #[test]
    fn gk25_has_zone_prefixed_false_easting() {
        let gk25 = Crs::from_epsg(3879).unwrap();
        let projected = gk25.project_wgs84(Coord { x: 25.0, y: 60.2 });
        assert!((projected.x - 25_500_000.0).abs() < 1e-6);
    }

    #[test]
    fn utm_zone_35_central_meridian() {
        let utm = Crs::from_epsg(32635).unwrap();
        let projected = utm.project_wgs84(Coord { x: 27.0, y: 60.0 });
        assert!((projected.x - 500_000.0).abs() < 1e-6);
    }

    #[test]
    fn display_and_urn() {
        let crs = Crs::from_epsg(3067).unwrap();
        assert_eq!(crs.to_string(), "EPSG:3067");
        assert_eq!(crs.urn(), "urn:ogc:def:crs:EPSG::3067");
        assert!(!crs.is_geographic());
        assert!(Crs::WGS84.is_geographic());
    }

    #[test]
    fn reprojects_polygon_between_grids() {
        let tm35 = Crs::from_epsg(3067).unwrap();
        let gk25 = Crs::from_epsg(3879).unwrap();
        let polygon: Geometry<f64> = polygon![
            (x: 385_000.0, y: 6_672_000.0),
            (x: 385_050.0, y: 6_672_000.0),
            (x: 385_050.0, y: 6_672_050.0),
            (x: 385_000.0, y: 6_672_000.0),
        ]
        .into();

        let there = reproject(&polygon, tm35, gk25);
        let back = reproject(&there, gk25, tm35);

        let Geometry::Polygon(original) = polygon else {
            unreachable!()
        };
        let Geometry::Polygon(back) = back else {
            panic!("reprojection changed geometry type");
        };
        for (a, b) in original.exterior().coords().zip(back.exterior().coords()) {
            assert!((a.x - b.x).abs() < GRID_ROUND_TRIP_TOLERANCE_M, "x: {} vs {}", a.x, b.x);
            assert!((a.y - b.y).abs() < GRID_ROUND_TRIP_TOLERANCE_M, "y: {} vs {}", a.y, b.y);
        }
    }

    #[test]
    fn transformed_rect_keeps_corner_count() {
        let rect = Rect::new(
            Coord {
                x: 24.781_583,
                y: 60.165_923,
            },
            Coord {
                x: 24.909_075,
                y: 60.232_232,
            },
        );
        let polygon = transform_rect(rect, Crs::WGS84, Crs::from_epsg(3067).unwrap());
        // Four corners plus the closing coordinate.
        assert_eq!(polygon.exterior().0.len(), 5);
        assert!(polygon.exterior().0.iter().all(|c| c.x > 370_000.0 && c.x < 390_000.0));
    }

    proptest! {
        #[test]
        fn wgs84_round_trip_through_tm35fin(lon in 19.0f64..32.0, lat in 59.0f64..70.5) {
            let tm35 = Crs::from_epsg(3067).unwrap();
            let original = Coord { x: lon, y: lat };
            let back = transform_coord(
                transform_coord(original, Crs::WGS84, tm35),
                tm35,
                Crs::WGS84,
            );
            prop_assert!((back.x - lon).abs() < 1e-8);
            prop_assert!((back.y - lat).abs() < 1e-8);
        }

        #[test]
        fn wgs84_round_trip_through_gk25(lon in 23.5f64..26.5, lat in 59.5f64..61.0) {
            let gk25 = Crs::from_epsg(3879).unwrap();
            let original = Coord { x: lon, y: lat };
            let back = gk25.to_wgs84(gk25.project_wgs84(original));
            prop_assert!((back.x - lon).abs() < 1e-8);
            prop_assert!((back.y - lat).abs() < 1e-8);
        }
    }
}
