#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! In-memory spatial index of categorised places.
//!
//! Bulk-loads every place into an R-tree once, then answers "how many
//! places of each Gehl category lie within `r` of this building centroid"
//! for each configured radius. The per-radius counts and their Simpson
//! diversity are written back onto the building records as new columns.

pub mod diversity;

use std::fmt;

use gehl_map_features::attributes::f64_value;
use gehl_map_features::progress::ProgressCallback;
use gehl_map_features::{FeatureRecord, FeatureTable};
use gehl_map_places_models::GehlCategory;
use geo::{Centroid, Point};
use rstar::{AABB, PointDistance, RTree, RTreeObject};

pub use diversity::simpson_diversity;

/// Errors that can occur when configuring buffer aggregation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SpatialError {
    /// No radii were given.
    #[error("At least one buffer radius is required")]
    NoRadii,

    /// A radius is zero, negative or not finite.
    #[error("Buffer radius must be positive and finite, got {radius}")]
    InvalidRadius {
        /// The rejected radius.
        radius: f64,
    },
}

/// A validated buffer radius, in the linear unit of the buildings' CRS.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct BufferRadius(f64);

impl BufferRadius {
    /// Validates a radius.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError::InvalidRadius`] unless `radius` is positive
    /// and finite.
    pub fn new(radius: f64) -> Result<Self, SpatialError> {
        if radius.is_finite() && radius > 0.0 {
            Ok(Self(radius))
        } else {
            Err(SpatialError::InvalidRadius { radius })
        }
    }

    /// Validates a non-empty list of radii, preserving order.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError::NoRadii`] for an empty list or
    /// [`SpatialError::InvalidRadius`] for the first bad value.
    pub fn parse_all(radii: &[f64]) -> Result<Vec<Self>, SpatialError> {
        if radii.is_empty() {
            return Err(SpatialError::NoRadii);
        }
        radii.iter().copied().map(Self::new).collect()
    }

    #[must_use]
    pub const fn value(self) -> f64 {
        self.0
    }

    /// Column suffix, e.g. `500m`. Whole radii have no fractional part.
    #[must_use]
    pub fn label(self) -> String {
        self.to_string()
    }
}

impl fmt::Display for BufferRadius {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}m", self.0)
    }
}

/// `<category>_places_within_<r>m`
#[must_use]
pub fn category_column(category: GehlCategory, radius: BufferRadius) -> String {
    format!("{category}_places_within_{radius}")
}

/// `places_within_<r>m`
#[must_use]
pub fn total_column(radius: BufferRadius) -> String {
    format!("places_within_{radius}")
}

/// `simpson_diversity_within_<r>m`
#[must_use]
pub fn diversity_column(radius: BufferRadius) -> String {
    format!("simpson_diversity_within_{radius}")
}

/// Place counts per target category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CategoryCounts {
    counts: [u64; 4],
}

impl CategoryCounts {
    /// Builds counts from raw values in [`GehlCategory::TARGETS`] order.
    #[must_use]
    pub const fn from_values(counts: [u64; 4]) -> Self {
        Self { counts }
    }

    /// Tallies a sequence of categories. The fallback is not counted.
    #[must_use]
    pub fn from_categories(categories: impl IntoIterator<Item = GehlCategory>) -> Self {
        let mut counts = Self::default();
        for category in categories {
            counts.increment(category);
        }
        counts
    }

    pub const fn increment(&mut self, category: GehlCategory) {
        if let Some(i) = category.target_index() {
            self.counts[i] += 1;
        }
    }

    /// Count for one category; always 0 for the fallback.
    #[must_use]
    pub const fn get(&self, category: GehlCategory) -> u64 {
        match category.target_index() {
            Some(i) => self.counts[i],
            None => 0,
        }
    }

    /// Counts in [`GehlCategory::TARGETS`] order.
    #[must_use]
    pub const fn values(&self) -> &[u64; 4] {
        &self.counts
    }

    /// Sum across categories.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }
}

/// Counts and diversity for one building at one radius.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BufferResult {
    pub radius: BufferRadius,
    pub counts: CategoryCounts,
    pub diversity: f64,
}

/// A place stored in the R-tree with its category.
struct PlaceEntry {
    position: [f64; 2],
    category: GehlCategory,
}

impl RTreeObject for PlaceEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.position)
    }
}

impl PointDistance for PlaceEntry {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.position[0] - point[0];
        let dy = self.position[1] - point[1];
        dx.mul_add(dx, dy * dy)
    }
}

/// Pre-built R-tree over categorised places.
///
/// Only places in a target category are indexed; unmapped places never
/// contribute to a count.
pub struct PlaceIndex {
    places: RTree<PlaceEntry>,
}

impl PlaceIndex {
    /// Bulk-loads places given as (location, category) pairs.
    pub fn new(places: impl IntoIterator<Item = (Point<f64>, GehlCategory)>) -> Self {
        let entries: Vec<PlaceEntry> = places
            .into_iter()
            .filter(|(_, category)| category.is_target())
            .map(|(point, category)| PlaceEntry {
                position: [point.x(), point.y()],
                category,
            })
            .collect();

        Self {
            places: RTree::bulk_load(entries),
        }
    }

    /// Builds the index from a places table. `category_of` reads a record's
    /// category; records it rejects, and records without geometry, are
    /// skipped. Non-point geometries are represented by their centroid.
    pub fn from_table(
        table: &FeatureTable,
        category_of: impl Fn(&FeatureRecord) -> Option<GehlCategory>,
    ) -> Self {
        let mut skipped = 0usize;
        let index = Self::new(table.records.iter().filter_map(|record| {
            let entry = record
                .geometry
                .as_ref()
                .and_then(Centroid::centroid)
                .zip(category_of(record));
            if entry.is_none() {
                skipped += 1;
            }
            entry
        }));

        if skipped > 0 {
            log::debug!("Skipped {skipped} places without geometry or category");
        }
        log::info!("Loaded {} categorised places into spatial index", index.len());
        index
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.places.size()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.places.size() == 0
    }

    /// Counts places per category within `radius` of `centre`, boundary
    /// included.
    #[must_use]
    pub fn counts_within(&self, centre: Point<f64>, radius: BufferRadius) -> CategoryCounts {
        let r = radius.value();
        CategoryCounts::from_categories(
            self.places
                .locate_within_distance([centre.x(), centre.y()], r * r)
                .map(|entry| entry.category),
        )
    }

    /// Counts and diversity at every radius for one centroid. A missing
    /// centroid yields zero counts.
    #[must_use]
    pub fn buffer_results(
        &self,
        centroid: Option<Point<f64>>,
        radii: &[BufferRadius],
    ) -> Vec<BufferResult> {
        radii
            .iter()
            .map(|&radius| {
                let counts =
                    centroid.map_or_else(CategoryCounts::default, |c| self.counts_within(c, radius));
                BufferResult {
                    radius,
                    counts,
                    diversity: simpson_diversity(&counts),
                }
            })
            .collect()
    }
}

/// Writes buffer results onto a record: category counts and the total for
/// every radius, followed by the diversity score for every radius.
pub fn write_buffer_columns(record: &mut FeatureRecord, results: &[BufferResult]) {
    for result in results {
        for category in GehlCategory::TARGETS {
            record.set(
                category_column(category, result.radius),
                result.counts.get(category),
            );
        }
        record.set(total_column(result.radius), result.counts.total());
    }
    for result in results {
        record.set(diversity_column(result.radius), f64_value(result.diversity));
    }
}

/// Annotates every building with buffer counts and diversity scores,
/// measured from the building centroid.
///
/// `buildings` and the index must share a CRS whose linear unit matches the
/// radii.
pub fn annotate_buildings(
    buildings: &mut FeatureTable,
    index: &PlaceIndex,
    radii: &[BufferRadius],
    progress: &dyn ProgressCallback,
) {
    progress.set_total(buildings.len() as u64);
    progress.set_message("Counting places around buildings".to_string());

    for record in &mut buildings.records {
        let centroid = record.geometry.as_ref().and_then(Centroid::centroid);
        let results = index.buffer_results(centroid, radii);
        write_buffer_columns(record, &results);
        progress.inc(1);
    }

    progress.finish(format!(
        "Counted places around {} buildings",
        buildings.len()
    ));
}
