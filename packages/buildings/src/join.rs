//! Join of the municipal building registers.
//!
//! Every source is reduced to the canonical columns, completion dates are
//! normalized and register purpose codes decoded. The tables are then
//! concatenated in registry order, buildings without an identifier or with
//! non-polygon geometry are dropped, and each building gets a grouped
//! purpose of use.

use std::path::PathBuf;

use gehl_map_buildings_models::{BuildingSource, PurposeCodes, PurposeGrouping, columns};
use gehl_map_features::attributes::{as_key, as_str, is_missing};
use gehl_map_features::io::{read_feature_table, read_json, write_feature_table};
use gehl_map_features::{FeatureTable, GeometryType};
use serde_json::Value;

use crate::BuildingsError;
use crate::dates::standardize_date;

/// Inputs and outputs of one join run.
#[derive(Debug, Clone)]
pub struct JoinArgs {
    /// Sources paired with the file to read for each, in join order.
    pub inputs: Vec<(BuildingSource, PathBuf)>,
    pub purpose_codes_path: PathBuf,
    pub grouping_path: PathBuf,
    pub output_path: PathBuf,
}

/// Record counts reported after a join.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JoinSummary {
    pub input_records: usize,
    pub output_records: usize,
}

/// Reduces one raw register table to the canonical columns.
///
/// # Errors
///
/// Returns an error if a mapped column is absent or a completion date is in
/// an unknown format.
pub fn prepare_source(
    table: &mut FeatureTable,
    source: &BuildingSource,
    codes: &PurposeCodes,
) -> Result<(), BuildingsError> {
    table.select_columns(&source.columns)?;

    for record in &mut table.records {
        let date = standardize_date(record.get(columns::COMPLETION_DATE))?;
        record.set(columns::COMPLETION_DATE, date);

        if source.decode_purpose_of_use {
            let decoded = as_key(record.get(columns::PURPOSE_OF_USE))
                .and_then(|code| codes.describe(&code))
                .map_or(Value::Null, |d| Value::String(d.to_string()));
            record.set(columns::PURPOSE_OF_USE, decoded);
        }
    }

    log::debug!("Prepared {} buildings from {}", table.len(), source.name());
    Ok(())
}

/// Joins raw source tables into one building table, in input order.
///
/// # Errors
///
/// Returns [`BuildingsError::NoSources`] for empty input,
/// [`FeatureError::CrsMismatch`](gehl_map_features::FeatureError::CrsMismatch)
/// (wrapped) if the inputs are in different systems, or any error from
/// [`prepare_source`].
pub fn join_buildings(
    inputs: Vec<(&BuildingSource, FeatureTable)>,
    codes: &PurposeCodes,
    grouping: &PurposeGrouping,
) -> Result<FeatureTable, BuildingsError> {
    let mut inputs = inputs.into_iter();
    let (first, mut joined) = inputs.next().ok_or(BuildingsError::NoSources)?;
    prepare_source(&mut joined, first, codes)?;

    for (source, mut table) in inputs {
        prepare_source(&mut table, source, codes)?;
        joined.append(table)?;
    }

    let before = joined.len();
    joined.retain(|r| !is_missing(r.properties.get(columns::PERMANENT_BUILDING_IDENTIFIER)));
    let without_id = before - joined.len();

    let before = joined.len();
    joined.retain_geometry_types(&[GeometryType::Polygon]);
    let non_polygon = before - joined.len();

    if without_id + non_polygon > 0 {
        log::info!(
            "Dropped {without_id} buildings without identifier and {non_polygon} non-polygon buildings"
        );
    }

    for record in &mut joined.records {
        let group = grouping
            .group_of(as_str(record.get(columns::PURPOSE_OF_USE)))
            .to_string();
        record.set(columns::GROUPED_PURPOSE_OF_USE, group);
    }

    Ok(joined)
}

/// Reads every input, joins them and writes the result.
///
/// # Errors
///
/// Returns an error if an input cannot be read, the join fails, or the
/// output cannot be written.
pub fn run(args: &JoinArgs) -> Result<JoinSummary, BuildingsError> {
    let codes: PurposeCodes = read_json(&args.purpose_codes_path)?;
    let grouping: PurposeGrouping = read_json(&args.grouping_path)?;

    let mut inputs = Vec::with_capacity(args.inputs.len());
    for (source, path) in &args.inputs {
        log::info!("Reading {} from {}", source.name(), path.display());
        inputs.push((source, read_feature_table(path)?));
    }
    let input_records = inputs.iter().map(|(_, t)| t.len()).sum();

    let joined = join_buildings(inputs, &codes, &grouping)?;
    write_feature_table(&args.output_path, &joined)?;
    log::info!(
        "Wrote {} joined buildings to {}",
        joined.len(),
        args.output_path.display()
    );

    Ok(JoinSummary {
        input_records,
        output_records: joined.len(),
    })
}
