//! Per-building derived metrics.

use chrono::NaiveDate;
use gehl_map_buildings_models::columns;
use gehl_map_features::FeatureTable;
use gehl_map_features::attributes::{as_f64, opt_f64_value};
use serde_json::Value;

use crate::dates::parse_completion_date;

pub const DWELLINGS_PER_FLOORS: &str = "dwellings_per_floors";
pub const FLOOR_AREA_PER_DWELLING: &str = "floor_area_per_dwelling";
pub const ASSUMED_HEIGHT: &str = "assumed_height_based_on_floors";
pub const PARSED_COMPLETION_DATE: &str = "completion_date_";
pub const DAYS_SINCE_EARLIEST: &str = "days_since_earliest";

/// `numerator / denominator`, or `None` if either is missing or the
/// denominator is zero.
#[must_use]
pub fn ratio(numerator: Option<f64>, denominator: Option<f64>) -> Option<f64> {
    let denominator = denominator.filter(|d| d.abs() > 0.0)?;
    Some(numerator? / denominator)
}

/// Adds the derived metric columns to every building.
///
/// A dwelling count of zero is treated as unknown when it is a divisor and
/// is rewritten to null in the output. `dwellings_per_floors` still uses the
/// raw count, so zero dwellings over a known floor count give `0.0`.
/// Completion dates that do not parse yield
/// null for both date columns. `days_since_earliest` is measured from the
/// earliest parsed completion date in the table.
pub fn derive_metrics(table: &mut FeatureTable, storey_height: f64) {
    let mut dates: Vec<Option<NaiveDate>> = Vec::with_capacity(table.len());

    for record in &mut table.records {
        let raw_dwellings = as_f64(record.get(columns::NUMBER_OF_DWELLINGS));
        let dwellings = raw_dwellings.filter(|d| d.abs() > 0.0);
        let floors = as_f64(record.get(columns::NUMBER_OF_FLOORS));
        let floor_area = as_f64(record.get(columns::FLOOR_AREA));
        let completed = parse_completion_date(record.get(columns::COMPLETION_DATE));

        record.set(columns::NUMBER_OF_DWELLINGS, opt_f64_value(dwellings));
        record.set(DWELLINGS_PER_FLOORS, opt_f64_value(ratio(raw_dwellings, floors)));
        record.set(
            FLOOR_AREA_PER_DWELLING,
            opt_f64_value(ratio(floor_area, dwellings)),
        );
        record.set(
            ASSUMED_HEIGHT,
            opt_f64_value(floors.map(|f| f * storey_height)),
        );
        record.set(
            PARSED_COMPLETION_DATE,
            completed.map_or(Value::Null, |d| Value::String(d.to_string())),
        );
        dates.push(completed);
    }

    let earliest = dates.iter().flatten().min().copied();
    if earliest.is_none() && !table.is_empty() {
        log::warn!("No building has a parseable completion date");
    }

    for (record, date) in table.records.iter_mut().zip(dates) {
        let days = date
            .zip(earliest)
            .map_or(Value::Null, |(d, e)| Value::from((d - e).num_days()));
        record.set(DAYS_SINCE_EARLIEST, days);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gehl_map_features::{Crs, FeatureRecord};
    use serde_json::json;

    fn building(props: Value) -> FeatureRecord {
        let Value::Object(properties) = props else {
            panic!("expected an object");
        };
        FeatureRecord::new(None, properties)
    }

    fn table(records: Vec<FeatureRecord>) -> FeatureTable {
        FeatureTable::new(Crs::from_epsg(3879).unwrap(), records)
    }

    #[test]
    fn ratio_handles_missing_and_zero() {
        assert_eq!(ratio(Some(10.0), Some(4.0)), Some(2.5));
        assert_eq!(ratio(None, Some(4.0)), None);
        assert_eq!(ratio(Some(10.0), None), None);
        assert_eq!(ratio(Some(10.0), Some(0.0)), None);
    }

    #[test]
    fn computes_ratios_and_height() {
        let mut t = table(vec![building(json!({
            "number_of_dwellings": 10,
            "number_of_floors": 5,
            "floor_area": 1000,
            "completion_date": "2001-05-31",
        }))]);
        derive_metrics(&mut t, 3.3);

        let r = &t.records[0];
        assert_eq!(as_f64(r.get(DWELLINGS_PER_FLOORS)), Some(2.0));
        assert_eq!(as_f64(r.get(FLOOR_AREA_PER_DWELLING)), Some(100.0));
        let height = as_f64(r.get(ASSUMED_HEIGHT)).unwrap();
        assert!((height - 16.5).abs() < 1e-9);
        assert_eq!(r.get(PARSED_COMPLETION_DATE), &json!("2001-05-31"));
        assert_eq!(r.get(DAYS_SINCE_EARLIEST), &json!(0));
    }

    #[test]
    fn zero_dwellings_are_null_only_as_divisor() {
        let mut t = table(vec![building(json!({
            "number_of_dwellings": 0,
            "number_of_floors": 2,
            "floor_area": 150,
            "completion_date": null,
        }))]);
        derive_metrics(&mut t, 3.3);

        let r = &t.records[0];
        assert_eq!(r.get(columns::NUMBER_OF_DWELLINGS), &Value::Null);
        assert_eq!(as_f64(r.get(DWELLINGS_PER_FLOORS)), Some(0.0));
        assert_eq!(r.get(FLOOR_AREA_PER_DWELLING), &Value::Null);
        assert!(as_f64(r.get(ASSUMED_HEIGHT)).is_some());
        assert_eq!(r.get(PARSED_COMPLETION_DATE), &Value::Null);
        assert_eq!(r.get(DAYS_SINCE_EARLIEST), &Value::Null);
    }

    #[test]
    fn zero_dwellings_over_five_floors() {
        let mut t = table(vec![building(json!({
            "number_of_dwellings": 0,
            "number_of_floors": 5,
            "floor_area": 100,
        }))]);
        derive_metrics(&mut t, 3.3);

        let r = &t.records[0];
        assert_eq!(as_f64(r.get(DWELLINGS_PER_FLOORS)), Some(0.0));
        assert_eq!(r.get(FLOOR_AREA_PER_DWELLING), &Value::Null);
        assert_eq!(r.get(columns::NUMBER_OF_DWELLINGS), &Value::Null);
    }

    #[test]
    fn zero_floors_leave_ratio_null() {
        let mut t = table(vec![building(json!({
            "number_of_dwellings": "4",
            "number_of_floors": 0,
            "floor_area": "bad",
        }))]);
        derive_metrics(&mut t, 3.0);

        let r = &t.records[0];
        assert_eq!(as_f64(r.get(columns::NUMBER_OF_DWELLINGS)), Some(4.0));
        assert_eq!(r.get(DWELLINGS_PER_FLOORS), &Value::Null);
        assert_eq!(r.get(FLOOR_AREA_PER_DWELLING), &Value::Null);
        assert_eq!(as_f64(r.get(ASSUMED_HEIGHT)), Some(0.0));
    }

    #[test]
    fn days_since_earliest_completion() {
        let mut t = table(vec![
            building(json!({"completion_date": "2000-01-10"})),
            building(json!({"completion_date": "2000-01-01"})),
            building(json!({"completion_date": "not a date"})),
        ]);
        derive_metrics(&mut t, 3.3);

        let days: Vec<&Value> = t.records.iter().map(|r| r.get(DAYS_SINCE_EARLIEST)).collect();
        assert_eq!(days, [&json!(9), &json!(0), &Value::Null]);
    }
}
