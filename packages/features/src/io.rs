//! Reading and writing `GeoJSON` feature collections and JSON configs.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write as _};
use std::path::Path;

use geojson::{Feature, FeatureCollection, GeoJson, JsonObject};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use crate::{Crs, FeatureError, FeatureRecord, FeatureTable};

/// Reads a `GeoJSON` `FeatureCollection` from disk.
///
/// # Errors
///
/// Returns [`FeatureError::NotFound`] if the file does not exist, and a
/// parse, geometry or CRS error if its content is invalid.
pub fn read_feature_table(path: &Path) -> Result<FeatureTable, FeatureError> {
    let contents = read_to_string(path)?;
    let table = parse_feature_table(&contents).map_err(|e| match e {
        FeatureError::NotAFeatureCollection { .. } => FeatureError::NotAFeatureCollection {
            path: path.to_path_buf(),
        },
        other => other,
    })?;
    log::info!(
        "Read {} features ({}) from {}",
        table.len(),
        table.crs,
        path.display()
    );
    Ok(table)
}

/// Parses a `GeoJSON` `FeatureCollection` string.
///
/// The CRS comes from the legacy `crs` member when present and defaults to
/// WGS84 otherwise.
///
/// # Errors
///
/// Returns an error if the text is not a `FeatureCollection`, a geometry
/// cannot be converted, or the CRS is unsupported.
pub fn parse_feature_table(contents: &str) -> Result<FeatureTable, FeatureError> {
    let geojson: GeoJson = contents.parse()?;
    let GeoJson::FeatureCollection(collection) = geojson else {
        return Err(FeatureError::NotAFeatureCollection {
            path: "<string>".into(),
        });
    };

    let crs = match collection
        .foreign_members
        .as_ref()
        .and_then(|members| crs_name(members.get("crs")?))
    {
        Some(name) => Crs::parse(name)?,
        None => Crs::WGS84,
    };

    let records = collection
        .features
        .into_iter()
        .map(feature_to_record)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(FeatureTable::new(crs, records))
}

/// Extracts `crs.properties.name` from a legacy named CRS member.
fn crs_name(crs: &Value) -> Option<&str> {
    crs.get("properties")?.get("name")?.as_str()
}

fn feature_to_record(feature: Feature) -> Result<FeatureRecord, FeatureError> {
    let geometry = feature
        .geometry
        .map(geo::Geometry::<f64>::try_from)
        .transpose()?;
    Ok(FeatureRecord::new(
        geometry,
        feature.properties.unwrap_or_default(),
    ))
}

/// Converts a table into a `FeatureCollection`.
///
/// WGS84 output follows RFC 7946 and carries no `crs` member; other systems
/// are tagged with a legacy named CRS so they can be read back.
#[must_use]
pub fn to_feature_collection(table: &FeatureTable) -> FeatureCollection {
    let features = table
        .records
        .iter()
        .map(|record| Feature {
            bbox: None,
            geometry: record
                .geometry
                .as_ref()
                .map(|g| geojson::Geometry::new(geojson::Value::from(g))),
            id: None,
            properties: Some(record.properties.clone()),
            foreign_members: None,
        })
        .collect();

    let foreign_members = (table.crs != Crs::WGS84).then(|| {
        let mut members = JsonObject::new();
        members.insert(
            "crs".to_string(),
            json!({"type": "name", "properties": {"name": table.crs.urn()}}),
        );
        members
    });

    FeatureCollection {
        bbox: None,
        features,
        foreign_members,
    }
}

/// Writes a table as a `GeoJSON` `FeatureCollection`, creating parent
/// directories as needed.
///
/// # Errors
///
/// Returns an I/O or serialization error.
pub fn write_feature_table(path: &Path, table: &FeatureTable) -> Result<(), FeatureError> {
    let collection = to_feature_collection(table);
    write_json(path, &collection)?;
    log::info!(
        "Wrote {} features ({}) to {}",
        table.len(),
        table.crs,
        path.display()
    );
    Ok(())
}

/// Reads and deserializes a JSON configuration file.
///
/// # Errors
///
/// Returns [`FeatureError::NotFound`] if the file does not exist and
/// [`FeatureError::Json`] if it does not match `T`.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, FeatureError> {
    let file = open(path)?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}

/// Serializes a value as pretty-printed JSON, creating parent directories
/// as needed.
///
/// # Errors
///
/// Returns an I/O or serialization error.
pub fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<(), FeatureError> {
    let io_err = |source| FeatureError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }

    let file = File::create(path).map_err(io_err)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.flush().map_err(io_err)?;
    Ok(())
}

fn open(path: &Path) -> Result<File, FeatureError> {
    File::open(path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            FeatureError::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            FeatureError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })
}

fn read_to_string(path: &Path) -> Result<String, FeatureError> {
    let mut contents = String::new();
    std::io::Read::read_to_string(&mut open(path)?, &mut contents).map_err(|source| {
        FeatureError::Io {
            path: path.to_path_buf(),
            source,
        }
    })?;
    Ok(contents)
}
