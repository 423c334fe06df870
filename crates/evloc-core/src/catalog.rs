use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use thiserror::Error;

use crate::station::{Catalog, Station};

pub const LATITUDE_COLUMN: &str = "Latitude";
pub const LONGITUDE_COLUMN: &str = "Longitude";
pub const POWER_COLUMN: &str = "Power (W)";

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read station catalog at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed station catalog: {0}")]
    Csv(#[from] csv::Error),

    #[error("station catalog is missing required column \"{0}\"")]
    MissingColumn(&'static str),

    #[error("row {row}: column \"{column}\" has non-numeric value \"{value}\"")]
    InvalidNumber {
        row: usize,
        column: &'static str,
        value: String,
    },
}

/// Load the station catalog from a headered CSV file.
///
/// # Errors
///
/// Returns `CatalogError` if the file cannot be opened, is not valid CSV,
/// lacks one of the required columns, or has a non-numeric required cell.
pub fn load_catalog(path: &Path) -> Result<Catalog, CatalogError> {
    let file = std::fs::File::open(path).map_err(|e| CatalogError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    let catalog = parse_catalog(file)?;
    tracing::info!(
        path = %path.display(),
        stations = catalog.len(),
        "station catalog loaded"
    );
    Ok(catalog)
}

/// Parse a catalog from any CSV reader. Row order is preserved.
///
/// # Errors
///
/// See [`load_catalog`].
pub fn parse_catalog<R: Read>(reader: R) -> Result<Catalog, CatalogError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    let column = |name: &'static str| -> Result<usize, CatalogError> {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or(CatalogError::MissingColumn(name))
    };
    let lat_idx = column(LATITUDE_COLUMN)?;
    let lon_idx = column(LONGITUDE_COLUMN)?;
    let power_idx = column(POWER_COLUMN)?;

    let mut stations = Vec::new();
    for (i, record) in csv_reader.records().enumerate() {
        let record = record?;
        let row = i + 1;
        let number = |idx: usize, name: &'static str| -> Result<f64, CatalogError> {
            let raw = record.get(idx).unwrap_or_default();
            raw.parse::<f64>().map_err(|_| CatalogError::InvalidNumber {
                row,
                column: name,
                value: raw.to_string(),
            })
        };

        let latitude = number(lat_idx, LATITUDE_COLUMN)?;
        let longitude = number(lon_idx, LONGITUDE_COLUMN)?;
        let power_watts = number(power_idx, POWER_COLUMN)?;

        let extra: BTreeMap<String, serde_json::Value> = headers
            .iter()
            .zip(record.iter())
            .enumerate()
            .filter(|(idx, _)| ![lat_idx, lon_idx, power_idx].contains(idx))
            .map(|(_, (header, cell))| (header.to_string(), passthrough_value(cell)))
            .collect();

        stations.push(Station {
            latitude,
            longitude,
            power_watts,
            extra,
        });
    }

    Ok(Catalog::new(stations))
}

/// Numbers stay numbers, blanks become null, everything else is a string.
fn passthrough_value(cell: &str) -> serde_json::Value {
    if cell.is_empty() {
        return serde_json::Value::Null;
    }
    if let Ok(int) = cell.parse::<i64>() {
        return serde_json::Value::from(int);
    }
    match cell.parse::<f64>() {
        Ok(float) if float.is_finite() => serde_json::Value::from(float),
        _ => serde_json::Value::String(cell.to_string()),
    }
}
