use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::select::{self, QueryError, RangeSelection};

/// A caller-supplied geographic coordinate in decimal degrees.
///
/// No bounds are enforced; out-of-range values flow straight into the
/// distance math.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub lat: f64,
    pub lon: f64,
}

impl Point {
    #[must_use]
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lon.is_finite()
    }
}

/// One row of the station catalog.
///
/// Only position and rated power are inspected. Every other column of the
/// source row is carried in `extra` and returned untouched with a selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    #[serde(rename = "Latitude")]
    pub latitude: f64,
    #[serde(rename = "Longitude")]
    pub longitude: f64,
    #[serde(rename = "Power (W)")]
    pub power_watts: f64,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl Station {
    #[must_use]
    pub fn new(latitude: f64, longitude: f64, power_watts: f64) -> Self {
        Self {
            latitude,
            longitude,
            power_watts,
            extra: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn position(&self) -> Point {
        Point::new(self.latitude, self.longitude)
    }
}

/// Which query produced a selection. Only affects labelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionKind {
    Nearest,
    HighestPower,
}

impl SelectionKind {
    /// Legend entry for the selected-station marker.
    #[must_use]
    pub fn legend_label(self) -> &'static str {
        match self {
            SelectionKind::Nearest => "Nearest Charging Station",
            SelectionKind::HighestPower => "Highest Power Charging Station",
        }
    }

    /// Text drawn next to the selected station.
    #[must_use]
    pub fn marker_label(self) -> &'static str {
        match self {
            SelectionKind::Nearest => "Nearest Station",
            SelectionKind::HighestPower => "Highest Power Station",
        }
    }
}

impl std::fmt::Display for SelectionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SelectionKind::Nearest => write!(f, "nearest"),
            SelectionKind::HighestPower => write!(f, "highest_power"),
        }
    }
}

/// Read-only station table shared by every query for the life of the process.
///
/// Cloning is cheap: all clones point at the same rows. Row order is the scan
/// order and therefore decides ties.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    stations: Arc<[Station]>,
}

impl Catalog {
    #[must_use]
    pub fn new(stations: Vec<Station>) -> Self {
        Self {
            stations: stations.into(),
        }
    }

    #[must_use]
    pub fn stations(&self) -> &[Station] {
        &self.stations
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.stations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    /// # Errors
    ///
    /// See [`select::find_nearest`].
    pub fn nearest(&self, query: Point) -> Result<&Station, QueryError> {
        select::find_nearest(query, &self.stations)
    }

    /// # Errors
    ///
    /// See [`select::find_best_in_range`].
    pub fn best_in_range(&self, query: Point, radius: f64) -> Result<RangeSelection<'_>, QueryError> {
        select::find_best_in_range(query, &self.stations, radius)
    }
}

impl From<Vec<Station>> for Catalog {
    fn from(stations: Vec<Station>) -> Self {
        Self::new(stations)
    }
}
