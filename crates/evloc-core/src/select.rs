use thiserror::Error;

use crate::distance::distance;
use crate::station::{Point, Station};

#[derive(Debug, Error, PartialEq)]
pub enum QueryError {
    /// The catalog has no rows; a configuration problem, not a query outcome.
    #[error("station catalog is empty")]
    EmptyCatalog,

    #[error("search radius must be a non-negative number, got {0}")]
    InvalidRadius(f64),

    #[error("coordinate ({lat}, {lon}) is not finite")]
    NonFiniteCoordinate { lat: f64, lon: f64 },
}

/// Outcome of a range-constrained search. `NotFound` is a normal result.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RangeSelection<'a> {
    Found(&'a Station),
    NotFound,
}

impl<'a> RangeSelection<'a> {
    #[must_use]
    pub fn station(self) -> Option<&'a Station> {
        match self {
            RangeSelection::Found(station) => Some(station),
            RangeSelection::NotFound => None,
        }
    }
}

fn ensure_finite(point: Point) -> Result<(), QueryError> {
    if point.is_finite() {
        Ok(())
    } else {
        Err(QueryError::NonFiniteCoordinate {
            lat: point.lat,
            lon: point.lon,
        })
    }
}

/// Return the station closest to `query`.
///
/// Linear scan; on equal distance the earlier row wins.
///
/// # Errors
///
/// [`QueryError::EmptyCatalog`] for an empty slice, and
/// [`QueryError::NonFiniteCoordinate`] if the query or any station position
/// is NaN or infinite.
pub fn find_nearest(query: Point, catalog: &[Station]) -> Result<&Station, QueryError> {
    ensure_finite(query)?;

    let mut best: Option<(f64, &Station)> = None;
    for station in catalog {
        let d = distance(query, station.position())?;
        match best {
            Some((best_d, _)) if d >= best_d => {}
            _ => best = Some((d, station)),
        }
    }

    let (d, station) = best.ok_or(QueryError::EmptyCatalog)?;
    tracing::debug!(
        lat = query.lat,
        lon = query.lon,
        distance = d,
        "nearest station selected"
    );
    Ok(station)
}

/// Among stations within `radius` of `query` (inclusive), return the one with
/// the highest rated power. On equal power the earlier row wins.
///
/// An empty catalog simply yields [`RangeSelection::NotFound`].
///
/// # Errors
///
/// [`QueryError::InvalidRadius`] for a negative or NaN radius (checked before
/// any scan), and [`QueryError::NonFiniteCoordinate`] as for [`find_nearest`].
pub fn find_best_in_range(
    query: Point,
    catalog: &[Station],
    radius: f64,
) -> Result<RangeSelection<'_>, QueryError> {
    if radius.is_nan() || radius < 0.0 {
        return Err(QueryError::InvalidRadius(radius));
    }
    ensure_finite(query)?;

    let mut best: Option<&Station> = None;
    let mut in_range = 0usize;
    for station in catalog {
        if distance(query, station.position())? > radius {
            continue;
        }
        in_range += 1;
        // Rows with an unreadable power rating are never selected.
        if station.power_watts.is_nan() {
            continue;
        }
        match best {
            Some(current) if station.power_watts <= current.power_watts => {}
            _ => best = Some(station),
        }
    }

    tracing::debug!(
        lat = query.lat,
        lon = query.lon,
        radius,
        in_range,
        "range search finished"
    );

    Ok(best.map_or(RangeSelection::NotFound, RangeSelection::Found))
}

#[cfg(test)]
#[path = "select_test.rs"]
mod tests;
