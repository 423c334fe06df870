//! Planar distance between two coordinates.
//!
//! Latitude and longitude degrees are treated as a flat Cartesian plane: the
//! result is the Euclidean norm of the coordinate difference, in degrees. This
//! is not a great-circle distance and is geographically inaccurate away from
//! the equator and over long spans. Both selection queries and any radius a
//! caller supplies are expressed in this same unit, so the formula must stay
//! as is for results to remain comparable.

use crate::select::QueryError;
use crate::station::Point;

/// Euclidean distance `sqrt(dlat^2 + dlon^2)` in degrees.
///
/// # Errors
///
/// Returns [`QueryError::NonFiniteCoordinate`] if either point has a NaN or
/// infinite component.
pub fn distance(a: Point, b: Point) -> Result<f64, QueryError> {
    for p in [a, b] {
        if !p.is_finite() {
            return Err(QueryError::NonFiniteCoordinate {
                lat: p.lat,
                lon: p.lon,
            });
        }
    }
    Ok((a.lat - b.lat).hypot(a.lon - b.lon))
}
