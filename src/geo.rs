//! Shared geographic utility functions on a spherical earth.

use crate::types::Position;

/// Earth radius in nautical miles.
pub const EARTH_RADIUS_NM: f64 = 3440.065;

/// Feet per nautical mile.
pub const FEET_PER_NM: f64 = 6076.12;

/// Great-circle distance in nautical miles (haversine).
pub fn distance_nm(from: Position, to: Position) -> f64 {
    let lat1 = from.lat.to_radians();
    let lat2 = to.lat.to_radians();
    let delta_lat = (to.lat - from.lat).to_radians();
    let delta_lon = (to.lon - from.lon).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_NM * c
}

/// Great-circle distance in feet.
pub fn distance_ft(from: Position, to: Position) -> f64 {
    distance_nm(from, to) * FEET_PER_NM
}

/// Initial true bearing from `from` to `to`, in [0, 360).
pub fn bearing(from: Position, to: Position) -> f64 {
    let lat1 = from.lat.to_radians();
    let lat2 = to.lat.to_radians();
    let delta_lon = (to.lon - from.lon).to_radians();

    let y = delta_lon.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * delta_lon.cos();

    crate::physics::normalize_heading(y.atan2(x).to_degrees())
}

/// Point reached by travelling `distance_nm` along `heading` from `origin`.
pub fn destination(origin: Position, heading: f64, distance_nm: f64) -> Position {
    let angular = distance_nm / EARTH_RADIUS_NM;
    let theta = heading.to_radians();
    let lat1 = origin.lat.to_radians();
    let lon1 = origin.lon.to_radians();

    let lat2 = (lat1.sin() * angular.cos() + lat1.cos() * angular.sin() * theta.cos()).asin();
    let lon2 = lon1
        + (theta.sin() * angular.sin() * lat1.cos()).atan2(angular.cos() - lat1.sin() * lat2.sin());

    Position {
        lat: lat2.to_degrees(),
        lon: (lon2.to_degrees() + 540.0).rem_euclid(360.0) - 180.0,
    }
}

/// Same as [`destination`] with the distance given in feet.
pub fn offset_ft(origin: Position, heading: f64, distance_ft: f64) -> Position {
    destination(origin, heading, distance_ft / FEET_PER_NM)
}

/// Signed perpendicular offset in feet of `point` from the track `start -> end`.
/// Positive means the point lies right of the track.
///
/// Uses a local flat projection around `start`, which is accurate at airport scale.
pub fn cross_track_ft(point: Position, start: Position, end: Position) -> f64 {
    let (tx, ty) = local_offset_ft(start, end);
    let (px, py) = local_offset_ft(start, point);
    let length = (tx * tx + ty * ty).sqrt();
    if length < f64::EPSILON {
        return 0.0;
    }
    // east/north axes: a point right of a northbound track has positive x
    (px * ty - py * tx) / length
}

/// Signed distance in feet of `point` along the track `start -> end`, measured from `start`.
pub fn along_track_ft(point: Position, start: Position, end: Position) -> f64 {
    let (tx, ty) = local_offset_ft(start, end);
    let (px, py) = local_offset_ft(start, point);
    let length = (tx * tx + ty * ty).sqrt();
    if length < f64::EPSILON {
        return 0.0;
    }
    (px * tx + py * ty) / length
}

/// East/north offset of `to` from `from` in feet.
fn local_offset_ft(from: Position, to: Position) -> (f64, f64) {
    let feet_per_degree = FEET_PER_NM * 60.0;
    let east = (to.lon - from.lon) * feet_per_degree * from.lat.to_radians().cos();
    let north = (to.lat - from.lat) * feet_per_degree;
    (east, north)
}
