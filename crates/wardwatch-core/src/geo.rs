//! Great-circle geometry for geofence containment checks.

use crate::models::{GeoPoint, Geofence};

/// Mean Earth radius in meters (IUGG).
const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Great-circle distance between two points, in meters (haversine formula).
pub fn great_circle_distance_m(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat_a = a.lat.to_radians();
    let lat_b = b.lat.to_radians();
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat_a.cos() * lat_b.cos() * (d_lng / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_M * h.sqrt().asin()
}

/// Whether the point lies within the zone's radius.
pub fn is_inside(point: GeoPoint, zone: &Geofence) -> bool {
    great_circle_distance_m(point, zone.center) <= zone.radius_m
}

/// Whether the point lies outside the radius of *every* zone in the set.
///
/// An empty set is treated as "inside": with no zones configured, no
/// outside-zone alert can ever fire.
pub fn is_outside_all(point: GeoPoint, zones: &[Geofence]) -> bool {
    if zones.is_empty() {
        return false;
    }
    zones.iter().all(|zone| !is_inside(point, zone))
}
