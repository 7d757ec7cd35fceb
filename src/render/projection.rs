//! Spherical Web Mercator (EPSG:3857) to WGS84 and back.

use std::f64::consts::PI;

/// Sphere radius of EPSG:3857, in metres.
pub const EARTH_RADIUS: f64 = 6_378_137.0;

/// Projected metres to `(lon, lat)` degrees.
pub fn to_lon_lat(x: f64, y: f64) -> (f64, f64) {
    let lon = (x / EARTH_RADIUS).to_degrees();
    let lat = (2.0 * (y / EARTH_RADIUS).exp().atan() - PI / 2.0).to_degrees();
    (lon, lat)
}

/// `(lon, lat)` degrees to projected metres.
pub fn from_lon_lat(lon: f64, lat: f64) -> (f64, f64) {
    let x = lon.to_radians() * EARTH_RADIUS;
    let y = (PI / 4.0 + lat.to_radians() / 2.0).tan().ln() * EARTH_RADIUS;
    (x, y)
}
