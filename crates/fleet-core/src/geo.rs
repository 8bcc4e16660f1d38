//! Geographic coordinate type and the distance metrics used by the engine.
//!
//! `GeoPoint` uses `f64` latitude/longitude.  The heatmap rounds positions
//! to five decimal places (~1 m), which is beyond what `f32` can represent
//! reliably at city latitudes.
//!
//! Three metrics coexist on purpose and must not be swapped for each other:
//!
//! | Metric                        | Used by                              |
//! |-------------------------------|--------------------------------------|
//! | [`GeoPoint::distance_m`]      | ETA, stepper movement, node snapping |
//! | [`GeoPoint::degree_distance`] | A* heuristic (reference behaviour)   |
//! | [`GeoPoint::manhattan_deg`]   | Pairing matcher                      |

use serde::{Deserialize, Serialize};

/// Mean Earth radius in metres.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// A WGS-84 geographic coordinate.
#[derive(Copy, Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    #[inline]
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Haversine great-circle distance in metres.
    pub fn distance_m(self, other: GeoPoint) -> f64 {
        let d_lat = (other.lat - self.lat).to_radians();
        let d_lon = (other.lon - self.lon).to_radians();

        let lat1 = self.lat.to_radians();
        let lat2 = other.lat.to_radians();

        let a = (d_lat * 0.5).sin().powi(2)
            + lat1.cos() * lat2.cos() * (d_lon * 0.5).sin().powi(2);

        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
        EARTH_RADIUS_M * c
    }

    /// Straight-line Euclidean distance in degree space.
    ///
    /// Not a geodesic and not in metres.
    #[inline]
    pub fn degree_distance(self, other: GeoPoint) -> f64 {
        let d_lat = self.lat - other.lat;
        let d_lon = self.lon - other.lon;
        (d_lat * d_lat + d_lon * d_lon).sqrt()
    }

    /// L1 distance in degree space.
    #[inline]
    pub fn manhattan_deg(self, other: GeoPoint) -> f64 {
        (self.lat - other.lat).abs() + (self.lon - other.lon).abs()
    }

    /// Position on the unit sphere.
    ///
    /// Chord length between two unit vectors is monotone in great-circle
    /// distance, so a Euclidean nearest-neighbour search over these vectors
    /// returns the geodesically nearest point.
    pub fn unit_vector(self) -> [f64; 3] {
        let lat = self.lat.to_radians();
        let lon = self.lon.to_radians();
        [lat.cos() * lon.cos(), lat.cos() * lon.sin(), lat.sin()]
    }

    /// Discretize to a heatmap cell rounded to `decimals` decimal places.
    pub fn cell(self, decimals: u8) -> CellKey {
        let scale = 10f64.powi(decimals as i32);
        CellKey {
            lat: (self.lat * scale).round() as i64,
            lon: (self.lon * scale).round() as i64,
        }
    }
}

impl std::fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lat, self.lon)
    }
}

/// A rounded coordinate, stored as integers scaled by `10^decimals`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellKey {
    pub lat: i64,
    pub lon: i64,
}

impl CellKey {
    /// The cell's representative coordinate.
    pub fn center(self, decimals: u8) -> GeoPoint {
        let scale = 10f64.powi(decimals as i32);
        GeoPoint::new(self.lat as f64 / scale, self.lon as f64 / scale)
    }
}
