//! Spherical geometry for roof-scale shapes.
//!
//! Distances use the haversine formula and areas use spherical excess, both
//! on a sphere of radius [`EARTH_RADIUS_M`]. Good enough for a single roof,
//! not for anything city-sized.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Equatorial radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_378_137.0;

/// Square feet in one square meter.
pub const SQ_FT_PER_SQ_M: f64 = 10.7639;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    #[error("invalid coordinate ({lat}, {lng})")]
    InvalidCoordinate { lat: f64, lng: f64 },

    #[error("a polygon needs at least 3 vertices, got {0}")]
    TooFewVertices(usize),

    #[error("vertex index {index} out of range for a polygon of {len} vertices")]
    VertexOutOfRange { index: usize, len: usize },
}

pub fn square_meters_to_feet(area_sq_m: f64) -> f64 {
    area_sq_m * SQ_FT_PER_SQ_M
}

/// A latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub const fn new(
        lat: f64,
        lng: f64,
    ) -> Self {
        Self { lat, lng }
    }

    /// Rejects non-finite values and latitudes/longitudes outside the
    /// usual degree ranges.
    pub fn validate(&self) -> Result<(), GeometryError> {
        let in_range = self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng);

        if in_range {
            Ok(())
        } else {
            Err(GeometryError::InvalidCoordinate {
                lat: self.lat,
                lng: self.lng,
            })
        }
    }

    /// Great-circle distance in meters.
    pub fn distance_to(
        &self,
        other: &GeoPoint,
    ) -> f64 {
        let lat1 = self.lat.to_radians();
        let lat2 = other.lat.to_radians();
        let d_lat = lat2 - lat1;
        let d_lng = (other.lng - self.lng).to_radians();

        let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_M * h.sqrt().min(1.0).asin()
    }
}

/// Axis-aligned box given by its north-east and south-west corners.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub north_east: GeoPoint,
    pub south_west: GeoPoint,
}

impl BoundingBox {
    pub const fn new(
        north_east: GeoPoint,
        south_west: GeoPoint,
    ) -> Self {
        Self {
            north_east,
            south_west,
        }
    }

    pub fn validate(&self) -> Result<(), GeometryError> {
        self.north_east.validate()?;
        self.south_west.validate()
    }

    /// Smallest box containing every given box, or `None` for no boxes.
    pub fn envelope<'a>(boxes: impl IntoIterator<Item = &'a BoundingBox>) -> Option<Self> {
        boxes.into_iter().copied().reduce(|acc, b| Self {
            north_east: GeoPoint::new(
                acc.north_east.lat.max(b.north_east.lat),
                acc.north_east.lng.max(b.north_east.lng),
            ),
            south_west: GeoPoint::new(
                acc.south_west.lat.min(b.south_west.lat),
                acc.south_west.lng.min(b.south_west.lng),
            ),
        })
    }

    /// North-south edge length in meters, measured along the east edge.
    pub fn height_m(&self) -> f64 {
        self.north_east
            .distance_to(&GeoPoint::new(self.south_west.lat, self.north_east.lng))
    }

    /// East-west edge length in meters, measured at the north-east latitude.
    pub fn width_m(&self) -> f64 {
        self.north_east
            .distance_to(&GeoPoint::new(self.north_east.lat, self.south_west.lng))
    }

    pub fn area_sq_m(&self) -> f64 {
        self.height_m() * self.width_m()
    }

    pub fn area_sq_ft(&self) -> f64 {
        square_meters_to_feet(self.area_sq_m())
    }

    pub fn is_degenerate(&self) -> bool {
        self.north_east.lat == self.south_west.lat || self.north_east.lng == self.south_west.lng
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn approx(
        actual: f64,
        expected: f64,
        tolerance: f64,
    ) {
        assert!(
            (actual - expected).abs() <= tolerance,
            "expected {expected} ± {tolerance}, got {actual}"
        );
    }

    #[test]
    fn distance_to_self_is_zero() {
        let p = GeoPoint::new(18.2208, -66.5901);
        assert_eq!(p.distance_to(&p), 0.0);
    }

    #[test]
    fn one_degree_of_latitude_is_about_111_km() {
        let a = GeoPoint::new(0.0, 0.0);
        let b = GeoPoint::new(1.0, 0.0);
        approx(a.distance_to(&b), EARTH_RADIUS_M * 1f64.to_radians(), 1e-6);
    }

    #[test]
    fn box_area_is_height_times_width_in_square_feet() {
        let bounds = BoundingBox::new(
            GeoPoint::new(18.2210, -66.5899),
            GeoPoint::new(18.2206, -66.5903),
        );

        let expected = bounds.height_m() * bounds.width_m() * SQ_FT_PER_SQ_M;

        approx(bounds.area_sq_ft(), expected, 1e-9);
        // 0.0004° is roughly 44.5 m north-south and 42.3 m east-west here.
        approx(bounds.height_m(), 44.528, 0.01);
        approx(bounds.width_m(), 42.29, 0.05);
    }

    #[test]
    fn degenerate_box_has_zero_area() {
        let flat = BoundingBox::new(
            GeoPoint::new(18.2210, -66.5899),
            GeoPoint::new(18.2210, -66.5903),
        );

        assert!(flat.is_degenerate());
        assert_eq!(flat.area_sq_ft(), 0.0);
    }

    #[test]
    fn envelope_covers_all_boxes() {
        let a = BoundingBox::new(GeoPoint::new(2.0, 2.0), GeoPoint::new(1.0, 1.0));
        let b = BoundingBox::new(GeoPoint::new(3.0, 1.5), GeoPoint::new(0.5, -1.0));

        let env = BoundingBox::envelope([&a, &b]).unwrap();

        assert_eq!(env.north_east, GeoPoint::new(3.0, 2.0));
        assert_eq!(env.south_west, GeoPoint::new(0.5, -1.0));
        assert_eq!(BoundingBox::envelope([]), None);
    }

    #[test]
    fn validate_rejects_out_of_range_points() {
        assert!(GeoPoint::new(18.2, -66.5).validate().is_ok());
        assert!(GeoPoint::new(91.0, 0.0).validate().is_err());
        assert!(GeoPoint::new(0.0, f64::NAN).validate().is_err());
    }
}
