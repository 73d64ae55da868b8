use serde::Serialize;

use super::geo::{BoundingBox, EARTH_RADIUS_M, GeoPoint, GeometryError, square_meters_to_feet};

/// Closed ring of at least three vertices. The closing edge back to the
/// first vertex is implicit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Polygon {
    vertices: Vec<GeoPoint>,
}

impl Polygon {
    /// Builds a polygon from an ordered vertex list.
    ///
    /// A trailing vertex equal to the first one (an explicitly closed ring,
    /// as GeoJSON writes them) is dropped before counting.
    pub fn new(mut vertices: Vec<GeoPoint>) -> Result<Self, GeometryError> {
        if vertices.len() > 1 && vertices.first() == vertices.last() {
            vertices.pop();
        }

        if vertices.len() < 3 {
            return Err(GeometryError::TooFewVertices(vertices.len()));
        }

        for vertex in &vertices {
            vertex.validate()?;
        }

        Ok(Self { vertices })
    }

    pub fn vertices(&self) -> &[GeoPoint] {
        &self.vertices
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    /// Always false; kept for the `len` convention.
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Inserts `point` before `index`. `index == len()` appends.
    pub fn insert_vertex(
        &mut self,
        index: usize,
        point: GeoPoint,
    ) -> Result<(), GeometryError> {
        if index > self.vertices.len() {
            return Err(GeometryError::VertexOutOfRange {
                index,
                len: self.vertices.len(),
            });
        }
        point.validate()?;
        self.vertices.insert(index, point);
        Ok(())
    }

    pub fn move_vertex(
        &mut self,
        index: usize,
        point: GeoPoint,
    ) -> Result<(), GeometryError> {
        let len = self.vertices.len();
        point.validate()?;
        let vertex = self
            .vertices
            .get_mut(index)
            .ok_or(GeometryError::VertexOutOfRange { index, len })?;
        *vertex = point;
        Ok(())
    }

    /// Signed spherical area in square meters; positive for
    /// counter-clockwise rings.
    ///
    /// Sums the signed area of the polar triangle formed by each edge and
    /// the north pole.
    pub fn signed_area_sq_m(&self) -> f64 {
        let Some(last) = self.vertices.last() else {
            return 0.0;
        };

        let tan_half_colat = |p: &GeoPoint| ((std::f64::consts::FRAC_PI_2 - p.lat.to_radians()) / 2.0).tan();

        let mut total = 0.0;
        let mut prev_tan = tan_half_colat(last);
        let mut prev_lng = last.lng.to_radians();

        for vertex in &self.vertices {
            let tan = tan_half_colat(vertex);
            let lng = vertex.lng.to_radians();
            total += polar_triangle_area(tan, lng, prev_tan, prev_lng);
            prev_tan = tan;
            prev_lng = lng;
        }

        total * EARTH_RADIUS_M * EARTH_RADIUS_M
    }

    pub fn area_sq_m(&self) -> f64 {
        self.signed_area_sq_m().abs()
    }

    pub fn area_sq_ft(&self) -> f64 {
        square_meters_to_feet(self.area_sq_m())
    }
}

fn polar_triangle_area(
    tan1: f64,
    lng1: f64,
    tan2: f64,
    lng2: f64,
) -> f64 {
    let d_lng = lng1 - lng2;
    let t = tan1 * tan2;
    2.0 * (t * d_lng.sin()).atan2(1.0 + t * d_lng.cos())
}

/// The shape a roof estimate was measured from.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RoofShape {
    Box(BoundingBox),
    Polygon(Polygon),
}

impl RoofShape {
    pub fn area_sq_ft(&self) -> f64 {
        match self {
            Self::Box(bounds) => bounds.area_sq_ft(),
            Self::Polygon(polygon) => polygon.area_sq_ft(),
        }
    }
}
