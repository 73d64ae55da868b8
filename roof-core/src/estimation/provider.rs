use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use super::estimate::RoofEstimate;
use super::geo::{BoundingBox, GeoPoint, GeometryError, square_meters_to_feet};
use super::shape::{Polygon, RoofShape};
use super::waste::SourceKind;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProviderError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Provider returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The response parsed but has no roof data for this location.
    #[error("Missing data: {0}")]
    MissingData(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Invalid geometry: {0}")]
    Geometry(#[from] GeometryError),
}

/// Shapes drawn for the active estimate.
///
/// `segments` are the per-segment boxes from a remote survey; they are
/// display-only and retired together with `primary`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverlaySet {
    pub primary: RoofShape,
    pub segments: Vec<BoundingBox>,
}

/// A provider's successful answer for one point.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProviderOutcome {
    pub estimate: RoofEstimate,
    pub overlay: OverlaySet,
}

impl ProviderOutcome {
    /// Remote survey: measured surface area plus segment boxes.
    ///
    /// Complexity is the segment count. The aggregate box is the one the
    /// user may later drag to adjust the estimate.
    pub fn remote(
        area_sq_m: f64,
        aggregate: BoundingBox,
        segments: Vec<BoundingBox>,
    ) -> Self {
        let complexity = u32::try_from(segments.len()).unwrap_or(u32::MAX);
        Self {
            estimate: RoofEstimate::from_area(
                square_meters_to_feet(area_sq_m),
                SourceKind::RemoteProvider,
                complexity,
            ),
            overlay: OverlaySet {
                primary: RoofShape::Box(aggregate),
                segments,
            },
        }
    }

    /// Local segmentation: a single footprint polygon.
    pub fn local(footprint: Polygon) -> Self {
        Self {
            estimate: RoofEstimate::from_area(footprint.area_sq_ft(), SourceKind::LocalProvider, 1),
            overlay: OverlaySet {
                primary: RoofShape::Polygon(footprint),
                segments: Vec::new(),
            },
        }
    }
}

/// One data source in the [`ProviderChain`](super::chain::ProviderChain).
///
/// Implementations make a single attempt per call and never retry.
#[async_trait]
pub trait RoofProvider: Send + Sync {
    fn kind(&self) -> SourceKind;

    async fn resolve(
        &self,
        point: GeoPoint,
    ) -> Result<ProviderOutcome, ProviderError>;
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn segment(
        north: f64,
        east: f64,
    ) -> BoundingBox {
        BoundingBox::new(
            GeoPoint::new(north, east),
            GeoPoint::new(north - 0.0001, east - 0.0001),
        )
    }

    #[test]
    fn remote_outcome_counts_segments() {
        let segments = vec![segment(18.2210, -66.5899), segment(18.2209, -66.5900), segment(18.2208, -66.5901)];
        let aggregate = BoundingBox::envelope(&segments).unwrap();

        let outcome = ProviderOutcome::remote(100.0, aggregate, segments);

        assert_eq!(outcome.estimate.geometric_area_sq_ft, 1076);
        assert_eq!(outcome.estimate.material_needed_sq_ft, 1237);
        assert_eq!(outcome.estimate.complexity_score, 3);
        assert_eq!(outcome.overlay.segments.len(), 3);
        assert_eq!(outcome.overlay.primary, RoofShape::Box(aggregate));
    }

    #[test]
    fn remote_outcome_without_segments_has_complexity_one() {
        let aggregate = segment(18.2210, -66.5899);

        let outcome = ProviderOutcome::remote(50.0, aggregate, Vec::new());

        assert_eq!(outcome.estimate.complexity_score, 1);
    }

    #[test]
    fn local_outcome_uses_flat_factor() {
        let footprint = Polygon::new(vec![
            GeoPoint::new(18.2206, -66.5903),
            GeoPoint::new(18.2206, -66.5899),
            GeoPoint::new(18.2210, -66.5899),
        ])
        .unwrap();

        let outcome = ProviderOutcome::local(footprint);

        assert_eq!(outcome.estimate.source, SourceKind::LocalProvider);
        assert_eq!(outcome.estimate.waste_factor, 1.15);
        assert!(outcome.overlay.segments.is_empty());
    }
}
