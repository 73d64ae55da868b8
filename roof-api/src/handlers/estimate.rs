//! Roof estimates and quotes.
//!
//! Each request runs through a fresh [`EstimationController`] seeded with the
//! current pricing snapshot, so the HTTP surface is stateless.

use std::sync::Arc;

use axum::{Json, extract::State};
use roof_core::estimation::{
    BoundingBox, ChainOutcome, EstimateView, EstimationController, EstimationEvent, GeoPoint,
    OverlaySet, ProviderOutcome, RoofEstimate, RoofShape, SourceKind,
};
use roof_core::quote::{QuoteBreakdown, QuoteCalculator, QuoteRequest};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PointEstimateResponse {
    Resolved {
        estimate: EstimateView,
        overlay: Option<OverlaySet>,
    },
    ManualDrawRequired {
        notice: String,
    },
}

#[derive(Debug, Serialize)]
pub struct EstimateResponse {
    pub estimate: EstimateView,
    pub overlay: Option<OverlaySet>,
}

async fn controller(state: &AppState) -> Result<EstimationController, ApiError> {
    let pricing = state.repository.pricing_bundle().await?;
    Ok(EstimationController::new(pricing, state.coating_slug.clone()))
}

fn expect_estimate(event: EstimationEvent) -> Result<EstimateView, ApiError> {
    match event {
        EstimationEvent::EstimateUpdated(view) => Ok(view),
        EstimationEvent::ManualDrawRequested { .. } => Err(ApiError::Internal(
            "estimate produced a manual-draw prompt".to_string(),
        )),
    }
}

/// Resolves a clicked point through the provider chain.
pub async fn estimate_point(
    State(state): State<Arc<AppState>>,
    Json(point): Json<GeoPoint>,
) -> Result<Json<PointEstimateResponse>, ApiError> {
    point.validate()?;
    let mut controller = controller(&state).await?;

    let event = controller
        .resolve_point(&state.chain, point)
        .await
        .ok_or_else(|| ApiError::Internal("point request was superseded".to_string()))?;

    let response = match event {
        EstimationEvent::EstimateUpdated(estimate) => PointEstimateResponse::Resolved {
            estimate,
            overlay: controller.overlay().cloned(),
        },
        EstimationEvent::ManualDrawRequested { notice } => {
            PointEstimateResponse::ManualDrawRequired { notice }
        }
    };
    Ok(Json(response))
}

#[derive(Debug, Deserialize)]
pub struct PolygonRequest {
    pub vertices: Vec<GeoPoint>,
}

/// Measures a polygon drawn by hand.
pub async fn estimate_polygon(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PolygonRequest>,
) -> Result<Json<EstimateResponse>, ApiError> {
    let mut controller = controller(&state).await?;
    controller.set_manual_mode(true);

    let estimate = expect_estimate(controller.complete_polygon(req.vertices)?)?;
    debug!(sq_ft = estimate.estimate.geometric_area_sq_ft, "manual polygon measured");

    Ok(Json(EstimateResponse {
        estimate,
        overlay: controller.overlay().cloned(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct BoundsRequest {
    pub north_east: GeoPoint,
    pub south_west: GeoPoint,
    /// Segments in the original survey; drives the waste factor.
    pub segment_count: Option<u32>,
}

/// Re-estimates a remote survey after the user dragged its bounding box.
///
/// The survey is replayed into a fresh controller and the drag applied on
/// top, so the estimate follows the same rules as an in-session adjustment.
pub async fn estimate_bounds(
    State(state): State<Arc<AppState>>,
    Json(req): Json<BoundsRequest>,
) -> Result<Json<EstimateResponse>, ApiError> {
    let segment_count = req.segment_count.filter(|count| *count > 0).ok_or_else(|| {
        ApiError::Validation("Campo requerido: segment_count (mínimo 1)".to_string())
    })?;
    let bounds = BoundingBox::new(req.north_east, req.south_west);
    bounds.validate()?;

    let mut controller = controller(&state).await?;
    let survey = ProviderOutcome {
        estimate: RoofEstimate::from_area(
            bounds.area_sq_ft(),
            SourceKind::RemoteProvider,
            segment_count,
        ),
        overlay: OverlaySet {
            primary: RoofShape::Box(bounds),
            segments: Vec::new(),
        },
    };
    let ticket = controller.begin_request(bounds.north_east);
    controller.apply_outcome(ticket, ChainOutcome::Resolved(survey));

    let estimate = expect_estimate(controller.adjust_bounds(bounds)?)?;
    debug!(segment_count, sq_ft = estimate.estimate.geometric_area_sq_ft, "bounds adjusted");

    Ok(Json(EstimateResponse {
        estimate,
        overlay: controller.overlay().cloned(),
    }))
}

pub async fn quote(
    State(state): State<Arc<AppState>>,
    Json(req): Json<QuoteRequest>,
) -> Result<Json<QuoteBreakdown>, ApiError> {
    let pricing = state.repository.pricing_bundle().await?;
    let breakdown = QuoteCalculator::new(&pricing).calculate(&req)?;
    Ok(Json(breakdown))
}
