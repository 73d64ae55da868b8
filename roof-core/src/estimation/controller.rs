//! Application state for one estimation session.
//!
//! The controller owns the mode, the active overlay, the last estimate and
//! a pricing snapshot. Every operation returns the event the presentation
//! layer should react to instead of calling back into it.
//!
//! Provider lookups are asynchronous, so a point request is split in two:
//! [`EstimationController::begin_request`] hands out a [`RequestTicket`]
//! stamped with the current generation, and
//! [`EstimationController::apply_outcome`] only accepts the ticket if no
//! newer user action has happened since.

use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use super::chain::{ChainOutcome, ProviderChain};
use super::estimate::RoofEstimate;
use super::geo::{BoundingBox, GeoPoint, GeometryError};
use super::provider::OverlaySet;
use super::shape::{Polygon, RoofShape};
use super::waste::SourceKind;
use crate::models::PricingBundle;

/// Shown when no provider could find a roof at the requested point.
pub const MANUAL_DRAW_NOTICE: &str = "No pudimos detectar el techo en este punto. \
     Por favor usa el botón 'Dibujar Manual' para trazarlo tú mismo.";

/// Product whose unit price is shown next to an estimate by default.
pub const DEFAULT_COATING_SLUG: &str = "silicona";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Clicks resolve through the provider chain.
    #[default]
    Auto,
    /// The user draws and edits a polygon.
    Manual,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ControllerError {
    #[error("manual mode is not active")]
    NotInManualMode,

    #[error("there is no manually drawn polygon to edit")]
    NoEditablePolygon,

    #[error("there is no provider bounding box to adjust")]
    NoAdjustableBounds,

    #[error(transparent)]
    Geometry(#[from] GeometryError),
}

/// Estimate plus the prices needed to display it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EstimateView {
    pub estimate: RoofEstimate,
    pub coating_slug: String,
    /// `None` when the coating is missing from the pricing snapshot.
    #[serde(with = "rust_decimal::serde::float_option")]
    pub unit_price: Option<Decimal>,
    pub tax_rate: f64,
}

impl EstimateView {
    pub fn new(
        estimate: RoofEstimate,
        pricing: &PricingBundle,
        coating_slug: &str,
    ) -> Self {
        Self {
            estimate,
            coating_slug: coating_slug.to_string(),
            unit_price: pricing.unit_price(coating_slug),
            tax_rate: pricing.tax_rate(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EstimationEvent {
    EstimateUpdated(EstimateView),
    ManualDrawRequested { notice: String },
}

/// Proof that a point request was started at a given generation.
///
/// Not `Clone`: each ticket can be applied once.
#[derive(Debug, PartialEq)]
pub struct RequestTicket {
    generation: u64,
    point: GeoPoint,
}

impl RequestTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn point(&self) -> GeoPoint {
        self.point
    }
}

#[derive(Debug, Clone)]
pub struct EstimationController {
    mode: Mode,
    generation: u64,
    overlay: Option<OverlaySet>,
    last_estimate: Option<RoofEstimate>,
    pricing: PricingBundle,
    coating_slug: String,
}

impl Default for EstimationController {
    fn default() -> Self {
        Self::new(PricingBundle::default(), DEFAULT_COATING_SLUG)
    }
}

impl EstimationController {
    pub fn new(
        pricing: PricingBundle,
        coating_slug: impl Into<String>,
    ) -> Self {
        Self {
            mode: Mode::Auto,
            generation: 0,
            overlay: None,
            last_estimate: None,
            pricing,
            coating_slug: coating_slug.into(),
        }
    }

    // ── accessors ────────────────────────────────────────────────────────

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn overlay(&self) -> Option<&OverlaySet> {
        self.overlay.as_ref()
    }

    pub fn last_estimate(&self) -> Option<&RoofEstimate> {
        self.last_estimate.as_ref()
    }

    pub fn pricing(&self) -> &PricingBundle {
        &self.pricing
    }

    pub fn coating_slug(&self) -> &str {
        &self.coating_slug
    }

    pub fn set_pricing(
        &mut self,
        pricing: PricingBundle,
    ) {
        self.pricing = pricing;
    }

    /// The last estimate with current prices, if any.
    pub fn current_view(&self) -> Option<EstimateView> {
        self.last_estimate
            .map(|estimate| EstimateView::new(estimate, &self.pricing, &self.coating_slug))
    }

    // ── point requests ───────────────────────────────────────────────────

    /// Starts a new point request. Any ticket handed out earlier is now stale.
    pub fn begin_request(
        &mut self,
        point: GeoPoint,
    ) -> RequestTicket {
        self.generation += 1;
        RequestTicket {
            generation: self.generation,
            point,
        }
    }

    /// Applies a chain result. Returns `None` without touching any state
    /// when the ticket is stale.
    pub fn apply_outcome(
        &mut self,
        ticket: RequestTicket,
        outcome: ChainOutcome,
    ) -> Option<EstimationEvent> {
        if ticket.generation != self.generation {
            debug!(
                ticket = ticket.generation,
                current = self.generation,
                "discarding stale provider result"
            );
            return None;
        }

        match outcome {
            ChainOutcome::Resolved(resolved) => {
                self.mode = Mode::Auto;
                self.retire_overlay();
                self.overlay = Some(resolved.overlay);
                Some(self.publish(resolved.estimate))
            }
            ChainOutcome::ManualDrawRequired => {
                self.mode = Mode::Manual;
                self.retire_overlay();
                Some(EstimationEvent::ManualDrawRequested {
                    notice: MANUAL_DRAW_NOTICE.to_string(),
                })
            }
        }
    }

    /// `begin_request`, the chain walk and `apply_outcome` in one call.
    pub async fn resolve_point(
        &mut self,
        chain: &ProviderChain,
        point: GeoPoint,
    ) -> Option<EstimationEvent> {
        let ticket = self.begin_request(point);
        let outcome = chain.resolve(point).await;
        self.apply_outcome(ticket, outcome)
    }

    // ── provider box edits ───────────────────────────────────────────────

    /// Replaces the remote provider's aggregate box with `bounds` and
    /// re-estimates from the box area. Complexity stays at the surveyed
    /// segment count.
    pub fn adjust_bounds(
        &mut self,
        bounds: BoundingBox,
    ) -> Result<EstimationEvent, ControllerError> {
        bounds.validate()?;

        let complexity = match (&mut self.overlay, &self.last_estimate) {
            (Some(overlay), Some(estimate)) if estimate.source == SourceKind::RemoteProvider => {
                match &mut overlay.primary {
                    RoofShape::Box(current) => {
                        *current = bounds;
                        estimate.complexity_score
                    }
                    RoofShape::Polygon(_) => return Err(ControllerError::NoAdjustableBounds),
                }
            }
            _ => return Err(ControllerError::NoAdjustableBounds),
        };

        let estimate =
            RoofEstimate::from_area(bounds.area_sq_ft(), SourceKind::RemoteProvider, complexity)
                .user_adjusted();
        Ok(self.publish(estimate))
    }

    // ── manual mode ──────────────────────────────────────────────────────

    /// Entering manual mode clears the active shapes and invalidates any
    /// in-flight point request. Leaving it keeps the drawn polygon.
    pub fn set_manual_mode(
        &mut self,
        manual: bool,
    ) {
        if manual {
            self.generation += 1;
            self.retire_overlay();
            self.mode = Mode::Manual;
        } else {
            self.mode = Mode::Auto;
        }
    }

    pub fn toggle_manual_mode(&mut self) -> Mode {
        self.set_manual_mode(self.mode == Mode::Auto);
        self.mode
    }

    /// Installs a freshly drawn polygon and estimates it.
    pub fn complete_polygon(
        &mut self,
        vertices: Vec<GeoPoint>,
    ) -> Result<EstimationEvent, ControllerError> {
        if self.mode != Mode::Manual {
            return Err(ControllerError::NotInManualMode);
        }
        let polygon = Polygon::new(vertices)?;

        self.generation += 1;
        self.retire_overlay();
        let estimate = manual_estimate(&polygon);
        self.overlay = Some(OverlaySet {
            primary: RoofShape::Polygon(polygon),
            segments: Vec::new(),
        });
        Ok(self.publish(estimate))
    }

    /// Vertex edits need manual mode and a hand-drawn polygon. A polygon kept
    /// after leaving manual mode stays on screen read-only; re-entering manual
    /// mode clears it for a fresh drawing.
    pub fn insert_vertex(
        &mut self,
        index: usize,
        point: GeoPoint,
    ) -> Result<EstimationEvent, ControllerError> {
        self.edit_polygon(|polygon| polygon.insert_vertex(index, point))
    }

    pub fn move_vertex(
        &mut self,
        index: usize,
        point: GeoPoint,
    ) -> Result<EstimationEvent, ControllerError> {
        self.edit_polygon(|polygon| polygon.move_vertex(index, point))
    }

    fn edit_polygon(
        &mut self,
        edit: impl FnOnce(&mut Polygon) -> Result<(), GeometryError>,
    ) -> Result<EstimationEvent, ControllerError> {
        let drawn = self
            .last_estimate
            .is_some_and(|e| e.source == SourceKind::ManualDraw);
        if !drawn {
            return Err(ControllerError::NoEditablePolygon);
        }
        if self.mode != Mode::Manual {
            return Err(ControllerError::NotInManualMode);
        }

        let Some(OverlaySet {
            primary: RoofShape::Polygon(polygon),
            ..
        }) = &mut self.overlay
        else {
            return Err(ControllerError::NoEditablePolygon);
        };

        edit(polygon)?;
        let estimate = manual_estimate(polygon);
        Ok(self.publish(estimate))
    }

    // ── internals ────────────────────────────────────────────────────────

    fn retire_overlay(&mut self) {
        if let Some(previous) = self.overlay.take() {
            debug!(segments = previous.segments.len(), "retiring overlay");
        }
        self.last_estimate = None;
    }

    fn publish(
        &mut self,
        estimate: RoofEstimate,
    ) -> EstimationEvent {
        self.last_estimate = Some(estimate);
        EstimationEvent::EstimateUpdated(EstimateView::new(estimate, &self.pricing, &self.coating_slug))
    }
}

fn manual_estimate(polygon: &Polygon) -> RoofEstimate {
    RoofEstimate::from_area(polygon.area_sq_ft(), SourceKind::ManualDraw, 1)
}
