//! Roof area estimation.
//!
//! A point is resolved through a [`ProviderChain`]; a drawn polygon is
//! measured directly. Either way the area goes through the waste table in
//! [`waste`] and comes out as a [`RoofEstimate`]. The
//! [`EstimationController`] ties these together for an interactive session.

pub mod chain;
pub mod controller;
pub mod estimate;
pub mod geo;
pub mod provider;
pub mod shape;
pub mod waste;

pub use chain::{ChainOutcome, ProviderChain};
pub use controller::{
    ControllerError, DEFAULT_COATING_SLUG, EstimateView, EstimationController, EstimationEvent,
    MANUAL_DRAW_NOTICE, Mode, RequestTicket,
};
pub use estimate::RoofEstimate;
pub use geo::{BoundingBox, GeoPoint, GeometryError, SQ_FT_PER_SQ_M};
pub use provider::{OverlaySet, ProviderError, ProviderOutcome, RoofProvider};
pub use shape::{Polygon, RoofShape};
pub use waste::{SourceKind, waste_factor};
