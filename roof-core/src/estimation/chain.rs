use tracing::{debug, warn};

use super::geo::GeoPoint;
use super::provider::{ProviderOutcome, RoofProvider};
use super::waste::SourceKind;

/// Result of walking the whole chain for one point.
#[derive(Debug, Clone, PartialEq)]
pub enum ChainOutcome {
    Resolved(ProviderOutcome),
    /// Every provider failed; the user has to draw the roof by hand.
    ManualDrawRequired,
}

/// Providers tried in order until one succeeds.
#[derive(Default)]
pub struct ProviderChain {
    providers: Vec<Box<dyn RoofProvider>>,
}

impl ProviderChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_provider(
        mut self,
        provider: Box<dyn RoofProvider>,
    ) -> Self {
        self.push(provider);
        self
    }

    pub fn push(
        &mut self,
        provider: Box<dyn RoofProvider>,
    ) {
        self.providers.push(provider);
    }

    pub fn kinds(&self) -> Vec<SourceKind> {
        self.providers.iter().map(|p| p.kind()).collect()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Asks each provider once, in order. Failures are logged and skipped;
    /// they never reach the caller individually.
    pub async fn resolve(
        &self,
        point: GeoPoint,
    ) -> ChainOutcome {
        for provider in &self.providers {
            let source = provider.kind();
            match provider.resolve(point).await {
                Ok(outcome) => {
                    debug!(%source, lat = point.lat, lng = point.lng, area_sq_ft = outcome.estimate.geometric_area_sq_ft, "roof resolved");
                    return ChainOutcome::Resolved(outcome);
                }
                Err(e) => {
                    warn!(%source, lat = point.lat, lng = point.lng, error = %e, "provider failed, trying next");
                }
            }
        }

        warn!(lat = point.lat, lng = point.lng, "all providers failed, manual draw required");
        ChainOutcome::ManualDrawRequired
    }
}
