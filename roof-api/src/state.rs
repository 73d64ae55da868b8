use std::sync::Arc;

use roof_core::PricingRepository;
use roof_core::estimation::ProviderChain;
use roof_geodata::{LocalSegmentationProvider, SolarInsightsProvider};
use tracing::info;

use crate::config::ProvidersConfig;

/// Shared by every request.
pub struct AppState {
    pub repository: Arc<dyn PricingRepository>,
    pub chain: ProviderChain,
    /// Coating whose price is attached to estimates.
    pub coating_slug: String,
}

impl AppState {
    pub fn new(
        repository: Arc<dyn PricingRepository>,
        chain: ProviderChain,
        coating_slug: impl Into<String>,
    ) -> Self {
        Self {
            repository,
            chain,
            coating_slug: coating_slug.into(),
        }
    }
}

/// Remote building insights first, then the local segmentation service
/// when it is enabled.
///
/// The remote provider is always registered; without an API key it fails
/// with `NotConfigured` and the chain falls through.
pub fn build_provider_chain(config: &ProvidersConfig) -> ProviderChain {
    let mut chain =
        ProviderChain::new().with_provider(Box::new(SolarInsightsProvider::new(config.solar.clone())));

    if config.local_segmentation.enabled {
        chain.push(Box::new(LocalSegmentationProvider::new(
            config.local_segmentation.base_url.clone(),
        )));
    }

    info!(providers = ?chain.kinds(), "provider chain ready");
    chain
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use roof_core::estimation::SourceKind;

    use super::*;

    #[test]
    fn chain_orders_remote_before_local() {
        let chain = build_provider_chain(&ProvidersConfig::default());

        assert_eq!(
            chain.kinds(),
            vec![SourceKind::RemoteProvider, SourceKind::LocalProvider]
        );
    }

    #[test]
    fn disabled_local_service_is_left_out() {
        let mut config = ProvidersConfig::default();
        config.local_segmentation.enabled = false;

        let chain = build_provider_chain(&config);

        assert_eq!(chain.kinds(), vec![SourceKind::RemoteProvider]);
    }
}
