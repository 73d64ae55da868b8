use async_trait::async_trait;
use reqwest::{Client, Url};
use roof_core::estimation::{
    BoundingBox, GeoPoint, ProviderError, ProviderOutcome, RoofProvider, SourceKind,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{check_status, transport_err};

pub const DEFAULT_SOLAR_BASE_URL: &str = "https://solar.googleapis.com/v1";
pub const DEFAULT_REQUIRED_QUALITY: &str = "HIGH";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolarInsightsConfig {
    /// Without a key the provider always fails with `NotConfigured`.
    pub api_key: Option<String>,
    pub base_url: String,
    pub required_quality: String,
}

impl Default for SolarInsightsConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_SOLAR_BASE_URL.to_string(),
            required_quality: DEFAULT_REQUIRED_QUALITY.to_string(),
        }
    }
}

/// Remote building-insights lookup.
pub struct SolarInsightsProvider {
    client: Client,
    config: SolarInsightsConfig,
}

impl SolarInsightsProvider {
    pub fn new(config: SolarInsightsConfig) -> Self {
        Self::with_client(Client::new(), config)
    }

    pub fn with_client(
        client: Client,
        config: SolarInsightsConfig,
    ) -> Self {
        Self { client, config }
    }

    fn request_url(
        &self,
        point: GeoPoint,
        api_key: &str,
    ) -> Result<Url, ProviderError> {
        let endpoint = format!(
            "{}/buildingInsights:findClosest",
            self.config.base_url.trim_end_matches('/')
        );
        Url::parse_with_params(
            &endpoint,
            &[
                ("location.latitude", point.lat.to_string()),
                ("location.longitude", point.lng.to_string()),
                ("requiredQuality", self.config.required_quality.clone()),
                ("key", api_key.to_string()),
            ],
        )
        .map_err(|e| ProviderError::NotConfigured(format!("invalid base url '{}': {}", self.config.base_url, e)))
    }
}

#[async_trait]
impl RoofProvider for SolarInsightsProvider {
    fn kind(&self) -> SourceKind {
        SourceKind::RemoteProvider
    }

    async fn resolve(
        &self,
        point: GeoPoint,
    ) -> Result<ProviderOutcome, ProviderError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| ProviderError::NotConfigured("no solar API key".to_string()))?;

        let url = self.request_url(point, api_key)?;
        debug!(lat = point.lat, lng = point.lng, "requesting building insights");

        let response = self.client.get(url).send().await.map_err(transport_err)?;
        let body = check_status(response)
            .await?
            .text()
            .await
            .map_err(transport_err)?;

        parse_building_insights(&body)
    }
}

// ── wire format ──────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BuildingInsights {
    solar_potential: Option<SolarPotential>,
    bounding_box: Option<LatLngBox>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SolarPotential {
    whole_roof_stats: Option<WholeRoofStats>,
    #[serde(default)]
    roof_segment_stats: Vec<RoofSegmentStats>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WholeRoofStats {
    area_meters2: Option<f64>,
    bounding_box: Option<LatLngBox>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RoofSegmentStats {
    bounding_box: Option<LatLngBox>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
struct LatLngBox {
    ne: LatLng,
    sw: LatLng,
}

#[derive(Debug, Clone, Copy, Deserialize)]
struct LatLng {
    latitude: f64,
    longitude: f64,
}

impl From<LatLngBox> for BoundingBox {
    fn from(b: LatLngBox) -> Self {
        BoundingBox::new(
            GeoPoint::new(b.ne.latitude, b.ne.longitude),
            GeoPoint::new(b.sw.latitude, b.sw.longitude),
        )
    }
}

/// Reads a `buildingInsights` response body.
///
/// The editable aggregate box is `wholeRoofStats.boundingBox`, then the
/// top-level `boundingBox`, then the envelope of the segment boxes.
pub fn parse_building_insights(body: &str) -> Result<ProviderOutcome, ProviderError> {
    let insights: BuildingInsights =
        serde_json::from_str(body).map_err(|e| ProviderError::Decode(e.to_string()))?;

    let potential = insights
        .solar_potential
        .ok_or_else(|| ProviderError::MissingData("solarPotential".to_string()))?;
    let whole = potential
        .whole_roof_stats
        .ok_or_else(|| ProviderError::MissingData("solarPotential.wholeRoofStats".to_string()))?;
    let area_sq_m = whole.area_meters2.ok_or_else(|| {
        ProviderError::MissingData("solarPotential.wholeRoofStats.areaMeters2".to_string())
    })?;

    let segments: Vec<BoundingBox> = potential
        .roof_segment_stats
        .iter()
        .filter_map(|s| s.bounding_box.map(BoundingBox::from))
        .collect();
    for segment in &segments {
        segment.validate()?;
    }

    let aggregate = whole
        .bounding_box
        .or(insights.bounding_box)
        .map(BoundingBox::from)
        .or_else(|| BoundingBox::envelope(&segments))
        .ok_or_else(|| ProviderError::MissingData("boundingBox".to_string()))?;
    aggregate.validate()?;

    Ok(ProviderOutcome::remote(area_sq_m, aggregate, segments))
}
