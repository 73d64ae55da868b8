use async_trait::async_trait;
use reqwest::{Client, Url};
use roof_core::estimation::{
    GeoPoint, Polygon, ProviderError, ProviderOutcome, RoofProvider, SourceKind,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{check_status, transport_err};

pub const DEFAULT_LOCAL_SEGMENTATION_URL: &str = "http://localhost:8000";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalSegmentationConfig {
    pub base_url: String,
    pub enabled: bool,
}

impl Default for LocalSegmentationConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_LOCAL_SEGMENTATION_URL.to_string(),
            enabled: true,
        }
    }
}

/// Roof footprint tracing served from the local network.
pub struct LocalSegmentationProvider {
    client: Client,
    base_url: String,
}

impl LocalSegmentationProvider {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(
        client: Client,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl RoofProvider for LocalSegmentationProvider {
    fn kind(&self) -> SourceKind {
        SourceKind::LocalProvider
    }

    async fn resolve(
        &self,
        point: GeoPoint,
    ) -> Result<ProviderOutcome, ProviderError> {
        let endpoint = format!("{}/segment", self.base_url.trim_end_matches('/'));
        let url = Url::parse_with_params(
            &endpoint,
            &[("lat", point.lat.to_string()), ("lng", point.lng.to_string())],
        )
        .map_err(|e| ProviderError::NotConfigured(format!("invalid base url '{}': {}", self.base_url, e)))?;

        debug!(%url, "requesting local segmentation");
        let response = self.client.get(url).send().await.map_err(transport_err)?;
        let body = check_status(response)
            .await?
            .text()
            .await
            .map_err(transport_err)?;

        parse_segmentation(&body)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SegmentationResponse {
    #[serde(default)]
    roof_segment_stats: Vec<SegmentEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SegmentEntry {
    #[serde(default)]
    bounding_polygon: Vec<Vertex>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
struct Vertex {
    #[serde(alias = "latitude")]
    lat: f64,
    #[serde(alias = "longitude")]
    lng: f64,
}

/// Reads a `/segment` response; the first segment's polygon is the
/// footprint.
pub fn parse_segmentation(body: &str) -> Result<ProviderOutcome, ProviderError> {
    let response: SegmentationResponse =
        serde_json::from_str(body).map_err(|e| ProviderError::Decode(e.to_string()))?;

    let first = response
        .roof_segment_stats
        .into_iter()
        .next()
        .ok_or_else(|| ProviderError::MissingData("roofSegmentStats".to_string()))?;

    let vertices = first
        .bounding_polygon
        .into_iter()
        .map(|v| GeoPoint::new(v.lat, v.lng))
        .collect();

    Ok(ProviderOutcome::local(Polygon::new(vertices)?))
}
