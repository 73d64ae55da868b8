//! HTTP clients for the roof geodata providers.
//!
//! | provider | endpoint | result |
//! |----------|----------|--------|
//! | [`SolarInsightsProvider`] | `GET {base}/buildingInsights:findClosest` | surface area, segment boxes |
//! | [`LocalSegmentationProvider`] | `GET {base}/segment?lat=..&lng=..` | footprint polygon |
//!
//! Both implement [`roof_core::estimation::RoofProvider`] and make exactly
//! one request per call.

mod local;
mod solar;

pub use local::{
    DEFAULT_LOCAL_SEGMENTATION_URL, LocalSegmentationConfig, LocalSegmentationProvider,
    parse_segmentation,
};
pub use solar::{
    DEFAULT_REQUIRED_QUALITY, DEFAULT_SOLAR_BASE_URL, SolarInsightsConfig, SolarInsightsProvider,
    parse_building_insights,
};

use roof_core::estimation::ProviderError;

/// Turns a non-2xx response into [`ProviderError::Status`], keeping the body
/// for the log line.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ProviderError::Status {
        status: status.as_u16(),
        body,
    })
}

fn transport_err(e: reqwest::Error) -> ProviderError {
    ProviderError::Transport(e.without_url().to_string())
}
