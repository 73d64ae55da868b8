//! HTTP API for roof estimates and the pricing catalog.

pub mod config;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod state;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use error::ApiError;
pub use state::{AppState, build_provider_chain};

use handlers::{catalog, estimate};

pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(handlers::health))
        // Catalog
        .route("/api/pricing", get(catalog::get_pricing))
        .route(
            "/api/products",
            get(catalog::list_products).post(catalog::create_product),
        )
        .route(
            "/api/products/:id",
            get(catalog::get_product)
                .put(catalog::update_product)
                .delete(catalog::delete_product),
        )
        .route("/api/settings", get(catalog::list_settings))
        .route(
            "/api/settings/:key",
            get(catalog::get_setting).put(catalog::update_setting),
        )
        // Estimation
        .route("/api/estimate/point", post(estimate::estimate_point))
        .route("/api/estimate/polygon", post(estimate::estimate_polygon))
        .route("/api/estimate/bounds", post(estimate::estimate_bounds))
        .route("/api/quote", post(estimate::quote))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
