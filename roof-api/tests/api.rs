//! Router tests against an in-memory SQLite catalog and stub providers.

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use http_body_util::BodyExt;
use pretty_assertions::assert_eq;
use roof_api::{AppState, build_router};
use roof_core::estimation::{
    BoundingBox, GeoPoint, MANUAL_DRAW_NOTICE, ProviderChain, ProviderError, ProviderOutcome,
    RoofProvider, SourceKind,
};
use roof_db_sqlite::SqliteRepository;
use serde_json::{Value, json};
use tower::ServiceExt;

// ── stub providers ───────────────────────────────────────────────────────

struct SurveyStub {
    area_sq_m: f64,
    segments: usize,
}

#[async_trait]
impl RoofProvider for SurveyStub {
    fn kind(&self) -> SourceKind {
        SourceKind::RemoteProvider
    }

    async fn resolve(
        &self,
        point: GeoPoint,
    ) -> Result<ProviderOutcome, ProviderError> {
        let bounds = BoundingBox::new(
            GeoPoint::new(point.lat + 0.0002, point.lng + 0.0002),
            GeoPoint::new(point.lat - 0.0002, point.lng - 0.0002),
        );
        Ok(ProviderOutcome::remote(
            self.area_sq_m,
            bounds,
            vec![bounds; self.segments],
        ))
    }
}

struct DownStub(SourceKind);

#[async_trait]
impl RoofProvider for DownStub {
    fn kind(&self) -> SourceKind {
        self.0
    }

    async fn resolve(
        &self,
        _point: GeoPoint,
    ) -> Result<ProviderOutcome, ProviderError> {
        Err(ProviderError::Transport("connection refused".to_string()))
    }
}

// ── helpers ──────────────────────────────────────────────────────────────

async fn app_with_chain(chain: ProviderChain) -> Router {
    let repo = SqliteRepository::new(":memory:")
        .await
        .expect("Failed to open in-memory database");
    repo.run_migrations().await.expect("Failed to run migrations");
    repo.seed_defaults().await.expect("Failed to seed catalog");

    build_router(Arc::new(AppState::new(Arc::new(repo), chain, "silicona")))
}

async fn app() -> Router {
    app_with_chain(ProviderChain::new()).await
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string())),
        None => builder.body(Body::empty()),
    }
    .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

fn approx(
    value: &Value,
    expected: f64,
) {
    let actual = value.as_f64().unwrap_or_else(|| panic!("not a number: {value}"));
    assert!((actual - expected).abs() < 1e-9, "{actual} != {expected}");
}

// ── health & pricing ─────────────────────────────────────────────────────

#[tokio::test]
async fn health_reports_ok() {
    let app = app().await;

    let (status, body) = send(&app, Method::GET, "/api/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn pricing_bundle_serves_seeded_catalog() {
    let app = app().await;

    let (status, body) = send(&app, Method::GET, "/api/pricing", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pricing"].as_object().unwrap().len(), 6);
    approx(&body["pricing"]["silicona"]["price"], 4.5);
    assert_eq!(body["pricing"]["cisterna"]["unit"], "flat");
    approx(&body["config"]["tax_rate"], 0.115);
    approx(&body["config"]["waste_factor"], 1.15);
}

// ── products ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_product_returns_201_and_appears_in_bundle() {
    let app = app().await;

    let (status, created) = send(
        &app,
        Method::POST,
        "/api/products",
        Some(json!({ "slug": "skylight", "name": "Tragaluz", "unit": "flat", "price": 85 })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["slug"], "skylight");
    assert_eq!(created["active"], true);

    let (_, bundle) = send(&app, Method::GET, "/api/pricing", None).await;
    approx(&bundle["pricing"]["skylight"]["price"], 85.0);
}

#[tokio::test]
async fn duplicate_slug_is_a_conflict() {
    let app = app().await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/products",
        Some(json!({ "slug": "silicona", "name": "Otra", "unit": "sqft", "price": 1 })),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Ya existe un producto con slug \"silicona\"");
}

#[tokio::test]
async fn create_product_validates_input() {
    let app = app().await;

    let (missing, body) = send(
        &app,
        Method::POST,
        "/api/products",
        Some(json!({ "slug": "ac2", "name": "AC" })),
    )
    .await;
    let (bad_slug, _) = send(
        &app,
        Method::POST,
        "/api/products",
        Some(json!({ "slug": "Bad Slug", "name": "X", "unit": "flat", "price": 1 })),
    )
    .await;

    assert_eq!(missing, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Campos requeridos: slug, name, unit, price");
    assert_eq!(bad_slug, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn update_product_is_partial() {
    let app = app().await;
    let (_, before) = send(&app, Method::GET, "/api/products/1", None).await;

    let (status, after) = send(
        &app,
        Method::PUT,
        "/api/products/1",
        Some(json!({ "price": 4.75 })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    approx(&after["price"], 4.75);
    assert_eq!(after["name"], before["name"]);
    assert_eq!(after["unit"], before["unit"]);
}

#[tokio::test]
async fn deactivated_product_leaves_the_bundle() {
    let app = app().await;

    send(&app, Method::PUT, "/api/products/5", Some(json!({ "active": false }))).await;
    let (_, bundle) = send(&app, Method::GET, "/api/pricing", None).await;
    let (_, all) = send(&app, Method::GET, "/api/products", None).await;

    assert!(bundle["pricing"].get("placas_solares").is_none());
    assert_eq!(all.as_array().unwrap().len(), 6);
}

#[tokio::test]
async fn delete_product_returns_the_deleted_row() {
    let app = app().await;

    let (status, body) = send(&app, Method::DELETE, "/api/products/6", None).await;
    let (after, missing) = send(&app, Method::GET, "/api/products/6", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Producto eliminado");
    assert_eq!(body["product"]["slug"], "ac");
    assert_eq!(after, StatusCode::NOT_FOUND);
    assert_eq!(missing["error"], "Producto no encontrado");
}

#[tokio::test]
async fn unknown_product_update_is_404() {
    let app = app().await;

    let (status, _) = send(
        &app,
        Method::PUT,
        "/api/products/999",
        Some(json!({ "price": 1 })),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ── settings ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn update_setting_accepts_a_number() {
    let app = app().await;

    let (status, body) = send(
        &app,
        Method::PUT,
        "/api/settings/tax_rate",
        Some(json!({ "value": 0.105 })),
    )
    .await;
    let (_, bundle) = send(&app, Method::GET, "/api/pricing", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["value"], "0.105");
    approx(&bundle["config"]["tax_rate"], 0.105);
}

#[tokio::test]
async fn settings_are_never_created_by_update() {
    let app = app().await;

    let (status, body) = send(
        &app,
        Method::PUT,
        "/api/settings/banner",
        Some(json!({ "value": "hola" })),
    )
    .await;
    let (_, settings) = send(&app, Method::GET, "/api/settings", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Configuración no encontrada");
    assert_eq!(settings.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn update_setting_requires_value() {
    let app = app().await;

    let (status, body) = send(&app, Method::PUT, "/api/settings/tax_rate", Some(json!({}))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Campo requerido: value");
}

#[tokio::test]
async fn get_single_setting() {
    let app = app().await;

    let (status, body) = send(&app, Method::GET, "/api/settings/waste_factor", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["value"], "1.15");
    assert_eq!(body["label"], "Factor de desperdicio (15%)");
}

// ── estimates ────────────────────────────────────────────────────────────

#[tokio::test]
async fn point_resolves_through_the_remote_survey() {
    let chain = ProviderChain::new().with_provider(Box::new(SurveyStub {
        area_sq_m: 100.0,
        segments: 3,
    }));
    let app = app_with_chain(chain).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/estimate/point",
        Some(json!({ "lat": 18.2208, "lng": -66.5901 })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "resolved");
    let estimate = &body["estimate"]["estimate"];
    assert_eq!(estimate["geometric_area_sq_ft"], 1076);
    assert_eq!(estimate["material_needed_sq_ft"], 1237);
    approx(&estimate["waste_factor"], 1.15);
    assert_eq!(estimate["source"], "remote-provider");
    approx(&body["estimate"]["unit_price"], 4.5);
    assert_eq!(body["overlay"]["primary"]["kind"], "box");
    assert_eq!(body["overlay"]["segments"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn point_without_any_provider_asks_for_manual_draw() {
    let chain = ProviderChain::new()
        .with_provider(Box::new(DownStub(SourceKind::RemoteProvider)))
        .with_provider(Box::new(DownStub(SourceKind::LocalProvider)));
    let app = app_with_chain(chain).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/estimate/point",
        Some(json!({ "lat": 18.2208, "lng": -66.5901 })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "manual_draw_required");
    assert_eq!(body["notice"], MANUAL_DRAW_NOTICE);
}

#[tokio::test]
async fn out_of_range_point_is_rejected() {
    let app = app().await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/estimate/point",
        Some(json!({ "lat": 95.0, "lng": -66.5901 })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn drawn_polygon_uses_manual_waste_factor() {
    let app = app().await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/estimate/polygon",
        Some(json!({ "vertices": [
            { "lat": 18.2208, "lng": -66.5901 },
            { "lat": 18.2208, "lng": -66.5898 },
            { "lat": 18.2211, "lng": -66.5898 },
            { "lat": 18.2211, "lng": -66.5901 }
        ]})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let estimate = &body["estimate"]["estimate"];
    assert_eq!(estimate["source"], "manual-draw");
    approx(&estimate["waste_factor"], 1.2);
    let geometric = estimate["geometric_area_sq_ft"].as_u64().unwrap();
    let material = estimate["material_needed_sq_ft"].as_u64().unwrap();
    assert!(geometric > 0);
    assert_eq!(material, (geometric as f64 * 1.2).round() as u64);
    assert_eq!(body["overlay"]["primary"]["kind"], "polygon");
}

#[tokio::test]
async fn polygon_with_two_vertices_is_rejected() {
    let app = app().await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/estimate/polygon",
        Some(json!({ "vertices": [
            { "lat": 18.2208, "lng": -66.5901 },
            { "lat": 18.2211, "lng": -66.5898 }
        ]})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("3 vertices"));
}

#[tokio::test]
async fn adjusted_bounds_are_flagged() {
    let app = app().await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/estimate/bounds",
        Some(json!({
            "north_east": { "lat": 18.2210, "lng": -66.5899 },
            "south_west": { "lat": 18.2206, "lng": -66.5903 },
            "segment_count": 8
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let estimate = &body["estimate"]["estimate"];
    assert_eq!(estimate["user_adjusted"], true);
    assert_eq!(estimate["complexity_score"], 8);
    approx(&estimate["waste_factor"], 1.2075);
    assert!(estimate["material_needed_sq_ft"].as_u64() >= estimate["geometric_area_sq_ft"].as_u64());
    assert_eq!(body["overlay"]["primary"]["kind"], "box");
}

#[tokio::test]
async fn complex_adjusted_bounds_use_top_waste_tier() {
    let app = app().await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/estimate/bounds",
        Some(json!({
            "north_east": { "lat": 18.2210, "lng": -66.5899 },
            "south_west": { "lat": 18.2206, "lng": -66.5903 },
            "segment_count": 16
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let estimate = &body["estimate"]["estimate"];
    assert_eq!(estimate["user_adjusted"], true);
    assert_eq!(estimate["complexity_score"], 16);
    approx(&estimate["waste_factor"], 1.265);
}

#[tokio::test]
async fn bounds_without_segment_count_are_rejected() {
    let app = app().await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/estimate/bounds",
        Some(json!({
            "north_east": { "lat": 18.2210, "lng": -66.5899 },
            "south_west": { "lat": 18.2206, "lng": -66.5903 }
        })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("segment_count"));
}

#[tokio::test]
async fn bounds_with_zero_segments_are_rejected() {
    let app = app().await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/estimate/bounds",
        Some(json!({
            "north_east": { "lat": 18.2210, "lng": -66.5899 },
            "south_west": { "lat": 18.2206, "lng": -66.5903 },
            "segment_count": 0
        })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ── quotes ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn quote_prices_coating_and_addons_with_tax() {
    let app = app().await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/quote",
        Some(json!({
            "material_sq_ft": 1237,
            "coating_slug": "silicona",
            "addons": [{ "slug": "cisterna" }]
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    approx(&body["base_price"], 5566.5);
    approx(&body["subtotal"], 5716.5);
    approx(&body["tax"], 657.4);
    approx(&body["total"], 6373.9);
}

#[tokio::test]
async fn quote_with_unknown_addon_is_rejected() {
    let app = app().await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/quote",
        Some(json!({
            "material_sq_ft": 1000,
            "coating_slug": "silicona",
            "addons": [{ "slug": "skylight", "quantity": 1 }]
        })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("skylight"));
}

#[tokio::test]
async fn oversized_quote_is_rejected() {
    let app = app().await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/quote",
        Some(json!({
            "material_sq_ft": u64::MAX,
            "coating_slug": "silicona",
            "addons": [{ "slug": "danosa_removal", "quantity": u32::MAX }]
        })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("range"));
}
