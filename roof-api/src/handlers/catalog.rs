//! Pricing bundle, product and setting administration.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use roof_core::{
    NewProduct, PricingBundle, PricingUnit, Product, ProductUpdate, RepositoryError, Setting,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::error::ApiError;
use crate::state::AppState;

const PRODUCT_NOT_FOUND: &str = "Producto no encontrado";
const SETTING_NOT_FOUND: &str = "Configuración no encontrada";
const REQUIRED_PRODUCT_FIELDS: &str = "Campos requeridos: slug, name, unit, price";

fn product_not_found(err: RepositoryError) -> ApiError {
    match err {
        RepositoryError::NotFound => ApiError::NotFound(PRODUCT_NOT_FOUND.to_string()),
        other => other.into(),
    }
}

fn setting_not_found(err: RepositoryError) -> ApiError {
    match err {
        RepositoryError::NotFound => ApiError::NotFound(SETTING_NOT_FOUND.to_string()),
        other => other.into(),
    }
}

pub async fn get_pricing(State(state): State<Arc<AppState>>) -> Result<Json<PricingBundle>, ApiError> {
    Ok(Json(state.repository.pricing_bundle().await?))
}

// ── products ────────────────────────────────────────────────────────────

pub async fn list_products(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Product>>, ApiError> {
    Ok(Json(state.repository.list_products().await?))
}

pub async fn get_product(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Product>, ApiError> {
    let product = state
        .repository
        .get_product(id)
        .await
        .map_err(product_not_found)?;
    Ok(Json(product))
}

/// Body of `POST /api/products`. Every field is optional here so that a
/// missing one is reported as a validation error rather than a decode error.
#[derive(Debug, Default, Deserialize)]
pub struct CreateProductRequest {
    pub slug: Option<String>,
    pub name: Option<String>,
    #[serde(default)]
    pub description: String,
    pub unit: Option<String>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub price: Option<Decimal>,
}

impl CreateProductRequest {
    fn into_new_product(self) -> Result<NewProduct, ApiError> {
        let (Some(slug), Some(name), Some(unit), Some(price)) =
            (self.slug, self.name, self.unit, self.price)
        else {
            return Err(ApiError::Validation(REQUIRED_PRODUCT_FIELDS.to_string()));
        };
        if slug.is_empty() || name.is_empty() || unit.is_empty() {
            return Err(ApiError::Validation(REQUIRED_PRODUCT_FIELDS.to_string()));
        }

        let unit = PricingUnit::parse(&unit).ok_or_else(|| {
            ApiError::Validation(format!("unit must be 'sqft' or 'flat', got '{}'", unit))
        })?;

        let product = NewProduct {
            slug,
            name,
            description: self.description,
            unit,
            price,
        };
        product
            .validate()
            .map_err(|errors| ApiError::Validation(errors.join("; ")))?;
        Ok(product)
    }
}

pub async fn create_product(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<Product>), ApiError> {
    let product = req.into_new_product()?;
    let slug = product.slug.clone();

    let created = state
        .repository
        .create_product(product)
        .await
        .map_err(|err| match err {
            RepositoryError::Conflict(_) => {
                ApiError::Conflict(format!("Ya existe un producto con slug \"{}\"", slug))
            }
            other => other.into(),
        })?;

    info!(id = created.id, slug = %created.slug, "product created");
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update_product(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(update): Json<ProductUpdate>,
) -> Result<Json<Product>, ApiError> {
    update
        .validate()
        .map_err(|errors| ApiError::Validation(errors.join("; ")))?;

    let updated = state
        .repository
        .update_product(id, &update)
        .await
        .map_err(product_not_found)?;

    info!(id, slug = %updated.slug, "product updated");
    Ok(Json(updated))
}

#[derive(Debug, Serialize)]
pub struct DeletedProduct {
    pub message: String,
    pub product: Product,
}

pub async fn delete_product(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<DeletedProduct>, ApiError> {
    let product = state
        .repository
        .delete_product(id)
        .await
        .map_err(product_not_found)?;

    info!(id, slug = %product.slug, "product deleted");
    Ok(Json(DeletedProduct {
        message: "Producto eliminado".to_string(),
        product,
    }))
}

// ── settings ────────────────────────────────────────────────────────────

pub async fn list_settings(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Setting>>, ApiError> {
    Ok(Json(state.repository.list_settings().await?))
}

pub async fn get_setting(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> Result<Json<Setting>, ApiError> {
    let setting = state
        .repository
        .get_setting(&key)
        .await
        .map_err(setting_not_found)?;
    Ok(Json(setting))
}

#[derive(Debug, Default, Deserialize)]
pub struct SettingUpdateRequest {
    #[serde(default)]
    pub value: Option<Value>,
}

impl SettingUpdateRequest {
    /// Settings are stored as text; numbers are kept in their JSON spelling.
    fn stored_value(&self) -> Result<String, ApiError> {
        match &self.value {
            Some(Value::String(s)) => Ok(s.clone()),
            Some(Value::Number(n)) => Ok(n.to_string()),
            Some(Value::Bool(b)) => Ok(b.to_string()),
            Some(Value::Null) | None => Err(ApiError::Validation("Campo requerido: value".to_string())),
            Some(_) => Err(ApiError::Validation(
                "value must be a number or a string".to_string(),
            )),
        }
    }
}

pub async fn update_setting(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
    Json(req): Json<SettingUpdateRequest>,
) -> Result<Json<Setting>, ApiError> {
    let value = req.stored_value()?;

    let updated = state
        .repository
        .update_setting(&key, &value)
        .await
        .map_err(setting_not_found)?;

    info!(key = %updated.key, value = %updated.value, "setting updated");
    Ok(Json(updated))
}
