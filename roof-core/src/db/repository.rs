use async_trait::async_trait;
use thiserror::Error;

use crate::models::{NewProduct, PricingBundle, Product, ProductUpdate, Setting};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    #[error("Record not found")]
    NotFound,

    /// A unique key (product slug) is already taken.
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

#[async_trait]
pub trait PricingRepository: Send + Sync {
    // Products
    async fn list_products(&self) -> Result<Vec<Product>, RepositoryError>;
    async fn list_active_products(&self) -> Result<Vec<Product>, RepositoryError>;
    async fn get_product(&self, id: i64) -> Result<Product, RepositoryError>;
    async fn get_product_by_slug(&self, slug: &str) -> Result<Product, RepositoryError>;

    /// Fails with [`RepositoryError::Conflict`] when the slug already exists.
    async fn create_product(&self, product: NewProduct) -> Result<Product, RepositoryError>;

    async fn update_product(
        &self,
        id: i64,
        update: &ProductUpdate,
    ) -> Result<Product, RepositoryError>;

    /// Returns the product as it was before deletion.
    async fn delete_product(&self, id: i64) -> Result<Product, RepositoryError>;

    // Settings
    async fn list_settings(&self) -> Result<Vec<Setting>, RepositoryError>;
    async fn get_setting(&self, key: &str) -> Result<Setting, RepositoryError>;

    /// Updates an existing setting. Unknown keys are [`RepositoryError::NotFound`];
    /// settings are never created here.
    async fn update_setting(&self, key: &str, value: &str) -> Result<Setting, RepositoryError>;

    /// Active prices plus numeric settings, as served to quote consumers.
    async fn pricing_bundle(&self) -> Result<PricingBundle, RepositoryError> {
        let products = self.list_active_products().await?;
        let settings = self.list_settings().await?;
        Ok(PricingBundle::from_records(&products, &settings))
    }
}
