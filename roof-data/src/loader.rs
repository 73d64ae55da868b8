use std::io::Read;

use roof_core::{NewProduct, PricingRepository, PricingUnit, ProductUpdate, RepositoryError};
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

/// Errors that can occur when loading catalog data.
#[derive(Debug, Error)]
pub enum CatalogLoaderError {
    #[error("CSV parse error: {0}")]
    CsvParse(String),

    #[error("Invalid unit '{unit}' for product '{slug}' (expected sqft or flat)")]
    InvalidUnit { slug: String, unit: String },

    #[error("Invalid product '{slug}': {reason}")]
    InvalidProduct { slug: String, reason: String },

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<csv::Error> for CatalogLoaderError {
    fn from(err: csv::Error) -> Self {
        CatalogLoaderError::CsvParse(err.to_string())
    }
}

/// A single row of the catalog CSV.
///
/// - `slug`: unique key, lowercase letters, digits and underscores
/// - `unit`: `sqft` or `flat`
/// - `price`: unit price, e.g. `4.50`
/// - `active`: `true`/`false`, `1`/`0` or `yes`/`no`; blank means active
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct CatalogRecord {
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub unit: String,
    pub price: Decimal,
    #[serde(default = "default_active", deserialize_with = "deserialize_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

fn deserialize_active<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    match s.as_deref().map(|s| s.trim().to_ascii_lowercase()).as_deref() {
        None | Some("") | Some("true") | Some("1") | Some("yes") => Ok(true),
        Some("false") | Some("0") | Some("no") => Ok(false),
        Some(other) => Err(serde::de::Error::custom(format!("invalid active flag '{}'", other))),
    }
}

impl CatalogRecord {
    fn to_new_product(&self) -> Result<NewProduct, CatalogLoaderError> {
        let unit = PricingUnit::parse(&self.unit).ok_or_else(|| CatalogLoaderError::InvalidUnit {
            slug: self.slug.clone(),
            unit: self.unit.clone(),
        })?;

        let product = NewProduct {
            slug: self.slug.trim().to_string(),
            name: self.name.trim().to_string(),
            description: self.description.trim().to_string(),
            unit,
            price: self.price,
        };

        product
            .validate()
            .map_err(|errors| CatalogLoaderError::InvalidProduct {
                slug: self.slug.clone(),
                reason: errors.join("; "),
            })?;

        Ok(product)
    }
}

/// How many products a load created and how many it updated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadSummary {
    pub created: usize,
    pub updated: usize,
}

/// Loader for catalog data from CSV files.
///
/// Writes go through [`PricingRepository`], so any backend works.
pub struct CatalogLoader;

impl CatalogLoader {
    /// Parse catalog records from a CSV reader.
    pub fn parse<R: Read>(reader: R) -> Result<Vec<CatalogRecord>, CatalogLoaderError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut records = Vec::new();

        for result in csv_reader.deserialize() {
            let record: CatalogRecord = result?;
            records.push(record);
        }

        Ok(records)
    }

    /// Upserts catalog records by slug.
    ///
    /// Every record is validated before anything is written, so a bad row
    /// leaves the store untouched. Existing products are updated in place
    /// (their id is kept); unknown slugs are created.
    pub async fn load<R: PricingRepository + ?Sized>(
        repo: &R,
        records: &[CatalogRecord],
    ) -> Result<LoadSummary, CatalogLoaderError> {
        let products = records
            .iter()
            .map(|record| record.to_new_product().map(|p| (p, record.active)))
            .collect::<Result<Vec<_>, _>>()?;

        let mut summary = LoadSummary::default();

        for (product, active) in products {
            match repo.get_product_by_slug(&product.slug).await {
                Ok(existing) => {
                    let update = ProductUpdate {
                        name: Some(product.name),
                        description: Some(product.description),
                        unit: Some(product.unit),
                        price: Some(product.price),
                        active: Some(active),
                    };
                    repo.update_product(existing.id, &update).await?;
                    debug!(slug = %existing.slug, "catalog product updated");
                    summary.updated += 1;
                }
                Err(RepositoryError::NotFound) => {
                    let created = repo.create_product(product).await?;
                    if !active {
                        let deactivate = ProductUpdate {
                            active: Some(false),
                            ..Default::default()
                        };
                        repo.update_product(created.id, &deactivate).await?;
                    }
                    debug!(slug = %created.slug, "catalog product created");
                    summary.created += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }

        Ok(summary)
    }
}
