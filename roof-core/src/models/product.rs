use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

static SLUG_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9_]+$").expect("slug pattern is valid"));

/// How a product's price scales.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PricingUnit {
    /// Priced per square foot of material.
    #[serde(rename = "sqft")]
    SquareFoot,
    /// A fixed charge per job.
    #[serde(rename = "flat")]
    Flat,
}

impl PricingUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SquareFoot => "sqft",
            Self::Flat => "flat",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "sqft" => Some(Self::SquareFoot),
            "flat" => Some(Self::Flat),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub slug: String,
    pub name: String,
    pub description: String,
    pub unit: PricingUnit,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// For creating new products (no id or timestamps, always active)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProduct {
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub unit: PricingUnit,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
}

impl NewProduct {
    /// Validates the product before it is handed to a repository.
    ///
    /// Rules:
    /// - slug is lowercase ASCII letters, digits and underscores
    /// - name is not blank
    /// - price is not negative
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if !SLUG_PATTERN.is_match(&self.slug) {
            errors.push(format!(
                "slug '{}' must only contain lowercase letters, digits and underscores",
                self.slug
            ));
        }

        if self.name.trim().is_empty() {
            errors.push("name is required".to_string());
        }

        if self.price.is_sign_negative() && !self.price.is_zero() {
            errors.push(format!("price must not be negative, got {}", self.price));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Partial update of a product. `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub unit: Option<PricingUnit>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub price: Option<Decimal>,
    pub active: Option<bool>,
}

impl ProductUpdate {
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                errors.push("name must not be blank".to_string());
            }
        }

        if let Some(price) = self.price {
            if price.is_sign_negative() && !price.is_zero() {
                errors.push(format!("price must not be negative, got {}", price));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Returns the product as it looks after this update is applied.
    /// Timestamps are left untouched; the repository stamps `updated_at`.
    pub fn apply_to(
        &self,
        product: &Product,
    ) -> Product {
        Product {
            name: self.name.clone().unwrap_or_else(|| product.name.clone()),
            description: self
                .description
                .clone()
                .unwrap_or_else(|| product.description.clone()),
            unit: self.unit.unwrap_or(product.unit),
            price: self.price.unwrap_or(product.price),
            active: self.active.unwrap_or(product.active),
            ..product.clone()
        }
    }
}
