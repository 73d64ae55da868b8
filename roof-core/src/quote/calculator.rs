//! Quote calculator.
//!
//! | Line      | Description |
//! |-----------|-------------|
//! | base      | material sq ft × coating unit price |
//! | add-on    | `flat`: unit price × quantity; `sqft`: unit price × material sq ft × quantity |
//! | subtotal  | base + add-ons |
//! | tax       | subtotal × tax rate |
//! | total     | subtotal + tax |
//!
//! Every line is rounded half-up to cents.
//!
//! # Example
//!
//! ```
//! use std::collections::BTreeMap;
//! use rust_decimal_macros::dec;
//! use roof_core::{PricedProduct, PricingBundle, PricingUnit};
//! use roof_core::quote::{AddonRequest, QuoteCalculator, QuoteRequest};
//!
//! let mut pricing = BTreeMap::new();
//! pricing.insert("silicona".to_string(), PricedProduct {
//!     name: "Silicona 100%".to_string(),
//!     price: dec!(4.50),
//!     unit: PricingUnit::SquareFoot,
//!     description: String::new(),
//! });
//! pricing.insert("cisterna".to_string(), PricedProduct {
//!     name: "Cisterna".to_string(),
//!     price: dec!(150.00),
//!     unit: PricingUnit::Flat,
//!     description: String::new(),
//! });
//! let mut config = BTreeMap::new();
//! config.insert("tax_rate".to_string(), 0.115);
//! let bundle = PricingBundle { pricing, config };
//!
//! let request = QuoteRequest {
//!     material_sq_ft: 1237,
//!     coating_slug: "silicona".to_string(),
//!     addons: vec![AddonRequest { slug: "cisterna".to_string(), quantity: 1 }],
//! };
//!
//! let quote = QuoteCalculator::new(&bundle).calculate(&request).unwrap();
//!
//! assert_eq!(quote.base_price, dec!(5566.50));
//! assert_eq!(quote.subtotal, dec!(5716.50));
//! assert_eq!(quote.tax, dec!(657.40));
//! assert_eq!(quote.total, dec!(6373.90));
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::common::{rate_to_decimal, round_half_up};
use crate::models::{PricedProduct, PricingBundle, PricingUnit};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum QuoteError {
    #[error("no active product with slug '{0}'")]
    UnknownProduct(String),

    /// The coating drives the base price, so it must be priced per sq ft.
    #[error("coating '{0}' is not priced per square foot")]
    CoatingNotPerSquareFoot(String),

    #[error("tax rate must be a non-negative number, got {0}")]
    InvalidTaxRate(f64),

    #[error("quote amount exceeds the representable range")]
    Overflow,
}

fn default_quantity() -> u32 {
    1
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddonRequest {
    pub slug: String,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteRequest {
    /// Material quantity, normally `RoofEstimate::material_needed_sq_ft`.
    pub material_sq_ft: u64,
    pub coating_slug: String,
    #[serde(default)]
    pub addons: Vec<AddonRequest>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteLine {
    pub slug: String,
    pub name: String,
    pub unit: PricingUnit,
    #[serde(with = "rust_decimal::serde::float")]
    pub unit_price: Decimal,
    pub quantity: u32,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteBreakdown {
    pub material_sq_ft: u64,
    pub coating: QuoteLine,
    pub addons: Vec<QuoteLine>,
    #[serde(with = "rust_decimal::serde::float")]
    pub base_price: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub addons_total: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub subtotal: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub tax_rate: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub tax: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
}

/// Prices quotes against one [`PricingBundle`] snapshot.
#[derive(Debug, Clone)]
pub struct QuoteCalculator<'a> {
    bundle: &'a PricingBundle,
}

impl<'a> QuoteCalculator<'a> {
    pub fn new(bundle: &'a PricingBundle) -> Self {
        Self { bundle }
    }

    /// # Errors
    ///
    /// Returns [`QuoteError`] if:
    /// - the coating or an add-on slug is not an active product
    /// - the coating is not priced per square foot
    /// - the bundle's tax rate is negative or not a number
    /// - any line, subtotal or total overflows [`Decimal`]
    pub fn calculate(
        &self,
        request: &QuoteRequest,
    ) -> Result<QuoteBreakdown, QuoteError> {
        let tax_rate_value = self.bundle.tax_rate();
        let tax_rate =
            rate_to_decimal(tax_rate_value).ok_or(QuoteError::InvalidTaxRate(tax_rate_value))?;

        let sq_ft = Decimal::from(request.material_sq_ft);

        let coating_product = self.lookup(&request.coating_slug)?;
        if coating_product.unit != PricingUnit::SquareFoot {
            return Err(QuoteError::CoatingNotPerSquareFoot(
                request.coating_slug.clone(),
            ));
        }
        let coating = self.line(&request.coating_slug, coating_product, 1, sq_ft)?;
        let base_price = coating.amount;

        let addons = request
            .addons
            .iter()
            .map(|addon| {
                let product = self.lookup(&addon.slug)?;
                self.line(&addon.slug, product, addon.quantity, sq_ft)
            })
            .collect::<Result<Vec<_>, QuoteError>>()?;

        let addons_total = addons
            .iter()
            .try_fold(Decimal::ZERO, |acc, line| acc.checked_add(line.amount))
            .map(round_half_up)
            .ok_or(QuoteError::Overflow)?;
        let subtotal = base_price
            .checked_add(addons_total)
            .map(round_half_up)
            .ok_or(QuoteError::Overflow)?;
        let tax = subtotal
            .checked_mul(tax_rate)
            .map(round_half_up)
            .ok_or(QuoteError::Overflow)?;
        let total = subtotal
            .checked_add(tax)
            .map(round_half_up)
            .ok_or(QuoteError::Overflow)?;

        Ok(QuoteBreakdown {
            material_sq_ft: request.material_sq_ft,
            coating,
            addons,
            base_price,
            addons_total,
            subtotal,
            tax_rate,
            tax,
            total,
        })
    }

    fn lookup(
        &self,
        slug: &str,
    ) -> Result<&'a PricedProduct, QuoteError> {
        self.bundle
            .product(slug)
            .ok_or_else(|| QuoteError::UnknownProduct(slug.to_string()))
    }

    fn line(
        &self,
        slug: &str,
        product: &PricedProduct,
        quantity: u32,
        sq_ft: Decimal,
    ) -> Result<QuoteLine, QuoteError> {
        let per_unit = match product.unit {
            PricingUnit::SquareFoot => product.price.checked_mul(sq_ft),
            PricingUnit::Flat => Some(product.price),
        };
        let amount = per_unit
            .and_then(|per_unit| per_unit.checked_mul(Decimal::from(quantity)))
            .map(round_half_up)
            .ok_or(QuoteError::Overflow)?;

        Ok(QuoteLine {
            slug: slug.to_string(),
            name: product.name.clone(),
            unit: product.unit,
            unit_price: product.price,
            quantity,
            amount,
        })
    }
}
