use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::product::{PricingUnit, Product};
use super::setting::{DEFAULT_TAX_RATE, Setting, TAX_RATE_KEY};

/// Public view of an active product inside a [`PricingBundle`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricedProduct {
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub unit: PricingUnit,
    pub description: String,
}

/// Read-only snapshot of active prices and numeric settings, keyed by
/// product slug and setting key respectively.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PricingBundle {
    pub pricing: BTreeMap<String, PricedProduct>,
    pub config: BTreeMap<String, f64>,
}

impl PricingBundle {
    /// Builds a bundle from stored records.
    ///
    /// Inactive products are left out. Settings whose value is not numeric
    /// are skipped with a warning.
    pub fn from_records(
        products: &[Product],
        settings: &[Setting],
    ) -> Self {
        let pricing = products
            .iter()
            .filter(|p| p.active)
            .map(|p| {
                (
                    p.slug.clone(),
                    PricedProduct {
                        name: p.name.clone(),
                        price: p.price,
                        unit: p.unit,
                        description: p.description.clone(),
                    },
                )
            })
            .collect();

        let mut config = BTreeMap::new();
        for setting in settings {
            match setting.numeric_value() {
                Some(value) => {
                    config.insert(setting.key.clone(), value);
                }
                None => warn!(key = %setting.key, value = %setting.value, "skipping non-numeric setting"),
            }
        }

        Self { pricing, config }
    }

    pub fn product(
        &self,
        slug: &str,
    ) -> Option<&PricedProduct> {
        self.pricing.get(slug)
    }

    pub fn unit_price(
        &self,
        slug: &str,
    ) -> Option<Decimal> {
        self.product(slug).map(|p| p.price)
    }

    /// Tax rate from the `tax_rate` setting, or the catalog default.
    pub fn tax_rate(&self) -> f64 {
        self.config
            .get(TAX_RATE_KEY)
            .copied()
            .unwrap_or(DEFAULT_TAX_RATE)
    }
}
