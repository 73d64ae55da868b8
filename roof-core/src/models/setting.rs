use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Setting key holding the sales tax rate applied to quotes.
pub const TAX_RATE_KEY: &str = "tax_rate";
/// Setting key holding the catalog's nominal waste factor. It is served in
/// the pricing bundle for display; estimates always use the waste table in
/// `estimation::waste`.
pub const WASTE_FACTOR_KEY: &str = "waste_factor";

pub const DEFAULT_TAX_RATE: f64 = 0.115;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Setting {
    pub key: String,
    /// Stored as text; the pricing bundle exposes it as a number.
    pub value: String,
    pub label: String,
    pub updated_at: DateTime<Utc>,
}

impl Setting {
    /// Parses the stored value as a number, ignoring surrounding whitespace.
    pub fn numeric_value(&self) -> Option<f64> {
        self.value
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
    }
}
