mod pricing_bundle;
mod product;
mod setting;

pub use pricing_bundle::{PricedProduct, PricingBundle};
pub use product::{NewProduct, PricingUnit, Product, ProductUpdate};
pub use setting::{DEFAULT_TAX_RATE, Setting, TAX_RATE_KEY, WASTE_FACTOR_KEY};
