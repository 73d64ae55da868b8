//! Quote pricing for a measured roof.
//!
//! Turns a material quantity from the estimation pipeline into a priced
//! quote using the active [`PricingBundle`](crate::PricingBundle).

pub mod calculator;
pub mod common;

pub use calculator::{AddonRequest, QuoteBreakdown, QuoteCalculator, QuoteError, QuoteLine, QuoteRequest};
