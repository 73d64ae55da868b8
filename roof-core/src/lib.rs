pub mod db;
pub mod estimation;
pub mod models;
pub mod quote;

pub use db::repository::{PricingRepository, RepositoryError};
pub use models::*;
