use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use roof_core::db::repository::{PricingRepository, RepositoryError};
use roof_core::db::{DbConfig, RepositoryFactory};

use crate::repository::SqliteRepository;

/// Extra seed directory applied after the built-in default catalog.
///
/// Resolution order:
/// 1. **`ROOF_DB_SQLITE_SEEDS_DIR`** if set.
/// 2. **`./seeds`** if it exists in the current working directory.
///
/// Without either, only the built-in catalog is seeded.
fn seeds_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var("ROOF_DB_SQLITE_SEEDS_DIR") {
        return Some(PathBuf::from(dir));
    }
    let cwd_seeds = PathBuf::from("./seeds");
    cwd_seeds.is_dir().then_some(cwd_seeds)
}

/// [`RepositoryFactory`] for SQLite.
///
/// Register this with a [`roof_core::db::RepositoryRegistry`] to make the
/// `"sqlite"` backend available:
///
/// ```rust,no_run
/// use roof_core::db::RepositoryRegistry;
/// use roof_db_sqlite::SqliteRepositoryFactory;
///
/// let mut registry = RepositoryRegistry::new();
/// registry.register(Box::new(SqliteRepositoryFactory));
/// ```
pub struct SqliteRepositoryFactory;

#[async_trait]
impl RepositoryFactory for SqliteRepositoryFactory {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    /// Opens the database described by `config.connection_string`, runs
    /// migrations and seeds an empty catalog.
    ///
    /// Accepted connection-string values:
    /// * A bare file path, e.g. `"db/pricing.db"`. Created if missing.
    /// * A sqlx URL, e.g. `"sqlite:pricing.db?mode=rwc"`.
    /// * `":memory:"` for an ephemeral database (tests).
    async fn create(
        &self,
        config: &DbConfig,
    ) -> Result<Arc<dyn PricingRepository>, RepositoryError> {
        let repo = SqliteRepository::new(&config.connection_string)
            .await
            .map_err(|e| RepositoryError::Connection(format!("{e:#}")))?;
        repo.run_migrations()
            .await
            .map_err(|e| RepositoryError::Database(format!("{e:#}")))?;
        repo.seed_defaults()
            .await
            .map_err(|e| RepositoryError::Database(format!("{e:#}")))?;

        if let Some(dir) = seeds_dir() {
            debug!(dir = %dir.display(), "applying seed directory");
            repo.run_seeds(&dir)
                .await
                .map_err(|e| RepositoryError::Database(format!("{e:#}")))?;
        }

        Ok(Arc::new(repo))
    }
}
