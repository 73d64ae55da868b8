use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use roof_core::{
    NewProduct, PricingRepository, PricingUnit, Product, ProductUpdate, RepositoryError, Setting,
};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use tracing::{debug, info};

use crate::decimal::{decimal_to_f64, get_decimal};

const DEFAULT_CATALOG: &str = include_str!("../seeds/0001_default_catalog.sql");

const PRODUCT_COLUMNS: &str =
    "id, slug, name, description, unit, price, active, created_at, updated_at";

pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    /// Opens a pool for a file path, a `sqlite:` URL or `:memory:`.
    ///
    /// In-memory databases live inside a single connection, so their pool
    /// is capped at one connection that is never recycled. Files are
    /// created if missing and opened in WAL mode.
    pub async fn new(connection_string: &str) -> Result<Self> {
        let in_memory = matches!(connection_string, ":memory:" | "sqlite::memory:");

        let (options, max_connections) = if in_memory {
            (SqliteConnectOptions::from_str("sqlite::memory:")?, 1)
        } else {
            let url = if connection_string.starts_with("sqlite:") {
                connection_string.to_string()
            } else {
                format!("sqlite:{}", connection_string)
            };
            let options = SqliteConnectOptions::from_str(&url)
                .with_context(|| format!("Invalid SQLite connection string: {}", connection_string))?
                .create_if_missing(true)
                .journal_mode(SqliteJournalMode::Wal);
            (options, 5)
        };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options.foreign_keys(true))
            .await
            .with_context(|| format!("Failed to connect to database: {}", connection_string))?;

        debug!(connection_string, max_connections, "sqlite pool opened");
        Ok(Self { pool })
    }

    pub async fn new_with_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("Failed to run database migrations")?;
        Ok(())
    }

    /// Fills empty `products` and `settings` tables with the default
    /// catalog. Tables that already hold rows are left alone.
    pub async fn seed_defaults(&self) -> Result<()> {
        let mut tx = self.pool.begin().await.context("Failed to start seed transaction")?;
        sqlx::Executor::execute(&mut *tx, sqlx::raw_sql(DEFAULT_CATALOG))
            .await
            .context("Failed to seed default catalog")?;
        tx.commit().await.context("Failed to commit default catalog")?;
        Ok(())
    }

    /// Load and execute all SQL seed files from the specified directory.
    /// Files are executed in alphabetical order by filename.
    pub async fn run_seeds(
        &self,
        seeds_dir: &Path,
    ) -> Result<()> {
        let mut entries: Vec<_> = std::fs::read_dir(seeds_dir)
            .with_context(|| format!("Failed to read seeds directory '{}'", seeds_dir.display()))?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "sql"))
            .collect();

        entries.sort_by_key(|entry| entry.file_name());

        for entry in entries {
            let path = entry.path();
            let sql = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read seed file '{}'", path.display()))?;

            sqlx::raw_sql(&sql)
                .execute(&self.pool)
                .await
                .with_context(|| format!("Failed to execute seed file '{}'", path.display()))?;
            info!(file = %path.display(), "seed file applied");
        }

        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn db_err(e: sqlx::Error) -> RepositoryError {
    RepositoryError::Database(e.to_string())
}

/// Unique-key violations become [`RepositoryError::Conflict`].
fn write_err(
    e: sqlx::Error,
    slug: &str,
) -> RepositoryError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            RepositoryError::Conflict(format!("product slug '{}' already exists", slug))
        }
        _ => db_err(e),
    }
}

fn row_to_product(row: &sqlx::sqlite::SqliteRow) -> Result<Product, RepositoryError> {
    let unit: String = row.try_get("unit").map_err(db_err)?;
    let unit = PricingUnit::parse(&unit)
        .ok_or_else(|| RepositoryError::Database(format!("Invalid pricing unit: {}", unit)))?;

    Ok(Product {
        id: row.try_get("id").map_err(db_err)?,
        slug: row.try_get("slug").map_err(db_err)?,
        name: row.try_get("name").map_err(db_err)?,
        description: row.try_get("description").map_err(db_err)?,
        unit,
        price: get_decimal(row, "price")?,
        active: row.try_get("active").map_err(db_err)?,
        created_at: row
            .try_get::<DateTime<Utc>, _>("created_at")
            .map_err(|e| RepositoryError::Database(format!("Failed to get created_at: {}", e)))?,
        updated_at: row
            .try_get::<DateTime<Utc>, _>("updated_at")
            .map_err(|e| RepositoryError::Database(format!("Failed to get updated_at: {}", e)))?,
    })
}

fn row_to_setting(row: &sqlx::sqlite::SqliteRow) -> Result<Setting, RepositoryError> {
    Ok(Setting {
        key: row.try_get("key").map_err(db_err)?,
        value: row.try_get("value").map_err(db_err)?,
        label: row.try_get("label").map_err(db_err)?,
        updated_at: row
            .try_get::<DateTime<Utc>, _>("updated_at")
            .map_err(|e| RepositoryError::Database(format!("Failed to get updated_at: {}", e)))?,
    })
}

#[async_trait]
impl PricingRepository for SqliteRepository {
    async fn list_products(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query(&format!("SELECT {PRODUCT_COLUMNS} FROM products ORDER BY id"))
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;

        rows.iter().map(row_to_product).collect()
    }

    async fn list_active_products(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE active = 1 ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.iter().map(row_to_product).collect()
    }

    async fn get_product(
        &self,
        id: i64,
    ) -> Result<Product, RepositoryError> {
        let row = sqlx::query(&format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?
            .ok_or(RepositoryError::NotFound)?;

        row_to_product(&row)
    }

    async fn get_product_by_slug(
        &self,
        slug: &str,
    ) -> Result<Product, RepositoryError> {
        let row = sqlx::query(&format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE slug = ?"))
            .bind(slug)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?
            .ok_or(RepositoryError::NotFound)?;

        row_to_product(&row)
    }

    async fn create_product(
        &self,
        product: NewProduct,
    ) -> Result<Product, RepositoryError> {
        let now = Utc::now();

        let result = sqlx::query(
            "INSERT INTO products (slug, name, description, unit, price, active, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, 1, ?, ?)",
        )
        .bind(&product.slug)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.unit.as_str())
        .bind(decimal_to_f64(product.price))
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| write_err(e, &product.slug))?;

        let id = result.last_insert_rowid();
        debug!(id, slug = %product.slug, "product created");
        self.get_product(id).await
    }

    async fn update_product(
        &self,
        id: i64,
        update: &ProductUpdate,
    ) -> Result<Product, RepositoryError> {
        let current = self.get_product(id).await?;
        let updated = update.apply_to(&current);

        let result = sqlx::query(
            "UPDATE products
             SET name = ?, description = ?, unit = ?, price = ?, active = ?, updated_at = ?
             WHERE id = ?",
        )
        .bind(&updated.name)
        .bind(&updated.description)
        .bind(updated.unit.as_str())
        .bind(decimal_to_f64(updated.price))
        .bind(updated.active)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        self.get_product(id).await
    }

    async fn delete_product(
        &self,
        id: i64,
    ) -> Result<Product, RepositoryError> {
        let product = self.get_product(id).await?;

        let result = sqlx::query("DELETE FROM products WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        debug!(id, slug = %product.slug, "product deleted");
        Ok(product)
    }

    async fn list_settings(&self) -> Result<Vec<Setting>, RepositoryError> {
        let rows = sqlx::query("SELECT key, value, label, updated_at FROM settings ORDER BY key")
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;

        rows.iter().map(row_to_setting).collect()
    }

    async fn get_setting(
        &self,
        key: &str,
    ) -> Result<Setting, RepositoryError> {
        let row = sqlx::query("SELECT key, value, label, updated_at FROM settings WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?
            .ok_or(RepositoryError::NotFound)?;

        row_to_setting(&row)
    }

    async fn update_setting(
        &self,
        key: &str,
        value: &str,
    ) -> Result<Setting, RepositoryError> {
        let result = sqlx::query("UPDATE settings SET value = ?, updated_at = ? WHERE key = ?")
            .bind(value)
            .bind(Utc::now())
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        self.get_setting(key).await
    }
}
