use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use sqlx::{Row, TypeInfo, ValueRef};
use roof_core::RepositoryError;

/// Reads a price column. SQLite hands back INTEGER for whole numbers stored
/// in a REAL column, so both storage classes are accepted.
pub fn get_decimal(
    row: &sqlx::sqlite::SqliteRow,
    column: &str,
) -> Result<Decimal, RepositoryError> {
    let value_ref = row
        .try_get_raw(column)
        .map_err(|e| RepositoryError::Database(format!("Column '{}' not found: {}", column, e)))?;

    if value_ref.is_null() {
        return Err(RepositoryError::Database(format!("Column '{}' is NULL", column)));
    }

    let type_name = value_ref.type_info().name().to_string();

    match type_name.as_str() {
        "INTEGER" => {
            let val: i64 = row.try_get(column).map_err(|e| {
                RepositoryError::Database(format!("Failed to get INTEGER from '{}': {}", column, e))
            })?;
            Ok(Decimal::from(val))
        }
        "REAL" => {
            let val: f64 = row.try_get(column).map_err(|e| {
                RepositoryError::Database(format!("Failed to get REAL from '{}': {}", column, e))
            })?;
            Decimal::try_from(val).map_err(|e| {
                RepositoryError::Database(format!("Failed to convert {} to Decimal: {}", val, e))
            })
        }
        _ => Err(RepositoryError::Database(format!(
            "Unexpected type '{}' for column '{}'",
            type_name, column
        ))),
    }
}

/// Prices are stored as REAL.
pub fn decimal_to_f64(d: Decimal) -> f64 {
    d.to_f64().unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;
    use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

    use super::*;

    async fn setup_test_db() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("Failed to create in-memory database");
        sqlx::query("CREATE TABLE prices (id INTEGER PRIMARY KEY, price REAL, label TEXT)")
            .execute(&pool)
            .await
            .expect("Failed to create test table");
        pool
    }

    async fn fetch_price(
        pool: &SqlitePool,
        insert: &str,
    ) -> sqlx::sqlite::SqliteRow {
        sqlx::query(insert)
            .execute(pool)
            .await
            .expect("Failed to insert test data");
        sqlx::query("SELECT price, label FROM prices WHERE id = 1")
            .fetch_one(pool)
            .await
            .expect("Failed to fetch row")
    }

    #[tokio::test]
    async fn reads_fractional_price() {
        let pool = setup_test_db().await;
        let row = fetch_price(&pool, "INSERT INTO prices (id, price) VALUES (1, 4.5)").await;

        assert_eq!(get_decimal(&row, "price"), Ok(dec!(4.50)));
    }

    #[tokio::test]
    async fn reads_whole_price() {
        let pool = setup_test_db().await;
        let row = fetch_price(&pool, "INSERT INTO prices (id, price) VALUES (1, 150)").await;

        assert_eq!(get_decimal(&row, "price"), Ok(dec!(150)));
    }

    #[tokio::test]
    async fn null_price_is_an_error() {
        let pool = setup_test_db().await;
        let row = fetch_price(&pool, "INSERT INTO prices (id) VALUES (1)").await;

        assert!(matches!(get_decimal(&row, "price"), Err(RepositoryError::Database(_))));
    }

    #[tokio::test]
    async fn text_column_is_rejected() {
        let pool = setup_test_db().await;
        let row = fetch_price(&pool, "INSERT INTO prices (id, label) VALUES (1, 'cheap')").await;

        let result = get_decimal(&row, "label");

        assert!(
            matches!(&result, Err(RepositoryError::Database(msg)) if msg.contains("TEXT")),
            "{result:?}"
        );
    }

    #[tokio::test]
    async fn missing_column_is_an_error() {
        let pool = setup_test_db().await;
        let row = fetch_price(&pool, "INSERT INTO prices (id, price) VALUES (1, 1.0)").await;

        assert!(get_decimal(&row, "nonexistent").is_err());
    }

    #[test]
    fn decimal_to_f64_converts_prices() {
        assert_eq!(decimal_to_f64(dec!(4.50)), 4.5);
        assert_eq!(decimal_to_f64(dec!(1000.00)), 1000.0);
    }
}
