use std::path::PathBuf;

use pretty_assertions::assert_eq;
use roof_core::db::{DbConfig, RepositoryFactory};
use roof_core::{PricingRepository, ProductUpdate, WASTE_FACTOR_KEY};
use roof_db_sqlite::SqliteRepositoryFactory;
use rust_decimal_macros::dec;

fn temp_db_path(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("roof-db-sqlite-{}-{}", name, std::process::id()));
    std::fs::create_dir_all(&dir).expect("Failed to create temp dir");
    let path = dir.join("pricing.db");
    let _ = std::fs::remove_file(&path);
    path
}

#[tokio::test]
async fn edits_survive_reopen_without_reseeding() {
    let path = temp_db_path("reopen");
    let config = DbConfig::sqlite(path.to_string_lossy());

    {
        let repo = SqliteRepositoryFactory
            .create(&config)
            .await
            .expect("Should create file database");
        let silicona = repo.get_product_by_slug("silicona").await.unwrap();
        repo.update_product(
            silicona.id,
            &ProductUpdate {
                price: Some(dec!(4.75)),
                ..Default::default()
            },
        )
        .await
        .expect("Should update price");
        repo.update_setting(WASTE_FACTOR_KEY, "1.18")
            .await
            .expect("Should update setting");
    }

    let reopened = SqliteRepositoryFactory
        .create(&config)
        .await
        .expect("Should reopen file database");

    assert!(path.exists());
    assert_eq!(reopened.list_products().await.unwrap().len(), 6);
    assert_eq!(
        reopened.get_product_by_slug("silicona").await.unwrap().price,
        dec!(4.75)
    );
    assert_eq!(
        reopened.get_setting(WASTE_FACTOR_KEY).await.unwrap().value,
        "1.18"
    );
}

#[tokio::test]
async fn sqlx_url_is_accepted() {
    let path = temp_db_path("url");
    let config = DbConfig::sqlite(format!("sqlite:{}?mode=rwc", path.display()));

    let repo = SqliteRepositoryFactory.create(&config).await;

    assert!(repo.is_ok(), "{:#?}", repo.err());
}
