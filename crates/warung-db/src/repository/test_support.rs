//! Fixtures shared by the repository tests.

use crate::pool::{Database, DbConfig};
use warung_core::{NewProduct, NewStockEntry, NewSupplier, NewUser, Product, StockEntry, UserRole};

pub(crate) async fn test_db() -> Database {
    Database::new(DbConfig::in_memory()).await.unwrap()
}

/// A database with category `KAT001` and products `PRO001`..`PRO00n`.
pub(crate) async fn db_with_products(n: usize) -> (Database, Vec<Product>) {
    let db = test_db().await;
    let category = db.categories().create("Minuman").await.unwrap();

    let mut products = Vec::with_capacity(n);
    for i in 0..n {
        let product = db
            .products()
            .create(&NewProduct {
                category_id: category.id.clone(),
                name: format!("Produk {}", i + 1),
                description: None,
                image: None,
            })
            .await
            .unwrap();
        products.push(product);
    }
    (db, products)
}

pub(crate) async fn add_stock(db: &Database, product_id: &str, unit: &str, quantity: i64, price: i64) -> StockEntry {
    db.stock()
        .create(&NewStockEntry {
            product_id: product_id.to_string(),
            unit: unit.to_string(),
            quantity: Some(quantity),
            unit_price: price,
        })
        .await
        .unwrap()
}

pub(crate) async fn quantity_of(db: &Database, product_id: &str, unit: &str) -> Option<i64> {
    db.stock()
        .find(product_id, unit)
        .await
        .unwrap()
        .map(|entry| entry.quantity)
}

pub(crate) async fn add_supplier(db: &Database) -> String {
    db.suppliers()
        .create(&NewSupplier {
            name: "CV Sumber Rejeki".to_string(),
            phone: Some("0812000111".to_string()),
            notes: None,
        })
        .await
        .unwrap()
        .id
}

pub(crate) async fn add_seller(db: &Database) -> String {
    db.users()
        .create(&NewUser {
            username: "kasir1".to_string(),
            password: "rahasia123".to_string(),
            name: "Kasir Satu".to_string(),
            role: UserRole::Seller,
            phone: None,
            gender: None,
            address: None,
        })
        .await
        .unwrap()
        .id
}
