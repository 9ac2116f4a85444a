//! Shared test utilities.
//!
//! In-memory database setup, stored-record helpers, and plain canonical
//! values for the pure scoring and ranking tests.

use crate::{
    core::{client, product, requirement, supplier},
    errors::Result,
    models::{Client, ClientStatus, Product, Requirement, Supplier, SupplierStatus},
};
use sea_orm::DatabaseConnection;

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all persistence tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// An active client named after its id.
#[must_use]
pub fn sample_client(id: &str, country: &str) -> Client {
    Client {
        id: id.to_string(),
        name: format!("Client {id}"),
        country: country.to_string(),
        status: ClientStatus::Active,
        ..Client::default()
    }
}

/// An active supplier named after its id.
#[must_use]
pub fn sample_supplier(id: &str, country: &str) -> Supplier {
    Supplier {
        id: id.to_string(),
        name: format!("Supplier {id}"),
        country: country.to_string(),
        status: SupplierStatus::Active,
        ..Supplier::default()
    }
}

/// A requirement with only a product name set.
///
/// Ingredient, dosage form, strength, quantity and budget are left empty so
/// tests opt into each scoring factor explicitly.
#[must_use]
pub fn sample_requirement(id: &str, client_id: &str) -> Requirement {
    Requirement {
        id: id.to_string(),
        client_id: client_id.to_string(),
        product_name: format!("Product for {id}"),
        ..Requirement::default()
    }
}

/// A product with no catalog details and no price.
#[must_use]
pub fn sample_product(id: &str, supplier_id: &str) -> Product {
    Product {
        id: id.to_string(),
        supplier_id: supplier_id.to_string(),
        ..Product::default()
    }
}

/// Stores an active client with the given name.
pub async fn create_test_client(db: &DatabaseConnection, name: &str) -> Result<Client> {
    client::create_client(
        db,
        &Client {
            name: name.to_string(),
            country: "United States".to_string(),
            ..Client::default()
        },
    )
    .await
}

/// Stores an open requirement for `client_id`.
///
/// # Defaults
/// * quantity: 1000
/// * budget: 500.0
pub async fn create_test_requirement(
    db: &DatabaseConnection,
    client_id: &str,
    product_name: &str,
) -> Result<Requirement> {
    requirement::create_requirement(
        db,
        &Requirement {
            client_id: client_id.to_string(),
            product_name: product_name.to_string(),
            quantity: Some(1000.0),
            budget_usd: Some(500.0),
            ..Requirement::default()
        },
    )
    .await
}

/// Stores an active supplier with the given name.
pub async fn create_test_supplier(db: &DatabaseConnection, name: &str) -> Result<Supplier> {
    supplier::create_supplier(
        db,
        &Supplier {
            name: name.to_string(),
            country: "United States".to_string(),
            ..Supplier::default()
        },
    )
    .await
}

/// Stores a 500mg tablet product of `api_name` for `supplier_id`.
///
/// # Defaults
/// * pack size: "10x10"
/// * price: 0.25
pub async fn create_test_product(
    db: &DatabaseConnection,
    supplier_id: &str,
    api_name: &str,
) -> Result<Product> {
    product::create_product(
        db,
        &Product {
            supplier_id: supplier_id.to_string(),
            api_name: api_name.to_string(),
            dosage_form: "tablet".to_string(),
            strength: "500mg".to_string(),
            pack_size: "10x10".to_string(),
            unit_price_usd: Some(0.25),
            ..Product::default()
        },
    )
    .await
}
