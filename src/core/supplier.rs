//! Supplier persistence - reads and writes the `suppliers` table, including
//! the bulk status change and bulk delete used by the supplier list.

use crate::{
    core::{
        normalize::normalize_suppliers,
        store::{canonical, optional, parse_id, required, to_rows, validate_email},
    },
    entities::{SupplierColumn, supplier},
    errors::{Error, Result},
    models::{Supplier, SupplierStatus},
};
use chrono::Utc;
use sea_orm::{QueryOrder, Set, prelude::*, sea_query::Expr};
use serde_json::Value;
use tracing::{debug, info};

/// All supplier rows, newest first, in raw row form.
///
/// # Errors
/// Returns an error if the query fails.
pub async fn fetch_supplier_rows(db: &DatabaseConnection) -> Result<Vec<Value>> {
    let models = supplier::Entity::find()
        .order_by_desc(SupplierColumn::CreatedAt)
        .all(db)
        .await?;
    debug!(count = models.len(), "Fetched supplier rows");
    to_rows(&models)
}

fn validate(supplier: &Supplier) -> Result<String> {
    validate_email("contact_email", &supplier.contact_email)?;
    required("name", &supplier.name)
}

/// Inserts a new supplier.
///
/// # Errors
/// Returns [`Error::Validation`] for a blank name or malformed email, or a
/// database error if the insert fails.
pub async fn create_supplier(db: &DatabaseConnection, supplier: &Supplier) -> Result<Supplier> {
    let name = validate(supplier)?;
    let id = Uuid::new_v4();

    let model = supplier::ActiveModel {
        id: Set(id),
        name: Set(name),
        country: Set(optional(&supplier.country)),
        status: Set(supplier.status.as_str().to_string()),
        website: Set(optional(&supplier.website)),
        contact_name: Set(optional(&supplier.contact_name)),
        contact_email: Set(optional(&supplier.contact_email)),
        contact_phone: Set(optional(&supplier.contact_phone)),
        notes: Set(optional(&supplier.notes)),
        created_at: Set(Utc::now()),
    }
    .insert(db)
    .await?;

    info!(%id, name = %model.name, "Created supplier");
    canonical("supplier", &model, id, normalize_suppliers)
}

/// Overwrites the editable fields of the supplier with `supplier.id`.
///
/// # Errors
/// Returns [`Error::Validation`] for invalid fields, [`Error::NotFound`] if
/// no such supplier exists, or a database error.
pub async fn update_supplier(db: &DatabaseConnection, supplier: &Supplier) -> Result<Supplier> {
    let name = validate(supplier)?;
    let id = parse_id("supplier", &supplier.id)?;

    let mut active: supplier::ActiveModel = supplier::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("supplier", &supplier.id))?
        .into();

    active.name = Set(name);
    active.country = Set(optional(&supplier.country));
    active.status = Set(supplier.status.as_str().to_string());
    active.website = Set(optional(&supplier.website));
    active.contact_name = Set(optional(&supplier.contact_name));
    active.contact_email = Set(optional(&supplier.contact_email));
    active.contact_phone = Set(optional(&supplier.contact_phone));
    active.notes = Set(optional(&supplier.notes));

    let model = active.update(db).await?;
    info!(%id, "Updated supplier");
    canonical("supplier", &model, id, normalize_suppliers)
}

/// Deletes a supplier and, through the foreign key, its products.
///
/// # Errors
/// Returns [`Error::NotFound`] if no such supplier exists, or a database
/// error.
pub async fn delete_supplier(db: &DatabaseConnection, id: &str) -> Result<()> {
    let uuid = parse_id("supplier", id)?;
    let result = supplier::Entity::delete_by_id(uuid).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(Error::not_found("supplier", id));
    }
    info!(%uuid, "Deleted supplier");
    Ok(())
}

/// Parses every id, failing on the first one that cannot be stored.
fn parse_ids(ids: &[String]) -> Result<Vec<Uuid>> {
    ids.iter().map(|id| parse_id("supplier", id)).collect()
}

/// Sets the status of every listed supplier. Returns the number of rows
/// changed.
///
/// # Errors
/// Returns [`Error::NotFound`] if an id is not a stored id, or a database
/// error.
pub async fn update_supplier_status_many(
    db: &DatabaseConnection,
    ids: &[String],
    status: SupplierStatus,
) -> Result<u64> {
    let uuids = parse_ids(ids)?;
    if uuids.is_empty() {
        return Ok(0);
    }
    let result = supplier::Entity::update_many()
        .col_expr(SupplierColumn::Status, Expr::value(status.as_str()))
        .filter(SupplierColumn::Id.is_in(uuids))
        .exec(db)
        .await?;
    info!(count = result.rows_affected, status = %status, "Updated supplier status");
    Ok(result.rows_affected)
}

/// Deletes every listed supplier. Returns the number of rows removed.
///
/// # Errors
/// Returns [`Error::NotFound`] if an id is not a stored id, or a database
/// error.
pub async fn delete_suppliers(db: &DatabaseConnection, ids: &[String]) -> Result<u64> {
    let uuids = parse_ids(ids)?;
    if uuids.is_empty() {
        return Ok(0);
    }
    let result = supplier::Entity::delete_many()
        .filter(SupplierColumn::Id.is_in(uuids))
        .exec(db)
        .await?;
    info!(count = result.rows_affected, "Deleted suppliers");
    Ok(result.rows_affected)
}
