//! Supplier product persistence - reads and writes `supplier_products`.
//!
//! A product always belongs to a stored supplier. Prices, minimum order
//! quantities and lead times are validated as non-negative before anything is
//! sent to the store.

use crate::{
    core::{
        normalize::normalize_products,
        store::{canonical, optional, parse_id, parse_reference, required, to_rows},
        synthesis::non_negative,
    },
    entities::{SupplierProductColumn, supplier_product},
    errors::{Error, Result},
    models::Product,
};
use chrono::Utc;
use sea_orm::{QueryOrder, Set, prelude::*};
use serde_json::Value;
use tracing::{debug, info};

/// All product rows, newest first, in raw row form.
///
/// # Errors
/// Returns an error if the query fails.
pub async fn fetch_product_rows(db: &DatabaseConnection) -> Result<Vec<Value>> {
    let models = supplier_product::Entity::find()
        .order_by_desc(SupplierProductColumn::CreatedAt)
        .all(db)
        .await?;
    debug!(count = models.len(), "Fetched product rows");
    to_rows(&models)
}

struct Checked {
    supplier_id: Uuid,
    api_name: String,
    dosage_form: String,
    strength: String,
    pack_size: String,
    unit_price_usd: f64,
    moq: Option<i64>,
    lead_time_days: Option<i32>,
}

fn validate(product: &Product) -> Result<Checked> {
    let unit_price_usd = non_negative("unit_price_usd", product.unit_price_usd)?
        .ok_or_else(|| Error::validation("unit_price_usd", "Unit price is required"))?;

    let lead_time_days = match product.lead_time_days {
        Some(days) if days < 0 => {
            return Err(Error::validation("lead_time_days", "must be 0 or greater"));
        }
        Some(days) => Some(
            i32::try_from(days)
                .map_err(|_| Error::validation("lead_time_days", "is too large"))?,
        ),
        None => None,
    };

    Ok(Checked {
        supplier_id: parse_reference("supplier_id", &product.supplier_id)?,
        api_name: required("api_name", &product.api_name)?,
        dosage_form: required("dosage_form", &product.dosage_form)?,
        strength: required("strength", &product.strength)?,
        pack_size: required("pack_size", &product.pack_size)?,
        unit_price_usd,
        moq: whole_number("moq", product.moq)?,
        lead_time_days,
    })
}

/// Converts a non-negative whole quantity for storage.
#[allow(clippy::cast_possible_truncation)]
fn whole_number(field: &'static str, value: Option<f64>) -> Result<Option<i64>> {
    match non_negative(field, value)? {
        Some(v) if v.fract() != 0.0 || v > 9.0e15 => {
            Err(Error::validation(field, "must be a whole number"))
        }
        Some(v) => Ok(Some(v as i64)),
        None => Ok(None),
    }
}

/// Inserts a new catalog entry for an existing supplier.
///
/// # Errors
/// Returns [`Error::Validation`] for a missing required field or a negative
/// price, MOQ or lead time, and a database error if the supplier does not
/// exist or the insert fails.
pub async fn create_product(db: &DatabaseConnection, product: &Product) -> Result<Product> {
    let checked = validate(product)?;
    let id = Uuid::new_v4();

    let model = supplier_product::ActiveModel {
        id: Set(id),
        supplier_id: Set(checked.supplier_id),
        api_name: Set(checked.api_name),
        dosage_form: Set(Some(checked.dosage_form)),
        strength: Set(Some(checked.strength)),
        pack_size: Set(Some(checked.pack_size)),
        unit_price_usd: Set(Some(checked.unit_price_usd)),
        moq: Set(checked.moq),
        lead_time_days: Set(checked.lead_time_days),
        description: Set(optional(&product.description)),
        created_at: Set(Utc::now()),
    }
    .insert(db)
    .await?;

    info!(%id, supplier_id = %model.supplier_id, "Created product");
    canonical("product", &model, id, normalize_products)
}

/// Overwrites the editable fields of the product with `product.id`.
///
/// # Errors
/// Returns [`Error::Validation`] for invalid fields, [`Error::NotFound`] if
/// no such product exists, or a database error.
pub async fn update_product(db: &DatabaseConnection, product: &Product) -> Result<Product> {
    let checked = validate(product)?;
    let id = parse_id("product", &product.id)?;

    let mut active: supplier_product::ActiveModel = supplier_product::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("product", &product.id))?
        .into();

    active.supplier_id = Set(checked.supplier_id);
    active.api_name = Set(checked.api_name);
    active.dosage_form = Set(Some(checked.dosage_form));
    active.strength = Set(Some(checked.strength));
    active.pack_size = Set(Some(checked.pack_size));
    active.unit_price_usd = Set(Some(checked.unit_price_usd));
    active.moq = Set(checked.moq);
    active.lead_time_days = Set(checked.lead_time_days);
    active.description = Set(optional(&product.description));

    let model = active.update(db).await?;
    info!(%id, "Updated product");
    canonical("product", &model, id, normalize_products)
}

/// Deletes a catalog entry.
///
/// # Errors
/// Returns [`Error::NotFound`] if no such product exists, or a database error.
pub async fn delete_product(db: &DatabaseConnection, id: &str) -> Result<()> {
    let uuid = parse_id("product", id)?;
    let result = supplier_product::Entity::delete_by_id(uuid).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(Error::not_found("product", id));
    }
    info!(%uuid, "Deleted product");
    Ok(())
}
