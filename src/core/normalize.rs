//! Entity normalization - raw rows to canonical models.
//!
//! Rows arrive as `serde_json::Value` objects, either serialized from the
//! backend tables or parsed from fixture files that still use older column
//! names. Every field is read through a fixed list of known names; the first
//! non-null value wins (blank strings count as null). Anything still missing
//! gets a defined default. Only `id` is mandatory: a record without one is
//! dropped with a warning and the rest of the batch is kept.

use crate::{
    core::stage::normalize_stage,
    entities::Stage,
    models::{
        Client, ClientStatus, Deal, DealSource, Priority, Product, Requirement, RequirementStatus,
        Supplier, SupplierStatus,
    },
};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::{Map, Value};
use std::str::FromStr;
use tracing::{debug, warn};

type Row = Map<String, Value>;

const ID: &[&str] = &["id"];
const NAME: &[&str] = &["name", "company_name"];
const SEGMENT: &[&str] = &["segment", "industry"];
const CONTACT_NAME: &[&str] = &["contact_name", "contact_person"];
const CONTACT_EMAIL: &[&str] = &["contact_email", "email"];
const CONTACT_PHONE: &[&str] = &["contact_phone", "phone"];
const SUPPLIER_COUNTRY: &[&str] = &["country", "location"];
const REQUIREMENT_QUANTITY: &[&str] = &["quantity", "annual_volume"];
const PRODUCT_MOQ: &[&str] = &["moq", "minimum_order_quantity"];
const DEAL_TOTAL_VALUE: &[&str] = &["total_value_usd", "deal_value", "value_usd"];
const DEAL_UNIT_PRICE: &[&str] = &["unit_price", "unit_price_usd"];
const DEAL_PRODUCT_NAME: &[&str] = &["product_name", "title"];
const DEAL_LAST_ACTIVITY: &[&str] = &["last_activity", "updated_at", "created_at"];

/// Normalizes raw client rows.
#[must_use]
pub fn normalize_clients(rows: &[Value]) -> Vec<Client> {
    normalize_batch("client", rows, |id, row| Client {
        id,
        name: text_or_default(row, NAME),
        country: text_or_default(row, &["country"]),
        segment: text_or_default(row, SEGMENT),
        contact_name: text_or_default(row, CONTACT_NAME),
        contact_email: text_or_default(row, CONTACT_EMAIL),
        contact_phone: text_or_default(row, CONTACT_PHONE),
        status: vocabulary(row, &["status"], "client status"),
        notes: text_or_default(row, &["notes"]),
        created_at: timestamp(row, &["created_at"]),
    })
}

/// Normalizes raw requirement rows.
#[must_use]
pub fn normalize_requirements(rows: &[Value]) -> Vec<Requirement> {
    normalize_batch("requirement", rows, |id, row| Requirement {
        id,
        client_id: text_or_default(row, &["client_id"]),
        product_name: text_or_default(row, &["product_name"]),
        api_name: text_or_default(row, &["api_name"]),
        dosage_form: text_or_default(row, &["dosage_form"]),
        strength: text_or_default(row, &["strength"]),
        quantity: number(row, REQUIREMENT_QUANTITY),
        unit: text_or_default(row, &["unit"]),
        budget_usd: number(row, &["budget_usd"]),
        deadline: timestamp(row, &["deadline"]),
        priority: vocabulary::<Priority>(row, &["priority"], "requirement priority"),
        status: vocabulary::<RequirementStatus>(row, &["status"], "requirement status"),
        notes: text_or_default(row, &["notes"]),
        created_at: timestamp(row, &["created_at"]),
    })
}

/// Normalizes raw supplier rows.
#[must_use]
pub fn normalize_suppliers(rows: &[Value]) -> Vec<Supplier> {
    normalize_batch("supplier", rows, |id, row| Supplier {
        id,
        name: text_or_default(row, NAME),
        country: text_or_default(row, SUPPLIER_COUNTRY),
        status: vocabulary_or(row, &["status"], "supplier status", SupplierStatus::Inactive),
        contact_name: text_or_default(row, CONTACT_NAME),
        contact_email: text_or_default(row, CONTACT_EMAIL),
        contact_phone: text_or_default(row, CONTACT_PHONE),
        website: text_or_default(row, &["website"]),
        notes: text_or_default(row, &["notes"]),
        created_at: timestamp(row, &["created_at"]),
    })
}

/// Normalizes raw supplier product rows.
#[must_use]
pub fn normalize_products(rows: &[Value]) -> Vec<Product> {
    normalize_batch("product", rows, |id, row| Product {
        id,
        supplier_id: text_or_default(row, &["supplier_id"]),
        api_name: text_or_default(row, &["api_name"]),
        dosage_form: text_or_default(row, &["dosage_form"]),
        strength: text_or_default(row, &["strength"]),
        pack_size: text_or_default(row, &["pack_size"]),
        unit_price_usd: number(row, &["unit_price_usd"]),
        moq: number(row, PRODUCT_MOQ),
        lead_time_days: integer(row, &["lead_time_days"]),
        description: text_or_default(row, &["description"]),
        created_at: timestamp(row, &["created_at"]),
    })
}

/// Normalizes raw deal rows.
///
/// When both quantity and unit price are present the total is recomputed
/// from them; otherwise the stored total (under any of its known names) is
/// kept as-is.
#[must_use]
pub fn normalize_deals(rows: &[Value]) -> Vec<Deal> {
    normalize_batch("deal", rows, |id, row| {
        let quantity = number(row, &["quantity"]);
        let unit_price = number(row, DEAL_UNIT_PRICE);
        let total_value = match (quantity, unit_price) {
            (Some(q), Some(p)) => Some(q * p),
            _ => number(row, DEAL_TOTAL_VALUE),
        };
        let product_name = text(row, DEAL_PRODUCT_NAME).unwrap_or_else(|| "Product".to_string());

        Deal {
            title: text(row, &["title"]).unwrap_or_else(|| product_name.clone()),
            client_id: text(row, &["client_id"]),
            supplier_id: text(row, &["supplier_id"]),
            product_id: text(row, &["product_id"]),
            requirement_id: text(row, &["requirement_id"]),
            client_name: text(row, &["client_name"]).unwrap_or_else(|| "Client".to_string()),
            supplier_name: text(row, &["supplier_name"]).unwrap_or_else(|| "Supplier".to_string()),
            product_name,
            dosage_form: text_or_default(row, &["dosage_form"]),
            strength: text_or_default(row, &["strength"]),
            pack_size: text_or_default(row, &["pack_size"]),
            quantity,
            unit_price,
            total_value,
            currency: text(row, &["currency"]).unwrap_or_else(|| "USD".to_string()),
            commission_rate: number(row, &["commission_rate"]).unwrap_or(0.0),
            probability: percent(row, &["probability"]),
            stage: stage(&id, row),
            priority: vocabulary::<Priority>(row, &["priority"], "deal priority"),
            expected_close_date: date(row, &["expected_close_date"]),
            next_action: text_or_default(row, &["next_action"]),
            notes: text_or_default(row, &["notes"]),
            source: vocabulary::<DealSource>(row, &["source"], "deal source"),
            similarity_score: percent(row, &["similarity_score"]),
            created_at: timestamp(row, &["created_at"]),
            last_activity: timestamp(row, DEAL_LAST_ACTIVITY),
            id,
        }
    })
}

fn normalize_batch<T>(
    entity: &'static str,
    rows: &[Value],
    map: impl Fn(String, &Row) -> T,
) -> Vec<T> {
    let normalized: Vec<T> = rows
        .iter()
        .enumerate()
        .filter_map(|(index, raw)| {
            let Some(row) = raw.as_object() else {
                warn!(entity, index, "Dropping {entity} record that is not an object");
                return None;
            };
            let Some(id) = text(row, ID) else {
                warn!(entity, index, "Dropping {entity} record without an id");
                return None;
            };
            Some(map(id, row))
        })
        .collect();

    debug!(
        entity,
        received = rows.len(),
        kept = normalized.len(),
        "Normalized {entity} rows"
    );
    normalized
}

/// First non-null, non-blank value under any of `names`, rendered as text.
fn text(row: &Row, names: &[&str]) -> Option<String> {
    names.iter().find_map(|name| match row.get(*name)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    })
}

fn text_or_default(row: &Row, names: &[&str]) -> String {
    text(row, names).unwrap_or_default()
}

/// First value under any of `names` that reads as a finite number.
/// Numeric strings are accepted since decimal columns often arrive as text.
fn number(row: &Row, names: &[&str]) -> Option<f64> {
    names
        .iter()
        .find_map(|name| match row.get(*name)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        })
        .filter(|n| n.is_finite())
}

#[allow(clippy::cast_possible_truncation)]
fn integer(row: &Row, names: &[&str]) -> Option<i64> {
    number(row, names).map(|n| n.round() as i64)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn percent(row: &Row, names: &[&str]) -> Option<u8> {
    number(row, names).map(|n| n.round().clamp(0.0, 100.0) as u8)
}

fn timestamp(row: &Row, names: &[&str]) -> Option<DateTime<Utc>> {
    names.iter().find_map(|name| match row.get(*name)? {
        Value::String(s) => parse_timestamp(s.trim()),
        _ => None,
    })
}

fn date(row: &Row, names: &[&str]) -> Option<NaiveDate> {
    names.iter().find_map(|name| match row.get(*name)? {
        Value::String(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .ok()
            .or_else(|| parse_timestamp(s.trim()).map(|t| t.date_naive())),
        _ => None,
    })
}

/// Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS[.f]` (taken as UTC) and bare dates.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(t) = DateTime::parse_from_rfc3339(raw) {
        return Some(t.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(t) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(t.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|t| t.and_utc())
}

/// Parses a closed-vocabulary field; missing and unknown values both become
/// the type's default.
fn vocabulary<T>(row: &Row, names: &[&str], what: &'static str) -> T
where
    T: FromStr + Default,
{
    vocabulary_or(row, names, what, T::default())
}

/// Like [`vocabulary`], but an unrecognised value becomes `unknown` instead.
fn vocabulary_or<T>(row: &Row, names: &[&str], what: &'static str, unknown: T) -> T
where
    T: FromStr + Default,
{
    let Some(raw) = text(row, names) else {
        return T::default();
    };
    raw.parse().unwrap_or_else(|_| {
        warn!(value = %raw, "Unknown {what}");
        unknown
    })
}

/// Legacy six-stage values read back onto the four-stage pipeline. Writes
/// still reject them.
fn legacy_stage(raw: &str) -> Option<Stage> {
    match raw.trim().to_lowercase().as_str() {
        "closed_won" | "closed_lost" => Some(Stage::Closed),
        "qualified" => Some(Stage::Lead),
        _ => None,
    }
}

fn stage(id: &str, row: &Row) -> Stage {
    let Some(raw) = text(row, &["stage"]) else {
        return Stage::default();
    };
    normalize_stage(&raw).unwrap_or_else(|e| {
        if let Some(stage) = legacy_stage(&raw) {
            debug!(deal_id = id, value = %raw, stage = stage.as_str(), "Mapped legacy stage");
            return stage;
        }
        warn!(deal_id = id, "{e}; showing deal as lead");
        Stage::default()
    })
}
