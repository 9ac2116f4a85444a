//! Helpers shared by the per-table persistence functions.

use crate::errors::{Error, Result};
use regex::Regex;
use sea_orm::prelude::Uuid;
use serde::Serialize;
use serde_json::Value;
use std::sync::LazyLock;

const EMAIL_PATTERN: &str = r"^[^\s@]+@[^\s@]+\.[^\s@]+$";

static EMAIL_RE: LazyLock<std::result::Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(EMAIL_PATTERN));

/// Parses the id of an existing row. Anything that is not a UUID cannot be
/// in the store, so it reads as not found.
pub(crate) fn parse_id(entity: &'static str, id: &str) -> Result<Uuid> {
    Uuid::parse_str(id.trim()).map_err(|_| Error::not_found(entity, id))
}

/// Parses a mandatory reference to another row.
pub(crate) fn parse_reference(field: &'static str, id: &str) -> Result<Uuid> {
    if id.trim().is_empty() {
        return Err(Error::validation(field, "is required"));
    }
    Uuid::parse_str(id.trim())
        .map_err(|_| Error::validation(field, format!("'{id}' is not a stored record id")))
}

/// Serializes models into the raw row shape the normalizer reads.
pub(crate) fn to_rows<M: Serialize>(models: &[M]) -> Result<Vec<Value>> {
    models
        .iter()
        .map(|m| serde_json::to_value(m).map_err(Into::into))
        .collect()
}

/// Converts one stored model into its canonical entity.
pub(crate) fn canonical<M, T>(
    entity: &'static str,
    model: &M,
    id: Uuid,
    normalize: fn(&[Value]) -> Vec<T>,
) -> Result<T>
where
    M: Serialize,
{
    let row = serde_json::to_value(model)?;
    normalize(std::slice::from_ref(&row))
        .into_iter()
        .next()
        .ok_or_else(|| Error::not_found(entity, id.to_string()))
}

/// Trimmed text, or `None` when blank.
pub(crate) fn optional(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Trimmed text that must not be blank.
pub(crate) fn required(field: &'static str, value: &str) -> Result<String> {
    optional(value).ok_or_else(|| Error::validation(field, "is required"))
}

/// Accepts a blank address; anything else must look like `user@host.tld`.
pub(crate) fn validate_email(field: &'static str, value: &str) -> Result<()> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(());
    }
    let re = EMAIL_RE.as_ref().map_err(|e| Error::Config {
        message: format!("email pattern failed to compile: {e}"),
    })?;
    if re.is_match(value) {
        Ok(())
    } else {
        Err(Error::validation(field, "Please enter a valid email address"))
    }
}
