//! Client persistence - reads and writes the `clients` table.
//!
//! Functions take and return canonical [`Client`] values; the store model
//! stays inside this module. Deleting a client also deletes its
//! requirements through the foreign key.

use crate::{
    core::{
        normalize::normalize_clients,
        store::{canonical, optional, parse_id, required, to_rows, validate_email},
    },
    entities::{ClientColumn, client},
    errors::{Error, Result},
    models::Client,
};
use chrono::Utc;
use sea_orm::{QueryOrder, Set, prelude::*};
use serde_json::Value;
use tracing::{debug, info};

/// All client rows, newest first, in raw row form.
///
/// # Errors
/// Returns an error if the query fails.
pub async fn fetch_client_rows(db: &DatabaseConnection) -> Result<Vec<Value>> {
    let models = client::Entity::find()
        .order_by_desc(ClientColumn::CreatedAt)
        .all(db)
        .await?;
    debug!(count = models.len(), "Fetched client rows");
    to_rows(&models)
}

fn validate(client: &Client) -> Result<String> {
    validate_email("contact_email", &client.contact_email)?;
    required("name", &client.name)
}

/// Inserts a new client. The id and creation time are assigned here.
///
/// # Errors
/// Returns [`Error::Validation`] for a blank name or malformed email, or a
/// database error if the insert fails.
pub async fn create_client(db: &DatabaseConnection, client: &Client) -> Result<Client> {
    let name = validate(client)?;
    let id = Uuid::new_v4();

    let model = client::ActiveModel {
        id: Set(id),
        name: Set(name),
        country: Set(optional(&client.country)),
        segment: Set(optional(&client.segment)),
        contact_name: Set(optional(&client.contact_name)),
        contact_email: Set(optional(&client.contact_email)),
        contact_phone: Set(optional(&client.contact_phone)),
        status: Set(client.status.as_str().to_string()),
        notes: Set(optional(&client.notes)),
        created_at: Set(Utc::now()),
    }
    .insert(db)
    .await?;

    info!(%id, name = %model.name, "Created client");
    canonical("client", &model, id, normalize_clients)
}

/// Overwrites the editable fields of the client with `client.id`.
///
/// # Errors
/// Returns [`Error::Validation`] for invalid fields, [`Error::NotFound`] if
/// no such client exists, or a database error.
pub async fn update_client(db: &DatabaseConnection, client: &Client) -> Result<Client> {
    let name = validate(client)?;
    let id = parse_id("client", &client.id)?;

    let mut active: client::ActiveModel = client::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("client", &client.id))?
        .into();

    active.name = Set(name);
    active.country = Set(optional(&client.country));
    active.segment = Set(optional(&client.segment));
    active.contact_name = Set(optional(&client.contact_name));
    active.contact_email = Set(optional(&client.contact_email));
    active.contact_phone = Set(optional(&client.contact_phone));
    active.status = Set(client.status.as_str().to_string());
    active.notes = Set(optional(&client.notes));

    let model = active.update(db).await?;
    info!(%id, "Updated client");
    canonical("client", &model, id, normalize_clients)
}

/// Deletes a client and, through the foreign key, its requirements.
///
/// # Errors
/// Returns [`Error::NotFound`] if no such client exists, or a database error.
pub async fn delete_client(db: &DatabaseConnection, id: &str) -> Result<()> {
    let uuid = parse_id("client", id)?;
    let result = client::Entity::delete_by_id(uuid).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(Error::not_found("client", id));
    }
    info!(%uuid, "Deleted client");
    Ok(())
}
