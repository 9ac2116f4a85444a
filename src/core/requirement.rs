//! Requirement persistence - reads and writes `client_requirements`.

use crate::{
    core::{
        normalize::normalize_requirements,
        store::{canonical, optional, parse_id, parse_reference, required, to_rows},
        synthesis::non_negative,
    },
    entities::{RequirementColumn, requirement},
    errors::{Error, Result},
    models::Requirement,
};
use chrono::Utc;
use sea_orm::{QueryOrder, Set, prelude::*};
use serde_json::Value;
use tracing::{debug, info};

/// All requirement rows, newest first, in raw row form.
///
/// # Errors
/// Returns an error if the query fails.
pub async fn fetch_requirement_rows(db: &DatabaseConnection) -> Result<Vec<Value>> {
    let models = requirement::Entity::find()
        .order_by_desc(RequirementColumn::CreatedAt)
        .all(db)
        .await?;
    debug!(count = models.len(), "Fetched requirement rows");
    to_rows(&models)
}

struct Checked {
    client_id: Uuid,
    product_name: String,
    quantity: Option<f64>,
    budget_usd: Option<f64>,
}

fn validate(requirement: &Requirement) -> Result<Checked> {
    Ok(Checked {
        client_id: parse_reference("client_id", &requirement.client_id)?,
        product_name: required("product_name", &requirement.product_name)?,
        quantity: non_negative("quantity", requirement.quantity)?,
        budget_usd: non_negative("budget_usd", requirement.budget_usd)?,
    })
}

/// Inserts a new requirement for an existing client.
///
/// # Errors
/// Returns [`Error::Validation`] for a missing client or product name or a
/// negative quantity or budget, and a database error if the client does not
/// exist or the insert fails.
pub async fn create_requirement(
    db: &DatabaseConnection,
    requirement: &Requirement,
) -> Result<Requirement> {
    let checked = validate(requirement)?;
    let id = Uuid::new_v4();

    let model = requirement::ActiveModel {
        id: Set(id),
        client_id: Set(checked.client_id),
        product_name: Set(checked.product_name),
        api_name: Set(optional(&requirement.api_name)),
        dosage_form: Set(optional(&requirement.dosage_form)),
        strength: Set(optional(&requirement.strength)),
        annual_volume: Set(checked.quantity),
        unit: Set(optional(&requirement.unit)),
        budget_usd: Set(checked.budget_usd),
        deadline: Set(requirement.deadline),
        priority: Set(Some(requirement.priority.as_str().to_string())),
        status: Set(requirement.status.as_str().to_string()),
        notes: Set(optional(&requirement.notes)),
        created_at: Set(Utc::now()),
    }
    .insert(db)
    .await?;

    info!(%id, client_id = %model.client_id, "Created requirement");
    canonical("requirement", &model, id, normalize_requirements)
}

/// Overwrites the editable fields of the requirement with `requirement.id`.
///
/// # Errors
/// Returns [`Error::Validation`] for invalid fields, [`Error::NotFound`] if
/// no such requirement exists, or a database error.
pub async fn update_requirement(
    db: &DatabaseConnection,
    requirement: &Requirement,
) -> Result<Requirement> {
    let checked = validate(requirement)?;
    let id = parse_id("requirement", &requirement.id)?;

    let mut active: requirement::ActiveModel = requirement::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("requirement", &requirement.id))?
        .into();

    active.client_id = Set(checked.client_id);
    active.product_name = Set(checked.product_name);
    active.api_name = Set(optional(&requirement.api_name));
    active.dosage_form = Set(optional(&requirement.dosage_form));
    active.strength = Set(optional(&requirement.strength));
    active.annual_volume = Set(checked.quantity);
    active.unit = Set(optional(&requirement.unit));
    active.budget_usd = Set(checked.budget_usd);
    active.deadline = Set(requirement.deadline);
    active.priority = Set(Some(requirement.priority.as_str().to_string()));
    active.status = Set(requirement.status.as_str().to_string());
    active.notes = Set(optional(&requirement.notes));

    let model = active.update(db).await?;
    info!(%id, "Updated requirement");
    canonical("requirement", &model, id, normalize_requirements)
}

/// Deletes a requirement. Deals created from it keep their snapshot.
///
/// # Errors
/// Returns [`Error::NotFound`] if no such requirement exists, or a database
/// error.
pub async fn delete_requirement(db: &DatabaseConnection, id: &str) -> Result<()> {
    let uuid = parse_id("requirement", id)?;
    let result = requirement::Entity::delete_by_id(uuid).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(Error::not_found("requirement", id));
    }
    info!(%uuid, "Deleted requirement");
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::models::{Priority, RequirementStatus};
    use crate::test_utils::{create_test_client, setup_test_db};
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn test_quantity_round_trips_through_annual_volume() -> Result<()> {
        let db = setup_test_db().await?;
        let client = create_test_client(&db, "Global Pharma Distribution").await?;

        let created = create_requirement(
            &db,
            &Requirement {
                client_id: client.id.clone(),
                product_name: "Amoxicillin Capsules".to_string(),
                api_name: "Amoxicillin Trihydrate".to_string(),
                dosage_form: "capsule".to_string(),
                strength: "250mg".to_string(),
                quantity: Some(200_000.0),
                unit: "pieces".to_string(),
                budget_usd: Some(25_000.0),
                priority: Priority::High,
                ..Requirement::default()
            },
        )
        .await?;
        assert_eq!(created.quantity, Some(200_000.0));
        assert_eq!(created.client_id, client.id);
        assert_eq!(created.status, RequirementStatus::Open);

        let rows = fetch_requirement_rows(&db).await?;
        assert_eq!(rows[0]["annual_volume"], serde_json::json!(200_000.0));
        let requirements = normalize_requirements(&rows);
        assert_eq!(requirements[0].quantity, Some(200_000.0));
        assert_eq!(requirements[0].priority, Priority::High);
        Ok(())
    }

    #[tokio::test]
    async fn test_update_requirement_status() -> Result<()> {
        let db = setup_test_db().await?;
        let client = create_test_client(&db, "MedTech Solutions Inc.").await?;
        let mut requirement =
            crate::test_utils::create_test_requirement(&db, &client.id, "Atorvastatin Tablets")
                .await?;

        requirement.status = RequirementStatus::Closed;
        requirement.quantity = None;
        let updated = update_requirement(&db, &requirement).await?;
        assert_eq!(updated.status, RequirementStatus::Closed);
        assert_eq!(updated.quantity, None);

        delete_requirement(&db, &updated.id).await?;
        assert!(fetch_requirement_rows(&db).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_client_is_rejected_by_store() -> Result<()> {
        let db = setup_test_db().await?;
        let result = create_requirement(
            &db,
            &Requirement {
                client_id: Uuid::new_v4().to_string(),
                product_name: "Ibuprofen Tablets".to_string(),
                ..Requirement::default()
            },
        )
        .await;
        assert!(matches!(result, Err(Error::Database(_))));
        Ok(())
    }

    #[tokio::test]
    async fn test_validation_rejects_before_store() {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();
        let base = Requirement {
            client_id: Uuid::new_v4().to_string(),
            product_name: "Ibuprofen Tablets".to_string(),
            ..Requirement::default()
        };

        let missing_client = Requirement {
            client_id: "client-004".to_string(),
            ..base.clone()
        };
        assert!(matches!(
            create_requirement(&db, &missing_client).await,
            Err(Error::Validation {
                field: "client_id",
                ..
            })
        ));

        let negative = Requirement {
            budget_usd: Some(-1.0),
            ..base.clone()
        };
        assert!(matches!(
            create_requirement(&db, &negative).await,
            Err(Error::Validation {
                field: "budget_usd",
                ..
            })
        ));

        let unnamed = Requirement {
            product_name: " ".to_string(),
            ..base
        };
        assert!(matches!(
            create_requirement(&db, &unnamed).await,
            Err(Error::Validation {
                field: "product_name",
                ..
            })
        ));
    }
}
