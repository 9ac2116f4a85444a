//! Requirement entity - A client's procurement need in `client_requirements`.
//!
//! The requested volume is stored as `annual_volume`; the canonical model
//! calls it `quantity`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Requirement database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "client_requirements")]
pub struct Model {
    /// Unique identifier for the requirement
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// Client that raised the requirement
    pub client_id: Uuid,
    /// Marketed product name (e.g. "Amoxicillin Capsules")
    pub product_name: String,
    /// Active pharmaceutical ingredient
    pub api_name: Option<String>,
    /// Dosage form
    pub dosage_form: Option<String>,
    /// Strength (e.g. "250mg")
    pub strength: Option<String>,
    /// Requested volume
    pub annual_volume: Option<f64>,
    /// Unit of the volume (e.g. "pieces", "vials")
    pub unit: Option<String>,
    /// Total budget in USD
    pub budget_usd: Option<f64>,
    /// Delivery deadline
    pub deadline: Option<DateTimeUtc>,
    /// One of `low`, `medium`, `high`
    pub priority: Option<String>,
    /// One of `open`, `in_progress`, `closed`
    pub status: String,
    /// Free-text notes
    pub notes: Option<String>,
    /// When the requirement was created
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Requirement and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each requirement belongs to one client
    #[sea_orm(
        belongs_to = "super::client::Entity",
        from = "Column::ClientId",
        to = "super::client::Column::Id",
        on_delete = "Cascade"
    )]
    Client,
}

impl Related<super::client::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Client.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
