//! Client entity - A buyer organisation in the `clients` table.
//!
//! Clients own their procurement requirements; deleting a client cascades to
//! its requirements but never to deals, which keep their own name snapshot.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Client database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "clients")]
pub struct Model {
    /// Unique identifier for the client
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// Company display name
    pub name: String,
    /// Country as entered (e.g. "United States")
    pub country: Option<String>,
    /// Market segment (e.g. "distribution", "research")
    pub segment: Option<String>,
    /// Primary contact person
    pub contact_name: Option<String>,
    /// Primary contact email
    pub contact_email: Option<String>,
    /// Primary contact phone
    pub contact_phone: Option<String>,
    /// One of `active`, `inactive`, `pending`
    pub status: String,
    /// Free-text notes
    pub notes: Option<String>,
    /// When the client was created
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Client and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One client has many requirements
    #[sea_orm(has_many = "super::requirement::Entity")]
    Requirements,
}

impl Related<super::requirement::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Requirements.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
