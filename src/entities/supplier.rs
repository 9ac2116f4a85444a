//! Supplier entity - A manufacturer or distributor in the `suppliers` table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Supplier database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "suppliers")]
pub struct Model {
    /// Unique identifier for the supplier
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// Company display name
    pub name: String,
    /// Country or location
    pub country: Option<String>,
    /// One of `active`, `inactive`, `pending`, `blocked`
    pub status: String,
    /// Company website
    pub website: Option<String>,
    /// Contact person
    pub contact_name: Option<String>,
    /// Contact email
    pub contact_email: Option<String>,
    /// Contact phone
    pub contact_phone: Option<String>,
    /// Free-text notes
    pub notes: Option<String>,
    /// When the supplier was created
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Supplier and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One supplier has many catalog products
    #[sea_orm(has_many = "super::supplier_product::Entity")]
    Products,
}

impl Related<super::supplier_product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Products.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
