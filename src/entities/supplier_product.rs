//! Supplier product entity - One catalog line in `supplier_products`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Supplier product database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "supplier_products")]
pub struct Model {
    /// Unique identifier for the product
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// Supplier offering the product
    pub supplier_id: Uuid,
    /// Active pharmaceutical ingredient
    pub api_name: String,
    /// Dosage form
    pub dosage_form: Option<String>,
    /// Strength
    pub strength: Option<String>,
    /// Pack size (e.g. "10x10")
    pub pack_size: Option<String>,
    /// Unit price in USD
    pub unit_price_usd: Option<f64>,
    /// Minimum order quantity
    pub moq: Option<i64>,
    /// Lead time in days
    pub lead_time_days: Option<i32>,
    /// Free-text description
    pub description: Option<String>,
    /// When the product was created
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Product and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each product belongs to one supplier
    #[sea_orm(
        belongs_to = "super::supplier::Entity",
        from = "Column::SupplierId",
        to = "super::supplier::Column::Id",
        on_delete = "Cascade"
    )]
    Supplier,
}

impl Related<super::supplier::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Supplier.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
