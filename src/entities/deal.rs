//! Deal entity - A sales-pipeline record in the `deals` table.
//!
//! References to client, supplier, product and requirement are soft: a deal
//! carries a snapshot of their display fields and stays readable after the
//! source rows change or disappear.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Deal database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "deals")]
pub struct Model {
    /// Unique identifier for the deal
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// Headline (e.g. "Amoxicillin Capsules - Global Meds Ltd")
    pub title: String,
    /// Client reference
    pub client_id: Option<Uuid>,
    /// Supplier reference
    pub supplier_id: Option<Uuid>,
    /// Product reference
    pub product_id: Option<Uuid>,
    /// Originating requirement
    pub requirement_id: Option<Uuid>,
    /// Client name snapshot
    pub client_name: Option<String>,
    /// Supplier name snapshot
    pub supplier_name: Option<String>,
    /// Product name snapshot
    pub product_name: Option<String>,
    /// Dosage form snapshot
    pub dosage_form: Option<String>,
    /// Strength snapshot
    pub strength: Option<String>,
    /// Pack size snapshot
    pub pack_size: Option<String>,
    /// Quantity
    pub quantity: Option<f64>,
    /// Unit price in `currency`
    pub unit_price: Option<f64>,
    /// `quantity * unit_price`
    pub total_value_usd: Option<f64>,
    /// ISO currency code
    pub currency: String,
    /// Commission as a fraction (0.05 = 5%)
    pub commission_rate: f64,
    /// Win probability in percent
    pub probability: Option<i32>,
    /// Pipeline stage, restricted to the four-value vocabulary
    pub stage: Stage,
    /// One of `low`, `medium`, `high`
    pub priority: String,
    /// Expected close date
    pub expected_close_date: Option<Date>,
    /// Next planned action
    pub next_action: Option<String>,
    /// Free-text notes
    pub notes: Option<String>,
    /// `manual` or `intelligent_matching`
    pub source: String,
    /// Match score the deal was created from
    pub similarity_score: Option<i32>,
    /// When the deal was created
    pub created_at: DateTimeUtc,
    /// When the deal last changed
    pub updated_at: DateTimeUtc,
}

/// Deals have no enforced relations; references are snapshots
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Pipeline stage of a deal.
#[derive(
    Copy, Clone, Debug, Default, EnumIter, DeriveActiveEnum, Eq, PartialEq, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// First contact
    #[default]
    #[sea_orm(string_value = "lead")]
    Lead,
    /// Terms under discussion
    #[sea_orm(string_value = "negotiation")]
    Negotiation,
    /// Contract drafted or under review
    #[sea_orm(string_value = "contract")]
    Contract,
    /// Done
    #[sea_orm(string_value = "closed")]
    Closed,
}
