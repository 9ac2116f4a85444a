//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the backend tables; [`crate::models`] holds the
//! canonical shapes the rest of the crate works with.

pub mod client;
pub mod deal;
pub mod requirement;
pub mod supplier;
pub mod supplier_product;

// Re-export specific types to avoid conflicts
pub use client::{Column as ClientColumn, Entity as Client, Model as ClientModel};
pub use deal::{Column as DealColumn, Entity as Deal, Model as DealModel, Stage};
pub use requirement::{
    Column as RequirementColumn, Entity as Requirement, Model as RequirementModel,
};
pub use supplier::{Column as SupplierColumn, Entity as Supplier, Model as SupplierModel};
pub use supplier_product::{
    Column as SupplierProductColumn, Entity as SupplierProduct, Model as SupplierProductModel,
};
