//! Canonical in-memory shapes shared by every screen.
//!
//! Rows from the store and from fixture files both end up here after
//! normalization (see [`crate::core::normalize`]). Ids are plain strings
//! because fixture ids (`client-001`) are not UUIDs.

use crate::entities::deal::Stage;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Implements `as_str`, `Display` and a case-insensitive `FromStr` for a
/// closed vocabulary enum. Extra spellings map onto existing variants.
macro_rules! vocabulary {
    ($name:ident { $($variant:ident => $text:literal $(| $alias:literal)*),+ $(,)? }) => {
        impl $name {
            /// Canonical lower-case storage form.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(raw: &str) -> Result<Self, Self::Err> {
                match raw.trim().to_lowercase().as_str() {
                    $($text $(| $alias)* => Ok(Self::$variant),)+
                    other => Err(other.to_string()),
                }
            }
        }
    };
}

/// Client account status.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientStatus {
    /// Currently buying
    #[default]
    Active,
    /// Dormant account
    Inactive,
    /// Onboarding not finished
    Pending,
}

vocabulary!(ClientStatus {
    Active => "active",
    Inactive => "inactive",
    Pending => "pending",
});

/// Supplier status. Only [`SupplierStatus::Active`] suppliers are matched.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SupplierStatus {
    /// Eligible for matching
    #[default]
    Active,
    /// Not trading
    Inactive,
    /// Under review
    Pending,
    /// Explicitly excluded
    Blocked,
}

vocabulary!(SupplierStatus {
    Active => "active",
    Inactive => "inactive",
    Pending => "pending",
    Blocked => "blocked",
});

/// Requirement lifecycle status.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequirementStatus {
    /// Waiting for a match
    #[default]
    Open,
    /// Being worked on
    InProgress,
    /// Fulfilled or abandoned
    Closed,
}

vocabulary!(RequirementStatus {
    Open => "open",
    InProgress => "in_progress" | "in progress" | "in-progress",
    Closed => "closed" | "fulfilled",
});

/// Priority shared by requirements and deals.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    /// Low
    Low,
    /// Medium
    #[default]
    Medium,
    /// High
    High,
}

vocabulary!(Priority {
    Low => "low",
    Medium => "medium",
    High => "high",
});

/// How a deal came into existence.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DealSource {
    /// Entered by hand
    #[default]
    Manual,
    /// Spawned from a ranked match
    IntelligentMatching,
}

vocabulary!(DealSource {
    Manual => "manual",
    IntelligentMatching => "intelligent_matching",
});

/// A buyer of pharmaceutical products.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Client {
    /// Identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Country as stored; compared verbatim when scoring geography
    pub country: String,
    /// Market segment (distribution, research, healthcare, ...)
    pub segment: String,
    /// Primary contact name
    pub contact_name: String,
    /// Primary contact email
    pub contact_email: String,
    /// Primary contact phone
    pub contact_phone: String,
    /// Account status
    pub status: ClientStatus,
    /// Free text
    pub notes: String,
    /// Creation timestamp, if known
    pub created_at: Option<DateTime<Utc>>,
}

/// A client's procurement need.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Requirement {
    /// Identifier
    pub id: String,
    /// Owning client (non-owning back-reference)
    pub client_id: String,
    /// Marketed product name
    pub product_name: String,
    /// Active ingredient
    pub api_name: String,
    /// Dosage form (tablet, capsule, injection, ...)
    pub dosage_form: String,
    /// Strength, e.g. `250mg`
    pub strength: String,
    /// Requested volume
    pub quantity: Option<f64>,
    /// Unit of `quantity`
    pub unit: String,
    /// Total budget in USD
    pub budget_usd: Option<f64>,
    /// Delivery deadline
    pub deadline: Option<DateTime<Utc>>,
    /// Priority
    pub priority: Priority,
    /// Status
    pub status: RequirementStatus,
    /// Free text
    pub notes: String,
    /// Creation timestamp, if known
    pub created_at: Option<DateTime<Utc>>,
}

/// A manufacturer or distributor.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Supplier {
    /// Identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Country or location as stored
    pub country: String,
    /// Status
    pub status: SupplierStatus,
    /// Contact name
    pub contact_name: String,
    /// Contact email
    pub contact_email: String,
    /// Contact phone
    pub contact_phone: String,
    /// Website URL
    pub website: String,
    /// Free text
    pub notes: String,
    /// Creation timestamp, if known
    pub created_at: Option<DateTime<Utc>>,
}

/// One catalog entry of a supplier.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Identifier
    pub id: String,
    /// Owning supplier
    pub supplier_id: String,
    /// Active ingredient
    pub api_name: String,
    /// Dosage form
    pub dosage_form: String,
    /// Strength
    pub strength: String,
    /// Pack size, e.g. `10x10`
    pub pack_size: String,
    /// Unit price in USD
    pub unit_price_usd: Option<f64>,
    /// Minimum order quantity
    pub moq: Option<f64>,
    /// Lead time in days
    pub lead_time_days: Option<i64>,
    /// Free text
    pub description: String,
    /// Creation timestamp, if known
    pub created_at: Option<DateTime<Utc>>,
}

/// A sales-pipeline record.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Deal {
    /// Identifier
    pub id: String,
    /// Headline shown in lists
    pub title: String,
    /// Referenced client, if any
    pub client_id: Option<String>,
    /// Referenced supplier, if any
    pub supplier_id: Option<String>,
    /// Referenced product, if any
    pub product_id: Option<String>,
    /// Originating requirement, if any
    pub requirement_id: Option<String>,
    /// Client name at creation time
    pub client_name: String,
    /// Supplier name at creation time
    pub supplier_name: String,
    /// Product name at creation time
    pub product_name: String,
    /// Dosage form at creation time
    pub dosage_form: String,
    /// Strength at creation time
    pub strength: String,
    /// Pack size at creation time
    pub pack_size: String,
    /// Quantity
    pub quantity: Option<f64>,
    /// Unit price
    pub unit_price: Option<f64>,
    /// `quantity * unit_price` when both are known
    pub total_value: Option<f64>,
    /// ISO currency code
    pub currency: String,
    /// Broker commission as a fraction
    pub commission_rate: f64,
    /// Win probability in percent
    pub probability: Option<u8>,
    /// Pipeline position
    pub stage: Stage,
    /// Priority
    pub priority: Priority,
    /// Expected close date
    pub expected_close_date: Option<NaiveDate>,
    /// Next planned action
    pub next_action: String,
    /// Free text
    pub notes: String,
    /// Origin of the deal
    pub source: DealSource,
    /// Match score the deal was created from
    pub similarity_score: Option<u8>,
    /// Creation timestamp, if known
    pub created_at: Option<DateTime<Utc>>,
    /// Last change, if known
    pub last_activity: Option<DateTime<Utc>>,
}

/// Every canonical entity has a string id.
pub trait Identified {
    /// The entity id.
    fn id(&self) -> &str;
}

macro_rules! identified {
    ($($ty:ty),+) => {
        $(impl Identified for $ty {
            fn id(&self) -> &str {
                &self.id
            }
        })+
    };
}

identified!(Client, Requirement, Supplier, Product, Deal);

/// Where an in-memory entity came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Origin {
    /// Loaded from or written to the backend
    Live,
    /// Bundled sample data; never written back
    Fixture,
}

/// An entity together with its origin.
#[derive(Clone, Debug, PartialEq)]
pub struct Tracked<T> {
    /// Where the entity came from
    pub origin: Origin,
    /// The entity itself
    pub entity: T,
}

impl<T> Tracked<T> {
    /// Wraps a backend entity.
    pub const fn live(entity: T) -> Self {
        Self {
            origin: Origin::Live,
            entity,
        }
    }

    /// Wraps a fixture entity.
    pub const fn fixture(entity: T) -> Self {
        Self {
            origin: Origin::Fixture,
            entity,
        }
    }

    /// Whether writes for this entity go to the backend.
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.origin == Origin::Live
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vocabulary_parsing_is_case_insensitive() {
        assert_eq!("Active".parse::<SupplierStatus>(), Ok(SupplierStatus::Active));
        assert_eq!(" BLOCKED ".parse::<SupplierStatus>(), Ok(SupplierStatus::Blocked));
        assert_eq!("High".parse::<Priority>(), Ok(Priority::High));
        assert!("urgent".parse::<Priority>().is_err());
    }

    #[test]
    fn test_requirement_status_aliases() {
        assert_eq!(
            "fulfilled".parse::<RequirementStatus>(),
            Ok(RequirementStatus::Closed)
        );
        assert_eq!(
            "In Progress".parse::<RequirementStatus>(),
            Ok(RequirementStatus::InProgress)
        );
        assert_eq!(RequirementStatus::InProgress.as_str(), "in_progress");
    }

    #[test]
    fn test_tracked_origin() {
        let live = Tracked::live(Client::default());
        let fixture = Tracked::fixture(Client::default());
        assert!(live.is_live());
        assert!(!fixture.is_live());
    }
}
