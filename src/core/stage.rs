//! Deal stage canonicalization.
//!
//! The `deals.stage` column only accepts `lead`, `negotiation`, `contract` and
//! `closed`. Input is trimmed and lower-cased; anything else is rejected, never
//! coerced. The retired six-value vocabulary (`qualified`, `closed_won`,
//! `closed_lost`) is rejected like any other unknown value.

use crate::entities::Stage;
use crate::errors::{Error, Result};

/// Every allowed stage, in pipeline order.
pub const STAGES: [Stage; 4] = [Stage::Lead, Stage::Negotiation, Stage::Contract, Stage::Closed];

/// Canonicalizes a raw stage value.
///
/// # Errors
/// Returns [`Error::InvalidStage`] when the trimmed, lower-cased value is not
/// one of the four allowed stages.
pub fn normalize_stage(raw: &str) -> Result<Stage> {
    match raw.trim().to_lowercase().as_str() {
        "lead" => Ok(Stage::Lead),
        "negotiation" => Ok(Stage::Negotiation),
        "contract" => Ok(Stage::Contract),
        "closed" => Ok(Stage::Closed),
        _ => Err(Error::InvalidStage {
            value: raw.to_string(),
        }),
    }
}

impl Stage {
    /// Storage form, e.g. `"negotiation"`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Lead => "lead",
            Self::Negotiation => "negotiation",
            Self::Contract => "contract",
            Self::Closed => "closed",
        }
    }

    /// Display form, e.g. `"Negotiation"`.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Lead => "Lead",
            Self::Negotiation => "Negotiation",
            Self::Contract => "Contract",
            Self::Closed => "Closed",
        }
    }
}
