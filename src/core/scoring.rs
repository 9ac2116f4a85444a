//! Requirement × product compatibility scoring.
//!
//! The score is an additive sum of five factors capped at 100. No factor is
//! ever negative and a missing field on either side simply contributes 0.
//! Weights and ordering are fixed; stored scores and test fixtures depend on
//! them.

use crate::models::{Client, Product, Requirement, Supplier};

/// Exact active-ingredient match
pub const INGREDIENT_EXACT: u8 = 50;
/// Product ingredient contains the requested one
pub const INGREDIENT_PARTIAL: u8 = 30;
/// Exact dosage form match
pub const DOSAGE_EXACT: u8 = 20;
/// Product dosage form contains the requested one
pub const DOSAGE_PARTIAL: u8 = 10;
/// Exact strength match; strengths never earn partial credit
pub const STRENGTH_EXACT: u8 = 15;
/// Client and supplier in the same country
pub const SAME_COUNTRY: u8 = 10;
/// Unit price within budget per unit
pub const WITHIN_BUDGET: u8 = 5;
/// Upper bound of every score
pub const MAX_SCORE: u8 = 100;

/// Points awarded per factor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ScoreBreakdown {
    /// Active ingredient: 0, 30 or 50
    pub ingredient: u8,
    /// Dosage form: 0, 10 or 20
    pub dosage_form: u8,
    /// Strength: 0 or 15
    pub strength: u8,
    /// Geography: 0 or 10
    pub geography: u8,
    /// Budget fit: 0 or 5
    pub budget: u8,
}

impl ScoreBreakdown {
    /// Sum of all factors, capped at [`MAX_SCORE`].
    #[must_use]
    pub fn total(self) -> u8 {
        let sum = u16::from(self.ingredient)
            + u16::from(self.dosage_form)
            + u16::from(self.strength)
            + u16::from(self.geography)
            + u16::from(self.budget);
        u8::try_from(sum.min(u16::from(MAX_SCORE))).unwrap_or(MAX_SCORE)
    }

    /// Matched factors in words, strongest first.
    #[must_use]
    pub fn differentiators(self) -> Vec<&'static str> {
        let mut out = Vec::new();
        match self.ingredient {
            INGREDIENT_EXACT => out.push("Exact API match"),
            INGREDIENT_PARTIAL => out.push("Related API"),
            _ => {}
        }
        match self.dosage_form {
            DOSAGE_EXACT => out.push("Same dosage form"),
            DOSAGE_PARTIAL => out.push("Similar dosage form"),
            _ => {}
        }
        if self.strength > 0 {
            out.push("Same strength");
        }
        if self.geography > 0 {
            out.push("Same country");
        }
        if self.budget > 0 {
            out.push("Within budget");
        }
        out
    }
}

/// Computes the compatibility score of `product` (offered by `supplier`) for
/// `requirement` (raised by `client`).
#[must_use]
pub fn score(
    requirement: &Requirement,
    product: &Product,
    supplier: &Supplier,
    client: &Client,
) -> u8 {
    score_breakdown(requirement, product, supplier, client).total()
}

/// Per-factor points behind [`score`].
#[must_use]
pub fn score_breakdown(
    requirement: &Requirement,
    product: &Product,
    supplier: &Supplier,
    client: &Client,
) -> ScoreBreakdown {
    ScoreBreakdown {
        ingredient: graded(
            &requirement.api_name,
            &product.api_name,
            INGREDIENT_EXACT,
            INGREDIENT_PARTIAL,
        ),
        dosage_form: graded(
            &requirement.dosage_form,
            &product.dosage_form,
            DOSAGE_EXACT,
            DOSAGE_PARTIAL,
        ),
        strength: graded(&requirement.strength, &product.strength, STRENGTH_EXACT, 0),
        geography: if !client.country.is_empty() && client.country == supplier.country {
            SAME_COUNTRY
        } else {
            0
        },
        budget: if within_budget(requirement, product) {
            WITHIN_BUDGET
        } else {
            0
        },
    }
}

/// Highest unit price that keeps the requirement within budget, if it can be
/// computed.
#[must_use]
pub fn max_unit_price(requirement: &Requirement) -> Option<f64> {
    let budget = requirement.budget_usd?;
    let quantity = requirement.quantity.filter(|q| *q > 0.0)?;
    Some(budget / quantity)
}

fn within_budget(requirement: &Requirement, product: &Product) -> bool {
    match (max_unit_price(requirement), product.unit_price_usd) {
        (Some(max), Some(price)) => price <= max,
        _ => false,
    }
}

/// `exact` when the normalized values are equal, `partial` when the offered
/// value contains the requested one, 0 otherwise or when either is blank.
fn graded(requested: &str, offered: &str, exact: u8, partial: u8) -> u8 {
    let requested = requested.trim().to_lowercase();
    let offered = offered.trim().to_lowercase();
    if requested.is_empty() || offered.is_empty() {
        0
    } else if requested == offered {
        exact
    } else if offered.contains(&requested) {
        partial
    } else {
        0
    }
}
