//! Match ranking for a selected client and requirement.
//!
//! Ranking is recomputed from scratch on every selection or catalog change;
//! nothing here is cached or updated incrementally.

use crate::{
    core::scoring::{ScoreBreakdown, score_breakdown},
    models::{Client, Product, Requirement, Supplier, SupplierStatus},
};
use std::collections::HashMap;

/// One scored (supplier, product) candidate for a requirement. Never stored.
#[derive(Clone, Debug, PartialEq)]
pub struct Match {
    /// Requirement the candidate was scored against
    pub requirement_id: String,
    /// Owning supplier of `product`
    pub supplier: Supplier,
    /// Candidate product
    pub product: Product,
    /// Total score, 0 to 100
    pub score: u8,
    /// Points per factor
    pub breakdown: ScoreBreakdown,
}

impl Match {
    /// Row key, unique per (product, supplier) pair.
    #[must_use]
    pub fn key(&self) -> String {
        format!("{}-{}", self.product.id, self.supplier.id)
    }

    /// Matched factors in words.
    #[must_use]
    pub fn differentiators(&self) -> Vec<&'static str> {
        self.breakdown.differentiators()
    }
}

/// Ranks every eligible product against `requirement`.
///
/// Returns nothing unless both a requirement and a client are selected.
/// Products whose supplier is missing or not active are skipped. The result is
/// sorted by score, highest first; equal scores keep the order of `products`.
#[must_use]
pub fn rank(
    requirement: Option<&Requirement>,
    client: Option<&Client>,
    suppliers: &[Supplier],
    products: &[Product],
) -> Vec<Match> {
    let (Some(requirement), Some(client)) = (requirement, client) else {
        return Vec::new();
    };

    let active: HashMap<&str, &Supplier> = suppliers
        .iter()
        .filter(|s| s.status == SupplierStatus::Active)
        .map(|s| (s.id.as_str(), s))
        .collect();

    let mut matches: Vec<Match> = products
        .iter()
        .filter_map(|product| {
            let supplier = *active.get(product.supplier_id.as_str())?;
            let breakdown = score_breakdown(requirement, product, supplier, client);
            Some(Match {
                requirement_id: requirement.id.clone(),
                supplier: supplier.clone(),
                product: product.clone(),
                score: breakdown.total(),
                breakdown,
            })
        })
        .collect();

    // `sort_by` is stable, which keeps input order for ties
    matches.sort_by(|a, b| b.score.cmp(&a.score));
    matches
}

/// Requirements raised by `client_id`, in their original order.
#[must_use]
pub fn requirements_for_client<'a>(
    requirements: &'a [Requirement],
    client_id: &str,
) -> Vec<&'a Requirement> {
    requirements
        .iter()
        .filter(|r| r.client_id == client_id)
        .collect()
}
