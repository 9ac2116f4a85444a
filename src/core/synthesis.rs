//! Deal synthesis from a selected match.
//!
//! [`synthesize`] only seeds an editable [`DealDraft`]; nothing is persisted
//! until the caller validates the draft into a [`NewDeal`] and hands it to
//! [`crate::core::deal::create_deal`]. Existing deals are edited through
//! [`DealDraft::edit`] and [`crate::core::deal::edit_deal`], so the total is
//! always derived from the quantity and unit price.

use crate::{
    config::DealDefaults,
    core::{ranking::Match, stage::normalize_stage},
    entities::Stage,
    errors::{Error, Result},
    models::{Client, Deal, DealSource, Priority, Requirement},
};
use chrono::NaiveDate;

/// Probability pre-filled for new deals, in percent.
pub const DEFAULT_PROBABILITY: i32 = 60;
/// Next action pre-filled for deals created from a match.
pub const DEFAULT_NEXT_ACTION: &str = "Follow up with supplier and client";

/// Editable form state for a deal that has not been submitted yet.
///
/// `total_value` cannot be set directly; it follows the quantity and unit
/// price through [`DealDraft::set_quantity`] and [`DealDraft::set_unit_price`].
#[derive(Clone, Debug, PartialEq)]
pub struct DealDraft {
    /// Headline
    pub title: String,
    /// Stage as typed or picked; checked on validation
    pub stage: String,
    /// Win probability in percent
    pub probability: i32,
    /// Priority
    pub priority: Priority,
    /// ISO currency code
    pub currency: String,
    /// Broker commission as a fraction
    pub commission_rate: f64,
    /// Expected close date
    pub expected_close_date: Option<NaiveDate>,
    /// Next planned action
    pub next_action: String,
    /// Free text, seeded with the match summary
    pub notes: String,
    /// Client reference
    pub client_id: Option<String>,
    /// Supplier reference
    pub supplier_id: Option<String>,
    /// Product reference
    pub product_id: Option<String>,
    /// Originating requirement
    pub requirement_id: Option<String>,
    /// Client name snapshot
    pub client_name: String,
    /// Supplier name snapshot
    pub supplier_name: String,
    /// Product name snapshot
    pub product_name: String,
    /// Dosage form snapshot
    pub dosage_form: String,
    /// Strength snapshot
    pub strength: String,
    /// Pack size snapshot
    pub pack_size: String,
    /// How the deal is being created
    pub source: DealSource,
    /// Score of the originating match
    pub similarity_score: Option<u8>,
    quantity: Option<f64>,
    unit_price: Option<f64>,
    total_value: Option<f64>,
}

/// A validated deal ready to be inserted.
#[derive(Clone, Debug, PartialEq)]
#[non_exhaustive]
pub struct NewDeal {
    /// Trimmed, non-empty headline
    pub title: String,
    /// Canonical stage
    pub stage: Stage,
    /// Win probability, 0 to 100
    pub probability: u8,
    /// Priority
    pub priority: Priority,
    /// Upper-case currency code
    pub currency: String,
    /// Commission fraction, 0 to 1
    pub commission_rate: f64,
    /// Expected close date
    pub expected_close_date: Option<NaiveDate>,
    /// Next planned action
    pub next_action: String,
    /// Free text
    pub notes: String,
    /// Client reference
    pub client_id: Option<String>,
    /// Supplier reference
    pub supplier_id: Option<String>,
    /// Product reference
    pub product_id: Option<String>,
    /// Originating requirement
    pub requirement_id: Option<String>,
    /// Client name snapshot
    pub client_name: String,
    /// Supplier name snapshot
    pub supplier_name: String,
    /// Product name snapshot
    pub product_name: String,
    /// Dosage form snapshot
    pub dosage_form: String,
    /// Strength snapshot
    pub strength: String,
    /// Pack size snapshot
    pub pack_size: String,
    /// Non-negative quantity
    pub quantity: Option<f64>,
    /// Non-negative unit price
    pub unit_price: Option<f64>,
    /// `quantity * unit_price` when both are known
    pub total_value: Option<f64>,
    /// How the deal was created
    pub source: DealSource,
    /// Score of the originating match
    pub similarity_score: Option<u8>,
}

/// Seeds a draft deal from `selected`, snapshotting display fields from the
/// requirement, client, supplier and product as they are right now.
#[must_use]
pub fn synthesize(
    selected: &Match,
    requirement: &Requirement,
    client: &Client,
    defaults: &DealDefaults,
) -> DealDraft {
    let product = &selected.product;
    let supplier = &selected.supplier;

    let title_product = first_non_blank(&[&requirement.product_name, &requirement.api_name])
        .unwrap_or("Product");
    let title_supplier = first_non_blank(&[&supplier.name]).unwrap_or("Supplier");

    let differentiators = selected.differentiators();
    let advantages = if differentiators.is_empty() {
        "N/A".to_string()
    } else {
        differentiators.join(", ")
    };

    let mut draft = DealDraft {
        title: format!("{title_product} - {title_supplier}"),
        stage: Stage::Negotiation.as_str().to_string(),
        probability: DEFAULT_PROBABILITY,
        priority: requirement.priority,
        currency: defaults.currency.clone(),
        commission_rate: defaults.commission_rate,
        expected_close_date: None,
        next_action: DEFAULT_NEXT_ACTION.to_string(),
        notes: format!(
            "Deal created from intelligent matching.\nSimilarity Score: {}%\nKey advantages: {advantages}",
            selected.score
        ),
        client_id: Some(client.id.clone()),
        supplier_id: Some(supplier.id.clone()),
        product_id: Some(product.id.clone()),
        requirement_id: Some(requirement.id.clone()),
        client_name: client.name.clone(),
        supplier_name: supplier.name.clone(),
        product_name: first_non_blank(&[&requirement.product_name, &product.api_name])
            .unwrap_or_default()
            .to_string(),
        dosage_form: first_non_blank(&[&product.dosage_form, &requirement.dosage_form])
            .unwrap_or_default()
            .to_string(),
        strength: first_non_blank(&[&product.strength, &requirement.strength])
            .unwrap_or_default()
            .to_string(),
        pack_size: product.pack_size.clone(),
        source: DealSource::IntelligentMatching,
        similarity_score: Some(selected.score),
        quantity: None,
        unit_price: None,
        total_value: None,
    };
    draft.set_quantity(requirement.quantity);
    draft.set_unit_price(product.unit_price_usd);
    draft
}

impl DealDraft {
    /// Blank draft for a deal entered by hand.
    #[must_use]
    pub fn manual(defaults: &DealDefaults) -> Self {
        Self {
            title: String::new(),
            stage: Stage::Lead.as_str().to_string(),
            probability: DEFAULT_PROBABILITY,
            priority: Priority::Medium,
            currency: defaults.currency.clone(),
            commission_rate: defaults.commission_rate,
            expected_close_date: None,
            next_action: String::new(),
            notes: String::new(),
            client_id: None,
            supplier_id: None,
            product_id: None,
            requirement_id: None,
            client_name: String::new(),
            supplier_name: String::new(),
            product_name: String::new(),
            dosage_form: String::new(),
            strength: String::new(),
            pack_size: String::new(),
            source: DealSource::Manual,
            similarity_score: None,
            quantity: None,
            unit_price: None,
            total_value: None,
        }
    }

    /// Form state for editing `deal`. The stored total is not copied; it is
    /// recomputed from the quantity and unit price.
    #[must_use]
    pub fn edit(deal: &Deal) -> Self {
        let mut draft = Self {
            title: deal.title.clone(),
            stage: deal.stage.as_str().to_string(),
            probability: deal.probability.map_or(DEFAULT_PROBABILITY, i32::from),
            priority: deal.priority,
            currency: deal.currency.clone(),
            commission_rate: deal.commission_rate,
            expected_close_date: deal.expected_close_date,
            next_action: deal.next_action.clone(),
            notes: deal.notes.clone(),
            client_id: deal.client_id.clone(),
            supplier_id: deal.supplier_id.clone(),
            product_id: deal.product_id.clone(),
            requirement_id: deal.requirement_id.clone(),
            client_name: deal.client_name.clone(),
            supplier_name: deal.supplier_name.clone(),
            product_name: deal.product_name.clone(),
            dosage_form: deal.dosage_form.clone(),
            strength: deal.strength.clone(),
            pack_size: deal.pack_size.clone(),
            source: deal.source,
            similarity_score: deal.similarity_score,
            quantity: None,
            unit_price: None,
            total_value: None,
        };
        draft.set_quantity(deal.quantity);
        draft.set_unit_price(deal.unit_price);
        draft
    }

    /// Quantity, if known.
    #[must_use]
    pub const fn quantity(&self) -> Option<f64> {
        self.quantity
    }

    /// Unit price, if known.
    #[must_use]
    pub const fn unit_price(&self) -> Option<f64> {
        self.unit_price
    }

    /// `quantity * unit_price`, or `None` while either is unknown.
    #[must_use]
    pub const fn total_value(&self) -> Option<f64> {
        self.total_value
    }

    /// Quantity as shown in the form, where unknown reads as 0.
    #[must_use]
    pub fn quantity_or_zero(&self) -> f64 {
        self.quantity.unwrap_or(0.0)
    }

    /// Unit price as shown in the form, where unknown reads as 0.
    #[must_use]
    pub fn unit_price_or_zero(&self) -> f64 {
        self.unit_price.unwrap_or(0.0)
    }

    /// Changes the quantity and recomputes the total.
    pub fn set_quantity(&mut self, quantity: Option<f64>) {
        self.quantity = quantity;
        self.recompute_total();
    }

    /// Changes the unit price and recomputes the total.
    pub fn set_unit_price(&mut self, unit_price: Option<f64>) {
        self.unit_price = unit_price;
        self.recompute_total();
    }

    fn recompute_total(&mut self) {
        self.total_value = match (self.quantity, self.unit_price) {
            (Some(q), Some(p)) => Some(q * p),
            _ => None,
        };
    }

    /// Checks the form and produces an insertable deal.
    ///
    /// # Errors
    /// Returns [`Error::Validation`] for an empty title, negative or
    /// non-finite quantity/price, an out-of-range commission or probability,
    /// or a blank currency, and [`Error::InvalidStage`] for a stage outside
    /// the allowed vocabulary.
    pub fn validate(&self) -> Result<NewDeal> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(Error::validation("title", "Title is required"));
        }

        let stage = normalize_stage(&self.stage)?;

        let quantity = non_negative("quantity", self.quantity)?;
        let unit_price = non_negative("unit_price", self.unit_price)?;

        if !(0.0..=1.0).contains(&self.commission_rate) {
            return Err(Error::validation(
                "commission_rate",
                format!("{} must be between 0 and 1", self.commission_rate),
            ));
        }

        let probability = u8::try_from(self.probability)
            .ok()
            .filter(|p| *p <= 100)
            .ok_or_else(|| {
                Error::validation("probability", "Probability must be between 0 and 100")
            })?;

        let currency = self.currency.trim().to_uppercase();
        if currency.is_empty() {
            return Err(Error::validation("currency", "Currency is required"));
        }

        Ok(NewDeal {
            title: title.to_string(),
            stage,
            probability,
            priority: self.priority,
            currency,
            commission_rate: self.commission_rate,
            expected_close_date: self.expected_close_date,
            next_action: self.next_action.trim().to_string(),
            notes: self.notes.clone(),
            client_id: self.client_id.clone(),
            supplier_id: self.supplier_id.clone(),
            product_id: self.product_id.clone(),
            requirement_id: self.requirement_id.clone(),
            client_name: self.client_name.clone(),
            supplier_name: self.supplier_name.clone(),
            product_name: self.product_name.clone(),
            dosage_form: self.dosage_form.clone(),
            strength: self.strength.clone(),
            pack_size: self.pack_size.clone(),
            quantity,
            unit_price,
            total_value: match (quantity, unit_price) {
                (Some(q), Some(p)) => Some(q * p),
                _ => None,
            },
            source: self.source,
            similarity_score: self.similarity_score,
        })
    }
}

impl NewDeal {
    /// Copies the validated fields onto an in-memory deal, leaving its id and
    /// timestamps alone.
    pub fn apply_to(&self, deal: &mut Deal) {
        deal.title.clone_from(&self.title);
        deal.stage = self.stage;
        deal.probability = Some(self.probability);
        deal.priority = self.priority;
        deal.currency.clone_from(&self.currency);
        deal.commission_rate = self.commission_rate;
        deal.expected_close_date = self.expected_close_date;
        deal.next_action.clone_from(&self.next_action);
        deal.notes.clone_from(&self.notes);
        deal.client_id.clone_from(&self.client_id);
        deal.supplier_id.clone_from(&self.supplier_id);
        deal.product_id.clone_from(&self.product_id);
        deal.requirement_id.clone_from(&self.requirement_id);
        deal.client_name.clone_from(&self.client_name);
        deal.supplier_name.clone_from(&self.supplier_name);
        deal.product_name.clone_from(&self.product_name);
        deal.dosage_form.clone_from(&self.dosage_form);
        deal.strength.clone_from(&self.strength);
        deal.pack_size.clone_from(&self.pack_size);
        deal.quantity = self.quantity;
        deal.unit_price = self.unit_price;
        deal.total_value = self.total_value;
        deal.source = self.source;
        deal.similarity_score = self.similarity_score;
    }
}

fn first_non_blank<'a>(candidates: &[&'a str]) -> Option<&'a str> {
    candidates.iter().copied().find(|s| !s.trim().is_empty())
}

/// Rejects negative or non-finite values; `None` passes through.
pub(crate) fn non_negative(field: &'static str, value: Option<f64>) -> Result<Option<f64>> {
    match value {
        Some(v) if !v.is_finite() => Err(Error::validation(field, "must be a valid number")),
        Some(v) if v < 0.0 => Err(Error::validation(field, "must be 0 or greater")),
        other => Ok(other),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::core::ranking::rank;
    use crate::models::{Product, Supplier};
    use crate::test_utils::{sample_client, sample_product, sample_requirement, sample_supplier};

    fn scenario() -> (Match, Requirement, Client) {
        let client = Client {
            name: "Global Pharma Distribution".to_string(),
            ..sample_client("client-002", "United Kingdom")
        };
        let supplier = Supplier {
            name: "Global Meds Ltd".to_string(),
            ..sample_supplier("sup-002", "United Kingdom")
        };
        let requirement = Requirement {
            product_name: "Amoxicillin Capsules".to_string(),
            api_name: "Amoxicillin Trihydrate".to_string(),
            dosage_form: "capsule".to_string(),
            strength: "250mg".to_string(),
            quantity: Some(200_000.0),
            budget_usd: Some(25_000.0),
            priority: Priority::High,
            ..sample_requirement("req-003", &client.id)
        };
        let product = Product {
            api_name: "Amoxicillin Trihydrate".to_string(),
            dosage_form: "capsule".to_string(),
            strength: "250mg".to_string(),
            pack_size: "10x10".to_string(),
            unit_price_usd: Some(0.10),
            ..sample_product("prod-004", &supplier.id)
        };
        let selected = rank(Some(&requirement), Some(&client), &[supplier], &[product])
            .pop()
            .unwrap();
        (selected, requirement, client)
    }

    #[test]
    fn test_synthesize_seeds_form_from_match() {
        let (selected, requirement, client) = scenario();
        let draft = synthesize(&selected, &requirement, &client, &DealDefaults::default());

        assert_eq!(draft.title, "Amoxicillin Capsules - Global Meds Ltd");
        assert_eq!(draft.stage, "negotiation");
        assert_eq!(draft.quantity(), Some(200_000.0));
        assert_eq!(draft.unit_price(), Some(0.10));
        assert_eq!(draft.total_value(), Some(200_000.0 * 0.10));
        assert_eq!(draft.priority, Priority::High);
        assert_eq!(draft.currency, "USD");
        assert_eq!(draft.commission_rate, 0.05);
        assert_eq!(draft.source, DealSource::IntelligentMatching);
        assert_eq!(draft.similarity_score, Some(100));
        assert_eq!(draft.client_name, "Global Pharma Distribution");
        assert_eq!(draft.supplier_name, "Global Meds Ltd");
        assert_eq!(draft.product_name, "Amoxicillin Capsules");
        assert_eq!(draft.pack_size, "10x10");
        assert_eq!(draft.requirement_id.as_deref(), Some("req-003"));
        assert_eq!(draft.product_id.as_deref(), Some("prod-004"));
        assert!(draft.notes.contains("Similarity Score: 100%"));
        assert!(draft.notes.contains("Exact API match"));
    }

    #[test]
    fn test_title_falls_back_to_api_name_then_placeholder() {
        let (selected, mut requirement, client) = scenario();
        requirement.product_name = String::new();
        let draft = synthesize(&selected, &requirement, &client, &DealDefaults::default());
        assert_eq!(draft.title, "Amoxicillin Trihydrate - Global Meds Ltd");
        assert_eq!(draft.product_name, "Amoxicillin Trihydrate");

        requirement.api_name = String::new();
        let draft = synthesize(&selected, &requirement, &client, &DealDefaults::default());
        assert_eq!(draft.title, "Product - Global Meds Ltd");
    }

    #[test]
    fn test_zero_quantity_gives_zero_total() {
        let (selected, mut requirement, client) = scenario();
        requirement.quantity = Some(0.0);
        let draft = synthesize(&selected, &requirement, &client, &DealDefaults::default());
        assert_eq!(draft.total_value(), Some(0.0));
        assert_eq!(draft.validate().unwrap().total_value, Some(0.0));
    }

    #[test]
    fn test_unknown_operand_gives_no_total() {
        let (mut selected, mut requirement, client) = scenario();
        requirement.quantity = None;
        let draft = synthesize(&selected, &requirement, &client, &DealDefaults::default());
        assert_eq!(draft.total_value(), None);
        assert_eq!(draft.quantity_or_zero(), 0.0);

        requirement.quantity = Some(10.0);
        selected.product.unit_price_usd = None;
        let draft = synthesize(&selected, &requirement, &client, &DealDefaults::default());
        assert_eq!(draft.total_value(), None);
        assert_eq!(draft.unit_price_or_zero(), 0.0);
    }

    #[test]
    fn test_editing_operands_recomputes_total() {
        let (selected, requirement, client) = scenario();
        let mut draft = synthesize(&selected, &requirement, &client, &DealDefaults::default());

        draft.set_quantity(Some(1_000.0));
        assert_eq!(draft.total_value(), Some(100.0));

        draft.set_unit_price(Some(0.5));
        assert_eq!(draft.total_value(), Some(500.0));

        draft.set_unit_price(None);
        assert_eq!(draft.total_value(), None);
    }

    #[test]
    fn test_validate_rejects_bad_input() {
        let (selected, requirement, client) = scenario();
        let base = synthesize(&selected, &requirement, &client, &DealDefaults::default());

        let mut draft = base.clone();
        draft.title = "   ".to_string();
        assert!(matches!(
            draft.validate(),
            Err(Error::Validation { field: "title", .. })
        ));

        let mut draft = base.clone();
        draft.stage = "closed_won".to_string();
        assert!(matches!(draft.validate(), Err(Error::InvalidStage { .. })));

        let mut draft = base.clone();
        draft.set_quantity(Some(-1.0));
        assert!(matches!(
            draft.validate(),
            Err(Error::Validation { field: "quantity", .. })
        ));

        let mut draft = base.clone();
        draft.set_unit_price(Some(f64::NAN));
        assert!(matches!(
            draft.validate(),
            Err(Error::Validation { field: "unit_price", .. })
        ));

        let mut draft = base.clone();
        draft.probability = 101;
        assert!(matches!(
            draft.validate(),
            Err(Error::Validation { field: "probability", .. })
        ));

        let mut draft = base;
        draft.commission_rate = 1.5;
        assert!(matches!(
            draft.validate(),
            Err(Error::Validation { field: "commission_rate", .. })
        ));
    }

    #[test]
    fn test_validate_normalizes_user_edits() {
        let (selected, requirement, client) = scenario();
        let mut draft = synthesize(&selected, &requirement, &client, &DealDefaults::default());
        draft.title = "  Amoxicillin Q1  ".to_string();
        draft.stage = " Contract ".to_string();
        draft.currency = "usd".to_string();
        draft.notes.push_str("\nCustom note");

        let deal = draft.validate().unwrap();
        assert_eq!(deal.title, "Amoxicillin Q1");
        assert_eq!(deal.stage, Stage::Contract);
        assert_eq!(deal.currency, "USD");
        assert!(deal.notes.ends_with("Custom note"));
        assert_eq!(deal.probability, 60);
    }

    #[test]
    fn test_edit_recomputes_total_from_operands() {
        let deal = Deal {
            id: "d1".to_string(),
            title: "Metformin - PharmaCorp".to_string(),
            quantity: Some(100.0),
            unit_price: Some(2.0),
            total_value: Some(999.0),
            currency: "USD".to_string(),
            commission_rate: 0.05,
            probability: Some(75),
            stage: Stage::Contract,
            ..Deal::default()
        };

        let mut draft = DealDraft::edit(&deal);
        assert_eq!(draft.total_value(), Some(200.0));
        assert_eq!(draft.stage, "contract");
        assert_eq!(draft.probability, 75);

        draft.set_quantity(Some(500.0));
        assert_eq!(draft.total_value(), Some(1000.0));

        let mut edited = deal.clone();
        draft.validate().unwrap().apply_to(&mut edited);
        assert_eq!(edited.id, "d1");
        assert_eq!(edited.quantity, Some(500.0));
        assert_eq!(edited.total_value, Some(1000.0));
        assert_eq!(edited.stage, Stage::Contract);
    }

    #[test]
    fn test_edit_without_probability_uses_default() {
        let deal = Deal {
            title: "Imported".to_string(),
            currency: "EUR".to_string(),
            ..Deal::default()
        };
        let draft = DealDraft::edit(&deal);
        assert_eq!(draft.probability, DEFAULT_PROBABILITY);
        assert_eq!(draft.total_value(), None);
    }

    #[test]
    fn test_manual_draft_defaults() {
        let draft = DealDraft::manual(&DealDefaults::default());
        assert_eq!(draft.stage, "lead");
        assert_eq!(draft.source, DealSource::Manual);
        assert!(draft.total_value().is_none());
        assert!(matches!(
            draft.validate(),
            Err(Error::Validation { field: "title", .. })
        ));
    }
}
