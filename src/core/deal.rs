//! Deal persistence and pipeline queries.
//!
//! Deals are only written from a validated [`NewDeal`]. Stage changes go
//! through [`update_deal_stage`], which canonicalizes the stage before any
//! query runs, so the `deals.stage` column never holds a value outside the
//! four-stage vocabulary.

use crate::{
    core::{
        access::AccessContext,
        fallback::{TrackedList, WriteOutcome},
        normalize::normalize_deals,
        stage::normalize_stage,
        store::{canonical, optional, parse_id, to_rows},
        synthesis::{DealDraft, NewDeal},
    },
    entities::{DealColumn, Stage, deal},
    errors::{Error, Result},
    models::{Deal, Priority},
};
use chrono::{NaiveDate, Utc};
use sea_orm::{QueryOrder, Set, prelude::*};
use serde_json::Value;
use tracing::{debug, info};

/// All deal rows, newest first, in raw row form.
///
/// # Errors
/// Returns an error if the query fails.
pub async fn fetch_deal_rows(db: &DatabaseConnection) -> Result<Vec<Value>> {
    let models = deal::Entity::find()
        .order_by_desc(DealColumn::CreatedAt)
        .all(db)
        .await?;
    debug!(count = models.len(), "Fetched deal rows");
    to_rows(&models)
}

/// References that are not stored ids (for example fixture ids) are kept
/// only as the snapshot fields.
fn soft_reference(field: &'static str, raw: Option<&str>) -> Option<Uuid> {
    let raw = raw?;
    let parsed = Uuid::parse_str(raw.trim()).ok();
    if parsed.is_none() {
        debug!(field, value = %raw, "Reference is not a stored id; keeping snapshot only");
    }
    parsed
}

fn apply(active: &mut deal::ActiveModel, new: &NewDeal) {
    active.title = Set(new.title.clone());
    active.client_id = Set(soft_reference("client_id", new.client_id.as_deref()));
    active.supplier_id = Set(soft_reference("supplier_id", new.supplier_id.as_deref()));
    active.product_id = Set(soft_reference("product_id", new.product_id.as_deref()));
    active.requirement_id = Set(soft_reference("requirement_id", new.requirement_id.as_deref()));
    active.client_name = Set(optional(&new.client_name));
    active.supplier_name = Set(optional(&new.supplier_name));
    active.product_name = Set(optional(&new.product_name));
    active.dosage_form = Set(optional(&new.dosage_form));
    active.strength = Set(optional(&new.strength));
    active.pack_size = Set(optional(&new.pack_size));
    active.quantity = Set(new.quantity);
    active.unit_price = Set(new.unit_price);
    active.total_value_usd = Set(new.total_value);
    active.currency = Set(new.currency.clone());
    active.commission_rate = Set(new.commission_rate);
    active.probability = Set(Some(i32::from(new.probability)));
    active.stage = Set(new.stage);
    active.priority = Set(new.priority.as_str().to_string());
    active.expected_close_date = Set(new.expected_close_date);
    active.next_action = Set(optional(&new.next_action));
    active.notes = Set(optional(&new.notes));
    active.source = Set(new.source.as_str().to_string());
    active.similarity_score = Set(new.similarity_score.map(i32::from));
    active.updated_at = Set(Utc::now());
}

/// Inserts a validated deal.
///
/// # Errors
/// Returns a database error if the insert fails.
pub async fn create_deal(db: &DatabaseConnection, new: &NewDeal) -> Result<Deal> {
    let id = Uuid::new_v4();
    let mut active = deal::ActiveModel {
        id: Set(id),
        created_at: Set(Utc::now()),
        ..Default::default()
    };
    apply(&mut active, new);

    let model = active.insert(db).await?;
    info!(%id, stage = model.stage.as_str(), source = %model.source, "Created deal");
    canonical("deal", &model, id, normalize_deals)
}

/// Overwrites every editable field of an existing deal.
///
/// # Errors
/// Returns [`Error::NotFound`] if no such deal exists, or a database error.
pub async fn update_deal(db: &DatabaseConnection, id: &str, new: &NewDeal) -> Result<Deal> {
    let uuid = parse_id("deal", id)?;
    let mut active: deal::ActiveModel = deal::Entity::find_by_id(uuid)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("deal", id))?
        .into();
    apply(&mut active, new);

    let model = active.update(db).await?;
    info!(%uuid, "Updated deal");
    canonical("deal", &model, uuid, normalize_deals)
}

/// Saves an edited deal form into `deals`.
///
/// The draft is validated first, so the local copy and the stored row both
/// get the recomputed total. Fixture deals are changed locally only.
///
/// # Errors
/// Returns [`Error::Forbidden`] for viewers, [`Error::NotFound`] for a deal
/// not in the list, and the validation errors of [`DealDraft::validate`].
/// Store failures are reported as [`WriteOutcome::BackendFailed`].
pub async fn edit_deal(
    deals: &mut TrackedList<Deal>,
    ctx: &AccessContext,
    db: &DatabaseConnection,
    id: &str,
    draft: &DealDraft,
) -> Result<WriteOutcome> {
    let new = draft.validate()?;
    deals
        .update(
            ctx,
            id,
            |deal| new.apply_to(deal),
            |deal: Deal| {
                let new = &new;
                async move { update_deal(db, &deal.id, new).await.map(|_| ()) }
            },
        )
        .await
}

/// Moves a deal to another stage and bumps its last-activity time.
///
/// # Errors
/// Returns [`Error::InvalidStage`] before touching the store when `raw_stage`
/// is outside the vocabulary, [`Error::NotFound`] if no such deal exists, or
/// a database error.
pub async fn update_deal_stage(
    db: &DatabaseConnection,
    id: &str,
    raw_stage: &str,
) -> Result<Deal> {
    let stage = normalize_stage(raw_stage)?;
    let uuid = parse_id("deal", id)?;

    let mut active: deal::ActiveModel = deal::Entity::find_by_id(uuid)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("deal", id))?
        .into();
    active.stage = Set(stage);
    active.updated_at = Set(Utc::now());

    let model = active.update(db).await?;
    info!(%uuid, stage = stage.as_str(), "Moved deal");
    canonical("deal", &model, uuid, normalize_deals)
}

/// Deletes a deal.
///
/// # Errors
/// Returns [`Error::NotFound`] if no such deal exists, or a database error.
pub async fn delete_deal(db: &DatabaseConnection, id: &str) -> Result<()> {
    let uuid = parse_id("deal", id)?;
    let result = deal::Entity::delete_by_id(uuid).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(Error::not_found("deal", id));
    }
    info!(%uuid, "Deleted deal");
    Ok(())
}

/// Criteria for the deal list. Every criterion is optional; an empty filter
/// keeps every deal.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DealFilter {
    /// Case-insensitive text matched against client, supplier and product
    /// names
    pub search: String,
    /// Exact stage
    pub stage: Option<Stage>,
    /// Exact priority
    pub priority: Option<Priority>,
    /// Lowest total value, inclusive; unknown totals count as 0
    pub min_value: Option<f64>,
    /// Highest total value, inclusive; unknown totals count as 0
    pub max_value: Option<f64>,
    /// First creation day, inclusive
    pub created_from: Option<NaiveDate>,
    /// Last creation day, inclusive
    pub created_to: Option<NaiveDate>,
}

impl DealFilter {
    /// Whether `deal` satisfies every criterion.
    #[must_use]
    pub fn matches(&self, deal: &Deal) -> bool {
        let search = self.search.trim().to_lowercase();
        if !search.is_empty()
            && ![&deal.client_name, &deal.supplier_name, &deal.product_name]
                .iter()
                .any(|name| name.to_lowercase().contains(&search))
        {
            return false;
        }
        if self.stage.is_some_and(|stage| stage != deal.stage) {
            return false;
        }
        if self.priority.is_some_and(|priority| priority != deal.priority) {
            return false;
        }

        let value = deal.total_value.unwrap_or(0.0);
        if self.min_value.is_some_and(|min| value < min)
            || self.max_value.is_some_and(|max| value > max)
        {
            return false;
        }

        if self.created_from.is_some() || self.created_to.is_some() {
            let Some(created) = deal.created_at.map(|t| t.date_naive()) else {
                return false;
            };
            if self.created_from.is_some_and(|from| created < from)
                || self.created_to.is_some_and(|to| created > to)
            {
                return false;
            }
        }
        true
    }
}

/// Deals satisfying `filter`, in their original order.
#[must_use]
pub fn filter_deals<'a>(deals: &'a [Deal], filter: &DealFilter) -> Vec<&'a Deal> {
    deals.iter().filter(|deal| filter.matches(deal)).collect()
}

/// Sum of `total_value * commission_rate`; unknown totals count as 0.
#[must_use]
pub fn total_commission<'a>(deals: impl IntoIterator<Item = &'a Deal>) -> f64 {
    deals
        .into_iter()
        .map(|deal| deal.total_value.unwrap_or(0.0) * deal.commission_rate)
        .sum()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::config::DealDefaults;
    use crate::core::{fallback, fixtures::FixtureSet};
    use serde_json::json;
    use crate::models::DealSource;
    use crate::test_utils::setup_test_db;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn draft(title: &str) -> DealDraft {
        let mut draft = DealDraft::manual(&DealDefaults::default());
        draft.title = title.to_string();
        draft.client_name = "Global Pharma Distribution".to_string();
        draft.supplier_name = "Global Meds Ltd".to_string();
        draft.product_name = "Amoxicillin".to_string();
        draft.set_quantity(Some(200_000.0));
        draft.set_unit_price(Some(0.18));
        draft
    }

    #[tokio::test]
    async fn test_create_deal_round_trip() -> Result<()> {
        let db = setup_test_db().await?;
        let mut form = draft("Amoxicillin Capsules - Global Meds Ltd");
        form.client_id = Some(Uuid::new_v4().to_string());
        form.requirement_id = Some("req-003".to_string());
        form.source = DealSource::IntelligentMatching;
        form.similarity_score = Some(85);

        let created = create_deal(&db, &form.validate()?).await?;
        assert_eq!(created.stage, Stage::Lead);
        assert_eq!(created.total_value, Some(200_000.0 * 0.18));
        assert_eq!(created.probability, Some(60));
        assert_eq!(created.similarity_score, Some(85));
        assert_eq!(created.source, DealSource::IntelligentMatching);
        assert_eq!(created.client_id, form.client_id);
        assert_eq!(created.requirement_id, None);
        assert_eq!(created.client_name, "Global Pharma Distribution");

        let deals = normalize_deals(&fetch_deal_rows(&db).await?);
        assert_eq!(deals.len(), 1);
        assert_eq!(deals[0].id, created.id);
        assert_eq!(deals[0].currency, "USD");
        assert_eq!(deals[0].commission_rate, 0.05);
        Ok(())
    }

    #[tokio::test]
    async fn test_update_deal_stage_normalizes_and_bumps_activity() -> Result<()> {
        let db = setup_test_db().await?;
        let created = create_deal(&db, &draft("Deal").validate()?).await?;

        let moved = update_deal_stage(&db, &created.id, " Contract ").await?;
        assert_eq!(moved.stage, Stage::Contract);
        assert!(moved.last_activity >= created.last_activity);

        let stored = normalize_deals(&fetch_deal_rows(&db).await?);
        assert_eq!(stored[0].stage, Stage::Contract);
        Ok(())
    }

    #[tokio::test]
    async fn test_invalid_stage_never_reaches_store() {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();
        let id = Uuid::new_v4().to_string();
        for raw in ["qualified", "closed_won", "closed_lost", ""] {
            let result = update_deal_stage(&db, &id, raw).await;
            assert!(matches!(result, Err(Error::InvalidStage { .. })), "{raw}");
        }
    }

    #[tokio::test]
    async fn test_update_and_delete_deal() -> Result<()> {
        let db = setup_test_db().await?;
        let created = create_deal(&db, &draft("Deal").validate()?).await?;

        let mut form = draft("Renamed deal");
        form.set_quantity(None);
        form.stage = "closed".to_string();
        let updated = update_deal(&db, &created.id, &form.validate()?).await?;
        assert_eq!(updated.title, "Renamed deal");
        assert_eq!(updated.total_value, None);
        assert_eq!(updated.stage, Stage::Closed);

        delete_deal(&db, &created.id).await?;
        assert!(fetch_deal_rows(&db).await?.is_empty());
        assert!(matches!(
            delete_deal(&db, &created.id).await,
            Err(Error::NotFound { .. })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_edit_fixture_deal_recomputes_total_locally() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();
        let rows = vec![json!({
            "id": "d1",
            "title": "Metformin - PharmaCorp",
            "quantity": 100.0,
            "unit_price": 2.0,
            "deal_value": 200.0,
            "currency": "USD",
            "stage": "negotiation",
        })];
        let mut deals: TrackedList<Deal> = fallback::load(
            "deals",
            async { Err(Error::validation("db", "offline")) },
            &rows,
            normalize_deals,
        )
        .await
        .into();

        let mut form = DealDraft::edit(&deals.get("d1").unwrap().entity);
        form.set_quantity(Some(500.0));
        let outcome = edit_deal(&mut deals, &AccessContext::editor(), &db, "d1", &form).await?;
        assert_eq!(outcome, WriteOutcome::LocalOnly);

        let edited = &deals.get("d1").unwrap().entity;
        assert_eq!(edited.quantity, Some(500.0));
        assert_eq!(edited.total_value, Some(1000.0));
        Ok(())
    }

    #[tokio::test]
    async fn test_edit_live_deal_persists_recomputed_total() -> Result<()> {
        let db = setup_test_db().await?;
        let created = create_deal(&db, &draft("Amoxicillin").validate()?).await?;
        let mut deals: TrackedList<Deal> = fallback::load(
            "deals",
            fetch_deal_rows(&db),
            &[],
            normalize_deals,
        )
        .await
        .into();

        let mut form = DealDraft::edit(&deals.get(&created.id).unwrap().entity);
        form.set_unit_price(Some(0.20));
        let outcome =
            edit_deal(&mut deals, &AccessContext::editor(), &db, &created.id, &form).await?;
        assert_eq!(outcome, WriteOutcome::Persisted);
        assert_eq!(
            deals.get(&created.id).unwrap().entity.total_value,
            Some(200_000.0 * 0.20)
        );

        let stored = normalize_deals(&fetch_deal_rows(&db).await?);
        assert_eq!(stored[0].unit_price, Some(0.20));
        assert_eq!(stored[0].total_value, Some(200_000.0 * 0.20));
        Ok(())
    }

    #[tokio::test]
    async fn test_edit_deal_rejects_invalid_form_before_any_change() {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();
        let rows = vec![json!({"id": "d1", "title": "Deal", "quantity": 10.0, "unit_price": 1.0})];
        let mut deals: TrackedList<Deal> =
            fallback::load("deals", async { Ok(Vec::new()) }, &rows, normalize_deals)
                .await
                .into();

        let mut form = DealDraft::edit(&deals.get("d1").unwrap().entity);
        form.set_quantity(Some(-5.0));
        let result = edit_deal(&mut deals, &AccessContext::editor(), &db, "d1", &form).await;
        assert!(matches!(result, Err(Error::Validation { field: "quantity", .. })));
        assert_eq!(deals.get("d1").unwrap().entity.quantity, Some(10.0));
    }

    fn fixture_deals() -> Vec<Deal> {
        normalize_deals(&FixtureSet::bundled().unwrap().deals)
    }

    #[test]
    fn test_filter_by_search_stage_and_priority() {
        let deals = fixture_deals();

        let by_search = DealFilter {
            search: "PHARMA".to_string(),
            ..DealFilter::default()
        };
        let ids: Vec<&str> = filter_deals(&deals, &by_search)
            .iter()
            .map(|d| d.id.as_str())
            .collect();
        assert_eq!(ids, ["1", "3"]);

        let by_stage = DealFilter {
            stage: Some(Stage::Contract),
            ..DealFilter::default()
        };
        assert_eq!(filter_deals(&deals, &by_stage)[0].id, "2");

        let by_priority = DealFilter {
            priority: Some(Priority::Medium),
            ..DealFilter::default()
        };
        assert_eq!(filter_deals(&deals, &by_priority).len(), 2);

        assert_eq!(filter_deals(&deals, &DealFilter::default()).len(), 3);
    }

    #[test]
    fn test_filter_by_value_and_date_range() {
        let deals = fixture_deals();

        let by_value = DealFilter {
            min_value: Some(70_000.0),
            max_value: Some(125_000.0),
            ..DealFilter::default()
        };
        let ids: Vec<&str> = filter_deals(&deals, &by_value)
            .iter()
            .map(|d| d.id.as_str())
            .collect();
        assert_eq!(ids, ["1", "2"]);

        let by_date = DealFilter {
            created_from: NaiveDate::from_ymd_opt(2024, 11, 1),
            created_to: NaiveDate::from_ymd_opt(2024, 12, 1),
            ..DealFilter::default()
        };
        let ids: Vec<&str> = filter_deals(&deals, &by_date)
            .iter()
            .map(|d| d.id.as_str())
            .collect();
        assert_eq!(ids, ["1", "2"]);
    }

    #[test]
    fn test_date_filter_excludes_undated_deals() {
        let deal = Deal {
            total_value: None,
            ..Deal::default()
        };
        let filter = DealFilter {
            created_from: NaiveDate::from_ymd_opt(2024, 1, 1),
            ..DealFilter::default()
        };
        assert!(!filter.matches(&deal));
        assert!(
            DealFilter {
                max_value: Some(0.0),
                ..DealFilter::default()
            }
            .matches(&deal)
        );
    }

    #[test]
    fn test_total_commission() {
        let deals = fixture_deals();
        let expected = 125_000.0 * 0.05 + 89_000.0 * 0.04 + 67_500.0 * 0.06;
        assert!((total_commission(&deals) - expected).abs() < 1e-6);

        let closed = DealFilter {
            stage: Some(Stage::Closed),
            ..DealFilter::default()
        };
        let closed_deals = filter_deals(&deals, &closed);
        assert!((total_commission(closed_deals) - 4_050.0).abs() < 1e-6);
    }
}
