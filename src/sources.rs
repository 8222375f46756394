//! Collaborator interfaces and the report built over them.
//!
//! Persistence, settings and reversal storage live outside this crate. They
//! hand over fully materialized batches; everything after the fetch is pure.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::info;

use crate::aggregate::aggregate_days;
use crate::config::{EngineConfig, UnitPriceConfig};
use crate::error::EngineError;
use crate::estorno::{reconcile_by_category, CategoryReversals};
use crate::model::{parse_day_id, DayRecord, ReversalRecord};
use crate::rollup::{rollup_by_month, rollup_days, MonthRollup, RangeRollup};

/// Day-entry persistence.
pub trait DayRecordSource {
    fn fetch_day_records(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DayRecord>, EngineError>;
}

/// Reversal (estorno) storage, one batch per category.
pub trait ReversalSource {
    fn fetch_reversals(
        &self,
        category: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<ReversalRecord>, EngineError>;
}

/// Settings store.
pub trait SettingsSource {
    fn unit_price_config(&self) -> Result<UnitPriceConfig, EngineError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRequest {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub reversal_categories: Vec<String>,
}

impl ReportRequest {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start,
            end,
            reversal_categories: Vec::new(),
        }
    }

    pub fn with_reversal_category(mut self, category: impl Into<String>) -> Self {
        self.reversal_categories.push(category.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeReport {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub rollup: RangeRollup,
    pub months: Vec<MonthRollup>,
    pub reversals: CategoryReversals,
}

/// Fetch a date range from the collaborators and reduce it.
pub fn build_range_report<D, R, S>(
    days: &D,
    reversals: &R,
    settings: &S,
    config: &EngineConfig,
    request: &ReportRequest,
) -> Result<RangeReport, EngineError>
where
    D: DayRecordSource + ?Sized,
    R: ReversalSource + ?Sized,
    S: SettingsSource + ?Sized,
{
    let (start, end) = (request.start, request.end);
    if start > end {
        return Err(EngineError::InvalidRange { start, end });
    }

    let records = days.fetch_day_records(start, end)?;
    let prices = settings.unit_price_config()?;
    let mut batches: BTreeMap<String, Vec<ReversalRecord>> = BTreeMap::new();
    for category in &request.reversal_categories {
        let batch = reversals.fetch_reversals(category, start, end)?;
        batches.insert(category.clone(), batch);
    }

    info!(
        start = %start,
        end = %end,
        days = records.len(),
        reversal_categories = batches.len(),
        "Building range report"
    );

    let totals = aggregate_days(&records, config, &prices);
    let months = rollup_by_month(totals.clone());
    Ok(RangeReport {
        start,
        end,
        rollup: rollup_days(totals),
        months,
        reversals: reconcile_by_category(&batches),
    })
}

/// In-process store implementing every collaborator.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    pub days: Vec<DayRecord>,
    pub reversals: BTreeMap<String, Vec<ReversalRecord>>,
    pub prices: UnitPriceConfig,
}

fn within(date: NaiveDate, start: NaiveDate, end: NaiveDate) -> bool {
    start <= date && date <= end
}

impl DayRecordSource for MemoryStore {
    fn fetch_day_records(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DayRecord>, EngineError> {
        Ok(self
            .days
            .iter()
            .filter(|d| d.date().is_some_and(|date| within(date, start, end)))
            .cloned()
            .collect())
    }
}

impl ReversalSource for MemoryStore {
    /// Undated reversals are returned with every range.
    fn fetch_reversals(
        &self,
        category: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<ReversalRecord>, EngineError> {
        Ok(self
            .reversals
            .get(category)
            .map(|records| {
                records
                    .iter()
                    .filter(|r| match r.date.as_deref().map(parse_day_id) {
                        Some(Some(date)) => within(date, start, end),
                        Some(None) => false,
                        None => true,
                    })
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}

impl SettingsSource for MemoryStore {
    fn unit_price_config(&self) -> Result<UnitPriceConfig, EngineError> {
        Ok(self.prices.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Amount;
    use serde_json::json;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn store() -> MemoryStore {
        let days = ["2026-02-28", "2026-03-01", "2026-03-02"]
            .into_iter()
            .map(|id| {
                DayRecord::from_json(&json!({
                    "id": id,
                    "periods": { "cafeDaManha": { "channels": {
                        "cdmLista": { "quantity": 10, "totalValue": 0 }
                    } } }
                }))
            })
            .collect();
        let mut reversals = BTreeMap::new();
        reversals.insert(
            "restaurante".to_string(),
            ReversalRecord::batch_from_json(&json!([
                { "date": "2026-03-01", "reason": "relaunch", "uh": "101", "nf": "55", "reversalValue": -80 },
                { "date": "2026-03-02", "reason": "not consumed", "uh": "101", "nf": "55", "reversalValue": -80 },
                { "date": "2026-02-27", "reason": "not consumed", "uh": "9", "nf": "1", "reversalValue": -5 }
            ])),
        );
        MemoryStore {
            days,
            reversals,
            prices: UnitPriceConfig::new([("cdmLista", 50.0)]),
        }
    }

    #[test]
    fn report_over_memory_store() {
        let store = store();
        let request = ReportRequest::new(date("2026-03-01"), date("2026-03-31"))
            .with_reversal_category("restaurante");
        let report =
            build_range_report(&store, &store, &store, &EngineConfig::default(), &request).unwrap();

        assert_eq!(report.rollup.days.len(), 2);
        assert_eq!(
            report.rollup.summary.categories["cafeDaManha"],
            Amount::new(20.0, 1000.0)
        );
        assert_eq!(report.months.len(), 1);
        assert_eq!(report.months[0].month, "2026-03");

        let restaurant = &report.reversals.by_category["restaurante"];
        assert_eq!(restaurant.neutralized.len(), 2);
        assert_eq!(report.reversals.combined.debit, Amount::ZERO);
    }

    #[test]
    fn inverted_range_is_rejected() {
        let store = store();
        let request = ReportRequest::new(date("2026-03-02"), date("2026-03-01"));
        let err = build_range_report(&store, &store, &store, &EngineConfig::default(), &request)
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidRange { .. }));
    }

    struct FailingSettings;

    impl SettingsSource for FailingSettings {
        fn unit_price_config(&self) -> Result<UnitPriceConfig, EngineError> {
            Err(EngineError::collaborator("settings", "store offline"))
        }
    }

    #[test]
    fn collaborator_failures_propagate() {
        let store = store();
        let request = ReportRequest::new(date("2026-03-01"), date("2026-03-02"));
        let err = build_range_report(
            &store,
            &store,
            &FailingSettings,
            &EngineConfig::default(),
            &request,
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "settings failed: store offline");
    }

    #[test]
    fn unknown_reversal_category_is_empty() {
        let store = store();
        let batch = store
            .fetch_reversals("roomService", date("2026-01-01"), date("2026-12-31"))
            .unwrap();
        assert!(batch.is_empty());
    }
}
