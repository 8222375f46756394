//! Folding daily totals into range and monthly summaries.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::warn;

use crate::aggregate::{DayTotals, GrandTotals, ShiftTotals};
use crate::model::{parse_day_id, Amount};

/// Running totals over a set of days.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RollupSummary {
    pub day_count: usize,
    pub categories: BTreeMap<String, Amount>,
    pub shifts: ShiftTotals,
    pub internal_consumption: Amount,
    pub adjustment: Amount,
    pub grand_total: GrandTotals,
    /// Grand totals divided by `day_count`.
    pub daily_average: GrandTotals,
}

impl RollupSummary {
    pub fn add_day(&mut self, day: &DayTotals) {
        self.day_count += 1;
        for (category, amount) in day.category_totals() {
            *self.categories.entry(category).or_default() += amount;
        }
        self.shifts.lunch_first += day.shifts.lunch_first;
        self.shifts.lunch_second += day.shifts.lunch_second;
        self.shifts.dinner += day.shifts.dinner;
        self.internal_consumption += day.internal_consumption;
        self.adjustment += day.adjustment;
        self.grand_total.with_internal_consumption += day.grand_total.with_internal_consumption;
        self.grand_total.without_internal_consumption +=
            day.grand_total.without_internal_consumption;
        self.daily_average = average(&self.grand_total, self.day_count);
    }
}

fn average(total: &GrandTotals, days: usize) -> GrandTotals {
    if days == 0 {
        return GrandTotals::default();
    }
    let n = days as f64;
    let per_day = |a: Amount| Amount::new(a.quantity / n, a.value / n);
    GrandTotals {
        with_internal_consumption: per_day(total.with_internal_consumption),
        without_internal_consumption: per_day(total.without_internal_consumption),
    }
}

/// Per-day drill-down plus the cumulative summary.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeRollup {
    pub days: Vec<DayTotals>,
    pub summary: RollupSummary,
}

/// Fold days into one rollup. Days are listed in date-id order.
pub fn rollup_days(mut days: Vec<DayTotals>) -> RangeRollup {
    days.sort_by(|a, b| a.date.cmp(&b.date));
    let mut summary = RollupSummary::default();
    for day in &days {
        summary.add_day(day);
    }
    RangeRollup { days, summary }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthRollup {
    /// `YYYY-MM`, or the raw day id when it is not a date.
    pub month: String,
    #[serde(flatten)]
    pub rollup: RangeRollup,
}

/// One rollup per calendar month, in month order.
pub fn rollup_by_month(days: Vec<DayTotals>) -> Vec<MonthRollup> {
    let mut groups: BTreeMap<String, Vec<DayTotals>> = BTreeMap::new();
    for day in days {
        let month = match parse_day_id(&day.date) {
            Some(date) => date.format("%Y-%m").to_string(),
            None => {
                warn!(day = %day.date, "Day id is not a date, reporting it on its own");
                day.date.clone()
            }
        };
        groups.entry(month).or_default().push(day);
    }
    groups
        .into_iter()
        .map(|(month, days)| MonthRollup {
            month,
            rollup: rollup_days(days),
        })
        .collect()
}
