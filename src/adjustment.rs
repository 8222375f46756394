//! Reajuste (internal-consumption adjustment) tracking.
//!
//! The adjustment is kept apart from the internal-consumption total because
//! it enters the grand totals on its own line. Older records store it as a
//! `{prefix}Reajuste` channel, newer ones as the sub-tab's `reajuste` field;
//! both are read once each and summed.

use crate::config::{EngineConfig, Shift};
use crate::decompose::{merge_sources, ShiftView, SubtotalSource};
use crate::model::{Amount, DayRecord};

/// Every adjustment contribution of a shift, tagged by schema generation.
pub fn adjustment_sources(
    day: &DayRecord,
    config: &EngineConfig,
    shift: Shift,
) -> Vec<SubtotalSource> {
    let view = ShiftView::new(day, config, shift);
    let mut sources: Vec<SubtotalSource> = view
        .legacy(&config.suffixes.adjustment)
        .into_iter()
        // the channel's quantity carries no meaning for a reajuste
        .map(|source| SubtotalSource::Legacy(Amount::new(0.0, source.amount().value)))
        .collect();
    if let Some(tab) = view.tab {
        sources.push(SubtotalSource::Itemized(Amount::new(0.0, tab.adjustment)));
    }
    sources
}

/// Adjustment value of one shift.
pub fn shift_adjustment(day: &DayRecord, config: &EngineConfig, shift: Shift) -> f64 {
    merge_sources(&adjustment_sources(day, config, shift)).value
}

/// Adjustment across the restaurant shifts of a day.
pub fn day_adjustment(day: &DayRecord, config: &EngineConfig) -> f64 {
    Shift::RESTAURANT
        .iter()
        .map(|shift| shift_adjustment(day, config, *shift))
        .sum()
}
