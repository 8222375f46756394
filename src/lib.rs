//! Revenue decomposition and reconciliation for hotel F&B day entries.
//!
//! Day records written by the entry form (and the spreadsheet importer) are
//! reduced to canonical sub-totals per shift, named category totals and the
//! two grand totals (with and without internal consumption). Reversal
//! batches are reconciled separately: a relaunch that cancels an earlier
//! debit drops out of every total. Daily results fold into range and monthly
//! rollups for dashboards and exports.
//!
//! Everything here is synchronous and pure. Fetching records and settings is
//! the caller's job (see [`sources`]).

pub mod adjustment;
pub mod aggregate;
pub mod config;
pub mod decompose;
pub mod error;
pub mod estorno;
pub mod extract;
pub mod logging;
pub mod model;
pub mod rollup;
pub mod sources;

pub use aggregate::{aggregate_day, aggregate_days, Category, DayTotals, GrandTotals};
pub use config::{EngineConfig, Shift, UnitPriceConfig};
pub use decompose::{
    decompose_day, decompose_shift, merge_sources, ShiftBreakdown, SubtotalSource,
};
pub use error::EngineError;
pub use estorno::{reconcile_by_category, reconcile_reversals, ReversalRole, ReversalSummary};
pub use model::{Amount, DayRecord, ReversalReason, ReversalRecord};
pub use rollup::{rollup_by_month, rollup_days, RangeRollup};
pub use sources::{build_range_report, RangeReport, ReportRequest};
