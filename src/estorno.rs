//! Estorno (reversal) reconciliation.
//!
//! A relaunch is a credit that re-posts a charge previously reversed as an
//! error (divergent signature, not consumed). When a credit and a debit share
//! room, invoice and absolute amount they cancel each other and drop out of
//! every total. Any other reason is a control entry: always counted, never
//! paired.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use tracing::debug;

use crate::model::{Amount, ReversalReason, ReversalRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ReversalRole {
    Credit,
    Debit,
    Control,
}

impl ReversalRole {
    pub fn of(reason: &ReversalReason) -> Self {
        match reason {
            ReversalReason::Relaunch => Self::Credit,
            ReversalReason::DivergentSignature | ReversalReason::NotConsumed => Self::Debit,
            ReversalReason::Duplicate | ReversalReason::Other(_) => Self::Control,
        }
    }
}

/// How one input record was classified.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReversalEntry {
    pub index: usize,
    /// Record id, or `#<index>` when the id is blank or repeated in the batch.
    pub id: String,
    pub role: ReversalRole,
    pub neutralized: bool,
    /// Index of the record this one cancelled against.
    pub matched_with: Option<usize>,
}

/// Bucketed totals of the records still in effect.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReversalTotals {
    /// Relaunch reversal values; quantity never counts here.
    pub credit: Amount,
    pub debit: Amount,
    pub control: Amount,
    /// Quantity of non-relaunch records.
    pub quantity: f64,
    /// Invoice value of non-relaunch records.
    pub invoice_value: f64,
}

impl ReversalTotals {
    /// Reversal value still debited against revenue.
    pub fn active_value(&self) -> f64 {
        self.debit.value + self.control.value
    }

    fn absorb(&mut self, other: &ReversalTotals) {
        self.credit += other.credit;
        self.debit += other.debit;
        self.control += other.control;
        self.quantity += other.quantity;
        self.invoice_value += other.invoice_value;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReversalSummary {
    #[serde(flatten)]
    pub totals: ReversalTotals,
    /// Entry ids (see [`ReversalEntry::id`]) of every cancelled record.
    pub neutralized: BTreeSet<String>,
    pub entries: Vec<ReversalEntry>,
}

impl ReversalSummary {
    /// Whether the record at `index` of the input batch was cancelled.
    pub fn is_neutralized(&self, index: usize) -> bool {
        self.entries.get(index).is_some_and(|e| e.neutralized)
    }
}

/// Ids the entries are reported under. Blank ids and ids shared by several
/// records fall back to the record's position.
fn entry_ids(records: &[ReversalRecord]) -> Vec<String> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for record in records {
        *counts.entry(record.id.as_str()).or_default() += 1;
    }
    records
        .iter()
        .enumerate()
        .map(|(index, record)| {
            let shared = counts.get(record.id.as_str()).is_some_and(|n| *n > 1);
            if record.id.is_empty() || shared {
                format!("#{index}")
            } else {
                record.id.clone()
            }
        })
        .collect()
}

/// Absolute values compared at cent precision.
fn same_amount(a: f64, b: f64) -> bool {
    (a.abs() * 100.0).round() == (b.abs() * 100.0).round()
}

/// Pair credits with debits, then total what is left.
///
/// Credits are taken in list order; each one consumes the first unmatched
/// debit with the same room, invoice and absolute reversal value. Records
/// missing room or invoice never pair.
pub fn reconcile_reversals(records: &[ReversalRecord]) -> ReversalSummary {
    let roles: Vec<ReversalRole> = records.iter().map(|r| ReversalRole::of(&r.reason)).collect();
    let ids = entry_ids(records);
    let mut partner: Vec<Option<usize>> = vec![None; records.len()];

    let debits: Vec<usize> = (0..records.len())
        .filter(|&i| roles[i] == ReversalRole::Debit && records[i].match_key().is_some())
        .collect();

    for (ci, credit) in records.iter().enumerate() {
        if roles[ci] != ReversalRole::Credit {
            continue;
        }
        let Some(credit_key) = credit.match_key() else {
            continue;
        };
        let found = debits.iter().copied().find(|&di| {
            partner[di].is_none()
                && records[di].match_key() == Some(credit_key)
                && same_amount(records[di].reversal_value, credit.reversal_value)
        });
        if let Some(di) = found {
            partner[ci] = Some(di);
            partner[di] = Some(ci);
            debug!(
                credit = %ids[ci],
                debit = %ids[di],
                room = credit_key.0,
                invoice = credit_key.1,
                "Reversal pair neutralized"
            );
        }
    }

    let mut summary = ReversalSummary::default();
    for ((index, record), id) in records.iter().enumerate().zip(ids) {
        let role = roles[index];
        let neutralized = partner[index].is_some();
        if neutralized {
            summary.neutralized.insert(id.clone());
        }
        summary.entries.push(ReversalEntry {
            index,
            id,
            role,
            neutralized,
            matched_with: partner[index],
        });
        if neutralized {
            continue;
        }

        let totals = &mut summary.totals;
        match role {
            ReversalRole::Credit => totals.credit.value += record.reversal_value,
            ReversalRole::Debit | ReversalRole::Control => {
                totals.quantity += record.quantity;
                totals.invoice_value += record.invoice_value;
                let bucket = if role == ReversalRole::Debit {
                    &mut totals.debit
                } else {
                    &mut totals.control
                };
                *bucket += Amount::new(record.quantity, record.reversal_value);
            }
        }
    }
    summary
}

/// Reconciliation per reversal category plus the combined totals.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryReversals {
    pub by_category: BTreeMap<String, ReversalSummary>,
    pub combined: ReversalTotals,
}

/// Each category is reconciled on its own: a relaunch never cancels a debit
/// filed under another category.
pub fn reconcile_by_category(
    batches: &BTreeMap<String, Vec<ReversalRecord>>,
) -> CategoryReversals {
    let mut out = CategoryReversals::default();
    for (category, records) in batches {
        let summary = reconcile_reversals(records);
        out.combined.absorb(&summary.totals);
        out.by_category.insert(category.clone(), summary);
    }
    out
}
