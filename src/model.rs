//! Typed day-entry and reversal records.
//!
//! Records are built leniently from JSON: a malformed piece is dropped (and
//! logged at debug level) instead of rejecting the whole day. Past the
//! constructors nothing in the engine touches untyped values again.

use std::collections::BTreeMap;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::EngineError;
use crate::extract::{number_field, text_field};

// ---------------------------------------------------------------------------
// Amount
// ---------------------------------------------------------------------------

/// Quantity and monetary value, always summed independently.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Amount {
    pub quantity: f64,
    pub value: f64,
}

impl Amount {
    pub const ZERO: Amount = Amount {
        quantity: 0.0,
        value: 0.0,
    };

    pub const fn new(quantity: f64, value: f64) -> Self {
        Self { quantity, value }
    }

    pub fn is_zero(&self) -> bool {
        self.quantity == 0.0 && self.value == 0.0
    }

    /// Read a `{quantity, totalValue}` channel object.
    pub fn from_channel(value: &Value) -> Self {
        Self {
            quantity: number_field(value, &["quantity", "quantidade"]),
            value: number_field(value, &["totalValue", "valorTotal", "value", "valor"]),
        }
    }
}

impl Add for Amount {
    type Output = Amount;

    fn add(self, rhs: Amount) -> Amount {
        Amount {
            quantity: self.quantity + rhs.quantity,
            value: self.value + rhs.value,
        }
    }
}

impl AddAssign for Amount {
    fn add_assign(&mut self, rhs: Amount) {
        self.quantity += rhs.quantity;
        self.value += rhs.value;
    }
}

impl Sub for Amount {
    type Output = Amount;

    fn sub(self, rhs: Amount) -> Amount {
        Amount {
            quantity: self.quantity - rhs.quantity,
            value: self.value - rhs.value,
        }
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Amount>>(iter: I) -> Amount {
        iter.fold(Amount::ZERO, Add::add)
    }
}

// ---------------------------------------------------------------------------
// Channels and itemized lists
// ---------------------------------------------------------------------------

/// Aggregated channels of one period or sub-tab: channel id → amount.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChannelMap(BTreeMap<String, Amount>);

impl ChannelMap {
    pub fn from_json(value: &Value) -> Self {
        let Some(map) = value.as_object() else {
            return Self::default();
        };
        Self(
            map.iter()
                .filter(|(_, v)| v.is_object())
                .map(|(k, v)| (k.clone(), Amount::from_channel(v)))
                .collect(),
        )
    }

    /// Amount of a channel; unknown channels are zero.
    pub fn get(&self, channel: &str) -> Amount {
        self.0.get(channel).copied().unwrap_or_default()
    }

    pub fn contains(&self, channel: &str) -> bool {
        self.0.contains_key(channel)
    }

    pub fn total(&self) -> Amount {
        self.0.values().copied().sum()
    }

    pub fn insert(&mut self, channel: impl Into<String>, amount: Amount) {
        self.0.insert(channel.into(), amount);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Who a billed-to-account item was charged to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BilledTo {
    Hotel,
    Staff,
    Other,
}

impl BilledTo {
    pub fn from_label(label: Option<&str>) -> Self {
        let normalized = label.map(normalize_label).unwrap_or_default();
        match normalized.as_str() {
            "hotel" | "hospede" | "guest" => Self::Hotel,
            "funcionario" | "funcionarios" | "colaborador" | "staff" => Self::Staff,
            _ => Self::Other,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BilledItem {
    pub client_name: Option<String>,
    pub billed_to: BilledTo,
    pub quantity: f64,
    pub value: f64,
    pub note: Option<String>,
}

impl BilledItem {
    pub fn from_json(value: &Value) -> Self {
        Self {
            client_name: text_field(value, &["clientName", "cliente", "name"]),
            billed_to: BilledTo::from_label(text_field(value, &["type", "tipo"]).as_deref()),
            quantity: number_field(value, &["quantity", "quantidade"]),
            value: number_field(value, &["value", "valor", "totalValue"]),
            note: text_field(value, &["note", "observacao", "obs"]),
        }
    }

    pub fn amount(&self) -> Amount {
        Amount::new(self.quantity, self.value)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InternalConsumptionItem {
    pub client_name: Option<String>,
    pub quantity: f64,
    pub value: f64,
    pub note: Option<String>,
}

impl InternalConsumptionItem {
    pub fn from_json(value: &Value) -> Self {
        Self {
            client_name: text_field(value, &["clientName", "cliente", "name"]),
            quantity: number_field(value, &["quantity", "quantidade"]),
            value: number_field(value, &["value", "valor", "totalValue"]),
            note: text_field(value, &["note", "observacao", "obs"]),
        }
    }

    pub fn amount(&self) -> Amount {
        Amount::new(self.quantity, self.value)
    }
}

fn items_from_json<T>(value: Option<&Value>, parse: fn(&Value) -> T) -> Vec<T> {
    match value {
        Some(Value::Array(items)) => items.iter().filter(|v| v.is_object()).map(parse).collect(),
        Some(Value::Null) | None => Vec::new(),
        Some(other) => {
            debug!(found = %kind_of(other), "Ignoring itemized list that is not an array");
            Vec::new()
        }
    }
}

// ---------------------------------------------------------------------------
// Periods
// ---------------------------------------------------------------------------

/// One sub-tab of a period (new format).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubTab {
    pub channels: ChannelMap,
    pub billed_items: Vec<BilledItem>,
    pub internal_items: Vec<InternalConsumptionItem>,
    /// `reajuste` as typed into the sub-tab.
    pub adjustment: f64,
}

impl SubTab {
    pub fn from_json(value: &Value) -> Self {
        Self {
            channels: ChannelMap::from_json(value.get("channels").unwrap_or(&Value::Null)),
            billed_items: items_from_json(
                value.get("faturadoItems").or_else(|| value.get("billedItems")),
                BilledItem::from_json,
            ),
            internal_items: items_from_json(
                value
                    .get("consumoInternoItems")
                    .or_else(|| value.get("internalConsumptionItems")),
                InternalConsumptionItem::from_json,
            ),
            adjustment: number_field(value, &["reajuste", "adjustment"]),
        }
    }
}

/// One meal period of a day.
///
/// Legacy records only have the flat `channels` map; newer ones use
/// `sub_tabs`. Both may be populated for the same period.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PeriodPayload {
    pub channels: ChannelMap,
    pub sub_tabs: BTreeMap<String, SubTab>,
}

impl PeriodPayload {
    pub fn from_json(value: &Value) -> Self {
        let Some(map) = value.as_object() else {
            debug!(found = %kind_of(value), "Ignoring period payload that is not an object");
            return Self::default();
        };

        if !map.contains_key("channels") && !map.contains_key("subTabs") {
            // Bare channel map: { "channelId": { quantity, totalValue }, ... }
            return Self {
                channels: ChannelMap::from_json(value),
                sub_tabs: BTreeMap::new(),
            };
        }

        let sub_tabs = match map.get("subTabs") {
            Some(Value::Object(tabs)) => tabs
                .iter()
                .filter(|(_, v)| v.is_object())
                .map(|(k, v)| (k.clone(), SubTab::from_json(v)))
                .collect(),
            _ => BTreeMap::new(),
        };

        Self {
            channels: ChannelMap::from_json(map.get("channels").unwrap_or(&Value::Null)),
            sub_tabs,
        }
    }

    pub fn sub_tab(&self, id: &str) -> Option<&SubTab> {
        self.sub_tabs.get(id)
    }

    /// Every channel of the period, flat and inside sub-tabs.
    pub fn channels_total(&self) -> Amount {
        self.channels.total()
            + self
                .sub_tabs
                .values()
                .map(|tab| tab.channels.total())
                .sum::<Amount>()
    }
}

// ---------------------------------------------------------------------------
// Day record
// ---------------------------------------------------------------------------

const DAY_RESERVED_KEYS: [&str; 5] = ["id", "date", "data", "observations", "observacoes"];

/// One calendar day of F&B entries, keyed by its ISO date.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "Value")]
pub struct DayRecord {
    pub id: String,
    pub observations: Option<String>,
    pub periods: BTreeMap<String, PeriodPayload>,
}

impl DayRecord {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Build from a stored day entry. Periods are read from `periods`, or
    /// from top-level objects when the record predates that key.
    pub fn from_json(value: &Value) -> Self {
        let id = text_field(value, &["id", "date", "data"]).unwrap_or_default();
        let observations = text_field(value, &["observations", "observacoes"]);

        let periods = match value.get("periods") {
            Some(Value::Object(periods)) => periods
                .iter()
                .map(|(k, v)| (k.clone(), PeriodPayload::from_json(v)))
                .collect(),
            other => {
                if let Some(bad) = other {
                    debug!(
                        day = %id,
                        found = %kind_of(bad),
                        "periods is not an object, reading top level"
                    );
                }
                value
                    .as_object()
                    .map(|map| {
                        map.iter()
                            .filter(|(k, v)| {
                                v.is_object() && !DAY_RESERVED_KEYS.contains(&k.as_str())
                            })
                            .map(|(k, v)| (k.clone(), PeriodPayload::from_json(v)))
                            .collect()
                    })
                    .unwrap_or_default()
            }
        };

        Self {
            id,
            observations,
            periods,
        }
    }

    pub fn from_json_str(raw: &str) -> Result<Self, EngineError> {
        let value: Value = serde_json::from_str(raw)?;
        Ok(Self::from_json(&value))
    }

    pub fn with_period(mut self, id: impl Into<String>, payload: PeriodPayload) -> Self {
        self.periods.insert(id.into(), payload);
        self
    }

    pub fn period(&self, id: &str) -> Option<&PeriodPayload> {
        self.periods.get(id)
    }

    pub fn date(&self) -> Option<NaiveDate> {
        parse_day_id(&self.id)
    }
}

impl From<Value> for DayRecord {
    fn from(value: Value) -> Self {
        Self::from_json(&value)
    }
}

/// Day ids are ISO dates; a timestamp suffix is tolerated.
pub fn parse_day_id(id: &str) -> Option<NaiveDate> {
    let head = id.trim().get(..10)?;
    NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()
}

// ---------------------------------------------------------------------------
// Reversals
// ---------------------------------------------------------------------------

/// Why a reversal (estorno) was recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ReversalReason {
    /// Relançamento: the charge was posted again correctly.
    Relaunch,
    DivergentSignature,
    NotConsumed,
    Duplicate,
    Other(String),
}

impl ReversalReason {
    pub fn parse(raw: &str) -> Self {
        match normalize_label(raw).as_str() {
            "relancamento" | "relaunch" => Self::Relaunch,
            "assinatura divergente" | "divergent signature" => Self::DivergentSignature,
            "nao consumido" | "not consumed" => Self::NotConsumed,
            "duplicidade" | "duplicado" | "lancamento duplicado" | "duplicate" => Self::Duplicate,
            _ => Self::Other(raw.trim().to_string()),
        }
    }
}

/// One estorno entry as stored by the reversal form.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "Value")]
pub struct ReversalRecord {
    pub id: String,
    pub date: Option<String>,
    /// UH
    pub room: Option<String>,
    /// NF
    pub invoice: Option<String>,
    pub reason: ReversalReason,
    pub quantity: f64,
    pub invoice_value: f64,
    pub reversal_value: f64,
}

impl ReversalRecord {
    pub fn from_json(value: &Value) -> Self {
        Self {
            id: text_field(value, &["id"]).unwrap_or_default(),
            date: text_field(value, &["date", "data"]),
            room: text_field(value, &["uh", "room"]),
            invoice: text_field(value, &["nf", "invoiceNumber", "invoice"]),
            reason: ReversalReason::parse(
                text_field(value, &["reason", "motivo"]).as_deref().unwrap_or(""),
            ),
            quantity: number_field(value, &["quantity", "quantidade"]),
            invoice_value: number_field(value, &["invoiceValue", "valorNf", "valorNF"]),
            reversal_value: number_field(
                value,
                &["reversalValue", "valorEstorno", "value", "valor"],
            ),
        }
    }

    /// Parse a list of reversals. Entries without an id get `#<position>`.
    pub fn batch_from_json(value: &Value) -> Vec<Self> {
        let Some(items) = value.as_array() else {
            return Vec::new();
        };
        items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                let mut record = Self::from_json(item);
                if record.id.is_empty() {
                    record.id = format!("#{index}");
                }
                record
            })
            .collect()
    }

    /// Room and invoice, when both are present.
    pub fn match_key(&self) -> Option<(&str, &str)> {
        Some((self.room.as_deref()?, self.invoice.as_deref()?))
    }
}

impl From<Value> for ReversalRecord {
    fn from(value: Value) -> Self {
        Self::from_json(&value)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Lowercase, strip Portuguese accents, unify separators.
fn normalize_label(raw: &str) -> String {
    let folded: String = raw
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'á' | 'à' | 'â' | 'ã' => 'a',
            'é' | 'ê' => 'e',
            'í' => 'i',
            'ó' | 'ô' | 'õ' => 'o',
            'ú' | 'ü' => 'u',
            'ç' => 'c',
            '_' | '-' => ' ',
            other => other,
        })
        .collect();
    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
