//! Channel layout and unit-price configuration.
//!
//! The entry form stores legacy channels under keys built from a shift
//! prefix plus a category suffix (`almocoPrimeiroTurno` + `FaturadoHotel`).
//! Everything that names a period, sub-tab, prefix or suffix lives here and
//! is passed explicitly into the decomposer.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::aggregate::Category;
use crate::error::EngineError;
use crate::extract::number_from_value;

/// Sales shifts that carry the full channel set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Shift {
    /// Madrugada: only room service is sold here.
    LateNight,
    LunchFirst,
    LunchSecond,
    Dinner,
}

impl Shift {
    pub const ALL: [Shift; 4] = [
        Shift::LateNight,
        Shift::LunchFirst,
        Shift::LunchSecond,
        Shift::Dinner,
    ];

    /// The three restaurant shifts with per-shift totals.
    pub const RESTAURANT: [Shift; 3] = [Shift::LunchFirst, Shift::LunchSecond, Shift::Dinner];
}

/// Where one shift's data lives inside a day record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftLayout {
    /// Period id in `DayRecord::periods`.
    pub period: String,
    /// Sub-tab id inside that period (new format).
    pub sub_tab: String,
    /// Prefix of the legacy channel keys.
    pub prefix: String,
}

impl ShiftLayout {
    fn new(period: &str, sub_tab: &str, prefix: &str) -> Self {
        Self {
            period: period.to_string(),
            sub_tab: sub_tab.to_string(),
            prefix: prefix.to_string(),
        }
    }

    pub fn channel_key(&self, suffix: &str) -> String {
        format!("{}{}", self.prefix, suffix)
    }
}

/// Category suffixes appended to a shift prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChannelSuffixes {
    pub room_service: String,
    pub guest_folio: String,
    pub table_cash: String,
    pub table_credit: String,
    pub table_debit: String,
    pub table_pix: String,
    pub delivery: String,
    pub billed_hotel: String,
    pub billed_staff: String,
    pub billed_other: String,
    pub internal_consumption: String,
    pub frigobar: String,
    pub adjustment: String,
}

impl Default for ChannelSuffixes {
    fn default() -> Self {
        Self {
            room_service: "RoomService".into(),
            guest_folio: "Hospede".into(),
            table_cash: "MesaDinheiro".into(),
            table_credit: "MesaCredito".into(),
            table_debit: "MesaDebito".into(),
            table_pix: "MesaPix".into(),
            delivery: "Delivery".into(),
            billed_hotel: "FaturadoHotel".into(),
            billed_staff: "FaturadoFuncionario".into(),
            billed_other: "FaturadoOutros".into(),
            internal_consumption: "ConsumoInterno".into(),
            frigobar: "Frigobar".into(),
            adjustment: "Reajuste".into(),
        }
    }
}

/// Café-da-manhã sub-line channel ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BreakfastLayout {
    pub period: String,
    pub guest_list: String,
    pub no_show: String,
    pub no_check_in: String,
    pub signed: String,
    pub card_direct: String,
}

impl Default for BreakfastLayout {
    fn default() -> Self {
        Self {
            period: "cafeDaManha".into(),
            guest_list: "cdmLista".into(),
            no_show: "cdmNoShow".into(),
            no_check_in: "cdmSemCheckIn".into(),
            signed: "cdmAssinado".into(),
            card_direct: "cdmCartaoDireto".into(),
        }
    }
}

impl BreakfastLayout {
    pub fn lines(&self) -> [&str; 5] {
        [
            &self.guest_list,
            &self.no_show,
            &self.no_check_in,
            &self.signed,
            &self.card_direct,
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    pub late_night: ShiftLayout,
    pub lunch_first: ShiftLayout,
    pub lunch_second: ShiftLayout,
    pub dinner: ShiftLayout,
    pub suffixes: ChannelSuffixes,
    pub breakfast: BreakfastLayout,
    pub frigobar_period: String,
    pub events_period: String,
    /// Outlets reported as one channel each (bars, happy hour, ...).
    pub single_channel_periods: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            late_night: ShiftLayout::new("madrugada", "madrugada", "madrugada"),
            lunch_first: ShiftLayout::new("almoco", "primeiroTurno", "almocoPrimeiroTurno"),
            lunch_second: ShiftLayout::new("almoco", "segundoTurno", "almocoSegundoTurno"),
            dinner: ShiftLayout::new("jantar", "jantar", "jantar"),
            suffixes: ChannelSuffixes::default(),
            breakfast: BreakfastLayout::default(),
            frigobar_period: "frigobar".into(),
            events_period: "eventos".into(),
            single_channel_periods: vec!["happyHour".into(), "barPiscina".into()],
        }
    }
}

impl EngineConfig {
    /// Parse a JSON config. Missing sections fall back to the defaults.
    pub fn from_json_str(raw: &str) -> Result<Self, EngineError> {
        let config: EngineConfig = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn layout(&self, shift: Shift) -> &ShiftLayout {
        match shift {
            Shift::LateNight => &self.late_night,
            Shift::LunchFirst => &self.lunch_first,
            Shift::LunchSecond => &self.lunch_second,
            Shift::Dinner => &self.dinner,
        }
    }

    /// Reject layouts that would make two shifts read the same channels.
    pub fn validate(&self) -> Result<(), EngineError> {
        let mut prefixes = BTreeSet::new();
        let mut tabs = BTreeSet::new();
        for shift in Shift::ALL {
            let layout = self.layout(shift);
            if layout.period.trim().is_empty() || layout.prefix.trim().is_empty() {
                return Err(EngineError::Config(format!(
                    "{shift:?}: period and prefix must not be empty"
                )));
            }
            if !prefixes.insert(layout.prefix.as_str()) {
                return Err(EngineError::Config(format!(
                    "{shift:?}: prefix '{}' is used by another shift",
                    layout.prefix
                )));
            }
            if !tabs.insert((layout.period.as_str(), layout.sub_tab.as_str())) {
                return Err(EngineError::Config(format!(
                    "{shift:?}: sub-tab '{}.{}' is used by another shift",
                    layout.period, layout.sub_tab
                )));
            }
        }

        // every whole period is counted by exactly one category
        let whole_periods = [
            &self.breakfast.period,
            &self.frigobar_period,
            &self.events_period,
        ]
        .into_iter()
        .chain(self.single_channel_periods.iter());
        let mut claimed = BTreeSet::new();
        for period in whole_periods {
            if tabs.iter().any(|(shift_period, _)| *shift_period == period.as_str()) {
                return Err(EngineError::Config(format!(
                    "period '{period}' is both a shift period and a whole-period category"
                )));
            }
            if !claimed.insert(period.as_str()) {
                return Err(EngineError::Config(format!(
                    "period '{period}' is assigned to more than one category"
                )));
            }
        }

        // outlets share the category map with the fixed categories
        for outlet in &self.single_channel_periods {
            if Category::ALL.iter().any(|c| c.as_str() == outlet.as_str()) {
                return Err(EngineError::Config(format!(
                    "outlet '{outlet}' collides with a report category"
                )));
            }
        }
        Ok(())
    }
}

/// Configured price per person, keyed by channel id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnitPriceConfig(BTreeMap<String, f64>);

impl UnitPriceConfig {
    pub fn new<I, S>(prices: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        Self(prices.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Build from a settings payload; entries that are not numbers are dropped.
    pub fn from_json(value: &Value) -> Self {
        let Some(map) = value.as_object() else {
            return Self::default();
        };
        Self(
            map.iter()
                .filter_map(|(k, v)| number_from_value(v).map(|n| (k.clone(), n)))
                .collect(),
        )
    }

    /// Price for a channel, only when a positive price is configured.
    pub fn price(&self, channel: &str) -> Option<f64> {
        self.0.get(channel).copied().filter(|p| *p > 0.0)
    }
}
