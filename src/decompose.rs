//! Period decomposer.
//!
//! Splits one shift of a day record into canonical sub-totals. Every
//! sub-category is read from each schema generation that can carry it and
//! the contributions are summed: there is no marker telling a migrated
//! record from a legacy one, and a single period may hold both.

use serde::Serialize;
use tracing::debug;

use crate::adjustment::shift_adjustment;
use crate::config::{EngineConfig, Shift, ShiftLayout};
use crate::model::{Amount, BilledTo, DayRecord, PeriodPayload, SubTab};

/// Where a contribution to a sub-total came from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SubtotalSource {
    /// Aggregated channel (`{prefix}{suffix}` → quantity/totalValue).
    Legacy(Amount),
    /// Sum of an itemized list.
    Itemized(Amount),
}

impl SubtotalSource {
    pub fn amount(&self) -> Amount {
        match self {
            Self::Legacy(a) | Self::Itemized(a) => *a,
        }
    }
}

/// Sum every contribution regardless of generation.
pub fn merge_sources(sources: &[SubtotalSource]) -> Amount {
    sources.iter().map(SubtotalSource::amount).sum()
}

/// Table service split by tender.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableService {
    pub cash: Amount,
    pub credit: Amount,
    pub debit: Amount,
    pub pix: Amount,
}

impl TableService {
    pub fn total(&self) -> Amount {
        self.cash + self.credit + self.debit + self.pix
    }
}

/// Billed-to-account split by who was charged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BilledBreakdown {
    pub hotel: Amount,
    pub staff: Amount,
    pub other: Amount,
}

impl BilledBreakdown {
    pub fn total(&self) -> Amount {
        self.hotel + self.staff + self.other
    }

    fn slot(&mut self, billed_to: BilledTo) -> &mut Amount {
        match billed_to {
            BilledTo::Hotel => &mut self.hotel,
            BilledTo::Staff => &mut self.staff,
            BilledTo::Other => &mut self.other,
        }
    }
}

/// Canonical sub-totals of one shift.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftBreakdown {
    pub shift: Shift,
    pub room_service: Amount,
    pub guest_folio: Amount,
    pub table_service: TableService,
    pub delivery: Amount,
    pub billed: BilledBreakdown,
    pub internal_consumption: Amount,
    pub frigobar: Amount,
    /// Reajuste; value only.
    pub adjustment: f64,
}

impl ShiftBreakdown {
    pub fn empty(shift: Shift) -> Self {
        Self {
            shift,
            room_service: Amount::ZERO,
            guest_folio: Amount::ZERO,
            table_service: TableService::default(),
            delivery: Amount::ZERO,
            billed: BilledBreakdown::default(),
            internal_consumption: Amount::ZERO,
            frigobar: Amount::ZERO,
            adjustment: 0.0,
        }
    }

    /// Table service + guest folio + delivery + billed + frigobar, with the
    /// adjustment added to the value.
    pub fn shift_total(&self) -> Amount {
        let mut total = self.table_service.total()
            + self.guest_folio
            + self.delivery
            + self.billed.total()
            + self.frigobar;
        total.value += self.adjustment;
        total
    }

    /// Shift total as it enters a combined meal total: frigobar is reported
    /// on its own line.
    pub fn meal_total(&self) -> Amount {
        self.shift_total() - self.frigobar
    }
}

/// The slices of a day record that belong to one shift.
pub(crate) struct ShiftView<'a> {
    pub layout: &'a ShiftLayout,
    pub period: Option<&'a PeriodPayload>,
    pub tab: Option<&'a SubTab>,
}

impl<'a> ShiftView<'a> {
    pub fn new(day: &'a DayRecord, config: &'a EngineConfig, shift: Shift) -> Self {
        let layout = config.layout(shift);
        let period = day.period(&layout.period);
        let tab = period.and_then(|p| p.sub_tab(&layout.sub_tab));
        Self {
            layout,
            period,
            tab,
        }
    }

    /// The prefixed channel from each location that actually carries it:
    /// the flat period map and the shift's sub-tab.
    pub fn legacy(&self, suffix: &str) -> Vec<SubtotalSource> {
        let key = self.layout.channel_key(suffix);
        let period_channels = self.period.map(|p| &p.channels);
        let tab_channels = self.tab.map(|t| &t.channels);
        [period_channels, tab_channels]
            .into_iter()
            .flatten()
            .filter(|channels| channels.contains(&key))
            .map(|channels| SubtotalSource::Legacy(channels.get(&key)))
            .collect()
    }

    fn channel(&self, suffix: &str) -> Amount {
        merge_sources(&self.legacy(suffix))
    }
}

/// Decompose one shift of a day.
pub fn decompose_shift(day: &DayRecord, config: &EngineConfig, shift: Shift) -> ShiftBreakdown {
    let view = ShiftView::new(day, config, shift);
    if view.period.is_none() {
        return ShiftBreakdown::empty(shift);
    }
    let sfx = &config.suffixes;

    let table_service = TableService {
        cash: view.channel(&sfx.table_cash),
        credit: view.channel(&sfx.table_credit),
        debit: view.channel(&sfx.table_debit),
        pix: view.channel(&sfx.table_pix),
    };

    let mut billed = BilledBreakdown::default();
    for (suffix, billed_to) in [
        (&sfx.billed_hotel, BilledTo::Hotel),
        (&sfx.billed_staff, BilledTo::Staff),
        (&sfx.billed_other, BilledTo::Other),
    ] {
        *billed.slot(billed_to) += view.channel(suffix);
    }
    let mut billed_itemized = Amount::ZERO;
    for item in view.tab.map(|t| t.billed_items.as_slice()).unwrap_or_default() {
        *billed.slot(item.billed_to) += item.amount();
        billed_itemized += item.amount();
    }
    note_mixed_schema(
        &day.id,
        shift,
        "billed",
        billed.total() - billed_itemized,
        billed_itemized,
    );

    let internal_sources = internal_consumption_sources(&view, &sfx.internal_consumption);
    let internal_consumption = merge_sources(&internal_sources);
    if let [.., SubtotalSource::Itemized(itemized)] = internal_sources.as_slice() {
        note_mixed_schema(
            &day.id,
            shift,
            "internalConsumption",
            internal_consumption - *itemized,
            *itemized,
        );
    }

    ShiftBreakdown {
        shift,
        room_service: view.channel(&sfx.room_service),
        guest_folio: view.channel(&sfx.guest_folio),
        table_service,
        delivery: view.channel(&sfx.delivery),
        billed,
        internal_consumption,
        frigobar: view.channel(&sfx.frigobar),
        adjustment: shift_adjustment(day, config, shift),
    }
}

/// Decompose every shift of a day, in `Shift::ALL` order.
pub fn decompose_day(day: &DayRecord, config: &EngineConfig) -> Vec<ShiftBreakdown> {
    Shift::ALL
        .iter()
        .map(|shift| decompose_shift(day, config, *shift))
        .collect()
}

fn internal_consumption_sources(view: &ShiftView<'_>, suffix: &str) -> Vec<SubtotalSource> {
    let mut sources = view.legacy(suffix);
    if let Some(tab) = view.tab {
        sources.push(SubtotalSource::Itemized(
            tab.internal_items.iter().map(|i| i.amount()).sum(),
        ));
    }
    sources
}

fn note_mixed_schema(day: &str, shift: Shift, category: &str, legacy: Amount, itemized: Amount) {
    if !legacy.is_zero() && !itemized.is_zero() {
        debug!(
            day = %day,
            shift = ?shift,
            category,
            legacy_value = legacy.value,
            itemized_value = itemized.value,
            "Summing legacy and itemized entries"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn day(value: serde_json::Value) -> DayRecord {
        DayRecord::from_json(&value)
    }

    #[test]
    fn legacy_and_itemized_billed_are_summed() {
        let d = day(json!({
            "id": "2026-03-14",
            "periods": { "almoco": {
                "channels": {
                    "almocoPrimeiroTurnoFaturadoHotel": { "quantity": 2, "totalValue": 100 }
                },
                "subTabs": { "primeiroTurno": {
                    "faturadoItems": [ { "type": "hotel", "quantity": 1, "value": 50 } ]
                } }
            } }
        }));
        let b = decompose_shift(&d, &EngineConfig::default(), Shift::LunchFirst);
        assert_eq!(b.billed.total(), Amount::new(3.0, 150.0));
        assert_eq!(b.billed.hotel, Amount::new(3.0, 150.0));
    }

    #[test]
    fn legacy_and_itemized_internal_consumption_are_summed() {
        let d = day(json!({
            "id": "2026-03-14",
            "periods": { "jantar": {
                "channels": { "jantarConsumoInterno": { "quantity": 4, "totalValue": 40 } },
                "subTabs": { "jantar": {
                    "channels": { "jantarConsumoInterno": { "quantity": 1, "totalValue": 10 } },
                    "consumoInternoItems": [
                        { "clientName": "Gerência", "quantity": 2, "value": 30 },
                        { "clientName": "Recepção", "quantity": 1, "value": "15" }
                    ]
                } }
            } }
        }));
        let b = decompose_shift(&d, &EngineConfig::default(), Shift::Dinner);
        assert_eq!(b.internal_consumption, Amount::new(8.0, 95.0));
    }

    #[test]
    fn billed_items_keep_their_type() {
        let d = day(json!({
            "id": "2026-03-14",
            "periods": { "almoco": { "subTabs": { "segundoTurno": {
                "channels": {
                    "almocoSegundoTurnoFaturadoFuncionario": { "quantity": 1, "totalValue": 20 }
                },
                "faturadoItems": [
                    { "type": "funcionario", "quantity": 1, "value": 25 },
                    { "type": "agencia", "quantity": 2, "value": 60 }
                ]
            } } } }
        }));
        let b = decompose_shift(&d, &EngineConfig::default(), Shift::LunchSecond);
        assert_eq!(b.billed.staff, Amount::new(2.0, 45.0));
        assert_eq!(b.billed.other, Amount::new(2.0, 60.0));
        assert_eq!(b.billed.hotel, Amount::ZERO);
    }

    #[test]
    fn shift_prefix_selects_channels() {
        let d = day(json!({
            "id": "2026-03-14",
            "periods": { "almoco": { "channels": {
                "almocoPrimeiroTurnoMesaDinheiro": { "quantity": 10, "totalValue": 500 },
                "almocoSegundoTurnoMesaPix": { "quantity": 3, "totalValue": 90 },
                "somethingElse": { "quantity": 99, "totalValue": 999 }
            } } }
        }));
        let cfg = EngineConfig::default();
        let first = decompose_shift(&d, &cfg, Shift::LunchFirst);
        let second = decompose_shift(&d, &cfg, Shift::LunchSecond);
        assert_eq!(first.table_service.cash, Amount::new(10.0, 500.0));
        assert_eq!(first.table_service.pix, Amount::ZERO);
        assert_eq!(second.table_service.total(), Amount::new(3.0, 90.0));
    }

    #[test]
    fn mixed_sources_shift_total() {
        let d = day(json!({
            "id": "2026-03-14",
            "periods": { "almoco": {
                "channels": {
                    "almocoPrimeiroTurnoMesaDinheiro": { "quantity": 10, "totalValue": 500 },
                    "almocoPrimeiroTurnoFaturadoOutros": { "quantity": 2, "totalValue": 100 }
                },
                "subTabs": { "primeiroTurno": {
                    "faturadoItems": [ { "type": "outros", "quantity": 1, "value": 50 } ]
                } }
            } }
        }));
        let b = decompose_shift(&d, &EngineConfig::default(), Shift::LunchFirst);
        assert_eq!(b.shift_total(), Amount::new(13.0, 650.0));
    }

    #[test]
    fn shift_total_includes_frigobar_and_adjustment_meal_total_drops_frigobar() {
        let d = day(json!({
            "id": "2026-03-14",
            "periods": { "jantar": {
                "channels": {
                    "jantarHospede": { "quantity": 5, "totalValue": 250 },
                    "jantarDelivery": { "quantity": 1, "totalValue": 40 },
                    "jantarFrigobar": { "quantity": 2, "totalValue": 30 },
                    "jantarReajuste": { "totalValue": -5 },
                    "jantarRoomService": { "quantity": 3, "totalValue": 120 }
                }
            } }
        }));
        let b = decompose_shift(&d, &EngineConfig::default(), Shift::Dinner);
        assert_eq!(b.adjustment, -5.0);
        assert_eq!(b.shift_total(), Amount::new(8.0, 315.0));
        assert_eq!(b.meal_total(), Amount::new(6.0, 285.0));
        // room service is reported separately
        assert_eq!(b.room_service, Amount::new(3.0, 120.0));
    }

    #[test]
    fn missing_period_is_all_zero() {
        let d = DayRecord::new("2026-03-14");
        let b = decompose_shift(&d, &EngineConfig::default(), Shift::LateNight);
        assert_eq!(b, ShiftBreakdown::empty(Shift::LateNight));
        assert_eq!(decompose_day(&d, &EngineConfig::default()).len(), 4);
    }

    #[test]
    fn merge_sources_sums_both_generations() {
        let merged = merge_sources(&[
            SubtotalSource::Legacy(Amount::new(2.0, 100.0)),
            SubtotalSource::Itemized(Amount::new(1.0, 50.0)),
            SubtotalSource::Legacy(Amount::ZERO),
        ]);
        assert_eq!(merged, Amount::new(3.0, 150.0));
        assert_eq!(merge_sources(&[]), Amount::ZERO);
    }
}
