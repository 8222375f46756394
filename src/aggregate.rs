//! Daily aggregation: named category totals and the two grand totals.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use crate::config::{EngineConfig, Shift, UnitPriceConfig};
use crate::decompose::{decompose_shift, ShiftBreakdown};
use crate::model::{Amount, DayRecord};

/// Fixed report categories. Outlets configured as single-channel periods
/// are reported under their own period id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Category {
    RoomService,
    CafeDaManha,
    Lunch,
    Dinner,
    Frigobar,
    Events,
    InternalConsumption,
    Adjustment,
}

impl Category {
    pub const ALL: [Category; 8] = [
        Category::RoomService,
        Category::CafeDaManha,
        Category::Lunch,
        Category::Dinner,
        Category::Frigobar,
        Category::Events,
        Category::InternalConsumption,
        Category::Adjustment,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::RoomService => "roomService",
            Self::CafeDaManha => "cafeDaManha",
            Self::Lunch => "lunch",
            Self::Dinner => "dinner",
            Self::Frigobar => "frigobar",
            Self::Events => "events",
            Self::InternalConsumption => "internalConsumption",
            Self::Adjustment => "adjustment",
        }
    }
}

/// Café-da-manhã sub-lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakfastTotals {
    pub guest_list: Amount,
    pub no_show: Amount,
    pub no_check_in: Amount,
    pub signed: Amount,
    pub card_direct: Amount,
}

impl BreakfastTotals {
    pub fn total(&self) -> Amount {
        self.guest_list + self.no_show + self.no_check_in + self.signed + self.card_direct
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GrandTotals {
    pub with_internal_consumption: Amount,
    pub without_internal_consumption: Amount,
}

impl GrandTotals {
    pub fn new(with_internal_consumption: Amount, internal: Amount, adjustment: Amount) -> Self {
        Self {
            with_internal_consumption,
            without_internal_consumption: with_internal_consumption - internal - adjustment,
        }
    }
}

/// Per-shift totals of the restaurant shifts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftTotals {
    pub lunch_first: Amount,
    pub lunch_second: Amount,
    pub dinner: Amount,
}

/// Everything the report layer needs for one day.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayTotals {
    pub date: String,
    pub room_service: Amount,
    pub cafe_da_manha: BreakfastTotals,
    pub shifts: ShiftTotals,
    /// Lunch first + second shift, without frigobar.
    pub lunch: Amount,
    /// Dinner shift, without frigobar.
    pub dinner: Amount,
    pub outlets: BTreeMap<String, Amount>,
    pub frigobar: Amount,
    pub events: Amount,
    pub internal_consumption: Amount,
    /// Value only; quantity stays zero.
    pub adjustment: Amount,
    pub grand_total: GrandTotals,
    pub breakdown: Vec<ShiftBreakdown>,
}

impl DayTotals {
    /// Category → amount, with outlets keyed by their period id.
    pub fn category_totals(&self) -> BTreeMap<String, Amount> {
        let mut totals: BTreeMap<String, Amount> = [
            (Category::RoomService, self.room_service),
            (Category::CafeDaManha, self.cafe_da_manha.total()),
            (Category::Lunch, self.lunch),
            (Category::Dinner, self.dinner),
            (Category::Frigobar, self.frigobar),
            (Category::Events, self.events),
            (Category::InternalConsumption, self.internal_consumption),
            (Category::Adjustment, self.adjustment),
        ]
        .into_iter()
        .map(|(category, amount)| (category.as_str().to_string(), amount))
        .collect();
        for (outlet, amount) in &self.outlets {
            *totals.entry(outlet.clone()).or_default() += *amount;
        }
        totals
    }
}

/// Aggregate one day record.
pub fn aggregate_day(
    day: &DayRecord,
    config: &EngineConfig,
    prices: &UnitPriceConfig,
) -> DayTotals {
    let late_night = decompose_shift(day, config, Shift::LateNight);
    let lunch_first = decompose_shift(day, config, Shift::LunchFirst);
    let lunch_second = decompose_shift(day, config, Shift::LunchSecond);
    let dinner_shift = decompose_shift(day, config, Shift::Dinner);
    let restaurant = [&lunch_first, &lunch_second, &dinner_shift];

    let room_service = late_night.room_service
        + restaurant.iter().map(|b| b.room_service).sum::<Amount>();

    let shifts = ShiftTotals {
        lunch_first: lunch_first.shift_total(),
        lunch_second: lunch_second.shift_total(),
        dinner: dinner_shift.shift_total(),
    };
    let lunch = lunch_first.meal_total() + lunch_second.meal_total();
    let dinner = dinner_shift.meal_total();

    let internal_consumption: Amount = restaurant.iter().map(|b| b.internal_consumption).sum();
    let adjustment = Amount::new(0.0, restaurant.iter().map(|b| b.adjustment).sum());

    let cafe_da_manha = breakfast_totals(day, config, prices);

    let outlets: BTreeMap<String, Amount> = config
        .single_channel_periods
        .iter()
        .map(|id| (id.clone(), period_total(day, id)))
        .collect();

    let frigobar = restaurant.iter().map(|b| b.frigobar).sum::<Amount>()
        + period_total(day, &config.frigobar_period);
    let events = period_total(day, &config.events_period);

    let with_ci = room_service
        + cafe_da_manha.total()
        + outlets.values().copied().sum::<Amount>()
        + lunch
        + dinner
        + frigobar
        + events
        + internal_consumption
        + adjustment;
    let grand_total = GrandTotals::new(with_ci, internal_consumption, adjustment);

    debug!(
        day = %day.id,
        with_ci = grand_total.with_internal_consumption.value,
        without_ci = grand_total.without_internal_consumption.value,
        "Aggregated day"
    );

    DayTotals {
        date: day.id.clone(),
        room_service,
        cafe_da_manha,
        shifts,
        lunch,
        dinner,
        outlets,
        frigobar,
        events,
        internal_consumption,
        adjustment,
        grand_total,
        breakdown: vec![late_night, lunch_first, lunch_second, dinner_shift],
    }
}

/// Aggregate a batch, keeping input order.
pub fn aggregate_days(
    days: &[DayRecord],
    config: &EngineConfig,
    prices: &UnitPriceConfig,
) -> Vec<DayTotals> {
    days.iter()
        .map(|day| aggregate_day(day, config, prices))
        .collect()
}

fn period_total(day: &DayRecord, period: &str) -> Amount {
    day.period(period)
        .map(|p| p.channels_total())
        .unwrap_or_default()
}

fn breakfast_totals(
    day: &DayRecord,
    config: &EngineConfig,
    prices: &UnitPriceConfig,
) -> BreakfastTotals {
    let layout = &config.breakfast;
    let Some(period) = day.period(&layout.period) else {
        return BreakfastTotals::default();
    };
    let line = |channel: &str| -> Amount {
        let recorded = period.channels.get(channel)
            + period
                .sub_tabs
                .values()
                .map(|tab| tab.channels.get(channel))
                .sum::<Amount>();
        match prices.price(channel) {
            Some(price) => Amount::new(recorded.quantity, recorded.quantity * price),
            None => recorded,
        }
    };
    BreakfastTotals {
        guest_list: line(&layout.guest_list),
        no_show: line(&layout.no_show),
        no_check_in: line(&layout.no_check_in),
        signed: line(&layout.signed),
        card_direct: line(&layout.card_direct),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn full_day() -> DayRecord {
        DayRecord::from_json(&json!({
            "id": "2026-03-14",
            "periods": {
                "madrugada": { "channels": {
                    "madrugadaRoomService": { "quantity": 2, "totalValue": 90 }
                } },
                "cafeDaManha": { "channels": {
                    "cdmLista": { "quantity": 40, "totalValue": 0 },
                    "cdmNoShow": { "quantity": 2, "totalValue": 0 },
                    "cdmSemCheckIn": { "quantity": 1, "totalValue": 45 },
                    "cdmAssinado": { "quantity": 3, "totalValue": 135 },
                    "cdmCartaoDireto": { "quantity": 4, "totalValue": 180 }
                } },
                "almoco": {
                    "channels": {
                        "almocoPrimeiroTurnoMesaDinheiro": { "quantity": 10, "totalValue": 500 },
                        "almocoPrimeiroTurnoFaturadoHotel": { "quantity": 2, "totalValue": 100 },
                        "almocoPrimeiroTurnoRoomService": { "quantity": 1, "totalValue": 60 },
                        "almocoPrimeiroTurnoConsumoInterno": { "quantity": 2, "totalValue": 20 }
                    },
                    "subTabs": {
                        "primeiroTurno": {
                            "faturadoItems": [ { "type": "hotel", "quantity": 1, "value": 50 } ],
                            "consumoInternoItems": [ { "quantity": 1, "value": 15 } ],
                            "reajuste": -3
                        },
                        "segundoTurno": {
                            "channels": {
                                "almocoSegundoTurnoMesaCredito": { "quantity": 6, "totalValue": 300 },
                                "almocoSegundoTurnoFrigobar": { "quantity": 2, "totalValue": 25 }
                            }
                        }
                    }
                },
                "jantar": { "channels": {
                    "jantarMesaDebito": { "quantity": 8, "totalValue": 640 },
                    "jantarFrigobar": { "quantity": 1, "totalValue": 12 },
                    "jantarRoomService": { "quantity": 2, "totalValue": 110 },
                    "jantarReajuste": { "totalValue": 4 }
                } },
                "frigobar": { "channels": {
                    "frigobarApartamentos": { "quantity": 5, "totalValue": 75 }
                } },
                "eventos": { "subTabs": { "casamento": { "channels": {
                    "eventoCasamento": { "quantity": 80, "totalValue": 8000 }
                } } } },
                "happyHour": { "channels": {
                    "happyHour": { "quantity": 12, "totalValue": 240 }
                } }
            }
        }))
    }

    fn prices() -> UnitPriceConfig {
        UnitPriceConfig::new([("cdmLista", 45.0), ("cdmNoShow", 45.0)])
    }

    #[test]
    fn named_totals() {
        let t = aggregate_day(&full_day(), &EngineConfig::default(), &prices());

        assert_eq!(t.room_service, Amount::new(5.0, 260.0));
        assert_eq!(t.cafe_da_manha.guest_list, Amount::new(40.0, 1800.0));
        assert_eq!(t.cafe_da_manha.no_show, Amount::new(2.0, 90.0));
        assert_eq!(t.cafe_da_manha.total(), Amount::new(50.0, 2250.0));

        assert_eq!(t.shifts.lunch_first, Amount::new(13.0, 647.0));
        assert_eq!(t.shifts.lunch_second, Amount::new(8.0, 325.0));
        assert_eq!(t.shifts.dinner, Amount::new(9.0, 656.0));

        assert_eq!(t.internal_consumption, Amount::new(3.0, 35.0));
        assert_eq!(t.adjustment, Amount::new(0.0, 1.0));
        assert_eq!(t.frigobar, Amount::new(8.0, 112.0));
        assert_eq!(t.events, Amount::new(80.0, 8000.0));
        assert_eq!(t.outlets["happyHour"], Amount::new(12.0, 240.0));
        assert_eq!(t.outlets["barPiscina"], Amount::ZERO);
    }

    #[test]
    fn combined_meal_totals_exclude_frigobar() {
        let t = aggregate_day(&full_day(), &EngineConfig::default(), &prices());
        let frigobar_in_lunch = Amount::new(2.0, 25.0);
        assert_eq!(
            t.lunch,
            t.shifts.lunch_first + t.shifts.lunch_second - frigobar_in_lunch
        );
        assert_eq!(t.lunch, Amount::new(19.0, 947.0));
        assert_eq!(t.dinner, Amount::new(8.0, 644.0));
    }

    #[test]
    fn grand_totals() {
        let t = aggregate_day(&full_day(), &EngineConfig::default(), &prices());
        // 260 + 2250 + 240 + 947 + 644 + 112 + 8000 + 35 + 1
        assert_eq!(t.grand_total.with_internal_consumption.value, 12489.0);
        assert_eq!(t.grand_total.with_internal_consumption.quantity, 185.0);
        assert_eq!(t.grand_total.without_internal_consumption.value, 12453.0);
        assert_eq!(t.grand_total.without_internal_consumption.quantity, 182.0);
    }

    #[test]
    fn without_ci_identity_holds() {
        let t = aggregate_day(&full_day(), &EngineConfig::default(), &prices());
        let g = t.grand_total;
        assert_eq!(
            g.without_internal_consumption.value,
            g.with_internal_consumption.value - t.internal_consumption.value - t.adjustment.value
        );
        assert_eq!(
            g.without_internal_consumption.quantity,
            g.with_internal_consumption.quantity
                - t.internal_consumption.quantity
                - t.adjustment.quantity
        );
    }

    #[test]
    fn unpriced_breakfast_lines_use_recorded_value() {
        let t = aggregate_day(
            &full_day(),
            &EngineConfig::default(),
            &UnitPriceConfig::default(),
        );
        assert_eq!(t.cafe_da_manha.guest_list, Amount::new(40.0, 0.0));
        assert_eq!(t.cafe_da_manha.total(), Amount::new(50.0, 360.0));
    }

    #[test]
    fn aggregation_is_idempotent() {
        let days = vec![full_day(), DayRecord::new("2026-03-15")];
        let cfg = EngineConfig::default();
        let first = aggregate_days(&days, &cfg, &prices());
        let second = aggregate_days(&days, &cfg, &prices());
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn empty_day_is_all_zero() {
        let t = aggregate_day(
            &DayRecord::new("2026-03-15"),
            &EngineConfig::default(),
            &UnitPriceConfig::default(),
        );
        assert_eq!(t.grand_total, GrandTotals::default());
        assert!(t.category_totals().values().all(Amount::is_zero));
    }

    #[test]
    fn category_totals_are_keyed_for_export() {
        let t = aggregate_day(&full_day(), &EngineConfig::default(), &prices());
        let c = t.category_totals();
        assert_eq!(c["roomService"], t.room_service);
        assert_eq!(c["lunch"], t.lunch);
        assert_eq!(c["happyHour"], Amount::new(12.0, 240.0));
        assert_eq!(c["adjustment"], Amount::new(0.0, 1.0));
        let sum: Amount = c.values().copied().sum();
        assert_eq!(sum, t.grand_total.with_internal_consumption);
    }

    #[test]
    fn serializes_with_camel_case_keys() {
        let t = aggregate_day(&full_day(), &EngineConfig::default(), &prices());
        let v = serde_json::to_value(&t).unwrap();
        assert_eq!(v["grandTotal"]["withInternalConsumption"]["value"], 12489.0);
        assert_eq!(v["cafeDaManha"]["guestList"]["quantity"], 40.0);
        assert_eq!(v["breakdown"][1]["shift"], "lunchFirst");
    }
}
