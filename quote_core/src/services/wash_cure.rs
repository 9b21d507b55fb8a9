//! # Wash & Cure
//!
//! Prices resin post-treatment as two independent machine legs — washing and
//! curing — each with its own batch count, cycle time, amortization and power
//! cost. Labor follows the larger of the two batch counts; delivery converts
//! total machine-plus-labor minutes into days with the 3-day floor.

use once_cell::sync::Lazy;
use serde::Serialize;

use crate::catalog::{CatalogRow, Catalogs, MACHINES_CATALOG};
use crate::fields::{CatalogBinding, FieldDescriptor};
use crate::state::InputMap;

use super::{
    flag, invert_margin, margin_fraction, numeric, resolve_machine, zero_if_nan, LineItem,
    QuoteBreakdown, ServiceBreakdown, DEFAULT_BASIC_SERVICE_COST_PER_HOUR, DEFAULT_BATCH_COUNT,
    MIN_DELIVERY_DAYS, PER_DAY_HOURS, PER_DAY_RUSH_HOURS, RESIN_ELECTRICAL_COST_PER_KWH,
    RUSH_PRICE_MULTIPLIER,
};

/// Intermediate figures for a wash & cure quote.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WashCureBreakdown {
    pub total_service_time_minutes: f64,
    pub total_machine_time_minutes: f64,
    pub wash_machine_cost: f64,
    pub cure_machine_cost: f64,
    pub wash_machine_power_cost: f64,
    pub cure_machine_power_cost: f64,
    pub service_cost: f64,
    pub delivery_days: f64,
    pub rush_delivery_days: Option<f64>,
    pub final_sell_price: f64,
    pub rush_final_sell_price: Option<f64>,
    pub total_expense: f64,
    pub profit: f64,
}

/// One machine leg: total run minutes, amortization and power cost.
struct MachineLeg {
    run_minutes: f64,
    machine_cost: f64,
    power_cost: f64,
}

fn machine_leg(
    inputs: &InputMap,
    machines: &[CatalogRow],
    id_field: &str,
    custom_prefix: &str,
    time_minutes: f64,
    batch_count: f64,
    electrical_cost_per_kwh: f64,
) -> MachineLeg {
    let machine = resolve_machine(inputs, machines, id_field, custom_prefix);
    let run_minutes = time_minutes * batch_count;
    MachineLeg {
        run_minutes,
        machine_cost: zero_if_nan(run_minutes * machine.adjusted_price / (machine.roi_hours * 60.0)),
        power_cost: zero_if_nan(
            run_minutes * electrical_cost_per_kwh * machine.power_watts / (60.0 * 1000.0),
        ),
    }
}

/// Calculate a wash & cure quote.
pub fn calculate(inputs: &InputMap, catalogs: &Catalogs) -> QuoteBreakdown {
    let machines = catalogs.get_catalog(MACHINES_CATALOG);

    let handle_time_per_batch_minutes = numeric(inputs, "handleTimePerBatchMinutes", 0.0);
    let wash_time_minutes = numeric(inputs, "washTimeMinutes", 0.0);
    let cure_time_minutes = numeric(inputs, "cureTimeMinutes", 0.0);
    let margin = margin_fraction(inputs);
    let allow_rush = flag(inputs, "allowRush");

    let wash_batch_count = numeric(inputs, "washBatchCount", DEFAULT_BATCH_COUNT);
    let cure_batch_count = numeric(inputs, "cureBatchCount", DEFAULT_BATCH_COUNT);
    let electrical_cost_per_kwh = numeric(
        inputs,
        "electricalCostPerKwh",
        RESIN_ELECTRICAL_COST_PER_KWH,
    );
    let basic_service_cost_per_hour = numeric(
        inputs,
        "basicServiceCostPerHour",
        DEFAULT_BASIC_SERVICE_COST_PER_HOUR,
    );

    let wash = machine_leg(
        inputs,
        machines,
        "washMachineId",
        "customWashMachine",
        wash_time_minutes,
        wash_batch_count,
        electrical_cost_per_kwh,
    );
    let cure = machine_leg(
        inputs,
        machines,
        "cureMachineId",
        "customCureMachine",
        cure_time_minutes,
        cure_batch_count,
        electrical_cost_per_kwh,
    );

    // Handling runs once per batch of the bigger leg; the smaller leg's
    // batches ride along.
    let total_service_time_minutes =
        handle_time_per_batch_minutes * wash_batch_count.max(cure_batch_count);
    let total_machine_time_minutes = wash.run_minutes + cure.run_minutes;

    let service_cost =
        zero_if_nan(total_service_time_minutes * basic_service_cost_per_hour / 60.0);

    let total_expense = service_cost
        + wash.machine_cost
        + cure.machine_cost
        + wash.power_cost
        + cure.power_cost;

    let final_sell_price = invert_margin(total_expense, margin);
    let rush_final_sell_price = allow_rush.then_some(final_sell_price * RUSH_PRICE_MULTIPLIER);
    let profit = final_sell_price - total_expense;

    let total_minutes_for_delivery = total_machine_time_minutes + total_service_time_minutes;
    let mut delivery_days = if total_minutes_for_delivery > 0.0 {
        total_minutes_for_delivery / (60.0 * PER_DAY_HOURS)
    } else {
        0.0
    };
    let mut rush_delivery_days = (allow_rush && total_minutes_for_delivery > 0.0)
        .then_some(total_minutes_for_delivery / (60.0 * PER_DAY_RUSH_HOURS));
    if total_minutes_for_delivery > 0.0 {
        delivery_days = delivery_days.max(MIN_DELIVERY_DAYS);
        rush_delivery_days = rush_delivery_days.map(|days| days.max(MIN_DELIVERY_DAYS));
    }

    let mut line_items = vec![
        LineItem::minutes(
            "totalServiceTime",
            "Total service time (minutes)",
            total_service_time_minutes,
        ),
        LineItem::minutes(
            "totalMachineTime",
            "Total machine time (minutes)",
            total_machine_time_minutes,
        ),
        LineItem::currency("washMachineCost", "Wash machine cost", wash.machine_cost),
        LineItem::currency("cureMachineCost", "Cure machine cost", cure.machine_cost),
        LineItem::currency(
            "washMachinePowerCost",
            "Wash machine power cost",
            wash.power_cost,
        ),
        LineItem::currency(
            "cureMachinePowerCost",
            "Cure machine power cost",
            cure.power_cost,
        ),
        LineItem::currency("serviceCost", "Service cost", service_cost),
        LineItem::currency("totalExpenses", "Total expenses", total_expense),
        LineItem::currency("profit", "Profit", profit),
        LineItem::currency("finalSellPrice", "Final sell price", final_sell_price),
    ];
    if let Some(rush) = rush_final_sell_price {
        line_items.push(LineItem::currency(
            "rushFinalSellPrice",
            "Rush final sell price",
            rush,
        ));
    }
    line_items.push(LineItem::days(
        "deliveryTime",
        "Delivery time (days)",
        delivery_days,
        rush_delivery_days,
    ));

    QuoteBreakdown {
        line_items,
        subtotal: total_expense,
        adjustments: 0.0,
        total: rush_final_sell_price.unwrap_or(final_sell_price),
        detail: ServiceBreakdown::WashCure(WashCureBreakdown {
            total_service_time_minutes,
            total_machine_time_minutes,
            wash_machine_cost: wash.machine_cost,
            cure_machine_cost: cure.machine_cost,
            wash_machine_power_cost: wash.power_cost,
            cure_machine_power_cost: cure.power_cost,
            service_cost,
            delivery_days,
            rush_delivery_days,
            final_sell_price,
            rush_final_sell_price,
            total_expense,
            profit,
        }),
    }
}

static FIELDS: Lazy<Vec<FieldDescriptor>> = Lazy::new(|| {
    vec![
        FieldDescriptor::section("coreSection", "Wash & Cure details"),
        FieldDescriptor::number(
            "handleTimePerBatchMinutes",
            "Wash & cure handle time per batch (minutes)",
        )
        .required()
        .placeholder("Handling time in minutes per batch"),
        FieldDescriptor::number("washTimeMinutes", "Wash time (minutes)")
            .required()
            .placeholder("Wash time per batch in minutes"),
        FieldDescriptor::select("washMachineId", "Wash machine")
            .required()
            .catalog(
                CatalogBinding::new(MACHINES_CATALOG)
                    .job_type("job_type", "wash cure")
                    .option_columns("machine_id", "machine_name")
                    .allow_custom(),
            ),
        FieldDescriptor::number("cureTimeMinutes", "Cure time (minutes)")
            .required()
            .placeholder("Cure time per batch in minutes"),
        FieldDescriptor::select("cureMachineId", "Cure machine")
            .required()
            .catalog(
                CatalogBinding::new(MACHINES_CATALOG)
                    .job_type("job_type", "wash cure")
                    .option_columns("machine_id", "machine_name")
                    .allow_custom(),
            ),
        FieldDescriptor::number("profitMarginPercent", "Profit margin (%)")
            .required()
            .placeholder("e.g. 30"),
        FieldDescriptor::checkbox("allowRush", "Allow rush option"),
        FieldDescriptor::section("extraFieldsSection", "Extra Fields"),
        FieldDescriptor::section("advancedSection", "Advanced fields"),
        FieldDescriptor::number("washBatchCount", "Wash batches")
            .placeholder("Default 1")
            .on_blur(),
        FieldDescriptor::number("cureBatchCount", "Cure batches")
            .placeholder("Default 1")
            .on_blur(),
        FieldDescriptor::number("electricalCostPerKwh", "Electrical cost per kWh (PHP)")
            .placeholder("Default 13.5")
            .on_blur(),
        FieldDescriptor::number("basicServiceCostPerHour", "Basic service cost per hour (PHP)")
            .placeholder("Default 500")
            .on_blur(),
        FieldDescriptor::section(
            "customWashMachineSection",
            "Custom wash machine (used only when Wash machine = Custom option...)",
        ),
        FieldDescriptor::text("customWashMachineName", "Custom wash machine name")
            .placeholder("e.g. Custom Wash Unit")
            .on_blur(),
        FieldDescriptor::number("customWashMachinePricePhp", "Custom wash machine price (PHP)")
            .placeholder("Gross/total price; adjusted in calculator")
            .on_blur(),
        FieldDescriptor::number("customWashMachineRoiHours", "Custom wash machine ROI hours")
            .placeholder("Default 2190 if empty")
            .on_blur(),
        FieldDescriptor::number("customWashMachinePowerWatts", "Custom wash machine power (W)")
            .placeholder("Power consumption in watts")
            .on_blur(),
        FieldDescriptor::section(
            "customCureMachineSection",
            "Custom cure machine (used only when Cure machine = Custom option...)",
        ),
        FieldDescriptor::text("customCureMachineName", "Custom cure machine name")
            .placeholder("e.g. Custom Cure Station")
            .on_blur(),
        FieldDescriptor::number("customCureMachinePricePhp", "Custom cure machine price (PHP)")
            .placeholder("Gross/total price; adjusted in calculator")
            .on_blur(),
        FieldDescriptor::number("customCureMachineRoiHours", "Custom cure machine ROI hours")
            .placeholder("Default 2190 if empty")
            .on_blur(),
        FieldDescriptor::number("customCureMachinePowerWatts", "Custom cure machine power (W)")
            .placeholder("Power consumption in watts")
            .on_blur(),
    ]
});

pub(crate) fn fields() -> &'static [FieldDescriptor] {
    &FIELDS
}
