//! # 3D Scan
//!
//! Prices a scanning job: estimated scan hours scaled by a (non-integer)
//! complexity factor, scanner amortization and power over the effective
//! hours, optional laptop power, and operator labor over the floored day
//! count. One margin inversion.

use once_cell::sync::Lazy;
use serde::Serialize;

use crate::catalog::{Catalogs, MACHINES_CATALOG};
use crate::fields::{CatalogBinding, FieldDescriptor};
use crate::state::InputMap;

use super::{
    flag, invert_margin, margin_fraction, numeric, resolve_machine, text, zero_if_nan, LineItem,
    QuoteBreakdown, ServiceBreakdown, DEFAULT_BASIC_SERVICE_COST_PER_HOUR,
    DEFAULT_ELECTRICAL_COST_PER_KWH, MIN_DELIVERY_DAYS, PER_DAY_HOURS, PER_DAY_RUSH_HOURS,
    RUSH_PRICE_MULTIPLIER,
};

/// Laptop draw assumed while scanning
const ASSUMED_LAPTOP_WATTS: f64 = 300.0;

/// Scan complexity label → level. The scale is deliberately non-integer.
fn complexity_level(label: &str) -> f64 {
    match label.to_ascii_lowercase().as_str() {
        "easy" => 1.0,
        "novice" => 1.4,
        "standard" => 2.0,
        "hard" => 2.75,
        "expert" => 3.25,
        _ => 2.0,
    }
}

/// Intermediate figures for a 3D scan quote.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Scan3dBreakdown {
    pub complexity_level: f64,
    pub effective_scan_hours: f64,
    pub scan_time_days: f64,
    pub rush_scan_time_days: Option<f64>,
    pub laptop_power_cost: f64,
    pub machine_power_cost: f64,
    pub machine_cost: f64,
    pub service_cost: f64,
    pub delivery_days: f64,
    pub rush_delivery_days: Option<f64>,
    pub final_sell_price: f64,
    pub rush_final_sell_price: Option<f64>,
    pub total_expense: f64,
    pub profit: f64,
}

/// Calculate a 3D scan quote.
pub fn calculate(inputs: &InputMap, catalogs: &Catalogs) -> QuoteBreakdown {
    let estimated_scan_hours = numeric(inputs, "estimatedScanHours", 0.0);
    let level = complexity_level(text(inputs, "scanComplexity"));
    let margin = margin_fraction(inputs);
    let allow_rush = flag(inputs, "allowRush");
    let laptop_use = flag(inputs, "laptopUse");

    let electrical_cost_per_kwh = numeric(
        inputs,
        "electricalCostPerKwh",
        DEFAULT_ELECTRICAL_COST_PER_KWH,
    );
    let basic_service_cost_per_hour = numeric(
        inputs,
        "basicServiceCostPerHour",
        DEFAULT_BASIC_SERVICE_COST_PER_HOUR,
    );

    let complexity_factor = (1.0 + level) / 2.0;
    let effective_scan_hours = estimated_scan_hours * complexity_factor;

    let mut scan_time_days = if effective_scan_hours > 0.0 {
        effective_scan_hours / PER_DAY_HOURS
    } else {
        0.0
    };
    let mut rush_scan_time_days = (allow_rush && effective_scan_hours > 0.0)
        .then_some(effective_scan_hours / PER_DAY_RUSH_HOURS);

    if effective_scan_hours > 0.0 {
        scan_time_days = scan_time_days.max(MIN_DELIVERY_DAYS);
        rush_scan_time_days = rush_scan_time_days.map(|days| days.max(MIN_DELIVERY_DAYS));
    }

    let machine = resolve_machine(
        inputs,
        catalogs.get_catalog(MACHINES_CATALOG),
        "scanMachineId",
        "customMachine",
    );

    let laptop_power_cost = if laptop_use {
        zero_if_nan(ASSUMED_LAPTOP_WATTS * effective_scan_hours * electrical_cost_per_kwh / 1000.0)
    } else {
        0.0
    };
    let machine_power_cost =
        zero_if_nan(machine.power_watts * effective_scan_hours * electrical_cost_per_kwh / 1000.0);
    let machine_cost =
        zero_if_nan((machine.adjusted_price / machine.roi_hours) * effective_scan_hours);

    let scan_hours_considered = scan_time_days * PER_DAY_HOURS;
    let service_cost = zero_if_nan(scan_hours_considered * basic_service_cost_per_hour);

    let total_expense = laptop_power_cost + machine_power_cost + machine_cost + service_cost;

    let final_sell_price = invert_margin(total_expense, margin);
    let rush_final_sell_price = allow_rush.then_some(final_sell_price * RUSH_PRICE_MULTIPLIER);
    let profit = final_sell_price - total_expense;

    let delivery_days = scan_time_days;
    let rush_delivery_days = rush_scan_time_days;

    let mut line_items = vec![
        LineItem::hours(
            "scanTimeConsidered",
            "Scan time considered (hours)",
            effective_scan_hours,
        ),
        LineItem::currency("laptopPowerCost", "Laptop power cost", laptop_power_cost),
        LineItem::currency("machinePowerCost", "Machine power cost", machine_power_cost),
        LineItem::currency("machineCost", "Machine cost", machine_cost),
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
        "estimatedDeliveryTime",
        "Estimated delivery time (days)",
        delivery_days,
        rush_delivery_days,
    ));

    QuoteBreakdown {
        line_items,
        subtotal: total_expense,
        adjustments: 0.0,
        total: rush_final_sell_price.unwrap_or(final_sell_price),
        detail: ServiceBreakdown::Scan3d(Scan3dBreakdown {
            complexity_level: level,
            effective_scan_hours,
            scan_time_days,
            rush_scan_time_days,
            laptop_power_cost,
            machine_power_cost,
            machine_cost,
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
        FieldDescriptor::section("scanCoreSection", "Scan details"),
        FieldDescriptor::number("estimatedScanHours", "Estimated scan time (hours)")
            .required()
            .placeholder("Estimated scan time in hours"),
        FieldDescriptor::select("scanComplexity", "Scan complexity")
            .required()
            .static_options(&[
                ("Easy", "Easy"),
                ("Novice", "Novice"),
                ("Standard", "Standard"),
                ("Hard", "Hard"),
                ("Expert", "Expert"),
            ]),
        FieldDescriptor::number("profitMarginPercent", "Profit margin (%)")
            .required()
            .placeholder("e.g. 30"),
        FieldDescriptor::checkbox("allowRush", "Allow rush option"),
        FieldDescriptor::checkbox("laptopUse", "Laptop used during scan"),
        FieldDescriptor::section("machineSection", "Scanning machine"),
        FieldDescriptor::select("scanMachineId", "Scanning machine")
            .required()
            .catalog(
                CatalogBinding::new(MACHINES_CATALOG)
                    .job_type("job_type", "3d scan")
                    .option_columns("machine_id", "machine_name")
                    .allow_custom(),
            ),
        FieldDescriptor::section("extraFieldsSection", "Extra Fields"),
        FieldDescriptor::section("advancedSection", "Advanced fields"),
        FieldDescriptor::number("electricalCostPerKwh", "Electrical cost per kWh (PHP)")
            .placeholder("Default 12.5")
            .on_blur(),
        FieldDescriptor::number("basicServiceCostPerHour", "Basic service cost per hour (PHP)")
            .placeholder("Default 500")
            .on_blur(),
        FieldDescriptor::section(
            "customMachineSection",
            "Custom machine (used only when Scanning machine = Custom option...)",
        ),
        FieldDescriptor::text("customMachineName", "Custom machine name")
            .placeholder("e.g. Custom 3D Scanner")
            .on_blur(),
        FieldDescriptor::number("customMachinePricePhp", "Custom machine price (PHP)")
            .placeholder("Gross/total price; adjusted in calculator")
            .on_blur(),
        FieldDescriptor::number("customMachineRoiHours", "Custom machine ROI hours")
            .placeholder("Default 2190 if empty")
            .on_blur(),
        FieldDescriptor::number("customMachinePowerWatts", "Custom machine wattage (W)")
            .placeholder("Power consumption in watts")
            .on_blur(),
    ]
});

pub(crate) fn fields() -> &'static [FieldDescriptor] {
    &FIELDS
}
