//! # Resin Printing
//!
//! Prices an SLA/DLP print job. Print time scaled by a complexity factor
//! (supports, orientation, failure risk) gives the effective machine hours;
//! those drive printer amortization and power. Resin is priced per kg from
//! the materials catalog, labor runs over the floored day count, and a single
//! margin inversion produces the sell price. Electricity defaults to the
//! resin-family rate.

use once_cell::sync::Lazy;
use serde::Serialize;

use crate::catalog::{Catalogs, MACHINES_CATALOG, MATERIALS_CATALOG};
use crate::fields::{CatalogBinding, FieldDescriptor};
use crate::state::InputMap;

use super::fdm_single_color::custom_material_fields;
use super::{
    flag, invert_margin, margin_fraction, numeric, resolve_machine, resolve_material_price_per_kg,
    text, zero_if_nan, LineItem, QuoteBreakdown, ServiceBreakdown,
    DEFAULT_BASIC_SERVICE_COST_PER_HOUR, MIN_DELIVERY_DAYS, PER_DAY_HOURS, PER_DAY_RUSH_HOURS,
    RESIN_ELECTRICAL_COST_PER_KWH, RUSH_PRICE_MULTIPLIER,
};

/// Complexity label → level. Unknown labels fall back to standard.
fn complexity_level(label: &str) -> f64 {
    match label.to_ascii_lowercase().as_str() {
        "easy" => 1.0,
        "novice" => 2.0,
        "standard" => 3.0,
        "hard" => 4.0,
        "expert" => 5.0,
        _ => 3.0,
    }
}

/// Intermediate figures for a resin printing quote.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResinPrintingBreakdown {
    pub complexity_level: f64,
    pub total_print_time_hours: f64,
    pub effective_print_hours: f64,
    pub kg_weight: f64,
    pub print_time_days: f64,
    pub rush_print_time_days: Option<f64>,
    pub machine_cost: f64,
    pub machine_power_cost: f64,
    pub material_cost: f64,
    pub service_cost: f64,
    pub delivery_days: f64,
    pub rush_delivery_days: Option<f64>,
    pub final_sell_price: f64,
    pub rush_final_sell_price: Option<f64>,
    pub total_expense: f64,
    pub profit: f64,
}

/// Calculate a resin printing quote.
pub fn calculate(inputs: &InputMap, catalogs: &Catalogs) -> QuoteBreakdown {
    let print_hours = numeric(inputs, "printHours", 0.0);
    let print_minutes = numeric(inputs, "printMinutes", 0.0);
    let level = complexity_level(text(inputs, "resinComplexity"));
    let margin = margin_fraction(inputs);
    let allow_rush = flag(inputs, "allowRush");

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

    let total_print_time_hours = print_hours
        + if print_minutes > 0.0 {
            print_minutes / 60.0
        } else {
            0.0
        };

    let complexity_factor = 1.0 + level / 2.0;
    let effective_print_hours = total_print_time_hours * complexity_factor;

    let mut print_time_days = if effective_print_hours > 0.0 {
        effective_print_hours / PER_DAY_HOURS
    } else {
        0.0
    };
    let mut rush_print_time_days = (allow_rush && effective_print_hours > 0.0)
        .then_some(effective_print_hours / PER_DAY_RUSH_HOURS);
    if effective_print_hours > 0.0 {
        print_time_days = print_time_days.max(MIN_DELIVERY_DAYS);
        rush_print_time_days = rush_print_time_days.map(|days| days.max(MIN_DELIVERY_DAYS));
    }

    let machine = resolve_machine(
        inputs,
        catalogs.get_catalog(MACHINES_CATALOG),
        "printerMachineId",
        "customMachine",
    );

    let machine_cost =
        zero_if_nan((machine.adjusted_price / machine.roi_hours) * effective_print_hours);
    let machine_power_cost = zero_if_nan(
        machine.power_watts * effective_print_hours * electrical_cost_per_kwh / 1000.0,
    );

    let kg_weight = numeric(inputs, "printWeightGrams", 0.0) / 1000.0;
    let price_per_kg = resolve_material_price_per_kg(
        inputs,
        catalogs.get_catalog(MATERIALS_CATALOG),
        "materialId",
        "customMaterialPricePerKg",
    );
    let material_cost = zero_if_nan(kg_weight * price_per_kg);

    let print_hours_considered = print_time_days * PER_DAY_HOURS;
    let service_cost = zero_if_nan(print_hours_considered * basic_service_cost_per_hour);

    let total_expense = machine_cost + machine_power_cost + material_cost + service_cost;

    let final_sell_price = invert_margin(total_expense, margin);
    let rush_final_sell_price = allow_rush.then_some(final_sell_price * RUSH_PRICE_MULTIPLIER);
    let profit = final_sell_price - total_expense;

    let delivery_days = print_time_days;
    let rush_delivery_days = rush_print_time_days;

    let mut line_items = vec![
        LineItem::hours(
            "printTimeConsidered",
            "Print time considered (hours)",
            effective_print_hours,
        ),
        LineItem::currency("machineCost", "Machine cost", machine_cost),
        LineItem::currency(
            "machinePowerCost",
            "Machine power cost",
            machine_power_cost,
        ),
        LineItem::currency("materialCost", "Material cost", material_cost),
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
        detail: ServiceBreakdown::ResinPrinting(ResinPrintingBreakdown {
            complexity_level: level,
            total_print_time_hours,
            effective_print_hours,
            kg_weight,
            print_time_days,
            rush_print_time_days,
            machine_cost,
            machine_power_cost,
            material_cost,
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
    let mut fields = vec![
        FieldDescriptor::section("printTimeSection", "Print time"),
        FieldDescriptor::number("printHours", "Print hours")
            .required()
            .placeholder("Hours"),
        FieldDescriptor::number("printMinutes", "Print minutes").placeholder("Minutes"),
        FieldDescriptor::section("partDetailsSection", "Part details"),
        FieldDescriptor::number("printWeightGrams", "Print weight (g)")
            .required()
            .placeholder("Weight in grams, supports included"),
        FieldDescriptor::select("resinComplexity", "Print complexity")
            .required()
            .static_options(&[
                ("easy", "Easy"),
                ("novice", "Novice"),
                ("standard", "Standard"),
                ("hard", "Hard"),
                ("expert", "Expert"),
            ]),
        FieldDescriptor::number("profitMarginPercent", "Profit margin (%)")
            .required()
            .placeholder("e.g. 30"),
        FieldDescriptor::checkbox("allowRush", "Allow rush option"),
        FieldDescriptor::section("machineSection", "Machine and material"),
        FieldDescriptor::select("printerBrand", "Printer brand")
            .required()
            .catalog(
                CatalogBinding::new(MACHINES_CATALOG)
                    .job_type("job_type", "resin printing")
                    .distinct("brand"),
            ),
        FieldDescriptor::select("printerMachineId", "Printer")
            .required()
            .catalog(
                CatalogBinding::new(MACHINES_CATALOG)
                    .job_type("job_type", "resin printing")
                    .parent("printerBrand", "brand")
                    .option_columns("machine_id", "machine_name")
                    .allow_custom(),
            ),
        FieldDescriptor::select("materialType", "Resin type")
            .required()
            .catalog(
                CatalogBinding::new(MATERIALS_CATALOG)
                    .job_type("Job_type", "Resin Printing")
                    .distinct("material_type"),
            ),
        FieldDescriptor::select("materialId", "Resin")
            .required()
            .catalog(
                CatalogBinding::new(MATERIALS_CATALOG)
                    .job_type("Job_type", "Resin Printing")
                    .parent("materialType", "material_type")
                    .option_columns("material_id", "material_name")
                    .allow_custom(),
            ),
        FieldDescriptor::section("extraFieldsSection", "Extra Fields"),
        FieldDescriptor::section("advancedSection", "Advanced fields"),
        FieldDescriptor::number("electricalCostPerKwh", "Electrical cost per kWh (PHP)")
            .placeholder("Default 13.5")
            .on_blur(),
        FieldDescriptor::number("basicServiceCostPerHour", "Basic service cost per hour (PHP)")
            .placeholder("Default 500")
            .on_blur(),
        FieldDescriptor::textarea("notes", "Notes")
            .placeholder("Add notes here")
            .on_blur(),
        FieldDescriptor::section(
            "customMachineSection",
            "Custom machine (used only when Printer = Custom option...)",
        ),
        FieldDescriptor::text("customMachineName", "Custom machine name")
            .placeholder("e.g. Custom resin printer")
            .on_blur(),
        FieldDescriptor::number("customMachinePricePhp", "Custom machine price (PHP)")
            .placeholder("Gross/total price; adjusted in calculator")
            .on_blur(),
        FieldDescriptor::number("customMachineRoiHours", "Custom machine ROI hours")
            .placeholder("Default 2190 if empty")
            .on_blur(),
        FieldDescriptor::number("customMachinePowerWatts", "Custom machine power (W)")
            .placeholder("Power consumption in watts")
            .on_blur(),
    ];
    fields.extend(custom_material_fields());
    fields
});

pub(crate) fn fields() -> &'static [FieldDescriptor] {
    &FIELDS
}
