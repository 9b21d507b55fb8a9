//! # FDM Single Color
//!
//! Prices a filament print job: machine amortization plus power plus material
//! for a single print, scaled to test and production (sell) batches. Test
//! prints are priced at a half-profit margin, sell prints at the full margin;
//! service labor and misc costs pass through at cost.
//!
//! The cost model is shared with the multicolor and FGF services via
//! [`calculate_fdm_quote`] — they differ only in material aggregation and
//! catalog filters.

use once_cell::sync::Lazy;
use serde::Serialize;

use crate::catalog::{Catalogs, MACHINES_CATALOG, MATERIALS_CATALOG};
use crate::fields::{CatalogBinding, FieldDescriptor};
use crate::state::InputMap;

use super::{
    flag, invert_margin, margin_fraction, numeric, resolve_machine, resolve_material_price_per_kg,
    zero_if_nan, LineItem, QuoteBreakdown, ServiceBreakdown, DEFAULT_BASIC_SERVICE_COST_PER_HOUR,
    DEFAULT_BATCH_COUNT, DEFAULT_ELECTRICAL_COST_PER_KWH, DEFAULT_HANDLING_MINUTES_PER_BATCH,
    MAX_PROFIT_MARGIN, PER_DAY_HOURS, PER_DAY_RUSH_HOURS, RUSH_PRICE_MULTIPLIER,
};

/// Lead time defaults to total print time × 5 when not overridden
const DEFAULT_LEAD_TIME_MULTIPLIER: f64 = 5.0;

/// Intermediate figures for the filament-print family (single color,
/// multicolor, FGF).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FdmPrintBreakdown {
    pub total_print_time_hours: f64,
    pub kg_weight: f64,
    pub lead_time_hours: f64,
    pub completion_days: f64,
    pub rush_completion_days: Option<f64>,
    pub machine_cost: f64,
    pub power_cost: f64,
    pub material_cost: f64,
    pub single_print_expense: f64,
    pub service_cost: f64,
    pub test_prints_expense: f64,
    pub sell_prints_expense: f64,
    pub test_prints_with_profit: f64,
    pub sell_prints_with_profit: f64,
    pub final_sell_price: f64,
    pub rush_final_sell_price: Option<f64>,
    pub total_expenses: f64,
    pub total_profit: f64,
}

/// Material figures computed by the caller (the only part of the filament
/// model that differs between single color, multicolor, and FGF).
pub(crate) struct MaterialUsage {
    pub kg_weight: f64,
    pub material_cost: f64,
}

pub(crate) fn single_material_usage(inputs: &InputMap, catalogs: &Catalogs) -> MaterialUsage {
    let kg_weight = numeric(inputs, "printWeightGrams", 0.0) / 1000.0;
    let price_per_kg = resolve_material_price_per_kg(
        inputs,
        catalogs.get_catalog(MATERIALS_CATALOG),
        "materialId",
        "customMaterialPricePerKg",
    );
    MaterialUsage {
        kg_weight,
        material_cost: zero_if_nan(kg_weight * price_per_kg),
    }
}

/// The filament-print cost model behind the FDM/FGF services.
pub(crate) fn calculate_fdm_quote(
    inputs: &InputMap,
    catalogs: &Catalogs,
    material: MaterialUsage,
    wrap: fn(FdmPrintBreakdown) -> ServiceBreakdown,
) -> QuoteBreakdown {
    let print_hours = numeric(inputs, "printHours", 0.0);
    let print_minutes = numeric(inputs, "printMinutes", 0.0);
    let margin = margin_fraction(inputs);
    let allow_rush = flag(inputs, "allowRush");

    let test_print_count = numeric(inputs, "testPrintCount", 0.0);
    let batch_count = numeric(inputs, "batchCount", DEFAULT_BATCH_COUNT);
    let preparation_minutes = numeric(inputs, "preparationMinutes", 0.0);
    let handling_minutes_per_batch = numeric(
        inputs,
        "handlingMinutesPerBatch",
        DEFAULT_HANDLING_MINUTES_PER_BATCH,
    );
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
    let misc_costs = numeric(inputs, "miscCosts", 0.0);

    let total_print_time_hours = print_hours
        + if print_minutes > 0.0 {
            print_minutes / 60.0
        } else {
            0.0
        };

    let lead_time_hours = numeric(
        inputs,
        "leadTimeHours",
        total_print_time_hours * DEFAULT_LEAD_TIME_MULTIPLIER,
    );

    let machine = resolve_machine(
        inputs,
        catalogs.get_catalog(MACHINES_CATALOG),
        "printerMachineId",
        "customMachine",
    );

    let machine_cost =
        zero_if_nan((machine.adjusted_price / machine.roi_hours) * total_print_time_hours);
    let power_cost = zero_if_nan(
        (machine.power_watts * total_print_time_hours / 1000.0) * electrical_cost_per_kwh,
    );

    // Misc is per-job, not per print; the single-print expense excludes it.
    let single_print_expense = machine_cost + power_cost + material.material_cost;

    let total_service_minutes =
        handling_minutes_per_batch * (batch_count + test_print_count) + preparation_minutes;
    let service_cost = zero_if_nan(total_service_minutes * (basic_service_cost_per_hour / 60.0));

    let test_prints_expense = single_print_expense * test_print_count;
    let sell_prints_expense = single_print_expense * batch_count;

    let sell_prints_with_profit = invert_margin(sell_prints_expense, margin);
    let sell_print_profit = sell_prints_with_profit - sell_prints_expense;

    // Test prints carry half the profit of the full-margin inversion.
    let test_prints_with_profit = if margin >= MAX_PROFIT_MARGIN {
        test_prints_expense
    } else {
        let full_profit = test_prints_expense / (1.0 - margin) - test_prints_expense;
        test_prints_expense + full_profit / 2.0
    };
    let test_print_profit = test_prints_with_profit - test_prints_expense;

    let total_expenses = service_cost + test_prints_expense + sell_prints_expense + misc_costs;
    let total_profit = sell_print_profit + test_print_profit;

    let final_sell_price =
        sell_prints_with_profit + test_prints_with_profit + service_cost + misc_costs;
    let rush_final_sell_price = allow_rush.then_some(final_sell_price * RUSH_PRICE_MULTIPLIER);

    // Completion days come straight from the lead time, normal vs rush pace.
    let completion_days = if total_print_time_hours > 0.0 {
        (lead_time_hours / PER_DAY_HOURS).ceil()
    } else {
        0.0
    };
    let rush_completion_days = (allow_rush && total_print_time_hours > 0.0)
        .then(|| (lead_time_hours / PER_DAY_RUSH_HOURS).ceil());

    let mut line_items = vec![
        LineItem::currency("machineCost", "Machine cost", machine_cost),
        LineItem::currency("powerCost", "Power cost", power_cost),
        LineItem::currency("materialCost", "Material cost", material.material_cost),
        LineItem::currency(
            "singlePrintExpense",
            "Single print expense",
            single_print_expense,
        ),
        LineItem::currency("miscCosts", "Misc costs", misc_costs),
        LineItem::currency("serviceCost", "Service cost", service_cost),
        LineItem::currency(
            "testPrintsExpense",
            "Test prints expense",
            test_prints_expense,
        ),
        LineItem::currency(
            "sellPrintsExpense",
            "Sell prints expense",
            sell_prints_expense,
        ),
        LineItem::currency(
            "testPrintsWithProfit",
            "Test prints with profit",
            test_prints_with_profit,
        ),
        LineItem::currency(
            "sellPrintsWithProfit",
            "Sell prints with profit",
            sell_prints_with_profit,
        ),
        LineItem::currency("sellPrintProfit", "Sell print profit", sell_print_profit),
        LineItem::currency("testPrintProfit", "Test print profit", test_print_profit),
        LineItem::currency("totalExpenses", "Total expenses", total_expenses),
        LineItem::currency("totalProfit", "Total profit", total_profit),
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
        "completionTime",
        "Completion time",
        completion_days,
        rush_completion_days,
    ));

    let total = rush_final_sell_price.unwrap_or(final_sell_price);

    QuoteBreakdown {
        line_items,
        subtotal: total_expenses,
        adjustments: 0.0,
        total,
        detail: wrap(FdmPrintBreakdown {
            total_print_time_hours,
            kg_weight: material.kg_weight,
            lead_time_hours,
            completion_days,
            rush_completion_days,
            machine_cost,
            power_cost,
            material_cost: material.material_cost,
            single_print_expense,
            service_cost,
            test_prints_expense,
            sell_prints_expense,
            test_prints_with_profit,
            sell_prints_with_profit,
            final_sell_price,
            rush_final_sell_price,
            total_expenses,
            total_profit,
        }),
    }
}

/// Calculate an FDM single color quote.
pub fn calculate(inputs: &InputMap, catalogs: &Catalogs) -> QuoteBreakdown {
    let material = single_material_usage(inputs, catalogs);
    calculate_fdm_quote(inputs, catalogs, material, ServiceBreakdown::FdmSingleColor)
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
            .placeholder("Weight in grams"),
        FieldDescriptor::number("profitMarginPercent", "Profit margin (%)")
            .required()
            .placeholder("e.g. 30"),
        FieldDescriptor::checkbox("allowRush", "Allow rush option"),
        FieldDescriptor::section("machineSection", "Machine and material"),
        FieldDescriptor::select("printerBrand", "Printer brand")
            .required()
            .catalog(
                CatalogBinding::new(MACHINES_CATALOG)
                    .job_type("job_type", "fdm printing")
                    .distinct("brand"),
            ),
        FieldDescriptor::select("printerMachineId", "Printer")
            .required()
            .catalog(
                CatalogBinding::new(MACHINES_CATALOG)
                    .job_type("job_type", "fdm printing")
                    .parent("printerBrand", "brand")
                    .option_columns("machine_id", "machine_name")
                    .allow_custom(),
            ),
        FieldDescriptor::select("materialType", "Material type")
            .required()
            .catalog(
                CatalogBinding::new(MATERIALS_CATALOG)
                    .job_type("Job_type", "FDM Printing")
                    .distinct("material_type"),
            ),
        FieldDescriptor::select("materialId", "Material")
            .required()
            .catalog(
                CatalogBinding::new(MATERIALS_CATALOG)
                    .job_type("Job_type", "FDM Printing")
                    .parent("materialType", "material_type")
                    .option_columns("material_id", "material_name")
                    .allow_custom(),
            ),
        FieldDescriptor::section("extraFieldsSection", "Extra Fields"),
        FieldDescriptor::section("advancedSection", "Advanced fields"),
        FieldDescriptor::number("testPrintCount", "Number of test prints")
            .placeholder("Default 0")
            .on_blur(),
        FieldDescriptor::number("batchCount", "Number of batches")
            .placeholder("Default 1")
            .on_blur(),
        FieldDescriptor::number("preparationMinutes", "Preparation minutes")
            .placeholder("Setup time in minutes")
            .on_blur(),
        FieldDescriptor::number("handlingMinutesPerBatch", "Handling minutes per batch")
            .placeholder("Handling per batch in minutes (default 10)")
            .on_blur(),
        FieldDescriptor::number("electricalCostPerKwh", "Electrical cost per kWh (PHP)")
            .placeholder("Default 12.5")
            .on_blur(),
        FieldDescriptor::number("basicServiceCostPerHour", "Basic service cost per hour (PHP)")
            .placeholder("Default 500")
            .on_blur(),
        FieldDescriptor::number("leadTimeHours", "Lead time (hours)")
            .placeholder("Auto default = Total print time × 5")
            .on_blur(),
        FieldDescriptor::number("miscCosts", "Misc costs (PHP)")
            .placeholder("Additional costs not covered above")
            .on_blur(),
        FieldDescriptor::textarea("notes", "Notes")
            .placeholder("Add notes and misc cost breakdown here")
            .on_blur(),
    ];
    fields.extend(custom_machine_fields("Custom FDM printer"));
    fields.extend(custom_material_fields());
    fields
});

/// Custom machine fields shared by the filament-print family.
pub(crate) fn custom_machine_fields(name_placeholder: &str) -> Vec<FieldDescriptor> {
    vec![
        FieldDescriptor::section(
            "customMachineSection",
            "Custom machine (used only when Printer = Custom option...)",
        ),
        FieldDescriptor::text("customMachineName", "Custom machine name")
            .placeholder(format!("e.g. {}", name_placeholder))
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
    ]
}

/// Custom material fields shared by the single-material print services.
pub(crate) fn custom_material_fields() -> Vec<FieldDescriptor> {
    vec![
        FieldDescriptor::section(
            "customMaterialSection",
            "Custom material (used only when Material = Custom option...)",
        ),
        FieldDescriptor::text("customMaterialName", "Custom material name")
            .placeholder("e.g. Specialty filament")
            .on_blur(),
        FieldDescriptor::number("customMaterialPricePerKg", "Custom material price per kg (PHP)")
            .placeholder("Gross price per kg; adjusted in calculator")
            .on_blur(),
    ]
}

pub(crate) fn fields() -> &'static [FieldDescriptor] {
    &FIELDS
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::parse_catalog_csv;

    fn fdm_catalogs() -> Catalogs {
        let machines = parse_catalog_csv(
            "machines",
            "machine_id,machine_name,brand,job_type,adjusted_machine_price_php,roi_hours,power_watts\n\
             mk4,Original MK4,Prusa,fdm printing,50000,2190,300\n",
        );
        let materials = parse_catalog_csv(
            "materials",
            "material_id,material_name,material_type,Job_type,adjusted_price_per_kg\n\
             pla-black,PLA Black,PLA,FDM Printing,800\n",
        );
        Catalogs::from_rows(materials, machines)
    }

    fn base_inputs() -> InputMap {
        let mut inputs = InputMap::new();
        for (field, value) in [
            ("printHours", "2"),
            ("printMinutes", "30"),
            ("printWeightGrams", "100"),
            ("profitMarginPercent", "30"),
            ("printerMachineId", "mk4"),
            ("materialId", "pla-black"),
        ] {
            inputs.insert(field.to_string(), value.into());
        }
        inputs
    }

    #[test]
    fn test_cost_components_for_catalog_machine_and_material() {
        let result = calculate(&base_inputs(), &fdm_catalogs());
        let ServiceBreakdown::FdmSingleColor(detail) = &result.detail else {
            panic!("wrong breakdown variant");
        };

        assert!((detail.total_print_time_hours - 2.5).abs() < 1e-9);
        assert!((detail.machine_cost - 57.08).abs() < 0.01);
        assert!((detail.power_cost - 9.375).abs() < 1e-9);
        assert!((detail.material_cost - 80.0).abs() < 1e-9);
        assert!((detail.single_print_expense - 146.46).abs() < 0.01);
    }

    #[test]
    fn test_final_price_composition() {
        let result = calculate(&base_inputs(), &fdm_catalogs());
        let ServiceBreakdown::FdmSingleColor(detail) = &result.detail else {
            panic!("wrong breakdown variant");
        };

        // Default batch of one, no test prints: 10 handling minutes of labor.
        assert!((detail.service_cost - 10.0 * 500.0 / 60.0).abs() < 1e-9);
        // Sell prints invert the full margin.
        assert!(
            (detail.sell_prints_with_profit * 0.7 - detail.sell_prints_expense).abs() < 1e-9
        );
        assert!(
            (detail.final_sell_price
                - (detail.sell_prints_with_profit
                    + detail.test_prints_with_profit
                    + detail.service_cost))
                .abs()
                < 1e-9
        );
        assert_eq!(result.total, detail.final_sell_price);
        assert_eq!(result.subtotal, detail.total_expenses);
        assert_eq!(result.adjustments, 0.0);
    }

    #[test]
    fn test_test_prints_carry_half_profit() {
        let mut inputs = base_inputs();
        inputs.insert("testPrintCount".to_string(), "2".into());
        let result = calculate(&inputs, &fdm_catalogs());
        let ServiceBreakdown::FdmSingleColor(detail) = &result.detail else {
            panic!("wrong breakdown variant");
        };

        let full_inversion = detail.test_prints_expense / 0.7;
        let expected = detail.test_prints_expense
            + (full_inversion - detail.test_prints_expense) / 2.0;
        assert!((detail.test_prints_with_profit - expected).abs() < 1e-9);
    }

    #[test]
    fn test_rush_is_exactly_one_and_a_half_times() {
        let mut inputs = base_inputs();
        inputs.insert("allowRush".to_string(), true.into());
        let result = calculate(&inputs, &fdm_catalogs());
        let ServiceBreakdown::FdmSingleColor(detail) = &result.detail else {
            panic!("wrong breakdown variant");
        };

        assert_eq!(
            detail.rush_final_sell_price,
            Some(detail.final_sell_price * 1.5)
        );
        assert_eq!(result.total, detail.final_sell_price * 1.5);
    }

    #[test]
    fn test_completion_days_from_lead_time_without_floor() {
        let result = calculate(&base_inputs(), &fdm_catalogs());
        let ServiceBreakdown::FdmSingleColor(detail) = &result.detail else {
            panic!("wrong breakdown variant");
        };

        // Default lead time = 2.5 h × 5 = 12.5 h → ceil(12.5 / 8) = 2 days.
        assert!((detail.lead_time_hours - 12.5).abs() < 1e-9);
        assert_eq!(detail.completion_days, 2.0);
        assert_eq!(detail.rush_completion_days, None);
    }

    #[test]
    fn test_zero_print_time_means_zero_days() {
        let mut inputs = base_inputs();
        inputs.insert("printHours".to_string(), "0".into());
        inputs.insert("printMinutes".to_string(), "0".into());
        let result = calculate(&inputs, &fdm_catalogs());
        let ServiceBreakdown::FdmSingleColor(detail) = &result.detail else {
            panic!("wrong breakdown variant");
        };
        assert_eq!(detail.completion_days, 0.0);
        assert_eq!(detail.machine_cost, 0.0);
    }

    #[test]
    fn test_empty_catalogs_price_resources_as_zero() {
        let result = calculate(&base_inputs(), &Catalogs::new());
        let ServiceBreakdown::FdmSingleColor(detail) = &result.detail else {
            panic!("wrong breakdown variant");
        };
        assert_eq!(detail.machine_cost, 0.0);
        assert_eq!(detail.power_cost, 0.0);
        assert_eq!(detail.material_cost, 0.0);
        // Labor still accrues.
        assert!(detail.service_cost > 0.0);
    }

    #[test]
    fn test_custom_machine_and_material_overrides() {
        let mut inputs = base_inputs();
        inputs.insert("printerMachineId".to_string(), "__custom__".into());
        inputs.insert("customMachinePricePhp".to_string(), "56000".into());
        inputs.insert("customMachineRoiHours".to_string(), "1000".into());
        inputs.insert("customMachinePowerWatts".to_string(), "400".into());
        inputs.insert("materialId".to_string(), "__custom__".into());
        inputs.insert("customMaterialPricePerKg".to_string(), "1120".into());

        let result = calculate(&inputs, &fdm_catalogs());
        let ServiceBreakdown::FdmSingleColor(detail) = &result.detail else {
            panic!("wrong breakdown variant");
        };

        // 56000 / 1.12 = 50000 adjusted; / 1000 ROI h × 2.5 h.
        assert!((detail.machine_cost - 125.0).abs() < 1e-9);
        // 1120 / 1.12 = 1000 per kg × 0.1 kg.
        assert!((detail.material_cost - 100.0).abs() < 1e-9);
        assert!((detail.power_cost - (400.0 * 2.5 / 1000.0) * 12.5).abs() < 1e-9);
    }

    #[test]
    fn test_line_items_include_every_component() {
        let result = calculate(&base_inputs(), &fdm_catalogs());
        let ids: Vec<&str> = result.line_items.iter().map(|item| item.id).collect();
        assert_eq!(
            ids,
            vec![
                "machineCost",
                "powerCost",
                "materialCost",
                "singlePrintExpense",
                "miscCosts",
                "serviceCost",
                "testPrintsExpense",
                "sellPrintsExpense",
                "testPrintsWithProfit",
                "sellPrintsWithProfit",
                "sellPrintProfit",
                "testPrintProfit",
                "totalExpenses",
                "totalProfit",
                "finalSellPrice",
                "completionTime",
            ]
        );
    }
}
