//! # Post Processing
//!
//! Prices finishing work (sanding, priming, assembly): estimated hours scaled
//! by complexity into considered service days, labor over those days, powered
//! tool usage graded by a separate level, plus procurement and misc
//! pass-throughs. No minimum-day floor — short jobs bill short.

use once_cell::sync::Lazy;
use serde::Serialize;

use crate::catalog::Catalogs;
use crate::fields::FieldDescriptor;
use crate::state::InputMap;

use super::{
    flag, invert_margin, margin_fraction, numeric, text, zero_if_nan, LineItem, QuoteBreakdown,
    ServiceBreakdown, DEFAULT_BASIC_SERVICE_COST_PER_HOUR, DEFAULT_ELECTRICAL_COST_PER_KWH,
    PER_DAY_HOURS, PER_DAY_RUSH_HOURS, RUSH_PRICE_MULTIPLIER,
};

/// Draw assumed for powered tools at full usage
const ASSUMED_TOOL_WATTS: f64 = 500.0;

/// Complexity label → level. Unknown labels fall back to standard.
fn complexity_level(label: &str) -> f64 {
    match label.to_ascii_lowercase().as_str() {
        "minimal" => 1.0,
        "easy" => 2.0,
        "standard" => 3.0,
        "hard" => 4.0,
        "extreme" => 5.0,
        _ => 3.0,
    }
}

/// Electrical tool usage label → level (0 = none).
fn tool_usage_level(label: &str) -> f64 {
    match label.to_ascii_lowercase().as_str() {
        "none" => 0.0,
        "minimal" => 1.0,
        "moderate" => 2.0,
        "significant" => 3.0,
        "heavy" => 4.0,
        _ => 0.0,
    }
}

/// Intermediate figures for a post-processing quote.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostProcessingBreakdown {
    pub complexity_level: f64,
    pub tool_usage_level: f64,
    pub considered_service_time_days: f64,
    pub rush_considered_service_time_days: Option<f64>,
    pub service_cost: f64,
    pub electrical_cost: f64,
    pub procurement_costs: f64,
    pub misc_costs: f64,
    pub delivery_days: f64,
    pub rush_delivery_days: Option<f64>,
    pub final_sell_price: f64,
    pub rush_final_sell_price: Option<f64>,
    pub total_expense: f64,
    pub profit: f64,
}

/// Calculate a post-processing quote.
pub fn calculate(inputs: &InputMap, _catalogs: &Catalogs) -> QuoteBreakdown {
    let estimated_hours = numeric(inputs, "estimatedPostProcessHours", 0.0);
    let level = complexity_level(text(inputs, "postProcessComplexity"));
    let tool_level = tool_usage_level(text(inputs, "electricalToolUsage"));
    let margin = margin_fraction(inputs);
    let allow_rush = flag(inputs, "allowRush");

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
    let procurement_costs = numeric(inputs, "procurementCosts", 0.0);
    let misc_costs = numeric(inputs, "miscCosts", 0.0);

    let complexity_factor = 1.0 + level / 2.0;

    let considered_service_time_days = if estimated_hours > 0.0 {
        estimated_hours * complexity_factor / PER_DAY_HOURS
    } else {
        0.0
    };
    let rush_considered_service_time_days = (allow_rush && estimated_hours > 0.0)
        .then_some(estimated_hours * complexity_factor / PER_DAY_RUSH_HOURS);

    let service_hours = considered_service_time_days * PER_DAY_HOURS;
    let service_cost = zero_if_nan(service_hours * basic_service_cost_per_hour);

    let electrical_cost = zero_if_nan(
        ASSUMED_TOOL_WATTS * considered_service_time_days * electrical_cost_per_kwh * tool_level
            / 1000.0,
    );

    let total_expense = service_cost + electrical_cost + misc_costs + procurement_costs;

    let final_sell_price = invert_margin(total_expense, margin);
    let rush_final_sell_price = allow_rush.then_some(final_sell_price * RUSH_PRICE_MULTIPLIER);
    let profit = final_sell_price - total_expense;

    // Delivery adds a handover allowance on top of the considered time.
    let extra_days = estimated_hours * (level / 2.0) / PER_DAY_HOURS;
    let delivery_days = considered_service_time_days + extra_days;
    let rush_delivery_days = (allow_rush && estimated_hours > 0.0).then_some(
        considered_service_time_days + estimated_hours * (level / 2.0) / PER_DAY_RUSH_HOURS,
    );

    let mut line_items = vec![
        LineItem::days(
            "consideredServiceTime",
            "Considered service time (days)",
            considered_service_time_days,
            rush_considered_service_time_days,
        ),
        LineItem::currency("serviceCost", "Service cost", service_cost),
        LineItem::currency("electricalCost", "Electrical cost", electrical_cost),
        LineItem::currency("procurementCosts", "Procurement costs", procurement_costs),
        LineItem::currency("miscCosts", "Miscellaneous costs", misc_costs),
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
        detail: ServiceBreakdown::PostProcessing(PostProcessingBreakdown {
            complexity_level: level,
            tool_usage_level: tool_level,
            considered_service_time_days,
            rush_considered_service_time_days,
            service_cost,
            electrical_cost,
            procurement_costs,
            misc_costs,
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
        FieldDescriptor::section("coreSection", "Post processing details"),
        FieldDescriptor::number(
            "estimatedPostProcessHours",
            "Estimated total post processing time (hours)",
        )
        .required()
        .placeholder("Total post processing time in hours"),
        FieldDescriptor::select("postProcessComplexity", "Post process complexity")
            .required()
            .static_options(&[
                ("minimal", "minimal"),
                ("easy", "easy"),
                ("standard", "standard"),
                ("hard", "hard"),
                ("extreme", "extreme"),
            ]),
        FieldDescriptor::number("profitMarginPercent", "Profit margin (%)")
            .required()
            .placeholder("e.g. 30"),
        FieldDescriptor::checkbox("allowRush", "Allow rush option"),
        FieldDescriptor::select("electricalToolUsage", "Electrical tool usage level")
            .required()
            .static_options(&[
                ("none", "none"),
                ("minimal", "minimal"),
                ("moderate", "moderate"),
                ("significant", "significant"),
                ("heavy", "heavy"),
            ]),
        FieldDescriptor::number("procurementCosts", "Procurement costs (PHP)")
            .placeholder("Total procurement costs, if any"),
        FieldDescriptor::number("miscCosts", "Misc costs (PHP)").placeholder("Miscellaneous costs"),
        FieldDescriptor::textarea("notes", "Notes")
            .placeholder("Add notes and misc cost breakdown here")
            .on_blur(),
        FieldDescriptor::section("extraFieldsSection", "Extra Fields"),
        FieldDescriptor::section("advancedSection", "Advanced fields"),
        FieldDescriptor::number("electricalCostPerKwh", "Electrical cost per kWh (PHP)")
            .placeholder("Default 12.5")
            .on_blur(),
        FieldDescriptor::number("basicServiceCostPerHour", "Basic service cost per hour (PHP)")
            .placeholder("Default 500")
            .on_blur(),
    ]
});

pub(crate) fn fields() -> &'static [FieldDescriptor] {
    &FIELDS
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(hours: &str, complexity: &str, tools: &str) -> InputMap {
        let mut map = InputMap::new();
        map.insert("estimatedPostProcessHours".to_string(), hours.into());
        map.insert("postProcessComplexity".to_string(), complexity.into());
        map.insert("electricalToolUsage".to_string(), tools.into());
        map.insert("profitMarginPercent".to_string(), "30".into());
        map
    }

    #[test]
    fn test_no_day_floor_on_short_jobs() {
        let result = calculate(&inputs("2", "minimal", "none"), &Catalogs::new());
        let ServiceBreakdown::PostProcessing(detail) = &result.detail else {
            panic!("wrong breakdown variant");
        };
        // 2 h × 1.5 / 8 = 0.375 days, unfloored.
        assert!((detail.considered_service_time_days - 0.375).abs() < 1e-9);
    }

    #[test]
    fn test_tool_usage_scales_electrical_cost() {
        let none = calculate(&inputs("8", "standard", "none"), &Catalogs::new());
        let heavy = calculate(&inputs("8", "standard", "heavy"), &Catalogs::new());
        let ServiceBreakdown::PostProcessing(none_detail) = &none.detail else {
            panic!("wrong breakdown variant");
        };
        let ServiceBreakdown::PostProcessing(heavy_detail) = &heavy.detail else {
            panic!("wrong breakdown variant");
        };

        assert_eq!(none_detail.electrical_cost, 0.0);
        // 8 h × 2.5 / 8 = 2.5 days; 500 W × 2.5 × 12.5 × 4 / 1000.
        assert!((heavy_detail.electrical_cost - 500.0 * 2.5 * 12.5 * 4.0 / 1000.0).abs() < 1e-9);
    }

    #[test]
    fn test_expense_composition_and_inversion() {
        let mut map = inputs("8", "standard", "minimal");
        map.insert("procurementCosts".to_string(), "250".into());
        map.insert("miscCosts".to_string(), "100".into());
        let result = calculate(&map, &Catalogs::new());
        let ServiceBreakdown::PostProcessing(detail) = &result.detail else {
            panic!("wrong breakdown variant");
        };

        let expected_expense = detail.service_cost + detail.electrical_cost + 100.0 + 250.0;
        assert!((detail.total_expense - expected_expense).abs() < 1e-9);
        assert!((detail.final_sell_price * 0.7 - detail.total_expense).abs() < 1e-6);
    }

    #[test]
    fn test_delivery_adds_handover_allowance() {
        let mut map = inputs("8", "standard", "none");
        map.insert("allowRush".to_string(), true.into());
        let result = calculate(&map, &Catalogs::new());
        let ServiceBreakdown::PostProcessing(detail) = &result.detail else {
            panic!("wrong breakdown variant");
        };

        // considered = 8 × 2.5 / 8 = 2.5; extra = 8 × 1.5 / 8 = 1.5.
        assert!((detail.delivery_days - 4.0).abs() < 1e-9);
        // Rush: considered + 8 × 1.5 / 10 = 2.5 + 1.2.
        assert!((detail.rush_delivery_days.unwrap() - 3.7).abs() < 1e-9);
    }

    #[test]
    fn test_unknown_labels_fall_back() {
        let odd = calculate(&inputs("8", "ridiculous", "sometimes"), &Catalogs::new());
        let standard = calculate(&inputs("8", "standard", "none"), &Catalogs::new());
        assert_eq!(odd.subtotal, standard.subtotal);
    }
}
