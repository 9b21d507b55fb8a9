//! # 3D Design
//!
//! Prices design labor: estimated hours scaled by a complexity factor into
//! working days (floored at 3), charged at the service rate plus workstation
//! power. A single margin inversion produces the sell price.

use once_cell::sync::Lazy;
use serde::Serialize;

use crate::catalog::Catalogs;
use crate::fields::FieldDescriptor;
use crate::state::InputMap;

use super::{
    flag, invert_margin, margin_fraction, numeric, text, zero_if_nan, LineItem, QuoteBreakdown,
    ServiceBreakdown, DEFAULT_BASIC_SERVICE_COST_PER_HOUR, DEFAULT_ELECTRICAL_COST_PER_KWH,
    MIN_DELIVERY_DAYS, PER_DAY_HOURS, PER_DAY_RUSH_HOURS, RUSH_PRICE_MULTIPLIER,
};

/// Workstation draw assumed while designing
const ASSUMED_WORKSTATION_WATTS: f64 = 1000.0;

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

/// Intermediate figures for a 3D design quote.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Design3dBreakdown {
    pub complexity_level: f64,
    pub effective_design_hours: f64,
    pub design_time_days: f64,
    pub rush_design_time_days: Option<f64>,
    pub power_cost: f64,
    pub service_cost: f64,
    pub delivery_days: f64,
    pub rush_delivery_days: Option<f64>,
    pub final_sell_price: f64,
    pub rush_final_sell_price: Option<f64>,
    pub total_expense: f64,
    pub profit: f64,
}

/// Calculate a 3D design quote.
pub fn calculate(inputs: &InputMap, _catalogs: &Catalogs) -> QuoteBreakdown {
    let estimated_design_hours = numeric(inputs, "estimatedDesignHours", 0.0);
    let level = complexity_level(text(inputs, "designComplexity"));
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

    // Level 1 works out to 1.5x, level 3 to 2.5x, and so on.
    let complexity_factor = 1.0 + level / 2.0;
    let effective_design_hours = estimated_design_hours * complexity_factor;

    let mut design_time_days = if effective_design_hours > 0.0 {
        effective_design_hours / PER_DAY_HOURS
    } else {
        0.0
    };
    let mut rush_design_time_days = (allow_rush && effective_design_hours > 0.0)
        .then_some(effective_design_hours / PER_DAY_RUSH_HOURS);

    if effective_design_hours > 0.0 {
        design_time_days = design_time_days.max(MIN_DELIVERY_DAYS);
        rush_design_time_days = rush_design_time_days.map(|days| days.max(MIN_DELIVERY_DAYS));
    }

    let power_cost = zero_if_nan(
        ASSUMED_WORKSTATION_WATTS * design_time_days * electrical_cost_per_kwh / 1000.0,
    );

    let design_hours_considered = design_time_days * PER_DAY_HOURS;
    let service_cost = zero_if_nan(design_hours_considered * basic_service_cost_per_hour);

    let total_expense = power_cost + service_cost;

    let final_sell_price = invert_margin(total_expense, margin);
    let rush_final_sell_price = allow_rush.then_some(final_sell_price * RUSH_PRICE_MULTIPLIER);
    let profit = final_sell_price - total_expense;

    let delivery_days = design_time_days;
    let rush_delivery_days = rush_design_time_days;

    let mut line_items = vec![
        LineItem::days(
            "designTimeConsidered",
            "Design time considered (days)",
            design_time_days,
            rush_design_time_days,
        ),
        LineItem::currency("powerCost", "Power cost", power_cost),
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
        detail: ServiceBreakdown::Design3d(Design3dBreakdown {
            complexity_level: level,
            effective_design_hours,
            design_time_days,
            rush_design_time_days,
            power_cost,
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
        FieldDescriptor::section("designCoreSection", "Design details"),
        FieldDescriptor::number("estimatedDesignHours", "Estimated design hours")
            .required()
            .placeholder("Estimated design time in hours"),
        FieldDescriptor::select("designComplexity", "Design complexity")
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
        FieldDescriptor::textarea("notes", "Notes")
            .placeholder("Add notes here")
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

    fn inputs(hours: &str, complexity: &str, margin: &str) -> InputMap {
        let mut map = InputMap::new();
        map.insert("estimatedDesignHours".to_string(), hours.into());
        map.insert("designComplexity".to_string(), complexity.into());
        map.insert("profitMarginPercent".to_string(), margin.into());
        map
    }

    #[test]
    fn test_complexity_scales_hours() {
        let result = calculate(&inputs("16", "easy", "0"), &Catalogs::new());
        let ServiceBreakdown::Design3d(detail) = &result.detail else {
            panic!("wrong breakdown variant");
        };
        // easy → level 1 → factor 1.5 → 24 effective hours → 3 days (at the floor)
        assert_eq!(detail.complexity_level, 1.0);
        assert!((detail.effective_design_hours - 24.0).abs() < 1e-9);
        assert_eq!(detail.design_time_days, 3.0);
    }

    #[test]
    fn test_unknown_complexity_falls_back_to_standard() {
        let odd = calculate(&inputs("8", "brutal", "0"), &Catalogs::new());
        let standard = calculate(&inputs("8", "standard", "0"), &Catalogs::new());
        assert_eq!(odd.subtotal, standard.subtotal);
    }

    #[test]
    fn test_three_day_floor_applies_to_both_variants() {
        let mut map = inputs("1", "easy", "0");
        map.insert("allowRush".to_string(), true.into());
        let result = calculate(&map, &Catalogs::new());
        let ServiceBreakdown::Design3d(detail) = &result.detail else {
            panic!("wrong breakdown variant");
        };
        assert_eq!(detail.design_time_days, 3.0);
        assert_eq!(detail.rush_design_time_days, Some(3.0));
    }

    #[test]
    fn test_zero_hours_mean_zero_days_and_costs() {
        let result = calculate(&inputs("0", "standard", "30"), &Catalogs::new());
        let ServiceBreakdown::Design3d(detail) = &result.detail else {
            panic!("wrong breakdown variant");
        };
        assert_eq!(detail.design_time_days, 0.0);
        assert_eq!(result.subtotal, 0.0);
        assert_eq!(result.total, 0.0);
    }

    #[test]
    fn test_costs_and_margin_inversion() {
        // 40 h × 2.5 (standard) = 100 effective hours → 12.5 days.
        let result = calculate(&inputs("40", "standard", "30"), &Catalogs::new());
        let ServiceBreakdown::Design3d(detail) = &result.detail else {
            panic!("wrong breakdown variant");
        };
        assert!((detail.design_time_days - 12.5).abs() < 1e-9);
        // Power: 1000 W × 12.5 days × 12.5 / 1000.
        assert!((detail.power_cost - 156.25).abs() < 1e-9);
        // Service: 12.5 days × 8 h × 500.
        assert!((detail.service_cost - 50000.0).abs() < 1e-9);
        // Margin property: sell × (1 - m) ≈ expense.
        assert!((detail.final_sell_price * 0.7 - detail.total_expense).abs() < 1e-6);
        assert!((detail.profit - (detail.final_sell_price - detail.total_expense)).abs() < 1e-9);
    }

    #[test]
    fn test_rush_multiplier_and_delivery() {
        let mut map = inputs("40", "standard", "30");
        map.insert("allowRush".to_string(), true.into());
        let result = calculate(&map, &Catalogs::new());
        let ServiceBreakdown::Design3d(detail) = &result.detail else {
            panic!("wrong breakdown variant");
        };
        assert_eq!(
            detail.rush_final_sell_price,
            Some(detail.final_sell_price * 1.5)
        );
        // Rush pace: 100 effective hours / 10 per day.
        assert_eq!(detail.rush_delivery_days, Some(10.0));
        assert_eq!(result.total, detail.final_sell_price * 1.5);
    }
}
