//! # Service Calculators
//!
//! One pure calculator per service type, all sharing the same contract:
//! `calculate(&InputMap, &Catalogs) -> QuoteBreakdown`. Calculators are total
//! functions — missing or malformed inputs coerce to per-field fallbacks and
//! missing catalog resources price as zero, so a calculator never fails.
//!
//! The shared design rules live here:
//!
//! - fallback-aware numeric coercion ([`parse_number`]) — one helper for all
//!   calculators, with an explicit per-field fallback;
//! - profit-margin inversion with the 0.99 clamp ([`invert_margin`]);
//! - the flat 1.5× rush price multiplier (independent of the rush
//!   time-compression used for delivery estimates);
//! - catalog/custom machine and material resolution (VAT-adjusted custom
//!   prices, fixed ROI fallback).
//!
//! Every calculator emits a [`QuoteBreakdown`]: an ordered line-item list in
//! which every item carries its authoritative value (money or time — no
//! placeholder amounts), the expense subtotal, the quoted total, and a
//! per-service [`ServiceBreakdown`] variant holding the intermediate figures
//! the summary/export layer needs.

pub mod design_3d;
pub mod fdm_multicolor;
pub mod fdm_single_color;
pub mod fgf_printing;
pub mod post_processing;
pub mod resin_printing;
pub mod scan_3d;
pub mod wash_cure;

use serde::Serialize;

use crate::catalog::{CatalogRow, Catalogs};
use crate::fields::{FieldDescriptor, CUSTOM_OPTION_ID};
use crate::state::{FieldValue, InputMap};

pub use design_3d::Design3dBreakdown;
pub use fdm_single_color::FdmPrintBreakdown;
pub use post_processing::PostProcessingBreakdown;
pub use resin_printing::ResinPrintingBreakdown;
pub use scan_3d::Scan3dBreakdown;
pub use wash_cure::WashCureBreakdown;

// ============================================================================
// Shared constants
// ============================================================================

/// Working hours per day for delivery estimates
pub(crate) const PER_DAY_HOURS: f64 = 8.0;
/// Working hours per day under rush time compression
pub(crate) const PER_DAY_RUSH_HOURS: f64 = 10.0;
/// Flat multiplier applied to the non-rush sell price when rush is enabled
pub(crate) const RUSH_PRICE_MULTIPLIER: f64 = 1.5;
/// Margin clamp ceiling; at or above this the sell price equals the expense
pub(crate) const MAX_PROFIT_MARGIN: f64 = 0.99;
/// Minimum day count for the services that carry a delivery floor
pub(crate) const MIN_DELIVERY_DAYS: f64 = 3.0;

/// Default electrical cost, PHP per kWh
pub(crate) const DEFAULT_ELECTRICAL_COST_PER_KWH: f64 = 12.5;
/// Resin-adjacent services (resin printing, wash & cure) default higher
pub(crate) const RESIN_ELECTRICAL_COST_PER_KWH: f64 = 13.5;
/// Default basic service labor rate, PHP per hour
pub(crate) const DEFAULT_BASIC_SERVICE_COST_PER_HOUR: f64 = 500.0;
/// Default handling minutes per batch
pub(crate) const DEFAULT_HANDLING_MINUTES_PER_BATCH: f64 = 10.0;
/// Default batch count
pub(crate) const DEFAULT_BATCH_COUNT: f64 = 1.0;

/// ROI hours used for custom machines and as the fallback for catalog
/// machines with a missing `roi_hours` figure
pub(crate) const DEFAULT_MACHINE_ROI_HOURS: f64 = 2190.0;
/// Custom machine/material prices are gross; divide by this before use
pub(crate) const CUSTOM_PRICE_VAT_FACTOR: f64 = 1.12;

// ============================================================================
// Numeric coercion
// ============================================================================

/// Coerce a raw field value to a number with an explicit fallback.
///
/// Absent, empty, and non-finite values all yield the fallback. This is the
/// single coercion path every calculator uses.
pub fn parse_number(value: Option<&FieldValue>, fallback: f64) -> f64 {
    match value {
        None => fallback,
        Some(FieldValue::Flag(flag)) => {
            if *flag {
                1.0
            } else {
                0.0
            }
        }
        Some(FieldValue::Number(n)) => {
            if n.is_finite() {
                *n
            } else {
                fallback
            }
        }
        Some(FieldValue::Text(text)) => parse_number_str(Some(text), fallback),
    }
}

/// String-level variant of [`parse_number`], shared with catalog cells.
pub fn parse_number_str(value: Option<&str>, fallback: f64) -> f64 {
    let Some(text) = value else {
        return fallback;
    };
    let text = text.trim();
    if text.is_empty() {
        return fallback;
    }
    match text.parse::<f64>() {
        Ok(n) if n.is_finite() => n,
        _ => fallback,
    }
}

pub(crate) fn numeric(inputs: &InputMap, field_id: &str, fallback: f64) -> f64 {
    parse_number(inputs.get(field_id), fallback)
}

pub(crate) fn flag(inputs: &InputMap, field_id: &str) -> bool {
    match inputs.get(field_id) {
        None => false,
        Some(FieldValue::Flag(flag)) => *flag,
        Some(FieldValue::Number(n)) => *n != 0.0,
        Some(FieldValue::Text(text)) => {
            let text = text.trim();
            !(text.is_empty() || text.eq_ignore_ascii_case("false") || text == "0")
        }
    }
}

pub(crate) fn text<'a>(inputs: &'a InputMap, field_id: &str) -> &'a str {
    inputs
        .get(field_id)
        .and_then(FieldValue::as_text)
        .unwrap_or("")
        .trim()
}

/// NaN guard for cost formulas (0/0 divisions and the like).
pub(crate) fn zero_if_nan(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value
    }
}

// ============================================================================
// Pricing helpers
// ============================================================================

/// Profit margin as a fraction, clamped to [0, 0.99].
pub(crate) fn margin_fraction(inputs: &InputMap) -> f64 {
    (numeric(inputs, "profitMarginPercent", 0.0) / 100.0).clamp(0.0, MAX_PROFIT_MARGIN)
}

/// Invert a profit margin: sell price such that `sell × (1 - margin)` equals
/// the expense. At or above the clamp ceiling the sell price is the expense
/// itself (100% margin would divide by zero).
pub(crate) fn invert_margin(expense: f64, margin: f64) -> f64 {
    if margin >= MAX_PROFIT_MARGIN {
        expense
    } else {
        expense / (1.0 - margin)
    }
}

// ============================================================================
// Catalog-backed resources
// ============================================================================

/// Resolved machine figures, whether catalog-sourced or custom.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct MachineFigures {
    pub adjusted_price: f64,
    pub roi_hours: f64,
    pub power_watts: f64,
}

/// Resolve a machine selection: a catalog row matched by exact `machine_id`
/// equality, or the `__custom__` sentinel backed by `{prefix}PricePhp` /
/// `{prefix}RoiHours` / `{prefix}PowerWatts` override fields. Custom prices
/// are gross and get VAT-adjusted; non-positive custom prices resolve to zero.
pub(crate) fn resolve_machine(
    inputs: &InputMap,
    machines: &[CatalogRow],
    id_field: &str,
    custom_prefix: &str,
) -> MachineFigures {
    let machine_id = text(inputs, id_field);

    if machine_id == CUSTOM_OPTION_ID {
        let gross = numeric(inputs, &format!("{custom_prefix}PricePhp"), 0.0);
        let adjusted_price = if gross > 0.0 {
            gross / CUSTOM_PRICE_VAT_FACTOR
        } else {
            0.0
        };
        return MachineFigures {
            adjusted_price,
            roi_hours: numeric(
                inputs,
                &format!("{custom_prefix}RoiHours"),
                DEFAULT_MACHINE_ROI_HOURS,
            ),
            power_watts: numeric(inputs, &format!("{custom_prefix}PowerWatts"), 0.0),
        };
    }

    match machines.iter().find(|m| m.text("machine_id") == machine_id) {
        Some(row) => MachineFigures {
            adjusted_price: row.number("adjusted_machine_price_php", 0.0),
            roi_hours: row.number("roi_hours", DEFAULT_MACHINE_ROI_HOURS),
            power_watts: row.number("power_watts", 0.0),
        },
        None => MachineFigures {
            adjusted_price: 0.0,
            roi_hours: DEFAULT_MACHINE_ROI_HOURS,
            power_watts: 0.0,
        },
    }
}

/// Resolve a material's adjusted price per kg: catalog row by `material_id`,
/// or the custom price field VAT-adjusted. Unknown selections price as zero.
pub(crate) fn resolve_material_price_per_kg(
    inputs: &InputMap,
    materials: &[CatalogRow],
    id_field: &str,
    custom_price_field: &str,
) -> f64 {
    let material_id = text(inputs, id_field);
    if material_id == CUSTOM_OPTION_ID {
        return numeric(inputs, custom_price_field, 0.0) / CUSTOM_PRICE_VAT_FACTOR;
    }
    materials
        .iter()
        .find(|m| m.text("material_id") == material_id)
        .map(|row| row.number("adjusted_price_per_kg", 0.0))
        .unwrap_or(0.0)
}

// ============================================================================
// Result contract
// ============================================================================

/// The value a line item carries: money, or an authoritative time figure.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "unit", content = "amount")]
pub enum LineItemValue {
    /// PHP amount
    Currency(f64),
    Hours(f64),
    Minutes(f64),
    /// Day count, with the rush-compressed variant when rush is enabled
    Days { standard: f64, rush: Option<f64> },
}

/// One row of a quote's cost breakdown.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineItem {
    pub id: &'static str,
    pub label: &'static str,
    pub value: LineItemValue,
}

impl LineItem {
    pub fn currency(id: &'static str, label: &'static str, amount: f64) -> Self {
        LineItem {
            id,
            label,
            value: LineItemValue::Currency(amount),
        }
    }

    pub fn hours(id: &'static str, label: &'static str, hours: f64) -> Self {
        LineItem {
            id,
            label,
            value: LineItemValue::Hours(hours),
        }
    }

    pub fn minutes(id: &'static str, label: &'static str, minutes: f64) -> Self {
        LineItem {
            id,
            label,
            value: LineItemValue::Minutes(minutes),
        }
    }

    pub fn days(id: &'static str, label: &'static str, standard: f64, rush: Option<f64>) -> Self {
        LineItem {
            id,
            label,
            value: LineItemValue::Days { standard, rush },
        }
    }
}

/// Output contract every calculator must produce.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuoteBreakdown {
    /// Ordered cost/time rows; every component present even when zero
    pub line_items: Vec<LineItem>,
    /// Total expenses before markup
    pub subtotal: f64,
    /// Reserved; currently always zero
    pub adjustments: f64,
    /// Rush sell price when rush is enabled, else the final sell price
    pub total: f64,
    /// Per-service intermediate figures
    pub detail: ServiceBreakdown,
}

impl QuoteBreakdown {
    /// All-zero result for unknown services.
    pub fn empty() -> Self {
        QuoteBreakdown {
            line_items: Vec::new(),
            subtotal: 0.0,
            adjustments: 0.0,
            total: 0.0,
            detail: ServiceBreakdown::Empty,
        }
    }

    /// The selling price shown per quote: rush sell price when present, else
    /// the final sell price, else the generic total.
    pub fn selling_price(&self) -> f64 {
        if let Some(price) = self
            .detail
            .rush_final_sell_price()
            .filter(|p| p.is_finite())
        {
            return price;
        }
        if let Some(price) = self.detail.final_sell_price().filter(|p| p.is_finite()) {
            return price;
        }
        if self.total.is_finite() {
            self.total
        } else {
            0.0
        }
    }
}

/// Per-service breakdown figures as a tagged union. Consumers that need
/// service-specific numbers (document rendering) pattern-match on the tag;
/// the shared accessors below cover the aggregator.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "service")]
pub enum ServiceBreakdown {
    /// Unknown service / no calculator: all-zero result
    Empty,
    FdmSingleColor(FdmPrintBreakdown),
    FdmMulticolor(FdmPrintBreakdown),
    FgfPrinting(FdmPrintBreakdown),
    ResinPrinting(ResinPrintingBreakdown),
    Scan3d(Scan3dBreakdown),
    PostProcessing(PostProcessingBreakdown),
    Design3d(Design3dBreakdown),
    WashCure(WashCureBreakdown),
}

impl ServiceBreakdown {
    /// Non-rush final sell price, when this service computed one.
    pub fn final_sell_price(&self) -> Option<f64> {
        match self {
            ServiceBreakdown::Empty => None,
            ServiceBreakdown::FdmSingleColor(b)
            | ServiceBreakdown::FdmMulticolor(b)
            | ServiceBreakdown::FgfPrinting(b) => Some(b.final_sell_price),
            ServiceBreakdown::ResinPrinting(b) => Some(b.final_sell_price),
            ServiceBreakdown::Scan3d(b) => Some(b.final_sell_price),
            ServiceBreakdown::PostProcessing(b) => Some(b.final_sell_price),
            ServiceBreakdown::Design3d(b) => Some(b.final_sell_price),
            ServiceBreakdown::WashCure(b) => Some(b.final_sell_price),
        }
    }

    /// Rush sell price, when rush was enabled.
    pub fn rush_final_sell_price(&self) -> Option<f64> {
        match self {
            ServiceBreakdown::Empty => None,
            ServiceBreakdown::FdmSingleColor(b)
            | ServiceBreakdown::FdmMulticolor(b)
            | ServiceBreakdown::FgfPrinting(b) => b.rush_final_sell_price,
            ServiceBreakdown::ResinPrinting(b) => b.rush_final_sell_price,
            ServiceBreakdown::Scan3d(b) => b.rush_final_sell_price,
            ServiceBreakdown::PostProcessing(b) => b.rush_final_sell_price,
            ServiceBreakdown::Design3d(b) => b.rush_final_sell_price,
            ServiceBreakdown::WashCure(b) => b.rush_final_sell_price,
        }
    }

    /// Completion days (lead-time based; the FDM/FGF family only).
    pub fn completion_days(&self) -> Option<f64> {
        match self {
            ServiceBreakdown::FdmSingleColor(b)
            | ServiceBreakdown::FdmMulticolor(b)
            | ServiceBreakdown::FgfPrinting(b) => Some(b.completion_days),
            _ => None,
        }
    }

    /// Estimated delivery days (the work-time based services).
    pub fn delivery_days(&self) -> Option<f64> {
        match self {
            ServiceBreakdown::ResinPrinting(b) => Some(b.delivery_days),
            ServiceBreakdown::Scan3d(b) => Some(b.delivery_days),
            ServiceBreakdown::PostProcessing(b) => Some(b.delivery_days),
            ServiceBreakdown::Design3d(b) => Some(b.delivery_days),
            ServiceBreakdown::WashCure(b) => Some(b.delivery_days),
            _ => None,
        }
    }
}

// ============================================================================
// Service registry
// ============================================================================

type CalculatorFn = fn(&InputMap, &Catalogs) -> QuoteBreakdown;
type FieldsFn = fn() -> &'static [FieldDescriptor];

/// One entry of the service registry: id, display label, field schema, and
/// the calculator function.
pub struct ServiceDefinition {
    pub id: &'static str,
    pub label: &'static str,
    schema: FieldsFn,
    calculator: CalculatorFn,
}

impl ServiceDefinition {
    /// Ordered field descriptors for this service's form.
    pub fn fields(&self) -> &'static [FieldDescriptor] {
        (self.schema)()
    }

    /// Run this service's calculator.
    pub fn calculate(&self, inputs: &InputMap, catalogs: &Catalogs) -> QuoteBreakdown {
        (self.calculator)(inputs, catalogs)
    }
}

/// Central registry of all service types, in display order.
const SERVICE_TYPES: &[ServiceDefinition] = &[
    ServiceDefinition {
        id: "fdm-single-color",
        label: "FDM Single Color",
        schema: fdm_single_color::fields,
        calculator: fdm_single_color::calculate,
    },
    ServiceDefinition {
        id: "fdm-multicolor",
        label: "FDM Multicolor",
        schema: fdm_multicolor::fields,
        calculator: fdm_multicolor::calculate,
    },
    ServiceDefinition {
        id: "resin-printing",
        label: "Resin Printing",
        schema: resin_printing::fields,
        calculator: resin_printing::calculate,
    },
    ServiceDefinition {
        id: "3d-scan",
        label: "3D Scan",
        schema: scan_3d::fields,
        calculator: scan_3d::calculate,
    },
    ServiceDefinition {
        id: "post-processing",
        label: "Post Processing",
        schema: post_processing::fields,
        calculator: post_processing::calculate,
    },
    ServiceDefinition {
        id: "3d-design",
        label: "3D Design",
        schema: design_3d::fields,
        calculator: design_3d::calculate,
    },
    ServiceDefinition {
        id: "wash-cure",
        label: "Wash & Cure",
        schema: wash_cure::fields,
        calculator: wash_cure::calculate,
    },
    ServiceDefinition {
        id: "fgf-printing",
        label: "FGF Printing",
        schema: fgf_printing::fields,
        calculator: fgf_printing::calculate,
    },
];

/// All service type definitions, in display order.
pub fn all_service_types() -> &'static [ServiceDefinition] {
    SERVICE_TYPES
}

/// Look up a single service type definition by id.
pub fn service_type_by_id(id: &str) -> Option<&'static ServiceDefinition> {
    SERVICE_TYPES.iter().find(|svc| svc.id == id)
}

/// Field schema for a service id; unknown ids yield an empty list.
pub fn fields_for_service(id: &str) -> &'static [FieldDescriptor] {
    service_type_by_id(id).map(|svc| svc.fields()).unwrap_or(&[])
}

/// Run the calculator for a service id; unknown ids yield an all-zero result.
pub fn calculate_quote_for_service(
    id: &str,
    inputs: &InputMap,
    catalogs: &Catalogs,
) -> QuoteBreakdown {
    match service_type_by_id(id) {
        Some(svc) => svc.calculate(inputs, catalogs),
        None => QuoteBreakdown::empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::parse_catalog_csv;

    #[test]
    fn test_parse_number_fallbacks() {
        assert_eq!(parse_number(None, 12.5), 12.5);
        assert_eq!(parse_number(Some(&FieldValue::Text("".into())), 12.5), 12.5);
        assert_eq!(
            parse_number(Some(&FieldValue::Text("  ".into())), 12.5),
            12.5
        );
        assert_eq!(
            parse_number(Some(&FieldValue::Text("abc".into())), 12.5),
            12.5
        );
        assert_eq!(
            parse_number(Some(&FieldValue::Text("2.5".into())), 12.5),
            2.5
        );
        assert_eq!(parse_number(Some(&FieldValue::Number(7.0)), 0.0), 7.0);
        assert_eq!(parse_number(Some(&FieldValue::Flag(true)), 0.0), 1.0);
    }

    #[test]
    fn test_invert_margin_property() {
        for margin in [0.0, 0.1, 0.3, 0.5, 0.9, 0.98] {
            let expense = 1234.56;
            let sell = invert_margin(expense, margin);
            assert!((sell * (1.0 - margin) - expense).abs() < 1e-9);
        }
        // 100% margin is disallowed: clamped path returns the expense as-is.
        assert_eq!(invert_margin(1000.0, 0.99), 1000.0);
        assert_eq!(invert_margin(1000.0, 1.5), 1000.0);
    }

    #[test]
    fn test_margin_fraction_clamps() {
        let mut inputs = InputMap::new();
        inputs.insert("profitMarginPercent".to_string(), "250".into());
        assert_eq!(margin_fraction(&inputs), MAX_PROFIT_MARGIN);
        inputs.insert("profitMarginPercent".to_string(), "-10".into());
        assert_eq!(margin_fraction(&inputs), 0.0);
    }

    fn machines() -> Vec<CatalogRow> {
        parse_catalog_csv(
            "machines",
            "machine_id,machine_name,job_type,adjusted_machine_price_php,roi_hours,power_watts\n\
             mk4,Original MK4,fdm printing,50000,2190,300\n\
             old,No ROI,fdm printing,30000,,250\n",
        )
    }

    #[test]
    fn test_resolve_machine_from_catalog() {
        let mut inputs = InputMap::new();
        inputs.insert("printerMachineId".to_string(), "mk4".into());
        let machine = resolve_machine(&inputs, &machines(), "printerMachineId", "customMachine");
        assert_eq!(machine.adjusted_price, 50000.0);
        assert_eq!(machine.roi_hours, 2190.0);
        assert_eq!(machine.power_watts, 300.0);
    }

    #[test]
    fn test_resolve_machine_missing_roi_uses_fallback() {
        let mut inputs = InputMap::new();
        inputs.insert("printerMachineId".to_string(), "old".into());
        let machine = resolve_machine(&inputs, &machines(), "printerMachineId", "customMachine");
        assert_eq!(machine.roi_hours, DEFAULT_MACHINE_ROI_HOURS);
    }

    #[test]
    fn test_resolve_custom_machine_vat_adjusts_price() {
        let mut inputs = InputMap::new();
        inputs.insert("printerMachineId".to_string(), CUSTOM_OPTION_ID.into());
        inputs.insert("customMachinePricePhp".to_string(), "56000".into());
        inputs.insert("customMachinePowerWatts".to_string(), "400".into());
        let machine = resolve_machine(&inputs, &machines(), "printerMachineId", "customMachine");
        assert!((machine.adjusted_price - 50000.0).abs() < 1e-9);
        assert_eq!(machine.roi_hours, DEFAULT_MACHINE_ROI_HOURS);
        assert_eq!(machine.power_watts, 400.0);
    }

    #[test]
    fn test_unknown_machine_prices_as_zero() {
        let inputs = InputMap::new();
        let machine = resolve_machine(&inputs, &machines(), "printerMachineId", "customMachine");
        assert_eq!(machine.adjusted_price, 0.0);
        assert_eq!(machine.power_watts, 0.0);
    }

    #[test]
    fn test_unknown_service_yields_empty_schema_and_result() {
        assert!(fields_for_service("laser-engraving").is_empty());
        let result =
            calculate_quote_for_service("laser-engraving", &InputMap::new(), &Catalogs::new());
        assert_eq!(result, QuoteBreakdown::empty());
        assert_eq!(result.selling_price(), 0.0);
    }

    #[test]
    fn test_registry_order_and_lookup() {
        let ids: Vec<&str> = all_service_types().iter().map(|s| s.id).collect();
        assert_eq!(
            ids,
            vec![
                "fdm-single-color",
                "fdm-multicolor",
                "resin-printing",
                "3d-scan",
                "post-processing",
                "3d-design",
                "wash-cure",
                "fgf-printing",
            ]
        );
        assert_eq!(
            service_type_by_id("wash-cure").map(|s| s.label),
            Some("Wash & Cure")
        );
    }
}
