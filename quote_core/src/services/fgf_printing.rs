//! # FGF Printing
//!
//! Fused-granulate printing. Same cost model as FDM single color behind a
//! field list filtered to FGF machines and pellet materials.

use once_cell::sync::Lazy;

use crate::catalog::{Catalogs, MACHINES_CATALOG, MATERIALS_CATALOG};
use crate::fields::{CatalogBinding, FieldDescriptor};
use crate::state::InputMap;

use super::fdm_single_color::{
    calculate_fdm_quote, custom_machine_fields, custom_material_fields, single_material_usage,
};
use super::{QuoteBreakdown, ServiceBreakdown};

/// Calculate an FGF printing quote.
pub fn calculate(inputs: &InputMap, catalogs: &Catalogs) -> QuoteBreakdown {
    let material = single_material_usage(inputs, catalogs);
    calculate_fdm_quote(inputs, catalogs, material, ServiceBreakdown::FgfPrinting)
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
                    .job_type("job_type", "FGF printing")
                    .distinct("brand"),
            ),
        FieldDescriptor::select("printerMachineId", "Printer")
            .required()
            .catalog(
                CatalogBinding::new(MACHINES_CATALOG)
                    .job_type("job_type", "FGF printing")
                    .parent("printerBrand", "brand")
                    .option_columns("machine_id", "machine_name")
                    .allow_custom(),
            ),
        FieldDescriptor::select("materialType", "Material type")
            .required()
            .catalog(
                CatalogBinding::new(MATERIALS_CATALOG)
                    .job_type("Job_type", "FGF Printing")
                    .distinct("material_type"),
            ),
        FieldDescriptor::select("materialId", "Material")
            .required()
            .catalog(
                CatalogBinding::new(MATERIALS_CATALOG)
                    .job_type("Job_type", "FGF Printing")
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
    fields.extend(custom_machine_fields("Custom FGF printer"));
    fields.extend(custom_material_fields());
    fields
});

pub(crate) fn fields() -> &'static [FieldDescriptor] {
    &FIELDS
}
