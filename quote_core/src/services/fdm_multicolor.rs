//! # FDM Multicolor
//!
//! The single-color cost model extended to up to [`MATERIAL_SLOT_COUNT`]
//! material slots: each slot contributes its own weight at its own catalog
//! price, and the aggregated figures feed the shared filament model. Slots
//! have no custom-material escape hatch.

use once_cell::sync::Lazy;

use crate::catalog::{Catalogs, MACHINES_CATALOG, MATERIALS_CATALOG};
use crate::fields::{CatalogBinding, FieldDescriptor};
use crate::state::InputMap;

use super::fdm_single_color::{calculate_fdm_quote, custom_machine_fields, MaterialUsage};
use super::{
    numeric, resolve_material_price_per_kg, zero_if_nan, QuoteBreakdown, ServiceBreakdown,
};

/// Number of material slots on the multicolor form
pub const MATERIAL_SLOT_COUNT: usize = 8;

fn multicolor_material_usage(inputs: &InputMap, catalogs: &Catalogs) -> MaterialUsage {
    let materials = catalogs.get_catalog(MATERIALS_CATALOG);
    let mut kg_weight = 0.0;
    let mut material_cost = 0.0;

    for slot in 1..=MATERIAL_SLOT_COUNT {
        let slot_kg = numeric(inputs, &format!("materialWeightGrams{slot}"), 0.0) / 1000.0;
        if slot_kg == 0.0 {
            continue;
        }
        let price_per_kg = resolve_material_price_per_kg(
            inputs,
            materials,
            &format!("materialId{slot}"),
            // Slots have no custom option; the field id below never resolves.
            &format!("customMaterialPricePerKg{slot}"),
        );
        kg_weight += slot_kg;
        material_cost += zero_if_nan(slot_kg * price_per_kg);
    }

    MaterialUsage {
        kg_weight,
        material_cost,
    }
}

/// Calculate an FDM multicolor quote.
pub fn calculate(inputs: &InputMap, catalogs: &Catalogs) -> QuoteBreakdown {
    let material = multicolor_material_usage(inputs, catalogs);
    calculate_fdm_quote(inputs, catalogs, material, ServiceBreakdown::FdmMulticolor)
}

static FIELDS: Lazy<Vec<FieldDescriptor>> = Lazy::new(|| {
    let mut fields = vec![
        FieldDescriptor::section("printTimeSection", "Print time"),
        FieldDescriptor::number("printHours", "Print hours")
            .required()
            .placeholder("Hours"),
        FieldDescriptor::number("printMinutes", "Print minutes").placeholder("Minutes"),
        FieldDescriptor::section("pricingSection", "Pricing & options"),
        FieldDescriptor::number("profitMarginPercent", "Profit margin (%)")
            .required()
            .placeholder("e.g. 30"),
        FieldDescriptor::checkbox("allowRush", "Allow rush option"),
        FieldDescriptor::section("machineSection", "Machine"),
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
        FieldDescriptor::section("extraFieldsSection", "Extra Fields"),
    ];

    for slot in 1..=MATERIAL_SLOT_COUNT {
        fields.extend(material_slot_fields(slot));
    }

    fields.extend(vec![
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
    ]);
    fields.extend(custom_machine_fields("Custom FDM Multi-color"));
    fields
});

/// Material slot N: type select, material select narrowed by type, weight.
fn material_slot_fields(slot: usize) -> Vec<FieldDescriptor> {
    let label = format!("Material {slot}");
    vec![
        FieldDescriptor::section(format!("materialSection{slot}"), label.clone()),
        FieldDescriptor::select(format!("materialType{slot}"), format!("{label} type")).catalog(
            CatalogBinding::new(MATERIALS_CATALOG)
                .job_type("Job_type", "FDM Printing")
                .distinct("material_type"),
        ),
        FieldDescriptor::select(format!("materialId{slot}"), label.clone()).catalog(
            CatalogBinding::new(MATERIALS_CATALOG)
                .job_type("Job_type", "FDM Printing")
                .parent(format!("materialType{slot}"), "material_type")
                .option_columns("material_id", "material_name"),
        ),
        FieldDescriptor::number(
            format!("materialWeightGrams{slot}"),
            format!("{label} weight (g)"),
        )
        .placeholder("Weight in grams for this color"),
    ]
}

pub(crate) fn fields() -> &'static [FieldDescriptor] {
    &FIELDS
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::parse_catalog_csv;

    fn catalogs() -> Catalogs {
        let machines = parse_catalog_csv(
            "machines",
            "machine_id,machine_name,brand,job_type,adjusted_machine_price_php,roi_hours,power_watts\n\
             x1c,X1 Carbon,Bambu Lab,fdm printing,52000,2190,1050\n",
        );
        let materials = parse_catalog_csv(
            "materials",
            "material_id,material_name,material_type,Job_type,adjusted_price_per_kg\n\
             pla-black,PLA Black,PLA,FDM Printing,800\n\
             pla-red,PLA Red,PLA,FDM Printing,900\n\
             petg-clear,PETG Clear,PETG,FDM Printing,1100\n",
        );
        Catalogs::from_rows(materials, machines)
    }

    fn inputs_with_slots() -> InputMap {
        let mut inputs = InputMap::new();
        for (field, value) in [
            ("printHours", "4"),
            ("profitMarginPercent", "30"),
            ("printerMachineId", "x1c"),
            ("materialId1", "pla-black"),
            ("materialWeightGrams1", "100"),
            ("materialId2", "pla-red"),
            ("materialWeightGrams2", "50"),
            ("materialId3", "petg-clear"),
            ("materialWeightGrams3", "25"),
        ] {
            inputs.insert(field.to_string(), value.into());
        }
        inputs
    }

    #[test]
    fn test_material_cost_aggregates_across_slots() {
        let result = calculate(&inputs_with_slots(), &catalogs());
        let ServiceBreakdown::FdmMulticolor(detail) = &result.detail else {
            panic!("wrong breakdown variant");
        };

        // 0.1×800 + 0.05×900 + 0.025×1100 = 80 + 45 + 27.5
        assert!((detail.material_cost - 152.5).abs() < 1e-9);
        assert!((detail.kg_weight - 0.175).abs() < 1e-9);
    }

    #[test]
    fn test_empty_slots_contribute_nothing() {
        let mut inputs = inputs_with_slots();
        inputs.insert("materialId4".to_string(), "pla-black".into());
        // Slot 4 has a material but no weight: no contribution.
        let with_empty = calculate(&inputs, &catalogs());
        let baseline = calculate(&inputs_with_slots(), &catalogs());
        assert_eq!(with_empty.subtotal, baseline.subtotal);
    }

    #[test]
    fn test_shares_the_single_color_machine_model() {
        let result = calculate(&inputs_with_slots(), &catalogs());
        let ServiceBreakdown::FdmMulticolor(detail) = &result.detail else {
            panic!("wrong breakdown variant");
        };
        // 52000 / 2190 × 4 h
        assert!((detail.machine_cost - (52000.0 / 2190.0) * 4.0).abs() < 1e-9);
        assert!((detail.power_cost - (1050.0 * 4.0 / 1000.0) * 12.5).abs() < 1e-9);
    }

    #[test]
    fn test_schema_declares_eight_slots() {
        let weight_fields = fields()
            .iter()
            .filter(|f| f.id.starts_with("materialWeightGrams"))
            .count();
        assert_eq!(weight_fields, MATERIAL_SLOT_COUNT);
    }
}
