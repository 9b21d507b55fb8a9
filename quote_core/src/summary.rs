//! # Global Summary / Export Aggregator
//!
//! Recomputes every tab's calculator result from committed inputs to build
//! the cross-tab selling-price summary, the export/PDF eligibility gate, and
//! the document collection handed to an external renderer.
//!
//! The on-screen summary includes dirty tabs (their committed inputs are
//! still the last good calculation); export and document collection do not.

use serde::Serialize;

use crate::catalog::Catalogs;
use crate::errors::{QuoteError, QuoteResult};
use crate::fields::validate_field;
use crate::services::{
    calculate_quote_for_service, fields_for_service, flag, service_type_by_id, LineItem,
    ServiceBreakdown,
};
use crate::state::{AppState, FieldValue, InputMap, QuoteTab};

/// One row of the cross-tab summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalSummaryItem {
    pub tab_id: String,
    pub label: String,
    pub amount: f64,
}

/// Selling price per quote plus the grand total.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalSummary {
    pub items: Vec<GlobalSummaryItem>,
    pub grand_total: f64,
}

/// Per-quote summary handed to the document renderer. Rendering specifics
/// (layout, fonts, pagination) live outside this crate.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteDocument {
    pub id: String,
    pub name: String,
    pub service_type_label: String,
    pub is_rush: bool,
    pub selling_price: f64,
    pub completion_days: Option<f64>,
    pub delivery_days: Option<f64>,
    pub inputs: InputMap,
    pub line_items: Vec<LineItem>,
    pub detail: ServiceBreakdown,
}

/// Display name: committed `quoteName` input, else the tab's quote name,
/// else the tab label.
fn display_name(tab: &QuoteTab) -> String {
    let committed_name = tab
        .committed_inputs
        .get("quoteName")
        .and_then(FieldValue::as_text)
        .map(str::trim)
        .filter(|name| !name.is_empty());
    if let Some(name) = committed_name {
        return name.to_string();
    }
    let quote_name = tab.quote_name.trim();
    if !quote_name.is_empty() {
        return quote_name.to_string();
    }
    tab.label.clone()
}

/// Compute the cross-tab selling-price summary from committed inputs.
///
/// Every tab with a selected service type contributes, dirty or not.
pub fn compute_global_summary(state: &AppState, catalogs: &Catalogs) -> GlobalSummary {
    let mut items = Vec::new();

    for tab in &state.tabs {
        let Some(service_type) = tab.service_type.as_deref() else {
            continue;
        };
        let result = calculate_quote_for_service(service_type, &tab.committed_inputs, catalogs);
        items.push(GlobalSummaryItem {
            tab_id: tab.id.clone(),
            label: display_name(tab),
            amount: result.selling_price(),
        });
    }

    let grand_total = items.iter().map(|item| item.amount).sum();
    GlobalSummary { items, grand_total }
}

/// Check whether the current state is eligible for export / document
/// generation: every tab has a service type, no tab is dirty, and every
/// committed value passes validation. The first violation blocks with a
/// tab-specific message.
pub fn check_exportable(state: &AppState) -> QuoteResult<()> {
    if state.tabs.is_empty() {
        return Err(QuoteError::NothingToExport);
    }

    for tab in &state.tabs {
        let Some(service_type) = tab.service_type.as_deref() else {
            return Err(QuoteError::export_blocked(
                tab.label.clone(),
                "has no service type selected. Please select a service and update summary \
                 before exporting.",
            ));
        };

        if tab.is_dirty {
            return Err(QuoteError::export_blocked(
                tab.label.clone(),
                "has uncommitted changes. Please click \"Update summary\" first.",
            ));
        }

        for field in fields_for_service(service_type) {
            let value = tab.committed_inputs.get(&field.id);
            if !validate_field(field, value).is_valid {
                return Err(QuoteError::export_blocked(
                    tab.label.clone(),
                    "has invalid or incomplete committed inputs. Please fix them and update \
                     summary before exporting.",
                ));
            }
        }
    }

    Ok(())
}

/// Collect all committed, non-dirty quotes in document-renderer shape.
pub fn collect_quotes_for_document(state: &AppState, catalogs: &Catalogs) -> Vec<QuoteDocument> {
    let mut quotes = Vec::new();

    for tab in &state.tabs {
        let Some(service_type) = tab.service_type.as_deref() else {
            continue;
        };
        if tab.is_dirty {
            continue;
        }

        let result = calculate_quote_for_service(service_type, &tab.committed_inputs, catalogs);
        let service_type_label = service_type_by_id(service_type)
            .map(|svc| svc.label.to_string())
            .unwrap_or_else(|| service_type.to_string());

        quotes.push(QuoteDocument {
            id: tab.id.clone(),
            name: display_name(tab),
            service_type_label,
            is_rush: flag(&tab.committed_inputs, "allowRush"),
            selling_price: result.selling_price(),
            completion_days: result.detail.completion_days(),
            delivery_days: result.detail.delivery_days(),
            inputs: tab.committed_inputs.clone(),
            line_items: result.line_items,
            detail: result.detail,
        });
    }

    quotes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{commit_tab, Command, QuoteStore};

    fn design_store() -> QuoteStore {
        let mut store = QuoteStore::new();
        let tab_id = store.state().active_tab_id.clone();
        store.dispatch(Command::SetServiceType {
            tab_id: tab_id.clone(),
            service_type_id: Some("3d-design".to_string()),
        });
        for (field, value) in [
            ("estimatedDesignHours", "40"),
            ("designComplexity", "standard"),
            ("profitMarginPercent", "30"),
        ] {
            store.dispatch(Command::UpdateField {
                tab_id: tab_id.clone(),
                field_id: field.to_string(),
                value: value.into(),
            });
        }
        commit_tab(&mut store, &tab_id).unwrap();
        store
    }

    #[test]
    fn test_global_summary_sums_selling_prices() {
        let mut store = design_store();
        store.dispatch(Command::AddTab);
        let second = store.state().active_tab_id.clone();
        store.dispatch(Command::SetServiceType {
            tab_id: second.clone(),
            service_type_id: Some("3d-design".to_string()),
        });
        for (field, value) in [
            ("estimatedDesignHours", "40"),
            ("designComplexity", "standard"),
            ("profitMarginPercent", "30"),
        ] {
            store.dispatch(Command::UpdateField {
                tab_id: second.clone(),
                field_id: field.to_string(),
                value: value.into(),
            });
        }
        commit_tab(&mut store, &second).unwrap();

        let summary = compute_global_summary(store.state(), &Catalogs::new());
        assert_eq!(summary.items.len(), 2);
        assert!((summary.grand_total - summary.items[0].amount * 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_summary_includes_dirty_tabs_from_committed_inputs() {
        let mut store = design_store();
        let tab_id = store.state().active_tab_id.clone();
        let before = compute_global_summary(store.state(), &Catalogs::new());

        // Dirty edit: the summary keeps pricing the committed inputs.
        store.dispatch(Command::UpdateField {
            tab_id,
            field_id: "estimatedDesignHours".to_string(),
            value: "999".into(),
        });
        let after = compute_global_summary(store.state(), &Catalogs::new());
        assert_eq!(before.grand_total, after.grand_total);
        assert_eq!(after.items.len(), 1);
    }

    #[test]
    fn test_summary_skips_tabs_without_service() {
        let mut store = design_store();
        store.dispatch(Command::AddTab);
        let summary = compute_global_summary(store.state(), &Catalogs::new());
        assert_eq!(summary.items.len(), 1);
    }

    #[test]
    fn test_summary_prefers_rush_price() {
        let mut store = QuoteStore::new();
        let tab_id = store.state().active_tab_id.clone();
        store.dispatch(Command::SetServiceType {
            tab_id: tab_id.clone(),
            service_type_id: Some("3d-design".to_string()),
        });
        for (field, value) in [
            ("estimatedDesignHours", "40"),
            ("designComplexity", "standard"),
            ("profitMarginPercent", "30"),
        ] {
            store.dispatch(Command::UpdateField {
                tab_id: tab_id.clone(),
                field_id: field.to_string(),
                value: value.into(),
            });
        }
        store.dispatch(Command::UpdateField {
            tab_id: tab_id.clone(),
            field_id: "allowRush".to_string(),
            value: true.into(),
        });
        commit_tab(&mut store, &tab_id).unwrap();

        let with_rush = compute_global_summary(store.state(), &Catalogs::new());
        let without_rush = compute_global_summary(design_store().state(), &Catalogs::new());
        assert!(
            (with_rush.grand_total - without_rush.grand_total * 1.5).abs() < 1e-6
        );
    }

    #[test]
    fn test_export_blocked_while_a_tab_is_dirty() {
        let mut store = design_store();
        let tab_id = store.state().active_tab_id.clone();
        store.dispatch(Command::UpdateField {
            tab_id,
            field_id: "estimatedDesignHours".to_string(),
            value: "50".into(),
        });

        let err = check_exportable(store.state()).unwrap_err();
        assert_eq!(err.error_code(), "EXPORT_BLOCKED");
        assert!(err.to_string().contains("Quote 1"));
        assert!(err.to_string().contains("uncommitted changes"));

        // And the document collection produces nothing for that tab.
        let docs = collect_quotes_for_document(store.state(), &Catalogs::new());
        assert!(docs.is_empty());
    }

    #[test]
    fn test_export_blocked_without_service_type() {
        let mut store = design_store();
        store.dispatch(Command::AddTab);
        let err = check_exportable(store.state()).unwrap_err();
        assert!(err.to_string().contains("Quote 2"));
        assert!(err.to_string().contains("no service type"));
    }

    #[test]
    fn test_export_blocked_on_invalid_committed_inputs() {
        let mut store = QuoteStore::new();
        let tab_id = store.state().active_tab_id.clone();
        store.dispatch(Command::SetServiceType {
            tab_id: tab_id.clone(),
            service_type_id: Some("3d-design".to_string()),
        });
        // Commit without the required fields (the store does not validate).
        store.dispatch(Command::CommitInputs { tab_id });

        let err = check_exportable(store.state()).unwrap_err();
        assert!(err.to_string().contains("invalid or incomplete"));
    }

    #[test]
    fn test_document_collection_shape() {
        let store = design_store();
        let docs = collect_quotes_for_document(store.state(), &Catalogs::new());
        assert_eq!(docs.len(), 1);
        let doc = &docs[0];
        assert_eq!(doc.service_type_label, "3D Design");
        assert_eq!(doc.name, "Quote 1");
        assert!(!doc.is_rush);
        assert!(doc.selling_price > 0.0);
        assert_eq!(doc.completion_days, None);
        assert_eq!(doc.delivery_days, Some(12.5));
        assert!(!doc.line_items.is_empty());
        assert!(matches!(doc.detail, ServiceBreakdown::Design3d(_)));
    }

    #[test]
    fn test_display_name_prefers_committed_quote_name_field() {
        let mut store = design_store();
        let tab_id = store.state().active_tab_id.clone();
        store.dispatch(Command::SetQuoteName {
            tab_id: tab_id.clone(),
            name: "Tab-level name".to_string(),
        });
        store.dispatch(Command::UpdateField {
            tab_id: tab_id.clone(),
            field_id: "quoteName".to_string(),
            value: "Committed name".into(),
        });
        store.dispatch(Command::CommitInputs { tab_id });

        let summary = compute_global_summary(store.state(), &Catalogs::new());
        assert_eq!(summary.items[0].label, "Committed name");
    }
}
