//! # FabQuote CLI
//!
//! Terminal host for the quotation engine: loads the machine/material
//! catalogs from CSV, restores the persisted snapshot, walks one FDM quote
//! through the store (edit → commit → breakdown), and prints the cross-tab
//! summary plus the export payload.

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use tracing::warn;
use tracing_subscriber::EnvFilter;

use quote_core::catalog::Catalogs;
use quote_core::codec::{build_export_payload, encode_export_payload};
use quote_core::fields::{resolve_options, InputKind};
use quote_core::file_io::{load_snapshot, save_snapshot};
use quote_core::services::{
    calculate_quote_for_service, fields_for_service, LineItem, LineItemValue,
};
use quote_core::state::{commit_tab, Command, FieldValue, QuoteStore};
use quote_core::summary::{check_exportable, collect_quotes_for_document, compute_global_summary};

const SNAPSHOT_FILE: &str = "fabquote-state.json";

fn prompt(label: &str, default: &str) -> String {
    print!("{} [{}]: ", label, default);
    if io::stdout().flush().is_err() {
        return default.to_string();
    }

    let mut input = String::new();
    if io::stdin().lock().read_line(&mut input).is_err() {
        return default.to_string();
    }

    let trimmed = input.trim();
    if trimmed.is_empty() {
        default.to_string()
    } else {
        trimmed.to_string()
    }
}

fn format_line_item(item: &LineItem) -> String {
    match item.value {
        LineItemValue::Currency(amount) => format!("{:<32} PHP {:>12.2}", item.label, amount),
        LineItemValue::Hours(hours) => format!("{:<32} {:>10.2} h", item.label, hours),
        LineItemValue::Minutes(minutes) => format!("{:<32} {:>10.1} min", item.label, minutes),
        LineItemValue::Days { standard, rush } => match rush {
            Some(rush) => format!(
                "{:<32} {:.1} days (rush: {:.1} days)",
                item.label, standard, rush
            ),
            None => format!("{:<32} {:.1} days", item.label, standard),
        },
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    println!("FabQuote CLI - Fabrication Quotation Calculator");
    println!("===============================================");
    println!();

    let mut args = std::env::args().skip(1);
    let materials_path = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("data/materials.csv"));
    let machines_path = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("data/machines.csv"));

    let mut catalogs = Catalogs::new();
    catalogs.load_all(&materials_path, &machines_path);
    println!(
        "Catalogs: {} materials, {} machines",
        catalogs.get_catalog("materials").len(),
        catalogs.get_catalog("machines").len()
    );

    let snapshot_path = Path::new(SNAPSHOT_FILE);
    let mut store = match load_snapshot(snapshot_path) {
        Some(snapshot) => {
            let store = QuoteStore::hydrate(snapshot);
            println!("Restored {} quote tab(s) from snapshot", store.state().tabs.len());
            store
        }
        None => QuoteStore::new(),
    };
    println!();

    let tab_id = store.state().active_tab_id.clone();
    store.dispatch(Command::SetServiceType {
        tab_id: tab_id.clone(),
        service_type_id: Some("fdm-single-color".to_string()),
    });

    // Walk the core inputs; catalog selects default to their first option.
    let print_hours = prompt("Print hours", "2");
    let print_minutes = prompt("Print minutes", "30");
    let weight_grams = prompt("Print weight (g)", "100");
    let margin = prompt("Profit margin (%)", "30");

    let core_updates: [(&str, FieldValue); 4] = [
        ("printHours", print_hours.into()),
        ("printMinutes", print_minutes.into()),
        ("printWeightGrams", weight_grams.into()),
        ("profitMarginPercent", margin.into()),
    ];
    for (field_id, value) in core_updates {
        store.dispatch(Command::UpdateField {
            tab_id: tab_id.clone(),
            field_id: field_id.to_string(),
            value,
        });
    }

    // Catalog selects default to their first option; each one is dispatched
    // immediately so dependent selects see their parent's value.
    for field in fields_for_service("fdm-single-color") {
        if field.kind != InputKind::Select || !field.required {
            continue;
        }
        let first_option = {
            let tab = store.state().tab(&tab_id).expect("active tab exists");
            resolve_options(field, &catalogs, &tab.inputs)
                .first()
                .map(|option| option.value.clone())
        };
        match first_option {
            Some(value) => store.dispatch(Command::UpdateField {
                tab_id: tab_id.clone(),
                field_id: field.id.clone(),
                value: value.into(),
            }),
            None => warn!(field = %field.id, "no catalog options available; leaving empty"),
        }
    }

    println!();
    match commit_tab(&mut store, &tab_id) {
        Ok(()) => {
            let tab = store.state().tab(&tab_id).expect("active tab exists");
            let result =
                calculate_quote_for_service("fdm-single-color", &tab.committed_inputs, &catalogs);

            println!("═══════════════════════════════════════");
            println!("  QUOTE BREAKDOWN - {}", tab.label);
            println!("═══════════════════════════════════════");
            for item in &result.line_items {
                println!("  {}", format_line_item(item));
            }
            println!("  ---------------------------------------");
            println!("  Subtotal expenses: PHP {:.2}", result.subtotal);
            println!("  Selling price:     PHP {:.2}", result.selling_price());
        }
        Err(message) => {
            println!("Commit rejected: {}", message);
        }
    }

    println!();
    let summary = compute_global_summary(store.state(), &catalogs);
    println!("All quotes (selling price):");
    for item in &summary.items {
        println!("  {:<32} PHP {:>12.2}", item.label, item.amount);
    }
    println!("  Grand total: PHP {:.2}", summary.grand_total);

    // Persistence is fire-and-forget: log and move on.
    if let Err(err) = save_snapshot(store.state(), snapshot_path) {
        warn!(error = %err, "failed to persist snapshot");
    }

    println!();
    match check_exportable(store.state()) {
        Ok(()) => {
            let documents = collect_quotes_for_document(store.state(), &catalogs);
            println!("Document export ready: {} quote(s)", documents.len());
            let payload = build_export_payload(store.state());
            match encode_export_payload(&payload) {
                Ok(json) => println!("{}", json),
                Err(err) => warn!(error = %err, "failed to encode export payload"),
            }
        }
        Err(err) => println!("Export not available: {}", err),
    }
}
