//! # Catalog Provider
//!
//! Reference data for catalog-backed selects and calculators: one catalog of
//! materials and one of machines, each an ordered list of untyped rows keyed
//! by column name. Catalogs are loaded once from CSV sources and read-only
//! thereafter.
//!
//! Catalog columns are not statically known ahead of the filtering logic, so
//! rows stay string-keyed with typed accessor helpers per known column, and
//! filter predicates are plain data ([`RowFilter`]) rather than closures.
//!
//! A malformed or unreachable source degrades to an empty catalog for that id
//! plus a logged warning — never an application-level failure. Calculators
//! simply price missing resources as zero-cost/zero-power.
//!
//! ## CSV contract
//!
//! First line is the header row, comma-delimited; cells are trimmed. Example:
//!
//! ```csv
//! machine_id,machine_name,brand,job_type,adjusted_machine_price_php,roi_hours,power_watts
//! mk4,Original MK4,Prusa,fdm printing,50000,2190,300
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::services::parse_number_str;

/// Catalog id for the materials catalog
pub const MATERIALS_CATALOG: &str = "materials";
/// Catalog id for the machines catalog
pub const MACHINES_CATALOG: &str = "machines";

/// One material or machine: an untyped mapping of column name to cell value.
///
/// Cell values are stored trimmed. Unknown columns read as `None`/empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CatalogRow {
    columns: BTreeMap<String, String>,
}

impl CatalogRow {
    /// Build a row from (column, value) pairs. Values are trimmed on insert.
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut row = CatalogRow::default();
        for (column, value) in pairs {
            row.set(column, value);
        }
        row
    }

    /// Set a single cell, trimming the value.
    pub fn set(&mut self, column: &str, value: &str) {
        self.columns
            .insert(column.to_string(), value.trim().to_string());
    }

    /// Raw cell lookup.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.columns.get(column).map(String::as_str)
    }

    /// Cell as text, empty string when the column is absent.
    pub fn text(&self, column: &str) -> &str {
        self.get(column).unwrap_or("")
    }

    /// Cell as a number with an explicit fallback for absent/empty/non-finite
    /// cells. Catalog machines with a missing `roi_hours` figure go through
    /// here to pick up the fixed default instead of failing.
    pub fn number(&self, column: &str, fallback: f64) -> f64 {
        parse_number_str(self.get(column), fallback)
    }

    /// Exact-string match against a filter, after trimming.
    pub fn matches(&self, filter: &RowFilter) -> bool {
        self.text(&filter.column).trim() == filter.expected.trim()
    }
}

/// A filter predicate as data: column name + expected value.
///
/// Matching is exact string equality after trimming both sides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowFilter {
    pub column: String,
    pub expected: String,
}

impl RowFilter {
    pub fn new(column: impl Into<String>, expected: impl Into<String>) -> Self {
        RowFilter {
            column: column.into(),
            expected: expected.into(),
        }
    }
}

/// Apply a set of filters, keeping rows that match all of them.
pub fn filter_rows<'a>(rows: &'a [CatalogRow], filters: &[RowFilter]) -> Vec<&'a CatalogRow> {
    rows.iter()
        .filter(|row| filters.iter().all(|f| row.matches(f)))
        .collect()
}

/// Distinct, order-preserving projection of one column over a row set.
///
/// Empty cells are skipped; used for "brand" / "material type" parent selects.
pub fn distinct_values(rows: &[&CatalogRow], column: &str) -> Vec<String> {
    let mut seen = Vec::new();
    for row in rows {
        let value = row.text(column).trim();
        if value.is_empty() {
            continue;
        }
        if !seen.iter().any(|v: &String| v == value) {
            seen.push(value.to_string());
        }
    }
    seen
}

/// The session's catalogs: loaded once, immutable afterwards.
#[derive(Debug, Clone, Default)]
pub struct Catalogs {
    materials: Vec<CatalogRow>,
    machines: Vec<CatalogRow>,
    loaded: bool,
}

impl Catalogs {
    /// Empty, unloaded catalogs. Catalog-bound selects should show a loading
    /// placeholder while [`Catalogs::are_loaded`] is still false.
    pub fn new() -> Self {
        Catalogs::default()
    }

    /// Build catalogs directly from rows (tests, embedded data).
    pub fn from_rows(materials: Vec<CatalogRow>, machines: Vec<CatalogRow>) -> Self {
        Catalogs {
            materials,
            machines,
            loaded: true,
        }
    }

    /// Have the catalogs been loaded at least once?
    pub fn are_loaded(&self) -> bool {
        self.loaded
    }

    /// Get a catalog by id. Unknown or unloaded ids yield an empty slice.
    pub fn get_catalog(&self, catalog_id: &str) -> &[CatalogRow] {
        match catalog_id {
            MATERIALS_CATALOG => &self.materials,
            MACHINES_CATALOG => &self.machines,
            _ => &[],
        }
    }

    /// One-shot load of both catalogs from CSV files.
    ///
    /// Each source degrades independently: a file that cannot be read or
    /// parsed leaves that catalog empty and logs a warning. A second load is
    /// never initiated by the host, but calling this again simply replaces
    /// the rows.
    pub fn load_all(&mut self, materials_path: &Path, machines_path: &Path) {
        self.materials = load_catalog_file(MATERIALS_CATALOG, materials_path);
        self.machines = load_catalog_file(MACHINES_CATALOG, machines_path);
        self.loaded = true;
    }
}

fn load_catalog_file(catalog_id: &str, path: &Path) -> Vec<CatalogRow> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) => {
            warn!(
                catalog = catalog_id,
                path = %path.display(),
                error = %err,
                "failed to read catalog source; catalog will be empty"
            );
            return Vec::new();
        }
    };
    parse_catalog_csv(catalog_id, &text)
}

/// Parse CSV text into catalog rows: first line headers, cells trimmed,
/// short records padded with empty cells.
pub fn parse_catalog_csv(catalog_id: &str, text: &str) -> Vec<CatalogRow> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = match reader.headers() {
        Ok(headers) => headers.iter().map(|h| h.trim().to_string()).collect(),
        Err(err) => {
            warn!(
                catalog = catalog_id,
                error = %err,
                "failed to parse catalog header row; catalog will be empty"
            );
            return Vec::new();
        }
    };

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = match record {
            Ok(record) => record,
            Err(err) => {
                warn!(
                    catalog = catalog_id,
                    error = %err,
                    "skipping malformed catalog record"
                );
                continue;
            }
        };
        let mut row = CatalogRow::default();
        for (idx, header) in headers.iter().enumerate() {
            row.set(header, record.get(idx).unwrap_or(""));
        }
        rows.push(row);
    }
    rows
}
