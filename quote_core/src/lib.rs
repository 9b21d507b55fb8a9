//! # quote_core - Fabrication Quotation Engine
//!
//! `quote_core` is the pricing engine behind FabQuote, a quotation tool for a
//! 3D-printing/fabrication service bureau. Hosts create quote tabs, pick a
//! service type, fill in service-specific inputs, and the engine computes a
//! cost breakdown and final selling price per quote plus a grand total across
//! all quotes.
//!
//! ## Design Philosophy
//!
//! - **Calculators are pure**: every service calculator maps committed
//!   inputs plus catalogs to a breakdown, with no side effects and no
//!   failure path (missing resources price as zero).
//! - **One mutation path**: all state changes go through the store's command
//!   dispatch; subscribers are notified synchronously.
//! - **Committed vs live inputs**: calculators and exports only ever read
//!   the committed input set, decoupling typing from recomputation.
//! - **JSON-First**: snapshots and interchange payloads are serde types.
//!
//! ## Quick Start
//!
//! ```rust
//! use quote_core::catalog::Catalogs;
//! use quote_core::state::{commit_tab, Command, QuoteStore};
//! use quote_core::summary::compute_global_summary;
//!
//! let mut store = QuoteStore::new();
//! let tab_id = store.state().active_tab_id.clone();
//!
//! store.dispatch(Command::SetServiceType {
//!     tab_id: tab_id.clone(),
//!     service_type_id: Some("3d-design".to_string()),
//! });
//! for (field, value) in [
//!     ("estimatedDesignHours", "8"),
//!     ("designComplexity", "standard"),
//!     ("profitMarginPercent", "30"),
//! ] {
//!     store.dispatch(Command::UpdateField {
//!         tab_id: tab_id.clone(),
//!         field_id: field.to_string(),
//!         value: value.into(),
//!     });
//! }
//! commit_tab(&mut store, &tab_id).unwrap();
//!
//! let summary = compute_global_summary(store.state(), &Catalogs::new());
//! assert!(summary.grand_total > 0.0);
//! ```
//!
//! ## Modules
//!
//! - [`state`] - Quote tabs, the command-dispatch store, snapshots
//! - [`services`] - Per-service calculators and the service registry
//! - [`fields`] - Field schema and the shared validation contract
//! - [`catalog`] - Materials/machines reference data from CSV sources
//! - [`codec`] - Committed-only export/import payloads
//! - [`summary`] - Cross-tab totals, export gating, document collection
//! - [`file_io`] - Atomic snapshot persistence
//! - [`errors`] - Structured error types

pub mod catalog;
pub mod codec;
pub mod errors;
pub mod fields;
pub mod file_io;
pub mod services;
pub mod state;
pub mod summary;

// Re-export commonly used types at crate root for convenience
pub use catalog::Catalogs;
pub use codec::{build_export_payload, decode_import_payload, encode_export_payload};
pub use errors::{QuoteError, QuoteResult};
pub use services::{calculate_quote_for_service, QuoteBreakdown, ServiceBreakdown};
pub use state::{commit_tab, AppState, Command, FieldValue, QuoteStore};
pub use summary::{check_exportable, collect_quotes_for_document, compute_global_summary};
