//! # Quote Codec
//!
//! Serializes the committed-only view of all tabs to the `v1` interchange
//! payload and back. Encoding never includes live inputs, dirty flags, or
//! commit errors; decoding is all-or-nothing — a parse or shape failure
//! surfaces as a typed error and never yields partial data.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{QuoteError, QuoteResult};
use crate::state::{AppState, InputMap};

/// Interchange payload format tag
pub const FORMAT_VERSION: &str = "v1";

/// One tab in the interchange payload: the committed view only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedTab {
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub quote_name: String,
    #[serde(default)]
    pub service_type: Option<String>,
    /// Exactly the committed input mapping
    #[serde(default)]
    pub inputs: InputMap,
}

/// The `v1` export/import payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportPayload {
    #[serde(default)]
    pub format_version: String,
    #[serde(default)]
    pub app_version: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub tabs: Vec<ExportedTab>,
}

/// Build the export payload from the current state, committed data only.
pub fn build_export_payload(state: &AppState) -> ExportPayload {
    ExportPayload {
        format_version: FORMAT_VERSION.to_string(),
        app_version: state.version.clone(),
        created_at: Some(Utc::now()),
        tabs: state
            .tabs
            .iter()
            .map(|tab| ExportedTab {
                label: tab.label.clone(),
                quote_name: tab.quote_name.clone(),
                service_type: tab.service_type.clone(),
                inputs: tab.committed_inputs.clone(),
            })
            .collect(),
    }
}

/// Encode a payload as pretty JSON.
pub fn encode_export_payload(payload: &ExportPayload) -> QuoteResult<String> {
    serde_json::to_string_pretty(payload).map_err(|err| QuoteError::Serialization {
        reason: err.to_string(),
    })
}

/// Parse import text into a payload.
///
/// Malformed JSON is an [`QuoteError::ImportParse`]; a parsed document that
/// is not an object with a non-empty `tabs` sequence is an
/// [`QuoteError::ImportShape`]. The caller translates either into a
/// user-facing message; state is never touched on failure.
pub fn decode_import_payload(text: &str) -> QuoteResult<ExportPayload> {
    let value: serde_json::Value =
        serde_json::from_str(text).map_err(|err| QuoteError::import_parse(err.to_string()))?;

    if !value.is_object() {
        return Err(QuoteError::import_shape("Invalid payload structure"));
    }
    let has_tabs = value
        .get("tabs")
        .and_then(|tabs| tabs.as_array())
        .is_some_and(|tabs| !tabs.is_empty());
    if !has_tabs {
        return Err(QuoteError::import_shape(
            "Payload does not contain any tabs",
        ));
    }

    serde_json::from_value(value).map_err(|err| QuoteError::import_shape(err.to_string()))
}
