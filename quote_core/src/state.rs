//! # Quote State Store
//!
//! The single mutable root of the application: an ordered collection of quote
//! tabs plus the active-tab pointer, owned by [`QuoteStore`]. All mutation is
//! funneled through [`QuoteStore::dispatch`] with a closed set of
//! [`Command`] variants; every dispatch ends by synchronously notifying all
//! subscribers with the new state. There is no batching and no async
//! scheduling.
//!
//! Each tab keeps two input maps:
//!
//! - `inputs` — the live edit buffer; possibly invalid, possibly incomplete.
//! - `committed_inputs` — the last validated value set. Calculators and
//!   exports only ever read this map.
//!
//! `UpdateField` writes only into `inputs` and raises `is_dirty`;
//! `CommitInputs` copies live into committed verbatim and clears the flag.
//! The store itself never validates — callers run the field schema first and
//! record failures with `SetTabError` (see [`commit_tab`]).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::codec::ExportedTab;
use crate::fields::validate_field;
use crate::services::fields_for_service;

/// Schema version tag carried by persisted snapshots.
pub const STATE_VERSION: &str = "0.6";

/// A single live input value.
///
/// Text inputs, selects and textareas store [`FieldValue::Text`]; checkboxes
/// store [`FieldValue::Flag`]. [`FieldValue::Number`] is accepted on decode so
/// hand-edited import payloads with raw JSON numbers still round-trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Flag(bool),
    Number(f64),
    Text(String),
}

impl FieldValue {
    /// Text content, if this value is textual.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(text) => Some(text),
            _ => None,
        }
    }

    /// True for text values that trim to nothing.
    pub fn is_empty_text(&self) -> bool {
        matches!(self, FieldValue::Text(text) if text.trim().is_empty())
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Flag(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

/// Field id → value mapping; ordered for stable serialization.
pub type InputMap = BTreeMap<String, FieldValue>;

/// One unit of quoting work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteTab {
    /// Stable unique identifier (`tab-N`), never reused within a session
    pub id: String,
    /// System-assigned display name ("Quote N")
    pub label: String,
    /// User-assigned display name; may be empty
    pub quote_name: String,
    /// Selected service type id, or `None` before a service is chosen
    pub service_type: Option<String>,
    /// Live edit buffer
    pub inputs: InputMap,
    /// Last committed value set — the only inputs calculators ever see
    pub committed_inputs: InputMap,
    /// True whenever `inputs` may differ from `committed_inputs`
    pub is_dirty: bool,
    /// Last commit-rejection message, cleared on successful commit
    pub last_commit_error: Option<String>,
}

impl QuoteTab {
    fn new(id: impl Into<String>, number: u32) -> Self {
        QuoteTab {
            id: id.into(),
            label: format!("Quote {}", number),
            quote_name: String::new(),
            service_type: None,
            inputs: InputMap::new(),
            committed_inputs: InputMap::new(),
            is_dirty: false,
            last_commit_error: None,
        }
    }
}

/// The root application state snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppState {
    /// Schema/version tag for persisted snapshots
    pub version: String,
    /// Ordered tabs; order is display/tab-bar order
    pub tabs: Vec<QuoteTab>,
    /// Always refers to an existing tab while the collection is non-empty
    pub active_tab_id: String,
}

impl AppState {
    /// Find a tab by id.
    pub fn tab(&self, tab_id: &str) -> Option<&QuoteTab> {
        self.tabs.iter().find(|t| t.id == tab_id)
    }

    /// The currently active tab, if any.
    pub fn active_tab(&self) -> Option<&QuoteTab> {
        self.tab(&self.active_tab_id)
    }
}

/// Persisted snapshot, read leniently: every field optional so partial or
/// older snapshots hydrate instead of failing.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub tabs: Vec<SnapshotTab>,
    #[serde(default)]
    pub active_tab_id: Option<String>,
}

/// One tab inside a persisted [`Snapshot`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotTab {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub quote_name: Option<String>,
    #[serde(default)]
    pub service_type: Option<String>,
    #[serde(default)]
    pub inputs: Option<InputMap>,
    #[serde(default)]
    pub committed_inputs: Option<InputMap>,
    #[serde(default)]
    pub is_dirty: Option<bool>,
}

/// The closed set of state mutations.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Append a new tab with an auto-incremented label number; becomes active
    AddTab,
    /// Remove a tab; removing the last remaining tab resets to one fresh tab
    RemoveTab { tab_id: String },
    /// Switch focus; no validation
    SetActiveTab { tab_id: String },
    /// Switch service and reset all input state on that tab
    SetServiceType {
        tab_id: String,
        service_type_id: Option<String>,
    },
    /// Update the user-visible quote name only
    SetQuoteName { tab_id: String, name: String },
    /// Write into the live edit buffer and mark the tab dirty
    UpdateField {
        tab_id: String,
        field_id: String,
        value: FieldValue,
    },
    /// Copy live inputs into committed inputs verbatim; caller pre-validates
    CommitInputs { tab_id: String },
    /// Record a commit-rejection message without touching inputs
    SetTabError {
        tab_id: String,
        message: Option<String>,
    },
    /// Wholesale replacement of all tabs; no-op when the payload has no tabs
    ImportQuotes { tabs: Vec<ExportedTab> },
    /// Full reset to one fresh empty tab
    ClearAllQuotes,
}

/// Subscription handle returned by [`QuoteStore::subscribe`].
pub type SubscriptionId = usize;

type Subscriber = Box<dyn FnMut(&AppState)>;

/// Owns the application state and the subscriber list.
pub struct QuoteStore {
    state: AppState,
    next_tab_number: u32,
    subscribers: Vec<(SubscriptionId, Subscriber)>,
    next_subscription: SubscriptionId,
}

impl Default for QuoteStore {
    fn default() -> Self {
        QuoteStore::new()
    }
}

impl QuoteStore {
    /// Fresh store with one empty "Quote 1" tab, active.
    pub fn new() -> Self {
        let mut store = QuoteStore {
            state: AppState {
                version: STATE_VERSION.to_string(),
                tabs: Vec::new(),
                active_tab_id: String::new(),
            },
            next_tab_number: 1,
            subscribers: Vec::new(),
            next_subscription: 0,
        };
        store.reset();
        store
    }

    /// Rebuild a store from a persisted snapshot.
    ///
    /// Invalid snapshots fall back to a fresh initial state. Tabs lacking a
    /// usable id get `tab-{index+1}`; a missing committed map falls back to
    /// the live inputs; commit errors are never resurrected. The tab-id
    /// counter restarts one past the highest recovered numeric suffix.
    pub fn hydrate(snapshot: Snapshot) -> Self {
        if snapshot.tabs.is_empty() {
            return QuoteStore::new();
        }

        let mut tabs = Vec::with_capacity(snapshot.tabs.len());
        for (index, src) in snapshot.tabs.iter().enumerate() {
            let number = (index + 1) as u32;
            let id = src
                .id
                .as_deref()
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| format!("tab-{}", number));

            let mut tab = QuoteTab::new(id, number);
            if let Some(label) = src.label.as_deref().map(str::trim).filter(|l| !l.is_empty()) {
                tab.label = label.to_string();
            }
            tab.quote_name = src.quote_name.clone().unwrap_or_default();
            tab.service_type = src
                .service_type
                .clone()
                .filter(|service| !service.is_empty());
            tab.inputs = src.inputs.clone().unwrap_or_default();
            tab.committed_inputs = src
                .committed_inputs
                .clone()
                .or_else(|| src.inputs.clone())
                .unwrap_or_default();
            tab.is_dirty = src.is_dirty.unwrap_or(false);
            tabs.push(tab);
        }

        let active_tab_id = snapshot
            .active_tab_id
            .filter(|id| tabs.iter().any(|t| &t.id == id))
            .unwrap_or_else(|| tabs[0].id.clone());

        let mut max_number = 0u32;
        for (index, tab) in tabs.iter().enumerate() {
            let number = tab
                .id
                .strip_prefix("tab-")
                .and_then(|suffix| suffix.parse::<u32>().ok())
                .unwrap_or((index + 1) as u32);
            max_number = max_number.max(number);
        }

        QuoteStore {
            state: AppState {
                version: snapshot
                    .version
                    .filter(|v| !v.is_empty())
                    .unwrap_or_else(|| STATE_VERSION.to_string()),
                tabs,
                active_tab_id,
            },
            next_tab_number: max_number + 1,
            subscribers: Vec::new(),
            next_subscription: 0,
        }
    }

    /// Current state snapshot.
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Register a callback invoked synchronously after every dispatch.
    pub fn subscribe(&mut self, callback: impl FnMut(&AppState) + 'static) -> SubscriptionId {
        let id = self.next_subscription;
        self.next_subscription += 1;
        self.subscribers.push((id, Box::new(callback)));
        id
    }

    /// Remove a previously registered subscriber.
    pub fn unsubscribe(&mut self, id: SubscriptionId) {
        self.subscribers.retain(|(sub_id, _)| *sub_id != id);
    }

    /// Apply a command, then notify every subscriber with the new state.
    pub fn dispatch(&mut self, command: Command) {
        match command {
            Command::AddTab => {
                let id = format!("tab-{}", self.next_tab_number);
                let tab = QuoteTab::new(id.clone(), self.next_tab_number);
                self.next_tab_number += 1;
                self.state.tabs.push(tab);
                self.state.active_tab_id = id;
            }

            Command::RemoveTab { tab_id } => {
                // Removing the sole remaining tab is a full reset.
                if self.state.tabs.len() <= 1 {
                    self.reset();
                } else if let Some(index) = self.state.tabs.iter().position(|t| t.id == tab_id) {
                    self.state.tabs.remove(index);
                    if self.state.active_tab_id == tab_id {
                        let fallback = if index > 0 { index - 1 } else { 0 };
                        self.state.active_tab_id = self.state.tabs[fallback].id.clone();
                    }
                }
            }

            Command::SetActiveTab { tab_id } => {
                self.state.active_tab_id = tab_id;
            }

            Command::SetServiceType {
                tab_id,
                service_type_id,
            } => {
                if let Some(tab) = self.tab_mut(&tab_id) {
                    tab.service_type = service_type_id;
                    tab.inputs.clear();
                    tab.committed_inputs.clear();
                    tab.is_dirty = false;
                    tab.last_commit_error = None;
                }
            }

            Command::SetQuoteName { tab_id, name } => {
                if let Some(tab) = self.tab_mut(&tab_id) {
                    tab.quote_name = name;
                }
            }

            Command::UpdateField {
                tab_id,
                field_id,
                value,
            } => {
                if let Some(tab) = self.tab_mut(&tab_id) {
                    tab.inputs.insert(field_id, value);
                    tab.is_dirty = true;
                }
            }

            Command::CommitInputs { tab_id } => {
                if let Some(tab) = self.tab_mut(&tab_id) {
                    tab.committed_inputs = tab.inputs.clone();
                    tab.is_dirty = false;
                    tab.last_commit_error = None;
                }
            }

            Command::SetTabError { tab_id, message } => {
                if let Some(tab) = self.tab_mut(&tab_id) {
                    tab.last_commit_error = message;
                }
            }

            Command::ImportQuotes { tabs } => {
                if !tabs.is_empty() {
                    self.next_tab_number = 1;
                    let mut imported = Vec::with_capacity(tabs.len());
                    for (index, src) in tabs.into_iter().enumerate() {
                        let number = self.next_tab_number;
                        self.next_tab_number += 1;

                        let mut tab = QuoteTab::new(format!("tab-{}", number), number);
                        if !src.label.trim().is_empty() {
                            tab.label = src.label;
                        } else {
                            tab.label = format!("Quote {}", index + 1);
                        }
                        tab.quote_name = src.quote_name;
                        tab.service_type = src.service_type.filter(|s| !s.is_empty());
                        tab.inputs = src.inputs.clone();
                        tab.committed_inputs = src.inputs;
                        imported.push(tab);
                    }
                    self.state.active_tab_id = imported[0].id.clone();
                    self.state.tabs = imported;
                }
            }

            Command::ClearAllQuotes => {
                self.reset();
            }
        }

        self.notify();
    }

    fn tab_mut(&mut self, tab_id: &str) -> Option<&mut QuoteTab> {
        self.state.tabs.iter_mut().find(|t| t.id == tab_id)
    }

    fn reset(&mut self) {
        self.next_tab_number = 1;
        let id = format!("tab-{}", self.next_tab_number);
        let tab = QuoteTab::new(id.clone(), self.next_tab_number);
        self.next_tab_number += 1;
        self.state = AppState {
            version: STATE_VERSION.to_string(),
            tabs: vec![tab],
            active_tab_id: id,
        };
    }

    fn notify(&mut self) {
        let state = &self.state;
        for (_, callback) in self.subscribers.iter_mut() {
            callback(state);
        }
    }
}

/// Caller-side commit protocol: validate the live inputs of a tab against its
/// service's field schema, then either commit or record the rejection.
///
/// The store itself never validates (`CommitInputs` is unconditional), so
/// every commit site funnels through here. Tabs without a service type are a
/// silent no-op, matching the form behavior.
pub fn commit_tab(store: &mut QuoteStore, tab_id: &str) -> Result<(), String> {
    let Some(tab) = store.state().tab(tab_id) else {
        return Ok(());
    };
    let Some(service_type) = tab.service_type.clone() else {
        return Ok(());
    };

    let has_error = fields_for_service(&service_type).iter().any(|field| {
        let value = tab.inputs.get(&field.id);
        !validate_field(field, value).is_valid
    });

    if has_error {
        let message = "Please check inputs, some are not valid.".to_string();
        store.dispatch(Command::SetTabError {
            tab_id: tab_id.to_string(),
            message: Some(message.clone()),
        });
        return Err(message);
    }

    store.dispatch(Command::CommitInputs {
        tab_id: tab_id.to_string(),
    });
    Ok(())
}
