//! # Field Schema & Validation
//!
//! Per service type, an ordered list of [`FieldDescriptor`]s defines both the
//! form and the validation contract. Descriptors are static data built with a
//! small builder API so the per-service lists (declared next to each
//! calculator) read like the forms they describe.
//!
//! [`validate_field`] is the single validation entry point: pure and
//! idempotent, shared by live-field error display, the pre-commit gate, and
//! the pre-export gate.

use serde::{Deserialize, Serialize};

use crate::catalog::{distinct_values, filter_rows, Catalogs, RowFilter};
use crate::state::{FieldValue, InputMap};

/// Sentinel option id for the "custom" escape hatch on catalog selects.
pub const CUSTOM_OPTION_ID: &str = "__custom__";

/// What kind of control a field renders as (and how it validates).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputKind {
    /// Visual group marker; never holds a value
    Section,
    Text,
    Number,
    Checkbox,
    Select,
    Textarea,
}

/// When a live edit should be pushed into the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum UpdateTrigger {
    /// On every keystroke
    #[default]
    Input,
    /// Only when the control loses focus
    Blur,
}

/// One `<option>` of a select field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

impl SelectOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        SelectOption {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// Binding of a select field to a row of another field's value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParentFilter {
    /// Field whose current value narrows this select's rows
    pub field_id: String,
    /// Catalog column the parent value is matched against
    pub column: String,
}

/// Catalog-binding rules for a select field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogBinding {
    /// Catalog id ("materials" or "machines")
    pub catalog_id: String,
    /// Job-type filter, when the select only covers one service's rows
    pub job_type_filter: Option<RowFilter>,
    /// Narrowing by another field's committed-or-live value
    pub parent_filter: Option<ParentFilter>,
    /// Project distinct values of one column instead of listing rows
    pub distinct_column: Option<String>,
    /// Column used as the option value
    pub value_column: String,
    /// Column used as the option label
    pub label_column: String,
    /// Whether a "custom" escape-hatch option is appended
    pub allow_custom: bool,
}

impl CatalogBinding {
    pub fn new(catalog_id: impl Into<String>) -> Self {
        CatalogBinding {
            catalog_id: catalog_id.into(),
            job_type_filter: None,
            parent_filter: None,
            distinct_column: None,
            value_column: String::new(),
            label_column: String::new(),
            allow_custom: false,
        }
    }

    pub fn job_type(mut self, column: impl Into<String>, expected: impl Into<String>) -> Self {
        self.job_type_filter = Some(RowFilter::new(column, expected));
        self
    }

    pub fn parent(mut self, field_id: impl Into<String>, column: impl Into<String>) -> Self {
        self.parent_filter = Some(ParentFilter {
            field_id: field_id.into(),
            column: column.into(),
        });
        self
    }

    pub fn distinct(mut self, column: impl Into<String>) -> Self {
        let column = column.into();
        self.value_column = column.clone();
        self.label_column = column.clone();
        self.distinct_column = Some(column);
        self
    }

    pub fn option_columns(
        mut self,
        value_column: impl Into<String>,
        label_column: impl Into<String>,
    ) -> Self {
        self.value_column = value_column.into();
        self.label_column = label_column.into();
        self
    }

    pub fn allow_custom(mut self) -> Self {
        self.allow_custom = true;
        self
    }
}

/// Static schema entry for one form field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub id: String,
    pub label: String,
    pub kind: InputKind,
    pub required: bool,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub min_len: Option<usize>,
    pub max_len: Option<usize>,
    pub placeholder: Option<String>,
    /// Static options (catalog-free selects)
    pub options: Vec<SelectOption>,
    pub catalog: Option<CatalogBinding>,
    pub update_on: UpdateTrigger,
}

impl FieldDescriptor {
    fn new(kind: InputKind, id: impl Into<String>, label: impl Into<String>) -> Self {
        FieldDescriptor {
            id: id.into(),
            label: label.into(),
            kind,
            required: false,
            min: None,
            max: None,
            min_len: None,
            max_len: None,
            placeholder: None,
            options: Vec::new(),
            catalog: None,
            update_on: UpdateTrigger::Input,
        }
    }

    pub fn section(id: impl Into<String>, label: impl Into<String>) -> Self {
        FieldDescriptor::new(InputKind::Section, id, label)
    }

    pub fn text(id: impl Into<String>, label: impl Into<String>) -> Self {
        FieldDescriptor::new(InputKind::Text, id, label)
    }

    pub fn number(id: impl Into<String>, label: impl Into<String>) -> Self {
        FieldDescriptor::new(InputKind::Number, id, label)
    }

    pub fn checkbox(id: impl Into<String>, label: impl Into<String>) -> Self {
        FieldDescriptor::new(InputKind::Checkbox, id, label)
    }

    pub fn select(id: impl Into<String>, label: impl Into<String>) -> Self {
        FieldDescriptor::new(InputKind::Select, id, label)
    }

    pub fn textarea(id: impl Into<String>, label: impl Into<String>) -> Self {
        FieldDescriptor::new(InputKind::Textarea, id, label)
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    pub fn min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    pub fn max(mut self, max: f64) -> Self {
        self.max = Some(max);
        self
    }

    pub fn min_len(mut self, min_len: usize) -> Self {
        self.min_len = Some(min_len);
        self
    }

    pub fn max_len(mut self, max_len: usize) -> Self {
        self.max_len = Some(max_len);
        self
    }

    /// Commit the live value only on blur (free-typing fields).
    pub fn on_blur(mut self) -> Self {
        self.update_on = UpdateTrigger::Blur;
        self
    }

    pub fn static_options(mut self, options: &[(&str, &str)]) -> Self {
        self.options = options
            .iter()
            .map(|(value, label)| SelectOption::new(*value, *label))
            .collect();
        self
    }

    pub fn catalog(mut self, binding: CatalogBinding) -> Self {
        self.catalog = Some(binding);
        self
    }
}

/// Validation verdict for a single field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validity {
    pub is_valid: bool,
    pub message: String,
}

impl Validity {
    fn valid() -> Self {
        Validity {
            is_valid: true,
            message: String::new(),
        }
    }

    fn invalid(message: impl Into<String>) -> Self {
        Validity {
            is_valid: false,
            message: message.into(),
        }
    }
}

/// Validate a single field value against its descriptor.
///
/// Pure and idempotent: no side effects, same verdict for the same input.
/// String values are trimmed before evaluation; flag values are exempt from
/// the required-text path (a present `false` is still a value).
pub fn validate_field(field: &FieldDescriptor, value: Option<&FieldValue>) -> Validity {
    if let Some(FieldValue::Flag(_)) = value {
        return Validity::valid();
    }

    let (text, is_textual) = match value {
        None => (String::new(), false),
        Some(FieldValue::Text(t)) => (t.trim().to_string(), true),
        Some(FieldValue::Number(n)) => (n.to_string(), false),
        Some(FieldValue::Flag(_)) => unreachable!("flags handled above"),
    };

    if text.is_empty() {
        if field.required {
            return Validity::invalid("This field is required.");
        }
        // Absence of an optional value is always acceptable.
        return Validity::valid();
    }

    if field.kind == InputKind::Number {
        let parsed = text.parse::<f64>();
        let number = match parsed {
            Ok(n) if n.is_finite() => n,
            _ => return Validity::invalid("Please enter a valid number."),
        };
        if let Some(min) = field.min {
            if number < min {
                return Validity::invalid(format!("Value must be at least {}.", min));
            }
        }
        if let Some(max) = field.max {
            if number > max {
                return Validity::invalid(format!("Value must be at most {}.", max));
            }
        }
    }

    // Length bounds apply to textual values only, independent of numeric checks.
    if is_textual {
        let length = text.chars().count();
        if let Some(min_len) = field.min_len {
            if length < min_len {
                return Validity::invalid(format!(
                    "Please enter at least {} characters.",
                    min_len
                ));
            }
        }
        if let Some(max_len) = field.max_len {
            if length > max_len {
                return Validity::invalid(format!(
                    "Please keep this under {} characters.",
                    max_len
                ));
            }
        }
    }

    Validity::valid()
}

/// Resolve the options of a select field against the loaded catalogs.
///
/// Static options win; catalog-bound fields apply the job-type filter, then
/// the parent-field filter (using the parent's current value from `inputs`),
/// then either a distinct-column projection or the value/label columns, and
/// finally the custom escape hatch when allowed.
pub fn resolve_options(
    field: &FieldDescriptor,
    catalogs: &Catalogs,
    inputs: &InputMap,
) -> Vec<SelectOption> {
    if !field.options.is_empty() {
        return field.options.clone();
    }

    let Some(binding) = &field.catalog else {
        return Vec::new();
    };

    let rows = catalogs.get_catalog(&binding.catalog_id);
    let mut filters = Vec::new();
    if let Some(filter) = &binding.job_type_filter {
        filters.push(filter.clone());
    }
    if let Some(parent) = &binding.parent_filter {
        let expected = inputs
            .get(&parent.field_id)
            .and_then(FieldValue::as_text)
            .unwrap_or("")
            .trim()
            .to_string();
        filters.push(RowFilter::new(parent.column.clone(), expected));
    }
    let matched = filter_rows(rows, &filters);

    let mut options: Vec<SelectOption> = if let Some(column) = &binding.distinct_column {
        distinct_values(&matched, column)
            .into_iter()
            .map(|value| SelectOption::new(value.clone(), value))
            .collect()
    } else {
        matched
            .iter()
            .map(|row| {
                SelectOption::new(row.text(&binding.value_column), row.text(&binding.label_column))
            })
            .collect()
    };

    if binding.allow_custom {
        options.push(SelectOption::new(CUSTOM_OPTION_ID, "Custom..."));
    }
    options
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::parse_catalog_csv;

    fn required_number() -> FieldDescriptor {
        FieldDescriptor::number("printHours", "Print hours").required()
    }

    #[test]
    fn test_required_empty_is_invalid() {
        let field = required_number();
        let verdict = validate_field(&field, None);
        assert!(!verdict.is_valid);
        assert_eq!(verdict.message, "This field is required.");

        let blank = FieldValue::Text("   ".to_string());
        assert!(!validate_field(&field, Some(&blank)).is_valid);
    }

    #[test]
    fn test_optional_empty_skips_further_checks() {
        let field = FieldDescriptor::number("printMinutes", "Print minutes").min(0.0);
        assert!(validate_field(&field, None).is_valid);
        let blank = FieldValue::Text(String::new());
        assert!(validate_field(&field, Some(&blank)).is_valid);
    }

    #[test]
    fn test_number_parsing_and_bounds() {
        let field = FieldDescriptor::number("profitMarginPercent", "Profit margin (%)")
            .required()
            .min(0.0)
            .max(99.0);

        let bad = FieldValue::Text("abc".to_string());
        assert_eq!(
            validate_field(&field, Some(&bad)).message,
            "Please enter a valid number."
        );

        let low = FieldValue::Text("-5".to_string());
        assert_eq!(
            validate_field(&field, Some(&low)).message,
            "Value must be at least 0."
        );

        let high = FieldValue::Text("150".to_string());
        assert_eq!(
            validate_field(&field, Some(&high)).message,
            "Value must be at most 99."
        );

        let ok = FieldValue::Text("30".to_string());
        assert!(validate_field(&field, Some(&ok)).is_valid);
    }

    #[test]
    fn test_length_bounds_on_text() {
        let field = FieldDescriptor::text("quoteName", "Quote name")
            .min_len(3)
            .max_len(5);
        let short = FieldValue::Text("ab".to_string());
        assert_eq!(
            validate_field(&field, Some(&short)).message,
            "Please enter at least 3 characters."
        );
        let long = FieldValue::Text("abcdef".to_string());
        assert_eq!(
            validate_field(&field, Some(&long)).message,
            "Please keep this under 5 characters."
        );
    }

    #[test]
    fn test_checkbox_false_passes_required() {
        let field = FieldDescriptor::checkbox("allowRush", "Allow rush option").required();
        let unchecked = FieldValue::Flag(false);
        assert!(validate_field(&field, Some(&unchecked)).is_valid);
    }

    #[test]
    fn test_validate_is_idempotent() {
        let field = required_number();
        let value = FieldValue::Text("2.5".to_string());
        let first = validate_field(&field, Some(&value));
        let second = validate_field(&field, Some(&value));
        assert_eq!(first, second);
    }

    #[test]
    fn test_resolve_options_with_parent_filter_and_custom() {
        let machines = parse_catalog_csv(
            "machines",
            "machine_id,machine_name,brand,job_type\n\
             mk4,Original MK4,Prusa,fdm printing\n\
             mini,Mini+,Prusa,fdm printing\n\
             x1c,X1 Carbon,Bambu Lab,fdm printing\n\
             scan1,Pop 3,Revopoint,3d scan\n",
        );
        let catalogs = Catalogs::from_rows(Vec::new(), machines);

        let brand = FieldDescriptor::select("printerBrand", "Printer brand").catalog(
            CatalogBinding::new("machines")
                .job_type("job_type", "fdm printing")
                .distinct("brand"),
        );
        let printer = FieldDescriptor::select("printerMachineId", "Printer").catalog(
            CatalogBinding::new("machines")
                .job_type("job_type", "fdm printing")
                .parent("printerBrand", "brand")
                .option_columns("machine_id", "machine_name")
                .allow_custom(),
        );

        let mut inputs = InputMap::new();
        let brands = resolve_options(&brand, &catalogs, &inputs);
        assert_eq!(brands.len(), 2);
        assert_eq!(brands[0].value, "Prusa");

        inputs.insert("printerBrand".to_string(), "Prusa".into());
        let printers = resolve_options(&printer, &catalogs, &inputs);
        let values: Vec<&str> = printers.iter().map(|o| o.value.as_str()).collect();
        assert_eq!(values, vec!["mk4", "mini", CUSTOM_OPTION_ID]);
    }

    #[test]
    fn test_resolve_options_empty_catalog_still_offers_custom() {
        let catalogs = Catalogs::new();
        let field = FieldDescriptor::select("scanMachineId", "Scanning machine").catalog(
            CatalogBinding::new("machines")
                .job_type("job_type", "3d scan")
                .option_columns("machine_id", "machine_name")
                .allow_custom(),
        );
        let options = resolve_options(&field, &catalogs, &InputMap::new());
        assert_eq!(options.len(), 1);
        assert_eq!(options[0].value, CUSTOM_OPTION_ID);
    }
}
