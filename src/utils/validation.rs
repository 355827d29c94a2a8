//! Trimming applied before `Validate` runs, the custom rules shared by the
//! forms, and flattening of `validator` errors into field names.

use std::borrow::Cow;
use std::collections::BTreeMap;

use validator::{ValidationError, ValidationErrors, ValidationErrorsKind};

pub fn trimmed(value: &str) -> String {
    value.trim().to_string()
}

/// Blank optional text collapses to `None`.
pub fn optional(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Custom rule: exact match against a closed vocabulary.
pub fn one_of(
    code: &'static str,
    message: &'static str,
    value: &str,
    allowed: &[&str],
) -> Result<(), ValidationError> {
    if allowed.contains(&value) {
        return Ok(());
    }
    let mut err = ValidationError::new(code);
    err.message = Some(Cow::Borrowed(message));
    err.add_param(Cow::Borrowed("value"), &value);
    Err(err)
}

/// Field name to messages. Nested structs are flattened into their fields,
/// matching the `#[serde(flatten)]` wire shape of the forms.
pub fn field_messages(errors: &ValidationErrors) -> BTreeMap<String, Vec<String>> {
    let mut fields = BTreeMap::new();
    collect(errors, &mut fields);
    fields
}

fn collect(errors: &ValidationErrors, fields: &mut BTreeMap<String, Vec<String>>) {
    for (field, kind) in errors.errors() {
        match kind {
            ValidationErrorsKind::Field(errs) => fields
                .entry(field.to_string())
                .or_default()
                .extend(errs.iter().map(describe)),
            ValidationErrorsKind::Struct(nested) => collect(nested, fields),
            ValidationErrorsKind::List(items) => {
                for nested in items.values() {
                    collect(nested, fields);
                }
            }
        }
    }
}

fn describe(err: &ValidationError) -> String {
    match &err.message {
        Some(message) => message.to_string(),
        None => err.code.to_string(),
    }
}
