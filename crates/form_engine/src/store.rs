//! Form state store.
//!
//! Single source of truth for the editing state of a form:
//!   * current values (`FormValues`)
//!   * per-field validation errors (`FieldErrors`)
//!   * the dirty flag
//!   * the interaction counter
//!
//! `set_value` is synchronous: the value is coerced, stored and validated
//! before the call returns, so values and errors never disagree.
//!
//! Typical usage:
//! ```
//! use form_engine::field::FieldDescriptor;
//! use form_engine::schema::compile;
//! use form_engine::store::FormStore;
//!
//! let schema = compile(&[FieldDescriptor::text("name", "Name").required(true)]);
//! let mut store = FormStore::new(schema);
//! store.set_value("name", "").unwrap();
//! assert_eq!(store.errors().get("name"), Some("Name is required"));
//! assert_eq!(store.interactions(), 1);
//! ```

use std::collections::BTreeMap;

use serde::Serialize;

use crate::errors::FormError;
use crate::field::{FieldKind, FieldSpec};
use crate::schema::FormSchema;
use crate::value::{FieldValue, FormValues};
use crate::visibility::{self, Visibility};

/// Per-field validation messages. A missing key means the field is valid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(|s| s.as_str())
    }

    pub fn set(&mut self, name: &str, message: impl Into<String>) {
        self.0.insert(name.to_string(), message.into());
    }

    pub fn clear_field(&mut self, name: &str) {
        self.0.remove(name);
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.0.iter()
    }
}

/// Monotonic count of accepted user edits. Only reset, never decremented.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InteractionCounter(u64);

impl InteractionCounter {
    pub fn record(&mut self) {
        self.0 = self.0.saturating_add(1);
    }

    pub fn reset(&mut self) {
        self.0 = 0;
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}

/// Mutable editing state of one form.
#[derive(Debug, Clone, Default)]
pub struct FormStore {
    schema: FormSchema,
    values: FormValues,
    errors: FieldErrors,
    dirty: bool,
    interactions: InteractionCounter,
}

impl FormStore {
    /// Create a store for `schema`, initialized with the schema's defaults.
    pub fn new(schema: FormSchema) -> Self {
        let mut store = Self {
            schema,
            ..Self::default()
        };
        store.reset();
        store
    }

    pub fn schema(&self) -> &FormSchema {
        &self.schema
    }

    pub fn values(&self) -> &FormValues {
        &self.values
    }

    pub fn value(&self, name: &str) -> Option<&FieldValue> {
        self.values.get(name)
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn interactions(&self) -> u64 {
        self.interactions.get()
    }

    /// Replace all values, clearing errors, the dirty flag and the counter.
    pub fn initialize(&mut self, defaults: FormValues) {
        self.values = defaults;
        self.errors.clear();
        self.dirty = false;
        self.interactions.reset();
    }

    /// Re-initialize with the schema's defaults.
    pub fn reset(&mut self) {
        let defaults = self.schema.defaults().clone();
        self.initialize(defaults);
    }

    /// Extra fields visible for the current values.
    pub fn visibility(&self) -> Visibility {
        visibility::resolve(&self.schema, &self.values)
    }

    /// Apply one user edit.
    ///
    /// Rejected edits leave the store untouched and are not counted.
    pub fn set_value(
        &mut self,
        name: &str,
        value: impl Into<FieldValue>,
    ) -> Result<(), FormError> {
        let spec = self.editable_field(name)?;
        let value = match &spec.kind {
            FieldKind::Select { options } => {
                let choice = value.into().to_string();
                if !choice.is_empty() && !options.contains(&choice) {
                    return Err(FormError::InvalidOption {
                        name: name.to_string(),
                        value: choice,
                    });
                }
                FieldValue::Text(choice)
            }
            _ => match self.schema.rule(name) {
                Some(rule) => rule.coerce(value.into()),
                None => value.into(),
            },
        };

        match self.schema.rule(name).map(|rule| rule.check(&value)) {
            Some(Err(msg)) => self.errors.set(name, msg),
            _ => self.errors.clear_field(name),
        }
        self.values.insert(name, value);
        self.dirty = true;
        self.interactions.record();

        // Fields that just became hidden must not keep stale errors around.
        if !self.visibility().is_visible(visibility::CONTACT_METHOD_FIELD) {
            self.errors.clear_field(visibility::CONTACT_METHOD_FIELD);
        }
        Ok(())
    }

    /// Validate every visible field, replacing the error map.
    /// Returns the number of failing fields.
    pub fn validate_all(&mut self) -> usize {
        let mut errors = self.schema.validate(&self.values);
        // Fields the user cannot edit would otherwise block submission forever.
        for field in self.schema.fields() {
            if field.disabled || !field.kind.is_supported() {
                errors.clear_field(&field.name);
            }
        }
        for field in self.visibility().fields() {
            if let FieldKind::Select { options } = &field.kind {
                let choice = self
                    .values
                    .get(&field.name)
                    .map(|v| v.to_string())
                    .unwrap_or_default();
                if !choice.is_empty() && !options.contains(&choice) {
                    errors.set(&field.name, format!("Choose one of: {}", options.join(", ")));
                }
            }
        }
        self.errors = errors;
        self.errors.len()
    }

    /// Values as they would be submitted: schema fields plus visible
    /// conditional fields. Hidden conditional fields are left out.
    pub fn snapshot(&self) -> FormValues {
        let visible = self.visibility();
        self.values
            .iter()
            .filter(|(name, _)| !visibility::is_conditional(name) || visible.is_visible(name))
            .map(|(name, value)| (name.clone(), value.clone()))
            .chain(
                visible
                    .fields()
                    .iter()
                    .filter(|f| !self.values.contains(&f.name))
                    .map(|f| (f.name.clone(), FieldValue::text(""))),
            )
            .collect()
    }

    fn editable_field(&self, name: &str) -> Result<FieldSpec, FormError> {
        let spec = match self.schema.field(name) {
            Some(spec) => spec.clone(),
            None => match self.visibility().field(name) {
                Some(spec) => spec.clone(),
                None if visibility::is_conditional(name) => {
                    return Err(FormError::FieldHidden(name.to_string()));
                }
                None => return Err(FormError::UnknownField(name.to_string())),
            },
        };
        if spec.disabled {
            return Err(FormError::FieldDisabled(name.to_string()));
        }
        if let FieldKind::Unsupported { variant, .. } = &spec.kind {
            return Err(FormError::UnsupportedVariant {
                name: name.to_string(),
                variant: variant.clone(),
            });
        }
        Ok(spec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{FieldDescriptor, FieldType, FieldVariant};
    use crate::schema::compile;
    use crate::value::Numeric;
    use crate::visibility::CONTACT_METHOD_FIELD;

    fn store() -> FormStore {
        FormStore::new(compile(&[
            FieldDescriptor::text("name", "Full name").required(true),
            FieldDescriptor::number("age_x", "Age"),
            FieldDescriptor::checkbox("terms", "Terms"),
            FieldDescriptor::text("locked", "Locked").disabled(true),
            FieldDescriptor::new(
                "odd",
                "Odd",
                FieldType::Text,
                FieldVariant::Other("Radio".into()),
            ),
        ]))
    }

    #[test]
    fn empty_text_yields_required_message() {
        let mut s = store();
        s.set_value("name", "Ada").unwrap();
        assert_eq!(s.errors().get("name"), None);
        s.set_value("name", "").unwrap();
        assert_eq!(s.errors().get("name"), Some("Full name is required"));
    }

    #[test]
    fn number_input_is_coerced_before_validation() {
        let mut s = store();
        s.set_value("age_x", "25").unwrap();
        assert_eq!(s.value("age_x"), Some(&FieldValue::number(25)));
        assert_eq!(s.errors().get("age_x"), None);

        s.set_value("age_x", "-1").unwrap();
        assert_eq!(s.errors().get("age_x"), Some("Must be at least 0"));

        s.set_value("age_x", "twenty").unwrap();
        assert_eq!(
            s.value("age_x"),
            Some(&FieldValue::Number(Numeric::NotANumber))
        );
        assert_eq!(s.errors().get("age_x"), Some("Must be a number"));

        s.set_value("age_x", "18.9").unwrap();
        assert_eq!(s.value("age_x"), Some(&FieldValue::number(18)));
        assert_eq!(s.errors().get("age_x"), None);
    }

    #[test]
    fn every_accepted_change_counts_and_dirties() {
        let mut s = store();
        assert!(!s.is_dirty());
        s.set_value("name", "A").unwrap();
        s.set_value("terms", true).unwrap();
        s.set_value("terms", false).unwrap();
        assert!(s.is_dirty());
        assert_eq!(s.interactions(), 3);
    }

    #[test]
    fn rejected_changes_do_not_count() {
        let mut s = store();
        assert_eq!(
            s.set_value("nope", "x"),
            Err(FormError::UnknownField("nope".into()))
        );
        assert_eq!(
            s.set_value("locked", "x"),
            Err(FormError::FieldDisabled("locked".into()))
        );
        assert!(matches!(
            s.set_value("odd", "x"),
            Err(FormError::UnsupportedVariant { .. })
        ));
        assert_eq!(
            s.set_value(CONTACT_METHOD_FIELD, "email"),
            Err(FormError::FieldHidden(CONTACT_METHOD_FIELD.into()))
        );
        assert_eq!(s.interactions(), 0);
        assert!(!s.is_dirty());
    }

    #[test]
    fn contact_method_editable_once_visible() {
        let mut s = store();
        s.set_value("age_x", FieldValue::number(19)).unwrap();
        s.set_value(CONTACT_METHOD_FIELD, "email").unwrap();
        assert_eq!(
            s.set_value(CONTACT_METHOD_FIELD, "fax"),
            Err(FormError::InvalidOption {
                name: CONTACT_METHOD_FIELD.into(),
                value: "fax".into()
            })
        );
        assert_eq!(s.snapshot().get(CONTACT_METHOD_FIELD), Some(&FieldValue::text("email")));
        assert_eq!(s.interactions(), 2);
    }

    #[test]
    fn hidden_contact_method_is_left_out_of_snapshot() {
        let mut s = store();
        s.set_value("age_x", FieldValue::number(30)).unwrap();
        s.set_value(CONTACT_METHOD_FIELD, "phone").unwrap();
        s.set_value("age_x", FieldValue::number(12)).unwrap();
        assert!(!s.snapshot().contains(CONTACT_METHOD_FIELD));
        // The value is kept; it simply does not count while hidden.
        assert!(s.values().contains(CONTACT_METHOD_FIELD));
    }

    #[test]
    fn visible_but_unset_contact_method_snapshots_empty() {
        let mut s = store();
        s.set_value("age_x", FieldValue::number(40)).unwrap();
        assert_eq!(s.snapshot().get(CONTACT_METHOD_FIELD), Some(&FieldValue::text("")));
    }

    #[test]
    fn reset_restores_defaults_and_counter() {
        let mut s = store();
        s.set_value("name", "").unwrap();
        s.set_value("age_x", "-5").unwrap();
        s.set_value("terms", true).unwrap();
        assert_eq!(s.interactions(), 3);

        s.reset();
        assert_eq!(s.interactions(), 0);
        assert!(!s.is_dirty());
        assert!(s.errors().is_empty());
        assert_eq!(s.values(), s.schema().defaults());
    }

    #[test]
    fn validate_all_fills_errors_for_untouched_fields() {
        let mut s = store();
        let failing = s.validate_all();
        assert_eq!(s.errors().get("name"), Some("Full name is required"));
        assert_eq!(s.errors().get("age_x"), Some("Must be a number"));
        // `locked` and `odd` cannot be edited, so they are not held against the form.
        assert_eq!(s.errors().get("locked"), None);
        assert_eq!(s.errors().get("odd"), None);
        assert_eq!(failing, 2);
    }
}
