//! Field schema compiler.
//!
//! Turns the descriptor list delivered by the configuration source into a
//! [`FormSchema`]: one [`ValidationRule`] per field keyed by field name, plus
//! the resolved [`FieldSpec`]s in render order.
//!
//! Compilation is a pure function of its input. An empty descriptor list
//! compiles to an empty schema; that is a valid (if useless) form.
//!
//! ```
//! use form_engine::field::FieldDescriptor;
//! use form_engine::schema::{compile, ValidationRule};
//!
//! let schema = compile(&[
//!     FieldDescriptor::text("name", "Name").required(true),
//!     FieldDescriptor::number("age", "Age"),
//! ]);
//! assert_eq!(schema.len(), 2);
//! assert!(matches!(schema.rule("age"), Some(ValidationRule::Number { min: 0 })));
//! ```

use std::collections::BTreeMap;

use crate::field::{DefaultValue, FieldDescriptor, FieldSpec, FieldType};
use crate::settings::EngineSettings;
use crate::store::FieldErrors;
use crate::value::{FieldValue, FormValues, Numeric};

/// Validation rule derived 1:1 from a descriptor's declared type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationRule {
    /// Any boolean is accepted. `must_accept` carries the message used when a
    /// `false` value has to be rejected (required checkbox enforcement).
    Boolean { must_accept: Option<String> },
    /// Integer with a lower bound.
    Number { min: i64 },
    /// Non-empty string; `message` is shown when empty.
    RequiredText { message: String },
}

impl ValidationRule {
    pub fn for_descriptor(descriptor: &FieldDescriptor, settings: &EngineSettings) -> Self {
        match descriptor.field_type {
            FieldType::Checkbox => ValidationRule::Boolean {
                must_accept: (settings.enforce_required_checkbox && descriptor.required)
                    .then(|| format!("{} must be accepted", descriptor.label)),
            },
            FieldType::Number => ValidationRule::Number { min: 0 },
            FieldType::Text | FieldType::Other(_) => ValidationRule::RequiredText {
                message: format!("{} is required", descriptor.label),
            },
        }
    }

    /// Convert raw input into the value shape this rule validates.
    ///
    /// Number rules never keep text: input is read by its leading integer,
    /// and input without one becomes [`Numeric::NotANumber`].
    pub fn coerce(&self, value: FieldValue) -> FieldValue {
        match (self, value) {
            (ValidationRule::Number { .. }, FieldValue::Text(raw)) => {
                FieldValue::Number(Numeric::parse(&raw))
            }
            (ValidationRule::Number { .. }, FieldValue::Bool(_)) => {
                FieldValue::Number(Numeric::NotANumber)
            }
            (ValidationRule::Boolean { .. }, FieldValue::Text(raw)) => match raw.as_str() {
                "true" => FieldValue::Bool(true),
                "false" => FieldValue::Bool(false),
                _ => FieldValue::Text(raw),
            },
            (ValidationRule::RequiredText { .. }, FieldValue::Number(Numeric::Int(n))) => {
                FieldValue::Text(n.to_string())
            }
            (_, value) => value,
        }
    }

    /// Check a (coerced) value. `Err` carries the user-facing message.
    pub fn check(&self, value: &FieldValue) -> Result<(), String> {
        match self {
            ValidationRule::Boolean { must_accept } => match value {
                FieldValue::Bool(false) => match must_accept {
                    Some(msg) => Err(msg.clone()),
                    None => Ok(()),
                },
                FieldValue::Bool(true) => Ok(()),
                _ => Err("Expected a boolean".into()),
            },
            ValidationRule::Number { min } => match value {
                FieldValue::Number(Numeric::Int(n)) if n < min => {
                    Err(format!("Must be at least {min}"))
                }
                FieldValue::Number(Numeric::Int(_)) => Ok(()),
                _ => Err("Must be a number".into()),
            },
            ValidationRule::RequiredText { message } => match value {
                FieldValue::Text(s) if s.is_empty() => Err(message.clone()),
                FieldValue::Text(_) => Ok(()),
                _ => Err(message.clone()),
            },
        }
    }
}

/// Compiled form: rules keyed by name plus resolved fields in render order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormSchema {
    rules: BTreeMap<String, ValidationRule>,
    fields: Vec<FieldSpec>,
    defaults: FormValues,
}

impl FormSchema {
    pub fn rule(&self, name: &str) -> Option<&ValidationRule> {
        self.rules.get(name)
    }

    pub fn rules(&self) -> &BTreeMap<String, ValidationRule> {
        &self.rules
    }

    /// Resolved fields, ordered by descriptor `order` (list position when absent).
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Descriptor-derived initial values.
    pub fn defaults(&self) -> &FormValues {
        &self.defaults
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Run every rule against `values`. Missing values are validated as the
    /// field's default would be.
    pub fn validate(&self, values: &FormValues) -> FieldErrors {
        let mut errors = FieldErrors::default();
        for (name, rule) in &self.rules {
            let value = values
                .get(name)
                .or_else(|| self.defaults.get(name))
                .cloned()
                .unwrap_or_else(|| FieldValue::text(""));
            if let Err(msg) = rule.check(&value) {
                errors.set(name, msg);
            }
        }
        errors
    }
}

/// Compile descriptors with default engine settings.
pub fn compile(descriptors: &[FieldDescriptor]) -> FormSchema {
    compile_with(descriptors, &EngineSettings::default())
}

/// Compile descriptors into a schema.
pub fn compile_with(descriptors: &[FieldDescriptor], settings: &EngineSettings) -> FormSchema {
    let mut rules = BTreeMap::new();
    let mut defaults = FormValues::new();

    for d in descriptors {
        let rule = ValidationRule::for_descriptor(d, settings);
        defaults.insert(d.name.clone(), default_for(d, &rule));
        rules.insert(d.name.clone(), rule);
    }

    let mut ordered: Vec<(i32, &FieldDescriptor)> = descriptors
        .iter()
        .enumerate()
        .map(|(idx, d)| (d.order.unwrap_or(idx as i32), d))
        .collect();
    ordered.sort_by_key(|(order, _)| *order);

    FormSchema {
        rules,
        fields: ordered
            .into_iter()
            .map(|(_, d)| FieldSpec::from_descriptor(d))
            .collect(),
        defaults,
    }
}

/// `defaultValue`, then `checked`, then the empty string; coerced through the
/// field's rule so number and checkbox fields start with a typed value.
fn default_for(descriptor: &FieldDescriptor, rule: &ValidationRule) -> FieldValue {
    let raw = match (&descriptor.default_value, descriptor.checked) {
        (Some(DefaultValue::Text(s)), _) => FieldValue::text(s.clone()),
        (Some(DefaultValue::Flag(b)), _) => FieldValue::Bool(*b),
        (None, Some(checked)) => FieldValue::Bool(checked),
        (None, None) => FieldValue::text(""),
    };
    match (rule, raw) {
        (ValidationRule::Boolean { .. }, FieldValue::Text(s)) if s.is_empty() => {
            FieldValue::Bool(false)
        }
        (rule, raw) => rule.coerce(raw),
    }
}
