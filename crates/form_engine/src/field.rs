//! Field descriptors and resolved field kinds.
//!
//! This module defines the declarative pieces of the engine:
//! - `FieldDescriptor`: one field as delivered by the configuration source
//! - `FieldType` / `FieldVariant`: the raw wire tags of a descriptor
//! - `FieldKind`: the closed set of renderable kinds a descriptor resolves to
//! - `FieldSpec`: a descriptor after resolution, ready for rendering
//!
//! Usage:
//! ```
//! use form_engine::field::{FieldDescriptor, FieldKind};
//!
//! let field = FieldDescriptor::number("age_12345", "Age")
//!     .required(true)
//!     .placeholder("Enter your age");
//! assert_eq!(field.kind(), FieldKind::NumberInput);
//! ```

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{EnumIter, IntoEnumIterator, IntoStaticStr};

use crate::errors::FormError;

/// Declared data type of a field (`type` on the wire).
///
/// Unknown wire values are kept verbatim in `Other` so they can be reported.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FieldType {
    Text,
    Number,
    Checkbox,
    Other(String),
}

impl FieldType {
    pub fn as_str(&self) -> &str {
        match self {
            FieldType::Text => "text",
            FieldType::Number => "number",
            FieldType::Checkbox => "checkbox",
            FieldType::Other(s) => s.as_str(),
        }
    }
}

impl From<String> for FieldType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "text" => FieldType::Text,
            "number" => FieldType::Number,
            "checkbox" => FieldType::Checkbox,
            _ => FieldType::Other(value),
        }
    }
}

impl From<FieldType> for String {
    fn from(value: FieldType) -> Self {
        value.as_str().to_string()
    }
}

/// Requested input widget (`variant` on the wire).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FieldVariant {
    Input,
    Checkbox,
    Other(String),
}

impl FieldVariant {
    pub fn as_str(&self) -> &str {
        match self {
            FieldVariant::Input => "Input",
            FieldVariant::Checkbox => "Checkbox",
            FieldVariant::Other(s) => s.as_str(),
        }
    }
}

impl From<String> for FieldVariant {
    fn from(value: String) -> Self {
        match value.as_str() {
            "Input" => FieldVariant::Input,
            "Checkbox" => FieldVariant::Checkbox,
            _ => FieldVariant::Other(value),
        }
    }
}

impl From<FieldVariant> for String {
    fn from(value: FieldVariant) -> Self {
        value.as_str().to_string()
    }
}

/// Default value as written in the configuration (`string | bool`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DefaultValue {
    Flag(bool),
    Text(String),
}

/// Declarative description of one form field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDescriptor {
    pub name: String,
    pub label: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub variant: FieldVariant,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<DefaultValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checked: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<i32>,
}

impl FieldDescriptor {
    pub fn new(
        name: impl Into<String>,
        label: impl Into<String>,
        field_type: FieldType,
        variant: FieldVariant,
    ) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            field_type,
            variant,
            required: false,
            default_value: None,
            checked: None,
            placeholder: None,
            disabled: false,
            description: None,
            order: None,
        }
    }

    pub fn text(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(name, label, FieldType::Text, FieldVariant::Input)
    }

    pub fn number(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(name, label, FieldType::Number, FieldVariant::Input)
    }

    pub fn checkbox(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(name, label, FieldType::Checkbox, FieldVariant::Checkbox)
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn default_value(mut self, value: DefaultValue) -> Self {
        self.default_value = Some(value);
        self
    }

    pub fn checked(mut self, checked: bool) -> Self {
        self.checked = Some(checked);
        self
    }

    pub fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    pub fn order(mut self, order: i32) -> Self {
        self.order = Some(order);
        self
    }

    /// Resolve the (type, variant) pair into a renderable kind.
    pub fn kind(&self) -> FieldKind {
        match (&self.field_type, &self.variant) {
            (FieldType::Text, FieldVariant::Input) => FieldKind::TextInput,
            (FieldType::Number, FieldVariant::Input) => FieldKind::NumberInput,
            (FieldType::Checkbox, FieldVariant::Checkbox) => FieldKind::Checkbox,
            (field_type, variant) => FieldKind::Unsupported {
                field_type: field_type.as_str().to_string(),
                variant: variant.as_str().to_string(),
            },
        }
    }
}

/// Options of the preferred contact method selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum ContactMethod {
    Email,
    Phone,
}

impl ContactMethod {
    pub fn options() -> Vec<String> {
        ContactMethod::iter()
            .map(|m| <&'static str>::from(m).to_string())
            .collect()
    }
}

/// Renderable kind of a field.
///
/// Notes:
/// - Text / Number render as single-line editors
/// - Checkbox toggles
/// - Select cycles through its options; only produced by the visibility resolver
/// - Unsupported keeps the field visible with a diagnostic instead of an editor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    TextInput,
    NumberInput,
    Checkbox,
    Select { options: Vec<String> },
    Unsupported { field_type: String, variant: String },
}

impl FieldKind {
    /// True if the field is edited through a text editor.
    pub fn is_textual(&self) -> bool {
        matches!(self, FieldKind::TextInput | FieldKind::NumberInput)
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, FieldKind::Unsupported { .. })
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::TextInput => f.write_str("text"),
            FieldKind::NumberInput => f.write_str("number"),
            FieldKind::Checkbox => f.write_str("checkbox"),
            FieldKind::Select { .. } => f.write_str("select"),
            FieldKind::Unsupported { variant, .. } => {
                write!(f, "Unsupported field variant: {variant}")
            }
        }
    }
}

/// A field after resolution: what the surface renders and the store edits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: String,
    pub label: String,
    pub kind: FieldKind,
    pub required: bool,
    pub placeholder: Option<String>,
    pub disabled: bool,
    pub description: Option<String>,
}

impl FieldSpec {
    pub fn from_descriptor(descriptor: &FieldDescriptor) -> Self {
        Self {
            name: descriptor.name.clone(),
            label: descriptor.label.clone(),
            kind: descriptor.kind(),
            required: descriptor.required,
            placeholder: descriptor.placeholder.clone(),
            disabled: descriptor.disabled,
            description: descriptor.description.clone(),
        }
    }
}

/// Reject descriptor lists that reuse a field name.
pub fn check_unique_names(descriptors: &[FieldDescriptor]) -> Result<(), FormError> {
    let mut seen = HashSet::new();
    for d in descriptors {
        if !seen.insert(d.name.as_str()) {
            return Err(FormError::DuplicateField(d.name.clone()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn descriptor_deserializes_wire_format() {
        let d: FieldDescriptor = serde_json::from_value(json!({
            "label": "Age",
            "name": "age_12345",
            "type": "number",
            "variant": "Input",
            "required": true,
            "placeholder": "Enter your age"
        }))
        .unwrap();
        assert_eq!(d.field_type, FieldType::Number);
        assert_eq!(d.variant, FieldVariant::Input);
        assert!(d.required);
        assert!(!d.disabled);
        assert_eq!(d.placeholder.as_deref(), Some("Enter your age"));
        assert_eq!(d.kind(), FieldKind::NumberInput);
    }

    #[test]
    fn default_value_accepts_string_or_bool() {
        let d: FieldDescriptor = serde_json::from_value(json!({
            "label": "Terms", "name": "t", "type": "checkbox",
            "variant": "Checkbox", "defaultValue": true
        }))
        .unwrap();
        assert_eq!(d.default_value, Some(DefaultValue::Flag(true)));
    }

    #[test]
    fn mismatched_pairs_are_unsupported() {
        let d = FieldDescriptor::new("x", "X", FieldType::Checkbox, FieldVariant::Input);
        assert_eq!(
            d.kind(),
            FieldKind::Unsupported {
                field_type: "checkbox".into(),
                variant: "Input".into()
            }
        );

        let d = FieldDescriptor::new(
            "y",
            "Y",
            FieldType::Text,
            FieldVariant::Other("Slider".into()),
        );
        assert_eq!(d.kind().to_string(), "Unsupported field variant: Slider");
    }

    #[test]
    fn unknown_type_round_trips_verbatim() {
        let d: FieldDescriptor = serde_json::from_value(json!({
            "label": "Mail", "name": "m", "type": "email", "variant": "Input"
        }))
        .unwrap();
        assert_eq!(d.field_type, FieldType::Other("email".into()));
        assert_eq!(serde_json::to_value(&d).unwrap()["type"], json!("email"));
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let fields = vec![
            FieldDescriptor::text("a", "A"),
            FieldDescriptor::number("a", "Again"),
        ];
        assert!(matches!(
            check_unique_names(&fields),
            Err(FormError::DuplicateField(name)) if name == "a"
        ));
    }

    #[test]
    fn contact_options_are_lowercase() {
        assert_eq!(ContactMethod::options(), vec!["email", "phone"]);
    }
}
