//! Conditional visibility resolver.
//!
//! Derives the fields shown in addition to the descriptor list. There is
//! exactly one rule: the preferred contact method selector appears once the
//! age field holds a number strictly greater than 18.
//!
//! Resolution is a pure function of the schema and the current values and is
//! re-run on every read; nothing is cached.

use crate::field::{ContactMethod, FieldKind, FieldSpec};
use crate::schema::FormSchema;
use crate::value::FormValues;

pub const CONTACT_METHOD_FIELD: &str = "contact_method";
pub const AGE_FIELD_PREFIX: &str = "age";
pub const AGE_THRESHOLD: i64 = 18;

/// Extra fields visible for a given set of values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Visibility {
    extra: Vec<FieldSpec>,
}

impl Visibility {
    pub fn fields(&self) -> &[FieldSpec] {
        &self.extra
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.extra.iter().find(|f| f.name == name)
    }

    pub fn is_visible(&self, name: &str) -> bool {
        self.field(name).is_some()
    }
}

/// True for names that only exist through a visibility rule.
pub fn is_conditional(name: &str) -> bool {
    name == CONTACT_METHOD_FIELD
}

/// The field whose value drives the contact method rule: the first number
/// input named `age…`.
pub fn age_field(schema: &FormSchema) -> Option<&FieldSpec> {
    schema
        .fields()
        .iter()
        .find(|f| f.kind == FieldKind::NumberInput && f.name.starts_with(AGE_FIELD_PREFIX))
}

pub fn contact_method_field() -> FieldSpec {
    FieldSpec {
        name: CONTACT_METHOD_FIELD.to_string(),
        label: "Preferred Contact Method".to_string(),
        kind: FieldKind::Select {
            options: ContactMethod::options(),
        },
        required: false,
        placeholder: Some("Select contact method".to_string()),
        disabled: false,
        description: None,
    }
}

pub fn resolve(schema: &FormSchema, values: &FormValues) -> Visibility {
    let adult = age_field(schema)
        .and_then(|f| values.get(&f.name))
        .and_then(|v| v.as_i64())
        .is_some_and(|age| age > AGE_THRESHOLD);

    let mut extra = Vec::new();
    if adult {
        extra.push(contact_method_field());
    }
    Visibility { extra }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldDescriptor;
    use crate::schema::compile;
    use crate::value::{FieldValue, Numeric};

    fn schema() -> FormSchema {
        compile(&[
            FieldDescriptor::text("name", "Name"),
            FieldDescriptor::number("age_x", "Age"),
        ])
    }

    fn with_age(age: FieldValue) -> FormValues {
        let mut values = FormValues::new();
        values.insert("age_x", age);
        values
    }

    #[test]
    fn contact_method_visible_only_above_eighteen() {
        let schema = schema();
        for (age, visible) in [(0, false), (18, false), (19, true), (25, true)] {
            let vis = resolve(&schema, &with_age(FieldValue::number(age)));
            assert_eq!(
                vis.is_visible(CONTACT_METHOD_FIELD),
                visible,
                "age {age}"
            );
        }
    }

    #[test]
    fn non_numeric_age_hides_contact_method() {
        let schema = schema();
        let vis = resolve(&schema, &with_age(FieldValue::Number(Numeric::NotANumber)));
        assert!(!vis.is_visible(CONTACT_METHOD_FIELD));
        let vis = resolve(&schema, &FormValues::new());
        assert!(!vis.is_visible(CONTACT_METHOD_FIELD));
    }

    #[test]
    fn no_age_field_means_never_visible() {
        let schema = compile(&[FieldDescriptor::number("height", "Height")]);
        let mut values = FormValues::new();
        values.insert("height", FieldValue::number(190));
        assert!(resolve(&schema, &values).fields().is_empty());
    }

    #[test]
    fn contact_method_is_an_optional_select() {
        let field = contact_method_field();
        assert!(!field.required);
        assert_eq!(
            field.kind,
            FieldKind::Select {
                options: vec!["email".into(), "phone".into()]
            }
        );
    }
}
