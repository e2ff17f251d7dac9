//! Runtime values held by a form.
//!
//! `FieldValue` is the closed set of values a field can hold. Number fields
//! never hold unparsable text: raw input is coerced into [`Numeric`] by
//! reading its leading integer, and input without one becomes
//! [`Numeric::NotANumber`], a sentinel that always fails validation.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Numeric payload of a number field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Option<i64>", into = "Option<i64>")]
pub enum Numeric {
    Int(i64),
    /// Raw input that could not be parsed. Serialized as `null`.
    NotANumber,
}

impl Numeric {
    /// Parse raw user input by its leading integer: `"3.5"` is 3 and
    /// `"12kg"` is 12. Leading whitespace and one sign are allowed. Input
    /// with no leading digit, or one outside `i64`, is not-a-number.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim_start();
        let unsigned = trimmed.strip_prefix(|c| c == '+' || c == '-').unwrap_or(trimmed);
        let digits = unsigned
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(unsigned.len());
        if digits == 0 {
            return Numeric::NotANumber;
        }
        let sign = trimmed.len() - unsigned.len();
        trimmed[..sign + digits]
            .parse::<i64>()
            .map(Numeric::Int)
            .unwrap_or(Numeric::NotANumber)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Numeric::Int(n) => Some(*n),
            Numeric::NotANumber => None,
        }
    }
}

impl From<Option<i64>> for Numeric {
    fn from(value: Option<i64>) -> Self {
        value.map(Numeric::Int).unwrap_or(Numeric::NotANumber)
    }
}

impl From<Numeric> for Option<i64> {
    fn from(value: Numeric) -> Self {
        value.as_i64()
    }
}

/// A single field value.
///
/// Serialized untagged, so a `FormValues` snapshot is a plain JSON object
/// (`{"name": "Ada", "age": 25, "terms": true}`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Number(Numeric),
    Text(String),
}

impl FieldValue {
    pub fn text(value: impl Into<String>) -> Self {
        FieldValue::Text(value.into())
    }

    pub fn number(value: i64) -> Self {
        FieldValue::Number(Numeric::Int(value))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Numeric view of the value. Text is parsed the same way number inputs
    /// are, so a text `"25"` reads as 25.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Number(n) => n.as_i64(),
            FieldValue::Text(s) => Numeric::parse(s).as_i64(),
            FieldValue::Bool(_) => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) => f.write_str(s),
            FieldValue::Number(Numeric::Int(n)) => write!(f, "{n}"),
            FieldValue::Number(Numeric::NotANumber) => Ok(()),
            FieldValue::Bool(b) => write!(f, "{b}"),
        }
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
        FieldValue::Bool(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::number(value)
    }
}

/// Current values of a form, keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormValues(BTreeMap<String, FieldValue>);

impl FormValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.0.get(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: FieldValue) -> Option<FieldValue> {
        self.0.insert(name.into(), value)
    }

    pub fn remove(&mut self, name: &str) -> Option<FieldValue> {
        self.0.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldValue)> {
        self.0.iter()
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

impl FromIterator<(String, FieldValue)> for FormValues {
    fn from_iter<I: IntoIterator<Item = (String, FieldValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numeric_parse_reads_the_leading_integer() {
        assert_eq!(Numeric::parse("25"), Numeric::Int(25));
        assert_eq!(Numeric::parse(" -1 "), Numeric::Int(-1));
        assert_eq!(Numeric::parse("+7"), Numeric::Int(7));
        assert_eq!(Numeric::parse("3.5"), Numeric::Int(3));
        assert_eq!(Numeric::parse("-0.9"), Numeric::Int(0));
        assert_eq!(Numeric::parse("12kg"), Numeric::Int(12));
    }

    #[test]
    fn numeric_parse_without_leading_digit_is_not_a_number() {
        assert_eq!(Numeric::parse(""), Numeric::NotANumber);
        assert_eq!(Numeric::parse("abc"), Numeric::NotANumber);
        assert_eq!(Numeric::parse("-"), Numeric::NotANumber);
        assert_eq!(Numeric::parse(".5"), Numeric::NotANumber);
        assert_eq!(Numeric::parse("99999999999999999999"), Numeric::NotANumber);
    }

    #[test]
    fn values_serialize_as_plain_object() {
        let mut values = FormValues::new();
        values.insert("name", FieldValue::text("Ada"));
        values.insert("age", FieldValue::number(36));
        values.insert("broken", FieldValue::Number(Numeric::NotANumber));
        values.insert("terms", FieldValue::Bool(true));

        assert_eq!(
            values.to_json(),
            json!({"age": 36, "broken": null, "name": "Ada", "terms": true})
        );
    }

    #[test]
    fn values_deserialize_from_plain_object() {
        let values: FormValues =
            serde_json::from_value(json!({"age": 19, "name": "Bob", "ok": false})).unwrap();
        assert_eq!(values.get("age"), Some(&FieldValue::number(19)));
        assert_eq!(values.get("name"), Some(&FieldValue::text("Bob")));
        assert_eq!(values.get("ok"), Some(&FieldValue::Bool(false)));
    }

    #[test]
    fn not_a_number_displays_empty() {
        assert_eq!(FieldValue::Number(Numeric::NotANumber).to_string(), "");
        assert_eq!(FieldValue::number(7).to_string(), "7");
    }
}
