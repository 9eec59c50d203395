//! Option values chosen by the user for one action or feedback instance
//!
//! Values arrive as loosely typed JSON (the host may store numbers as strings). Getters coerce and
//! bound-check; free-text getters first run the text through the host's variable parser and use
//! 1-based numbering, as typed by a person.

use crate::error::OptionError;
use crate::models::ModelSpec;
use crate::sources::SourceContext;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Placeholder substitution, provided by the host
pub trait VariableParser {
    fn parse_variables(&self, text: &str) -> String;
}

/// Identity parser, for contexts without a host
pub struct NoVariables;

impl VariableParser for NoVariables {
    fn parse_variables(&self, text: &str) -> String {
        text.to_string()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OptionValues(pub BTreeMap<String, Value>);

impl OptionValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.0.insert(key.to_string(), value.into());
        self
    }

    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.0.insert(key.to_string(), value.into());
    }

    pub fn raw(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn number(&self, key: &str) -> Result<f64, OptionError> {
        let value = self
            .raw(key)
            .ok_or_else(|| OptionError::Missing(key.to_string()))?;
        value_as_number(value).ok_or_else(|| OptionError::NotANumber {
            key: key.to_string(),
            value: value_to_text(value),
        })
    }

    pub fn number_or(&self, key: &str, default: f64) -> f64 {
        self.number(key).unwrap_or(default)
    }

    /// A 0-based dropdown index, bounded by `count`
    pub fn index(&self, key: &str, count: usize) -> Result<u8, OptionError> {
        let value = self.integer(key)?;
        bounded(key, value, count)
    }

    /// A 0-based index allowed to exceed `u8` (macros, stills)
    pub fn index_u16(&self, key: &str, count: usize) -> Result<u16, OptionError> {
        let value = self.integer(key)?;
        if value < 0 || value >= count as i64 {
            return Err(OptionError::OutOfRange {
                key: key.to_string(),
                value,
                max: count as i64 - 1,
            });
        }
        Ok(value as u16)
    }

    pub fn integer(&self, key: &str) -> Result<i64, OptionError> {
        let n = self.number(key)?;
        if n.fract() != 0.0 {
            return Err(OptionError::NotANumber {
                key: key.to_string(),
                value: n.to_string(),
            });
        }
        Ok(n as i64)
    }

    pub fn boolean(&self, key: &str) -> Result<bool, OptionError> {
        match self.raw(key) {
            Some(Value::Bool(b)) => Ok(*b),
            Some(Value::String(s)) if s == "true" => Ok(true),
            Some(Value::String(s)) if s == "false" => Ok(false),
            Some(Value::Number(n)) => Ok(n.as_f64().is_some_and(|n| n != 0.0)),
            Some(other) => Err(OptionError::UnknownChoice {
                key: key.to_string(),
                value: value_to_text(other),
            }),
            None => Err(OptionError::Missing(key.to_string())),
        }
    }

    pub fn text(&self, key: &str) -> Result<String, OptionError> {
        self.raw(key)
            .map(value_to_text)
            .ok_or_else(|| OptionError::Missing(key.to_string()))
    }

    /// Parse a strum-named choice
    pub fn choice<T: std::str::FromStr>(&self, key: &str) -> Result<T, OptionError> {
        let text = self.text(key)?;
        text.parse().map_err(|_| OptionError::UnknownChoice {
            key: key.to_string(),
            value: text,
        })
    }

    /// Multi-select values as strings
    pub fn list(&self, key: &str) -> Vec<String> {
        match self.raw(key) {
            Some(Value::Array(items)) => items.iter().map(value_to_text).collect(),
            Some(Value::Null) | None => Vec::new(),
            Some(other) => vec![value_to_text(other)],
        }
    }

    /// A source id valid for `context` on `model`
    pub fn source(
        &self,
        key: &str,
        model: &ModelSpec,
        context: SourceContext,
    ) -> Result<u16, OptionError> {
        let value = self.integer(key)?;
        checked_source(key, value, model, context)
    }

    /// Free-text 1-based index, after variable substitution
    pub fn resolve_index(
        &self,
        key: &str,
        count: usize,
        parser: &dyn VariableParser,
    ) -> Result<u8, OptionError> {
        let value = self.resolve_integer(key, parser)?;
        bounded(key, value - 1, count)
    }

    /// Free-text source id, after variable substitution
    pub fn resolve_source(
        &self,
        key: &str,
        model: &ModelSpec,
        context: SourceContext,
        parser: &dyn VariableParser,
    ) -> Result<u16, OptionError> {
        let value = self.resolve_integer(key, parser)?;
        checked_source(key, value, model, context)
    }

    fn resolve_integer(&self, key: &str, parser: &dyn VariableParser) -> Result<i64, OptionError> {
        let raw = self.text(key)?;
        let resolved = parser.parse_variables(&raw);
        let trimmed = resolved.trim();
        trimmed.parse::<i64>().map_err(|_| OptionError::NotANumber {
            key: key.to_string(),
            value: resolved.clone(),
        })
    }
}

fn bounded(key: &str, value: i64, count: usize) -> Result<u8, OptionError> {
    if value < 0 || value >= count as i64 || value > i64::from(u8::MAX) {
        return Err(OptionError::OutOfRange {
            key: key.to_string(),
            value,
            max: count as i64 - 1,
        });
    }
    Ok(value as u8)
}

fn checked_source(
    key: &str,
    value: i64,
    model: &ModelSpec,
    context: SourceContext,
) -> Result<u16, OptionError> {
    let id = u16::try_from(value).map_err(|_| OptionError::OutOfRange {
        key: key.to_string(),
        value,
        max: i64::from(u16::MAX),
    })?;
    match model.input(id) {
        Some(input) if context.allows(input) => Ok(id),
        _ => Err(OptionError::InvalidSource { source_id: id }),
    }
}

fn value_as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

pub(crate) fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Loose equality used when matching option values against indices: `1`, `1.0` and `"1"` agree
pub(crate) fn values_match(a: &Value, b: &Value) -> bool {
    match (value_as_number(a), value_as_number(b)) {
        (Some(x), Some(y)) => (x - y).abs() < f64::EPSILON,
        _ => value_to_text(a) == value_to_text(b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{get_model_spec, ModelId};
    use serde_json::json;

    struct Vars;
    impl VariableParser for Vars {
        fn parse_variables(&self, text: &str) -> String {
            text.replace("$(internal:me)", "2").replace("$(internal:src)", "1000")
        }
    }

    #[test]
    fn test_coercion() {
        let opts = OptionValues::new()
            .with("a", 3)
            .with("b", "4")
            .with("c", "x")
            .with("d", 2.5);
        assert_eq!(opts.integer("a"), Ok(3));
        assert_eq!(opts.integer("b"), Ok(4));
        assert!(matches!(opts.integer("c"), Err(OptionError::NotANumber { .. })));
        assert!(matches!(opts.integer("d"), Err(OptionError::NotANumber { .. })));
        assert_eq!(opts.integer("z"), Err(OptionError::Missing("z".into())));
    }

    #[test]
    fn test_index_is_bounded_by_model_count() {
        let opts = OptionValues::new().with("aux", 3);
        assert_eq!(opts.index("aux", 6), Ok(3));
        assert!(matches!(opts.index("aux", 3), Err(OptionError::OutOfRange { .. })));
    }

    #[test]
    fn test_free_text_resolution() {
        let model = get_model_spec(ModelId::TWO_ME).unwrap();
        let opts = OptionValues::new()
            .with("me", "$(internal:me)")
            .with("src", "$(internal:src)")
            .with("bad", "cam")
            .with("zero", "0");
        assert_eq!(opts.resolve_index("me", 2, &Vars), Ok(1));
        assert_eq!(
            opts.resolve_source("src", model, SourceContext::MixEffect(0), &Vars),
            Ok(1000)
        );
        assert!(opts.resolve_index("bad", 2, &Vars).is_err());
        assert!(opts.resolve_index("zero", 2, &Vars).is_err());
    }

    #[test]
    fn test_source_must_exist_in_context() {
        let model = get_model_spec(ModelId::TWO_ME).unwrap();
        let opts = OptionValues::new().with("input", 10010).with("other", 9999);
        assert!(opts.source("input", model, SourceContext::MixEffect(0)).is_err());
        assert_eq!(opts.source("input", model, SourceContext::MixEffect(1)), Ok(10010));
        assert!(opts.source("other", model, SourceContext::All).is_err());
    }

    #[test]
    fn test_loose_match() {
        assert!(values_match(&json!(1), &json!("1")));
        assert!(values_match(&json!("1:-65280"), &json!("1:-65280")));
        assert!(!values_match(&json!(0), &json!(1)));
    }
}
