//! Option field specifications and value access
//!
//! Fields are declarative: the host renders them and hands back [`OptionValues`].

pub mod pickers;
pub mod routing;
mod values;

pub use values::{NoVariables, OptionValues, VariableParser};
pub(crate) use values::values_match;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One dropdown entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    pub id: Value,
    pub label: String,
}

impl Choice {
    pub fn new(id: impl Into<Value>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
        }
    }
}

/// Declarative description of one user-configurable input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum OptionField {
    Dropdown {
        id: String,
        label: String,
        default: Value,
        choices: Vec<Choice>,
    },
    MultiDropdown {
        id: String,
        label: String,
        default: Vec<Value>,
        choices: Vec<Choice>,
    },
    Number {
        id: String,
        label: String,
        default: f64,
        min: f64,
        max: f64,
        step: f64,
        range: bool,
    },
    #[serde(rename = "textinput")]
    TextInput {
        id: String,
        label: String,
        default: String,
        use_variables: bool,
    },
    Checkbox {
        id: String,
        label: String,
        default: bool,
    },
}

impl OptionField {
    pub fn id(&self) -> &str {
        match self {
            OptionField::Dropdown { id, .. }
            | OptionField::MultiDropdown { id, .. }
            | OptionField::Number { id, .. }
            | OptionField::TextInput { id, .. }
            | OptionField::Checkbox { id, .. } => id,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            OptionField::Dropdown { label, .. }
            | OptionField::MultiDropdown { label, .. }
            | OptionField::Number { label, .. }
            | OptionField::TextInput { label, .. }
            | OptionField::Checkbox { label, .. } => label,
        }
    }

    /// Dropdown entries; empty for non-dropdown fields
    pub fn choices(&self) -> &[Choice] {
        match self {
            OptionField::Dropdown { choices, .. } | OptionField::MultiDropdown { choices, .. } => {
                choices
            }
            _ => &[],
        }
    }

    /// The value a fresh instance starts with
    pub fn default_value(&self) -> Value {
        match self {
            OptionField::Dropdown { default, .. } => default.clone(),
            OptionField::MultiDropdown { default, .. } => Value::Array(default.clone()),
            OptionField::Number { default, .. } => Value::from(*default),
            OptionField::TextInput { default, .. } => Value::from(default.clone()),
            OptionField::Checkbox { default, .. } => Value::from(*default),
        }
    }

    pub fn dropdown(id: &str, label: &str, choices: Vec<Choice>) -> Self {
        let default = choices.first().map(|c| c.id.clone()).unwrap_or(Value::Null);
        OptionField::Dropdown {
            id: id.to_string(),
            label: label.to_string(),
            default,
            choices,
        }
    }

    pub fn number(id: &str, label: &str, default: f64, min: f64, max: f64, step: f64) -> Self {
        OptionField::Number {
            id: id.to_string(),
            label: label.to_string(),
            default,
            min,
            max,
            step,
            range: false,
        }
    }

    pub fn text(id: &str, label: &str, default: &str) -> Self {
        OptionField::TextInput {
            id: id.to_string(),
            label: label.to_string(),
            default: default.to_string(),
            use_variables: true,
        }
    }

    pub fn checkbox(id: &str, label: &str, default: bool) -> Self {
        OptionField::Checkbox {
            id: id.to_string(),
            label: label.to_string(),
            default,
        }
    }
}

/// Option values for a fresh instance of the given fields
pub fn default_values(fields: &[OptionField]) -> OptionValues {
    fields.iter().fold(OptionValues::new(), |values, field| {
        values.with(field.id(), field.default_value())
    })
}
