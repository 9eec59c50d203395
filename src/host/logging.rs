//! Logging host - stands in for the show-control host when running standalone

use super::{
    ActionDefinition, FeedbackDefinition, ModuleHost, PresetDefinition, VariableDefinition,
};
use crate::feedbacks::FeedbackId;
use crate::options::VariableParser;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Logs every host call and keeps the latest variable values for `$(atem:name)` substitution
#[derive(Default)]
pub struct LoggingHost {
    variables: RwLock<BTreeMap<String, String>>,
}

impl LoggingHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn variable(&self, name: &str) -> Option<String> {
        self.variables.read().get(name).cloned()
    }
}

impl VariableParser for LoggingHost {
    fn parse_variables(&self, text: &str) -> String {
        let variables = self.variables.read();
        let mut out = String::with_capacity(text.len());
        let mut rest = text;
        while let Some(start) = rest.find("$(atem:") {
            out.push_str(&rest[..start]);
            let after = &rest[start + "$(atem:".len()..];
            match after.find(')') {
                Some(end) => {
                    let name = &after[..end];
                    out.push_str(variables.get(name).map(String::as_str).unwrap_or(""));
                    rest = &after[end + 1..];
                }
                None => {
                    out.push_str(&rest[start..]);
                    rest = "";
                }
            }
        }
        out.push_str(rest);
        out
    }
}

impl ModuleHost for LoggingHost {
    fn set_action_definitions(&self, definitions: Vec<ActionDefinition>) {
        info!("📋 {} action definitions registered", definitions.len());
    }

    fn set_feedback_definitions(&self, definitions: Vec<FeedbackDefinition>) {
        info!("📋 {} feedback definitions registered", definitions.len());
    }

    fn set_variable_definitions(&self, definitions: Vec<VariableDefinition>) {
        info!("📋 {} variable definitions registered", definitions.len());
    }

    fn set_preset_definitions(&self, definitions: Vec<PresetDefinition>) {
        info!("📋 {} presets registered", definitions.len());
    }

    fn set_variable_values(&self, values: BTreeMap<String, String>) {
        for (name, value) in &values {
            debug!("  $(atem:{}) = '{}'", name, value);
        }
        self.variables.write().extend(values);
    }

    fn check_feedbacks(&self, feedbacks: &[FeedbackId]) {
        debug!("🔄 Check feedbacks: {:?}", feedbacks);
    }

    fn check_feedbacks_by_id(&self, instance_ids: &[String]) {
        debug!("🔄 Check feedback instances: {:?}", instance_ids);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_substitutes_known_variables() {
        let host = LoggingHost::new();
        let mut values = BTreeMap::new();
        values.insert("pgm1_input_id".to_string(), "3".to_string());
        host.set_variable_values(values);

        assert_eq!(host.parse_variables("$(atem:pgm1_input_id)"), "3");
        assert_eq!(host.parse_variables("x$(atem:nope)y"), "xy");
        assert_eq!(host.parse_variables("plain"), "plain");
        assert_eq!(host.parse_variables("$(atem:open"), "$(atem:open");
    }
}
