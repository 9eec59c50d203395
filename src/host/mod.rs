//! Host framework boundary
//!
//! The show-control host owns buttons, triggers and variables. This crate hands it declarative
//! definitions and asks it to re-evaluate feedbacks; the host calls back into
//! [`crate::engine::AtemInstance`] to run actions and evaluate feedbacks.

mod logging;

pub use logging::LoggingHost;

use crate::actions::ActionId;
use crate::feedbacks::FeedbackId;
use crate::options::{OptionField, OptionValues, VariableParser};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Colours are `0xRRGGBB`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButtonStyle {
    pub text: String,
    pub size: String,
    pub color: u32,
    pub bgcolor: u32,
}

pub const WHITE: u32 = 0xffffff;
pub const BLACK: u32 = 0x000000;
pub const RED: u32 = 0xff0000;
pub const GREEN: u32 = 0x00cc00;
pub const YELLOW: u32 = 0xffff00;

impl ButtonStyle {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            size: "18".to_string(),
            color: WHITE,
            bgcolor: BLACK,
        }
    }

    pub fn with_bg(mut self, bgcolor: u32) -> Self {
        self.bgcolor = bgcolor;
        self
    }

    pub fn with_color(mut self, color: u32) -> Self {
        self.color = color;
        self
    }

    pub fn with_size(mut self, size: &str) -> Self {
        self.size = size.to_string();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionDefinition {
    pub id: ActionId,
    pub name: String,
    pub options: Vec<OptionField>,
    pub learnable: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FeedbackKind {
    Boolean,
    Advanced,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackDefinition {
    pub id: FeedbackId,
    pub name: String,
    pub description: String,
    pub kind: FeedbackKind,
    /// Style applied while a boolean feedback evaluates true
    pub default_style: Option<ButtonStyle>,
    pub options: Vec<OptionField>,
    pub learnable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VariableDefinition {
    pub variable_id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresetAction {
    pub action: ActionId,
    pub options: OptionValues,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresetFeedback {
    pub feedback: FeedbackId,
    pub options: OptionValues,
    pub style: ButtonStyle,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresetDefinition {
    pub id: String,
    pub category: String,
    pub name: String,
    pub style: ButtonStyle,
    pub actions: Vec<PresetAction>,
    pub feedbacks: Vec<PresetFeedback>,
}

/// What an advanced feedback asks the host to draw
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StyleOverride {
    pub text: Option<String>,
    pub color: Option<u32>,
    pub bgcolor: Option<u32>,
}

/// Result of evaluating one feedback instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FeedbackValue {
    Boolean(bool),
    Style(StyleOverride),
}

impl FeedbackValue {
    pub fn is_active(&self) -> bool {
        match self {
            FeedbackValue::Boolean(b) => *b,
            FeedbackValue::Style(style) => *style != StyleOverride::default(),
        }
    }
}

/// Calls this crate makes into the host framework
///
/// Calls are synchronous notifications; hosts queue them as they see fit.
pub trait ModuleHost: VariableParser + Send + Sync + 'static {
    fn set_action_definitions(&self, definitions: Vec<ActionDefinition>);
    fn set_feedback_definitions(&self, definitions: Vec<FeedbackDefinition>);
    fn set_variable_definitions(&self, definitions: Vec<VariableDefinition>);
    fn set_preset_definitions(&self, definitions: Vec<PresetDefinition>);

    /// Only changed values are passed
    fn set_variable_values(&self, values: BTreeMap<String, String>);

    /// Re-evaluate every instance of these feedback types
    fn check_feedbacks(&self, feedbacks: &[FeedbackId]);

    /// Re-evaluate exactly these feedback instances
    fn check_feedbacks_by_id(&self, instance_ids: &[String]);
}
