//! Derived facts: the units the classifier can ask to be recomputed

use crate::feedbacks::FeedbackId;
use crate::options::{values_match, OptionValues};
use serde_json::Value;

/// A group of variables that is always recomputed together
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum VariableGroup {
    /// `long_<id>` / `short_<id>` for every source
    InputNames,
    MeProgram { me: u8 },
    MePreview { me: u8 },
    TransitionPosition { me: u8 },
    Transition { me: u8 },
    FadeToBlack { me: u8 },
    UpstreamKeyer { me: u8, key: u8 },
    DownstreamKeyer { dsk: u8 },
    Aux { aux: u8 },
    SuperSourceBox { ssrc: u8, box_index: u8 },
    MediaPlayer { player: u8 },
    Macro { index: u16 },
    MacroState,
    /// All windows of a multiviewer when `window` is `None`
    Multiviewer { mv: u8, window: Option<u8> },
    ClassicAudio { input: u16 },
    ClassicAudioMaster,
    FairlightSource { input: u16, source: i64 },
    FairlightMaster,
    FairlightMonitor,
    /// All routing outputs when `output` is `None`
    AudioRouting { output: Option<u32> },
    Streaming,
    Recording,
}

/// Which instances of a feedback type are affected: those whose options agree with every pair.
/// An instance lacking one of the keys is included.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Scope(pub Vec<(&'static str, Value)>);

impl Scope {
    pub fn all() -> Self {
        Self(Vec::new())
    }

    pub fn with(mut self, key: &'static str, value: impl Into<Value>) -> Self {
        self.0.push((key, value.into()));
        self
    }

    pub fn is_all(&self) -> bool {
        self.0.is_empty()
    }

    pub fn matches(&self, options: &OptionValues) -> bool {
        self.0.iter().all(|(key, expected)| match options.raw(key) {
            Some(actual) => values_match(actual, expected),
            None => true,
        })
    }

    /// Shorthand scopes, named after the option ids the pickers use
    pub fn me(me: u8) -> Self {
        Self::all().with("mixeffect", me)
    }

    pub fn me_key(me: u8, key: u8) -> Self {
        Self::me(me).with("key", key)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Target {
    Variables(VariableGroup),
    Feedback(FeedbackId, Scope),
}

/// Open-ended sets recomputed wholesale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    /// Action and feedback definitions (source dropdowns carry names)
    Definitions,
    /// Every variable value
    Variables,
    /// Preset definitions (labels carry source names)
    Presets,
    /// Every instance of one feedback type
    Feedback(FeedbackId),
}

/// What one change signal requires, in increasing breadth
#[derive(Debug, Clone, PartialEq)]
pub enum Impact {
    Ignore,
    Targeted(Vec<Target>),
    CategoryWide(Vec<Category>),
    /// Definitions themselves (dropdown contents) are stale
    Structural,
}
