//! Option pickers
//!
//! Each picker is sized from the model (never from a global maximum) and, where names are shown,
//! labelled from the live state. Dropdown ids are 0-based indices, labels are 1-based. The `*_text`
//! variants are free-text fields resolved at trigger time; they expect 1-based numbers.

use super::{routing, Choice, OptionField};
use crate::device::MediaSource;
use crate::models::{AudioSpec, ModelSpec};
use crate::sources::{self, SourceContext};
use crate::state::{
    accessors, AtemState, AudioMixOption, KeyType, TransitionSelection, TransitionStyle,
    FAIRLIGHT_COMBINED_SOURCE, FAIRLIGHT_SPLIT_LEFT_SOURCE, FAIRLIGHT_SPLIT_RIGHT_SOURCE,
};
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;

/// Fixed box count of every SuperSource
pub const SUPER_SOURCE_BOXES: u8 = 4;

/// Longest fade the gain actions accept, in milliseconds
pub const MAX_FADE_MS: f64 = 10_000.0;

/// On / off / flip
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[strum(serialize_all = "lowercase")]
pub enum ToggleMode {
    Toggle,
    On,
    Off,
}

impl ToggleMode {
    pub fn apply(self, current: bool) -> bool {
        match self {
            ToggleMode::Toggle => !current,
            ToggleMode::On => true,
            ToggleMode::Off => false,
        }
    }

    /// The mode that reproduces `current`
    pub fn learn(current: bool) -> Self {
        if current {
            ToggleMode::On
        } else {
            ToggleMode::Off
        }
    }
}

fn numbered(count: usize, prefix: &str) -> Vec<Choice> {
    (0..count)
        .map(|i| Choice::new(i, format!("{}{}", prefix, i + 1)))
        .collect()
}

pub fn mix_effect_picker(model: &ModelSpec) -> OptionField {
    OptionField::dropdown(
        "mixeffect",
        "M/E",
        numbered(usize::from(model.mixeffects), "M/E "),
    )
}

pub fn mix_effect_text_picker() -> OptionField {
    OptionField::text("mixeffect", "M/E", "1")
}

pub fn upstream_keyer_picker(model: &ModelSpec) -> OptionField {
    OptionField::dropdown("key", "Key", numbered(usize::from(model.usks), ""))
}

pub fn downstream_keyer_picker(model: &ModelSpec) -> OptionField {
    OptionField::dropdown("key", "Key", numbered(usize::from(model.dsks), ""))
}

/// Exactly one choice per aux output of this model
pub fn aux_picker(model: &ModelSpec) -> OptionField {
    OptionField::dropdown("aux", "Aux", numbered(usize::from(model.auxes), ""))
}

pub fn aux_text_picker() -> OptionField {
    OptionField::text("aux", "Aux", "1")
}

pub fn super_source_picker(model: &ModelSpec) -> OptionField {
    OptionField::dropdown(
        "ssrcId",
        "Super Source",
        numbered(usize::from(model.super_sources), ""),
    )
}

pub fn super_source_box_picker() -> OptionField {
    OptionField::dropdown(
        "boxIndex",
        "Box #",
        numbered(usize::from(SUPER_SOURCE_BOXES), ""),
    )
}

pub fn media_player_picker(model: &ModelSpec) -> OptionField {
    OptionField::dropdown(
        "mediaplayer",
        "Media Player",
        numbered(usize::from(model.media.players), ""),
    )
}

/// Still and clip slots, ids `"still:N"` / `"clip:N"` (0-based)
pub fn media_source_picker(model: &ModelSpec, state: Option<&AtemState>) -> OptionField {
    let stills = (0..model.media.stills).map(|i| {
        let name = state
            .and_then(|s| accessors::get_still(s, i))
            .filter(|still| still.is_used)
            .map(|still| format!(" - {}", still.file_name))
            .unwrap_or_default();
        Choice::new(
            media_source_key(MediaSource::Still(i)),
            format!("Still {}{}", i + 1, name),
        )
    });
    let clips = (0..model.media.clips).map(|i| {
        let name = state
            .and_then(|s| accessors::get_clip(s, i))
            .filter(|clip| clip.is_used)
            .map(|clip| format!(" - {}", clip.name))
            .unwrap_or_default();
        Choice::new(
            media_source_key(MediaSource::Clip(i)),
            format!("Clip {}{}", i + 1, name),
        )
    });
    OptionField::dropdown("source", "Source", stills.chain(clips).collect())
}

pub fn macro_picker(model: &ModelSpec, state: Option<&AtemState>) -> OptionField {
    let choices = (0..model.macros)
        .map(|i| {
            let name = state
                .and_then(|s| accessors::get_macro(s, i))
                .filter(|m| m.is_used && !m.name.is_empty())
                .map(|m| format!(": {}", m.name))
                .unwrap_or_default();
            Choice::new(i, format!("{}{}", i + 1, name))
        })
        .collect();
    OptionField::dropdown("macro", "Macro", choices)
}

pub fn multiviewer_picker(model: &ModelSpec) -> OptionField {
    OptionField::dropdown(
        "multiViewerId",
        "MV",
        numbered(usize::from(model.multiviewers), ""),
    )
}

pub fn multiviewer_window_picker(model: &ModelSpec) -> OptionField {
    OptionField::dropdown(
        "windowIndex",
        "Window #",
        numbered(usize::from(model.multiviewer_windows), ""),
    )
}

/// Sources valid in `context`, labelled with their long names
pub fn source_picker(
    model: &ModelSpec,
    state: Option<&AtemState>,
    context: SourceContext,
    id: &str,
    label: &str,
) -> OptionField {
    let choices = sources::list_sources(model, state, context)
        .into_iter()
        .map(|source| Choice::new(source.id, source.long_name))
        .collect();
    OptionField::dropdown(id, label, choices)
}

/// Main-bus sources. Uses the last M/E so outputs of earlier M/Es are offered; the command
/// builder re-checks against the chosen M/E.
pub fn mix_effect_source_picker(model: &ModelSpec, state: Option<&AtemState>) -> OptionField {
    let last = model.mixeffects.saturating_sub(1);
    source_picker(model, state, SourceContext::MixEffect(last), "input", "Input")
}

pub fn source_text_picker(id: &str, label: &str) -> OptionField {
    OptionField::text(id, label, "1")
}

pub fn transition_style_picker() -> OptionField {
    let choices = TransitionStyle::iter()
        .map(|style| Choice::new(style.to_string(), style.to_string()))
        .collect();
    OptionField::dropdown("style", "Transition Style", choices)
}

/// Frames
pub fn transition_rate_picker() -> OptionField {
    OptionField::number("rate", "Transition Rate", 25.0, 1.0, 250.0, 1.0)
}

/// Background plus one entry per upstream keyer
pub fn transition_selection_picker(model: &ModelSpec) -> OptionField {
    let mut choices = vec![Choice::new("background", "Background")];
    choices.extend((0..model.usks).map(|k| Choice::new(format!("key{}", k), format!("Key {}", k + 1))));
    OptionField::MultiDropdown {
        id: "selection".to_string(),
        label: "Selection".to_string(),
        default: vec![serde_json::Value::from("background")],
        choices,
    }
}

/// Multi-select entries back into a selection mask
pub fn selection_from_list(items: &[String]) -> TransitionSelection {
    items.iter().fold(TransitionSelection(0), |sel, item| {
        if item == "background" {
            sel.with_background(true)
        } else if let Some(key) = item.strip_prefix("key").and_then(|k| k.parse().ok()) {
            sel.with_key(key, true)
        } else {
            sel
        }
    })
}

pub fn selection_to_list(selection: TransitionSelection, usks: u8) -> Vec<serde_json::Value> {
    let mut items = Vec::new();
    if selection.background() {
        items.push(serde_json::Value::from("background"));
    }
    items.extend(
        (0..usks)
            .filter(|k| selection.key(*k))
            .map(|k| serde_json::Value::from(format!("key{}", k))),
    );
    items
}

pub fn media_source_key(source: MediaSource) -> String {
    match source {
        MediaSource::Still(i) => format!("still:{}", i),
        MediaSource::Clip(i) => format!("clip:{}", i),
    }
}

pub fn parse_media_source_key(text: &str) -> Option<MediaSource> {
    match text.split_once(':')? {
        ("still", i) => i.parse().ok().map(MediaSource::Still),
        ("clip", i) => i.parse().ok().map(MediaSource::Clip),
        _ => None,
    }
}

pub fn toggle_picker(id: &str, label: &str) -> OptionField {
    let choices = ToggleMode::iter()
        .map(|mode| {
            let label = match mode {
                ToggleMode::Toggle => "Toggle",
                ToggleMode::On => "On",
                ToggleMode::Off => "Off",
            };
            Choice::new(mode.to_string(), label)
        })
        .collect();
    OptionField::dropdown(id, label, choices)
}

pub fn key_type_picker() -> OptionField {
    let choices = KeyType::iter()
        .map(|t| Choice::new(t.to_string(), t.to_string()))
        .collect();
    OptionField::dropdown("keyType", "Key Type", choices)
}

pub fn mix_option_picker() -> OptionField {
    let choices = AudioMixOption::iter()
        .map(|o| Choice::new(o.to_string(), o.to_string()))
        .collect();
    OptionField::dropdown("option", "Attribute", choices)
}

/// Classic audio inputs of this model
pub fn classic_audio_input_picker(model: &ModelSpec, state: Option<&AtemState>) -> OptionField {
    let choices = model
        .classic_audio()
        .map(|classic| {
            classic
                .inputs
                .iter()
                .map(|input| Choice::new(input.id, sources::audio_input_name(state, input.id)))
                .collect()
        })
        .unwrap_or_default();
    OptionField::dropdown("input", "Input", choices)
}

/// Fairlight sources as `"<input>:<source>"`. Split stereo inputs offer both halves.
pub fn fairlight_source_picker(model: &ModelSpec, state: Option<&AtemState>) -> OptionField {
    OptionField::dropdown("source", "Source", fairlight_source_choices(model, state))
}

pub fn fairlight_source_choices(model: &ModelSpec, state: Option<&AtemState>) -> Vec<Choice> {
    let AudioSpec::Fairlight(fairlight) = &model.audio else {
        return Vec::new();
    };
    fairlight
        .inputs
        .iter()
        .flat_map(|input| {
            let name = sources::audio_input_name(state, input.id);
            let live: Vec<i64> = state
                .and_then(|s| accessors::get_fairlight_input(s, input.id))
                .map(|i| i.sources.keys().copied().collect())
                .unwrap_or_default();
            let ids = if live.is_empty() {
                vec![FAIRLIGHT_COMBINED_SOURCE]
            } else {
                live
            };
            ids.into_iter().map(move |source| {
                let suffix = match source {
                    FAIRLIGHT_COMBINED_SOURCE => String::new(),
                    FAIRLIGHT_SPLIT_LEFT_SOURCE => " (Left)".to_string(),
                    FAIRLIGHT_SPLIT_RIGHT_SOURCE => " (Right)".to_string(),
                    other => format!(" ({})", other),
                };
                Choice::new(fairlight_source_key(input.id, source), format!("{}{}", name, suffix))
            })
        })
        .collect()
}

pub fn fairlight_source_key(input: u16, source: i64) -> String {
    format!("{}:{}", input, source)
}

pub fn parse_fairlight_source_key(text: &str) -> Option<(u16, i64)> {
    let (input, source) = text.split_once(':')?;
    Some((input.trim().parse().ok()?, source.trim().parse().ok()?))
}

/// dB; the Fairlight range is wider than classic
pub fn gain_picker(id: &str, label: &str, fairlight: bool) -> OptionField {
    let (min, max) = if fairlight { (-100.0, 10.0) } else { (-60.0, 6.0) };
    OptionField::number(id, label, 0.0, min, max, 0.1)
}

pub fn gain_delta_picker() -> OptionField {
    OptionField::number("delta", "Delta (dB)", 1.0, -100.0, 100.0, 0.1)
}

/// Milliseconds, 0 for an immediate change
pub fn fade_duration_picker() -> OptionField {
    OptionField::number("fadeDuration", "Fade Duration (ms)", 0.0, 0.0, MAX_FADE_MS, 10.0)
}

/// Routing sources of this model, one entry per channel pair, named from the live matrix
pub fn audio_routing_source_picker(model: &ModelSpec, state: Option<&AtemState>) -> OptionField {
    let choices = model
        .fairlight_audio()
        .and_then(|f| f.audio_routing.as_ref())
        .map(|routing_spec| {
            routing_spec
                .sources
                .iter()
                .flat_map(|endpoint| {
                    endpoint.channel_pairs.iter().map(move |pair| {
                        let id = routing::routing_id(endpoint.id, *pair);
                        let name = state
                            .and_then(|s| accessors::get_audio_routing_source(s, id))
                            .map(|s| s.name.clone())
                            .filter(|n| !n.is_empty())
                            .unwrap_or_else(|| endpoint.name.clone());
                        Choice::new(id, format!("{} ({})", name, pair.label().replace('_', "-")))
                    })
                })
                .collect()
        })
        .unwrap_or_default();
    OptionField::dropdown("source", "Source", choices)
}

pub fn audio_routing_output_picker(model: &ModelSpec, state: Option<&AtemState>) -> OptionField {
    let choices: Vec<Choice> = model
        .fairlight_audio()
        .and_then(|f| f.audio_routing.as_ref())
        .map(|routing_spec| {
            routing_spec
                .outputs
                .iter()
                .flat_map(|endpoint| {
                    endpoint.channel_pairs.iter().map(move |pair| {
                        let id = routing::routing_id(endpoint.id, *pair);
                        let name = state
                            .and_then(|s| accessors::get_audio_routing_output(s, id))
                            .map(|o| o.name.clone())
                            .filter(|n| !n.is_empty())
                            .unwrap_or_else(|| endpoint.name.clone());
                        Choice::new(id, format!("{} ({})", name, pair.label().replace('_', "-")))
                    })
                })
                .collect()
        })
        .unwrap_or_default();
    let default = choices
        .first()
        .map(|c| vec![c.id.clone()])
        .unwrap_or_default();
    OptionField::MultiDropdown {
        id: "outputs".to_string(),
        label: "Outputs".to_string(),
        default,
        choices,
    }
}

/// Free-text routing endpoint(s), e.g. `1301-1_2`
pub fn audio_routing_text_picker(id: &str, label: &str) -> OptionField {
    OptionField::text(id, label, "")
}
