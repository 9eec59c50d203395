//! Feedback definitions and evaluation
//!
//! Every feedback reads the live state through the accessors and never fails outward: options
//! that do not resolve, or state that has not arrived yet, evaluate as inactive.

use crate::error::OptionError;
use crate::host::{
    ButtonStyle, FeedbackDefinition, FeedbackKind, FeedbackValue, StyleOverride, BLACK, GREEN,
    RED, WHITE, YELLOW,
};
use crate::models::ModelSpec;
use crate::options::pickers::{self, SUPER_SOURCE_BOXES};
use crate::options::{Choice, OptionField, OptionValues, VariableParser};
use crate::sources::{self, SourceContext};
use crate::state::{
    accessors, AtemState, AudioMixOption, MediaSourceType, RecordingStatusState,
    StreamingStatusState, TallySnapshot, TransitionStyle,
};
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use tracing::trace;

/// Gains closer than this (dB) count as equal
const GAIN_TOLERANCE: f64 = 0.05;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FeedbackId {
    PreviewBg,
    ProgramBg,
    PreviewBgVariables,
    ProgramBgVariables,
    ProgramSourceLabel,
    InputTally,
    UskOnAir,
    UskSource,
    DskOnAir,
    DskTie,
    DskSource,
    Aux,
    AuxVariables,
    TransitionStyle,
    TransitionSelection,
    TransitionRate,
    InTransition,
    PreviewTransition,
    FadeToBlack,
    SsrcArtSource,
    SsrcBoxOnAir,
    SsrcBoxSource,
    SsrcBoxProperties,
    MediaPlayerSource,
    MvSource,
    Macro,
    MacroLoop,
    ClassicAudioGain,
    ClassicAudioMixOption,
    FairlightFaderGain,
    FairlightMixOption,
    AudioRouting,
    StreamStatus,
    RecordStatus,
    RecordIso,
}

impl FeedbackId {
    pub fn is_learnable(self) -> bool {
        matches!(
            self,
            FeedbackId::PreviewBg
                | FeedbackId::ProgramBg
                | FeedbackId::Aux
                | FeedbackId::UskSource
                | FeedbackId::DskSource
                | FeedbackId::TransitionStyle
                | FeedbackId::TransitionSelection
                | FeedbackId::TransitionRate
                | FeedbackId::SsrcArtSource
                | FeedbackId::SsrcBoxSource
                | FeedbackId::SsrcBoxProperties
                | FeedbackId::MediaPlayerSource
                | FeedbackId::MvSource
                | FeedbackId::ClassicAudioGain
                | FeedbackId::ClassicAudioMixOption
                | FeedbackId::FairlightFaderGain
                | FeedbackId::FairlightMixOption
                | FeedbackId::AudioRouting
        )
    }
}

/// Everything a feedback may read while evaluating
pub struct FeedbackContext<'a> {
    pub model: &'a ModelSpec,
    pub state: &'a AtemState,
    pub tally: &'a TallySnapshot,
    pub parser: &'a dyn VariableParser,
}

fn boolean(
    id: FeedbackId,
    name: &str,
    description: &str,
    style: ButtonStyle,
    options: Vec<OptionField>,
) -> FeedbackDefinition {
    FeedbackDefinition {
        id,
        name: name.to_string(),
        description: description.to_string(),
        kind: FeedbackKind::Boolean,
        default_style: Some(style),
        options,
        learnable: id.is_learnable(),
    }
}

fn red() -> ButtonStyle {
    ButtonStyle::new("").with_bg(RED).with_color(WHITE)
}

fn green() -> ButtonStyle {
    ButtonStyle::new("").with_bg(GREEN).with_color(WHITE)
}

fn yellow() -> ButtonStyle {
    ButtonStyle::new("").with_bg(YELLOW).with_color(BLACK)
}

fn state_picker<T: IntoEnumIterator + std::fmt::Display>(label: &str) -> OptionField {
    let choices = T::iter()
        .map(|s| Choice::new(s.to_string(), s.to_string()))
        .collect();
    OptionField::dropdown("state", label, choices)
}

/// Feedback definitions for `model`. Blocks the model lacks are left out entirely.
pub fn definitions(model: &ModelSpec, state: Option<&AtemState>) -> Vec<FeedbackDefinition> {
    let me = pickers::mix_effect_picker(model);
    let me_source = pickers::mix_effect_source_picker(model, state);
    let mut defs = vec![
        boolean(
            FeedbackId::PreviewBg,
            "Preview source",
            "Active while the input is on preview of the M/E",
            green(),
            vec![me.clone(), me_source.clone()],
        ),
        boolean(
            FeedbackId::ProgramBg,
            "Program source",
            "Active while the input is on program of the M/E",
            red(),
            vec![me.clone(), me_source.clone()],
        ),
        boolean(
            FeedbackId::PreviewBgVariables,
            "Preview source (variables)",
            "Preview check with M/E and input resolved from variables",
            green(),
            vec![
                pickers::mix_effect_text_picker(),
                pickers::source_text_picker("input", "Input ID"),
            ],
        ),
        boolean(
            FeedbackId::ProgramBgVariables,
            "Program source (variables)",
            "Program check with M/E and input resolved from variables",
            red(),
            vec![
                pickers::mix_effect_text_picker(),
                pickers::source_text_picker("input", "Input ID"),
            ],
        ),
        FeedbackDefinition {
            id: FeedbackId::ProgramSourceLabel,
            name: "Program source label".to_string(),
            description: "Shows the short name of the source on program".to_string(),
            kind: FeedbackKind::Advanced,
            default_style: None,
            options: vec![me.clone()],
            learnable: false,
        },
        boolean(
            FeedbackId::InputTally,
            "Input tally",
            "Active while the input is on air anywhere (program) or cued (preview)",
            red(),
            vec![
                pickers::source_picker(model, state, SourceContext::All, "input", "Input"),
                OptionField::dropdown(
                    "tally",
                    "Tally",
                    vec![
                        Choice::new("program", "Program"),
                        Choice::new("preview", "Preview"),
                    ],
                ),
            ],
        ),
    ];

    if model.usks > 0 {
        defs.push(boolean(
            FeedbackId::UskOnAir,
            "Upstream key on air",
            "Active while the upstream keyer is on air",
            red(),
            vec![me.clone(), pickers::upstream_keyer_picker(model)],
        ));
        defs.push(boolean(
            FeedbackId::UskSource,
            "Upstream key fill source",
            "Active while the keyer uses the fill source",
            red(),
            vec![
                me.clone(),
                pickers::upstream_keyer_picker(model),
                pickers::source_picker(model, state, SourceContext::KeySource, "fill", "Fill"),
            ],
        ));
    }

    if model.dsks > 0 {
        let dsk = pickers::downstream_keyer_picker(model);
        defs.push(boolean(
            FeedbackId::DskOnAir,
            "Downstream key on air",
            "Active while the downstream keyer is on air",
            red(),
            vec![dsk.clone()],
        ));
        defs.push(boolean(
            FeedbackId::DskTie,
            "Downstream key tie",
            "Active while the downstream keyer is tied to the next transition",
            yellow(),
            vec![dsk.clone()],
        ));
        defs.push(boolean(
            FeedbackId::DskSource,
            "Downstream key fill source",
            "Active while the keyer uses the fill source",
            red(),
            vec![
                dsk,
                pickers::source_picker(model, state, SourceContext::KeySource, "fill", "Fill"),
            ],
        ));
    }

    if model.auxes > 0 {
        defs.push(boolean(
            FeedbackId::Aux,
            "Aux source",
            "Active while the aux output carries the input",
            yellow(),
            vec![
                pickers::aux_picker(model),
                pickers::source_picker(model, state, SourceContext::Auxiliary, "input", "Input"),
            ],
        ));
        defs.push(boolean(
            FeedbackId::AuxVariables,
            "Aux source (variables)",
            "Aux check with output and input resolved from variables",
            yellow(),
            vec![
                pickers::aux_text_picker(),
                pickers::source_text_picker("input", "Input ID"),
            ],
        ));
    }

    defs.extend([
        boolean(
            FeedbackId::TransitionStyle,
            "Transition style",
            "Active while the next transition uses the style",
            yellow(),
            vec![me.clone(), pickers::transition_style_picker()],
        ),
        boolean(
            FeedbackId::TransitionSelection,
            "Transition selection",
            "Active while the next transition takes exactly these layers",
            yellow(),
            vec![me.clone(), pickers::transition_selection_picker(model)],
        ),
        boolean(
            FeedbackId::TransitionRate,
            "Transition rate",
            "Active while the style is set to this rate",
            yellow(),
            vec![
                me.clone(),
                pickers::transition_style_picker(),
                pickers::transition_rate_picker(),
            ],
        ),
        boolean(
            FeedbackId::InTransition,
            "In transition",
            "Active while the M/E is transitioning",
            red(),
            vec![me.clone()],
        ),
        boolean(
            FeedbackId::PreviewTransition,
            "Preview transition",
            "Active while transition preview is enabled",
            red(),
            vec![me.clone()],
        ),
        boolean(
            FeedbackId::FadeToBlack,
            "Fade to black",
            "Active in the chosen fade to black state",
            red(),
            vec![
                me.clone(),
                OptionField::dropdown(
                    "state",
                    "State",
                    vec![
                        Choice::new("on", "On"),
                        Choice::new("off", "Off"),
                        Choice::new("fading", "Fading"),
                    ],
                ),
            ],
        ),
    ]);

    if model.super_sources > 0 {
        let ssrc = pickers::super_source_picker(model);
        let box_index = pickers::super_source_box_picker();
        defs.extend([
            boolean(
                FeedbackId::SsrcArtSource,
                "SuperSource art fill",
                "Active while the art fill uses the source",
                yellow(),
                vec![
                    ssrc.clone(),
                    pickers::source_picker(
                        model,
                        state,
                        SourceContext::SuperSourceArt,
                        "fill",
                        "Fill",
                    ),
                ],
            ),
            boolean(
                FeedbackId::SsrcBoxOnAir,
                "SuperSource box enabled",
                "Active while the box is enabled",
                red(),
                vec![ssrc.clone(), box_index.clone()],
            ),
            boolean(
                FeedbackId::SsrcBoxSource,
                "SuperSource box source",
                "Active while the box shows the source",
                yellow(),
                vec![
                    ssrc.clone(),
                    box_index.clone(),
                    pickers::source_picker(
                        model,
                        state,
                        SourceContext::SuperSourceBox,
                        "source",
                        "Source",
                    ),
                ],
            ),
            boolean(
                FeedbackId::SsrcBoxProperties,
                "SuperSource box properties",
                "Active while the box has this size, position and crop",
                yellow(),
                vec![ssrc, box_index]
                    .into_iter()
                    .chain(super_source_geometry_fields())
                    .collect(),
            ),
        ]);
    }

    if model.media.players > 0 {
        defs.push(boolean(
            FeedbackId::MediaPlayerSource,
            "Media player source",
            "Active while the player has the still or clip loaded",
            yellow(),
            vec![
                pickers::media_player_picker(model),
                pickers::media_source_picker(model, state),
            ],
        ));
    }

    if model.multiviewers > 0 {
        defs.push(boolean(
            FeedbackId::MvSource,
            "Multiviewer window source",
            "Active while the window shows the source",
            yellow(),
            vec![
                pickers::multiviewer_picker(model),
                pickers::multiviewer_window_picker(model),
                pickers::source_picker(model, state, SourceContext::Multiviewer, "source", "Source"),
            ],
        ));
    }

    if model.macros > 0 {
        defs.push(boolean(
            FeedbackId::Macro,
            "Macro state",
            "Active while the macro is in the chosen state",
            yellow(),
            vec![
                pickers::macro_picker(model, state),
                OptionField::dropdown(
                    "state",
                    "State",
                    vec![
                        Choice::new("isRunning", "Is running"),
                        Choice::new("isWaiting", "Is waiting"),
                        Choice::new("isRecording", "Is recording"),
                        Choice::new("isUsed", "Is used"),
                    ],
                ),
            ],
        ));
        defs.push(boolean(
            FeedbackId::MacroLoop,
            "Macro loop",
            "Active while macro looping matches",
            yellow(),
            vec![OptionField::checkbox("loop", "Looping", true)],
        ));
    }

    if model.classic_audio().is_some() {
        let input = pickers::classic_audio_input_picker(model, state);
        defs.push(boolean(
            FeedbackId::ClassicAudioGain,
            "Audio gain",
            "Active while the input gain matches",
            yellow(),
            vec![input.clone(), pickers::gain_picker("gain", "Gain (dB)", false)],
        ));
        defs.push(boolean(
            FeedbackId::ClassicAudioMixOption,
            "Audio mix option",
            "Active while the input has the mix option",
            red(),
            vec![input, pickers::mix_option_picker()],
        ));
    }

    if model.fairlight_audio().is_some() {
        let source = pickers::fairlight_source_picker(model, state);
        defs.push(boolean(
            FeedbackId::FairlightFaderGain,
            "Fairlight fader gain",
            "Active while the fader gain matches",
            yellow(),
            vec![source.clone(), pickers::gain_picker("gain", "Fader gain (dB)", true)],
        ));
        defs.push(boolean(
            FeedbackId::FairlightMixOption,
            "Fairlight mix option",
            "Active while the source has the mix option",
            red(),
            vec![source, pickers::mix_option_picker()],
        ));
    }

    if model.has_audio_routing() {
        let outputs = pickers::audio_routing_output_picker(model, state);
        defs.push(boolean(
            FeedbackId::AudioRouting,
            "Audio routing",
            "Active while the output is fed from the source",
            yellow(),
            vec![
                pickers::audio_routing_source_picker(model, state),
                OptionField::dropdown("output", "Output", outputs.choices().to_vec()),
            ],
        ));
    }

    if model.streaming {
        defs.push(boolean(
            FeedbackId::StreamStatus,
            "Streaming status",
            "Active in the chosen streaming state",
            green(),
            vec![state_picker::<StreamingStatusState>("State")],
        ));
    }

    if model.recording {
        defs.push(boolean(
            FeedbackId::RecordStatus,
            "Recording status",
            "Active in the chosen recording state",
            red(),
            vec![state_picker::<RecordingStatusState>("State")],
        ));
    }

    if model.record_iso {
        defs.push(boolean(
            FeedbackId::RecordIso,
            "Record all inputs",
            "Active while ISO recording of every input is enabled",
            red(),
            Vec::new(),
        ));
    }

    defs
}

/// Box geometry, in switcher units
pub(crate) fn super_source_geometry_fields() -> Vec<OptionField> {
    vec![
        OptionField::number("size", "Size", 500.0, 70.0, 1000.0, 1.0),
        OptionField::number("x", "X", 0.0, -4800.0, 4800.0, 1.0),
        OptionField::number("y", "Y", 0.0, -2700.0, 2700.0, 1.0),
        OptionField::checkbox("cropped", "Cropped", false),
    ]
}

/// Evaluate one feedback instance
pub fn evaluate(id: FeedbackId, options: &OptionValues, ctx: &FeedbackContext) -> FeedbackValue {
    if id == FeedbackId::ProgramSourceLabel {
        return FeedbackValue::Style(program_label(options, ctx).unwrap_or_default());
    }
    match check(id, options, ctx) {
        Ok(active) => FeedbackValue::Boolean(active),
        Err(e) => {
            trace!("Feedback {} inactive: {}", id, e);
            FeedbackValue::Boolean(false)
        }
    }
}

fn program_label(options: &OptionValues, ctx: &FeedbackContext) -> Option<StyleOverride> {
    let me = options.index("mixeffect", usize::from(ctx.model.mixeffects)).ok()?;
    let program = accessors::get_mix_effect(ctx.state, me)?.program_input;
    Some(StyleOverride {
        text: Some(sources::source_info(Some(ctx.state), program).short_name),
        ..Default::default()
    })
}

fn gain_matches(actual: f64, wanted: f64) -> bool {
    (actual - wanted).abs() < GAIN_TOLERANCE
}

fn check(id: FeedbackId, options: &OptionValues, ctx: &FeedbackContext) -> Result<bool, OptionError> {
    let model = ctx.model;
    let state = ctx.state;
    let mes = usize::from(model.mixeffects);
    let absent = || OptionError::StateUnavailable;

    let active = match id {
        FeedbackId::PreviewBg | FeedbackId::ProgramBg => {
            let me = options.index("mixeffect", mes)?;
            let input = options.integer("input")?;
            let me_state = accessors::get_mix_effect(state, me).ok_or_else(absent)?;
            let current = if id == FeedbackId::ProgramBg {
                me_state.program_input
            } else {
                me_state.preview_input
            };
            i64::from(current) == input
        }
        FeedbackId::PreviewBgVariables | FeedbackId::ProgramBgVariables => {
            let me = options.resolve_index("mixeffect", mes, ctx.parser)?;
            let input =
                options.resolve_source("input", model, SourceContext::MixEffect(me), ctx.parser)?;
            let me_state = accessors::get_mix_effect(state, me).ok_or_else(absent)?;
            let current = if id == FeedbackId::ProgramBgVariables {
                me_state.program_input
            } else {
                me_state.preview_input
            };
            current == input
        }
        FeedbackId::ProgramSourceLabel => false,
        FeedbackId::InputTally => {
            let input = u16::try_from(options.integer("input")?).map_err(|_| absent())?;
            let tally = ctx.tally.get(input);
            match options.text("tally")?.as_str() {
                "preview" => tally.preview,
                _ => tally.program,
            }
        }
        FeedbackId::UskOnAir => {
            let me = options.index("mixeffect", mes)?;
            let key = options.index("key", usize::from(model.usks))?;
            accessors::get_upstream_keyer(state, me, key)
                .ok_or_else(absent)?
                .on_air
        }
        FeedbackId::UskSource => {
            let me = options.index("mixeffect", mes)?;
            let key = options.index("key", usize::from(model.usks))?;
            let fill = options.integer("fill")?;
            let keyer = accessors::get_upstream_keyer(state, me, key).ok_or_else(absent)?;
            i64::from(keyer.fill_source) == fill
        }
        FeedbackId::DskOnAir => {
            let dsk = options.index("key", usize::from(model.dsks))?;
            accessors::get_downstream_keyer(state, dsk)
                .ok_or_else(absent)?
                .on_air
        }
        FeedbackId::DskTie => {
            let dsk = options.index("key", usize::from(model.dsks))?;
            accessors::get_downstream_keyer(state, dsk)
                .and_then(|k| k.properties)
                .ok_or_else(absent)?
                .tie
        }
        FeedbackId::DskSource => {
            let dsk = options.index("key", usize::from(model.dsks))?;
            let fill = options.integer("fill")?;
            let sources = accessors::get_downstream_keyer(state, dsk)
                .and_then(|k| k.sources)
                .ok_or_else(absent)?;
            i64::from(sources.fill_source) == fill
        }
        FeedbackId::Aux => {
            let aux = options.index("aux", usize::from(model.auxes))?;
            let input = options.integer("input")?;
            i64::from(accessors::get_aux_source(state, aux).ok_or_else(absent)?) == input
        }
        FeedbackId::AuxVariables => {
            let aux = options.resolve_index("aux", usize::from(model.auxes), ctx.parser)?;
            let input =
                options.resolve_source("input", model, SourceContext::Auxiliary, ctx.parser)?;
            accessors::get_aux_source(state, aux).ok_or_else(absent)? == input
        }
        FeedbackId::TransitionStyle => {
            let me = options.index("mixeffect", mes)?;
            let style: TransitionStyle = options.choice("style")?;
            accessors::get_transition_properties(state, me)
                .ok_or_else(absent)?
                .next_style
                == style
        }
        FeedbackId::TransitionSelection => {
            let me = options.index("mixeffect", mes)?;
            let wanted = pickers::selection_from_list(&options.list("selection"));
            accessors::get_transition_properties(state, me)
                .ok_or_else(absent)?
                .next_selection
                == wanted
        }
        FeedbackId::TransitionRate => {
            let me = options.index("mixeffect", mes)?;
            let style: TransitionStyle = options.choice("style")?;
            let rate = options.integer("rate")?;
            let settings = accessors::get_transition_settings(state, me).ok_or_else(absent)?;
            settings.rate_for(style).map(i64::from) == Some(rate)
        }
        FeedbackId::InTransition => {
            let me = options.index("mixeffect", mes)?;
            accessors::get_mix_effect(state, me)
                .ok_or_else(absent)?
                .transition_position
                .in_transition
        }
        FeedbackId::PreviewTransition => {
            let me = options.index("mixeffect", mes)?;
            accessors::get_mix_effect(state, me)
                .ok_or_else(absent)?
                .transition_preview
        }
        FeedbackId::FadeToBlack => {
            let me = options.index("mixeffect", mes)?;
            let ftb = accessors::get_fade_to_black(state, me).ok_or_else(absent)?;
            match options.text("state")?.as_str() {
                "on" => ftb.is_fully_black,
                "fading" => ftb.in_transition,
                _ => !ftb.is_fully_black && !ftb.in_transition,
            }
        }
        FeedbackId::SsrcArtSource => {
            let ssrc = options.index("ssrcId", usize::from(model.super_sources))?;
            let fill = options.integer("fill")?;
            let props = accessors::get_super_source_properties(state, ssrc).ok_or_else(absent)?;
            i64::from(props.art_fill_source) == fill
        }
        FeedbackId::SsrcBoxOnAir | FeedbackId::SsrcBoxSource | FeedbackId::SsrcBoxProperties => {
            let ssrc = options.index("ssrcId", usize::from(model.super_sources))?;
            let box_index = options.index("boxIndex", usize::from(SUPER_SOURCE_BOXES))?;
            let ssrc_box =
                accessors::get_super_source_box(state, ssrc, box_index).ok_or_else(absent)?;
            match id {
                FeedbackId::SsrcBoxOnAir => ssrc_box.enabled,
                FeedbackId::SsrcBoxSource => i64::from(ssrc_box.source) == options.integer("source")?,
                _ => {
                    i64::from(ssrc_box.size) == options.integer("size")?
                        && i64::from(ssrc_box.x) == options.integer("x")?
                        && i64::from(ssrc_box.y) == options.integer("y")?
                        && ssrc_box.cropped == options.boolean("cropped")?
                }
            }
        }
        FeedbackId::MediaPlayerSource => {
            let player = options.index("mediaplayer", usize::from(model.media.players))?;
            let wanted = pickers::parse_media_source_key(&options.text("source")?).ok_or_else(
                || OptionError::UnknownChoice {
                    key: "source".to_string(),
                    value: options.text("source").unwrap_or_default(),
                },
            )?;
            let mp = accessors::get_media_player(state, player).ok_or_else(absent)?;
            let current = match mp.source_type {
                MediaSourceType::Still => crate::device::MediaSource::Still(mp.still_index),
                MediaSourceType::Clip => crate::device::MediaSource::Clip(mp.clip_index),
            };
            current == wanted
        }
        FeedbackId::MvSource => {
            let mv = options.index("multiViewerId", usize::from(model.multiviewers))?;
            let window = options.index("windowIndex", usize::from(model.multiviewer_windows))?;
            let source = options.integer("source")?;
            let current = accessors::get_multiviewer_window(state, mv, window).ok_or_else(absent)?;
            i64::from(current.source) == source
        }
        FeedbackId::Macro => {
            let index = options.index_u16("macro", usize::from(model.macros))?;
            let player = accessors::get_macro_player(state);
            let recorder = accessors::get_macro_recorder(state);
            match options.text("state")?.as_str() {
                "isRunning" => player.is_running && player.macro_index == index,
                "isWaiting" => player.is_waiting && player.macro_index == index,
                "isRecording" => recorder.is_recording && recorder.macro_index == index,
                _ => accessors::get_macro(state, index).is_some_and(|m| m.is_used),
            }
        }
        FeedbackId::MacroLoop => {
            accessors::get_macro_player(state).looping == options.boolean("loop")?
        }
        FeedbackId::ClassicAudioGain => {
            let input = options.integer("input")?;
            let input = u16::try_from(input).map_err(|_| absent())?;
            let channel = accessors::get_classic_audio_channel(state, input).ok_or_else(absent)?;
            gain_matches(channel.gain, options.number("gain")?)
        }
        FeedbackId::ClassicAudioMixOption => {
            let input = u16::try_from(options.integer("input")?).map_err(|_| absent())?;
            let option: AudioMixOption = options.choice("option")?;
            accessors::get_classic_audio_channel(state, input)
                .ok_or_else(absent)?
                .mix_option
                == option
        }
        FeedbackId::FairlightFaderGain | FeedbackId::FairlightMixOption => {
            let (input, source) = fairlight_source(options)?;
            let props =
                accessors::get_fairlight_source(state, input, source).ok_or_else(absent)?;
            if id == FeedbackId::FairlightFaderGain {
                gain_matches(props.fader_gain, options.number("gain")?)
            } else {
                props.mix_option == options.choice::<AudioMixOption>("option")?
            }
        }
        FeedbackId::AudioRouting => {
            let source = options.integer("source")?;
            let output = u32::try_from(options.integer("output")?).map_err(|_| absent())?;
            let current = accessors::get_audio_routing_output(state, output).ok_or_else(absent)?;
            i64::from(current.source_id) == source
        }
        FeedbackId::StreamStatus => {
            let wanted: StreamingStatusState = options.choice("state")?;
            accessors::get_streaming_status(state).ok_or_else(absent)? == wanted
        }
        FeedbackId::RecordStatus => {
            let wanted: RecordingStatusState = options.choice("state")?;
            accessors::get_recording_status(state).ok_or_else(absent)? == wanted
        }
        FeedbackId::RecordIso => accessors::get_recording(state)
            .and_then(|r| r.properties.as_ref())
            .ok_or_else(absent)?
            .record_in_all_cameras,
    };
    Ok(active)
}

pub(crate) fn fairlight_source(options: &OptionValues) -> Result<(u16, i64), OptionError> {
    let text = options.text("source")?;
    pickers::parse_fairlight_source_key(&text).ok_or(OptionError::UnknownChoice {
        key: "source".to_string(),
        value: text,
    })
}

/// Options that would make this feedback active against the current state, or `None` when the
/// addressed unit has no state yet
pub fn learn(
    id: FeedbackId,
    options: &OptionValues,
    model: &ModelSpec,
    state: &AtemState,
) -> Option<OptionValues> {
    let mes = usize::from(model.mixeffects);
    let mut learned = options.clone();
    match id {
        FeedbackId::PreviewBg | FeedbackId::ProgramBg => {
            let me = options.index("mixeffect", mes).ok()?;
            let me_state = accessors::get_mix_effect(state, me)?;
            let input = if id == FeedbackId::ProgramBg {
                me_state.program_input
            } else {
                me_state.preview_input
            };
            learned.set("input", input);
        }
        FeedbackId::Aux => {
            let aux = options.index("aux", usize::from(model.auxes)).ok()?;
            learned.set("input", accessors::get_aux_source(state, aux)?);
        }
        FeedbackId::UskSource => {
            let me = options.index("mixeffect", mes).ok()?;
            let key = options.index("key", usize::from(model.usks)).ok()?;
            learned.set("fill", accessors::get_upstream_keyer(state, me, key)?.fill_source);
        }
        FeedbackId::DskSource => {
            let dsk = options.index("key", usize::from(model.dsks)).ok()?;
            let sources = accessors::get_downstream_keyer(state, dsk)?.sources?;
            learned.set("fill", sources.fill_source);
        }
        FeedbackId::TransitionStyle => {
            let me = options.index("mixeffect", mes).ok()?;
            let props = accessors::get_transition_properties(state, me)?;
            learned.set("style", props.next_style.to_string());
        }
        FeedbackId::TransitionSelection => {
            let me = options.index("mixeffect", mes).ok()?;
            let props = accessors::get_transition_properties(state, me)?;
            learned.set(
                "selection",
                pickers::selection_to_list(props.next_selection, model.usks),
            );
        }
        FeedbackId::TransitionRate => {
            let me = options.index("mixeffect", mes).ok()?;
            let style: TransitionStyle = options.choice("style").ok()?;
            let rate = accessors::get_transition_settings(state, me)?.rate_for(style)?;
            learned.set("rate", rate);
        }
        FeedbackId::SsrcArtSource => {
            let ssrc = options.index("ssrcId", usize::from(model.super_sources)).ok()?;
            let props = accessors::get_super_source_properties(state, ssrc)?;
            learned.set("fill", props.art_fill_source);
        }
        FeedbackId::SsrcBoxSource | FeedbackId::SsrcBoxProperties => {
            let ssrc = options.index("ssrcId", usize::from(model.super_sources)).ok()?;
            let box_index = options
                .index("boxIndex", usize::from(SUPER_SOURCE_BOXES))
                .ok()?;
            let ssrc_box = accessors::get_super_source_box(state, ssrc, box_index)?;
            if id == FeedbackId::SsrcBoxSource {
                learned.set("source", ssrc_box.source);
            } else {
                learned.set("size", ssrc_box.size);
                learned.set("x", ssrc_box.x);
                learned.set("y", ssrc_box.y);
                learned.set("cropped", ssrc_box.cropped);
            }
        }
        FeedbackId::MediaPlayerSource => {
            let player = options
                .index("mediaplayer", usize::from(model.media.players))
                .ok()?;
            let mp = accessors::get_media_player(state, player)?;
            let source = match mp.source_type {
                MediaSourceType::Still => crate::device::MediaSource::Still(mp.still_index),
                MediaSourceType::Clip => crate::device::MediaSource::Clip(mp.clip_index),
            };
            learned.set("source", pickers::media_source_key(source));
        }
        FeedbackId::MvSource => {
            let mv = options
                .index("multiViewerId", usize::from(model.multiviewers))
                .ok()?;
            let window = options
                .index("windowIndex", usize::from(model.multiviewer_windows))
                .ok()?;
            learned.set("source", accessors::get_multiviewer_window(state, mv, window)?.source);
        }
        FeedbackId::ClassicAudioGain | FeedbackId::ClassicAudioMixOption => {
            let input = u16::try_from(options.integer("input").ok()?).ok()?;
            let channel = accessors::get_classic_audio_channel(state, input)?;
            if id == FeedbackId::ClassicAudioGain {
                learned.set("gain", channel.gain);
            } else {
                learned.set("option", channel.mix_option.to_string());
            }
        }
        FeedbackId::FairlightFaderGain | FeedbackId::FairlightMixOption => {
            let (input, source) = fairlight_source(options).ok()?;
            let props = accessors::get_fairlight_source(state, input, source)?;
            if id == FeedbackId::FairlightFaderGain {
                learned.set("gain", props.fader_gain);
            } else {
                learned.set("option", props.mix_option.to_string());
            }
        }
        FeedbackId::AudioRouting => {
            let output = u32::try_from(options.integer("output").ok()?).ok()?;
            learned.set(
                "source",
                accessors::get_audio_routing_output(state, output)?.source_id,
            );
        }
        _ => return None,
    }
    Some(learned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{auto_detect_default, get_model_spec, ModelId};
    use crate::options::NoVariables;
    use crate::state::TallyState;
    use std::collections::BTreeMap;

    fn ctx<'a>(model: &'a ModelSpec, state: &'a AtemState, tally: &'a TallySnapshot) -> FeedbackContext<'a> {
        FeedbackContext {
            model,
            state,
            tally,
            parser: &NoVariables,
        }
    }

    #[test]
    fn test_blocks_follow_capabilities() {
        let auto = auto_detect_default();
        let ids: Vec<FeedbackId> = definitions(auto, None).iter().map(|d| d.id).collect();
        assert!(ids.contains(&FeedbackId::ProgramBg));
        assert!(!ids.contains(&FeedbackId::SsrcBoxOnAir));
        assert!(!ids.contains(&FeedbackId::MvSource));
        assert!(!ids.contains(&FeedbackId::StreamStatus));

        let extreme = get_model_spec(ModelId::MINI_EXTREME_ISO).unwrap();
        let ids: Vec<FeedbackId> = definitions(extreme, None).iter().map(|d| d.id).collect();
        assert!(ids.contains(&FeedbackId::SsrcBoxOnAir));
        assert!(ids.contains(&FeedbackId::FairlightFaderGain));
        assert!(ids.contains(&FeedbackId::RecordIso));
        assert!(!ids.contains(&FeedbackId::ClassicAudioGain));
    }

    #[test]
    fn test_program_feedback_is_scoped_to_me() {
        let model = get_model_spec(ModelId::TWO_ME).unwrap();
        let mut state = AtemState::for_model(model);
        if let Some(Some(me)) = state.video.mix_effects.get_mut(1) {
            me.program_input = 1000;
        }
        let tally = TallySnapshot::default();
        let c = ctx(model, &state, &tally);

        let on_me2 = OptionValues::new().with("mixeffect", 1).with("input", 1000);
        let on_me1 = OptionValues::new().with("mixeffect", 0).with("input", 1000);
        assert_eq!(evaluate(FeedbackId::ProgramBg, &on_me2, &c), FeedbackValue::Boolean(true));
        assert_eq!(evaluate(FeedbackId::ProgramBg, &on_me1, &c), FeedbackValue::Boolean(false));
    }

    #[test]
    fn test_bad_options_evaluate_false() {
        let model = auto_detect_default();
        let state = AtemState::for_model(model);
        let tally = TallySnapshot::default();
        let c = ctx(model, &state, &tally);
        let out_of_range = OptionValues::new().with("mixeffect", 3).with("input", 0);
        assert!(!evaluate(FeedbackId::ProgramBg, &out_of_range, &c).is_active());
        let garbage = OptionValues::new().with("mixeffect", "x1").with("input", "bars");
        assert!(!evaluate(FeedbackId::ProgramBgVariables, &garbage, &c).is_active());
    }

    #[test]
    fn test_input_tally_reads_snapshot() {
        let model = auto_detect_default();
        let state = AtemState::for_model(model);
        let mut sources = BTreeMap::new();
        sources.insert(2, TallyState { program: false, preview: true });
        let tally = TallySnapshot { version: 1, sources };
        let c = ctx(model, &state, &tally);

        let preview = OptionValues::new().with("input", 2).with("tally", "preview");
        let program = OptionValues::new().with("input", 2).with("tally", "program");
        assert!(evaluate(FeedbackId::InputTally, &preview, &c).is_active());
        assert!(!evaluate(FeedbackId::InputTally, &program, &c).is_active());
    }

    #[test]
    fn test_learn_then_evaluate_is_active() {
        let model = get_model_spec(ModelId::TWO_ME).unwrap();
        let mut state = AtemState::for_model(model);
        if let Some(Some(me)) = state.video.mix_effects.get_mut(0) {
            me.preview_input = 3;
            me.transition_properties.next_style = TransitionStyle::Wipe;
        }
        let tally = TallySnapshot::default();
        let c = ctx(model, &state, &tally);

        for id in [FeedbackId::PreviewBg, FeedbackId::TransitionStyle, FeedbackId::TransitionRate] {
            let options = OptionValues::new()
                .with("mixeffect", 0)
                .with("input", 1)
                .with("style", "Wipe")
                .with("rate", 1);
            let learned = learn(id, &options, model, &state).unwrap();
            assert!(evaluate(id, &learned, &c).is_active(), "{} after learn", id);
        }
    }

    #[test]
    fn test_program_label_shows_short_name() {
        let model = auto_detect_default();
        let mut state = AtemState::for_model(model);
        if let Some(Some(me)) = state.video.mix_effects.get_mut(0) {
            me.program_input = 1000;
        }
        let tally = TallySnapshot::default();
        let c = ctx(model, &state, &tally);
        let value = evaluate(
            FeedbackId::ProgramSourceLabel,
            &OptionValues::new().with("mixeffect", 0),
            &c,
        );
        match value {
            FeedbackValue::Style(style) => assert_eq!(style.text.as_deref(), Some("Bars")),
            other => panic!("unexpected {:?}", other),
        }
    }
}
