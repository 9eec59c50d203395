//! Action definitions, command building and learn
//!
//! Building never touches the device: it turns option values plus the current state into the
//! commands to send (or a fade to schedule). Relative actions ("toggle", "delta") read their
//! base value from the state. Anything that does not resolve is an [`OptionError`] and the
//! caller skips the action.

use crate::device::{MediaSource, SuperSourceArtUpdate, SuperSourceBoxUpdate, SwitcherCommand};
use crate::error::OptionError;
use crate::fade::{FadeRequest, FadeTarget};
use crate::feedbacks;
use crate::host::ActionDefinition;
use crate::models::ModelSpec;
use crate::options::pickers::{self, ToggleMode, MAX_FADE_MS, SUPER_SOURCE_BOXES};
use crate::options::{routing, OptionField, OptionValues, VariableParser};
use crate::sources::SourceContext;
use crate::state::{
    accessors, AtemState, AudioMixOption, KeyType, MediaSourceType, RecordingStatusState,
    StreamingStatusState, TransitionStyle,
};
use serde::{Deserialize, Serialize};

const CLASSIC_GAIN_RANGE: (f64, f64) = (-60.0, 6.0);
const FAIRLIGHT_GAIN_RANGE: (f64, f64) = (-100.0, 10.0);

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
pub enum ActionId {
    Program,
    Preview,
    ProgramVariables,
    PreviewVariables,
    Cut,
    Auto,
    TransitionStyle,
    TransitionRate,
    TransitionSelection,
    PreviewTransition,
    FadeToBlackAuto,
    FadeToBlackRate,
    UskOnAir,
    UskSources,
    UskType,
    DskOnAir,
    DskAuto,
    DskTie,
    DskSources,
    Aux,
    AuxVariables,
    SsrcBoxOnAir,
    SsrcBoxSource,
    SsrcBoxSourceVariables,
    SsrcBoxProperties,
    SsrcArt,
    MediaPlayerSource,
    MultiviewerWindowSource,
    MacroRun,
    MacroContinue,
    MacroStop,
    MacroLoop,
    ClassicAudioMixOption,
    ClassicAudioGain,
    ClassicAudioGainDelta,
    ClassicAudioMasterGain,
    FairlightMixOption,
    FairlightFaderGain,
    FairlightFaderGainDelta,
    FairlightMasterGain,
    FairlightMonitorGain,
    AudioRouting,
    AudioRoutingVariables,
    StreamStartStop,
    RecordStartStop,
    RecordIso,
}

impl ActionId {
    pub fn is_learnable(self) -> bool {
        matches!(
            self,
            ActionId::Program
                | ActionId::Preview
                | ActionId::TransitionStyle
                | ActionId::TransitionRate
                | ActionId::TransitionSelection
                | ActionId::PreviewTransition
                | ActionId::FadeToBlackRate
                | ActionId::UskOnAir
                | ActionId::UskSources
                | ActionId::UskType
                | ActionId::DskOnAir
                | ActionId::DskTie
                | ActionId::DskSources
                | ActionId::Aux
                | ActionId::SsrcBoxOnAir
                | ActionId::SsrcBoxSource
                | ActionId::SsrcBoxProperties
                | ActionId::SsrcArt
                | ActionId::MediaPlayerSource
                | ActionId::MultiviewerWindowSource
                | ActionId::MacroLoop
                | ActionId::ClassicAudioMixOption
                | ActionId::ClassicAudioGain
                | ActionId::ClassicAudioMasterGain
                | ActionId::FairlightMixOption
                | ActionId::FairlightFaderGain
                | ActionId::FairlightMasterGain
                | ActionId::FairlightMonitorGain
                | ActionId::AudioRouting
                | ActionId::RecordIso
        )
    }
}

/// What running an action amounts to
#[derive(Debug, Clone, PartialEq)]
pub enum ActionPlan {
    Commands(Vec<SwitcherCommand>),
    Fade(FadeRequest),
}

impl ActionPlan {
    fn one(command: SwitcherCommand) -> Self {
        ActionPlan::Commands(vec![command])
    }
}

/// Everything an action may read while building
pub struct ActionContext<'a> {
    pub model: &'a ModelSpec,
    pub state: &'a AtemState,
    pub parser: &'a dyn VariableParser,
}

fn action(id: ActionId, name: &str, options: Vec<OptionField>) -> ActionDefinition {
    ActionDefinition {
        id,
        name: name.to_string(),
        options,
        learnable: id.is_learnable(),
    }
}

/// Action definitions for `model`. Blocks the model lacks are left out entirely.
pub fn definitions(model: &ModelSpec, state: Option<&AtemState>) -> Vec<ActionDefinition> {
    let me = pickers::mix_effect_picker(model);
    let me_source = pickers::mix_effect_source_picker(model, state);
    let me_text = pickers::mix_effect_text_picker();
    let mut defs = vec![
        action(ActionId::Program, "Set input on program", vec![me.clone(), me_source.clone()]),
        action(ActionId::Preview, "Set input on preview", vec![me.clone(), me_source]),
        action(
            ActionId::ProgramVariables,
            "Set input on program (variables)",
            vec![me_text.clone(), pickers::source_text_picker("input", "Input ID")],
        ),
        action(
            ActionId::PreviewVariables,
            "Set input on preview (variables)",
            vec![me_text, pickers::source_text_picker("input", "Input ID")],
        ),
        action(ActionId::Cut, "Cut", vec![me.clone()]),
        action(ActionId::Auto, "Auto transition", vec![me.clone()]),
        action(
            ActionId::TransitionStyle,
            "Set transition style",
            vec![me.clone(), pickers::transition_style_picker()],
        ),
        action(
            ActionId::TransitionRate,
            "Set transition rate",
            vec![
                me.clone(),
                pickers::transition_style_picker(),
                pickers::transition_rate_picker(),
            ],
        ),
        action(
            ActionId::TransitionSelection,
            "Set transition selection",
            vec![me.clone(), pickers::transition_selection_picker(model)],
        ),
        action(
            ActionId::PreviewTransition,
            "Preview transition",
            vec![me.clone(), pickers::toggle_picker("state", "State")],
        ),
        action(ActionId::FadeToBlackAuto, "Fade to black", vec![me.clone()]),
        action(
            ActionId::FadeToBlackRate,
            "Set fade to black rate",
            vec![me.clone(), pickers::transition_rate_picker()],
        ),
    ];

    if model.usks > 0 {
        let key = pickers::upstream_keyer_picker(model);
        defs.extend([
            action(
                ActionId::UskOnAir,
                "Set upstream key on air",
                vec![me.clone(), key.clone(), pickers::toggle_picker("onair", "On Air")],
            ),
            action(
                ActionId::UskSources,
                "Set upstream key sources",
                vec![
                    me.clone(),
                    key.clone(),
                    pickers::source_picker(model, state, SourceContext::KeySource, "fill", "Fill"),
                    pickers::source_picker(model, state, SourceContext::KeySource, "cut", "Key"),
                ],
            ),
            action(
                ActionId::UskType,
                "Set upstream key type",
                vec![me.clone(), key, pickers::key_type_picker()],
            ),
        ]);
    }

    if model.dsks > 0 {
        let dsk = pickers::downstream_keyer_picker(model);
        defs.extend([
            action(
                ActionId::DskOnAir,
                "Set downstream key on air",
                vec![dsk.clone(), pickers::toggle_picker("onair", "On Air")],
            ),
            action(ActionId::DskAuto, "Auto downstream key", vec![dsk.clone()]),
            action(
                ActionId::DskTie,
                "Set downstream key tie",
                vec![dsk.clone(), pickers::toggle_picker("state", "Tie")],
            ),
            action(
                ActionId::DskSources,
                "Set downstream key sources",
                vec![
                    dsk,
                    pickers::source_picker(model, state, SourceContext::KeySource, "fill", "Fill"),
                    pickers::source_picker(model, state, SourceContext::KeySource, "cut", "Key"),
                ],
            ),
        ]);
    }

    if model.auxes > 0 {
        defs.extend([
            action(
                ActionId::Aux,
                "Set aux source",
                vec![
                    pickers::aux_picker(model),
                    pickers::source_picker(model, state, SourceContext::Auxiliary, "input", "Input"),
                ],
            ),
            action(
                ActionId::AuxVariables,
                "Set aux source (variables)",
                vec![
                    pickers::aux_text_picker(),
                    pickers::source_text_picker("input", "Input ID"),
                ],
            ),
        ]);
    }

    if model.super_sources > 0 {
        let ssrc = pickers::super_source_picker(model);
        let box_index = pickers::super_source_box_picker();
        let box_source =
            pickers::source_picker(model, state, SourceContext::SuperSourceBox, "source", "Source");
        defs.extend([
            action(
                ActionId::SsrcBoxOnAir,
                "Set SuperSource box enabled",
                vec![
                    ssrc.clone(),
                    box_index.clone(),
                    pickers::toggle_picker("onair", "Enabled"),
                ],
            ),
            action(
                ActionId::SsrcBoxSource,
                "Set SuperSource box source",
                vec![ssrc.clone(), box_index.clone(), box_source],
            ),
            action(
                ActionId::SsrcBoxSourceVariables,
                "Set SuperSource box source (variables)",
                vec![
                    OptionField::text("ssrcId", "Super Source", "1"),
                    OptionField::text("boxIndex", "Box #", "1"),
                    pickers::source_text_picker("source", "Source ID"),
                ],
            ),
            action(
                ActionId::SsrcBoxProperties,
                "Set SuperSource box properties",
                vec![ssrc.clone(), box_index]
                    .into_iter()
                    .chain(feedbacks::super_source_geometry_fields())
                    .collect(),
            ),
            action(
                ActionId::SsrcArt,
                "Set SuperSource art sources",
                vec![
                    ssrc,
                    pickers::source_picker(model, state, SourceContext::SuperSourceArt, "fill", "Fill"),
                    pickers::source_picker(model, state, SourceContext::SuperSourceArt, "cut", "Key"),
                ],
            ),
        ]);
    }

    if model.media.players > 0 {
        defs.push(action(
            ActionId::MediaPlayerSource,
            "Set media player source",
            vec![
                pickers::media_player_picker(model),
                pickers::media_source_picker(model, state),
            ],
        ));
    }

    if model.multiviewers > 0 {
        defs.push(action(
            ActionId::MultiviewerWindowSource,
            "Set multiviewer window source",
            vec![
                pickers::multiviewer_picker(model),
                pickers::multiviewer_window_picker(model),
                pickers::source_picker(model, state, SourceContext::Multiviewer, "source", "Source"),
            ],
        ));
    }

    if model.macros > 0 {
        defs.extend([
            action(ActionId::MacroRun, "Run macro", vec![pickers::macro_picker(model, state)]),
            action(ActionId::MacroContinue, "Continue macro", Vec::new()),
            action(ActionId::MacroStop, "Stop macro", Vec::new()),
            action(
                ActionId::MacroLoop,
                "Set macro loop",
                vec![pickers::toggle_picker("state", "Loop")],
            ),
        ]);
    }

    if model.classic_audio().is_some() {
        let input = pickers::classic_audio_input_picker(model, state);
        defs.extend([
            action(
                ActionId::ClassicAudioMixOption,
                "Set audio mix option",
                vec![input.clone(), pickers::mix_option_picker()],
            ),
            action(
                ActionId::ClassicAudioGain,
                "Set audio gain",
                vec![
                    input.clone(),
                    pickers::gain_picker("gain", "Gain (dB)", false),
                    pickers::fade_duration_picker(),
                ],
            ),
            action(
                ActionId::ClassicAudioGainDelta,
                "Adjust audio gain",
                vec![
                    input,
                    pickers::gain_delta_picker(),
                    pickers::fade_duration_picker(),
                ],
            ),
            action(
                ActionId::ClassicAudioMasterGain,
                "Set master audio gain",
                vec![
                    pickers::gain_picker("gain", "Gain (dB)", false),
                    pickers::fade_duration_picker(),
                ],
            ),
        ]);
    }

    if let Some(fairlight) = model.fairlight_audio() {
        let source = pickers::fairlight_source_picker(model, state);
        defs.extend([
            action(
                ActionId::FairlightMixOption,
                "Set Fairlight mix option",
                vec![source.clone(), pickers::mix_option_picker()],
            ),
            action(
                ActionId::FairlightFaderGain,
                "Set Fairlight fader gain",
                vec![
                    source.clone(),
                    pickers::gain_picker("gain", "Fader gain (dB)", true),
                    pickers::fade_duration_picker(),
                ],
            ),
            action(
                ActionId::FairlightFaderGainDelta,
                "Adjust Fairlight fader gain",
                vec![
                    source,
                    pickers::gain_delta_picker(),
                    pickers::fade_duration_picker(),
                ],
            ),
            action(
                ActionId::FairlightMasterGain,
                "Set Fairlight master gain",
                vec![
                    pickers::gain_picker("gain", "Gain (dB)", true),
                    pickers::fade_duration_picker(),
                ],
            ),
        ]);
        if fairlight.monitor.is_some() {
            defs.push(action(
                ActionId::FairlightMonitorGain,
                "Set Fairlight monitor gain",
                vec![pickers::gain_picker("gain", "Gain (dB)", true)],
            ));
        }
        if fairlight.audio_routing.is_some() {
            defs.extend([
                action(
                    ActionId::AudioRouting,
                    "Set audio routing",
                    vec![
                        pickers::audio_routing_source_picker(model, state),
                        pickers::audio_routing_output_picker(model, state),
                    ],
                ),
                action(
                    ActionId::AudioRoutingVariables,
                    "Set audio routing (variables)",
                    vec![
                        pickers::audio_routing_text_picker("source", "Source"),
                        pickers::audio_routing_text_picker("outputs", "Outputs"),
                    ],
                ),
            ]);
        }
    }

    if model.streaming {
        defs.push(action(
            ActionId::StreamStartStop,
            "Start or stop streaming",
            vec![pickers::toggle_picker("state", "Stream")],
        ));
    }
    if model.recording {
        defs.push(action(
            ActionId::RecordStartStop,
            "Start or stop recording",
            vec![pickers::toggle_picker("state", "Record")],
        ));
    }
    if model.record_iso {
        defs.push(action(
            ActionId::RecordIso,
            "Record all inputs",
            vec![pickers::toggle_picker("state", "ISO")],
        ));
    }

    defs
}

/// An integer option within `-max..=max` that also fits `T`
fn ranged<T: TryFrom<i64>>(options: &OptionValues, key: &str, max: i64) -> Result<T, OptionError> {
    let value = options.integer(key)?;
    let out_of_range = || OptionError::OutOfRange {
        key: key.to_string(),
        value,
        max,
    };
    if value.abs() > max {
        return Err(out_of_range());
    }
    T::try_from(value).map_err(|_| out_of_range())
}

fn gain_in(options: &OptionValues, key: &str, (min, max): (f64, f64)) -> Result<f64, OptionError> {
    Ok(options.number(key)?.clamp(min, max))
}

fn fade_ms(options: &OptionValues) -> u32 {
    options.number_or("fadeDuration", 0.0).clamp(0.0, MAX_FADE_MS) as u32
}

/// An immediate gain change, or a fade when a duration is set and the start gain is known
fn gain_plan(target: FadeTarget, current: Option<f64>, gain: f64, duration_ms: u32) -> ActionPlan {
    match current {
        Some(from) if duration_ms > 0 && from.is_finite() => ActionPlan::Fade(FadeRequest {
            target,
            from,
            to: gain,
            duration_ms,
        }),
        _ => ActionPlan::one(target.command(gain)),
    }
}

/// Turn an action invocation into device commands
pub fn build_commands(
    id: ActionId,
    options: &OptionValues,
    ctx: &ActionContext,
) -> Result<ActionPlan, OptionError> {
    let model = ctx.model;
    let state = ctx.state;
    let mes = usize::from(model.mixeffects);
    let absent = || OptionError::StateUnavailable;

    let plan = match id {
        ActionId::Program | ActionId::Preview => {
            let me = options.index("mixeffect", mes)?;
            let source = options.source("input", model, SourceContext::MixEffect(me))?;
            ActionPlan::one(if id == ActionId::Program {
                SwitcherCommand::ProgramInput { me, source }
            } else {
                SwitcherCommand::PreviewInput { me, source }
            })
        }
        ActionId::ProgramVariables | ActionId::PreviewVariables => {
            let me = options.resolve_index("mixeffect", mes, ctx.parser)?;
            let source =
                options.resolve_source("input", model, SourceContext::MixEffect(me), ctx.parser)?;
            ActionPlan::one(if id == ActionId::ProgramVariables {
                SwitcherCommand::ProgramInput { me, source }
            } else {
                SwitcherCommand::PreviewInput { me, source }
            })
        }
        ActionId::Cut => ActionPlan::one(SwitcherCommand::Cut {
            me: options.index("mixeffect", mes)?,
        }),
        ActionId::Auto => ActionPlan::one(SwitcherCommand::AutoTransition {
            me: options.index("mixeffect", mes)?,
        }),
        ActionId::TransitionStyle => ActionPlan::one(SwitcherCommand::TransitionStyle {
            me: options.index("mixeffect", mes)?,
            style: options.choice("style")?,
        }),
        ActionId::TransitionRate => {
            let me = options.index("mixeffect", mes)?;
            let style: TransitionStyle = options.choice("style")?;
            if style == TransitionStyle::Sting {
                return Err(OptionError::Unsupported);
            }
            ActionPlan::one(SwitcherCommand::TransitionRate {
                me,
                style,
                rate: ranged(options, "rate", 250)?,
            })
        }
        ActionId::TransitionSelection => {
            let me = options.index("mixeffect", mes)?;
            let selection = pickers::selection_from_list(&options.list("selection"));
            if selection.0 == 0 {
                return Err(OptionError::UnknownChoice {
                    key: "selection".to_string(),
                    value: String::new(),
                });
            }
            ActionPlan::one(SwitcherCommand::TransitionSelection { me, selection })
        }
        ActionId::PreviewTransition => {
            let me = options.index("mixeffect", mes)?;
            let mode: ToggleMode = options.choice("state")?;
            let current = accessors::get_mix_effect(state, me).ok_or_else(absent)?;
            ActionPlan::one(SwitcherCommand::PreviewTransition {
                me,
                on: mode.apply(current.transition_preview),
            })
        }
        ActionId::FadeToBlackAuto => ActionPlan::one(SwitcherCommand::FadeToBlackAuto {
            me: options.index("mixeffect", mes)?,
        }),
        ActionId::FadeToBlackRate => ActionPlan::one(SwitcherCommand::FadeToBlackRate {
            me: options.index("mixeffect", mes)?,
            rate: ranged(options, "rate", 250)?,
        }),
        ActionId::UskOnAir => {
            let me = options.index("mixeffect", mes)?;
            let key = options.index("key", usize::from(model.usks))?;
            let mode: ToggleMode = options.choice("onair")?;
            let current = accessors::get_upstream_keyer(state, me, key).ok_or_else(absent)?;
            ActionPlan::one(SwitcherCommand::UpstreamKeyerOnAir {
                me,
                key,
                on_air: mode.apply(current.on_air),
            })
        }
        ActionId::UskSources => {
            let me = options.index("mixeffect", mes)?;
            let key = options.index("key", usize::from(model.usks))?;
            let fill = options.source("fill", model, SourceContext::KeySource)?;
            let cut = options.source("cut", model, SourceContext::KeySource)?;
            ActionPlan::Commands(vec![
                SwitcherCommand::UpstreamKeyerFillSource {
                    me,
                    key,
                    source: fill,
                },
                SwitcherCommand::UpstreamKeyerCutSource {
                    me,
                    key,
                    source: cut,
                },
            ])
        }
        ActionId::UskType => ActionPlan::one(SwitcherCommand::UpstreamKeyerType {
            me: options.index("mixeffect", mes)?,
            key: options.index("key", usize::from(model.usks))?,
            key_type: options.choice::<KeyType>("keyType")?,
        }),
        ActionId::DskOnAir => {
            let dsk = options.index("key", usize::from(model.dsks))?;
            let mode: ToggleMode = options.choice("onair")?;
            let current = accessors::get_downstream_keyer(state, dsk).ok_or_else(absent)?;
            ActionPlan::one(SwitcherCommand::DownstreamKeyerOnAir {
                dsk,
                on_air: mode.apply(current.on_air),
            })
        }
        ActionId::DskAuto => ActionPlan::one(SwitcherCommand::DownstreamKeyerAuto {
            dsk: options.index("key", usize::from(model.dsks))?,
        }),
        ActionId::DskTie => {
            let dsk = options.index("key", usize::from(model.dsks))?;
            let mode: ToggleMode = options.choice("state")?;
            let tie = accessors::get_downstream_keyer(state, dsk)
                .and_then(|k| k.properties)
                .map(|p| p.tie)
                .ok_or_else(absent)?;
            ActionPlan::one(SwitcherCommand::DownstreamKeyerTie {
                dsk,
                tie: mode.apply(tie),
            })
        }
        ActionId::DskSources => {
            let dsk = options.index("key", usize::from(model.dsks))?;
            let fill = options.source("fill", model, SourceContext::KeySource)?;
            let cut = options.source("cut", model, SourceContext::KeySource)?;
            ActionPlan::Commands(vec![
                SwitcherCommand::DownstreamKeyerFillSource { dsk, source: fill },
                SwitcherCommand::DownstreamKeyerCutSource { dsk, source: cut },
            ])
        }
        ActionId::Aux => ActionPlan::one(SwitcherCommand::AuxSource {
            aux: options.index("aux", usize::from(model.auxes))?,
            source: options.source("input", model, SourceContext::Auxiliary)?,
        }),
        ActionId::AuxVariables => ActionPlan::one(SwitcherCommand::AuxSource {
            aux: options.resolve_index("aux", usize::from(model.auxes), ctx.parser)?,
            source: options.resolve_source("input", model, SourceContext::Auxiliary, ctx.parser)?,
        }),
        ActionId::SsrcBoxOnAir => {
            let ssrc = options.index("ssrcId", usize::from(model.super_sources))?;
            let box_index = options.index("boxIndex", usize::from(SUPER_SOURCE_BOXES))?;
            let mode: ToggleMode = options.choice("onair")?;
            let current =
                accessors::get_super_source_box(state, ssrc, box_index).ok_or_else(absent)?;
            ActionPlan::one(SwitcherCommand::SuperSourceBox {
                ssrc,
                box_index,
                update: SuperSourceBoxUpdate {
                    enabled: Some(mode.apply(current.enabled)),
                    ..Default::default()
                },
            })
        }
        ActionId::SsrcBoxSource => ActionPlan::one(SwitcherCommand::SuperSourceBox {
            ssrc: options.index("ssrcId", usize::from(model.super_sources))?,
            box_index: options.index("boxIndex", usize::from(SUPER_SOURCE_BOXES))?,
            update: SuperSourceBoxUpdate {
                source: Some(options.source("source", model, SourceContext::SuperSourceBox)?),
                ..Default::default()
            },
        }),
        ActionId::SsrcBoxSourceVariables => {
            let ssrc =
                options.resolve_index("ssrcId", usize::from(model.super_sources), ctx.parser)?;
            let box_index =
                options.resolve_index("boxIndex", usize::from(SUPER_SOURCE_BOXES), ctx.parser)?;
            let source =
                options.resolve_source("source", model, SourceContext::SuperSourceBox, ctx.parser)?;
            ActionPlan::one(SwitcherCommand::SuperSourceBox {
                ssrc,
                box_index,
                update: SuperSourceBoxUpdate {
                    source: Some(source),
                    ..Default::default()
                },
            })
        }
        ActionId::SsrcBoxProperties => ActionPlan::one(SwitcherCommand::SuperSourceBox {
            ssrc: options.index("ssrcId", usize::from(model.super_sources))?,
            box_index: options.index("boxIndex", usize::from(SUPER_SOURCE_BOXES))?,
            update: SuperSourceBoxUpdate {
                size: Some(ranged(options, "size", 1000)?),
                x: Some(ranged(options, "x", 4800)?),
                y: Some(ranged(options, "y", 2700)?),
                cropped: Some(options.boolean("cropped")?),
                ..Default::default()
            },
        }),
        ActionId::SsrcArt => ActionPlan::one(SwitcherCommand::SuperSourceArt {
            ssrc: options.index("ssrcId", usize::from(model.super_sources))?,
            update: SuperSourceArtUpdate {
                fill_source: Some(options.source("fill", model, SourceContext::SuperSourceArt)?),
                cut_source: Some(options.source("cut", model, SourceContext::SuperSourceArt)?),
                foreground: None,
            },
        }),
        ActionId::MediaPlayerSource => {
            let player = options.index("mediaplayer", usize::from(model.media.players))?;
            let text = options.text("source")?;
            let source = pickers::parse_media_source_key(&text).ok_or(OptionError::UnknownChoice {
                key: "source".to_string(),
                value: text,
            })?;
            let in_pool = match source {
                MediaSource::Still(i) => i < model.media.stills,
                MediaSource::Clip(i) => i < model.media.clips,
            };
            if !in_pool {
                return Err(OptionError::Unsupported);
            }
            ActionPlan::one(SwitcherCommand::MediaPlayerSource { player, source })
        }
        ActionId::MultiviewerWindowSource => ActionPlan::one(SwitcherCommand::MultiviewerWindowSource {
            mv: options.index("multiViewerId", usize::from(model.multiviewers))?,
            window: options.index("windowIndex", usize::from(model.multiviewer_windows))?,
            source: options.source("source", model, SourceContext::Multiviewer)?,
        }),
        ActionId::MacroRun => ActionPlan::one(SwitcherCommand::MacroRun {
            index: options.index_u16("macro", usize::from(model.macros))?,
        }),
        ActionId::MacroContinue => ActionPlan::one(SwitcherCommand::MacroContinue),
        ActionId::MacroStop => ActionPlan::one(SwitcherCommand::MacroStop),
        ActionId::MacroLoop => {
            let mode: ToggleMode = options.choice("state")?;
            ActionPlan::one(SwitcherCommand::MacroLoop {
                looping: mode.apply(accessors::get_macro_player(state).looping),
            })
        }
        ActionId::ClassicAudioMixOption => {
            let input = classic_input(options, model)?;
            ActionPlan::one(SwitcherCommand::ClassicAudioMixOption {
                input,
                option: options.choice::<AudioMixOption>("option")?,
            })
        }
        ActionId::ClassicAudioGain | ActionId::ClassicAudioGainDelta => {
            let input = classic_input(options, model)?;
            let current = accessors::get_classic_audio_channel(state, input).map(|c| c.gain);
            let gain = if id == ActionId::ClassicAudioGain {
                gain_in(options, "gain", CLASSIC_GAIN_RANGE)?
            } else {
                let base = current.filter(|g| g.is_finite()).ok_or_else(absent)?;
                (base + options.number("delta")?).clamp(CLASSIC_GAIN_RANGE.0, CLASSIC_GAIN_RANGE.1)
            };
            gain_plan(FadeTarget::ClassicInput(input), current, gain, fade_ms(options))
        }
        ActionId::ClassicAudioMasterGain => {
            let current = accessors::get_classic_audio_master(state).map(|m| m.gain);
            let gain = gain_in(options, "gain", CLASSIC_GAIN_RANGE)?;
            gain_plan(FadeTarget::ClassicMaster, current, gain, fade_ms(options))
        }
        ActionId::FairlightMixOption => {
            let (input, source) = fairlight_target(options, model)?;
            ActionPlan::one(SwitcherCommand::FairlightMixOption {
                input,
                source,
                option: options.choice::<AudioMixOption>("option")?,
            })
        }
        ActionId::FairlightFaderGain | ActionId::FairlightFaderGainDelta => {
            let (input, source) = fairlight_target(options, model)?;
            let current =
                accessors::get_fairlight_source(state, input, source).map(|p| p.fader_gain);
            let gain = if id == ActionId::FairlightFaderGain {
                gain_in(options, "gain", FAIRLIGHT_GAIN_RANGE)?
            } else {
                let base = current.filter(|g| g.is_finite()).ok_or_else(absent)?;
                (base + options.number("delta")?)
                    .clamp(FAIRLIGHT_GAIN_RANGE.0, FAIRLIGHT_GAIN_RANGE.1)
            };
            gain_plan(
                FadeTarget::FairlightSource { input, source },
                current,
                gain,
                fade_ms(options),
            )
        }
        ActionId::FairlightMasterGain => {
            let current = accessors::get_fairlight_master(state).map(|m| m.fader_gain);
            let gain = gain_in(options, "gain", FAIRLIGHT_GAIN_RANGE)?;
            gain_plan(FadeTarget::FairlightMaster, current, gain, fade_ms(options))
        }
        ActionId::FairlightMonitorGain => ActionPlan::one(SwitcherCommand::FairlightMonitorGain {
            gain: gain_in(options, "gain", FAIRLIGHT_GAIN_RANGE)?,
        }),
        ActionId::AudioRouting => {
            let source: u32 = ranged(options, "source", i64::from(u32::MAX))?;
            let outputs: Vec<u32> = options
                .list("outputs")
                .iter()
                .filter_map(|o| o.parse().ok())
                .collect();
            routing_plan(model, source, outputs)?
        }
        ActionId::AudioRoutingVariables => {
            let source_text = ctx.parser.parse_variables(&options.text("source")?);
            let source = routing::parse_audio_routing_string_single(&source_text).ok_or(
                OptionError::NotANumber {
                    key: "source".to_string(),
                    value: source_text.clone(),
                },
            )?;
            let outputs_text = ctx.parser.parse_variables(&options.text("outputs")?);
            routing_plan(model, source, routing::parse_audio_routing_string(&outputs_text))?
        }
        ActionId::StreamStartStop => {
            let mode: ToggleMode = options.choice("state")?;
            let live = matches!(
                accessors::get_streaming_status(state),
                Some(StreamingStatusState::Streaming | StreamingStatusState::Connecting)
            );
            ActionPlan::one(if mode.apply(live) {
                SwitcherCommand::StartStreaming
            } else {
                SwitcherCommand::StopStreaming
            })
        }
        ActionId::RecordStartStop => {
            let mode: ToggleMode = options.choice("state")?;
            let live = matches!(
                accessors::get_recording_status(state),
                Some(RecordingStatusState::Recording)
            );
            ActionPlan::one(if mode.apply(live) {
                SwitcherCommand::StartRecording
            } else {
                SwitcherCommand::StopRecording
            })
        }
        ActionId::RecordIso => {
            let mode: ToggleMode = options.choice("state")?;
            let current = accessors::get_recording(state)
                .and_then(|r| r.properties.as_ref())
                .map(|p| p.record_in_all_cameras)
                .ok_or_else(absent)?;
            ActionPlan::one(SwitcherCommand::RecordInAllCameras {
                enabled: mode.apply(current),
            })
        }
    };
    Ok(plan)
}

fn classic_input(options: &OptionValues, model: &ModelSpec) -> Result<u16, OptionError> {
    let input: u16 = ranged(options, "input", i64::from(u16::MAX))?;
    let known = model
        .classic_audio()
        .is_some_and(|c| c.inputs.iter().any(|i| i.id == input));
    if known {
        Ok(input)
    } else {
        Err(OptionError::InvalidSource { source_id: input })
    }
}

fn fairlight_target(options: &OptionValues, model: &ModelSpec) -> Result<(u16, i64), OptionError> {
    let (input, source) = feedbacks::fairlight_source(options)?;
    let known = model
        .fairlight_audio()
        .is_some_and(|f| f.inputs.iter().any(|i| i.id == input));
    if known {
        Ok((input, source))
    } else {
        Err(OptionError::InvalidSource { source_id: input })
    }
}

/// One routing command per output, all from the same source
fn routing_plan(model: &ModelSpec, source: u32, outputs: Vec<u32>) -> Result<ActionPlan, OptionError> {
    let Some(routing_spec) = model.fairlight_audio().and_then(|f| f.audio_routing.as_ref()) else {
        return Err(OptionError::Unsupported);
    };
    let listed = |endpoints: &[crate::models::AudioRoutingEndpoint], id: u32| {
        routing::split_routing_id(id).is_some_and(|(endpoint, pair)| {
            endpoints
                .iter()
                .any(|e| e.id == endpoint && e.channel_pairs.contains(&pair))
        })
    };
    if !listed(&routing_spec.sources, source) {
        return Err(OptionError::UnknownChoice {
            key: "source".to_string(),
            value: routing::format_audio_routing_string(source),
        });
    }
    let commands: Vec<SwitcherCommand> = outputs
        .into_iter()
        .filter(|output| listed(&routing_spec.outputs, *output))
        .map(|output| SwitcherCommand::AudioRouting { output, source })
        .collect();
    if commands.is_empty() {
        return Err(OptionError::Missing("outputs".to_string()));
    }
    Ok(ActionPlan::Commands(commands))
}

/// Options that would reproduce the current state, or `None` when the action has no learn or the
/// addressed unit has no state yet
pub fn learn(
    id: ActionId,
    options: &OptionValues,
    model: &ModelSpec,
    state: &AtemState,
) -> Option<OptionValues> {
    let mes = usize::from(model.mixeffects);
    let mut learned = options.clone();
    match id {
        ActionId::Program | ActionId::Preview => {
            let me = options.index("mixeffect", mes).ok()?;
            let current = accessors::get_mix_effect(state, me)?;
            learned.set(
                "input",
                if id == ActionId::Program {
                    current.program_input
                } else {
                    current.preview_input
                },
            );
        }
        ActionId::TransitionStyle => {
            let me = options.index("mixeffect", mes).ok()?;
            let props = accessors::get_transition_properties(state, me)?;
            learned.set("style", props.next_style.to_string());
        }
        ActionId::TransitionRate => {
            let me = options.index("mixeffect", mes).ok()?;
            let style = accessors::get_transition_properties(state, me)?.next_style;
            let rate = accessors::get_transition_settings(state, me)?.rate_for(style)?;
            learned.set("style", style.to_string());
            learned.set("rate", rate);
        }
        ActionId::TransitionSelection => {
            let me = options.index("mixeffect", mes).ok()?;
            let props = accessors::get_transition_properties(state, me)?;
            learned.set(
                "selection",
                pickers::selection_to_list(props.next_selection, model.usks),
            );
        }
        ActionId::PreviewTransition => {
            let me = options.index("mixeffect", mes).ok()?;
            let current = accessors::get_mix_effect(state, me)?.transition_preview;
            learned.set("state", ToggleMode::learn(current).to_string());
        }
        ActionId::FadeToBlackRate => {
            let me = options.index("mixeffect", mes).ok()?;
            learned.set("rate", accessors::get_fade_to_black(state, me)?.rate);
        }
        ActionId::UskOnAir | ActionId::UskSources | ActionId::UskType => {
            let me = options.index("mixeffect", mes).ok()?;
            let key = options.index("key", usize::from(model.usks)).ok()?;
            let keyer = accessors::get_upstream_keyer(state, me, key)?;
            match id {
                ActionId::UskOnAir => {
                    learned.set("onair", ToggleMode::learn(keyer.on_air).to_string())
                }
                ActionId::UskSources => {
                    learned.set("fill", keyer.fill_source);
                    learned.set("cut", keyer.cut_source);
                }
                _ => learned.set("keyType", keyer.mix_effect_key_type.to_string()),
            }
        }
        ActionId::DskOnAir | ActionId::DskTie | ActionId::DskSources => {
            let dsk = options.index("key", usize::from(model.dsks)).ok()?;
            let keyer = accessors::get_downstream_keyer(state, dsk)?;
            match id {
                ActionId::DskOnAir => {
                    learned.set("onair", ToggleMode::learn(keyer.on_air).to_string())
                }
                ActionId::DskTie => {
                    learned.set("state", ToggleMode::learn(keyer.properties?.tie).to_string())
                }
                _ => {
                    let sources = keyer.sources?;
                    learned.set("fill", sources.fill_source);
                    learned.set("cut", sources.cut_source);
                }
            }
        }
        ActionId::Aux => {
            let aux = options.index("aux", usize::from(model.auxes)).ok()?;
            learned.set("input", accessors::get_aux_source(state, aux)?);
        }
        ActionId::SsrcBoxOnAir | ActionId::SsrcBoxSource | ActionId::SsrcBoxProperties => {
            let ssrc = options.index("ssrcId", usize::from(model.super_sources)).ok()?;
            let box_index = options
                .index("boxIndex", usize::from(SUPER_SOURCE_BOXES))
                .ok()?;
            let ssrc_box = accessors::get_super_source_box(state, ssrc, box_index)?;
            match id {
                ActionId::SsrcBoxOnAir => {
                    learned.set("onair", ToggleMode::learn(ssrc_box.enabled).to_string())
                }
                ActionId::SsrcBoxSource => learned.set("source", ssrc_box.source),
                _ => {
                    learned.set("size", ssrc_box.size);
                    learned.set("x", ssrc_box.x);
                    learned.set("y", ssrc_box.y);
                    learned.set("cropped", ssrc_box.cropped);
                }
            }
        }
        ActionId::SsrcArt => {
            let ssrc = options.index("ssrcId", usize::from(model.super_sources)).ok()?;
            let props = accessors::get_super_source_properties(state, ssrc)?;
            learned.set("fill", props.art_fill_source);
            learned.set("cut", props.art_cut_source);
        }
        ActionId::MediaPlayerSource => {
            let player = options
                .index("mediaplayer", usize::from(model.media.players))
                .ok()?;
            let mp = accessors::get_media_player(state, player)?;
            let source = match mp.source_type {
                MediaSourceType::Still => MediaSource::Still(mp.still_index),
                MediaSourceType::Clip => MediaSource::Clip(mp.clip_index),
            };
            learned.set("source", pickers::media_source_key(source));
        }
        ActionId::MultiviewerWindowSource => {
            let mv = options
                .index("multiViewerId", usize::from(model.multiviewers))
                .ok()?;
            let window = options
                .index("windowIndex", usize::from(model.multiviewer_windows))
                .ok()?;
            learned.set("source", accessors::get_multiviewer_window(state, mv, window)?.source);
        }
        ActionId::MacroLoop => {
            let looping = accessors::get_macro_player(state).looping;
            learned.set("state", ToggleMode::learn(looping).to_string());
        }
        ActionId::ClassicAudioMixOption | ActionId::ClassicAudioGain => {
            let input = u16::try_from(options.integer("input").ok()?).ok()?;
            let channel = accessors::get_classic_audio_channel(state, input)?;
            if id == ActionId::ClassicAudioGain {
                learned.set("gain", channel.gain);
                learned.set("fadeDuration", 0);
            } else {
                learned.set("option", channel.mix_option.to_string());
            }
        }
        ActionId::ClassicAudioMasterGain => {
            learned.set("gain", accessors::get_classic_audio_master(state)?.gain);
            learned.set("fadeDuration", 0);
        }
        ActionId::FairlightMixOption | ActionId::FairlightFaderGain => {
            let (input, source) = feedbacks::fairlight_source(options).ok()?;
            let props = accessors::get_fairlight_source(state, input, source)?;
            if id == ActionId::FairlightFaderGain {
                learned.set("gain", props.fader_gain);
                learned.set("fadeDuration", 0);
            } else {
                learned.set("option", props.mix_option.to_string());
            }
        }
        ActionId::FairlightMasterGain => {
            learned.set("gain", accessors::get_fairlight_master(state)?.fader_gain);
            learned.set("fadeDuration", 0);
        }
        ActionId::FairlightMonitorGain => {
            learned.set("gain", accessors::get_fairlight_monitor(state)?.gain);
        }
        ActionId::AudioRouting => {
            let first: u32 = options.list("outputs").first()?.parse().ok()?;
            learned.set(
                "source",
                accessors::get_audio_routing_output(state, first)?.source_id,
            );
        }
        ActionId::RecordIso => {
            let iso = accessors::get_recording(state)?
                .properties
                .as_ref()?
                .record_in_all_cameras;
            learned.set("state", ToggleMode::learn(iso).to_string());
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
    use serde_json::json;

    struct Vars;

    impl VariableParser for Vars {
        fn parse_variables(&self, text: &str) -> String {
            text.replace("$(atem:me)", "2").replace("$(atem:src)", "1000")
        }
    }

    fn build(
        id: ActionId,
        options: &OptionValues,
        model: &ModelSpec,
        state: &AtemState,
    ) -> Result<ActionPlan, OptionError> {
        build_commands(
            id,
            options,
            &ActionContext {
                model,
                state,
                parser: &NoVariables,
            },
        )
    }

    #[test]
    fn test_program_rejects_later_me_output() {
        let model = get_model_spec(ModelId::TWO_ME).unwrap();
        let state = AtemState::for_model(model);
        let me2_program = OptionValues::new().with("mixeffect", 0).with("input", 10020);
        assert_eq!(
            build(ActionId::Program, &me2_program, model, &state),
            Err(OptionError::InvalidSource { source_id: 10020 })
        );
        let on_me2 = OptionValues::new().with("mixeffect", 1).with("input", 10010);
        assert_eq!(
            build(ActionId::Program, &on_me2, model, &state),
            Ok(ActionPlan::one(SwitcherCommand::ProgramInput {
                me: 1,
                source: 10010
            }))
        );
    }

    #[test]
    fn test_variables_action_resolves_and_rejects() {
        let model = get_model_spec(ModelId::TWO_ME).unwrap();
        let state = AtemState::for_model(model);
        let ctx = ActionContext {
            model,
            state: &state,
            parser: &Vars,
        };
        let options = OptionValues::new()
            .with("mixeffect", "$(atem:me)")
            .with("input", "$(atem:src)");
        assert_eq!(
            build_commands(ActionId::PreviewVariables, &options, &ctx),
            Ok(ActionPlan::one(SwitcherCommand::PreviewInput {
                me: 1,
                source: 1000
            }))
        );

        let garbage = OptionValues::new().with("mixeffect", "two").with("input", "1");
        assert!(build_commands(ActionId::PreviewVariables, &garbage, &ctx).is_err());
        let too_far = OptionValues::new().with("mixeffect", "3").with("input", "1");
        assert!(matches!(
            build_commands(ActionId::PreviewVariables, &too_far, &ctx),
            Err(OptionError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_toggle_reads_current_state() {
        let model = auto_detect_default();
        let mut state = AtemState::for_model(model);
        let options = OptionValues::new()
            .with("mixeffect", 0)
            .with("key", 0)
            .with("onair", "toggle");
        assert_eq!(
            build(ActionId::UskOnAir, &options, model, &state),
            Ok(ActionPlan::one(SwitcherCommand::UpstreamKeyerOnAir {
                me: 0,
                key: 0,
                on_air: true
            }))
        );
        if let Some(Some(me)) = state.video.mix_effects.get_mut(0) {
            if let Some(Some(keyer)) = me.upstream_keyers.get_mut(0) {
                keyer.on_air = true;
            }
        }
        assert_eq!(
            build(ActionId::UskOnAir, &options, model, &state),
            Ok(ActionPlan::one(SwitcherCommand::UpstreamKeyerOnAir {
                me: 0,
                key: 0,
                on_air: false
            }))
        );
    }

    #[test]
    fn test_gain_with_duration_fades() {
        let model = get_model_spec(ModelId::MINI).unwrap();
        let state = AtemState::for_model(model);
        let options = OptionValues::new()
            .with("source", "1:-65280")
            .with("gain", -20.0)
            .with("fadeDuration", 500);
        match build(ActionId::FairlightFaderGain, &options, model, &state) {
            Ok(ActionPlan::Fade(request)) => {
                assert_eq!(request.to, -20.0);
                assert_eq!(request.duration_ms, 500);
            }
            other => panic!("expected a fade, got {:?}", other),
        }

        let immediate = options.clone().with("fadeDuration", 0);
        assert!(matches!(
            build(ActionId::FairlightFaderGain, &immediate, model, &state),
            Ok(ActionPlan::Commands(_))
        ));
    }

    #[test]
    fn test_routing_variables_parse_strings() {
        let model = get_model_spec(ModelId::CONSTELLATION_HD_4ME).unwrap();
        let state = AtemState::for_model(model);
        let options = OptionValues::new()
            .with("source", "1")
            .with("outputs", "1-1_2, nonsense");
        match build(ActionId::AudioRoutingVariables, &options, model, &state) {
            Ok(ActionPlan::Commands(commands)) => assert_eq!(commands.len(), 1),
            other => panic!("unexpected {:?}", other),
        }
        let bad = options.clone().with("source", "9291-8_9");
        assert!(build(ActionId::AudioRoutingVariables, &bad, model, &state).is_err());
    }

    #[test]
    fn test_blocks_follow_capabilities() {
        let ids: Vec<ActionId> = definitions(auto_detect_default(), None)
            .iter()
            .map(|d| d.id)
            .collect();
        assert!(ids.contains(&ActionId::Aux));
        assert!(!ids.contains(&ActionId::SsrcBoxSource));
        assert!(!ids.contains(&ActionId::StreamStartStop));
        assert!(!ids.contains(&ActionId::ClassicAudioGain));
    }

    #[test]
    fn test_learn_fills_current_values() {
        let model = get_model_spec(ModelId::TWO_ME).unwrap();
        let mut state = AtemState::for_model(model);
        state.video.auxiliaries[2] = Some(3);
        let learned = learn(
            ActionId::Aux,
            &OptionValues::new().with("aux", 2).with("input", 1),
            model,
            &state,
        )
        .unwrap();
        assert_eq!(learned.raw("input"), Some(&json!(3)));
        assert!(learn(ActionId::Cut, &OptionValues::new(), model, &state).is_none());
    }
}
