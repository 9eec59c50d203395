//! Variable definitions and values
//!
//! Variables are computed per [`VariableGroup`] so the engine can recompute exactly the groups a
//! change touches. Names use 1-based numbering; source ids are kept as-is.

use crate::engine::VariableGroup;
use crate::host::VariableDefinition;
use crate::models::ModelSpec;
use crate::options::pickers::SUPER_SOURCE_BOXES;
use crate::options::routing;
use crate::sources;
use crate::state::{
    accessors, AtemState, MediaSourceType, FAIRLIGHT_COMBINED_SOURCE,
    FAIRLIGHT_SPLIT_LEFT_SOURCE, FAIRLIGHT_SPLIT_RIGHT_SOURCE,
};
use std::collections::BTreeMap;

/// One variable with its current value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variable {
    pub id: String,
    pub name: String,
    pub value: String,
}

impl Variable {
    fn new(id: String, name: String, value: impl Into<String>) -> Self {
        Self {
            id,
            name,
            value: value.into(),
        }
    }
}

/// Every group this model exposes. Fairlight sources follow the live split when known.
pub fn groups(model: &ModelSpec, state: Option<&AtemState>) -> Vec<VariableGroup> {
    let mut groups = vec![VariableGroup::InputNames];

    for me in 0..model.mixeffects {
        groups.extend([
            VariableGroup::MeProgram { me },
            VariableGroup::MePreview { me },
            VariableGroup::TransitionPosition { me },
            VariableGroup::Transition { me },
            VariableGroup::FadeToBlack { me },
        ]);
        groups.extend((0..model.usks).map(|key| VariableGroup::UpstreamKeyer { me, key }));
    }
    groups.extend((0..model.dsks).map(|dsk| VariableGroup::DownstreamKeyer { dsk }));
    groups.extend((0..model.auxes).map(|aux| VariableGroup::Aux { aux }));
    for ssrc in 0..model.super_sources {
        groups.extend(
            (0..SUPER_SOURCE_BOXES).map(|box_index| VariableGroup::SuperSourceBox { ssrc, box_index }),
        );
    }
    groups.extend((0..model.media.players).map(|player| VariableGroup::MediaPlayer { player }));
    if model.macros > 0 {
        groups.extend((0..model.macros).map(|index| VariableGroup::Macro { index }));
        groups.push(VariableGroup::MacroState);
    }
    for mv in 0..model.multiviewers {
        groups.extend(
            (0..model.multiviewer_windows).map(|w| VariableGroup::Multiviewer {
                mv,
                window: Some(w),
            }),
        );
    }

    if let Some(classic) = model.classic_audio() {
        groups.extend(
            classic
                .inputs
                .iter()
                .map(|input| VariableGroup::ClassicAudio { input: input.id }),
        );
        groups.push(VariableGroup::ClassicAudioMaster);
    }
    if let Some(fairlight) = model.fairlight_audio() {
        for input in &fairlight.inputs {
            for source in fairlight_sources(state, input.id) {
                groups.push(VariableGroup::FairlightSource {
                    input: input.id,
                    source,
                });
            }
        }
        groups.push(VariableGroup::FairlightMaster);
        if fairlight.monitor.is_some() {
            groups.push(VariableGroup::FairlightMonitor);
        }
        if let Some(routing_spec) = &fairlight.audio_routing {
            groups.extend(routing_spec.outputs.iter().flat_map(|endpoint| {
                endpoint.channel_pairs.iter().map(move |pair| VariableGroup::AudioRouting {
                    output: Some(routing::routing_id(endpoint.id, *pair)),
                })
            }));
        }
    }

    if model.streaming {
        groups.push(VariableGroup::Streaming);
    }
    if model.recording {
        groups.push(VariableGroup::Recording);
    }
    groups
}

fn fairlight_sources(state: Option<&AtemState>, input: u16) -> Vec<i64> {
    let live: Vec<i64> = state
        .and_then(|s| accessors::get_fairlight_input(s, input))
        .map(|i| i.sources.keys().copied().collect())
        .unwrap_or_default();
    if live.is_empty() {
        vec![FAIRLIGHT_COMBINED_SOURCE]
    } else {
        live
    }
}

pub fn definitions(model: &ModelSpec, state: Option<&AtemState>) -> Vec<VariableDefinition> {
    groups(model, state)
        .into_iter()
        .flat_map(|group| variables(group, model, state))
        .map(|v| VariableDefinition {
            variable_id: v.id,
            name: v.name,
        })
        .collect()
}

/// Current values of every variable
pub fn all_values(model: &ModelSpec, state: &AtemState) -> BTreeMap<String, String> {
    groups(model, Some(state))
        .into_iter()
        .flat_map(|group| values_for(group, model, state))
        .collect()
}

/// Current values of one group. Groups that address every unit of a kind (`window: None`,
/// `output: None`) expand to all of them.
pub fn values_for(
    group: VariableGroup,
    model: &ModelSpec,
    state: &AtemState,
) -> BTreeMap<String, String> {
    let expanded: Vec<VariableGroup> = match group {
        VariableGroup::Multiviewer { mv, window: None } => (0..model.multiviewer_windows)
            .map(|w| VariableGroup::Multiviewer { mv, window: Some(w) })
            .collect(),
        VariableGroup::AudioRouting { output: None } => groups(model, Some(state))
            .into_iter()
            .filter(|g| matches!(g, VariableGroup::AudioRouting { .. }))
            .collect(),
        other => vec![other],
    };
    expanded
        .into_iter()
        .flat_map(|g| variables(g, model, Some(state)))
        .map(|v| (v.id, v.value))
        .collect()
}

fn flag(on: bool) -> &'static str {
    if on {
        "true"
    } else {
        "false"
    }
}

fn short_name(state: Option<&AtemState>, id: u16) -> String {
    sources::source_info(state, id).short_name
}

fn gain(value: f64) -> String {
    format!("{:.1}", value)
}

/// Variables of one group, valued from `state` when present
fn variables(group: VariableGroup, model: &ModelSpec, state: Option<&AtemState>) -> Vec<Variable> {
    let s = state;
    match group {
        VariableGroup::InputNames => model
            .inputs
            .iter()
            .flat_map(|input| {
                let info = sources::source_info(s, input.id);
                [
                    Variable::new(
                        format!("long_{}", input.id),
                        format!("Long name of source id {}", input.id),
                        info.long_name,
                    ),
                    Variable::new(
                        format!("short_{}", input.id),
                        format!("Short name of source id {}", input.id),
                        info.short_name,
                    ),
                ]
            })
            .collect(),
        VariableGroup::MeProgram { me } | VariableGroup::MePreview { me } => {
            let program = matches!(group, VariableGroup::MeProgram { .. });
            let (prefix, label) = if program {
                ("pgm", "program")
            } else {
                ("pvw", "preview")
            };
            let source = s.and_then(|st| accessors::get_mix_effect(st, me)).map(|m| {
                if program {
                    m.program_input
                } else {
                    m.preview_input
                }
            });
            let n = me + 1;
            vec![
                Variable::new(
                    format!("{}{}_input", prefix, n),
                    format!("Label of input active on {} bus (M/E {})", label, n),
                    source.map(|id| short_name(s, id)).unwrap_or_default(),
                ),
                Variable::new(
                    format!("{}{}_input_id", prefix, n),
                    format!("Id of input active on {} bus (M/E {})", label, n),
                    source.map(|id| id.to_string()).unwrap_or_default(),
                ),
            ]
        }
        VariableGroup::TransitionPosition { me } => {
            let position = s
                .and_then(|st| accessors::get_mix_effect(st, me))
                .map(|m| (m.transition_position.handle_position / 100).to_string());
            vec![Variable::new(
                format!("tbar_{}", me + 1),
                format!("T-bar position of M/E {}", me + 1),
                position.unwrap_or_default(),
            )]
        }
        VariableGroup::Transition { me } => {
            let props = s.and_then(|st| accessors::get_transition_properties(st, me));
            let rate = s
                .and_then(|st| accessors::get_transition_settings(st, me))
                .zip(props)
                .and_then(|(settings, p)| settings.rate_for(p.next_style));
            vec![
                Variable::new(
                    format!("transition_{}_style", me + 1),
                    format!("Next transition style of M/E {}", me + 1),
                    props.map(|p| p.next_style.to_string()).unwrap_or_default(),
                ),
                Variable::new(
                    format!("transition_{}_rate", me + 1),
                    format!("Next transition rate of M/E {}", me + 1),
                    rate.map(|r| r.to_string()).unwrap_or_default(),
                ),
            ]
        }
        VariableGroup::FadeToBlack { me } => {
            let value = s.and_then(|st| accessors::get_fade_to_black(st, me)).map(|f| {
                if f.in_transition {
                    "fading"
                } else if f.is_fully_black {
                    "on"
                } else {
                    "off"
                }
            });
            vec![Variable::new(
                format!("ftb_{}", me + 1),
                format!("Fade to black state of M/E {}", me + 1),
                value.unwrap_or_default(),
            )]
        }
        VariableGroup::UpstreamKeyer { me, key } => {
            let keyer = s.and_then(|st| accessors::get_upstream_keyer(st, me, key));
            let (m, k) = (me + 1, key + 1);
            vec![
                Variable::new(
                    format!("usk_{}_{}_input", m, k),
                    format!("Label of input active on M/E {} upstream key {}", m, k),
                    keyer.map(|u| short_name(s, u.fill_source)).unwrap_or_default(),
                ),
                Variable::new(
                    format!("usk_{}_{}_on_air", m, k),
                    format!("On air state of M/E {} upstream key {}", m, k),
                    keyer.map(|u| flag(u.on_air)).unwrap_or_default(),
                ),
            ]
        }
        VariableGroup::DownstreamKeyer { dsk } => {
            let keyer = s.and_then(|st| accessors::get_downstream_keyer(st, dsk));
            let n = dsk + 1;
            vec![
                Variable::new(
                    format!("dsk_{}_input", n),
                    format!("Label of input active on downstream key {}", n),
                    keyer
                        .and_then(|k| k.sources)
                        .map(|src| short_name(s, src.fill_source))
                        .unwrap_or_default(),
                ),
                Variable::new(
                    format!("dsk_{}_on_air", n),
                    format!("On air state of downstream key {}", n),
                    keyer.map(|k| flag(k.on_air)).unwrap_or_default(),
                ),
            ]
        }
        VariableGroup::Aux { aux } => {
            let source = s.and_then(|st| accessors::get_aux_source(st, aux));
            let n = aux + 1;
            vec![
                Variable::new(
                    format!("aux{}_input", n),
                    format!("Label of input active on Aux {}", n),
                    source.map(|id| short_name(s, id)).unwrap_or_default(),
                ),
                Variable::new(
                    format!("aux{}_input_id", n),
                    format!("Id of input active on Aux {}", n),
                    source.map(|id| id.to_string()).unwrap_or_default(),
                ),
            ]
        }
        VariableGroup::SuperSourceBox { ssrc, box_index } => {
            let ssrc_box = s.and_then(|st| accessors::get_super_source_box(st, ssrc, box_index));
            let (n, b) = (ssrc + 1, box_index + 1);
            vec![
                Variable::new(
                    format!("ssrc{}_box{}_source", n, b),
                    format!("Label of source in SuperSource {} box {}", n, b),
                    ssrc_box.map(|bx| short_name(s, bx.source)).unwrap_or_default(),
                ),
                Variable::new(
                    format!("ssrc{}_box{}_enabled", n, b),
                    format!("SuperSource {} box {} enabled", n, b),
                    ssrc_box.map(|bx| flag(bx.enabled)).unwrap_or_default(),
                ),
            ]
        }
        VariableGroup::MediaPlayer { player } => {
            let mp = s.and_then(|st| accessors::get_media_player(st, player));
            let n = player + 1;
            let (name, index, kind) = match (s, mp) {
                (Some(st), Some(mp)) => match mp.source_type {
                    MediaSourceType::Still => (
                        accessors::get_still(st, mp.still_index)
                            .map(|still| still.file_name.clone())
                            .unwrap_or_default(),
                        (mp.still_index + 1).to_string(),
                        "still",
                    ),
                    MediaSourceType::Clip => (
                        accessors::get_clip(st, mp.clip_index)
                            .map(|clip| clip.name.clone())
                            .unwrap_or_default(),
                        (u16::from(mp.clip_index) + 1).to_string(),
                        "clip",
                    ),
                },
                _ => (String::new(), String::new(), ""),
            };
            vec![
                Variable::new(
                    format!("mp{}_source", n),
                    format!("Name of still or clip on media player {}", n),
                    name,
                ),
                Variable::new(
                    format!("mp{}_index", n),
                    format!("Slot loaded on media player {}", n),
                    index,
                ),
                Variable::new(
                    format!("mp{}_type", n),
                    format!("Still or clip on media player {}", n),
                    kind,
                ),
            ]
        }
        VariableGroup::Macro { index } => {
            let name = s
                .and_then(|st| accessors::get_macro(st, index))
                .filter(|m| m.is_used)
                .map(|m| m.name.clone());
            vec![Variable::new(
                format!("macro_{}_name", index + 1),
                format!("Name of macro {}", index + 1),
                name.unwrap_or_default(),
            )]
        }
        VariableGroup::MacroState => {
            let running = s
                .map(accessors::get_macro_player)
                .filter(|p| p.is_running)
                .map(|p| (p.macro_index + 1).to_string());
            let recording = s
                .map(accessors::get_macro_recorder)
                .filter(|r| r.is_recording)
                .map(|r| (r.macro_index + 1).to_string());
            vec![
                Variable::new(
                    "macro_running".to_string(),
                    "Number of the running macro".to_string(),
                    running.unwrap_or_default(),
                ),
                Variable::new(
                    "macro_recording".to_string(),
                    "Number of the macro being recorded".to_string(),
                    recording.unwrap_or_default(),
                ),
            ]
        }
        VariableGroup::Multiviewer { mv, window } => {
            let windows: Vec<u8> = match window {
                Some(w) => vec![w],
                None => (0..model.multiviewer_windows).collect(),
            };
            windows
                .into_iter()
                .map(|w| {
                    let source = s
                        .and_then(|st| accessors::get_multiviewer_window(st, mv, w))
                        .map(|win| short_name(s, win.source));
                    Variable::new(
                        format!("mv{}_window{}_source", mv + 1, w + 1),
                        format!("Label of source in multiviewer {} window {}", mv + 1, w + 1),
                        source.unwrap_or_default(),
                    )
                })
                .collect()
        }
        VariableGroup::ClassicAudio { input } => {
            let channel = s.and_then(|st| accessors::get_classic_audio_channel(st, input));
            vec![
                Variable::new(
                    format!("audio_input_{}_gain", input),
                    format!("Gain of audio input {} (dB)", input),
                    channel.map(|c| gain(c.gain)).unwrap_or_default(),
                ),
                Variable::new(
                    format!("audio_input_{}_balance", input),
                    format!("Balance of audio input {}", input),
                    channel.map(|c| gain(c.balance)).unwrap_or_default(),
                ),
            ]
        }
        VariableGroup::ClassicAudioMaster => vec![Variable::new(
            "audio_master_gain".to_string(),
            "Master audio gain (dB)".to_string(),
            s.and_then(accessors::get_classic_audio_master)
                .map(|m| gain(m.gain))
                .unwrap_or_default(),
        )],
        VariableGroup::FairlightSource { input, source } => {
            let suffix = match source {
                FAIRLIGHT_SPLIT_LEFT_SOURCE => "_left",
                FAIRLIGHT_SPLIT_RIGHT_SOURCE => "_right",
                _ => "",
            };
            let props = s.and_then(|st| accessors::get_fairlight_source(st, input, source));
            vec![
                Variable::new(
                    format!("fairlight_audio_input_{}{}_fader", input, suffix),
                    format!("Fader gain of Fairlight input {}{} (dB)", input, suffix),
                    props.map(|p| gain(p.fader_gain)).unwrap_or_default(),
                ),
                Variable::new(
                    format!("fairlight_audio_input_{}{}_gain", input, suffix),
                    format!("Input gain of Fairlight input {}{} (dB)", input, suffix),
                    props.map(|p| gain(p.gain)).unwrap_or_default(),
                ),
            ]
        }
        VariableGroup::FairlightMaster => vec![Variable::new(
            "fairlight_audio_master_gain".to_string(),
            "Fairlight master fader gain (dB)".to_string(),
            s.and_then(accessors::get_fairlight_master)
                .map(|m| gain(m.fader_gain))
                .unwrap_or_default(),
        )],
        VariableGroup::FairlightMonitor => vec![Variable::new(
            "fairlight_audio_monitor_gain".to_string(),
            "Fairlight monitor gain (dB)".to_string(),
            s.and_then(accessors::get_fairlight_monitor)
                .map(|m| gain(m.gain))
                .unwrap_or_default(),
        )],
        VariableGroup::AudioRouting { output: Some(output) } => {
            let Some((endpoint, pair)) = routing::split_routing_id(output) else {
                return Vec::new();
            };
            let source = s
                .and_then(|st| accessors::get_audio_routing_output(st, output))
                .map(|o| routing::format_audio_routing_string(o.source_id));
            vec![Variable::new(
                format!("audio_routing_output_{}_{}", endpoint, pair.label()),
                format!("Source routed to audio output {} ({})", endpoint, pair.label()),
                source.unwrap_or_default(),
            )]
        }
        VariableGroup::AudioRouting { output: None } => Vec::new(),
        VariableGroup::Streaming => {
            let streaming = s.and_then(accessors::get_streaming);
            let duration = streaming.and_then(|st| st.duration);
            let stats = streaming.and_then(|st| st.stats);
            vec![
                Variable::new(
                    "stream_status".to_string(),
                    "Streaming status".to_string(),
                    s.and_then(accessors::get_streaming_status)
                        .map(|st| st.to_string())
                        .unwrap_or_default(),
                ),
                Variable::new(
                    "stream_duration_hms".to_string(),
                    "Streaming duration (hh:mm:ss)".to_string(),
                    duration.map(|d| d.to_hms()).unwrap_or_default(),
                ),
                Variable::new(
                    "stream_duration_hm".to_string(),
                    "Streaming duration (hh:mm)".to_string(),
                    duration.map(|d| d.to_hm()).unwrap_or_default(),
                ),
                Variable::new(
                    "stream_bitrate".to_string(),
                    "Streaming bitrate (Mbps)".to_string(),
                    stats
                        .map(|st| format!("{:.2}", st.encoding_bitrate as f64 / 1_000_000.0))
                        .unwrap_or_default(),
                ),
                Variable::new(
                    "stream_cache".to_string(),
                    "Streaming cache used (%)".to_string(),
                    stats.map(|st| st.cache_used.to_string()).unwrap_or_default(),
                ),
            ]
        }
        VariableGroup::Recording => {
            let recording = s.and_then(accessors::get_recording);
            let duration = recording.and_then(|r| r.duration);
            vec![
                Variable::new(
                    "record_status".to_string(),
                    "Recording status".to_string(),
                    s.and_then(accessors::get_recording_status)
                        .map(|st| st.to_string())
                        .unwrap_or_default(),
                ),
                Variable::new(
                    "record_duration_hms".to_string(),
                    "Recording duration (hh:mm:ss)".to_string(),
                    duration.map(|d| d.to_hms()).unwrap_or_default(),
                ),
                Variable::new(
                    "record_duration_hm".to_string(),
                    "Recording duration (hh:mm)".to_string(),
                    duration.map(|d| d.to_hm()).unwrap_or_default(),
                ),
                Variable::new(
                    "record_filename".to_string(),
                    "Recording file name".to_string(),
                    recording
                        .and_then(|r| r.properties.as_ref())
                        .map(|p| p.filename.clone())
                        .unwrap_or_default(),
                ),
            ]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        auto_detect_default, get_model_spec, InternalPortType, MeAvailability, ModelId,
        SourceAvailability,
    };
    use crate::state::InputChannel;

    #[test]
    fn test_definitions_match_values() {
        let model = get_model_spec(ModelId::CONSTELLATION_HD_4ME).unwrap();
        let state = AtemState::for_model(model);
        let defs: Vec<String> = definitions(model, Some(&state))
            .into_iter()
            .map(|d| d.variable_id)
            .collect();
        let values = all_values(model, &state);
        assert_eq!(defs.len(), values.len());
        assert!(defs.iter().all(|id| values.contains_key(id)));
        assert!(values.contains_key("pgm4_input"));
        assert!(!values.contains_key("pgm5_input"));
    }

    #[test]
    fn test_program_uses_live_short_name() {
        let model = get_model_spec(ModelId::TWO_ME).unwrap();
        let mut state = AtemState::for_model(model);
        state.inputs.insert(
            1,
            InputChannel {
                input_id: 1,
                long_name: "Camera 1".into(),
                short_name: "CAM1".into(),
                are_names_default: false,
                internal_port_type: InternalPortType::External,
                source_availability: SourceAvailability::ALL,
                me_availability: MeAvailability::default(),
            },
        );
        if let Some(Some(me)) = state.video.mix_effects.get_mut(0) {
            me.program_input = 1;
        }
        if let Some(Some(me)) = state.video.mix_effects.get_mut(1) {
            me.program_input = 1000;
        }
        let me1 = values_for(VariableGroup::MeProgram { me: 0 }, model, &state);
        let me2 = values_for(VariableGroup::MeProgram { me: 1 }, model, &state);
        assert_eq!(me1.get("pgm1_input").map(String::as_str), Some("CAM1"));
        assert_eq!(me2.get("pgm2_input").map(String::as_str), Some("Bars"));
        assert_eq!(me2.get("pgm2_input_id").map(String::as_str), Some("1000"));
        assert_eq!(me1.len(), 2);
    }

    #[test]
    fn test_multiviewer_group_expands() {
        let model = get_model_spec(ModelId::TWO_ME).unwrap();
        let state = AtemState::for_model(model);
        let all = values_for(VariableGroup::Multiviewer { mv: 0, window: None }, model, &state);
        assert_eq!(all.len(), usize::from(model.multiviewer_windows));
        let one = values_for(
            VariableGroup::Multiviewer {
                mv: 0,
                window: Some(2),
            },
            model,
            &state,
        );
        assert_eq!(one.keys().collect::<Vec<_>>(), vec!["mv1_window3_source"]);
    }

    #[test]
    fn test_auto_default_has_no_optional_blocks() {
        let ids: Vec<String> = definitions(auto_detect_default(), None)
            .into_iter()
            .map(|d| d.variable_id)
            .collect();
        assert!(ids.iter().any(|id| id == "aux1_input"));
        assert!(!ids.iter().any(|id| id.starts_with("stream_")));
        assert!(!ids.iter().any(|id| id.starts_with("ssrc")));
    }
}
