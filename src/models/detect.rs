//! Best-effort model descriptors for hardware the static table does not know

use super::topology::{SourceAvailability, VideoInputGenerator, VideoInputInfo};
use super::{
    AudioInputInfo, AudioPortType, AudioSpec, ClassicAudioSpec, FairlightAudioSpec,
    FairlightInputInfo, FairlightMonitorSpec, MediaPoolSpec, ModelSpec,
};
use crate::state::AtemState;
use tracing::debug;

/// Synthesize a [`ModelSpec`] from what a connected device reports about itself.
///
/// Counts come from the capability report. The topology comes from the device's own input
/// table when it has sent one (so per-input availability is exact), and from the topology
/// builder otherwise. Audio port types are guessed from the id ranges.
pub fn model_spec_from_device(state: &AtemState) -> ModelSpec {
    let info = &state.info;
    let caps = info.capabilities.unwrap_or_default();

    let mixeffects = caps.mix_effects.max(1);
    let usks = info
        .mix_effects
        .iter()
        .flatten()
        .map(|me| me.key_count)
        .max()
        .unwrap_or(0);
    let (multiviewers, multiviewer_windows) = info
        .multiviewer
        .map(|mv| (mv.count, mv.window_count))
        .unwrap_or((0, 0));

    let inputs = if state.inputs.is_empty() {
        // No input table yet: audio channels 1..1000 mirror the physical inputs
        let audio_ids: Vec<u16> = match (&state.fairlight, &state.audio) {
            (Some(fairlight), _) => fairlight.inputs.keys().copied().collect(),
            (None, Some(classic)) => classic.channels.keys().copied().collect(),
            (None, None) => Vec::new(),
        };
        let external = match audio_ids.iter().filter(|id| (1..1000).contains(*id)).count() {
            0 => 4,
            n => n as u16,
        };
        VideoInputGenerator::begin(mixeffects, SourceAvailability::ALL)
            .add_internal_colors_and_black(true)
            .add_external_inputs(external)
            .add_media_players(caps.media_players)
            .add_super_sources(caps.super_sources)
            .add_auxiliary_outputs(caps.auxiliaries)
            .add_multiviewers(multiviewers)
            .add_program_preview()
            .generate()
    } else {
        state
            .inputs
            .values()
            .map(|input| VideoInputInfo {
                id: input.input_id,
                port_type: input.internal_port_type,
                source_availability: input.source_availability,
                me_availability: input.me_availability,
            })
            .collect()
    };

    let audio = if let Some(fairlight) = &state.fairlight {
        AudioSpec::Fairlight(FairlightAudioSpec {
            inputs: fairlight
                .inputs
                .keys()
                .map(|&id| FairlightInputInfo {
                    id,
                    port_type: guess_audio_port(id),
                    max_delay: None,
                })
                .collect(),
            monitor: fairlight.monitor.map(|_| FairlightMonitorSpec::Monitor),
            audio_routing: None,
        })
    } else if let Some(classic) = &state.audio {
        AudioSpec::Classic(ClassicAudioSpec {
            inputs: classic
                .channels
                .keys()
                .map(|&id| AudioInputInfo {
                    id,
                    port_type: guess_audio_port(id),
                })
                .collect(),
        })
    } else {
        AudioSpec::None
    };

    let label = info
        .product_identifier
        .clone()
        .unwrap_or_else(|| format!("Unknown model {}", info.model));

    let spec = ModelSpec {
        id: info.model,
        label,
        auxes: caps.auxiliaries,
        mixeffects,
        usks,
        dsks: caps.downstream_keyers,
        multiviewers,
        multiviewer_windows,
        super_sources: caps.super_sources,
        macros: info.macro_pool.map(|p| p.macro_count).unwrap_or(0),
        media: MediaPoolSpec {
            players: caps.media_players,
            stills: info.media_pool.map(|p| p.still_count).unwrap_or(0),
            clips: info.media_pool.map(|p| p.clip_count).unwrap_or(0),
        },
        streaming: state.streaming.is_some(),
        recording: state.recording.is_some(),
        record_iso: false,
        inputs,
        audio,
    };

    debug!(
        "Synthesized model '{}': {} M/E, {} aux, {} sources",
        spec.label,
        spec.mixeffects,
        spec.auxes,
        spec.inputs.len()
    );
    spec
}

fn guess_audio_port(id: u16) -> AudioPortType {
    match id {
        1001 => AudioPortType::Xlr,
        1101 => AudioPortType::AesEbu,
        1201 => AudioPortType::Rca,
        1301..=1399 => AudioPortType::Mic,
        1401..=1499 => AudioPortType::TrsJack,
        1501..=1599 => AudioPortType::Madi,
        2001..=2999 => AudioPortType::MediaPlayer,
        _ => AudioPortType::Sdi,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{get_model_spec, ModelId};
    use crate::state::{DeviceCapabilities, DeviceInfo, InputChannel};

    #[test]
    fn test_synthesizes_from_capabilities() {
        let state = AtemState {
            info: DeviceInfo {
                model: ModelId(99),
                capabilities: Some(DeviceCapabilities {
                    mix_effects: 2,
                    auxiliaries: 3,
                    media_players: 2,
                    super_sources: 1,
                    downstream_keyers: 2,
                    ..DeviceCapabilities::default()
                }),
                ..DeviceInfo::default()
            },
            ..AtemState::default()
        };
        let spec = model_spec_from_device(&state);
        assert_eq!(spec.id, ModelId(99));
        assert_eq!(spec.label, "Unknown model 99");
        assert_eq!(spec.mixeffects, 2);
        assert_eq!(spec.aux_loopback_ids().count(), 3);
        assert_eq!(spec.audio, AudioSpec::None);
    }

    #[test]
    fn test_uses_reported_input_table() {
        let known = get_model_spec(ModelId::MINI_EXTREME).unwrap();
        let mut state = AtemState::for_model(known);
        state.info.model = ModelId(120);
        state.info.product_identifier = Some("ATEM Future".to_string());
        for input in &known.inputs {
            state.inputs.insert(
                input.id,
                InputChannel {
                    input_id: input.id,
                    long_name: format!("Source {}", input.id),
                    short_name: format!("S{}", input.id),
                    are_names_default: true,
                    internal_port_type: input.port_type,
                    source_availability: input.source_availability,
                    me_availability: input.me_availability,
                },
            );
        }

        let spec = model_spec_from_device(&state);
        assert_eq!(spec.label, "ATEM Future");
        assert_eq!(spec.inputs, known.inputs);
        assert_eq!(spec.auxes, known.auxes);
        assert!(spec.fairlight_audio().is_some());
        assert!(spec.streaming);
    }
}
