//! Null-safe lookups into the live state tree
//!
//! Every getter is total: an out-of-range index, a missing branch or a hole left by a resync all
//! come back as `None`. Indices are 0-based throughout.

use super::types::*;

fn slot<T>(items: &[Option<T>], index: usize) -> Option<&T> {
    items.get(index).and_then(Option::as_ref)
}

pub fn get_mix_effect(state: &AtemState, me: u8) -> Option<&MixEffect> {
    slot(&state.video.mix_effects, usize::from(me))
}

pub fn get_upstream_keyer(state: &AtemState, me: u8, key: u8) -> Option<&UpstreamKeyer> {
    get_mix_effect(state, me).and_then(|m| slot(&m.upstream_keyers, usize::from(key)))
}

pub fn get_transition_properties(state: &AtemState, me: u8) -> Option<&TransitionProperties> {
    get_mix_effect(state, me).map(|m| &m.transition_properties)
}

pub fn get_transition_settings(state: &AtemState, me: u8) -> Option<&TransitionSettings> {
    get_mix_effect(state, me).map(|m| &m.transition_settings)
}

pub fn get_fade_to_black(state: &AtemState, me: u8) -> Option<&FadeToBlackProperties> {
    get_mix_effect(state, me).and_then(|m| m.fade_to_black.as_ref())
}

pub fn get_downstream_keyer(state: &AtemState, dsk: u8) -> Option<&DownstreamKeyer> {
    slot(&state.video.downstream_keyers, usize::from(dsk))
}

/// Source currently routed to an auxiliary output
pub fn get_aux_source(state: &AtemState, aux: u8) -> Option<u16> {
    state
        .video
        .auxiliaries
        .get(usize::from(aux))
        .copied()
        .flatten()
}

pub fn get_super_source(state: &AtemState, ssrc: u8) -> Option<&SuperSource> {
    slot(&state.video.super_sources, usize::from(ssrc))
}

pub fn get_super_source_box(state: &AtemState, ssrc: u8, box_index: u8) -> Option<&SuperSourceBox> {
    get_super_source(state, ssrc).and_then(|s| slot(&s.boxes, usize::from(box_index)))
}

pub fn get_super_source_properties(state: &AtemState, ssrc: u8) -> Option<&SuperSourceProperties> {
    get_super_source(state, ssrc).and_then(|s| s.properties.as_ref())
}

pub fn get_input(state: &AtemState, id: u16) -> Option<&InputChannel> {
    state.inputs.get(&id)
}

pub fn get_media_player(state: &AtemState, player: u8) -> Option<&MediaPlayerState> {
    slot(&state.media.players, usize::from(player))
}

pub fn get_still(state: &AtemState, index: u16) -> Option<&MediaPoolStill> {
    slot(&state.media.still_pool, usize::from(index))
}

pub fn get_clip(state: &AtemState, index: u8) -> Option<&MediaPoolClip> {
    slot(&state.media.clip_pool, usize::from(index))
}

pub fn get_multiviewer(state: &AtemState, mv: u8) -> Option<&MultiViewer> {
    slot(&state.settings.multi_viewers, usize::from(mv))
}

pub fn get_multiviewer_window(state: &AtemState, mv: u8, window: u8) -> Option<&MultiViewerWindow> {
    get_multiviewer(state, mv).and_then(|m| slot(&m.windows, usize::from(window)))
}

pub fn get_macro(state: &AtemState, index: u16) -> Option<&MacroProperties> {
    slot(&state.macro_state.macro_properties, usize::from(index))
}

pub fn get_macro_player(state: &AtemState) -> &MacroPlayerState {
    &state.macro_state.macro_player
}

pub fn get_macro_recorder(state: &AtemState) -> &MacroRecorderState {
    &state.macro_state.macro_recorder
}

pub fn get_classic_audio_channel(state: &AtemState, input: u16) -> Option<&ClassicAudioChannel> {
    state.audio.as_ref().and_then(|a| a.channels.get(&input))
}

pub fn get_classic_audio_master(state: &AtemState) -> Option<&ClassicAudioMasterChannel> {
    state.audio.as_ref().and_then(|a| a.master.as_ref())
}

pub fn get_fairlight_input(state: &AtemState, input: u16) -> Option<&FairlightAudioInput> {
    state.fairlight.as_ref().and_then(|f| f.inputs.get(&input))
}

pub fn get_fairlight_source(
    state: &AtemState,
    input: u16,
    source: i64,
) -> Option<&FairlightSourceProperties> {
    get_fairlight_input(state, input)
        .and_then(|i| i.sources.get(&source))
        .and_then(|s| s.properties.as_ref())
}

pub fn get_fairlight_master(state: &AtemState) -> Option<&FairlightMasterProperties> {
    state.fairlight.as_ref().and_then(|f| f.master.as_ref())
}

pub fn get_fairlight_monitor(state: &AtemState) -> Option<&FairlightMonitorProperties> {
    state.fairlight.as_ref().and_then(|f| f.monitor.as_ref())
}

pub fn get_audio_routing_output(state: &AtemState, routing_id: u32) -> Option<&AudioRoutingOutputState> {
    state
        .fairlight
        .as_ref()
        .and_then(|f| f.audio_routing.as_ref())
        .and_then(|r| r.outputs.get(&routing_id))
}

pub fn get_audio_routing_source(state: &AtemState, routing_id: u32) -> Option<&AudioRoutingSourceState> {
    state
        .fairlight
        .as_ref()
        .and_then(|f| f.audio_routing.as_ref())
        .and_then(|r| r.sources.get(&routing_id))
}

pub fn get_streaming(state: &AtemState) -> Option<&StreamingState> {
    state.streaming.as_ref()
}

pub fn get_streaming_status(state: &AtemState) -> Option<StreamingStatusState> {
    get_streaming(state)
        .and_then(|s| s.status.as_ref())
        .map(|s| s.state)
}

pub fn get_recording(state: &AtemState) -> Option<&RecordingState> {
    state.recording.as_ref()
}

pub fn get_recording_status(state: &AtemState) -> Option<RecordingStatusState> {
    get_recording(state)
        .and_then(|r| r.status.as_ref())
        .map(|s| s.state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{get_model_spec, ModelId};

    fn two_me() -> AtemState {
        AtemState::for_model(get_model_spec(ModelId::TWO_ME).unwrap())
    }

    #[test]
    fn test_out_of_range_is_absent() {
        let state = two_me();
        assert!(get_mix_effect(&state, 1).is_some());
        assert!(get_mix_effect(&state, 2).is_none());
        assert!(get_upstream_keyer(&state, 0, 3).is_some());
        assert!(get_upstream_keyer(&state, 0, 4).is_none());
        assert!(get_super_source_box(&state, 0, 3).is_some());
        assert!(get_super_source_box(&state, 1, 0).is_none());
        assert!(get_aux_source(&state, 5).is_some());
        assert!(get_aux_source(&state, 6).is_none());
    }

    #[test]
    fn test_holes_left_by_resync_are_absent() {
        let mut state = two_me();
        state.video.mix_effects[0] = None;
        state.video.super_sources.truncate(0);
        state.video.auxiliaries[2] = None;
        assert!(get_mix_effect(&state, 0).is_none());
        assert!(get_upstream_keyer(&state, 0, 0).is_none());
        assert!(get_super_source_box(&state, 0, 0).is_none());
        assert!(get_aux_source(&state, 2).is_none());
        assert!(get_mix_effect(&state, 1).is_some());
    }

    #[test]
    fn test_missing_audio_branches() {
        let state = AtemState::default();
        assert!(get_classic_audio_channel(&state, 1).is_none());
        assert!(get_fairlight_source(&state, 1, -65280).is_none());
        assert!(get_fairlight_master(&state).is_none());
        assert!(get_streaming_status(&state).is_none());
        assert!(get_macro(&state, 0).is_none());
        assert!(!get_macro_player(&state).is_running);
    }

    #[test]
    fn test_fairlight_source_lookup() {
        let state = AtemState::for_model(get_model_spec(ModelId::MINI).unwrap());
        assert!(get_fairlight_source(&state, 1, -65280).is_some());
        assert!(get_fairlight_source(&state, 1, -256).is_none());
        assert!(get_classic_audio_channel(&state, 1).is_none());
    }
}
