//! Typed switcher commands
//!
//! One variant per controllable operation. Indices are 0-based; gains are dB.

use crate::state::{AudioMixOption, KeyType, TransitionSelection, TransitionStyle};
use serde::{Deserialize, Serialize};

/// Partial SuperSource box update; `None` fields are left as they are
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SuperSourceBoxUpdate {
    pub enabled: Option<bool>,
    pub source: Option<u16>,
    pub x: Option<i16>,
    pub y: Option<i16>,
    pub size: Option<u16>,
    pub cropped: Option<bool>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SuperSourceArtUpdate {
    pub fill_source: Option<u16>,
    pub cut_source: Option<u16>,
    pub foreground: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MediaSource {
    Still(u16),
    Clip(u8),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "camelCase")]
pub enum SwitcherCommand {
    ProgramInput { me: u8, source: u16 },
    PreviewInput { me: u8, source: u16 },
    Cut { me: u8 },
    AutoTransition { me: u8 },
    TransitionStyle { me: u8, style: TransitionStyle },
    TransitionSelection { me: u8, selection: TransitionSelection },
    TransitionRate { me: u8, style: TransitionStyle, rate: u16 },
    TransitionPosition { me: u8, position: u16 },
    PreviewTransition { me: u8, on: bool },
    FadeToBlackAuto { me: u8 },
    FadeToBlackRate { me: u8, rate: u16 },

    UpstreamKeyerOnAir { me: u8, key: u8, on_air: bool },
    UpstreamKeyerFillSource { me: u8, key: u8, source: u16 },
    UpstreamKeyerCutSource { me: u8, key: u8, source: u16 },
    UpstreamKeyerType { me: u8, key: u8, key_type: KeyType },

    DownstreamKeyerOnAir { dsk: u8, on_air: bool },
    DownstreamKeyerAuto { dsk: u8 },
    DownstreamKeyerTie { dsk: u8, tie: bool },
    DownstreamKeyerFillSource { dsk: u8, source: u16 },
    DownstreamKeyerCutSource { dsk: u8, source: u16 },

    AuxSource { aux: u8, source: u16 },

    SuperSourceBox { ssrc: u8, box_index: u8, update: SuperSourceBoxUpdate },
    SuperSourceArt { ssrc: u8, update: SuperSourceArtUpdate },

    MediaPlayerSource { player: u8, source: MediaSource },

    MultiviewerWindowSource { mv: u8, window: u8, source: u16 },

    MacroRun { index: u16 },
    MacroContinue,
    MacroStop,
    MacroLoop { looping: bool },

    ClassicAudioMixOption { input: u16, option: AudioMixOption },
    ClassicAudioGain { input: u16, gain: f64 },
    ClassicAudioBalance { input: u16, balance: f64 },
    ClassicAudioMasterGain { gain: f64 },

    FairlightMixOption { input: u16, source: i64, option: AudioMixOption },
    FairlightFaderGain { input: u16, source: i64, gain: f64 },
    FairlightMasterGain { gain: f64 },
    FairlightMonitorGain { gain: f64 },

    /// Route `source` (combined routing id) to `output` (combined routing id)
    AudioRouting { output: u32, source: u32 },

    StartStreaming,
    StopStreaming,
    StartRecording,
    StopRecording,
    RecordInAllCameras { enabled: bool },
}
