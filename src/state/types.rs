//! Live switcher state tree
//!
//! Mirror of the replica maintained by the protocol client. This crate only ever reads it: writes
//! go out as [`crate::device::SwitcherCommand`]s and come back as state changes.
//!
//! Indexed units are `Vec<Option<T>>` because the replica is sparse while a resync is in flight.
//! Read through [`crate::state::accessors`] rather than indexing these fields directly.

use crate::models::{
    InternalPortType, MeAvailability, ModelId, ModelSpec, SourceAvailability,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AtemState {
    pub info: DeviceInfo,
    pub video: VideoState,
    pub inputs: BTreeMap<u16, InputChannel>,
    pub media: MediaState,
    pub settings: SettingsState,
    pub macro_state: MacroState,
    pub audio: Option<ClassicAudioState>,
    pub fairlight: Option<FairlightAudioState>,
    pub streaming: Option<StreamingState>,
    pub recording: Option<RecordingState>,
}

// ---------------------------------------------------------------------------
// Device info
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeviceInfo {
    pub model: ModelId,
    pub product_identifier: Option<String>,
    pub api_version: Option<u32>,
    pub capabilities: Option<DeviceCapabilities>,
    /// Keyer count per M/E, as reported by the device
    pub mix_effects: Vec<Option<MixEffectInfo>>,
    pub multiviewer: Option<MultiviewerInfo>,
    pub macro_pool: Option<MacroPoolInfo>,
    pub media_pool: Option<MediaPoolInfo>,
    pub super_sources: Vec<Option<SuperSourceInfo>>,
    pub audio_mixer: Option<AudioMixerInfo>,
    pub fairlight_mixer: Option<FairlightMixerInfo>,
    pub power: Vec<bool>,
}

/// Topology counts the device reports about itself
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeviceCapabilities {
    pub mix_effects: u8,
    pub sources: u16,
    pub auxiliaries: u8,
    pub mix_minus_outputs: u8,
    pub media_players: u8,
    pub super_sources: u8,
    pub downstream_keyers: u8,
    pub stingers: u8,
    pub dves: u8,
    pub camera_control: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MixEffectInfo {
    pub key_count: u8,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MultiviewerInfo {
    pub count: u8,
    pub window_count: u8,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MacroPoolInfo {
    pub macro_count: u16,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MediaPoolInfo {
    pub still_count: u16,
    pub clip_count: u8,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SuperSourceInfo {
    pub box_count: u8,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AudioMixerInfo {
    pub inputs: u8,
    pub monitors: u8,
    pub headphones: u8,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FairlightMixerInfo {
    pub inputs: u8,
    pub monitors: u8,
}

// ---------------------------------------------------------------------------
// Video
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VideoState {
    pub mix_effects: Vec<Option<MixEffect>>,
    pub downstream_keyers: Vec<Option<DownstreamKeyer>>,
    /// Source routed to each auxiliary output
    pub auxiliaries: Vec<Option<u16>>,
    pub super_sources: Vec<Option<SuperSource>>,
}

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "camelCase")]
pub enum TransitionStyle {
    #[default]
    Mix,
    Dip,
    Wipe,
    #[strum(serialize = "DVE")]
    Dve,
    Sting,
}

/// Bitmask of what the next transition takes: bit 0 is the background, bit `n` keyer `n - 1`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransitionSelection(pub u8);

impl TransitionSelection {
    pub const BACKGROUND: Self = Self(1);

    pub fn background(self) -> bool {
        self.0 & 1 != 0
    }

    pub fn key(self, key: u8) -> bool {
        key < 7 && self.0 & (1 << (key + 1)) != 0
    }

    pub fn with_key(self, key: u8, on: bool) -> Self {
        if key >= 7 {
            return self;
        }
        let bit = 1 << (key + 1);
        Self(if on { self.0 | bit } else { self.0 & !bit })
    }

    pub fn with_background(self, on: bool) -> Self {
        Self(if on { self.0 | 1 } else { self.0 & !1 })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TransitionPosition {
    pub in_transition: bool,
    pub remaining_frames: u16,
    /// 0..=10000
    pub handle_position: u16,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TransitionProperties {
    pub style: TransitionStyle,
    pub selection: TransitionSelection,
    pub next_style: TransitionStyle,
    pub next_selection: TransitionSelection,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TransitionRateSettings {
    /// Frames
    pub rate: u16,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DipTransitionSettings {
    pub rate: u16,
    pub input: u16,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TransitionSettings {
    pub mix: Option<TransitionRateSettings>,
    pub dip: Option<DipTransitionSettings>,
    pub wipe: Option<TransitionRateSettings>,
    #[serde(rename = "DVE")]
    pub dve: Option<TransitionRateSettings>,
}

impl TransitionSettings {
    /// Rate in frames of one style. Stinger timing lives with the clip, so it has none.
    pub fn rate_for(&self, style: TransitionStyle) -> Option<u16> {
        match style {
            TransitionStyle::Mix => self.mix.map(|s| s.rate),
            TransitionStyle::Dip => self.dip.map(|s| s.rate),
            TransitionStyle::Wipe => self.wipe.map(|s| s.rate),
            TransitionStyle::Dve => self.dve.map(|s| s.rate),
            TransitionStyle::Sting => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FadeToBlackProperties {
    pub is_fully_black: bool,
    pub in_transition: bool,
    pub remaining_frames: u16,
    pub rate: u16,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MixEffect {
    pub index: u8,
    pub program_input: u16,
    pub preview_input: u16,
    pub transition_preview: bool,
    pub transition_position: TransitionPosition,
    pub transition_properties: TransitionProperties,
    pub transition_settings: TransitionSettings,
    pub fade_to_black: Option<FadeToBlackProperties>,
    pub upstream_keyers: Vec<Option<UpstreamKeyer>>,
}

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "camelCase")]
pub enum KeyType {
    #[default]
    Luma,
    Chroma,
    Pattern,
    #[strum(serialize = "DVE")]
    Dve,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpstreamKeyer {
    pub upstream_keyer_id: u8,
    pub on_air: bool,
    pub fill_source: u16,
    pub cut_source: u16,
    pub mix_effect_key_type: KeyType,
    pub can_fly_key: bool,
    pub fly_enabled: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DownstreamKeyerSources {
    pub fill_source: u16,
    pub cut_source: u16,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DownstreamKeyerProperties {
    pub tie: bool,
    pub rate: u16,
    pub pre_multiply: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DownstreamKeyer {
    pub on_air: bool,
    pub in_transition: bool,
    pub is_auto: bool,
    pub remaining_frames: u16,
    pub sources: Option<DownstreamKeyerSources>,
    pub properties: Option<DownstreamKeyerProperties>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SuperSourceArtOption {
    #[default]
    Background,
    Foreground,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SuperSourceProperties {
    pub art_fill_source: u16,
    pub art_cut_source: u16,
    pub art_option: SuperSourceArtOption,
    pub art_premultiplied: bool,
}

/// One SuperSource box; positions and sizes are in device units (x/y -4800..=4800, size 70..=1000)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SuperSourceBox {
    pub enabled: bool,
    pub source: u16,
    pub x: i16,
    pub y: i16,
    pub size: u16,
    pub cropped: bool,
    pub crop_top: u16,
    pub crop_bottom: u16,
    pub crop_left: u16,
    pub crop_right: u16,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SuperSource {
    pub index: u8,
    pub properties: Option<SuperSourceProperties>,
    pub boxes: Vec<Option<SuperSourceBox>>,
}

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputChannel {
    pub input_id: u16,
    pub long_name: String,
    pub short_name: String,
    #[serde(default)]
    pub are_names_default: bool,
    pub internal_port_type: InternalPortType,
    #[serde(default = "default_source_availability")]
    pub source_availability: SourceAvailability,
    #[serde(default)]
    pub me_availability: MeAvailability,
}

fn default_source_availability() -> SourceAvailability {
    SourceAvailability::ALL
}

// ---------------------------------------------------------------------------
// Media
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MediaSourceType {
    #[default]
    Still,
    Clip,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MediaPlayerState {
    pub playing: bool,
    #[serde(rename = "loop")]
    pub looping: bool,
    pub at_beginning: bool,
    pub clip_frame: u16,
    pub source_type: MediaSourceType,
    pub still_index: u16,
    pub clip_index: u8,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MediaPoolStill {
    pub is_used: bool,
    pub file_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MediaPoolClip {
    pub is_used: bool,
    pub name: String,
    pub frame_count: u16,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MediaState {
    pub players: Vec<Option<MediaPlayerState>>,
    pub still_pool: Vec<Option<MediaPoolStill>>,
    pub clip_pool: Vec<Option<MediaPoolClip>>,
}

// ---------------------------------------------------------------------------
// Multiviewers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MultiViewerWindow {
    pub window_index: u8,
    pub source: u16,
    pub supports_vu_meter: bool,
    pub safe_title: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MultiViewer {
    pub index: u8,
    pub windows: Vec<Option<MultiViewerWindow>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SettingsState {
    pub multi_viewers: Vec<Option<MultiViewer>>,
}

// ---------------------------------------------------------------------------
// Macros
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MacroProperties {
    pub is_used: bool,
    pub has_unsupported_ops: bool,
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MacroPlayerState {
    pub is_running: bool,
    pub is_waiting: bool,
    #[serde(rename = "loop")]
    pub looping: bool,
    /// 0-based index of the running macro
    pub macro_index: u16,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MacroRecorderState {
    pub is_recording: bool,
    pub macro_index: u16,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MacroState {
    pub macro_properties: Vec<Option<MacroProperties>>,
    pub macro_player: MacroPlayerState,
    pub macro_recorder: MacroRecorderState,
}

// ---------------------------------------------------------------------------
// Classic audio
// ---------------------------------------------------------------------------

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "camelCase")]
pub enum AudioMixOption {
    #[default]
    Off,
    On,
    #[strum(serialize = "AFV")]
    AudioFollowVideo,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClassicAudioChannel {
    pub mix_option: AudioMixOption,
    /// dB
    pub gain: f64,
    /// -50..=50
    pub balance: f64,
    pub supports_rca_to_xlr_enabled: bool,
    pub rca_to_xlr_enabled: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClassicAudioMasterChannel {
    pub gain: f64,
    pub balance: f64,
    pub follow_fade_to_black: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClassicAudioState {
    pub channels: BTreeMap<u16, ClassicAudioChannel>,
    pub master: Option<ClassicAudioMasterChannel>,
}

// ---------------------------------------------------------------------------
// Fairlight audio
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FairlightInputConfiguration {
    #[default]
    Mono,
    Stereo,
    DualMono,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FairlightInputProperties {
    pub active_configuration: FairlightInputConfiguration,
    pub supported_configurations: Vec<FairlightInputConfiguration>,
}

impl FairlightInputProperties {
    pub fn supports(&self, configuration: FairlightInputConfiguration) -> bool {
        self.supported_configurations.contains(&configuration)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FairlightSourceProperties {
    /// Fader gain in dB
    pub fader_gain: f64,
    /// Input trim in dB
    pub gain: f64,
    pub balance: f64,
    pub mix_option: AudioMixOption,
    pub frames_delay: u16,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FairlightAudioSource {
    pub properties: Option<FairlightSourceProperties>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FairlightAudioInput {
    pub properties: Option<FairlightInputProperties>,
    /// Keyed by the device's signed source id (`-65280` is the combined/mono source)
    pub sources: BTreeMap<i64, FairlightAudioSource>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FairlightMasterProperties {
    pub fader_gain: f64,
    pub follow_fade_to_black: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FairlightMonitorProperties {
    pub gain: f64,
    pub input_master_gain: f64,
    pub input_talkback_gain: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AudioRoutingSourceState {
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AudioRoutingOutputState {
    pub name: String,
    /// Combined routing id (`source << 16 | channel pair`)
    pub source_id: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AudioRoutingState {
    pub sources: BTreeMap<u32, AudioRoutingSourceState>,
    pub outputs: BTreeMap<u32, AudioRoutingOutputState>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FairlightAudioState {
    pub inputs: BTreeMap<u16, FairlightAudioInput>,
    pub master: Option<FairlightMasterProperties>,
    pub monitor: Option<FairlightMonitorProperties>,
    pub audio_routing: Option<AudioRoutingState>,
}

// ---------------------------------------------------------------------------
// Streaming / recording
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Timecode {
    pub hours: u8,
    pub minutes: u8,
    pub seconds: u8,
    pub frames: u8,
    pub is_drop_frame: bool,
}

impl Timecode {
    /// `hh:mm:ss`
    pub fn to_hms(self) -> String {
        format!("{:02}:{:02}:{:02}", self.hours, self.minutes, self.seconds)
    }

    pub fn to_hm(self) -> String {
        format!("{:02}:{:02}", self.hours, self.minutes)
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "camelCase")]
pub enum StreamingStatusState {
    #[default]
    Idle,
    Connecting,
    Streaming,
    Stopping,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StreamingStatus {
    pub state: StreamingStatusState,
    pub error: u16,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StreamingStats {
    /// Bits per second
    pub encoding_bitrate: u64,
    pub cache_used: u8,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StreamingService {
    pub service_name: String,
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StreamingState {
    pub status: Option<StreamingStatus>,
    pub duration: Option<Timecode>,
    pub stats: Option<StreamingStats>,
    pub service: Option<StreamingService>,
}

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "camelCase")]
pub enum RecordingStatusState {
    #[default]
    Idle,
    Recording,
    Stopping,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RecordingStatus {
    pub state: RecordingStatusState,
    pub error: u16,
    /// Seconds of free space at the current bitrate
    pub recording_time_available: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RecordingProperties {
    pub filename: String,
    pub record_in_all_cameras: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RecordingState {
    pub status: Option<RecordingStatus>,
    pub duration: Option<Timecode>,
    pub properties: Option<RecordingProperties>,
}

// ---------------------------------------------------------------------------
// Blank state
// ---------------------------------------------------------------------------

impl AtemState {
    /// A blank, fully populated tree shaped like `model`: every unit present, every input routed
    /// to black, no live names. Used to drive the instance without hardware.
    pub fn for_model(model: &ModelSpec) -> Self {
        let mix_effects = (0..model.mixeffects)
            .map(|index| {
                Some(MixEffect {
                    index,
                    upstream_keyers: (0..model.usks)
                        .map(|key| {
                            Some(UpstreamKeyer {
                                upstream_keyer_id: key,
                                ..UpstreamKeyer::default()
                            })
                        })
                        .collect(),
                    transition_properties: TransitionProperties {
                        selection: TransitionSelection::BACKGROUND,
                        next_selection: TransitionSelection::BACKGROUND,
                        ..TransitionProperties::default()
                    },
                    transition_settings: TransitionSettings {
                        mix: Some(TransitionRateSettings { rate: 25 }),
                        dip: Some(DipTransitionSettings { rate: 25, input: 0 }),
                        wipe: Some(TransitionRateSettings { rate: 25 }),
                        dve: Some(TransitionRateSettings { rate: 25 }),
                    },
                    fade_to_black: Some(FadeToBlackProperties {
                        rate: 25,
                        ..FadeToBlackProperties::default()
                    }),
                    ..MixEffect::default()
                })
            })
            .collect();

        let super_sources = (0..model.super_sources)
            .map(|index| {
                Some(SuperSource {
                    index,
                    properties: Some(SuperSourceProperties::default()),
                    boxes: (0..4)
                        .map(|_| {
                            Some(SuperSourceBox {
                                size: 500,
                                ..SuperSourceBox::default()
                            })
                        })
                        .collect(),
                })
            })
            .collect();

        let multi_viewers = (0..model.multiviewers)
            .map(|index| {
                Some(MultiViewer {
                    index,
                    windows: (0..model.multiviewer_windows)
                        .map(|window_index| {
                            Some(MultiViewerWindow {
                                window_index,
                                ..MultiViewerWindow::default()
                            })
                        })
                        .collect(),
                })
            })
            .collect();

        let audio = model.classic_audio().map(|classic| ClassicAudioState {
            channels: classic
                .inputs
                .iter()
                .map(|input| (input.id, ClassicAudioChannel::default()))
                .collect(),
            master: Some(ClassicAudioMasterChannel::default()),
        });

        let fairlight = model.fairlight_audio().map(|fairlight| FairlightAudioState {
            inputs: fairlight
                .inputs
                .iter()
                .map(|input| {
                    let mut sources = BTreeMap::new();
                    sources.insert(
                        crate::state::FAIRLIGHT_COMBINED_SOURCE,
                        FairlightAudioSource {
                            properties: Some(FairlightSourceProperties::default()),
                        },
                    );
                    (
                        input.id,
                        FairlightAudioInput {
                            properties: Some(FairlightInputProperties::default()),
                            sources,
                        },
                    )
                })
                .collect(),
            master: Some(FairlightMasterProperties::default()),
            monitor: fairlight
                .monitor
                .map(|_| FairlightMonitorProperties::default()),
            audio_routing: fairlight.audio_routing.as_ref().map(|routing| {
                AudioRoutingState {
                    sources: BTreeMap::new(),
                    outputs: routing
                        .outputs
                        .iter()
                        .flat_map(|output| {
                            output.channel_pairs.iter().map(move |pair| {
                                (
                                    crate::options::routing::routing_id(output.id, *pair),
                                    AudioRoutingOutputState {
                                        name: output.name.clone(),
                                        source_id: 0,
                                    },
                                )
                            })
                        })
                        .collect(),
                }
            }),
        });

        Self {
            info: DeviceInfo {
                model: model.id,
                capabilities: Some(DeviceCapabilities {
                    mix_effects: model.mixeffects,
                    sources: model.inputs.len() as u16,
                    auxiliaries: model.auxes,
                    media_players: model.media.players,
                    super_sources: model.super_sources,
                    downstream_keyers: model.dsks,
                    ..DeviceCapabilities::default()
                }),
                mix_effects: (0..model.mixeffects)
                    .map(|_| Some(MixEffectInfo { key_count: model.usks }))
                    .collect(),
                multiviewer: (model.multiviewers > 0).then_some(MultiviewerInfo {
                    count: model.multiviewers,
                    window_count: model.multiviewer_windows,
                }),
                macro_pool: Some(MacroPoolInfo {
                    macro_count: model.macros,
                }),
                media_pool: Some(MediaPoolInfo {
                    still_count: model.media.stills,
                    clip_count: model.media.clips,
                }),
                super_sources: (0..model.super_sources)
                    .map(|_| Some(SuperSourceInfo { box_count: 4 }))
                    .collect(),
                ..DeviceInfo::default()
            },
            video: VideoState {
                mix_effects,
                downstream_keyers: (0..model.dsks)
                    .map(|_| {
                        Some(DownstreamKeyer {
                            sources: Some(DownstreamKeyerSources::default()),
                            properties: Some(DownstreamKeyerProperties {
                                rate: 25,
                                ..DownstreamKeyerProperties::default()
                            }),
                            ..DownstreamKeyer::default()
                        })
                    })
                    .collect(),
                auxiliaries: (0..model.auxes).map(|_| Some(0)).collect(),
                super_sources,
            },
            inputs: BTreeMap::new(),
            media: MediaState {
                players: (0..model.media.players)
                    .map(|_| Some(MediaPlayerState::default()))
                    .collect(),
                still_pool: (0..model.media.stills).map(|_| None).collect(),
                clip_pool: (0..model.media.clips).map(|_| None).collect(),
            },
            settings: SettingsState { multi_viewers },
            macro_state: MacroState {
                macro_properties: (0..model.macros).map(|_| None).collect(),
                ..MacroState::default()
            },
            audio,
            fairlight,
            streaming: model.streaming.then(StreamingState::default),
            recording: model.recording.then(RecordingState::default),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{get_model_spec, ModelId};

    #[test]
    fn test_blank_state_matches_model_shape() {
        let model = get_model_spec(ModelId::TWO_ME).unwrap();
        let state = AtemState::for_model(model);
        assert_eq!(state.video.mix_effects.len(), 2);
        assert_eq!(state.video.auxiliaries.len(), 6);
        assert_eq!(state.video.super_sources.len(), 1);
        assert!(state.audio.is_some());
        assert!(state.fairlight.is_none());
        assert!(state.streaming.is_none());
    }

    #[test]
    fn test_transition_selection_bits() {
        let sel = TransitionSelection::BACKGROUND.with_key(1, true);
        assert!(sel.background());
        assert!(sel.key(1));
        assert!(!sel.key(0));
        assert_eq!(sel.with_background(false).0, 0b100);
    }

    #[test]
    fn test_deserialize_sparse_tree() {
        let json = r#"{
            "info": { "model": 3 },
            "video": { "mixEffects": [ { "programInput": 5 }, null ] }
        }"#;
        let state: AtemState = serde_json::from_str(json).unwrap();
        assert_eq!(state.info.model, ModelId::TWO_ME);
        assert_eq!(
            state.video.mix_effects[0].as_ref().map(|me| me.program_input),
            Some(5)
        );
        assert!(state.video.mix_effects[1].is_none());
    }

    #[test]
    fn test_timecode_format() {
        let tc = Timecode {
            hours: 1,
            minutes: 2,
            seconds: 3,
            ..Timecode::default()
        };
        assert_eq!(tc.to_hms(), "01:02:03");
        assert_eq!(tc.to_hm(), "01:02");
    }
}
