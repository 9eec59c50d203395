//! Model capability registry
//!
//! Static, per-hardware-variant descriptors: how many buses, keyers, SuperSources, outputs and
//! media slots a switcher has, which sources it exposes and which audio engine it carries.
//! Everything that builds option lists or validates user input sizes itself from a [`ModelSpec`]
//! rather than from a global maximum.

mod detect;
mod table;
pub mod topology;

pub use detect::model_spec_from_device;
pub use topology::{
    InternalPortType, MeAvailability, SourceAvailability, VideoInputGenerator, VideoInputInfo,
};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Numeric model identifier, as reported by the device (`0` means "auto detect")
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelId(pub u8);

impl ModelId {
    pub const AUTO_DETECT: Self = Self(0);
    pub const TVS: Self = Self(1);
    pub const ONE_ME: Self = Self(2);
    pub const TWO_ME: Self = Self(3);
    pub const PS4K: Self = Self(4);
    pub const ONE_ME_4K: Self = Self(5);
    pub const TWO_ME_4K: Self = Self(6);
    pub const TWO_ME_BS4K: Self = Self(7);
    pub const TVS_HD: Self = Self(8);
    pub const TVS_PRO_HD: Self = Self(9);
    pub const TVS_PRO_4K: Self = Self(10);
    pub const CONSTELLATION_8K: Self = Self(11);
    pub const MINI: Self = Self(12);
    pub const MINI_PRO: Self = Self(13);
    pub const MINI_PRO_ISO: Self = Self(14);
    pub const MINI_EXTREME: Self = Self(15);
    pub const MINI_EXTREME_ISO: Self = Self(16);
    pub const CONSTELLATION_HD_1ME: Self = Self(17);
    pub const CONSTELLATION_HD_2ME: Self = Self(18);
    pub const CONSTELLATION_HD_4ME: Self = Self(19);
    pub const SDI: Self = Self(20);
    pub const SDI_PRO_ISO: Self = Self(21);
    pub const SDI_EXTREME_ISO: Self = Self(22);
    pub const TVS_HD8: Self = Self(23);
    pub const TVS_HD8_ISO: Self = Self(24);
    pub const TVS_4K8: Self = Self(25);

    pub fn is_auto(self) -> bool {
        self == Self::AUTO_DETECT
    }
}

impl fmt::Debug for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ModelId({})", self.0)
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Media pool shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MediaPoolSpec {
    pub players: u8,
    pub stills: u16,
    pub clips: u8,
}

/// Physical audio connector (or internal source) behind an audio input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "camelCase")]
pub enum AudioPortType {
    Internal,
    Sdi,
    Hdmi,
    Component,
    Composite,
    SVideo,
    Xlr,
    AesEbu,
    Rca,
    Mic,
    TrsJack,
    Madi,
    MediaPlayer,
}

/// Classic (fixed channel) audio mixer input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioInputInfo {
    pub id: u16,
    pub port_type: AudioPortType,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ClassicAudioSpec {
    pub inputs: Vec<AudioInputInfo>,
}

/// Fairlight mixer input; each input may carry several sources (mono, split left/right)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FairlightInputInfo {
    pub id: u16,
    pub port_type: AudioPortType,
    /// Maximum input delay in frames, when the input supports delay
    pub max_delay: Option<u16>,
}

/// Monitor / headphone sub-unit of a Fairlight mixer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FairlightMonitorSpec {
    Monitor,
    Headphones,
}

/// A stereo channel pair within an audio routing source or output
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
    strum::EnumIter,
)]
pub enum AudioChannelPair {
    Channel1_2 = 0,
    Channel3_4 = 1,
    Channel5_6 = 2,
    Channel7_8 = 3,
    Channel9_10 = 4,
    Channel11_12 = 5,
    Channel13_14 = 6,
    Channel15_16 = 7,
}

impl AudioChannelPair {
    pub fn from_index(index: u16) -> Option<Self> {
        use strum::IntoEnumIterator;
        Self::iter().find(|pair| *pair as u16 == index)
    }

    /// Pair starting at the given 1-based odd channel
    pub fn from_first_channel(channel: u16) -> Option<Self> {
        if channel == 0 || channel % 2 == 0 {
            return None;
        }
        Self::from_index((channel - 1) / 2)
    }

    pub fn first_channel(self) -> u16 {
        self as u16 * 2 + 1
    }

    /// `"1_2"`, `"3_4"`, ...
    pub fn label(self) -> String {
        let first = self.first_channel();
        format!("{}_{}", first, first + 1)
    }
}

/// One addressable endpoint of the audio routing matrix
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioRoutingEndpoint {
    pub id: u16,
    pub name: String,
    pub channel_pairs: Vec<AudioChannelPair>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AudioRoutingSpec {
    pub sources: Vec<AudioRoutingEndpoint>,
    pub outputs: Vec<AudioRoutingEndpoint>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FairlightAudioSpec {
    pub inputs: Vec<FairlightInputInfo>,
    pub monitor: Option<FairlightMonitorSpec>,
    pub audio_routing: Option<AudioRoutingSpec>,
}

/// Audio engine of a model. Exactly one shape (or none) per model.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AudioSpec {
    #[default]
    None,
    Classic(ClassicAudioSpec),
    Fairlight(FairlightAudioSpec),
}

/// Immutable descriptor of one hardware variant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSpec {
    pub id: ModelId,
    pub label: String,
    pub auxes: u8,
    pub mixeffects: u8,
    /// Upstream keyers per M/E
    pub usks: u8,
    pub dsks: u8,
    pub multiviewers: u8,
    pub multiviewer_windows: u8,
    pub super_sources: u8,
    pub macros: u16,
    pub media: MediaPoolSpec,
    pub streaming: bool,
    pub recording: bool,
    pub record_iso: bool,
    /// Topology table, sorted by id
    pub inputs: Vec<VideoInputInfo>,
    pub audio: AudioSpec,
}

impl ModelSpec {
    pub fn input(&self, id: u16) -> Option<&VideoInputInfo> {
        self.inputs
            .binary_search_by_key(&id, |i| i.id)
            .ok()
            .and_then(|idx| self.inputs.get(idx))
    }

    pub fn classic_audio(&self) -> Option<&ClassicAudioSpec> {
        match &self.audio {
            AudioSpec::Classic(classic) => Some(classic),
            _ => None,
        }
    }

    pub fn fairlight_audio(&self) -> Option<&FairlightAudioSpec> {
        match &self.audio {
            AudioSpec::Fairlight(fairlight) => Some(fairlight),
            _ => None,
        }
    }

    pub fn has_audio_routing(&self) -> bool {
        self.fairlight_audio()
            .is_some_and(|f| f.audio_routing.is_some())
    }

    /// Auxiliary loop-back source ids, one per aux output
    pub fn aux_loopback_ids(&self) -> impl Iterator<Item = u16> + '_ {
        self.inputs
            .iter()
            .filter(|i| i.is_aux_loopback())
            .map(|i| i.id)
    }
}

/// Look up a known model
pub fn get_model_spec(id: ModelId) -> Option<&'static ModelSpec> {
    table::ALL_MODELS.iter().find(|m| m.id == id)
}

/// Conservative fallback used before any device is known.
///
/// Every count is the minimum across the registry, so option lists built from it never offer a
/// choice a smaller device would reject.
pub fn auto_detect_default() -> &'static ModelSpec {
    &table::AUTO_DETECT
}

/// Every known model (excluding the auto-detect placeholder)
pub fn all_models() -> &'static [ModelSpec] {
    &table::ALL_MODELS
}

/// Choices for a model selector: auto-detect first, then the registry in id order
pub fn model_choices() -> Vec<(ModelId, String)> {
    std::iter::once(auto_detect_default())
        .chain(all_models().iter())
        .map(|m| (m.id, m.label.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::BTreeSet;

    #[test]
    fn test_topology_ids_unique_and_sorted() {
        for model in all_models() {
            let ids: Vec<u16> = model.inputs.iter().map(|i| i.id).collect();
            let mut sorted = ids.clone();
            sorted.sort_unstable();
            sorted.dedup();
            assert_eq!(ids, sorted, "model {}", model.label);
        }
    }

    #[test]
    fn test_me_outputs_never_feed_same_or_earlier_me() {
        for model in all_models() {
            for me in 0..model.mixeffects {
                let program = topology::me_output_id(me, false);
                for id in [program, program + 1] {
                    let info = model.input(id).unwrap_or_else(|| {
                        panic!("model {} lacks M/E {} output {}", model.label, me, id)
                    });
                    for earlier_or_same in 0..=me {
                        assert!(
                            !info.selectable_on_me(earlier_or_same),
                            "model {}: {} selectable on M/E {}",
                            model.label,
                            id,
                            earlier_or_same
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_aux_count_matches_loopback_ids() {
        for model in all_models() {
            let loopbacks: BTreeSet<u16> = model.aux_loopback_ids().collect();
            assert_eq!(
                loopbacks.len(),
                usize::from(model.auxes),
                "model {}",
                model.label
            );
        }
    }

    #[test]
    fn test_availability_uses_only_routable_contexts() {
        for model in all_models() {
            for input in &model.inputs {
                assert!(
                    SourceAvailability::ALL.contains(input.source_availability),
                    "model {} input {} has bits {:#b}",
                    model.label,
                    input.id,
                    input.source_availability.0
                );
            }
        }
    }

    #[test]
    fn test_registry_ids_unique() {
        let ids: BTreeSet<ModelId> = all_models().iter().map(|m| m.id).collect();
        assert_eq!(ids.len(), all_models().len());
        assert!(!ids.contains(&ModelId::AUTO_DETECT));
    }

    #[test]
    fn test_auto_detect_is_smallest() {
        let auto = auto_detect_default();
        for model in all_models() {
            assert!(auto.auxes <= model.auxes, "{}", model.label);
            assert!(auto.mixeffects <= model.mixeffects, "{}", model.label);
            assert!(auto.usks <= model.usks, "{}", model.label);
            assert!(auto.dsks <= model.dsks, "{}", model.label);
            assert!(auto.multiviewers <= model.multiviewers, "{}", model.label);
            assert!(auto.super_sources <= model.super_sources, "{}", model.label);
            assert!(auto.macros <= model.macros, "{}", model.label);
            assert!(auto.media.players <= model.media.players, "{}", model.label);
            assert!(auto.media.stills <= model.media.stills, "{}", model.label);
            assert!(auto.media.clips <= model.media.clips, "{}", model.label);
            assert!(!auto.streaming && !auto.recording && !auto.record_iso);
            for input in &auto.inputs {
                assert!(
                    model.input(input.id).is_some(),
                    "auto source {} missing from {}",
                    input.id,
                    model.label
                );
            }
        }
        assert_eq!(auto.audio, AudioSpec::None);
    }

    #[test]
    fn test_lookup() {
        assert_eq!(get_model_spec(ModelId::TWO_ME).map(|m| m.mixeffects), Some(2));
        assert!(get_model_spec(ModelId(200)).is_none());
        assert!(get_model_spec(ModelId::AUTO_DETECT).is_none());
        assert_eq!(model_choices()[0].0, ModelId::AUTO_DETECT);
    }

    #[test]
    fn test_streaming_models_have_fairlight() {
        for model in all_models().iter().filter(|m| m.streaming) {
            assert!(model.fairlight_audio().is_some(), "{}", model.label);
        }
    }

    proptest! {
        #[test]
        fn prop_channel_pair_label_roundtrips(index in 0u16..8) {
            let pair = AudioChannelPair::from_index(index).unwrap();
            prop_assert_eq!(AudioChannelPair::from_first_channel(pair.first_channel()), Some(pair));
            prop_assert_eq!(pair.label(), format!("{}_{}", index * 2 + 1, index * 2 + 2));
        }
    }
}
