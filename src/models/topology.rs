//! Video input topology - which source ids a model exposes and where each may be routed
//!
//! The tables are large and repetitive (a 4 M/E switcher has well over a hundred sources), so
//! models describe themselves through [`VideoInputGenerator`], a staged builder that emits one
//! semantically named block of inputs per stage.
//!
//! ## Source numbering
//!
//! | Range | Meaning |
//! |-------|---------|
//! | `0` | Black |
//! | `1..=40` | External inputs |
//! | `1000` | Color bars |
//! | `2001..` | Color generators |
//! | `3010, 3011, 3020..` | Media player fill / key pairs |
//! | `4010, 4020..` | Upstream key masks |
//! | `5010, 5020..` | Downstream key masks |
//! | `6000..` | SuperSource outputs |
//! | `7001..` | Clean feeds |
//! | `8001..` | Auxiliary loop-back |
//! | `9001..` | Multiviewer outputs |
//! | `10010, 10011, 10020..` | M/E program / preview outputs |
//! | `11001..` | External input direct |

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign, Not};

pub const SOURCE_BLACK: u16 = 0;
pub const SOURCE_BARS: u16 = 1000;
pub const SOURCE_COLOR_BASE: u16 = 2000;
pub const SOURCE_MEDIA_PLAYER_BASE: u16 = 3000;
pub const SOURCE_USK_MASK_BASE: u16 = 4000;
pub const SOURCE_DSK_MASK_BASE: u16 = 5000;
pub const SOURCE_SUPER_SOURCE_BASE: u16 = 6000;
pub const SOURCE_CLEAN_FEED_BASE: u16 = 7000;
pub const SOURCE_AUX_BASE: u16 = 8000;
pub const SOURCE_MULTIVIEWER_BASE: u16 = 9000;
pub const SOURCE_ME_OUTPUT_BASE: u16 = 10000;
pub const SOURCE_DIRECT_BASE: u16 = 11000;

/// What kind of signal a source id represents inside the switcher
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "camelCase")]
pub enum InternalPortType {
    External,
    Black,
    ColorBars,
    ColorGenerator,
    MediaPlayerFill,
    MediaPlayerKey,
    SuperSource,
    ExternalDirect,
    MeOutput,
    Auxiliary,
    Mask,
    MultiViewer,
}

impl InternalPortType {
    /// Wire value used by the device when it reports its own input list
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::External),
            1 => Some(Self::Black),
            2 => Some(Self::ColorBars),
            3 => Some(Self::ColorGenerator),
            4 => Some(Self::MediaPlayerFill),
            5 => Some(Self::MediaPlayerKey),
            6 => Some(Self::SuperSource),
            7 => Some(Self::ExternalDirect),
            128 => Some(Self::MeOutput),
            129 => Some(Self::Auxiliary),
            130 => Some(Self::Mask),
            131 => Some(Self::MultiViewer),
            _ => None,
        }
    }
}

/// Bitmask of the routing contexts a source may be selected in
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceAvailability(pub u8);

impl SourceAvailability {
    pub const NONE: Self = Self(0);
    pub const AUXILIARY: Self = Self(1 << 0);
    pub const MULTIVIEWER: Self = Self(1 << 1);
    pub const SUPER_SOURCE_ART: Self = Self(1 << 2);
    pub const SUPER_SOURCE_BOX: Self = Self(1 << 3);
    pub const KEY_SOURCE: Self = Self(1 << 4);
    /// Every context a classic switcher knows about
    pub const ALL: Self = Self(0b0001_1111);

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    pub fn without(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for SourceAvailability {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for SourceAvailability {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for SourceAvailability {
    type Output = Self;
    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl Not for SourceAvailability {
    type Output = Self;
    fn not(self) -> Self {
        Self(!self.0)
    }
}

impl fmt::Debug for SourceAvailability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SourceAvailability({:#09b})", self.0)
    }
}

/// Bitmask of the mix-effect buses (0-based bit per M/E) that may select a source
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MeAvailability(pub u8);

impl MeAvailability {
    pub const NONE: Self = Self(0);

    /// Every M/E of a model with `me_count` buses
    pub fn all(me_count: u8) -> Self {
        Self::range(0, me_count)
    }

    /// Buses `from..to` (exclusive end)
    pub fn range(from: u8, to: u8) -> Self {
        let mut bits = 0u8;
        for me in from..to.min(8) {
            bits |= 1 << me;
        }
        Self(bits)
    }

    pub fn includes(self, me: u8) -> bool {
        me < 8 && self.0 & (1 << me) != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Debug for MeAvailability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MeAvailability({:#06b})", self.0)
    }
}

/// One source id in a model's topology table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoInputInfo {
    pub id: u16,
    pub port_type: InternalPortType,
    pub source_availability: SourceAvailability,
    pub me_availability: MeAvailability,
}

impl VideoInputInfo {
    /// Whether this source may be selected on the program/preview bus of `me`
    pub fn selectable_on_me(&self, me: u8) -> bool {
        self.me_availability.includes(me)
    }

    /// Auxiliary loop-back outputs (8001..), as opposed to clean feeds which share the port type
    pub fn is_aux_loopback(&self) -> bool {
        self.port_type == InternalPortType::Auxiliary
            && self.id > SOURCE_AUX_BASE
            && self.id < SOURCE_MULTIVIEWER_BASE
    }
}

/// Staged builder for a model's topology table
///
/// Each stage consumes the builder and returns it with one more block of inputs, deriving the
/// block's availability from the base availability minus the stage's routing restrictions.
///
/// ```ignore
/// let inputs = VideoInputGenerator::begin(2, SourceAvailability::ALL)
///     .add_internal_colors_and_black(true)
///     .add_external_inputs(16)
///     .add_media_players(2)
///     .add_super_sources(1)
///     .add_program_preview()
///     .generate();
/// ```
#[derive(Debug, Clone)]
pub struct VideoInputGenerator {
    me_count: u8,
    base_source_availability: SourceAvailability,
    inputs: BTreeMap<u16, VideoInputInfo>,
}

impl VideoInputGenerator {
    pub fn begin(me_count: u8, base_source_availability: SourceAvailability) -> Self {
        Self {
            me_count,
            base_source_availability,
            inputs: BTreeMap::new(),
        }
    }

    fn with_input(
        mut self,
        id: u16,
        port_type: InternalPortType,
        source_availability: SourceAvailability,
        me_availability: MeAvailability,
    ) -> Self {
        self.inputs.insert(
            id,
            VideoInputInfo {
                id,
                port_type,
                source_availability,
                me_availability,
            },
        );
        self
    }

    fn all_mes(&self) -> MeAvailability {
        MeAvailability::all(self.me_count)
    }

    /// Black, optional color bars and the two color generators.
    /// Bars and color generators are never key fills.
    pub fn add_internal_colors_and_black(self, include_bars: bool) -> Self {
        let base = self.base_source_availability;
        let colors = base.without(SourceAvailability::KEY_SOURCE);
        let all_mes = self.all_mes();

        let mut builder = self.with_input(SOURCE_BLACK, InternalPortType::Black, base, all_mes);
        if include_bars {
            builder = builder.with_input(SOURCE_BARS, InternalPortType::ColorBars, colors, all_mes);
        }
        (1..=2).fold(builder, |b, i| {
            b.with_input(
                SOURCE_COLOR_BASE + i,
                InternalPortType::ColorGenerator,
                colors,
                all_mes,
            )
        })
    }

    pub fn add_external_inputs(self, count: u16) -> Self {
        let base = self.base_source_availability;
        let all_mes = self.all_mes();
        (1..=count).fold(self, |b, i| {
            b.with_input(i, InternalPortType::External, base, all_mes)
        })
    }

    /// Each player contributes a fill id and a paired key id
    pub fn add_media_players(self, count: u8) -> Self {
        let base = self.base_source_availability;
        let all_mes = self.all_mes();
        (1..=u16::from(count)).fold(self, |b, i| {
            let fill = SOURCE_MEDIA_PLAYER_BASE + i * 10;
            b.with_input(fill, InternalPortType::MediaPlayerFill, base, all_mes)
                .with_input(fill + 1, InternalPortType::MediaPlayerKey, base, all_mes)
        })
    }

    /// Key masks only ever feed monitoring outputs
    pub fn add_upstream_key_masks(self, count: u8) -> Self {
        let masks = self.base_source_availability
            & (SourceAvailability::AUXILIARY | SourceAvailability::MULTIVIEWER);
        (1..=u16::from(count)).fold(self, |b, i| {
            b.with_input(
                SOURCE_USK_MASK_BASE + i * 10,
                InternalPortType::Mask,
                masks,
                MeAvailability::NONE,
            )
        })
    }

    pub fn add_downstream_key_masks(self, count: u8) -> Self {
        let masks = self.base_source_availability
            & (SourceAvailability::AUXILIARY | SourceAvailability::MULTIVIEWER);
        (1..=u16::from(count)).fold(self, |b, i| {
            b.with_input(
                SOURCE_DSK_MASK_BASE + i * 10,
                InternalPortType::Mask,
                masks,
                MeAvailability::NONE,
            )
        })
    }

    /// SuperSource outputs cannot be composed back into a SuperSource
    pub fn add_super_sources(self, count: u8) -> Self {
        let ssrc = self
            .base_source_availability
            .without(SourceAvailability::SUPER_SOURCE_ART | SourceAvailability::SUPER_SOURCE_BOX);
        let all_mes = self.all_mes();
        (0..u16::from(count)).fold(self, |b, i| {
            b.with_input(
                SOURCE_SUPER_SOURCE_BASE + i,
                InternalPortType::SuperSource,
                ssrc,
                all_mes,
            )
        })
    }

    /// Clean feeds are outputs: never keyed, never composed, never on an M/E bus
    pub fn add_clean_feeds(self, count: u8) -> Self {
        let clean = self.base_source_availability.without(
            SourceAvailability::SUPER_SOURCE_ART
                | SourceAvailability::SUPER_SOURCE_BOX
                | SourceAvailability::KEY_SOURCE,
        );
        (1..=u16::from(count)).fold(self, |b, i| {
            b.with_input(
                SOURCE_CLEAN_FEED_BASE + i,
                InternalPortType::Auxiliary,
                clean,
                MeAvailability::NONE,
            )
        })
    }

    /// One loop-back id per auxiliary output
    pub fn add_auxiliary_outputs(self, count: u8) -> Self {
        let aux = self.base_source_availability & SourceAvailability::MULTIVIEWER;
        (1..=u16::from(count)).fold(self, |b, i| {
            b.with_input(
                SOURCE_AUX_BASE + i,
                InternalPortType::Auxiliary,
                aux,
                MeAvailability::NONE,
            )
        })
    }

    pub fn add_multiviewers(self, count: u8) -> Self {
        let mv = self.base_source_availability & SourceAvailability::AUXILIARY;
        (1..=u16::from(count)).fold(self, |b, i| {
            b.with_input(
                SOURCE_MULTIVIEWER_BASE + i,
                InternalPortType::MultiViewer,
                mv,
                MeAvailability::NONE,
            )
        })
    }

    pub fn add_direct_inputs(self, count: u16) -> Self {
        let direct = self.base_source_availability & SourceAvailability::AUXILIARY;
        (1..=count).fold(self, |b, i| {
            b.with_input(
                SOURCE_DIRECT_BASE + i,
                InternalPortType::ExternalDirect,
                direct,
                MeAvailability::NONE,
            )
        })
    }

    /// Program/preview outputs for every M/E.
    ///
    /// An M/E's outputs may only be selected on the M/Es after it, so no bus can route its own
    /// output (or a later bus's output) back into itself.
    pub fn add_program_preview(self) -> Self {
        let outputs = self
            .base_source_availability
            .without(SourceAvailability::SUPER_SOURCE_ART | SourceAvailability::SUPER_SOURCE_BOX);
        let me_count = self.me_count;
        (0..me_count).fold(self, |b, me| {
            let later = MeAvailability::range(me + 1, me_count);
            let program = me_output_id(me, false);
            b.with_input(program, InternalPortType::MeOutput, outputs, later)
                .with_input(program + 1, InternalPortType::MeOutput, outputs, later)
        })
    }

    /// Finish the table, ordered by id
    pub fn generate(self) -> Vec<VideoInputInfo> {
        self.inputs.into_values().collect()
    }
}

/// Program (or preview) output id of a 0-based M/E
pub fn me_output_id(me: u8, preview: bool) -> u16 {
    SOURCE_ME_OUTPUT_BASE + (u16::from(me) + 1) * 10 + u16::from(preview)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_me() -> Vec<VideoInputInfo> {
        VideoInputGenerator::begin(2, SourceAvailability::ALL)
            .add_internal_colors_and_black(true)
            .add_external_inputs(4)
            .add_media_players(2)
            .add_upstream_key_masks(2)
            .add_downstream_key_masks(2)
            .add_super_sources(1)
            .add_clean_feeds(2)
            .add_auxiliary_outputs(3)
            .add_program_preview()
            .generate()
    }

    #[test]
    fn test_generate_is_sorted_and_unique() {
        let inputs = two_me();
        let ids: Vec<u16> = inputs.iter().map(|i| i.id).collect();
        let mut sorted = ids.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(ids, sorted);
    }

    #[test]
    fn test_colors_are_not_key_sources() {
        let inputs = two_me();
        let bars = inputs.iter().find(|i| i.id == SOURCE_BARS).unwrap();
        assert!(!bars.source_availability.contains(SourceAvailability::KEY_SOURCE));
        let black = inputs.iter().find(|i| i.id == SOURCE_BLACK).unwrap();
        assert!(black.source_availability.contains(SourceAvailability::KEY_SOURCE));
    }

    #[test]
    fn test_media_players_pair_fill_and_key() {
        let inputs = two_me();
        let mp2: Vec<_> = inputs
            .iter()
            .filter(|i| i.id == 3020 || i.id == 3021)
            .map(|i| i.port_type)
            .collect();
        assert_eq!(
            mp2,
            vec![InternalPortType::MediaPlayerFill, InternalPortType::MediaPlayerKey]
        );
    }

    #[test]
    fn test_me_outputs_only_visible_to_later_mes() {
        let inputs = two_me();
        let me1_pgm = inputs.iter().find(|i| i.id == 10010).unwrap();
        assert!(!me1_pgm.selectable_on_me(0));
        assert!(me1_pgm.selectable_on_me(1));

        let me2_pvw = inputs.iter().find(|i| i.id == 10021).unwrap();
        assert!(me2_pvw.me_availability.is_empty());
    }

    #[test]
    fn test_clean_feeds_never_composed() {
        let inputs = two_me();
        let cf = inputs.iter().find(|i| i.id == 7001).unwrap();
        assert!(!cf
            .source_availability
            .intersects(SourceAvailability::SUPER_SOURCE_BOX | SourceAvailability::SUPER_SOURCE_ART));
        assert!(!cf.is_aux_loopback());
        assert_eq!(inputs.iter().filter(|i| i.is_aux_loopback()).count(), 3);
    }

    #[test]
    fn test_base_availability_is_intersected() {
        let inputs = VideoInputGenerator::begin(1, SourceAvailability::AUXILIARY)
            .add_internal_colors_and_black(false)
            .add_external_inputs(2)
            .add_multiviewers(1)
            .generate();
        assert!(inputs.iter().all(|i| !i
            .source_availability
            .intersects(SourceAvailability::SUPER_SOURCE_BOX)));
        assert!(!inputs.iter().any(|i| i.id == SOURCE_BARS));
    }

    #[test]
    fn test_me_output_id() {
        assert_eq!(me_output_id(0, false), 10010);
        assert_eq!(me_output_id(0, true), 10011);
        assert_eq!(me_output_id(3, true), 10041);
    }
}
