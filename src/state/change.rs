//! Typed change signals
//!
//! One variant per addressable unit of the live state tree, carrying the unit's 0-based indices.
//! The protocol client reports dotted paths; [`StateChange::from_path`] folds them into this
//! closed set so classification is an exhaustive `match` rather than string matching.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StateChange {
    /// Device identity or capability report
    Info,
    /// Composition of the input table itself
    InputPool,
    /// Names (or port metadata) of one input
    InputName { input: u16 },

    MixEffectProgram { me: u8 },
    MixEffectPreview { me: u8 },
    TransitionPosition { me: u8 },
    TransitionProperties { me: u8 },
    TransitionSettings { me: u8 },
    TransitionPreview { me: u8 },
    FadeToBlack { me: u8 },

    UpstreamKeyerOnAir { me: u8, key: u8 },
    UpstreamKeyerSources { me: u8, key: u8 },
    UpstreamKeyerProperties { me: u8, key: u8 },

    DownstreamKeyerState { dsk: u8 },
    DownstreamKeyerSources { dsk: u8 },
    DownstreamKeyerProperties { dsk: u8 },

    Auxiliary { aux: u8 },

    SuperSourceProperties { ssrc: u8 },
    SuperSourceBox { ssrc: u8, box_index: u8 },

    MediaPlayer { player: u8 },
    /// Still or clip pool contents
    MediaPool,

    Multiviewer { mv: u8 },
    MultiviewerWindow { mv: u8, window: u8 },

    MacroProperties { index: u16 },
    MacroPlayer,
    MacroRecorder,

    ClassicAudioChannel { input: u16 },
    ClassicAudioMaster,

    FairlightInput { input: u16 },
    FairlightSource { input: u16, source: i64 },
    FairlightMaster,
    FairlightMonitor,
    AudioRoutingSource { id: u32 },
    AudioRoutingOutput { id: u32 },

    StreamingStatus,
    StreamingDuration,
    StreamingStats,
    StreamingService,

    RecordingStatus,
    RecordingDuration,
    RecordingProperties,

    /// Raw tally-by-source update
    TallyBySource,

    /// Bookkeeping subtree with no externally visible representation
    Other(String),
}

fn idx<T: FromStr>(s: &str) -> Option<T> {
    s.parse().ok()
}

impl StateChange {
    /// Fold a protocol-client change path (e.g. `video.mixEffects.1.programInput`) into a signal.
    /// Paths that name nothing this crate displays become [`StateChange::Other`].
    pub fn from_path(path: &str) -> Self {
        let parts: Vec<&str> = path.split('.').collect();
        Self::parse_parts(&parts).unwrap_or_else(|| StateChange::Other(path.to_string()))
    }

    fn parse_parts(parts: &[&str]) -> Option<Self> {
        use StateChange::*;

        let change = match parts {
            ["info", ..] => Info,

            ["inputs"] => InputPool,
            ["inputs", input, ..] => InputName { input: idx(input)? },

            ["video", "mixEffects", me, rest @ ..] => {
                let me = idx(me)?;
                match rest {
                    ["programInput"] => MixEffectProgram { me },
                    ["previewInput"] => MixEffectPreview { me },
                    ["transitionPosition", ..] => TransitionPosition { me },
                    ["transitionProperties", ..] => TransitionProperties { me },
                    ["transitionSettings", ..] => TransitionSettings { me },
                    ["transitionPreview"] => TransitionPreview { me },
                    ["fadeToBlack", ..] => FadeToBlack { me },
                    ["upstreamKeyers", key, tail @ ..] => {
                        let key = idx(key)?;
                        match tail {
                            ["onAir"] => UpstreamKeyerOnAir { me, key },
                            []
                            | ["fillSource"]
                            | ["cutSource"]
                            | ["mixEffectKeyType"] => UpstreamKeyerSources { me, key },
                            _ => UpstreamKeyerProperties { me, key },
                        }
                    }
                    _ => return None,
                }
            }

            ["video", "downstreamKeyers", dsk, rest @ ..] => {
                let dsk = idx(dsk)?;
                match rest {
                    ["sources", ..] => DownstreamKeyerSources { dsk },
                    ["properties", ..] => DownstreamKeyerProperties { dsk },
                    _ => DownstreamKeyerState { dsk },
                }
            }

            ["video", "auxilliaries" | "auxiliaries", aux] => Auxiliary { aux: idx(aux)? },

            ["video", "superSources", ssrc, rest @ ..] => {
                let ssrc = idx(ssrc)?;
                match rest {
                    ["boxes", box_index, ..] => SuperSourceBox {
                        ssrc,
                        box_index: idx(box_index)?,
                    },
                    ["properties", ..] | ["border", ..] => SuperSourceProperties { ssrc },
                    _ => return None,
                }
            }

            ["media", "players", player, ..] => MediaPlayer {
                player: idx(player)?,
            },
            ["media", "stillPool" | "clipPool", ..] => MediaPool,

            ["settings", "multiViewers", mv] => Multiviewer { mv: idx(mv)? },
            ["settings", "multiViewers", mv, "windows", window, ..] => MultiviewerWindow {
                mv: idx(mv)?,
                window: idx(window)?,
            },

            ["macro", "macroProperties", index, ..] => MacroProperties {
                index: idx(index)?,
            },
            ["macro", "macroPlayer", ..] => MacroPlayer,
            ["macro", "macroRecorder", ..] => MacroRecorder,

            ["audio", "channels", input, ..] => ClassicAudioChannel {
                input: idx(input)?,
            },
            ["audio", "master", ..] => ClassicAudioMaster,

            ["fairlight", "inputs", input, "properties"] => FairlightInput {
                input: idx(input)?,
            },
            ["fairlight", "inputs", input, "sources", source, "properties", ..] => {
                FairlightSource {
                    input: idx(input)?,
                    source: idx(source)?,
                }
            }
            ["fairlight", "master", ..] => FairlightMaster,
            ["fairlight", "monitor", ..] => FairlightMonitor,
            ["fairlight", "audioRouting", "sources", id, ..] => AudioRoutingSource { id: idx(id)? },
            ["fairlight", "audioRouting", "outputs", id, ..] => AudioRoutingOutput { id: idx(id)? },

            ["streaming", "status", ..] => StreamingStatus,
            ["streaming", "duration", ..] => StreamingDuration,
            ["streaming", "stats", ..] => StreamingStats,
            ["streaming", "service", ..] => StreamingService,

            ["recording", "status", ..] => RecordingStatus,
            ["recording", "duration", ..] => RecordingDuration,
            ["recording", "properties", ..] => RecordingProperties,

            ["tallyBySource", ..] => TallyBySource,

            _ => return None,
        };
        Some(change)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_mix_effect_paths() {
        assert_eq!(
            StateChange::from_path("video.mixEffects.1.programInput"),
            StateChange::MixEffectProgram { me: 1 }
        );
        assert_eq!(
            StateChange::from_path("video.mixEffects.0.transitionSettings.mix"),
            StateChange::TransitionSettings { me: 0 }
        );
        assert_eq!(
            StateChange::from_path("video.mixEffects.0.upstreamKeyers.2.onAir"),
            StateChange::UpstreamKeyerOnAir { me: 0, key: 2 }
        );
        assert_eq!(
            StateChange::from_path("video.mixEffects.0.upstreamKeyers.2"),
            StateChange::UpstreamKeyerSources { me: 0, key: 2 }
        );
        assert_eq!(
            StateChange::from_path("video.mixEffects.0.upstreamKeyers.2.dveSettings"),
            StateChange::UpstreamKeyerProperties { me: 0, key: 2 }
        );
    }

    #[test]
    fn test_unit_paths() {
        assert_eq!(
            StateChange::from_path("video.auxilliaries.4"),
            StateChange::Auxiliary { aux: 4 }
        );
        assert_eq!(
            StateChange::from_path("video.superSources.0.boxes.3"),
            StateChange::SuperSourceBox {
                ssrc: 0,
                box_index: 3
            }
        );
        assert_eq!(
            StateChange::from_path("settings.multiViewers.1.windows.9"),
            StateChange::MultiviewerWindow { mv: 1, window: 9 }
        );
        assert_eq!(
            StateChange::from_path("fairlight.inputs.1301.sources.-65280.properties"),
            StateChange::FairlightSource {
                input: 1301,
                source: -65280
            }
        );
        assert_eq!(StateChange::from_path("inputs"), StateChange::InputPool);
        assert_eq!(
            StateChange::from_path("inputs.7"),
            StateChange::InputName { input: 7 }
        );
        assert_eq!(
            StateChange::from_path("media.stillPool.12"),
            StateChange::MediaPool
        );
    }

    #[test]
    fn test_unmodelled_paths_are_other() {
        for path in [
            "fairlight.inputs.1.sources.-65280.levels",
            "video.mixEffects.x.programInput",
            "video.mixEffects.0.keyerFlyKeyframes",
            "displayClock",
            "",
        ] {
            assert_eq!(
                StateChange::from_path(path),
                StateChange::Other(path.to_string())
            );
        }
    }
}
