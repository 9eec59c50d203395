//! Change classification
//!
//! Maps one change signal to the narrowest set of derived facts it can affect. The match is
//! exhaustive, so adding a [`StateChange`] variant forces a decision here.

use super::facts::{Category, Impact, Scope, Target, VariableGroup};
use crate::feedbacks::FeedbackId;
use crate::options::pickers::fairlight_source_key;
use crate::state::StateChange;

fn var(group: VariableGroup) -> Target {
    Target::Variables(group)
}

fn fb(id: FeedbackId, scope: Scope) -> Target {
    Target::Feedback(id, scope)
}

pub fn classify(change: &StateChange) -> Impact {
    use StateChange as C;
    use VariableGroup as V;

    let targets = match change {
        C::Info | C::InputPool | C::MediaPool | C::FairlightInput { .. } => {
            return Impact::Structural
        }
        C::InputName { .. } => {
            return Impact::CategoryWide(vec![
                Category::Definitions,
                Category::Variables,
                Category::Presets,
                Category::Feedback(FeedbackId::ProgramSourceLabel),
            ])
        }

        C::MixEffectProgram { me } => vec![
            var(V::MeProgram { me: *me }),
            fb(FeedbackId::ProgramBg, Scope::me(*me)),
            fb(FeedbackId::ProgramSourceLabel, Scope::me(*me)),
            // Variable-driven instances carry 1-based text and can't be narrowed
            fb(FeedbackId::ProgramBgVariables, Scope::all()),
        ],
        C::MixEffectPreview { me } => vec![
            var(V::MePreview { me: *me }),
            fb(FeedbackId::PreviewBg, Scope::me(*me)),
            fb(FeedbackId::PreviewBgVariables, Scope::all()),
        ],
        C::TransitionPosition { me } => vec![
            var(V::TransitionPosition { me: *me }),
            fb(FeedbackId::InTransition, Scope::me(*me)),
        ],
        C::TransitionProperties { me } => vec![
            var(V::Transition { me: *me }),
            fb(FeedbackId::TransitionStyle, Scope::me(*me)),
            fb(FeedbackId::TransitionSelection, Scope::me(*me)),
            fb(FeedbackId::TransitionRate, Scope::me(*me)),
        ],
        C::TransitionSettings { me } => vec![
            var(V::Transition { me: *me }),
            fb(FeedbackId::TransitionRate, Scope::me(*me)),
        ],
        C::TransitionPreview { me } => {
            vec![fb(FeedbackId::PreviewTransition, Scope::me(*me))]
        }
        C::FadeToBlack { me } => vec![
            var(V::FadeToBlack { me: *me }),
            fb(FeedbackId::FadeToBlack, Scope::me(*me)),
        ],

        C::UpstreamKeyerOnAir { me, key } => vec![
            var(V::UpstreamKeyer { me: *me, key: *key }),
            fb(FeedbackId::UskOnAir, Scope::me_key(*me, *key)),
        ],
        C::UpstreamKeyerSources { me, key } => vec![
            var(V::UpstreamKeyer { me: *me, key: *key }),
            fb(FeedbackId::UskSource, Scope::me_key(*me, *key)),
        ],
        C::UpstreamKeyerProperties { .. } => return Impact::Ignore,

        C::DownstreamKeyerState { dsk } => vec![
            var(V::DownstreamKeyer { dsk: *dsk }),
            fb(FeedbackId::DskOnAir, Scope::all().with("key", *dsk)),
        ],
        C::DownstreamKeyerSources { dsk } => vec![
            var(V::DownstreamKeyer { dsk: *dsk }),
            fb(FeedbackId::DskSource, Scope::all().with("key", *dsk)),
        ],
        C::DownstreamKeyerProperties { dsk } => {
            vec![fb(FeedbackId::DskTie, Scope::all().with("key", *dsk))]
        }

        C::Auxiliary { aux } => vec![
            var(V::Aux { aux: *aux }),
            fb(FeedbackId::Aux, Scope::all().with("aux", *aux)),
            fb(FeedbackId::AuxVariables, Scope::all()),
        ],

        C::SuperSourceProperties { ssrc } => vec![fb(
            FeedbackId::SsrcArtSource,
            Scope::all().with("ssrcId", *ssrc),
        )],
        C::SuperSourceBox { ssrc, box_index } => {
            let scope = Scope::all()
                .with("ssrcId", *ssrc)
                .with("boxIndex", *box_index);
            vec![
                var(V::SuperSourceBox {
                    ssrc: *ssrc,
                    box_index: *box_index,
                }),
                fb(FeedbackId::SsrcBoxOnAir, scope.clone()),
                fb(FeedbackId::SsrcBoxSource, scope.clone()),
                fb(FeedbackId::SsrcBoxProperties, scope),
            ]
        }

        C::MediaPlayer { player } => vec![
            var(V::MediaPlayer { player: *player }),
            fb(
                FeedbackId::MediaPlayerSource,
                Scope::all().with("mediaplayer", *player),
            ),
        ],

        C::Multiviewer { mv } => vec![
            var(V::Multiviewer {
                mv: *mv,
                window: None,
            }),
            fb(FeedbackId::MvSource, Scope::all().with("multiViewerId", *mv)),
        ],
        C::MultiviewerWindow { mv, window } => vec![
            var(V::Multiviewer {
                mv: *mv,
                window: Some(*window),
            }),
            fb(
                FeedbackId::MvSource,
                Scope::all()
                    .with("multiViewerId", *mv)
                    .with("windowIndex", *window),
            ),
        ],

        C::MacroProperties { index } => vec![
            var(V::Macro { index: *index }),
            fb(FeedbackId::Macro, Scope::all().with("macro", *index)),
        ],
        C::MacroPlayer | C::MacroRecorder => vec![
            var(V::MacroState),
            fb(FeedbackId::Macro, Scope::all()),
            fb(FeedbackId::MacroLoop, Scope::all()),
        ],

        C::ClassicAudioChannel { input } => {
            let scope = Scope::all().with("input", *input);
            vec![
                var(V::ClassicAudio { input: *input }),
                fb(FeedbackId::ClassicAudioGain, scope.clone()),
                fb(FeedbackId::ClassicAudioMixOption, scope),
            ]
        }
        C::ClassicAudioMaster => vec![var(V::ClassicAudioMaster)],

        C::FairlightSource { input, source } => {
            let scope = Scope::all().with("source", fairlight_source_key(*input, *source));
            vec![
                var(V::FairlightSource {
                    input: *input,
                    source: *source,
                }),
                fb(FeedbackId::FairlightFaderGain, scope.clone()),
                fb(FeedbackId::FairlightMixOption, scope),
            ]
        }
        C::FairlightMaster => vec![var(V::FairlightMaster)],
        C::FairlightMonitor => vec![var(V::FairlightMonitor)],
        C::AudioRoutingSource { .. } => vec![var(V::AudioRouting { output: None })],
        C::AudioRoutingOutput { id } => vec![
            var(V::AudioRouting { output: Some(*id) }),
            fb(FeedbackId::AudioRouting, Scope::all().with("output", *id)),
        ],

        C::StreamingStatus => vec![
            var(V::Streaming),
            fb(FeedbackId::StreamStatus, Scope::all()),
        ],
        C::StreamingDuration | C::StreamingStats | C::StreamingService => {
            vec![var(V::Streaming)]
        }

        C::RecordingStatus => vec![
            var(V::Recording),
            fb(FeedbackId::RecordStatus, Scope::all()),
        ],
        C::RecordingDuration => vec![var(V::Recording)],
        C::RecordingProperties => vec![
            var(V::Recording),
            fb(FeedbackId::RecordIso, Scope::all()),
        ],

        C::TallyBySource => vec![fb(FeedbackId::InputTally, Scope::all())],

        C::Other(_) => return Impact::Ignore,
    };
    Impact::Targeted(targets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_structural_signals() {
        for change in [
            StateChange::Info,
            StateChange::InputPool,
            StateChange::MediaPool,
            StateChange::FairlightInput { input: 1 },
        ] {
            assert_eq!(classify(&change), Impact::Structural, "{:?}", change);
        }
    }

    #[test]
    fn test_input_name_is_category_wide() {
        assert_eq!(
            classify(&StateChange::InputName { input: 3 }),
            Impact::CategoryWide(vec![
                Category::Definitions,
                Category::Variables,
                Category::Presets,
                Category::Feedback(FeedbackId::ProgramSourceLabel),
            ])
        );
    }

    #[test]
    fn test_program_change_is_scoped_to_its_me() {
        let Impact::Targeted(targets) = classify(&StateChange::MixEffectProgram { me: 1 }) else {
            panic!("expected targeted impact");
        };
        assert!(targets.contains(&Target::Variables(VariableGroup::MeProgram { me: 1 })));
        assert!(targets.contains(&Target::Feedback(FeedbackId::ProgramBg, Scope::me(1))));
        assert!(!targets
            .iter()
            .any(|t| matches!(t, Target::Feedback(FeedbackId::PreviewBg, _))));
    }

    #[test]
    fn test_bookkeeping_is_ignored() {
        assert_eq!(
            classify(&StateChange::Other("displayClock".into())),
            Impact::Ignore
        );
        assert_eq!(
            classify(&StateChange::UpstreamKeyerProperties { me: 0, key: 0 }),
            Impact::Ignore
        );
    }
}
