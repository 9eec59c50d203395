//! Ready-made buttons
//!
//! Each preset pairs one action with the feedback that lights the button while the action's
//! effect is live. Source labels follow the configured label style and are rebuilt whenever input
//! names change.

use crate::actions::ActionId;
use crate::config::PresetLabelStyle;
use crate::feedbacks::FeedbackId;
use crate::host::{
    ButtonStyle, PresetAction, PresetDefinition, PresetFeedback, BLACK, GREEN, RED, WHITE, YELLOW,
};
use crate::models::ModelSpec;
use crate::options::OptionValues;
use crate::sources::{self, SourceContext, SourceInfo};
use crate::state::AtemState;

fn label(source: &SourceInfo, style: PresetLabelStyle) -> String {
    match style {
        PresetLabelStyle::Short => source.short_name.clone(),
        PresetLabelStyle::Long => source.long_name.clone(),
    }
}

fn preset(
    id: String,
    category: String,
    name: String,
    text: String,
    action: ActionId,
    options: OptionValues,
) -> PresetDefinition {
    PresetDefinition {
        id,
        category,
        name,
        style: ButtonStyle::new(text).with_size("14"),
        actions: vec![PresetAction {
            action,
            options,
        }],
        feedbacks: Vec::new(),
    }
}

impl PresetDefinition {
    fn lit_by(mut self, feedback: FeedbackId, options: OptionValues, bgcolor: u32) -> Self {
        let color = if bgcolor == YELLOW { BLACK } else { WHITE };
        self.feedbacks.push(PresetFeedback {
            feedback,
            options,
            style: ButtonStyle::new("").with_bg(bgcolor).with_color(color),
        });
        self
    }
}

/// Preset buttons for `model`, named from `state` when available
pub fn definitions(
    model: &ModelSpec,
    state: Option<&AtemState>,
    style: PresetLabelStyle,
) -> Vec<PresetDefinition> {
    let mut presets = Vec::new();

    for me in 0..model.mixeffects {
        let bus_sources = sources::sources_for_mix_effect(model, state, me);
        for (bus, action, feedback, color) in [
            ("Preview", ActionId::Preview, FeedbackId::PreviewBg, GREEN),
            ("Program", ActionId::Program, FeedbackId::ProgramBg, RED),
        ] {
            let category = format!("{} (M/E {})", bus, me + 1);
            for source in &bus_sources {
                let options = OptionValues::new()
                    .with("mixeffect", me)
                    .with("input", source.id);
                presets.push(
                    preset(
                        format!("{}_me{}_{}", bus.to_lowercase(), me, source.id),
                        category.clone(),
                        format!("{} button for {}", bus, source.long_name),
                        label(source, style),
                        action,
                        options.clone(),
                    )
                    .lit_by(feedback, options, color),
                );
            }
        }

        let transitions = format!("Transitions (M/E {})", me + 1);
        let me_only = OptionValues::new().with("mixeffect", me);
        presets.push(preset(
            format!("cut_me{}", me),
            transitions.clone(),
            "Cut".into(),
            "CUT".into(),
            ActionId::Cut,
            me_only.clone(),
        ));
        presets.push(
            preset(
                format!("auto_me{}", me),
                transitions.clone(),
                "Auto".into(),
                "AUTO".into(),
                ActionId::Auto,
                me_only.clone(),
            )
            .lit_by(FeedbackId::InTransition, me_only.clone(), RED),
        );
        presets.push(
            preset(
                format!("ftb_me{}", me),
                transitions,
                "Fade to black".into(),
                "FTB".into(),
                ActionId::FadeToBlackAuto,
                me_only.clone(),
            )
            .lit_by(
                FeedbackId::FadeToBlack,
                me_only.with("state", "on"),
                RED,
            ),
        );

        for key in 0..model.usks {
            let options = OptionValues::new().with("mixeffect", me).with("key", key);
            presets.push(
                preset(
                    format!("usk_me{}_{}", me, key),
                    "Upstream keys".into(),
                    format!("Toggle M/E {} key {}", me + 1, key + 1),
                    format!("KEY {}", key + 1),
                    ActionId::UskOnAir,
                    options.clone().with("onair", "toggle"),
                )
                .lit_by(FeedbackId::UskOnAir, options, RED),
            );
        }
    }

    for dsk in 0..model.dsks {
        let options = OptionValues::new().with("key", dsk);
        presets.push(
            preset(
                format!("dsk_{}", dsk),
                "Downstream keys".into(),
                format!("Toggle downstream key {}", dsk + 1),
                format!("DSK {}", dsk + 1),
                ActionId::DskOnAir,
                options.clone().with("onair", "toggle"),
            )
            .lit_by(FeedbackId::DskOnAir, options.clone(), RED),
        );
        presets.push(preset(
            format!("dsk_auto_{}", dsk),
            "Downstream keys".into(),
            format!("Auto downstream key {}", dsk + 1),
            format!("DSK {} AUTO", dsk + 1),
            ActionId::DskAuto,
            options,
        ));
    }

    if model.auxes > 0 {
        let aux_sources = sources::list_sources(model, state, SourceContext::Auxiliary);
        for aux in 0..model.auxes {
            for source in &aux_sources {
                let options = OptionValues::new().with("aux", aux).with("input", source.id);
                presets.push(
                    preset(
                        format!("aux{}_{}", aux, source.id),
                        format!("Aux {}", aux + 1),
                        format!("Aux {} button for {}", aux + 1, source.long_name),
                        label(source, style),
                        ActionId::Aux,
                        options.clone(),
                    )
                    .lit_by(FeedbackId::Aux, options, YELLOW),
                );
            }
        }
    }

    for index in 0..model.macros {
        let options = OptionValues::new().with("macro", index);
        presets.push(
            preset(
                format!("macro_{}", index),
                "Macros".into(),
                format!("Run macro {}", index + 1),
                format!("Macro {}", index + 1),
                ActionId::MacroRun,
                options.clone(),
            )
            .lit_by(
                FeedbackId::Macro,
                options.with("state", "isRunning"),
                GREEN,
            ),
        );
    }

    if model.streaming {
        presets.push(
            preset(
                "stream".into(),
                "Streaming & recording".into(),
                "Start or stop streaming".into(),
                "STREAM".into(),
                ActionId::StreamStartStop,
                OptionValues::new().with("state", "toggle"),
            )
            .lit_by(
                FeedbackId::StreamStatus,
                OptionValues::new().with("state", "Streaming"),
                GREEN,
            ),
        );
    }
    if model.recording {
        presets.push(
            preset(
                "record".into(),
                "Streaming & recording".into(),
                "Start or stop recording".into(),
                "REC".into(),
                ActionId::RecordStartStop,
                OptionValues::new().with("state", "toggle"),
            )
            .lit_by(
                FeedbackId::RecordStatus,
                OptionValues::new().with("state", "Recording"),
                RED,
            ),
        );
    }

    presets
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        get_model_spec, InternalPortType, MeAvailability, ModelId, SourceAvailability,
    };
    use crate::state::InputChannel;

    #[test]
    fn test_label_style_selects_name() {
        let model = get_model_spec(ModelId::TWO_ME).unwrap();
        let mut state = AtemState::for_model(model);
        state.inputs.insert(
            1,
            InputChannel {
                input_id: 1,
                long_name: "Camera One".into(),
                short_name: "CAM1".into(),
                are_names_default: false,
                internal_port_type: InternalPortType::External,
                source_availability: SourceAvailability::ALL,
                me_availability: MeAvailability::default(),
            },
        );

        let find = |presets: &[PresetDefinition]| {
            presets
                .iter()
                .find(|p| p.id == "program_me0_1")
                .map(|p| p.style.text.clone())
        };
        let short = definitions(model, Some(&state), PresetLabelStyle::Short);
        let long = definitions(model, Some(&state), PresetLabelStyle::Long);
        assert_eq!(find(&short).as_deref(), Some("CAM1"));
        assert_eq!(find(&long).as_deref(), Some("Camera One"));
    }

    #[test]
    fn test_presets_follow_capabilities() {
        let mini = get_model_spec(ModelId::MINI_PRO).unwrap();
        let presets = definitions(mini, None, PresetLabelStyle::Short);
        assert!(presets.iter().any(|p| p.id == "stream"));
        assert!(presets.iter().any(|p| p.id == "record"));
        assert!(!presets.iter().any(|p| p.id.starts_with("program_me1_")));

        let ids: std::collections::BTreeSet<&str> =
            presets.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids.len(), presets.len(), "preset ids must be unique");
    }
}
