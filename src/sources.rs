//! Source catalogue
//!
//! Selectable sources for one model, narrowed to a routing context and named from the live input
//! table, with synthesized placeholders until the device has reported names. Output is always in
//! ascending id order.

use crate::models::topology::{
    SOURCE_AUX_BASE, SOURCE_BARS, SOURCE_BLACK, SOURCE_CLEAN_FEED_BASE, SOURCE_COLOR_BASE,
    SOURCE_DIRECT_BASE, SOURCE_DSK_MASK_BASE, SOURCE_MEDIA_PLAYER_BASE, SOURCE_ME_OUTPUT_BASE,
    SOURCE_MULTIVIEWER_BASE, SOURCE_SUPER_SOURCE_BASE, SOURCE_USK_MASK_BASE,
};
use crate::models::{ModelSpec, SourceAvailability, VideoInputInfo};
use crate::state::{accessors, AtemState};
use serde::{Deserialize, Serialize};

/// Where a source is about to be routed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceContext {
    All,
    /// Program/preview bus of one M/E (0-based)
    MixEffect(u8),
    Auxiliary,
    Multiviewer,
    KeySource,
    SuperSourceArt,
    SuperSourceBox,
}

impl SourceContext {
    pub fn allows(self, input: &VideoInputInfo) -> bool {
        let has = |bit: SourceAvailability| input.source_availability.contains(bit);
        match self {
            SourceContext::All => true,
            SourceContext::MixEffect(me) => input.selectable_on_me(me),
            SourceContext::Auxiliary => has(SourceAvailability::AUXILIARY),
            SourceContext::Multiviewer => has(SourceAvailability::MULTIVIEWER),
            SourceContext::KeySource => has(SourceAvailability::KEY_SOURCE),
            SourceContext::SuperSourceArt => has(SourceAvailability::SUPER_SOURCE_ART),
            SourceContext::SuperSourceBox => has(SourceAvailability::SUPER_SOURCE_BOX),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceInfo {
    pub id: u16,
    pub short_name: String,
    pub long_name: String,
}

/// Sources of `model` valid in `context`, sorted by id
pub fn list_sources(
    model: &ModelSpec,
    state: Option<&AtemState>,
    context: SourceContext,
) -> Vec<SourceInfo> {
    // The topology table is already sorted; keep it that way
    model
        .inputs
        .iter()
        .filter(|input| context.allows(input))
        .map(|input| source_info(state, input.id))
        .collect()
}

/// Shorthand for the main program/preview bus of an M/E
pub fn sources_for_mix_effect(model: &ModelSpec, state: Option<&AtemState>, me: u8) -> Vec<SourceInfo> {
    list_sources(model, state, SourceContext::MixEffect(me))
}

/// Name one source, live name first
pub fn source_info(state: Option<&AtemState>, id: u16) -> SourceInfo {
    let live = state.and_then(|s| accessors::get_input(s, id));
    match live {
        Some(input) if !input.long_name.is_empty() || !input.short_name.is_empty() => {
            let (short, long) = placeholder_names(id);
            SourceInfo {
                id,
                short_name: non_empty_or(&input.short_name, short),
                long_name: non_empty_or(&input.long_name, long),
            }
        }
        _ => {
            let (short_name, long_name) = placeholder_names(id);
            SourceInfo {
                id,
                short_name,
                long_name,
            }
        }
    }
}

fn non_empty_or(value: &str, fallback: String) -> String {
    if value.is_empty() {
        fallback
    } else {
        value.to_string()
    }
}

/// `(short, long)` names derived from the id numbering scheme alone
pub fn placeholder_names(id: u16) -> (String, String) {
    let nth = |base: u16| id - base;
    match id {
        SOURCE_BLACK => ("Blk".into(), "Black".into()),
        1..=999 => (format!("In {}", id), format!("Input {}", id)),
        SOURCE_BARS => ("Bars".into(), "Bars".into()),
        2001..=2999 => {
            let n = nth(SOURCE_COLOR_BASE);
            (format!("Col{}", n), format!("Color {}", n))
        }
        3001..=3999 => {
            let n = nth(SOURCE_MEDIA_PLAYER_BASE) / 10;
            if id % 10 == 1 {
                (format!("MP{}K", n), format!("Media Player {} Key", n))
            } else {
                (format!("MP{}", n), format!("Media Player {}", n))
            }
        }
        4001..=4999 => {
            let n = nth(SOURCE_USK_MASK_BASE) / 10;
            (format!("M{}K", n), format!("Key {} Mask", n))
        }
        5001..=5999 => {
            let n = nth(SOURCE_DSK_MASK_BASE) / 10;
            (format!("DK{}M", n), format!("DSK {} Mask", n))
        }
        6000..=6999 => {
            let n = nth(SOURCE_SUPER_SOURCE_BASE) + 1;
            if n == 1 {
                ("SSrc".into(), "Super Source".into())
            } else {
                (format!("SSc{}", n), format!("Super Source {}", n))
            }
        }
        7001..=7999 => {
            let n = nth(SOURCE_CLEAN_FEED_BASE);
            (format!("Cfd{}", n), format!("Clean Feed {}", n))
        }
        8001..=8999 => {
            let n = nth(SOURCE_AUX_BASE);
            (format!("Aux{}", n), format!("Auxiliary {}", n))
        }
        9001..=9999 => {
            let n = nth(SOURCE_MULTIVIEWER_BASE);
            (format!("MV{}", n), format!("Multiview {}", n))
        }
        10010..=10999 => {
            let me = nth(SOURCE_ME_OUTPUT_BASE) / 10;
            if id % 10 == 1 {
                (format!("M{}PV", me), format!("ME {} Preview", me))
            } else {
                (format!("M{}PG", me), format!("ME {} Program", me))
            }
        }
        11001..=11999 => {
            let n = nth(SOURCE_DIRECT_BASE);
            (format!("In{}D", n), format!("Input {} Direct", n))
        }
        _ => (format!("{}", id), format!("Unknown {}", id)),
    }
}

/// Audio input name: video-backed inputs share the video source name, the rest are named by
/// connector
pub fn audio_input_name(state: Option<&AtemState>, id: u16) -> String {
    match id {
        1..=999 => source_info(state, id).long_name,
        1001 => "XLR".into(),
        1101 => "AES/EBU".into(),
        1201 => "RCA".into(),
        1301..=1399 => format!("Mic {}", id - 1300),
        1401..=1499 => format!("TRS {}", id - 1400),
        1501..=1599 => format!("MADI {}", id - 1500),
        2001..=2999 => format!("Media Player {}", id - 2000),
        _ => format!("Audio {}", id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{get_model_spec, ModelId};
    use crate::state::InputChannel;
    use pretty_assertions::assert_eq;

    fn named(id: u16, short: &str, long: &str) -> InputChannel {
        InputChannel {
            input_id: id,
            long_name: long.to_string(),
            short_name: short.to_string(),
            are_names_default: false,
            internal_port_type: crate::models::InternalPortType::External,
            source_availability: SourceAvailability::ALL,
            me_availability: Default::default(),
        }
    }

    #[test]
    fn test_placeholders() {
        assert_eq!(placeholder_names(7), ("In 7".to_string(), "Input 7".to_string()));
        assert_eq!(placeholder_names(1000).1, "Bars");
        assert_eq!(placeholder_names(2002).1, "Color 2");
        assert_eq!(placeholder_names(3011).0, "MP1K");
        assert_eq!(placeholder_names(3020).1, "Media Player 2");
        assert_eq!(placeholder_names(6000).0, "SSrc");
        assert_eq!(placeholder_names(8003).1, "Auxiliary 3");
        assert_eq!(placeholder_names(10021).0, "M2PV");
        assert_eq!(placeholder_names(11004).1, "Input 4 Direct");
    }

    #[test]
    fn test_live_names_override_placeholders() {
        let model = get_model_spec(ModelId::TWO_ME).unwrap();
        let mut state = AtemState::for_model(model);
        state.inputs.insert(1, named(1, "CAM1", "Camera 1"));
        state.inputs.insert(2, named(2, "", "Stage"));

        let sources = list_sources(model, Some(&state), SourceContext::All);
        assert_eq!(sources[1].short_name, "CAM1");
        assert_eq!(sources[2].short_name, "In 2");
        assert_eq!(sources[2].long_name, "Stage");
        assert_eq!(sources[3].long_name, "Input 3");
    }

    #[test]
    fn test_sorted_and_context_filtered() {
        let model = get_model_spec(ModelId::TWO_ME).unwrap();
        let all = list_sources(model, None, SourceContext::All);
        assert!(all.windows(2).all(|w| w[0].id < w[1].id));

        let me0 = sources_for_mix_effect(model, None, 0);
        assert!(me0.iter().all(|s| s.id < 10000));
        let me1 = sources_for_mix_effect(model, None, 1);
        assert!(me1.iter().any(|s| s.id == 10010));
        assert!(!me1.iter().any(|s| s.id == 10020));

        let keys = list_sources(model, None, SourceContext::KeySource);
        assert!(!keys.iter().any(|s| s.id == 2001 || s.id == 1000));
        let boxes = list_sources(model, None, SourceContext::SuperSourceBox);
        assert!(!boxes.iter().any(|s| s.id == 6000 || s.id == 7001));
    }

    #[test]
    fn test_audio_names() {
        assert_eq!(audio_input_name(None, 1301), "Mic 1");
        assert_eq!(audio_input_name(None, 4), "Input 4");
        assert_eq!(audio_input_name(None, 2002), "Media Player 2");
    }
}
