//! Audio routing identifiers
//!
//! A routing endpoint is addressed as `(endpoint id << 16) | channel pair`. Users write it as
//! `"<id>-<first>_<second>"` (e.g. `"1301-1_2"`); a bare `"<id>"` means the first pair.

use crate::models::AudioChannelPair;

pub fn routing_id(endpoint: u16, pair: AudioChannelPair) -> u32 {
    (u32::from(endpoint) << 16) | pair as u32
}

/// Split a combined id back into endpoint and pair
pub fn split_routing_id(id: u32) -> Option<(u16, AudioChannelPair)> {
    let endpoint = u16::try_from(id >> 16).ok()?;
    let pair = AudioChannelPair::from_index((id & 0xffff) as u16)?;
    Some((endpoint, pair))
}

/// Parse one routing endpoint. Anything malformed (non-numeric id, pair not an adjacent
/// odd/even couple, pair beyond 15_16) is `None`.
pub fn parse_audio_routing_string_single(text: &str) -> Option<u32> {
    let text = text.trim();
    let (id_part, pair_part) = match text.split_once('-') {
        Some((id, pair)) => (id, Some(pair)),
        None => (text, None),
    };

    let endpoint: u16 = id_part.trim().parse().ok()?;
    let pair = match pair_part {
        None => AudioChannelPair::Channel1_2,
        Some(pair) => {
            let (first, second) = pair.trim().split_once('_')?;
            let first: u16 = first.parse().ok()?;
            let second: u16 = second.parse().ok()?;
            if second != first + 1 {
                return None;
            }
            AudioChannelPair::from_first_channel(first)?
        }
    };
    Some(routing_id(endpoint, pair))
}

/// Parse a comma separated list, dropping malformed entries
pub fn parse_audio_routing_string(text: &str) -> Vec<u32> {
    text.split(',')
        .filter(|part| !part.trim().is_empty())
        .filter_map(parse_audio_routing_string_single)
        .collect()
}

pub fn format_audio_routing_string(id: u32) -> String {
    match split_routing_id(id) {
        Some((endpoint, pair)) => format!("{}-{}", endpoint, pair.label()),
        None => id.to_string(),
    }
}
