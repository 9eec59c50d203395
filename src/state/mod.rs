//! Live switcher state - read-only mirror, accessors, change signals and the tally feed
//!
//! The protocol client owns and mutates the state tree; this crate receives `Arc<AtemState>`
//! snapshots together with the typed [`StateChange`]s that produced them.

pub mod accessors;
mod change;
mod tally;
mod types;

pub use change::StateChange;
pub use tally::{tally_channel, TallyFeed, TallyPublisher, TallySnapshot, TallyState};
pub use types::*;

/// Fairlight source id of the combined (mono / stereo-linked) source of an input
pub const FAIRLIGHT_COMBINED_SOURCE: i64 = -65280;

/// Fairlight source ids of the left/right halves of a split stereo input
pub const FAIRLIGHT_SPLIT_LEFT_SOURCE: i64 = -256;
pub const FAIRLIGHT_SPLIT_RIGHT_SOURCE: i64 = -255;
