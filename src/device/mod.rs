//! Switcher device boundary
//!
//! The protocol client behind this trait owns the connection and the authoritative state replica.
//! Sending is fire-and-forget: a command's effect only shows up later as a state change.

mod command;
mod console;

pub use command::{
    MediaSource, SuperSourceArtUpdate, SuperSourceBoxUpdate, SwitcherCommand,
};
pub use console::ConsoleSwitcher;

use crate::state::{AtemState, StateChange};
use anyhow::Result;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Events produced by the protocol client, in device-report order
#[derive(Debug, Clone)]
pub enum DeviceEvent {
    Connected,
    /// Initial state sync is complete
    FullSync(Arc<AtemState>),
    StateChanged {
        changes: Vec<StateChange>,
        state: Arc<AtemState>,
    },
    /// Raw tally-by-source packet
    TallyBySource(BTreeMap<u16, crate::state::TallyState>),
    Disconnected,
}

/// Command sink for one switcher
///
/// All methods take `&self` so the device can be shared as `Arc<dyn SwitcherDevice>` between the
/// instance and fade tasks. Implementations use interior mutability.
#[async_trait]
pub trait SwitcherDevice: Send + Sync {
    /// Device name for logs
    fn name(&self) -> &str;

    /// Queue a batch of commands. Resolves once the batch is handed to the transport, not when the
    /// device has applied it.
    async fn send(&self, commands: Vec<SwitcherCommand>) -> Result<()>;
}
