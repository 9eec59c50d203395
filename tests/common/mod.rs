//! Shared fixtures for integration tests

use anyhow::Result;
use async_trait::async_trait;
use atem_surface::device::{SwitcherCommand, SwitcherDevice};
use atem_surface::state::AtemState;
use parking_lot::Mutex;

/// Switcher stand-in that applies the commands it understands to its own state copy
pub struct SimulatedSwitcher {
    state: Mutex<AtemState>,
    unhandled: Mutex<Vec<SwitcherCommand>>,
}

impl SimulatedSwitcher {
    pub fn new(state: AtemState) -> Self {
        Self {
            state: Mutex::new(state),
            unhandled: Mutex::new(Vec::new()),
        }
    }

    pub fn state(&self) -> AtemState {
        self.state.lock().clone()
    }

    pub fn unhandled(&self) -> Vec<SwitcherCommand> {
        self.unhandled.lock().clone()
    }

    fn apply(&self, command: SwitcherCommand) {
        let mut state = self.state.lock();
        let video = &mut state.video;
        let applied = match &command {
            SwitcherCommand::ProgramInput { me, source } => video
                .mix_effects
                .get_mut(usize::from(*me))
                .and_then(Option::as_mut)
                .map(|m| m.program_input = *source),
            SwitcherCommand::PreviewInput { me, source } => video
                .mix_effects
                .get_mut(usize::from(*me))
                .and_then(Option::as_mut)
                .map(|m| m.preview_input = *source),
            SwitcherCommand::TransitionStyle { me, style } => video
                .mix_effects
                .get_mut(usize::from(*me))
                .and_then(Option::as_mut)
                .map(|m| m.transition_properties.next_style = *style),
            SwitcherCommand::UpstreamKeyerOnAir { me, key, on_air } => video
                .mix_effects
                .get_mut(usize::from(*me))
                .and_then(Option::as_mut)
                .and_then(|m| m.upstream_keyers.get_mut(usize::from(*key)))
                .and_then(Option::as_mut)
                .map(|k| k.on_air = *on_air),
            SwitcherCommand::DownstreamKeyerOnAir { dsk, on_air } => video
                .downstream_keyers
                .get_mut(usize::from(*dsk))
                .and_then(Option::as_mut)
                .map(|d| d.on_air = *on_air),
            SwitcherCommand::AuxSource { aux, source } => video
                .auxiliaries
                .get_mut(usize::from(*aux))
                .map(|slot| *slot = Some(*source)),
            _ => None,
        };
        if applied.is_none() {
            self.unhandled.lock().push(command);
        }
    }
}

#[async_trait]
impl SwitcherDevice for SimulatedSwitcher {
    fn name(&self) -> &str {
        "simulator"
    }

    async fn send(&self, commands: Vec<SwitcherCommand>) -> Result<()> {
        for command in commands {
            self.apply(command);
        }
        Ok(())
    }
}
