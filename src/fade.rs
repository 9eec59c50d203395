//! Software gain fades
//!
//! Switchers only take absolute gains, so a fade is a run of gain commands sent at the configured
//! frame rate. One fade per target; starting another on the same target replaces it.

use crate::device::{SwitcherCommand, SwitcherDevice};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, trace, warn};

/// Gain that can be faded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FadeTarget {
    ClassicInput(u16),
    ClassicMaster,
    FairlightSource { input: u16, source: i64 },
    FairlightMaster,
}

impl FadeTarget {
    /// The fadeable gain a command writes, if any
    pub fn of(command: &SwitcherCommand) -> Option<Self> {
        match *command {
            SwitcherCommand::ClassicAudioGain { input, .. } => Some(FadeTarget::ClassicInput(input)),
            SwitcherCommand::ClassicAudioMasterGain { .. } => Some(FadeTarget::ClassicMaster),
            SwitcherCommand::FairlightFaderGain { input, source, .. } => {
                Some(FadeTarget::FairlightSource { input, source })
            }
            SwitcherCommand::FairlightMasterGain { .. } => Some(FadeTarget::FairlightMaster),
            _ => None,
        }
    }

    pub fn command(self, gain: f64) -> SwitcherCommand {
        match self {
            FadeTarget::ClassicInput(input) => SwitcherCommand::ClassicAudioGain { input, gain },
            FadeTarget::ClassicMaster => SwitcherCommand::ClassicAudioMasterGain { gain },
            FadeTarget::FairlightSource { input, source } => {
                SwitcherCommand::FairlightFaderGain {
                    input,
                    source,
                    gain,
                }
            }
            FadeTarget::FairlightMaster => SwitcherCommand::FairlightMasterGain { gain },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FadeRequest {
    pub target: FadeTarget,
    pub from: f64,
    pub to: f64,
    pub duration_ms: u32,
}

impl FadeRequest {
    /// Gains to send, one per frame, ending exactly on `to`
    pub fn steps(&self, fps: u32) -> Vec<f64> {
        let frames = (f64::from(self.duration_ms) * f64::from(fps) / 1000.0).ceil() as u32;
        if frames <= 1 {
            return vec![self.to];
        }
        (1..=frames)
            .map(|i| {
                if i == frames {
                    self.to
                } else {
                    self.from + (self.to - self.from) * f64::from(i) / f64::from(frames)
                }
            })
            .collect()
    }
}

pub struct FadeScheduler<D: SwitcherDevice + 'static> {
    device: Arc<D>,
    fps: u32,
    running: Mutex<HashMap<FadeTarget, JoinHandle<()>>>,
}

impl<D: SwitcherDevice + 'static> FadeScheduler<D> {
    pub fn new(device: Arc<D>, fps: u32) -> Self {
        Self {
            device,
            fps: fps.clamp(1, 60),
            running: Mutex::new(HashMap::new()),
        }
    }

    pub fn set_fps(&mut self, fps: u32) {
        self.fps = fps.clamp(1, 60);
    }

    pub fn fps(&self) -> u32 {
        self.fps
    }

    /// Start a fade, replacing any fade still running on the same target
    pub fn start(&self, request: FadeRequest) {
        let steps = request.steps(self.fps);
        let period = Duration::from_millis(u64::from(1000 / self.fps));
        let device = Arc::clone(&self.device);
        let target = request.target;
        debug!(
            "🎚️ Fade {:?} {:.1} -> {:.1} dB in {} steps",
            target,
            request.from,
            request.to,
            steps.len()
        );

        let handle = tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            for gain in steps {
                ticker.tick().await;
                if let Err(e) = device.send(vec![target.command(gain)]).await {
                    warn!("Fade {:?} aborted: {}", target, e);
                    return;
                }
                trace!("Fade {:?} step {:.2}", target, gain);
            }
        });

        let mut running = self.running.lock();
        running.retain(|_, h| !h.is_finished());
        if let Some(previous) = running.insert(target, handle) {
            previous.abort();
        }
    }

    /// Stop the fade running on `target`, if any
    pub fn cancel(&self, target: FadeTarget) {
        if let Some(handle) = self.running.lock().remove(&target) {
            debug!("Fade {:?} cancelled", target);
            handle.abort();
        }
    }

    pub fn cancel_all(&self) {
        for (_, handle) in self.running.lock().drain() {
            handle.abort();
        }
    }

    /// Fades not yet finished
    pub fn active(&self) -> usize {
        self.running
            .lock()
            .values()
            .filter(|h| !h.is_finished())
            .count()
    }
}

impl<D: SwitcherDevice + 'static> Drop for FadeScheduler<D> {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::ConsoleSwitcher;

    fn request(duration_ms: u32) -> FadeRequest {
        FadeRequest {
            target: FadeTarget::ClassicInput(1),
            from: -10.0,
            to: 0.0,
            duration_ms,
        }
    }

    #[test]
    fn test_steps_end_on_target() {
        let steps = request(1000).steps(10);
        assert_eq!(steps.len(), 10);
        assert_eq!(steps.last(), Some(&0.0));
        assert!((steps[0] - -9.0).abs() < 1e-9);
        assert_eq!(request(0).steps(10), vec![0.0]);
        assert_eq!(request(250).steps(10).len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fade_sends_every_step() {
        let device = Arc::new(ConsoleSwitcher::new("fade"));
        let scheduler = FadeScheduler::new(Arc::clone(&device), 10);
        scheduler.start(request(500));
        tokio::time::sleep(Duration::from_secs(2)).await;

        let sent = device.sent();
        assert_eq!(sent.len(), 5);
        assert_eq!(
            sent.last(),
            Some(&SwitcherCommand::ClassicAudioGain {
                input: 1,
                gain: 0.0
            })
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_fade_replaces_running_one() {
        let device = Arc::new(ConsoleSwitcher::new("fade"));
        let scheduler = FadeScheduler::new(Arc::clone(&device), 10);
        scheduler.start(request(5000));
        tokio::time::sleep(Duration::from_millis(250)).await;
        scheduler.start(FadeRequest {
            to: -20.0,
            ..request(0)
        });
        tokio::time::sleep(Duration::from_secs(10)).await;

        let sent = device.sent();
        assert!(sent.len() < 10);
        assert_eq!(
            sent.last(),
            Some(&SwitcherCommand::ClassicAudioGain {
                input: 1,
                gain: -20.0
            })
        );
        assert_eq!(scheduler.active(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_only_that_target() {
        let device = Arc::new(ConsoleSwitcher::new("fade"));
        let scheduler = FadeScheduler::new(Arc::clone(&device), 10);
        scheduler.start(request(1000));
        scheduler.start(FadeRequest {
            target: FadeTarget::ClassicMaster,
            ..request(1000)
        });
        tokio::time::sleep(Duration::from_millis(150)).await;
        scheduler.cancel(FadeTarget::ClassicInput(1));
        scheduler.cancel(FadeTarget::FairlightMaster);
        tokio::time::sleep(Duration::from_secs(3)).await;

        let sent = device.sent();
        let input_steps = sent
            .iter()
            .filter(|c| FadeTarget::of(c) == Some(FadeTarget::ClassicInput(1)))
            .count();
        assert!(input_steps < 10);
        assert_eq!(
            sent.last(),
            Some(&SwitcherCommand::ClassicAudioMasterGain { gain: 0.0 })
        );
        assert_eq!(scheduler.active(), 0);
    }

    #[test]
    fn test_target_of_command() {
        assert_eq!(
            FadeTarget::of(&FadeTarget::FairlightSource { input: 2, source: -256 }.command(1.0)),
            Some(FadeTarget::FairlightSource { input: 2, source: -256 })
        );
        assert_eq!(
            FadeTarget::of(&FadeTarget::ClassicMaster.command(0.0)),
            Some(FadeTarget::ClassicMaster)
        );
        assert_eq!(FadeTarget::of(&SwitcherCommand::Cut { me: 0 }), None);
    }
}
