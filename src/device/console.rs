//! Console switcher - logs every command instead of sending it

use super::{SwitcherCommand, SwitcherDevice};
use anyhow::Result;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::info;

/// Stand-in device for running without hardware and for tests.
///
/// Every batch is logged and kept, so callers can inspect what would have gone to the switcher.
pub struct ConsoleSwitcher {
    name: String,
    sent: Mutex<Vec<SwitcherCommand>>,
    batch_count: AtomicU64,
}

impl ConsoleSwitcher {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sent: Mutex::new(Vec::new()),
            batch_count: AtomicU64::new(0),
        }
    }

    /// Every command sent so far, oldest first
    pub fn sent(&self) -> Vec<SwitcherCommand> {
        self.sent.lock().clone()
    }

    /// Take and clear the recorded commands
    pub fn drain(&self) -> Vec<SwitcherCommand> {
        std::mem::take(&mut *self.sent.lock())
    }

    pub fn batch_count(&self) -> u64 {
        self.batch_count.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl SwitcherDevice for ConsoleSwitcher {
    fn name(&self) -> &str {
        &self.name
    }

    async fn send(&self, commands: Vec<SwitcherCommand>) -> Result<()> {
        let batch = self.batch_count.fetch_add(1, Ordering::Relaxed) + 1;
        for command in &commands {
            info!("🎬 [{}] #{} {:?}", self.name, batch, command);
        }
        self.sent.lock().extend(commands);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_console_records_batches() {
        let console = ConsoleSwitcher::new("test");
        console
            .send(vec![SwitcherCommand::Cut { me: 0 }])
            .await
            .unwrap();
        console
            .send(vec![
                SwitcherCommand::MacroStop,
                SwitcherCommand::AutoTransition { me: 1 },
            ])
            .await
            .unwrap();

        assert_eq!(console.batch_count(), 2);
        assert_eq!(console.sent().len(), 3);
        assert_eq!(console.drain()[0], SwitcherCommand::Cut { me: 0 });
        assert!(console.sent().is_empty());
    }
}
