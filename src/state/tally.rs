//! Tally-by-source feed
//!
//! The raw-command handler publishes whole snapshots; subscribers never see a map that is being
//! mutated underneath them. Every publish bumps the version.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::watch;

/// Program/preview tally of one source
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TallyState {
    pub program: bool,
    pub preview: bool,
}

/// Immutable tally map, as of one device report
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TallySnapshot {
    pub version: u64,
    pub sources: BTreeMap<u16, TallyState>,
}

impl TallySnapshot {
    pub fn get(&self, source: u16) -> TallyState {
        self.sources.get(&source).copied().unwrap_or_default()
    }
}

/// Publishing side, held by whoever decodes tally packets
#[derive(Debug)]
pub struct TallyPublisher {
    tx: watch::Sender<Arc<TallySnapshot>>,
}

/// Subscribing side
pub type TallyFeed = watch::Receiver<Arc<TallySnapshot>>;

/// Create a connected publisher/feed pair starting from an empty, version 0 snapshot
pub fn tally_channel() -> (TallyPublisher, TallyFeed) {
    let (tx, rx) = watch::channel(Arc::new(TallySnapshot::default()));
    (TallyPublisher { tx }, rx)
}

impl TallyPublisher {
    /// Replace the current map. Returns the new version.
    ///
    /// Unchanged maps are not republished, so subscribers only wake for real transitions.
    pub fn publish(&self, sources: BTreeMap<u16, TallyState>) -> u64 {
        let mut version = 0;
        self.tx.send_if_modified(|current| {
            if current.sources == sources {
                version = current.version;
                return false;
            }
            version = current.version + 1;
            *current = Arc::new(TallySnapshot { version, sources });
            true
        });
        version
    }

    pub fn current(&self) -> Arc<TallySnapshot> {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> TallyFeed {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tally(program: bool, preview: bool) -> TallyState {
        TallyState { program, preview }
    }

    #[tokio::test]
    async fn test_publish_bumps_version_and_wakes_subscriber() {
        let (publisher, mut feed) = tally_channel();
        assert_eq!(feed.borrow().version, 0);

        let mut map = BTreeMap::new();
        map.insert(1, tally(true, false));
        assert_eq!(publisher.publish(map.clone()), 1);

        feed.changed().await.unwrap();
        let snapshot = feed.borrow_and_update().clone();
        assert_eq!(snapshot.version, 1);
        assert!(snapshot.get(1).program);
        assert_eq!(snapshot.get(2), TallyState::default());
    }

    #[tokio::test]
    async fn test_identical_map_is_not_republished() {
        let (publisher, mut feed) = tally_channel();
        let mut map = BTreeMap::new();
        map.insert(3, tally(false, true));
        publisher.publish(map.clone());
        feed.borrow_and_update();

        assert_eq!(publisher.publish(map), 1);
        assert!(!feed.has_changed().unwrap());
    }

    #[test]
    fn test_old_snapshots_are_untouched() {
        let (publisher, _feed) = tally_channel();
        let mut map = BTreeMap::new();
        map.insert(1, tally(true, false));
        publisher.publish(map.clone());
        let held = publisher.current();

        map.insert(1, tally(false, false));
        publisher.publish(map);
        assert!(held.get(1).program);
        assert!(!publisher.current().get(1).program);
    }
}
