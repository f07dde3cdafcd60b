//! Warm-up delay between an app reporting ready and its desktop being usable

use std::collections::HashMap;
use std::time::Duration;

use tokio::time::Instant;

use crate::apps::model::App;

pub const DEFAULT_WARMUP_DELAY: Duration = Duration::from_millis(1500);

#[derive(Debug, Clone, Copy)]
struct Entry {
    deadline: Instant,
    warm: bool,
}

/// Tracks when each ready application becomes usable.
///
/// Entries are created on the not-ready to ready transition and dropped as
/// soon as the app leaves the ready state, which cancels any pending timer.
#[derive(Debug)]
pub struct WarmupTracker {
    delay: Duration,
    entries: HashMap<String, Entry>,
}

impl Default for WarmupTracker {
    fn default() -> Self {
        Self::new(DEFAULT_WARMUP_DELAY)
    }
}

impl WarmupTracker {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            entries: HashMap::new(),
        }
    }

    /// Feed the latest batch of records observed at `now`.
    pub fn observe(&mut self, apps: &[App], now: Instant) {
        let delay = self.delay;
        self.entries
            .retain(|id, _| apps.iter().any(|app| app.ready && &app.id == id));

        for app in apps.iter().filter(|app| app.ready) {
            self.entries.entry(app.id.clone()).or_insert(Entry {
                deadline: now + delay,
                warm: false,
            });
        }
    }

    /// Promote every entry whose deadline has passed. Returns the ids that
    /// just became warm.
    pub fn tick(&mut self, now: Instant) -> Vec<String> {
        let mut promoted = Vec::new();
        for (id, entry) in self.entries.iter_mut() {
            if !entry.warm && now >= entry.deadline {
                entry.warm = true;
                promoted.push(id.clone());
            }
        }
        promoted.sort();
        promoted
    }

    pub fn is_warm(&self, id: &str, now: Instant) -> bool {
        self.entries
            .get(id)
            .map(|entry| entry.warm || now >= entry.deadline)
            .unwrap_or(false)
    }

    /// Earliest pending deadline, if any app is still warming up
    pub fn next_deadline(&self) -> Option<Instant> {
        self.entries
            .values()
            .filter(|entry| !entry.warm)
            .map(|entry| entry.deadline)
            .min()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
