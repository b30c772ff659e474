use dashmap::DashMap;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::time::interval;
use tracing::{debug, error, info};

use crate::clock::Clock;
use crate::metrics::TRACKED_IDENTITIES;

pub const DEFAULT_LIMIT: usize = 10;
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(10);
pub const DEFAULT_IDLE_TTL: Duration = Duration::from_secs(60);

// Quota settings, fixed once the gate is built
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GateConfig {
    pub limit: usize, // max admissions per window
    pub window: Duration, // sliding window length
    pub idle_ttl: Duration, // unseen this long -> window can be evicted
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            window: DEFAULT_WINDOW,
            idle_ttl: DEFAULT_IDLE_TTL,
        }
    }
}

// Admission instants for one API key, oldest first
#[derive(Debug, Default)]
struct CallerWindow {
    timestamps: VecDeque<Instant>,
    // set under the lock when the sweeper unlinks this window from the map
    retired: bool,
}

impl CallerWindow {
    // Drop everything strictly older than the window
    fn prune(&mut self, now: Instant, window: Duration) {
        while let Some(&oldest) = self.timestamps.front() {
            if now.saturating_duration_since(oldest) > window {
                self.timestamps.pop_front();
            } else {
                break;
            }
        }
    }

    fn record(&mut self, now: Instant) {
        // a racing thread may hand us an instant older than the newest entry
        let pos = self.timestamps.partition_point(|&t| t <= now);
        self.timestamps.insert(pos, now);
    }

    fn newest(&self) -> Option<Instant> {
        self.timestamps.back().copied()
    }
}

// Per-key sliding-window quota. One mutex per key, the shard lock is only
// held to fetch or create the handle.
#[derive(Debug)]
pub struct AdmissionGate {
    limit: usize,
    window: Duration,
    idle_ttl: Duration,
    windows: DashMap<String, Arc<Mutex<CallerWindow>>>,
}

impl AdmissionGate {
    pub fn new(config: GateConfig) -> Self {
        Self {
            limit: config.limit,
            window: config.window,
            // evicting before the window has fully drained would forget admissions
            idle_ttl: config.idle_ttl.max(config.window),
            windows: DashMap::new(),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn idle_ttl(&self) -> Duration {
        self.idle_ttl
    }

    // API keys currently holding a window
    pub fn tracked_identities(&self) -> usize {
        self.windows.len()
    }

    /// Admit or reject one call for `identity` at `now`.
    ///
    /// Entries strictly more than `window` old are pruned; an entry exactly
    /// `window` old still counts. `now` is recorded only while fewer than
    /// `limit` entries remain, all under the identity's lock.
    pub fn try_acquire(&self, identity: &str, now: Instant) -> bool {
        loop {
            let slot = self.slot(identity);
            let mut window = slot.lock().expect("caller window lock poisoned");

            // lost a race with the sweeper, look the identity up again
            if window.retired {
                continue;
            }

            window.prune(now, self.window);

            if window.timestamps.len() < self.limit {
                window.record(now);
                return true;
            }

            return false;
        }
    }

    // Drop windows whose newest admission is older than the idle TTL,
    // returns how many went
    pub fn evict_idle(&self, now: Instant) -> usize {
        let idle_ttl = self.idle_ttl;
        let mut evicted = 0;

        self.windows.retain(|_, slot| {
            let mut window = match slot.lock() {
                Ok(window) => window,
                Err(_) => {
                    // leave it for try_acquire to surface, keep sweeping the rest
                    error!("caller window lock poisoned, skipping eviction");
                    return true;
                }
            };
            let idle = match window.newest() {
                Some(newest) => now.saturating_duration_since(newest) > idle_ttl,
                None => true,
            };
            if idle {
                window.retired = true;
                evicted += 1;
            }
            !idle
        });

        evicted
    }

    // Fetch the window handle, creating it on first sight
    fn slot(&self, identity: &str) -> Arc<Mutex<CallerWindow>> {
        if let Some(existing) = self.windows.get(identity) {
            return Arc::clone(existing.value());
        }
        // entry() takes the shard write lock, so only one window wins
        let created = self.windows.entry(identity.to_string()).or_default();
        Arc::clone(created.value())
    }
}

// Background sweeper - drops idle windows so the map stays bounded
pub async fn idle_sweeper(gate: Arc<AdmissionGate>, clock: Arc<dyn Clock>, sweep_interval: Duration) {
    let mut ticker = interval(sweep_interval);

    info!(
        interval = ?sweep_interval,
        idle_ttl = ?gate.idle_ttl(),
        "idle window sweeper started"
    );

    loop {
        ticker.tick().await;

        let evicted = gate.evict_idle(clock.now());
        let tracked = gate.tracked_identities();
        TRACKED_IDENTITIES.set(tracked as f64);

        if evicted > 0 {
            info!(evicted, tracked, "evicted idle caller windows");
        } else {
            debug!(tracked, "no idle caller windows");
        }
    }
}
