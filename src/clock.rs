use std::fmt::Debug;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

// Source of "now" for quota decisions
pub trait Clock: Send + Sync + Debug {
    fn now(&self) -> Instant;
}

// Real clock - Instant::now()
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

// Test clock, only moves when told to. Clones share one instant.
#[derive(Debug, Clone)]
pub struct MockClock {
    current: Arc<Mutex<Instant>>,
}

impl MockClock {
    pub fn new(start: Instant) -> Self {
        Self {
            current: Arc::new(Mutex::new(start)),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut current = self.current.lock().expect("mock clock lock poisoned");
        *current += by;
    }

    pub fn set(&self, instant: Instant) {
        *self.current.lock().expect("mock clock lock poisoned") = instant;
    }
}

impl Clock for MockClock {
    fn now(&self) -> Instant {
        *self.current.lock().expect("mock clock lock poisoned")
    }
}
