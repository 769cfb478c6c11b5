//! Injectable millisecond clock.
//!
//! Everything that measures time (the motor-runtime governor, trace
//! timestamps, exploration memory) reads it through [`Clock`], so tests and
//! simulations can drive time explicitly instead of sleeping.

use std::fmt::Debug;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Source of monotonic-enough milliseconds.
pub trait Clock: Debug + Send + Sync {
    fn now_ms(&self) -> u64;

    /// Milliseconds elapsed since `start_ms`, saturating at zero.
    fn elapsed_since(&self, start_ms: u64) -> u64 {
        self.now_ms().saturating_sub(start_ms)
    }
}

pub type SharedClock = Arc<dyn Clock>;

/// Wall clock: milliseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}

/// Hand-driven clock. Clones share the same time source.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new(start_ms: u64) -> Self {
        Self {
            now: Arc::new(AtomicU64::new(start_ms)),
        }
    }

    pub fn advance(&self, ms: u64) {
        self.now.fetch_add(ms, Ordering::SeqCst);
    }

    pub fn set(&self, ms: u64) {
        self.now.store(ms, Ordering::SeqCst);
    }

    pub fn shared(&self) -> SharedClock {
        Arc::new(self.clone())
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}
