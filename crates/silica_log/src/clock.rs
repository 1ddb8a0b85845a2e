//! Time sources for the recorder.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Millisecond time source
pub trait Clock {
    /// Current time in milliseconds
    fn now_ms(&self) -> f64;
}

impl<F> Clock for F
where
    F: Fn() -> f64,
{
    fn now_ms(&self) -> f64 {
        self()
    }
}

/// Wall clock: milliseconds since the Unix epoch
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> f64 {
        chrono::Utc::now().timestamp_micros() as f64 / 1000.0
    }
}

/// Hand-driven clock for tests and deterministic hosts.
///
/// Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    bits: Arc<AtomicU64>,
}

impl ManualClock {
    /// Start at `start_ms`
    #[must_use]
    pub fn new(start_ms: f64) -> Self {
        Self {
            bits: Arc::new(AtomicU64::new(start_ms.to_bits())),
        }
    }

    /// Jump to `ms`
    pub fn set(&self, ms: f64) {
        self.bits.store(ms.to_bits(), Ordering::SeqCst);
    }

    /// Move forward by `delta_ms`
    pub fn advance(&self, delta_ms: f64) {
        self.set(self.now_ms() + delta_ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::SeqCst))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_shared() {
        let clock = ManualClock::new(10.0);
        let handle = clock.clone();
        handle.advance(5.5);
        assert_eq!(clock.now_ms(), 15.5);
        handle.set(1.0);
        assert_eq!(clock.now_ms(), 1.0);
    }

    #[test]
    fn test_closure_clock() {
        let clock = || 42.0;
        assert_eq!(clock.now_ms(), 42.0);
    }

    #[test]
    fn test_system_clock_positive() {
        assert!(SystemClock.now_ms() > 0.0);
    }
}
