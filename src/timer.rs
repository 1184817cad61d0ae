use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TimerError {
    #[error("no monotonic clock source is available")]
    ClockUnavailable,
}

/// Monotonic time source. Readings are offsets from the clock's own origin.
pub trait Clock: Send + Sync {
    fn now(&self) -> Result<Duration, TimerError>;
}

/// Production clock backed by `Instant`
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Result<Duration, TimerError> {
        Ok(self.origin.elapsed())
    }
}

/// Hand-driven clock for tests and headless runs. Clones share the same reading.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now_ms: Arc<AtomicU64>,
    available: Arc<AtomicBool>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now_ms: Arc::new(AtomicU64::new(0)),
            available: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn set_ms(&self, ms: u64) {
        self.now_ms.store(ms, Ordering::SeqCst);
    }

    pub fn advance_ms(&self, ms: u64) {
        self.now_ms.fetch_add(ms, Ordering::SeqCst);
    }

    /// Simulate a platform without a usable clock
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Result<Duration, TimerError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(Duration::from_millis(self.now_ms.load(Ordering::SeqCst)))
        } else {
            Err(TimerError::ClockUnavailable)
        }
    }
}

/// Elapsed-time measurement for a single attempt.
///
/// `on_frame` only refreshes the displayed reading. The value returned by
/// `stop` is always taken from the clock, so a throttled or skipped frame
/// never shifts the recorded time.
pub struct PrecisionTimer {
    clock: Arc<dyn Clock>,
    started_at: Option<Duration>,
    reading: Duration,
}

impl PrecisionTimer {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            started_at: None,
            reading: Duration::ZERO,
        }
    }

    pub fn start(&mut self) -> Result<(), TimerError> {
        let now = self.clock.now()?;
        self.start_at(now);
        Ok(())
    }

    /// Start from an instant already read from the same clock
    pub fn start_at(&mut self, at: Duration) {
        self.started_at = Some(at);
        self.reading = Duration::ZERO;
    }

    /// Per-frame update. A no-op once stopped or reset, which is what cancels
    /// the frame task.
    pub fn on_frame(&mut self) {
        if let Some(started_at) = self.started_at {
            if let Ok(now) = self.clock.now() {
                let elapsed = now.saturating_sub(started_at);
                if elapsed > self.reading {
                    self.reading = elapsed;
                }
            }
        }
    }

    /// Halt and return the final elapsed time in whole milliseconds
    pub fn stop(&mut self) -> Result<u64, TimerError> {
        if !self.is_running() {
            return Ok(duration_ms(self.reading));
        }
        let now = self.clock.now()?;
        Ok(self.stop_at(now))
    }

    /// Halt at a given clock instant
    pub fn stop_at(&mut self, at: Duration) -> u64 {
        if let Some(started_at) = self.started_at.take() {
            self.reading = self.reading.max(at.saturating_sub(started_at));
        }
        duration_ms(self.reading)
    }

    pub fn reset(&mut self) {
        self.started_at = None;
        self.reading = Duration::ZERO;
    }

    pub fn is_running(&self) -> bool {
        self.started_at.is_some()
    }

    pub fn elapsed_ms(&self) -> u64 {
        duration_ms(self.reading)
    }
}

fn duration_ms(d: Duration) -> u64 {
    d.as_millis() as u64
}
