use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::Duration;

use crossterm::event::{self, Event as CtEvent};

/// Unified event type consumed by the app runner
#[derive(Clone, Debug)]
pub enum CubeEvent {
    /// Keyboard or mouse input, forwarded untouched
    Input(CtEvent),
    Resize,
    Tick,
    /// The event source is gone; no further input will arrive
    Closed,
}

/// Source of terminal events (keyboard, mouse, resize)
pub trait CubeEventSource: Send + 'static {
    /// Block for up to `timeout` waiting for an event.
    /// Returns Ok(event) if an event arrives before the timeout, or Err(Timeout) if it expires.
    fn recv_timeout(&self, timeout: Duration) -> Result<CubeEvent, RecvTimeoutError>;
}

/// Production event source using crossterm.
///
/// A reader thread posts into a channel; whoever owns the receiver is the
/// only code that ever mutates session state.
pub struct CrosstermEventSource {
    rx: Receiver<CubeEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();

        std::thread::spawn(move || loop {
            let forwarded = match event::read() {
                Ok(ev @ (CtEvent::Key(_) | CtEvent::Mouse(_))) => Some(CubeEvent::Input(ev)),
                Ok(CtEvent::Resize(_, _)) => Some(CubeEvent::Resize),
                Ok(_) => None,
                Err(e) => {
                    tracing::error!(error = %e, "terminal event reader stopped");
                    break;
                }
            };
            if let Some(ev) = forwarded {
                if tx.send(ev).is_err() {
                    break;
                }
            }
        });

        Self { rx }
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl CubeEventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<CubeEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Configurable ticker interface
pub trait Ticker: Send + Sync + 'static {
    fn interval(&self) -> Duration;
}

/// Fixed interval ticker
#[derive(Clone, Copy, Debug)]
pub struct FixedTicker {
    interval: Duration,
}

impl FixedTicker {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Ticker for FixedTicker {
    fn interval(&self) -> Duration {
        self.interval
    }
}

/// Test event source for unit tests
pub struct TestEventSource {
    rx: Receiver<CubeEvent>,
}

impl TestEventSource {
    pub fn new(rx: Receiver<CubeEvent>) -> Self {
        Self { rx }
    }
}

impl CubeEventSource for TestEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<CubeEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Runner that advances the application one event/tick at a time
pub struct Runner<E: CubeEventSource, T: Ticker> {
    event_source: E,
    ticker: T,
}

impl<E: CubeEventSource, T: Ticker> Runner<E, T> {
    pub fn new(event_source: E, ticker: T) -> Self {
        Self {
            event_source,
            ticker,
        }
    }

    /// Blocks up to tick interval and returns the next event, or Tick on timeout
    pub fn step(&self) -> CubeEvent {
        match self.event_source.recv_timeout(self.ticker.interval()) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) => CubeEvent::Tick,
            Err(RecvTimeoutError::Disconnected) => {
                tracing::warn!("event source disconnected");
                CubeEvent::Closed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use std::sync::mpsc;

    #[test]
    fn step_returns_tick_on_timeout() {
        let (_tx, rx) = mpsc::channel();
        let es = TestEventSource::new(rx);
        let ticker = FixedTicker::new(Duration::from_millis(1));
        let runner = Runner::new(es, ticker);

        // With no events available, step should yield Tick
        let ev = runner.step();
        match ev {
            CubeEvent::Tick => {}
            _ => panic!("expected Tick on timeout"),
        }
    }

    #[test]
    fn step_reports_closed_source() {
        let (tx, rx) = mpsc::channel::<CubeEvent>();
        drop(tx);
        let runner = Runner::new(TestEventSource::new(rx), FixedTicker::new(Duration::from_secs(5)));

        match runner.step() {
            CubeEvent::Closed => {}
            other => panic!("expected Closed, got {other:?}"),
        }
    }

    #[test]
    fn step_passes_through_events_in_order() {
        let (tx, rx) = mpsc::channel();
        tx.send(CubeEvent::Resize).unwrap();
        tx.send(CubeEvent::Input(CtEvent::Key(KeyEvent::new(
            KeyCode::Char(' '),
            KeyModifiers::NONE,
        ))))
        .unwrap();
        let es = TestEventSource::new(rx);
        let ticker = FixedTicker::new(Duration::from_millis(10));
        let runner = Runner::new(es, ticker);

        match runner.step() {
            CubeEvent::Resize => {}
            _ => panic!("expected Resize event"),
        }
        match runner.step() {
            CubeEvent::Input(CtEvent::Key(key)) => assert_eq!(key.code, KeyCode::Char(' ')),
            _ => panic!("expected key event"),
        }
    }
}
