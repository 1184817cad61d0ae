//! Keyboard and mouse unification.
//!
//! Space and the left mouse button are two ways of making the same physical
//! gesture. Both are folded into one press/release pair here, and the
//! hold-threshold deadline is tracked alongside the press so that a release
//! cancels it in the same call that reports the release.

use crossterm::event::{
    Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use std::time::Duration;

use crate::session::SessionState;

/// Minimum hold before a release starts the clock
pub const HOLD_THRESHOLD: Duration = Duration::from_millis(550);

/// Gap after the last Space press before a release is assumed, for
/// terminals that never report key releases. Must exceed the OS autorepeat delay.
pub const DEFAULT_RELEASE_TIMEOUT: Duration = Duration::from_millis(700);

/// Abstract signals consumed by the session state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    PressStart,
    HoldThresholdReached,
    PressEnd,
    /// Any non-start key; only meaningful while running
    OtherKey,
}

/// App-level actions, only produced outside active solve states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Quit,
    DeleteLast,
    ClearHistory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Translated {
    Signal(Signal),
    Command(Command),
    Ignored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseDetection {
    /// The terminal reports `KeyEventKind::Release`
    Reported,
    /// Releases are synthesised once Space stops auto-repeating
    Inferred { timeout: Duration },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PressSource {
    Key,
    Pointer,
}

#[derive(Debug, Clone, Copy)]
struct ActivePress {
    source: PressSource,
    last_seen: Duration,
}

/// One-shot deadline measured from press start
#[derive(Debug, Clone, Copy)]
pub struct HoldTimer {
    threshold: Duration,
    deadline: Option<Duration>,
}

impl HoldTimer {
    pub fn new(threshold: Duration) -> Self {
        Self {
            threshold,
            deadline: None,
        }
    }

    pub fn arm(&mut self, now: Duration) {
        self.deadline = Some(now + self.threshold);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<Duration> {
        self.deadline
    }

    /// True exactly once when the deadline has passed
    pub fn poll(&mut self, now: Duration) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

pub struct InputController {
    press: Option<ActivePress>,
    release: ReleaseDetection,
    hold: HoldTimer,
}

impl InputController {
    pub fn new(hold_threshold: Duration, release: ReleaseDetection) -> Self {
        Self {
            press: None,
            release,
            hold: HoldTimer::new(hold_threshold),
        }
    }

    pub fn press_active(&self) -> bool {
        self.press.is_some()
    }

    pub fn release_detection(&self) -> ReleaseDetection {
        self.release
    }

    pub fn hold_armed(&self) -> bool {
        self.hold.is_armed()
    }

    pub fn arm_hold(&mut self, now: Duration) {
        self.hold.arm(now);
    }

    pub fn cancel_hold(&mut self) {
        self.hold.cancel();
    }

    /// Translate a raw terminal event. `state` is the session state at the
    /// moment of handling.
    pub fn translate(&mut self, event: &Event, state: SessionState, now: Duration) -> Translated {
        match event {
            Event::Key(key) => self.translate_key(key, state, now),
            Event::Mouse(mouse) => self.translate_mouse(mouse, now),
            _ => Translated::Ignored,
        }
    }

    fn translate_key(&mut self, key: &KeyEvent, state: SessionState, now: Duration) -> Translated {
        if key.kind == KeyEventKind::Press
            && key.modifiers.contains(KeyModifiers::CONTROL)
            && key.code == KeyCode::Char('c')
        {
            return Translated::Command(Command::Quit);
        }

        if key.code == KeyCode::Char(' ') {
            return match key.kind {
                KeyEventKind::Press => self.press_start(PressSource::Key, now),
                KeyEventKind::Repeat => {
                    self.touch_key_press(now);
                    Translated::Ignored
                }
                KeyEventKind::Release => self.press_end(PressSource::Key),
            };
        }

        if key.kind != KeyEventKind::Press {
            return Translated::Ignored;
        }

        match state {
            SessionState::Running => Translated::Signal(Signal::OtherKey),
            SessionState::Holding | SessionState::Ready => Translated::Ignored,
            SessionState::Idle | SessionState::Stopped => match key.code {
                KeyCode::Esc | KeyCode::Char('q') => Translated::Command(Command::Quit),
                KeyCode::Char('d') => Translated::Command(Command::DeleteLast),
                KeyCode::Char('c') => Translated::Command(Command::ClearHistory),
                _ => Translated::Ignored,
            },
        }
    }

    fn translate_mouse(&mut self, mouse: &MouseEvent, now: Duration) -> Translated {
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => self.press_start(PressSource::Pointer, now),
            MouseEventKind::Up(MouseButton::Left) => self.press_end(PressSource::Pointer),
            _ => Translated::Ignored,
        }
    }

    fn press_start(&mut self, source: PressSource, now: Duration) -> Translated {
        if self.press.is_some() {
            // auto-repeat, or a second source while already held
            if source == PressSource::Key {
                self.touch_key_press(now);
            }
            return Translated::Ignored;
        }
        self.press = Some(ActivePress {
            source,
            last_seen: now,
        });
        Translated::Signal(Signal::PressStart)
    }

    fn press_end(&mut self, source: PressSource) -> Translated {
        match self.press {
            Some(active) if active.source == source => {
                self.press = None;
                self.hold.cancel();
                Translated::Signal(Signal::PressEnd)
            }
            _ => Translated::Ignored,
        }
    }

    fn touch_key_press(&mut self, now: Duration) {
        if let Some(active) = self.press.as_mut() {
            if active.source == PressSource::Key {
                active.last_seen = now;
            }
        }
    }

    /// Time-driven signals, paired with the instant they took effect.
    ///
    /// With inferred releases the key only counts as held at the deadline
    /// once a Space event has been seen at or after it. The synthesised
    /// release is dated at the last Space event, not at detection time.
    pub fn poll(&mut self, now: Duration) -> Option<(Signal, Duration)> {
        let deadline = self.hold.deadline();

        let inferred = match (self.release, self.press) {
            (ReleaseDetection::Inferred { timeout }, Some(active))
                if active.source == PressSource::Key =>
            {
                Some((active.last_seen, timeout))
            }
            _ => None,
        };

        let Some((last_seen, timeout)) = inferred else {
            return match deadline {
                Some(at) if self.hold.poll(now) => Some((Signal::HoldThresholdReached, at)),
                _ => None,
            };
        };

        if let Some(at) = deadline.filter(|&d| last_seen >= d) {
            if self.hold.poll(now) {
                return Some((Signal::HoldThresholdReached, at));
            }
        }

        if now >= last_seen + timeout {
            self.press = None;
            self.hold.cancel();
            return Some((Signal::PressEnd, last_seen));
        }
        None
    }
}
