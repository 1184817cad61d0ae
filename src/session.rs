use crossterm::event::Event;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use crate::history::{History, Solve, StoreError};
use crate::input::{
    Command, InputController, ReleaseDetection, Signal, Translated, HOLD_THRESHOLD,
};
use crate::scramble::{Scramble, ScrambleGenerator, DEFAULT_SCRAMBLE_LENGTH};
use crate::stats::Statistics;
use crate::timer::{Clock, PrecisionTimer, TimerError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, strum_macros::Display)]
pub enum SessionState {
    #[default]
    Idle,
    Holding,
    Ready,
    Running,
    Stopped,
}

impl SessionState {
    /// Prompt shown under the timer
    pub fn instruction(self) -> &'static str {
        match self {
            SessionState::Idle => "Hold SPACE to start",
            SessionState::Holding => "Keep holding...",
            SessionState::Ready => "Release to start!",
            SessionState::Running => "",
            SessionState::Stopped => "Press SPACE for next solve",
        }
    }

    /// States in which app shortcuts are swallowed
    pub fn is_active(self) -> bool {
        matches!(
            self,
            SessionState::Holding | SessionState::Ready | SessionState::Running
        )
    }
}

/// Side effect attached to a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    ArmHold,
    CancelHold,
    StartTimer,
    RecordSolve,
    NewAttempt,
    Nothing,
}

/// The transition table. `None` means the pair is a no-op.
pub fn transition(state: SessionState, signal: Signal) -> Option<(SessionState, Effect)> {
    use SessionState::*;
    use Signal::*;

    match (state, signal) {
        (Idle | Stopped, PressStart) => Some((Holding, Effect::ArmHold)),
        (Holding, HoldThresholdReached) => Some((Ready, Effect::Nothing)),
        (Holding, PressEnd) => Some((Idle, Effect::CancelHold)),
        (Ready, PressEnd) => Some((Running, Effect::StartTimer)),
        (Running, _) => Some((Stopped, Effect::RecordSolve)),
        (Stopped, PressEnd) => Some((Idle, Effect::NewAttempt)),
        _ => None,
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Timer(#[from] TimerError),

    #[error("could not save solve history: {0}")]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub scramble_length: usize,
    pub hold_threshold: Duration,
    pub release: ReleaseDetection,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            scramble_length: DEFAULT_SCRAMBLE_LENGTH,
            hold_threshold: HOLD_THRESHOLD,
            release: ReleaseDetection::Reported,
        }
    }
}

/// What the display layer needs on every tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplaySnapshot {
    pub state: SessionState,
    pub elapsed_ms: u64,
    pub instruction: &'static str,
}

/// Owns the state machine and everything it drives.
///
/// All mutation goes through `&mut self`; the runtime delivers events to a
/// single owner over a channel, so no two handlers ever touch the state at
/// the same time.
pub struct SolveSession<R: Rng = rand::rngs::ThreadRng> {
    state: SessionState,
    config: SessionConfig,
    clock: Arc<dyn Clock>,
    timer: PrecisionTimer,
    input: InputController,
    generator: ScrambleGenerator<R>,
    scramble: Scramble,
    history: History,
}

impl SolveSession<rand::rngs::ThreadRng> {
    pub fn new(config: SessionConfig, clock: Arc<dyn Clock>, history: History) -> Self {
        Self::with_generator(config, clock, history, ScrambleGenerator::new())
    }
}

impl<R: Rng> SolveSession<R> {
    pub fn with_generator(
        config: SessionConfig,
        clock: Arc<dyn Clock>,
        history: History,
        mut generator: ScrambleGenerator<R>,
    ) -> Self {
        let scramble = generator.generate(config.scramble_length);
        Self {
            state: SessionState::Idle,
            timer: PrecisionTimer::new(clock.clone()),
            input: InputController::new(config.hold_threshold, config.release),
            config,
            clock,
            generator,
            scramble,
            history,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn scramble(&self) -> &Scramble {
        &self.scramble
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.timer.elapsed_ms()
    }

    pub fn timer_running(&self) -> bool {
        self.timer.is_running()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// For user-initiated deletes; the session itself only ever appends
    pub fn history_mut(&mut self) -> &mut History {
        &mut self.history
    }

    pub fn statistics(&self) -> &Statistics {
        self.history.statistics()
    }

    pub fn snapshot(&self) -> DisplaySnapshot {
        DisplaySnapshot {
            state: self.state,
            elapsed_ms: self.timer.elapsed_ms(),
            instruction: self.state.instruction(),
        }
    }

    /// Feed a raw terminal event. Commands are handed back to the caller.
    pub fn handle_event(&mut self, event: &Event) -> Result<Option<Command>, SessionError> {
        let now = self.read_clock()?;
        match self.input.translate(event, self.state, now) {
            Translated::Signal(signal) => {
                self.apply(signal, now)?;
                Ok(None)
            }
            Translated::Command(command) => Ok(Some(command)),
            Translated::Ignored => Ok(None),
        }
    }

    /// Per-tick work: refresh the timer reading and fire due deadlines
    pub fn poll(&mut self) -> Result<Option<SessionState>, SessionError> {
        let Ok(now) = self.clock.now() else {
            return Ok(None);
        };

        let mut changed = None;
        while let Some((signal, at)) = self.input.poll(now) {
            if let Some(state) = self.apply(signal, at)? {
                changed = Some(state);
            }
        }
        self.timer.on_frame();
        Ok(changed)
    }

    /// Apply one signal at the current clock reading. Returns the new state
    /// when a transition happened.
    ///
    /// An unavailable clock fails before anything changes, so the session
    /// stays where it was. A store failure while recording leaves the
    /// session in `Stopped` with the history view rolled back.
    pub fn handle_signal(&mut self, signal: Signal) -> Result<Option<SessionState>, SessionError> {
        let now = self.read_clock()?;
        self.apply(signal, now)
    }

    fn read_clock(&self) -> Result<Duration, SessionError> {
        self.clock.now().map_err(|e| {
            warn!(state = %self.state, error = %e, "clock unavailable");
            e.into()
        })
    }

    /// `at` is the clock instant the signal took effect, which for an
    /// inferred release lies before the moment it was noticed.
    fn apply(&mut self, signal: Signal, at: Duration) -> Result<Option<SessionState>, SessionError> {
        let Some((next, effect)) = transition(self.state, signal) else {
            return Ok(None);
        };
        let from = self.state;

        let recorded = match effect {
            Effect::ArmHold => {
                self.input.arm_hold(at);
                None
            }
            Effect::CancelHold => {
                self.input.cancel_hold();
                None
            }
            Effect::StartTimer => {
                self.timer.reset();
                self.timer.start_at(at);
                None
            }
            Effect::RecordSolve => {
                let time_ms = self.timer.stop_at(at);
                Some(Solve::new(time_ms, self.scramble.to_string()))
            }
            Effect::NewAttempt => {
                self.scramble = self.generator.generate(self.config.scramble_length);
                self.timer.reset();
                None
            }
            Effect::Nothing => None,
        };

        if next != SessionState::Holding {
            self.input.cancel_hold();
        }
        self.state = next;
        debug!(%from, to = %next, ?signal, "transition");

        if let Some(solve) = recorded {
            self.history.record(solve)?;
        }
        Ok(Some(next))
    }
}
