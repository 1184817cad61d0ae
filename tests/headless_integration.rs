use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{
    Event, KeyCode, KeyEvent, KeyEventKind, KeyEventState, KeyModifiers, MouseButton, MouseEvent,
    MouseEventKind,
};
use cubik::history::{History, MemorySolveStore, SolveStore};
use cubik::input::ReleaseDetection;
use cubik::runtime::{CubeEvent, FixedTicker, Runner, TestEventSource};
use cubik::session::{SessionConfig, SessionState, SolveSession};
use cubik::timer::{ManualClock, MonotonicClock};

fn space(kind: KeyEventKind) -> CubeEvent {
    CubeEvent::Input(Event::Key(KeyEvent {
        code: KeyCode::Char(' '),
        modifiers: KeyModifiers::NONE,
        kind,
        state: KeyEventState::NONE,
    }))
}

fn pointer(kind: MouseEventKind) -> CubeEvent {
    CubeEvent::Input(Event::Mouse(MouseEvent {
        kind,
        column: 10,
        row: 5,
        modifiers: KeyModifiers::NONE,
    }))
}

fn new_session(clock: Arc<dyn cubik::timer::Clock>, config: SessionConfig) -> (MemorySolveStore, SolveSession) {
    let store = MemorySolveStore::new();
    let history = History::load(Box::new(store.clone())).unwrap();
    (store, SolveSession::new(config, clock, history))
}

/// Drain whatever is queued, polling on ticks like the real loop does
fn drain<E: cubik::runtime::CubeEventSource>(runner: &Runner<E, FixedTicker>, session: &mut SolveSession) {
    loop {
        match runner.step() {
            CubeEvent::Tick => {
                session.poll().unwrap();
                break;
            }
            CubeEvent::Resize => {}
            CubeEvent::Closed => panic!("event source closed"),
            CubeEvent::Input(ev) => {
                session.handle_event(&ev).unwrap();
                session.poll().unwrap();
            }
        }
    }
}

// Verifies a full solve flows through Runner/TestEventSource without a TTY
#[test]
fn headless_solve_flow_with_manual_clock() {
    let clock = ManualClock::new();
    let (store, mut session) = new_session(Arc::new(clock.clone()), SessionConfig::default());

    let (tx, rx) = mpsc::channel();
    let runner = Runner::new(
        TestEventSource::new(rx),
        FixedTicker::new(Duration::from_millis(1)),
    );

    tx.send(space(KeyEventKind::Press)).unwrap();
    tx.send(space(KeyEventKind::Repeat)).unwrap();
    tx.send(space(KeyEventKind::Repeat)).unwrap();
    drain(&runner, &mut session);
    assert_eq!(session.state(), SessionState::Holding);

    clock.advance_ms(550);
    drain(&runner, &mut session);
    assert_eq!(session.state(), SessionState::Ready);

    tx.send(space(KeyEventKind::Release)).unwrap();
    drain(&runner, &mut session);
    assert_eq!(session.state(), SessionState::Running);

    clock.advance_ms(9_876);
    drain(&runner, &mut session);
    assert_eq!(session.snapshot().elapsed_ms, 9_876);

    tx.send(space(KeyEventKind::Press)).unwrap();
    drain(&runner, &mut session);
    assert_eq!(session.state(), SessionState::Stopped);

    tx.send(space(KeyEventKind::Release)).unwrap();
    drain(&runner, &mut session);
    assert_eq!(session.state(), SessionState::Idle);

    let solves = store.list().unwrap();
    assert_eq!(solves.len(), 1);
    assert_eq!(solves[0].time_ms, 9_876);
}

#[test]
fn short_hold_with_real_clock_never_runs() {
    let (store, mut session) = new_session(Arc::new(MonotonicClock::new()), SessionConfig::default());
    let press = space(KeyEventKind::Press);
    let release = space(KeyEventKind::Release);

    for _ in 0..3 {
        if let CubeEvent::Input(ev) = &press {
            session.handle_event(ev).unwrap();
        }
        std::thread::sleep(Duration::from_millis(150));
        session.poll().unwrap();
        assert_eq!(session.state(), SessionState::Holding);
        if let CubeEvent::Input(ev) = &release {
            session.handle_event(ev).unwrap();
        }
        assert_eq!(session.state(), SessionState::Idle);
    }

    std::thread::sleep(Duration::from_millis(600));
    session.poll().unwrap();
    assert_eq!(session.state(), SessionState::Idle);
    assert!(store.list().unwrap().is_empty());
}

#[test]
fn long_hold_with_real_clock_starts_and_records() {
    let (store, mut session) = new_session(Arc::new(MonotonicClock::new()), SessionConfig::default());
    let CubeEvent::Input(press) = pointer(MouseEventKind::Down(MouseButton::Left)) else {
        unreachable!()
    };
    let CubeEvent::Input(release) = pointer(MouseEventKind::Up(MouseButton::Left)) else {
        unreachable!()
    };

    session.handle_event(&press).unwrap();
    std::thread::sleep(Duration::from_millis(600));
    session.poll().unwrap();
    assert_eq!(session.state(), SessionState::Ready);

    session.handle_event(&release).unwrap();
    assert_eq!(session.state(), SessionState::Running);
    std::thread::sleep(Duration::from_millis(50));

    session.handle_event(&press).unwrap();
    assert_eq!(session.state(), SessionState::Stopped);

    let solves = store.list().unwrap();
    assert_eq!(solves.len(), 1);
    assert!(solves[0].time_ms >= 50, "measured {}", solves[0].time_ms);
    assert_eq!(solves[0].time_ms, session.elapsed_ms());
}

#[test]
fn other_key_stops_running_timer() {
    let clock = ManualClock::new();
    let (store, mut session) = new_session(Arc::new(clock.clone()), SessionConfig::default());
    let CubeEvent::Input(press) = space(KeyEventKind::Press) else { unreachable!() };
    let CubeEvent::Input(release) = space(KeyEventKind::Release) else { unreachable!() };

    session.handle_event(&press).unwrap();
    clock.advance_ms(700);
    session.poll().unwrap();
    session.handle_event(&release).unwrap();
    clock.advance_ms(321);

    let x = Event::Key(KeyEvent::new(KeyCode::Char('x'), KeyModifiers::NONE));
    assert_eq!(session.handle_event(&x).unwrap(), None);
    assert_eq!(session.state(), SessionState::Stopped);
    assert_eq!(store.list().unwrap()[0].time_ms, 321);
}

#[test]
fn inferred_release_flow() {
    let clock = ManualClock::new();
    let config = SessionConfig {
        release: ReleaseDetection::Inferred {
            timeout: Duration::from_millis(700),
        },
        ..SessionConfig::default()
    };
    let (store, mut session) = new_session(Arc::new(clock.clone()), config);
    // without release reporting, a held key arrives as repeated presses
    let CubeEvent::Input(press) = space(KeyEventKind::Press) else { unreachable!() };

    session.handle_event(&press).unwrap();
    for _ in 0..30 {
        clock.advance_ms(30);
        session.handle_event(&press).unwrap();
        session.poll().unwrap();
    }
    assert_eq!(session.state(), SessionState::Ready);

    // key came up right after the last repeat at 900; noticed at 1600
    clock.advance_ms(700);
    session.poll().unwrap();
    assert_eq!(session.state(), SessionState::Running);
    assert_eq!(session.elapsed_ms(), 700);

    // stop 5000 ms after the key came up
    clock.advance_ms(4_300);
    session.handle_event(&press).unwrap();
    assert_eq!(session.state(), SessionState::Stopped);
    assert_eq!(store.list().unwrap()[0].time_ms, 5_000);
}

#[test]
fn inferred_tap_never_starts_clock() {
    let clock = ManualClock::new();
    let config = SessionConfig {
        release: ReleaseDetection::Inferred {
            timeout: Duration::from_millis(700),
        },
        ..SessionConfig::default()
    };
    let (store, mut session) = new_session(Arc::new(clock.clone()), config);
    let CubeEvent::Input(press) = space(KeyEventKind::Press) else { unreachable!() };

    session.handle_event(&press).unwrap();
    let mut states = Vec::new();
    for _ in 0..100 {
        clock.advance_ms(10);
        session.poll().unwrap();
        states.push(session.state());
    }

    assert!(!states.contains(&SessionState::Ready), "{states:?}");
    assert!(!states.contains(&SessionState::Running), "{states:?}");
    assert_eq!(session.state(), SessionState::Idle);
    assert!(store.list().unwrap().is_empty());
}
