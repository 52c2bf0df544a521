/// Keyboard input tracker.
///
/// Collects every key event the terminal delivered since the last frame
/// and answers two kinds of question:
///   - Typed keys: every Press/Repeat event in arrival order. Movement
///     uses these, so holding a key walks at the terminal's repeat rate.
///   - Fresh presses: keys that went from "not held" to "held" this frame.
///     Meta keys (confirm, pause, restart) use these so auto-repeat does
///     not fire them twice.
///
/// Release events are not relied on, since most terminals never send
/// them: a key with no Press/Repeat for `HOLD_TIMEOUT` counts as released.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crossterm::event::{self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::domain::actor::Direction;

const HOLD_TIMEOUT: Duration = Duration::from_millis(160);

// ── Key Constants ──

pub const KEYS_UP: &[KeyCode] = &[KeyCode::Up, KeyCode::Char('w'), KeyCode::Char('W')];
pub const KEYS_DOWN: &[KeyCode] = &[KeyCode::Down, KeyCode::Char('s'), KeyCode::Char('S')];
pub const KEYS_LEFT: &[KeyCode] = &[KeyCode::Left, KeyCode::Char('a'), KeyCode::Char('A')];
pub const KEYS_RIGHT: &[KeyCode] = &[KeyCode::Right, KeyCode::Char('d'), KeyCode::Char('D')];
pub const KEYS_UP_LEFT: &[KeyCode] = &[KeyCode::Char('q'), KeyCode::Char('Q')];
pub const KEYS_UP_RIGHT: &[KeyCode] = &[KeyCode::Char('e'), KeyCode::Char('E')];
pub const KEYS_DOWN_LEFT: &[KeyCode] = &[KeyCode::Char('z'), KeyCode::Char('Z')];
pub const KEYS_DOWN_RIGHT: &[KeyCode] = &[KeyCode::Char('x'), KeyCode::Char('X')];

pub const KEYS_CONFIRM: &[KeyCode] = &[KeyCode::Enter, KeyCode::Char(' ')];
pub const KEYS_RESTART: &[KeyCode] = &[KeyCode::Char('r'), KeyCode::Char('R')];
pub const KEYS_PAUSE: &[KeyCode] = &[KeyCode::F(1)];
pub const KEYS_QUIT: &[KeyCode] = &[KeyCode::Esc, KeyCode::Char('q'), KeyCode::Char('Q')];

/// Movement direction bound to a key, if any.
pub fn key_direction(code: KeyCode) -> Direction {
    let table: [(&[KeyCode], Direction); 8] = [
        (KEYS_UP, Direction::Up),
        (KEYS_DOWN, Direction::Down),
        (KEYS_LEFT, Direction::Left),
        (KEYS_RIGHT, Direction::Right),
        (KEYS_UP_LEFT, Direction::UpLeft),
        (KEYS_UP_RIGHT, Direction::UpRight),
        (KEYS_DOWN_LEFT, Direction::DownLeft),
        (KEYS_DOWN_RIGHT, Direction::DownRight),
    ];
    table.iter()
        .find(|(keys, _)| keys.contains(&code))
        .map(|&(_, dir)| dir)
        .unwrap_or(Direction::None)
}

pub struct InputState {
    /// Timestamp of last Press/Repeat event for each key.
    last_active: HashMap<KeyCode, Instant>,

    /// Keys newly held during the most recent `drain_events()`.
    fresh_presses: Vec<KeyCode>,

    /// Press/Repeat key codes of this frame, in arrival order.
    typed: Vec<KeyCode>,

    /// Raw key events collected during drain, for Ctrl-C detection.
    raw_events: Vec<KeyEvent>,
}

impl InputState {
    pub fn new() -> Self {
        InputState {
            last_active: HashMap::with_capacity(16),
            fresh_presses: Vec::with_capacity(8),
            typed: Vec::with_capacity(8),
            raw_events: Vec::with_capacity(8),
        }
    }

    /// Drain all pending terminal events and update key states.
    /// Call this once per frame, before the simulation tick.
    pub fn drain_events(&mut self) {
        self.begin_frame();

        while poll(Duration::ZERO).unwrap_or(false) {
            if let Ok(Event::Key(key)) = event::read() {
                self.record(key, Instant::now());
            }
        }

        self.expire(Instant::now());
    }

    /// Latest movement key typed this frame, or `None`.
    pub fn last_direction(&self) -> Direction {
        self.typed.iter()
            .rev()
            .map(|&code| key_direction(code))
            .find(|dir| !dir.is_none())
            .unwrap_or(Direction::None)
    }

    /// Was this key freshly pressed this frame? (edge trigger)
    pub fn was_pressed(&self, code: KeyCode) -> bool {
        self.fresh_presses.contains(&code)
    }

    /// Convenience: was any of these keys freshly pressed?
    pub fn any_pressed(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.was_pressed(*c))
    }

    pub fn ctrl_c_pressed(&self) -> bool {
        self.raw_events.iter().any(|k| {
            k.modifiers.contains(KeyModifiers::CONTROL)
                && (k.code == KeyCode::Char('c') || k.code == KeyCode::Char('C'))
        })
    }

    // ── Internal ──

    fn begin_frame(&mut self) {
        self.fresh_presses.clear();
        self.typed.clear();
        self.raw_events.clear();
    }

    fn record(&mut self, key: KeyEvent, now: Instant) {
        self.raw_events.push(key);

        // Release: left to the timeout
        if key.kind == KeyEventKind::Release {
            return;
        }
        let was_held = self.is_held_at(key.code, now);
        self.last_active.insert(key.code, now);
        self.typed.push(key.code);
        if !was_held {
            self.fresh_presses.push(key.code);
        }
    }

    fn expire(&mut self, now: Instant) {
        self.last_active.retain(|_, t| now.duration_since(*t) < HOLD_TIMEOUT);
    }

    fn is_held_at(&self, code: KeyCode, now: Instant) -> bool {
        self.last_active.get(&code)
            .map(|t| now.duration_since(*t) < HOLD_TIMEOUT)
            .unwrap_or(false)
    }
}
