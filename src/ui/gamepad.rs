/// Gamepad input tracker using gilrs.
///
/// Button mapping is loaded from config.toml via `load_button_config()`.
/// Default mapping:
///   D-pad / Left Stick    →  Movement (eight directions)
///   Start / A             →  Confirm
///   Select                →  Cancel / Quit
///   Y                     →  Restart
///   B                     →  Pause
///
/// D-pad diagonals come from two arms held together. The stick is split
/// into eight 45° sectors around its angle once it leaves the dead zone.

#[cfg(feature = "gamepad")]
use gilrs::{Axis, Button, EventType, Gilrs};

use crate::config::GamepadConfig;
use crate::domain::actor::Direction;

const STICK_DEADZONE: f32 = 0.35;

/// Logical button identifiers (one per physical button).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Btn {
    A,       // South
    B,       // East
    X,       // West
    Y,       // North
    L1,      // LeftTrigger
    R1,      // RightTrigger
    Start,
    Select,
}

const BTN_COUNT: usize = 8;

impl Btn {
    fn from_name(s: &str) -> Option<Btn> {
        match s.to_uppercase().as_str() {
            "A" | "SOUTH"  => Some(Btn::A),
            "B" | "EAST"   => Some(Btn::B),
            "X" | "WEST"   => Some(Btn::X),
            "Y" | "NORTH"  => Some(Btn::Y),
            "L1" | "LB" | "LEFTTRIGGER"  => Some(Btn::L1),
            "R1" | "RB" | "RIGHTTRIGGER" => Some(Btn::R1),
            "START" => Some(Btn::Start),
            "SELECT" | "BACK" => Some(Btn::Select),
            _ => None,
        }
    }

    #[cfg(feature = "gamepad")]
    fn from_gilrs(btn: Button) -> Option<Btn> {
        match btn {
            Button::South        => Some(Btn::A),
            Button::East         => Some(Btn::B),
            Button::West         => Some(Btn::X),
            Button::North        => Some(Btn::Y),
            Button::LeftTrigger  => Some(Btn::L1),
            Button::RightTrigger => Some(Btn::R1),
            Button::Start        => Some(Btn::Start),
            Button::Select       => Some(Btn::Select),
            _ => None,
        }
    }
}

/// Per-button state: held (continuous) and just_pressed (edge).
#[derive(Clone, Copy, Debug, Default)]
struct BtnState {
    held: bool,
    just_pressed: bool,
}

/// Action-to-button mapping (loaded from config).
struct ActionMap {
    confirm: Vec<Btn>,
    cancel: Vec<Btn>,
    restart: Vec<Btn>,
    pause: Vec<Btn>,
}

impl Default for ActionMap {
    fn default() -> Self {
        ActionMap {
            confirm: vec![Btn::Start, Btn::A],
            cancel:  vec![Btn::Select],
            restart: vec![Btn::Y],
            pause:   vec![Btn::B],
        }
    }
}

/// Held d-pad arms.
#[derive(Clone, Copy, Debug, Default)]
struct DPad {
    up: bool,
    down: bool,
    left: bool,
    right: bool,
}

impl DPad {
    fn direction(self) -> Direction {
        let dy = (self.down as i32) - (self.up as i32);
        let dx = (self.right as i32) - (self.left as i32);
        direction_from_delta(dx, dy)
    }
}

fn direction_from_delta(dx: i32, dy: i32) -> Direction {
    match (dx.signum(), dy.signum()) {
        (0, -1)  => Direction::Up,
        (0, 1)   => Direction::Down,
        (-1, 0)  => Direction::Left,
        (1, 0)   => Direction::Right,
        (-1, -1) => Direction::UpLeft,
        (1, -1)  => Direction::UpRight,
        (-1, 1)  => Direction::DownLeft,
        (1, 1)   => Direction::DownRight,
        _        => Direction::None,
    }
}

/// Map a stick position to one of eight directions.
///
/// `y` follows gilrs (positive is up). Inside the dead zone the stick is
/// neutral. Sectors are 45° wide and centred on each compass point.
pub fn stick_direction(x: f32, y: f32, deadzone: f32) -> Direction {
    if x.hypot(y) < deadzone {
        return Direction::None;
    }
    let angle = y.atan2(x).to_degrees();                 // -180..=180, 0 = right
    let sector = ((angle + 360.0 + 22.5) / 45.0) as i32 % 8;
    match sector {
        0 => Direction::Right,
        1 => Direction::UpRight,
        2 => Direction::Up,
        3 => Direction::UpLeft,
        4 => Direction::Left,
        5 => Direction::DownLeft,
        6 => Direction::Down,
        _ => Direction::DownRight,
    }
}

pub struct GamepadState {
    #[cfg(feature = "gamepad")]
    gilrs: Option<Gilrs>,

    buttons: [BtnState; BTN_COUNT],
    dpad: DPad,
    stick_x: f32,
    stick_y: f32,

    /// Direction held at the end of the previous update.
    prev_direction: Direction,
    /// Direction newly entered during this update (edge), or `None`.
    fresh_direction: Direction,

    action_map: ActionMap,

    pub connected: bool,
}

fn btn_index(btn: Btn) -> usize {
    btn as usize
}

impl GamepadState {
    pub fn new() -> Self {
        #[cfg(feature = "gamepad")]
        let (gilrs_opt, connected) = {
            match Gilrs::new() {
                Ok(g) => {
                    let has_pad = g.gamepads().next().is_some();
                    (Some(g), has_pad)
                }
                Err(e) => {
                    log::warn!("gamepad support unavailable: {e}");
                    (None, false)
                }
            }
        };
        #[cfg(not(feature = "gamepad"))]
        let connected = false;

        GamepadState {
            #[cfg(feature = "gamepad")]
            gilrs: gilrs_opt,
            buttons: [BtnState::default(); BTN_COUNT],
            dpad: DPad::default(),
            stick_x: 0.0,
            stick_y: 0.0,
            prev_direction: Direction::None,
            fresh_direction: Direction::None,
            action_map: ActionMap::default(),
            connected,
        }
    }

    /// Load button mapping from config. Empty or unrecognised lists keep
    /// the default buttons.
    pub fn load_button_config(&mut self, cfg: &GamepadConfig) {
        fn parse_list(names: &[String]) -> Vec<Btn> {
            names.iter()
                .filter_map(|s| {
                    let btn = Btn::from_name(s);
                    if btn.is_none() {
                        log::warn!("unknown gamepad button {s:?}");
                    }
                    btn
                })
                .collect()
        }
        let map = &mut self.action_map;
        let cf = parse_list(&cfg.confirm);
        if !cf.is_empty() { map.confirm = cf; }
        let ca = parse_list(&cfg.cancel);
        if !ca.is_empty() { map.cancel = ca; }
        let rs = parse_list(&cfg.restart);
        if !rs.is_empty() { map.restart = rs; }
        let pa = parse_list(&cfg.pause);
        if !pa.is_empty() { map.pause = pa; }
    }

    pub fn update(&mut self) {
        for b in &mut self.buttons { b.just_pressed = false; }

        #[cfg(feature = "gamepad")]
        self.poll_gilrs();

        self.refresh_direction();
    }

    #[cfg(feature = "gamepad")]
    fn poll_gilrs(&mut self) {
        let gilrs = match &mut self.gilrs {
            Some(g) => g,
            None => return,
        };

        let events: Vec<_> = std::iter::from_fn(|| gilrs.next_event()).collect();

        for event in events {
            match event.event {
                EventType::ButtonPressed(btn, _) => {
                    self.connected = true;
                    self.set_button(btn, true);
                }
                EventType::ButtonReleased(btn, _) => {
                    self.connected = true;
                    self.set_button(btn, false);
                }
                EventType::AxisChanged(axis, value, _) => {
                    self.connected = true;
                    match axis {
                        Axis::LeftStickX => self.stick_x = value,
                        Axis::LeftStickY => self.stick_y = value,
                        _ => {}
                    }
                }
                EventType::Connected => {
                    log::info!("gamepad connected");
                    self.connected = true;
                }
                EventType::Disconnected => {
                    log::info!("gamepad disconnected");
                    self.connected = false;
                    self.release_all();
                }
                _ => {}
            }
        }
    }

    #[cfg(feature = "gamepad")]
    fn set_button(&mut self, gilrs_btn: Button, held: bool) {
        match gilrs_btn {
            Button::DPadUp    => { self.dpad.up = held; return; }
            Button::DPadDown  => { self.dpad.down = held; return; }
            Button::DPadLeft  => { self.dpad.left = held; return; }
            Button::DPadRight => { self.dpad.right = held; return; }
            _ => {}
        }

        if let Some(btn) = Btn::from_gilrs(gilrs_btn) {
            let state = &mut self.buttons[btn_index(btn)];
            if held && !state.held {
                state.just_pressed = true;
            }
            state.held = held;
        }
    }

    /// D-pad wins over the stick when both are active.
    fn refresh_direction(&mut self) {
        let mut current = self.dpad.direction();
        if current.is_none() {
            current = stick_direction(self.stick_x, self.stick_y, STICK_DEADZONE);
        }
        self.fresh_direction = if current != self.prev_direction {
            current
        } else {
            Direction::None
        };
        self.prev_direction = current;
    }

    // ── Queries ──

    /// Direction entered this frame (edge). Holding does not repeat.
    pub fn direction_pressed(&self) -> Direction {
        self.fresh_direction
    }

    fn any_just_pressed(&self, btns: &[Btn]) -> bool {
        btns.iter().any(|&b| self.buttons[btn_index(b)].just_pressed)
    }

    pub fn confirm_pressed(&self) -> bool {
        self.any_just_pressed(&self.action_map.confirm)
    }
    pub fn cancel_pressed(&self) -> bool {
        self.any_just_pressed(&self.action_map.cancel)
    }
    pub fn restart_pressed(&self) -> bool {
        self.any_just_pressed(&self.action_map.restart)
    }
    pub fn pause_pressed(&self) -> bool {
        self.any_just_pressed(&self.action_map.pause)
    }

    // ── Internal ──

    #[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
    fn release_all(&mut self) {
        for b in &mut self.buttons { *b = BtnState::default(); }
        self.dpad = DPad::default();
        self.stick_x = 0.0;
        self.stick_y = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stick_sectors() {
        assert_eq!(stick_direction(1.0, 0.0, 0.3), Direction::Right);
        assert_eq!(stick_direction(0.0, 1.0, 0.3), Direction::Up);
        assert_eq!(stick_direction(-1.0, 0.0, 0.3), Direction::Left);
        assert_eq!(stick_direction(0.0, -1.0, 0.3), Direction::Down);
        assert_eq!(stick_direction(0.7, 0.7, 0.3), Direction::UpRight);
        assert_eq!(stick_direction(-0.7, 0.7, 0.3), Direction::UpLeft);
        assert_eq!(stick_direction(-0.7, -0.7, 0.3), Direction::DownLeft);
        assert_eq!(stick_direction(0.7, -0.7, 0.3), Direction::DownRight);
    }

    #[test]
    fn stick_sector_edges() {
        // 20° is still "right", 25° is already "up-right"
        let (s20, c20) = 20f32.to_radians().sin_cos();
        let (s25, c25) = 25f32.to_radians().sin_cos();
        assert_eq!(stick_direction(c20, s20, 0.3), Direction::Right);
        assert_eq!(stick_direction(c25, s25, 0.3), Direction::UpRight);
        // just below the negative x axis
        assert_eq!(stick_direction(-1.0, -0.1, 0.3), Direction::Left);
    }

    #[test]
    fn stick_deadzone_is_neutral() {
        assert_eq!(stick_direction(0.1, 0.1, 0.3), Direction::None);
        assert_eq!(stick_direction(0.0, 0.0, 0.3), Direction::None);
    }

    #[test]
    fn dpad_combinations() {
        let pad = |up, down, left, right| DPad { up, down, left, right }.direction();
        assert_eq!(pad(true, false, false, false), Direction::Up);
        assert_eq!(pad(true, false, true, false), Direction::UpLeft);
        assert_eq!(pad(false, true, false, true), Direction::DownRight);
        assert_eq!(pad(true, true, false, false), Direction::None);
        assert_eq!(pad(true, true, true, false), Direction::Left);
    }

    #[test]
    fn direction_fires_once_per_change() {
        let mut gp = GamepadState::new();
        gp.release_all();
        gp.dpad.right = true;
        gp.refresh_direction();
        assert_eq!(gp.direction_pressed(), Direction::Right);
        gp.refresh_direction();
        assert_eq!(gp.direction_pressed(), Direction::None);
        gp.dpad.up = true;
        gp.refresh_direction();
        assert_eq!(gp.direction_pressed(), Direction::UpRight);
    }

    #[test]
    fn button_names_parse() {
        let mut gp = GamepadState::new();
        gp.load_button_config(&GamepadConfig {
            confirm: vec!["south".into()],
            cancel: vec!["bogus".into()],
            restart: vec!["RB".into()],
            pause: vec![],
        });
        assert_eq!(gp.action_map.confirm, vec![Btn::A]);
        assert_eq!(gp.action_map.cancel, vec![Btn::Select]);
        assert_eq!(gp.action_map.restart, vec![Btn::R1]);
        assert_eq!(gp.action_map.pause, vec![Btn::B]);
    }
}
