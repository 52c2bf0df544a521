/// Actors: everything that occupies a grid cell.
///
/// Kind-specific state lives inside the `ActorKind` variants, and
/// collision code asks capability questions (`is_pushable`, `is_monster`)
/// instead of inspecting names.

use slotmap::new_key_type;

new_key_type! {
    /// Stable handle to an actor. Survives removal of other actors.
    pub struct ActorId;
}

/// One of the eight compass moves, or no move at all.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub enum Direction {
    #[default]
    None,
    Up,
    Down,
    Left,
    Right,
    UpLeft,
    UpRight,
    DownLeft,
    DownRight,
}

impl Direction {
    /// Grid delta `(dx, dy)`; y grows downwards.
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::None      => (0, 0),
            Direction::Up        => (0, -1),
            Direction::Down      => (0, 1),
            Direction::Left      => (-1, 0),
            Direction::Right     => (1, 0),
            Direction::UpLeft    => (-1, -1),
            Direction::UpRight   => (1, -1),
            Direction::DownLeft  => (-1, 1),
            Direction::DownRight => (1, 1),
        }
    }

    pub fn is_none(self) -> bool {
        self == Direction::None
    }
}

/// Throttles how often an actor acts relative to the simulation tick.
///
/// Every tick the counter advances; the actor acts only on the tick where
/// it wraps back to zero. A period of 1 acts every tick.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Delay {
    period: u32,
    count: u32,
}

impl Delay {
    pub const DEFAULT_PERIOD: u32 = 5;

    pub fn new(period: u32) -> Self {
        Delay { period: period.max(1), count: 0 }
    }

    pub fn period(&self) -> u32 {
        self.period
    }

    /// Advance one tick. Returns true when the actor gets to act.
    pub fn tick(&mut self) -> bool {
        self.count = (self.count + 1) % self.period;
        self.count == 0
    }
}

impl Default for Delay {
    fn default() -> Self {
        Delay::new(Self::DEFAULT_PERIOD)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ActorKind {
    /// Keyboard-driven player. `pending` is the last unconsumed move request.
    Player { pending: Direction },
    Box,
    /// Holds every monster that runs into it until the box is displaced.
    /// The captives themselves live on `Actor::captives`.
    StickyBox,
    Wall,
    /// Diagonal bouncer. `dx`/`dy` are each ±1.
    Monster { dx: i32, dy: i32, stuck: bool },
}

#[derive(Clone, Debug)]
pub struct Actor {
    pub x: i32,
    pub y: i32,
    pub kind: ActorKind,
    pub delay: Delay,
    /// Monsters held by a sticky box. Always empty for other kinds.
    captives: Vec<ActorId>,
}

impl Actor {
    pub fn new(kind: ActorKind, x: i32, y: i32) -> Self {
        Actor { x, y, kind, delay: Delay::default(), captives: Vec::new() }
    }

    pub fn player(x: i32, y: i32) -> Self {
        Actor::new(ActorKind::Player { pending: Direction::None }, x, y)
    }

    pub fn crate_box(x: i32, y: i32) -> Self {
        Actor::new(ActorKind::Box, x, y)
    }

    pub fn sticky_box(x: i32, y: i32) -> Self {
        Actor::new(ActorKind::StickyBox, x, y)
    }

    pub fn wall(x: i32, y: i32) -> Self {
        Actor::new(ActorKind::Wall, x, y)
    }

    /// Monsters start heading down-right.
    pub fn monster(x: i32, y: i32, delay: u32) -> Self {
        Actor {
            x, y,
            kind: ActorKind::Monster { dx: 1, dy: 1, stuck: false },
            delay: Delay::new(delay),
            captives: Vec::new(),
        }
    }

    pub fn position(&self) -> (i32, i32) {
        (self.x, self.y)
    }

    pub fn is_player(&self) -> bool {
        self.kind.is_player()
    }

    pub fn is_monster(&self) -> bool {
        self.kind.is_monster()
    }

    /// Short name for log lines.
    pub fn label(&self) -> &'static str {
        match self.kind {
            ActorKind::Player { .. }    => "player",
            ActorKind::Box              => "box",
            ActorKind::StickyBox => "sticky box",
            ActorKind::Wall             => "wall",
            ActorKind::Monster { .. }   => "monster",
        }
    }

    // ── Monster state ──

    pub fn heading(&self) -> Option<(i32, i32)> {
        match self.kind {
            ActorKind::Monster { dx, dy, .. } => Some((dx, dy)),
            _ => None,
        }
    }

    pub fn set_heading(&mut self, new_dx: i32, new_dy: i32) {
        if let ActorKind::Monster { dx, dy, .. } = &mut self.kind {
            *dx = new_dx;
            *dy = new_dy;
        }
    }

    pub fn is_stuck(&self) -> bool {
        matches!(self.kind, ActorKind::Monster { stuck: true, .. })
    }

    pub fn set_stuck(&mut self, value: bool) {
        if let ActorKind::Monster { stuck, .. } = &mut self.kind {
            *stuck = value;
        }
    }

    // ── Sticky box state ──

    pub fn captives(&self) -> &[ActorId] {
        &self.captives
    }

    /// Take `monster` captive. Only sticky boxes hold anything, and a
    /// monster is held at most once.
    pub fn hold(&mut self, monster: ActorId) -> bool {
        if !self.kind.is_sticky() || self.captives.contains(&monster) {
            return false;
        }
        self.captives.push(monster);
        true
    }

    pub fn let_go(&mut self, monster: ActorId) {
        self.captives.retain(|&held| held != monster);
    }

    /// Release everything held, returning the former captives.
    pub fn take_captives(&mut self) -> Vec<ActorId> {
        std::mem::take(&mut self.captives)
    }

    // ── Player state ──

    /// Take the pending move request, leaving none behind.
    pub fn take_pending(&mut self) -> Direction {
        match &mut self.kind {
            ActorKind::Player { pending } => std::mem::take(pending),
            _ => Direction::None,
        }
    }

    pub fn set_pending(&mut self, dir: Direction) {
        if let ActorKind::Player { pending } = &mut self.kind {
            *pending = dir;
        }
    }
}

impl ActorKind {
    pub fn is_player(self) -> bool {
        matches!(self, ActorKind::Player { .. })
    }

    pub fn is_monster(self) -> bool {
        matches!(self, ActorKind::Monster { .. })
    }

    pub fn is_wall(self) -> bool {
        matches!(self, ActorKind::Wall)
    }

    /// Boxes of either flavour can be shoved along by a push chain.
    pub fn is_pushable(self) -> bool {
        matches!(self, ActorKind::Box | ActorKind::StickyBox)
    }

    pub fn is_sticky(self) -> bool {
        matches!(self, ActorKind::StickyBox)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delay_fires_once_per_period() {
        let mut d = Delay::new(3);
        assert!(!d.tick());
        assert!(!d.tick());
        assert!(d.tick());
        assert!(!d.tick());
        assert!(!d.tick());
        assert!(d.tick());
    }

    #[test]
    fn delay_of_one_fires_every_tick() {
        let mut d = Delay::new(1);
        for _ in 0..4 {
            assert!(d.tick());
        }
    }

    #[test]
    fn zero_period_is_treated_as_one() {
        let mut d = Delay::new(0);
        assert_eq!(d.period(), 1);
        assert!(d.tick());
    }

    #[test]
    fn diagonal_deltas() {
        assert_eq!(Direction::UpLeft.delta(), (-1, -1));
        assert_eq!(Direction::UpRight.delta(), (1, -1));
        assert_eq!(Direction::DownLeft.delta(), (-1, 1));
        assert_eq!(Direction::DownRight.delta(), (1, 1));
        assert_eq!(Direction::None.delta(), (0, 0));
    }

    #[test]
    fn pending_is_consumed_once() {
        let mut p = Actor::player(0, 0);
        p.set_pending(Direction::Left);
        assert_eq!(p.take_pending(), Direction::Left);
        assert_eq!(p.take_pending(), Direction::None);
    }

    #[test]
    fn monster_state_setters_ignore_other_kinds() {
        let mut b = Actor::crate_box(1, 1);
        b.set_stuck(true);
        b.set_heading(-1, -1);
        assert!(!b.is_stuck());
        assert_eq!(b.heading(), None);

        let mut m = Actor::monster(2, 2, 1);
        assert_eq!(m.heading(), Some((1, 1)));
        m.set_heading(-1, 1);
        m.set_stuck(true);
        assert_eq!(m.heading(), Some((-1, 1)));
        assert!(m.is_stuck());
    }

    #[test]
    fn only_sticky_boxes_hold_captives() {
        let mut arena = slotmap::SlotMap::<ActorId, ()>::with_key();
        let (m1, m2) = (arena.insert(()), arena.insert(()));

        let mut plain = Actor::crate_box(0, 0);
        assert!(!plain.hold(m1));
        assert!(plain.captives().is_empty());

        let mut sticky = Actor::sticky_box(0, 0);
        assert!(sticky.hold(m1));
        assert!(sticky.hold(m2));
        assert!(!sticky.hold(m1));
        assert_eq!(sticky.captives(), &[m1, m2]);
        sticky.let_go(m1);
        assert_eq!(sticky.captives(), &[m2]);
        assert_eq!(sticky.take_captives(), vec![m2]);
        assert!(sticky.captives().is_empty());
    }

    #[test]
    fn capabilities() {
        assert!(ActorKind::Box.is_pushable());
        assert!(ActorKind::StickyBox.is_pushable());
        assert!(!ActorKind::Wall.is_pushable());
        assert!(ActorKind::Wall.is_wall());
        assert!(ActorKind::StickyBox.is_sticky());
        assert!(!ActorKind::Box.is_sticky());
    }
}
