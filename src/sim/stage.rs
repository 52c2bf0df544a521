/// Stage: the grid and the authoritative set of actors on it.
///
/// ## Storage
///
/// Actors live in a `SlotMap` arena keyed by `ActorId`, so ids stay valid
/// while other actors come and go. A separate `order` list records
/// insertion order, which is both draw order and step order.
///
/// ## Occupancy
///
/// Nothing stops two actors from sharing a cell. `get_actor` returns the
/// first one in insertion order, and every collision query goes through it.

use slotmap::SlotMap;

use crate::domain::actor::{Actor, ActorId, Direction};
use crate::domain::rules::GridView;

pub struct Stage {
    actors: SlotMap<ActorId, Actor>,
    order: Vec<ActorId>,
    player: Option<ActorId>,
    width: i32,
    height: i32,
}

// ── Geometry ──

impl Stage {
    pub fn new(width: i32, height: i32) -> Self {
        Stage {
            actors: SlotMap::with_key(),
            order: Vec::new(),
            player: None,
            width: width.max(1),
            height: height.max(1),
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    #[inline]
    pub fn is_in_bounds(&self, x: i32, y: i32) -> bool {
        self.is_in_bounds_x(x) && self.is_in_bounds_y(y)
    }

    #[inline]
    pub fn is_in_bounds_x(&self, x: i32) -> bool {
        0 <= x && x < self.width
    }

    #[inline]
    pub fn is_in_bounds_y(&self, y: i32) -> bool {
        0 <= y && y < self.height
    }
}

// ── Actor set ──

impl Stage {
    pub fn add_actor(&mut self, actor: Actor) -> ActorId {
        let id = self.actors.insert(actor);
        self.order.push(id);
        id
    }

    /// Add the player and remember it as the designated player.
    pub fn set_player(&mut self, actor: Actor) -> ActorId {
        let id = self.add_actor(actor);
        self.player = Some(id);
        id
    }

    /// Remove an actor. Sticky boxes holding it let go; removing the
    /// player clears the player slot.
    pub fn remove_actor(&mut self, id: ActorId) -> Option<Actor> {
        let actor = self.actors.remove(id)?;
        self.order.retain(|&other| other != id);
        if self.player == Some(id) {
            self.player = None;
        }
        if actor.is_monster() {
            for other in self.actors.values_mut() {
                other.let_go(id);
            }
        }
        Some(actor)
    }

    pub fn remove_player(&mut self) -> Option<Actor> {
        let id = self.player?;
        self.remove_actor(id)
    }

    pub fn player_id(&self) -> Option<ActorId> {
        self.player
    }

    pub fn player(&self) -> Option<&Actor> {
        self.player.and_then(|id| self.actors.get(id))
    }

    /// Queue a move request for the player. Only the latest request before
    /// a step survives.
    pub fn player_event(&mut self, dir: Direction) {
        if let Some(p) = self.player.and_then(|id| self.actors.get_mut(id)) {
            p.set_pending(dir);
        }
    }

    pub fn actor(&self, id: ActorId) -> Option<&Actor> {
        self.actors.get(id)
    }

    pub fn actor_mut(&mut self, id: ActorId) -> Option<&mut Actor> {
        self.actors.get_mut(id)
    }

    pub fn contains(&self, id: ActorId) -> bool {
        self.actors.contains_key(id)
    }

    /// Snapshot of ids in insertion order (safe to hold across mutation).
    pub fn ids(&self) -> Vec<ActorId> {
        self.order.clone()
    }

    /// All actors in insertion order.
    pub fn actors(&self) -> impl Iterator<Item = (ActorId, &Actor)> + '_ {
        self.order.iter().filter_map(move |&id| self.actors.get(id).map(|a| (id, a)))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// First actor at (x, y) in insertion order.
    pub fn get_actor(&self, x: i32, y: i32) -> Option<ActorId> {
        self.actors()
            .find(|(_, a)| a.x == x && a.y == y)
            .map(|(id, _)| id)
    }

    pub fn is_free(&self, x: i32, y: i32) -> bool {
        self.get_actor(x, y).is_none()
    }

    pub fn set_position(&mut self, id: ActorId, x: i32, y: i32) {
        if let Some(a) = self.actors.get_mut(id) {
            a.x = x;
            a.y = y;
        }
    }

    pub fn monster_count(&self) -> usize {
        self.actors.values().filter(|a| a.is_monster()).count()
    }
}

// ── Terminal conditions ──

impl Stage {
    /// Every monster is gone.
    pub fn game_over_win(&self) -> bool {
        !self.actors.values().any(|a| a.is_monster())
    }

    /// The player is gone.
    pub fn game_over_lose(&self) -> bool {
        !self.actors.values().any(|a| a.is_player())
    }
}

impl GridView for Stage {
    fn in_bounds(&self, x: i32, y: i32) -> bool {
        self.is_in_bounds(x, y)
    }

    fn occupant(&self, x: i32, y: i32) -> Option<&Actor> {
        self.get_actor(x, y).and_then(|id| self.actors.get(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_are_half_open() {
        let s = Stage::new(20, 20);
        assert!(s.is_in_bounds(0, 0));
        assert!(s.is_in_bounds(19, 19));
        assert!(!s.is_in_bounds(20, 0));
        assert!(!s.is_in_bounds(0, 20));
        assert!(!s.is_in_bounds(-1, 5));
        assert!(!s.is_in_bounds(5, -1));
    }

    #[test]
    fn get_actor_returns_first_inserted() {
        let mut s = Stage::new(5, 5);
        let first = s.add_actor(Actor::crate_box(2, 2));
        let _second = s.add_actor(Actor::wall(2, 2));
        assert_eq!(s.get_actor(2, 2), Some(first));
        assert_eq!(s.get_actor(3, 3), None);
    }

    #[test]
    fn order_survives_removal() {
        let mut s = Stage::new(5, 5);
        let a = s.add_actor(Actor::crate_box(0, 0));
        let b = s.add_actor(Actor::crate_box(1, 0));
        let c = s.add_actor(Actor::crate_box(2, 0));
        s.remove_actor(b);
        assert_eq!(s.ids(), vec![a, c]);
        assert!(!s.contains(b));
        assert_eq!(s.actor(c).map(|x| x.position()), Some((2, 0)));
    }

    #[test]
    fn removing_player_clears_slot_and_loses() {
        let mut s = Stage::new(5, 5);
        s.set_player(Actor::player(0, 0));
        s.add_actor(Actor::monster(3, 3, 1));
        assert!(!s.game_over_lose());
        assert!(s.remove_player().is_some());
        assert!(s.player_id().is_none());
        assert!(s.game_over_lose());
        assert!(s.remove_player().is_none());
    }

    #[test]
    fn no_monsters_means_win() {
        let mut s = Stage::new(5, 5);
        s.set_player(Actor::player(0, 0));
        let m = s.add_actor(Actor::monster(3, 3, 1));
        assert!(!s.game_over_win());
        s.remove_actor(m);
        assert!(s.game_over_win());
    }

    #[test]
    fn removed_monster_is_released_by_its_box() {
        let mut s = Stage::new(5, 5);
        let m = s.add_actor(Actor::monster(1, 1, 1));
        let other = s.add_actor(Actor::monster(3, 1, 1));
        let b = s.add_actor(Actor::sticky_box(2, 2));
        if let Some(bx) = s.actor_mut(b) {
            bx.hold(m);
            bx.hold(other);
        }
        s.remove_actor(m);
        assert_eq!(s.actor(b).map(|bx| bx.captives().to_vec()), Some(vec![other]));
    }

    #[test]
    fn player_event_keeps_latest_request() {
        let mut s = Stage::new(5, 5);
        let p = s.set_player(Actor::player(0, 0));
        s.player_event(Direction::Right);
        s.player_event(Direction::Down);
        let got = s.actor_mut(p).map(|a| a.take_pending());
        assert_eq!(got, Some(Direction::Down));
    }
}
