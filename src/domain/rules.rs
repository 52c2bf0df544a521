/// Collision rules, truth-table driven.
///
/// Pure functions: given what occupies the target cell, decide what a
/// move attempt means. Nothing here mutates the stage; `sim::push`
/// carries out the verdict.
///
/// ### Player entering a cell
/// ┌──────────────────────┬──────────────┐
/// │ Occupant              │ Verdict       │
/// ├──────────────────────┼──────────────┤
/// │ (none)                │ Free          │
/// │ Box / Sticky box      │ Push          │
/// │ Monster               │ PlayerCaught  │
/// │ Wall / Player         │ Blocked       │
/// └──────────────────────┴──────────────┘
///
/// ### Box entering a cell
/// ┌──────────────────────┬──────────────────────────────┐
/// │ Occupant              │ Verdict                       │
/// ├──────────────────────┼──────────────────────────────┤
/// │ (none)                │ Free                          │
/// │ Box / Sticky box      │ Push                          │
/// │ Monster               │ Capture if sticky, else Blocked │
/// │ Wall / Player         │ Blocked                       │
/// └──────────────────────┴──────────────────────────────┘
///
/// ### Monster entering a cell
/// ┌──────────────────────┬──────────────┐
/// │ Occupant              │ Verdict       │
/// ├──────────────────────┼──────────────┤
/// │ (none)                │ Free          │
/// │ Sticky box            │ Capture       │
/// │ Box / Wall / Monster  │ Blocked       │
/// │ Player                │ PlayerCaught  │
/// └──────────────────────┴──────────────┘
///
/// Out-of-bounds targets are rejected before any table is consulted.

use super::actor::{Actor, ActorKind};

/// Outcome of trying to enter an occupied (or empty) cell.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Entry {
    /// Cell is empty: move in.
    Free,
    /// Move refused.
    Blocked,
    /// Occupant must move first, in the same direction.
    Push,
    /// A sticky box and a monster meet: the monster is held, the move fails.
    Capture,
    /// Player and monster meet: the player is caught.
    PlayerCaught,
}

/// Read-only view of the grid for rule queries.
pub trait GridView {
    fn in_bounds(&self, x: i32, y: i32) -> bool;
    /// First actor at (x, y) in insertion order.
    fn occupant(&self, x: i32, y: i32) -> Option<&Actor>;
}

/// The eight cells around a position.
pub const NEIGHBOURS: [(i32, i32); 8] = [
    (-1, -1), (0, -1), (1, -1),
    (-1, 0),           (1, 0),
    (-1, 1),  (0, 1),  (1, 1),
];

pub fn player_entry(occupant: Option<ActorKind>) -> Entry {
    match occupant {
        None => Entry::Free,
        Some(k) if k.is_wall() => Entry::Blocked,
        Some(k) if k.is_pushable() => Entry::Push,
        Some(k) if k.is_monster() => Entry::PlayerCaught,
        Some(_) => Entry::Blocked,
    }
}

pub fn box_entry(occupant: Option<ActorKind>, sticky: bool) -> Entry {
    match occupant {
        None => Entry::Free,
        Some(k) if k.is_wall() => Entry::Blocked,
        Some(k) if k.is_pushable() => Entry::Push,
        Some(k) if k.is_monster() && sticky => Entry::Capture,
        Some(_) => Entry::Blocked,
    }
}

pub fn monster_entry(occupant: Option<ActorKind>) -> Entry {
    match occupant {
        None => Entry::Free,
        Some(k) if k.is_wall() => Entry::Blocked,
        Some(k) if k.is_sticky() => Entry::Capture,
        Some(k) if k.is_player() => Entry::PlayerCaught,
        Some(_) => Entry::Blocked,
    }
}

/// Is the cell at (x, y) boxed in on all eight sides?
///
/// A neighbour leaves room when it is in bounds and either empty or held by
/// the player. Off-grid neighbours count as blocked, so a monster in a
/// corner only needs three blockers.
pub fn is_surrounded<V: GridView>(view: &V, x: i32, y: i32) -> bool {
    NEIGHBOURS.iter().all(|&(dx, dy)| {
        let (nx, ny) = (x + dx, y + dy);
        if !view.in_bounds(nx, ny) {
            return true;
        }
        match view.occupant(nx, ny) {
            None => false,
            Some(a) => !a.is_player(),
        }
    })
}
