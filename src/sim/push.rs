/// Move resolution: the push / bounce / stick protocol.
///
/// `try_move` is the single entry point. It looks at the mover's kind,
/// consults the entry tables in `domain::rules`, and applies the verdict:
///
///   - Push      → recursively ask the occupant to move the same way first
///   - Capture   → sticky box takes the monster captive, move fails
///   - PlayerCaught → player removed from the stage
///
/// Every move answers with a plain `bool`: did the mover change cells?

use crate::domain::actor::{ActorId, ActorKind};
use crate::domain::rules::{self, Entry};
use super::event::GameEvent;
use super::stage::Stage;

/// Ask actor `id` to move by (dx, dy) on behalf of `requester`.
///
/// Monsters ignore (dx, dy) and requests from anyone but themselves; they
/// always travel along their own heading.
pub fn try_move(
    stage: &mut Stage,
    id: ActorId,
    requester: ActorId,
    dx: i32,
    dy: i32,
    events: &mut Vec<GameEvent>,
) -> bool {
    let kind = match stage.actor(id) {
        Some(a) => a.kind,
        None => return false,
    };
    match kind {
        ActorKind::Player { .. } => move_player(stage, id, dx, dy, events),
        ActorKind::Box => move_box(stage, id, dx, dy, false, events),
        ActorKind::StickyBox { .. } => move_box(stage, id, dx, dy, true, events),
        ActorKind::Wall => false,
        ActorKind::Monster { .. } => move_monster(stage, id, requester, events),
    }
}

/// Has the monster `id` been boxed in on every side?
pub fn is_dead(stage: &Stage, id: ActorId) -> bool {
    match stage.actor(id) {
        Some(a) if a.is_monster() => rules::is_surrounded(stage, a.x, a.y),
        _ => false,
    }
}

fn occupant_kind(stage: &Stage, occupant: Option<ActorId>) -> Option<ActorKind> {
    occupant.and_then(|o| stage.actor(o)).map(|a| a.kind)
}

fn target_of(stage: &Stage, id: ActorId, dx: i32, dy: i32) -> Option<(i32, i32)> {
    stage.actor(id).map(|a| (a.x + dx, a.y + dy))
}

// ══════════════════════════════════════════════════════════════
// Player
// ══════════════════════════════════════════════════════════════

fn move_player(stage: &mut Stage, id: ActorId, dx: i32, dy: i32, events: &mut Vec<GameEvent>) -> bool {
    let Some((nx, ny)) = target_of(stage, id, dx, dy) else { return false };
    if !stage.is_in_bounds(nx, ny) {
        return false;
    }

    let occupant = stage.get_actor(nx, ny);
    match (rules::player_entry(occupant_kind(stage, occupant)), occupant) {
        (Entry::Free, _) => {}
        (Entry::Push, Some(other)) => {
            if !try_move(stage, other, id, dx, dy, events) {
                return false;
            }
        }
        (Entry::PlayerCaught, _) => {
            log::info!("player walked into a monster at ({nx}, {ny})");
            stage.remove_player();
            events.push(GameEvent::PlayerCaught { x: nx, y: ny });
            return false;
        }
        _ => return false,
    }

    stage.set_position(id, nx, ny);
    events.push(GameEvent::PlayerMoved { x: nx, y: ny });
    true
}

// ══════════════════════════════════════════════════════════════
// Boxes (plain and sticky)
// ══════════════════════════════════════════════════════════════

fn move_box(
    stage: &mut Stage,
    id: ActorId,
    dx: i32,
    dy: i32,
    sticky: bool,
    events: &mut Vec<GameEvent>,
) -> bool {
    let Some((nx, ny)) = target_of(stage, id, dx, dy) else { return false };
    if !stage.is_in_bounds(nx, ny) {
        return false;
    }

    let occupant = stage.get_actor(nx, ny);
    match (rules::box_entry(occupant_kind(stage, occupant), sticky), occupant) {
        (Entry::Free, _) => {}
        (Entry::Push, Some(other)) => {
            if !try_move(stage, other, id, dx, dy, events) {
                return false;
            }
        }
        (Entry::Capture, Some(monster)) => {
            capture(stage, id, monster, events);
            return false;
        }
        _ => return false,
    }

    stage.set_position(id, nx, ny);
    if sticky {
        release(stage, id, events);
    }
    events.push(GameEvent::BoxPushed { x: nx, y: ny });
    true
}

/// Sticky box `box_id` takes `monster` captive. A box holds every
/// monster that runs into it.
fn capture(stage: &mut Stage, box_id: ActorId, monster: ActorId, events: &mut Vec<GameEvent>) {
    let held = stage.actor_mut(box_id).is_some_and(|b| b.hold(monster));
    if !held {
        return;
    }
    if let Some(m) = stage.actor_mut(monster) {
        m.set_stuck(true);
        log::debug!("monster stuck at ({}, {})", m.x, m.y);
        events.push(GameEvent::MonsterCaptured { x: m.x, y: m.y });
    }
}

/// Sticky box `box_id` lets go of all its captives.
fn release(stage: &mut Stage, box_id: ActorId, events: &mut Vec<GameEvent>) {
    let captives = match stage.actor_mut(box_id) {
        Some(b) => b.take_captives(),
        None => return,
    };
    for monster in captives {
        if let Some(m) = stage.actor_mut(monster) {
            m.set_stuck(false);
            log::debug!("monster released at ({}, {})", m.x, m.y);
            events.push(GameEvent::MonsterReleased { x: m.x, y: m.y });
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Monsters
// ══════════════════════════════════════════════════════════════

fn move_monster(
    stage: &mut Stage,
    id: ActorId,
    requester: ActorId,
    events: &mut Vec<GameEvent>,
) -> bool {
    let (x, y, dx, dy, stuck) = match stage.actor(id).map(|a| (a.x, a.y, a.kind)) {
        Some((x, y, ActorKind::Monster { dx, dy, stuck })) => (x, y, dx, dy, stuck),
        _ => return false,
    };
    if stuck || requester != id {
        return false;
    }

    let (nx, ny) = (x + dx, y + dy);

    // Edge bounce: flip only the component that left the grid.
    let flip_x = !stage.is_in_bounds_x(nx);
    let flip_y = !stage.is_in_bounds_y(ny);
    if flip_x || flip_y {
        let new_dx = if flip_x { -dx } else { dx };
        let new_dy = if flip_y { -dy } else { dy };
        if let Some(m) = stage.actor_mut(id) {
            m.set_heading(new_dx, new_dy);
        }
        events.push(GameEvent::MonsterBounced { x, y });
        return false;
    }

    let occupant = stage.get_actor(nx, ny);
    if occupant.is_some() {
        // Anything in the way turns the monster straight back.
        if let Some(m) = stage.actor_mut(id) {
            m.set_heading(-dx, -dy);
        }
    }

    match (rules::monster_entry(occupant_kind(stage, occupant)), occupant) {
        (Entry::Free, _) => {}
        (Entry::PlayerCaught, _) => {
            log::info!("monster caught the player at ({nx}, {ny})");
            stage.remove_player();
            events.push(GameEvent::PlayerCaught { x: nx, y: ny });
        }
        (Entry::Capture, Some(sticky)) => {
            events.push(GameEvent::MonsterBounced { x, y });
            capture(stage, sticky, id, events);
            return false;
        }
        _ => {
            events.push(GameEvent::MonsterBounced { x, y });
            return false;
        }
    }

    stage.set_position(id, nx, ny);
    true
}
