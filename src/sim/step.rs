/// The step function: advances the stage by one tick.
///
/// Every actor steps once, in insertion order:
///   - Player: apply the pending move request (if any), then drop it
///   - Monster: die if surrounded, otherwise act when its delay fires
///   - Box / Sticky box / Wall: nothing
///
/// Actors removed earlier in the same tick (a caught player, a dead
/// monster) are skipped; removals never cause a surviving actor to miss
/// its turn.

use crate::domain::actor::{ActorId, ActorKind};
use super::event::GameEvent;
use super::push;
use super::stage::Stage;

pub fn step(stage: &mut Stage) -> Vec<GameEvent> {
    let mut events = Vec::new();

    for id in stage.ids() {
        let kind = match stage.actor(id) {
            Some(a) => a.kind,
            None => continue,
        };
        match kind {
            ActorKind::Player { .. } => step_player(stage, id, &mut events),
            ActorKind::Monster { .. } => step_monster(stage, id, &mut events),
            ActorKind::Box | ActorKind::StickyBox | ActorKind::Wall => {}
        }
    }

    events
}

fn step_player(stage: &mut Stage, id: ActorId, events: &mut Vec<GameEvent>) {
    let dir = match stage.actor_mut(id) {
        Some(p) => p.take_pending(),
        None => return,
    };
    if dir.is_none() {
        return;
    }
    let (dx, dy) = dir.delta();
    push::try_move(stage, id, id, dx, dy, events);
}

fn step_monster(stage: &mut Stage, id: ActorId, events: &mut Vec<GameEvent>) {
    if push::is_dead(stage, id) {
        if let Some(m) = stage.remove_actor(id) {
            log::info!("monster trapped at ({}, {})", m.x, m.y);
            events.push(GameEvent::MonsterKilled { x: m.x, y: m.y });
        }
        return;
    }

    let acts = match stage.actor_mut(id) {
        Some(m) => m.delay.tick(),
        None => return,
    };
    if acts {
        push::try_move(stage, id, id, 0, 0, events);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::actor::{Actor, Direction};
    use crate::sim::level::stage_from_rows;

    fn stage(rows: &[&str]) -> Stage {
        stage_from_rows(rows, 1).expect("valid test layout")
    }

    #[test]
    fn pending_move_is_applied_once() {
        let mut s = stage(&["P..."]);
        s.player_event(Direction::Right);
        step(&mut s);
        assert_eq!(s.player().map(|p| p.position()), Some((1, 0)));
        step(&mut s);
        assert_eq!(s.player().map(|p| p.position()), Some((1, 0)));
    }

    #[test]
    fn idle_step_changes_nothing_without_monsters() {
        let mut s = stage(&["P#bs"]);
        let events = step(&mut s);
        assert!(events.is_empty());
        assert_eq!(s.len(), 4);
    }

    #[test]
    fn monster_acts_only_when_delay_fires() {
        let mut s = Stage::new(5, 5);
        let m = s.add_actor(Actor::monster(0, 0, 3));
        step(&mut s);
        step(&mut s);
        assert_eq!(s.actor(m).map(|a| a.position()), Some((0, 0)));
        step(&mut s);
        assert_eq!(s.actor(m).map(|a| a.position()), Some((1, 1)));
    }

    #[test]
    fn surrounded_monster_is_removed_on_its_turn() {
        let mut s = stage(&[
            "bbb..",
            "bMb..",
            "bbb.P",
        ]);
        let events = step(&mut s);
        assert!(events.contains(&GameEvent::MonsterKilled { x: 1, y: 1 }));
        assert!(s.game_over_win());
        assert!(!s.game_over_lose());
    }

    #[test]
    fn death_is_checked_even_while_delayed() {
        let mut s = Stage::new(3, 3);
        let m = s.add_actor(Actor::monster(1, 1, 50));
        for (x, y) in [(0, 0), (1, 0), (2, 0), (0, 1), (2, 1), (0, 2), (1, 2), (2, 2)] {
            s.add_actor(Actor::crate_box(x, y));
        }
        step(&mut s);
        assert!(!s.contains(m));
    }

    #[test]
    fn removal_does_not_skip_next_actor() {
        // first monster dies; the second one must still get its move
        let mut s = stage(&[
            "bbb...",
            "bMb...",
            "bbbM..",
            "......",
        ]);
        let second = s.get_actor(3, 2).expect("second monster");
        step(&mut s);
        assert_eq!(s.actor(second).map(|a| a.position()), Some((4, 3)));
    }

    #[test]
    fn player_pushes_box_to_trap_monster() {
        let mut s = Stage::new(4, 4);
        let m = s.add_actor(Actor::monster(0, 0, 50));
        s.add_actor(Actor::crate_box(1, 0));
        s.add_actor(Actor::crate_box(0, 1));
        s.add_actor(Actor::crate_box(2, 2));
        s.set_player(Actor::player(3, 3));

        s.player_event(Direction::UpLeft);
        let events = step(&mut s);
        assert!(events.contains(&GameEvent::BoxPushed { x: 1, y: 1 }));
        // the monster already had its turn this tick
        assert!(s.contains(m));

        let events = step(&mut s);
        assert!(events.contains(&GameEvent::MonsterKilled { x: 0, y: 0 }));
        assert!(s.game_over_win());
    }

    #[test]
    fn monster_reaching_player_ends_game() {
        let mut s = stage(&[
            "M...",
            "....",
            "..P.",
            "....",
        ]);
        step(&mut s);
        assert!(!s.game_over_lose());
        let events = step(&mut s);
        assert!(s.game_over_lose());
        assert!(events.contains(&GameEvent::PlayerCaught { x: 2, y: 2 }));
    }
}
