/// WorldState: the complete snapshot of a running session.
///
/// ## Phases
///
///   Title ──confirm──▶ Playing ──no monsters──▶ Won
///                         │
///                         └──player caught──▶ Lost
///
/// Won and Lost return to Playing on "play again" (a fresh stage) or to
/// Title on cancel. `paused` freezes `advance` without leaving Playing.
///
/// The stage itself knows nothing about phases; `advance` runs one step
/// and turns the stage's terminal conditions into phase changes. A win is
/// checked first, so a tick that kills the last monster and the player at
/// once counts as a win.

use crate::domain::actor::Direction;
use super::event::GameEvent;
use super::stage::Stage;
use super::step;

pub const WIN_MESSAGE: &str = "All monsters died, You WIN!";
pub const LOSE_MESSAGE: &str = "Game Over, you DIED!";

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    Title,
    Playing,
    Won,
    Lost,
}

pub struct WorldState {
    pub stage: Stage,
    pub phase: Phase,
    pub paused: bool,

    // ── Game tracking ──
    pub tick: u64,
    /// Seed the current stage was placed with.
    pub seed: u64,
    pub monsters_total: usize,
    pub monsters_killed: usize,
    pub boxes_pushed: u32,
    pub games_won: u32,
    pub games_lost: u32,

    // ── UI ──
    pub message: String,
    pub message_timer: u32,
    pub anim_tick: u32,
}

// ── Construction ──

impl WorldState {
    pub fn new() -> Self {
        WorldState {
            stage: Stage::new(1, 1),
            phase: Phase::Title,
            paused: false,
            tick: 0,
            seed: 0,
            monsters_total: 0,
            monsters_killed: 0,
            boxes_pushed: 0,
            games_won: 0,
            games_lost: 0,
            message: String::new(),
            message_timer: 0,
            anim_tick: 0,
        }
    }

    /// Begin a game on a freshly built stage. Session totals survive.
    pub fn start(&mut self, stage: Stage, seed: u64) {
        self.monsters_total = stage.monster_count();
        self.stage = stage;
        self.seed = seed;
        self.phase = Phase::Playing;
        self.paused = false;
        self.tick = 0;
        self.monsters_killed = 0;
        self.boxes_pushed = 0;
        self.anim_tick = 0;
        self.message.clear();
        self.message_timer = 0;
    }

    pub fn return_to_title(&mut self) {
        self.phase = Phase::Title;
        self.paused = false;
        self.anim_tick = 0;
        self.message.clear();
        self.message_timer = 0;
    }

    pub fn set_message(&mut self, msg: &str, duration: u32) {
        self.message = msg.to_string();
        self.message_timer = duration;
    }

    pub fn monsters_left(&self) -> usize {
        self.stage.monster_count()
    }
}

impl Default for WorldState {
    fn default() -> Self {
        WorldState::new()
    }
}

// ── Simulation ──

impl WorldState {
    /// Forward `input` to the player and run one stage step.
    ///
    /// Does nothing outside Playing or while paused.
    pub fn advance(&mut self, input: Direction) -> Vec<GameEvent> {
        if self.phase != Phase::Playing || self.paused {
            return Vec::new();
        }

        if !input.is_none() {
            self.stage.player_event(input);
        }
        let mut events = step::step(&mut self.stage);
        self.tick += 1;

        for event in &events {
            match event {
                GameEvent::MonsterKilled { .. } => self.monsters_killed += 1,
                GameEvent::BoxPushed { .. } => self.boxes_pushed += 1,
                _ => {}
            }
        }

        if self.stage.game_over_win() {
            log::info!("stage cleared after {} ticks", self.tick);
            self.phase = Phase::Won;
            self.games_won += 1;
            self.anim_tick = 0;
            self.set_message(WIN_MESSAGE, 0);
            events.push(GameEvent::StageCleared);
        } else if self.stage.game_over_lose() {
            log::info!("player caught after {} ticks", self.tick);
            self.phase = Phase::Lost;
            self.games_lost += 1;
            self.anim_tick = 0;
            self.set_message(LOSE_MESSAGE, 0);
        }

        events
    }

    /// Per-frame timers that run in every phase, paused or not.
    pub fn tick_timers(&mut self) {
        self.anim_tick = self.anim_tick.wrapping_add(1);
        if self.message_timer > 0 {
            self.message_timer -= 1;
            if self.message_timer == 0 {
                self.message.clear();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::actor::Actor;
    use crate::sim::level::stage_from_rows;

    fn playing(rows: &[&str]) -> WorldState {
        let mut w = WorldState::new();
        w.start(stage_from_rows(rows, 1).expect("valid"), 0);
        w
    }

    #[test]
    fn new_world_starts_on_title() {
        let mut w = WorldState::new();
        assert_eq!(w.phase, Phase::Title);
        assert!(w.advance(Direction::Right).is_empty());
        assert_eq!(w.tick, 0);
    }

    #[test]
    fn advance_moves_player() {
        let mut w = playing(&["P...", "...M"]);
        w.advance(Direction::Right);
        assert_eq!(w.stage.player().map(|p| p.position()), Some((1, 0)));
        assert_eq!(w.tick, 1);
        assert_eq!(w.phase, Phase::Playing);
    }

    #[test]
    fn paused_world_does_not_step() {
        let mut w = playing(&["P...", "...M"]);
        w.paused = true;
        assert!(w.advance(Direction::Right).is_empty());
        assert_eq!(w.stage.player().map(|p| p.position()), Some((0, 0)));
        assert_eq!(w.tick, 0);
    }

    #[test]
    fn killing_last_monster_wins() {
        let mut w = playing(&[
            "bbb..",
            "bMb..",
            "bbb.P",
        ]);
        assert_eq!(w.monsters_total, 1);
        let events = w.advance(Direction::None);
        assert_eq!(w.phase, Phase::Won);
        assert_eq!(w.monsters_killed, 1);
        assert_eq!(w.games_won, 1);
        assert_eq!(w.message, WIN_MESSAGE);
        assert_eq!(events.last(), Some(&GameEvent::StageCleared));
    }

    #[test]
    fn walking_into_monster_loses() {
        let mut w = WorldState::new();
        let mut stage = Stage::new(4, 1);
        stage.set_player(Actor::player(0, 0));
        stage.add_actor(Actor::monster(1, 0, 100));
        w.start(stage, 9);
        w.advance(Direction::Right);
        assert_eq!(w.phase, Phase::Lost);
        assert_eq!(w.message, LOSE_MESSAGE);
        assert_eq!(w.seed, 9);
        // no more stepping once the game is over
        assert!(w.advance(Direction::Left).is_empty());
    }

    #[test]
    fn win_takes_precedence_over_loss() {
        let mut w = WorldState::new();
        let stage = Stage::new(3, 3);
        w.start(stage, 0);
        // neither a player nor a monster left
        w.advance(Direction::None);
        assert_eq!(w.phase, Phase::Won);
    }

    #[test]
    fn box_pushes_are_counted() {
        let mut w = playing(&["Pb..", "...M"]);
        w.advance(Direction::Right);
        assert_eq!(w.boxes_pushed, 1);
    }

    #[test]
    fn start_resets_per_game_stats_only() {
        let mut w = playing(&["bbb.", "bMb.", "bbbP"]);
        w.advance(Direction::None);
        assert_eq!(w.phase, Phase::Won);
        w.start(stage_from_rows(&["P..M"], 1).expect("valid"), 1);
        assert_eq!(w.phase, Phase::Playing);
        assert_eq!(w.monsters_killed, 0);
        assert_eq!(w.games_won, 1);
        assert!(w.message.is_empty());
    }

    #[test]
    fn message_timer_expires() {
        let mut w = WorldState::new();
        w.set_message("hello", 2);
        w.tick_timers();
        assert_eq!(w.message, "hello");
        w.tick_timers();
        assert!(w.message.is_empty());
    }
}
