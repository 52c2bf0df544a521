/// Stage construction: random placement or a hand-made layout file.
///
/// ## Random placement (default)
///   Player at `stage.player`, then each configured monster spawn (clamped
///   onto the grid, skipped when the cell is taken), then
///   `walls`, `sticky_boxes` and `boxes` actors on uniformly chosen free
///   cells. The same seed always yields the same stage.
///
/// ## Layout format (`.txt`):
///   One character per cell, one line per row. Lines starting with `;` are
///   comments. Short rows are padded with empty cells.
///
/// ## Cell legend:
///   '#' = Wall         'b' = Box        's' = Sticky box
///   'M' = Monster      'P' = Player     '.' / ' ' = Empty

use std::path::Path;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::GameConfig;
use crate::domain::actor::Actor;
use crate::error::GameError;
use super::stage::Stage;

// ══════════════════════════════════════════════════════════════
// Public API
// ══════════════════════════════════════════════════════════════

/// Build the stage for a new game. Returns the stage and the seed used
/// for placement (drawn fresh when none is configured).
pub fn build_stage(config: &GameConfig) -> Result<(Stage, u64), GameError> {
    let seed = config.seed.unwrap_or_else(|| StdRng::from_entropy().gen());

    if let Some(path) = &config.layout_file {
        let stage = load_layout(path, config.speed.default_delay)?;
        log::info!("loaded layout {} ({}x{})", path.display(), stage.width(), stage.height());
        return Ok((stage, seed));
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let stage = populate(config, &mut rng);
    log::info!("random stage with seed {seed}: {} actors", stage.len());
    Ok((stage, seed))
}

/// Fill a fresh stage according to the `[stage]` config section.
pub fn populate<R: Rng>(config: &GameConfig, rng: &mut R) -> Stage {
    let sc = &config.stage;
    let mut stage = Stage::new(sc.width, sc.height);

    let (px, py) = sc.player;
    if stage.is_in_bounds(px, py) {
        stage.set_player(Actor::player(px, py));
    } else {
        log::warn!("player spawn ({px}, {py}) is outside the grid, using (0, 0)");
        stage.set_player(Actor::player(0, 0));
    }

    for spawn in &sc.monsters {
        // Spawns past the edge enter at the nearest edge cell.
        let x = spawn.x.clamp(0, stage.width() - 1);
        let y = spawn.y.clamp(0, stage.height() - 1);
        if (x, y) != (spawn.x, spawn.y) {
            log::debug!("monster spawn ({}, {}) moved onto the grid at ({x}, {y})", spawn.x, spawn.y);
        }
        if !stage.is_free(x, y) {
            log::warn!("monster spawn ({x}, {y}) is occupied, skipped");
            continue;
        }
        let delay = spawn.delay.unwrap_or(config.speed.default_delay);
        stage.add_actor(Actor::monster(x, y, delay));
    }

    let mut free = free_cells(&stage);
    scatter(&mut stage, &mut free, rng, sc.walls, Actor::wall);
    scatter(&mut stage, &mut free, rng, sc.sticky_boxes, Actor::sticky_box);
    scatter(&mut stage, &mut free, rng, sc.boxes, Actor::crate_box);

    stage
}

/// Read and parse a layout file. Exactly one player is required.
pub fn load_layout(path: &Path, default_delay: u32) -> Result<Stage, GameError> {
    let text = std::fs::read_to_string(path).map_err(|source| GameError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let stage = parse_layout(&text, default_delay)?;
    if stage.player_id().is_none() {
        return Err(GameError::Layout(format!("{}: no player ('P')", path.display())));
    }
    Ok(stage)
}

/// Parse layout text, skipping `;` comment lines and trailing blank rows.
pub fn parse_layout(text: &str, default_delay: u32) -> Result<Stage, GameError> {
    let mut rows: Vec<&str> = text
        .lines()
        .filter(|line| !line.starts_with(';'))
        .collect();

    while rows.last().map_or(false, |r| r.trim().is_empty()) {
        rows.pop();
    }

    stage_from_rows(&rows, default_delay)
}

/// Build a stage from map rows. Width is the longest row; at most one
/// player is allowed.
pub fn stage_from_rows(rows: &[&str], monster_delay: u32) -> Result<Stage, GameError> {
    let height = rows.len();
    let width = rows.iter().map(|r| r.chars().count()).max().unwrap_or(0);
    if width == 0 || height == 0 {
        return Err(GameError::Layout("layout has no cells".into()));
    }

    let mut stage = Stage::new(width as i32, height as i32);

    for (y, row) in rows.iter().enumerate() {
        for (x, ch) in row.chars().enumerate() {
            let (x, y) = (x as i32, y as i32);
            match ch {
                '#' => { stage.add_actor(Actor::wall(x, y)); }
                'b' => { stage.add_actor(Actor::crate_box(x, y)); }
                's' => { stage.add_actor(Actor::sticky_box(x, y)); }
                'M' => { stage.add_actor(Actor::monster(x, y, monster_delay)); }
                'P' => {
                    if stage.player_id().is_some() {
                        return Err(GameError::Layout(format!(
                            "second player at ({x}, {y})"
                        )));
                    }
                    stage.set_player(Actor::player(x, y));
                }
                '.' | ' ' => {}
                other => log::warn!("unknown layout char {other:?} at ({x}, {y}), treated as empty"),
            }
        }
    }

    Ok(stage)
}

// ══════════════════════════════════════════════════════════════
// Placement helpers
// ══════════════════════════════════════════════════════════════

/// Every unoccupied cell, row-major.
fn free_cells(stage: &Stage) -> Vec<(i32, i32)> {
    let mut cells = Vec::with_capacity(stage.width() as usize * stage.height() as usize);
    for y in 0..stage.height() {
        for x in 0..stage.width() {
            if stage.is_free(x, y) {
                cells.push((x, y));
            }
        }
    }
    cells
}

/// Place `count` actors on random free cells, consuming them from `free`.
fn scatter<R: Rng>(
    stage: &mut Stage,
    free: &mut Vec<(i32, i32)>,
    rng: &mut R,
    count: usize,
    make: fn(i32, i32) -> Actor,
) {
    for placed in 0..count {
        if free.is_empty() {
            log::warn!("grid is full, placed {placed} of {count}");
            return;
        }
        let (x, y) = free.swap_remove(rng.gen_range(0..free.len()));
        stage.add_actor(make(x, y));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MonsterSpawn;
    use std::io::Write;

    fn small_config() -> GameConfig {
        let mut cfg = GameConfig::default();
        cfg.stage.width = 6;
        cfg.stage.height = 5;
        cfg.stage.walls = 3;
        cfg.stage.sticky_boxes = 2;
        cfg.stage.boxes = 4;
        cfg.stage.monsters = vec![MonsterSpawn { x: 3, y: 3, delay: None }];
        cfg
    }

    fn labels_at(stage: &Stage) -> Vec<(i32, i32, &'static str)> {
        stage.actors().map(|(_, a)| (a.x, a.y, a.label())).collect()
    }

    #[test]
    fn rows_map_to_actors_in_row_major_order() {
        let s = stage_from_rows(&["P#b", "sM."], 4).expect("valid");
        assert_eq!((s.width(), s.height()), (3, 2));
        assert_eq!(labels_at(&s), vec![
            (0, 0, "player"),
            (1, 0, "wall"),
            (2, 0, "box"),
            (0, 1, "sticky box"),
            (1, 1, "monster"),
        ]);
        let m = s.get_actor(1, 1).and_then(|id| s.actor(id)).expect("monster");
        assert_eq!(m.delay.period(), 4);
    }

    #[test]
    fn width_is_longest_row() {
        let s = stage_from_rows(&["P", "....", ".."], 1).expect("valid");
        assert_eq!((s.width(), s.height()), (4, 3));
    }

    #[test]
    fn two_players_rejected() {
        let err = stage_from_rows(&["P.P"], 1).err();
        assert!(matches!(err, Some(GameError::Layout(_))));
    }

    #[test]
    fn empty_rows_rejected() {
        assert!(stage_from_rows(&[], 1).is_err());
        assert!(stage_from_rows(&["", ""], 1).is_err());
    }

    #[test]
    fn comments_and_trailing_blanks_are_ignored() {
        let text = "; a comment\nP.b\n; another\n.M.\n\n\n";
        let s = parse_layout(text, 2).expect("valid");
        assert_eq!((s.width(), s.height()), (3, 2));
        assert_eq!(s.monster_count(), 1);
    }

    #[test]
    fn bundled_arena_layout_parses() {
        let s = parse_layout(include_str!("../../layouts/arena.txt"), 5).expect("valid");
        assert_eq!((s.width(), s.height()), (20, 20));
        assert_eq!(s.player().map(|p| p.position()), Some((0, 0)));
        assert_eq!(s.monster_count(), 5);
    }

    #[test]
    fn layout_file_needs_a_player() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "..M\n.b.").expect("write");
        let err = load_layout(file.path(), 5).err();
        assert!(matches!(err, Some(GameError::Layout(_))));
    }

    #[test]
    fn layout_file_loads() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "P..\n.sM").expect("write");
        let s = load_layout(file.path(), 5).expect("valid");
        assert!(s.player().is_some());
        assert_eq!(s.len(), 3);
    }

    #[test]
    fn missing_layout_file_is_read_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let err = load_layout(&dir.path().join("none.txt"), 5).err();
        assert!(matches!(err, Some(GameError::Read { .. })));
    }

    #[test]
    fn populate_places_every_category() {
        let cfg = small_config();
        let s = populate(&cfg, &mut StdRng::seed_from_u64(7));
        let count = |label: &str| s.actors().filter(|(_, a)| a.label() == label).count();
        assert_eq!(count("player"), 1);
        assert_eq!(count("monster"), 1);
        assert_eq!(count("wall"), 3);
        assert_eq!(count("sticky box"), 2);
        assert_eq!(count("box"), 4);
        assert_eq!(s.player().map(|p| p.position()), Some((0, 0)));
    }

    #[test]
    fn populate_never_stacks_actors() {
        let cfg = small_config();
        let s = populate(&cfg, &mut StdRng::seed_from_u64(99));
        let mut seen = std::collections::HashSet::new();
        for (_, a) in s.actors() {
            assert!(seen.insert(a.position()), "two actors at {:?}", a.position());
            assert!(s.is_in_bounds(a.x, a.y));
        }
    }

    #[test]
    fn same_seed_same_stage() {
        let cfg = small_config();
        let a = populate(&cfg, &mut StdRng::seed_from_u64(1234));
        let b = populate(&cfg, &mut StdRng::seed_from_u64(1234));
        assert_eq!(labels_at(&a), labels_at(&b));
    }

    #[test]
    fn occupied_monster_spawns_are_skipped() {
        let mut cfg = small_config();
        cfg.stage.monsters = vec![
            MonsterSpawn { x: 0, y: 0, delay: Some(1) },   // on the player
            MonsterSpawn { x: 2, y: 2, delay: Some(9) },
            MonsterSpawn { x: 2, y: 2, delay: Some(1) },   // taken by the one above
        ];
        let s = populate(&cfg, &mut StdRng::seed_from_u64(3));
        assert_eq!(s.monster_count(), 1);
        let m = s.get_actor(2, 2).and_then(|id| s.actor(id)).expect("monster");
        assert_eq!(m.delay.period(), 9);
    }

    #[test]
    fn off_grid_monster_spawns_enter_at_the_edge() {
        let mut cfg = small_config();
        cfg.stage.monsters = vec![
            MonsterSpawn { x: 6, y: 1, delay: Some(1) },
            MonsterSpawn { x: -3, y: 9, delay: Some(1) },
            MonsterSpawn { x: 9, y: 1, delay: Some(1) },   // clamps onto the first
        ];
        let s = populate(&cfg, &mut StdRng::seed_from_u64(3));
        assert_eq!(s.monster_count(), 2);
        for (x, y) in [(5, 1), (0, 4)] {
            let at = s.get_actor(x, y).and_then(|id| s.actor(id));
            assert!(at.is_some_and(|a| a.is_monster()), "no monster at ({x}, {y})");
        }
    }

    #[test]
    fn full_grid_stops_placement() {
        let mut cfg = small_config();
        cfg.stage.width = 3;
        cfg.stage.height = 3;
        cfg.stage.monsters.clear();
        cfg.stage.boxes = 100;
        let s = populate(&cfg, &mut StdRng::seed_from_u64(5));
        assert_eq!(s.len(), 9);
    }

    #[test]
    fn default_config_plays_with_four_monsters() {
        let cfg = GameConfig::default();
        let s = populate(&cfg, &mut StdRng::seed_from_u64(0));
        assert_eq!(s.monster_count(), 4);
        assert_eq!(s.len(), 1 + 4 + 10 + 10 + 100);
        // (5, 20) lies just below a 20x20 grid
        let m = s.get_actor(5, 19).and_then(|id| s.actor(id));
        assert!(m.is_some_and(|a| a.is_monster()));
    }

    #[test]
    fn build_stage_reports_configured_seed() {
        let mut cfg = small_config();
        cfg.seed = Some(77);
        let (s, seed) = build_stage(&cfg).expect("builds");
        assert_eq!(seed, 77);
        let again = populate(&cfg, &mut StdRng::seed_from_u64(77));
        assert_eq!(labels_at(&s), labels_at(&again));
    }
}
