/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD), or from
/// an explicit `--config` path. Every key has a default, so a missing file
/// or a partial one still yields a playable setup.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::domain::actor::Delay;
use crate::error::GameError;

/// Largest accepted grid side.
pub const MAX_DIMENSION: i32 = 1000;

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub speed: SpeedConfig,
    pub stage: StageConfig,
    pub gamepad: GamepadConfig,
    /// Fixed placement seed. `None` draws a fresh one per game.
    pub seed: Option<u64>,
    /// Hand-made layout replacing random placement.
    pub layout_file: Option<PathBuf>,
}

#[derive(Clone, Debug)]
pub struct SpeedConfig {
    pub tick_rate_ms: u64,
    pub default_delay: u32,   // monster delay when a spawn gives none
}

#[derive(Clone, Debug)]
pub struct StageConfig {
    pub width: i32,
    pub height: i32,
    pub walls: usize,
    pub sticky_boxes: usize,
    pub boxes: usize,
    pub player: (i32, i32),
    pub monsters: Vec<MonsterSpawn>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub struct MonsterSpawn {
    pub x: i32,
    pub y: i32,
    #[serde(default)]
    pub delay: Option<u32>,
}

#[derive(Clone, Debug)]
pub struct GamepadConfig {
    pub confirm: Vec<String>,
    pub cancel: Vec<String>,
    pub restart: Vec<String>,
    pub pause: Vec<String>,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    speed: TomlSpeed,
    #[serde(default)]
    stage: TomlStage,
    #[serde(default)]
    gamepad: TomlGamepad,
    #[serde(default)]
    general: TomlGeneral,
}

#[derive(Deserialize, Debug)]
struct TomlSpeed {
    #[serde(default = "default_tick_rate")]
    tick_rate_ms: u64,
    #[serde(default = "default_delay")]
    default_delay: u32,
}

#[derive(Deserialize, Debug)]
struct TomlStage {
    #[serde(default = "default_dimension")]
    width: i32,
    #[serde(default = "default_dimension")]
    height: i32,
    #[serde(default = "default_walls")]
    walls: usize,
    #[serde(default = "default_sticky_boxes")]
    sticky_boxes: usize,
    #[serde(default = "default_boxes")]
    boxes: usize,
    #[serde(default)]
    player: (i32, i32),
    #[serde(default = "default_monsters")]
    monsters: Vec<MonsterSpawn>,
}

#[derive(Deserialize, Debug)]
struct TomlGamepad {
    #[serde(default = "default_confirm")]
    confirm: Vec<String>,
    #[serde(default = "default_cancel")]
    cancel: Vec<String>,
    #[serde(default = "default_restart")]
    restart: Vec<String>,
    #[serde(default = "default_pause")]
    pause: Vec<String>,
}

#[derive(Deserialize, Debug, Default)]
struct TomlGeneral {
    #[serde(default)]
    seed: Option<u64>,
    #[serde(default)]
    layout_file: Option<String>,
}

// ── Defaults ──

fn default_tick_rate() -> u64 { 100 }
fn default_delay() -> u32 { Delay::DEFAULT_PERIOD }
fn default_dimension() -> i32 { 20 }
fn default_walls() -> usize { 10 }
fn default_sticky_boxes() -> usize { 10 }
fn default_boxes() -> usize { 100 }

fn default_monsters() -> Vec<MonsterSpawn> {
    [(0, 3, 1), (7, 4, 5), (4, 10, 3), (5, 20, 2)]
        .into_iter()
        .map(|(x, y, d)| MonsterSpawn { x, y, delay: Some(d) })
        .collect()
}

fn default_confirm() -> Vec<String> { vec!["Start".into(), "A".into()] }
fn default_cancel() -> Vec<String> { vec!["Select".into()] }
fn default_restart() -> Vec<String> { vec!["Y".into()] }
fn default_pause() -> Vec<String> { vec!["B".into()] }

impl Default for TomlSpeed {
    fn default() -> Self {
        TomlSpeed {
            tick_rate_ms: default_tick_rate(),
            default_delay: default_delay(),
        }
    }
}

impl Default for TomlStage {
    fn default() -> Self {
        TomlStage {
            width: default_dimension(),
            height: default_dimension(),
            walls: default_walls(),
            sticky_boxes: default_sticky_boxes(),
            boxes: default_boxes(),
            player: (0, 0),
            monsters: default_monsters(),
        }
    }
}

impl Default for TomlGamepad {
    fn default() -> Self {
        TomlGamepad {
            confirm: default_confirm(),
            cancel: default_cancel(),
            restart: default_restart(),
            pause: default_pause(),
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig::from_toml(TomlConfig::default(), &[])
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config.
    ///
    /// With an explicit path, a missing or malformed file is an error.
    /// Otherwise search (1) exe directory, (2) current working directory;
    /// a malformed file there is logged and replaced by defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, GameError> {
        let search_dirs = candidate_dirs();

        let toml_cfg = match explicit {
            Some(path) => {
                let text = std::fs::read_to_string(path).map_err(|source| GameError::Read {
                    path: path.to_path_buf(),
                    source,
                })?;
                toml::from_str::<TomlConfig>(&text).map_err(|source| GameError::Config {
                    path: path.to_path_buf(),
                    source,
                })?
            }
            None => discover_toml(&search_dirs),
        };

        Ok(GameConfig::from_toml(toml_cfg, &search_dirs))
    }

    /// Parse config text directly (no search, no fallback).
    pub fn from_str(text: &str) -> Result<Self, toml::de::Error> {
        let cfg = toml::from_str::<TomlConfig>(text)?;
        Ok(GameConfig::from_toml(cfg, &[]))
    }

    fn from_toml(cfg: TomlConfig, search_dirs: &[PathBuf]) -> Self {
        let layout_file = cfg.general.layout_file.map(|name| resolve_path(&name, search_dirs));

        GameConfig {
            speed: SpeedConfig {
                tick_rate_ms: cfg.speed.tick_rate_ms.max(1),
                default_delay: cfg.speed.default_delay.max(1),
            },
            stage: StageConfig {
                width: cfg.stage.width.clamp(1, MAX_DIMENSION),
                height: cfg.stage.height.clamp(1, MAX_DIMENSION),
                walls: cfg.stage.walls,
                sticky_boxes: cfg.stage.sticky_boxes,
                boxes: cfg.stage.boxes,
                player: cfg.stage.player,
                monsters: cfg.stage.monsters,
            },
            gamepad: GamepadConfig {
                confirm: cfg.gamepad.confirm,
                cancel: cfg.gamepad.cancel,
                restart: cfg.gamepad.restart,
                pause: cfg.gamepad.pause,
            },
            seed: cfg.general.seed,
            layout_file,
        }
    }
}

/// Absolute paths stay as-is; relative ones are looked up in the search
/// dirs and fall back to CWD-relative.
fn resolve_path(name: &str, search_dirs: &[PathBuf]) -> PathBuf {
    let path = PathBuf::from(name);
    if path.is_absolute() {
        return path;
    }
    search_dirs.iter()
        .map(|d| d.join(name))
        .find(|p| p.is_file())
        .unwrap_or(path)
}

/// Candidate directories to search: exe dir + CWD (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Search for config.toml in candidate directories.
fn discover_toml(search_dirs: &[PathBuf]) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if !path.exists() {
            continue;
        }
        match std::fs::read_to_string(&path) {
            Ok(text) => match toml::from_str::<TomlConfig>(&text) {
                Ok(cfg) => {
                    log::debug!("loaded {}", path.display());
                    return cfg;
                }
                Err(e) => {
                    log::warn!("{}: parse error, using defaults: {e}", path.display());
                    return TomlConfig::default();
                }
            },
            Err(e) => log::warn!("could not read {}: {e}", path.display()),
        }
    }
    TomlConfig::default()
}
