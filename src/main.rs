/// Entry point and game loop.

mod config;
mod domain;
mod error;
mod logging;
mod sim;
mod ui;

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::Parser;

use config::GameConfig;
use domain::actor::Direction;
use error::GameError;
use sim::level;
use sim::world::{Phase, WorldState};
use ui::gamepad::GamepadState;
use ui::input::{InputState, KEYS_CONFIRM, KEYS_PAUSE, KEYS_QUIT, KEYS_RESTART};
use ui::renderer::Renderer;
use ui::sound::{play_events, SoundEngine};

use crossterm::event::KeyCode;

const FRAME_SLEEP: Duration = Duration::from_millis(5);

/// Push boxes to trap every monster before one catches you.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file (default: config.toml next to the binary or in the CWD)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Seed for random placement, to replay the same stage
    #[arg(long)]
    seed: Option<u64>,

    /// Play a hand-made layout instead of a random stage
    #[arg(long, value_name = "PATH")]
    layout: Option<PathBuf>,

    /// Write log output to this file instead of stderr
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(world) => {
            println!();
            println!("Thanks for playing Warehouse Wars!");
            if world.games_won + world.games_lost > 0 {
                println!("Games won: {}  lost: {}", world.games_won, world.games_lost);
                println!("Last stage seed: {}", world.seed);
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("{e}");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<WorldState, GameError> {
    let logs = logging::init(cli.verbose, cli.log_file.as_deref())?;

    let mut config = GameConfig::load(cli.config.as_deref())?;
    if cli.seed.is_some() {
        config.seed = cli.seed;
    }
    if cli.layout.is_some() {
        config.layout_file = cli.layout;
    }
    // Fail on a broken layout before the terminal is taken over.
    if let Some(path) = &config.layout_file {
        level::load_layout(path, config.speed.default_delay)?;
    }

    let mut world = WorldState::new();
    let mut renderer = Renderer::new();
    logs.hold();
    if let Err(e) = renderer.init() {
        logs.release();
        return Err(e.into());
    }

    let sound = SoundEngine::new();

    let result = game_loop(&mut world, &mut renderer, sound.as_ref(), &config);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }
    logs.release();

    result.map(|()| world)
}

fn game_loop(
    world: &mut WorldState,
    renderer: &mut Renderer,
    sound: Option<&SoundEngine>,
    config: &GameConfig,
) -> Result<(), GameError> {
    let mut kb = InputState::new();
    let mut gp = GamepadState::new();
    gp.load_button_config(&config.gamepad);
    let tick_rate = Duration::from_millis(config.speed.tick_rate_ms);
    let mut last_tick = Instant::now();

    // Latest movement request since the previous tick.
    let mut pending = Direction::None;

    loop {
        kb.drain_events();
        gp.update();

        if kb.ctrl_c_pressed() {
            break;
        }
        if handle_meta(world, &kb, &gp, config)? {
            break;
        }

        if world.phase == Phase::Playing && !world.paused {
            for dir in [kb.last_direction(), gp.direction_pressed()] {
                if !dir.is_none() {
                    pending = dir;
                }
            }
        }

        if last_tick.elapsed() >= tick_rate {
            let events = world.advance(std::mem::take(&mut pending));
            for event in &events {
                log::debug!("tick {}: {event:?}", world.tick);
            }
            play_events(sound, &events);
            world.tick_timers();
            last_tick = Instant::now();
        }

        renderer.render(world)?;
        std::thread::sleep(FRAME_SLEEP);
    }

    Ok(())
}

/// Build a fresh stage from config and start playing on it.
fn start_new_game(world: &mut WorldState, config: &GameConfig) -> Result<(), GameError> {
    let (stage, seed) = level::build_stage(config)?;
    log::info!(
        "new game: {}x{}, {} monsters, seed {seed}",
        stage.width(), stage.height(), stage.monster_count(),
    );
    world.start(stage, seed);
    Ok(())
}

/// Phase transitions and other non-movement keys. Returns true to quit.
fn handle_meta(
    world: &mut WorldState,
    kb: &InputState,
    gp: &GamepadState,
    config: &GameConfig,
) -> Result<bool, GameError> {
    let confirm = kb.any_pressed(KEYS_CONFIRM) || gp.confirm_pressed();
    let restart = kb.any_pressed(KEYS_RESTART) || gp.restart_pressed();
    let esc = kb.was_pressed(KeyCode::Esc) || gp.cancel_pressed();
    let quit = kb.any_pressed(KEYS_QUIT) || gp.cancel_pressed();

    match world.phase {
        // ── Title Screen ──
        Phase::Title => {
            if confirm {
                start_new_game(world, config)?;
            } else if quit {
                return Ok(true);
            }
        }

        // ── Playing ──
        Phase::Playing => {
            if kb.any_pressed(KEYS_PAUSE) || gp.pause_pressed() {
                world.paused = !world.paused;
                log::debug!("paused: {}", world.paused);
            } else if esc {
                world.return_to_title();
            } else if restart {
                start_new_game(world, config)?;
                world.set_message("Stage restarted", 20);
            }
        }

        // ── End screens ──
        Phase::Won | Phase::Lost => {
            if confirm || restart {
                start_new_game(world, config)?;
            } else if quit {
                return Ok(true);
            }
        }
    }

    Ok(false)
}
