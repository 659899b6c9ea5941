//! Frameloom main entry point.
//!
//! Three ways to drive the engine:
//!
//! - `frameloom script.lua` runs a Lua script (feature `lua`). The script sets
//!   up entities and timers at load time; the host then calls its
//!   `game_update(dt)` function once per frame.
//! - `frameloom --ops requests.jsonl` replays JSON requests, one per line,
//!   and prints each response.
//! - `frameloom` with neither runs the built-in square demo.
//!
//! Configuration is read from `./config.ini` (see
//! [`EngineConfig`](frameloom::resources::engineconfig::EngineConfig)); CLI
//! flags override it.
//!
//! # Running
//!
//! ```sh
//! cargo run --release -- scripts/square_game.lua --frames 600
//! ```

use std::fs;
use std::path::PathBuf;

use clap::Parser;
use log::{error, info, warn};

use frameloom::Engine;
use frameloom::game::run_square_game;
use frameloom::resources::clock::{MIN_TARGET_FPS, is_valid_target_fps};
use frameloom::resources::engineconfig::EngineConfig;

#[derive(Parser)]
#[command(
    version,
    about = "A frame-stepped 2D simulation engine driven by scripts"
)]
struct Cli {
    /// Lua script to run. Without one (and without --ops) the built-in demo runs.
    script: Option<PathBuf>,

    /// INI configuration file.
    #[arg(long, value_name = "PATH", default_value = "./config.ini")]
    config: PathBuf,

    /// Stop after this many frames.
    #[arg(long, value_name = "N")]
    frames: Option<u64>,

    /// Override the configured target frame rate.
    #[arg(long, value_name = "FPS")]
    target_fps: Option<f32>,

    /// Replay a JSON-lines file of operation requests and exit.
    #[arg(long, value_name = "PATH")]
    ops: Option<PathBuf>,
}

fn replay_ops(config: &EngineConfig, path: &PathBuf) -> Result<(), String> {
    let contents = fs::read_to_string(path)
        .map_err(|e| format!("failed to read {}: {e}", path.display()))?;
    let mut engine = Engine::new(config);
    engine.init_engine(config.target_fps);

    for (line_no, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let response = engine.execute_json(line);
        println!("{response}");
        if !engine.is_running() {
            info!("quit requested at line {}", line_no + 1);
            break;
        }
    }

    engine.shutdown();
    Ok(())
}

#[cfg(feature = "lua")]
fn run_lua(config: &EngineConfig, script: &PathBuf, frames: Option<u64>) -> Result<(), String> {
    use frameloom::resources::lua_runtime::LuaRuntime;

    let runtime = LuaRuntime::new(config).map_err(|e| format!("failed to start Lua: {e}"))?;
    runtime
        .engine(|engine| {
            engine.attach_ui_console();
            engine.init_engine(config.target_fps);
        })
        .map_err(|e| e.to_string())?;

    let path = script.to_string_lossy();
    runtime
        .run_script(&path)
        .map_err(|e| format!("script {path} failed: {e}"))?;

    runtime.run(frames);
    runtime.shutdown();
    Ok(())
}

#[cfg(not(feature = "lua"))]
fn run_lua(_config: &EngineConfig, script: &PathBuf, _frames: Option<u64>) -> Result<(), String> {
    Err(format!(
        "cannot run {}: built without the `lua` feature",
        script.display()
    ))
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let mut config = EngineConfig::with_path(&cli.config);
    if let Err(e) = config.load_from_file() {
        warn!("{e}; using defaults");
    }
    if let Some(fps) = cli.target_fps {
        if is_valid_target_fps(fps) {
            config.target_fps = fps;
        } else {
            warn!("ignoring --target-fps {fps}: must be at least {MIN_TARGET_FPS}");
        }
    }

    let result = if let Some(ops) = &cli.ops {
        replay_ops(&config, ops)
    } else if let Some(script) = &cli.script {
        run_lua(&config, script, cli.frames)
    } else {
        info!("No script given; running the built-in square demo");
        run_square_game(&config, cli.frames);
        Ok(())
    };

    if let Err(e) = result {
        error!("{e}");
        std::process::exit(1);
    }
}
