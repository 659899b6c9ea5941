//! Engine configuration resource.
//!
//! Loaded from an INI file; missing files or keys keep safe defaults.
//!
//! # Configuration File Format
//!
//! ```ini
//! [engine]
//! target_fps = 60
//! fps_window = 120
//!
//! [window]
//! width = 800
//! height = 600
//!
//! [collision]
//! default_interact = true
//! allow = 0:1, 2:2
//! deny = 1:3
//!
//! [script]
//! update_function = game_update
//! ```

use bevy_ecs::prelude::*;
use configparser::ini::Ini;
use log::info;
use std::path::PathBuf;

use crate::components::hitbox::Layer;
use crate::error::{EngineError, Result};
use crate::resources::clock::{
    DEFAULT_FPS_WINDOW, DEFAULT_TARGET_FPS, MIN_TARGET_FPS, is_valid_target_fps,
};

const DEFAULT_WINDOW_WIDTH: u32 = 800;
const DEFAULT_WINDOW_HEIGHT: u32 = 600;
const DEFAULT_UPDATE_FUNCTION: &str = "game_update";
const DEFAULT_CONFIG_PATH: &str = "./config.ini";

#[derive(Resource, Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub target_fps: f32,
    /// Number of frame deltas averaged by `get_fps`.
    pub fps_window: usize,
    /// Screen bounds used by `BoundsType::Screen`.
    pub window_width: u32,
    pub window_height: u32,
    pub default_interact: bool,
    pub allow_layers: Vec<(Layer, Layer)>,
    pub deny_layers: Vec<(Layer, Layer)>,
    /// Global script function called once per frame after timers, if defined.
    pub update_function: String,
    pub config_path: PathBuf,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse `"0:1, 2:2"` into layer pairs.
fn parse_layer_pairs(raw: &str) -> Result<Vec<(Layer, Layer)>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|item| {
            let (a, b) = item
                .split_once(':')
                .ok_or_else(|| EngineError::Config(format!("expected 'a:b', got '{item}'")))?;
            let a = a
                .trim()
                .parse::<Layer>()
                .map_err(|e| EngineError::Config(format!("bad layer '{a}': {e}")))?;
            let b = b
                .trim()
                .parse::<Layer>()
                .map_err(|e| EngineError::Config(format!("bad layer '{b}': {e}")))?;
            Ok((a, b))
        })
        .collect()
}

impl EngineConfig {
    pub fn new() -> Self {
        Self {
            target_fps: DEFAULT_TARGET_FPS,
            fps_window: DEFAULT_FPS_WINDOW,
            window_width: DEFAULT_WINDOW_WIDTH,
            window_height: DEFAULT_WINDOW_HEIGHT,
            default_interact: true,
            allow_layers: Vec::new(),
            deny_layers: Vec::new(),
            update_function: DEFAULT_UPDATE_FUNCTION.to_string(),
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
        }
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: path.into(),
            ..Self::new()
        }
    }

    /// Load configuration from `config_path`.
    pub fn load_from_file(&mut self) -> Result<()> {
        let mut config = Ini::new();
        config
            .load(&self.config_path)
            .map_err(|e| EngineError::Config(format!("failed to load config file: {e}")))?;
        self.apply(&config)
    }

    /// Load configuration from INI text.
    pub fn load_from_str(&mut self, contents: &str) -> Result<()> {
        let mut config = Ini::new();
        config
            .read(contents.to_string())
            .map_err(|e| EngineError::Config(format!("failed to parse config: {e}")))?;
        self.apply(&config)
    }

    fn apply(&mut self, config: &Ini) -> Result<()> {
        // [engine] section
        if let Some(fps) = config
            .getfloat("engine", "target_fps")
            .map_err(EngineError::Config)?
        {
            if is_valid_target_fps(fps as f32) {
                self.target_fps = fps as f32;
            } else {
                return Err(EngineError::Config(format!(
                    "target_fps must be at least {MIN_TARGET_FPS}, got {fps}"
                )));
            }
        }
        if let Some(window) = config
            .getuint("engine", "fps_window")
            .map_err(EngineError::Config)?
        {
            self.fps_window = (window as usize).max(1);
        }

        // [window] section
        if let Some(width) = config.getuint("window", "width").ok().flatten() {
            self.window_width = width as u32;
        }
        if let Some(height) = config.getuint("window", "height").ok().flatten() {
            self.window_height = height as u32;
        }

        // [collision] section
        if let Some(default) = config
            .getbool("collision", "default_interact")
            .map_err(EngineError::Config)?
        {
            self.default_interact = default;
        }
        if let Some(allow) = config.get("collision", "allow") {
            self.allow_layers = parse_layer_pairs(&allow)?;
        }
        if let Some(deny) = config.get("collision", "deny") {
            self.deny_layers = parse_layer_pairs(&deny)?;
        }

        // [script] section
        if let Some(name) = config.get("script", "update_function") {
            self.update_function = name.trim().to_string();
        }

        info!(
            "Loaded config: target_fps={}, fps_window={}, bounds={}x{}, default_interact={}, {} allow / {} deny overrides",
            self.target_fps,
            self.fps_window,
            self.window_width,
            self.window_height,
            self.default_interact,
            self.allow_layers.len(),
            self.deny_layers.len()
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = EngineConfig::new();
        assert_eq!(cfg.target_fps, 60.0);
        assert_eq!(cfg.window_width, 800);
        assert_eq!(cfg.window_height, 600);
        assert!(cfg.default_interact);
        assert_eq!(cfg.update_function, "game_update");
    }

    #[test]
    fn test_load_from_str_overrides_values() {
        let mut cfg = EngineConfig::new();
        cfg.load_from_str(
            "[engine]\ntarget_fps = 120\nfps_window = 30\n\
             [window]\nwidth = 1024\nheight = 768\n\
             [collision]\ndefault_interact = false\nallow = 0:1, 2:2\ndeny = 3:4\n\
             [script]\nupdate_function = tick\n",
        )
        .unwrap();
        assert_eq!(cfg.target_fps, 120.0);
        assert_eq!(cfg.fps_window, 30);
        assert_eq!((cfg.window_width, cfg.window_height), (1024, 768));
        assert!(!cfg.default_interact);
        assert_eq!(cfg.allow_layers, vec![(0, 1), (2, 2)]);
        assert_eq!(cfg.deny_layers, vec![(3, 4)]);
        assert_eq!(cfg.update_function, "tick");
    }

    #[test]
    fn test_missing_keys_keep_defaults() {
        let mut cfg = EngineConfig::new();
        cfg.load_from_str("[window]\nwidth = 320\n").unwrap();
        assert_eq!(cfg.window_width, 320);
        assert_eq!(cfg.window_height, 600);
        assert_eq!(cfg.target_fps, 60.0);
    }

    #[test]
    fn test_bad_layer_pair_is_an_error() {
        let mut cfg = EngineConfig::new();
        assert!(cfg.load_from_str("[collision]\nallow = 0-1\n").is_err());
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let mut cfg = EngineConfig::with_path("./definitely/not/here.ini");
        assert!(cfg.load_from_file().is_err());
        assert_eq!(cfg, EngineConfig::with_path("./definitely/not/here.ini"));
    }
}
