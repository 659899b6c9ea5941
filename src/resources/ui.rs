//! Text overlay bookkeeping.
//!
//! [`UiLayer`] stores the text elements a script has put on screen and hands
//! out handles for them. Handles come from a monotonically increasing counter
//! and are never reused, not even after [`UiLayer::clear`].
//!
//! Use [`setup_ui_console`] to spawn a background thread that logs every UI
//! change (a stand-in for a renderer) and [`shutdown_ui_console`] to stop it.

use bevy_ecs::prelude::*;
use crossbeam_channel::{Sender, unbounded};
use log::warn;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::components::render::Color;
use crate::error::{EngineError, Result};
use crate::events::ui::UiCmd;
use crate::systems::ui::ui_console_thread;

pub const DEFAULT_FONT_SIZE: f32 = 16.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

/// Layout options accepted by `show_text`. Every field is optional.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextOptions {
    #[serde(alias = "fontSize")]
    pub font_size: f32,
    pub color: [f32; 3],
    pub alignment: TextAlign,
}

impl Default for TextOptions {
    fn default() -> Self {
        Self {
            font_size: DEFAULT_FONT_SIZE,
            color: Color::WHITE.to_array(),
            alignment: TextAlign::Left,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct UiText {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub font_size: f32,
    pub color: Color,
    pub alignment: TextAlign,
}

#[derive(Resource, Debug, Default)]
pub struct UiLayer {
    texts: FxHashMap<u32, UiText>,
    next_handle: u32,
    sink: Option<Sender<UiCmd>>,
}

impl UiLayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mirror every subsequent change to `sink`.
    pub fn attach_sink(&mut self, sink: Sender<UiCmd>) {
        self.sink = Some(sink);
    }

    pub fn detach_sink(&mut self) -> Option<Sender<UiCmd>> {
        self.sink.take()
    }

    fn forward(&self, cmd: UiCmd) {
        if let Some(sink) = &self.sink {
            if sink.send(cmd).is_err() {
                warn!("UI sink disconnected; dropping command");
            }
        }
    }

    pub fn show_text(&mut self, text: &str, x: f32, y: f32, options: TextOptions) -> Result<u32> {
        if !(x.is_finite() && y.is_finite()) {
            return Err(EngineError::InvalidArgument(format!(
                "text position must be finite, got ({x}, {y})"
            )));
        }
        if !options.font_size.is_finite() || options.font_size <= 0.0 {
            return Err(EngineError::InvalidArgument(format!(
                "font size must be positive, got {}",
                options.font_size
            )));
        }
        let [r, g, b] = options.color;
        let color = Color::new(r, g, b)?;

        self.next_handle += 1;
        let handle = self.next_handle;
        let element = UiText {
            text: text.to_string(),
            x,
            y,
            font_size: options.font_size,
            color,
            alignment: options.alignment,
        };
        self.forward(UiCmd::Show {
            handle,
            text: element.clone(),
        });
        self.texts.insert(handle, element);
        Ok(handle)
    }

    /// Returns false if the handle is not currently shown.
    pub fn hide_text(&mut self, handle: u32) -> bool {
        if self.texts.remove(&handle).is_some() {
            self.forward(UiCmd::Hide { handle });
            true
        } else {
            false
        }
    }

    pub fn clear(&mut self) {
        self.texts.clear();
        self.forward(UiCmd::Clear);
    }

    pub fn get(&self, handle: u32) -> Option<&UiText> {
        self.texts.get(&handle)
    }

    pub fn len(&self) -> usize {
        self.texts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }
}

/// Join handle of the console sink thread.
#[derive(Resource)]
pub struct UiConsole {
    pub tx_cmd: Sender<UiCmd>,
    pub handle: std::thread::JoinHandle<()>,
}

/// Spawn the console sink thread and attach it to the world's [`UiLayer`].
pub fn setup_ui_console(world: &mut World) {
    let (tx_cmd, rx_cmd) = unbounded::<UiCmd>();
    let handle = std::thread::spawn(move || ui_console_thread(rx_cmd));

    world
        .get_resource_or_insert_with(UiLayer::new)
        .attach_sink(tx_cmd.clone());
    world.insert_resource(UiConsole { tx_cmd, handle });
}

/// Request shutdown of the console sink thread and join it.
pub fn shutdown_ui_console(world: &mut World) {
    if let Some(mut layer) = world.get_resource_mut::<UiLayer>() {
        layer.detach_sink();
    }
    if let Some(console) = world.remove_resource::<UiConsole>() {
        let _ = console.tx_cmd.send(UiCmd::Shutdown);
        let _ = console.handle.join();
    }
}
