//! Commands sent from the engine to a UI sink thread.
//!
//! The engine never draws. [`UiLayer`](crate::resources::ui::UiLayer) keeps the
//! authoritative list of text elements and mirrors every change as a [`UiCmd`]
//! so that a renderer (or the console sink in the binary) can follow along.

use crate::resources::ui::UiText;

#[derive(Debug, Clone, PartialEq)]
pub enum UiCmd {
    Show { handle: u32, text: UiText },
    Hide { handle: u32 },
    Clear,
    /// Stop the sink thread.
    Shutdown,
}
