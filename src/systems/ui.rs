//! Console UI sink.
//!
//! [`ui_console_thread`] runs on its own OS thread and logs every
//! [`UiCmd`] it receives until [`UiCmd::Shutdown`] arrives or the channel
//! closes. It is created by [`crate::resources::ui::setup_ui_console`].

use crossbeam_channel::Receiver;
use log::{debug, info};

use crate::events::ui::UiCmd;

pub fn ui_console_thread(rx_cmd: Receiver<UiCmd>) {
    debug!(
        "[ui] console thread starting (id={:?})",
        std::thread::current().id()
    );

    while let Ok(cmd) = rx_cmd.recv() {
        match cmd {
            UiCmd::Show { handle, text } => {
                info!(
                    target: "ui",
                    "show #{handle} at ({:.0}, {:.0}) size {} {:?}: {}",
                    text.x, text.y, text.font_size, text.alignment, text.text
                );
            }
            UiCmd::Hide { handle } => info!(target: "ui", "hide #{handle}"),
            UiCmd::Clear => info!(target: "ui", "clear"),
            UiCmd::Shutdown => break,
        }
    }

    debug!("[ui] console thread exiting");
}
