//! Data exchanged between the engine and its callers.
//!
//! Submodules:
//! - [`collision`] – canonical collision pairs and the poll result entry
//! - [`timer`] – serializable timer fires for remote clients
//! - [`ui`] – commands mirrored to a UI sink thread
pub mod collision;
pub mod timer;
pub mod ui;
