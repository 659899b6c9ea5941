//! Serializable view of a dispatched timer fire.
//!
//! [`TimerFired`](crate::resources::scheduler::TimerFired) carries typed ids.
//! Remote clients (the JSON surface) only know callback names, so fires are
//! reported to them as [`FiredTimerData`].

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FiredTimerData {
    pub timer: u32,
    pub callback: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub entity: Option<u32>,
}
