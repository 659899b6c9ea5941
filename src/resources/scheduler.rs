//! Repeating and one-shot timers with typed callbacks.
//!
//! Callbacks are not looked up by string when a timer fires. A name is
//! registered once with [`EventScheduler::register_callback`] and turned into a
//! [`CallbackId`]; scheduling against an unregistered name fails right away.
//! Hosts bind the id to something callable (a Rust closure in
//! [`Engine`](crate::engine::Engine), a Lua function in the script host).
//!
//! # Firing rules
//!
//! - Due checks run once per tick, after collision detection, in
//!   [`fire_due_timers`](crate::systems::scheduler::fire_due_timers).
//! - Repeating timers advance with fixed phase: `next_fire += interval`.
//! - After a stall, a timer fires at most once per tick and `next_fire` skips
//!   past the missed window. Missed fires are counted in
//!   [`TimerFired::skipped`] instead of being replayed.
//! - A due one-shot stays [`TimerState::Queued`] until its host claims the
//!   fire with [`EventScheduler::claim`], so an earlier handler in the same
//!   tick can still cancel it.
//! - Cancelling marks the timer inactive. Entries that are spent or cancelled
//!   are pruned at the start of the next due check.
//! - Fire times saturate at `u64::MAX` instead of overflowing.

use std::fmt;

use bevy_ecs::prelude::Resource;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::components::entityid::EntityId;
use crate::error::{EngineError, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimerId(pub u32);

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timer:{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallbackId(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerState {
    Active,
    /// One-shot timer whose fire was collected but not dispatched yet.
    Queued,
    /// One-shot timer that already fired.
    Spent,
    Cancelled,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ScheduledTimer {
    pub id: TimerId,
    /// `None` for one-shot timers.
    pub interval_ms: Option<u64>,
    pub callback: CallbackId,
    pub next_fire_ms: u64,
    pub owner: Option<EntityId>,
    pub state: TimerState,
}

/// One dispatched fire, produced by the due check.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimerFired {
    pub timer: TimerId,
    pub callback: CallbackId,
    /// Entity the timer is bound to, if any.
    pub entity: Option<EntityId>,
    /// Scheduled fire time this dispatch stands for.
    pub due_ms: u64,
    /// Fires dropped because more than one interval elapsed in a single tick.
    pub skipped: u64,
}

#[derive(Resource, Debug)]
pub struct EventScheduler {
    timers: BTreeMap<TimerId, ScheduledTimer>,
    next_timer_id: u32,
    callback_names: Vec<String>,
    callback_index: FxHashMap<String, CallbackId>,
    fired: Vec<TimerFired>,
}

impl Default for EventScheduler {
    fn default() -> Self {
        Self {
            timers: BTreeMap::new(),
            next_timer_id: 1,
            callback_names: Vec::new(),
            callback_index: FxHashMap::default(),
            fired: Vec::new(),
        }
    }
}

impl ScheduledTimer {
    /// Still able to fire: active, or a one-shot waiting for dispatch.
    fn is_pending(&self) -> bool {
        matches!(self.state, TimerState::Active | TimerState::Queued)
    }
}

impl EventScheduler {
    /// Register a callback name. Registering the same name twice returns the same id.
    pub fn register_callback(&mut self, name: &str) -> CallbackId {
        if let Some(id) = self.callback_index.get(name) {
            return *id;
        }
        let id = CallbackId(self.callback_names.len() as u32);
        self.callback_names.push(name.to_string());
        self.callback_index.insert(name.to_string(), id);
        id
    }

    pub fn callback_id(&self, name: &str) -> Option<CallbackId> {
        self.callback_index.get(name).copied()
    }

    pub fn callback_name(&self, id: CallbackId) -> Option<&str> {
        self.callback_names.get(id.0 as usize).map(String::as_str)
    }

    fn check_callback(&self, callback: CallbackId) -> Result<()> {
        if (callback.0 as usize) < self.callback_names.len() {
            Ok(())
        } else {
            Err(EngineError::UnknownCallback(format!("#{}", callback.0)))
        }
    }

    fn insert(
        &mut self,
        next_fire_ms: u64,
        interval_ms: Option<u64>,
        callback: CallbackId,
        owner: Option<EntityId>,
    ) -> TimerId {
        let id = TimerId(self.next_timer_id);
        self.next_timer_id = self.next_timer_id.saturating_add(1);
        self.timers.insert(
            id,
            ScheduledTimer {
                id,
                interval_ms,
                callback,
                next_fire_ms,
                owner,
                state: TimerState::Active,
            },
        );
        id
    }

    /// Schedule `callback` every `interval_ms`, first fire at `now_ms + interval_ms`.
    pub fn schedule_repeating(
        &mut self,
        now_ms: u64,
        interval_ms: u64,
        callback: CallbackId,
        owner: Option<EntityId>,
    ) -> Result<TimerId> {
        if interval_ms == 0 {
            return Err(EngineError::InvalidArgument(
                "repeating interval must be greater than zero".into(),
            ));
        }
        self.check_callback(callback)?;
        Ok(self.insert(
            now_ms.saturating_add(interval_ms),
            Some(interval_ms),
            callback,
            owner,
        ))
    }

    /// Schedule a single fire at `now_ms + delay_ms`.
    pub fn schedule_once(
        &mut self,
        now_ms: u64,
        delay_ms: u64,
        callback: CallbackId,
        owner: Option<EntityId>,
    ) -> Result<TimerId> {
        self.check_callback(callback)?;
        Ok(self.insert(now_ms.saturating_add(delay_ms), None, callback, owner))
    }

    /// Mark a timer inactive. A queued one-shot can still be cancelled; unknown,
    /// spent and already cancelled ids are left alone.
    pub fn cancel(&mut self, id: TimerId) -> Result<()> {
        match self.timers.get_mut(&id) {
            Some(timer) if timer.is_pending() => {
                timer.state = TimerState::Cancelled;
                Ok(())
            }
            _ => Err(EngineError::UnknownTimer(id)),
        }
    }

    /// Cancel every pending timer bound to `owner`, queued one-shots included.
    /// Returns how many were cancelled.
    pub fn cancel_owned_by(&mut self, owner: EntityId) -> usize {
        let mut count = 0;
        for timer in self.timers.values_mut() {
            if timer.owner == Some(owner) && timer.is_pending() {
                timer.state = TimerState::Cancelled;
                count += 1;
            }
        }
        count
    }

    pub fn is_active(&self, id: TimerId) -> bool {
        self.timers
            .get(&id)
            .is_some_and(|t| t.state == TimerState::Active)
    }

    pub fn is_cancelled(&self, id: TimerId) -> bool {
        self.timers
            .get(&id)
            .is_some_and(|t| t.state == TimerState::Cancelled)
    }

    /// Claim a collected fire for dispatch. Returns false if the timer was
    /// cancelled since the due check; a queued one-shot becomes spent.
    pub fn claim(&mut self, id: TimerId) -> bool {
        match self.timers.get_mut(&id) {
            Some(timer) if timer.state == TimerState::Queued => {
                timer.state = TimerState::Spent;
                true
            }
            Some(timer) => timer.state == TimerState::Active,
            None => false,
        }
    }

    pub fn get(&self, id: TimerId) -> Option<&ScheduledTimer> {
        self.timers.get(&id)
    }

    pub fn active_count(&self) -> usize {
        self.timers
            .values()
            .filter(|t| t.state == TimerState::Active)
            .count()
    }

    /// Run the due check for `now_ms` and queue the resulting fires.
    pub fn collect_due(&mut self, now_ms: u64) {
        self.timers.retain(|_, t| t.state == TimerState::Active);

        let mut due = Vec::new();
        for timer in self.timers.values_mut() {
            if now_ms < timer.next_fire_ms {
                continue;
            }
            let due_ms = timer.next_fire_ms;
            let mut skipped = 0;
            match timer.interval_ms {
                Some(interval) => {
                    timer.next_fire_ms = timer.next_fire_ms.saturating_add(interval);
                    if timer.next_fire_ms <= now_ms {
                        let missed = (now_ms - timer.next_fire_ms) / interval + 1;
                        timer.next_fire_ms = timer
                            .next_fire_ms
                            .saturating_add(missed.saturating_mul(interval));
                        skipped = missed;
                    }
                }
                None => timer.state = TimerState::Queued,
            }
            due.push(TimerFired {
                timer: timer.id,
                callback: timer.callback,
                entity: timer.owner,
                due_ms,
                skipped,
            });
        }
        due.sort_by_key(|f| (f.due_ms, f.timer));
        self.fired.extend(due);
    }

    /// Take the fires queued by the last due check.
    pub fn drain_fired(&mut self) -> Vec<TimerFired> {
        std::mem::take(&mut self.fired)
    }
}
