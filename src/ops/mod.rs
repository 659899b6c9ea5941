//! The script-facing operation surface.
//!
//! Every method here takes plain ids and values, never fails hard, and logs a
//! warning when it refuses a request. Scripts call these every frame without
//! checking that entities still exist, so an unknown id is reported as `false`
//! or `None` and the frame loop keeps going.
//!
//! [`request`] wraps the same surface in a serde request/response format.

pub mod props;
pub mod request;

use log::{debug, info, warn};

use crate::components::controllable::{Controllable, InputType};
use crate::components::entityid::EntityId;
use crate::components::hitbox::{Hitbox, Layer};
use crate::components::position::Position;
use crate::components::render::{Color, Render};
use crate::engine::{Engine, EngineComponent};
use crate::error::{EngineError, Result};
use crate::events::collision::CollisionEventData;
use crate::resources::clock::FrameStats;
use crate::resources::input::Direction;
use crate::resources::scheduler::{CallbackId, TimerId};
use crate::resources::ui::TextOptions;

use props::{ControllableProps, HitboxProps, RenderProps};

/// Log a refused operation and turn it into `None`.
fn soft<T>(op: &str, result: Result<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("{op}: {e}");
            None
        }
    }
}

impl Engine {
    /// Record the initial target frame rate and mark the loop as running.
    pub fn init_engine(&mut self, target_fps: f32) -> bool {
        let ok = soft("init_engine", self.change_target_fps(target_fps)).is_some();
        self.start();
        info!("Engine initialized at {} fps", self.clock().target_fps());
        ok
    }

    pub fn create_entity(&mut self) -> u32 {
        soft("create_entity", self.spawn())
            .unwrap_or(EntityId::INVALID)
            .raw()
    }

    pub fn destroy_entity(&mut self, id: u32) -> bool {
        soft("destroy_entity", self.despawn(EntityId(id))).is_some()
    }

    pub fn entity_count(&self) -> usize {
        self.live_entities().len()
    }

    fn attach<C: EngineComponent>(&mut self, op: &str, id: u32, component: Result<C>) -> bool {
        let result = component.and_then(|c| self.insert_component(EntityId(id), c));
        let ok = soft(op, result).is_some();
        if ok {
            debug!("{op}: attached {} to {}", C::NAME, EntityId(id));
        }
        ok
    }

    fn detach<C: EngineComponent>(&mut self, op: &str, id: u32) -> bool {
        soft(op, self.remove_component::<C>(EntityId(id))).is_some()
    }

    fn lookup<C: EngineComponent>(&self, id: u32) -> Option<C> {
        // Absence is a normal answer for a getter; only log at debug level.
        match self.component::<C>(EntityId(id)) {
            Ok(c) => Some(c),
            Err(e) => {
                debug!("get_{}: {e}", C::NAME);
                None
            }
        }
    }

    // ---- components ----

    pub fn add_position(&mut self, id: u32, x: f32, y: f32) -> bool {
        self.attach("add_position", id, Position::new(x, y))
    }

    pub fn add_render(&mut self, id: u32, props: RenderProps) -> bool {
        self.attach("add_render", id, props.into_render())
    }

    pub fn add_hitbox(&mut self, id: u32, props: HitboxProps) -> bool {
        self.attach("add_hitbox", id, props.into_hitbox())
    }

    pub fn add_controllable(&mut self, id: u32, props: ControllableProps) -> bool {
        self.attach("add_controllable", id, props.into_controllable())
    }

    pub fn remove_position(&mut self, id: u32) -> bool {
        self.detach::<Position>("remove_position", id)
    }

    pub fn remove_render(&mut self, id: u32) -> bool {
        self.detach::<Render>("remove_render", id)
    }

    pub fn remove_hitbox(&mut self, id: u32) -> bool {
        self.detach::<Hitbox>("remove_hitbox", id)
    }

    /// No-op (still `true`) if the entity exists but is not controllable.
    pub fn remove_controllable(&mut self, id: u32) -> bool {
        self.detach::<Controllable>("remove_controllable", id)
    }

    pub fn get_position(&self, id: u32) -> Option<Position> {
        self.lookup(id)
    }

    pub fn get_render(&self, id: u32) -> Option<Render> {
        self.lookup(id)
    }

    pub fn get_hitbox(&self, id: u32) -> Option<Hitbox> {
        self.lookup(id)
    }

    pub fn get_controllable(&self, id: u32) -> Option<Controllable> {
        self.lookup(id)
    }

    pub fn set_entity_position(&mut self, id: u32, x: f32, y: f32) -> bool {
        soft("set_entity_position", self.place(EntityId(id), x, y)).is_some()
    }

    pub fn set_entity_color(&mut self, id: u32, r: f32, g: f32, b: f32) -> bool {
        let result = Color::new(r, g, b).and_then(|color| self.recolor(EntityId(id), color));
        soft("set_entity_color", result).is_some()
    }

    pub fn set_hitbox_active(&mut self, id: u32, active: bool) -> bool {
        soft("set_hitbox_active", self.enable_hitbox(EntityId(id), active)).is_some()
    }

    // ---- collision ----

    pub fn poll_collision_events(&self) -> Vec<CollisionEventData> {
        self.collisions()
            .iter()
            .copied()
            .map(CollisionEventData::from)
            .collect()
    }

    pub fn set_layer_interaction(&mut self, a: Layer, b: Layer, interact: bool) {
        self.set_layers_interact(a, b, interact);
    }

    pub fn layers_interact(&self, a: Layer, b: Layer) -> bool {
        self.layers().interacts(a, b)
    }

    // ---- timers ----

    pub fn register_callback(&mut self, name: &str) -> u32 {
        self.callback(name).0
    }

    fn resolve_callback(&self, name: &str) -> Result<CallbackId> {
        self.callback_id(name)
    }

    fn interval(value: i64) -> Result<u64> {
        u64::try_from(value)
            .ok()
            .filter(|v| *v > 0)
            .ok_or_else(|| {
                EngineError::InvalidArgument(format!("interval must be positive, got {value}ms"))
            })
    }

    /// Fire `callback` every `interval_ms`. Returns `None` for an unknown
    /// callback name or a non-positive interval.
    pub fn schedule_repeating_event(&mut self, interval_ms: i64, callback: &str) -> Option<u32> {
        let result = Self::interval(interval_ms).and_then(|interval| {
            let cb = self.resolve_callback(callback)?;
            self.repeat_every(interval, cb, None)
        });
        soft("schedule_repeating_event", result).map(|t| t.0)
    }

    /// Like [`schedule_repeating_event`](Self::schedule_repeating_event), bound
    /// to an entity: the fire carries its id and destroying it cancels the timer.
    pub fn schedule_repeating_event_for(
        &mut self,
        entity: u32,
        interval_ms: i64,
        callback: &str,
    ) -> Option<u32> {
        let result = Self::interval(interval_ms).and_then(|interval| {
            let cb = self.resolve_callback(callback)?;
            self.repeat_every(interval, cb, Some(EntityId(entity)))
        });
        soft("schedule_repeating_event_for", result).map(|t| t.0)
    }

    /// Fire `callback` once after `delay_ms`.
    pub fn schedule_event(&mut self, delay_ms: i64, callback: &str) -> Option<u32> {
        let result = u64::try_from(delay_ms)
            .map_err(|_| EngineError::InvalidArgument(format!("negative delay {delay_ms}ms")))
            .and_then(|delay| {
                let cb = self.resolve_callback(callback)?;
                self.fire_after(delay, cb, None)
            });
        soft("schedule_event", result).map(|t| t.0)
    }

    /// Cancel a timer. Unknown or already inactive ids are a no-op; returns
    /// whether an active timer was stopped.
    pub fn cancel_event(&mut self, id: u32) -> bool {
        match self.cancel_timer(TimerId(id)) {
            Ok(()) => {
                debug!("cancel_event: {} cancelled", TimerId(id));
                true
            }
            Err(e) => {
                debug!("cancel_event: {e}");
                false
            }
        }
    }

    // ---- clock ----

    pub fn get_fps(&self) -> f32 {
        self.clock().average_fps()
    }

    pub fn get_instant_fps(&self) -> f32 {
        self.clock().instant_fps()
    }

    pub fn get_total_frames(&self) -> u64 {
        self.clock().total_frames()
    }

    /// Seconds of simulated time.
    pub fn get_uptime(&self) -> f64 {
        self.clock().uptime_secs()
    }

    /// Average, instant and min/max frame times over the sample window.
    pub fn get_frame_stats(&self) -> FrameStats {
        self.frame_stats()
    }

    pub fn get_target_fps(&self) -> f32 {
        self.clock().target_fps()
    }

    pub fn set_target_fps(&mut self, fps: f32) {
        if soft("set_target_fps", self.change_target_fps(fps)).is_some() {
            info!("Target fps set to {fps}");
        }
    }

    // ---- input and lifecycle ----

    pub fn set_input(&mut self, input_type: &str, direction: &str, pressed: bool) -> bool {
        let Some(scheme) = InputType::from_name(input_type) else {
            warn!("set_input: unknown input type '{input_type}'");
            return false;
        };
        let Some(dir) = Direction::from_name(direction) else {
            warn!("set_input: unknown direction '{direction}'");
            return false;
        };
        self.press(scheme, dir, pressed);
        true
    }

    pub fn quit(&mut self) {
        info!("Quit requested");
        self.stop();
    }

    pub fn is_running(&self) -> bool {
        self.running()
    }

    // ---- UI ----

    pub fn show_text(&mut self, text: &str, x: f32, y: f32, options: TextOptions) -> Option<u32> {
        soft("show_text", self.ui_show(text, x, y, options))
    }

    pub fn hide_text(&mut self, handle: u32) -> bool {
        let hidden = self.ui_hide(handle);
        if !hidden {
            debug!("hide_text: handle {handle} is not shown");
        }
        hidden
    }

    pub fn clear_ui(&mut self) {
        self.ui_clear();
    }
}
