//! The engine session.
//!
//! [`Engine`] owns the ECS [`World`], the per-frame [`Schedule`] and the Rust
//! timer handlers. There is no ambient global state: a host creates one
//! `Engine`, drives it with [`Engine::step`] (or [`Engine::run`]) and drops it.
//!
//! The methods in this module are typed and return [`Result`]. The soft-failure
//! operation surface that scripts call lives in [`crate::ops`].
//!
//! # Frame order
//!
//! 1. [`advance_clock`] records the frame delta.
//! 2. The schedule runs movement, collision detection and the timer due check.
//! 3. [`Engine::step`] dispatches the due fires to their handlers, one by one.
//!    A timer cancelled by an earlier handler in the same tick is skipped, and
//!    so is a fire whose owner was destroyed earlier in the tick.

use std::thread;
use std::time::{Duration, Instant};

use bevy_ecs::prelude::*;
use log::{debug, info, warn};
use rustc_hash::FxHashMap;

use crate::components::controllable::{Controllable, InputType};
use crate::components::entityid::EntityId;
use crate::components::hitbox::{Hitbox, Layer};
use crate::components::position::Position;
use crate::components::render::{Color, Render};
use crate::error::{EngineError, Result};
use crate::events::collision::CollisionPair;
use crate::resources::clock::{Clock, FrameStats};
use crate::resources::collisionlayers::CollisionLayers;
use crate::resources::collisionstate::CollisionState;
use crate::resources::engineconfig::EngineConfig;
use crate::resources::input::{Direction, InputState, ScreenBounds};
use crate::resources::registry::EntityRegistry;
use crate::resources::scheduler::{CallbackId, EventScheduler, TimerFired, TimerId};
use crate::resources::ui::{TextOptions, UiLayer, setup_ui_console, shutdown_ui_console};
use crate::systems::build_frame_schedule;
use crate::systems::time::advance_clock;

/// Rust handler bound to a callback id.
pub type TimerHandler = Box<dyn FnMut(&mut Engine, TimerFired)>;

/// Components the engine attaches by public id.
pub trait EngineComponent: Component + Copy {
    const NAME: &'static str;
}

impl EngineComponent for Position {
    const NAME: &'static str = "position";
}

impl EngineComponent for Render {
    const NAME: &'static str = "render";
}

impl EngineComponent for Hitbox {
    const NAME: &'static str = "hitbox";
}

impl EngineComponent for Controllable {
    const NAME: &'static str = "controllable";
}

/// Build the layer matrix described by the config.
pub fn collision_layers_from(config: &EngineConfig) -> CollisionLayers {
    let mut layers = CollisionLayers::new(config.default_interact);
    for (a, b) in &config.allow_layers {
        layers.allow(*a, *b);
    }
    for (a, b) in &config.deny_layers {
        layers.deny(*a, *b);
    }
    layers
}

/// Wall-clock frame limiter.
///
/// Call [`begin`](Self::begin) at the top of a frame to get the delta to feed
/// into the tick, and [`finish`](Self::finish) at the end to sleep off the
/// rest of the frame budget.
#[derive(Debug)]
pub struct FramePacer {
    frame_start: Instant,
    last_delta: Duration,
}

impl FramePacer {
    pub fn new(first_delta: Duration) -> Self {
        Self {
            frame_start: Instant::now(),
            last_delta: first_delta,
        }
    }

    pub fn begin(&mut self) -> Duration {
        self.frame_start = Instant::now();
        self.last_delta
    }

    pub fn finish(&mut self, budget: Duration) {
        let spent = self.frame_start.elapsed();
        if spent < budget {
            thread::sleep(budget - spent);
        }
        self.last_delta = self.frame_start.elapsed();
    }
}

pub struct Engine {
    world: World,
    schedule: Schedule,
    handlers: FxHashMap<CallbackId, TimerHandler>,
    running: bool,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}

impl Engine {
    pub fn new(config: &EngineConfig) -> Self {
        let mut world = World::new();
        world.insert_resource(EntityRegistry::default());
        world.insert_resource(Clock::new(config.target_fps, config.fps_window));
        world.insert_resource(EventScheduler::default());
        world.insert_resource(CollisionState::default());
        world.insert_resource(collision_layers_from(config));
        world.insert_resource(InputState::default());
        world.insert_resource(ScreenBounds {
            w: config.window_width as f32,
            h: config.window_height as f32,
        });
        world.insert_resource(UiLayer::new());
        world.insert_resource(config.clone());

        info!(
            "Engine session created (target {} fps, bounds {}x{})",
            config.target_fps, config.window_width, config.window_height
        );

        Self {
            world,
            schedule: build_frame_schedule(),
            handlers: FxHashMap::default(),
            running: true,
        }
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn config(&self) -> &EngineConfig {
        self.world.resource::<EngineConfig>()
    }

    pub fn clock(&self) -> &Clock {
        self.world.resource::<Clock>()
    }

    pub fn scheduler(&self) -> &EventScheduler {
        self.world.resource::<EventScheduler>()
    }

    pub fn ui(&self) -> &UiLayer {
        self.world.resource::<UiLayer>()
    }

    /// Mirror UI changes to a background thread that logs them.
    pub fn attach_ui_console(&mut self) {
        setup_ui_console(&mut self.world);
    }

    // ---------------------------------------------------------------------
    // Entities
    // ---------------------------------------------------------------------

    pub fn spawn(&mut self) -> Result<EntityId> {
        let id = self
            .world
            .resource_mut::<EntityRegistry>()
            .allocate()
            .ok_or_else(|| EngineError::InvalidArgument("entity id space exhausted".into()))?;
        let entity = self.world.spawn(id).id();
        self.world.resource_mut::<EntityRegistry>().bind(id, entity);
        debug!("spawned entity {id}");
        Ok(id)
    }

    /// Remove the entity, its components, its collision pairs and the timers it owns.
    pub fn despawn(&mut self, id: EntityId) -> Result<()> {
        let entity = self
            .world
            .resource_mut::<EntityRegistry>()
            .release(id)
            .ok_or(EngineError::UnknownEntity(id))?;
        self.world.despawn(entity);
        self.world.resource_mut::<CollisionState>().forget(id);
        let cancelled = self
            .world
            .resource_mut::<EventScheduler>()
            .cancel_owned_by(id);
        debug!("despawned entity {id} ({cancelled} owned timers cancelled)");
        Ok(())
    }

    pub fn entity(&self, id: EntityId) -> Result<Entity> {
        self.world
            .resource::<EntityRegistry>()
            .resolve(id)
            .ok_or(EngineError::UnknownEntity(id))
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.world.resource::<EntityRegistry>().contains(id)
    }

    pub fn live_entities(&self) -> Vec<EntityId> {
        self.world.resource::<EntityRegistry>().ids()
    }

    // ---------------------------------------------------------------------
    // Components
    // ---------------------------------------------------------------------

    /// Attach `component`, replacing any previous value of the same type.
    pub fn insert_component<C: EngineComponent>(&mut self, id: EntityId, component: C) -> Result<()> {
        let entity = self.entity(id)?;
        self.world.entity_mut(entity).insert(component);
        Ok(())
    }

    /// Detach a component. Returns the removed value, or `None` if it was absent.
    pub fn remove_component<C: EngineComponent>(&mut self, id: EntityId) -> Result<Option<C>> {
        let entity = self.entity(id)?;
        let previous = self.world.get::<C>(entity).copied();
        if previous.is_some() {
            self.world.entity_mut(entity).remove::<C>();
        }
        Ok(previous)
    }

    pub fn component<C: EngineComponent>(&self, id: EntityId) -> Result<C> {
        let entity = self.entity(id)?;
        self.world
            .get::<C>(entity)
            .copied()
            .ok_or(EngineError::MissingComponent {
                entity: id,
                component: C::NAME,
            })
    }

    pub fn place(&mut self, id: EntityId, x: f32, y: f32) -> Result<()> {
        let target = Position::new(x, y)?;
        let entity = self.entity(id)?;
        let mut position = self
            .world
            .get_mut::<Position>(entity)
            .ok_or(EngineError::MissingComponent {
                entity: id,
                component: Position::NAME,
            })?;
        *position = target;
        Ok(())
    }

    pub fn recolor(&mut self, id: EntityId, color: Color) -> Result<()> {
        let entity = self.entity(id)?;
        let mut render = self
            .world
            .get_mut::<Render>(entity)
            .ok_or(EngineError::MissingComponent {
                entity: id,
                component: Render::NAME,
            })?;
        render.color = color;
        Ok(())
    }

    pub fn enable_hitbox(&mut self, id: EntityId, active: bool) -> Result<()> {
        let entity = self.entity(id)?;
        let mut hitbox = self
            .world
            .get_mut::<Hitbox>(entity)
            .ok_or(EngineError::MissingComponent {
                entity: id,
                component: Hitbox::NAME,
            })?;
        hitbox.active = active;
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Collision
    // ---------------------------------------------------------------------

    /// Pairs overlapping in the most recent tick, canonical and sorted.
    pub fn collisions(&self) -> &[CollisionPair] {
        self.world.resource::<CollisionState>().pairs()
    }

    pub fn is_overlapping(&self, a: EntityId, b: EntityId) -> bool {
        self.world.resource::<CollisionState>().is_overlapping(a, b)
    }

    pub fn layers(&self) -> &CollisionLayers {
        self.world.resource::<CollisionLayers>()
    }

    pub fn set_layers_interact(&mut self, a: Layer, b: Layer, interact: bool) {
        self.world
            .resource_mut::<CollisionLayers>()
            .set(a, b, interact);
    }

    // ---------------------------------------------------------------------
    // Timers
    // ---------------------------------------------------------------------

    /// Register a callback name without binding a Rust handler.
    pub fn callback(&mut self, name: &str) -> CallbackId {
        self.world
            .resource_mut::<EventScheduler>()
            .register_callback(name)
    }

    pub fn callback_id(&self, name: &str) -> Result<CallbackId> {
        self.scheduler()
            .callback_id(name)
            .ok_or_else(|| EngineError::UnknownCallback(name.to_string()))
    }

    /// Register `name` and bind `handler` to it. Rebinding replaces the previous handler.
    pub fn on_timer<F>(&mut self, name: &str, handler: F) -> CallbackId
    where
        F: FnMut(&mut Engine, TimerFired) + 'static,
    {
        let id = self.callback(name);
        self.handlers.insert(id, Box::new(handler));
        id
    }

    fn check_owner(&self, owner: Option<EntityId>) -> Result<()> {
        match owner {
            Some(id) if !self.contains(id) => Err(EngineError::UnknownEntity(id)),
            _ => Ok(()),
        }
    }

    pub fn repeat_every(
        &mut self,
        interval_ms: u64,
        callback: CallbackId,
        owner: Option<EntityId>,
    ) -> Result<TimerId> {
        self.check_owner(owner)?;
        let now = self.clock().uptime_ms();
        self.world
            .resource_mut::<EventScheduler>()
            .schedule_repeating(now, interval_ms, callback, owner)
    }

    pub fn fire_after(
        &mut self,
        delay_ms: u64,
        callback: CallbackId,
        owner: Option<EntityId>,
    ) -> Result<TimerId> {
        self.check_owner(owner)?;
        let now = self.clock().uptime_ms();
        self.world
            .resource_mut::<EventScheduler>()
            .schedule_once(now, delay_ms, callback, owner)
    }

    pub fn cancel_timer(&mut self, id: TimerId) -> Result<()> {
        self.world.resource_mut::<EventScheduler>().cancel(id)
    }

    // ---------------------------------------------------------------------
    // Input and clock
    // ---------------------------------------------------------------------

    pub fn press(&mut self, input_type: InputType, direction: Direction, pressed: bool) {
        self.world
            .resource_mut::<InputState>()
            .set(input_type, direction, pressed);
    }

    pub fn release_all_input(&mut self) {
        self.world.resource_mut::<InputState>().release_all();
    }

    pub fn change_target_fps(&mut self, fps: f32) -> Result<()> {
        self.world.resource_mut::<Clock>().set_target_fps(fps)
    }

    pub fn frame_stats(&self) -> FrameStats {
        self.clock().stats()
    }

    // ---------------------------------------------------------------------
    // UI
    // ---------------------------------------------------------------------

    pub fn ui_show(&mut self, text: &str, x: f32, y: f32, options: TextOptions) -> Result<u32> {
        self.world
            .resource_mut::<UiLayer>()
            .show_text(text, x, y, options)
    }

    pub fn ui_hide(&mut self, handle: u32) -> bool {
        self.world.resource_mut::<UiLayer>().hide_text(handle)
    }

    pub fn ui_clear(&mut self) {
        self.world.resource_mut::<UiLayer>().clear();
    }

    // ---------------------------------------------------------------------
    // Frame loop
    // ---------------------------------------------------------------------

    /// Advance one frame and return the timer fires that became due.
    ///
    /// Nothing is dispatched; hosts with their own callback tables (such as
    /// the Lua runtime) use this and walk the fires themselves, calling
    /// [`claim_fire`](Self::claim_fire) before each one.
    pub fn tick(&mut self, dt: Duration) -> Vec<TimerFired> {
        advance_clock(&mut self.world, dt);
        self.schedule.run(&mut self.world);
        self.world.resource_mut::<EventScheduler>().drain_fired()
    }

    /// Decide whether a fire from [`tick`](Self::tick) may still be dispatched.
    ///
    /// Drops fires cancelled earlier in the tick and fires bound to an entity
    /// that no longer exists. A claimed one-shot can no longer be cancelled.
    pub fn claim_fire(&mut self, fire: &TimerFired) -> bool {
        if let Some(owner) = fire.entity {
            if !self.contains(owner) {
                debug!("{} dropped: owner {owner} was destroyed", fire.timer);
                return false;
            }
        }
        if !self
            .world
            .resource_mut::<EventScheduler>()
            .claim(fire.timer)
        {
            debug!("{} cancelled earlier this tick; fire dropped", fire.timer);
            return false;
        }
        true
    }

    /// Advance one frame and dispatch due fires to the bound Rust handlers.
    /// Returns how many handlers ran.
    pub fn step(&mut self, dt: Duration) -> usize {
        let fires = self.tick(dt);
        let mut dispatched = 0;
        for fire in fires {
            if !self.claim_fire(&fire) {
                continue;
            }
            if fire.skipped > 0 {
                debug!("{} missed {} fires during a stall", fire.timer, fire.skipped);
            }
            if self.dispatch_one(fire) {
                dispatched += 1;
            } else {
                let name = self.scheduler().callback_name(fire.callback).unwrap_or("?");
                warn!("{} fired for '{name}' but no handler is bound", fire.timer);
            }
        }
        dispatched
    }

    /// Run the Rust handler bound to `fire.callback`. Returns false if none is bound.
    pub fn dispatch_one(&mut self, fire: TimerFired) -> bool {
        let Some(mut handler) = self.handlers.remove(&fire.callback) else {
            return false;
        };
        handler(self, fire);
        // A handler may have rebound its own callback; keep the newer one.
        self.handlers.entry(fire.callback).or_insert(handler);
        true
    }

    /// Run frames at the target rate until [`quit`](Self::quit) is called or
    /// `max_frames` is reached. `per_frame` runs after each step.
    /// Returns the number of frames run.
    pub fn run<F>(&mut self, max_frames: Option<u64>, mut per_frame: F) -> u64
    where
        F: FnMut(&mut Engine),
    {
        let mut pacer = FramePacer::new(self.clock().frame_duration());
        let mut frames = 0;
        info!("Frame loop started at {} fps", self.clock().target_fps());
        while self.running && max_frames.is_none_or(|max| frames < max) {
            let dt = pacer.begin();
            self.step(dt);
            per_frame(self);
            frames += 1;
            pacer.finish(self.clock().frame_duration());
        }
        info!("Frame loop stopped after {frames} frames");
        frames
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn start(&mut self) {
        self.running = true;
    }

    pub fn running(&self) -> bool {
        self.running
    }

    /// Stop the loop and join the UI sink thread, if any.
    pub fn shutdown(&mut self) {
        self.running = false;
        shutdown_ui_console(&mut self.world);
        info!(
            "Engine session ended after {} frames ({:.2}s)",
            self.clock().total_frames(),
            self.clock().uptime_secs()
        );
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        shutdown_ui_console(&mut self.world);
    }
}
