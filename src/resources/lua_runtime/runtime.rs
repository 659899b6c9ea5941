//! Lua runtime core implementation.
//!
//! This module contains the `LuaRuntime` struct which owns the Lua interpreter
//! together with the engine session, and provides the `engine` table API to
//! Lua scripts.
//!
//! The [`Engine`] lives in Lua's app data behind a `RefCell`. Every `engine.*`
//! function borrows it for the duration of one operation only. The host never
//! holds that borrow while calling into Lua, so timer callbacks and the
//! per-frame update function can call back into the engine freely.

use std::cell::{Cell, RefCell};
use std::time::Duration;

use log::{debug, error, info, warn};
use mlua::prelude::*;
use rustc_hash::FxHashMap;

use super::tables;
use crate::engine::{Engine, FramePacer};
use crate::resources::engineconfig::EngineConfig;
use crate::resources::scheduler::{CallbackId, TimerFired};

/// Shared state accessible from Lua function closures.
pub(super) struct LuaAppData {
    engine: RefCell<Engine>,
    /// Lua functions bound to scheduler callbacks.
    bindings: RefCell<FxHashMap<CallbackId, LuaRegistryKey>>,
    /// Counter used to name callbacks passed as function values.
    anonymous: Cell<u32>,
}

fn app_data(lua: &Lua) -> LuaResult<mlua::AppDataRef<'_, LuaAppData>> {
    lua.app_data_ref::<LuaAppData>()
        .ok_or_else(|| LuaError::runtime("LuaAppData not found"))
}

/// Borrow the engine for one operation.
fn with_engine<R>(lua: &Lua, f: impl FnOnce(&mut Engine) -> R) -> LuaResult<R> {
    let data = app_data(lua)?;
    let mut engine = data
        .engine
        .try_borrow_mut()
        .map_err(|_| LuaError::runtime("engine is already borrowed"))?;
    let result = f(&mut engine);
    Ok(result)
}

/// Bind `func` to the scheduler callback `name`, replacing any previous binding.
fn bind_function(lua: &Lua, name: &str, func: LuaFunction) -> LuaResult<CallbackId> {
    let id = with_engine(lua, |e| e.callback(name))?;
    let key = lua.create_registry_value(func)?;
    app_data(lua)?.bindings.borrow_mut().insert(id, key);
    Ok(id)
}

/// Turn a callback argument into a scheduler callback name.
///
/// Strings name a global function; it is captured the first time the name is
/// scheduled, unless `engine.register_callback` bound one already. A name with
/// no Lua function but a Rust-side registration is passed through. Function
/// values get a fresh anonymous name. Returns `None` (after a warning) if no
/// function can be found.
fn resolve_callback(lua: &Lua, op: &str, callback: LuaValue) -> LuaResult<Option<String>> {
    match callback {
        LuaValue::String(s) => {
            let name = s.to_string_lossy();
            let bound = with_engine(lua, |e| e.callback_id(&name).ok())?
                .is_some_and(|id| {
                    app_data(lua)
                        .map(|data| data.bindings.borrow().contains_key(&id))
                        .unwrap_or(false)
                });
            if bound {
                return Ok(Some(name));
            }
            match lua.globals().get::<Option<LuaFunction>>(name.as_str())? {
                Some(func) => {
                    bind_function(lua, &name, func)?;
                    Ok(Some(name))
                }
                // Registered on the Rust side (Engine::on_timer or a bare name).
                None if with_engine(lua, |e| e.callback_id(&name).is_ok())? => Ok(Some(name)),
                None => {
                    warn!(target: "lua", "{op}: no function named '{name}'");
                    Ok(None)
                }
            }
        }
        LuaValue::Function(func) => {
            let data = app_data(lua)?;
            let n = data.anonymous.get() + 1;
            data.anonymous.set(n);
            drop(data);
            let name = format!("<lua function #{n}>");
            bind_function(lua, &name, func)?;
            Ok(Some(name))
        }
        other => {
            warn!(target: "lua", "{op}: callback must be a function or a function name, got {}", other.type_name());
            Ok(None)
        }
    }
}

/// Registers a Lua function that runs one engine operation.
macro_rules! register_op {
    ($table:expr, $lua:expr, $name:literal, |$args:pat_param| $arg_ty:ty, |$engine:ident| $body:expr) => {
        $table.set(
            $name,
            $lua.create_function(|lua, $args: $arg_ty| with_engine(lua, |$engine| $body))?,
        )?;
    };
}

/// Lua interpreter plus the engine session it drives.
pub struct LuaRuntime {
    lua: Lua,
    update_function: String,
}

impl LuaRuntime {
    /// Creates a new Lua runtime, an engine session from `config`, and
    /// registers the `engine` table.
    ///
    /// # Errors
    ///
    /// Returns an error if Lua initialization or API registration fails.
    pub fn new(config: &EngineConfig) -> LuaResult<Self> {
        Self::from_engine(Engine::new(config), config.update_function.clone())
    }

    /// Wrap an existing engine session.
    pub fn from_engine(engine: Engine, update_function: String) -> LuaResult<Self> {
        let lua = Lua::new();

        lua.load(r#"package.path = "./scripts/?.lua;./scripts/?/init.lua;" .. package.path"#)
            .exec()?;

        lua.set_app_data(LuaAppData {
            engine: RefCell::new(engine),
            bindings: RefCell::new(FxHashMap::default()),
            anonymous: Cell::new(0),
        });

        let runtime = Self {
            lua,
            update_function,
        };
        runtime.register_base_api()?;
        runtime.register_entity_api()?;
        runtime.register_component_api()?;
        runtime.register_collision_api()?;
        runtime.register_timer_api()?;
        runtime.register_clock_api()?;
        runtime.register_input_api()?;
        runtime.register_ui_api()?;

        Ok(runtime)
    }

    /// Registers the base `engine` table with logging functions.
    fn register_base_api(&self) -> LuaResult<()> {
        let engine = self.lua.create_table()?;

        // engine.log(message) - General purpose logging
        engine.set(
            "log",
            self.lua.create_function(|_, msg: String| {
                info!(target: "lua", "{}", msg);
                Ok(())
            })?,
        )?;

        engine.set(
            "log_debug",
            self.lua.create_function(|_, msg: String| {
                debug!(target: "lua", "{}", msg);
                Ok(())
            })?,
        )?;

        engine.set(
            "log_info",
            self.lua.create_function(|_, msg: String| {
                info!(target: "lua", "{}", msg);
                Ok(())
            })?,
        )?;

        engine.set(
            "log_warn",
            self.lua.create_function(|_, msg: String| {
                warn!(target: "lua", "{}", msg);
                Ok(())
            })?,
        )?;

        engine.set(
            "log_error",
            self.lua.create_function(|_, msg: String| {
                error!(target: "lua", "{}", msg);
                Ok(())
            })?,
        )?;

        self.lua.globals().set("engine", engine)?;

        Ok(())
    }

    fn register_entity_api(&self) -> LuaResult<()> {
        let engine: LuaTable = self.lua.globals().get("engine")?;

        register_op!(engine, self.lua, "init_engine", |fps| f32, |e| e.init_engine(fps));
        register_op!(engine, self.lua, "create_entity", |()| (), |e| e.create_entity());
        register_op!(engine, self.lua, "destroy_entity", |id| u32, |e| e.destroy_entity(id));
        register_op!(engine, self.lua, "entity_count", |()| (), |e| e.entity_count());
        register_op!(engine, self.lua, "quit", |()| (), |e| e.quit());
        register_op!(engine, self.lua, "is_running", |()| (), |e| e.is_running());

        Ok(())
    }

    fn register_component_api(&self) -> LuaResult<()> {
        let engine: LuaTable = self.lua.globals().get("engine")?;

        register_op!(engine, self.lua, "add_position",
            |(id, x, y)| (u32, f32, f32), |e| e.add_position(id, x, y));

        // engine.add_render(id, { width, height, color = {r, g, b}, shape })
        engine.set(
            "add_render",
            self.lua.create_function(|lua, (id, props): (u32, LuaTable)| {
                match tables::render_props(&props) {
                    Ok(props) => with_engine(lua, |e| e.add_render(id, props)),
                    Err(err) => {
                        warn!(target: "lua", "add_render: bad props: {err}");
                        Ok(false)
                    }
                }
            })?,
        )?;

        // engine.add_hitbox(id, { width, height, offset_x?, offset_y?, layer?, active? })
        engine.set(
            "add_hitbox",
            self.lua.create_function(|lua, (id, props): (u32, LuaTable)| {
                match tables::hitbox_props(&props) {
                    Ok(props) => with_engine(lua, |e| e.add_hitbox(id, props)),
                    Err(err) => {
                        warn!(target: "lua", "add_hitbox: bad props: {err}");
                        Ok(false)
                    }
                }
            })?,
        )?;

        // engine.add_controllable(id, { movement_speed, input_type, bounds })
        engine.set(
            "add_controllable",
            self.lua.create_function(|lua, (id, props): (u32, LuaTable)| {
                match tables::controllable_props(&props) {
                    Ok(props) => with_engine(lua, |e| e.add_controllable(id, props)),
                    Err(err) => {
                        warn!(target: "lua", "add_controllable: bad props: {err}");
                        Ok(false)
                    }
                }
            })?,
        )?;

        register_op!(engine, self.lua, "remove_position", |id| u32, |e| e.remove_position(id));
        register_op!(engine, self.lua, "remove_render", |id| u32, |e| e.remove_render(id));
        register_op!(engine, self.lua, "remove_hitbox", |id| u32, |e| e.remove_hitbox(id));
        register_op!(engine, self.lua, "remove_controllable",
            |id| u32, |e| e.remove_controllable(id));

        engine.set(
            "get_position",
            self.lua.create_function(|lua, id: u32| {
                let value = with_engine(lua, |e| e.get_position(id))?;
                tables::optional(lua, value, tables::position_table)
            })?,
        )?;
        engine.set(
            "get_render",
            self.lua.create_function(|lua, id: u32| {
                let value = with_engine(lua, |e| e.get_render(id))?;
                tables::optional(lua, value, tables::render_table)
            })?,
        )?;
        engine.set(
            "get_hitbox",
            self.lua.create_function(|lua, id: u32| {
                let value = with_engine(lua, |e| e.get_hitbox(id))?;
                tables::optional(lua, value, tables::hitbox_table)
            })?,
        )?;
        engine.set(
            "get_controllable",
            self.lua.create_function(|lua, id: u32| {
                let value = with_engine(lua, |e| e.get_controllable(id))?;
                tables::optional(lua, value, tables::controllable_table)
            })?,
        )?;

        register_op!(engine, self.lua, "set_entity_position",
            |(id, x, y)| (u32, f32, f32), |e| e.set_entity_position(id, x, y));
        register_op!(engine, self.lua, "set_entity_color",
            |(id, r, g, b)| (u32, f32, f32, f32), |e| e.set_entity_color(id, r, g, b));
        register_op!(engine, self.lua, "set_hitbox_active",
            |(id, active)| (u32, bool), |e| e.set_hitbox_active(id, active));

        Ok(())
    }

    fn register_collision_api(&self) -> LuaResult<()> {
        let engine: LuaTable = self.lua.globals().get("engine")?;

        // engine.poll_collision_events() -> { {entity_a, entity_b}, ... }
        engine.set(
            "poll_collision_events",
            self.lua.create_function(|lua, ()| {
                let events = with_engine(lua, |e| e.poll_collision_events())?;
                tables::collision_list(lua, &events)
            })?,
        )?;

        register_op!(engine, self.lua, "set_layer_interaction",
            |(a, b, interact)| (u32, u32, bool), |e| e.set_layer_interaction(a, b, interact));
        register_op!(engine, self.lua, "layers_interact",
            |(a, b)| (u32, u32), |e| e.layers_interact(a, b));

        Ok(())
    }

    fn register_timer_api(&self) -> LuaResult<()> {
        let engine: LuaTable = self.lua.globals().get("engine")?;

        // engine.register_callback(name, fn) - bind fn to a callback name
        engine.set(
            "register_callback",
            self.lua
                .create_function(|lua, (name, func): (String, LuaFunction)| {
                    Ok(bind_function(lua, &name, func)?.0)
                })?,
        )?;

        // engine.schedule_repeating_event(interval_ms, callback) -> timer id | nil
        engine.set(
            "schedule_repeating_event",
            self.lua
                .create_function(|lua, (interval_ms, callback): (i64, LuaValue)| {
                    match resolve_callback(lua, "schedule_repeating_event", callback)? {
                        Some(name) => {
                            with_engine(lua, |e| e.schedule_repeating_event(interval_ms, &name))
                        }
                        None => Ok(None),
                    }
                })?,
        )?;

        // engine.schedule_repeating_event_for(entity, interval_ms, callback) -> timer id | nil
        engine.set(
            "schedule_repeating_event_for",
            self.lua.create_function(
                |lua, (entity, interval_ms, callback): (u32, i64, LuaValue)| {
                    match resolve_callback(lua, "schedule_repeating_event_for", callback)? {
                        Some(name) => with_engine(lua, |e| {
                            e.schedule_repeating_event_for(entity, interval_ms, &name)
                        }),
                        None => Ok(None),
                    }
                },
            )?,
        )?;

        // engine.schedule_event(delay_ms, callback) -> timer id | nil
        engine.set(
            "schedule_event",
            self.lua
                .create_function(|lua, (delay_ms, callback): (i64, LuaValue)| {
                    match resolve_callback(lua, "schedule_event", callback)? {
                        Some(name) => with_engine(lua, |e| e.schedule_event(delay_ms, &name)),
                        None => Ok(None),
                    }
                })?,
        )?;

        register_op!(engine, self.lua, "cancel_event", |id| u32, |e| e.cancel_event(id));

        Ok(())
    }

    fn register_clock_api(&self) -> LuaResult<()> {
        let engine: LuaTable = self.lua.globals().get("engine")?;

        register_op!(engine, self.lua, "get_fps", |()| (), |e| e.get_fps());
        register_op!(engine, self.lua, "get_instant_fps", |()| (), |e| e.get_instant_fps());
        register_op!(engine, self.lua, "get_total_frames", |()| (), |e| e.get_total_frames());
        register_op!(engine, self.lua, "get_uptime", |()| (), |e| e.get_uptime());
        register_op!(engine, self.lua, "get_target_fps", |()| (), |e| e.get_target_fps());
        engine.set(
            "get_frame_stats",
            self.lua.create_function(|lua, ()| {
                let stats = with_engine(lua, |e| e.get_frame_stats())?;
                tables::frame_stats_table(lua, stats)
            })?,
        )?;
        register_op!(engine, self.lua, "set_target_fps", |fps| f32, |e| e.set_target_fps(fps));

        Ok(())
    }

    fn register_input_api(&self) -> LuaResult<()> {
        let engine: LuaTable = self.lua.globals().get("engine")?;

        register_op!(engine, self.lua, "set_input",
            |(input_type, direction, pressed)| (String, String, bool),
            |e| e.set_input(&input_type, &direction, pressed));

        Ok(())
    }

    fn register_ui_api(&self) -> LuaResult<()> {
        let engine: LuaTable = self.lua.globals().get("engine")?;

        // engine.show_text(text, x, y, { fontSize, color, alignment }) -> handle | nil
        engine.set(
            "show_text",
            self.lua.create_function(
                |lua, (text, x, y, options): (String, f32, f32, Option<LuaTable>)| {
                    let options = tables::text_options(options)?;
                    with_engine(lua, |e| e.show_text(&text, x, y, options))
                },
            )?,
        )?;

        register_op!(engine, self.lua, "hide_text", |handle| u32, |e| e.hide_text(handle));
        register_op!(engine, self.lua, "clear_ui", |()| (), |e| e.clear_ui());

        Ok(())
    }

    /// Run `f` against the engine session.
    ///
    /// # Errors
    ///
    /// Fails if called from inside an `engine.*` function (the engine is borrowed).
    pub fn engine<R>(&self, f: impl FnOnce(&mut Engine) -> R) -> LuaResult<R> {
        with_engine(&self.lua, f)
    }

    fn lua_callback_for(&self, fire: TimerFired) -> LuaResult<Option<LuaFunction>> {
        let data = app_data(&self.lua)?;
        let bindings = data.bindings.borrow();
        match bindings.get(&fire.callback) {
            Some(key) => Ok(Some(self.lua.registry_value(key)?)),
            None => Ok(None),
        }
    }

    /// Advance one frame, run due timer callbacks, then the update function.
    ///
    /// Lua errors are logged and never stop the frame. Returns how many timer
    /// callbacks ran.
    pub fn step(&self, dt: Duration) -> usize {
        let fires = match self.engine(|e| e.tick(dt)) {
            Ok(fires) => fires,
            Err(e) => {
                error!("tick failed: {e}");
                return 0;
            }
        };

        let mut dispatched = 0;
        for fire in fires {
            // A callback earlier in this tick may have cancelled this timer
            // or destroyed its owner.
            if !self.engine(|e| e.claim_fire(&fire)).unwrap_or(false) {
                continue;
            }
            match self.lua_callback_for(fire) {
                Ok(Some(func)) => {
                    let entity = fire.entity.map(|id| id.raw());
                    if let Err(e) = func.call::<()>((fire.timer.0, entity)) {
                        error!(target: "lua", "timer callback {} failed: {e}", fire.timer);
                    }
                    dispatched += 1;
                }
                Ok(None) => {
                    // Rust handlers bound through Engine::on_timer.
                    if self.engine(|e| e.dispatch_one(fire)).unwrap_or(false) {
                        dispatched += 1;
                    } else {
                        warn!("{} fired but no callback is bound", fire.timer);
                    }
                }
                Err(e) => error!("timer {} lookup failed: {e}", fire.timer),
            }
        }

        if self.has_function(&self.update_function) {
            if let Err(e) = self.call_function::<_, ()>(&self.update_function, dt.as_secs_f64()) {
                error!(target: "lua", "{} failed: {e}", self.update_function);
            }
        }

        dispatched
    }

    /// Run the frame loop at the engine's target rate until `engine.quit()`
    /// or `max_frames`. Returns the number of frames run.
    pub fn run(&self, max_frames: Option<u64>) -> u64 {
        let budget = |rt: &Self| {
            rt.engine(|e| e.clock().frame_duration())
                .unwrap_or(Duration::from_millis(16))
        };
        let running = |rt: &Self| rt.engine(|e| e.is_running()).unwrap_or(false);

        let mut pacer = FramePacer::new(budget(self));
        let mut frames = 0;
        info!("Lua frame loop started");
        while running(self) && max_frames.is_none_or(|max| frames < max) {
            let dt = pacer.begin();
            self.step(dt);
            frames += 1;
            pacer.finish(budget(self));
        }
        info!("Lua frame loop stopped after {frames} frames");
        frames
    }

    /// Loads and executes a Lua script from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or the script has syntax/runtime errors.
    pub fn run_script(&self, path: &str) -> LuaResult<()> {
        let script = std::fs::read_to_string(path)
            .map_err(|e| LuaError::ExternalError(std::sync::Arc::new(e)))?;
        self.lua.load(&script).set_name(path).exec()
    }

    /// Executes a chunk of Lua source.
    pub fn exec(&self, source: &str) -> LuaResult<()> {
        self.lua.load(source).exec()
    }

    /// Calls a global Lua function by name with the given arguments.
    ///
    /// # Errors
    ///
    /// Returns an error if the function doesn't exist or execution fails.
    pub fn call_function<A, R>(&self, name: &str, args: A) -> LuaResult<R>
    where
        A: IntoLuaMulti,
        R: FromLuaMulti,
    {
        let func: LuaFunction = self.lua.globals().get(name)?;
        func.call(args)
    }

    /// Checks if a global function exists.
    pub fn has_function(&self, name: &str) -> bool {
        self.lua.globals().get::<LuaFunction>(name).is_ok()
    }

    /// Returns a reference to the underlying Lua state.
    pub fn lua(&self) -> &Lua {
        &self.lua
    }

    /// End the session: stop the loop and join the UI sink.
    pub fn shutdown(&self) {
        if let Err(e) = self.engine(|e| e.shutdown()) {
            error!("shutdown failed: {e}");
        }
    }
}
