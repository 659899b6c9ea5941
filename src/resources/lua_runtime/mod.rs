//! Lua scripting runtime.
//!
//! This module provides the Lua integration layer, exposing the engine's
//! operation surface through the global `engine` table in Lua scripts.
//!
//! - [`tables`] - conversions between Lua tables and component props
//! - `runtime` - the [`LuaRuntime`] host and the `engine` table API
//!
//! # Example
//!
//! ```lua
//! local player = engine.create_entity()
//! engine.add_position(player, 50, 50)
//! engine.add_hitbox(player, { width = 10, height = 10 })
//!
//! engine.schedule_repeating_event(2000, function(timer_id)
//!     engine.log("two seconds passed")
//! end)
//!
//! function game_update(dt)
//!     for _, hit in ipairs(engine.poll_collision_events()) do
//!         engine.log(hit.entity_a .. " touches " .. hit.entity_b)
//!     end
//! end
//! ```

mod runtime;
pub mod tables;

pub use runtime::LuaRuntime;
