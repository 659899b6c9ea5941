//! Conversions between Lua tables and engine values.
//!
//! Component props arrive as plain Lua tables:
//!
//! ```lua
//! engine.add_render(player, { width = 30, height = 30, color = {0, 0, 1}, shape = "square" })
//! engine.add_hitbox(player, { width = 10, height = 10, layer = 0 })
//! ```
//!
//! Missing required fields raise a Lua error; callers in `runtime` catch it
//! and report `false` so a script's frame keeps running.

use mlua::{Lua, Result as LuaResult, Table as LuaTable, Value as LuaValue};

use crate::components::controllable::{BoundsType, Controllable, InputType};
use crate::components::hitbox::Hitbox;
use crate::components::position::Position;
use crate::components::render::Render;
use crate::events::collision::CollisionEventData;
use crate::ops::props::{ControllableProps, HitboxProps, RenderProps};
use crate::resources::clock::FrameStats;
use crate::resources::ui::{TextAlign, TextOptions};

fn rgb(table: &LuaTable) -> LuaResult<[f32; 3]> {
    Ok([table.get(1)?, table.get(2)?, table.get(3)?])
}

pub fn render_props(table: &LuaTable) -> LuaResult<RenderProps> {
    Ok(RenderProps {
        width: table.get("width")?,
        height: table.get("height")?,
        color: rgb(&table.get::<LuaTable>("color")?)?,
        shape: table
            .get::<Option<String>>("shape")?
            .unwrap_or_else(|| "square".to_string()),
    })
}

pub fn hitbox_props(table: &LuaTable) -> LuaResult<HitboxProps> {
    Ok(HitboxProps {
        width: table.get("width")?,
        height: table.get("height")?,
        offset_x: table.get("offset_x")?,
        offset_y: table.get("offset_y")?,
        layer: table.get("layer")?,
        active: table.get::<Option<bool>>("active")?.unwrap_or(true),
    })
}

pub fn controllable_props(table: &LuaTable) -> LuaResult<ControllableProps> {
    Ok(ControllableProps {
        movement_speed: table.get("movement_speed")?,
        input_type: table.get::<Option<String>>("input_type")?.unwrap_or_default(),
        bounds: table.get::<Option<String>>("bounds")?.unwrap_or_default(),
    })
}

/// Accepts both `font_size` and `fontSize`.
pub fn text_options(options: Option<LuaTable>) -> LuaResult<TextOptions> {
    let mut out = TextOptions::default();
    let Some(table) = options else {
        return Ok(out);
    };
    if let Some(size) = table.get::<Option<f32>>("font_size")? {
        out.font_size = size;
    } else if let Some(size) = table.get::<Option<f32>>("fontSize")? {
        out.font_size = size;
    }
    if let Some(color) = table.get::<Option<LuaTable>>("color")? {
        out.color = rgb(&color)?;
    }
    if let Some(alignment) = table.get::<Option<String>>("alignment")? {
        out.alignment = match alignment.as_str() {
            "center" => TextAlign::Center,
            "right" => TextAlign::Right,
            _ => TextAlign::Left,
        };
    }
    Ok(out)
}

pub fn position_table(lua: &Lua, position: Position) -> LuaResult<LuaTable> {
    let t = lua.create_table()?;
    t.set("x", position.x)?;
    t.set("y", position.y)?;
    Ok(t)
}

pub fn render_table(lua: &Lua, render: Render) -> LuaResult<LuaTable> {
    let t = lua.create_table()?;
    t.set("width", render.width)?;
    t.set("height", render.height)?;
    t.set("color", lua.create_sequence_from(render.color.to_array())?)?;
    t.set("shape", format!("{:?}", render.shape).to_lowercase())?;
    Ok(t)
}

pub fn hitbox_table(lua: &Lua, hitbox: Hitbox) -> LuaResult<LuaTable> {
    let t = lua.create_table()?;
    t.set("width", hitbox.width)?;
    t.set("height", hitbox.height)?;
    t.set("offset_x", hitbox.offset_x)?;
    t.set("offset_y", hitbox.offset_y)?;
    t.set("layer", hitbox.layer)?;
    t.set("active", hitbox.active)?;
    Ok(t)
}

pub fn controllable_table(lua: &Lua, controllable: Controllable) -> LuaResult<LuaTable> {
    let t = lua.create_table()?;
    t.set("movement_speed", controllable.movement_speed)?;
    let input_type = match controllable.input_type {
        InputType::ArrowKeys => "arrow_keys",
        InputType::Wasd => "wasd",
    };
    t.set("input_type", input_type)?;
    let bounds = match controllable.bounds {
        BoundsType::Screen => "screen",
        BoundsType::None => "none",
    };
    t.set("bounds", bounds)?;
    Ok(t)
}

/// Frame times are in seconds, uptime too.
pub fn frame_stats_table(lua: &Lua, stats: FrameStats) -> LuaResult<LuaTable> {
    let t = lua.create_table()?;
    t.set("avg_fps", stats.avg_fps)?;
    t.set("instant_fps", stats.instant_fps)?;
    t.set("avg_frame_time", stats.avg_frame_time)?;
    t.set("min_frame_time", stats.min_frame_time)?;
    t.set("max_frame_time", stats.max_frame_time)?;
    t.set("total_frames", stats.total_frames)?;
    t.set("uptime", stats.uptime)?;
    Ok(t)
}

/// `{ {entity_a = 1, entity_b = 2}, ... }`
pub fn collision_list(lua: &Lua, events: &[CollisionEventData]) -> LuaResult<LuaTable> {
    let list = lua.create_table()?;
    for (i, event) in events.iter().enumerate() {
        let t = lua.create_table()?;
        t.set("entity_a", event.entity_a)?;
        t.set("entity_b", event.entity_b)?;
        list.set(i + 1, t)?;
    }
    Ok(list)
}

/// `nil` for `None`, a table otherwise.
pub fn optional<T>(
    lua: &Lua,
    value: Option<T>,
    to_table: impl FnOnce(&Lua, T) -> LuaResult<LuaTable>,
) -> LuaResult<LuaValue> {
    match value {
        Some(v) => Ok(LuaValue::Table(to_table(lua, v)?)),
        None => Ok(LuaValue::Nil),
    }
}
