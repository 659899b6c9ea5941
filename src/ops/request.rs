//! JSON request/response form of the operation surface.
//!
//! A request is an object tagged by `"op"`:
//!
//! ```json
//! {"op": "add_position", "entity": 1, "x": 100.0, "y": 300.0}
//! {"op": "advance", "ms": 16}
//! ```
//!
//! Responses are plain JSON values: a bool, a number, `null`, an array of
//! collision pairs, the frame statistics, or the list of timers fired by an
//! `advance`. A request that does not parse, or an `advance` that would
//! overflow the uptime, yields `{"error": "..."}`.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::components::controllable::Controllable;
use crate::components::hitbox::{Hitbox, Layer};
use crate::components::position::Position;
use crate::engine::Engine;
use crate::events::collision::CollisionEventData;
use crate::events::timer::FiredTimerData;
use crate::resources::clock::FrameStats;
use crate::resources::ui::TextOptions;

use super::props::{ControllableProps, HitboxProps, RenderProps};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    InitEngine { target_fps: f32 },
    CreateEntity,
    DestroyEntity { entity: u32 },
    AddPosition { entity: u32, x: f32, y: f32 },
    AddRender { entity: u32, props: RenderProps },
    AddHitbox { entity: u32, props: HitboxProps },
    AddControllable { entity: u32, props: ControllableProps },
    RemovePosition { entity: u32 },
    RemoveRender { entity: u32 },
    RemoveHitbox { entity: u32 },
    RemoveControllable { entity: u32 },
    GetPosition { entity: u32 },
    GetRender { entity: u32 },
    GetHitbox { entity: u32 },
    GetControllable { entity: u32 },
    SetEntityPosition { entity: u32, x: f32, y: f32 },
    SetEntityColor { entity: u32, r: f32, g: f32, b: f32 },
    SetHitboxActive { entity: u32, active: bool },
    PollCollisionEvents,
    SetLayerInteraction { a: Layer, b: Layer, interact: bool },
    RegisterCallback { name: String },
    ScheduleRepeatingEvent { interval_ms: i64, callback: String },
    ScheduleRepeatingEventFor { entity: u32, interval_ms: i64, callback: String },
    ScheduleEvent { delay_ms: i64, callback: String },
    CancelEvent { id: u32 },
    GetFps,
    GetInstantFps,
    GetTotalFrames,
    GetUptime,
    GetTargetFps,
    GetFrameStats,
    SetTargetFps { fps: f32 },
    SetInput { input_type: String, direction: String, pressed: bool },
    ShowText {
        text: String,
        x: f32,
        y: f32,
        #[serde(default)]
        options: TextOptions,
    },
    HideText { handle: u32 },
    ClearUi,
    EntityCount,
    Quit,
    /// Host-only: step the engine by `ms` and report the timers that fired.
    Advance { ms: u64 },
}

/// Serializable view of a [`Render`](crate::components::render::Render).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderData {
    pub width: f32,
    pub height: f32,
    pub color: [f32; 3],
    pub shape: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HitboxData {
    pub width: f32,
    pub height: f32,
    pub offset_x: f32,
    pub offset_y: f32,
    pub layer: Layer,
    pub active: bool,
}

impl From<Hitbox> for HitboxData {
    fn from(h: Hitbox) -> Self {
        Self {
            width: h.width,
            height: h.height,
            offset_x: h.offset_x,
            offset_y: h.offset_y,
            layer: h.layer,
            active: h.active,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControllableData {
    pub movement_speed: f32,
    pub input_type: crate::components::controllable::InputType,
    pub bounds: crate::components::controllable::BoundsType,
}

impl From<Controllable> for ControllableData {
    fn from(c: Controllable) -> Self {
        Self {
            movement_speed: c.movement_speed,
            input_type: c.input_type,
            bounds: c.bounds,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OpResult {
    Unit,
    Bool(bool),
    Id(u32),
    MaybeId(Option<u32>),
    Count(u64),
    Number(f64),
    Position(Option<Position>),
    Render(Option<RenderData>),
    Hitbox(Option<HitboxData>),
    Controllable(Option<ControllableData>),
    Collisions(Vec<CollisionEventData>),
    Fired(Vec<FiredTimerData>),
    Stats(FrameStats),
    Error { error: String },
}

impl Engine {
    /// Step the engine and report fires by callback name. Rust handlers bound
    /// to those callbacks still run.
    pub fn advance(&mut self, dt: Duration) -> Vec<FiredTimerData> {
        let fires = self.tick(dt);
        let mut reported = Vec::with_capacity(fires.len());
        for fire in fires {
            if !self.claim_fire(&fire) {
                continue;
            }
            reported.push(FiredTimerData {
                timer: fire.timer.0,
                callback: self
                    .scheduler()
                    .callback_name(fire.callback)
                    .unwrap_or_default()
                    .to_string(),
                entity: fire.entity.map(|e| e.raw()),
            });
            self.dispatch_one(fire);
        }
        reported
    }

    pub fn execute(&mut self, op: Operation) -> OpResult {
        use Operation as Op;
        match op {
            Op::InitEngine { target_fps } => OpResult::Bool(self.init_engine(target_fps)),
            Op::CreateEntity => OpResult::Id(self.create_entity()),
            Op::DestroyEntity { entity } => OpResult::Bool(self.destroy_entity(entity)),
            Op::AddPosition { entity, x, y } => OpResult::Bool(self.add_position(entity, x, y)),
            Op::AddRender { entity, props } => OpResult::Bool(self.add_render(entity, props)),
            Op::AddHitbox { entity, props } => OpResult::Bool(self.add_hitbox(entity, props)),
            Op::AddControllable { entity, props } => {
                OpResult::Bool(self.add_controllable(entity, props))
            }
            Op::RemovePosition { entity } => OpResult::Bool(self.remove_position(entity)),
            Op::RemoveRender { entity } => OpResult::Bool(self.remove_render(entity)),
            Op::RemoveHitbox { entity } => OpResult::Bool(self.remove_hitbox(entity)),
            Op::RemoveControllable { entity } => OpResult::Bool(self.remove_controllable(entity)),
            Op::GetPosition { entity } => OpResult::Position(self.get_position(entity)),
            Op::GetRender { entity } => OpResult::Render(self.get_render(entity).map(|r| {
                RenderData {
                    width: r.width,
                    height: r.height,
                    color: r.color.to_array(),
                    shape: format!("{:?}", r.shape).to_lowercase(),
                }
            })),
            Op::GetHitbox { entity } => OpResult::Hitbox(self.get_hitbox(entity).map(Into::into)),
            Op::GetControllable { entity } => {
                OpResult::Controllable(self.get_controllable(entity).map(Into::into))
            }
            Op::SetEntityPosition { entity, x, y } => {
                OpResult::Bool(self.set_entity_position(entity, x, y))
            }
            Op::SetEntityColor { entity, r, g, b } => {
                OpResult::Bool(self.set_entity_color(entity, r, g, b))
            }
            Op::SetHitboxActive { entity, active } => {
                OpResult::Bool(self.set_hitbox_active(entity, active))
            }
            Op::PollCollisionEvents => OpResult::Collisions(self.poll_collision_events()),
            Op::SetLayerInteraction { a, b, interact } => {
                self.set_layer_interaction(a, b, interact);
                OpResult::Unit
            }
            Op::RegisterCallback { name } => OpResult::Id(self.register_callback(&name)),
            Op::ScheduleRepeatingEvent {
                interval_ms,
                callback,
            } => OpResult::MaybeId(self.schedule_repeating_event(interval_ms, &callback)),
            Op::ScheduleRepeatingEventFor {
                entity,
                interval_ms,
                callback,
            } => OpResult::MaybeId(self.schedule_repeating_event_for(
                entity,
                interval_ms,
                &callback,
            )),
            Op::ScheduleEvent { delay_ms, callback } => {
                OpResult::MaybeId(self.schedule_event(delay_ms, &callback))
            }
            Op::CancelEvent { id } => OpResult::Bool(self.cancel_event(id)),
            Op::GetFps => OpResult::Number(f64::from(self.get_fps())),
            Op::GetInstantFps => OpResult::Number(f64::from(self.get_instant_fps())),
            Op::GetTotalFrames => OpResult::Count(self.get_total_frames()),
            Op::GetUptime => OpResult::Number(self.get_uptime()),
            Op::GetTargetFps => OpResult::Number(f64::from(self.get_target_fps())),
            Op::GetFrameStats => OpResult::Stats(self.get_frame_stats()),
            Op::SetTargetFps { fps } => {
                self.set_target_fps(fps);
                OpResult::Unit
            }
            Op::SetInput {
                input_type,
                direction,
                pressed,
            } => OpResult::Bool(self.set_input(&input_type, &direction, pressed)),
            Op::ShowText {
                text,
                x,
                y,
                options,
            } => OpResult::MaybeId(self.show_text(&text, x, y, options)),
            Op::HideText { handle } => OpResult::Bool(self.hide_text(handle)),
            Op::ClearUi => {
                self.clear_ui();
                OpResult::Unit
            }
            Op::EntityCount => OpResult::Count(self.entity_count() as u64),
            Op::Quit => {
                self.quit();
                OpResult::Unit
            }
            Op::Advance { ms } => {
                if self.clock().uptime_ms().checked_add(ms).is_none() {
                    log::warn!("advance: {ms}ms would overflow the uptime");
                    return OpResult::Error {
                        error: format!("advance of {ms}ms would overflow the uptime"),
                    };
                }
                OpResult::Fired(self.advance(Duration::from_millis(ms)))
            }
        }
    }

    /// Parse one JSON request, run it, and serialize the response.
    pub fn execute_json(&mut self, request: &str) -> String {
        let result = match serde_json::from_str::<Operation>(request) {
            Ok(op) => self.execute(op),
            Err(e) => {
                log::warn!("rejected request: {e}");
                OpResult::Error {
                    error: e.to_string(),
                }
            }
        };
        serde_json::to_string(&result)
            .unwrap_or_else(|e| format!(r#"{{"error":"unserializable result: {e}"}}"#))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_tag_format() {
        let op: Operation =
            serde_json::from_str(r#"{"op": "add_position", "entity": 1, "x": 2, "y": 3}"#)
                .unwrap();
        assert_eq!(
            op,
            Operation::AddPosition {
                entity: 1,
                x: 2.0,
                y: 3.0
            }
        );
        let op: Operation = serde_json::from_str(r#"{"op": "poll_collision_events"}"#).unwrap();
        assert_eq!(op, Operation::PollCollisionEvents);
    }

    #[test]
    fn test_unit_result_serializes_to_null() {
        assert_eq!(serde_json::to_string(&OpResult::Unit).unwrap(), "null");
        assert_eq!(serde_json::to_string(&OpResult::MaybeId(None)).unwrap(), "null");
    }

    #[test]
    fn test_bad_request_reports_error() {
        let mut engine = Engine::default();
        let out = engine.execute_json(r#"{"op": "teleport"}"#);
        assert!(out.starts_with(r#"{"error":"#));
    }
}
