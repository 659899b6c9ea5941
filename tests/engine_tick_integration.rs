//! Engine tick integration tests for collision polling, timers, the clock and
//! controllable movement, driven through `Engine::step`.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use frameloom::Engine;
use frameloom::components::entityid::EntityId;
use frameloom::events::collision::CollisionEventData;
use frameloom::ops::props::{ControllableProps, HitboxProps};
use frameloom::resources::engineconfig::EngineConfig;

const FRAME: Duration = Duration::from_millis(16);
const EPSILON: f32 = 1e-3;

fn approx_eq(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

fn hitbox(width: f32, height: f32) -> HitboxProps {
    HitboxProps {
        width,
        height,
        offset_x: None,
        offset_y: None,
        layer: None,
        active: true,
    }
}

fn on_layer(width: f32, height: f32, layer: u32) -> HitboxProps {
    HitboxProps {
        layer: Some(layer),
        ..hitbox(width, height)
    }
}

/// Spawn an entity with a position and a hitbox.
fn boxed(engine: &mut Engine, x: f32, y: f32, props: HitboxProps) -> u32 {
    let id = engine.create_entity();
    assert!(engine.add_position(id, x, y));
    assert!(engine.add_hitbox(id, props));
    id
}

fn pair(a: u32, b: u32) -> CollisionEventData {
    CollisionEventData {
        entity_a: a,
        entity_b: b,
    }
}

/// Count fires of `name` into a shared counter, recording uptime at each fire.
fn record_fires(engine: &mut Engine, name: &str) -> Rc<RefCell<Vec<u64>>> {
    let log = Rc::new(RefCell::new(Vec::new()));
    let sink = log.clone();
    engine.on_timer(name, move |engine, _| {
        sink.borrow_mut().push(engine.clock().uptime_ms());
    });
    log
}

// ==================== Collision polling ====================

#[test]
fn test_disjoint_boxes_are_not_reported() {
    let mut engine = Engine::default();
    boxed(&mut engine, 0.0, 0.0, hitbox(10.0, 10.0));
    boxed(&mut engine, 100.0, 0.0, hitbox(10.0, 10.0));
    boxed(&mut engine, 0.0, 100.0, hitbox(10.0, 10.0));

    engine.step(FRAME);
    assert!(engine.poll_collision_events().is_empty());
}

#[test]
fn test_reference_scenario_move_into_overlap() {
    let mut engine = Engine::default();
    let a = boxed(&mut engine, 100.0, 300.0, hitbox(20.0, 20.0));
    let b = boxed(&mut engine, 400.0, 300.0, hitbox(20.0, 20.0));

    engine.step(FRAME);
    assert!(engine.poll_collision_events().is_empty());

    assert!(engine.set_entity_position(a, 400.0, 300.0));
    engine.step(FRAME);
    assert_eq!(engine.poll_collision_events(), vec![pair(a, b)]);
}

#[test]
fn test_pair_is_canonical_regardless_of_which_entity_moves() {
    let mut engine = Engine::default();
    let a = boxed(&mut engine, 0.0, 0.0, hitbox(20.0, 20.0));
    let b = boxed(&mut engine, 200.0, 0.0, hitbox(20.0, 20.0));

    // The higher id moves onto the lower one.
    engine.set_entity_position(b, 5.0, 0.0);
    engine.step(FRAME);
    let events = engine.poll_collision_events();
    assert_eq!(events, vec![pair(a, b)]);
    assert!(events[0].entity_a < events[0].entity_b);
}

#[test]
fn test_poll_is_level_triggered_and_idempotent() {
    let mut engine = Engine::default();
    let a = boxed(&mut engine, 0.0, 0.0, hitbox(20.0, 20.0));
    let b = boxed(&mut engine, 10.0, 0.0, hitbox(20.0, 20.0));

    engine.step(FRAME);
    // Repeated polls within a tick see the same state.
    assert_eq!(engine.poll_collision_events(), vec![pair(a, b)]);
    assert_eq!(engine.poll_collision_events(), vec![pair(a, b)]);

    // Still overlapping on the next tick: still reported.
    engine.step(FRAME);
    assert_eq!(engine.poll_collision_events(), vec![pair(a, b)]);

    engine.set_entity_position(b, 500.0, 0.0);
    engine.step(FRAME);
    assert!(engine.poll_collision_events().is_empty());
}

#[test]
fn test_touching_edges_do_not_collide() {
    let mut engine = Engine::default();
    // Spans [0, 20] and [20, 40] on x.
    boxed(&mut engine, 10.0, 10.0, hitbox(20.0, 20.0));
    let b = boxed(&mut engine, 30.0, 10.0, hitbox(20.0, 20.0));

    engine.step(FRAME);
    assert!(engine.poll_collision_events().is_empty());

    engine.set_entity_position(b, 29.5, 10.0);
    engine.step(FRAME);
    assert_eq!(engine.poll_collision_events().len(), 1);
}

#[test]
fn test_many_overlaps_reported_once_each_in_order() {
    let mut engine = Engine::default();
    let ids: Vec<u32> = (0..4)
        .map(|_| boxed(&mut engine, 50.0, 50.0, hitbox(10.0, 10.0)))
        .collect();

    engine.step(FRAME);
    let events = engine.poll_collision_events();
    let expected: Vec<_> = (0..4)
        .flat_map(|i| (i + 1..4).map(move |j| (i, j)))
        .map(|(i, j)| pair(ids[i], ids[j]))
        .collect();
    assert_eq!(events, expected);
}

#[test]
fn test_destroyed_entity_leaves_poll_results() {
    let mut engine = Engine::default();
    let a = boxed(&mut engine, 0.0, 0.0, hitbox(20.0, 20.0));
    let b = boxed(&mut engine, 5.0, 0.0, hitbox(20.0, 20.0));

    engine.step(FRAME);
    assert_eq!(engine.poll_collision_events(), vec![pair(a, b)]);

    // Gone from results immediately, before the next tick.
    assert!(engine.destroy_entity(b));
    assert!(engine.poll_collision_events().is_empty());

    engine.step(FRAME);
    assert!(engine.poll_collision_events().is_empty());
    assert!(!engine.set_entity_position(b, 0.0, 0.0));
    assert!(!engine.destroy_entity(b));
}

#[test]
fn test_created_and_destroyed_in_same_tick_never_collides() {
    let mut engine = Engine::default();
    boxed(&mut engine, 0.0, 0.0, hitbox(20.0, 20.0));
    let ghost = boxed(&mut engine, 0.0, 0.0, hitbox(20.0, 20.0));
    assert!(engine.destroy_entity(ghost));

    engine.step(FRAME);
    assert!(engine.poll_collision_events().is_empty());
    assert_eq!(engine.entity_count(), 1);
}

#[test]
fn test_ids_are_not_reused() {
    let mut engine = Engine::default();
    let a = engine.create_entity();
    engine.destroy_entity(a);
    let b = engine.create_entity();
    assert_ne!(a, b);
    assert!(b > a);
    assert_ne!(a, EntityId::INVALID.raw());
}

#[test]
fn test_inactive_hitbox_is_skipped() {
    let mut engine = Engine::default();
    let a = boxed(&mut engine, 0.0, 0.0, hitbox(20.0, 20.0));
    let b = boxed(&mut engine, 5.0, 0.0, hitbox(20.0, 20.0));

    assert!(engine.set_hitbox_active(b, false));
    engine.step(FRAME);
    assert!(engine.poll_collision_events().is_empty());

    assert!(engine.set_hitbox_active(b, true));
    engine.step(FRAME);
    assert_eq!(engine.poll_collision_events(), vec![pair(a, b)]);
}

#[test]
fn test_entity_without_position_is_ignored() {
    let mut engine = Engine::default();
    boxed(&mut engine, 0.0, 0.0, hitbox(20.0, 20.0));
    let floating = engine.create_entity();
    assert!(engine.add_hitbox(floating, hitbox(1000.0, 1000.0)));

    engine.step(FRAME);
    assert!(engine.poll_collision_events().is_empty());
}

#[test]
fn test_layer_interaction_filters_pairs() {
    let mut engine = Engine::default();
    let player = boxed(&mut engine, 0.0, 0.0, on_layer(20.0, 20.0, 1));
    let bullet = boxed(&mut engine, 5.0, 0.0, on_layer(20.0, 20.0, 2));

    engine.set_layer_interaction(1, 2, false);
    assert!(!engine.layers_interact(2, 1));
    engine.step(FRAME);
    assert!(engine.poll_collision_events().is_empty());

    engine.set_layer_interaction(2, 1, true);
    engine.step(FRAME);
    assert_eq!(engine.poll_collision_events(), vec![pair(player, bullet)]);
}

#[test]
fn test_configured_deny_list() {
    let mut config = EngineConfig::new();
    config
        .load_from_str("[collision]\ndefault_interact = true\ndeny = 3:3\n")
        .unwrap();
    let mut engine = Engine::new(&config);
    boxed(&mut engine, 0.0, 0.0, on_layer(20.0, 20.0, 3));
    boxed(&mut engine, 0.0, 0.0, on_layer(20.0, 20.0, 3));

    engine.step(FRAME);
    assert!(engine.poll_collision_events().is_empty());
}

// ==================== Timers ====================

#[test]
fn test_repeating_timer_fires_on_interval() {
    let mut engine = Engine::default();
    let fires = record_fires(&mut engine, "spawn_wave");
    assert!(engine.schedule_repeating_event(2000, "spawn_wave").is_some());

    // 16ms frames: 2000ms is frame 125, 4000ms is frame 250.
    for _ in 0..260 {
        engine.step(FRAME);
    }
    assert_eq!(*fires.borrow(), vec![2000, 4000]);
}

#[test]
fn test_stall_produces_single_catch_up_fire() {
    let mut engine = Engine::default();
    let fires = record_fires(&mut engine, "heartbeat");
    engine.schedule_repeating_event(2000, "heartbeat");

    assert_eq!(engine.step(Duration::from_millis(5000)), 1);
    assert_eq!(fires.borrow().len(), 1);

    // The next fire keeps its phase: 6000ms, not 7000ms.
    assert_eq!(engine.step(Duration::from_millis(900)), 0);
    assert_eq!(engine.step(Duration::from_millis(100)), 1);
    assert_eq!(*fires.borrow(), vec![5000, 6000]);
}

#[test]
fn test_cancel_before_due_prevents_fires() {
    let mut engine = Engine::default();
    let fires = record_fires(&mut engine, "blink");
    let id = engine.schedule_repeating_event(100, "blink").unwrap();

    engine.step(Duration::from_millis(50));
    assert!(engine.cancel_event(id));
    for _ in 0..10 {
        engine.step(Duration::from_millis(100));
    }
    assert!(fires.borrow().is_empty());

    // Cancelling again or cancelling an unknown id is a no-op.
    assert!(!engine.cancel_event(id));
    assert!(!engine.cancel_event(9999));
}

#[test]
fn test_cancel_after_fire_keeps_that_fire() {
    let mut engine = Engine::default();
    let fires = Rc::new(RefCell::new(0));
    let count = fires.clone();
    engine.on_timer("once_then_stop", move |engine, fire| {
        *count.borrow_mut() += 1;
        // Cancel from inside the fire: this fire already happened.
        assert!(engine.cancel_event(fire.timer.0));
    });
    engine.schedule_repeating_event(100, "once_then_stop");

    for _ in 0..10 {
        engine.step(Duration::from_millis(100));
    }
    assert_eq!(*fires.borrow(), 1);
}

#[test]
fn test_cancel_in_same_tick_suppresses_later_fire() {
    let mut engine = Engine::default();
    let victim_fires = record_fires(&mut engine, "victim");
    // Scheduled first so it fires first within the tick.
    let victim = Rc::new(RefCell::new(None));
    let target = victim.clone();
    engine.on_timer("killer", move |engine, _| {
        if let Some(id) = *target.borrow() {
            engine.cancel_event(id);
        }
    });
    engine.schedule_repeating_event(100, "killer");
    *victim.borrow_mut() = engine.schedule_repeating_event(100, "victim");

    engine.step(Duration::from_millis(100));
    assert!(victim_fires.borrow().is_empty());
}

#[test]
fn test_cancel_in_same_tick_suppresses_later_one_shot() {
    let mut engine = Engine::default();
    let log = Rc::new(RefCell::new(Vec::new()));
    let reset = Rc::new(RefCell::new(None));

    let sink = log.clone();
    let target = reset.clone();
    engine.on_timer("win", move |engine, _| {
        sink.borrow_mut().push("win");
        if let Some(id) = *target.borrow() {
            let outcome = if engine.cancel_event(id) {
                "cancel_ok"
            } else {
                "cancel_refused"
            };
            sink.borrow_mut().push(outcome);
        }
    });
    let sink = log.clone();
    engine.on_timer("reset_round", move |_, _| sink.borrow_mut().push("reset_round"));

    // Same due time; the earlier id runs first.
    engine.schedule_event(100, "win");
    *reset.borrow_mut() = engine.schedule_event(100, "reset_round");

    assert_eq!(engine.step(Duration::from_millis(100)), 1);
    assert_eq!(*log.borrow(), vec!["win", "cancel_ok"]);

    engine.step(Duration::from_millis(100));
    assert_eq!(log.borrow().len(), 2);
}

#[test]
fn test_destroying_owner_in_same_tick_drops_its_fires() {
    let mut engine = Engine::default();
    let payloads = Rc::new(RefCell::new(Vec::new()));
    let goal = engine.create_entity();

    engine.on_timer("despawn_goal", move |engine, _| {
        assert!(engine.destroy_entity(goal));
    });
    let sink = payloads.clone();
    let pulse = engine.on_timer("pulse", move |_, fire| {
        sink.borrow_mut().push(fire.entity.map(|e| e.raw()));
    });

    engine.schedule_event(100, "despawn_goal");
    engine.fire_after(100, pulse, Some(EntityId(goal))).unwrap();
    assert!(engine.schedule_repeating_event_for(goal, 100, "pulse").is_some());

    assert_eq!(engine.step(Duration::from_millis(100)), 1);
    assert!(payloads.borrow().is_empty());
}

#[test]
fn test_one_shot_fires_once() {
    let mut engine = Engine::default();
    let fires = record_fires(&mut engine, "reset_round");
    engine.schedule_event(2000, "reset_round");

    for _ in 0..300 {
        engine.step(FRAME);
    }
    assert_eq!(*fires.borrow(), vec![2000]);
}

#[test]
fn test_unknown_callback_is_refused() {
    let mut engine = Engine::default();
    assert_eq!(engine.schedule_repeating_event(100, "nope"), None);
    assert_eq!(engine.schedule_event(100, "nope"), None);
}

#[test]
fn test_bad_intervals_are_refused() {
    let mut engine = Engine::default();
    engine.register_callback("tick");
    assert_eq!(engine.schedule_repeating_event(0, "tick"), None);
    assert_eq!(engine.schedule_repeating_event(-5, "tick"), None);
    assert_eq!(engine.schedule_event(-1, "tick"), None);
    assert!(engine.schedule_event(0, "tick").is_some());
}

#[test]
fn test_entity_timer_carries_owner_and_dies_with_it() {
    let mut engine = Engine::default();
    let owners = Rc::new(RefCell::new(Vec::new()));
    let sink = owners.clone();
    engine.on_timer("pulse", move |_, fire| {
        sink.borrow_mut().push(fire.entity.map(|e| e.raw()));
    });
    let goal = engine.create_entity();
    engine.schedule_repeating_event_for(goal, 100, "pulse");

    engine.step(Duration::from_millis(100));
    assert_eq!(*owners.borrow(), vec![Some(goal)]);

    engine.destroy_entity(goal);
    engine.step(Duration::from_millis(100));
    engine.step(Duration::from_millis(100));
    assert_eq!(owners.borrow().len(), 1);
}

#[test]
fn test_timer_ids_are_unique() {
    let mut engine = Engine::default();
    engine.register_callback("a");
    let first = engine.schedule_event(10, "a").unwrap();
    let second = engine.schedule_repeating_event(10, "a").unwrap();
    assert_ne!(first, second);
}

// ==================== Clock ====================

#[test]
fn test_target_fps_change_keeps_counters() {
    let mut engine = Engine::default();
    engine.init_engine(60.0);

    // 15 seconds of 60 fps frames (900 x 16.666ms rounded to whole micros).
    let frame = Duration::from_micros(16_667);
    for _ in 0..900 {
        engine.step(frame);
    }
    let frames_before = engine.get_total_frames();
    let uptime_before = engine.get_uptime();
    assert_eq!(frames_before, 900);
    assert!((uptime_before - 15.0).abs() < 0.01);

    engine.set_target_fps(120.0);
    assert!(approx_eq(engine.get_target_fps(), 120.0));
    assert_eq!(engine.get_total_frames(), frames_before);
    assert_eq!(engine.get_uptime(), uptime_before);

    engine.step(Duration::from_micros(8_333));
    assert_eq!(engine.get_total_frames(), frames_before + 1);
}

#[test]
fn test_invalid_target_fps_is_ignored() {
    let mut engine = Engine::default();
    engine.set_target_fps(0.0);
    engine.set_target_fps(f32::NAN);
    assert!(approx_eq(engine.get_target_fps(), 60.0));
}

#[test]
fn test_tiny_target_fps_is_refused_and_loop_keeps_running() {
    let mut config = EngineConfig::default();
    config.target_fps = 1000.0;
    let mut engine = Engine::new(&config);

    engine.set_target_fps(1e-30);
    engine.set_target_fps(f32::MIN_POSITIVE);
    assert!(approx_eq(engine.get_target_fps(), 1000.0));
    assert_eq!(engine.run(Some(1), |_| {}), 1);
}

#[test]
fn test_huge_frame_does_not_panic() {
    let mut engine = Engine::default();
    let fires = record_fires(&mut engine, "heartbeat");
    engine.schedule_repeating_event(1, "heartbeat");

    assert_eq!(engine.step(Duration::from_millis(u64::MAX)), 1);
    assert_eq!(*fires.borrow(), vec![u64::MAX]);

    engine.step(Duration::MAX);
    assert_eq!(engine.get_total_frames(), 2);
    assert!(engine.schedule_event(10, "heartbeat").is_some());
    assert!(engine.create_entity() > 0);
}

#[test]
fn test_frame_stats_report_min_and_max() {
    let mut engine = Engine::default();
    for ms in [10, 30, 20] {
        engine.step(Duration::from_millis(ms));
    }
    let stats = engine.get_frame_stats();
    assert!(approx_eq(stats.min_frame_time, 0.010));
    assert!(approx_eq(stats.max_frame_time, 0.030));
    assert!(approx_eq(stats.avg_frame_time, 0.020));
    assert_eq!(stats.total_frames, 3);
}

#[test]
fn test_fps_stats_follow_frame_time() {
    let mut engine = Engine::default();
    for _ in 0..10 {
        engine.step(Duration::from_millis(20));
    }
    assert!((engine.get_fps() - 50.0).abs() < 0.5);
    assert!((engine.get_instant_fps() - 50.0).abs() < 0.5);
}

// ==================== Movement ====================

fn player(engine: &mut Engine, x: f32, y: f32, bounds: &str) -> u32 {
    let id = engine.create_entity();
    engine.add_position(id, x, y);
    assert!(engine.add_controllable(
        id,
        ControllableProps {
            movement_speed: 100.0,
            input_type: "arrow_keys".into(),
            bounds: bounds.into(),
        },
    ));
    id
}

#[test]
fn test_controllable_moves_with_input() {
    let mut engine = Engine::default();
    let id = player(&mut engine, 100.0, 100.0, "screen");

    assert!(engine.set_input("arrow_keys", "right", true));
    engine.step(Duration::from_millis(500));
    let pos = engine.get_position(id).unwrap();
    assert!(approx_eq(pos.x, 150.0));
    assert!(approx_eq(pos.y, 100.0));

    // WASD input does not drive an arrow-key entity.
    engine.set_input("arrow_keys", "right", false);
    engine.set_input("wasd", "down", true);
    engine.step(Duration::from_millis(500));
    assert_eq!(engine.get_position(id).unwrap(), pos);
}

#[test]
fn test_screen_bounds_clamp_movement() {
    let mut engine = Engine::default();
    let id = player(&mut engine, 10.0, 10.0, "screen");
    engine.set_input("arrow_keys", "left", true);
    engine.set_input("arrow_keys", "up", true);
    engine.step(Duration::from_secs(1));
    let pos = engine.get_position(id).unwrap();
    assert!(approx_eq(pos.x, 0.0));
    assert!(approx_eq(pos.y, 0.0));

    let free = player(&mut engine, 10.0, 10.0, "none");
    engine.step(Duration::from_secs(1));
    assert!(engine.get_position(free).unwrap().x < 0.0);
}

#[test]
fn test_removed_controllable_stops_moving() {
    let mut engine = Engine::default();
    let id = player(&mut engine, 100.0, 100.0, "screen");
    engine.set_input("arrow_keys", "down", true);
    assert!(engine.remove_controllable(id));
    // Removing twice is still a success: the component is simply absent.
    assert!(engine.remove_controllable(id));
    engine.step(Duration::from_secs(1));
    assert_eq!(engine.get_position(id).unwrap().y, 100.0);
}

#[test]
fn test_movement_feeds_collision_in_same_tick() {
    let mut engine = Engine::default();
    let runner = player(&mut engine, 0.0, 0.0, "none");
    engine.add_hitbox(runner, hitbox(10.0, 10.0));
    let wall = boxed(&mut engine, 60.0, 0.0, hitbox(10.0, 10.0));

    engine.set_input("arrow_keys", "right", true);
    engine.step(Duration::from_millis(550));
    assert_eq!(engine.poll_collision_events(), vec![pair(runner, wall)]);
}

// ==================== Soft failures ====================

#[test]
fn test_unknown_entity_operations_fail_softly() {
    let mut engine = Engine::default();
    assert!(!engine.add_position(42, 0.0, 0.0));
    assert!(!engine.set_entity_color(42, 1.0, 0.0, 0.0));
    assert!(!engine.remove_controllable(42));
    assert!(engine.get_position(42).is_none());
    assert!(engine.schedule_repeating_event_for(42, 100, "x").is_none());

    // The loop still runs.
    engine.step(FRAME);
    assert_eq!(engine.get_total_frames(), 1);
}

#[test]
fn test_invalid_component_data_is_rejected() {
    let mut engine = Engine::default();
    let id = engine.create_entity();
    assert!(!engine.add_position(id, f32::NAN, 0.0));
    assert!(!engine.add_hitbox(id, hitbox(-1.0, 5.0)));
    assert!(!engine.set_entity_color(id, 1.0, 0.0, 0.0));
    assert!(engine.get_position(id).is_none());
    assert!(engine.get_hitbox(id).is_none());
}
