//! Built-in square demo.
//!
//! A blue player square steers toward a green goal. When the player's hitbox
//! overlaps the goal's, the round is won: the player freezes, a banner shows,
//! and a one-shot timer starts the next round with the goal moved to a random
//! spot. An autopilot feeds [`InputState`](crate::resources::input::InputState)
//! so the demo plays itself without a keyboard.
//!
//! The demo only uses the public operation surface, the same calls a script
//! would make.

use std::cell::RefCell;
use std::rc::Rc;

use log::info;

use crate::engine::Engine;
use crate::ops::props::{ControllableProps, HitboxProps, RenderProps};
use crate::resources::engineconfig::EngineConfig;
use crate::resources::ui::{TextAlign, TextOptions};

const PLAYER_START: (f32, f32) = (50.0, 50.0);
const GOAL_START: (f32, f32) = (350.0, 250.0);
const PLAYER_SPEED: f32 = 120.0;
const RESET_DELAY_MS: i64 = 2000;
const PULSE_MS: i64 = 500;
const STATS_MS: i64 = 2000;
/// Autopilot stops pressing an axis this close to the target.
const DEADBAND: f32 = 2.0;

fn text(font_size: f32, color: [f32; 3], alignment: TextAlign) -> TextOptions {
    TextOptions {
        font_size,
        color,
        alignment,
    }
}

fn player_controllable() -> ControllableProps {
    ControllableProps {
        movement_speed: PLAYER_SPEED,
        input_type: "arrow_keys".into(),
        bounds: "screen".into(),
    }
}

pub struct SquareGame {
    pub player: u32,
    pub goal: u32,
    pub won: bool,
    pub wins: u32,
    pub autopilot: bool,
    instructions: Option<u32>,
    objective: Option<u32>,
    goal_lit: bool,
    rng: fastrand::Rng,
}

impl SquareGame {
    /// Create the entities, the UI and the timers. `seed` fixes goal placement.
    pub fn setup(engine: &mut Engine, seed: Option<u64>) -> Rc<RefCell<SquareGame>> {
        let player = engine.create_entity();
        engine.add_position(player, PLAYER_START.0, PLAYER_START.1);
        engine.add_render(
            player,
            RenderProps {
                width: 30.0,
                height: 30.0,
                color: [0.0, 0.0, 1.0],
                shape: "square".into(),
            },
        );
        engine.add_hitbox(
            player,
            HitboxProps {
                width: 10.0,
                height: 10.0,
                offset_x: None,
                offset_y: None,
                layer: Some(0),
                active: true,
            },
        );
        engine.add_controllable(player, player_controllable());

        let goal = engine.create_entity();
        engine.add_position(goal, GOAL_START.0, GOAL_START.1);
        engine.add_render(
            goal,
            RenderProps {
                width: 40.0,
                height: 40.0,
                color: [0.0, 1.0, 0.0],
                shape: "square".into(),
            },
        );
        engine.add_hitbox(
            goal,
            HitboxProps {
                width: 20.0,
                height: 20.0,
                offset_x: None,
                offset_y: None,
                layer: Some(0),
                active: true,
            },
        );

        let rng = match seed {
            Some(seed) => fastrand::Rng::with_seed(seed),
            None => fastrand::Rng::new(),
        };
        let game = Rc::new(RefCell::new(SquareGame {
            player,
            goal,
            won: false,
            wins: 0,
            autopilot: true,
            instructions: None,
            objective: None,
            goal_lit: false,
            rng,
        }));
        game.borrow_mut().show_initial_ui(engine);

        let g = game.clone();
        engine.on_timer("reset_round", move |engine, _| g.borrow_mut().reset(engine));

        let g = game.clone();
        engine.on_timer("pulse_goal", move |engine, fire| {
            let mut game = g.borrow_mut();
            game.goal_lit = !game.goal_lit;
            let [red, green, blue] = if game.goal_lit {
                [0.5, 1.0, 0.5]
            } else {
                [0.0, 1.0, 0.0]
            };
            if let Some(goal) = fire.entity {
                engine.set_entity_color(goal.raw(), red, green, blue);
            }
        });

        engine.on_timer("report_stats", |engine, fire| {
            if fire.skipped > 0 {
                info!("stats timer skipped {} fires", fire.skipped);
            }
            let stats = engine.get_frame_stats();
            info!(
                "fps {:.1} (instant {:.1}), frame {:.2}/{:.2}/{:.2}ms min/avg/max, {} frames, {:.1}s uptime, {} entities",
                stats.avg_fps,
                stats.instant_fps,
                stats.min_frame_time * 1000.0,
                stats.avg_frame_time * 1000.0,
                stats.max_frame_time * 1000.0,
                stats.total_frames,
                stats.uptime,
                engine.entity_count()
            );
        });

        engine.schedule_repeating_event_for(goal, PULSE_MS, "pulse_goal");
        engine.schedule_repeating_event(STATS_MS, "report_stats");

        info!("Game initialized: player={player}, goal={goal}");
        game
    }

    fn show_initial_ui(&mut self, engine: &mut Engine) {
        let grey = [0.8, 0.8, 0.8];
        engine.show_text(
            "Simple Square Game",
            400.0,
            30.0,
            text(20.0, [1.0, 1.0, 1.0], TextAlign::Center),
        );
        self.instructions = engine.show_text(
            "Use arrow keys to move the blue square",
            400.0,
            60.0,
            text(14.0, grey, TextAlign::Center),
        );
        self.objective = engine.show_text(
            "Get your center into the green goal to win!",
            400.0,
            85.0,
            text(14.0, grey, TextAlign::Center),
        );
    }

    /// Per-frame logic: steer, then check the win condition.
    pub fn update(&mut self, engine: &mut Engine) {
        if self.won {
            return;
        }
        if self.autopilot {
            self.steer(engine);
        }
        let reached = engine.poll_collision_events().iter().any(|hit| {
            (hit.entity_a == self.player && hit.entity_b == self.goal)
                || (hit.entity_a == self.goal && hit.entity_b == self.player)
        });
        if reached {
            self.handle_win(engine);
        }
    }

    fn steer(&self, engine: &mut Engine) {
        let (Some(p), Some(g)) = (engine.get_position(self.player), engine.get_position(self.goal))
        else {
            return;
        };
        let dx = g.x - p.x;
        let dy = g.y - p.y;
        engine.set_input("arrow_keys", "right", dx > DEADBAND);
        engine.set_input("arrow_keys", "left", dx < -DEADBAND);
        engine.set_input("arrow_keys", "down", dy > DEADBAND);
        engine.set_input("arrow_keys", "up", dy < -DEADBAND);
    }

    fn handle_win(&mut self, engine: &mut Engine) {
        self.won = true;
        self.wins += 1;
        info!("Player wins! Goal reached ({} so far)", self.wins);

        engine.remove_controllable(self.player);
        engine.release_all_input();

        for handle in [self.instructions.take(), self.objective.take()].into_iter().flatten() {
            engine.hide_text(handle);
        }
        engine.show_text(
            "YOU WIN!",
            400.0,
            200.0,
            text(32.0, [1.0, 1.0, 0.0], TextAlign::Center),
        );
        engine.show_text(
            "Great job! You reached the goal.",
            400.0,
            240.0,
            text(16.0, [1.0, 1.0, 1.0], TextAlign::Center),
        );
        engine.schedule_event(RESET_DELAY_MS, "reset_round");
    }

    /// Start a new round with the goal somewhere else.
    pub fn reset(&mut self, engine: &mut Engine) {
        info!("Resetting game...");
        self.won = false;
        engine.set_entity_position(self.player, PLAYER_START.0, PLAYER_START.1);
        let x = self.rng.u32(60..740) as f32;
        let y = self.rng.u32(140..560) as f32;
        engine.set_entity_position(self.goal, x, y);
        engine.add_controllable(self.player, player_controllable());
        engine.clear_ui();
        self.show_initial_ui(engine);
    }
}

/// Run the demo until `max_frames` (or forever). Returns the frames run.
pub fn run_square_game(config: &EngineConfig, max_frames: Option<u64>) -> u64 {
    let mut engine = Engine::new(config);
    engine.attach_ui_console();
    engine.init_engine(config.target_fps);

    let game = SquareGame::setup(&mut engine, None);
    let frames = engine.run(max_frames, |engine| game.borrow_mut().update(engine));

    info!("Rounds won: {}", game.borrow().wins);
    engine.shutdown();
    frames
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    const FRAME: Duration = Duration::from_millis(16);

    #[test]
    fn test_autopilot_wins_and_resets() {
        let mut engine = Engine::default();
        let game = SquareGame::setup(&mut engine, Some(7));

        let mut won_at = None;
        for frame in 0..600 {
            engine.step(FRAME);
            game.borrow_mut().update(&mut engine);
            if won_at.is_none() && game.borrow().won {
                won_at = Some(frame);
            }
        }
        assert!(won_at.is_some(), "autopilot never reached the goal");
        assert!(game.borrow().wins >= 1);
    }

    #[test]
    fn test_win_freezes_player() {
        let mut engine = Engine::default();
        let game = SquareGame::setup(&mut engine, Some(1));
        let (player, goal) = {
            let g = game.borrow();
            (g.player, g.goal)
        };
        engine.set_entity_position(player, GOAL_START.0, GOAL_START.1);
        engine.step(FRAME);
        game.borrow_mut().update(&mut engine);

        assert!(game.borrow().won);
        assert!(engine.get_controllable(player).is_none());
        assert!(engine.get_position(goal).is_some());
    }
}
