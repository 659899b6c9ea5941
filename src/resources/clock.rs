//! Frame clock and timing statistics.
//!
//! [`Clock`] is advanced exactly once per tick by
//! [`advance_clock`](crate::systems::time::advance_clock). It accumulates
//! simulation uptime as a [`Duration`] so that millisecond timer math stays
//! exact, and keeps a sliding window of recent frame deltas for the
//! averaged frame rate.
//!
//! `target_fps` only affects pacing (see [`Engine::run`](crate::engine::Engine::run)).
//! Changing it never resets the frame counter or uptime.

use std::collections::VecDeque;
use std::time::Duration;

use bevy_ecs::prelude::Resource;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

pub const DEFAULT_TARGET_FPS: f32 = 60.0;
pub const DEFAULT_FPS_WINDOW: usize = 120;
/// Slowest accepted target: one frame every ten seconds.
pub const MIN_TARGET_FPS: f32 = 0.1;

/// True for a finite target frame rate of at least [`MIN_TARGET_FPS`].
pub fn is_valid_target_fps(fps: f32) -> bool {
    fps.is_finite() && fps >= MIN_TARGET_FPS
}

/// Summary of the frame-time window.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FrameStats {
    pub avg_fps: f32,
    pub instant_fps: f32,
    /// Seconds.
    pub avg_frame_time: f32,
    pub min_frame_time: f32,
    pub max_frame_time: f32,
    pub total_frames: u64,
    pub uptime: f64,
}

#[derive(Resource, Debug, Clone)]
pub struct Clock {
    target_fps: f32,
    total_frames: u64,
    uptime: Duration,
    delta: Duration,
    frame_times: VecDeque<Duration>,
    window: usize,
}

impl Default for Clock {
    fn default() -> Self {
        Self::new(DEFAULT_TARGET_FPS, DEFAULT_FPS_WINDOW)
    }
}

impl Clock {
    pub fn new(target_fps: f32, window: usize) -> Self {
        let window = window.max(1);
        let target_fps = if is_valid_target_fps(target_fps) {
            target_fps
        } else {
            DEFAULT_TARGET_FPS
        };
        Self {
            target_fps,
            total_frames: 0,
            uptime: Duration::ZERO,
            delta: Duration::ZERO,
            frame_times: VecDeque::with_capacity(window),
            window,
        }
    }

    /// Record one frame of `dt`. Uptime saturates at [`Duration::MAX`].
    pub fn advance(&mut self, dt: Duration) {
        self.delta = dt;
        self.uptime = self.uptime.saturating_add(dt);
        self.total_frames += 1;
        self.frame_times.push_back(dt);
        while self.frame_times.len() > self.window {
            self.frame_times.pop_front();
        }
    }

    pub fn set_target_fps(&mut self, fps: f32) -> Result<()> {
        if !is_valid_target_fps(fps) {
            return Err(EngineError::InvalidArgument(format!(
                "target fps must be a finite number of at least {MIN_TARGET_FPS}, got {fps}"
            )));
        }
        self.target_fps = fps;
        Ok(())
    }

    pub fn target_fps(&self) -> f32 {
        self.target_fps
    }

    /// Wall time budget of one frame at the current target.
    pub fn frame_duration(&self) -> Duration {
        Duration::try_from_secs_f64(1.0 / f64::from(self.target_fps))
            .unwrap_or(Duration::from_secs_f64(1.0 / f64::from(DEFAULT_TARGET_FPS)))
    }

    pub fn total_frames(&self) -> u64 {
        self.total_frames
    }

    pub fn uptime(&self) -> Duration {
        self.uptime
    }

    pub fn uptime_secs(&self) -> f64 {
        self.uptime.as_secs_f64()
    }

    /// Whole milliseconds of uptime, saturating at `u64::MAX`.
    pub fn uptime_ms(&self) -> u64 {
        u64::try_from(self.uptime.as_millis()).unwrap_or(u64::MAX)
    }

    pub fn delta(&self) -> Duration {
        self.delta
    }

    pub fn delta_secs(&self) -> f32 {
        self.delta.as_secs_f32()
    }

    /// Reciprocal of the most recent frame delta; 0 before the first frame.
    pub fn instant_fps(&self) -> f32 {
        let secs = self.delta.as_secs_f32();
        if secs > 0.0 { 1.0 / secs } else { 0.0 }
    }

    /// Frame rate averaged over the sample window.
    pub fn average_fps(&self) -> f32 {
        let avg = self.average_frame_time();
        if avg > 0.0 { 1.0 / avg } else { 0.0 }
    }

    fn average_frame_time(&self) -> f32 {
        if self.frame_times.is_empty() {
            return 0.0;
        }
        let total = self
            .frame_times
            .iter()
            .fold(Duration::ZERO, |acc, dt| acc.saturating_add(*dt));
        total.as_secs_f32() / self.frame_times.len() as f32
    }

    pub fn stats(&self) -> FrameStats {
        let min = self.frame_times.iter().min().copied().unwrap_or_default();
        let max = self.frame_times.iter().max().copied().unwrap_or_default();
        FrameStats {
            avg_fps: self.average_fps(),
            instant_fps: self.instant_fps(),
            avg_frame_time: self.average_frame_time(),
            min_frame_time: min.as_secs_f32(),
            max_frame_time: max.as_secs_f32(),
            total_frames: self.total_frames,
            uptime: self.uptime_secs(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-3;

    #[test]
    fn test_fresh_clock_reports_zero() {
        let clock = Clock::default();
        assert_eq!(clock.total_frames(), 0);
        assert_eq!(clock.instant_fps(), 0.0);
        assert_eq!(clock.average_fps(), 0.0);
        assert_eq!(clock.target_fps(), 60.0);
    }

    #[test]
    fn test_instant_fps_uses_last_delta() {
        let mut clock = Clock::default();
        clock.advance(Duration::from_millis(20));
        clock.advance(Duration::from_millis(10));
        assert!((clock.instant_fps() - 100.0).abs() < EPSILON);
        assert!((clock.average_fps() - 1.0 / 0.015).abs() < 0.01);
    }

    #[test]
    fn test_window_drops_old_samples() {
        let mut clock = Clock::new(60.0, 2);
        clock.advance(Duration::from_millis(100));
        clock.advance(Duration::from_millis(10));
        clock.advance(Duration::from_millis(10));
        assert!((clock.average_fps() - 100.0).abs() < EPSILON);
        let stats = clock.stats();
        assert_eq!(stats.total_frames, 3);
        assert!((stats.max_frame_time - 0.010).abs() < EPSILON);
    }

    #[test]
    fn test_set_target_fps_keeps_counters() {
        let mut clock = Clock::default();
        for _ in 0..10 {
            clock.advance(Duration::from_millis(16));
        }
        clock.set_target_fps(120.0).unwrap();
        assert_eq!(clock.total_frames(), 10);
        assert_eq!(clock.uptime_ms(), 160);
        assert_eq!(clock.target_fps(), 120.0);
    }

    #[test]
    fn test_set_target_fps_rejects_bad_values() {
        let mut clock = Clock::default();
        assert!(clock.set_target_fps(0.0).is_err());
        assert!(clock.set_target_fps(-30.0).is_err());
        assert!(clock.set_target_fps(f32::NAN).is_err());
        assert!(clock.set_target_fps(1e-30).is_err());
        assert_eq!(clock.target_fps(), 60.0);
        assert_eq!(Clock::new(1e-30, 10).target_fps(), 60.0);
    }

    #[test]
    fn test_slowest_target_has_a_frame_budget() {
        let mut clock = Clock::default();
        clock.set_target_fps(MIN_TARGET_FPS).unwrap();
        let budget = clock.frame_duration().as_secs_f64();
        assert!((budget - 10.0).abs() < 1e-3);
    }

    #[test]
    fn test_huge_frames_saturate_uptime() {
        let mut clock = Clock::default();
        clock.advance(Duration::MAX);
        clock.advance(Duration::from_millis(16));
        assert_eq!(clock.uptime(), Duration::MAX);
        assert_eq!(clock.uptime_ms(), u64::MAX);
        assert_eq!(clock.total_frames(), 2);
        assert!(clock.average_fps() >= 0.0);
    }

    #[test]
    fn test_frame_duration_tracks_target() {
        let mut clock = Clock::default();
        clock.set_target_fps(50.0).unwrap();
        let budget = clock.frame_duration().as_micros() as i64;
        assert!((budget - 20_000).abs() <= 1);
    }
}
