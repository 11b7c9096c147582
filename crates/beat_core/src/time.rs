//! Variable-step frame clock and the debug time-scale modifiers.
//!
//! Unlike a fixed-step simulation, every subsystem here advances by the real
//! wall-clock delta of the frame (scaled). Song position is derived from the
//! audio clock elsewhere, so there is no accumulator.

use std::time::Instant;

const FPS_SAMPLE_COUNT: usize = 60;
const LONG_FRAME_SECS: f32 = 0.25;

pub struct FrameClock {
    last_instant: Instant,
    pub real_dt: f32,
    pub total_time: f64,
    pub frame_count: u64,

    fps_samples: [f32; FPS_SAMPLE_COUNT],
    fps_sample_index: usize,
    pub smoothed_fps: f32,
    pub smoothed_frame_time_ms: f32,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    pub fn starting_at(start: Instant) -> Self {
        Self {
            last_instant: start,
            real_dt: 0.0,
            total_time: 0.0,
            frame_count: 0,
            fps_samples: [1.0 / 60.0; FPS_SAMPLE_COUNT],
            fps_sample_index: 0,
            smoothed_fps: 60.0,
            smoothed_frame_time_ms: 16.667,
        }
    }

    /// Unscaled seconds since the previous tick.
    pub fn tick(&mut self) -> f32 {
        self.tick_at(Instant::now())
    }

    pub fn tick_at(&mut self, now: Instant) -> f32 {
        self.real_dt = now.saturating_duration_since(self.last_instant).as_secs_f32();
        self.last_instant = now;

        if self.real_dt > LONG_FRAME_SECS {
            log::warn!("Frame took {:.1}ms", self.real_dt * 1000.0);
        }

        self.total_time += f64::from(self.real_dt);
        self.frame_count += 1;

        self.fps_samples[self.fps_sample_index] = self.real_dt;
        self.fps_sample_index = (self.fps_sample_index + 1) % FPS_SAMPLE_COUNT;
        let avg_dt: f32 = self.fps_samples.iter().sum::<f32>() / FPS_SAMPLE_COUNT as f32;
        self.smoothed_frame_time_ms = avg_dt * 1000.0;
        self.smoothed_fps = if avg_dt > 0.0 { 1.0 / avg_dt } else { 0.0 };

        self.real_dt
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

/// Debug time-scale derived from two held modifier keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeScale {
    Frozen,
    Slow,
    Normal,
    Fast,
}

impl TimeScale {
    /// Both held freezes time; one held speeds up or slows down by 4x.
    pub fn from_modifiers(fast_held: bool, slow_held: bool) -> Self {
        match (fast_held, slow_held) {
            (true, true) => Self::Frozen,
            (true, false) => Self::Fast,
            (false, true) => Self::Slow,
            (false, false) => Self::Normal,
        }
    }

    pub fn apply(self, dt: f32) -> f32 {
        match self {
            Self::Frozen => 0.0,
            Self::Slow => dt / 4.0,
            Self::Normal => dt,
            Self::Fast => dt * 4.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn tick_measures_elapsed_time() {
        let start = Instant::now();
        let mut clock = FrameClock::starting_at(start);
        let dt = clock.tick_at(start + Duration::from_millis(20));
        assert!((dt - 0.020).abs() < 1e-6);
        assert_eq!(clock.frame_count, 1);
        assert!((clock.total_time - 0.020).abs() < 1e-6);
    }

    #[test]
    fn tick_never_goes_negative() {
        let start = Instant::now() + Duration::from_secs(1);
        let mut clock = FrameClock::starting_at(start);
        assert_eq!(clock.tick_at(start - Duration::from_millis(5)), 0.0);
    }

    #[test]
    fn smoothed_fps_converges() {
        let start = Instant::now();
        let mut clock = FrameClock::starting_at(start);
        let mut now = start;
        for _ in 0..FPS_SAMPLE_COUNT {
            now += Duration::from_millis(10);
            clock.tick_at(now);
        }
        assert!((clock.smoothed_fps - 100.0).abs() < 0.5);
    }

    #[test]
    fn both_modifiers_freeze_time() {
        let scale = TimeScale::from_modifiers(true, true);
        assert_eq!(scale, TimeScale::Frozen);
        assert_eq!(scale.apply(0.016), 0.0);
    }

    #[test]
    fn single_modifiers_scale_by_four() {
        assert_eq!(TimeScale::from_modifiers(true, false).apply(0.5), 2.0);
        assert_eq!(TimeScale::from_modifiers(false, true).apply(0.5), 0.125);
    }

    #[test]
    fn no_modifier_leaves_delta_unscaled() {
        assert_eq!(TimeScale::from_modifiers(false, false).apply(0.016), 0.016);
    }
}
