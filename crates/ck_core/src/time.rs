use std::time::Instant;

/// Weight of the newest frame in the smoothed frame time.
const SMOOTHING: f64 = 0.05;

pub struct TimeState {
    pub tick_rate: f64,
    /// Longest frame fed into the accumulator; anything slower is clamped.
    pub max_frame_dt: f64,
    accumulator: f64,
    pub total_ticks: u64,
    pub frame_count: u64,
    pub steps_this_frame: u32,
    pub real_dt: f64,
    last_instant: Instant,
    pub smoothed_fps: f64,
    pub smoothed_frame_time_ms: f64,
}

impl TimeState {
    pub fn new() -> Self {
        Self::with_tick_rate(60.0)
    }

    pub fn with_tick_rate(tick_rate: f64) -> Self {
        let tick_rate = tick_rate.max(1.0);
        Self {
            tick_rate,
            max_frame_dt: 0.25,
            accumulator: 0.0,
            total_ticks: 0,
            frame_count: 0,
            steps_this_frame: 0,
            real_dt: 0.0,
            last_instant: Instant::now(),
            smoothed_fps: tick_rate,
            smoothed_frame_time_ms: 1000.0 / tick_rate,
        }
    }

    pub fn tick_dt(&self) -> f64 {
        1.0 / self.tick_rate
    }

    pub fn begin_frame(&mut self) {
        let now = Instant::now();
        let real_dt = now.duration_since(self.last_instant).as_secs_f64();
        self.last_instant = now;
        self.advance(real_dt);
    }

    /// Feed `real_dt` seconds of wall time. Split from `begin_frame` so the
    /// stepping can be driven without a wall clock.
    pub fn advance(&mut self, real_dt: f64) {
        self.real_dt = real_dt;
        if self.real_dt > self.max_frame_dt {
            log::warn!(
                "Frame took {:.1}ms, clamping to {:.0}ms",
                self.real_dt * 1000.0,
                self.max_frame_dt * 1000.0
            );
            self.real_dt = self.max_frame_dt;
        }

        self.accumulator += self.real_dt;
        self.steps_this_frame = 0;
        self.frame_count += 1;

        let frame_ms = self.real_dt * 1000.0;
        self.smoothed_frame_time_ms += (frame_ms - self.smoothed_frame_time_ms) * SMOOTHING;
        self.smoothed_fps = if self.smoothed_frame_time_ms > 0.0 {
            1000.0 / self.smoothed_frame_time_ms
        } else {
            0.0
        };
    }

    /// Consume every whole tick in the accumulator and return how many there were.
    pub fn drain_steps(&mut self) -> u32 {
        let dt = self.tick_dt();
        while self.accumulator >= dt {
            self.accumulator -= dt;
            self.total_ticks += 1;
            self.steps_this_frame += 1;
        }
        self.steps_this_frame
    }

    pub fn real_dt_ms(&self) -> f64 {
        self.real_dt * 1000.0
    }
}

impl Default for TimeState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_refresh_at_tick_rate_yields_one_tick() {
        let mut time = TimeState::new();
        time.advance(1.0 / 60.0 + 1e-9);
        assert_eq!(time.drain_steps(), 1);
        assert_eq!(time.total_ticks, 1);
    }

    #[test]
    fn short_frames_accumulate_into_a_tick() {
        let mut time = TimeState::new();
        time.advance(0.01);
        assert_eq!(time.drain_steps(), 0);
        time.advance(0.01);
        assert_eq!(time.drain_steps(), 1);
    }

    #[test]
    fn slow_display_catches_up_with_two_ticks() {
        let mut time = TimeState::new();
        time.advance(1.0 / 30.0 + 1e-9);
        assert_eq!(time.drain_steps(), 2);
    }

    #[test]
    fn long_frame_is_clamped() {
        let mut time = TimeState::new();
        time.advance(5.0);
        assert!((time.real_dt - time.max_frame_dt).abs() < f64::EPSILON);
        // 0.25s at 60 Hz is 15 ticks, give or take float rounding.
        let steps = time.drain_steps();
        assert!((14..=15).contains(&steps), "got {steps} steps");
    }

    #[test]
    fn smoothed_fps_tracks_frame_rate() {
        let mut time = TimeState::new();
        for _ in 0..200 {
            time.advance(1.0 / 30.0);
        }
        assert!((time.smoothed_fps - 30.0).abs() < 0.5);
    }
}
