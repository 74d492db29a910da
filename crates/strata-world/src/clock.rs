use std::f64::consts::TAU;

/// Darkest point of the night, as a fraction of full daylight.
pub const DAYLIGHT_MIN: f32 = 480.0 / 1800.0;

/// Tick-driven day/night cycle. Starts at noon.
#[derive(Clone, Debug)]
pub struct DayClock {
    ticks: u64,
    day_length: u64,
}

impl DayClock {
    pub fn new(day_length: u64) -> Self {
        Self {
            ticks: 0,
            day_length: day_length.max(1),
        }
    }

    #[inline]
    pub fn step(&mut self) {
        self.ticks = self.ticks.wrapping_add(1);
    }

    #[inline]
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Sky brightness multiplier in `DAYLIGHT_MIN..=1`.
    pub fn daylight(&self) -> f32 {
        let phase = (self.ticks % self.day_length) as f64 / self.day_length as f64;
        let wave = 0.5 + 0.5 * (TAU * phase).cos();
        DAYLIGHT_MIN + (1.0 - DAYLIGHT_MIN) * wave as f32
    }
}
