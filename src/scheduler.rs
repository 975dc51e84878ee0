use crate::error::{Result, SneakError};

/// Upper bound on the simulation rate; one tick per millisecond.
pub const MAX_TICKS_PER_SECOND: f64 = 1000.0;

/// Turns frame timestamps into a whole number of simulation ticks.
///
/// Timestamps are milliseconds on any monotonic clock. Time that does not
/// fill a whole tick is carried over to the next frame.
#[derive(Clone, Debug, PartialEq)]
pub struct Scheduler {
    ms_per_tick: f64,
    max_frame_delta: f64,
    accumulator: f64,
    last_timestamp: Option<f64>,
}

impl Scheduler {
    pub fn new(ticks_per_second: f64, max_frame_delta: f64) -> Result<Self> {
        if !(ticks_per_second > 0.0 && ticks_per_second <= MAX_TICKS_PER_SECOND) {
            return Err(SneakError::InvalidTickRate(ticks_per_second));
        }
        if !max_frame_delta.is_finite() || max_frame_delta <= 0.0 {
            return Err(SneakError::InvalidFrameDelta(max_frame_delta));
        }
        Ok(Scheduler {
            ms_per_tick: 1000.0 / ticks_per_second,
            max_frame_delta,
            accumulator: 0.0,
            last_timestamp: None,
        })
    }

    pub fn ms_per_tick(&self) -> f64 {
        self.ms_per_tick
    }

    pub fn accumulator(&self) -> f64 {
        self.accumulator
    }

    /// Feeds one frame into the accumulator and drains whole ticks.
    ///
    /// `tick` runs once per drained tick and returns whether the simulation
    /// is still running; draining stops as soon as it says no. When
    /// `running` is false nothing is consumed and the clock is re-baselined
    /// on the next running frame, so paused time never turns into ticks.
    pub fn advance(
        &mut self,
        timestamp: f64,
        running: bool,
        mut tick: impl FnMut() -> bool,
    ) -> u32 {
        if !running {
            self.last_timestamp = None;
            return 0;
        }

        let delta = match self.last_timestamp {
            Some(last) => (timestamp - last).clamp(0.0, self.max_frame_delta),
            None => 0.0,
        };
        self.last_timestamp = Some(timestamp);
        self.accumulator += delta;

        let mut ticks = 0;
        while self.accumulator >= self.ms_per_tick {
            self.accumulator -= self.ms_per_tick;
            ticks += 1;
            if !tick() {
                break;
            }
        }
        ticks
    }

    /// Progress through the current tick, in `[0, 1)`.
    pub fn fraction(&self) -> f64 {
        (self.accumulator / self.ms_per_tick).clamp(0.0, 1.0 - f64::EPSILON)
    }

    pub fn reset(&mut self) {
        self.accumulator = 0.0;
        self.last_timestamp = None;
    }
}
