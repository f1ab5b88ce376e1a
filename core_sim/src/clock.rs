//! Fixed-step logic clock, decoupled from the render cadence.

use std::time::{Duration, Instant};

/// Accumulator clock driving the dual-rate loop.
///
/// Logic ticks run at a fixed period; rendering happens whenever the host
/// asks, smoothed by an interpolation factor that is only ever applied to
/// display positions, never fed back into the simulation.
#[derive(Debug, Clone)]
pub struct SimClock {
    tick_period: Duration,
    started: Instant,
    last_advance: Instant,
    last_tick: Option<Instant>,
    accumulator: Duration,
    max_ticks_per_advance: u32,
}

impl SimClock {
    pub fn new(tick_period: Duration, max_ticks_per_advance: u32, now: Instant) -> Self {
        Self {
            tick_period,
            started: now,
            last_advance: now,
            last_tick: None,
            accumulator: Duration::ZERO,
            max_ticks_per_advance: max_ticks_per_advance.max(1),
        }
    }

    pub fn tick_period(&self) -> Duration {
        self.tick_period
    }

    /// Number of logic ticks due at `now`. Capped per call; when the cap is
    /// hit the remainder is dropped rather than allowed to spiral.
    pub fn ticks_due(&mut self, now: Instant) -> u32 {
        let elapsed = now.saturating_duration_since(self.last_advance);
        self.last_advance = now;
        self.accumulator += elapsed;

        let mut ticks = 0;
        while self.accumulator >= self.tick_period && ticks < self.max_ticks_per_advance {
            self.accumulator -= self.tick_period;
            ticks += 1;
        }
        if ticks == self.max_ticks_per_advance {
            self.accumulator = Duration::ZERO;
        }
        if ticks > 0 {
            self.last_tick = Some(now - self.accumulator);
        }
        ticks
    }

    /// Render interpolation factor in `[-1, 0]`:
    /// `(now - last_tick) / tick_period - 1`, clamped so display positions
    /// never run ahead of the next tick.
    pub fn interpolation(&self, now: Instant) -> f32 {
        let Some(last_tick) = self.last_tick else {
            return -1.0;
        };
        let since = now.saturating_duration_since(last_tick).as_secs_f32();
        let factor = since / self.tick_period.as_secs_f32() - 1.0;
        factor.clamp(-1.0, 0.0)
    }

    /// Milliseconds since the clock started; the timeline attack indicators
    /// and other render-side decays are measured on.
    pub fn elapsed_ms(&self, now: Instant) -> u64 {
        now.saturating_duration_since(self.started).as_millis() as u64
    }
}
