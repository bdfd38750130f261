use std::time::Duration;

/// Shortest half-duration a fade phase may have; keeps `elapsed / span` defined.
pub const MIN_HALF_DURATION: Duration = Duration::from_micros(100);

/// Elapsed-time accumulator for one fade phase, driven by frame deltas.
#[derive(Debug, Clone)]
pub(crate) struct FadeClock {
    elapsed: Duration,
    span: Duration,
}

impl FadeClock {
    pub fn new(span: Duration) -> Self {
        Self {
            elapsed: Duration::ZERO,
            span: span.max(MIN_HALF_DURATION),
        }
    }

    /// Adds `delta` and returns whatever overshoots the end of the phase.
    pub fn advance(&mut self, delta: Duration) -> Duration {
        let total = self.elapsed.saturating_add(delta);
        let overflow = total.saturating_sub(self.span);
        self.elapsed = total.min(self.span);
        overflow
    }

    /// Phase progress, clamped to `[0, 1]`.
    pub fn progress(&self) -> f32 {
        if self.is_finished() {
            return 1.0;
        }
        (self.elapsed.as_secs_f32() / self.span.as_secs_f32()).clamp(0.0, 1.0)
    }

    pub fn is_finished(&self) -> bool {
        self.elapsed >= self.span
    }
}

/// Linear interpolation with exact endpoints and `t` clamped to `[0, 1]`.
pub(crate) fn lerp(from: f32, to: f32, t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    from * (1.0 - t) + to * t
}
