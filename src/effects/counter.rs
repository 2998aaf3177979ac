use crate::config::COUNTER_TWEEN_MS;

/// Linear tween of a displayed counter, floored to whole coins.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CounterAnimation {
    from: u64,
    to: u64,
    started_at: f64,
}

impl CounterAnimation {
    pub fn new(from: u64, to: u64, now: f64) -> Self {
        Self {
            from,
            to,
            started_at: now,
        }
    }

    pub fn target(&self) -> u64 {
        self.to
    }

    pub fn is_done(&self, now: f64) -> bool {
        now - self.started_at >= COUNTER_TWEEN_MS
    }

    pub fn value_at(&self, now: f64) -> u64 {
        let progress = ((now - self.started_at) / COUNTER_TWEEN_MS).clamp(0.0, 1.0);
        if progress >= 1.0 {
            return self.to;
        }
        let from = self.from as f64;
        let value = from + (self.to as f64 - from) * progress;
        value.floor().max(0.0) as u64
    }
}
