//! Viewport shake with linear fade-out.

use rand::Rng;

/// Offset the viewport rests at when nothing is shaking.
pub const ORIGIN: (f64, f64) = (0.0, 0.0);

#[derive(Debug, Clone, Copy, PartialEq)]
struct ShakeRun {
    started_at: f64,
    duration_ms: f64,
    intensity: f64,
}

#[derive(Debug, Clone, Default)]
pub struct ScreenShaker {
    run: Option<ShakeRun>,
}

impl ScreenShaker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_shaking(&self) -> bool {
        self.run.is_some()
    }

    /// Start shaking. Requests while a shake is running are dropped, so
    /// shakes never stack. Returns whether this request started one.
    pub fn shake(&mut self, now: f64, intensity: f64, duration_ms: f64) -> bool {
        if self.run.is_some() {
            return false;
        }
        if duration_ms <= 0.0 || intensity <= 0.0 {
            return false;
        }
        self.run = Some(ShakeRun {
            started_at: now,
            duration_ms,
            intensity,
        });
        true
    }

    /// Offset to apply this frame. Amplitude fades linearly to zero; once the
    /// duration has elapsed the shake ends and the exact origin comes back.
    pub fn offset<R: Rng + ?Sized>(&mut self, now: f64, rng: &mut R) -> (f64, f64) {
        let Some(run) = self.run else {
            return ORIGIN;
        };
        let progress = ((now - run.started_at) / run.duration_ms).clamp(0.0, 1.0);
        if progress >= 1.0 {
            return self.stop();
        }
        let current = run.intensity * (1.0 - progress);
        let x = (rng.random::<f64>() - 0.5) * current * 2.0;
        let y = (rng.random::<f64>() - 0.5) * current * 2.0;
        (x, y)
    }

    /// Safety stop. Ends any shake and hands back the origin.
    pub fn stop(&mut self) -> (f64, f64) {
        self.run = None;
        ORIGIN
    }

    /// Stop the shake if its duration has passed, even when no frame sampled it.
    pub fn expire(&mut self, now: f64) -> bool {
        match self.run {
            Some(run) if now - run.started_at >= run.duration_ms => {
                self.stop();
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn second_shake_while_running_is_ignored() {
        let mut s = ScreenShaker::new();
        assert!(s.shake(0.0, 5.0, 300.0));
        assert!(!s.shake(10.0, 50.0, 5000.0));
        let mut rng = SmallRng::seed_from_u64(3);
        // The ignored request must not extend the run.
        assert_eq!(s.offset(300.0, &mut rng), ORIGIN);
        assert!(!s.is_shaking());
    }

    #[test]
    fn offset_stays_within_fading_amplitude() {
        let mut s = ScreenShaker::new();
        s.shake(0.0, 10.0, 100.0);
        let mut rng = SmallRng::seed_from_u64(11);
        for step in 0..10 {
            let now = step as f64 * 10.0;
            let bound = 10.0 * (1.0 - now / 100.0);
            let (x, y) = s.offset(now, &mut rng);
            assert!(x.abs() <= bound && y.abs() <= bound);
        }
    }

    #[test]
    fn returns_exactly_to_origin_after_duration() {
        let mut s = ScreenShaker::new();
        let mut rng = SmallRng::seed_from_u64(5);
        s.shake(1000.0, 8.0, 100.0);
        let _ = s.offset(1050.0, &mut rng);
        assert_eq!(s.offset(1100.0, &mut rng), (0.0, 0.0));
        assert_eq!(s.offset(1200.0, &mut rng), (0.0, 0.0));
    }

    #[test]
    fn safety_expiry_without_sampling_leaves_no_residue() {
        let mut s = ScreenShaker::new();
        let mut rng = SmallRng::seed_from_u64(5);
        s.shake(0.0, 8.0, 100.0);
        assert!(!s.expire(50.0));
        assert!(s.expire(100.0));
        assert_eq!(s.offset(100.0, &mut rng), ORIGIN);
        assert!(s.shake(150.0, 3.0, 200.0), "a new shake may start afterwards");
    }

    #[test]
    fn degenerate_requests_do_not_start() {
        let mut s = ScreenShaker::new();
        assert!(!s.shake(0.0, 5.0, 0.0));
        assert!(!s.shake(0.0, 0.0, 100.0));
        assert!(!s.is_shaking());
    }
}
