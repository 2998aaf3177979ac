//! Visual effects: particle pool, screen shake, floating labels, combo
//! counter and counter tweens.
//!
//! `EffectEngine` owns every transient visual. Callers append to it from
//! anywhere; only [`EffectEngine::frame`] drains it, once per rendered frame.

mod combo;
mod counter;
mod floating_text;
mod particle;
mod shake;

pub use combo::{combo_color, ComboSystem, ComboUpdate};
pub use counter::CounterAnimation;
pub use floating_text::{FloatingText, TextFrame};
pub use particle::{Particle, ParticleKind, ParticleSprite, BURST_PALETTE, MIN_DECAY};
pub use shake::{ScreenShaker, ORIGIN};

use crate::config::{COMBO_WINDOW_MS, GRAVITY, MAX_COIN_PARTICLES};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, UnitCircle};
use std::f64::consts::TAU;

/// Result of one frame step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameReport {
    /// Viewport offset to apply this frame.
    pub shake_offset: (f64, f64),
    /// The combo counter timed out during this frame.
    pub combo_reset: bool,
    pub particles_alive: usize,
}

pub struct EffectEngine {
    particles: Vec<Particle>,
    texts: Vec<FloatingText>,
    shaker: ScreenShaker,
    combo: ComboSystem,
    gravity: f64,
    created: u64,
    expired: u64,
    rng: SmallRng,
}

impl EffectEngine {
    pub fn new(combo_window_ms: f64) -> Self {
        Self::with_rng(combo_window_ms, SmallRng::from_os_rng())
    }

    pub fn with_rng(combo_window_ms: f64, rng: SmallRng) -> Self {
        EffectEngine {
            particles: Vec::with_capacity(256),
            texts: Vec::new(),
            shaker: ScreenShaker::new(),
            combo: ComboSystem::new(combo_window_ms),
            gravity: GRAVITY,
            created: 0,
            expired: 0,
            rng,
        }
    }

    /// Burst of `count` particles at `(x, y)`. Velocities point into an
    /// upward-biased cone; stars scatter evenly in every direction.
    pub fn create_particles(&mut self, x: f64, y: f64, count: u32, color: Option<&str>, kind: ParticleKind) {
        for _ in 0..count {
            let velocity = if kind == ParticleKind::Star {
                let [dx, dy]: [f64; 2] = UnitCircle.sample(&mut self.rng);
                let speed = self.rng.random_range(2.0..7.0);
                [dx * speed, dy * speed - 2.0]
            } else {
                [
                    self.rng.random_range(-5.0..5.0),
                    self.rng.random_range(-10.0..0.0),
                ]
            };
            let color = match color {
                Some(c) => c.to_string(),
                None => BURST_PALETTE[self.rng.random_range(0..BURST_PALETTE.len())].to_string(),
            };
            let radius = self.rng.random_range(2.0..6.0);
            let decay = self.rng.random_range(0.01..0.03);
            self.push(Particle::new([x, y], velocity, radius, color, decay, kind));
        }
    }

    /// Spinning gold coins, one per coin earned up to a cap.
    pub fn create_coin_particles(&mut self, x: f64, y: f64, amount: u64) {
        let count = amount.min(MAX_COIN_PARTICLES as u64);
        for _ in 0..count {
            let velocity = [
                self.rng.random_range(-4.0..4.0),
                self.rng.random_range(-7.0..1.0),
            ];
            let radius = self.rng.random_range(1.0..4.0);
            let decay = self.rng.random_range(0.005..0.02);
            let mut coin = Particle::new([x, y], velocity, radius, "#FFD700", decay, ParticleKind::Coin);
            coin.rotation = self.rng.random_range(0.0..TAU);
            self.push(coin);
        }
    }

    pub fn create_text_particle(&mut self, x: f64, y: f64, text: &str, color: &str) {
        let mut p = Particle::new([x, y], [0.0, -2.0], 20.0, color, 0.01, ParticleKind::Text);
        p.label = Some(text.to_string());
        self.push(p);
    }

    fn push(&mut self, particle: Particle) {
        self.created += 1;
        self.particles.push(particle);
    }

    pub fn show_text(&mut self, text: &str, x: f64, y: f64, color: &str, now: f64) {
        self.texts.push(FloatingText::show(text, x, y, color, now));
    }

    pub fn shake(&mut self, now: f64, intensity: f64, duration_ms: f64) -> bool {
        self.shaker.shake(now, intensity, duration_ms)
    }

    pub fn is_shaking(&self) -> bool {
        self.shaker.is_shaking()
    }

    pub fn combo(&self) -> &ComboSystem {
        &self.combo
    }

    pub fn add_combo_click(&mut self, now: f64) -> ComboUpdate {
        self.combo.add_click(now)
    }

    /// Advance every effect by one rendered frame.
    pub fn frame(&mut self, now: f64) -> FrameReport {
        let gravity = self.gravity;
        let before = self.particles.len();
        self.particles.retain_mut(|p| p.tick(gravity));
        self.expired += (before - self.particles.len()) as u64;

        self.texts.retain(|t| !t.is_expired(now));
        let combo_reset = self.combo.advance(now);

        let shake_offset = if self.shaker.expire(now) {
            ORIGIN
        } else {
            self.shaker.offset(now, &mut self.rng)
        };

        FrameReport {
            shake_offset,
            combo_reset,
            particles_alive: self.particles.len(),
        }
    }

    pub fn particle_count(&self) -> usize {
        self.particles.len()
    }

    /// `(created, expired)` since construction.
    pub fn particle_totals(&self) -> (u64, u64) {
        (self.created, self.expired)
    }

    pub fn render(&self) -> impl Iterator<Item = ParticleSprite<'_>> {
        self.particles.iter().map(Particle::sprite)
    }

    pub fn text_frames(&self, now: f64) -> impl Iterator<Item = TextFrame<'_>> {
        self.texts.iter().filter_map(move |t| t.frame(now))
    }
}

impl Default for EffectEngine {
    fn default() -> Self {
        Self::new(COMBO_WINDOW_MS)
    }
}
