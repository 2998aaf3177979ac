//! Transient particles integrated once per rendered frame.

use serde::Serialize;

/// Smallest decay a particle may have, so every particle eventually dies.
pub const MIN_DECAY: f64 = 0.001;

const COIN_SPIN_PER_FRAME: f64 = 0.1;

/// Palette used when a burst does not ask for a colour.
pub const BURST_PALETTE: [&str; 8] = [
    "#FF4081", "#00BCD4", "#4CAF50", "#FF9800", "#9C27B0", "#2196F3", "#FF5722", "#E91E63",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParticleKind {
    Explosion,
    Coin,
    Trail,
    Text,
    Star,
    /// Auto-clicker tick burst.
    Auto,
}

#[derive(Debug, Clone)]
pub struct Particle {
    pub position: [f64; 2],
    pub velocity: [f64; 2],
    pub radius: f64,
    pub color: String,
    /// In (0, 1] while alive.
    pub life: f64,
    pub decay: f64,
    pub kind: ParticleKind,
    pub rotation: f64,
    pub label: Option<String>,
}

impl Particle {
    pub fn new(
        position: [f64; 2],
        velocity: [f64; 2],
        radius: f64,
        color: impl Into<String>,
        decay: f64,
        kind: ParticleKind,
    ) -> Self {
        Particle {
            position,
            velocity,
            radius,
            color: color.into(),
            life: 1.0,
            decay: decay.max(MIN_DECAY),
            kind,
            rotation: 0.0,
            label: None,
        }
    }

    /// Advance one frame. Returns false once the particle has expired.
    pub fn tick(&mut self, gravity: f64) -> bool {
        self.velocity[1] += gravity;
        self.position[0] += self.velocity[0];
        self.position[1] += self.velocity[1];
        if self.kind == ParticleKind::Coin {
            self.rotation += COIN_SPIN_PER_FRAME;
        }
        self.life -= self.decay;
        self.life > 0.0
    }

    pub fn alpha(&self) -> f64 {
        self.life.clamp(0.0, 1.0)
    }

    pub fn sprite(&self) -> ParticleSprite<'_> {
        ParticleSprite {
            x: self.position[0],
            y: self.position[1],
            radius: self.radius,
            color: &self.color,
            alpha: self.alpha(),
            kind: self.kind,
            rotation: self.rotation,
            label: self.label.as_deref(),
        }
    }
}

/// What the renderer needs to draw one particle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ParticleSprite<'a> {
    pub x: f64,
    pub y: f64,
    pub radius: f64,
    pub color: &'a str,
    pub alpha: f64,
    pub kind: ParticleKind,
    pub rotation: f64,
    pub label: Option<&'a str>,
}
