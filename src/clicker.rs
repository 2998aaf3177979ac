//! Click classification, currency, streak and auto-click ticks.
//!
//! `ClickEngine` is the single authority for the player's local counters.
//! Each click walks `Idle -> Clicked(critical | normal) -> Idle` and returns
//! the feedback it wants played; timers (streak idle reset, button release,
//! delayed trail bursts) live in named slots advanced by [`ClickEngine::advance`].

use crate::config::{ClickerConfig, BUTTON_RELEASE_MS, CRITICAL_CHANCE, STREAK_MILESTONE, TRAIL_STEPS, TRAIL_STEP_MS};
use crate::effects::ParticleKind;
use crate::feedback::{Feedback, SoundCue};
use crate::timer::TimerSlots;
use log::{debug, warn};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

const CLICK_BURST: u32 = 15;
const MAX_CLICK_COINS: u64 = 10;
const TRAIL_BURST: u32 = 3;
const TRAIL_JITTER_PX: f64 = 10.0;
const AUTO_BURST: u32 = 3;
const LABEL_LIFT_PX: f64 = 50.0;
const CRITICAL_SHAKE: (f64, f64) = (8.0, 100.0);

fn probability(value: f64) -> Option<f64> {
    (!value.is_nan()).then(|| value.clamp(0.0, 1.0))
}

/// Longer-window consecutive-click counter with a running maximum.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StreakState {
    pub count: u32,
    pub max_count: u32,
    #[serde(skip)]
    pub last_event_at: Option<f64>,
}

impl StreakState {
    /// Count a click at `now`. Gaps shorter than `window_ms` extend the
    /// streak, anything else restarts it at 1.
    pub fn register(&mut self, now: f64, window_ms: f64) -> u32 {
        self.count = match self.last_event_at {
            Some(last) if now - last < window_ms => self.count + 1,
            _ => 1,
        };
        self.last_event_at = Some(now);
        self.max_count = self.max_count.max(self.count);
        self.count
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum ClickTimer {
    StreakReset,
    ButtonRelease,
    Trail(u32),
}

/// Snapshot of the counters, also what the page exports to JS.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClickStats {
    pub coins: u64,
    pub clicks: u64,
    pub click_power: u64,
    pub auto_power: u64,
    pub streak: u32,
    pub max_streak: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClickOutcome {
    pub earned: u64,
    pub critical: bool,
    pub coins: u64,
    pub clicks: u64,
    pub streak: u32,
    pub feedback: Vec<Feedback>,
}

pub struct ClickEngine {
    coins: u64,
    clicks: u64,
    click_power: u64,
    auto_power: u64,
    critical_chance: f64,
    critical_multiplier: f64,
    streak_window_ms: f64,
    streak_idle_reset_ms: f64,
    streak: StreakState,
    timers: TimerSlots<ClickTimer>,
    trail_origin: (f64, f64),
    rng: SmallRng,
}

impl ClickEngine {
    pub fn new(config: &ClickerConfig) -> Self {
        Self::with_rng(config, SmallRng::from_os_rng())
    }

    pub fn with_rng(config: &ClickerConfig, rng: SmallRng) -> Self {
        ClickEngine {
            coins: 0,
            clicks: 0,
            click_power: 1,
            auto_power: 0,
            critical_chance: probability(config.critical_chance).unwrap_or(CRITICAL_CHANCE),
            critical_multiplier: config.critical_multiplier.max(1.0),
            streak_window_ms: config.streak_window_ms,
            streak_idle_reset_ms: config.streak_idle_reset_ms,
            streak: StreakState::default(),
            timers: TimerSlots::new(),
            trail_origin: (0.0, 0.0),
            rng,
        }
    }

    /// Seed the counters from what the server rendered into the page.
    pub fn with_counters(mut self, coins: u64, clicks: u64, click_power: u64) -> Self {
        self.coins = coins;
        self.clicks = clicks;
        self.click_power = click_power.max(1);
        self
    }

    /// Values are clamped into `[0, 1]`; NaN is ignored.
    pub fn set_critical_chance(&mut self, chance: f64) {
        match probability(chance) {
            Some(p) => self.critical_chance = p,
            None => warn!("Ignoring critical chance {}", chance),
        }
    }

    pub fn set_click_power(&mut self, power: u64) {
        self.click_power = power.max(1);
    }

    pub fn set_auto_power(&mut self, power: u64) {
        self.auto_power = power;
    }

    pub fn auto_power(&self) -> u64 {
        self.auto_power
    }

    pub fn streak(&self) -> &StreakState {
        &self.streak
    }

    pub fn stats(&self) -> ClickStats {
        ClickStats {
            coins: self.coins,
            clicks: self.clicks,
            click_power: self.click_power,
            auto_power: self.auto_power,
            streak: self.streak.count,
            max_streak: self.streak.max_count,
        }
    }

    /// Earnings for one click.
    fn reward(&self, critical: bool) -> u64 {
        if critical {
            (self.click_power as f64 * self.critical_multiplier).floor() as u64
        } else {
            self.click_power
        }
    }

    /// Handle one click (pointer or keyboard) at viewport position `(x, y)`.
    pub fn click(&mut self, now: f64, x: f64, y: f64) -> ClickOutcome {
        let critical = self.rng.random_bool(self.critical_chance);
        let earned = self.reward(critical);

        let from = self.coins;
        self.coins = self.coins.saturating_add(earned);
        self.clicks += 1;

        let streak = self.streak.register(now, self.streak_window_ms);
        self.timers
            .schedule_once(ClickTimer::StreakReset, now, self.streak_idle_reset_ms);

        let mut feedback = vec![
            Feedback::Sound(if critical { SoundCue::Critical } else { SoundCue::Click }),
            Feedback::Burst {
                x,
                y,
                count: CLICK_BURST,
                color: Some(if critical { "#FF4081" } else { "#FFD700" }),
                kind: ParticleKind::Explosion,
            },
            Feedback::Coins {
                x,
                y,
                amount: earned.min(MAX_CLICK_COINS),
            },
            Feedback::Text {
                text: if critical {
                    format!("CRIT! +{}", earned)
                } else {
                    format!("+{}", earned)
                },
                x,
                y: y - LABEL_LIFT_PX,
                color: if critical { "#FF4081" } else { "#4CAF50" },
            },
            self.trail_burst(x, y),
            Feedback::ButtonPress,
            Feedback::ComboClick,
            Feedback::CoinsChanged {
                from,
                to: self.coins,
            },
            Feedback::ClicksChanged(self.clicks),
            Feedback::SaveProgress {
                coins: self.coins,
                click_power: self.click_power,
            },
        ];

        if critical {
            feedback.push(Feedback::Shake {
                intensity: CRITICAL_SHAKE.0,
                duration_ms: CRITICAL_SHAKE.1,
            });
        }
        if streak % STREAK_MILESTONE == 0 {
            debug!("Streak milestone reached: {}", streak);
            feedback.push(Feedback::StreakFlourish);
        }

        self.timers
            .schedule_once(ClickTimer::ButtonRelease, now, BUTTON_RELEASE_MS);
        self.trail_origin = (x, y);
        for step in 1..TRAIL_STEPS {
            self.timers
                .schedule_once(ClickTimer::Trail(step), now, step as f64 * TRAIL_STEP_MS);
        }

        ClickOutcome {
            earned,
            critical,
            coins: self.coins,
            clicks: self.clicks,
            streak,
            feedback,
        }
    }

    fn trail_burst(&mut self, x: f64, y: f64) -> Feedback {
        Feedback::Burst {
            x: x + self.rng.random_range(-TRAIL_JITTER_PX..TRAIL_JITTER_PX),
            y: y + self.rng.random_range(-TRAIL_JITTER_PX..TRAIL_JITTER_PX),
            count: TRAIL_BURST,
            color: Some("#00BCD4"),
            kind: ParticleKind::Trail,
        }
    }

    /// One auto-clicker period. Credits `auto_power` coins with a small burst
    /// at `anchor`; skips critical and streak handling. Nothing happens while
    /// the player has no auto-clicker.
    pub fn auto_tick(&mut self, anchor: (f64, f64)) -> Vec<Feedback> {
        if self.auto_power == 0 {
            return Vec::new();
        }
        let from = self.coins;
        self.coins = self.coins.saturating_add(self.auto_power);
        vec![
            Feedback::Burst {
                x: anchor.0,
                y: anchor.1,
                count: AUTO_BURST,
                color: Some("#2196F3"),
                kind: ParticleKind::Auto,
            },
            Feedback::TextParticle {
                text: format!("+{}", self.auto_power),
                x: anchor.0,
                y: anchor.1 - LABEL_LIFT_PX,
                color: "#2196F3",
            },
            Feedback::CoinsChanged {
                from,
                to: self.coins,
            },
            Feedback::AutoClicked,
        ]
    }

    /// Fire due timers.
    pub fn advance(&mut self, now: f64) -> Vec<Feedback> {
        let mut feedback = Vec::new();
        for timer in self.timers.fire_due(now) {
            match timer {
                ClickTimer::StreakReset => self.streak.count = 0,
                ClickTimer::ButtonRelease => feedback.push(Feedback::ButtonRelease),
                ClickTimer::Trail(_) => {
                    let (x, y) = self.trail_origin;
                    feedback.push(self.trail_burst(x, y));
                }
            }
        }
        feedback
    }

    /// Overwrite local counters with server-authoritative values.
    pub fn reconcile(&mut self, coins: u64, clicks: u64) -> Option<Feedback> {
        self.clicks = clicks;
        if coins == self.coins {
            return None;
        }
        let from = self.coins;
        self.coins = coins;
        Some(Feedback::CoinsChanged { from, to: coins })
    }
}
