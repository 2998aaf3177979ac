//! Side effects requested by the game core and their routing.
//!
//! The click engine never touches audio or visuals directly. It returns
//! `Feedback` values; [`dispatch`] plays the sounds, feeds the effect engine
//! and hands back whatever only the page can do (DOM updates, saves).

use crate::audio::{AudioBackend, AudioOrchestrator, SoundCategory};
use crate::effects::{EffectEngine, ParticleKind};
use log::debug;

/// Default shake length when the requester does not care.
pub const DEFAULT_SHAKE_MS: f64 = 300.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundCue {
    /// Random click variant.
    Click,
    Critical,
    Skin,
    Achievement,
    LevelUp,
    Upgrade,
    /// Pick by payout size.
    Coins(u64),
}

/// Look of a transient corner notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeStyle {
    Success,
    AutoClick,
}

impl NoticeStyle {
    pub fn css_class(self) -> &'static str {
        match self {
            NoticeStyle::Success => "notification success",
            NoticeStyle::AutoClick => "auto-click-notification",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Feedback {
    Sound(SoundCue),
    Burst {
        x: f64,
        y: f64,
        count: u32,
        color: Option<&'static str>,
        kind: ParticleKind,
    },
    Coins {
        x: f64,
        y: f64,
        amount: u64,
    },
    Text {
        text: String,
        x: f64,
        y: f64,
        color: &'static str,
    },
    /// Label drawn on the particle canvas.
    TextParticle {
        text: String,
        x: f64,
        y: f64,
        color: &'static str,
    },
    Shake {
        intensity: f64,
        duration_ms: f64,
    },
    /// Feed the combo counter.
    ComboClick,
    ComboShown {
        text: String,
        color: &'static str,
    },
    ButtonPress,
    ButtonRelease,
    StreakFlourish,
    CoinsChanged {
        from: u64,
        to: u64,
    },
    ClicksChanged(u64),
    /// Fire-and-forget `/update_coins/`.
    SaveProgress {
        coins: u64,
        click_power: u64,
    },
    /// Tell the server an auto-click happened.
    AutoClicked,
    ShowNotice {
        id: u32,
        text: String,
        style: NoticeStyle,
    },
    DismissNotice(u32),
    /// Running auto-clicker badge; `None` hides it.
    AutoClickerIndicator(Option<u64>),
    /// Re-read the auto-clicker from the server now.
    ResyncAutoClicker,
}

/// Viewport geometry the dispatcher needs for screen-anchored effects.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Stage {
    pub width: f64,
    pub height: f64,
}

impl Stage {
    pub fn centre(&self) -> (f64, f64) {
        (self.width / 2.0, self.height / 2.0)
    }

    /// Where the combo counter sits (top right).
    pub fn combo_anchor(&self) -> (f64, f64) {
        (self.width - 100.0, 50.0)
    }
}

/// Feedback for equipping a new skin at `(x, y)`.
pub fn skin_changed(x: f64, y: f64) -> Vec<Feedback> {
    vec![
        Feedback::Sound(SoundCue::Skin),
        Feedback::Burst {
            x,
            y,
            count: 50,
            color: Some("#FF4081"),
            kind: ParticleKind::Star,
        },
        Feedback::Shake {
            intensity: 3.0,
            duration_ms: 200.0,
        },
        Feedback::Text {
            text: "NEW SKIN!".to_string(),
            x,
            y,
            color: "#FF4081",
        },
    ]
}

/// Route sounds and visuals; return what is left for the page.
pub fn dispatch<B: AudioBackend>(
    feedback: Vec<Feedback>,
    now: f64,
    stage: &Stage,
    mut audio: Option<&mut AudioOrchestrator<B>>,
    fx: &mut EffectEngine,
) -> Vec<Feedback> {
    let mut page = Vec::new();
    for item in feedback {
        match item {
            Feedback::Sound(cue) => match audio.as_mut() {
                Some(audio) => play_cue(audio, cue),
                None => debug!("Audio manager not available for {:?}", cue),
            },
            Feedback::Burst {
                x,
                y,
                count,
                color,
                kind,
            } => fx.create_particles(x, y, count, color, kind),
            Feedback::Coins { x, y, amount } => fx.create_coin_particles(x, y, amount),
            Feedback::Text { text, x, y, color } => fx.show_text(&text, x, y, color, now),
            Feedback::TextParticle { text, x, y, color } => fx.create_text_particle(x, y, &text, color),
            Feedback::Shake {
                intensity,
                duration_ms,
            } => {
                fx.shake(now, intensity, duration_ms);
            }
            Feedback::ComboClick => {
                let update = fx.add_combo_click(now);
                if let Some((text, color)) = update.display {
                    let (x, y) = stage.combo_anchor();
                    if update.burst > 0 {
                        fx.create_particles(x, y, update.burst, Some(color), ParticleKind::Explosion);
                    }
                    if let Some(intensity) = update.shake {
                        fx.shake(now, intensity, DEFAULT_SHAKE_MS);
                    }
                    page.push(Feedback::ComboShown { text, color });
                }
            }
            other => page.push(other),
        }
    }
    page
}

fn play_cue<B: AudioBackend>(audio: &mut AudioOrchestrator<B>, cue: SoundCue) {
    match cue {
        SoundCue::Click => {
            audio.play_random_sound(SoundCategory::Click);
        }
        SoundCue::Critical => {
            audio.play_sound(SoundCategory::Critical, 0);
        }
        SoundCue::Skin => {
            audio.play_sound(SoundCategory::Skin, 0);
        }
        SoundCue::Achievement => {
            audio.play_sound(SoundCategory::Achievement, 0);
        }
        SoundCue::LevelUp => {
            audio.play_level_up();
        }
        SoundCue::Upgrade => {
            audio.play_upgrade();
        }
        SoundCue::Coins(amount) => {
            audio.play_coin_sound(amount);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::tests::{orchestrator, FakeBackend};
    use crate::config::COMBO_WINDOW_MS;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    const STAGE: Stage = Stage {
        width: 800.0,
        height: 600.0,
    };

    fn fx() -> EffectEngine {
        EffectEngine::with_rng(COMBO_WINDOW_MS, SmallRng::seed_from_u64(9))
    }

    #[test]
    fn sounds_and_visuals_are_consumed() {
        let mut audio = orchestrator();
        let mut fx = fx();
        let left = dispatch(
            vec![
                Feedback::Sound(SoundCue::Critical),
                Feedback::Burst {
                    x: 1.0,
                    y: 2.0,
                    count: 4,
                    color: None,
                    kind: ParticleKind::Trail,
                },
                Feedback::ButtonPress,
            ],
            0.0,
            &STAGE,
            Some(&mut audio),
            &mut fx,
        );
        assert_eq!(left, vec![Feedback::ButtonPress]);
        assert_eq!(audio.backend().played.len(), 1);
        assert_eq!(fx.particle_count(), 4);
    }

    #[test]
    fn missing_audio_is_not_an_error() {
        let mut fx = fx();
        let left = dispatch::<FakeBackend>(
            vec![Feedback::Sound(SoundCue::Click)],
            0.0,
            &STAGE,
            None,
            &mut fx,
        );
        assert!(left.is_empty());
    }

    #[test]
    fn second_combo_click_shows_counter_and_bursts() {
        let mut fx = fx();
        let first = dispatch::<FakeBackend>(vec![Feedback::ComboClick], 0.0, &STAGE, None, &mut fx);
        assert!(first.is_empty());
        let second = dispatch::<FakeBackend>(vec![Feedback::ComboClick], 100.0, &STAGE, None, &mut fx);
        assert_eq!(
            second,
            vec![Feedback::ComboShown {
                text: "2 COMBO!".to_string(),
                color: "#FFD700"
            }]
        );
        assert_eq!(fx.particle_count(), 4);
    }

    #[test]
    fn progress_cues_pick_their_assets() {
        let mut audio = orchestrator();
        let mut fx = fx();
        let left = dispatch(
            vec![
                Feedback::Sound(SoundCue::LevelUp),
                Feedback::Sound(SoundCue::Upgrade),
                Feedback::Sound(SoundCue::Coins(2000)),
                Feedback::TextParticle {
                    text: "+3".to_string(),
                    x: 5.0,
                    y: 5.0,
                    color: "#2196F3",
                },
                Feedback::ResyncAutoClicker,
            ],
            0.0,
            &STAGE,
            Some(&mut audio),
            &mut fx,
        );
        assert_eq!(left, vec![Feedback::ResyncAutoClicker]);
        let played: Vec<&str> = audio.backend().played.iter().map(|p| p.0.as_str()).collect();
        assert_eq!(played, vec!["/s/meow3.mp3", "/s/meow1.mp3", "/s/meow3.mp3"]);
        let labels: Vec<_> = fx.render().filter_map(|s| s.label).collect();
        assert_eq!(labels, vec!["+3"]);
    }

    #[test]
    fn skin_change_shakes_and_labels() {
        let mut audio = orchestrator();
        let mut fx = fx();
        dispatch(skin_changed(50.0, 50.0), 0.0, &STAGE, Some(&mut audio), &mut fx);
        assert!(fx.is_shaking());
        assert_eq!(fx.particle_count(), 50);
        assert_eq!(fx.text_frames(0.0).count(), 1);
        assert_eq!(audio.backend().played.len(), 1);
    }
}
