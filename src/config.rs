//! Game-wide tuning constants and the page-overridable `ClickerConfig`.

use crate::error::ClickerError;
use serde::Deserialize;

// Click rewards
pub const CRITICAL_CHANCE: f64 = 0.10;
pub const CRITICAL_MULTIPLIER: f64 = 2.0;

// Streak / combo windows
pub const STREAK_WINDOW_MS: f64 = 1000.0;
pub const STREAK_IDLE_RESET_MS: f64 = 2000.0;
pub const STREAK_MILESTONE: u32 = 10;
pub const COMBO_WINDOW_MS: f64 = 500.0;
pub const BUTTON_RELEASE_MS: f64 = 200.0;
pub const TRAIL_STEP_MS: f64 = 50.0;
pub const TRAIL_STEPS: u32 = 3;

// Auto-clicker
pub const AUTO_TICK_MS: u32 = 1000;
pub const AUTO_CLICKER_RESYNC_MS: f64 = 2000.0;
pub const AUTO_NOTICE_CHANCE: f64 = 0.1;
pub const AUTO_COIN_SOUND_CHANCE: f64 = 0.05;

// Notices and unlocks
pub const ACTIVATION_NOTICE_MS: f64 = 3000.0;
pub const AUTO_CLICK_NOTICE_MS: f64 = 2000.0;
pub const NOTICE_FADE_MS: u32 = 300;
pub const UNLOCK_BURSTS: u32 = 20;
pub const UNLOCK_BURST_STEP_MS: f64 = 100.0;

// Particles
pub const GRAVITY: f64 = 0.1;
pub const MAX_COIN_PARTICLES: u32 = 50;
pub const FLOATING_TEXT_MS: f64 = 1000.0;
pub const FLOATING_TEXT_RISE_PX: f64 = 50.0;
pub const COUNTER_TWEEN_MS: f64 = 500.0;

// Audio
pub const MUSIC_VOLUME: f32 = 0.3;
pub const SFX_VOLUME: f32 = 0.5;
pub const SOUND_BASE_PATH: &str = "/static/main/sounds/";
pub const SKIN_BASE_PATH: &str = "/static/main/skins/";

// Polling
pub const BATTLE_POLL_MS: u32 = 100;
pub const POLL_ERROR_BACKOFF_MS: u32 = 1000;
pub const AUTO_CLICKER_SYNC_MS: u32 = 10_000;
pub const ACHIEVEMENT_CHECK_MS: u32 = 30_000;
pub const FINISH_RELOAD_MS: u32 = 3000;
pub const POPUP_DISMISS_MS: u32 = 5000;

// DOM contract
pub const CONFIG_SCRIPT_ID: &str = "clicker-config";
pub const PARTICLE_CANVAS_ID: &str = "particle-canvas";

/// Tunables a page may override through a JSON block. Missing fields keep
/// their defaults.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ClickerConfig {
    pub critical_chance: f64,
    pub critical_multiplier: f64,
    pub streak_window_ms: f64,
    pub streak_idle_reset_ms: f64,
    pub combo_window_ms: f64,
    pub auto_notice_chance: f64,
    pub auto_coin_sound_chance: f64,
    pub music_volume: f32,
    pub sfx_volume: f32,
    pub sound_base_path: String,
    pub battle_poll_ms: u32,
    pub poll_error_backoff_ms: u32,
    pub auto_clicker_sync_ms: u32,
    pub achievement_check_ms: u32,
    pub finish_reload_ms: u32,
}

impl Default for ClickerConfig {
    fn default() -> Self {
        Self {
            critical_chance: CRITICAL_CHANCE,
            critical_multiplier: CRITICAL_MULTIPLIER,
            streak_window_ms: STREAK_WINDOW_MS,
            streak_idle_reset_ms: STREAK_IDLE_RESET_MS,
            combo_window_ms: COMBO_WINDOW_MS,
            auto_notice_chance: AUTO_NOTICE_CHANCE,
            auto_coin_sound_chance: AUTO_COIN_SOUND_CHANCE,
            music_volume: MUSIC_VOLUME,
            sfx_volume: SFX_VOLUME,
            sound_base_path: SOUND_BASE_PATH.to_string(),
            battle_poll_ms: BATTLE_POLL_MS,
            poll_error_backoff_ms: POLL_ERROR_BACKOFF_MS,
            auto_clicker_sync_ms: AUTO_CLICKER_SYNC_MS,
            achievement_check_ms: ACHIEVEMENT_CHECK_MS,
            finish_reload_ms: FINISH_RELOAD_MS,
        }
    }
}

impl ClickerConfig {
    /// Parse a (possibly partial) JSON override and validate it.
    pub fn from_json(json: &str) -> Result<Self, ClickerError> {
        let config: ClickerConfig =
            serde_json::from_str(json).map_err(|e| ClickerError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ClickerError> {
        for (name, chance) in [
            ("critical_chance", self.critical_chance),
            ("auto_notice_chance", self.auto_notice_chance),
            ("auto_coin_sound_chance", self.auto_coin_sound_chance),
        ] {
            if !(0.0..=1.0).contains(&chance) {
                return Err(ClickerError::Config(format!(
                    "{} must be between 0 and 1, got {}",
                    name, chance
                )));
            }
        }
        if self.critical_multiplier < 1.0 {
            return Err(ClickerError::Config(format!(
                "critical_multiplier must be at least 1, got {}",
                self.critical_multiplier
            )));
        }
        for (name, volume) in [("music_volume", self.music_volume), ("sfx_volume", self.sfx_volume)] {
            if !(0.0..=1.0).contains(&volume) {
                return Err(ClickerError::Config(format!(
                    "{} must be between 0 and 1, got {}",
                    name, volume
                )));
            }
        }
        if self.streak_window_ms <= 0.0 || self.combo_window_ms <= 0.0 {
            return Err(ClickerError::Config("click windows must be positive".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_override_keeps_defaults() {
        let cfg = ClickerConfig::from_json(r#"{"critical_chance": 0.25}"#).unwrap();
        assert_eq!(cfg.critical_chance, 0.25);
        assert_eq!(cfg.critical_multiplier, CRITICAL_MULTIPLIER);
        assert_eq!(cfg.sound_base_path, SOUND_BASE_PATH);
    }

    #[test]
    fn rejects_out_of_range_probability() {
        let err = ClickerConfig::from_json(r#"{"critical_chance": 1.5}"#).unwrap_err();
        assert!(matches!(err, ClickerError::Config(_)));
    }

    #[test]
    fn rejects_out_of_range_notice_chance() {
        assert!(ClickerConfig::from_json(r#"{"auto_notice_chance": 2}"#).is_err());
        assert!(ClickerConfig::from_json(r#"{"auto_coin_sound_chance": 0.5}"#).is_ok());
    }

    #[test]
    fn rejects_bad_volume() {
        assert!(ClickerConfig::from_json(r#"{"sfx_volume": -0.1}"#).is_err());
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(matches!(
            ClickerConfig::from_json("{not json"),
            Err(ClickerError::Config(_))
        ));
    }
}
