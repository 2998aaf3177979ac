//! Short-window click combo with its on-screen counter.

use crate::timer::TimerSlots;

/// Maximum particles a single combo burst may spawn.
const MAX_COMBO_BURST: u32 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum ComboTimer {
    Reset,
}

/// What a click did to the combo display.
#[derive(Debug, Clone, PartialEq)]
pub struct ComboUpdate {
    pub combo: u32,
    /// Text and colour to show, present only for combos above one.
    pub display: Option<(String, &'static str)>,
    /// Particles to spawn near the counter.
    pub burst: u32,
    /// Shake intensity on every tenth combo.
    pub shake: Option<f64>,
}

/// Colour bands keyed by combo size.
pub fn combo_color(combo: u32) -> &'static str {
    match combo {
        c if c >= 50 => "#FF4081",
        c if c >= 30 => "#9C27B0",
        c if c >= 20 => "#2196F3",
        c if c >= 10 => "#4CAF50",
        _ => "#FFD700",
    }
}

#[derive(Debug, Clone)]
pub struct ComboSystem {
    combo: u32,
    max_combo: u32,
    last_click_at: Option<f64>,
    visible: bool,
    window_ms: f64,
    timers: TimerSlots<ComboTimer>,
}

impl ComboSystem {
    pub fn new(window_ms: f64) -> Self {
        Self {
            combo: 0,
            max_combo: 0,
            last_click_at: None,
            visible: false,
            window_ms,
            timers: TimerSlots::new(),
        }
    }

    pub fn combo(&self) -> u32 {
        self.combo
    }

    pub fn max_combo(&self) -> u32 {
        self.max_combo
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn add_click(&mut self, now: f64) -> ComboUpdate {
        self.combo = match self.last_click_at {
            Some(last) if now - last < self.window_ms => self.combo + 1,
            _ => 1,
        };
        self.last_click_at = Some(now);
        self.max_combo = self.max_combo.max(self.combo);
        // Restart the inactivity timer on every click.
        self.timers.schedule_once(ComboTimer::Reset, now, self.window_ms);

        if self.combo <= 1 {
            return ComboUpdate {
                combo: self.combo,
                display: None,
                burst: 0,
                shake: None,
            };
        }

        self.visible = true;
        let color = combo_color(self.combo);
        ComboUpdate {
            combo: self.combo,
            display: Some((format!("{} COMBO!", self.combo), color)),
            burst: (self.combo * 2).min(MAX_COMBO_BURST),
            shake: (self.combo % 10 == 0).then(|| 3.0 + (self.combo / 10) as f64),
        }
    }

    /// Fire the inactivity timer. Returns true when the combo just reset.
    pub fn advance(&mut self, now: f64) -> bool {
        let fired = self.timers.fire_due(now);
        if fired.contains(&ComboTimer::Reset) {
            self.combo = 0;
            self.visible = false;
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fast_clicks_strictly_increase() {
        let mut c = ComboSystem::new(500.0);
        let mut prev = 0;
        for i in 0..15 {
            let update = c.add_click(i as f64 * 100.0);
            assert!(update.combo > prev);
            prev = update.combo;
        }
        assert_eq!(prev, 15);
    }

    #[test]
    fn slow_click_resets_to_one() {
        let mut c = ComboSystem::new(500.0);
        c.add_click(0.0);
        c.add_click(100.0);
        assert_eq!(c.add_click(600.0).combo, 1);
    }

    #[test]
    fn inactivity_hides_and_zeroes() {
        let mut c = ComboSystem::new(500.0);
        c.add_click(0.0);
        c.add_click(200.0);
        assert!(c.is_visible());
        assert!(!c.advance(600.0));
        assert!(c.advance(700.0));
        assert_eq!(c.combo(), 0);
        assert!(!c.is_visible());
        assert_eq!(c.max_combo(), 2);
    }

    #[test]
    fn every_click_restarts_the_timer() {
        let mut c = ComboSystem::new(500.0);
        c.add_click(0.0);
        c.add_click(400.0);
        assert!(!c.advance(600.0));
        assert_eq!(c.combo(), 2);
    }

    #[test]
    fn single_click_shows_nothing() {
        let mut c = ComboSystem::new(500.0);
        let update = c.add_click(0.0);
        assert_eq!(update.display, None);
        assert_eq!(update.burst, 0);
    }

    #[test]
    fn tenth_combo_shakes_and_bursts_are_capped() {
        let mut c = ComboSystem::new(500.0);
        let mut last = None;
        for i in 0..10 {
            last = Some(c.add_click(i as f64 * 50.0));
        }
        let update = last.unwrap();
        assert_eq!(update.shake, Some(4.0));
        assert_eq!(update.burst, 20);
        assert_eq!(update.display.unwrap().1, "#4CAF50");
    }

    #[test]
    fn color_bands() {
        assert_eq!(combo_color(2), "#FFD700");
        assert_eq!(combo_color(10), "#4CAF50");
        assert_eq!(combo_color(20), "#2196F3");
        assert_eq!(combo_color(30), "#9C27B0");
        assert_eq!(combo_color(50), "#FF4081");
    }
}
