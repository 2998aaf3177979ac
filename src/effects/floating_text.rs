use crate::config::{FLOATING_TEXT_MS, FLOATING_TEXT_RISE_PX};
use serde::Serialize;

/// A label that rises and fades, then goes away on its own.
#[derive(Debug, Clone, PartialEq)]
pub struct FloatingText {
    pub text: String,
    pub x: f64,
    pub y: f64,
    pub color: String,
    started_at: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextFrame<'a> {
    pub text: &'a str,
    pub x: f64,
    pub y: f64,
    pub color: &'a str,
    pub opacity: f64,
}

impl FloatingText {
    pub fn show(text: impl Into<String>, x: f64, y: f64, color: impl Into<String>, now: f64) -> Self {
        FloatingText {
            text: text.into(),
            x,
            y,
            color: color.into(),
            started_at: now,
        }
    }

    pub fn is_expired(&self, now: f64) -> bool {
        now - self.started_at >= FLOATING_TEXT_MS
    }

    /// Position and opacity at `now`, or `None` once the label is gone.
    pub fn frame(&self, now: f64) -> Option<TextFrame<'_>> {
        if self.is_expired(now) {
            return None;
        }
        let progress = ((now - self.started_at) / FLOATING_TEXT_MS).clamp(0.0, 1.0);
        Some(TextFrame {
            text: &self.text,
            x: self.x,
            y: self.y - FLOATING_TEXT_RISE_PX * progress,
            color: &self.color,
            opacity: 1.0 - progress,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rises_and_fades() {
        let t = FloatingText::show("+5", 100.0, 200.0, "#4CAF50", 0.0);
        let half = t.frame(FLOATING_TEXT_MS / 2.0).unwrap();
        assert_eq!(half.y, 200.0 - FLOATING_TEXT_RISE_PX / 2.0);
        assert!((half.opacity - 0.5).abs() < 1e-9);
    }

    #[test]
    fn gone_after_duration() {
        let t = FloatingText::show("NEW SKIN!", 0.0, 0.0, "#FF4081", 10.0);
        assert!(t.frame(10.0 + FLOATING_TEXT_MS).is_none());
        assert!(t.is_expired(10.0 + FLOATING_TEXT_MS));
    }

    #[test]
    fn instances_are_independent() {
        let a = FloatingText::show("a", 0.0, 0.0, "#fff", 0.0);
        let b = FloatingText::show("b", 0.0, 0.0, "#fff", 800.0);
        assert!(a.frame(1000.0).is_none());
        assert!(b.frame(1000.0).is_some());
    }
}
