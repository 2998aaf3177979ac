//! Named timer slots driven by an explicit clock.
//!
//! Every logical counter owns exactly one slot. Re-scheduling a pending key
//! replaces it, so two timers for the same counter can never coexist. The
//! owner calls [`TimerSlots::fire_due`] from its frame/tick handler and
//! reacts to the keys that came due.

use std::collections::HashMap;
use std::hash::Hash;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Slot {
    due_at: f64,
    period: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct TimerSlots<K> {
    slots: HashMap<K, Slot>,
}

impl<K: Copy + Eq + Hash> Default for TimerSlots<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Copy + Eq + Hash> TimerSlots<K> {
    pub fn new() -> Self {
        Self {
            slots: HashMap::new(),
        }
    }

    /// Arm `key` to fire once, `delay_ms` after `now`.
    pub fn schedule_once(&mut self, key: K, now: f64, delay_ms: f64) {
        self.slots.insert(
            key,
            Slot {
                due_at: now + delay_ms.max(0.0),
                period: None,
            },
        );
    }

    /// Arm `key` to fire every `period_ms`, first one period after `now`.
    /// Non-positive periods are ignored.
    pub fn schedule_every(&mut self, key: K, now: f64, period_ms: f64) {
        if period_ms <= 0.0 {
            return;
        }
        self.slots.insert(
            key,
            Slot {
                due_at: now + period_ms,
                period: Some(period_ms),
            },
        );
    }

    /// Returns whether a pending slot was actually removed.
    pub fn cancel(&mut self, key: K) -> bool {
        self.slots.remove(&key).is_some()
    }

    pub fn is_pending(&self, key: K) -> bool {
        self.slots.contains_key(&key)
    }

    /// Milliseconds until `key` fires, or `None` if it is not armed.
    pub fn due_in(&self, key: K, now: f64) -> Option<f64> {
        self.slots.get(&key).map(|s| (s.due_at - now).max(0.0))
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Collect every key whose deadline is `<= now`, earliest first.
    ///
    /// One-shot slots are removed. Repeating slots fire at most once per call
    /// and are re-armed one period after their previous deadline, skipping
    /// ahead if the clock jumped past several periods.
    pub fn fire_due(&mut self, now: f64) -> Vec<K> {
        let mut due: Vec<(f64, K)> = self
            .slots
            .iter()
            .filter(|(_, slot)| slot.due_at <= now)
            .map(|(key, slot)| (slot.due_at, *key))
            .collect();
        due.sort_by(|a, b| a.0.total_cmp(&b.0));

        for (_, key) in &due {
            let Some(slot) = self.slots.get_mut(key) else {
                continue;
            };
            let period = slot.period;
            match period {
                Some(period) => {
                    let mut next = slot.due_at + period;
                    if next <= now {
                        let missed = ((now - next) / period).floor() + 1.0;
                        next += missed * period;
                    }
                    slot.due_at = next;
                }
                None => {
                    self.slots.remove(key);
                }
            }
        }

        due.into_iter().map(|(_, key)| key).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum Key {
        A,
        B,
        Tick,
    }

    #[test]
    fn one_shot_fires_once() {
        let mut t = TimerSlots::new();
        t.schedule_once(Key::A, 0.0, 100.0);
        assert!(t.fire_due(99.0).is_empty());
        assert_eq!(t.fire_due(100.0), vec![Key::A]);
        assert!(t.fire_due(500.0).is_empty());
        assert!(!t.is_pending(Key::A));
    }

    #[test]
    fn rescheduling_replaces_pending_slot() {
        let mut t = TimerSlots::new();
        t.schedule_once(Key::A, 0.0, 100.0);
        t.schedule_once(Key::A, 80.0, 100.0);
        assert_eq!(t.len(), 1);
        assert!(t.fire_due(150.0).is_empty());
        assert_eq!(t.fire_due(180.0), vec![Key::A]);
    }

    #[test]
    fn due_keys_come_back_in_deadline_order() {
        let mut t = TimerSlots::new();
        t.schedule_once(Key::B, 0.0, 50.0);
        t.schedule_once(Key::A, 0.0, 20.0);
        assert_eq!(t.fire_due(60.0), vec![Key::A, Key::B]);
    }

    #[test]
    fn repeating_slot_rearms_and_skips_missed_periods() {
        let mut t = TimerSlots::new();
        t.schedule_every(Key::Tick, 0.0, 1000.0);
        assert_eq!(t.fire_due(1000.0), vec![Key::Tick]);
        assert_eq!(t.due_in(Key::Tick, 1000.0), Some(1000.0));
        // Clock jumps 3.5 periods ahead: one fire, next deadline on the grid.
        assert_eq!(t.fire_due(4500.0), vec![Key::Tick]);
        assert_eq!(t.due_in(Key::Tick, 4500.0), Some(500.0));
    }

    #[test]
    fn cancel_reports_whether_anything_was_pending() {
        let mut t = TimerSlots::new();
        assert!(!t.cancel(Key::A));
        t.schedule_once(Key::A, 0.0, 10.0);
        assert!(t.cancel(Key::A));
        assert!(t.is_empty());
    }

    #[test]
    fn zero_period_is_ignored() {
        let mut t: TimerSlots<Key> = TimerSlots::new();
        t.schedule_every(Key::Tick, 0.0, 0.0);
        assert!(!t.is_pending(Key::Tick));
    }
}
