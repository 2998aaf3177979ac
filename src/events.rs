//! Timed page events that do not come from a click: auto-clicker status
//! changes, auto-click payouts, upgrade purchases and skin unlocks.
//!
//! Like [`crate::clicker::ClickEngine`], the sequencer only returns
//! [`Feedback`]; notice dismissal, staggered unlock bursts and the delayed
//! auto-clicker re-sync are named slots fired by [`EventSequencer::advance`].

use crate::api::AutoClickResult;
use crate::config::{
    ClickerConfig, ACTIVATION_NOTICE_MS, AUTO_CLICKER_RESYNC_MS, AUTO_CLICK_NOTICE_MS, UNLOCK_BURSTS,
    UNLOCK_BURST_STEP_MS,
};
use crate::effects::ParticleKind;
use crate::feedback::{Feedback, NoticeStyle, SoundCue, Stage};
use crate::timer::TimerSlots;
use log::{debug, info};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

const UNLOCK_BURST_SIZE: u32 = 10;
const UNLOCK_COLOR: &str = "#4CAF50";
const AUTO_CLICKER_UPGRADE: &str = "auto_clicker";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum EventTimer {
    DismissNotice(u32),
    UnlockBurst(u32),
    AutoClickerResync,
}

pub struct EventSequencer {
    timers: TimerSlots<EventTimer>,
    next_notice: u32,
    auto_power: u64,
    unlock_area: Stage,
    notice_chance: f64,
    coin_sound_chance: f64,
    rng: SmallRng,
}

impl EventSequencer {
    pub fn new(config: &ClickerConfig) -> Self {
        Self::with_rng(config, SmallRng::from_os_rng())
    }

    pub fn with_rng(config: &ClickerConfig, rng: SmallRng) -> Self {
        Self {
            timers: TimerSlots::new(),
            next_notice: 0,
            auto_power: 0,
            unlock_area: Stage::default(),
            notice_chance: chance(config.auto_notice_chance),
            coin_sound_chance: chance(config.auto_coin_sound_chance),
            rng,
        }
    }

    /// Last auto-clicker power reported through [`Self::auto_clicker_changed`].
    pub fn auto_power(&self) -> u64 {
        self.auto_power
    }

    pub fn pending(&self) -> usize {
        self.timers.len()
    }

    fn notice(&mut self, now: f64, text: String, style: NoticeStyle, lifetime_ms: f64) -> Feedback {
        let id = self.next_notice;
        self.next_notice = self.next_notice.wrapping_add(1);
        self.timers
            .schedule_once(EventTimer::DismissNotice(id), now, lifetime_ms);
        Feedback::ShowNotice { id, text, style }
    }

    /// React to a synced auto-clicker power. Activation announces itself and
    /// shows the running badge, a new rate only relabels the badge, losing
    /// the auto-clicker hides it.
    pub fn auto_clicker_changed(&mut self, power: u64, now: f64) -> Vec<Feedback> {
        let previous = std::mem::replace(&mut self.auto_power, power);
        if previous == power {
            return Vec::new();
        }
        match (previous, power) {
            (0, _) => {
                info!("Auto clicker activated: {}/s", power);
                let text = format!("Автокликер активирован! {} кликов/сек", power);
                vec![
                    Feedback::Sound(SoundCue::LevelUp),
                    Feedback::AutoClickerIndicator(Some(power)),
                    self.notice(now, text, NoticeStyle::Success, ACTIVATION_NOTICE_MS),
                ]
            }
            (_, 0) => {
                info!("Auto clicker stopped");
                vec![Feedback::AutoClickerIndicator(None)]
            }
            _ => vec![Feedback::AutoClickerIndicator(Some(power))],
        }
    }

    /// Occasional notice and payout sound for a confirmed auto-click.
    pub fn auto_click_result(&mut self, result: &AutoClickResult, now: f64) -> Vec<Feedback> {
        let mut feedback = Vec::new();
        if result.auto_clicks > 0 && self.rng.random_bool(self.notice_chance) {
            let text = format!("Автокликер: +{} монет", result.coins_earned);
            feedback.push(self.notice(now, text, NoticeStyle::AutoClick, AUTO_CLICK_NOTICE_MS));
        }
        if self.rng.random_bool(self.coin_sound_chance) {
            feedback.push(Feedback::Sound(SoundCue::Coins(result.coins_earned)));
        }
        feedback
    }

    /// A shop purchase. Buying the auto-clicker re-reads it from the server
    /// a little later, once the purchase has settled.
    pub fn upgrade_purchased(&mut self, upgrade_type: &str, now: f64) -> Vec<Feedback> {
        if upgrade_type == AUTO_CLICKER_UPGRADE {
            debug!("Auto clicker upgrade purchased, re-sync scheduled");
            self.timers
                .schedule_once(EventTimer::AutoClickerResync, now, AUTO_CLICKER_RESYNC_MS);
        }
        vec![Feedback::Sound(SoundCue::Upgrade)]
    }

    /// Star bursts scattered over `area`, one now and the rest staggered.
    pub fn skin_unlocked(&mut self, now: f64, area: Stage) -> Vec<Feedback> {
        self.unlock_area = area;
        for step in 1..UNLOCK_BURSTS {
            self.timers.schedule_once(
                EventTimer::UnlockBurst(step),
                now,
                step as f64 * UNLOCK_BURST_STEP_MS,
            );
        }
        vec![Feedback::Sound(SoundCue::Achievement), self.unlock_burst()]
    }

    fn unlock_burst(&mut self) -> Feedback {
        Feedback::Burst {
            x: self.rng.random::<f64>() * self.unlock_area.width,
            y: self.rng.random::<f64>() * self.unlock_area.height,
            count: UNLOCK_BURST_SIZE,
            color: Some(UNLOCK_COLOR),
            kind: ParticleKind::Star,
        }
    }

    /// Fire due timers.
    pub fn advance(&mut self, now: f64) -> Vec<Feedback> {
        let mut feedback = Vec::new();
        for timer in self.timers.fire_due(now) {
            match timer {
                EventTimer::DismissNotice(id) => feedback.push(Feedback::DismissNotice(id)),
                EventTimer::UnlockBurst(_) => feedback.push(self.unlock_burst()),
                EventTimer::AutoClickerResync => feedback.push(Feedback::ResyncAutoClicker),
            }
        }
        feedback
    }
}

fn chance(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}
