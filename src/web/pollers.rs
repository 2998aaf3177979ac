//! Page-side observers for the three pollers and their spawning.

use super::{dom, route, with_page};
use crate::api::{Achievement, ApiClient, AutoClickerInfo, BattleState};
use crate::config::ClickerConfig;
use crate::feedback::{Feedback, SoundCue};
use crate::poll::{
    poll_once, run_poll_loop, AchievementSource, AutoClickerSource, BattleSource, PollObserver,
    PollOutcome, PollPolicy, PollSession, PollSource,
};
use crate::utils::escape_html;
use gloo_timers::callback::Timeout;
use gloo_timers::future::TimeoutFuture;
use log::{debug, info, warn};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use wasm_bindgen_futures::spawn_local;

use super::transport::FetchTransport;

thread_local! {
    static SESSIONS: RefCell<HashMap<String, Rc<RefCell<PollSession>>>> = RefCell::new(HashMap::new());
}

fn session(resource: &str) -> Rc<RefCell<PollSession>> {
    SESSIONS.with(|s| {
        s.borrow_mut()
            .entry(resource.to_string())
            .or_insert_with(|| Rc::new(RefCell::new(PollSession::new(resource))))
            .clone()
    })
}

pub fn client() -> ApiClient<FetchTransport> {
    ApiClient::new(FetchTransport)
}

fn spawn<S, O>(resource: String, policy: PollPolicy, mut source: S, mut observer: O)
where
    S: PollSource + 'static,
    O: PollObserver<S::Data> + 'static,
{
    let session = session(&resource);
    spawn_local(async move {
        let exit = run_poll_loop(&session, &policy, &mut source, &mut observer, TimeoutFuture::new).await;
        debug!("Poller {} exited: {:?}", resource, exit);
    });
}

// ---- Battle ----------------------------------------------------------------

struct BattleView {
    reload_ms: u32,
}

fn scalar_text(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

impl PollObserver<BattleState> for BattleView {
    fn apply(&mut self, data: &BattleState) {
        dom::set_text(dom::BATTLE_STATUS, &data.status);
        for (key, value) in &data.extra {
            if let Some(text) = scalar_text(value) {
                dom::set_text(&format!("battle-{}", key.replace('_', "-")), &text);
            }
        }
    }

    fn finalize(&mut self, data: &BattleState) {
        info!("Battle finished: {}", data.status);
        if let Some(results) = dom::html_by_id(dom::BATTLE_RESULTS) {
            let _ = results.class_list().add_1("show");
        }
        Timeout::new(self.reload_ms, dom::reload).forget();
    }
}

pub fn start_battle(battle_id: &str, config: &ClickerConfig) {
    spawn(
        format!("battle-{}", battle_id),
        PollPolicy::battle(config),
        BattleSource::new(client(), battle_id),
        BattleView {
            reload_ms: config.finish_reload_ms,
        },
    );
}

// ---- Auto-clicker ----------------------------------------------------------

struct AutoClickerView;

impl PollObserver<AutoClickerInfo> for AutoClickerView {
    fn apply(&mut self, info: &AutoClickerInfo) {
        let power = info.effective_power();
        let now = dom::now();
        let changed = with_page(|page| {
            let previous = page.engine.auto_power();
            page.engine.set_auto_power(power);
            (previous, page.events.auto_clicker_changed(power, now))
        });
        dom::set_text(dom::AUTO_CLICKER_POWER, &format!("{}/сек", power));
        if let Some((previous, feedback)) = changed {
            if previous != power {
                info!("Auto clicker power changed: {} -> {}", previous, power);
            }
            route(feedback, now);
        }
    }
}

fn auto_clicker_resource(player_id: &str) -> String {
    format!("auto-clicker-{}", player_id)
}

pub fn start_auto_clicker_sync(player_id: &str, config: &ClickerConfig) {
    spawn(
        auto_clicker_resource(player_id),
        PollPolicy::auto_clicker_sync(config),
        AutoClickerSource::new(client(), player_id),
        AutoClickerView,
    );
}

/// Out-of-band read after a purchase. Shares the sync loop's session, so it
/// never overlaps a scheduled request.
pub fn resync_auto_clicker(player_id: &str) {
    let session = session(&auto_clicker_resource(player_id));
    let mut source = AutoClickerSource::new(client(), player_id);
    spawn_local(async move {
        match poll_once(&session, &mut source).await {
            Some(PollOutcome::Updated { data, .. }) => AutoClickerView.apply(&data),
            Some(PollOutcome::NoChange) => debug!("Auto clicker unchanged after purchase"),
            Some(PollOutcome::Failed(e)) => warn!("Error updating auto clicker: {}", e),
            None => debug!("Auto clicker sync already in flight"),
        }
    });
}

// ---- Achievements ----------------------------------------------------------

struct AchievementView {
    dismiss_ms: u32,
    reload_ms: u32,
}

fn show_popup(achievement: &Achievement) {
    let Some(popup) = dom::html_by_id(dom::ACHIEVEMENT_POPUP) else {
        debug!("No achievement popup on this page");
        return;
    };
    let color = achievement.rarity.color();
    dom::set_style(&popup, "border-color", color);
    if let Ok(Some(icon)) = popup.query_selector(".popup-icon i") {
        icon.set_class_name(&achievement.icon);
    }
    if let Ok(Some(frame)) = popup.query_selector(".popup-icon") {
        let _ = frame.set_attribute("style", &format!("color: {}", color));
    }
    dom::set_text(dom::POPUP_NAME, &achievement.name);
    dom::set_text(dom::POPUP_DESC, &achievement.description);
    if let Some(rewards) = dom::by_id(dom::POPUP_REWARDS) {
        let html = if achievement.reward_coins > 0 {
            format!(
                r#"<div class="reward-item"><i class="fas fa-coins"></i> +{} монет</div>"#,
                achievement.reward_coins
            )
        } else {
            String::new()
        };
        rewards.set_inner_html(&html);
    }
    let _ = popup.class_list().add_1("show");
}

fn close_popup() -> bool {
    match dom::html_by_id(dom::ACHIEVEMENT_POPUP) {
        Some(popup) if popup.class_list().contains("show") => {
            let _ = popup.class_list().remove_1("show");
            true
        }
        _ => false,
    }
}

fn mark_seen(id: u64) {
    spawn_local(async move {
        match client().mark_achievement_seen(id).await {
            Ok(flag) if flag.success => {
                let Some(card) = dom::select(&format!("[data-achievement-id=\"{}\"]", id)) else {
                    return;
                };
                let _ = card.class_list().remove_1("new-unlocked");
                for selector in [".new-badge", ".mark-seen-btn"] {
                    if let Ok(Some(el)) = card.query_selector(selector) {
                        el.remove();
                    }
                }
            }
            Ok(_) => debug!("Achievement {} not marked seen", id),
            Err(e) => warn!("Error marking achievement seen: {}", e),
        }
    });
}

impl PollObserver<Vec<Achievement>> for AchievementView {
    fn apply(&mut self, achievements: &Vec<Achievement>) {
        for achievement in achievements {
            info!("Achievement unlocked: {}", achievement.name);
            show_popup(achievement);
            route(vec![Feedback::Sound(SoundCue::Achievement)], dom::now());
            let id = achievement.id;
            Timeout::new(self.dismiss_ms, move || {
                if close_popup() {
                    mark_seen(id);
                }
            })
            .forget();
        }
        if dom::pathname().contains("achievements") {
            Timeout::new(self.reload_ms, dom::reload).forget();
        }
    }
}

pub fn start_achievement_checks(player_id: &str, config: &ClickerConfig) {
    spawn(
        format!("achievements-{}", player_id),
        PollPolicy::achievements(config),
        AchievementSource::new(client()),
        AchievementView {
            dismiss_ms: crate::config::POPUP_DISMISS_MS,
            reload_ms: config.finish_reload_ms,
        },
    );
}

/// One-off fill of the "next achievements" panel.
pub fn load_next_achievements() {
    spawn_local(async {
        let progress = match client().achievement_progress().await {
            Ok(p) => p,
            Err(e) => {
                warn!("Error loading next achievements: {}", e);
                return;
            }
        };
        if !progress.success || progress.next_achievements.is_empty() {
            return;
        }
        let Some(container) = dom::select(".next-achievements") else {
            return;
        };
        let html: String = progress
            .next_achievements
            .iter()
            .map(|item| {
                let pct = item.progress.percentage.clamp(0.0, 100.0);
                format!(
                    r#"<div class="next-achievement">
    <div class="next-icon"><i class="{icon}"></i></div>
    <div class="next-info">
        <h5>{name}</h5>
        <div class="next-progress">
            <div class="progress-bar"><div class="progress-fill" style="width: {pct}%"></div></div>
            <span>{rounded}%</span>
        </div>
    </div>
</div>"#,
                    icon = escape_html(&item.icon),
                    name = escape_html(&item.name),
                    pct = pct,
                    rounded = pct.round(),
                )
            })
            .collect();
        container.set_inner_html(&html);
    });
}
