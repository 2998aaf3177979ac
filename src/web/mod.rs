//! Browser shell: DOM hooks, listeners, the frame loop and JS exports.
//!
//! Shared services live in thread-locals and are never borrowed across an
//! `.await`.

mod audio;
mod dom;
mod pollers;
mod render;
mod transport;

pub use audio::HtmlAudioBackend;
pub use transport::FetchTransport;

use crate::audio::{AudioOrchestrator, AudioState, SoundCatalog, VolumeKind};
use crate::clicker::{ClickEngine, ClickStats};
use crate::config::{ClickerConfig, AUTO_TICK_MS, CONFIG_SCRIPT_ID, NOTICE_FADE_MS, SKIN_BASE_PATH};
use crate::effects::{CounterAnimation, EffectEngine, ORIGIN};
use crate::error::ClickerError;
use crate::events::EventSequencer;
use crate::feedback::{self, dispatch, Feedback, NoticeStyle};
use crate::service::ServiceSlot;
use crate::utils::{escape_html, format_thousands, parse_counter};
use gloo_timers::callback::{Interval, Timeout};
use log::{debug, info, warn};
use render::Overlay;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::convert::FromWasmAbi;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys::{CustomEvent, EventTarget, HtmlElement, HtmlImageElement, KeyboardEvent, MouseEvent};

const COMBO_CSS: &str = "position: fixed; top: 20px; right: 20px; font-family: 'Press Start 2P', cursive; \
     font-size: 1.5rem; color: #FFD700; text-shadow: 0 0 10px rgba(255, 215, 0, 0.5); z-index: 9999; \
     opacity: 0; transition: opacity 0.3s;";
const FLOURISH_COLORS: [&str; 6] = ["#FF4081", "#FF9800", "#FFD700", "#4CAF50", "#2196F3", "#9C27B0"];
const FLOURISH_STEP_MS: u32 = 100;
const FLOURISH_MS: u32 = 1000;
const NOTICE_CSS: &str = "position: fixed; top: 100px; right: 20px; color: white; padding: 15px 20px; \
     border: 2px solid #ffd700; font-family: 'Press Start 2P', cursive; font-size: 0.7rem; display: flex; \
     align-items: center; gap: 10px; z-index: 1000; transform: translateX(150%); transition: transform 0.3s ease; \
     box-shadow: 0 0 20px rgba(0,0,0,0.3); background: linear-gradient(135deg, #4caf50 0%, #388e3c 100%);";
const INDICATOR_CSS: &str = "opacity: 0; transition: opacity 0.3s;";
const NOTICE_ENTER_MS: u32 = 10;

struct Page {
    engine: ClickEngine,
    events: EventSequencer,
    counter: Option<CounterAnimation>,
    player_id: Option<String>,
    config: ClickerConfig,
}

type Audio = AudioOrchestrator<HtmlAudioBackend>;

thread_local! {
    static AUDIO: ServiceSlot<Audio> = const { ServiceSlot::new() };
    static EFFECTS: ServiceSlot<EffectEngine> = const { ServiceSlot::new() };
    static PAGE: RefCell<Option<Page>> = const { RefCell::new(None) };
}

fn with_page<R>(f: impl FnOnce(&mut Page) -> R) -> Option<R> {
    PAGE.with(|p| p.borrow_mut().as_mut().map(f))
}

fn with_audio<R>(f: impl FnOnce(&mut Audio) -> R) -> Option<R> {
    let audio = AUDIO.with(ServiceSlot::get)?;
    let mut audio = audio.borrow_mut();
    Some(f(&mut audio))
}

fn with_effects<R>(f: impl FnOnce(&mut EffectEngine) -> R) -> Option<R> {
    let fx = EFFECTS.with(ServiceSlot::get)?;
    let mut fx = fx.borrow_mut();
    Some(f(&mut fx))
}

fn load_config() -> ClickerConfig {
    let Some(json) = dom::text_of(CONFIG_SCRIPT_ID) else {
        return ClickerConfig::default();
    };
    ClickerConfig::from_json(&json).unwrap_or_else(|e| {
        warn!("{}; using defaults", e);
        ClickerConfig::default()
    })
}

fn counter_from_page(id: &str) -> Option<u64> {
    dom::text_of(id).and_then(|t| parse_counter(&t))
}

/// Wire the page. Safe to call more than once; later calls are no-ops.
pub fn boot() -> Result<(), ClickerError> {
    if PAGE.with(|p| p.borrow().is_some()) {
        debug!("Clicker already initialized");
        return Ok(());
    }
    let config = load_config();

    let audio = AUDIO.with(|slot| {
        slot.install_with(|| {
            AudioOrchestrator::new(HtmlAudioBackend, SoundCatalog::with_base_path(&config.sound_base_path))
                .with_volumes(config.music_volume, config.sfx_volume)
        })
    });
    if audio.is_new() {
        info!("Audio manager initialized");
    }
    EFFECTS.with(|slot| slot.install_with(|| EffectEngine::new(config.combo_window_ms)));

    let engine = ClickEngine::new(&config).with_counters(
        counter_from_page(dom::COINS).unwrap_or(0),
        counter_from_page(dom::CLICKS).unwrap_or(0),
        counter_from_page(dom::CLICK_POWER).unwrap_or(1),
    );
    let player_id = dom::input_value(dom::PLAYER_ID);
    PAGE.with(|p| {
        p.replace(Some(Page {
            engine,
            events: EventSequencer::new(&config),
            counter: None,
            player_id: player_id.clone(),
            config: config.clone(),
        }))
    });

    dom::ensure_element("div", dom::COMBO_DISPLAY, COMBO_CSS);
    install_listeners()?;
    start_frame_loop();
    start_auto_tick();

    match player_id {
        Some(player_id) => {
            pollers::start_auto_clicker_sync(&player_id, &config);
            pollers::start_achievement_checks(&player_id, &config);
            pollers::load_next_achievements();
        }
        None => debug!("No player id on page, server sync disabled"),
    }

    info!("Clicker ready");
    Ok(())
}

// ---- Listeners -------------------------------------------------------------

fn listen<E>(target: &EventTarget, event: &str, handler: impl FnMut(E) + 'static)
where
    E: FromWasmAbi + 'static,
{
    let closure = Closure::<dyn FnMut(E)>::new(handler);
    if let Err(e) = target.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref()) {
        warn!("Failed to attach {} listener: {:?}", event, e);
    }
    closure.forget();
}

/// `detail` of the shop's `upgradePurchased` event.
#[derive(Deserialize)]
struct UpgradeDetail {
    #[serde(default)]
    upgrade_type: String,
}

fn install_listeners() -> Result<(), ClickerError> {
    let document = dom::document().ok_or(ClickerError::MissingElement("document"))?;

    match dom::click_button() {
        Some(button) => listen(&button, "click", |e: MouseEvent| {
            handle_click(dom::now(), e.client_x() as f64, e.client_y() as f64);
        }),
        None => debug!("No click button on this page"),
    }

    listen(&document, "keydown", |e: KeyboardEvent| {
        if e.repeat() || !(e.code() == "Space" || e.key() == "Enter") {
            return;
        }
        if dom::click_button().is_none() {
            return;
        }
        e.prevent_default();
        let (x, y) = dom::stage().centre();
        handle_click(dom::now(), x, y);
    });

    for event in ["click", "touchstart"] {
        listen(&document, event, |_: web_sys::Event| {
            with_audio(|audio| audio.on_first_interaction());
        });
    }

    listen(&document, "upgradePurchased", |e: CustomEvent| {
        let upgrade_type = serde_wasm_bindgen::from_value::<UpgradeDetail>(e.detail())
            .map(|d| d.upgrade_type)
            .unwrap_or_default();
        let now = dom::now();
        let feedback = with_page(|page| page.events.upgrade_purchased(&upgrade_type, now)).unwrap_or_default();
        route(feedback, now);
    });

    if let Some(window) = dom::window() {
        listen(&window, "resize", |_: web_sys::Event| {
            if let Some(overlay) = Overlay::attach() {
                overlay.resize();
            }
        });
    }
    Ok(())
}

fn handle_click(now: f64, x: f64, y: f64) {
    let Some(outcome) = with_page(|page| page.engine.click(now, x, y)) else {
        return;
    };
    if outcome.critical {
        debug!("Critical click: +{}", outcome.earned);
    }
    route(outcome.feedback, now);
}

// ---- Feedback routing ------------------------------------------------------

fn route(feedback: Vec<Feedback>, now: f64) {
    if feedback.is_empty() {
        return;
    }
    let Some(fx) = EFFECTS.with(ServiceSlot::get) else {
        return;
    };
    let audio = AUDIO.with(ServiceSlot::get);
    let stage = dom::stage();
    let page_items = {
        let mut audio = audio.as_ref().map(|a| a.borrow_mut());
        dispatch(feedback, now, &stage, audio.as_deref_mut(), &mut fx.borrow_mut())
    };
    for item in page_items {
        apply_to_page(item, now);
    }
}

fn apply_to_page(item: Feedback, now: f64) {
    match item {
        Feedback::ButtonPress => {
            if let Some(button) = dom::click_button() {
                dom::set_style(&button, "transform", "scale(0.95)");
                dom::set_style(&button, "filter", "brightness(1.2)");
            }
        }
        Feedback::ButtonRelease => {
            if let Some(button) = dom::click_button() {
                dom::set_style(&button, "transform", "scale(1)");
                dom::set_style(&button, "filter", "brightness(1)");
            }
        }
        Feedback::StreakFlourish => streak_flourish(),
        Feedback::ComboShown { text, color } => {
            if let Some(el) = dom::html_by_id(dom::COMBO_DISPLAY) {
                el.set_text_content(Some(&text));
                dom::set_style(&el, "opacity", "1");
                dom::set_style(&el, "color", color);
            }
        }
        Feedback::CoinsChanged { from, to } => {
            with_page(|page| {
                let shown = page.counter.map_or(from, |c| c.value_at(now));
                page.counter = Some(CounterAnimation::new(shown, to, now));
            });
        }
        Feedback::ClicksChanged(clicks) => dom::set_text(dom::CLICKS, &clicks.to_string()),
        Feedback::SaveProgress { coins, click_power } => {
            spawn_local(async move {
                if let Err(e) = pollers::client().update_coins(coins, click_power).await {
                    warn!("Save error: {}", e);
                }
            });
        }
        Feedback::AutoClicked => report_auto_click(),
        Feedback::ShowNotice { id, text, style } => show_notice(id, &text, style),
        Feedback::DismissNotice(id) => {
            if let Some(el) = dom::html_by_id(&notice_id(id)) {
                let _ = el.class_list().remove_1("show");
                dom::set_style(&el, "transform", "translateX(150%)");
                remove_later(el);
            }
        }
        Feedback::AutoClickerIndicator(Some(power)) => {
            if let Some(el) = dom::ensure_element("div", dom::AUTO_CLICKER_INDICATOR, INDICATOR_CSS) {
                el.set_inner_html(&format!(
                    r#"<i class="fas fa-robot fa-spin"></i> <span>Автокликер: {} клик/сек</span>"#,
                    power
                ));
                Timeout::new(NOTICE_ENTER_MS, move || dom::set_style(&el, "opacity", "1")).forget();
            }
        }
        Feedback::AutoClickerIndicator(None) => {
            if let Some(el) = dom::html_by_id(dom::AUTO_CLICKER_INDICATOR) {
                dom::set_style(&el, "opacity", "0");
                remove_later(el);
            }
        }
        Feedback::ResyncAutoClicker => {
            if let Some(player_id) = with_page(|page| page.player_id.clone()).flatten() {
                pollers::resync_auto_clicker(&player_id);
            }
        }
        other => debug!("Unhandled page feedback: {:?}", other),
    }
}

fn notice_id(id: u32) -> String {
    format!("clicker-notice-{}", id)
}

fn show_notice(id: u32, text: &str, style: NoticeStyle) {
    let (css, icon) = match style {
        NoticeStyle::Success => (NOTICE_CSS, "check-circle"),
        NoticeStyle::AutoClick => ("", "robot"),
    };
    let Some(el) = dom::append_div(&notice_id(id), style.css_class(), css) else {
        return;
    };
    el.set_inner_html(&format!(
        r#"<i class="fas fa-{}"></i> <span>{}</span>"#,
        icon,
        escape_html(text)
    ));
    Timeout::new(NOTICE_ENTER_MS, move || {
        let _ = el.class_list().add_1("show");
        dom::set_style(&el, "transform", "translateX(0)");
    })
    .forget();
}

/// Detach `el` once its fade-out transition is over.
fn remove_later(el: HtmlElement) {
    Timeout::new(NOTICE_FADE_MS, move || el.remove()).forget();
}

fn streak_flourish() {
    let Some(button) = dom::click_button() else {
        return;
    };
    let step = Rc::new(RefCell::new(0usize));
    let styled = button.clone();
    let interval = Interval::new(FLOURISH_STEP_MS, move || {
        let mut i = step.borrow_mut();
        let color = FLOURISH_COLORS[*i % FLOURISH_COLORS.len()];
        dom::set_style(&styled, "border-color", color);
        dom::set_style(&styled, "box-shadow", &format!("0 0 40px {}80", color));
        *i += 1;
    });
    Timeout::new(FLOURISH_MS, move || {
        drop(interval);
        dom::set_style(&button, "border-color", "");
        dom::set_style(&button, "box-shadow", "");
    })
    .forget();
}

fn report_auto_click() {
    let Some(player_id) = with_page(|page| page.player_id.clone()).flatten() else {
        return;
    };
    spawn_local(async move {
        match pollers::client().auto_click(&player_id).await {
            Ok(result) if result.success => {
                let now = dom::now();
                let feedback = with_page(|page| {
                    let mut feedback: Vec<Feedback> =
                        page.engine.reconcile(result.coins, result.clicks).into_iter().collect();
                    feedback.extend(page.events.auto_click_result(&result, now));
                    feedback
                })
                .unwrap_or_default();
                dom::set_text(dom::CLICKS, &result.clicks.to_string());
                route(feedback, now);
            }
            Ok(_) => debug!("Auto click rejected by server"),
            Err(e) => warn!("Auto click error: {}", e),
        }
    });
}

// ---- Loops -----------------------------------------------------------------

fn start_auto_tick() {
    Interval::new(AUTO_TICK_MS, || {
        let anchor = dom::click_button()
            .map(|b| dom::centre_of(&b))
            .unwrap_or_else(|| dom::stage().centre());
        let feedback = with_page(|page| page.engine.auto_tick(anchor)).unwrap_or_default();
        route(feedback, dom::now());
    })
    .forget();
}

fn frame(now: f64, overlay: Option<&Overlay>, shaken: &mut bool) {
    let due = with_page(|page| {
        let mut due = page.engine.advance(now);
        due.extend(page.events.advance(now));
        due
    })
    .unwrap_or_default();
    route(due, now);

    let Some(report) = with_effects(|fx| fx.frame(now)) else {
        return;
    };
    if report.combo_reset {
        if let Some(el) = dom::html_by_id(dom::COMBO_DISPLAY) {
            dom::set_style(&el, "opacity", "0");
        }
    }
    if report.shake_offset != ORIGIN || *shaken {
        if let Some(body) = dom::document().and_then(|d| d.body()) {
            let (dx, dy) = report.shake_offset;
            let transform = if report.shake_offset == ORIGIN {
                String::new()
            } else {
                format!("translate({}px, {}px)", dx, dy)
            };
            dom::set_style(&body, "transform", &transform);
        }
        *shaken = report.shake_offset != ORIGIN;
    }
    if let Some(overlay) = overlay {
        with_effects(|fx| overlay.draw(fx, now));
    }

    let tween = with_page(|page| {
        let anim = page.counter?;
        let done = anim.is_done(now);
        if done {
            page.counter = None;
        }
        Some((anim.value_at(now), done))
    })
    .flatten();
    if let Some((value, done)) = tween {
        dom::set_text(dom::COINS, &format_thousands(value));
        if let Some(el) = dom::html_by_id(dom::COINS) {
            dom::set_style(&el, "color", if done { "" } else { "#4CAF50" });
            dom::set_style(&el, "transform", if done { "" } else { "scale(1.1)" });
        }
    }
}

fn start_frame_loop() {
    let overlay = Overlay::attach();
    if overlay.is_none() {
        warn!("Canvas 2D context not available");
    }
    let mut shaken = false;
    let f: Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>> = Rc::new(RefCell::new(None));
    let g = f.clone();
    *g.borrow_mut() = Some(Closure::new(move |ts: f64| {
        frame(ts, overlay.as_ref(), &mut shaken);
        if let (Some(w), Some(cb)) = (dom::window(), f.borrow().as_ref()) {
            let _ = w.request_animation_frame(cb.as_ref().unchecked_ref());
        }
    }));
    if let (Some(w), Some(cb)) = (dom::window(), g.borrow().as_ref()) {
        let _ = w.request_animation_frame(cb.as_ref().unchecked_ref());
    }
}

// ---- JS exports ------------------------------------------------------------

#[wasm_bindgen]
pub fn toggle_mute() -> bool {
    with_audio(|audio| audio.toggle_mute()).unwrap_or(false)
}

#[wasm_bindgen]
pub fn set_volume(kind: &str, value: f32) -> Result<(), JsValue> {
    let kind = VolumeKind::from_name(kind)
        .ok_or_else(|| JsValue::from_str(&format!("Unknown volume kind: {}", kind)))?;
    with_audio(|audio| audio.set_volume(kind, value))
        .transpose()
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    Ok(())
}

/// Play a catalog sound by name (`click`, `critical`, `unlock`, ...).
/// Returns whether anything started.
#[wasm_bindgen]
pub fn play_sound(name: &str, variant: Option<u32>) -> bool {
    let variant = variant.unwrap_or(0) as usize;
    with_audio(|audio| audio.play_named(name, variant).is_some()).unwrap_or(false)
}

#[wasm_bindgen]
pub fn unlock_skin(name: &str) {
    info!("Skin unlocked: {}", name);
    let now = dom::now();
    let stage = dom::stage();
    let feedback = with_page(|page| page.events.skin_unlocked(now, stage)).unwrap_or_default();
    route(feedback, now);
}

#[wasm_bindgen]
pub fn change_skin(name: &str) {
    if let Some(img) = dom::by_id(dom::SKIN_IMAGE).and_then(|e| e.dyn_into::<HtmlImageElement>().ok()) {
        img.set_src(&format!("{}{}", SKIN_BASE_PATH, name));
    }
    let (x, y) = dom::click_button()
        .map(|b| dom::centre_of(&b))
        .unwrap_or_else(|| dom::stage().centre());
    info!("Skin changed to {}", name);
    route(feedback::skin_changed(x, y), dom::now());
}

#[wasm_bindgen]
pub fn start_battle(battle_id: &str) {
    let config = with_page(|page| page.config.clone()).unwrap_or_default();
    pollers::start_battle(battle_id, &config);
}

#[wasm_bindgen]
pub async fn battle_click(battle_id: String) -> JsValue {
    match pollers::client().battle_click(&battle_id).await {
        Ok(payload) => serde_wasm_bindgen::to_value(&payload).unwrap_or(JsValue::NULL),
        Err(e) => {
            warn!("Click error: {}", e);
            JsValue::NULL
        }
    }
}

#[derive(Serialize)]
struct Snapshot {
    #[serde(flatten)]
    stats: Option<ClickStats>,
    combo: u32,
    max_combo: u32,
    particles: usize,
    audio: Option<AudioState>,
}

#[wasm_bindgen]
pub fn clicker_snapshot() -> JsValue {
    let (combo, max_combo, particles) = with_effects(|fx| {
        (fx.combo().combo(), fx.combo().max_combo(), fx.particle_count())
    })
    .unwrap_or_default();
    let snapshot = Snapshot {
        stats: with_page(|page| page.engine.stats()),
        combo,
        max_combo,
        particles,
        audio: with_audio(|audio| audio.state().clone()),
    };
    serde_wasm_bindgen::to_value(&snapshot).unwrap_or(JsValue::NULL)
}
