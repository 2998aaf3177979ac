//! Thin DOM accessors. Every lookup is optional: a missing hook means the
//! feature it feeds silently does nothing.

use crate::feedback::Stage;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlDocument, HtmlElement, HtmlInputElement, Window};

// Template hooks
pub const PLAYER_ID: &str = "player-id";
pub const CLICK_BUTTON: &str = "click-button";
pub const COINS: &str = "coins";
pub const CLICKS: &str = "clicks";
pub const CLICK_POWER: &str = "click-power";
pub const AUTO_CLICKER_POWER: &str = "auto-clicker-power";
pub const SKIN_IMAGE: &str = "skin-image";
pub const ACHIEVEMENT_POPUP: &str = "achievement-popup";
pub const POPUP_NAME: &str = "popup-achievement-name";
pub const POPUP_DESC: &str = "popup-achievement-desc";
pub const POPUP_REWARDS: &str = "popup-achievement-rewards";
pub const COMBO_DISPLAY: &str = "combo-display";
pub const BATTLE_STATUS: &str = "battle-status";
pub const BATTLE_RESULTS: &str = "battle-results";
pub const AUTO_CLICKER_INDICATOR: &str = "auto-clicker-indicator";

pub fn window() -> Option<Window> {
    web_sys::window()
}

pub fn document() -> Option<Document> {
    window()?.document()
}

pub fn by_id(id: &str) -> Option<Element> {
    document()?.get_element_by_id(id)
}

pub fn html_by_id(id: &str) -> Option<HtmlElement> {
    by_id(id)?.dyn_into::<HtmlElement>().ok()
}

pub fn select(selector: &str) -> Option<Element> {
    document()?.query_selector(selector).ok().flatten()
}

/// The big cat button; older templates only carry the class.
pub fn click_button() -> Option<HtmlElement> {
    html_by_id(CLICK_BUTTON).or_else(|| select(".click-button")?.dyn_into::<HtmlElement>().ok())
}

pub fn text_of(id: &str) -> Option<String> {
    by_id(id)?.text_content()
}

pub fn set_text(id: &str, text: &str) {
    if let Some(el) = by_id(id) {
        el.set_text_content(Some(text));
    }
}

pub fn input_value(id: &str) -> Option<String> {
    let value = by_id(id)?.dyn_into::<HtmlInputElement>().ok()?.value();
    (!value.is_empty()).then_some(value)
}

pub fn set_style(el: &HtmlElement, property: &str, value: &str) {
    let _ = el.style().set_property(property, value);
}

pub fn now() -> f64 {
    window()
        .and_then(|w| w.performance())
        .map(|p| p.now())
        .unwrap_or(0.0)
}

pub fn stage() -> Stage {
    let dimension = |v: Result<wasm_bindgen::JsValue, wasm_bindgen::JsValue>| {
        v.ok().and_then(|v| v.as_f64()).unwrap_or(0.0)
    };
    match window() {
        Some(w) => Stage {
            width: dimension(w.inner_width()),
            height: dimension(w.inner_height()),
        },
        None => Stage {
            width: 0.0,
            height: 0.0,
        },
    }
}

/// Centre of `el` in viewport coordinates.
pub fn centre_of(el: &Element) -> (f64, f64) {
    let rect = el.get_bounding_client_rect();
    (rect.left() + rect.width() / 2.0, rect.top() + rect.height() / 2.0)
}

pub fn cookies() -> String {
    document()
        .and_then(|d| d.dyn_into::<HtmlDocument>().ok())
        .and_then(|d| d.cookie().ok())
        .unwrap_or_default()
}

pub fn csrf_form_field() -> Option<String> {
    select("[name=csrfmiddlewaretoken]")?
        .dyn_into::<HtmlInputElement>()
        .ok()
        .map(|i| i.value())
}

pub fn pathname() -> String {
    window()
        .and_then(|w| w.location().pathname().ok())
        .unwrap_or_default()
}

pub fn reload() {
    if let Some(w) = window() {
        let _ = w.location().reload();
    }
}

/// Fetch an element by id or create it under `<body>` with inline styles.
pub fn ensure_element(tag: &str, id: &str, css: &str) -> Option<HtmlElement> {
    if let Some(el) = html_by_id(id) {
        return Some(el);
    }
    let doc = document()?;
    let el = doc.create_element(tag).ok()?.dyn_into::<HtmlElement>().ok()?;
    el.set_id(id);
    let _ = el.set_attribute("style", css);
    doc.body()?.append_child(&el).ok()?;
    Some(el)
}

/// Append a fresh `<div>` to `<body>`.
pub fn append_div(id: &str, class: &str, css: &str) -> Option<HtmlElement> {
    let doc = document()?;
    let el = doc.create_element("div").ok()?.dyn_into::<HtmlElement>().ok()?;
    el.set_id(id);
    el.set_class_name(class);
    if !css.is_empty() {
        let _ = el.set_attribute("style", css);
    }
    doc.body()?.append_child(&el).ok()?;
    Some(el)
}
