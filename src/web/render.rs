use super::dom;
use crate::config::PARTICLE_CANVAS_ID;
use crate::effects::{EffectEngine, ParticleKind};
use std::f64::consts::TAU;
use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

const CANVAS_CSS: &str =
    "position: fixed; top: 0; left: 0; width: 100%; height: 100%; pointer-events: none; z-index: 9998;";

/// Full-viewport overlay the particles and floating labels are drawn on.
pub struct Overlay {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
}

impl Overlay {
    pub fn attach() -> Option<Self> {
        let canvas = dom::ensure_element("canvas", PARTICLE_CANVAS_ID, CANVAS_CSS)?
            .dyn_into::<HtmlCanvasElement>()
            .ok()?;
        let ctx = canvas
            .get_context("2d")
            .ok()
            .flatten()?
            .dyn_into::<CanvasRenderingContext2d>()
            .ok()?;
        let overlay = Overlay { canvas, ctx };
        overlay.resize();
        Some(overlay)
    }

    pub fn resize(&self) {
        let stage = dom::stage();
        self.canvas.set_width(stage.width as u32);
        self.canvas.set_height(stage.height as u32);
    }

    pub fn draw(&self, fx: &EffectEngine, now: f64) {
        let ctx = &self.ctx;
        ctx.clear_rect(0.0, 0.0, self.canvas.width() as f64, self.canvas.height() as f64);

        for sprite in fx.render() {
            ctx.save();
            ctx.set_global_alpha(sprite.alpha);
            ctx.set_fill_style_str(sprite.color);
            match (sprite.kind, sprite.label) {
                (ParticleKind::Text, Some(label)) => {
                    ctx.set_font(&format!("{}px 'Press Start 2P', cursive", sprite.radius));
                    let _ = ctx.fill_text(label, sprite.x, sprite.y);
                }
                (ParticleKind::Coin, _) => {
                    let _ = ctx.translate(sprite.x, sprite.y);
                    let _ = ctx.rotate(sprite.rotation);
                    let r = sprite.radius;
                    ctx.fill_rect(-r, -r / 2.0, r * 2.0, r);
                }
                _ => {
                    ctx.begin_path();
                    let _ = ctx.arc(sprite.x, sprite.y, sprite.radius, 0.0, TAU);
                    ctx.fill();
                }
            }
            ctx.restore();
        }

        ctx.set_font("14px 'Press Start 2P', cursive");
        for text in fx.text_frames(now) {
            ctx.set_global_alpha(text.opacity);
            ctx.set_fill_style_str(text.color);
            let _ = ctx.fill_text(text.text, text.x, text.y);
        }
        ctx.set_global_alpha(1.0);
    }
}
