//! Client-side core of the CATVID clicker.
//!
//! Everything here is plain Rust driven by an explicit clock, so it runs and
//! tests natively. The browser shell in [`web`] (wasm only) owns the DOM,
//! `fetch`, audio elements and the frame loop, and feeds them through these
//! types.

pub mod api;
pub mod audio;
pub mod clicker;
pub mod config;
pub mod effects;
pub mod error;
pub mod events;
pub mod feedback;
pub mod poll;
pub mod service;
pub mod timer;
pub mod utils;

#[cfg(target_arch = "wasm32")]
pub mod web;

pub use audio::{AudioBackend, AudioOrchestrator, SoundCatalog, SoundCategory};
pub use clicker::{ClickEngine, ClickOutcome, ClickStats};
pub use config::ClickerConfig;
pub use effects::EffectEngine;
pub use error::ClickerError;
pub use events::EventSequencer;
pub use feedback::{dispatch, Feedback, Stage};
pub use poll::{run_poll_loop, PollPolicy, PollSession};
