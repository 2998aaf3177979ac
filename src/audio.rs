//! Sound catalog, volume/mute state and the single looping music track.
//!
//! Platform playback sits behind [`AudioBackend`]; the orchestrator only
//! decides *what* to play and never lets a playback failure escape.

use crate::config::{MUSIC_VOLUME, SFX_VOLUME};
use crate::error::ClickerError;
use log::{debug, info, warn};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SoundCategory {
    Click,
    Critical,
    Upgrade,
    Achievement,
    Skin,
    Music,
}

impl SoundCategory {
    pub const ALL: [SoundCategory; 6] = [
        SoundCategory::Click,
        SoundCategory::Critical,
        SoundCategory::Upgrade,
        SoundCategory::Achievement,
        SoundCategory::Skin,
        SoundCategory::Music,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SoundCategory::Click => "click",
            SoundCategory::Critical => "critical",
            SoundCategory::Upgrade => "upgrade",
            SoundCategory::Achievement => "achievement",
            SoundCategory::Skin => "skin",
            SoundCategory::Music => "music",
        }
    }

    /// `unlock` is what the skin screen asks for.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "click" => Some(SoundCategory::Click),
            "critical" => Some(SoundCategory::Critical),
            "upgrade" => Some(SoundCategory::Upgrade),
            "achievement" => Some(SoundCategory::Achievement),
            "skin" | "unlock" => Some(SoundCategory::Skin),
            "music" => Some(SoundCategory::Music),
            _ => None,
        }
    }
}

/// Category -> non-empty ordered list of asset URLs.
#[derive(Debug, Clone, Default)]
pub struct SoundCatalog {
    entries: HashMap<SoundCategory, Vec<String>>,
}

impl SoundCatalog {
    pub fn empty() -> Self {
        Self::default()
    }

    /// The stock catalog served from `base_path`.
    pub fn with_base_path(base_path: &str) -> Self {
        let asset = |file: &str| format!("{}{}", base_path, file);
        let mut entries = HashMap::new();
        entries.insert(
            SoundCategory::Click,
            vec![asset("click.mp3"), asset("meow1.mp3"), asset("meow2.mp3")],
        );
        entries.insert(
            SoundCategory::Critical,
            vec![asset("meow3.mp3"), asset("click.mp3")],
        );
        entries.insert(
            SoundCategory::Upgrade,
            vec![asset("meow1.mp3"), asset("meow2.mp3")],
        );
        entries.insert(
            SoundCategory::Achievement,
            vec![asset("meow3.mp3"), asset("click.mp3")],
        );
        entries.insert(
            SoundCategory::Skin,
            vec![asset("meow1.mp3"), asset("meow2.mp3")],
        );
        entries.insert(SoundCategory::Music, vec![asset("bg.mp3")]);
        Self { entries }
    }

    /// Register assets for a category. Empty lists are refused so that
    /// variant selection can always resolve.
    pub fn insert(&mut self, category: SoundCategory, assets: Vec<String>) -> Result<(), ClickerError> {
        if assets.is_empty() {
            return Err(ClickerError::Config(format!(
                "sound category '{}' needs at least one asset",
                category.as_str()
            )));
        }
        self.entries.insert(category, assets);
        Ok(())
    }

    pub fn variants(&self, category: SoundCategory) -> Option<&[String]> {
        self.entries.get(&category).map(|v| v.as_slice())
    }

    /// `variant` wraps around the list length, so any index resolves.
    pub fn resolve(&self, category: SoundCategory, variant: usize) -> Option<&str> {
        let list = self.entries.get(&category)?;
        list.get(variant % list.len()).map(|s| s.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolumeKind {
    Music,
    Sfx,
}

impl VolumeKind {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "music" => Some(VolumeKind::Music),
            "sfx" => Some(VolumeKind::Sfx),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AudioState {
    pub music_volume: f32,
    pub sfx_volume: f32,
    pub is_muted: bool,
}

impl Default for AudioState {
    fn default() -> Self {
        Self {
            music_volume: MUSIC_VOLUME,
            sfx_volume: SFX_VOLUME,
            is_muted: false,
        }
    }
}

fn unit_volume(value: f32) -> Result<f32, ClickerError> {
    if !value.is_finite() {
        warn!("Ignoring volume {}", value);
        return Err(ClickerError::Config(format!("volume must be a finite number, got {}", value)));
    }
    Ok(value.clamp(0.0, 1.0))
}

/// Platform playback seam.
pub trait AudioBackend {
    type Handle;

    /// Create a playable for `url` and start it. Asynchronous rejections
    /// (autoplay policy) are the backend's to log; only construction
    /// failures come back as errors.
    fn play(&mut self, url: &str, volume: f32, looped: bool) -> Result<Self::Handle, ClickerError>;

    /// Stop and rewind.
    fn stop(&mut self, handle: &Self::Handle);

    fn set_volume(&mut self, handle: &Self::Handle, volume: f32);
}

pub struct AudioOrchestrator<B: AudioBackend> {
    backend: B,
    catalog: SoundCatalog,
    state: AudioState,
    current_music: Option<B::Handle>,
    interaction_seen: bool,
    rng: SmallRng,
}

impl<B: AudioBackend> AudioOrchestrator<B> {
    pub fn new(backend: B, catalog: SoundCatalog) -> Self {
        Self::with_rng(backend, catalog, SmallRng::from_os_rng())
    }

    pub fn with_rng(backend: B, catalog: SoundCatalog, rng: SmallRng) -> Self {
        Self {
            backend,
            catalog,
            state: AudioState::default(),
            current_music: None,
            interaction_seen: false,
            rng,
        }
    }

    /// Start from configured volumes instead of the stock ones. Non-finite
    /// values keep the stock level.
    pub fn with_volumes(mut self, music_volume: f32, sfx_volume: f32) -> Self {
        if let Ok(v) = unit_volume(music_volume) {
            self.state.music_volume = v;
        }
        if let Ok(v) = unit_volume(sfx_volume) {
            self.state.sfx_volume = v;
        }
        self
    }

    pub fn state(&self) -> &AudioState {
        &self.state
    }

    pub fn is_music_playing(&self) -> bool {
        self.current_music.is_some()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Play variant `variant` (wrapping) of `category` at the sfx volume.
    /// Returns `None` when muted, when the category has no assets, or when the
    /// platform refused to create the playable.
    pub fn play_sound(&mut self, category: SoundCategory, variant: usize) -> Option<B::Handle> {
        if self.state.is_muted {
            debug!("Sound muted: {}", category.as_str());
            return None;
        }
        let Some(url) = self.catalog.resolve(category, variant) else {
            debug!("Sound type not found: {}", category.as_str());
            return None;
        };
        debug!("Playing sound: {}", url);
        match self.backend.play(url, self.state.sfx_volume, false) {
            Ok(handle) => Some(handle),
            Err(e) => {
                warn!("Sound play failed: {}", e);
                None
            }
        }
    }

    /// String-keyed entry point for callers outside the type system.
    pub fn play_named(&mut self, name: &str, variant: usize) -> Option<B::Handle> {
        match SoundCategory::from_name(name) {
            Some(category) => self.play_sound(category, variant),
            None => {
                debug!("Sound type not found: {}", name);
                None
            }
        }
    }

    pub fn play_random_sound(&mut self, category: SoundCategory) -> Option<B::Handle> {
        let len = self.catalog.variants(category)?.len();
        let variant = self.rng.random_range(0..len);
        self.play_sound(category, variant)
    }

    pub fn play_music(&mut self) {
        if self.state.is_muted || self.current_music.is_some() {
            debug!("Music muted or already playing");
            return;
        }
        let Some(url) = self.catalog.resolve(SoundCategory::Music, 0) else {
            warn!("No background music in catalog");
            return;
        };
        info!("Starting background music: {}", url);
        match self.backend.play(url, self.state.music_volume, true) {
            Ok(handle) => self.current_music = Some(handle),
            Err(e) => warn!("Music initialization failed: {}", e),
        }
    }

    pub fn stop_music(&mut self) {
        if let Some(handle) = self.current_music.take() {
            self.backend.stop(&handle);
        }
    }

    /// Flip mute. Muting releases the music track, unmuting restarts it.
    pub fn toggle_mute(&mut self) -> bool {
        self.state.is_muted = !self.state.is_muted;
        if self.state.is_muted {
            self.stop_music();
        } else {
            self.play_music();
        }
        self.state.is_muted
    }

    /// Clamp into `[0, 1]` and apply. NaN and infinities are refused and
    /// leave the state untouched.
    pub fn set_volume(&mut self, kind: VolumeKind, value: f32) -> Result<(), ClickerError> {
        let value = unit_volume(value)?;
        match kind {
            VolumeKind::Music => {
                self.state.music_volume = value;
                if let Some(handle) = &self.current_music {
                    self.backend.set_volume(handle, value);
                }
            }
            VolumeKind::Sfx => self.state.sfx_volume = value,
        }
        Ok(())
    }

    /// Bigger payouts get bigger sounds.
    pub fn play_coin_sound(&mut self, amount: u64) -> Option<B::Handle> {
        if amount >= 1000 {
            self.play_sound(SoundCategory::Achievement, 0)
        } else if amount >= 100 {
            self.play_sound(SoundCategory::Upgrade, 0)
        } else {
            self.play_random_sound(SoundCategory::Click)
        }
    }

    pub fn play_level_up(&mut self) -> Option<B::Handle> {
        self.play_sound(SoundCategory::Achievement, 0)
    }

    pub fn play_upgrade(&mut self) -> Option<B::Handle> {
        self.play_sound(SoundCategory::Upgrade, 0)
    }

    /// Browsers only allow audio after a user gesture; the first one starts
    /// the theme. Later calls do nothing.
    pub fn on_first_interaction(&mut self) {
        if self.interaction_seen {
            return;
        }
        self.interaction_seen = true;
        info!("User interaction detected, starting audio");
        self.play_music();
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Records every call; `fail` makes `play` refuse.
    #[derive(Default)]
    pub(crate) struct FakeBackend {
        pub played: Vec<(String, f32, bool)>,
        pub stopped: Vec<usize>,
        pub volumes: Vec<(usize, f32)>,
        pub fail: bool,
    }

    impl AudioBackend for FakeBackend {
        type Handle = usize;

        fn play(&mut self, url: &str, volume: f32, looped: bool) -> Result<usize, ClickerError> {
            if self.fail {
                return Err(ClickerError::Audio("NotAllowedError".into()));
            }
            self.played.push((url.to_string(), volume, looped));
            Ok(self.played.len() - 1)
        }

        fn stop(&mut self, handle: &usize) {
            self.stopped.push(*handle);
        }

        fn set_volume(&mut self, handle: &usize, volume: f32) {
            self.volumes.push((*handle, volume));
        }
    }

    pub(crate) fn orchestrator() -> AudioOrchestrator<FakeBackend> {
        AudioOrchestrator::with_rng(
            FakeBackend::default(),
            SoundCatalog::with_base_path("/s/"),
            SmallRng::seed_from_u64(7),
        )
    }

    #[test]
    fn variant_wraps_around_asset_list() {
        let mut audio = orchestrator();
        audio.play_sound(SoundCategory::Critical, 5);
        assert_eq!(audio.backend().played[0].0, "/s/click.mp3");
        assert_eq!(audio.backend().played[0].1, SFX_VOLUME);
    }

    #[test]
    fn every_category_and_variant_resolves() {
        let catalog = SoundCatalog::with_base_path("/s/");
        for category in SoundCategory::ALL {
            for variant in [0, 1, 2, 17, usize::MAX] {
                assert!(catalog.resolve(category, variant).is_some());
            }
        }
    }

    #[test]
    fn unknown_category_yields_none_without_mutation() {
        let mut audio = orchestrator();
        let before = audio.state().clone();
        assert!(audio.play_named("fanfare", 0).is_none());
        assert_eq!(audio.state(), &before);
        assert!(audio.backend().played.is_empty());
    }

    #[test]
    fn category_missing_from_catalog_yields_none() {
        let mut audio = AudioOrchestrator::with_rng(
            FakeBackend::default(),
            SoundCatalog::empty(),
            SmallRng::seed_from_u64(1),
        );
        assert!(audio.play_sound(SoundCategory::Click, 0).is_none());
        assert!(audio.play_random_sound(SoundCategory::Click).is_none());
    }

    #[test]
    fn empty_asset_list_is_refused() {
        let mut catalog = SoundCatalog::empty();
        assert!(catalog.insert(SoundCategory::Click, vec![]).is_err());
        assert!(catalog.variants(SoundCategory::Click).is_none());
    }

    #[test]
    fn muted_sounds_do_not_play() {
        let mut audio = orchestrator();
        audio.toggle_mute();
        assert!(audio.play_sound(SoundCategory::Click, 0).is_none());
        assert!(audio.backend().played.is_empty());
    }

    #[test]
    fn playback_failure_is_swallowed() {
        let mut audio = orchestrator();
        audio.backend.fail = true;
        assert!(audio.play_sound(SoundCategory::Click, 0).is_none());
        audio.play_music();
        assert!(!audio.is_music_playing());
    }

    #[test]
    fn only_one_music_track_at_a_time() {
        let mut audio = orchestrator();
        audio.play_music();
        audio.play_music();
        let loops = audio.backend().played.iter().filter(|p| p.2).count();
        assert_eq!(loops, 1);
        assert_eq!(audio.backend().played[0].1, MUSIC_VOLUME);
    }

    #[test]
    fn mute_releases_music_and_unmute_restarts_it() {
        let mut audio = orchestrator();
        audio.play_music();
        assert!(audio.toggle_mute());
        assert!(!audio.is_music_playing());
        assert_eq!(audio.backend().stopped, vec![0]);
        assert!(!audio.toggle_mute());
        assert!(audio.is_music_playing());
        assert_eq!(audio.backend().played.len(), 2);
    }

    #[test]
    fn stop_music_is_idempotent() {
        let mut audio = orchestrator();
        audio.stop_music();
        audio.play_music();
        audio.stop_music();
        audio.stop_music();
        assert_eq!(audio.backend().stopped.len(), 1);
    }

    #[test]
    fn music_volume_applies_to_live_track() {
        let mut audio = orchestrator();
        audio.play_music();
        audio.set_volume(VolumeKind::Music, 0.8).unwrap();
        audio.set_volume(VolumeKind::Sfx, 2.0).unwrap();
        assert_eq!(audio.backend().volumes, vec![(0, 0.8)]);
        assert_eq!(audio.state().sfx_volume, 1.0);
    }

    #[test]
    fn non_finite_volume_is_refused() {
        let mut audio = orchestrator();
        audio.play_music();
        let before = audio.state().clone();
        assert!(audio.set_volume(VolumeKind::Sfx, f32::NAN).is_err());
        assert!(audio.set_volume(VolumeKind::Music, f32::NAN).is_err());
        assert!(audio.set_volume(VolumeKind::Music, f32::INFINITY).is_err());
        assert_eq!(audio.state(), &before);
        assert!(audio.backend().volumes.is_empty());

        let audio = orchestrator().with_volumes(f32::NAN, 0.2);
        assert_eq!(audio.state().music_volume, MUSIC_VOLUME);
        assert_eq!(audio.state().sfx_volume, 0.2);
    }

    #[test]
    fn coin_sound_scales_with_amount() {
        let mut audio = orchestrator();
        audio.play_coin_sound(1500);
        audio.play_coin_sound(150);
        assert_eq!(audio.backend().played[0].0, "/s/meow3.mp3");
        assert_eq!(audio.backend().played[1].0, "/s/meow1.mp3");
    }

    #[test]
    fn first_interaction_starts_music_once() {
        let mut audio = orchestrator();
        audio.on_first_interaction();
        audio.stop_music();
        audio.on_first_interaction();
        assert!(!audio.is_music_playing());
    }

    #[test]
    fn unlock_is_an_alias_for_skin() {
        assert_eq!(SoundCategory::from_name("unlock"), Some(SoundCategory::Skin));
    }
}
