use crate::audio::AudioBackend;
use crate::error::ClickerError;
use log::{debug, warn};
use wasm_bindgen_futures::{spawn_local, JsFuture};
use web_sys::HtmlAudioElement;

/// Plays through fresh `<audio>` elements. The play promise settles on the
/// event loop; a rejection (autoplay policy) is only logged.
#[derive(Debug, Default)]
pub struct HtmlAudioBackend;

impl AudioBackend for HtmlAudioBackend {
    type Handle = HtmlAudioElement;

    fn play(&mut self, url: &str, volume: f32, looped: bool) -> Result<HtmlAudioElement, ClickerError> {
        let audio = HtmlAudioElement::new_with_src(url)
            .map_err(|e| ClickerError::Audio(format!("{:?}", e)))?;
        audio.set_volume(volume as f64);
        audio.set_loop(looped);
        let promise = audio
            .play()
            .map_err(|e| ClickerError::Audio(format!("{:?}", e)))?;
        let url = url.to_string();
        spawn_local(async move {
            if let Err(e) = JsFuture::from(promise).await {
                debug!("Audio play prevented for {}: {:?}", url, e);
            }
        });
        Ok(audio)
    }

    fn stop(&mut self, handle: &HtmlAudioElement) {
        if let Err(e) = handle.pause() {
            warn!("Failed to pause audio: {:?}", e);
        }
        handle.set_current_time(0.0);
    }

    fn set_volume(&mut self, handle: &HtmlAudioElement, volume: f32) {
        handle.set_volume(volume as f64);
    }
}
