use super::dom;
use crate::api::{ApiRequest, Transport};
use crate::error::ClickerError;
use crate::utils::csrf_token;
use gloo_utils::errors::JsError;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{Request, RequestCredentials, RequestInit, Response};

/// `fetch`-backed transport. Mutating requests carry `X-CSRFToken`, read
/// fresh from the page on every call.
#[derive(Debug, Clone, Copy, Default)]
pub struct FetchTransport;

fn js_error(e: JsValue) -> ClickerError {
    let msg = match JsError::try_from(e) {
        Ok(err) => err.to_string(),
        Err(other) => other.as_string().unwrap_or_else(|| format!("{:?}", other)),
    };
    ClickerError::Network(msg)
}

impl Transport for FetchTransport {
    async fn send(&self, request: ApiRequest) -> Result<String, ClickerError> {
        let window = dom::window().ok_or(ClickerError::MissingElement("window"))?;

        let init = RequestInit::new();
        init.set_method(request.method.as_str());
        init.set_credentials(RequestCredentials::SameOrigin);
        if let Some(body) = &request.body {
            init.set_body(&JsValue::from_str(body));
        }

        let req = Request::new_with_str_and_init(&request.path, &init).map_err(js_error)?;
        let headers = req.headers();
        headers.set("Content-Type", "application/json").map_err(js_error)?;
        if request.is_mutating() {
            let token = csrf_token(&dom::cookies(), dom::csrf_form_field().as_deref())
                .ok_or(ClickerError::MissingElement("csrftoken"))?;
            headers.set("X-CSRFToken", &token).map_err(js_error)?;
        }

        let response: Response = JsFuture::from(window.fetch_with_request(&req))
            .await
            .map_err(js_error)?
            .dyn_into()
            .map_err(js_error)?;
        if !response.ok() {
            return Err(ClickerError::HttpStatus(response.status()));
        }
        let text = JsFuture::from(response.text().map_err(js_error)?)
            .await
            .map_err(js_error)?;
        text.as_string()
            .ok_or_else(|| ClickerError::Payload("response body is not text".to_string()))
    }
}
