use gloo_net::http::Request;
use js_sys::{Function, Promise, Reflect};
use url::Url;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{window, Storage};

use crate::counter::{CounterError, CounterResponse, CounterSource};
use crate::theme::PreferenceStore;

/// `window.localStorage`; reads and writes no-op when storage is blocked.
pub struct LocalStore;

fn local_storage() -> Option<Storage> {
    window()?.local_storage().ok().flatten()
}

impl PreferenceStore for LocalStore {
    fn read(&self, key: &str) -> Option<String> {
        local_storage()?.get_item(key).ok().flatten()
    }

    fn write(&self, key: &str, value: &str) -> bool {
        local_storage()
            .map(|storage| storage.set_item(key, value).is_ok())
            .unwrap_or(false)
    }
}

pub struct HttpCounterSource;

impl CounterSource for HttpCounterSource {
    async fn fetch(&self, url: &Url) -> Result<CounterResponse, CounterError> {
        let response = Request::get(url.as_str())
            .send()
            .await
            .map_err(|_| CounterError::Network)?;

        if !response.ok() {
            return Err(CounterError::Status(response.status()));
        }

        response
            .json::<CounterResponse>()
            .await
            .map_err(|_| CounterError::Decode)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClipboardError {
    Unsupported,
    Rejected,
}

impl ClipboardError {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unsupported => "clipboard_unsupported",
            Self::Rejected => "clipboard_rejected",
        }
    }
}

/// `navigator.clipboard.writeText(text)`, looked up dynamically so browsers
/// without the async clipboard API report `Unsupported`.
pub async fn write_clipboard(text: &str) -> Result<(), ClipboardError> {
    let navigator: JsValue = window()
        .ok_or(ClipboardError::Unsupported)?
        .navigator()
        .into();

    let clipboard = Reflect::get(&navigator, &JsValue::from_str("clipboard"))
        .ok()
        .filter(|value| !value.is_undefined() && !value.is_null())
        .ok_or(ClipboardError::Unsupported)?;

    let write_text = Reflect::get(&clipboard, &JsValue::from_str("writeText"))
        .ok()
        .and_then(|value| value.dyn_into::<Function>().ok())
        .ok_or(ClipboardError::Unsupported)?;

    let promise = write_text
        .call1(&clipboard, &JsValue::from_str(text))
        .map_err(|_| ClipboardError::Rejected)?
        .dyn_into::<Promise>()
        .map_err(|_| ClipboardError::Rejected)?;

    JsFuture::from(promise)
        .await
        .map(|_| ())
        .map_err(|_| ClipboardError::Rejected)
}
