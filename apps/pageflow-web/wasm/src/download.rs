//! Delivering the merged document as a browser download

use crate::preview::bytes_to_blob;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{HtmlAnchorElement, Url};

/// An object URL that is revoked when dropped
struct ObjectUrl(String);

impl ObjectUrl {
    fn for_bytes(bytes: &[u8], mime: &str) -> Result<Self, JsValue> {
        let blob = bytes_to_blob(bytes, mime)?;
        Url::create_object_url_with_blob(&blob).map(Self)
    }
}

impl Drop for ObjectUrl {
    fn drop(&mut self) {
        let _ = Url::revoke_object_url(&self.0);
    }
}

/// Save `bytes` under `file_name` via a temporary anchor click
pub fn trigger_download(bytes: &[u8], file_name: &str) -> Result<(), JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("No window"))?;
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("No document"))?;
    let body = document
        .body()
        .ok_or_else(|| JsValue::from_str("No document body"))?;

    let url = ObjectUrl::for_bytes(bytes, "application/pdf")?;

    let anchor: HtmlAnchorElement = document.create_element("a")?.dyn_into()?;
    anchor.set_href(&url.0);
    anchor.set_download(file_name);
    body.append_child(&anchor)?;
    anchor.click();
    anchor.remove();

    // The click has started the download; the URL is revoked here
    drop(url);
    Ok(())
}
