//! Object URLs as page previews

use pageflow_core::{PageFlowError, PreviewBackend, SourceFile};
use web_sys::{Blob, BlobPropertyBag, Url};

/// Hands out `blob:` URLs the page-rendering worker can fetch
pub struct BrowserPreviews;

impl PreviewBackend for BrowserPreviews {
    fn create(&self, file: &SourceFile) -> Result<String, PageFlowError> {
        let blob = bytes_to_blob(file.bytes(), file.media_type().mime())
            .map_err(|e| PageFlowError::PreviewError(format!("{:?}", e)))?;
        Url::create_object_url_with_blob(&blob)
            .map_err(|e| PageFlowError::PreviewError(format!("{:?}", e)))
    }

    fn revoke(&self, url: &str) {
        if Url::revoke_object_url(url).is_err() {
            web_sys::console::warn_1(&format!("Failed to revoke {}", url).into());
        }
    }
}

/// Copy bytes into a typed `Blob`
pub(crate) fn bytes_to_blob(bytes: &[u8], mime: &str) -> Result<Blob, wasm_bindgen::JsValue> {
    let array = js_sys::Uint8Array::from(bytes);
    let parts = js_sys::Array::of1(&array);
    let options = BlobPropertyBag::new();
    options.set_type(mime);
    Blob::new_with_u8_array_sequence_and_options(&parts, &options)
}
