//! WASM bindings for the page organizer
//!
//! The page collection lives in Rust inside a `PageFlowSession`; JavaScript
//! only draws the grid, forwards gestures and hands over files.
//!
//! ## Usage (JavaScript)
//!
//! ```javascript
//! import init, { PageFlowSession, loadFiles } from './pkg/pageflow_wasm.js';
//!
//! await init();
//!
//! const session = new PageFlowSession();
//! const batch = await loadFiles(input.files);
//! const summary = session.ingest(batch);
//! summary.failures.forEach(f => notify(`${f.fileName}: ${f.reason}`));
//!
//! grid.render(session.pages());
//! session.reorder(fromId, toId);
//! session.rotate(id);
//! session.remove(id);
//!
//! session.exportAndDownload();
//! ```

pub mod download;
pub mod preview;
pub mod session;
pub mod upload;

use pageflow_core::MediaType;
use wasm_bindgen::prelude::*;

pub use session::PageFlowSession;
pub use upload::{load_files, UploadBatch};

/// Initialize the WASM module
/// Called automatically by wasm-bindgen
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// Get the library version
#[wasm_bindgen(js_name = getVersion)]
pub fn get_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// MIME types the file picker should offer
#[wasm_bindgen(js_name = acceptedTypes)]
pub fn accepted_types() -> Vec<String> {
    MediaType::ACCEPTED
        .iter()
        .map(|media_type| media_type.mime().to_string())
        .collect()
}

/// Quick validation check for a PDF file
/// Returns Ok(()) if valid, Err with message if not
#[wasm_bindgen(js_name = quickValidate)]
pub fn quick_validate(bytes: &[u8]) -> Result<(), JsValue> {
    pageflow_core::quick_validate(bytes).map_err(to_js_error)
}

/// Get detailed PDF info without adding it to a session
#[wasm_bindgen(js_name = getPdfInfo)]
pub fn get_pdf_info(bytes: &[u8]) -> Result<JsValue, JsValue> {
    let info = pageflow_core::validate_pdf(bytes).map_err(to_js_error)?;
    to_js_value(&info)
}

pub(crate) fn to_js_error(error: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&error.to_string())
}

pub(crate) fn to_js_value<T: serde::Serialize>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value)
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_version() {
        assert!(!get_version().is_empty());
    }

    #[test]
    fn test_accepted_types() {
        assert_eq!(
            accepted_types(),
            vec!["application/pdf", "image/jpeg", "image/png"]
        );
    }
}
