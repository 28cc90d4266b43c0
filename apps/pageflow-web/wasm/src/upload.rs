//! Reading browser `File`s into memory

use futures::future::join_all;
use pageflow_core::{IngestFailure, MediaType, UploadedFile};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;

/// Files read from one selection, ready for `PageFlowSession.ingest`
#[wasm_bindgen]
pub struct UploadBatch {
    files: Vec<UploadedFile>,
    /// Files the browser could not read
    failures: Vec<IngestFailure>,
}

#[wasm_bindgen]
impl UploadBatch {
    /// Number of files that will be ingested
    #[wasm_bindgen(getter)]
    pub fn length(&self) -> usize {
        self.files.len()
    }

    #[wasm_bindgen(getter, js_name = fileNames)]
    pub fn file_names(&self) -> Vec<String> {
        self.files.iter().map(|f| f.name.clone()).collect()
    }
}

impl UploadBatch {
    /// Split per-file read results, keeping selection order
    pub(crate) fn from_reads(reads: Vec<(String, Result<UploadedFile, String>)>) -> Self {
        let mut batch = Self {
            files: Vec::new(),
            failures: Vec::new(),
        };
        for (file_name, read) in reads {
            match read {
                Ok(file) => batch.files.push(file),
                Err(reason) => batch.failures.push(IngestFailure { file_name, reason }),
            }
        }
        batch
    }

    pub(crate) fn into_parts(self) -> (Vec<UploadedFile>, Vec<IngestFailure>) {
        (self.files, self.failures)
    }
}

/// Read every accepted file of a `FileList` (or array of `File`s)
///
/// Files of other types are skipped without being read. Reads overlap, but
/// the batch keeps selection order. A file that cannot be read is reported
/// in the batch instead of failing the whole selection.
#[wasm_bindgen(js_name = loadFiles)]
pub async fn load_files(files: JsValue) -> Result<UploadBatch, JsValue> {
    let selected: Vec<web_sys::File> = js_sys::Array::from(&files)
        .iter()
        .filter_map(|item| item.dyn_into::<web_sys::File>().ok())
        .filter(|file| MediaType::from_mime(&file.type_()).is_some())
        .collect();

    let reads = join_all(selected.iter().map(read_file)).await;
    let reads = selected
        .iter()
        .map(web_sys::File::name)
        .zip(reads.into_iter().map(|read| read.map_err(describe_js_error)))
        .collect();

    Ok(UploadBatch::from_reads(reads))
}

fn describe_js_error(error: JsValue) -> String {
    error
        .as_string()
        .or_else(|| {
            error
                .dyn_ref::<js_sys::Error>()
                .map(|e| String::from(e.message()))
        })
        .unwrap_or_else(|| "file could not be read".to_string())
}

async fn read_file(file: &web_sys::File) -> Result<UploadedFile, JsValue> {
    let buffer = JsFuture::from(file.array_buffer()).await?;
    let bytes = js_sys::Uint8Array::new(&buffer).to_vec();

    Ok(UploadedFile {
        name: file.name(),
        mime_type: file.type_(),
        last_modified: file.last_modified() as u64,
        bytes,
    })
}
