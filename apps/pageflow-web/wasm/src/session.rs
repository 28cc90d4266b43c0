//! Stateful page organizer session
//!
//! Holds the page collection in Rust; every grid gesture from JavaScript
//! becomes one call on the session.

use crate::download::trigger_download;
use crate::preview::BrowserPreviews;
use crate::upload::UploadBatch;
use crate::{to_js_error, to_js_value};
use pageflow_core::{
    accepted_files, describe_pages, merge_pages, ExportOptions, ExportedDocument, IngestFailure,
    Ingestor, PageCollection, PageCommand, PageEntry, PageFlowError, PageId, PageInfo,
    UploadedFile,
};
use serde::Serialize;
use std::sync::Arc;
use wasm_bindgen::prelude::*;

/// Outcome of adding one selection of files
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct IngestSummary {
    pages_added: usize,
    page_count: usize,
    failures: Vec<IngestFailure>,
}

/// A page as the grid renders it
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PageView {
    id: String,
    file_name: String,
    media_type: &'static str,
    preview_url: Option<String>,
    source_page_index: u32,
    rotation: u16,
}

impl From<&PageEntry> for PageView {
    fn from(entry: &PageEntry) -> Self {
        Self {
            id: entry.id().to_string(),
            file_name: entry.source().name().to_string(),
            media_type: entry.media_type().mime(),
            preview_url: entry.preview_url().map(str::to_string),
            source_page_index: entry.source_page_index(),
            rotation: entry.rotation().degrees(),
        }
    }
}

#[wasm_bindgen]
pub struct PageFlowSession {
    collection: PageCollection,
    ingestor: Ingestor,
}

impl Default for PageFlowSession {
    fn default() -> Self {
        Self::new()
    }
}

#[wasm_bindgen]
impl PageFlowSession {
    /// Create an empty session that allocates object URL previews
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self::with_ingestor(Ingestor::with_previews(Arc::new(BrowserPreviews)))
    }

    /// Append every page of a loaded batch in one step
    pub fn ingest(&mut self, batch: UploadBatch) -> Result<JsValue, JsValue> {
        let (files, read_failures) = batch.into_parts();
        let summary = self
            .ingest_with_failures(files, read_failures)
            .map_err(to_js_error)?;
        to_js_value(&summary)
    }

    /// Add a single file from bytes already in memory
    #[wasm_bindgen(js_name = addFile)]
    pub fn add_file(
        &mut self,
        name: &str,
        mime_type: &str,
        last_modified: f64,
        bytes: &[u8],
    ) -> Result<JsValue, JsValue> {
        let file = UploadedFile {
            name: name.to_string(),
            mime_type: mime_type.to_string(),
            last_modified: last_modified as u64,
            bytes: bytes.to_vec(),
        };
        let summary = self.ingest_internal(vec![file]).map_err(to_js_error)?;
        to_js_value(&summary)
    }

    /// Rotate one page a quarter turn clockwise; returns the new rotation
    pub fn rotate(&mut self, id: &str) -> Result<u16, JsValue> {
        let id = parse_id(id)?;
        let rotation = self.collection.rotate(id).map_err(to_js_error)?;
        Ok(rotation.degrees())
    }

    pub fn remove(&mut self, id: &str) -> Result<(), JsValue> {
        let id = parse_id(id)?;
        self.collection.remove(id).map_err(to_js_error)?;
        Ok(())
    }

    /// Move `from_id` into the slot currently held by `to_id`
    pub fn reorder(&mut self, from_id: &str, to_id: &str) -> Result<(), JsValue> {
        let (from, to) = (parse_id(from_id)?, parse_id(to_id)?);
        self.collection.reorder(from, to).map_err(to_js_error)
    }

    #[wasm_bindgen(js_name = setOrder)]
    pub fn set_order(&mut self, ids: Vec<String>) -> Result<(), JsValue> {
        let ids = ids
            .iter()
            .map(|id| parse_id(id))
            .collect::<Result<Vec<_>, _>>()?;
        self.collection.set_order(&ids).map_err(to_js_error)
    }

    /// Remove every page; returns how many were removed
    pub fn clear(&mut self) -> usize {
        self.collection.clear()
    }

    /// Apply a JSON command such as `{"type":"Rotate","id":"..."}`
    pub fn dispatch(&mut self, json: &str) -> Result<(), JsValue> {
        self.dispatch_internal(json).map_err(to_js_error)
    }

    /// Current pages in display order
    pub fn pages(&self) -> Result<JsValue, JsValue> {
        let pages: Vec<PageView> = self.collection.iter().map(PageView::from).collect();
        to_js_value(&pages)
    }

    /// Geometry of one page, for sizing its thumbnail
    #[wasm_bindgen(js_name = pageInfo)]
    pub fn page_info(&self, id: &str) -> Result<JsValue, JsValue> {
        let info = self.page_info_internal(parse_id(id)?).map_err(to_js_error)?;
        to_js_value(&info)
    }

    #[wasm_bindgen(getter, js_name = pageCount)]
    pub fn page_count(&self) -> usize {
        self.collection.len()
    }

    /// Merge the pages and return the PDF bytes
    ///
    /// `options` may be omitted; see `ExportOptions` for the fields.
    pub fn export(&self, options: JsValue) -> Result<js_sys::Uint8Array, JsValue> {
        let exported = self.export_internal(parse_options(options)?).map_err(to_js_error)?;
        Ok(js_sys::Uint8Array::from(exported.bytes.as_slice()))
    }

    /// Merge the pages and start the download; returns export metrics
    #[wasm_bindgen(js_name = exportAndDownload)]
    pub fn export_and_download(&self, options: JsValue) -> Result<JsValue, JsValue> {
        let exported = self.export_internal(parse_options(options)?).map_err(to_js_error)?;
        trigger_download(&exported.bytes, &exported.file_name)?;
        to_js_value(&exported.metrics)
    }
}

impl PageFlowSession {
    fn with_ingestor(ingestor: Ingestor) -> Self {
        Self {
            collection: PageCollection::new(),
            ingestor,
        }
    }

    fn ingest_internal(
        &mut self,
        files: Vec<UploadedFile>,
    ) -> Result<IngestSummary, PageFlowError> {
        self.ingest_with_failures(files, Vec::new())
    }

    /// Ingest files, reporting `read_failures` (files the browser could not
    /// read) alongside the files that failed to parse
    fn ingest_with_failures(
        &mut self,
        files: Vec<UploadedFile>,
        read_failures: Vec<IngestFailure>,
    ) -> Result<IngestSummary, PageFlowError> {
        let batch = self.ingestor.ingest(accepted_files(files));
        let pages_added = self.collection.append(batch.entries)?;

        let mut failures = read_failures;
        failures.extend(batch.failures);
        for failure in &failures {
            log_warning(&format!("Skipped {}: {}", failure.file_name, failure.reason));
        }

        Ok(IngestSummary {
            pages_added,
            page_count: self.collection.len(),
            failures,
        })
    }

    fn dispatch_internal(&mut self, json: &str) -> Result<(), PageFlowError> {
        let command: PageCommand = serde_json::from_str(json)
            .map_err(|e| PageFlowError::SerializationError(e.to_string()))?;
        self.collection.apply(command)
    }

    fn page_info_internal(&self, id: PageId) -> Result<PageInfo, PageFlowError> {
        let entry = self.collection.get(id).ok_or(PageFlowError::UnknownPage(id))?;
        describe_pages(std::slice::from_ref(entry))
            .pop()
            .unwrap_or(Err(PageFlowError::UnknownPage(id)))
    }

    fn export_internal(&self, options: ExportOptions) -> Result<ExportedDocument, PageFlowError> {
        merge_pages(self.collection.entries(), &options)
    }
}

fn parse_id(id: &str) -> Result<PageId, JsValue> {
    id.parse::<PageId>()
        .map_err(|e| JsValue::from_str(&format!("Invalid page id {}: {}", id, e)))
}

fn parse_options(options: JsValue) -> Result<ExportOptions, JsValue> {
    if options.is_undefined() || options.is_null() {
        return Ok(ExportOptions::default());
    }
    serde_wasm_bindgen::from_value(options)
        .map_err(|e| JsValue::from_str(&format!("Invalid export options: {}", e)))
}

fn log_warning(message: &str) {
    #[cfg(target_arch = "wasm32")]
    web_sys::console::warn_1(&message.into());
    #[cfg(not(target_arch = "wasm32"))]
    let _ = message;
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::{content::Content, content::Operation, Dictionary, Document, Object, Stream};
    use pretty_assertions::assert_eq;

    /// Create a valid test PDF with the specified number of pages
    /// Uses the same pattern as pageflow-core tests
    fn create_test_pdf(num_pages: u32) -> Vec<u8> {
        let mut doc = Document::with_version("1.7");
        let pages_id = doc.new_object_id();

        let mut page_ids = Vec::new();
        for i in 0..num_pages {
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Td", vec![Object::Integer(100), Object::Integer(700)]),
                    Operation::new(
                        "Tj",
                        vec![Object::String(
                            format!("Page {}", i + 1).into_bytes(),
                            lopdf::StringFormat::Literal,
                        )],
                    ),
                    Operation::new("ET", vec![]),
                ],
            };
            let content_id =
                doc.add_object(Stream::new(Dictionary::new(), content.encode().unwrap()));

            let page = Dictionary::from_iter(vec![
                ("Type", Object::Name(b"Page".to_vec())),
                ("Parent", Object::Reference(pages_id)),
                (
                    "MediaBox",
                    Object::Array(vec![
                        Object::Integer(0),
                        Object::Integer(0),
                        Object::Integer(612),
                        Object::Integer(792),
                    ]),
                ),
                ("Contents", Object::Reference(content_id)),
            ]);
            page_ids.push(doc.add_object(page));
        }

        let pages = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Pages".to_vec())),
            ("Count", Object::Integer(num_pages as i64)),
            (
                "Kids",
                Object::Array(page_ids.iter().map(|id| Object::Reference(*id)).collect()),
            ),
        ]);
        doc.objects.insert(pages_id, Object::Dictionary(pages));

        let catalog_id = doc.add_object(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Catalog".to_vec())),
            ("Pages", Object::Reference(pages_id)),
        ]));
        doc.trailer.set("Root", Object::Reference(catalog_id));

        let mut buffer = Vec::new();
        doc.save_to(&mut buffer).unwrap();
        buffer
    }

    fn pdf_file(name: &str, pages: u32) -> UploadedFile {
        UploadedFile {
            name: name.to_string(),
            mime_type: "application/pdf".to_string(),
            last_modified: 0,
            bytes: create_test_pdf(pages),
        }
    }

    fn session() -> PageFlowSession {
        PageFlowSession::with_ingestor(Ingestor::new())
    }

    #[test]
    fn test_ingest_reports_failures_and_keeps_going() {
        let mut session = session();
        let summary = session
            .ingest_internal(vec![
                pdf_file("a.pdf", 2),
                UploadedFile {
                    name: "broken.pdf".to_string(),
                    mime_type: "application/pdf".to_string(),
                    last_modified: 0,
                    bytes: b"%PDF-1.4 truncated".to_vec(),
                },
                UploadedFile {
                    name: "notes.txt".to_string(),
                    mime_type: "text/plain".to_string(),
                    last_modified: 0,
                    bytes: b"hello".to_vec(),
                },
                pdf_file("b.pdf", 1),
            ])
            .unwrap();

        assert_eq!(summary.pages_added, 3);
        assert_eq!(summary.page_count, 3);
        // Unsupported types are dropped silently, corrupt files are reported
        assert_eq!(summary.failures.len(), 1);
        assert_eq!(summary.failures[0].file_name, "broken.pdf");
        assert_eq!(session.page_count(), 3);
    }

    #[test]
    fn test_unreadable_files_reported_with_parse_failures() {
        let mut session = session();
        let read_failure = IngestFailure {
            file_name: "gone.pdf".to_string(),
            reason: "NotReadableError".to_string(),
        };
        let summary = session
            .ingest_with_failures(
                vec![
                    pdf_file("a.pdf", 1),
                    UploadedFile {
                        name: "broken.pdf".to_string(),
                        mime_type: "application/pdf".to_string(),
                        last_modified: 0,
                        bytes: b"%PDF-1.4 truncated".to_vec(),
                    },
                    pdf_file("c.pdf", 2),
                ],
                vec![read_failure],
            )
            .unwrap();

        assert_eq!(summary.pages_added, 3);
        let failed: Vec<&str> = summary
            .failures
            .iter()
            .map(|f| f.file_name.as_str())
            .collect();
        assert_eq!(failed, vec!["gone.pdf", "broken.pdf"]);

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["failures"][0]["fileName"], "gone.pdf");
        assert_eq!(json["pagesAdded"], 3);
    }

    #[test]
    fn test_dispatch_and_export() {
        let mut session = session();
        session.ingest_internal(vec![pdf_file("three.pdf", 3)]).unwrap();
        let ids = session.collection.ids();

        let rotate = format!(r#"{{"type":"Rotate","id":"{}"}}"#, ids[0]);
        let delete = format!(r#"{{"type":"Delete","id":"{}"}}"#, ids[1]);
        session.dispatch_internal(&rotate).unwrap();
        session.dispatch_internal(&delete).unwrap();
        assert!(session.dispatch_internal(r#"{"type":"Spin"}"#).is_err());

        let exported = session.export_internal(ExportOptions::default()).unwrap();
        assert_eq!(exported.file_name, "merged-document.pdf");
        assert_eq!(exported.metrics.page_count, 2);
        assert_eq!(session.page_count(), 2);
    }

    #[test]
    fn test_page_info_for_known_and_unknown_ids() {
        let mut session = session();
        session.ingest_internal(vec![pdf_file("one.pdf", 1)]).unwrap();
        let id = session.collection.ids()[0];

        let info = session.page_info_internal(id).unwrap();
        assert_eq!((info.width, info.height), (612.0, 792.0));
        assert!(matches!(
            session.page_info_internal(PageId::new()),
            Err(PageFlowError::UnknownPage(_))
        ));
    }

    #[test]
    fn test_export_empty_session_fails() {
        let session = session();
        assert!(matches!(
            session.export_internal(ExportOptions::default()),
            Err(PageFlowError::EmptyCollection)
        ));
    }

    #[test]
    fn test_page_view_serializes_camel_case() {
        let mut session = session();
        session.ingest_internal(vec![pdf_file("one.pdf", 1)]).unwrap();
        let view = PageView::from(&session.collection.entries()[0]);
        let json = serde_json::to_value(&view).unwrap();

        assert_eq!(json["fileName"], "one.pdf");
        assert_eq!(json["mediaType"], "application/pdf");
        assert_eq!(json["sourcePageIndex"], 0);
        assert_eq!(json["rotation"], 0);
        assert!(json["previewUrl"].is_null());
    }
}
