//! Ingestion: expanding uploaded files into page entries
//!
//! Files are processed in selection order. A PDF yields one entry per page
//! in ascending page order, an image yields exactly one entry. A file that
//! cannot be parsed is reported and skipped; it never aborts the batch.

use crate::error::PageFlowError;
use crate::page::PageEntry;
use crate::source::{MediaType, PreviewBackend, SourceFile};
use crate::validation::validate_pdf;
use serde::Serialize;
use std::sync::Arc;

/// A file as handed over by the browser
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub name: String,
    /// MIME type reported by the browser (may be empty)
    pub mime_type: String,
    /// Milliseconds since the Unix epoch
    pub last_modified: u64,
    pub bytes: Vec<u8>,
}

/// A file that was skipped during ingestion
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestFailure {
    pub file_name: String,
    pub reason: String,
}

/// Result of ingesting one selection of files
///
/// `entries` is meant to be appended to the collection in one step.
#[derive(Debug, Default)]
pub struct IngestBatch {
    pub entries: Vec<PageEntry>,
    pub failures: Vec<IngestFailure>,
}

/// Keep only files of an accepted type, preserving order
///
/// Anything else is dropped without being reported.
pub fn accepted_files(files: Vec<UploadedFile>) -> Vec<UploadedFile> {
    files
        .into_iter()
        .filter(|file| MediaType::from_mime(&file.mime_type).is_some())
        .collect()
}

#[derive(Default)]
pub struct Ingestor {
    previews: Option<Arc<dyn PreviewBackend>>,
}

impl Ingestor {
    /// An ingestor that does not allocate preview handles
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate one preview handle per ingested source file
    pub fn with_previews(backend: Arc<dyn PreviewBackend>) -> Self {
        Self {
            previews: Some(backend),
        }
    }

    pub fn ingest(&self, files: Vec<UploadedFile>) -> IngestBatch {
        let mut batch = IngestBatch::default();

        for file in files {
            let name = file.name.clone();
            match self.ingest_file(file) {
                Ok(entries) => {
                    tracing::debug!(file = %name, pages = entries.len(), "ingested file");
                    batch.entries.extend(entries);
                }
                Err(e) => {
                    tracing::warn!(file = %name, error = %e, "skipping file");
                    batch.failures.push(IngestFailure {
                        file_name: name,
                        reason: e.to_string(),
                    });
                }
            }
        }

        tracing::info!(
            pages = batch.entries.len(),
            failures = batch.failures.len(),
            "ingestion finished"
        );
        batch
    }

    fn ingest_file(&self, file: UploadedFile) -> Result<Vec<PageEntry>, PageFlowError> {
        let media_type = MediaType::from_mime(&file.mime_type)
            .ok_or_else(|| PageFlowError::UnsupportedMediaType(file.mime_type.clone()))?;

        let page_count = match media_type {
            MediaType::Pdf => validate_pdf(&file.bytes)?.page_count,
            MediaType::Jpeg | MediaType::Png => 1,
        };

        let mut source = SourceFile::new(file.name, media_type, file.last_modified, file.bytes);
        if let Some(backend) = &self.previews {
            // Entries stay usable without a thumbnail
            if let Err(e) = source.attach_preview(backend) {
                tracing::warn!(file = %source.name(), error = %e, "no preview for file");
            }
        }

        let source = Arc::new(source);
        Ok((0..page_count)
            .map(|page_index| PageEntry::new(Arc::clone(&source), page_index))
            .collect())
    }
}
