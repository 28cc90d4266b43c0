use crate::page::PageId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PageFlowError {
    #[error("Failed to parse PDF: {0}")]
    ParseError(String),

    #[error("Unsupported file type: {0}")]
    UnsupportedMediaType(String),

    #[error("Failed to decode image: {0}")]
    ImageError(String),

    #[error("No page with id {0}")]
    UnknownPage(PageId),

    #[error("Page id {0} is already in the collection")]
    DuplicatePage(PageId),

    #[error("Invalid page order: {0}")]
    InvalidOrder(String),

    #[error("Nothing to export: the page collection is empty")]
    EmptyCollection,

    #[error("Export failed on page {page_id}: {reason}")]
    ExportError { page_id: PageId, reason: String },

    #[error("PDF operation failed: {0}")]
    OperationError(String),

    #[error("Preview unavailable: {0}")]
    PreviewError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}
