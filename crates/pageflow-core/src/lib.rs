//! Page organizer core: assemble one PDF from pages of many files
//!
//! Uploaded PDFs and images are expanded into an ordered [`PageCollection`]
//! of page entries. The collection can be reordered, rotated and pruned,
//! then merged into a single document with lopdf.
//!
//! - `ingest`: files → page entries (one per PDF page, one per image)
//! - `collection`: the ordered working document and its mutations
//! - `merge`: collection → merged PDF bytes

pub mod collection;
pub mod command;
pub mod error;
pub mod image;
pub mod ingest;
pub mod merge;
pub mod options;
pub mod page;
pub mod page_info;
pub mod source;
pub mod validation;

#[cfg(test)]
mod test_pdf;

pub use collection::PageCollection;
pub use command::{ExportMetrics, PageCommand};
pub use error::PageFlowError;
pub use ingest::{accepted_files, IngestBatch, IngestFailure, Ingestor, UploadedFile};
pub use merge::{merge_pages, ExportedDocument};
pub use options::ExportOptions;
pub use page::{PageEntry, PageId, Rotation};
pub use page_info::{describe_pages, PageInfo, PageOrientation};
pub use source::{MediaType, PreviewBackend, PreviewHandle, SourceFile, SourceKey};
pub use validation::{quick_validate, validate_pdf, PdfInfo};
