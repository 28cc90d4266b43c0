//! PDF validation and info extraction
//!
//! Checks uploaded PDFs before they are expanded into page entries.

use crate::error::PageFlowError;
use lopdf::Document;
use serde::Serialize;

/// PDF file information extracted during validation
#[derive(Debug, Clone, Serialize, Default)]
pub struct PdfInfo {
    /// Number of pages in the document
    pub page_count: u32,
    /// PDF version string (e.g., "1.7")
    pub version: String,
    /// File size in bytes
    pub size_bytes: usize,
    /// Document title from metadata (if available)
    pub title: Option<String>,
    /// Document author from metadata (if available)
    pub author: Option<String>,
}

/// Validate a PDF file and extract basic info
///
/// Encrypted documents are rejected: their page content cannot be copied
/// into a merged output.
pub fn validate_pdf(bytes: &[u8]) -> Result<PdfInfo, PageFlowError> {
    check_header(bytes)?;

    let version = extract_version(bytes);

    let document =
        Document::load_mem(bytes).map_err(|e| PageFlowError::ParseError(e.to_string()))?;

    if document.is_encrypted() {
        return Err(PageFlowError::ParseError(
            "Encrypted PDFs are not supported".to_string(),
        ));
    }

    let page_count = document.get_pages().len() as u32;
    if page_count == 0 {
        return Err(PageFlowError::ParseError("PDF has no pages".to_string()));
    }

    let (title, author) = extract_metadata(&document);

    Ok(PdfInfo {
        page_count,
        version,
        size_bytes: bytes.len(),
        title,
        author,
    })
}

/// Quick validation without full parsing (for large files)
pub fn quick_validate(bytes: &[u8]) -> Result<(), PageFlowError> {
    check_header(bytes)?;

    // %%EOF should sit near the end of the file
    let tail = if bytes.len() > 1024 {
        &bytes[bytes.len() - 1024..]
    } else {
        bytes
    };

    if !tail.windows(5).any(|w| w == b"%%EOF") {
        return Err(PageFlowError::ParseError(
            "PDF appears truncated (missing %%EOF marker)".to_string(),
        ));
    }

    Ok(())
}

fn check_header(bytes: &[u8]) -> Result<(), PageFlowError> {
    if bytes.len() < 8 {
        return Err(PageFlowError::ParseError(
            "File too small to be a valid PDF".to_string(),
        ));
    }

    if !bytes.starts_with(b"%PDF-") {
        return Err(PageFlowError::ParseError(
            "Not a valid PDF file (missing %PDF- header)".to_string(),
        ));
    }

    Ok(())
}

/// Extract PDF version from header
fn extract_version(bytes: &[u8]) -> String {
    // Header format: %PDF-1.7
    if bytes.len() >= 8 && bytes.starts_with(b"%PDF-") {
        if let Ok(version) = std::str::from_utf8(&bytes[5..8]) {
            return version.trim().to_string();
        }
    }
    "1.4".to_string()
}

/// Extract title and author from the Info dictionary
fn extract_metadata(document: &Document) -> (Option<String>, Option<String>) {
    let info = document
        .trailer
        .get(b"Info")
        .and_then(|obj| obj.as_reference())
        .and_then(|id| document.get_dictionary(id));

    let Ok(info) = info else {
        return (None, None);
    };

    let text = |key: &[u8]| {
        info.get(key)
            .and_then(|obj| obj.as_str())
            .ok()
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
            .filter(|s| !s.is_empty())
    };

    (text(b"Title"), text(b"Author"))
}
