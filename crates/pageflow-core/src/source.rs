//! Uploaded source files and their preview handles

use crate::error::PageFlowError;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::sync::Arc;

/// File types accepted for upload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MediaType {
    Pdf,
    Jpeg,
    Png,
}

impl MediaType {
    pub const ACCEPTED: [MediaType; 3] = [MediaType::Pdf, MediaType::Jpeg, MediaType::Png];

    /// Map a browser-reported MIME type; anything else is unsupported
    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime.trim().to_ascii_lowercase().as_str() {
            "application/pdf" => Some(MediaType::Pdf),
            "image/jpeg" => Some(MediaType::Jpeg),
            "image/png" => Some(MediaType::Png),
            _ => None,
        }
    }

    pub fn mime(self) -> &'static str {
        match self {
            MediaType::Pdf => "application/pdf",
            MediaType::Jpeg => "image/jpeg",
            MediaType::Png => "image/png",
        }
    }

    pub fn is_image(self) -> bool {
        matches!(self, MediaType::Jpeg | MediaType::Png)
    }
}

/// Content identity of a source file (SHA-256 of its bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceKey([u8; 32]);

impl SourceKey {
    pub fn of(bytes: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        Self(hasher.finalize().into())
    }
}

impl fmt::Display for SourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

/// Creates and releases renderable preview URLs for source files
///
/// In the browser this is `URL.createObjectURL` / `URL.revokeObjectURL`.
pub trait PreviewBackend: Send + Sync {
    fn create(&self, file: &SourceFile) -> Result<String, PageFlowError>;
    fn revoke(&self, url: &str);
}

/// A live preview URL; revoked through its backend when dropped
pub struct PreviewHandle {
    url: String,
    backend: Arc<dyn PreviewBackend>,
}

impl PreviewHandle {
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Drop for PreviewHandle {
    fn drop(&mut self) {
        tracing::debug!(url = %self.url, "revoking preview");
        self.backend.revoke(&self.url);
    }
}

impl fmt::Debug for PreviewHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreviewHandle").field("url", &self.url).finish()
    }
}

/// The bytes of one uploaded file, shared by every page entry made from it
#[derive(Debug)]
pub struct SourceFile {
    name: String,
    media_type: MediaType,
    last_modified: u64,
    bytes: Vec<u8>,
    key: SourceKey,
    preview: Option<PreviewHandle>,
}

impl SourceFile {
    pub fn new(
        name: impl Into<String>,
        media_type: MediaType,
        last_modified: u64,
        bytes: Vec<u8>,
    ) -> Self {
        let key = SourceKey::of(&bytes);
        Self {
            name: name.into(),
            media_type,
            last_modified,
            bytes,
            key,
            preview: None,
        }
    }

    /// Ask the backend for a preview URL and keep it for the file's lifetime
    pub fn attach_preview(
        &mut self,
        backend: &Arc<dyn PreviewBackend>,
    ) -> Result<(), PageFlowError> {
        let url = backend.create(self)?;
        self.preview = Some(PreviewHandle {
            url,
            backend: Arc::clone(backend),
        });
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn media_type(&self) -> MediaType {
        self.media_type
    }

    /// Milliseconds since the Unix epoch, as reported by the browser
    pub fn last_modified(&self) -> u64 {
        self.last_modified
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn key(&self) -> SourceKey {
        self.key
    }

    pub fn preview_url(&self) -> Option<&str> {
        self.preview.as_ref().map(PreviewHandle::url)
    }
}
