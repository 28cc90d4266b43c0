use serde::Deserialize;

pub const DEFAULT_FILE_NAME: &str = "merged-document.pdf";
pub const DEFAULT_PRODUCER: &str = "pageflow";

/// Export settings; every field may be omitted by the caller
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExportOptions {
    /// Name offered for the download
    pub file_name: String,
    /// Flate-compress streams that are not already encoded
    pub compress: bool,
    pub producer: String,
    pub creator: String,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            file_name: DEFAULT_FILE_NAME.to_string(),
            compress: true,
            producer: DEFAULT_PRODUCER.to_string(),
            creator: DEFAULT_PRODUCER.to_string(),
        }
    }
}
