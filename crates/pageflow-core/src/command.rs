use crate::page::PageId;
use serde::{Deserialize, Serialize};

/// A grid gesture, as dispatched by the UI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PageCommand {
    /// Move `from` to the slot currently held by `to`
    Reorder { from: PageId, to: PageId },
    /// Turn one page a quarter turn clockwise
    Rotate { id: PageId },
    Delete { id: PageId },
    /// Replace the whole order; must be a permutation of the current ids
    SetOrder { ids: Vec<PageId> },
    Clear,
}

/// Outcome of an export, reported back to the UI
#[derive(Debug, Clone, Serialize)]
pub struct ExportMetrics {
    pub page_count: u32,
    pub input_size_bytes: usize,
    pub output_size_bytes: usize,
    /// Distinct PDF sources parsed during this export
    pub sources_parsed: usize,
}
