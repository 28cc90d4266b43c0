//! Page-level information extraction
//!
//! Resolves the geometry of a page the way a viewer would see it: page
//! attributes that PDF lets a page inherit (`MediaBox`, `Rotate`, ...) are
//! looked up through the page tree.

use crate::error::PageFlowError;
use crate::image::image_dimensions;
use crate::page::{PageEntry, Rotation};
use crate::source::{MediaType, SourceKey};
use lopdf::{Dictionary, Document, Object, ObjectId};
use serde::Serialize;
use std::collections::BTreeMap;

/// Page attributes a page may inherit from its ancestors in the page tree
pub const INHERITABLE_ATTRIBUTES: [&[u8]; 4] =
    [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Guards against cyclic /Parent chains in malformed files
const MAX_TREE_DEPTH: usize = 64;

/// Information about a single page
#[derive(Debug, Clone, Serialize)]
pub struct PageInfo {
    /// Page width in points (pixels for images)
    pub width: f32,
    /// Page height in points (pixels for images)
    pub height: f32,
    /// Rotation embedded in the source file (always 0 for images)
    pub rotation: Rotation,
    /// Whether the page has a content stream (not blank)
    pub has_content: bool,
    /// Orientation as embedded in the source, before any user rotation
    pub orientation: PageOrientation,
}

/// Page orientation
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub enum PageOrientation {
    Portrait,
    Landscape,
    Square,
}

impl PageOrientation {
    fn from_size(width: f32, height: f32) -> Self {
        if (width - height).abs() < 1.0 {
            PageOrientation::Square
        } else if width > height {
            PageOrientation::Landscape
        } else {
            PageOrientation::Portrait
        }
    }

    /// Orientation after an extra quarter-turn-aligned rotation
    pub fn rotated(self, rotation: Rotation) -> Self {
        match (self, rotation.is_sideways()) {
            (PageOrientation::Portrait, true) => PageOrientation::Landscape,
            (PageOrientation::Landscape, true) => PageOrientation::Portrait,
            (orientation, _) => orientation,
        }
    }
}

impl PageInfo {
    /// Extract page info from a document (0-based page index)
    pub fn from_document(doc: &Document, page_index: u32) -> Result<Self, PageFlowError> {
        let page_id = page_object_id(doc, page_index)?;
        let page_dict = doc.get_dictionary(page_id).map_err(|_| {
            PageFlowError::ParseError(format!("Page {} is not a dictionary", page_index))
        })?;

        let media_box = media_box(doc, page_dict)?;
        let (width, height) = (
            (media_box[2] - media_box[0]).abs(),
            (media_box[3] - media_box[1]).abs(),
        );

        let rotation = embedded_rotation(doc, page_dict);
        let has_content = page_dict.get(b"Contents").is_ok();

        let orientation =
            PageOrientation::from_size(width as f32, height as f32).rotated(rotation);

        Ok(Self {
            width: width as f32,
            height: height as f32,
            rotation,
            has_content,
            orientation,
        })
    }

    /// Page info for an image page: one pixel per point, never rotated
    pub fn for_image(width: u32, height: u32) -> Self {
        Self {
            width: width as f32,
            height: height as f32,
            rotation: Rotation::NONE,
            has_content: true,
            orientation: PageOrientation::from_size(width as f32, height as f32),
        }
    }

    /// Rotation the page will carry once exported with `entry_rotation`
    pub fn exported_rotation(&self, entry_rotation: Rotation) -> Rotation {
        self.rotation + entry_rotation
    }

    /// Orientation on screen once the entry's own rotation is applied
    pub fn displayed_orientation(&self, entry_rotation: Rotation) -> PageOrientation {
        self.orientation.rotated(entry_rotation)
    }
}

/// Describe every entry, parsing each distinct source document once
pub fn describe_pages(entries: &[PageEntry]) -> Vec<Result<PageInfo, PageFlowError>> {
    let mut parsed: BTreeMap<SourceKey, Document> = BTreeMap::new();

    entries
        .iter()
        .map(|entry| {
            let source = entry.source();
            match source.media_type() {
                MediaType::Jpeg | MediaType::Png => {
                    let (width, height) =
                        image_dimensions(source.media_type(), source.bytes())?;
                    Ok(PageInfo::for_image(width, height))
                }
                MediaType::Pdf => {
                    if !parsed.contains_key(&source.key()) {
                        let doc = Document::load_mem(source.bytes())
                            .map_err(|e| PageFlowError::ParseError(e.to_string()))?;
                        parsed.insert(source.key(), doc);
                    }
                    PageInfo::from_document(&parsed[&source.key()], entry.source_page_index())
                }
            }
        })
        .collect()
}

/// Object id of the page at a 0-based index
pub fn page_object_id(doc: &Document, page_index: u32) -> Result<ObjectId, PageFlowError> {
    let pages = doc.get_pages();
    pages.get(&(page_index + 1)).copied().ok_or_else(|| {
        PageFlowError::ParseError(format!(
            "Page {} not found (document has {} pages)",
            page_index + 1,
            pages.len()
        ))
    })
}

/// Look up a page attribute, walking up the /Parent chain when the page
/// itself does not define it
pub fn inherited_attribute<'a>(
    doc: &'a Document,
    page_dict: &'a Dictionary,
    key: &[u8],
) -> Option<&'a Object> {
    let mut node = page_dict;
    for _ in 0..MAX_TREE_DEPTH {
        if let Ok(value) = node.get(key) {
            return Some(value);
        }
        let parent_id = node.get(b"Parent").and_then(|p| p.as_reference()).ok()?;
        node = doc.get_dictionary(parent_id).ok()?;
    }
    None
}

/// Embedded /Rotate of a page (inherited if needed)
///
/// Values that are not multiples of 90 are ignored, as viewers do.
pub fn embedded_rotation(doc: &Document, page_dict: &Dictionary) -> Rotation {
    inherited_attribute(doc, page_dict, b"Rotate")
        .map(|value| resolve(doc, value))
        .and_then(|value| value.as_i64().ok())
        .and_then(Rotation::from_degrees)
        .unwrap_or(Rotation::NONE)
}

/// Get MediaBox from page, inheriting from ancestors if necessary
fn media_box(doc: &Document, page_dict: &Dictionary) -> Result<[f64; 4], PageFlowError> {
    match inherited_attribute(doc, page_dict, b"MediaBox").map(|value| resolve(doc, value)) {
        Some(value) => {
            let array = value
                .as_array()
                .map_err(|_| PageFlowError::ParseError("MediaBox must be an array".to_string()))?;
            parse_box_array(doc, array)
        }
        // Default to US Letter size
        None => Ok([0.0, 0.0, 612.0, 792.0]),
    }
}

/// Parse a box array [x1, y1, x2, y2]
fn parse_box_array(doc: &Document, array: &[Object]) -> Result<[f64; 4], PageFlowError> {
    if array.len() != 4 {
        return Err(PageFlowError::ParseError(
            "MediaBox must have 4 elements".to_string(),
        ));
    }

    let mut result = [0.0; 4];
    for (i, obj) in array.iter().enumerate() {
        result[i] = match resolve(doc, obj) {
            Object::Integer(n) => *n as f64,
            Object::Real(n) => *n as f64,
            _ => {
                return Err(PageFlowError::ParseError(format!(
                    "MediaBox element {} is not a number",
                    i
                )))
            }
        };
    }

    Ok(result)
}

/// Follow an indirect reference; dangling references resolve to themselves
pub(crate) fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> &'a Object {
    match obj {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(obj),
        _ => obj,
    }
}
