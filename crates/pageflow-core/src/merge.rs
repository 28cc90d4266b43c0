//! Merge/Export: serialising the page collection into one PDF
//!
//! The algorithm:
//! 1. If the collection is empty, return an error
//! 2. Create an empty destination document with a single page tree node
//! 3. For each entry, in collection order:
//!    a. Image: embed it as an XObject on a page sized to its pixels
//!    b. PDF: load the source once per export (cached by content identity),
//!       deep-copy the page and everything it references, and add the
//!       entry's rotation to the page's embedded rotation
//! 4. Write the page tree, catalog and info dictionary, then serialise
//!
//! Any entry that fails aborts the whole export; there is no partial output.

use crate::command::ExportMetrics;
use crate::error::PageFlowError;
use crate::image::decode_image;
use crate::options::ExportOptions;
use crate::page::{PageEntry, Rotation};
use crate::page_info::{
    embedded_rotation, inherited_attribute, page_object_id, INHERITABLE_ATTRIBUTES,
};
use crate::source::{MediaType, SourceKey};
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, StringFormat};
use std::collections::BTreeMap;

/// The merged document, ready to be handed to the user
#[derive(Debug, Clone)]
pub struct ExportedDocument {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub metrics: ExportMetrics,
}

/// A parsed source document plus the objects already copied out of it
///
/// Shared resources (fonts, images) are copied once per export, however
/// many of the source's pages are used.
struct LoadedSource {
    doc: Document,
    copied: BTreeMap<ObjectId, ObjectId>,
}

/// Merge the entries, in order, into a single PDF
pub fn merge_pages(
    entries: &[PageEntry],
    options: &ExportOptions,
) -> Result<ExportedDocument, PageFlowError> {
    if entries.is_empty() {
        return Err(PageFlowError::EmptyCollection);
    }

    let mut output = Document::with_version("1.7");
    let pages_id = output.new_object_id();

    // Lives for this call only
    let mut sources: BTreeMap<SourceKey, LoadedSource> = BTreeMap::new();
    let mut kids = Vec::with_capacity(entries.len());
    let mut input_size_bytes = 0;

    for entry in entries {
        let source = entry.source();
        let export_error = |reason: String| PageFlowError::ExportError {
            page_id: entry.id(),
            reason,
        };

        let page_id = match source.media_type() {
            MediaType::Jpeg | MediaType::Png => {
                input_size_bytes += source.bytes().len();
                add_image_page(&mut output, pages_id, entry)
                    .map_err(|e| export_error(e.to_string()))?
            }
            MediaType::Pdf => {
                if !sources.contains_key(&source.key()) {
                    let doc = Document::load_mem(source.bytes()).map_err(|e| {
                        export_error(format!("failed to parse {}: {}", source.name(), e))
                    })?;
                    input_size_bytes += source.bytes().len();
                    tracing::debug!(
                        source = %source.name(),
                        key = %source.key(),
                        last_modified = source.last_modified(),
                        "parsed source document"
                    );
                    sources.insert(
                        source.key(),
                        LoadedSource {
                            doc,
                            copied: BTreeMap::new(),
                        },
                    );
                }
                let loaded = sources
                    .get_mut(&source.key())
                    .ok_or_else(|| export_error("source cache miss".to_string()))?;
                copy_page(&mut output, loaded, pages_id, entry)
                    .map_err(|e| export_error(e.to_string()))?
            }
        };

        tracing::debug!(
            page = %entry.id(),
            source = %source.name(),
            index = entry.source_page_index(),
            rotation = entry.rotation().degrees(),
            "exported page"
        );
        kids.push(Object::Reference(page_id));
    }

    let page_count = kids.len() as u32;
    let pages = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Pages".to_vec())),
        ("Count", Object::Integer(page_count as i64)),
        ("Kids", Object::Array(kids)),
    ]);
    output.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = output.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]));
    output.trailer.set("Root", Object::Reference(catalog_id));

    // No timestamps: exporting the same collection twice yields identical bytes
    let info_id = output.add_object(Dictionary::from_iter(vec![
        ("Producer", text(&options.producer)),
        ("Creator", text(&options.creator)),
    ]));
    output.trailer.set("Info", Object::Reference(info_id));

    if options.compress {
        output.compress();
    }

    let mut bytes = Vec::new();
    output
        .save_to(&mut bytes)
        .map_err(|e| PageFlowError::OperationError(format!("Failed to save merged PDF: {}", e)))?;

    let metrics = ExportMetrics {
        page_count,
        input_size_bytes,
        output_size_bytes: bytes.len(),
        sources_parsed: sources.len(),
    };
    tracing::info!(
        pages = metrics.page_count,
        bytes = metrics.output_size_bytes,
        sources = metrics.sources_parsed,
        "export finished"
    );

    Ok(ExportedDocument {
        file_name: options.file_name.clone(),
        bytes,
        metrics,
    })
}

fn text(value: &str) -> Object {
    Object::String(value.as_bytes().to_vec(), StringFormat::Literal)
}

/// Add a page that shows the whole image at one point per pixel
fn add_image_page(
    output: &mut Document,
    pages_id: ObjectId,
    entry: &PageEntry,
) -> Result<ObjectId, PageFlowError> {
    let source = entry.source();
    let mut image = decode_image(source.media_type(), source.bytes())?;

    if let Some(mask) = image.soft_mask.take() {
        let mask_id = output.add_object(mask);
        image.image.dict.set("SMask", Object::Reference(mask_id));
    }
    let image_id = output.add_object(image.image);

    let (width, height) = (image.width as i64, image.height as i64);
    let content = Content {
        operations: vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    Object::Integer(width),
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(height),
                    Object::Integer(0),
                    Object::Integer(0),
                ],
            ),
            Operation::new("Do", vec![Object::Name(b"Im0".to_vec())]),
            Operation::new("Q", vec![]),
        ],
    };
    let content = content
        .encode()
        .map_err(|e| PageFlowError::OperationError(format!("content stream: {}", e)))?;
    let content_id = output.add_object(Stream::new(Dictionary::new(), content));

    let resources = Dictionary::from_iter(vec![(
        "XObject",
        Object::Dictionary(Dictionary::from_iter(vec![(
            "Im0",
            Object::Reference(image_id),
        )])),
    )]);

    let page = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Page".to_vec())),
        ("Parent", Object::Reference(pages_id)),
        (
            "MediaBox",
            Object::Array(vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(width),
                Object::Integer(height),
            ]),
        ),
        ("Resources", Object::Dictionary(resources)),
        ("Contents", Object::Reference(content_id)),
        ("Rotate", Object::Integer(entry.rotation().degrees() as i64)),
    ]);

    Ok(output.add_object(page))
}

/// Copy one source page into the output document
///
/// Inheritable attributes are pinned onto the copy, since it leaves its
/// original page tree behind.
fn copy_page(
    output: &mut Document,
    source: &mut LoadedSource,
    pages_id: ObjectId,
    entry: &PageEntry,
) -> Result<ObjectId, PageFlowError> {
    let doc = &source.doc;
    let copied = &mut source.copied;

    let source_page_id = page_object_id(doc, entry.source_page_index())?;
    let source_page = doc
        .get_dictionary(source_page_id)
        .map_err(|_| PageFlowError::ParseError("page is not a dictionary".to_string()))?;

    let mut page = source_page.clone();
    for key in INHERITABLE_ATTRIBUTES {
        if page.get(key).is_err() {
            if let Some(value) = inherited_attribute(doc, source_page, key) {
                page.set(key.to_vec(), value.clone());
            }
        }
    }
    page.remove(b"Parent");

    let rotation: Rotation = embedded_rotation(doc, source_page) + entry.rotation();

    let mut new_page = Dictionary::new();
    for (key, value) in page.iter() {
        new_page.set(key.clone(), copy_object(doc, copied, output, value));
    }
    new_page.set("Parent", Object::Reference(pages_id));
    new_page.set("Rotate", Object::Integer(rotation.degrees() as i64));

    Ok(output.add_object(new_page))
}

/// Deep-copy an object from `doc` into `output`, remapping references
///
/// References to other page or page tree nodes (from link destinations or
/// annotation back-pointers) become null rather than dragging the rest of
/// the source document along.
fn copy_object(
    doc: &Document,
    copied: &mut BTreeMap<ObjectId, ObjectId>,
    output: &mut Document,
    object: &Object,
) -> Object {
    match object {
        Object::Reference(id) => {
            if let Some(new_id) = copied.get(id) {
                return Object::Reference(*new_id);
            }
            let Ok(target) = doc.get_object(*id) else {
                return Object::Null;
            };
            if is_page_tree_node(target) {
                return Object::Null;
            }

            // Register before recursing so reference cycles terminate
            let new_id = output.new_object_id();
            copied.insert(*id, new_id);
            let copy = copy_object(doc, copied, output, target);
            output.objects.insert(new_id, copy);
            Object::Reference(new_id)
        }
        Object::Array(items) => Object::Array(
            items
                .iter()
                .map(|item| copy_object(doc, copied, output, item))
                .collect(),
        ),
        Object::Dictionary(dict) => Object::Dictionary(copy_dictionary(doc, copied, output, dict)),
        Object::Stream(stream) => {
            let mut copy = stream.clone();
            copy.dict = copy_dictionary(doc, copied, output, &stream.dict);
            Object::Stream(copy)
        }
        other => other.clone(),
    }
}

fn copy_dictionary(
    doc: &Document,
    copied: &mut BTreeMap<ObjectId, ObjectId>,
    output: &mut Document,
    dict: &Dictionary,
) -> Dictionary {
    let mut copy = Dictionary::new();
    for (key, value) in dict.iter() {
        copy.set(key.clone(), copy_object(doc, copied, output, value));
    }
    copy
}

fn is_page_tree_node(object: &Object) -> bool {
    let dict = match object {
        Object::Dictionary(dict) => dict,
        Object::Stream(stream) => &stream.dict,
        _ => return false,
    };
    matches!(
        dict.get(b"Type").and_then(|t| t.as_name()),
        Ok(b"Page") | Ok(b"Pages")
    )
}
