//! Fixtures for the integration tests

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, Stream};
use pageflow_core::{Ingestor, PageCollection, UploadedFile};

/// A PDF whose pages carry the given embedded rotations
///
/// Page `i` is `600 + i` points wide so output pages can be traced back.
pub fn pdf_with_rotations(rotations: &[i64]) -> Vec<u8> {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();

    let mut kids = Vec::new();
    for (i, rotate) in rotations.iter().enumerate() {
        let content = Content {
            operations: vec![Operation::new("re", integers(&[0, 0, 10, 10]))],
        };
        let content_id =
            doc.add_object(Stream::new(Dictionary::new(), content.encode().unwrap()));
        let page = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(pages_id)),
            (
                "MediaBox",
                Object::Array(integers(&[0, 0, 600 + i as i64, 792])),
            ),
            ("Resources", Object::Dictionary(Dictionary::new())),
            ("Contents", Object::Reference(content_id)),
            ("Rotate", Object::Integer(*rotate)),
        ]);
        kids.push(Object::Reference(doc.add_object(page)));
    }

    let pages = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Pages".to_vec())),
        ("Count", Object::Integer(kids.len() as i64)),
        ("Kids", Object::Array(kids)),
    ]);
    doc.objects.insert(pages_id, Object::Dictionary(pages));
    let catalog_id = doc.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]));
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

fn integers(values: &[i64]) -> Vec<Object> {
    values.iter().map(|v| Object::Integer(*v)).collect()
}

pub fn pdf_upload(name: &str, bytes: Vec<u8>) -> UploadedFile {
    UploadedFile {
        name: name.to_string(),
        mime_type: "application/pdf".to_string(),
        last_modified: 0,
        bytes,
    }
}

pub fn collection_from(files: Vec<UploadedFile>) -> PageCollection {
    let batch = Ingestor::new().ingest(files);
    assert!(batch.failures.is_empty(), "{:?}", batch.failures);
    let mut collection = PageCollection::new();
    collection.append(batch.entries).unwrap();
    collection
}

/// (width, rotation) of every page of a PDF
pub fn page_summary(bytes: &[u8]) -> Vec<(u32, u16)> {
    let doc = Document::load_mem(bytes).unwrap();
    (0..doc.get_pages().len() as u32)
        .map(|i| {
            let info = pageflow_core::PageInfo::from_document(&doc, i).unwrap();
            (info.width as u32, info.rotation.degrees())
        })
        .collect()
}
