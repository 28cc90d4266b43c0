//! Fixture documents shared by the unit tests

use lopdf::{content::Content, content::Operation, Dictionary, Document, Object, Stream};

/// How a fixture page is built
#[derive(Clone, Copy, Default)]
pub struct FixturePage {
    /// Embedded /Rotate on the page itself
    pub rotate: Option<i64>,
}

/// Create a valid test PDF with the specified number of pages
///
/// Page `i` (0-based) has a MediaBox width of `600 + i` so copies can be
/// traced back to their source page.
pub fn create_test_pdf(num_pages: u32) -> Vec<u8> {
    build_pdf(&vec![FixturePage::default(); num_pages as usize], None)
}

/// Create a test PDF with per-page embedded rotations
pub fn create_rotated_pdf(rotations: &[Option<i64>]) -> Vec<u8> {
    let pages: Vec<FixturePage> = rotations
        .iter()
        .map(|&rotate| FixturePage { rotate })
        .collect();
    build_pdf(&pages, None)
}

/// Create a test PDF whose pages inherit /Rotate, /MediaBox and /Resources
/// from the page tree root
pub fn create_inheriting_pdf(num_pages: u32, inherited_rotate: i64) -> Vec<u8> {
    build_pdf(
        &vec![FixturePage::default(); num_pages as usize],
        Some(inherited_rotate),
    )
}

fn build_pdf(pages: &[FixturePage], inherited_rotate: Option<i64>) -> Vec<u8> {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Font".to_vec())),
        ("Subtype", Object::Name(b"Type1".to_vec())),
        ("BaseFont", Object::Name(b"Helvetica".to_vec())),
    ]));
    let resources = Dictionary::from_iter(vec![(
        "Font",
        Object::Dictionary(Dictionary::from_iter(vec![(
            "F1",
            Object::Reference(font_id),
        )])),
    )]);

    let mut page_ids = Vec::new();

    for (i, page_spec) in pages.iter().enumerate() {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new(
                    "Tf",
                    vec![Object::Name(b"F1".to_vec()), Object::Integer(12)],
                ),
                Operation::new("Td", vec![Object::Integer(100), Object::Integer(700)]),
                Operation::new(
                    "Tj",
                    vec![Object::String(
                        format!("Page {}", i + 1).into_bytes(),
                        lopdf::StringFormat::Literal,
                    )],
                ),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id =
            doc.add_object(Stream::new(Dictionary::new(), content.encode().unwrap()));

        let mut page = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(pages_id)),
            ("Contents", Object::Reference(content_id)),
        ]);
        if inherited_rotate.is_none() {
            page.set("MediaBox", media_box(600 + i as i64));
            page.set("Resources", Object::Dictionary(resources.clone()));
        }
        if let Some(rotate) = page_spec.rotate {
            page.set("Rotate", Object::Integer(rotate));
        }
        page_ids.push(doc.add_object(page));
    }

    let mut tree = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Pages".to_vec())),
        ("Count", Object::Integer(pages.len() as i64)),
        (
            "Kids",
            Object::Array(page_ids.iter().map(|id| Object::Reference(*id)).collect()),
        ),
    ]);
    if let Some(rotate) = inherited_rotate {
        tree.set("Rotate", Object::Integer(rotate));
        tree.set("MediaBox", media_box(500));
        tree.set("Resources", Object::Dictionary(resources));
    }
    doc.objects.insert(pages_id, Object::Dictionary(tree));

    let catalog = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]);
    let catalog_id = doc.add_object(catalog);
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();
    buffer
}

fn media_box(width: i64) -> Object {
    Object::Array(vec![
        Object::Integer(0),
        Object::Integer(0),
        Object::Integer(width),
        Object::Integer(792),
    ])
}

/// Encode an RGBA PNG of the given size
pub fn create_test_png(width: u32, height: u32, with_alpha: bool) -> Vec<u8> {
    let mut buffer = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut buffer, width, height);
        let channels = if with_alpha {
            encoder.set_color(png::ColorType::Rgba);
            4
        } else {
            encoder.set_color(png::ColorType::Rgb);
            3
        };
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder.write_header().unwrap();
        let pixels: Vec<u8> = (0..width * height * channels)
            .map(|i| (i % 251) as u8)
            .collect();
        writer.write_image_data(&pixels).unwrap();
    }
    buffer
}

/// A minimal baseline JPEG header (SOI, APP0, SOF0, EOI)
///
/// Only the header is ever read when embedding, so no scan data is needed.
pub fn create_test_jpeg(width: u16, height: u16, components: u8) -> Vec<u8> {
    let mut jpeg = vec![0xFF, 0xD8];
    jpeg.extend_from_slice(&[
        0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F', 0x00, 0x01, 0x01, 0x00, 0x00, 0x01, 0x00,
        0x01, 0x00, 0x00,
    ]);
    let sof_len = 8 + 3 * components as u16;
    jpeg.extend_from_slice(&[0xFF, 0xC0]);
    jpeg.extend_from_slice(&sof_len.to_be_bytes());
    jpeg.push(8);
    jpeg.extend_from_slice(&height.to_be_bytes());
    jpeg.extend_from_slice(&width.to_be_bytes());
    jpeg.push(components);
    for c in 0..components {
        jpeg.extend_from_slice(&[c + 1, 0x11, 0x00]);
    }
    jpeg.extend_from_slice(&[0xFF, 0xD9]);
    jpeg
}
