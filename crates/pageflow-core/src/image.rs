//! Image decoding for image-backed pages
//!
//! JPEG data is embedded untouched (`DCTDecode`); only the frame header is
//! read for dimensions and colour space. PNG data is decoded, normalised to
//! 8-bit Gray/RGB, and re-encoded with `FlateDecode`; an alpha channel
//! becomes a separate soft mask.

use crate::error::PageFlowError;
use crate::source::MediaType;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use lopdf::{Dictionary, Object, Stream};
use std::io::Write;

/// An image ready to be placed as an XObject
#[derive(Debug)]
pub struct EmbeddedImage {
    pub width: u32,
    pub height: u32,
    pub image: Stream,
    /// Alpha channel as a DeviceGray image, when the source has one
    pub soft_mask: Option<Stream>,
}

/// Decode image bytes of the given media type
pub fn decode_image(
    media_type: MediaType,
    bytes: &[u8],
) -> Result<EmbeddedImage, PageFlowError> {
    match media_type {
        MediaType::Jpeg => embed_jpeg(bytes),
        MediaType::Png => embed_png(bytes),
        MediaType::Pdf => Err(PageFlowError::UnsupportedMediaType(
            "a PDF is not an image".to_string(),
        )),
    }
}

/// Pixel dimensions without decoding the full image
pub fn image_dimensions(
    media_type: MediaType,
    bytes: &[u8],
) -> Result<(u32, u32), PageFlowError> {
    match media_type {
        MediaType::Jpeg => read_jpeg_header(bytes).map(|h| (h.width, h.height)),
        MediaType::Png => {
            let reader = png::Decoder::new(bytes)
                .read_info()
                .map_err(|e| PageFlowError::ImageError(format!("PNG: {}", e)))?;
            let info = reader.info();
            Ok((info.width, info.height))
        }
        MediaType::Pdf => Err(PageFlowError::UnsupportedMediaType(
            "a PDF is not an image".to_string(),
        )),
    }
}

struct JpegHeader {
    width: u32,
    height: u32,
    components: u8,
    bits_per_component: u8,
}

fn embed_jpeg(bytes: &[u8]) -> Result<EmbeddedImage, PageFlowError> {
    let header = read_jpeg_header(bytes)?;

    let color_space = match header.components {
        1 => "DeviceGray",
        3 => "DeviceRGB",
        4 => "DeviceCMYK",
        n => {
            return Err(PageFlowError::ImageError(format!(
                "JPEG with {} components is not supported",
                n
            )))
        }
    };

    let mut dict = image_dictionary(header.width, header.height, color_space);
    dict.set("BitsPerComponent", Object::Integer(header.bits_per_component as i64));
    dict.set("Filter", Object::Name(b"DCTDecode".to_vec()));
    if header.components == 4 {
        // CMYK JPEGs are almost always written with inverted (Adobe) values
        dict.set(
            "Decode",
            Object::Array([1, 0, 1, 0, 1, 0, 1, 0].map(Object::Integer).to_vec()),
        );
    }

    Ok(EmbeddedImage {
        width: header.width,
        height: header.height,
        image: Stream::new(dict, bytes.to_vec()).with_compression(false),
        soft_mask: None,
    })
}

/// Walk JPEG markers up to the first start-of-frame segment
fn read_jpeg_header(bytes: &[u8]) -> Result<JpegHeader, PageFlowError> {
    let invalid = |msg: &str| PageFlowError::ImageError(format!("JPEG: {}", msg));

    if bytes.len() < 4 || bytes[0] != 0xFF || bytes[1] != 0xD8 {
        return Err(invalid("missing start-of-image marker"));
    }

    let mut i = 2;
    loop {
        // Markers may be padded with any number of 0xFF fill bytes
        while i < bytes.len() && bytes[i] != 0xFF {
            i += 1;
        }
        while i < bytes.len() && bytes[i] == 0xFF {
            i += 1;
        }
        let Some(&marker) = bytes.get(i) else {
            return Err(invalid("no frame header found"));
        };
        i += 1;

        match marker {
            // Standalone markers carry no length
            0x01 | 0xD0..=0xD7 => continue,
            0xD9 | 0xDA => return Err(invalid("no frame header before image data")),
            _ => {}
        }

        if i + 2 > bytes.len() {
            return Err(invalid("truncated segment"));
        }
        let length = u16::from_be_bytes([bytes[i], bytes[i + 1]]) as usize;
        if length < 2 || i + length > bytes.len() {
            return Err(invalid("truncated segment"));
        }

        // SOF0..SOF15, excluding DHT (C4), JPG (C8) and DAC (CC)
        let is_frame = matches!(marker, 0xC0..=0xCF) && !matches!(marker, 0xC4 | 0xC8 | 0xCC);
        if is_frame {
            if length < 8 {
                return Err(invalid("frame header too short"));
            }
            let segment = &bytes[i + 2..i + length];
            let bits_per_component = segment[0];
            let height = u16::from_be_bytes([segment[1], segment[2]]) as u32;
            let width = u16::from_be_bytes([segment[3], segment[4]]) as u32;
            let components = segment[5];
            if width == 0 || height == 0 {
                return Err(invalid("zero image dimension"));
            }
            return Ok(JpegHeader {
                width,
                height,
                components,
                bits_per_component,
            });
        }

        i += length;
    }
}

fn embed_png(bytes: &[u8]) -> Result<EmbeddedImage, PageFlowError> {
    let png_error = |e: png::DecodingError| PageFlowError::ImageError(format!("PNG: {}", e));

    let mut decoder = png::Decoder::new(bytes);
    // Expand palettes and tRNS chunks, strip 16-bit samples down to 8
    decoder.set_transformations(png::Transformations::normalize_to_color8());
    let mut reader = decoder.read_info().map_err(png_error)?;
    let mut buffer = vec![0; reader.output_buffer_size()];
    let frame = reader.next_frame(&mut buffer).map_err(png_error)?;
    let pixels = &buffer[..frame.buffer_size()];

    let (color_channels, has_alpha, color_space) = match frame.color_type {
        png::ColorType::Grayscale => (1, false, "DeviceGray"),
        png::ColorType::GrayscaleAlpha => (1, true, "DeviceGray"),
        png::ColorType::Rgb => (3, false, "DeviceRGB"),
        png::ColorType::Rgba => (3, true, "DeviceRGB"),
        png::ColorType::Indexed => {
            return Err(PageFlowError::ImageError(
                "PNG: palette was not expanded".to_string(),
            ))
        }
    };

    let (color, alpha) = if has_alpha {
        split_alpha(pixels, color_channels)
    } else {
        (pixels.to_vec(), Vec::new())
    };

    let soft_mask = if has_alpha && alpha.iter().any(|&a| a != u8::MAX) {
        let mut dict = image_dictionary(frame.width, frame.height, "DeviceGray");
        dict.set("BitsPerComponent", Object::Integer(8));
        Some(flate_stream(dict, &alpha)?)
    } else {
        None
    };

    let mut dict = image_dictionary(frame.width, frame.height, color_space);
    dict.set("BitsPerComponent", Object::Integer(8));

    Ok(EmbeddedImage {
        width: frame.width,
        height: frame.height,
        image: flate_stream(dict, &color)?,
        soft_mask,
    })
}

/// Separate interleaved samples into colour and alpha planes
fn split_alpha(pixels: &[u8], color_channels: usize) -> (Vec<u8>, Vec<u8>) {
    let stride = color_channels + 1;
    let count = pixels.len() / stride;
    let mut color = Vec::with_capacity(count * color_channels);
    let mut alpha = Vec::with_capacity(count);
    for pixel in pixels.chunks_exact(stride) {
        color.extend_from_slice(&pixel[..color_channels]);
        alpha.push(pixel[color_channels]);
    }
    (color, alpha)
}

fn image_dictionary(width: u32, height: u32, color_space: &str) -> Dictionary {
    Dictionary::from_iter(vec![
        ("Type", Object::Name(b"XObject".to_vec())),
        ("Subtype", Object::Name(b"Image".to_vec())),
        ("Width", Object::Integer(width as i64)),
        ("Height", Object::Integer(height as i64)),
        ("ColorSpace", Object::Name(color_space.as_bytes().to_vec())),
    ])
}

fn flate_stream(mut dict: Dictionary, data: &[u8]) -> Result<Stream, PageFlowError> {
    let compress_error = |e: std::io::Error| {
        PageFlowError::ImageError(format!("compression failed: {}", e))
    };

    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).map_err(compress_error)?;
    let compressed = encoder.finish().map_err(compress_error)?;

    dict.set("Filter", Object::Name(b"FlateDecode".to_vec()));
    Ok(Stream::new(dict, compressed).with_compression(false))
}
