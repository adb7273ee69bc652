// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF page splitter — pulls the scanned image out of each page of a PDF
// using the `lopdf` crate.

use image::{DynamicImage, GrayImage, ImageFormat, RgbImage};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use markwerk_core::error::MarkwerkError;
use tracing::{debug, info, instrument, warn};

use crate::source::PageSplitter;

/// Bound on `/Parent` hops when resolving inherited page resources.
const MAX_INHERITANCE_DEPTH: usize = 32;

/// Extracts one raster image per page from scanned PDFs.
///
/// Each page's largest image XObject is taken as the scan. JPEG streams
/// (`DCTDecode`) are decoded directly; unfiltered or `FlateDecode` streams
/// must hold 8-bit `DeviceGray` or `DeviceRGB` samples. Pages with no image,
/// or with any other encoding, make the whole document unsupported.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfPageSplitter;

impl PdfPageSplitter {
    pub fn new() -> Self {
        Self
    }

    /// Number of pages in a PDF, without decoding any images.
    pub fn page_count(data: &[u8]) -> Result<usize, MarkwerkError> {
        Ok(load(data)?.get_pages().len())
    }
}

impl PageSplitter for PdfPageSplitter {
    #[instrument(skip_all, fields(bytes_len = data.len()))]
    fn split_pages(&self, data: &[u8]) -> Result<Vec<DynamicImage>, MarkwerkError> {
        let document = load(data)?;
        let pages = document.get_pages();
        if pages.is_empty() {
            return Err(MarkwerkError::UnsupportedDocument("PDF has no pages".into()));
        }

        let mut images = Vec::with_capacity(pages.len());
        for (number, page_id) in pages {
            let stream = largest_page_image(&document, page_id)?.ok_or_else(|| {
                MarkwerkError::UnsupportedDocument(format!("page {number} contains no scanned image"))
            })?;
            let image = decode_image_stream(&document, stream)
                .map_err(|err| annotate_page(err, number))?;
            debug!(page = number, width = image.width(), height = image.height(), "Page image extracted");
            images.push(image);
        }

        info!(pages = images.len(), "PDF split into page images");
        Ok(images)
    }
}

fn load(data: &[u8]) -> Result<Document, MarkwerkError> {
    Document::load_mem(data)
        .map_err(|err| MarkwerkError::PdfError(format!("failed to load PDF from memory: {}", err)))
}

fn annotate_page(err: MarkwerkError, page: u32) -> MarkwerkError {
    match err {
        MarkwerkError::UnsupportedDocument(detail) => {
            MarkwerkError::UnsupportedDocument(format!("page {page}: {detail}"))
        }
        other => other,
    }
}

/// Follow a reference to its target object; other objects pass through.
fn resolve<'a>(document: &'a Document, object: &'a Object) -> Result<&'a Object, MarkwerkError> {
    match object {
        Object::Reference(id) => document
            .get_object(*id)
            .map_err(|err| MarkwerkError::PdfError(format!("dangling reference {:?}: {}", id, err))),
        other => Ok(other),
    }
}

fn as_dict<'a>(document: &'a Document, object: &'a Object) -> Option<&'a Dictionary> {
    match resolve(document, object).ok()? {
        Object::Dictionary(dict) => Some(dict),
        Object::Stream(stream) => Some(&stream.dict),
        _ => None,
    }
}

/// The page's `/Resources`, walking up `/Parent` links if it inherits them.
fn page_resources(document: &Document, page_id: ObjectId) -> Result<Option<&Dictionary>, MarkwerkError> {
    let mut node = document
        .get_dictionary(page_id)
        .map_err(|err| MarkwerkError::PdfError(format!("page {:?} unreadable: {}", page_id, err)))?;

    for _ in 0..MAX_INHERITANCE_DEPTH {
        if let Ok(resources) = node.get(b"Resources") {
            return Ok(as_dict(document, resources));
        }
        let Some(parent) = node.get(b"Parent").ok().and_then(|p| as_dict(document, p)) else {
            return Ok(None);
        };
        node = parent;
    }
    warn!(?page_id, "Page tree too deep while resolving resources");
    Ok(None)
}

/// The image XObject with the most pixels on a page, if any.
fn largest_page_image(document: &Document, page_id: ObjectId) -> Result<Option<&Stream>, MarkwerkError> {
    let Some(resources) = page_resources(document, page_id)? else {
        return Ok(None);
    };
    let Some(xobjects) = resources.get(b"XObject").ok().and_then(|x| as_dict(document, x)) else {
        return Ok(None);
    };

    let mut best: Option<(i64, &Stream)> = None;
    for (_, object) in xobjects.iter() {
        let Object::Stream(stream) = resolve(document, object)? else {
            continue;
        };
        if !matches!(stream.dict.get(b"Subtype"), Ok(Object::Name(name)) if name == b"Image") {
            continue;
        }
        let pixels = dict_int(&stream.dict, b"Width").unwrap_or(0) * dict_int(&stream.dict, b"Height").unwrap_or(0);
        if best.is_none_or(|(size, _)| pixels > size) {
            best = Some((pixels, stream));
        }
    }
    Ok(best.map(|(_, stream)| stream))
}

fn dict_int(dict: &Dictionary, key: &[u8]) -> Option<i64> {
    match dict.get(key).ok()? {
        Object::Integer(value) => Some(*value),
        Object::Real(value) => Some(*value as i64),
        _ => None,
    }
}

/// Filter names applied to a stream, outermost first.
fn stream_filters(document: &Document, stream: &Stream) -> Result<Vec<Vec<u8>>, MarkwerkError> {
    let Ok(filter) = stream.dict.get(b"Filter") else {
        return Ok(Vec::new());
    };
    match resolve(document, filter)? {
        Object::Name(name) => Ok(vec![name.clone()]),
        Object::Array(items) => items
            .iter()
            .map(|item| match resolve(document, item)? {
                Object::Name(name) => Ok(name.clone()),
                other => Err(MarkwerkError::UnsupportedDocument(format!(
                    "unexpected filter entry {:?}",
                    other
                ))),
            })
            .collect(),
        other => Err(MarkwerkError::UnsupportedDocument(format!("unexpected filter {:?}", other))),
    }
}

fn decode_image_stream(document: &Document, stream: &Stream) -> Result<DynamicImage, MarkwerkError> {
    let filters = stream_filters(document, stream)?;
    let filter_names: Vec<&[u8]> = filters.iter().map(Vec::as_slice).collect();

    match filter_names.as_slice() {
        [b"DCTDecode"] => image::load_from_memory_with_format(&stream.content, ImageFormat::Jpeg)
            .map_err(|err| MarkwerkError::ImageDecode(format!("embedded JPEG: {}", err))),
        [] => raw_samples(document, stream, stream.content.clone()),
        [b"FlateDecode"] => {
            let samples = stream
                .decompressed_content()
                .map_err(|err| MarkwerkError::PdfError(format!("Flate stream: {}", err)))?;
            raw_samples(document, stream, samples)
        }
        other => Err(MarkwerkError::UnsupportedDocument(format!(
            "image filter {:?} is not supported",
            other.iter().map(|f| String::from_utf8_lossy(f)).collect::<Vec<_>>()
        ))),
    }
}

/// Build an image from uncompressed 8-bit gray or RGB samples.
fn raw_samples(document: &Document, stream: &Stream, samples: Vec<u8>) -> Result<DynamicImage, MarkwerkError> {
    let dict = &stream.dict;
    let width = dict_int(dict, b"Width").filter(|w| *w > 0);
    let height = dict_int(dict, b"Height").filter(|h| *h > 0);
    let (Some(width), Some(height)) = (width, height) else {
        return Err(MarkwerkError::UnsupportedDocument("image without valid dimensions".into()));
    };
    let (width, height) = (width as u32, height as u32);

    let bits = dict_int(dict, b"BitsPerComponent").unwrap_or(8);
    if bits != 8 {
        return Err(MarkwerkError::UnsupportedDocument(format!("{bits}-bit samples are not supported")));
    }

    let color_space = match dict.get(b"ColorSpace") {
        Ok(object) => match resolve(document, object)? {
            Object::Name(name) => name.clone(),
            other => {
                return Err(MarkwerkError::UnsupportedDocument(format!(
                    "color space {:?} is not supported",
                    other
                )));
            }
        },
        Err(_) => b"DeviceGray".to_vec(),
    };

    let truncated = || MarkwerkError::UnsupportedDocument("image data is shorter than its dimensions".into());
    match color_space.as_slice() {
        b"DeviceGray" => {
            let len = width as usize * height as usize;
            let pixels = samples.get(..len).ok_or_else(truncated)?.to_vec();
            GrayImage::from_raw(width, height, pixels)
                .map(DynamicImage::ImageLuma8)
                .ok_or_else(truncated)
        }
        b"DeviceRGB" => {
            let len = width as usize * height as usize * 3;
            let pixels = samples.get(..len).ok_or_else(truncated)?.to_vec();
            RgbImage::from_raw(width, height, pixels)
                .map(DynamicImage::ImageRgb8)
                .ok_or_else(truncated)
        }
        other => Err(MarkwerkError::UnsupportedDocument(format!(
            "color space {} is not supported",
            String::from_utf8_lossy(other)
        ))),
    }
}
