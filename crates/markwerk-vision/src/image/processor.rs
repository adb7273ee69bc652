// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image processor — decoding, size capping, and encoding of sheet images.
// Operates on in-memory images using the `image` crate.

use std::path::Path;

use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};
use markwerk_core::error::MarkwerkError;
use tracing::{debug, info, instrument};

use crate::source::ImageDecoder;

/// Image holder used at the I/O boundary of the pipeline.
///
/// Each method consumes `self` and returns a new `ImageProcessor`, enabling
/// method chaining:
///
/// ```ignore
/// let sheet = ImageProcessor::open("sheet.jpg")?
///     .fit_within(2000)
///     .into_dynamic();
/// ```
pub struct ImageProcessor {
    image: DynamicImage,
}

impl ImageProcessor {
    // -- Construction ---------------------------------------------------------

    /// Load an image from a file path.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self, MarkwerkError> {
        let img = image::open(path.as_ref()).map_err(|err| {
            MarkwerkError::ImageDecode(format!("failed to open {}: {}", path.as_ref().display(), err))
        })?;
        info!(width = img.width(), height = img.height(), "Sheet image loaded");
        Ok(Self { image: img })
    }

    /// Create a processor from raw encoded bytes (JPEG, PNG, etc.).
    #[instrument(skip(data), fields(data_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self, MarkwerkError> {
        let img = image::load_from_memory(data)
            .map_err(|err| MarkwerkError::ImageDecode(format!("failed to decode image: {}", err)))?;
        debug!(width = img.width(), height = img.height(), "Image decoded from bytes");
        Ok(Self { image: img })
    }

    /// Wrap an already-decoded `DynamicImage`.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self { image }
    }

    // -- Accessors ------------------------------------------------------------

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn as_dynamic(&self) -> &DynamicImage {
        &self.image
    }

    pub fn into_dynamic(self) -> DynamicImage {
        self.image
    }

    // -- Transformations ------------------------------------------------------

    /// Uniformly downscale so the longer side is at most `max_side`.
    ///
    /// Images already within the limit are returned untouched; images are
    /// never upscaled. Uses bilinear filtering.
    #[instrument(skip(self), fields(max_side))]
    pub fn fit_within(self, max_side: u32) -> Self {
        let (width, height) = (self.image.width(), self.image.height());
        let Some((new_w, new_h)) = capped_dimensions(width, height, max_side) else {
            return self;
        };
        info!(from_w = width, from_h = height, new_w, new_h, "Downscaling image");
        Self {
            image: self.image.resize_exact(new_w, new_h, FilterType::Triangle),
        }
    }

    // -- Output ---------------------------------------------------------------

    /// Encode the current image as PNG bytes.
    pub fn to_png_bytes(&self) -> Result<Vec<u8>, MarkwerkError> {
        let mut buffer = Vec::new();
        let mut cursor = std::io::Cursor::new(&mut buffer);
        self.image
            .write_to(&mut cursor, ImageFormat::Png)
            .map_err(|err| MarkwerkError::ImageEncode(format!("PNG encoding failed: {}", err)))?;
        Ok(buffer)
    }

    /// Write the image to a file. The format is inferred from the file extension.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), MarkwerkError> {
        self.image.save(path.as_ref()).map_err(|err| {
            MarkwerkError::ImageEncode(format!(
                "failed to save image to {}: {}",
                path.as_ref().display(),
                err
            ))
        })
    }
}

/// Dimensions after capping the longer side at `max_side`, or `None` when the
/// image already fits.
pub(crate) fn capped_dimensions(width: u32, height: u32, max_side: u32) -> Option<(u32, u32)> {
    let longer = width.max(height);
    if longer <= max_side || longer == 0 {
        return None;
    }
    let scale = max_side as f64 / longer as f64;
    let new_w = ((width as f64 * scale) as u32).max(1);
    let new_h = ((height as f64 * scale) as u32).max(1);
    Some((new_w, new_h))
}

/// Decodes sheet images from the filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileDecoder;

impl ImageDecoder for FileDecoder {
    fn decode(&self, path: &Path) -> Result<DynamicImage, MarkwerkError> {
        ImageProcessor::open(path).map(ImageProcessor::into_dynamic)
    }
}
