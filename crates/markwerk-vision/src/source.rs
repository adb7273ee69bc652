// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Collaborator seams for getting raster images into the pipeline.

use std::path::Path;

use image::DynamicImage;
use markwerk_core::error::Result;

/// Turns a file on disk into a raster image.
pub trait ImageDecoder {
    fn decode(&self, path: &Path) -> Result<DynamicImage>;
}

/// Splits a multi-page document into one raster image per page, in page
/// order.
///
/// The pipeline evaluates exactly one image; which page(s) to evaluate is the
/// caller's decision.
pub trait PageSplitter {
    fn split_pages(&self, data: &[u8]) -> Result<Vec<DynamicImage>>;
}

/// A plain raster file (JPEG, PNG, TIFF, ...) viewed as a one-page document.
#[derive(Debug, Clone, Copy, Default)]
pub struct SingleImageSource;

impl PageSplitter for SingleImageSource {
    fn split_pages(&self, data: &[u8]) -> Result<Vec<DynamicImage>> {
        let image = crate::image::ImageProcessor::from_bytes(data)?.into_dynamic();
        Ok(vec![image])
    }
}
