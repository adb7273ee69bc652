// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scanning stage — locating and rectifying the sheet, then binarizing it into
// a mark mask.

pub mod binarize;
pub mod locate;

pub use binarize::Binarizer;
pub use locate::{DocumentLocator, Quadrilateral, RectifiedSheet, SheetOutline};

/// Gaussian sigma conventionally paired with a square kernel of side `size`.
pub(crate) fn kernel_sigma(size: u32) -> f32 {
    0.3 * ((size as f32 - 1.0) * 0.5 - 1.0) + 0.8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sigma_for_common_kernels() {
        assert!((kernel_sigma(5) - 1.1).abs() < 1e-6);
        assert!((kernel_sigma(25) - 4.1).abs() < 1e-5);
    }
}
