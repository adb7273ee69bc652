// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF module — turning scanned PDF documents into page images.

pub mod pages;

pub use pages::PdfPageSplitter;
