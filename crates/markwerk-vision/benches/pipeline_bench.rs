// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for the sheet pipeline in the markwerk-vision crate.
// Measures the two expensive stages (sheet location and binarization) and a
// full evaluation on a synthetic 100-question sheet.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use image::DynamicImage;
use image::imageops::grayscale;

use markwerk_core::{AnswerRecord, ClassifierConfig, PipelineConfig};
use markwerk_vision::SheetEvaluator;
use markwerk_vision::scan::{Binarizer, DocumentLocator};
use markwerk_vision::synthetic::{SheetLayout, key_set, patterned_answers, place_on_background};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// A photographed-looking sheet with every question answered.
fn answered_photo() -> DynamicImage {
    let letters = patterned_answers();
    let mut answers = AnswerRecord::new();
    for (i, letter) in letters.iter().enumerate() {
        answers
            .record(i as u32 + 1, Some(*letter))
            .expect("question numbers are in range");
    }
    let sheet = SheetLayout::default().render(&answers);
    DynamicImage::ImageRgb8(place_on_background(&sheet, 40))
}

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

fn bench_locate(c: &mut Criterion) {
    let photo = answered_photo().to_luma8();
    let locator = DocumentLocator::new(&PipelineConfig::default());

    c.bench_function("locate_sheet (synthetic photo)", |b| {
        b.iter(|| black_box(locator.locate(black_box(&photo)).expect("sheet is visible")));
    });
}

fn bench_binarize(c: &mut Criterion) {
    let gray = grayscale(&answered_photo().to_rgb8());
    let binarizer = Binarizer::from_config(&PipelineConfig::default());

    c.bench_function("adaptive_threshold (window 25)", |b| {
        b.iter(|| black_box(binarizer.binarize(black_box(&gray))));
    });
}

fn bench_evaluate(c: &mut Criterion) {
    let photo = answered_photo();
    let keys = key_set("A", &patterned_answers());
    let evaluator = SheetEvaluator::from_config(&PipelineConfig::default(), &ClassifierConfig::Heuristic)
        .expect("default configuration is valid");

    c.bench_function("evaluate_sheet (100 questions)", |b| {
        b.iter(|| {
            let outcome = evaluator
                .evaluate(black_box(&photo), "A", &keys)
                .expect("synthetic sheet evaluates");
            black_box(outcome.report.total);
        });
    });
}

criterion_group!(benches, bench_locate, bench_binarize, bench_evaluate);
criterion_main!(benches);
