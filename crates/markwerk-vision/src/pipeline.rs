// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Sheet evaluation pipeline — image in, scored answers and review overlay out.

use std::path::{Path, PathBuf};

use image::imageops::grayscale;
use image::{DynamicImage, RgbImage};
use markwerk_core::error::MarkwerkError;
use markwerk_core::{
    AnswerKeySet, AnswerRecord, ClassifierConfig, EvaluationResult, PipelineConfig, ScoreReport, scoring,
};
use tracing::{debug, info, instrument};

use crate::classify::{MarkClassifier, OptionDecoder, build_classifier};
use crate::detect::{BubbleDetector, GridAssembler};
use crate::overlay::OverlayRenderer;
use crate::scan::{Binarizer, DocumentLocator, SheetOutline};
use crate::source::ImageDecoder;

/// One sheet to evaluate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetRequest {
    pub image_path: PathBuf,
    /// Answer key version printed on the sheet.
    pub version: String,
    pub student_id: Option<String>,
    /// Where to write the overlay. `None` writes it next to the image.
    pub overlay_dir: Option<PathBuf>,
}

impl SheetRequest {
    pub fn new(image_path: impl Into<PathBuf>, version: impl Into<String>) -> Self {
        Self {
            image_path: image_path.into(),
            version: version.into(),
            student_id: None,
            overlay_dir: None,
        }
    }

    pub fn with_student_id(mut self, student_id: impl Into<String>) -> Self {
        self.student_id = Some(student_id.into());
        self
    }

    pub fn with_overlay_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.overlay_dir = Some(dir.into());
        self
    }

    /// `<stem>_overlay.png`, in the overlay directory or beside the image.
    pub fn overlay_path(&self) -> PathBuf {
        let stem = self
            .image_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "sheet".to_owned());
        let dir = match &self.overlay_dir {
            Some(dir) => dir.as_path(),
            None => self.image_path.parent().unwrap_or(Path::new("")),
        };
        dir.join(format!("{stem}_overlay.png"))
    }
}

/// Everything the pipeline learned about one sheet.
#[derive(Debug, Clone)]
pub struct SheetOutcome {
    pub report: ScoreReport,
    /// Rectified sheet with the chosen bubbles circled.
    pub overlay: RgbImage,
    pub outline: SheetOutline,
    pub bubbles_detected: usize,
    pub questions_decoded: usize,
}

/// Runs the full pipeline: rectify, binarize, detect, assemble, decode, score.
///
/// The evaluator holds only read-only state once built, so one instance can
/// serve many sheets concurrently from `&self`.
pub struct SheetEvaluator {
    locator: DocumentLocator,
    binarizer: Binarizer,
    detector: BubbleDetector,
    assembler: GridAssembler,
    decoder: OptionDecoder,
    overlay: OverlayRenderer,
}

impl SheetEvaluator {
    pub fn new(config: &PipelineConfig, classifier: Box<dyn MarkClassifier>) -> Result<Self, MarkwerkError> {
        config.validate()?;
        Ok(Self {
            locator: DocumentLocator::new(config),
            binarizer: Binarizer::from_config(config),
            detector: BubbleDetector::new(config.bubble_bounds),
            assembler: GridAssembler::from_config(config),
            decoder: OptionDecoder::new(classifier, config.roi_inset),
            overlay: OverlayRenderer::from_config(config),
        })
    }

    /// Build the evaluator and the configured classifier together.
    pub fn from_config(config: &PipelineConfig, classifier: &ClassifierConfig) -> Result<Self, MarkwerkError> {
        Self::new(config, build_classifier(classifier, config)?)
    }

    pub fn classifier_name(&self) -> &'static str {
        self.decoder.classifier_name()
    }

    /// Evaluate a decoded sheet image against the key for `version`.
    ///
    /// The key is resolved before any image work, so an unknown or malformed
    /// version fails fast.
    #[instrument(skip(self, image, keys), fields(width = image.width(), height = image.height()))]
    pub fn evaluate(
        &self,
        image: &DynamicImage,
        version: &str,
        keys: &AnswerKeySet,
    ) -> Result<SheetOutcome, MarkwerkError> {
        let key = keys.resolve(version)?;

        let sheet = self.locator.rectify(image)?;
        let mask = self.binarizer.binarize(&grayscale(&sheet.image));
        let bubbles = self.detector.detect(&mask);
        let mut groups = self.assembler.assemble(&bubbles);

        let mut answers = AnswerRecord::new();
        let mut marks = Vec::new();
        for group in &mut groups {
            let choice = self.decoder.decode(group, &mask);
            if let Some(letter) = choice {
                marks.push(group.bubbles[letter.index()].center);
            }
            answers.record(group.question, choice)?;
        }
        debug!(marked = marks.len(), "Options decoded");

        let report = scoring::score_against(&answers, &key);
        let overlay = self.overlay.render(&sheet.image, marks);

        info!(
            total = report.total,
            bubbles = bubbles.len(),
            questions = groups.len(),
            detected = sheet.outline.is_detected(),
            classifier = self.classifier_name(),
            "Sheet evaluated"
        );
        Ok(SheetOutcome {
            report,
            overlay,
            outline: sheet.outline,
            bubbles_detected: bubbles.len(),
            questions_decoded: groups.len(),
        })
    }

    /// Evaluate and write the overlay where `request` says.
    #[instrument(skip(self, image, keys), fields(path = %request.image_path.display(), version = %request.version))]
    pub fn evaluate_request(
        &self,
        image: &DynamicImage,
        request: &SheetRequest,
        keys: &AnswerKeySet,
    ) -> Result<EvaluationResult, MarkwerkError> {
        let outcome = self.evaluate(image, &request.version, keys)?;

        let overlay_path = request.overlay_path();
        if let Some(dir) = &request.overlay_dir {
            std::fs::create_dir_all(dir)?;
        }
        self.overlay.write(outcome.overlay, &overlay_path)?;

        Ok(EvaluationResult::from_report(
            outcome.report,
            request.version.clone(),
            request.student_id.clone(),
            overlay_path.display().to_string(),
        ))
    }

    /// Decode the request's image with `decoder`, then evaluate it.
    pub fn evaluate_file(
        &self,
        decoder: &dyn ImageDecoder,
        request: &SheetRequest,
        keys: &AnswerKeySet,
    ) -> Result<EvaluationResult, MarkwerkError> {
        keys.resolve(&request.version)?;
        let image = decoder.decode(&request.image_path)?;
        self.evaluate_request(&image, request, keys)
    }
}
