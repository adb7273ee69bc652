// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Central service layer — resolves settings, then wires the answer keys, the
// sheet pipeline, and the result store together for each command.

use std::path::{Path, PathBuf};

use image::DynamicImage;
use markwerk_core::error::{MarkwerkError, Result};
use markwerk_core::{AnswerKeySet, AppConfig, ClassifierConfig, EvaluationResult, ResultSink, SheetProvenance};
use markwerk_store::{ResultStore, hash_bytes};
use markwerk_vision::{PageSplitter, PdfPageSplitter, SheetEvaluator, SheetRequest, SingleImageSource};
use tracing::{debug, info, instrument};

use super::data_dir;

const CONFIG_FILE: &str = "config.json";
const DATABASE_FILE: &str = "markwerk.db";

/// Command-line values that take precedence over the settings file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub answer_keys: Option<PathBuf>,
    pub database: Option<PathBuf>,
    pub overlay_dir: Option<PathBuf>,
    pub model: Option<PathBuf>,
    pub no_store: bool,
}

/// One evaluated sheet, plus its row id when it was persisted.
#[derive(Debug, Clone)]
pub struct Evaluated {
    pub result: EvaluationResult,
    pub stored_id: Option<i64>,
}

/// Resolved settings shared by every command.
pub struct AppServices {
    config: AppConfig,
    data_dir: PathBuf,
}

impl AppServices {
    /// Resolve the data directory and settings, then apply `overrides`.
    pub fn init(config_path: Option<&Path>, overrides: &Overrides) -> Result<Self> {
        let dir = data_dir::data_dir()?;
        info!(path = %dir.display(), "initialising app services");

        let mut config = load_config(config_path, &dir)?;
        apply_overrides(&mut config, overrides);
        Ok(Self::with_config(config, dir))
    }

    pub fn with_config(config: AppConfig, data_dir: PathBuf) -> Self {
        Self { config, data_dir }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn database_path(&self) -> PathBuf {
        self.config
            .database_path
            .clone()
            .unwrap_or_else(|| self.data_dir.join(DATABASE_FILE))
    }

    pub fn open_store(&self) -> Result<ResultStore> {
        ResultStore::open(self.database_path())
    }

    pub fn answer_keys(&self) -> Result<AnswerKeySet> {
        AnswerKeySet::load(&self.config.answer_keys_path)
    }

    /// Grade the sheet at `image_path` and, unless storage is disabled,
    /// persist it with an `evaluated` audit entry for `actor`.
    #[instrument(skip(self), fields(path = %image_path.display()))]
    pub fn evaluate(
        &self,
        image_path: &Path,
        version: &str,
        student_id: Option<&str>,
        actor: &str,
    ) -> Result<Evaluated> {
        let keys = self.answer_keys()?;
        keys.resolve(version)?;
        let evaluator = SheetEvaluator::from_config(&self.config.pipeline, &self.config.classifier)?;

        let bytes = std::fs::read(image_path)
            .map_err(|err| MarkwerkError::ImageDecode(format!("failed to open {}: {err}", image_path.display())))?;
        let image = first_page(image_path, &bytes)?;

        let mut request = SheetRequest::new(image_path, version);
        if let Some(id) = student_id {
            request = request.with_student_id(id);
        }
        if let Some(dir) = &self.config.overlay_dir {
            request = request.with_overlay_dir(dir);
        }
        let result = evaluator.evaluate_request(&image, &request, &keys)?;

        let stored_id = if self.config.store_results {
            let provenance = SheetProvenance {
                sheet_path: image_path.display().to_string(),
                sheet_hash: hash_bytes(&bytes),
                actor: actor.to_owned(),
            };
            let mut store = self.open_store()?;
            Some(store.store(&result, &provenance)?)
        } else {
            debug!("result storage disabled");
            None
        };

        Ok(Evaluated { result, stored_id })
    }
}

/// An explicit settings file must load; the data-directory one is optional.
fn load_config(explicit: Option<&Path>, data_dir: &Path) -> Result<AppConfig> {
    if let Some(path) = explicit {
        return AppConfig::load(path);
    }
    let path = data_dir.join(CONFIG_FILE);
    if path.is_file() {
        AppConfig::load(path)
    } else {
        Ok(AppConfig::default())
    }
}

fn apply_overrides(config: &mut AppConfig, overrides: &Overrides) {
    if let Some(path) = &overrides.answer_keys {
        config.answer_keys_path = path.clone();
    }
    if let Some(path) = &overrides.database {
        config.database_path = Some(path.clone());
    }
    if let Some(dir) = &overrides.overlay_dir {
        config.overlay_dir = Some(dir.clone());
    }
    if let Some(model) = &overrides.model {
        config.classifier = ClassifierConfig::Trained {
            model_path: model.clone(),
        };
    }
    if overrides.no_store {
        config.store_results = false;
    }
}

fn is_pdf(path: &Path, bytes: &[u8]) -> bool {
    bytes.starts_with(b"%PDF")
        || path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}

/// Decode the sheet; multi-page documents contribute their first page only.
fn first_page(path: &Path, bytes: &[u8]) -> Result<DynamicImage> {
    let pages = if is_pdf(path, bytes) {
        PdfPageSplitter::new().split_pages(bytes)?
    } else {
        SingleImageSource.split_pages(bytes)?
    };
    if pages.len() > 1 {
        info!(pages = pages.len(), "grading the first page only");
    }
    pages
        .into_iter()
        .next()
        .ok_or_else(|| MarkwerkError::UnsupportedDocument(format!("{} has no pages", path.display())))
}
