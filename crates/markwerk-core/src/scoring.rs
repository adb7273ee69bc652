// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scorer — compares decoded answers against a versioned answer key and
// produces per-section and total scores.

use std::collections::BTreeMap;

use tracing::{debug, instrument};

use crate::config::AnswerKeySet;
use crate::error::Result;
use crate::types::{
    AnswerKey, AnswerRecord, QUESTIONS_PER_SECTION, SECTION_COUNT, ScoreReport, section_name,
};

/// Score `answers` against the key stored for `version`.
///
/// Fails with `UnknownVersion` or `MalformedKey` when the key cannot be
/// resolved.
#[instrument(skip(answers, keys))]
pub fn score(answers: &AnswerRecord, keys: &AnswerKeySet, version: &str) -> Result<ScoreReport> {
    let key = keys.resolve(version)?;
    Ok(score_against(answers, &key))
}

/// Score `answers` against an already-resolved key.
///
/// Questions are split into five sections of twenty consecutive questions.
/// A question counts only when a mark was recorded and it equals the key.
pub fn score_against(answers: &AnswerRecord, key: &AnswerKey) -> ScoreReport {
    let mut section_scores = BTreeMap::new();
    let mut total = 0;

    for section in 0..SECTION_COUNT {
        let first = (section * QUESTIONS_PER_SECTION + 1) as u32;
        let last = first + QUESTIONS_PER_SECTION as u32;
        let score = (first..last)
            .filter(|&q| answers.get(q).is_some_and(|letter| key.is_correct(q, letter)))
            .count() as u32;
        section_scores.insert(section_name(section), score);
        total += score;
    }

    debug!(total, version = %key.version, "sheet scored");
    ScoreReport {
        total,
        section_scores,
        answers: answers.clone(),
    }
}
