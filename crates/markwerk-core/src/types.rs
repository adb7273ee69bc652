// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for answer-sheet evaluation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{MarkwerkError, Result};

/// Number of questions on every sheet.
pub const QUESTION_COUNT: usize = 100;

/// Number of selectable options (bubbles) per question.
pub const OPTIONS_PER_QUESTION: usize = 5;

/// Number of scored sections.
pub const SECTION_COUNT: usize = 5;

/// Consecutive questions per section.
pub const QUESTIONS_PER_SECTION: usize = QUESTION_COUNT / SECTION_COUNT;

/// One of the five option letters printed next to a question's bubbles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum OptionLetter {
    A,
    B,
    C,
    D,
    E,
}

impl OptionLetter {
    /// All letters in left-to-right bubble order.
    pub const ALL: [OptionLetter; OPTIONS_PER_QUESTION] = [Self::A, Self::B, Self::C, Self::D, Self::E];

    /// Letter for a zero-based bubble index within an option group.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Zero-based bubble index of this letter.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
            Self::E => "E",
        }
    }
}

impl std::fmt::Display for OptionLetter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-question answers decoded from one sheet.
///
/// Always dense: every question 1..=100 has an entry, `None` meaning "no mark"
/// (blank, ambiguous, or never reached by the grid).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnswerRecord {
    answers: BTreeMap<u32, Option<OptionLetter>>,
}

impl AnswerRecord {
    /// A record with every question unmarked.
    pub fn new() -> Self {
        let answers = (1..=QUESTION_COUNT as u32).map(|q| (q, None)).collect();
        Self { answers }
    }

    /// Set the answer for a 1-based question number.
    pub fn record(&mut self, question: u32, answer: Option<OptionLetter>) -> Result<()> {
        if question == 0 || question as usize > QUESTION_COUNT {
            return Err(MarkwerkError::QuestionOutOfRange(question));
        }
        self.answers.insert(question, answer);
        Ok(())
    }

    /// Answer for a 1-based question number; `None` for "no mark" or an
    /// out-of-range question.
    pub fn get(&self, question: u32) -> Option<OptionLetter> {
        self.answers.get(&question).copied().flatten()
    }

    /// Iterate `(question, answer)` pairs in question order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, Option<OptionLetter>)> + '_ {
        self.answers.iter().map(|(q, a)| (*q, *a))
    }

    /// Number of questions with a mark.
    pub fn marked_count(&self) -> usize {
        self.answers.values().filter(|a| a.is_some()).count()
    }
}

impl Default for AnswerRecord {
    fn default() -> Self {
        Self::new()
    }
}

/// Ground-truth answers for one sheet version.
///
/// Entries are kept as the strings they were loaded with; comparison against a
/// recorded letter is exact and case-sensitive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerKey {
    pub version: String,
    pub correct_options: Vec<String>,
}

impl AnswerKey {
    /// Whether `answer` matches the key at the 1-based `question`.
    pub fn is_correct(&self, question: u32, answer: OptionLetter) -> bool {
        question
            .checked_sub(1)
            .and_then(|i| self.correct_options.get(i as usize))
            .is_some_and(|expected| expected == answer.as_str())
    }
}

/// Score of one sheet against one answer key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreReport {
    pub total: u32,
    pub section_scores: BTreeMap<String, u32>,
    pub answers: AnswerRecord,
}

/// Name of the 0-based section, e.g. `subject_1`.
pub fn section_name(section: usize) -> String {
    format!("subject_{}", section + 1)
}

/// The payload handed back to calling layers for one evaluated sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationResult {
    pub student_id: Option<String>,
    pub version: String,
    pub total: u32,
    pub section_scores: BTreeMap<String, u32>,
    pub answers: AnswerRecord,
    pub overlay_image_path: String,
}

impl EvaluationResult {
    pub fn from_report(
        report: ScoreReport,
        version: impl Into<String>,
        student_id: Option<String>,
        overlay_image_path: impl Into<String>,
    ) -> Self {
        Self {
            student_id,
            version: version.into(),
            total: report.total,
            section_scores: report.section_scores,
            answers: report.answers,
            overlay_image_path: overlay_image_path.into(),
        }
    }
}
