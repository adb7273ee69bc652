// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Synthetic answer sheets for tests, benchmarks, and calibration.
//
// Renders a clean 100-question sheet with the standard layout (four groups of
// five bubbles per printed row, 25 rows) and optionally places it on a dark
// surface so the outline can be located like a photograph.

use std::collections::BTreeMap;

use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_hollow_circle_mut};
use markwerk_core::{AnswerKeySet, AnswerRecord, OPTIONS_PER_QUESTION, OptionLetter, QUESTION_COUNT};

const PAPER: Rgb<u8> = Rgb([240, 240, 240]);
const PRINT: Rgb<u8> = Rgb([60, 60, 60]);
const PENCIL: Rgb<u8> = Rgb([40, 40, 40]);
const SURFACE: Rgb<u8> = Rgb([30, 30, 30]);

/// Geometry of a rendered sheet, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SheetLayout {
    pub radius: i32,
    /// Distance between neighbouring option centres within a group.
    pub option_pitch: i32,
    /// Extra space between the last option of a group and the next group.
    pub group_gap: i32,
    pub row_pitch: i32,
    /// Blank paper around the outermost bubbles.
    pub margin: i32,
    pub groups_per_row: u32,
    pub rows: u32,
}

impl Default for SheetLayout {
    fn default() -> Self {
        Self {
            radius: 12,
            option_pitch: 40,
            group_gap: 80,
            row_pitch: 45,
            margin: 60,
            groups_per_row: 4,
            rows: 25,
        }
    }
}

impl SheetLayout {
    fn group_stride(&self) -> i32 {
        (OPTIONS_PER_QUESTION as i32 - 1) * self.option_pitch + self.group_gap
    }

    pub fn sheet_size(&self) -> (u32, u32) {
        let edge = 2 * (self.margin + self.radius) + 1;
        let width = edge
            + (self.groups_per_row as i32 - 1) * self.group_stride()
            + (OPTIONS_PER_QUESTION as i32 - 1) * self.option_pitch;
        let height = edge + (self.rows as i32 - 1) * self.row_pitch;
        (width as u32, height as u32)
    }

    /// Centre of `option` (0-based) of the 1-based `question`. Questions run
    /// left to right along each printed row.
    pub fn bubble_center(&self, question: u32, option: usize) -> (i32, i32) {
        let index = question.saturating_sub(1);
        let row = (index / self.groups_per_row) as i32;
        let group = (index % self.groups_per_row) as i32;
        let x = self.margin + self.radius + group * self.group_stride() + option as i32 * self.option_pitch;
        let y = self.margin + self.radius + row * self.row_pitch;
        (x, y)
    }

    /// Render the sheet with the given answers pencilled in.
    pub fn render(&self, answers: &AnswerRecord) -> RgbImage {
        let (width, height) = self.sheet_size();
        let mut sheet = RgbImage::from_pixel(width, height, PAPER);
        let questions = (self.groups_per_row * self.rows).min(QUESTION_COUNT as u32);

        for question in 1..=questions {
            for option in 0..OPTIONS_PER_QUESTION {
                draw_hollow_circle_mut(&mut sheet, self.bubble_center(question, option), self.radius, PRINT);
            }
            if let Some(letter) = answers.get(question) {
                let center = self.bubble_center(question, letter.index());
                draw_filled_circle_mut(&mut sheet, center, self.radius, PENCIL);
            }
        }
        sheet
    }
}

/// Surround `sheet` with `border` pixels of dark surface.
pub fn place_on_background(sheet: &RgbImage, border: u32) -> RgbImage {
    let (width, height) = sheet.dimensions();
    let mut photo = RgbImage::from_pixel(width + 2 * border, height + 2 * border, SURFACE);
    image::imageops::replace(&mut photo, sheet, border as i64, border as i64);
    photo
}

/// An answer key set holding one version.
pub fn key_set(version: &str, letters: &[OptionLetter]) -> AnswerKeySet {
    let entries = letters.iter().map(|l| l.as_str().to_owned()).collect();
    AnswerKeySet::new(BTreeMap::from([(version.to_owned(), entries)]))
}

/// A deterministic, varied answer for every question.
pub fn patterned_answers() -> Vec<OptionLetter> {
    (0..QUESTION_COUNT)
        .map(|i| OptionLetter::ALL[(i * 3 + i / 7) % OPTIONS_PER_QUESTION])
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_layout_fits_a_hundred_questions() {
        let layout = SheetLayout::default();
        assert_eq!(layout.sheet_size(), (1025, 1225));
        assert_eq!(layout.bubble_center(1, 0), (72, 72));
        assert_eq!(layout.bubble_center(2, 0), (312, 72));
        assert_eq!(layout.bubble_center(5, 4), (232, 117));
        let (x, y) = layout.bubble_center(100, 4);
        assert_eq!((x + 72, y + 72), (1024, 1224));
    }

    #[test]
    fn filled_answer_is_dark() {
        let layout = SheetLayout::default();
        let mut answers = AnswerRecord::new();
        answers.record(3, Some(OptionLetter::B)).unwrap();
        let sheet = layout.render(&answers);

        let (x, y) = layout.bubble_center(3, 1);
        assert_eq!(*sheet.get_pixel(x as u32, y as u32), PENCIL);
        let (x, y) = layout.bubble_center(3, 0);
        assert_eq!(*sheet.get_pixel(x as u32, y as u32), PAPER);
    }

    #[test]
    fn background_frames_the_sheet() {
        let sheet = RgbImage::from_pixel(10, 10, PAPER);
        let photo = place_on_background(&sheet, 5);
        assert_eq!(photo.dimensions(), (20, 20));
        assert_eq!(*photo.get_pixel(0, 0), SURFACE);
        assert_eq!(*photo.get_pixel(5, 5), PAPER);
    }

    #[test]
    fn patterned_key_is_complete() {
        let keys = key_set("A", &patterned_answers());
        assert_eq!(keys.resolve("A").unwrap().correct_options.len(), QUESTION_COUNT);
    }
}
