// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// On-disk behaviour of the result store.

use markwerk_core::error::MarkwerkError;
use markwerk_core::{AnswerRecord, EvaluationResult, OptionLetter, ResultSink, SheetProvenance};
use markwerk_store::{ResultStore, hash_bytes};

fn result_for(student: &str) -> EvaluationResult {
    let mut answers = AnswerRecord::new();
    answers.record(100, Some(OptionLetter::E)).unwrap();
    EvaluationResult {
        student_id: Some(student.into()),
        version: "B".into(),
        total: 1,
        section_scores: (1..=5).map(|s| (format!("subject_{s}"), u32::from(s == 5))).collect(),
        answers,
        overlay_image_path: format!("/overlays/{student}_overlay.png"),
    }
}

fn provenance(sheet: &[u8]) -> SheetProvenance {
    SheetProvenance {
        sheet_path: "/uploads/scan.pdf".into(),
        sheet_hash: hash_bytes(sheet),
        actor: "system".into(),
    }
}

#[test]
fn results_survive_reopening() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("results.db");

    let id = {
        let mut store = ResultStore::open(&path).unwrap();
        let sink: &mut dyn ResultSink = &mut store;
        sink.store(&result_for("s-100"), &provenance(b"scan")).unwrap()
    };

    let mut store = ResultStore::open(&path).unwrap();
    let stored = store.get(id).unwrap();
    assert_eq!(stored.version, "B");
    assert_eq!(stored.answers.get(100), Some(OptionLetter::E));
    assert_eq!(stored.section_scores["subject_5"], 1);

    store.mark_reviewed(id, Some("head-of-year"), None).unwrap();
    drop(store);

    let store = ResultStore::open(&path).unwrap();
    assert!(store.get(id).unwrap().reviewed);
    let actions: Vec<String> = store
        .audit_entries(id)
        .unwrap()
        .into_iter()
        .map(|e| e.action)
        .collect();
    assert_eq!(actions, vec!["marked_reviewed", "evaluated"]);
}

#[test]
fn stored_result_serializes_camel_case() {
    let mut store = ResultStore::open_in_memory().unwrap();
    let id = store.insert(&result_for("s-1"), &provenance(b"x")).unwrap();

    let json = serde_json::to_value(store.get(id).unwrap()).unwrap();
    assert_eq!(json["studentId"], "s-1");
    assert_eq!(json["totalScore"], 1);
    assert_eq!(json["answers"]["100"], "E");
    assert_eq!(json["answers"]["1"], serde_json::Value::Null);
    assert_eq!(json["reviewed"], false);
}

#[test]
fn tampered_sheet_is_detected_after_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("results.db");
    let id = ResultStore::open(&path)
        .unwrap()
        .insert(&result_for("s-2"), &provenance(b"%PDF original"))
        .unwrap();

    let store = ResultStore::open(&path).unwrap();
    match store.verify_sheet(id, b"%PDF edited") {
        Err(MarkwerkError::IntegrityMismatch { expected, .. }) => {
            assert_eq!(expected, hash_bytes(b"%PDF original"));
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn recent_audit_spans_results() {
    let mut store = ResultStore::open_in_memory().unwrap();
    let first = store.insert(&result_for("a"), &provenance(b"1")).unwrap();
    let second = store.insert(&result_for("b"), &provenance(b"2")).unwrap();
    store.mark_reviewed(first, None, Some("fine")).unwrap();

    let recent = store.recent_audit_entries(10).unwrap();
    assert_eq!(recent.len(), 3);
    assert_eq!(recent[0].result_id, first);
    assert_eq!(recent[1].result_id, second);
    assert_eq!(store.audit_count().unwrap(), 3);
}
