use std::fs;

use scrape_core::{merge, AccumulatedResult, PageResponse, Phase, ProceedPaths, ScrapeView};
use scrape_engine::{ensure_output_dir, write_snapshot, AtomicFileWriter};
use serde_json::{json, Value};
use tempfile::TempDir;

fn settled_view() -> ScrapeView {
    let page = PageResponse::new(
        json!({"funds": [{"id": "0x1"}, {"id": "0x2"}], "network": "main"})
            .as_object()
            .cloned()
            .unwrap(),
    );
    let data = merge(
        AccumulatedResult::new(),
        &page,
        &ProceedPaths::resolve(["funds"]).unwrap(),
    )
    .unwrap();
    ScrapeView {
        generation: 3,
        phase: Phase::Complete,
        data,
        loading: false,
        error: None,
        requests: 1,
    }
}

#[test]
fn snapshot_contains_status_and_data() {
    let temp = TempDir::new().unwrap();
    let path = write_snapshot(
        temp.path(),
        "funds.json",
        &settled_view(),
        "2024-01-01T00:00:00Z",
    )
    .unwrap();

    let written: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(written["fetched_utc"], json!("2024-01-01T00:00:00Z"));
    assert_eq!(written["generation"], json!(3));
    assert_eq!(written["phase"], json!("Complete"));
    assert_eq!(written["loading"], json!(false));
    assert_eq!(written["error"], Value::Null);
    assert_eq!(written["data"]["funds"][1]["id"], json!("0x2"));
    assert_eq!(written["data"]["network"], json!("main"));
}

#[test]
fn snapshot_creates_missing_dir_and_replaces_previous() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("out");

    let first = write_snapshot(&dir, "funds.json", &settled_view(), "a").unwrap();
    let second = write_snapshot(&dir, "funds.json", &ScrapeView::default(), "b").unwrap();

    assert_eq!(first, second);
    let written: Value = serde_json::from_str(&fs::read_to_string(&second).unwrap()).unwrap();
    assert_eq!(written["fetched_utc"], json!("b"));
    assert_eq!(written["data"], json!({}));
}

#[test]
fn output_dir_that_is_a_file_is_rejected() {
    let temp = TempDir::new().unwrap();
    let file_path = temp.path().join("not_a_dir");
    fs::write(&file_path, "x").unwrap();

    assert!(ensure_output_dir(&file_path).is_err());
    let result = AtomicFileWriter::new(file_path.clone()).write("funds.json", "{}");
    assert!(result.is_err());
    assert!(!file_path.with_file_name("funds.json").exists());
}
