// tests/watermark_store.rs
use std::fs;

use chrono::{TimeZone, Utc};
use jobfeed_relay::{FileWatermarkStore, MemoryWatermarkStore, Watermark, WatermarkStore};

#[tokio::test]
async fn missing_dir_and_file_mean_no_watermark() {
    let tmp = tempfile::tempdir().unwrap();
    let store = FileWatermarkStore::new(tmp.path().join("not-created-yet"));
    assert_eq!(store.load("rss").await, Watermark::default());
}

#[tokio::test]
async fn save_writes_one_json_record_per_source() {
    let tmp = tempfile::tempdir().unwrap();
    let store = FileWatermarkStore::new(tmp.path().join("state"));
    let ts = Utc.with_ymd_and_hms(2024, 1, 2, 10, 0, 0).unwrap();

    store.save("headhunter", ts).await.unwrap();

    let path = tmp.path().join("state").join("last_published_headhunter.json");
    assert_eq!(store.path_for("headhunter"), path);
    let body: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(body["last_published_date"], "2024-01-02T10:00:00+00:00");

    // no temp file left behind
    let names: Vec<_> = fs::read_dir(tmp.path().join("state"))
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["last_published_headhunter.json"]);

    assert_eq!(store.load("headhunter").await, Watermark::at(ts));
    assert_eq!(store.load("hiring_cafe").await, Watermark::default());
}

#[tokio::test]
async fn corrupt_or_foreign_records_start_from_scratch() {
    let tmp = tempfile::tempdir().unwrap();
    let store = FileWatermarkStore::new(tmp.path());

    fs::write(store.path_for("rss"), "{not json").unwrap();
    assert_eq!(store.load("rss").await, Watermark::default());

    fs::write(store.path_for("remoteok"), r#"{"last_published_date": "yesterday-ish"}"#).unwrap();
    assert_eq!(store.load("remoteok").await, Watermark::default());

    fs::write(store.path_for("working_nomads"), r#"{"something_else": 1}"#).unwrap();
    assert_eq!(store.load("working_nomads").await, Watermark::default());

    // a corrupt record is replaced on the next save
    let ts = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
    store.save("rss", ts).await.unwrap();
    assert_eq!(store.load("rss").await, Watermark::at(ts));
}

#[tokio::test]
async fn records_written_with_offsets_load_as_utc() {
    let tmp = tempfile::tempdir().unwrap();
    let store = FileWatermarkStore::new(tmp.path());
    fs::write(
        store.path_for("headhunter"),
        r#"{"last_published_date": "2024-01-02T13:00:00+03:00"}"#,
    )
    .unwrap();

    let wm = store.load("headhunter").await;
    assert_eq!(
        wm.last_published_at(),
        Some(Utc.with_ymd_and_hms(2024, 1, 2, 10, 0, 0).unwrap())
    );
}

#[tokio::test]
async fn unwritable_state_dir_is_a_persistence_error() {
    let tmp = tempfile::tempdir().unwrap();
    let blocker = tmp.path().join("state");
    fs::write(&blocker, "a file, not a directory").unwrap();

    let store = FileWatermarkStore::new(&blocker);
    let ts = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
    let err = store.save("rss", ts).await.unwrap_err();
    assert_eq!(err.kind(), "persistence");
}

#[tokio::test]
async fn failed_rename_leaves_no_temp_file() {
    let tmp = tempfile::tempdir().unwrap();
    let store = FileWatermarkStore::new(tmp.path());
    // a non-empty directory where the record should go
    let target = store.path_for("rss");
    fs::create_dir_all(&target).unwrap();
    fs::write(target.join("keep"), "x").unwrap();

    let ts = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
    let err = store.save("rss", ts).await.unwrap_err();
    assert_eq!(err.kind(), "persistence");
    assert!(!target.with_extension("json.tmp").exists());
    assert!(target.is_dir());
}

#[tokio::test]
async fn dry_run_snapshot_does_not_touch_files() {
    let tmp = tempfile::tempdir().unwrap();
    let files = FileWatermarkStore::new(tmp.path());
    let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    files.save("rss", t0).await.unwrap();

    let snap = MemoryWatermarkStore::snapshot_of(&files, &["rss", "remoteok"]).await;
    assert_eq!(snap.get("rss"), Some(t0));
    assert_eq!(snap.get("remoteok"), None);

    let t1 = Utc.with_ymd_and_hms(2024, 1, 5, 0, 0, 0).unwrap();
    snap.save("rss", t1).await.unwrap();
    assert_eq!(files.load("rss").await, Watermark::at(t0));
}
