//! Issuance against a shared record file.

use std::collections::HashSet;
use std::fs::{self, File};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use fs2::FileExt;
use idstring::{CasSeedStore, IdError, IdFamily, SeedBackend};
use idstring_seedstore::{file_seed_store, FileBackend, SeedRecord, RECORD_VERSION};

fn issuer(path: &std::path::Path) -> (Arc<CasSeedStore<FileBackend>>, IdFamily) {
    let store = Arc::new(file_seed_store(path));
    let family = IdFamily::builder()
        .host("101")
        .seed_store(Arc::clone(&store))
        .build()
        .unwrap();
    (store, family)
}

#[test]
fn test_backend_cas_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let backend = FileBackend::new(dir.path().join("next_id.json"));

    assert_eq!(backend.load().unwrap(), None);
    assert!(backend.compare_and_swap(None, "0101X").unwrap());
    assert!(!backend.compare_and_swap(None, "1101V").unwrap());
    assert!(backend.compare_and_swap(Some("0101X"), "1101V").unwrap());
    assert_eq!(backend.load().unwrap().as_deref(), Some("1101V"));

    let record = backend.read_record().unwrap().unwrap();
    assert_eq!(record.version, RECORD_VERSION);
    assert_eq!(record.swaps, 2);
}

#[test]
fn test_resume_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state").join("next_id.json");

    let issued = {
        let (store, family) = issuer(&path);
        let start = store.resume(&family, "0000").unwrap();
        start.next().unwrap().next().unwrap()
    };

    // A fresh process picks up where the last one stopped.
    let (store, family) = issuer(&path);
    let resumed = store.resume(&family, "0000").unwrap();
    assert_eq!(resumed, issued);
    assert_eq!(resumed.seed(), "0002");
    assert_eq!(resumed.next().unwrap().seed(), "0003");
}

#[test]
fn test_two_issuers_skip_each_others_values() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("next_id.json");

    let (store_a, family_a) = issuer(&path);
    let (store_b, family_b) = issuer(&path);

    let a = store_a.resume(&family_a, "0").unwrap();
    let b = store_b.resume(&family_b, "0").unwrap();

    let a1 = a.next().unwrap();
    let b1 = b.next().unwrap();
    assert_ne!(a1, b1);
    assert_eq!(a1.seed(), "1");
    assert_eq!(b1.seed(), "2");
    assert_eq!(store_a.backend().load().unwrap(), Some(b1.to_string()));
}

#[test]
fn test_threads_issue_unique_values() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("next_id.json");

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let path = path.clone();
            thread::spawn(move || {
                let (store, family) = issuer(&path);
                let mut current = store.resume(&family, "0").unwrap();
                let mut issued = Vec::new();
                for _ in 0..10 {
                    current = current.next().unwrap();
                    issued.push(current.to_string());
                }
                issued
            })
        })
        .collect();

    let all: Vec<String> = handles
        .into_iter()
        .flat_map(|h| h.join().unwrap())
        .collect();
    let unique: HashSet<_> = all.iter().collect();
    assert_eq!(all.len(), 40);
    assert_eq!(unique.len(), 40, "duplicate identifiers issued: {all:?}");

    let record: SeedRecord =
        serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(record.swaps, 41);
}

#[test]
fn test_corrupt_record_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("next_id.json");
    fs::write(&path, "not json").unwrap();

    let backend = FileBackend::new(&path);
    let err = backend.load().unwrap_err();
    assert!(matches!(err, IdError::Store(_)));
}

#[test]
fn test_unknown_version_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("next_id.json");
    fs::write(&path, r#"{"version":7,"last_id":"00"}"#).unwrap();

    let err = FileBackend::new(&path).load().unwrap_err();
    assert!(err.to_string().contains("version 7"));
}

#[test]
fn test_held_lock_times_out() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("next_id.json");
    let holder = File::create(dir.path().join("next_id.lock")).unwrap();
    holder.lock_exclusive().unwrap();

    let backend = FileBackend::new(&path).with_lock_retry(3, Duration::from_millis(1));
    let err = backend.compare_and_swap(None, "00").unwrap_err();
    assert!(err.to_string().contains("timed out"));

    FileExt::unlock(&holder).unwrap();
    assert!(backend.compare_and_swap(None, "00").unwrap());
}

#[test]
fn test_leftover_lock_file_does_not_block() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("next_id.json");
    let (store, family) = issuer(&path);
    let first = store.resume(&family, "0").unwrap().next().unwrap();

    // An issuer killed mid-swap leaves the file behind but not the lock.
    let lock_path = dir.path().join("next_id.lock");
    fs::write(&lock_path, "").unwrap();
    assert!(lock_path.exists());

    let (store, family) = issuer(&path);
    let resumed = store.resume(&family, "0").unwrap();
    assert_eq!(resumed, first);
    assert_eq!(resumed.next().unwrap().seed(), "2");
}
