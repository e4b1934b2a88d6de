use std::fs;

use bytes::Bytes;
use skiptable_c::Driver;
use skiptable_kv::{Config, LoadReport, MemTable, SnapshotError};
use tempfile::TempDir;

fn config(dir: &TempDir) -> Config {
    Config::new()
        .max_level(6)
        .snapshot_path(dir.path().join("store").join("dumpFile"))
}

#[test]
fn dump_and_reload_match() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(&dir);

    let table = MemTable::<String, String>::with_config(&config).unwrap();
    for i in (0..200).rev() {
        let _ = table.insert(format!("k{:04}", i), format!("v:{}", i * 3));
    }
    assert_eq!(table.dump(&config.snapshot_path).unwrap(), 200);

    let fresh = MemTable::<String, String>::with_config(&config).unwrap();
    let report = fresh.load(&config.snapshot_path).unwrap();
    assert_eq!(report, LoadReport { loaded: 200, skipped: 0 });
    assert_eq!(table.scan().collect::<Vec<_>>(), fresh.scan().collect::<Vec<_>>());
}

#[test]
fn load_replays_last_write_wins() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dumpFile");
    fs::write(&path, "a:1\nb:2\na:3\nnot a record\n\nc:x:y\n").unwrap();

    let table = MemTable::<String, String>::new(4);
    let report = table.load(&path).unwrap();
    assert_eq!(report, LoadReport { loaded: 4, skipped: 2 });
    assert_eq!(table.size(), 3);
    assert_eq!(table.search("a").as_deref(), Some("3"));
    assert_eq!(table.search("c").as_deref(), Some("x:y"));
}

#[test]
fn byte_tables_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bytes");

    let table = MemTable::<Bytes, Bytes>::new(5);
    let _ = table.insert(Bytes::from_static(b"\x01key"), Bytes::from_static(b"\xffvalue"));
    let _ = table.insert(Bytes::from_static(b"plain"), Bytes::from_static(b"text"));
    table.dump(&path).unwrap();

    let fresh = MemTable::<Bytes, Bytes>::new(5);
    fresh.load(&path).unwrap();
    assert_eq!(fresh.scan().collect::<Vec<_>>(), table.scan().collect::<Vec<_>>());
}

#[test]
fn missing_snapshot_surfaces_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let table = MemTable::<String, String>::new(4);
    let err = table.load(dir.path().join("missing")).unwrap_err();
    assert!(matches!(err, SnapshotError::Io { .. }));
}

#[test]
fn driver_persists_between_opens() {
    let dir = tempfile::tempdir().unwrap();
    let mut out = Vec::new();

    let driver = Driver::open(config(&dir)).unwrap();
    assert!(driver.table().is_empty());
    let _ = driver.put("alpha", "1", &mut out).unwrap();
    let _ = driver.put("beta", "2", &mut out).unwrap();
    driver.persist().unwrap();

    let driver = Driver::open(config(&dir)).unwrap();
    assert_eq!(driver.get("alpha", &mut out).unwrap().as_deref(), Some("1"));
    let _ = driver.del("alpha", &mut out).unwrap();
    driver.persist().unwrap();

    let driver = Driver::open(config(&dir)).unwrap();
    assert_eq!(driver.table().size(), 1);

    let mut shown = Vec::new();
    driver.show(&mut shown).unwrap();
    let shown = String::from_utf8(shown).unwrap();
    assert!(shown.contains("[Level 0] beta:2; "));
    assert!(shown.ends_with("size: 1\n"));
}
