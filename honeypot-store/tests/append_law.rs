//! N sequential appends produce exactly N independently parseable lines, in
//! call order.

use honeypot_core::LogEntry;
use honeypot_store::{FileStore, VisitStore};
use std::sync::Arc;

#[tokio::test]
async fn sequential_appends_preserve_count_and_order() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ip_logs.txt");
    let store = FileStore::new(&path);

    for i in 0..25 {
        let url = Some(format!("/page/{i}"));
        let entry = LogEntry::capture(format!("10.0.0.{i}"), None, None, url);
        store.append(&entry).await.unwrap();
    }

    let content = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 25);
    for (i, line) in lines.iter().enumerate() {
        let parsed: LogEntry = serde_json::from_str(line).unwrap();
        assert_eq!(parsed.ip, format!("10.0.0.{i}"));
        assert_eq!(parsed.url, format!("/page/{i}"));
    }
}

#[tokio::test]
async fn concurrent_appends_do_not_corrupt_lines() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ip_logs.txt");
    let store: Arc<dyn VisitStore> = Arc::new(FileStore::new(&path));

    let mut handles = Vec::new();
    for i in 0..50 {
        let store = Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            let entry = LogEntry::capture(format!("192.0.2.{i}"), None, None, None);
            store.append(&entry).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let content = std::fs::read_to_string(&path).unwrap();
    let mut ips: Vec<String> = content
        .lines()
        .map(|line| serde_json::from_str::<LogEntry>(line).unwrap().ip)
        .collect();
    ips.sort();
    let mut expected: Vec<String> = (0..50).map(|i| format!("192.0.2.{i}")).collect();
    expected.sort();
    assert_eq!(ips, expected);
}
