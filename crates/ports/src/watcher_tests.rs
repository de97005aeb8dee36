// SPDX-License-Identifier: MIT

#![allow(clippy::unwrap_used)]

use super::fake::FakeFilesystemWatcher;
use super::*;

#[tokio::test]
async fn injected_event_is_delivered_to_the_registered_channel() {
    let watcher = FakeFilesystemWatcher::new();
    let (tx, mut rx) = mpsc::channel(8);
    watcher.watch(Path::new("/w/a"), true, tx).unwrap();

    watcher.inject(Path::new("/w/a/B.class"), FsEventKind::Modified);

    let event = rx.recv().await.unwrap();
    assert_eq!(event.path, Path::new("/w/a/B.class"));
    assert_eq!(event.kind, FsEventKind::Modified);
}

#[tokio::test]
async fn unwatch_stops_future_deliveries() {
    let watcher = FakeFilesystemWatcher::new();
    let (tx, mut rx) = mpsc::channel(8);
    let id = watcher.watch(Path::new("/w/a"), true, tx).unwrap();
    watcher.unwatch(id);

    watcher.inject(Path::new("/w/a/B.class"), FsEventKind::Modified);

    // No registration remains, so nothing should arrive.
    assert!(rx.try_recv().is_err());
    assert_eq!(watcher.active_watch_count(), 0);
}

#[test]
fn real_watcher_rejects_nonexistent_directories() {
    let watcher = NotifyFsWatcher::new();
    let (tx, _rx) = mpsc::channel(8);
    let err = watcher
        .watch(Path::new("/does/not/exist/anywhere"), true, tx)
        .unwrap_err();
    assert!(matches!(err, WatchError::InvalidPath(_)));
}