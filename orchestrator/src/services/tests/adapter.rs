//! Tests for RemoteCallAdapter against real execution units

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use shared::{FailureKind, MemoryStagingStore, ShardOutcome, StagingStore};
use worker::{TransformError, TransformInput, Transformer};

use super::common::{input, session, with_timeout, ReverseTransformer};
use crate::core::{SingleFlight, WorkPartitioner};
use crate::services::RemoteCallAdapter;

#[tokio::test]
async fn test_every_file_is_staged_and_reported_once() {
    let store = Arc::new(MemoryStagingStore::new());
    let adapter = RemoteCallAdapter::new(store.clone(), ReverseTransformer);
    let files = (0..6).map(|i| input(&format!("{i}.jpg"), &[i, i + 1])).collect();
    let shards = WorkPartitioner::new(4).partition(files);

    let mut keys = Vec::new();
    let reports = with_timeout(adapter.run_shards(shards, session(), |key| keys.push(key)))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(reports.len(), 4);
    assert!(reports.iter().all(|report| report.outcome.is_success()));
    let processed: usize = reports.iter().map(|report| report.outcome.processed()).sum();
    assert_eq!(processed, 6);

    assert_eq!(keys.len(), 6);
    assert_eq!(keys.iter().collect::<HashSet<_>>().len(), 6);
    assert_eq!(store.len().await.unwrap(), 6);
}

#[tokio::test]
async fn test_reports_carry_unit_and_shard() {
    let store = Arc::new(MemoryStagingStore::new());
    let adapter = RemoteCallAdapter::new(store, ReverseTransformer);
    let shards = WorkPartitioner::new(2).partition(vec![input("a.jpg", b"a"), input("b.jpg", b"b")]);

    let reports = with_timeout(adapter.run_shards(shards, session(), |_| {})).await.unwrap().unwrap();

    let mut pairs: Vec<(u32, usize)> = reports.iter().map(|report| (report.unit, report.shard)).collect();
    pairs.sort_unstable();
    assert_eq!(pairs, vec![(1, 0), (2, 1)]);
}

#[tokio::test]
async fn test_failing_shard_does_not_stop_the_others() {
    let store = Arc::new(MemoryStagingStore::new());
    let adapter = RemoteCallAdapter::new(store.clone(), ReverseTransformer);

    // Shard 0 gets files 0, 2, 4; file 2 is corrupt so file 4 is never processed
    let files = vec![
        input("0.jpg", b"a"),
        input("1.jpg", b"b"),
        input("2.jpg", b"corrupt"),
        input("3.jpg", b"d"),
        input("4.jpg", b"e"),
        input("5.jpg", b"f"),
    ];
    let shards = WorkPartitioner::new(2).partition(files);

    let mut notified = 0;
    let reports = with_timeout(adapter.run_shards(shards, session(), |_| notified += 1))
        .await
        .unwrap()
        .unwrap();

    let failed = reports.iter().find(|report| report.shard == 0).unwrap();
    match &failed.outcome {
        ShardOutcome::Failed { processed, failure } => {
            assert_eq!(*processed, 1);
            assert_eq!(failure.kind, FailureKind::Transform);
            assert_eq!(failure.file.as_deref(), Some("2.jpg"));
        }
        other => panic!("expected shard 0 to fail, got {other:?}"),
    }

    let healthy = reports.iter().find(|report| report.shard == 1).unwrap();
    assert_eq!(healthy.outcome, ShardOutcome::Completed { processed: 3 });

    assert_eq!(notified, 4);
    assert_eq!(store.len().await.unwrap(), 4);
}

#[tokio::test]
async fn test_no_shards_spawns_nothing() {
    let adapter = RemoteCallAdapter::new(Arc::new(MemoryStagingStore::new()), ReverseTransformer);
    let reports = adapter.run_shards(Vec::new(), session(), |_| panic!("no callbacks expected")).await.unwrap();
    assert!(reports.is_empty());
}

/// Transformer that holds its unit thread for a while on every file
#[derive(Clone)]
struct SlowTransformer(Duration);

impl Transformer for SlowTransformer {
    type Engine = ();

    fn initialize(&self) -> Result<(), TransformError> {
        Ok(())
    }

    fn transform(&self, _: &(), input: &TransformInput<'_>) -> Result<Vec<u8>, TransformError> {
        std::thread::sleep(self.0);
        Ok(input.content.to_vec())
    }
}

#[tokio::test]
async fn test_dropped_run_stages_nothing_and_holds_the_session_until_units_exit() {
    let store = Arc::new(MemoryStagingStore::new());
    let adapter = RemoteCallAdapter::new(store.clone(), SlowTransformer(Duration::from_millis(150)));
    let files = (0..4).map(|i| input(&format!("{i}.jpg"), &[i])).collect();
    let shards = WorkPartitioner::new(2).partition(files);
    let flight = SingleFlight::new();

    let run = adapter.run_shards(shards, flight.acquire().unwrap(), |_| {});
    assert!(tokio::time::timeout(Duration::from_millis(20), run).await.is_err());

    with_timeout(async {
        while flight.is_active() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap();

    // Every unit has exited, so nothing can land after this point
    assert_eq!(store.len().await.unwrap(), 0);
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(store.len().await.unwrap(), 0);
}
