use core_logic::{BatchError, BatchExecutor, BatchMode};
use futures::future::Ready;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

#[derive(Default)]
struct Probe {
    started: AtomicUsize,
    finished: AtomicUsize,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl Probe {
    fn enter(&self) -> usize {
        self.started.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        self.finished.load(Ordering::SeqCst)
    }

    fn leave(&self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.finished.fetch_add(1, Ordering::SeqCst);
    }
}

#[tokio::test]
async fn test_results_keep_input_order_despite_latency() {
    let executor = BatchExecutor::new(3);
    let n = 10u64;

    // Later operations finish first inside every window.
    let ops: Vec<_> = (0..n)
        .map(|i| {
            move || async move {
                sleep(Duration::from_millis((n - i) * 3)).await;
                Ok::<_, String>(i)
            }
        })
        .collect();

    let results = executor.run(ops).await.unwrap();
    assert_eq!(results, (0..n).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_pipelined_results_keep_input_order() {
    let executor = BatchExecutor::new(3).with_mode(BatchMode::Pipelined);
    let n = 10u64;

    let ops: Vec<_> = (0..n)
        .map(|i| {
            move || async move {
                sleep(Duration::from_millis((n - i) * 3)).await;
                Ok::<_, String>(i)
            }
        })
        .collect();

    let results = executor.run(ops).await.unwrap();
    assert_eq!(results, (0..n).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_window_covering_all_starts_everything_before_any_finish() {
    let executor = BatchExecutor::new(8);
    let probe = Arc::new(Probe::default());
    let seen_at_finish = Arc::new(Mutex::new(Vec::new()));

    let ops: Vec<_> = (0..5)
        .map(|i| {
            let probe = probe.clone();
            let seen_at_finish = seen_at_finish.clone();
            move || async move {
                probe.enter();
                sleep(Duration::from_millis(5 + i * 2)).await;
                seen_at_finish
                    .lock()
                    .unwrap()
                    .push(probe.started.load(Ordering::SeqCst));
                probe.leave();
                Ok::<_, String>(i)
            }
        })
        .collect();

    executor.run(ops).await.unwrap();

    let seen = seen_at_finish.lock().unwrap();
    assert_eq!(seen.len(), 5);
    assert!(seen.iter().all(|&started| started == 5));
    assert_eq!(probe.peak.load(Ordering::SeqCst), 5);
}

#[tokio::test]
async fn test_seven_operations_in_windows_of_five() {
    let executor = BatchExecutor::new(5);
    let probe = Arc::new(Probe::default());
    let finished_at_start = Arc::new(Mutex::new(vec![usize::MAX; 7]));

    let ops: Vec<_> = (0..7usize)
        .map(|i| {
            let probe = probe.clone();
            let finished_at_start = finished_at_start.clone();
            move || async move {
                let finished = probe.enter();
                finished_at_start.lock().unwrap()[i] = finished;
                sleep(Duration::from_millis(5)).await;
                probe.leave();
                Ok::<_, String>(i)
            }
        })
        .collect();

    let results = executor.run(ops).await.unwrap();

    assert_eq!(results, vec![0, 1, 2, 3, 4, 5, 6]);
    assert_eq!(probe.started.load(Ordering::SeqCst), 7);
    assert_eq!(probe.peak.load(Ordering::SeqCst), 5);

    // The second window only starts once the whole first window is done.
    let finished_at_start = finished_at_start.lock().unwrap();
    assert_eq!(&finished_at_start[..5], &[0, 0, 0, 0, 0]);
    assert_eq!(&finished_at_start[5..], &[5, 5]);
}

#[tokio::test]
async fn test_failure_aborts_later_windows() {
    let executor = BatchExecutor::new(3);
    let probe = Arc::new(Probe::default());
    let failing = 4usize;

    let ops: Vec<_> = (0..9usize)
        .map(|i| {
            let probe = probe.clone();
            move || async move {
                probe.enter();
                sleep(Duration::from_millis(if i == 5 { 20 } else { 2 })).await;
                probe.leave();
                if i == failing {
                    Err(format!("operation {} exploded", i))
                } else {
                    Ok(i)
                }
            }
        })
        .collect();

    let err = executor.run(ops).await.unwrap_err();

    match err {
        BatchError::Operation { index, error } => {
            assert_eq!(index, failing);
            assert_eq!(error, "operation 4 exploded");
        }
        other => panic!("unexpected error: {}", other),
    }

    // Windows [0..3) and [3..6) ran to completion, nothing from [6..9).
    assert_eq!(probe.started.load(Ordering::SeqCst), 6);
    assert_eq!(probe.finished.load(Ordering::SeqCst), 6);
}

#[tokio::test]
async fn test_first_failure_by_index_is_reported() {
    let executor = BatchExecutor::new(4);

    let ops: Vec<_> = (0..4u64)
        .map(|i| {
            move || async move {
                // Index 3 fails first in time, index 1 fails first in order.
                sleep(Duration::from_millis(if i == 1 { 15 } else { 1 })).await;
                if i == 1 || i == 3 {
                    Err(i)
                } else {
                    Ok(i)
                }
            }
        })
        .collect();

    let err = executor.run(ops).await.unwrap_err();
    assert_eq!(err.index(), Some(1));
}

#[tokio::test]
async fn test_empty_batch_starts_nothing() {
    let executor = BatchExecutor::new(5);
    let ops: Vec<Box<dyn FnOnce() -> Ready<Result<u32, String>>>> = Vec::new();

    let results = executor.run(ops).await.unwrap();
    assert!(results.is_empty());
}

#[tokio::test]
async fn test_pipelined_admits_next_operation_early() {
    let executor = BatchExecutor::new(2).with_mode(BatchMode::Pipelined);
    let probe = Arc::new(Probe::default());
    let finished_at_start = Arc::new(Mutex::new(vec![usize::MAX; 3]));
    let latencies = [60u64, 5, 5];

    let ops: Vec<_> = (0..3usize)
        .map(|i| {
            let probe = probe.clone();
            let finished_at_start = finished_at_start.clone();
            move || async move {
                let finished = probe.enter();
                finished_at_start.lock().unwrap()[i] = finished;
                sleep(Duration::from_millis(latencies[i])).await;
                probe.leave();
                Ok::<_, String>(i)
            }
        })
        .collect();

    let results = executor.run(ops).await.unwrap();

    assert_eq!(results, vec![0, 1, 2]);
    assert!(probe.peak.load(Ordering::SeqCst) <= 2);
    // Operation 2 starts while operation 0 is still running.
    assert_eq!(finished_at_start.lock().unwrap()[2], 1);
}

#[tokio::test]
async fn test_operation_timeout() {
    let executor = BatchExecutor::new(3).with_op_timeout(Some(Duration::from_millis(20)));

    let ops: Vec<_> = (0..3u64)
        .map(|i| {
            move || async move {
                sleep(Duration::from_millis(if i == 1 { 500 } else { 1 })).await;
                Ok::<_, String>(i)
            }
        })
        .collect();

    match executor.run(ops).await {
        Err(BatchError::TimedOut { index, after }) => {
            assert_eq!(index, 1);
            assert_eq!(after, Duration::from_millis(20));
        }
        other => panic!("expected timeout, got {:?}", other.map(|_| ())),
    }
}

#[tokio::test]
async fn test_cancelled_executor_starts_nothing() {
    let token = CancellationToken::new();
    let executor = BatchExecutor::new(2).with_cancellation(token.clone());
    let probe = Arc::new(Probe::default());
    token.cancel();

    let ops: Vec<_> = (0..4u64)
        .map(|i| {
            let probe = probe.clone();
            move || async move {
                probe.enter();
                probe.leave();
                Ok::<_, String>(i)
            }
        })
        .collect();

    match executor.run(ops).await {
        Err(BatchError::Cancelled { started }) => assert_eq!(started, 0),
        other => panic!("expected cancellation, got {:?}", other.map(|_| ())),
    }
    assert_eq!(probe.started.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_cancellation_between_windows() {
    let token = CancellationToken::new();
    let executor = BatchExecutor::new(2).with_cancellation(token.clone());
    let probe = Arc::new(Probe::default());

    let ops: Vec<_> = (0..6usize)
        .map(|i| {
            let probe = probe.clone();
            let token = token.clone();
            move || async move {
                probe.enter();
                if i == 1 {
                    token.cancel();
                }
                probe.leave();
                Ok::<_, String>(i)
            }
        })
        .collect();

    match executor.run(ops).await {
        Err(BatchError::Cancelled { started }) => assert_eq!(started, 2),
        other => panic!("expected cancellation, got {:?}", other.map(|_| ())),
    }
    assert_eq!(probe.started.load(Ordering::SeqCst), 2);
}
