use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use super::{GatherOptions, GatherReport, TaskError, gather};

// Tracks how many tasks run at the same time
#[derive(Default)]
struct ConcurrencyGauge {
    running: AtomicUsize,
    peak: AtomicUsize,
}

impl ConcurrencyGauge {
    async fn run(&self, millis: u64) {
        let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(millis)).await;
        self.running.fetch_sub(1, Ordering::SeqCst);
    }

    fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[tokio::test(start_paused = true)]
async fn test_results_keep_input_order() {
    // Later tasks finish first
    let delays = [50u64, 40, 30, 20, 10];
    let tasks: Vec<_> = delays
        .iter()
        .enumerate()
        .map(|(i, ms)| async move {
            tokio::time::sleep(Duration::from_millis(*ms)).await;
            Ok::<usize, String>(i)
        })
        .collect();

    let results = gather(tasks, &GatherOptions::concurrent(Duration::from_secs(1), None)).await;
    let values: Vec<usize> = results.into_iter().map(|r| r.unwrap()).collect();
    assert_eq!(values, vec![0, 1, 2, 3, 4]);
}

#[tokio::test(start_paused = true)]
async fn test_failures_are_routed_by_index() {
    let failing = [1usize, 4, 5];
    let tasks: Vec<_> = (0..7usize)
        .map(|i| async move {
            if failing.contains(&i) {
                Err(format!("task {} failed", i))
            } else {
                Ok(i * 10)
            }
        })
        .collect();

    let results = gather(tasks, &GatherOptions::concurrent(Duration::from_secs(1), Some(3))).await;
    assert_eq!(results.len(), 7);

    let report = GatherReport::partition(results);
    assert_eq!(report.failure_indices(), vec![1, 4, 5]);
    assert_eq!(report.success_indices(), vec![0, 2, 3, 6]);
    assert!(!report.is_success());
    match &report.failures[0].1 {
        TaskError::Failed(msg) => assert_eq!(msg, "task 1 failed"),
        other => panic!("unexpected failure: {other}"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_timed_out_task_is_reported_not_awaited() {
    let tasks: Vec<_> = [10u64, 10_000, 10]
        .into_iter()
        .map(|ms| async move {
            tokio::time::sleep(Duration::from_millis(ms)).await;
            Ok::<u64, String>(ms)
        })
        .collect();

    let results = gather(tasks, &GatherOptions::concurrent(Duration::from_secs(1), None)).await;
    assert!(matches!(results[0], Ok(10)));
    assert!(matches!(results[1], Err(TaskError::TimedOut(t)) if t == Duration::from_secs(1)));
    assert!(results[1].as_ref().unwrap_err().is_timeout());
    assert!(matches!(results[2], Ok(10)));
}

#[tokio::test(start_paused = true)]
async fn test_sequential_mode_runs_one_at_a_time() {
    let gauge = Arc::new(ConcurrencyGauge::default());
    let tasks: Vec<_> = (0..4)
        .map(|i| {
            let gauge = Arc::clone(&gauge);
            async move {
                gauge.run(20).await;
                Ok::<i32, String>(i)
            }
        })
        .collect();

    let results = gather(tasks, &GatherOptions::sequential(Duration::from_secs(1))).await;
    assert_eq!(results.len(), 4);
    assert_eq!(gauge.peak(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_concurrency_is_bounded() {
    let gauge = Arc::new(ConcurrencyGauge::default());
    let tasks: Vec<_> = (0..10)
        .map(|i| {
            let gauge = Arc::clone(&gauge);
            async move {
                gauge.run(20).await;
                Ok::<i32, String>(i)
            }
        })
        .collect();

    gather(tasks, &GatherOptions::concurrent(Duration::from_secs(1), Some(3))).await;
    assert_eq!(gauge.peak(), 3);
}

#[tokio::test]
async fn test_empty_batch() {
    let tasks: Vec<std::future::Ready<Result<(), String>>> = Vec::new();
    let results = gather(tasks, &GatherOptions::concurrent(Duration::from_secs(1), None)).await;
    assert!(results.is_empty());
    assert!(GatherReport::partition(results).is_success());
}
