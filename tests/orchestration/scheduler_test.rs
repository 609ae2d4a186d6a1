//! Scheduler behavior on hand-built graphs.

use push_extension_core::config::SchedulerConfig;
use push_extension_core::orchestration::{operation_fn, GraphBuilder, TaskScheduler};
use push_extension_core::state_machine::{OperationOutcome, OperationState};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn scheduler(max_concurrency: usize) -> TaskScheduler {
    TaskScheduler::new(&SchedulerConfig { max_concurrency })
}

#[tokio::test]
async fn test_chain_longer_than_pool_completes_in_order() {
    let ids: Vec<String> = (0..10).map(|i| format!("link_{i}")).collect();
    let mut builder = GraphBuilder::new();
    for id in &ids {
        builder.add_operation(
            id.as_str(),
            operation_fn(|| async {
                tokio::task::yield_now().await;
                Ok(())
            }),
        );
    }
    for pair in ids.windows(2) {
        builder.add_dependency(pair[1].as_str(), pair[0].as_str());
    }

    let report = scheduler(2)
        .schedule(builder.build().unwrap())
        .settled()
        .await
        .unwrap();

    assert_eq!(report.settlement_order, ids);
    assert_eq!(report.start_order, ids);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrency_never_exceeds_pool_size() {
    let in_flight = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));

    let mut builder = GraphBuilder::new();
    for i in 0..8 {
        let in_flight = in_flight.clone();
        let peak = peak.clone();
        builder.add_operation(
            format!("independent_{i}"),
            operation_fn(move || {
                let in_flight = in_flight.clone();
                let peak = peak.clone();
                async move {
                    let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    in_flight.fetch_sub(1, Ordering::SeqCst);
                    Ok(())
                }
            }),
        );
    }

    let report = scheduler(3)
        .schedule(builder.build().unwrap())
        .settled()
        .await
        .unwrap();

    assert!(report.all_settled());
    assert!(peak.load(Ordering::SeqCst) <= 3);
    assert!(peak.load(Ordering::SeqCst) >= 2);
}

#[tokio::test]
async fn test_dependents_wait_for_settlement_not_success() {
    let mut builder = GraphBuilder::new();
    builder
        .add_operation(
            "slow_failure",
            operation_fn(|| async {
                tokio::time::sleep(Duration::from_millis(30)).await;
                Err(anyhow::anyhow!("gave up"))
            }),
        )
        .add_operation("fast_success", operation_fn(|| async { Ok(()) }))
        .add_operation("join", operation_fn(|| async { Ok(()) }))
        .add_dependency("join", "slow_failure")
        .add_dependency("join", "fast_success");

    let report = scheduler(4)
        .schedule(builder.build().unwrap())
        .settled()
        .await
        .unwrap();

    assert_eq!(report.settlement_order.last().map(String::as_str), Some("join"));
    assert!(report.settled_before_start("slow_failure", "join"));
    assert_eq!(
        report.record("slow_failure").unwrap().outcome,
        Some(OperationOutcome::Failed("gave up".to_string()))
    );
    assert_eq!(report.record("join").unwrap().state, OperationState::Settled);
}

#[tokio::test]
async fn test_every_node_records_full_lifecycle() {
    let mut builder = GraphBuilder::new();
    builder
        .add_operation("a", operation_fn(|| async { Ok(()) }))
        .add_operation("b", operation_fn(|| async { Ok(()) }))
        .add_dependency("b", "a");

    let report = scheduler(1)
        .schedule(builder.build().unwrap())
        .settled()
        .await
        .unwrap();

    for record in &report.records {
        let states: Vec<OperationState> = record.transitions.iter().map(|t| t.to).collect();
        assert_eq!(
            states,
            vec![
                OperationState::Pending,
                OperationState::Executing,
                OperationState::Settled
            ]
        );
    }
}
