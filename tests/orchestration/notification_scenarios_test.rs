//! End-to-end notification scenarios through the extension entry point.

use crate::common::*;
use push_extension_core::config::ExtensionConfig;
use push_extension_core::constants::{events, operations, user_info};
use push_extension_core::models::{ConfigScope, MediaType, NotificationRequest};
use push_extension_core::orchestration::{
    Collaborators, FiredBy, NotificationServiceExtension, ReceiveOutcome,
};
use push_extension_core::state_machine::OperationState;
use push_extension_core::storage::ConfigurationRepository;
use serde_json::json;
use std::time::Duration;

fn extension(harness: &Harness) -> NotificationServiceExtension {
    NotificationServiceExtension::new(
        ExtensionConfig::for_bundle(BUNDLE_ID),
        harness.collaborators.clone(),
    )
}

#[tokio::test]
async fn test_happy_path_fires_via_completion() {
    let harness = Harness::new(MockNetworking::healthy(), MockMediaFetcher::instant());
    let ext = extension(&harness);
    let capture = CapturingHandler::default();

    let session = ext
        .did_receive(&rich_request(), capture.handler())
        .unwrap()
        .into_session()
        .unwrap();

    assert_eq!(session.delivered().await, FiredBy::Completion);
    assert!(!session.time_will_expire());
    let report = session.settled().await.unwrap();

    assert!(report.all_settled());
    assert_eq!(report.failed().count(), 0);
    assert!(report.settled_before_start(
        operations::DOWNLOAD_GLOBAL_CONFIGURATION,
        operations::MERGE_CONFIGURATION
    ));
    assert!(report.settled_before_start(
        operations::DOWNLOAD_TENANT_CONFIGURATION,
        operations::MERGE_CONFIGURATION
    ));
    assert!(report.settled_before_start(
        operations::MERGE_CONFIGURATION,
        operations::REPORT_DELIVERY
    ));

    assert_eq!(capture.count(), 1);
    let content = capture.last().unwrap();
    assert_eq!(content.title, "Flash sale");
    assert_eq!(content.body, "Everything 20% off today");
    assert_eq!(content.deep_link.as_ref().unwrap().url, "shop://sale");
    assert_eq!(
        content.user_info.get(user_info::DYNAMIC_LINK),
        Some(&json!("shop://sale"))
    );
    assert_eq!(content.attachments.len(), 1);
    assert_eq!(content.attachments[0].media_type, MediaType::Image);

    let records = harness.telemetry.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].event, events::NOTIFICATION_DELIVERED);
    assert_eq!(
        records[0].endpoint.as_deref(),
        Some("https://tenant.example.com/events")
    );
    assert_eq!(records[0].site_id.as_deref(), Some("site-1001"));
    assert_eq!(records[0].campaign.as_ref().unwrap().campaign_id, "c-7");
    assert!(!records[0].degraded);
}

#[tokio::test]
async fn test_deadline_delivers_leaf_mutations_and_side_effects_continue() {
    let slow = Duration::from_millis(300);
    let networking = MockNetworking::new(
        FetchBehavior::succeed(json!({ "events": { "endpoint": "https://global.example.com" } }))
            .after(slow),
        FetchBehavior::succeed(json!({ "events": { "site_id": "site-1" } })).after(slow),
    );
    let harness = Harness::new(networking, MockMediaFetcher::instant());
    let ext = extension(&harness);
    let capture = CapturingHandler::default();

    let session = ext
        .did_receive(&rich_request(), capture.handler())
        .unwrap()
        .into_session()
        .unwrap();
    session.arm_deadline(Duration::from_millis(50));

    assert_eq!(session.delivered().await, FiredBy::Deadline);
    assert_eq!(capture.count(), 1);
    let content = capture.last().unwrap();
    assert!(content.deep_link.is_some());
    assert_eq!(content.attachments.len(), 1);
    assert!(harness.telemetry.records().is_empty());

    // The deadline does not cancel outstanding work
    let report = session.settled().await.unwrap();
    assert!(report.all_settled());
    assert_eq!(harness.telemetry.records().len(), 1);
    let merged = harness.repository.read_merged().await.unwrap().unwrap();
    assert_eq!(merged.sources, vec![ConfigScope::Global, ConfigScope::Tenant]);
    assert_eq!(capture.count(), 1);
}

#[tokio::test]
async fn test_both_downloads_fail_still_merges_and_reports() {
    let harness = Harness::new(MockNetworking::unreachable(), MockMediaFetcher::failing());
    let ext = extension(&harness);
    let capture = CapturingHandler::default();

    let session = ext
        .did_receive(&rich_request(), capture.handler())
        .unwrap()
        .into_session()
        .unwrap();

    assert_eq!(session.delivered().await, FiredBy::Completion);
    let report = session.settled().await.unwrap();

    assert!(report.all_settled());
    assert_eq!(report.failed().count(), 0);
    assert_eq!(
        report.record(operations::MERGE_CONFIGURATION).unwrap().state,
        OperationState::Settled
    );

    let merged = harness.repository.read_merged().await.unwrap().unwrap();
    assert!(merged.is_degraded());
    assert!(merged.sources.is_empty());

    let records = harness.telemetry.records();
    assert_eq!(records.len(), 1);
    assert!(records[0].degraded);
    assert_eq!(records[0].endpoint, None);

    assert_eq!(capture.count(), 1);
    assert!(capture.last().unwrap().attachments.is_empty());
}

#[tokio::test]
async fn test_undecodable_payload_delivers_original_content_once() {
    let harness = Harness::new(MockNetworking::healthy(), MockMediaFetcher::instant());
    let ext = extension(&harness);
    let capture = CapturingHandler::default();
    let request = NotificationRequest::new(
        "notification-2",
        "Original title",
        "Original body",
        json!({ "title": "missing tenant", "content": "x" }),
    );

    let outcome = ext.did_receive(&request, capture.handler()).unwrap();

    assert!(matches!(outcome, ReceiveOutcome::NotHandled));
    assert_eq!(capture.count(), 1);
    let content = capture.last().unwrap();
    assert_eq!(content.title, "Original title");
    assert_eq!(content.body, "Original body");
    assert_eq!(harness.repository.len(), 0);
}

#[tokio::test]
async fn test_handle_returns_best_attempt_at_deadline() {
    let slow = Duration::from_millis(500);
    let networking = MockNetworking::new(
        FetchBehavior::fail().after(slow),
        FetchBehavior::fail().after(slow),
    );
    let harness = Harness::new(networking, MockMediaFetcher::instant());
    let ext = extension(&harness);

    let content = ext
        .handle(&rich_request(), Some(Duration::from_millis(50)))
        .await;

    assert_eq!(content.title, "Flash sale");
    assert!(content.deep_link.is_some());
}

#[tokio::test]
async fn test_lifecycle_events_are_published() {
    let harness = Harness::new(MockNetworking::healthy(), MockMediaFetcher::instant());
    let ext = extension(&harness);
    let mut receiver = ext.events().unwrap().subscribe();

    let session = ext
        .did_receive(&rich_request(), CapturingHandler::default().handler())
        .unwrap()
        .into_session()
        .unwrap();
    session.settled().await.unwrap();

    let mut started = 0;
    let mut settled = 0;
    let mut graph_settled = 0;
    while let Ok(event) = receiver.try_recv() {
        match event.name.as_str() {
            events::OPERATION_STARTED => started += 1,
            events::OPERATION_SETTLED => settled += 1,
            events::GRAPH_SETTLED => graph_settled += 1,
            _ => {}
        }
    }

    assert_eq!(started, 6);
    assert_eq!(settled, 6);
    assert_eq!(graph_settled, 1);
}

#[tokio::test]
async fn test_default_wiring_publishes_delivery_on_extension_bus() {
    let ext = NotificationServiceExtension::new(
        ExtensionConfig::for_bundle(BUNDLE_ID),
        Collaborators::new(MockNetworking::healthy(), MockMediaFetcher::instant()),
    );
    let mut receiver = ext.events().unwrap().subscribe();

    let session = ext
        .did_receive(&rich_request(), CapturingHandler::default().handler())
        .unwrap()
        .into_session()
        .unwrap();
    session.settled().await.unwrap();

    let mut deliveries = Vec::new();
    while let Ok(event) = receiver.try_recv() {
        if event.name == events::NOTIFICATION_DELIVERED {
            deliveries.push(event.context);
        }
    }

    assert_eq!(deliveries.len(), 1);
    assert_eq!(deliveries[0]["tenant_id"], json!("1001"));
    assert_eq!(deliveries[0]["site_id"], json!("site-1001"));
}
