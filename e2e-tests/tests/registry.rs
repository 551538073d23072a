// e2e-tests/tests/registry.rs
//
// Registry view lifecycle and timer-driven polling.

use std::time::Duration;

use e2e_tests::StubNode;
use icsi_dashboard::poller::PollSource;
use icsi_dashboard::view::BegPanel;
use serde_json::json;

#[tokio::test]
async fn test_registry_view_open_close() {
    let mut node = StubNode::with_empty_sources().await;
    node.beggars(json!({
        "active_beg": { "address": "ICSI_A", "remaining_seconds": 125 },
        "beggars": [{ "address": "ICSI_A", "balance": 0.25, "last_seen": 0 }]
    }))
    .await;
    let dashboard = node.dashboard();

    dashboard.open_registry().await;
    dashboard.refresh(PollSource::Beggars).await;
    let view = dashboard.render().await;

    let registry = view.registry.expect("registry view is open");
    assert_eq!(registry.rows.len(), 1);
    assert_eq!(registry.rows[0].balance, "0.2500 iCSI");
    assert_eq!(
        view.beg,
        BegPanel::Active {
            address: "ICSI_A".to_string(),
            countdown: "2:05".to_string()
        }
    );

    dashboard.close_registry().await;
    assert!(dashboard.render().await.registry.is_none());
}

#[tokio::test]
async fn test_started_dashboard_polls_every_source_immediately() {
    let node = StubNode::with_empty_sources().await;
    let dashboard = node.dashboard();

    dashboard.start().await;
    tokio::time::sleep(Duration::from_millis(500)).await;
    dashboard.shutdown().await;

    for source in dashboard.metrics() {
        assert!(source.ticks_started >= 1, "{} never ticked", source.source);
        assert_eq!(source.fetch_failures, 0, "{} failed", source.source);
    }
}
