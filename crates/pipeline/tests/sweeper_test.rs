mod common;

use common::{reply, Harness};
use serde_json::json;
use std::time::Duration;

#[tokio::test(start_paused = true)]
async fn sweeper_reclaims_closed_windows_and_expired_entries() {
    let h = Harness::new();
    let request = h.anonymous("/api/news");
    h.gate
        .handle(h.route("news.list"), &request, reply(json!({"data": []})))
        .await
        .unwrap();
    assert_eq!(h.gate.limiter().len(), 1);
    assert_eq!(h.gate.cache().len(), 1);

    h.clock.advance(Duration::from_secs(16 * 60));
    let sweeper = gatehouse_pipeline::spawn_sweeper(h.gate.clone(), Duration::from_secs(1));

    for _ in 0..10 {
        tokio::time::sleep(Duration::from_secs(1)).await;
        if h.gate.limiter().is_empty() && h.gate.cache().is_empty() {
            break;
        }
    }

    assert!(h.gate.limiter().is_empty());
    assert!(h.gate.cache().is_empty());
    assert!(!sweeper.is_finished());
    sweeper.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn sweeper_keeps_live_state() {
    let h = Harness::new();
    h.gate
        .handle(h.route("news.list"), &h.anonymous("/api/news"), reply(json!({})))
        .await
        .unwrap();

    let sweeper = h.gate.spawn_sweeper();
    tokio::time::sleep(Duration::from_secs(600)).await;

    assert_eq!(h.gate.limiter().len(), 1);
    assert_eq!(h.gate.cache().len(), 1);
    sweeper.shutdown().await;
}

#[tokio::test]
async fn manual_sweep_reports_counts() {
    let h = Harness::new();
    h.gate
        .handle(h.route("health"), &h.anonymous("/api/health"), reply(json!({})))
        .await
        .unwrap();

    h.clock.advance(Duration::from_secs(61));
    let report = h.gate.sweep();
    assert_eq!(report.entries, 1);
    assert_eq!(report.windows, 0);
}
