mod common;

use std::time::Duration;

use codegen_bridge::overlay::OverlayController;
use codegen_bridge::poller::ReadinessPoller;

use common::FakePage;

#[tokio::test]
async fn injecting_twice_leaves_one_unset_control() {
    let page = FakePage::new();
    let overlay = OverlayController::new(&page);

    overlay.inject().await;
    page.click_ready();
    assert!(overlay.is_ready().await.unwrap());

    overlay.inject().await;
    assert_eq!(page.control_nodes(), 1);
    assert!(overlay.is_present().await.unwrap());
    assert!(!overlay.is_ready().await.unwrap());
}

#[tokio::test]
async fn ensure_present_leaves_existing_control_alone() {
    let page = FakePage::new();
    let overlay = OverlayController::new(&page);

    overlay.inject().await;
    page.click_ready();
    overlay.ensure_present().await.unwrap();

    assert_eq!(page.injections(), 1);
    assert!(overlay.is_ready().await.unwrap());
}

#[tokio::test(start_paused = true)]
async fn poll_gives_up_at_the_bound() {
    let page = FakePage::new();
    let overlay = OverlayController::new(&page);
    overlay.inject().await;
    let poller = ReadinessPoller::new(&overlay, Duration::from_secs(1), 60);

    let start = tokio::time::Instant::now();
    assert!(!poller.wait_for_ready(90).await);
    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_secs(90) && elapsed < Duration::from_secs(91), "{:?}", elapsed);
}

#[tokio::test(start_paused = true)]
async fn poll_returns_on_the_signalling_tick() {
    let page = FakePage::new().ready_after_checks(45);
    let overlay = OverlayController::new(&page);
    overlay.inject().await;
    let poller = ReadinessPoller::new(&overlay, Duration::from_secs(1), 60);

    let start = tokio::time::Instant::now();
    assert!(poller.wait_for_ready(600).await);
    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_secs(45) && elapsed < Duration::from_secs(46), "{:?}", elapsed);
}

#[tokio::test(start_paused = true)]
async fn vanished_control_is_reinjected_during_poll() {
    let page = FakePage::new().vanish_overlay_on_check(3).ready_after_checks(5);
    let overlay = OverlayController::new(&page);
    overlay.inject().await;
    let poller = ReadinessPoller::new(&overlay, Duration::from_millis(10), 0);

    assert!(poller.wait_for_ready(10).await);
    assert_eq!(page.injections(), 2);
    assert_eq!(page.control_nodes(), 1);
}

#[tokio::test(start_paused = true)]
async fn failing_ticks_do_not_end_the_poll() {
    let page = FakePage::new()
        .fail_presence_checks(&[2, 3])
        .ready_after_checks(5);
    let overlay = OverlayController::new(&page);
    overlay.inject().await;
    let poller = ReadinessPoller::new(&overlay, Duration::from_secs(1), 60);

    let start = tokio::time::Instant::now();
    assert!(poller.wait_for_ready(600).await);
    // Ticks 2 and 3 fail before the readiness check, so the fifth check is tick 7
    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_secs(7) && elapsed < Duration::from_secs(8), "{:?}", elapsed);
    assert_eq!(page.injections(), 1);
}
