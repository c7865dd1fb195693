//! ポーリングループ
//!
//! スケジューラーが間隔ごとに全エンドポイントをポーリングし、
//! シャットダウン時に実行中のリクエストを回収することを確認する。

use crate::support::{events_for, scheduler};
use http_poller::{SharedSink, ShutdownController};
use http_poller_common::Endpoint;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// N tick後、各エンドポイントにN件以上のイベントが届く
#[tokio::test]
async fn test_each_tick_polls_every_endpoint() {
    let mock = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/a"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"node":"a"}"#))
        .mount(&mock)
        .await;
    Mock::given(method("GET"))
        .and(path("/b"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&mock)
        .await;

    let shutdown = ShutdownController::default();
    let (scheduler, memory) = scheduler(
        vec![
            Endpoint::new("a", format!("{}/a", mock.uri())),
            Endpoint::new("b", format!("{}/b", mock.uri())),
        ],
        Duration::from_millis(200),
        shutdown.clone(),
    );
    let sink: SharedSink = memory.clone();
    let handle = tokio::spawn(scheduler.run(sink));

    tokio::time::sleep(Duration::from_millis(500)).await;
    shutdown.request_shutdown();
    let ticks = handle.await.unwrap();

    assert!(ticks >= 2, "expected at least 2 ticks, got {}", ticks);
    let events = memory.events();
    assert_eq!(events.len() as u64, ticks * 2);
    assert_eq!(events_for(&events, "a").len() as u64, ticks);
    assert_eq!(events_for(&events, "b").len() as u64, ticks);
}

/// シャットダウン時、実行中のリクエストのイベントも届く
#[tokio::test]
async fn test_shutdown_flushes_in_flight_requests() {
    let mock = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"{"slow":true}"#)
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&mock)
        .await;

    let shutdown = ShutdownController::default();
    let (scheduler, memory) = scheduler(
        vec![Endpoint::new("slow", mock.uri())],
        Duration::from_secs(3600),
        shutdown.clone(),
    );
    let sink: SharedSink = memory.clone();
    let handle = tokio::spawn(scheduler.run(sink));

    tokio::time::sleep(Duration::from_millis(50)).await;
    shutdown.request_shutdown();
    let ticks = handle.await.unwrap();

    assert_eq!(ticks, 1);
    let events = memory.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].metadata().response_code, Some(200));
}

/// 遅いリクエストがあっても次のtickは発火し、同じエンドポイントへの
/// 重複リクエストは発行されない
#[tokio::test]
async fn test_slow_request_does_not_block_next_tick() {
    let mock = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(400)))
        .mount(&mock)
        .await;

    let shutdown = ShutdownController::default();
    let (scheduler, memory) = scheduler(
        vec![Endpoint::new("slow", mock.uri())],
        Duration::from_millis(100),
        shutdown.clone(),
    );
    let sink: SharedSink = memory.clone();
    let handle = tokio::spawn(scheduler.run(sink));

    tokio::time::sleep(Duration::from_millis(350)).await;
    shutdown.request_shutdown();
    let ticks = handle.await.unwrap();

    assert!(ticks >= 3, "expected overlapping ticks, got {}", ticks);
    assert_eq!(memory.len(), 1);
    assert_eq!(mock.received_requests().await.unwrap().len(), 1);
}
