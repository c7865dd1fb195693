//! 転送失敗のイベント化
//!
//! レスポンスを受信できなかったリクエストは、`response_code`を持たない
//! 失敗イベントとしてちょうど1件だけ送出される。

use crate::support::{events_for, poll_once, TEST_HOST};
use http_poller_common::{CodecKind, Endpoint};
use std::time::Duration;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

/// 閉じたポートのアドレスを返す
fn closed_port_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("failed to reserve port");
    let port = listener.local_addr().expect("failed to read port").port();
    drop(listener);
    format!("http://127.0.0.1:{}/status", port)
}

/// 存在しないホストは失敗イベントになる
#[tokio::test]
async fn test_nonexistent_host_emits_single_failure_event() {
    let url = "http://thisurldoesnotexist.invalid/status";
    let events = poll_once(vec![Endpoint::new("missing", url)], CodecKind::Json).await;

    assert_eq!(events.len(), 1);
    let event = &events[0];
    let failure = event
        .request_failure_info()
        .expect("failure event must carry request failure info");
    assert_eq!(failure.name, "missing");
    assert_eq!(failure.url, url);
    assert!(!failure.error.is_empty());

    assert_eq!(event.metadata().name, "missing");
    assert_eq!(event.metadata().host, TEST_HOST);
    assert_eq!(event.metadata().response_code, None);
}

/// 接続拒否は失敗イベントになる
#[tokio::test]
async fn test_connection_refused_emits_single_failure_event() {
    let url = closed_port_url();
    let events = poll_once(vec![Endpoint::new("refused", url.clone())], CodecKind::Json).await;

    assert_eq!(events.len(), 1);
    let failure = events[0].request_failure_info().unwrap();
    assert_eq!(failure.url, url);
    assert!(failure.error.starts_with("Connection failed"), "{}", failure.error);
    assert_eq!(events[0].metadata().response_code, None);
}

/// 範囲外のポートは起動時ではなくリクエスト時の失敗として現れる
#[tokio::test]
async fn test_invalid_port_emits_single_failure_event() {
    let url = "http://127.0.0.1:9999999";
    let events = poll_once(vec![Endpoint::new("bogus", url)], CodecKind::Json).await;

    assert_eq!(events.len(), 1);
    let failure = events[0].request_failure_info().unwrap();
    assert_eq!(failure.name, "bogus");
    assert!(failure.error.starts_with("Invalid URL"), "{}", failure.error);
    assert_eq!(events[0].metadata().response_code, None);
}

/// タイムアウトは失敗イベントになる
#[tokio::test]
async fn test_timeout_emits_single_failure_event() {
    let mock = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(30)))
        .mount(&mock)
        .await;

    let events = poll_once(vec![Endpoint::new("slow", mock.uri())], CodecKind::Json).await;

    assert_eq!(events.len(), 1);
    let failure = events[0].request_failure_info().unwrap();
    assert!(failure.error.starts_with("Request timed out"), "{}", failure.error);
}

/// 失敗したエンドポイントは他のエンドポイントに影響しない
#[tokio::test]
async fn test_failure_is_isolated_from_other_endpoints() {
    let mock = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"status":"green"}"#))
        .mount(&mock)
        .await;

    let events = poll_once(
        vec![
            Endpoint::new("good", mock.uri()),
            Endpoint::new("bad", closed_port_url()),
        ],
        CodecKind::Json,
    )
    .await;

    assert_eq!(events.len(), 2);
    let good = events_for(&events, "good");
    let bad = events_for(&events, "bad");
    assert_eq!(good[0].metadata().response_code, Some(200));
    assert!(good[0].request_failure_info().is_none());
    assert_eq!(bad[0].metadata().response_code, None);
    assert!(bad[0].request_failure_info().is_some());
}
