//! 受信したレスポンスのイベント化
//!
//! モックサーバーに対して実際にリクエストを発行し、
//! ステータスコード・本文に応じたイベントが1件ずつ生成されることを確認する。

use crate::support::{events_for, poll_once, TEST_HOST};
use http_poller_common::{CodecKind, Endpoint};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// 正常なJSONレスポンスは本文の内容とステータスコードを持つイベントになる
#[tokio::test]
async fn test_valid_json_response_becomes_single_event() {
    let mock = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/meh"))
        .respond_with(
            ResponseTemplate::new(202).set_body_raw(r#"{"a":2,"hello":["a","b","c"]}"#, "application/json"),
        )
        .expect(1)
        .mount(&mock)
        .await;

    let url = format!("{}/meh", mock.uri());
    let events = poll_once(vec![Endpoint::new("url", url.clone())], CodecKind::Json).await;

    assert_eq!(events.len(), 1);
    let event = &events[0];
    assert_eq!(event.get("a"), Some(&json!(2)));
    assert_eq!(event.get("hello"), Some(&json!(["a", "b", "c"])));
    assert!(event.tags().is_empty());

    let metadata = event.metadata();
    assert_eq!(metadata.name, "url");
    assert_eq!(metadata.url, url);
    assert_eq!(metadata.host, TEST_HOST);
    assert_eq!(metadata.response_code, Some(202));
}

/// 不正なJSONは破棄されず、タグ付きイベントとして元のメタデータと共に届く
#[tokio::test]
async fn test_invalid_json_is_tagged_not_dropped() {
    let mock = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("Definitely not JSON!"))
        .mount(&mock)
        .await;

    let url = format!("{}/meh", mock.uri());
    let events = poll_once(vec![Endpoint::new("url", url.clone())], CodecKind::Json).await;

    assert_eq!(events.len(), 1);
    let event = &events[0];
    assert!(event.has_tag("_jsonparsefailure"));
    assert_eq!(event.get("message"), Some(&json!("Definitely not JSON!")));
    assert_eq!(event.metadata().name, "url");
    assert_eq!(event.metadata().url, url);
    assert_eq!(event.metadata().response_code, Some(200));
    assert!(event.request_failure_info().is_none());
}

/// 非2xxもレスポンスとして扱い、ステータスコードを記録する
#[tokio::test]
async fn test_error_status_is_still_a_response() {
    let mock = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500).set_body_string(r#"{"status":"red"}"#))
        .mount(&mock)
        .await;

    let events = poll_once(vec![Endpoint::new("health", mock.uri())], CodecKind::Json).await;

    assert_eq!(events.len(), 1);
    assert_eq!(events[0].metadata().response_code, Some(500));
    assert_eq!(events[0].get("status"), Some(&json!("red")));
    assert!(events[0].request_failure_info().is_none());
}

/// lineコーデックでは1行ごとにイベントが生成される
#[tokio::test]
async fn test_line_codec_emits_event_per_line() {
    let mock = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("green\nyellow\n"))
        .mount(&mock)
        .await;

    let events = poll_once(vec![Endpoint::new("lines", mock.uri())], CodecKind::Line).await;

    let messages: Vec<_> = events.iter().map(|e| e.get("message").cloned()).collect();
    assert_eq!(messages, vec![Some(json!("green")), Some(json!("yellow"))]);
    assert!(events
        .iter()
        .all(|e| e.metadata().response_code == Some(200)));
}

/// 空の本文でもイベントが1件届く
#[tokio::test]
async fn test_empty_body_still_produces_an_event() {
    let mock = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&mock)
        .await;

    let events = poll_once(vec![Endpoint::new("empty", mock.uri())], CodecKind::Line).await;

    assert_eq!(events.len(), 1);
    assert!(events[0].has_tag("_decodefailure"));
    assert_eq!(events[0].metadata().response_code, Some(204));
}

/// エンドポイントごとに独立してイベントが生成される
#[tokio::test]
async fn test_each_endpoint_gets_its_own_event() {
    let mock = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ok"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"ok":true}"#))
        .mount(&mock)
        .await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .mount(&mock)
        .await;

    let events = poll_once(
        vec![
            Endpoint::new("ok", format!("{}/ok", mock.uri())),
            Endpoint::new("broken", format!("{}/broken", mock.uri())),
        ],
        CodecKind::Json,
    )
    .await;

    assert_eq!(events.len(), 2);
    let ok = events_for(&events, "ok");
    let broken = events_for(&events, "broken");
    assert_eq!(ok.len(), 1);
    assert_eq!(broken.len(), 1);
    assert!(!ok[0].has_tag("_jsonparsefailure"));
    assert!(broken[0].has_tag("_jsonparsefailure"));
}
