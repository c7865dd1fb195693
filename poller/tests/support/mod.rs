//! 統合テスト用ユーティリティ

use http_poller::codec;
use http_poller::{
    Dispatcher, MemorySink, MetadataBuilder, PollScheduler, ReqwestTransport, SharedSink,
    ShutdownController,
};
use http_poller_common::{CodecKind, Endpoint, Event};
use std::sync::Arc;
use std::time::Duration;

/// テスト用のホスト名
pub const TEST_HOST: &str = "poller-test-host";

/// reqwestトランスポートとメモリシンクを使うディスパッチャーを作成
pub fn dispatcher(endpoints: Vec<Endpoint>, codec: CodecKind) -> (Dispatcher, Arc<MemorySink>) {
    let transport = ReqwestTransport::new(Some(Duration::from_secs(5)))
        .expect("failed to build reqwest transport");
    let dispatcher = Dispatcher::new(
        endpoints,
        Arc::new(transport),
        codec::build(codec),
        MetadataBuilder::new(TEST_HOST),
    );
    (dispatcher, Arc::new(MemorySink::new()))
}

/// 1 tick 実行し、全リクエストの完了を待ってイベントを返す
#[allow(dead_code)]
pub async fn poll_once(endpoints: Vec<Endpoint>, codec: CodecKind) -> Vec<Event> {
    let (mut dispatcher, memory) = dispatcher(endpoints, codec);
    let sink: SharedSink = memory.clone();

    dispatcher.run_once(&sink).await.expect("tick failed");
    dispatcher.flush().await.expect("flush failed");

    memory.events()
}

/// スケジューラーを作成
#[allow(dead_code)]
pub fn scheduler(
    endpoints: Vec<Endpoint>,
    interval: Duration,
    shutdown: ShutdownController,
) -> (PollScheduler, Arc<MemorySink>) {
    let (dispatcher, memory) = dispatcher(endpoints, CodecKind::Json);
    (PollScheduler::new(dispatcher, interval, shutdown), memory)
}

/// 指定エンドポイントのイベントを抽出
#[allow(dead_code)]
pub fn events_for<'a>(events: &'a [Event], name: &str) -> Vec<&'a Event> {
    events
        .iter()
        .filter(|event| event.metadata().name == name)
        .collect()
}
