//! ポーリングスケジューラー
//!
//! 固定間隔でディスパッチャーを駆動する。最初のtickは即時に発火し、
//! 遅延したtickはまとめて実行せずスキップする。
//! 停止時は実行中のリクエストを猶予時間まで待ち、残りは中断する。

use crate::codec;
use crate::dispatcher::Dispatcher;
use crate::error::TransportError;
use crate::metadata::MetadataBuilder;
use crate::shutdown::ShutdownController;
use crate::sink::SharedSink;
use crate::transport::ReqwestTransport;
use http_poller_common::{PollConfig, DEFAULT_REQUEST_TIMEOUT_SECS};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

/// 停止時に実行中のリクエストを待つ時間のデフォルト
pub const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS);

/// ポーリングスケジューラー
pub struct PollScheduler {
    dispatcher: Dispatcher,
    interval: Duration,
    shutdown: ShutdownController,
    shutdown_grace: Duration,
}

impl PollScheduler {
    /// 新しいスケジューラーを作成
    pub fn new(dispatcher: Dispatcher, interval: Duration, shutdown: ShutdownController) -> Self {
        Self {
            dispatcher,
            interval,
            shutdown,
            shutdown_grace: DEFAULT_SHUTDOWN_GRACE,
        }
    }

    /// 停止時に実行中のリクエストを待つ時間を設定
    pub fn with_shutdown_grace(mut self, grace: Duration) -> Self {
        self.shutdown_grace = grace;
        self
    }

    /// 設定からreqwestトランスポートを使うスケジューラーを組み立てる
    ///
    /// ホスト名はOSから取得する。停止時の猶予はリクエストタイムアウトと同じ。
    pub fn from_config(
        config: &PollConfig,
        shutdown: ShutdownController,
    ) -> Result<Self, TransportError> {
        let transport = ReqwestTransport::new(Some(config.request_timeout()))?;
        let dispatcher = Dispatcher::new(
            config.endpoints(),
            Arc::new(transport),
            codec::build(config.codec),
            MetadataBuilder::from_system(),
        );
        Ok(Self::new(dispatcher, config.interval(), shutdown)
            .with_shutdown_grace(config.request_timeout()))
    }

    /// シャットダウンされるまでポーリングを続ける
    ///
    /// 待機中のシャットダウンは即座に反映し、tick実行中であればそのtickを
    /// 完了させてから停止する。戻る前に実行中のリクエストを猶予時間まで待ち、
    /// 間に合わなかったものは中断する。
    /// 戻り値は実行したtick数。
    pub async fn run(mut self, sink: SharedSink) -> u64 {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            endpoints = self.dispatcher.endpoints().len(),
            interval_secs = self.interval.as_secs(),
            "Starting poll loop"
        );

        let mut ticks: u64 = 0;
        loop {
            tokio::select! {
                biased;
                _ = self.shutdown.wait() => break,
                _ = ticker.tick() => {}
            }

            ticks += 1;
            match self.dispatcher.run_once(&sink).await {
                Ok(summary) => {
                    debug!(
                        tick = ticks,
                        issued = summary.issued,
                        skipped = summary.skipped,
                        reaped = summary.reaped,
                        in_flight = summary.in_flight,
                        "Poll tick finished"
                    );
                }
                Err(e) => {
                    error!(tick = ticks, error = %e, "Callback defect reaped during poll tick");
                }
            }
        }

        info!(
            ticks = ticks,
            in_flight = self.dispatcher.in_flight(),
            grace_secs = self.shutdown_grace.as_secs(),
            "Stopping poll loop, waiting for in-flight requests"
        );
        match tokio::time::timeout(self.shutdown_grace, self.dispatcher.flush()).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => {
                error!(error = %e, "In-flight request failed during shutdown");
            }
            Err(_) => {
                let abandoned = self.dispatcher.abort_all();
                warn!(
                    abandoned = abandoned,
                    "In-flight requests did not finish within the shutdown grace period"
                );
            }
        }

        ticks
    }
}
