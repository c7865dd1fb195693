//! http-poller エントリーポイント
//!
//! 受信したイベントを1行1JSONで標準出力へ書き出す。

use anyhow::Context;
use clap::Parser;
use http_poller::cli::Cli;
use http_poller::shutdown::{listen_for_signals, ShutdownController};
use http_poller::{logging, ChannelSink, PollScheduler};
use http_poller_common::Event;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init().context("Failed to initialize logging")?;

    let config = cli.into_config().context("Invalid configuration")?;
    info!(
        endpoints = config.urls.len(),
        interval_secs = config.interval_secs,
        codec = %config.codec,
        request_timeout_secs = config.request_timeout().as_secs(),
        "Configuration loaded"
    );

    let shutdown = ShutdownController::default();
    let scheduler = PollScheduler::from_config(&config, shutdown.clone())
        .context("Failed to build HTTP client")?;

    let (sink, events) = ChannelSink::channel();
    let writer = tokio::spawn(write_events(events, shutdown.clone()));
    let signals = tokio::spawn(listen_for_signals(shutdown.clone()));

    let ticks = scheduler.run(Arc::new(sink)).await;
    signals.abort();

    // スケジューラー終了でシンクが全て破棄され、チャネルが閉じる
    let written = writer.await.context("Event writer task failed")??;
    info!(ticks = ticks, events = written, "http-poller stopped");
    Ok(())
}

/// チャネルが閉じるまでイベントを標準出力へ書き出す
///
/// 書き込みに失敗した場合はシャットダウンを要求して終了する。
async fn write_events(
    mut events: UnboundedReceiver<Event>,
    shutdown: ShutdownController,
) -> anyhow::Result<u64> {
    let mut stdout = tokio::io::stdout();
    let mut written = 0;

    while let Some(event) = events.recv().await {
        let mut line = match serde_json::to_vec(&event) {
            Ok(line) => line,
            Err(e) => {
                error!(error = %e, "Failed to serialize event");
                continue;
            }
        };
        line.push(b'\n');

        let result = async {
            stdout.write_all(&line).await?;
            stdout.flush().await
        }
        .await;

        if let Err(e) = result {
            error!(error = %e, "Failed to write event to stdout");
            shutdown.request_shutdown();
            return Err(e).context("Failed to write event to stdout");
        }
        written += 1;
    }

    Ok(written)
}
