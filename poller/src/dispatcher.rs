//! リクエストディスパッチャー
//!
//! tickごとに全エンドポイントへ非同期GETを1件ずつ発行し、
//! 既に完了したリクエストタスクを回収（drain）する。
//!
//! 前回のリクエストがまだ完了していないエンドポイントには新たに発行しない。
//! そのため未回収のタスク数はエンドポイント数を超えない。

use crate::classifier::ResponseClassifier;
use crate::codec::SharedCodec;
use crate::error::DispatchError;
use crate::metadata::MetadataBuilder;
use crate::sink::SharedSink;
use crate::transport::HttpTransport;
use futures::FutureExt;
use http_poller_common::Endpoint;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, error, warn};

/// Arc でラップされたトランスポート
pub type SharedTransport = Arc<dyn HttpTransport>;

/// 1 tick 分の集計
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickSummary {
    /// 発行したリクエスト数
    pub issued: usize,
    /// 前回のリクエストが未完了のため発行を見送った数
    pub skipped: usize,
    /// drainで回収したリクエストタスク数（過去tick分を含む）
    pub reaped: usize,
    /// drain後も実行中のリクエストタスク数
    pub in_flight: usize,
}

/// リクエストディスパッチャー
///
/// トランスポートは全リクエストで共有する。発行したタスクは`JoinSet`で保持し、
/// drainで回収されるまで次のtickへ持ち越される。
pub struct Dispatcher {
    endpoints: Arc<[Endpoint]>,
    pending: Vec<Arc<AtomicBool>>,
    transport: SharedTransport,
    codec: SharedCodec,
    metadata: MetadataBuilder,
    in_flight: JoinSet<Result<(), DispatchError>>,
}

impl Dispatcher {
    /// 新しいディスパッチャーを作成
    pub fn new(
        endpoints: Vec<Endpoint>,
        transport: SharedTransport,
        codec: SharedCodec,
        metadata: MetadataBuilder,
    ) -> Self {
        let pending = endpoints
            .iter()
            .map(|_| Arc::new(AtomicBool::new(false)))
            .collect();
        Self {
            endpoints: endpoints.into(),
            pending,
            transport,
            codec,
            metadata,
            in_flight: JoinSet::new(),
        }
    }

    /// 対象エンドポイント
    pub fn endpoints(&self) -> &[Endpoint] {
        &self.endpoints
    }

    /// 未回収のリクエストタスク数
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// 1 tick 分のリクエストを発行してdrainする
    ///
    /// コールバック実行中のパニックは失敗イベントに変換せず`Err`として返す。
    pub async fn run_once(&mut self, sink: &SharedSink) -> Result<TickSummary, DispatchError> {
        let carried_over = self.in_flight.len();
        if carried_over > 0 {
            debug!(
                carried_over = carried_over,
                "Requests from previous ticks are still in flight"
            );
        }

        let endpoints = Arc::clone(&self.endpoints);
        let mut issued = 0;
        let mut skipped = 0;
        for (index, endpoint) in endpoints.iter().enumerate() {
            if self.pending[index].swap(true, Ordering::AcqRel) {
                debug!(
                    name = %endpoint.name,
                    url = %endpoint.url,
                    "Previous request still in flight, skipping"
                );
                skipped += 1;
                continue;
            }
            let guard = PendingGuard(Arc::clone(&self.pending[index]));
            self.request_async(endpoint.clone(), Arc::clone(sink), guard);
            issued += 1;
        }

        let reaped = self.drain().await?;

        Ok(TickSummary {
            issued,
            skipped,
            reaped,
            in_flight: self.in_flight.len(),
        })
    }

    fn request_async(&mut self, endpoint: Endpoint, sink: SharedSink, guard: PendingGuard) {
        debug!(name = %endpoint.name, url = %endpoint.url, "Will get url");

        let transport = Arc::clone(&self.transport);
        let classifier = ResponseClassifier::new(
            endpoint,
            Arc::clone(&self.codec),
            self.metadata.clone(),
            sink,
        );

        self.in_flight.spawn(async move {
            let _guard = guard;
            let url = classifier.endpoint().url.clone();
            let outcome = AssertUnwindSafe(transport.get(&url, &classifier))
                .catch_unwind()
                .await;

            outcome.map_err(|payload| DispatchError::CallbackPanicked {
                name: classifier.endpoint().name.clone(),
                url,
                message: panic_message(payload.as_ref()),
            })
        });
    }

    /// 完了済みのリクエストタスクを回収
    ///
    /// 実行中のリクエストは待たない。欠陥があっても完了済みのタスクは
    /// すべて回収し、最初の欠陥を返す。
    pub async fn drain(&mut self) -> Result<usize, DispatchError> {
        tokio::task::yield_now().await;

        let mut reaped = 0;
        let mut first_error = None;
        while let Some(joined) = self.in_flight.try_join_next() {
            reaped += 1;
            if let Err(e) = check_joined(joined) {
                error!(error = %e, "Callback failed while handling a request");
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(reaped),
        }
    }

    /// 全リクエストタスクの完了を待つ（シャットダウン用）
    ///
    /// 欠陥があっても残りのタスクは待ち続け、最初の欠陥を返す。
    pub async fn flush(&mut self) -> Result<usize, DispatchError> {
        let mut reaped = 0;
        let mut first_error = None;

        while let Some(joined) = self.in_flight.join_next().await {
            reaped += 1;
            if let Err(e) = check_joined(joined) {
                error!(error = %e, "Callback failed while flushing in-flight requests");
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(reaped),
        }
    }

    /// 未回収のリクエストタスクをすべて中断し、中断した数を返す
    pub fn abort_all(&mut self) -> usize {
        let abandoned = self.in_flight.len();
        if abandoned > 0 {
            warn!(abandoned = abandoned, "Aborting in-flight requests");
        }
        self.in_flight.abort_all();
        self.in_flight.detach_all();
        abandoned
    }
}

/// タスク終了（完了・パニック・中断）時にエンドポイントの発行中フラグを戻す
struct PendingGuard(Arc<AtomicBool>);

impl Drop for PendingGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

fn check_joined(
    joined: Result<Result<(), DispatchError>, JoinError>,
) -> Result<(), DispatchError> {
    match joined {
        Ok(result) => result,
        Err(e) => Err(DispatchError::TaskCancelled(e.to_string())),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
