//! レスポンス分類
//!
//! 1リクエストの結果（レスポンス受信・転送失敗・完了通知）をイベントへ変換し、
//! シンクへ送出する。
//!
//! - レスポンス受信: 本文をデコードし、レコードごとにイベントを生成。
//!   デコードに失敗しても破棄せず、タグ付きイベントとして送出する
//! - 転送失敗: `_http_request_failure`を持つ失敗イベント（`response_code`なし）
//! - 完了通知: エラーを伴い、かつ未処理であれば転送失敗として扱う
//!
//! 失敗コールバックと完了コールバックの両方で同じ失敗が通知されても、
//! ワンショットフラグにより生成されるイベントは1つだけになる。

use crate::codec::{SharedCodec, EMPTY_DECODE_TAG};
use crate::error::TransportError;
use crate::metadata::MetadataBuilder;
use crate::sink::SharedSink;
use crate::transport::{HttpResponse, ResponseHandler};
use http_poller_common::{Endpoint, Event, RequestFailure};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{error, warn};

/// 結果が通知されないまま完了した場合のエラーメッセージ
const MISSING_OUTCOME_ERROR: &str = "request completed without a response";

/// 分類結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// 今回の通知でリクエストが確定した
    Resolved {
        /// シンクへ送出できたイベント数
        delivered: usize,
        /// シンクに拒否されたイベント数
        dropped: usize,
    },
    /// 既に確定済みのため無視した
    AlreadyResolved,
}

/// 1リクエスト分のレスポンス分類器
pub struct ResponseClassifier {
    endpoint: Endpoint,
    codec: SharedCodec,
    metadata: MetadataBuilder,
    sink: SharedSink,
    resolved: AtomicBool,
}

impl ResponseClassifier {
    /// 新しい分類器を作成（状態はPending）
    pub fn new(
        endpoint: Endpoint,
        codec: SharedCodec,
        metadata: MetadataBuilder,
        sink: SharedSink,
    ) -> Self {
        Self {
            endpoint,
            codec,
            metadata,
            sink,
            resolved: AtomicBool::new(false),
        }
    }

    /// 対象エンドポイント
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// 既に確定済みか
    pub fn is_resolved(&self) -> bool {
        self.resolved.load(Ordering::Acquire)
    }

    /// Pending → Resolved へ遷移。遷移できたのは最初の1回だけ
    fn claim(&self) -> bool {
        !self.resolved.swap(true, Ordering::AcqRel)
    }

    /// レスポンス受信を分類
    pub fn classify_response(&self, response: HttpResponse) -> Classification {
        if !self.claim() {
            return Classification::AlreadyResolved;
        }

        let metadata = self.metadata.build(&self.endpoint, Some(response.status));
        let decoded = self.codec.decode(&response.body);

        let events: Vec<Event> = if decoded.is_empty() {
            error!(
                name = %self.endpoint.name,
                url = %self.endpoint.url,
                response_code = response.status,
                codec = self.codec.name(),
                "Codec produced no records for response body"
            );
            vec![Event::decode_failure(
                String::from_utf8_lossy(&response.body),
                EMPTY_DECODE_TAG,
                metadata,
            )]
        } else {
            decoded
                .into_iter()
                .map(|outcome| match outcome {
                    Ok(record) => Event::from_record(record, metadata.clone()),
                    Err(failure) => {
                        error!(
                            name = %self.endpoint.name,
                            url = %self.endpoint.url,
                            response_code = response.status,
                            codec = self.codec.name(),
                            reason = %failure.reason,
                            "Failed to decode response body"
                        );
                        Event::decode_failure(failure.raw, failure.tag, metadata.clone())
                    }
                })
                .collect()
        };

        let mut delivered = 0;
        let mut dropped = 0;
        for event in events {
            match self.sink.push(event) {
                Ok(()) => delivered += 1,
                Err(e) => {
                    dropped += 1;
                    error!(
                        name = %self.endpoint.name,
                        url = %self.endpoint.url,
                        response_code = response.status,
                        error = %e,
                        "Error eventifying response"
                    );
                }
            }
        }

        Classification::Resolved { delivered, dropped }
    }

    /// 転送失敗を分類
    pub fn classify_failure(&self, error: &TransportError) -> Classification {
        if !self.claim() {
            return Classification::AlreadyResolved;
        }
        self.deliver_failure(error.to_string())
    }

    /// 完了通知を分類
    pub fn classify_completion(&self, error: Option<&TransportError>) -> Classification {
        match error {
            Some(error) => self.classify_failure(error),
            None => {
                if !self.claim() {
                    return Classification::AlreadyResolved;
                }
                warn!(
                    name = %self.endpoint.name,
                    url = %self.endpoint.url,
                    "Request completed without reporting a response or an error"
                );
                self.deliver_failure(MISSING_OUTCOME_ERROR.to_string())
            }
        }
    }

    fn deliver_failure(&self, error_text: String) -> Classification {
        let metadata = self.metadata.build(&self.endpoint, None);
        let failure = RequestFailure {
            url: self.endpoint.url.clone(),
            name: self.endpoint.name.clone(),
            error: error_text,
        };
        let error_text = failure.error.clone();

        match self.sink.push(Event::request_failure(failure, metadata)) {
            Ok(()) => Classification::Resolved {
                delivered: 1,
                dropped: 0,
            },
            Err(e) => {
                error!(
                    name = %self.endpoint.name,
                    url = %self.endpoint.url,
                    request_error = %error_text,
                    error = %e,
                    "Cannot read URL and could not send the failure as an event"
                );
                Classification::Resolved {
                    delivered: 0,
                    dropped: 1,
                }
            }
        }
    }
}

impl ResponseHandler for ResponseClassifier {
    fn on_success(&self, response: HttpResponse) {
        self.classify_response(response);
    }

    fn on_failure(&self, error: &TransportError) {
        self.classify_failure(error);
    }

    fn on_complete(&self, error: Option<&TransportError>) {
        self.classify_completion(error);
    }
}
