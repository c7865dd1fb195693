//! HTTPトランスポート
//!
//! 1リクエストの結果を成功・失敗・完了の3種類のコールバックで通知する。
//! 失敗は失敗コールバックと完了コールバックの両方で通知されうるため、
//! ハンドラー側で重複を排除すること。

use crate::error::TransportError;
use async_trait::async_trait;
use std::time::Duration;

/// 受信したHTTPレスポンス
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// HTTPステータスコード
    pub status: u16,
    /// レスポンス本文
    pub body: Vec<u8>,
}

/// リクエスト結果のハンドラー
pub trait ResponseHandler: Send + Sync {
    /// レスポンスを受信した（ステータスコードは問わない）
    fn on_success(&self, response: HttpResponse);

    /// レスポンスを受信できなかった
    fn on_failure(&self, error: &TransportError);

    /// リクエストが完了した。失敗していればそのエラーを伴う
    fn on_complete(&self, error: Option<&TransportError>);
}

/// 非同期GETを発行するトランスポート
///
/// 1回の`get`につき、`on_success`か`on_failure`の少なくとも一方と、
/// 最後に`on_complete`を呼び出す。
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// GETリクエストを発行し、結果をハンドラーへ通知
    async fn get(&self, url: &str, handler: &dyn ResponseHandler);
}

/// reqwestによるトランスポート
///
/// クライアントは全リクエストで共有する（接続プーリング有効）。
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// タイムアウトを指定して作成
    pub fn new(request_timeout: Option<Duration>) -> Result<Self, TransportError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| TransportError::Client(crate::error::error_chain(&e)))?;
        Ok(Self { client })
    }

    async fn fetch(&self, url: &str) -> Result<HttpResponse, TransportError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| TransportError::from_reqwest(url, e))?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| TransportError::from_reqwest(url, e))?;

        Ok(HttpResponse {
            status,
            body: body.to_vec(),
        })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(&self, url: &str, handler: &dyn ResponseHandler) {
        match self.fetch(url).await {
            Ok(response) => {
                handler.on_success(response);
                handler.on_complete(None);
            }
            Err(error) => {
                handler.on_failure(&error);
                handler.on_complete(Some(&error));
            }
        }
    }
}
