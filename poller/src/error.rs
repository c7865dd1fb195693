//! エラー型定義
//!
//! 転送・シンク・ディスパッチ各層のエラー（thiserror使用）

use thiserror::Error;

/// HTTP transport error
///
/// レスポンスを受信できなかったリクエストの失敗理由。
/// 失敗イベントの`error`フィールドにはこの`Display`表現が入る。
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// URL could not be turned into a request
    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl {
        /// 設定されたURL
        url: String,
        /// 理由
        reason: String,
    },

    /// Request timed out
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Connection could not be established (DNS, refused, TLS)
    #[error("Connection failed: {0}")]
    Connect(String),

    /// Response headers arrived but the body could not be read
    #[error("Failed to read response body: {0}")]
    Body(String),

    /// Any other request failure
    #[error("Request failed: {0}")]
    Request(String),

    /// HTTP client could not be constructed
    #[error("Failed to build HTTP client: {0}")]
    Client(String),
}

impl TransportError {
    /// reqwestのエラーを発生元の連鎖を含めて分類する
    pub fn from_reqwest(url: &str, err: reqwest::Error) -> Self {
        let detail = error_chain(&err);
        if err.is_builder() {
            TransportError::InvalidUrl {
                url: url.to_string(),
                reason: detail,
            }
        } else if err.is_timeout() {
            TransportError::Timeout(detail)
        } else if err.is_connect() {
            TransportError::Connect(detail)
        } else if err.is_body() || err.is_decode() {
            TransportError::Body(detail)
        } else {
            TransportError::Request(detail)
        }
    }
}

/// エラーとその`source()`連鎖を`: `で連結する
pub fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}

/// Event sink error
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SinkError {
    /// The downstream consumer has gone away
    #[error("Event sink is closed")]
    Closed,

    /// The sink refused the event
    #[error("Event rejected by sink: {0}")]
    Rejected(String),
}

/// Dispatch error
///
/// レスポンス処理（コールバック実行）中の欠陥。失敗イベントには変換されず、
/// 当該tickのdrainを打ち切って呼び出し元へ伝播する。
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DispatchError {
    /// A request task panicked while handling its outcome
    #[error("Callback for endpoint '{name}' ({url}) panicked: {message}")]
    CallbackPanicked {
        /// エンドポイント名
        name: String,
        /// リクエスト先URL
        url: String,
        /// パニックメッセージ
        message: String,
    },

    /// A request task was cancelled before it finished
    #[error("Request task was cancelled: {0}")]
    TaskCancelled(String),
}
