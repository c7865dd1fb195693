//! HTTP Poller
//!
//! 設定された複数のHTTPエンドポイントを固定間隔でポーリングし、
//! レスポンス（または転送失敗）を構造化イベントとしてシンクへ送出する。
//!
//! 1つのエンドポイントの失敗が他のエンドポイントやスケジューラーに
//! 影響することはない。

#![warn(missing_docs)]

/// レスポンス分類
pub mod classifier;

/// コマンドライン引数
pub mod cli;

/// 本文デコード
pub mod codec;

/// 環境変数ヘルパー
pub mod config;

/// リクエストディスパッチャー
pub mod dispatcher;

/// エラー型定義
pub mod error;

/// ログ初期化
pub mod logging;

/// イベントメタデータ
pub mod metadata;

/// ポーリングスケジューラー
pub mod scheduler;

/// シャットダウン制御
pub mod shutdown;

/// イベントシンク
pub mod sink;

/// HTTPトランスポート
pub mod transport;

pub use classifier::{Classification, ResponseClassifier};
pub use dispatcher::{Dispatcher, SharedTransport, TickSummary};
pub use error::{DispatchError, SinkError, TransportError};
pub use metadata::MetadataBuilder;
pub use scheduler::PollScheduler;
pub use shutdown::ShutdownController;
pub use sink::{ChannelSink, EventSink, MemorySink, SharedSink};
pub use transport::{HttpResponse, HttpTransport, ReqwestTransport, ResponseHandler};
