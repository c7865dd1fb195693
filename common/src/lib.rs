//! HTTP Poller Common
//!
//! ポーラー本体と下流コンシューマーで共有するデータ型・設定・エラー

#![warn(missing_docs)]

/// 設定管理
pub mod config;

/// エラー型定義
pub mod error;

/// 共通型定義
pub mod types;

pub use config::{CodecKind, PollConfig, DEFAULT_REQUEST_TIMEOUT_SECS};
pub use error::{CommonError, CommonResult};
pub use types::{Endpoint, Event, PollerMetadata, RequestFailure};
