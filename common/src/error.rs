//! エラー型定義
//!
//! 設定読み込み・検証で発生する共通エラー（thiserror使用）

use thiserror::Error;

/// Common layer error type
#[derive(Debug, Error)]
pub enum CommonError {
    /// Configuration source could not be read or deserialized
    #[error("Configuration error: {0}")]
    Config(String),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Unknown codec identifier
    #[error("Unknown codec: {0} (expected one of: json, plain, line)")]
    UnknownCodec(String),
}

/// Result alias for the common layer
pub type CommonResult<T> = Result<T, CommonError>;
