//! ログ初期化
//!
//! ログは標準エラーへ出力する。標準出力はイベント出力専用。

use crate::config::{get_env_parse, get_env_with_fallback};
use std::str::FromStr;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// ログレベルの環境変数
pub const LOG_LEVEL_ENV: &str = "HTTP_POLLER_LOG_LEVEL";
/// ログ形式の環境変数
pub const LOG_FORMAT_ENV: &str = "HTTP_POLLER_LOG_FORMAT";
/// デフォルトのログレベル
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// ログ出力形式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// 人間向けテキスト
    #[default]
    Pretty,
    /// 1行1JSON
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format: {}", other)),
        }
    }
}

/// フィルタ指定を環境変数から決定
///
/// `HTTP_POLLER_LOG_LEVEL` → `RUST_LOG` → `info` の順。
pub fn filter_directive() -> String {
    get_env_with_fallback(LOG_LEVEL_ENV, "RUST_LOG")
        .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string())
}

/// ログ形式を環境変数から決定（不正値はPretty）
pub fn log_format() -> LogFormat {
    get_env_parse(LOG_FORMAT_ENV, LogFormat::default())
}

/// グローバルサブスクライバーを初期化
///
/// 不正なフィルタ指定は`info`として扱う。二重初期化はエラーを返す。
pub fn init() -> Result<(), TryInitError> {
    let filter = EnvFilter::try_new(filter_directive())
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL));
    let registry = tracing_subscriber::registry().with(filter);

    match log_format() {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init(),
        LogFormat::Pretty => registry
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .try_init(),
    }
}
