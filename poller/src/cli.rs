//! コマンドライン引数
//!
//! 優先順位は CLI引数 > 環境変数 > 設定ファイル。

use clap::Parser;
use http_poller_common::{CodecKind, CommonError, CommonResult, PollConfig};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// HTTP poller - Periodically polls HTTP endpoints and emits their responses as events
#[derive(Parser, Debug, Clone)]
#[command(name = "http-poller")]
#[command(version, about, long_about = None)]
#[command(after_help = r#"ENVIRONMENT VARIABLES:
    HTTP_POLLER_INTERVAL         Poll interval in seconds
    HTTP_POLLER_CODEC            Body codec: json, plain, line (default: json)
    HTTP_POLLER_REQUEST_TIMEOUT  Per-request timeout in seconds (default: 60)
    HTTP_POLLER_LOG_LEVEL        Log level (fallback: RUST_LOG, default: info)
    HTTP_POLLER_LOG_FORMAT       Log format: pretty, json (default: pretty)
"#)]
pub struct Cli {
    /// Configuration file (YAML, JSON or TOML)
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Endpoint to poll, repeatable; overrides a file entry with the same name
    #[arg(short = 'u', long = "url", value_name = "NAME=URL", value_parser = parse_endpoint)]
    pub urls: Vec<(String, String)>,

    /// Poll interval in seconds
    #[arg(short, long, value_name = "SECONDS", env = "HTTP_POLLER_INTERVAL")]
    pub interval: Option<u64>,

    /// Body codec
    #[arg(long, value_name = "CODEC", env = "HTTP_POLLER_CODEC")]
    pub codec: Option<CodecKind>,

    /// Per-request timeout in seconds (default: 60)
    #[arg(long, value_name = "SECONDS", env = "HTTP_POLLER_REQUEST_TIMEOUT")]
    pub request_timeout: Option<u64>,
}

impl Cli {
    /// 設定ファイルと引数を合成し、検証済みの設定を返す
    pub fn into_config(self) -> CommonResult<PollConfig> {
        let mut config = match &self.config {
            Some(path) => PollConfig::load(path)?,
            None => PollConfig::new(BTreeMap::new(), 0),
        };

        config.urls.extend(self.urls);
        if let Some(interval) = self.interval {
            config.interval_secs = interval;
        }
        if let Some(codec) = self.codec {
            config.codec = codec;
        }
        if let Some(timeout) = self.request_timeout {
            config.request_timeout_secs = Some(timeout);
        }

        config.validate()?;
        Ok(config)
    }
}

/// `NAME=URL` を分解
fn parse_endpoint(s: &str) -> Result<(String, String), CommonError> {
    match s.split_once('=') {
        Some((name, url)) if !name.trim().is_empty() && !url.trim().is_empty() => {
            Ok((name.trim().to_string(), url.trim().to_string()))
        }
        _ => Err(CommonError::Validation(format!(
            "expected NAME=URL, got '{}'",
            s
        ))),
    }
}
