//! 設定管理
//!
//! PollConfig, CodecKind等の設定構造体と設定ファイル読み込み

use crate::error::{CommonError, CommonResult};
use crate::types::Endpoint;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// `request_timeout`未指定時のリクエストタイムアウト（秒）
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

/// レスポンス本文のデコード方式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodecKind {
    /// JSON（デフォルト）
    #[default]
    Json,
    /// 本文全体を1レコードとして扱う
    Plain,
    /// 改行区切りで1行1レコード
    Line,
}

impl CodecKind {
    /// 設定値としての識別子
    pub fn as_str(&self) -> &'static str {
        match self {
            CodecKind::Json => "json",
            CodecKind::Plain => "plain",
            CodecKind::Line => "line",
        }
    }
}

impl fmt::Display for CodecKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CodecKind {
    type Err = CommonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(CodecKind::Json),
            "plain" => Ok(CodecKind::Plain),
            "line" => Ok(CodecKind::Line),
            other => Err(CommonError::UnknownCodec(other.to_string())),
        }
    }
}

/// ポーリング設定
///
/// 起動時に一度だけ構築され、プロセス終了まで変更されない。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollConfig {
    /// エンドポイント名 → URL
    pub urls: BTreeMap<String, String>,

    /// ポーリング間隔（秒）
    #[serde(rename = "interval")]
    pub interval_secs: u64,

    /// デコード方式 (デフォルト: json)
    #[serde(default)]
    pub codec: CodecKind,

    /// リクエストタイムアウト（秒、未指定なら60秒）
    #[serde(
        rename = "request_timeout",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub request_timeout_secs: Option<u64>,
}

impl PollConfig {
    /// 最小構成の設定を作成
    pub fn new(urls: BTreeMap<String, String>, interval_secs: u64) -> Self {
        Self {
            urls,
            interval_secs,
            codec: CodecKind::default(),
            request_timeout_secs: None,
        }
    }

    /// 設定ファイルを読み込む
    ///
    /// 拡張子が`.toml`ならTOML、それ以外はYAML（JSONを含む）として解釈する。
    /// 読み込み後に検証は行わないため、呼び出し側で[`PollConfig::validate`]を呼ぶこと。
    pub fn load(path: &Path) -> CommonResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            CommonError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;

        let is_toml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("toml"))
            .unwrap_or(false);

        if is_toml {
            Self::from_toml_str(&content)
        } else {
            Self::from_yaml_str(&content)
        }
    }

    /// YAML文字列から読み込む
    pub fn from_yaml_str(content: &str) -> CommonResult<Self> {
        serde_yaml::from_str(content).map_err(|e| CommonError::Config(e.to_string()))
    }

    /// TOML文字列から読み込む
    pub fn from_toml_str(content: &str) -> CommonResult<Self> {
        toml::from_str(content).map_err(|e| CommonError::Config(e.to_string()))
    }

    /// 設定値を検証
    ///
    /// URLの構文はここでは検証しない。不正なURLは毎回の転送失敗イベントとして現れる。
    pub fn validate(&self) -> CommonResult<()> {
        if self.urls.is_empty() {
            return Err(CommonError::Validation(
                "urls must contain at least one endpoint".to_string(),
            ));
        }
        for (name, url) in &self.urls {
            if name.trim().is_empty() {
                return Err(CommonError::Validation(
                    "endpoint name must not be empty".to_string(),
                ));
            }
            if url.trim().is_empty() {
                return Err(CommonError::Validation(format!(
                    "url for endpoint '{}' must not be empty",
                    name
                )));
            }
        }
        if self.interval_secs == 0 {
            return Err(CommonError::Validation(
                "interval must be a positive number of seconds".to_string(),
            ));
        }
        if self.request_timeout_secs == Some(0) {
            return Err(CommonError::Validation(
                "request_timeout must be a positive number of seconds".to_string(),
            ));
        }
        Ok(())
    }

    /// エンドポイント一覧
    pub fn endpoints(&self) -> Vec<Endpoint> {
        self.urls
            .iter()
            .map(|(name, url)| Endpoint::new(name.clone(), url.clone()))
            .collect()
    }

    /// ポーリング間隔
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    /// リクエストタイムアウト（未指定時は[`DEFAULT_REQUEST_TIMEOUT_SECS`]）
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(
            self.request_timeout_secs
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
        )
    }
}
