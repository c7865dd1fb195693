//! イベントメタデータ構築
//!
//! 全イベントに付与する`{name, host, url, response_code?}`を組み立てる

use http_poller_common::{Endpoint, PollerMetadata};
use std::sync::Arc;

/// ホスト名が取得できなかった場合の値
const FALLBACK_HOST: &str = "localhost";

/// メタデータビルダー
///
/// ホスト名は構築時に一度だけ解決し、以降は純粋関数として振る舞う。
#[derive(Debug, Clone)]
pub struct MetadataBuilder {
    host: Arc<str>,
}

impl MetadataBuilder {
    /// ホスト名を指定して作成
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: Arc::from(host.into()),
        }
    }

    /// 実行中マシンのホスト名で作成
    pub fn from_system() -> Self {
        let host = sysinfo::System::host_name()
            .filter(|h| !h.trim().is_empty())
            .unwrap_or_else(|| FALLBACK_HOST.to_string());
        Self::new(host)
    }

    /// 解決済みホスト名
    pub fn host(&self) -> &str {
        &self.host
    }

    /// メタデータを構築
    ///
    /// `response_code`はHTTPレスポンスを受信した場合のみ`Some`を渡す。
    pub fn build(&self, endpoint: &Endpoint, response_code: Option<u16>) -> PollerMetadata {
        PollerMetadata {
            name: endpoint.name.clone(),
            host: self.host.to_string(),
            url: endpoint.url.clone(),
            response_code,
        }
    }
}
