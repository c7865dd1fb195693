//! 共通型定義
//!
//! Endpoint, Metadata, Event等のコアデータ型

use chrono::{DateTime, Utc};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

/// メタデータを格納する`@metadata`配下の名前空間
pub const METADATA_NAMESPACE: &str = "http_poller";

/// 転送失敗イベントのフィールド名
pub const REQUEST_FAILURE_FIELD: &str = "_http_request_failure";

/// 生テキストを格納するフィールド名
pub const MESSAGE_FIELD: &str = "message";

/// `@timestamp`が解釈できなかったときに付与するタグ
pub const TIMESTAMP_PARSE_FAILURE_TAG: &str = "_timestampparsefailure";

const TIMESTAMP_KEY: &str = "@timestamp";
const METADATA_KEY: &str = "@metadata";
const TAGS_KEY: &str = "tags";
const RAW_TIMESTAMP_KEY: &str = "_@timestamp";

/// ポーリング対象のエンドポイント
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Endpoint {
    /// 設定上の名前（設定内で一意）
    pub name: String,
    /// リクエスト先URL
    pub url: String,
}

impl Endpoint {
    /// 新しいエンドポイントを作成
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

/// 全イベントに付与されるメタデータ
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollerMetadata {
    /// エンドポイント名
    pub name: String,
    /// ポーリングしているプロセスのホスト名
    pub host: String,
    /// リクエスト先URL
    pub url: String,
    /// HTTPステータス（レスポンスを受信した場合のみ）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_code: Option<u16>,
}

/// `_http_request_failure`フィールドの内容
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestFailure {
    /// リクエスト先URL
    pub url: String,
    /// エンドポイント名
    pub name: String,
    /// 転送エラーの説明
    pub error: String,
}

/// 下流キューへ送出されるイベント
///
/// コーデックが生成したフィールドに`@timestamp`・`@metadata`・`tags`を
/// 重ねたものとしてシリアライズされる。
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    timestamp: DateTime<Utc>,
    metadata: PollerMetadata,
    tags: Vec<String>,
    fields: Map<String, Value>,
}

impl Event {
    /// デコード済みレコードからイベントを作成
    ///
    /// レコード内の`tags`はタグとして取り込み、`@timestamp`はRFC 3339として解釈する。
    /// 解釈できない`@timestamp`は`_@timestamp`に退避して
    /// `_timestampparsefailure`タグを付与する。
    pub fn from_record(mut record: Map<String, Value>, metadata: PollerMetadata) -> Self {
        let mut tags = Vec::new();
        let mut timestamp = Utc::now();

        record.remove(METADATA_KEY);

        if let Some(raw_tags) = record.remove(TAGS_KEY) {
            match raw_tags {
                Value::Array(values) => tags.extend(values.into_iter().map(tag_text)),
                other => tags.push(tag_text(other)),
            }
        }

        if let Some(raw_ts) = record.remove(TIMESTAMP_KEY) {
            match raw_ts
                .as_str()
                .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            {
                Some(parsed) => timestamp = parsed.with_timezone(&Utc),
                None => {
                    record.insert(RAW_TIMESTAMP_KEY.to_string(), raw_ts);
                    tags.push(TIMESTAMP_PARSE_FAILURE_TAG.to_string());
                }
            }
        }

        Self {
            timestamp,
            metadata,
            tags,
            fields: record,
        }
    }

    /// デコードに失敗した本文からイベントを作成
    pub fn decode_failure(raw: impl Into<String>, tag: &str, metadata: PollerMetadata) -> Self {
        let mut fields = Map::new();
        fields.insert(MESSAGE_FIELD.to_string(), Value::String(raw.into()));
        Self {
            timestamp: Utc::now(),
            metadata,
            tags: vec![tag.to_string()],
            fields,
        }
    }

    /// 転送失敗イベントを作成
    pub fn request_failure(failure: RequestFailure, metadata: PollerMetadata) -> Self {
        let mut fields = Map::new();
        fields.insert(
            REQUEST_FAILURE_FIELD.to_string(),
            serde_json::json!({
                "url": failure.url,
                "name": failure.name,
                "error": failure.error,
            }),
        );
        Self {
            timestamp: Utc::now(),
            metadata,
            tags: Vec::new(),
            fields,
        }
    }

    /// イベント時刻
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// 付与されたメタデータ
    pub fn metadata(&self) -> &PollerMetadata {
        &self.metadata
    }

    /// タグ一覧
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// 指定タグを持つか
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// イベント本体のフィールド
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// フィールドを取得
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// 転送失敗情報（転送失敗イベントの場合のみ）
    pub fn request_failure_info(&self) -> Option<RequestFailure> {
        self.fields
            .get(REQUEST_FAILURE_FIELD)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// JSON値に変換
    pub fn to_value(&self) -> Value {
        // Serialize実装はMapとStringのみを扱うため失敗しない
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

fn tag_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

#[derive(Serialize)]
struct MetadataEnvelope<'a> {
    http_poller: &'a PollerMetadata,
}

impl Serialize for Event {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        for (key, value) in &self.fields {
            map.serialize_entry(key, value)?;
        }
        map.serialize_entry(TIMESTAMP_KEY, &self.timestamp.to_rfc3339())?;
        map.serialize_entry(
            METADATA_KEY,
            &MetadataEnvelope {
                http_poller: &self.metadata,
            },
        )?;
        if !self.tags.is_empty() {
            map.serialize_entry(TAGS_KEY, &self.tags)?;
        }
        map.end()
    }
}
