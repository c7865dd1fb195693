//! JSONコーデック

use super::{Codec, DecodeFailure, Decoded};
use serde_json::Value;

/// JSONデコード失敗時のタグ
pub const JSON_PARSE_FAILURE_TAG: &str = "_jsonparsefailure";

/// JSONコーデック
///
/// - オブジェクト → 1レコード
/// - 配列 → オブジェクト要素ごとに1レコード（それ以外の要素は失敗）
/// - その他の値・空本文・構文エラー → 失敗1件
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn name(&self) -> &'static str {
        "json"
    }

    fn decode(&self, body: &[u8]) -> Vec<Decoded> {
        let value = match serde_json::from_slice::<Value>(body) {
            Ok(value) => value,
            Err(e) => return vec![Err(failure(String::from_utf8_lossy(body), e.to_string()))],
        };

        match value {
            Value::Object(record) => vec![Ok(record)],
            Value::Array(items) => items
                .into_iter()
                .map(|item| match item {
                    Value::Object(record) => Ok(record),
                    other => Err(failure(
                        other.to_string(),
                        "array element is not an object".to_string(),
                    )),
                })
                .collect(),
            other => vec![Err(failure(
                other.to_string(),
                "top-level value is not an object".to_string(),
            ))],
        }
    }
}

fn failure(raw: impl Into<String>, reason: String) -> DecodeFailure {
    DecodeFailure {
        tag: JSON_PARSE_FAILURE_TAG,
        raw: raw.into(),
        reason,
    }
}
