//! コーデック
//!
//! レスポンス本文をレコードへ変換する。デコードに失敗しても例外的な制御は行わず、
//! 生テキストとタグを持つ[`DecodeFailure`]として返す。

pub mod json;
pub mod text;

pub use json::JsonCodec;
pub use text::{LineCodec, PlainCodec};

use http_poller_common::CodecKind;
use serde_json::{Map, Value};
use std::sync::Arc;

/// デコード済みレコード
pub type Record = Map<String, Value>;

/// コーデックが何も生成しなかったときに付与するタグ
pub const EMPTY_DECODE_TAG: &str = "_decodefailure";

/// デコード失敗
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeFailure {
    /// イベントに付与するタグ
    pub tag: &'static str,
    /// デコードできなかった生テキスト
    pub raw: String,
    /// 失敗理由（ログ用）
    pub reason: String,
}

/// 1レコード分のデコード結果
pub type Decoded = Result<Record, DecodeFailure>;

/// 本文デコード機能
///
/// 1つの本文から0個以上のレコードを生成する。実装はパニックしてはならない。
pub trait Codec: Send + Sync {
    /// コーデック識別子
    fn name(&self) -> &'static str;

    /// 本文をデコード
    fn decode(&self, body: &[u8]) -> Vec<Decoded>;
}

/// Arc でラップされたコーデック
pub type SharedCodec = Arc<dyn Codec>;

/// 設定値からコーデックを生成
pub fn build(kind: CodecKind) -> SharedCodec {
    match kind {
        CodecKind::Json => Arc::new(JsonCodec),
        CodecKind::Plain => Arc::new(PlainCodec),
        CodecKind::Line => Arc::new(LineCodec),
    }
}

/// `message`フィールドのみを持つレコードを作成
pub(crate) fn message_record(text: impl Into<String>) -> Record {
    let mut record = Map::new();
    record.insert(
        http_poller_common::types::MESSAGE_FIELD.to_string(),
        Value::String(text.into()),
    );
    record
}
