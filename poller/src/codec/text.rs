//! テキストコーデック（plain / line）
//!
//! 不正なUTF-8は置換文字に変換するため、デコード失敗は発生しない。

use super::{message_record, Codec, Decoded};

/// 本文全体を`message`とする1レコードを生成
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainCodec;

impl Codec for PlainCodec {
    fn name(&self) -> &'static str {
        "plain"
    }

    fn decode(&self, body: &[u8]) -> Vec<Decoded> {
        vec![Ok(message_record(String::from_utf8_lossy(body)))]
    }
}

/// 改行区切りで1行1レコードを生成
#[derive(Debug, Clone, Copy, Default)]
pub struct LineCodec;

impl Codec for LineCodec {
    fn name(&self) -> &'static str {
        "line"
    }

    fn decode(&self, body: &[u8]) -> Vec<Decoded> {
        let text = String::from_utf8_lossy(body);
        let mut lines: Vec<&str> = text.split('\n').collect();
        // 末尾の改行の後ろは空要素になる
        if lines.last().is_some_and(|last| last.is_empty()) {
            lines.pop();
        }
        lines
            .into_iter()
            .map(|line| Ok(message_record(line.strip_suffix('\r').unwrap_or(line))))
            .collect()
    }
}
