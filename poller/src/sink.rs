//! イベントシンク
//!
//! 構築したイベントの送出先。複数のリクエストタスクから同時に追記される。

use crate::error::SinkError;
use http_poller_common::Event;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

/// 追記専用のイベント送出先
pub trait EventSink: Send + Sync {
    /// イベントを追記する
    fn push(&self, event: Event) -> Result<(), SinkError>;
}

/// Arc でラップされたシンク
pub type SharedSink = Arc<dyn EventSink>;

/// tokioチャネルへ転送するシンク
///
/// 受信側が破棄されると`SinkError::Closed`を返す。
#[derive(Debug, Clone)]
pub struct ChannelSink {
    sender: mpsc::UnboundedSender<Event>,
}

impl ChannelSink {
    /// シンクと受信側を作成
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Event>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl EventSink for ChannelSink {
    fn push(&self, event: Event) -> Result<(), SinkError> {
        self.sender.send(event).map_err(|_| SinkError::Closed)
    }
}

/// メモリ上に蓄積するシンク
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<Event>>,
}

impl MemorySink {
    /// 空のシンクを作成
    pub fn new() -> Self {
        Self::default()
    }

    /// 蓄積済みイベントのスナップショット
    pub fn events(&self) -> Vec<Event> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// 蓄積済みイベント数
    pub fn len(&self) -> usize {
        self.events.lock().map(|events| events.len()).unwrap_or(0)
    }

    /// 空かどうか
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl EventSink for MemorySink {
    fn push(&self, event: Event) -> Result<(), SinkError> {
        let mut events = self
            .events
            .lock()
            .map_err(|e| SinkError::Rejected(e.to_string()))?;
        events.push(event);
        Ok(())
    }
}
