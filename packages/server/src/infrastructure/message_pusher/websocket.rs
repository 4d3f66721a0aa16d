//! WebSocket を使った MessagePusher 実装
//!
//! ## 責務
//!
//! - 接続ごとの `UnboundedSender` を管理
//! - `Notice` を JSON にエンコードして送信（push_to, deliver）
//!
//! ## 設計ノート
//!
//! WebSocket の生成は UI 層（`ui/handler/websocket.rs`）で行われます。
//! この実装は生成された sender を受け取り、メッセージ送信に使用します。
//! `unregister_client` で sender を破棄すると、UI 層の送信タスクが終了し
//! ソケットが閉じられます。

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::{
    domain::{ConnectionId, MessagePushError, MessagePusher, Notice, Outbox, PusherChannel},
    infrastructure::dto::websocket::ServerMessage,
};

/// Encode a notice as the JSON text frame sent to clients.
pub fn encode_notice(notice: Notice) -> Result<String, MessagePushError> {
    serde_json::to_string(&ServerMessage::from(notice))
        .map_err(|e| MessagePushError::Encode(e.to_string()))
}

/// WebSocket を使った MessagePusher 実装
pub struct WebSocketMessagePusher {
    /// 接続中のクライアントの sender
    clients: Arc<Mutex<HashMap<ConnectionId, PusherChannel>>>,
}

impl WebSocketMessagePusher {
    pub fn new(clients: Arc<Mutex<HashMap<ConnectionId, PusherChannel>>>) -> Self {
        Self { clients }
    }

    fn send(
        sender: &PusherChannel,
        id: &ConnectionId,
        notice: Notice,
    ) -> Result<(), MessagePushError> {
        let json = encode_notice(notice)?;
        sender
            .send(json)
            .map_err(|e| MessagePushError::PushFailed(e.to_string()))?;
        tracing::debug!("Pushed message to '{}'", id.short());
        Ok(())
    }
}

impl Default for WebSocketMessagePusher {
    fn default() -> Self {
        Self::new(Arc::new(Mutex::new(HashMap::new())))
    }
}

#[async_trait]
impl MessagePusher for WebSocketMessagePusher {
    async fn register_client(&self, id: ConnectionId, sender: PusherChannel) {
        let mut clients = self.clients.lock().await;
        tracing::debug!("Connection '{}' registered to MessagePusher", id.short());
        clients.insert(id, sender);
    }

    async fn unregister_client(&self, id: &ConnectionId) {
        let mut clients = self.clients.lock().await;
        if clients.remove(id).is_some() {
            tracing::debug!("Connection '{}' unregistered from MessagePusher", id.short());
        }
    }

    async fn push_to(&self, id: &ConnectionId, notice: &Notice) -> Result<(), MessagePushError> {
        let clients = self.clients.lock().await;
        let sender = clients
            .get(id)
            .ok_or_else(|| MessagePushError::ClientNotFound(id.to_string()))?;
        Self::send(sender, id, notice.clone())
    }

    async fn deliver(&self, outbox: Outbox) {
        if outbox.is_empty() {
            return;
        }
        let clients = self.clients.lock().await;

        for delivery in outbox {
            match clients.get(&delivery.to) {
                // 送信の失敗は許容（相手は切断済み）
                Some(sender) => {
                    if let Err(e) = Self::send(sender, &delivery.to, delivery.notice) {
                        tracing::warn!(
                            "Failed to push message to '{}': {}",
                            delivery.to.short(),
                            e
                        );
                    }
                }
                None => {
                    tracing::debug!(
                        "Connection '{}' not found during delivery, skipping",
                        delivery.to.short()
                    );
                }
            }
        }
    }
}
