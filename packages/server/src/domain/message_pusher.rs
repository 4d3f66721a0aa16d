//! MessagePusher trait 定義
//!
//! クライアントへの通知のインターフェース。
//! 具体的な実装（WebSocket など）は Infrastructure 層が提供します。

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{ConnectionId, MessagePushError, Notice, Outbox};

/// 接続ごとの送信チャンネル
///
/// The sending half is owned by the pusher. Dropping it ends the
/// connection's writer task, which closes the socket.
pub type PusherChannel = mpsc::UnboundedSender<String>;

#[async_trait]
pub trait MessagePusher: Send + Sync {
    /// クライアントの送信チャンネルを登録
    async fn register_client(&self, id: ConnectionId, sender: PusherChannel);

    /// クライアントの送信チャンネルを削除
    async fn unregister_client(&self, id: &ConnectionId);

    /// 特定のクライアントに通知を送信
    async fn push_to(&self, id: &ConnectionId, notice: &Notice) -> Result<(), MessagePushError>;

    /// Outbox の全通知を宛先ごとに送信
    ///
    /// Best effort: a recipient that already went away is skipped.
    async fn deliver(&self, outbox: Outbox);
}
