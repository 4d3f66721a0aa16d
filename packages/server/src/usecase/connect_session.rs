//! UseCase: 接続受付処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - ConnectSessionUseCase::execute() メソッド
//! - 新しい接続の登録と `connected` 通知
//!
//! ### どのような状況を想定しているか
//! - 正常系：新規接続
//! - 異常系：最大接続数の超過

use std::sync::Arc;

use tilecast_shared::time::Clock;

use crate::domain::{ConnectionId, HubRepository, MessagePusher, PusherChannel, Timestamp};

use super::error::ConnectError;

/// 接続受付のユースケース
pub struct ConnectSessionUseCase {
    /// Repository（データアクセス層の抽象化）
    repository: Arc<dyn HubRepository>,
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
    clock: Arc<dyn Clock>,
}

impl ConnectSessionUseCase {
    pub fn new(
        repository: Arc<dyn HubRepository>,
        message_pusher: Arc<dyn MessagePusher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repository,
            message_pusher,
            clock,
        }
    }

    /// 新しい接続を受け付ける
    ///
    /// # Returns
    ///
    /// * `Ok(ConnectionId)` - 発行した接続 ID
    /// * `Err(ConnectError)` - 受付失敗
    pub async fn execute(&self, sender: PusherChannel) -> Result<ConnectionId, ConnectError> {
        let id = ConnectionId::generate();
        let now = Timestamp::new(self.clock.now_millis());

        // 1. Repository に接続を追加
        let transition = self.repository.open(&id, now).await;
        transition.result?;

        // 2. MessagePusher に送信チャンネルを登録
        self.message_pusher.register_client(id.clone(), sender).await;

        // 3. connected を通知
        self.message_pusher.deliver(transition.outbox).await;

        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::HubPolicy,
        usecase::test_support::{Harness, T0, drain},
    };
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn test_connect_session_success() {
        // テスト項目: 新規接続に ID が発行され、connected が届く
        // given (前提条件):
        let harness = Harness::new();
        let usecase = ConnectSessionUseCase::new(
            harness.repository.clone(),
            harness.message_pusher.clone(),
            harness.clock.clone(),
        );
        let (tx, mut rx) = mpsc::unbounded_channel();

        // when (操作):
        let id = usecase.execute(tx).await.unwrap();

        // then (期待する結果):
        let messages = drain(&mut rx);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0]["type"], "connected");
        assert_eq!(messages[0]["connectionId"], id.as_str());
        assert_eq!(messages[0]["serverTimeMs"], T0);
        assert_eq!(harness.repository.stats().await.connections, 1);
    }

    #[tokio::test]
    async fn test_connect_session_capacity_exceeded() {
        // テスト項目: 最大接続数を超えると CapacityExceeded が返され、何も登録されない
        // given (前提条件):
        let harness = Harness::with_policy(HubPolicy {
            max_connections: 2,
            ..HubPolicy::default()
        });
        let usecase = ConnectSessionUseCase::new(
            harness.repository.clone(),
            harness.message_pusher.clone(),
            harness.clock.clone(),
        );
        for _ in 0..2 {
            let (tx, _rx) = mpsc::unbounded_channel();
            usecase.execute(tx).await.unwrap();
        }

        // when (操作): 3 本目の接続
        let (tx, mut rx) = mpsc::unbounded_channel();
        let result = usecase.execute(tx).await;

        // then (期待する結果):
        assert_eq!(result, Err(ConnectError::CapacityExceeded { max: 2 }));
        assert!(drain(&mut rx).is_empty());
        assert_eq!(harness.repository.stats().await.connections, 2);
    }
}
