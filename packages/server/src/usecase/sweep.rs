//! UseCase: 定期掃除処理
//!
//! Two independent passes driven by timers in the UI layer: expired pairing
//! codes, and connections that stopped sending liveness signals. The liveness
//! pass goes through `DisconnectSessionUseCase`, the same path a socket close
//! takes.
//!
//! ## テスト実装の作業記録
//!
//! ### どのような状況を想定しているか
//! - 期限切れコードの持ち主と使用済み client への通知
//! - 生存タイムアウトした接続の切断と、ペアリング相手への通知

use std::sync::Arc;

use tilecast_shared::time::Clock;

use crate::domain::{ConnectionId, HubRepository, MessagePusher, Timestamp};

use super::DisconnectSessionUseCase;

/// 定期掃除のユースケース
pub struct SweepUseCase {
    repository: Arc<dyn HubRepository>,
    message_pusher: Arc<dyn MessagePusher>,
    clock: Arc<dyn Clock>,
    disconnect_session_usecase: Arc<DisconnectSessionUseCase>,
    /// 最後の生存シグナルからこの時間を過ぎた接続は切断する
    liveness_timeout_ms: i64,
}

impl SweepUseCase {
    pub fn new(
        repository: Arc<dyn HubRepository>,
        message_pusher: Arc<dyn MessagePusher>,
        clock: Arc<dyn Clock>,
        disconnect_session_usecase: Arc<DisconnectSessionUseCase>,
        liveness_timeout_ms: i64,
    ) -> Self {
        Self {
            repository,
            message_pusher,
            clock,
            disconnect_session_usecase,
            liveness_timeout_ms,
        }
    }

    /// 期限切れのペアリングコードを削除する。削除した件数を返す。
    pub async fn expire_codes(&self) -> usize {
        let now = Timestamp::new(self.clock.now_millis());
        let transition = self.repository.expire_codes(now).await;
        self.message_pusher.deliver(transition.outbox).await;

        let expired = transition.result.unwrap_or_default();
        if expired > 0 {
            tracing::info!("Expired {} pairing codes", expired);
        }
        expired
    }

    /// 生存タイムアウトした接続を切断する。切断した接続の ID を返す。
    pub async fn evict_stale(&self) -> Vec<ConnectionId> {
        let now = Timestamp::new(self.clock.now_millis());
        let stale = self
            .repository
            .stale_connections(now, self.liveness_timeout_ms)
            .await;

        for id in &stale {
            tracing::info!("Connection '{}' timed out", id.short());
            if let Err(e) = self.disconnect_session_usecase.execute(id).await {
                tracing::debug!("Timed out connection '{}' already gone: {}", id.short(), e);
            }
        }
        stale
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::Role,
        usecase::{
            ApprovePairingUseCase, HeartbeatUseCase, IssueCodeUseCase, RedeemCodeUseCase,
            test_support::{Harness, drain, drain_types},
        },
    };

    const LIVENESS_TIMEOUT_MS: i64 = 75_000;

    fn create_sweep(harness: &Harness) -> SweepUseCase {
        let disconnect = Arc::new(DisconnectSessionUseCase::new(
            harness.repository.clone(),
            harness.message_pusher.clone(),
        ));
        SweepUseCase::new(
            harness.repository.clone(),
            harness.message_pusher.clone(),
            harness.clock.clone(),
            disconnect,
            LIVENESS_TIMEOUT_MS,
        )
    }

    /// admin と client をペアリングした状態を作る
    async fn pair(
        harness: &Harness,
    ) -> (
        (ConnectionId, tokio::sync::mpsc::UnboundedReceiver<String>),
        (ConnectionId, tokio::sync::mpsc::UnboundedReceiver<String>),
    ) {
        let issue = IssueCodeUseCase::new(
            harness.repository.clone(),
            harness.message_pusher.clone(),
            harness.clock.clone(),
        );
        let redeem = RedeemCodeUseCase::new(
            harness.repository.clone(),
            harness.message_pusher.clone(),
            harness.clock.clone(),
        );
        let approve =
            ApprovePairingUseCase::new(harness.repository.clone(), harness.message_pusher.clone());
        let (admin, mut admin_rx) = harness.join(Role::Admin, "Operator").await;
        let (client, mut client_rx) = harness.join(Role::Client, "Lobby TV").await;
        let code = issue.execute(&admin).await.unwrap().code;
        redeem.execute(&client, &code).await.unwrap();
        approve.execute(&admin, &client).await.unwrap();
        drain(&mut admin_rx);
        drain(&mut client_rx);
        ((admin, admin_rx), (client, client_rx))
    }

    #[tokio::test]
    async fn test_expire_codes_notifies_owner_and_consumers() {
        // テスト項目: 期限切れの掃除で admin に codeExpired、使用済み client に pairingExpired が届く
        // given (前提条件):
        let harness = Harness::new();
        let sweep = create_sweep(&harness);
        let ((_admin, mut admin_rx), (_client, mut client_rx)) = pair(&harness).await;

        // when (操作):
        let before = sweep.expire_codes().await;
        harness.clock.advance(300_000);
        let after = sweep.expire_codes().await;

        // then (期待する結果):
        assert_eq!(before, 0);
        assert_eq!(after, 1);
        assert_eq!(
            drain(&mut admin_rx),
            vec![serde_json::json!({ "type": "codeExpired", "code": "482913" })]
        );
        assert_eq!(
            drain(&mut client_rx),
            vec![serde_json::json!({ "type": "pairingExpired", "code": "482913" })]
        );
        // ペアリング自体は維持される
        assert_eq!(harness.repository.stats().await.pairs, 1);
    }

    #[tokio::test]
    async fn test_evict_stale_disconnects_silent_connection() {
        // テスト項目: 生存シグナルが途絶えた client は切断され、admin に clientUnpaired が届く
        // given (前提条件):
        let harness = Harness::new();
        let sweep = create_sweep(&harness);
        let heartbeat = HeartbeatUseCase::new(
            harness.repository.clone(),
            harness.message_pusher.clone(),
            harness.clock.clone(),
        );
        let ((admin, mut admin_rx), (client, mut client_rx)) = pair(&harness).await;

        // when (操作): admin だけが生存シグナルを送り続ける
        harness.clock.advance(50_000);
        heartbeat.touch(&admin).await.unwrap();
        harness.clock.advance(50_000);
        let evicted = sweep.evict_stale().await;

        // then (期待する結果):
        assert_eq!(evicted, vec![client.clone()]);
        assert_eq!(drain_types(&mut admin_rx), vec!["clientUnpaired"]);
        assert!(client_rx.recv().await.is_none());
        assert!(harness.repository.connection(&client).await.is_none());
        assert!(harness.repository.connection(&admin).await.is_some());
    }
}
