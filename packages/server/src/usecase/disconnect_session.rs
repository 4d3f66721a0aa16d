//! UseCase: 切断処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - DisconnectSessionUseCase::execute() メソッド
//! - 切断時の連鎖的な後片付け（コード、承認待ち、グループ）と通知
//!
//! ### なぜこのテストが必要か
//! - ソケットのクローズと生存タイムアウトの両方がこの処理を通る
//! - 2 回呼ばれても安全であることを保証する
//!
//! ### どのような状況を想定しているか
//! - 正常系：N 台とペアリング中の admin の切断
//! - 正常系：承認待ち中の client の切断
//! - エッジケース：既に切断済みの接続

use std::sync::Arc;

use crate::domain::{Connection, ConnectionId, HubRepository, MessagePusher, PairingError};

/// 切断のユースケース
pub struct DisconnectSessionUseCase {
    /// Repository（データアクセス層の抽象化）
    repository: Arc<dyn HubRepository>,
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
}

impl DisconnectSessionUseCase {
    pub fn new(repository: Arc<dyn HubRepository>, message_pusher: Arc<dyn MessagePusher>) -> Self {
        Self {
            repository,
            message_pusher,
        }
    }

    /// 接続を切断し、関連する状態を全て削除する
    ///
    /// # Returns
    ///
    /// * `Ok(Connection)` - 削除した接続
    /// * `Err(PairingError)` - 既に切断済み
    pub async fn execute(&self, id: &ConnectionId) -> Result<Connection, PairingError> {
        // 1. Repository から削除（連鎖的な後片付けを含む）
        let transition = self.repository.disconnect(id).await;

        // 2. MessagePusher から登録解除（送信タスクが終了しソケットが閉じる）
        self.message_pusher.unregister_client(id).await;

        // 3. 残った接続に通知
        self.message_pusher.deliver(transition.outbox).await;

        let connection = transition.result?;
        tracing::info!(
            "Connection '{}' ({}) disconnected",
            id.short(),
            connection.name().as_str()
        );
        Ok(connection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{HubPolicy, Role, pairing_code::CodePolicy},
        usecase::{
            ApprovePairingUseCase, IssueCodeUseCase, RedeemCodeUseCase,
            test_support::{Harness, drain, drain_types},
        },
    };

    fn create_usecases(
        harness: &Harness,
    ) -> (
        IssueCodeUseCase,
        RedeemCodeUseCase,
        ApprovePairingUseCase,
        DisconnectSessionUseCase,
    ) {
        (
            IssueCodeUseCase::new(
                harness.repository.clone(),
                harness.message_pusher.clone(),
                harness.clock.clone(),
            ),
            RedeemCodeUseCase::new(
                harness.repository.clone(),
                harness.message_pusher.clone(),
                harness.clock.clone(),
            ),
            ApprovePairingUseCase::new(harness.repository.clone(), harness.message_pusher.clone()),
            DisconnectSessionUseCase::new(
                harness.repository.clone(),
                harness.message_pusher.clone(),
            ),
        )
    }

    #[tokio::test]
    async fn test_admin_disconnect_notifies_every_client() {
        // テスト項目: N 台とペアリング中の admin が切断すると、N 台それぞれに unpaired(adminDisconnected) が 1 件ずつ届く
        // given (前提条件):
        let harness = Harness::with_policy(HubPolicy {
            codes: CodePolicy {
                max_uses: 3,
                ..CodePolicy::default()
            },
            ..HubPolicy::default()
        });
        let (issue, redeem, approve, disconnect) = create_usecases(&harness);
        let (admin, _admin_rx) = harness.join(Role::Admin, "Operator").await;
        let code = issue.execute(&admin).await.unwrap().code;
        let mut clients = Vec::new();
        for i in 0..3 {
            let (client, mut rx) = harness.join(Role::Client, &format!("Display {i}")).await;
            redeem.execute(&client, &code).await.unwrap();
            approve.execute(&admin, &client).await.unwrap();
            drain(&mut rx);
            clients.push(rx);
        }

        // when (操作):
        let result = disconnect.execute(&admin).await;

        // then (期待する結果):
        assert!(result.is_ok());
        for rx in clients.iter_mut() {
            let messages = drain(rx);
            assert_eq!(messages.len(), 1);
            assert_eq!(messages[0]["type"], "unpaired");
            assert_eq!(messages[0]["adminId"], admin.as_str());
            assert_eq!(messages[0]["reason"], "adminDisconnected");
        }
        let stats = harness.repository.stats().await;
        assert_eq!(stats.pairs, 0);
        assert_eq!(stats.live_codes, 0);
        assert_eq!(stats.admins, 0);
    }

    #[tokio::test]
    async fn test_pending_client_disconnect_cancels_handshake() {
        // テスト項目: 承認待ちの client が切断すると admin に approvalCancelled が届く
        let harness = Harness::new();
        let (issue, redeem, approve, disconnect) = create_usecases(&harness);
        let (admin, mut admin_rx) = harness.join(Role::Admin, "Operator").await;
        let (client, _client_rx) = harness.join(Role::Client, "Lobby TV").await;
        let code = issue.execute(&admin).await.unwrap().code;
        redeem.execute(&client, &code).await.unwrap();
        drain(&mut admin_rx);

        disconnect.execute(&client).await.unwrap();

        let messages = drain(&mut admin_rx);
        assert_eq!(messages[0]["type"], "approvalCancelled");
        assert_eq!(messages[0]["peerId"], client.as_str());
        assert_eq!(messages[0]["reason"], "clientDisconnected");
        assert!(approve.execute(&admin, &client).await.is_err());
    }

    #[tokio::test]
    async fn test_disconnect_twice_is_harmless() {
        // テスト項目: 2 回目の切断はエラーを返すだけで、通知も副作用も無い
        // given (前提条件):
        let harness = Harness::new();
        let (issue, redeem, approve, disconnect) = create_usecases(&harness);
        let (admin, mut admin_rx) = harness.join(Role::Admin, "Operator").await;
        let (client, mut client_rx) = harness.join(Role::Client, "Lobby TV").await;
        let code = issue.execute(&admin).await.unwrap().code;
        redeem.execute(&client, &code).await.unwrap();
        approve.execute(&admin, &client).await.unwrap();
        drain(&mut admin_rx);

        // when (操作):
        let first = disconnect.execute(&client).await;
        let second = disconnect.execute(&client).await;

        // then (期待する結果):
        assert!(first.is_ok());
        assert!(second.is_err());
        assert_eq!(drain_types(&mut admin_rx), vec!["clientUnpaired"]);
        // 登録解除で送信チャンネルが閉じている
        drain(&mut client_rx);
        assert!(client_rx.recv().await.is_none());
    }
}
