//! UseCase: ペアリングコード引き換え処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - RedeemCodeUseCase::execute() メソッド
//! - 引き換え成功時の承認依頼、期限切れ・存在しないコード、レート制限
//!
//! ### なぜこのテストが必要か
//! - 失敗した引き換えがグループを変更しないことを保証する
//! - 期限切れで削除されたコードの持ち主に通知が届くことを確認する

use std::sync::Arc;

use tilecast_shared::time::Clock;

use crate::domain::{
    ConnectionId, HubRepository, MessagePusher, PairingCode, PairingError, Timestamp,
};

use super::settle;

/// ペアリングコード引き換えのユースケース
pub struct RedeemCodeUseCase {
    repository: Arc<dyn HubRepository>,
    message_pusher: Arc<dyn MessagePusher>,
    clock: Arc<dyn Clock>,
}

impl RedeemCodeUseCase {
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

    /// client がコードを入力し、持ち主の admin に承認を依頼する
    pub async fn execute(
        &self,
        client: &ConnectionId,
        code: &PairingCode,
    ) -> Result<(), PairingError> {
        let now = Timestamp::new(self.clock.now_millis());
        let transition = self.repository.redeem_code(client, code, now).await;
        settle(self.message_pusher.as_ref(), client, transition).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{CodeError, Role},
        usecase::{
            IssueCodeUseCase,
            test_support::{Harness, drain, drain_types},
        },
    };

    fn create_usecases(harness: &Harness) -> (IssueCodeUseCase, RedeemCodeUseCase) {
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
        )
    }

    #[tokio::test]
    async fn test_redeem_code_requests_approval() {
        // テスト項目: 引き換えに成功すると admin に approvalRequested、client に approvalPending が届く
        // given (前提条件):
        let harness = Harness::new();
        let (issue, redeem) = create_usecases(&harness);
        let (admin, mut admin_rx) = harness.join(Role::Admin, "Operator").await;
        let (client, mut client_rx) = harness.join(Role::Client, "Lobby TV").await;
        let issued = issue.execute(&admin).await.unwrap();
        drain(&mut admin_rx);

        // when (操作):
        let result = redeem.execute(&client, &issued.code).await;

        // then (期待する結果):
        assert!(result.is_ok());
        assert_eq!(
            drain(&mut admin_rx),
            vec![serde_json::json!({
                "type": "approvalRequested",
                "clientId": client.as_str(),
                "clientName": "Lobby TV",
                "code": "482913",
            })]
        );
        assert_eq!(
            drain(&mut client_rx),
            vec![serde_json::json!({
                "type": "approvalPending",
                "adminId": admin.as_str(),
                "adminName": "Operator",
            })]
        );
    }

    #[tokio::test]
    async fn test_redeem_expired_code() {
        // テスト項目: 期限切れコードは codeExpired エラーとなり、admin に codeExpired が届き、グループは変わらない
        // given (前提条件):
        let harness = Harness::new();
        let (issue, redeem) = create_usecases(&harness);
        let (admin, mut admin_rx) = harness.join(Role::Admin, "Operator").await;
        let (client, mut client_rx) = harness.join(Role::Client, "Lobby TV").await;
        let issued = issue.execute(&admin).await.unwrap();
        drain(&mut admin_rx);

        // when (操作):
        harness.clock.advance(300_000);
        let result = redeem.execute(&client, &issued.code).await;

        // then (期待する結果):
        assert_eq!(result, Err(CodeError::CodeExpired.into()));
        assert_eq!(drain_types(&mut admin_rx), vec!["codeExpired"]);
        let messages = drain(&mut client_rx);
        assert_eq!(messages[0]["type"], "error");
        assert_eq!(messages[0]["code"], "CODE_EXPIRED");
        let stats = harness.repository.stats().await;
        assert_eq!(stats.pairs, 0);
        assert_eq!(stats.pending_approvals, 0);
    }

    #[tokio::test]
    async fn test_redeem_rate_limited_per_redeemer() {
        // テスト項目: 60 秒間に 6 回目の引き換えは rateLimited になる（他の client には影響しない）
        // given (前提条件):
        let harness = Harness::new();
        let (_issue, redeem) = create_usecases(&harness);
        let (guesser, mut guesser_rx) = harness.join(Role::Client, "Guesser").await;
        let (other, _other_rx) = harness.join(Role::Client, "Other").await;
        for n in 0..5 {
            let result = redeem
                .execute(&guesser, &PairingCode::from_number(n))
                .await;
            assert_eq!(result, Err(CodeError::CodeNotFound.into()));
        }
        drain(&mut guesser_rx);

        // when (操作):
        let limited = redeem
            .execute(&guesser, &PairingCode::from_number(5))
            .await;
        let other_result = redeem.execute(&other, &PairingCode::from_number(5)).await;

        // then (期待する結果):
        assert!(matches!(
            limited,
            Err(PairingError::Code(CodeError::RateLimited { .. }))
        ));
        assert_eq!(drain(&mut guesser_rx)[0]["kind"], "rateLimited");
        assert_eq!(other_result, Err(CodeError::CodeNotFound.into()));
    }
}
