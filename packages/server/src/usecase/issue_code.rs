//! UseCase: ペアリングコード発行処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - IssueCodeUseCase::execute() メソッド
//! - コード発行、発行レート制限、ロール制限
//!
//! ### どのような状況を想定しているか
//! - 正常系：admin がコードを発行する
//! - 異常系：client による発行、60 秒に 4 回目の発行

use std::sync::Arc;

use tilecast_shared::time::Clock;

use crate::domain::{
    ConnectionId, HubRepository, IssuedCode, MessagePusher, PairingError, Timestamp,
};

use super::settle;

/// ペアリングコード発行のユースケース
pub struct IssueCodeUseCase {
    repository: Arc<dyn HubRepository>,
    message_pusher: Arc<dyn MessagePusher>,
    clock: Arc<dyn Clock>,
}

impl IssueCodeUseCase {
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

    /// admin の新しいコードを発行する（以前のコードは無効になる）
    pub async fn execute(&self, admin: &ConnectionId) -> Result<IssuedCode, PairingError> {
        let now = Timestamp::new(self.clock.now_millis());
        let transition = self.repository.issue_code(admin, now).await;
        settle(self.message_pusher.as_ref(), admin, transition).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{CodeError, RegistryError, Role},
        usecase::test_support::{Harness, T0, drain},
    };

    fn create_usecase(harness: &Harness) -> IssueCodeUseCase {
        IssueCodeUseCase::new(
            harness.repository.clone(),
            harness.message_pusher.clone(),
            harness.clock.clone(),
        )
    }

    #[tokio::test]
    async fn test_issue_code_success() {
        // テスト項目: admin がコードを発行すると codeGenerated が届く
        // given (前提条件):
        let harness = Harness::new();
        let usecase = create_usecase(&harness);
        let (admin, mut rx) = harness.join(Role::Admin, "Operator").await;

        // when (操作):
        let issued = usecase.execute(&admin).await.unwrap();

        // then (期待する結果):
        assert_eq!(issued.code.as_str(), "482913");
        let messages = drain(&mut rx);
        assert_eq!(
            messages,
            vec![serde_json::json!({
                "type": "codeGenerated",
                "code": "482913",
                "expiresAtMs": T0 + 300_000,
                "maxUses": 1,
            })]
        );
    }

    #[tokio::test]
    async fn test_issue_code_retires_previous_code() {
        // テスト項目: 再発行すると以前のコードは無効になる
        let harness = Harness::new();
        let usecase = create_usecase(&harness);
        let (admin, _rx) = harness.join(Role::Admin, "Operator").await;

        usecase.execute(&admin).await.unwrap();
        let second = usecase.execute(&admin).await.unwrap();

        assert_eq!(second.code.as_str(), "482914");
        assert_eq!(harness.repository.stats().await.live_codes, 1);
    }

    #[tokio::test]
    async fn test_issue_code_rate_limited() {
        // テスト項目: 60 秒間に 4 回目の発行は rateLimited になり、ウィンドウ経過後は再び発行できる
        // given (前提条件):
        let harness = Harness::new();
        let usecase = create_usecase(&harness);
        let (admin, mut rx) = harness.join(Role::Admin, "Operator").await;
        for _ in 0..3 {
            usecase.execute(&admin).await.unwrap();
        }
        drain(&mut rx);

        // when (操作):
        let limited = usecase.execute(&admin).await;
        harness.clock.advance(60_000);
        let after_window = usecase.execute(&admin).await;

        // then (期待する結果):
        assert_eq!(
            limited.map(|_| ()),
            Err(CodeError::RateLimited {
                retry_after_ms: 60_000
            }
            .into())
        );
        let messages = drain(&mut rx);
        assert_eq!(messages[0]["type"], "error");
        assert_eq!(messages[0]["kind"], "rateLimited");
        assert_eq!(messages[0]["retryAfterMs"], 60_000);
        assert!(after_window.is_ok());
    }

    #[tokio::test]
    async fn test_issue_code_by_client_is_role_violation() {
        // テスト項目: client はコードを発行できない
        let harness = Harness::new();
        let usecase = create_usecase(&harness);
        let (client, mut rx) = harness.join(Role::Client, "Lobby TV").await;

        let result = usecase.execute(&client).await;

        assert_eq!(
            result.map(|_| ()),
            Err(RegistryError::RoleViolation {
                required: Role::Admin
            }
            .into())
        );
        assert_eq!(drain(&mut rx)[0]["kind"], "roleViolation");
        assert_eq!(harness.repository.stats().await.live_codes, 0);
    }
}
