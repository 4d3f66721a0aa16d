//! UseCase: ペアリング承認処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - ApprovePairingUseCase::execute() メソッド
//! - 承認によるグループ参加、単回使用コードの消費、再ペアリング
//!
//! ### どのような状況を想定しているか
//! - 正常系：承認待ちの client を承認する
//! - 異常系：承認待ちが無い、他の admin 宛ての承認待ち
//! - エッジケース：単回使用コードを 2 台目が引き換える

use std::sync::Arc;

use crate::domain::{ConnectionId, HubRepository, MessagePusher, PairingError};

use super::settle;

/// ペアリング承認のユースケース
pub struct ApprovePairingUseCase {
    repository: Arc<dyn HubRepository>,
    message_pusher: Arc<dyn MessagePusher>,
}

impl ApprovePairingUseCase {
    pub fn new(repository: Arc<dyn HubRepository>, message_pusher: Arc<dyn MessagePusher>) -> Self {
        Self {
            repository,
            message_pusher,
        }
    }

    /// 承認待ちの client を admin のグループに加える
    pub async fn execute(
        &self,
        admin: &ConnectionId,
        client: &ConnectionId,
    ) -> Result<(), PairingError> {
        let transition = self.repository.approve(admin, client).await;
        settle(self.message_pusher.as_ref(), admin, transition).await?;
        tracing::info!("Admin '{}' paired with '{}'", admin.short(), client.short());
        Ok(())
    }
}
