//! UseCase: ペアリング拒否処理

use std::sync::Arc;

use crate::domain::{ConnectionId, HubRepository, MessagePusher, PairingError};

use super::settle;

/// ペアリング拒否のユースケース
pub struct RejectPairingUseCase {
    repository: Arc<dyn HubRepository>,
    message_pusher: Arc<dyn MessagePusher>,
}

impl RejectPairingUseCase {
    pub fn new(repository: Arc<dyn HubRepository>, message_pusher: Arc<dyn MessagePusher>) -> Self {
        Self {
            repository,
            message_pusher,
        }
    }

    /// 承認待ちを破棄する（コードの使用回数は消費しない）
    pub async fn execute(
        &self,
        admin: &ConnectionId,
        client: &ConnectionId,
        reason: Option<String>,
    ) -> Result<(), PairingError> {
        let transition = self.repository.reject(admin, client, reason).await;
        settle(self.message_pusher.as_ref(), admin, transition).await
    }
}
