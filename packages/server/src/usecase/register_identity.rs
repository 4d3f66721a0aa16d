//! UseCase: ロール登録処理

use std::sync::Arc;

use tilecast_shared::time::Clock;

use crate::domain::{
    ConnectionId, DisplayName, HubRepository, MessagePusher, PairingError, Role, Timestamp,
};

use super::settle;

/// ロール登録のユースケース
pub struct RegisterIdentityUseCase {
    repository: Arc<dyn HubRepository>,
    message_pusher: Arc<dyn MessagePusher>,
    clock: Arc<dyn Clock>,
}

impl RegisterIdentityUseCase {
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

    /// ロールと表示名を設定する（接続ごとに 1 回のみ）
    pub async fn execute(
        &self,
        id: &ConnectionId,
        role: Role,
        display_name: Option<DisplayName>,
    ) -> Result<(), PairingError> {
        let now = Timestamp::new(self.clock.now_millis());
        let transition = self.repository.register(id, role, display_name, now).await;
        settle(self.message_pusher.as_ref(), id, transition).await?;
        tracing::info!("Connection '{}' registered as {}", id.short(), role);
        Ok(())
    }
}
