//! UseCase: ウォール設定処理
//!
//! グリッド・モード・メディア URL の更新と、タイル番号の明示的な割り当て。

use std::sync::Arc;

use crate::domain::{
    ConnectionId, HubRepository, MessagePusher, PairingError, TileIndex, WallConfig, WallPatch,
};

use super::settle;

/// ウォール設定のユースケース
pub struct ConfigureWallUseCase {
    repository: Arc<dyn HubRepository>,
    message_pusher: Arc<dyn MessagePusher>,
}

impl ConfigureWallUseCase {
    pub fn new(repository: Arc<dyn HubRepository>, message_pusher: Arc<dyn MessagePusher>) -> Self {
        Self {
            repository,
            message_pusher,
        }
    }

    /// admin のウォール設定を部分更新する
    pub async fn update_config(
        &self,
        admin: &ConnectionId,
        patch: &WallPatch,
    ) -> Result<WallConfig, PairingError> {
        let transition = self.repository.update_config(admin, patch).await;
        settle(self.message_pusher.as_ref(), admin, transition).await
    }

    /// メンバー（または admin 自身）にタイル番号を割り当てる
    pub async fn assign_index(
        &self,
        admin: &ConnectionId,
        target: &ConnectionId,
        index: TileIndex,
    ) -> Result<(), PairingError> {
        let transition = self.repository.assign_index(admin, target, index).await;
        settle(self.message_pusher.as_ref(), admin, transition).await
    }
}
