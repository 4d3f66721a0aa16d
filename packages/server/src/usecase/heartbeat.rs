//! UseCase: 生存確認処理
//!
//! Every inbound frame counts as a liveness signal. `ping` additionally
//! answers with the server clock.

use std::sync::Arc;

use tilecast_shared::time::Clock;

use crate::domain::{ConnectionId, HubRepository, MessagePusher, PairingError, Timestamp};

use super::settle;

/// 生存確認のユースケース
pub struct HeartbeatUseCase {
    repository: Arc<dyn HubRepository>,
    message_pusher: Arc<dyn MessagePusher>,
    clock: Arc<dyn Clock>,
}

impl HeartbeatUseCase {
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

    /// 生存シグナルを記録する
    pub async fn touch(&self, id: &ConnectionId) -> Result<(), PairingError> {
        let now = Timestamp::new(self.clock.now_millis());
        self.repository.touch(id, now).await
    }

    /// ping に pong で応答する
    pub async fn ping(&self, id: &ConnectionId) -> Result<(), PairingError> {
        let now = Timestamp::new(self.clock.now_millis());
        let transition = self.repository.ping(id, now).await;
        settle(self.message_pusher.as_ref(), id, transition).await
    }
}
