//! UseCase: ペアリング解除処理

use std::sync::Arc;

use crate::domain::{ConnectionId, HubRepository, MessagePusher, PairingError};

use super::settle;

/// ペアリング解除のユースケース
pub struct UnpairUseCase {
    repository: Arc<dyn HubRepository>,
    message_pusher: Arc<dyn MessagePusher>,
}

impl UnpairUseCase {
    pub fn new(repository: Arc<dyn HubRepository>, message_pusher: Arc<dyn MessagePusher>) -> Self {
        Self {
            repository,
            message_pusher,
        }
    }

    /// ペアリングを解除する
    ///
    /// admin は `target` の 1 台（`None` なら全台）を、client は自分自身を解除する。
    /// 解除した件数を返す。
    pub async fn execute(
        &self,
        requester: &ConnectionId,
        target: Option<&ConnectionId>,
    ) -> Result<usize, PairingError> {
        let transition = self.repository.unpair(requester, target).await;
        settle(self.message_pusher.as_ref(), requester, transition).await
    }
}
