//! UseCase: 同期再生の配信処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - DispatchSyncUseCase::execute() / stop() メソッド
//! - 全員に同じ startAtMs が配信されること、painting モードのタイル割り当て
//!
//! ### どのような状況を想定しているか
//! - 正常系：1 台とペアリングした admin が 2x2 painting で開始する
//! - 正常系：unified モードで複数台に同じコマンドを配信する
//! - 異常系：グループが空、メディア URL 未設定

use std::sync::Arc;

use tilecast_shared::time::Clock;

use crate::domain::{
    ConnectionId, HubRepository, MessagePusher, PairingError, SyncPlan, Timestamp, WallPatch,
};

use super::settle;

/// 同期再生配信のユースケース
pub struct DispatchSyncUseCase {
    repository: Arc<dyn HubRepository>,
    message_pusher: Arc<dyn MessagePusher>,
    clock: Arc<dyn Clock>,
}

impl DispatchSyncUseCase {
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

    /// グループ全員に共通の開始時刻で再生開始を配信する
    ///
    /// `overrides` はこの配信のみに適用され、保存された設定は変わらない。
    pub async fn execute(
        &self,
        admin: &ConnectionId,
        overrides: &WallPatch,
        start_delay_ms: Option<i64>,
    ) -> Result<SyncPlan, PairingError> {
        let now = Timestamp::new(self.clock.now_millis());
        let transition = self
            .repository
            .dispatch(admin, overrides, start_delay_ms, now)
            .await;
        settle(self.message_pusher.as_ref(), admin, transition).await
    }

    /// グループ全員に即時停止を配信する
    pub async fn stop(&self, admin: &ConnectionId) -> Result<usize, PairingError> {
        let transition = self.repository.stop(admin).await;
        settle(self.message_pusher.as_ref(), admin, transition).await
    }
}
