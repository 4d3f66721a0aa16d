//! UseCase: サーバー時刻取得
//!
//! Reads the same clock the sync dispatcher uses, so displays can estimate
//! their offset from the server.

use std::sync::Arc;

use tilecast_shared::time::Clock;

use crate::domain::Timestamp;

/// サーバー時刻取得のユースケース
pub struct GetServerTimeUseCase {
    clock: Arc<dyn Clock>,
}

impl GetServerTimeUseCase {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    pub fn execute(&self) -> Timestamp {
        Timestamp::new(self.clock.now_millis())
    }
}
