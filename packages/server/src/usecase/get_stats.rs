//! UseCase: 統計情報取得

use std::sync::Arc;

use crate::domain::{HubRepository, HubStats};

/// 統計情報取得のユースケース
pub struct GetStatsUseCase {
    repository: Arc<dyn HubRepository>,
}

impl GetStatsUseCase {
    pub fn new(repository: Arc<dyn HubRepository>) -> Self {
        Self { repository }
    }

    pub async fn execute(&self) -> HubStats {
        self.repository.stats().await
    }
}
