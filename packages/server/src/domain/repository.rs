//! Repository trait 定義
//!
//! ドメイン層が必要とするデータアクセスのインターフェースを定義します。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。

use async_trait::async_trait;

use super::{
    Connection, ConnectionId, DisplayName, HubStats, IssuedCode, Outbox, PairingCode,
    PairingError, Role, SyncPlan, TileIndex, Timestamp, WallConfig, WallPatch,
};

/// Outcome of one atomic hub operation
///
/// `outbox` holds the notifications produced by the operation. It can be
/// non-empty even when `result` is an error (e.g. a code evicted while being
/// redeemed still notifies its owner).
#[derive(Debug)]
pub struct Transition<T> {
    pub result: Result<T, PairingError>,
    pub outbox: Outbox,
}

impl<T> Transition<T> {
    pub fn new(result: Result<T, PairingError>, outbox: Outbox) -> Self {
        Self { result, outbox }
    }
}

/// Pairing Hub Repository trait
///
/// UseCase 層はこの trait に依存し、Infrastructure 層の具体的な実装には依存しない。
/// Every method runs as a single critical section over the whole hub.
#[async_trait]
pub trait HubRepository: Send + Sync {
    /// 新しい接続を登録（ロール未設定）
    async fn open(&self, id: &ConnectionId, now: Timestamp) -> Transition<()>;

    /// ロールと表示名を設定
    async fn register(
        &self,
        id: &ConnectionId,
        role: Role,
        display_name: Option<DisplayName>,
        now: Timestamp,
    ) -> Transition<()>;

    /// 生存シグナルを記録
    async fn touch(&self, id: &ConnectionId, now: Timestamp) -> Result<(), PairingError>;

    async fn ping(&self, id: &ConnectionId, now: Timestamp) -> Transition<()>;

    async fn issue_code(&self, admin: &ConnectionId, now: Timestamp) -> Transition<IssuedCode>;

    async fn redeem_code(
        &self,
        client: &ConnectionId,
        code: &PairingCode,
        now: Timestamp,
    ) -> Transition<()>;

    async fn approve(&self, admin: &ConnectionId, client: &ConnectionId) -> Transition<()>;

    async fn reject(
        &self,
        admin: &ConnectionId,
        client: &ConnectionId,
        reason: Option<String>,
    ) -> Transition<()>;

    async fn unpair(
        &self,
        requester: &ConnectionId,
        target: Option<&ConnectionId>,
    ) -> Transition<usize>;

    async fn assign_index(
        &self,
        admin: &ConnectionId,
        target: &ConnectionId,
        index: TileIndex,
    ) -> Transition<()>;

    async fn update_config(&self, admin: &ConnectionId, patch: &WallPatch)
    -> Transition<WallConfig>;

    async fn dispatch(
        &self,
        admin: &ConnectionId,
        overrides: &WallPatch,
        start_delay_ms: Option<i64>,
        now: Timestamp,
    ) -> Transition<SyncPlan>;

    async fn stop(&self, admin: &ConnectionId) -> Transition<usize>;

    /// 接続を切断し、関連する全ての状態を削除
    async fn disconnect(&self, id: &ConnectionId) -> Transition<Connection>;

    /// 期限切れのペアリングコードを削除
    async fn expire_codes(&self, now: Timestamp) -> Transition<usize>;

    /// 生存タイムアウトを過ぎた接続の ID を取得
    async fn stale_connections(&self, now: Timestamp, timeout_ms: i64) -> Vec<ConnectionId>;

    async fn connection(&self, id: &ConnectionId) -> Option<Connection>;

    async fn stats(&self) -> HubStats;
}
