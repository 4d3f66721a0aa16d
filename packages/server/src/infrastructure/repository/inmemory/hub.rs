//! InMemory Hub Repository 実装
//!
//! ドメイン層が定義する HubRepository trait の具体的な実装。
//! `PairingHub` 集約をそのままインメモリ DB として使用します。
//!
//! All pairing state sits behind one mutex. Each method is a single short
//! critical section with no I/O; notifications are returned in the
//! `Transition` and pushed by the caller after the lock is released.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{
    Connection, ConnectionId, DisplayName, HubRepository, HubStats, IssuedCode, Outbox,
    PairingCode, PairingError, PairingHub, Role, SyncPlan, TileIndex, Timestamp, Transition,
    WallConfig, WallPatch,
};

/// インメモリ Hub Repository 実装
pub struct InMemoryHubRepository {
    hub: Arc<Mutex<PairingHub>>,
}

impl InMemoryHubRepository {
    pub fn new(hub: Arc<Mutex<PairingHub>>) -> Self {
        Self { hub }
    }

    /// Run `op` under the hub lock, collecting its notifications.
    async fn transact<T, F>(&self, op: F) -> Transition<T>
    where
        F: FnOnce(&mut PairingHub, &mut Outbox) -> Result<T, PairingError> + Send,
        T: Send,
    {
        let mut hub = self.hub.lock().await;
        let mut outbox = Outbox::new();
        let result = op(&mut *hub, &mut outbox);
        Transition::new(result, outbox)
    }
}

#[async_trait]
impl HubRepository for InMemoryHubRepository {
    async fn open(&self, id: &ConnectionId, now: Timestamp) -> Transition<()> {
        self.transact(|hub, out| hub.open(id, now, out)).await
    }

    async fn register(
        &self,
        id: &ConnectionId,
        role: Role,
        display_name: Option<DisplayName>,
        now: Timestamp,
    ) -> Transition<()> {
        self.transact(|hub, out| hub.register(id, role, display_name, now, out))
            .await
    }

    async fn touch(&self, id: &ConnectionId, now: Timestamp) -> Result<(), PairingError> {
        let mut hub = self.hub.lock().await;
        hub.touch(id, now)
    }

    async fn ping(&self, id: &ConnectionId, now: Timestamp) -> Transition<()> {
        self.transact(|hub, out| hub.ping(id, now, out)).await
    }

    async fn issue_code(&self, admin: &ConnectionId, now: Timestamp) -> Transition<IssuedCode> {
        self.transact(|hub, out| hub.issue_code(admin, now, out))
            .await
    }

    async fn redeem_code(
        &self,
        client: &ConnectionId,
        code: &PairingCode,
        now: Timestamp,
    ) -> Transition<()> {
        self.transact(|hub, out| hub.redeem_code(client, code, now, out))
            .await
    }

    async fn approve(&self, admin: &ConnectionId, client: &ConnectionId) -> Transition<()> {
        self.transact(|hub, out| hub.approve(admin, client, out))
            .await
    }

    async fn reject(
        &self,
        admin: &ConnectionId,
        client: &ConnectionId,
        reason: Option<String>,
    ) -> Transition<()> {
        self.transact(|hub, out| hub.reject(admin, client, reason, out))
            .await
    }

    async fn unpair(
        &self,
        requester: &ConnectionId,
        target: Option<&ConnectionId>,
    ) -> Transition<usize> {
        self.transact(|hub, out| hub.unpair(requester, target, out))
            .await
    }

    async fn assign_index(
        &self,
        admin: &ConnectionId,
        target: &ConnectionId,
        index: TileIndex,
    ) -> Transition<()> {
        self.transact(|hub, out| hub.assign_index(admin, target, index, out))
            .await
    }

    async fn update_config(
        &self,
        admin: &ConnectionId,
        patch: &WallPatch,
    ) -> Transition<WallConfig> {
        self.transact(|hub, out| hub.update_config(admin, patch, out))
            .await
    }

    async fn dispatch(
        &self,
        admin: &ConnectionId,
        overrides: &WallPatch,
        start_delay_ms: Option<i64>,
        now: Timestamp,
    ) -> Transition<SyncPlan> {
        self.transact(|hub, out| hub.dispatch(admin, overrides, start_delay_ms, now, out))
            .await
    }

    async fn stop(&self, admin: &ConnectionId) -> Transition<usize> {
        self.transact(|hub, out| hub.stop(admin, out)).await
    }

    async fn disconnect(&self, id: &ConnectionId) -> Transition<Connection> {
        self.transact(|hub, out| hub.disconnect(id, out)).await
    }

    async fn expire_codes(&self, now: Timestamp) -> Transition<usize> {
        self.transact(|hub, out| Ok(hub.expire_codes(now, out)))
            .await
    }

    async fn stale_connections(&self, now: Timestamp, timeout_ms: i64) -> Vec<ConnectionId> {
        let hub = self.hub.lock().await;
        hub.stale_connections(now, timeout_ms)
    }

    async fn connection(&self, id: &ConnectionId) -> Option<Connection> {
        let hub = self.hub.lock().await;
        hub.connection(id).cloned()
    }

    async fn stats(&self) -> HubStats {
        let hub = self.hub.lock().await;
        hub.stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{CodeError, HubPolicy, Notice, RegistryError},
        infrastructure::code_generator::RandomCodeGenerator,
    };

    // ========================================
    // テスト作業記録
    // ========================================
    // 【何をテストするか】
    // - InMemoryHubRepository が PairingHub の操作を 1 回のロックで実行すること
    // - 失敗した操作でも副作用の通知（期限切れコード）が返されること
    // ========================================

    const T0: i64 = 1_700_000_000_000;

    fn create_test_repository() -> InMemoryHubRepository {
        let hub = PairingHub::new(HubPolicy::default(), Box::new(RandomCodeGenerator::new()));
        InMemoryHubRepository::new(Arc::new(Mutex::new(hub)))
    }

    async fn join(repo: &InMemoryHubRepository, role: Role) -> ConnectionId {
        let id = ConnectionId::generate();
        repo.open(&id, Timestamp::new(T0)).await.result.unwrap();
        repo.register(&id, role, None, Timestamp::new(T0))
            .await
            .result
            .unwrap();
        id
    }

    #[tokio::test]
    async fn test_open_and_register() {
        // テスト項目: 接続を開いてロールを登録すると connected / registered が返される
        // given (前提条件):
        let repo = create_test_repository();
        let id = ConnectionId::generate();

        // when (操作):
        let opened = repo.open(&id, Timestamp::new(T0)).await;
        let registered = repo
            .register(&id, Role::Client, None, Timestamp::new(T0))
            .await;

        // then (期待する結果):
        assert!(opened.result.is_ok());
        assert!(matches!(
            opened.outbox.notices_for(&id).next(),
            Some(Notice::Connected { .. })
        ));
        assert!(registered.result.is_ok());
        let name = format!("client-{}", id.short());
        assert!(matches!(
            registered.outbox.notices_for(&id).next(),
            Some(Notice::Registered { display_name, .. }) if display_name.as_str() == name
        ));
        assert_eq!(repo.stats().await.clients, 1);
    }

    #[tokio::test]
    async fn test_register_twice_fails() {
        // テスト項目: 2 回目のロール登録は RoleAlreadySet になる
        let repo = create_test_repository();
        let id = join(&repo, Role::Admin).await;

        let again = repo
            .register(&id, Role::Client, None, Timestamp::new(T0))
            .await;

        assert_eq!(again.result, Err(RegistryError::RoleAlreadySet.into()));
        assert!(again.outbox.is_empty());
        assert_eq!(
            repo.connection(&id).await.and_then(|c| c.role),
            Some(Role::Admin)
        );
    }

    #[tokio::test]
    async fn test_failed_redeem_still_returns_expiry_notice() {
        // テスト項目: 期限切れコードの引き換えはエラーだが、admin への codeExpired が Outbox に含まれる
        // given (前提条件):
        let repo = create_test_repository();
        let admin = join(&repo, Role::Admin).await;
        let client = join(&repo, Role::Client).await;
        let issued = repo
            .issue_code(&admin, Timestamp::new(T0))
            .await
            .result
            .unwrap();

        // when (操作):
        let transition = repo
            .redeem_code(&client, &issued.code, Timestamp::new(T0 + 300_000))
            .await;

        // then (期待する結果):
        assert_eq!(transition.result, Err(CodeError::CodeExpired.into()));
        assert_eq!(
            transition.outbox.notices_for(&admin).collect::<Vec<_>>(),
            vec![&Notice::CodeExpired { code: issued.code }]
        );
        assert_eq!(repo.stats().await.live_codes, 0);
    }

    #[tokio::test]
    async fn test_disconnect_removes_connection() {
        // テスト項目: 切断すると接続が削除され、2 回目の切断はエラーになる
        let repo = create_test_repository();
        let id = join(&repo, Role::Client).await;

        let first = repo.disconnect(&id).await;
        let second = repo.disconnect(&id).await;

        assert!(first.result.is_ok());
        assert!(second.result.is_err());
        assert!(repo.connection(&id).await.is_none());
        assert_eq!(repo.stats().await.connections, 0);
    }
}
