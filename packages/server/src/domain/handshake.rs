//! Handshake Coordinator state
//!
//! A `PendingApproval` exists between a successful redemption and the admin's
//! decision. At most one is pending per client.

use std::collections::HashMap;

use super::{
    error::HandshakeError,
    value_object::{ConnectionId, PairingCode, Timestamp},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingApproval {
    pub client_id: ConnectionId,
    pub admin_id: ConnectionId,
    pub code: PairingCode,
    pub created_at: Timestamp,
}

#[derive(Debug, Default)]
pub struct HandshakeBook {
    pending: HashMap<ConnectionId, PendingApproval>,
}

impl HandshakeBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_pending(&self, client_id: &ConnectionId) -> bool {
        self.pending.contains_key(client_id)
    }

    /// Open a pending approval. Returns `false` if the client already has one.
    pub fn begin(&mut self, approval: PendingApproval) -> bool {
        if self.pending.contains_key(&approval.client_id) {
            return false;
        }
        self.pending.insert(approval.client_id.clone(), approval);
        true
    }

    /// The approval for `client_id`, if `admin_id` owns it.
    pub fn pending_for(
        &self,
        client_id: &ConnectionId,
        admin_id: &ConnectionId,
    ) -> Result<&PendingApproval, HandshakeError> {
        match self.pending.get(client_id) {
            None => Err(HandshakeError::NoSuchPending(client_id.to_string())),
            Some(pending) if &pending.admin_id != admin_id => Err(HandshakeError::NotOwner),
            Some(pending) => Ok(pending),
        }
    }

    /// Remove and return the approval for `client_id` if `admin_id` owns it.
    pub fn resolve(
        &mut self,
        client_id: &ConnectionId,
        admin_id: &ConnectionId,
    ) -> Result<PendingApproval, HandshakeError> {
        self.pending_for(client_id, admin_id)?;
        self.pending
            .remove(client_id)
            .ok_or_else(|| HandshakeError::NoSuchPending(client_id.to_string()))
    }

    /// Drop whatever approval `client_id` was waiting on.
    pub fn cancel_for_client(&mut self, client_id: &ConnectionId) -> Option<PendingApproval> {
        self.pending.remove(client_id)
    }

    /// Drop every approval addressed to `admin_id`, oldest first.
    pub fn cancel_for_admin(&mut self, admin_id: &ConnectionId) -> Vec<PendingApproval> {
        let clients: Vec<ConnectionId> = self
            .pending
            .values()
            .filter(|p| &p.admin_id == admin_id)
            .map(|p| p.client_id.clone())
            .collect();
        let mut cancelled: Vec<PendingApproval> = clients
            .iter()
            .filter_map(|client| self.pending.remove(client))
            .collect();
        cancelled.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.client_id.cmp(&b.client_id))
        });
        cancelled
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approval(client: &ConnectionId, admin: &ConnectionId, at: i64) -> PendingApproval {
        PendingApproval {
            client_id: client.clone(),
            admin_id: admin.clone(),
            code: PairingCode::from_number(482_913),
            created_at: Timestamp::new(at),
        }
    }

    #[test]
    fn test_one_pending_per_client() {
        // テスト項目: 同じクライアントに 2 つ目の承認待ちは作れない
        let mut book = HandshakeBook::new();
        let (client, admin_a, admin_b) = (
            ConnectionId::generate(),
            ConnectionId::generate(),
            ConnectionId::generate(),
        );

        assert!(book.begin(approval(&client, &admin_a, 0)));
        assert!(!book.begin(approval(&client, &admin_b, 1)));
        assert_eq!(book.len(), 1);
    }

    #[test]
    fn test_resolve_checks_owner() {
        // テスト項目: 承認待ちの所有者でない admin は解決できず、承認待ちは残る
        // given (前提条件):
        let mut book = HandshakeBook::new();
        let (client, owner, intruder) = (
            ConnectionId::generate(),
            ConnectionId::generate(),
            ConnectionId::generate(),
        );
        book.begin(approval(&client, &owner, 0));

        // when (操作):
        let by_intruder = book.resolve(&client, &intruder);
        let by_owner = book.resolve(&client, &owner);
        let again = book.resolve(&client, &owner);

        // then (期待する結果):
        assert_eq!(by_intruder, Err(HandshakeError::NotOwner));
        assert_eq!(by_owner.map(|p| p.admin_id), Ok(owner));
        assert_eq!(
            again,
            Err(HandshakeError::NoSuchPending(client.to_string()))
        );
    }

    #[test]
    fn test_pending_for_leaves_approval_in_place() {
        // テスト項目: pending_for は所有者を確認するだけで承認待ちを削除しない
        let mut book = HandshakeBook::new();
        let (client, owner, intruder) = (
            ConnectionId::generate(),
            ConnectionId::generate(),
            ConnectionId::generate(),
        );
        book.begin(approval(&client, &owner, 0));

        assert_eq!(
            book.pending_for(&client, &intruder),
            Err(HandshakeError::NotOwner)
        );
        assert_eq!(
            book.pending_for(&client, &owner).map(|p| p.code.clone()),
            Ok(PairingCode::from_number(482_913))
        );
        assert!(book.is_pending(&client));
    }

    #[test]
    fn test_cancel_for_admin_only_touches_that_admin() {
        // テスト項目: admin 切断時はその admin 宛ての承認待ちだけが古い順に削除される
        let mut book = HandshakeBook::new();
        let (admin, other) = (ConnectionId::generate(), ConnectionId::generate());
        let (c1, c2, c3) = (
            ConnectionId::generate(),
            ConnectionId::generate(),
            ConnectionId::generate(),
        );
        book.begin(approval(&c2, &admin, 20));
        book.begin(approval(&c1, &admin, 10));
        book.begin(approval(&c3, &other, 5));

        let cancelled = book.cancel_for_admin(&admin);

        let clients: Vec<_> = cancelled.into_iter().map(|p| p.client_id).collect();
        assert_eq!(clients, vec![c1, c2]);
        assert!(book.is_pending(&c3));
        assert_eq!(book.len(), 1);
    }
}
