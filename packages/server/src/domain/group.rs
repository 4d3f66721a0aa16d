//! Group Membership Store
//!
//! `members` (admin → clients, pairing order) and `owner` (client → admin)
//! always describe the same relation. Both sides are updated inside the same
//! method so no caller can observe one without the other.

use std::collections::HashMap;

use super::{error::GroupError, value_object::ConnectionId};

#[derive(Debug, Default)]
pub struct GroupStore {
    members: HashMap<ConnectionId, Vec<ConnectionId>>,
    owner: HashMap<ConnectionId, ConnectionId>,
}

impl GroupStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pair `client` with `admin`, detaching it from any other admin first.
    ///
    /// Returns the admin the client was taken from.
    pub fn pair(&mut self, admin: &ConnectionId, client: &ConnectionId) -> Option<ConnectionId> {
        let previous = match self.owner.get(client).cloned() {
            Some(current) if &current == admin => return None,
            Some(_) => self.detach(client),
            None => None,
        };

        self.members
            .entry(admin.clone())
            .or_default()
            .push(client.clone());
        self.owner.insert(client.clone(), admin.clone());
        previous
    }

    /// Remove the `admin` ↔ `client` pair.
    pub fn unpair(&mut self, admin: &ConnectionId, client: &ConnectionId) -> Result<(), GroupError> {
        if self.owner.get(client) != Some(admin) {
            return Err(GroupError::NotPaired(client.to_string()));
        }
        self.detach(client);
        Ok(())
    }

    /// Detach `client` from its admin, returning that admin.
    pub fn detach(&mut self, client: &ConnectionId) -> Option<ConnectionId> {
        let admin = self.owner.remove(client)?;
        if let Some(members) = self.members.get_mut(&admin) {
            members.retain(|m| m != client);
            if members.is_empty() {
                self.members.remove(&admin);
            }
        }
        Some(admin)
    }

    /// Dissolve the whole group of `admin`, returning its members in pairing order.
    pub fn dissolve(&mut self, admin: &ConnectionId) -> Vec<ConnectionId> {
        let members = self.members.remove(admin).unwrap_or_default();
        for client in &members {
            self.owner.remove(client);
        }
        members
    }

    /// Members of `admin` in pairing order
    pub fn members(&self, admin: &ConnectionId) -> &[ConnectionId] {
        self.members.get(admin).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn owner_of(&self, client: &ConnectionId) -> Option<&ConnectionId> {
        self.owner.get(client)
    }

    pub fn is_member(&self, admin: &ConnectionId, client: &ConnectionId) -> bool {
        self.owner.get(client) == Some(admin)
    }

    /// Number of admin ↔ client pairs
    pub fn pair_count(&self) -> usize {
        self.owner.len()
    }

    /// Whether both views of the relation agree
    pub fn is_consistent(&self) -> bool {
        let forward = self.members.iter().all(|(admin, members)| {
            !members.is_empty()
                && members
                    .iter()
                    .all(|client| self.owner.get(client) == Some(admin))
        });
        let member_total: usize = self.members.values().map(Vec::len).sum();
        forward && member_total == self.owner.len()
    }
}

#[cfg(test)]
mod tests {
    use rand::{Rng, SeedableRng, rngs::StdRng, seq::SliceRandom};

    use super::*;

    #[test]
    fn test_pair_and_unpair() {
        // テスト項目: ペアリング後は両方向から参照でき、解除後はどちらからも消える
        // given (前提条件):
        let mut store = GroupStore::new();
        let (admin, client) = (ConnectionId::generate(), ConnectionId::generate());

        // when (操作):
        let previous = store.pair(&admin, &client);

        // then (期待する結果):
        assert_eq!(previous, None);
        assert_eq!(store.members(&admin), &[client.clone()]);
        assert_eq!(store.owner_of(&client), Some(&admin));

        store.unpair(&admin, &client).unwrap();
        assert!(store.members(&admin).is_empty());
        assert_eq!(store.owner_of(&client), None);
        assert!(store.is_consistent());
    }

    #[test]
    fn test_repair_moves_client_to_new_admin() {
        // テスト項目: 別の admin とペアリングすると以前の admin から外れる
        let mut store = GroupStore::new();
        let (old, new, client) = (
            ConnectionId::generate(),
            ConnectionId::generate(),
            ConnectionId::generate(),
        );
        store.pair(&old, &client);

        let previous = store.pair(&new, &client);

        assert_eq!(previous, Some(old.clone()));
        assert!(store.members(&old).is_empty());
        assert_eq!(store.members(&new), &[client.clone()]);
        assert_eq!(store.owner_of(&client), Some(&new));
    }

    #[test]
    fn test_pair_with_same_admin_is_noop() {
        // テスト項目: 同じ admin との再ペアリングは重複を作らない
        let mut store = GroupStore::new();
        let (admin, client) = (ConnectionId::generate(), ConnectionId::generate());
        store.pair(&admin, &client);

        let previous = store.pair(&admin, &client);

        assert_eq!(previous, None);
        assert_eq!(store.members(&admin).len(), 1);
    }

    #[test]
    fn test_unpair_foreign_client_fails() {
        // テスト項目: 他の admin のクライアントは解除できない
        let mut store = GroupStore::new();
        let (admin, other, client) = (
            ConnectionId::generate(),
            ConnectionId::generate(),
            ConnectionId::generate(),
        );
        store.pair(&other, &client);

        let result = store.unpair(&admin, &client);

        assert_eq!(result, Err(GroupError::NotPaired(client.to_string())));
        assert!(store.is_member(&other, &client));
    }

    #[test]
    fn test_members_keep_pairing_order() {
        // テスト項目: メンバーはペアリング順に並ぶ
        let mut store = GroupStore::new();
        let admin = ConnectionId::generate();
        let clients: Vec<ConnectionId> = (0..4).map(|_| ConnectionId::generate()).collect();
        for client in &clients {
            store.pair(&admin, client);
        }
        store.detach(&clients[1]);

        assert_eq!(
            store.members(&admin),
            &[clients[0].clone(), clients[2].clone(), clients[3].clone()]
        );
    }

    #[test]
    fn test_dissolve_returns_members_in_order() {
        // テスト項目: グループ解散でメンバー全員が返され、逆引きも消える
        let mut store = GroupStore::new();
        let admin = ConnectionId::generate();
        let a = ConnectionId::generate();
        let b = ConnectionId::generate();
        store.pair(&admin, &a);
        store.pair(&admin, &b);

        let dissolved = store.dissolve(&admin);

        assert_eq!(dissolved, vec![a.clone(), b.clone()]);
        assert_eq!(store.owner_of(&a), None);
        assert_eq!(store.pair_count(), 0);
    }

    #[test]
    fn test_random_interleavings_keep_views_mirrored() {
        // テスト項目: pair / unpair / detach / dissolve をランダムに混ぜても
        //             admin → clients と client → admin の関係は常に一致する
        let mut rng = StdRng::seed_from_u64(0x7117_ca57);
        let admins: Vec<ConnectionId> = (0..4).map(|_| ConnectionId::generate()).collect();
        let clients: Vec<ConnectionId> = (0..12).map(|_| ConnectionId::generate()).collect();
        let mut store = GroupStore::new();

        for _ in 0..5_000 {
            let admin = admins.choose(&mut rng).unwrap();
            let client = clients.choose(&mut rng).unwrap();
            match rng.gen_range(0..10) {
                0..=4 => {
                    store.pair(admin, client);
                    assert!(store.is_member(admin, client));
                    assert!(store.members(admin).contains(client));
                }
                5..=6 => {
                    let _ = store.unpair(admin, client);
                    assert!(!store.is_member(admin, client));
                }
                7..=8 => {
                    store.detach(client);
                    assert_eq!(store.owner_of(client), None);
                }
                _ => {
                    store.dissolve(admin);
                    assert!(store.members(admin).is_empty());
                }
            }
            assert!(store.is_consistent());
            for client in &clients {
                if let Some(owner) = store.owner_of(client) {
                    assert_eq!(
                        store.members(owner).iter().filter(|m| *m == client).count(),
                        1
                    );
                }
            }
        }
    }
}
