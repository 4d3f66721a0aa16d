//! Identity Registry
//!
//! One `Connection` per accepted socket. The role is set exactly once by a
//! `register` message; until then the connection may only ping.

use std::collections::HashMap;

use super::{
    error::RegistryError,
    value_object::{ConnectionId, DisplayName, Role, TileIndex, Timestamp},
};

/// A connected party
#[derive(Debug, Clone, PartialEq)]
pub struct Connection {
    pub id: ConnectionId,
    pub role: Option<Role>,
    pub display_name: Option<DisplayName>,
    pub connected_at: Timestamp,
    pub last_seen: Timestamp,
    /// Explicit tile assignment made by the owning admin
    pub device_index: Option<TileIndex>,
}

impl Connection {
    pub fn new(id: ConnectionId, now: Timestamp) -> Self {
        Self {
            id,
            role: None,
            display_name: None,
            connected_at: now,
            last_seen: now,
            device_index: None,
        }
    }

    /// Name shown to peers, falling back to `"<role>-<short id>"`
    pub fn name(&self) -> DisplayName {
        match (&self.display_name, self.role) {
            (Some(name), _) => name.clone(),
            (None, Some(role)) => DisplayName::fallback(role, &self.id),
            (None, None) => DisplayName::fallback(Role::Client, &self.id),
        }
    }

    /// Pure liveness predicate
    pub fn is_alive(&self, now: Timestamp, timeout_ms: i64) -> bool {
        now.millis_since(self.last_seen) <= timeout_ms
    }
}

/// Every live connection, keyed by identity
#[derive(Debug, Default)]
pub struct IdentityRegistry {
    connections: HashMap<ConnectionId, Connection>,
}

impl IdentityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a freshly accepted connection. Returns `false` if the id is taken.
    pub fn open(&mut self, id: ConnectionId, now: Timestamp) -> bool {
        if self.connections.contains_key(&id) {
            return false;
        }
        self.connections.insert(id.clone(), Connection::new(id, now));
        true
    }

    pub fn register(
        &mut self,
        id: &ConnectionId,
        role: Role,
        display_name: Option<DisplayName>,
    ) -> Result<&Connection, RegistryError> {
        let connection = self
            .connections
            .get_mut(id)
            .ok_or_else(|| RegistryError::UnknownConnection(id.to_string()))?;
        if connection.role.is_some() {
            return Err(RegistryError::RoleAlreadySet);
        }
        connection.role = Some(role);
        connection.display_name = Some(display_name.unwrap_or_else(|| DisplayName::fallback(role, id)));
        Ok(connection)
    }

    pub fn touch(&mut self, id: &ConnectionId, now: Timestamp) -> Result<(), RegistryError> {
        let connection = self
            .connections
            .get_mut(id)
            .ok_or_else(|| RegistryError::UnknownConnection(id.to_string()))?;
        if now > connection.last_seen {
            connection.last_seen = now;
        }
        Ok(())
    }

    pub fn is_alive(&self, id: &ConnectionId, now: Timestamp, timeout_ms: i64) -> bool {
        self.connections
            .get(id)
            .is_some_and(|c| c.is_alive(now, timeout_ms))
    }

    pub fn get(&self, id: &ConnectionId) -> Option<&Connection> {
        self.connections.get(id)
    }

    pub fn get_mut(&mut self, id: &ConnectionId) -> Option<&mut Connection> {
        self.connections.get_mut(id)
    }

    /// Look up `id` and check it registered with `role`.
    pub fn require_role(&self, id: &ConnectionId, role: Role) -> Result<&Connection, RegistryError> {
        let connection = self
            .connections
            .get(id)
            .ok_or_else(|| RegistryError::UnknownConnection(id.to_string()))?;
        if connection.role != Some(role) {
            return Err(RegistryError::RoleViolation { required: role });
        }
        Ok(connection)
    }

    pub fn name_of(&self, id: &ConnectionId) -> Option<DisplayName> {
        self.connections.get(id).map(Connection::name)
    }

    pub fn remove(&mut self, id: &ConnectionId) -> Option<Connection> {
        self.connections.remove(id)
    }

    /// Connections whose last liveness signal is older than `timeout_ms`
    pub fn stale(&self, now: Timestamp, timeout_ms: i64) -> Vec<ConnectionId> {
        let mut stale: Vec<ConnectionId> = self
            .connections
            .values()
            .filter(|c| !c.is_alive(now, timeout_ms))
            .map(|c| c.id.clone())
            .collect();
        stale.sort();
        stale
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    pub fn count_role(&self, role: Role) -> usize {
        self.connections
            .values()
            .filter(|c| c.role == Some(role))
            .count()
    }
}
