//! PairingHub aggregate
//!
//! Owns every pairing store and exposes the operations a connection can
//! trigger. Each method is one atomic step: it either applies completely or
//! returns an error without touching state (apart from evicting stale codes).
//! Notifications are appended to the caller's `Outbox`.

use std::collections::HashMap;

use super::{
    error::{CodeError, GroupError, PairingError, RegistryError, ValidationError},
    group::GroupStore,
    handshake::{HandshakeBook, PendingApproval},
    identity::{Connection, IdentityRegistry},
    notice::{Notice, Outbox, UnpairReason},
    pairing_code::{CodeAuthority, CodeGenerator, CodePolicy, IssuedCode},
    value_object::{ConnectionId, DisplayName, PairingCode, Role, TileIndex, Timestamp},
    wall::{DisplayMember, SyncPlan, WallConfig, WallPatch, plan_sync},
};

/// Limits applied by the hub
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HubPolicy {
    pub codes: CodePolicy,
    pub max_connections: usize,
}

impl Default for HubPolicy {
    fn default() -> Self {
        Self {
            codes: CodePolicy::default(),
            max_connections: 10_000,
        }
    }
}

/// Point-in-time counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HubStats {
    pub connections: usize,
    pub admins: usize,
    pub clients: usize,
    pub live_codes: usize,
    pub pending_approvals: usize,
    pub pairs: usize,
}

#[derive(Debug)]
pub struct PairingHub {
    policy: HubPolicy,
    registry: IdentityRegistry,
    codes: CodeAuthority,
    handshakes: HandshakeBook,
    groups: GroupStore,
    walls: HashMap<ConnectionId, WallConfig>,
}

impl PairingHub {
    pub fn new(policy: HubPolicy, generator: Box<dyn CodeGenerator>) -> Self {
        Self {
            policy,
            registry: IdentityRegistry::new(),
            codes: CodeAuthority::new(policy.codes, generator),
            handshakes: HandshakeBook::new(),
            groups: GroupStore::new(),
            walls: HashMap::new(),
        }
    }

    // ========================================
    // Identity Registry
    // ========================================

    /// Track a newly accepted connection (role unset).
    pub fn open(
        &mut self,
        id: &ConnectionId,
        now: Timestamp,
        out: &mut Outbox,
    ) -> Result<(), PairingError> {
        if self.registry.len() >= self.policy.max_connections {
            return Err(RegistryError::CapacityExceeded {
                max: self.policy.max_connections,
            }
            .into());
        }
        if !self.registry.open(id.clone(), now) {
            return Err(RegistryError::DuplicateConnection(id.to_string()).into());
        }
        out.push(
            id,
            Notice::Connected {
                connection_id: id.clone(),
                server_time: now,
            },
        );
        Ok(())
    }

    pub fn register(
        &mut self,
        id: &ConnectionId,
        role: Role,
        display_name: Option<DisplayName>,
        now: Timestamp,
        out: &mut Outbox,
    ) -> Result<(), PairingError> {
        let connection = self.registry.register(id, role, display_name)?;
        let display_name = connection.name();
        if role == Role::Admin {
            self.walls.insert(id.clone(), WallConfig::default());
        }
        out.push(
            id,
            Notice::Registered {
                connection_id: id.clone(),
                role,
                display_name,
                server_time: now,
            },
        );
        Ok(())
    }

    pub fn touch(&mut self, id: &ConnectionId, now: Timestamp) -> Result<(), PairingError> {
        Ok(self.registry.touch(id, now)?)
    }

    /// Liveness ping answered with the server clock.
    pub fn ping(
        &mut self,
        id: &ConnectionId,
        now: Timestamp,
        out: &mut Outbox,
    ) -> Result<(), PairingError> {
        self.registry.touch(id, now)?;
        out.push(id, Notice::Pong { server_time: now });
        Ok(())
    }

    pub fn stale_connections(&self, now: Timestamp, timeout_ms: i64) -> Vec<ConnectionId> {
        self.registry.stale(now, timeout_ms)
    }

    /// Single teardown path for a departing connection.
    ///
    /// Cleans up codes, then pending handshakes, then group membership, and
    /// finally forgets the identity.
    pub fn disconnect(
        &mut self,
        id: &ConnectionId,
        out: &mut Outbox,
    ) -> Result<Connection, PairingError> {
        if self.registry.get(id).is_none() {
            return Err(RegistryError::UnknownConnection(id.to_string()).into());
        }

        // 1. Pairing Code Authority
        self.codes.forget(id);

        // 2. Handshake Coordinator
        if let Some(pending) = self.handshakes.cancel_for_client(id) {
            out.push(
                &pending.admin_id,
                Notice::ApprovalCancelled {
                    peer_id: id.clone(),
                    reason: UnpairReason::ClientDisconnected,
                },
            );
        }
        for pending in self.handshakes.cancel_for_admin(id) {
            out.push(
                &pending.client_id,
                Notice::ApprovalCancelled {
                    peer_id: id.clone(),
                    reason: UnpairReason::AdminDisconnected,
                },
            );
        }

        // 3. Group Membership Store
        for client in self.groups.dissolve(id) {
            self.clear_index(&client);
            out.push(
                &client,
                Notice::Unpaired {
                    admin_id: id.clone(),
                    reason: UnpairReason::AdminDisconnected,
                },
            );
        }
        self.walls.remove(id);
        if let Some(admin) = self.groups.detach(id) {
            out.push(
                &admin,
                Notice::ClientUnpaired {
                    client_id: id.clone(),
                    reason: UnpairReason::ClientDisconnected,
                },
            );
        }

        // 4. Identity Registry
        self.registry
            .remove(id)
            .ok_or_else(|| RegistryError::UnknownConnection(id.to_string()).into())
    }

    // ========================================
    // Pairing Code Authority
    // ========================================

    pub fn issue_code(
        &mut self,
        admin: &ConnectionId,
        now: Timestamp,
        out: &mut Outbox,
    ) -> Result<IssuedCode, PairingError> {
        self.registry.require_role(admin, Role::Admin)?;
        let issued = self.codes.issue(admin, now);
        self.announce_evicted_codes(out);
        let issued = issued?;

        tracing::debug!(
            "Issued pairing code for admin '{}' (expires at {})",
            admin,
            issued.expires_at.value()
        );
        out.push(
            admin,
            Notice::CodeIssued {
                code: issued.code.clone(),
                expires_at: issued.expires_at,
                max_uses: issued.max_uses,
            },
        );
        Ok(issued)
    }

    /// Sweep step: evict expired codes and tell everyone who cared.
    pub fn expire_codes(&mut self, now: Timestamp, out: &mut Outbox) -> usize {
        let evicted = self.codes.purge_expired(now);
        self.announce_evicted_codes(out);
        evicted
    }

    fn announce_evicted_codes(&mut self, out: &mut Outbox) {
        for issued in self.codes.take_evicted() {
            if self.registry.get(&issued.owner).is_some() {
                out.push(
                    &issued.owner,
                    Notice::CodeExpired {
                        code: issued.code.clone(),
                    },
                );
            }
            for client in issued
                .used_by
                .iter()
                .filter(|c| self.registry.get(c).is_some())
            {
                out.push(
                    client,
                    Notice::PairingExpired {
                        code: issued.code.clone(),
                    },
                );
            }
        }
    }

    // ========================================
    // Handshake Coordinator
    // ========================================

    /// A client display redeems a code shown by an admin.
    pub fn redeem_code(
        &mut self,
        client: &ConnectionId,
        code: &PairingCode,
        now: Timestamp,
        out: &mut Outbox,
    ) -> Result<(), PairingError> {
        let client_name = self.registry.require_role(client, Role::Client)?.name();

        let owner = self
            .codes
            .check_redeemable(client, code, now)
            .map(|issued| issued.owner.clone());
        self.announce_evicted_codes(out);
        let admin = owner?;

        if self.handshakes.is_pending(client) {
            return Err(CodeError::ClientAlreadyPending.into());
        }
        let admin_name = self
            .registry
            .name_of(&admin)
            .ok_or_else(|| RegistryError::UnknownConnection(admin.to_string()))?;

        self.handshakes.begin(PendingApproval {
            client_id: client.clone(),
            admin_id: admin.clone(),
            code: code.clone(),
            created_at: now,
        });

        out.push(
            &admin,
            Notice::ApprovalRequested {
                client_id: client.clone(),
                client_name,
                code: code.clone(),
            },
        );
        out.push(
            client,
            Notice::ApprovalPending {
                admin_id: admin,
                admin_name,
            },
        );
        Ok(())
    }

    pub fn approve(
        &mut self,
        admin: &ConnectionId,
        client: &ConnectionId,
        out: &mut Outbox,
    ) -> Result<(), PairingError> {
        let admin_name = self.registry.require_role(admin, Role::Admin)?.name();
        let code = self.handshakes.pending_for(client, admin)?.code.clone();
        let client_name = self
            .registry
            .name_of(client)
            .ok_or_else(|| RegistryError::UnknownConnection(client.to_string()))?;

        // Other approvals may have used up the code since this one was redeemed
        if self.codes.is_exhausted(&code) {
            self.handshakes.cancel_for_client(client);
            out.push(
                client,
                Notice::ApprovalRejected {
                    reason: Some(CodeError::UsageExhausted.to_string()),
                },
            );
            return Err(CodeError::UsageExhausted.into());
        }

        self.handshakes.resolve(client, admin)?;
        self.codes.record_use(&code, client);
        if let Some(previous) = self.groups.pair(admin, client) {
            self.clear_index(client);
            out.push(
                &previous,
                Notice::ClientUnpaired {
                    client_id: client.clone(),
                    reason: UnpairReason::Repaired,
                },
            );
            out.push(
                client,
                Notice::Unpaired {
                    admin_id: previous,
                    reason: UnpairReason::Repaired,
                },
            );
        }

        out.push(
            admin,
            Notice::Paired {
                peer_id: client.clone(),
                peer_name: client_name,
            },
        );
        out.push(
            client,
            Notice::Paired {
                peer_id: admin.clone(),
                peer_name: admin_name,
            },
        );
        Ok(())
    }

    pub fn reject(
        &mut self,
        admin: &ConnectionId,
        client: &ConnectionId,
        reason: Option<String>,
        out: &mut Outbox,
    ) -> Result<(), PairingError> {
        self.registry.require_role(admin, Role::Admin)?;
        self.handshakes.resolve(client, admin)?;
        out.push(client, Notice::ApprovalRejected { reason });
        Ok(())
    }

    // ========================================
    // Group Membership Store
    // ========================================

    /// Unpair on request.
    ///
    /// An admin unpairs `target` or, when `target` is `None`, its whole group.
    /// A client always unpairs itself. Returns how many pairs were removed.
    pub fn unpair(
        &mut self,
        requester: &ConnectionId,
        target: Option<&ConnectionId>,
        out: &mut Outbox,
    ) -> Result<usize, PairingError> {
        let role = self
            .registry
            .get(requester)
            .ok_or_else(|| RegistryError::UnknownConnection(requester.to_string()))?
            .role;

        match role {
            Some(Role::Admin) => {
                let clients = match target {
                    Some(client) => {
                        self.groups.unpair(requester, client)?;
                        vec![client.clone()]
                    }
                    None => self.groups.dissolve(requester),
                };
                for client in &clients {
                    self.clear_index(client);
                    out.push(
                        client,
                        Notice::Unpaired {
                            admin_id: requester.clone(),
                            reason: UnpairReason::AdminRequest,
                        },
                    );
                    out.push(
                        requester,
                        Notice::ClientUnpaired {
                            client_id: client.clone(),
                            reason: UnpairReason::AdminRequest,
                        },
                    );
                }
                Ok(clients.len())
            }
            Some(Role::Client) => {
                let admin = self.groups.detach(requester).ok_or(GroupError::NoAdmin)?;
                self.clear_index(requester);
                out.push(
                    &admin,
                    Notice::ClientUnpaired {
                        client_id: requester.clone(),
                        reason: UnpairReason::ClientRequest,
                    },
                );
                out.push(
                    requester,
                    Notice::Unpaired {
                        admin_id: admin,
                        reason: UnpairReason::ClientRequest,
                    },
                );
                Ok(1)
            }
            None => Err(RegistryError::RoleViolation {
                required: Role::Admin,
            }
            .into()),
        }
    }

    fn clear_index(&mut self, id: &ConnectionId) {
        if let Some(connection) = self.registry.get_mut(id) {
            connection.device_index = None;
        }
    }

    // ========================================
    // Wall configuration & Sync Dispatcher
    // ========================================

    /// Pin `target` (a member, or the admin itself) to a tile.
    pub fn assign_index(
        &mut self,
        admin: &ConnectionId,
        target: &ConnectionId,
        index: TileIndex,
        out: &mut Outbox,
    ) -> Result<(), PairingError> {
        self.registry.require_role(admin, Role::Admin)?;
        if target != admin && !self.groups.is_member(admin, target) {
            return Err(GroupError::NotPaired(target.to_string()).into());
        }
        let capacity = self
            .walls
            .get(admin)
            .map(|wall| wall.grid.capacity())
            .unwrap_or(1);
        if index.value() >= capacity {
            return Err(ValidationError::IndexOutOfRange {
                index: index.value(),
                capacity,
            }
            .into());
        }

        let holders: Vec<ConnectionId> = std::iter::once(admin)
            .chain(self.groups.members(admin))
            .filter(|id| *id != target)
            .cloned()
            .collect();
        for holder in holders {
            if let Some(connection) = self.registry.get_mut(&holder)
                && connection.device_index == Some(index)
            {
                connection.device_index = None;
            }
        }
        if let Some(connection) = self.registry.get_mut(target) {
            connection.device_index = Some(index);
        }

        let notice = Notice::IndexAssigned {
            client_id: target.clone(),
            index,
        };
        if target != admin {
            out.push(target, notice.clone());
        }
        out.push(admin, notice);
        Ok(())
    }

    pub fn update_config(
        &mut self,
        admin: &ConnectionId,
        patch: &WallPatch,
        out: &mut Outbox,
    ) -> Result<WallConfig, PairingError> {
        self.registry.require_role(admin, Role::Admin)?;
        let wall = self.walls.entry(admin.clone()).or_default();
        *wall = wall.patched(patch)?;
        let config = wall.clone();
        out.push(
            admin,
            Notice::ConfigUpdated {
                config: config.clone(),
            },
        );
        Ok(config)
    }

    /// Compute and fan out a synchronized start.
    ///
    /// `overrides` apply to this dispatch only; the stored config is unchanged.
    pub fn dispatch(
        &mut self,
        admin: &ConnectionId,
        overrides: &WallPatch,
        start_delay_ms: Option<i64>,
        now: Timestamp,
        out: &mut Outbox,
    ) -> Result<SyncPlan, PairingError> {
        self.registry.require_role(admin, Role::Admin)?;
        let config = self
            .walls
            .get(admin)
            .cloned()
            .unwrap_or_default()
            .patched(overrides)?;

        let members: Vec<DisplayMember> = self
            .display_members(admin, config.include_self)
            .into_iter()
            .map(|id| DisplayMember {
                preferred: self.registry.get(&id).and_then(|c| c.device_index),
                id,
            })
            .collect();
        let plan = plan_sync(now, &config, start_delay_ms, &members)?;

        for (id, tile_index) in &plan.assignments {
            out.push(
                id,
                Notice::SyncStart {
                    media_url: plan.media_url.as_str().to_string(),
                    mode: plan.mode,
                    rows: plan.grid.rows(),
                    cols: plan.grid.cols(),
                    start_at: plan.start_at,
                    tile_index: *tile_index,
                    server_time: now,
                },
            );
        }
        out.push(
            admin,
            Notice::SyncScheduled {
                start_at: plan.start_at,
                count: plan.assignments.len(),
            },
        );
        tracing::info!(
            "Admin '{}' scheduled playback on {} displays at {}",
            admin,
            plan.assignments.len(),
            plan.start_at.value()
        );
        Ok(plan)
    }

    /// Fan out an immediate stop to the current group.
    pub fn stop(&mut self, admin: &ConnectionId, out: &mut Outbox) -> Result<usize, PairingError> {
        self.registry.require_role(admin, Role::Admin)?;
        let include_self = self.walls.get(admin).is_some_and(|w| w.include_self);
        let recipients = self.display_members(admin, include_self);
        for id in &recipients {
            out.push(id, Notice::SyncStop);
        }
        out.push(
            admin,
            Notice::SyncStopped {
                count: recipients.len(),
            },
        );
        Ok(recipients.len())
    }

    /// Admin first when it displays too, then members in pairing order.
    fn display_members(&self, admin: &ConnectionId, include_self: bool) -> Vec<ConnectionId> {
        include_self
            .then(|| admin.clone())
            .into_iter()
            .chain(self.groups.members(admin).iter().cloned())
            .collect()
    }

    // ========================================
    // Queries
    // ========================================

    pub fn connection(&self, id: &ConnectionId) -> Option<&Connection> {
        self.registry.get(id)
    }

    pub fn group(&self, admin: &ConnectionId) -> &[ConnectionId] {
        self.groups.members(admin)
    }

    pub fn admin_of(&self, client: &ConnectionId) -> Option<&ConnectionId> {
        self.groups.owner_of(client)
    }

    pub fn wall(&self, admin: &ConnectionId) -> Option<&WallConfig> {
        self.walls.get(admin)
    }

    pub fn code_of(&self, admin: &ConnectionId) -> Option<&IssuedCode> {
        self.codes.code_of(admin)
    }

    pub fn is_pending(&self, client: &ConnectionId) -> bool {
        self.handshakes.is_pending(client)
    }

    pub fn groups_consistent(&self) -> bool {
        self.groups.is_consistent()
    }

    pub fn stats(&self) -> HubStats {
        HubStats {
            connections: self.registry.len(),
            admins: self.registry.count_role(Role::Admin),
            clients: self.registry.count_role(Role::Client),
            live_codes: self.codes.live_count(),
            pending_approvals: self.handshakes.len(),
            pairs: self.groups.pair_count(),
        }
    }
}
