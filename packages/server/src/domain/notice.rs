//! Outbound notifications produced by hub operations.
//!
//! Store mutations never talk to the network. They append `Delivery` records
//! to an `Outbox`, and the use case layer pushes them once the store lock has
//! been released.

use super::{
    error::PairingError,
    value_object::{ConnectionId, DisplayName, PairingCode, Role, TileIndex, Timestamp},
    wall::{WallConfig, WallMode},
};

/// Why a pairing ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnpairReason {
    /// The client was paired with a different admin
    Repaired,
    AdminDisconnected,
    ClientDisconnected,
    AdminRequest,
    ClientRequest,
}

/// A message for one connection
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    Connected {
        connection_id: ConnectionId,
        server_time: Timestamp,
    },
    Registered {
        connection_id: ConnectionId,
        role: Role,
        display_name: DisplayName,
        server_time: Timestamp,
    },
    CodeIssued {
        code: PairingCode,
        expires_at: Timestamp,
        max_uses: u32,
    },
    CodeExpired {
        code: PairingCode,
    },
    PairingExpired {
        code: PairingCode,
    },
    ApprovalRequested {
        client_id: ConnectionId,
        client_name: DisplayName,
        code: PairingCode,
    },
    ApprovalPending {
        admin_id: ConnectionId,
        admin_name: DisplayName,
    },
    Paired {
        peer_id: ConnectionId,
        peer_name: DisplayName,
    },
    ApprovalRejected {
        reason: Option<String>,
    },
    ApprovalCancelled {
        peer_id: ConnectionId,
        reason: UnpairReason,
    },
    Unpaired {
        admin_id: ConnectionId,
        reason: UnpairReason,
    },
    ClientUnpaired {
        client_id: ConnectionId,
        reason: UnpairReason,
    },
    IndexAssigned {
        client_id: ConnectionId,
        index: TileIndex,
    },
    ConfigUpdated {
        config: WallConfig,
    },
    SyncStart {
        media_url: String,
        mode: WallMode,
        rows: u32,
        cols: u32,
        start_at: Timestamp,
        tile_index: Option<TileIndex>,
        server_time: Timestamp,
    },
    SyncScheduled {
        start_at: Timestamp,
        count: usize,
    },
    SyncStop,
    SyncStopped {
        count: usize,
    },
    Pong {
        server_time: Timestamp,
    },
    Error {
        kind: &'static str,
        code: &'static str,
        message: String,
        retry_after_ms: Option<i64>,
    },
}

impl From<&PairingError> for Notice {
    fn from(error: &PairingError) -> Self {
        Notice::Error {
            kind: error.kind().as_str(),
            code: error.code(),
            message: error.to_string(),
            retry_after_ms: error.retry_after_ms(),
        }
    }
}

/// A notice addressed to a connection
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    pub to: ConnectionId,
    pub notice: Notice,
}

/// Deliveries collected while a hub operation runs
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Outbox {
    deliveries: Vec<Delivery>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, to: &ConnectionId, notice: Notice) {
        self.deliveries.push(Delivery {
            to: to.clone(),
            notice,
        });
    }

    pub fn len(&self) -> usize {
        self.deliveries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deliveries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Delivery> {
        self.deliveries.iter()
    }

    /// Notices addressed to `id`, in the order they were queued
    pub fn notices_for<'a>(&'a self, id: &'a ConnectionId) -> impl Iterator<Item = &'a Notice> {
        self.deliveries
            .iter()
            .filter(move |d| &d.to == id)
            .map(|d| &d.notice)
    }
}

impl IntoIterator for Outbox {
    type Item = Delivery;
    type IntoIter = std::vec::IntoIter<Delivery>;

    fn into_iter(self) -> Self::IntoIter {
        self.deliveries.into_iter()
    }
}
