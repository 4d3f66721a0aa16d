//! WebSocket message DTOs.
//!
//! Every frame is a JSON object `{"type": "...", ...}`. Inbound frames are
//! decoded once into `ClientMessage`; outbound frames are `ServerMessage`.

use serde::{Deserialize, Serialize};

/// Wall playback mode on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WallModeDto {
    Unified,
    Painting,
}

/// Why a pairing ended, on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UnpairReasonDto {
    Repaired,
    AdminDisconnected,
    ClientDisconnected,
    AdminRequest,
    ClientRequest,
}

/// Inbound message
///
/// An unrecognised `type` decodes to `Unknown` and is ignored by the server.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ClientMessage {
    Register {
        role: String,
        display_name: Option<String>,
    },
    GenerateCode {},
    RedeemCode {
        code: String,
    },
    Approve {
        client_id: String,
    },
    Reject {
        client_id: String,
        reason: Option<String>,
    },
    Unpair {
        client_id: Option<String>,
    },
    AssignIndex {
        client_id: String,
        index: u32,
    },
    UpdateConfig {
        rows: Option<u32>,
        cols: Option<u32>,
        mode: Option<WallModeDto>,
        media_url: Option<String>,
        include_self: Option<bool>,
    },
    Sync {
        start_delay_ms: Option<i64>,
        media_url: Option<String>,
        rows: Option<u32>,
        cols: Option<u32>,
        mode: Option<WallModeDto>,
        include_self: Option<bool>,
    },
    SyncStop {},
    Ping {},
    #[serde(other)]
    Unknown,
}

/// Outbound message
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ServerMessage {
    Connected {
        connection_id: String,
        server_time_ms: i64,
    },
    Registered {
        connection_id: String,
        role: String,
        display_name: String,
        server_time_ms: i64,
    },
    CodeGenerated {
        code: String,
        expires_at_ms: i64,
        max_uses: u32,
    },
    CodeExpired {
        code: String,
    },
    PairingExpired {
        code: String,
    },
    ApprovalRequested {
        client_id: String,
        client_name: String,
        code: String,
    },
    ApprovalPending {
        admin_id: String,
        admin_name: String,
    },
    Paired {
        peer_id: String,
        peer_name: String,
    },
    ApprovalRejected {
        #[serde(skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },
    ApprovalCancelled {
        peer_id: String,
        reason: UnpairReasonDto,
    },
    Unpaired {
        admin_id: String,
        reason: UnpairReasonDto,
    },
    ClientUnpaired {
        client_id: String,
        reason: UnpairReasonDto,
    },
    IndexAssigned {
        client_id: String,
        index: u32,
    },
    ConfigUpdated {
        rows: u32,
        cols: u32,
        mode: WallModeDto,
        #[serde(skip_serializing_if = "Option::is_none")]
        media_url: Option<String>,
        include_self: bool,
    },
    SyncStart {
        media_url: String,
        mode: WallModeDto,
        rows: u32,
        cols: u32,
        start_at_ms: i64,
        #[serde(skip_serializing_if = "Option::is_none")]
        tile_index: Option<u32>,
        server_time_ms: i64,
    },
    SyncScheduled {
        start_at_ms: i64,
        count: usize,
    },
    SyncStop {},
    SyncStopped {
        count: usize,
    },
    Pong {
        server_time_ms: i64,
    },
    Error {
        kind: String,
        code: String,
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        retry_after_ms: Option<i64>,
    },
}
