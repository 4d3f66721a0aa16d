//! Conversion logic between DTOs and domain types.

use crate::domain::{MediaUrl, Notice, UnpairReason, ValidationError, WallMode, WallPatch};
use crate::infrastructure::dto::websocket as dto;

// ========================================
// DTO → Domain
// ========================================

impl From<dto::WallModeDto> for WallMode {
    fn from(dto: dto::WallModeDto) -> Self {
        match dto {
            dto::WallModeDto::Unified => WallMode::Unified,
            dto::WallModeDto::Painting => WallMode::Painting,
        }
    }
}

/// Build a `WallPatch` from the optional wall fields of `updateConfig` / `sync`.
pub fn wall_patch(
    rows: Option<u32>,
    cols: Option<u32>,
    mode: Option<dto::WallModeDto>,
    media_url: Option<String>,
    include_self: Option<bool>,
) -> Result<WallPatch, ValidationError> {
    Ok(WallPatch {
        rows,
        cols,
        mode: mode.map(WallMode::from),
        media_url: media_url.map(MediaUrl::try_from).transpose()?,
        include_self,
    })
}

// ========================================
// Domain → DTO
// ========================================

impl From<WallMode> for dto::WallModeDto {
    fn from(model: WallMode) -> Self {
        match model {
            WallMode::Unified => dto::WallModeDto::Unified,
            WallMode::Painting => dto::WallModeDto::Painting,
        }
    }
}

impl From<UnpairReason> for dto::UnpairReasonDto {
    fn from(model: UnpairReason) -> Self {
        match model {
            UnpairReason::Repaired => dto::UnpairReasonDto::Repaired,
            UnpairReason::AdminDisconnected => dto::UnpairReasonDto::AdminDisconnected,
            UnpairReason::ClientDisconnected => dto::UnpairReasonDto::ClientDisconnected,
            UnpairReason::AdminRequest => dto::UnpairReasonDto::AdminRequest,
            UnpairReason::ClientRequest => dto::UnpairReasonDto::ClientRequest,
        }
    }
}

impl From<Notice> for dto::ServerMessage {
    fn from(notice: Notice) -> Self {
        use dto::ServerMessage as M;

        match notice {
            Notice::Connected {
                connection_id,
                server_time,
            } => M::Connected {
                connection_id: connection_id.into_string(),
                server_time_ms: server_time.value(),
            },
            Notice::Registered {
                connection_id,
                role,
                display_name,
                server_time,
            } => M::Registered {
                connection_id: connection_id.into_string(),
                role: role.as_str().to_string(),
                display_name: display_name.as_str().to_string(),
                server_time_ms: server_time.value(),
            },
            Notice::CodeIssued {
                code,
                expires_at,
                max_uses,
            } => M::CodeGenerated {
                code: code.into_string(),
                expires_at_ms: expires_at.value(),
                max_uses,
            },
            Notice::CodeExpired { code } => M::CodeExpired {
                code: code.into_string(),
            },
            Notice::PairingExpired { code } => M::PairingExpired {
                code: code.into_string(),
            },
            Notice::ApprovalRequested {
                client_id,
                client_name,
                code,
            } => M::ApprovalRequested {
                client_id: client_id.into_string(),
                client_name: client_name.as_str().to_string(),
                code: code.into_string(),
            },
            Notice::ApprovalPending {
                admin_id,
                admin_name,
            } => M::ApprovalPending {
                admin_id: admin_id.into_string(),
                admin_name: admin_name.as_str().to_string(),
            },
            Notice::Paired { peer_id, peer_name } => M::Paired {
                peer_id: peer_id.into_string(),
                peer_name: peer_name.as_str().to_string(),
            },
            Notice::ApprovalRejected { reason } => M::ApprovalRejected { reason },
            Notice::ApprovalCancelled { peer_id, reason } => M::ApprovalCancelled {
                peer_id: peer_id.into_string(),
                reason: reason.into(),
            },
            Notice::Unpaired { admin_id, reason } => M::Unpaired {
                admin_id: admin_id.into_string(),
                reason: reason.into(),
            },
            Notice::ClientUnpaired { client_id, reason } => M::ClientUnpaired {
                client_id: client_id.into_string(),
                reason: reason.into(),
            },
            Notice::IndexAssigned { client_id, index } => M::IndexAssigned {
                client_id: client_id.into_string(),
                index: index.value(),
            },
            Notice::ConfigUpdated { config } => M::ConfigUpdated {
                rows: config.grid.rows(),
                cols: config.grid.cols(),
                mode: config.mode.into(),
                media_url: config.media_url.map(|url| url.as_str().to_string()),
                include_self: config.include_self,
            },
            Notice::SyncStart {
                media_url,
                mode,
                rows,
                cols,
                start_at,
                tile_index,
                server_time,
            } => M::SyncStart {
                media_url,
                mode: mode.into(),
                rows,
                cols,
                start_at_ms: start_at.value(),
                tile_index: tile_index.map(|t| t.value()),
                server_time_ms: server_time.value(),
            },
            Notice::SyncScheduled { start_at, count } => M::SyncScheduled {
                start_at_ms: start_at.value(),
                count,
            },
            Notice::SyncStop => M::SyncStop {},
            Notice::SyncStopped { count } => M::SyncStopped { count },
            Notice::Pong { server_time } => M::Pong {
                server_time_ms: server_time.value(),
            },
            Notice::Error {
                kind,
                code,
                message,
                retry_after_ms,
            } => M::Error {
                kind: kind.to_string(),
                code: code.to_string(),
                message,
                retry_after_ms,
            },
        }
    }
}
