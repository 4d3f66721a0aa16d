//! WebSocket connection handlers.

use std::sync::Arc;

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::IntoResponse,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use tokio::sync::mpsc;

use crate::{
    domain::{
        ConnectionId, DisplayName, PairingCode, PairingError, Role, TileIndex, ValidationError,
    },
    infrastructure::dto::{conversion::wall_patch, websocket::ClientMessage},
    ui::state::AppState,
    usecase::{ConnectError, report_error},
};

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, StatusCode> {
    // Create a channel for this connection to receive messages
    let (tx, rx) = mpsc::unbounded_channel();

    // `connected` is queued on the channel before the upgrade completes
    match state.connect_session_usecase.execute(tx).await {
        Ok(id) => {
            tracing::info!("Connection '{}' accepted", id.short());
            Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, id, rx)))
        }
        Err(ConnectError::CapacityExceeded { max }) => {
            tracing::warn!("Connection limit of {} reached. Rejecting connection.", max);
            Err(StatusCode::SERVICE_UNAVAILABLE)
        }
        Err(ConnectError::DuplicateConnection(id)) => {
            tracing::warn!("Connection '{}' is already open. Rejecting connection.", id);
            Err(StatusCode::CONFLICT)
        }
        Err(ConnectError::Rejected(reason)) => {
            tracing::warn!("Connection rejected: {}", reason);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Spawns a task that forwards queued messages to the WebSocket sender.
///
/// When the channel closes (the connection was removed from the hub) a Close
/// frame is sent so the peer notices.
fn pusher_loop(
    mut rx: mpsc::UnboundedReceiver<String>,
    mut sender: futures_util::stream::SplitSink<WebSocket, Message>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(Message::Text(msg.into())).await.is_err() {
                return;
            }
        }
        let _ = sender.send(Message::Close(None)).await;
    })
}

async fn handle_socket(
    socket: WebSocket,
    state: Arc<AppState>,
    id: ConnectionId,
    rx: mpsc::UnboundedReceiver<String>,
) {
    let (sender, mut receiver) = socket.split();

    let state_clone = state.clone();
    let id_clone = id.clone();

    // Spawn a task to receive messages from this connection
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::debug!("WebSocket error on '{}': {}", id_clone.short(), e);
                    break;
                }
            };

            // Any inbound frame counts as a liveness signal
            if let Err(e) = state_clone.heartbeat_usecase.touch(&id_clone).await {
                tracing::debug!("Dropping frame from '{}': {}", id_clone.short(), e);
                break;
            }

            match msg {
                Message::Text(text) => {
                    handle_text(&state_clone, &id_clone, text.as_str()).await;
                }
                Message::Binary(_) => {
                    report_error(
                        state_clone.message_pusher.as_ref(),
                        &id_clone,
                        &PairingError::from(ValidationError::MalformedMessage(
                            "binary frames are not supported".to_string(),
                        )),
                    )
                    .await;
                }
                Message::Close(_) => {
                    tracing::info!("Connection '{}' requested close", id_clone.short());
                    break;
                }
                // Ping/pong is handled automatically by the WebSocket protocol
                _ => {}
            }
        }
    });

    // Spawn a task to push queued messages to this connection
    let mut send_task = pusher_loop(rx, sender);

    // If any one of the tasks completes, abort the other
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    };

    // The liveness sweep may already have removed the connection
    match state.disconnect_session_usecase.execute(&id).await {
        Ok(connection) => {
            tracing::info!(
                "Connection '{}' ({}) disconnected",
                id.short(),
                connection.role.map(|r| r.as_str()).unwrap_or("unregistered")
            );
        }
        Err(e) => {
            tracing::debug!("Connection '{}' already removed: {}", id.short(), e);
        }
    }
}

async fn handle_text(state: &AppState, id: &ConnectionId, text: &str) {
    let message = match serde_json::from_str::<ClientMessage>(text) {
        Ok(message) => message,
        Err(e) => {
            tracing::debug!("Malformed message from '{}': {}", id.short(), e);
            let error = PairingError::from(ValidationError::MalformedMessage(e.to_string()));
            report_error(state.message_pusher.as_ref(), id, &error).await;
            return;
        }
    };

    if let Err(e) = route(state, id, message).await {
        report_error(state.message_pusher.as_ref(), id, &e).await;
    }
}

/// Convert a decoded message into domain values and run its use case.
///
/// Use case failures are echoed to the requester by the use case itself; only
/// conversion errors are returned here.
async fn route(
    state: &AppState,
    id: &ConnectionId,
    message: ClientMessage,
) -> Result<(), PairingError> {
    match message {
        ClientMessage::Register { role, display_name } => {
            // String -> Domain Model
            let role = role.parse::<Role>()?;
            let display_name = display_name.map(DisplayName::try_from).transpose()?;
            let _ = state
                .register_identity_usecase
                .execute(id, role, display_name)
                .await;
        }
        ClientMessage::GenerateCode {} => {
            let _ = state.issue_code_usecase.execute(id).await;
        }
        ClientMessage::RedeemCode { code } => {
            let code = PairingCode::try_from(code)?;
            let _ = state.redeem_code_usecase.execute(id, &code).await;
        }
        ClientMessage::Approve { client_id } => {
            let client = ConnectionId::try_from(client_id)?;
            let _ = state.approve_pairing_usecase.execute(id, &client).await;
        }
        ClientMessage::Reject { client_id, reason } => {
            let client = ConnectionId::try_from(client_id)?;
            let _ = state
                .reject_pairing_usecase
                .execute(id, &client, reason)
                .await;
        }
        ClientMessage::Unpair { client_id } => {
            let target = client_id.map(ConnectionId::try_from).transpose()?;
            let _ = state.unpair_usecase.execute(id, target.as_ref()).await;
        }
        ClientMessage::AssignIndex { client_id, index } => {
            let target = ConnectionId::try_from(client_id)?;
            let _ = state
                .configure_wall_usecase
                .assign_index(id, &target, TileIndex::new(index))
                .await;
        }
        ClientMessage::UpdateConfig {
            rows,
            cols,
            mode,
            media_url,
            include_self,
        } => {
            let patch = wall_patch(rows, cols, mode, media_url, include_self)?;
            let _ = state.configure_wall_usecase.update_config(id, &patch).await;
        }
        ClientMessage::Sync {
            start_delay_ms,
            media_url,
            rows,
            cols,
            mode,
            include_self,
        } => {
            let overrides = wall_patch(rows, cols, mode, media_url, include_self)?;
            let _ = state
                .dispatch_sync_usecase
                .execute(id, &overrides, start_delay_ms)
                .await;
        }
        ClientMessage::SyncStop {} => {
            let _ = state.dispatch_sync_usecase.stop(id).await;
        }
        ClientMessage::Ping {} => {
            let _ = state.heartbeat_usecase.ping(id).await;
        }
        ClientMessage::Unknown => {
            tracing::debug!("Ignoring message of unknown type from '{}'", id.short());
        }
    }
    Ok(())
}
