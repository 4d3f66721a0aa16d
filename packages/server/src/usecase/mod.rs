//! UseCase layer
//!
//! Each use case runs one hub operation through the `HubRepository`, then
//! pushes the resulting notifications with the `MessagePusher` once the hub
//! lock has been released. Errors are echoed to the requesting connection.

mod approve_pairing;
mod configure_wall;
mod connect_session;
mod disconnect_session;
mod dispatch_sync;
pub mod error;
mod get_server_time;
mod get_stats;
mod heartbeat;
mod issue_code;
mod redeem_code;
mod register_identity;
mod reject_pairing;
mod sweep;
mod unpair;

#[cfg(test)]
pub(crate) mod test_support;

pub use approve_pairing::ApprovePairingUseCase;
pub use configure_wall::ConfigureWallUseCase;
pub use connect_session::ConnectSessionUseCase;
pub use disconnect_session::DisconnectSessionUseCase;
pub use dispatch_sync::DispatchSyncUseCase;
pub use error::ConnectError;
pub use get_server_time::GetServerTimeUseCase;
pub use get_stats::GetStatsUseCase;
pub use heartbeat::HeartbeatUseCase;
pub use issue_code::IssueCodeUseCase;
pub use redeem_code::RedeemCodeUseCase;
pub use register_identity::RegisterIdentityUseCase;
pub use reject_pairing::RejectPairingUseCase;
pub use sweep::SweepUseCase;
pub use unpair::UnpairUseCase;

use crate::domain::{ConnectionId, MessagePusher, Notice, PairingError, Transition};

/// Push the notifications of `transition` and echo its error to `requester`.
pub(crate) async fn settle<T>(
    message_pusher: &dyn MessagePusher,
    requester: &ConnectionId,
    transition: Transition<T>,
) -> Result<T, PairingError> {
    let Transition { result, outbox } = transition;
    message_pusher.deliver(outbox).await;
    if let Err(e) = &result {
        report_error(message_pusher, requester, e).await;
    }
    result
}

/// Echo `error` to `requester` as an `error` message.
pub async fn report_error(
    message_pusher: &dyn MessagePusher,
    requester: &ConnectionId,
    error: &PairingError,
) {
    tracing::debug!("Rejected request from '{}': {}", requester.short(), error);
    if let Err(e) = message_pusher
        .push_to(requester, &Notice::from(error))
        .await
    {
        tracing::debug!("Could not report error to '{}': {}", requester.short(), e);
    }
}
