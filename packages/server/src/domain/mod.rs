//! Domain layer
//!
//! Pure pairing and dispatch logic. Nothing here performs I/O; time is
//! passed in as `Timestamp` and notifications are collected in an `Outbox`.

pub mod error;
pub mod group;
pub mod handshake;
pub mod hub;
pub mod identity;
pub mod message_pusher;
pub mod notice;
pub mod pairing_code;
pub mod rate_limit;
pub mod repository;
pub mod value_object;
pub mod wall;

pub use error::{
    CodeError, DispatchError, ErrorKind, GroupError, HandshakeError, MessagePushError,
    PairingError, RegistryError, ValidationError,
};
pub use hub::{HubPolicy, HubStats, PairingHub};
pub use identity::Connection;
pub use message_pusher::{MessagePusher, PusherChannel};
pub use notice::{Delivery, Notice, Outbox, UnpairReason};
pub use pairing_code::{CodeGenerator, CodePolicy, IssuedCode};
pub use rate_limit::RateLimit;
pub use repository::{HubRepository, Transition};
pub use value_object::{
    ConnectionId, DisplayName, MediaUrl, PairingCode, Role, TileIndex, Timestamp,
};
pub use wall::{GridShape, SyncPlan, WallConfig, WallMode, WallPatch};
