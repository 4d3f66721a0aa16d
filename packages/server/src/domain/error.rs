//! Domain errors
//!
//! Every error is local and recoverable: the connection that caused it is
//! told about it and keeps going. `ErrorKind` is the coarse taxonomy sent to
//! clients, `code()` the stable machine-readable identifier.

use thiserror::Error;

use super::value_object::Role;

/// Coarse error category reported to clients
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed or missing fields
    Validation,
    /// Operation attempted by the wrong role
    RoleViolation,
    /// Quota exceeded, retry later
    RateLimited,
    /// Stale code, client or pending approval
    NotFound,
    /// Operation conflicts with current state
    Conflict,
    /// Code generation space exhausted after bounded retries
    Exhausted,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::RoleViolation => "roleViolation",
            ErrorKind::RateLimited => "rateLimited",
            ErrorKind::NotFound => "notFound",
            ErrorKind::Conflict => "conflict",
            ErrorKind::Exhausted => "exhausted",
        }
    }
}

/// Malformed input rejected before it reaches any store
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("'{0}' is not a valid connection id")]
    InvalidConnectionId(String),

    #[error("pairing code must be exactly 6 digits")]
    InvalidCode,

    #[error("display name must be 1-{max} characters")]
    InvalidDisplayName { max: usize },

    #[error("grid must be between 1x1 and {max}x{max}")]
    InvalidGrid { max: u32 },

    #[error("media url must be 1-{max} characters")]
    InvalidMediaUrl { max: usize },

    #[error("a media url is required to start playback")]
    MissingMediaUrl,

    #[error("tile index {index} is outside the {capacity}-tile grid")]
    IndexOutOfRange { index: u32, capacity: u32 },

    #[error("malformed message: {0}")]
    MalformedMessage(String),
}

/// Identity Registry errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("role is already set on this connection")]
    RoleAlreadySet,

    #[error("'{0}' is not a valid role (expected 'admin' or 'client')")]
    InvalidRole(String),

    #[error("this operation requires the '{required}' role")]
    RoleViolation { required: Role },

    #[error("connection '{0}' is not known")]
    UnknownConnection(String),

    #[error("connection '{0}' is already open")]
    DuplicateConnection(String),

    #[error("server is at its limit of {max} connections")]
    CapacityExceeded { max: usize },
}

/// Pairing Code Authority errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodeError {
    #[error("too many attempts, retry in {retry_after_ms} ms")]
    RateLimited { retry_after_ms: i64 },

    #[error("pairing code not found")]
    CodeNotFound,

    #[error("pairing code has expired")]
    CodeExpired,

    #[error("pairing code has no uses left")]
    UsageExhausted,

    #[error("an approval is already pending for this client")]
    ClientAlreadyPending,

    #[error("could not generate a free pairing code")]
    GenerationExhausted,
}

/// Handshake Coordinator errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HandshakeError {
    #[error("no approval is pending for client '{0}'")]
    NoSuchPending(String),

    #[error("the pending approval belongs to another admin")]
    NotOwner,
}

/// Group Membership Store errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GroupError {
    #[error("client '{0}' is not paired with this admin")]
    NotPaired(String),

    #[error("this client is not paired with any admin")]
    NoAdmin,
}

/// Sync Dispatcher errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("no paired displays to dispatch to")]
    NoGroup,

    #[error("{count} displays do not fit a {capacity}-tile grid")]
    GridTooSmall { count: usize, capacity: u32 },
}

/// Any error produced by a pairing hub operation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PairingError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Code(#[from] CodeError),

    #[error(transparent)]
    Handshake(#[from] HandshakeError),

    #[error(transparent)]
    Group(#[from] GroupError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

impl PairingError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PairingError::Validation(_) => ErrorKind::Validation,
            PairingError::Registry(e) => match e {
                RegistryError::RoleAlreadySet => ErrorKind::Conflict,
                RegistryError::InvalidRole(_) => ErrorKind::Validation,
                RegistryError::RoleViolation { .. } => ErrorKind::RoleViolation,
                RegistryError::UnknownConnection(_) => ErrorKind::NotFound,
                RegistryError::DuplicateConnection(_) => ErrorKind::Conflict,
                RegistryError::CapacityExceeded { .. } => ErrorKind::Conflict,
            },
            PairingError::Code(e) => match e {
                CodeError::RateLimited { .. } => ErrorKind::RateLimited,
                CodeError::CodeNotFound | CodeError::CodeExpired => ErrorKind::NotFound,
                CodeError::UsageExhausted | CodeError::ClientAlreadyPending => {
                    ErrorKind::Conflict
                }
                CodeError::GenerationExhausted => ErrorKind::Exhausted,
            },
            PairingError::Handshake(e) => match e {
                HandshakeError::NoSuchPending(_) => ErrorKind::NotFound,
                HandshakeError::NotOwner => ErrorKind::RoleViolation,
            },
            PairingError::Group(_) => ErrorKind::NotFound,
            PairingError::Dispatch(e) => match e {
                DispatchError::NoGroup => ErrorKind::NotFound,
                DispatchError::GridTooSmall { .. } => ErrorKind::Validation,
            },
        }
    }

    /// Stable identifier sent alongside the human readable message
    pub fn code(&self) -> &'static str {
        match self {
            PairingError::Validation(e) => match e {
                ValidationError::InvalidConnectionId(_) => "INVALID_CONNECTION_ID",
                ValidationError::InvalidCode => "INVALID_CODE",
                ValidationError::InvalidDisplayName { .. } => "INVALID_DISPLAY_NAME",
                ValidationError::InvalidGrid { .. } => "INVALID_GRID",
                ValidationError::InvalidMediaUrl { .. } => "INVALID_MEDIA_URL",
                ValidationError::MissingMediaUrl => "MISSING_MEDIA_URL",
                ValidationError::IndexOutOfRange { .. } => "INDEX_OUT_OF_RANGE",
                ValidationError::MalformedMessage(_) => "MALFORMED_MESSAGE",
            },
            PairingError::Registry(e) => match e {
                RegistryError::RoleAlreadySet => "ROLE_ALREADY_SET",
                RegistryError::InvalidRole(_) => "INVALID_ROLE",
                RegistryError::RoleViolation { .. } => "ROLE_VIOLATION",
                RegistryError::UnknownConnection(_) => "UNKNOWN_CONNECTION",
                RegistryError::DuplicateConnection(_) => "DUPLICATE_CONNECTION",
                RegistryError::CapacityExceeded { .. } => "CAPACITY_EXCEEDED",
            },
            PairingError::Code(e) => match e {
                CodeError::RateLimited { .. } => "RATE_LIMITED",
                CodeError::CodeNotFound => "CODE_NOT_FOUND",
                CodeError::CodeExpired => "CODE_EXPIRED",
                CodeError::UsageExhausted => "USAGE_EXHAUSTED",
                CodeError::ClientAlreadyPending => "CLIENT_ALREADY_PENDING",
                CodeError::GenerationExhausted => "GENERATION_EXHAUSTED",
            },
            PairingError::Handshake(e) => match e {
                HandshakeError::NoSuchPending(_) => "NO_SUCH_PENDING",
                HandshakeError::NotOwner => "NOT_OWNER",
            },
            PairingError::Group(e) => match e {
                GroupError::NotPaired(_) => "NOT_PAIRED",
                GroupError::NoAdmin => "NO_ADMIN",
            },
            PairingError::Dispatch(e) => match e {
                DispatchError::NoGroup => "NO_GROUP",
                DispatchError::GridTooSmall { .. } => "GRID_TOO_SMALL",
            },
        }
    }

    /// Retry hint for rate limited operations
    pub fn retry_after_ms(&self) -> Option<i64> {
        match self {
            PairingError::Code(CodeError::RateLimited { retry_after_ms }) => Some(*retry_after_ms),
            _ => None,
        }
    }
}

/// Message delivery errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessagePushError {
    #[error("connection '{0}' is not registered")]
    ClientNotFound(String),

    #[error("failed to push message: {0}")]
    PushFailed(String),

    #[error("failed to encode message: {0}")]
    Encode(String),
}
