//! UseCase 層のエラー定義

use thiserror::Error;

use crate::domain::{PairingError, RegistryError};

/// 接続受付のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectError {
    #[error("server is at capacity ({max} connections)")]
    CapacityExceeded { max: usize },

    #[error("connection '{0}' is already registered")]
    DuplicateConnection(String),

    #[error("connection rejected: {0}")]
    Rejected(String),
}

impl From<PairingError> for ConnectError {
    fn from(error: PairingError) -> Self {
        match error {
            PairingError::Registry(RegistryError::CapacityExceeded { max }) => {
                ConnectError::CapacityExceeded { max }
            }
            PairingError::Registry(RegistryError::DuplicateConnection(id)) => {
                ConnectError::DuplicateConnection(id)
            }
            other => ConnectError::Rejected(other.to_string()),
        }
    }
}
