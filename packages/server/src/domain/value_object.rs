//! Value Objects
//!
//! ドメインで扱う値を型で表現します。生成時にバリデーションを行い、
//! 不正な値がドメインロジックに入り込まないようにします。

use std::{fmt, str::FromStr};

use serde::Serialize;
use uuid::Uuid;

use super::error::{RegistryError, ValidationError};

/// 表示名の最大文字数
pub const MAX_DISPLAY_NAME_CHARS: usize = 64;

/// メディア URL の最大文字数
pub const MAX_MEDIA_URL_CHARS: usize = 2048;

/// ペアリングコードの桁数
pub const PAIRING_CODE_DIGITS: usize = 6;

/// ペアリングコード空間の大きさ（000000〜999999）
pub const PAIRING_CODE_SPACE: u32 = 1_000_000;

/// Connection identity issued by the server when a socket is accepted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ConnectionId(String);

impl ConnectionId {
    /// Generate a fresh random identity (UUID v4).
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// First eight characters, used for default display names and logs.
    pub fn short(&self) -> &str {
        self.0.get(..8).unwrap_or(&self.0)
    }
}

impl TryFrom<String> for ConnectionId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Uuid::parse_str(value.trim())
            .map(|uuid| Self(uuid.to_string()))
            .map_err(|_| ValidationError::InvalidConnectionId(value))
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Role chosen by a connection in its `register` message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Client,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Client => "client",
        }
    }
}

impl FromStr for Role {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "client" => Ok(Role::Client),
            other => Err(RegistryError::InvalidRole(other.to_string())),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Human readable name shown on the other side of a pairing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayName(String);

impl DisplayName {
    pub fn new(value: String) -> Result<Self, ValidationError> {
        let trimmed = value.trim();
        let chars = trimmed.chars().count();
        if chars == 0 || chars > MAX_DISPLAY_NAME_CHARS {
            return Err(ValidationError::InvalidDisplayName {
                max: MAX_DISPLAY_NAME_CHARS,
            });
        }
        Ok(Self(trimmed.to_string()))
    }

    /// `"<role>-<short id>"`, used when `register` carries no name.
    pub fn fallback(role: Role, id: &ConnectionId) -> Self {
        Self(format!("{}-{}", role.as_str(), id.short()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for DisplayName {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Six digit numeric pairing code, leading zeros included.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PairingCode(String);

impl PairingCode {
    /// Build a code from a number in `0..PAIRING_CODE_SPACE`.
    pub fn from_number(n: u32) -> Self {
        Self(format!("{:06}", n % PAIRING_CODE_SPACE))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for PairingCode {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let trimmed = value.trim();
        if trimmed.len() == PAIRING_CODE_DIGITS && trimmed.bytes().all(|b| b.is_ascii_digit()) {
            Ok(Self(trimmed.to_string()))
        } else {
            Err(ValidationError::InvalidCode)
        }
    }
}

impl fmt::Display for PairingCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Grid cell a display renders in painting mode (row-major).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileIndex(u32);

impl TileIndex {
    pub fn new(value: u32) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u32 {
        self.0
    }
}

/// Media location handed to displays unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaUrl(String);

impl MediaUrl {
    pub fn new(value: String) -> Result<Self, ValidationError> {
        let trimmed = value.trim();
        if trimmed.is_empty() || trimmed.chars().count() > MAX_MEDIA_URL_CHARS {
            return Err(ValidationError::InvalidMediaUrl {
                max: MAX_MEDIA_URL_CHARS,
            });
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for MediaUrl {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Unix timestamp in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(i64);

impl Timestamp {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn plus_millis(&self, millis: i64) -> Self {
        Self(self.0.saturating_add(millis))
    }

    /// Milliseconds elapsed since `earlier` (negative if `earlier` is in the future).
    pub fn millis_since(&self, earlier: Timestamp) -> i64 {
        self.0.saturating_sub(earlier.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_id_roundtrips_generated_uuid() {
        // テスト項目: 生成した ConnectionId を文字列から復元できる
        // given (前提条件):
        let id = ConnectionId::generate();

        // when (操作):
        let parsed = ConnectionId::try_from(id.as_str().to_string());

        // then (期待する結果):
        assert_eq!(parsed, Ok(id));
    }

    #[test]
    fn test_connection_id_rejects_garbage() {
        // テスト項目: UUID でない文字列は ConnectionId にならない
        let result = ConnectionId::try_from("alice".to_string());

        assert_eq!(
            result,
            Err(ValidationError::InvalidConnectionId("alice".to_string()))
        );
    }

    #[test]
    fn test_role_parse() {
        // テスト項目: admin / client 以外のロールは InvalidRole になる
        assert_eq!("admin".parse::<Role>(), Ok(Role::Admin));
        assert_eq!("client".parse::<Role>(), Ok(Role::Client));
        assert_eq!(
            "viewer".parse::<Role>(),
            Err(RegistryError::InvalidRole("viewer".to_string()))
        );
    }

    #[test]
    fn test_pairing_code_validation() {
        // テスト項目: 6 桁の数字のみがペアリングコードとして受理される
        assert!(PairingCode::try_from("482913".to_string()).is_ok());
        assert!(PairingCode::try_from(" 000001 ".to_string()).is_ok());
        assert_eq!(
            PairingCode::try_from("48291".to_string()),
            Err(ValidationError::InvalidCode)
        );
        assert_eq!(
            PairingCode::try_from("48291a".to_string()),
            Err(ValidationError::InvalidCode)
        );
    }

    #[test]
    fn test_pairing_code_from_number_keeps_leading_zeros() {
        // テスト項目: 数値から生成したコードは先頭ゼロを保持する
        assert_eq!(PairingCode::from_number(42).as_str(), "000042");
        assert_eq!(PairingCode::from_number(999_999).as_str(), "999999");
    }

    #[test]
    fn test_display_name_is_trimmed_and_bounded() {
        // テスト項目: 表示名は前後の空白が除去され、空や長すぎる名前は拒否される
        assert_eq!(
            DisplayName::new("  Lobby TV  ".to_string()).unwrap().as_str(),
            "Lobby TV"
        );
        assert!(DisplayName::new("   ".to_string()).is_err());
        assert!(DisplayName::new("x".repeat(MAX_DISPLAY_NAME_CHARS + 1)).is_err());
    }

    #[test]
    fn test_display_name_fallback_uses_role_and_short_id() {
        // テスト項目: 表示名の既定値はロールと ID の先頭 8 文字から作られる
        let id = ConnectionId::generate();

        let name = DisplayName::fallback(Role::Client, &id);

        assert_eq!(name.as_str(), format!("client-{}", &id.as_str()[..8]));
    }
}
