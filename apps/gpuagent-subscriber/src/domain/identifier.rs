//! Entity Identifiers
//!
//! GPUs and watch objects are named on the wire by 16-byte identifiers that
//! users exchange as UUID text.

use std::fmt;
use std::str::FromStr;

use uuid::Uuid;

/// Length of an entity identifier on the wire.
pub const ENTITY_ID_LEN: usize = 16;

/// A 16-byte identifier naming a GPU or a watch object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityId(Uuid);

impl EntityId {
    /// Get the raw bytes as sent on the wire.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; ENTITY_ID_LEN] {
        self.0.as_bytes()
    }

    /// Copy the raw bytes into an owned buffer for a protobuf `bytes` field.
    #[must_use]
    pub fn to_wire(&self) -> Vec<u8> {
        self.0.as_bytes().to_vec()
    }

    /// Render raw wire bytes the way the agent CLI does.
    ///
    /// Empty or all-zero ids render as `-`. Anything that is not exactly
    /// 16 bytes renders as `-` too, since it cannot name an entity.
    #[must_use]
    pub fn display_wire(bytes: &[u8]) -> String {
        if bytes.iter().all(|b| *b == 0) {
            return "-".to_string();
        }
        Uuid::from_slice(bytes).map_or_else(|_| "-".to_string(), |id| id.hyphenated().to_string())
    }
}

impl FromStr for EntityId {
    type Err = uuid::Error;

    /// Parse UUID text. Hyphenated, simple, braced and URN forms are all
    /// accepted.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}
