//! Core type definitions

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque 4-byte request timestamp
///
/// Copied verbatim from the query and echoed in every reply frame.
/// The bytes are never interpreted as a number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Timestamp(pub [u8; 4]);

impl Timestamp {
    pub const LEN: usize = 4;

    pub const fn new(bytes: [u8; 4]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }

    /// Read a timestamp from the start of `data`
    pub fn from_slice(data: &[u8]) -> Option<Self> {
        let bytes: [u8; 4] = data.get(..Self::LEN)?.try_into().ok()?;
        Some(Self(bytes))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02X}{:02X}{:02X}{:02X}",
            self.0[0], self.0[1], self.0[2], self.0[3]
        )
    }
}

/// Kind of record held by the state tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    /// The singleton server header record
    Server,
    /// One player slot
    Player,
    /// One team slot
    Team,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Server => "server",
            Self::Player => "player",
            Self::Team => "team",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
