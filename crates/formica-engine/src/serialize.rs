//! Exported session state and its versioned binary encoding.
//!
//! [`UpgradeState`] is what the engine hands to persistence collaborators.
//! Only the active set is authoritative: the cumulative record is always
//! recomputed on import, and `last_cache_timestamp` is informational.

use formica_core::clock::Millis;
use formica_core::id::{ColonyId, TechId};
use formica_tech_tree::TechnologyNode;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Magic number identifying a Formica upgrade snapshot.
pub const SNAPSHOT_MAGIC: u32 = 0xF0A1_C001;

/// Current format version. Increment when breaking the wire format.
pub const FORMAT_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("bitcode encoding failed: {0}")]
    Encode(String),
    #[error("bitcode decoding failed: {0}")]
    Decode(String),
    #[error("invalid magic number: expected 0x{:08X}, got 0x{:08X}", SNAPSHOT_MAGIC, .0)]
    InvalidMagic(u32),
    #[error("unsupported format version: expected {}, got {}", FORMAT_VERSION, .0)]
    UnsupportedVersion(u32),
    #[error("snapshot from future version {0} (this build supports up to {FORMAT_VERSION})")]
    FutureVersion(u32),
}

// ---------------------------------------------------------------------------
// Header
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotHeader {
    pub magic: u32,
    pub version: u32,
}

impl SnapshotHeader {
    pub fn new() -> Self {
        Self {
            magic: SNAPSHOT_MAGIC,
            version: FORMAT_VERSION,
        }
    }

    pub fn validate(&self) -> Result<(), SnapshotError> {
        if self.magic != SNAPSHOT_MAGIC {
            return Err(SnapshotError::InvalidMagic(self.magic));
        }
        if self.version > FORMAT_VERSION {
            return Err(SnapshotError::FutureVersion(self.version));
        }
        if self.version < FORMAT_VERSION {
            return Err(SnapshotError::UnsupportedVersion(self.version));
        }
        Ok(())
    }
}

impl Default for SnapshotHeader {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// UpgradeState
// ---------------------------------------------------------------------------

/// A colony's upgrade session, as exported by
/// [`UpgradeEngine::export_state`](crate::UpgradeEngine::export_state).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpgradeState {
    pub colony_id: ColonyId,
    /// Active upgrades as `(id, node)` pairs, in ascending id order.
    pub active_upgrades: Vec<(TechId, TechnologyNode)>,
    /// When the effect record was last computed, if it ever was.
    pub last_cache_timestamp: Option<Millis>,
}

#[derive(Serialize, Deserialize)]
struct StateSnapshot {
    header: SnapshotHeader,
    state: UpgradeState,
}

impl UpgradeState {
    /// Encode with a magic/version header.
    pub fn to_bytes(&self) -> Result<Vec<u8>, SnapshotError> {
        let snapshot = StateSnapshot {
            header: SnapshotHeader::new(),
            state: self.clone(),
        };
        bitcode::serialize(&snapshot).map_err(|e| SnapshotError::Encode(e.to_string()))
    }

    /// Decode bytes produced by [`to_bytes`](Self::to_bytes). The header is
    /// validated before the state is returned.
    pub fn from_bytes(data: &[u8]) -> Result<Self, SnapshotError> {
        let snapshot: StateSnapshot =
            bitcode::deserialize(data).map_err(|e| SnapshotError::Decode(e.to_string()))?;
        snapshot.header.validate()?;
        Ok(snapshot.state)
    }
}

// ===========================================================================
// Tests
// ===========================================================================
