//! Versioned roster snapshots.
//!
//! A snapshot is the active player count followed by one record per active
//! player. The count cannot change at runtime, so a restore whose count
//! disagrees with the live roster means the save is corrupt and is refused.

use log::error;
use serde::{Deserialize, Serialize};

use super::list::PlayerList;
use super::player::PlayerSnapshot;

/// Current roster snapshot version.
pub const ROSTER_SNAPSHOT_VERSION: u8 = 1;

/// Errors raised while encoding or restoring a snapshot.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("unsupported snapshot version {found} (current is {current})")]
    UnsupportedVersion { found: u8, current: u8 },

    #[error("invalid player count {found}, should be {expected}")]
    PlayerCountMismatch { found: usize, expected: usize },

    #[error("snapshot declares {declared} players but carries {records} records")]
    RecordCountMismatch { declared: usize, records: usize },
}

/// A serialized roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterSnapshot {
    pub version: u8,
    pub player_count: usize,
    pub players: Vec<PlayerSnapshot>,
}

impl PlayerList {
    /// Captures the active players.
    pub fn snapshot(&self) -> RosterSnapshot {
        RosterSnapshot {
            version: ROSTER_SNAPSHOT_VERSION,
            player_count: self.player_count(),
            players: self.players().map(|p| p.snapshot()).collect(),
        }
    }

    /// Restores per-player state from `snapshot`.
    ///
    /// Nothing is modified unless the version and player count check out.
    pub fn restore(&mut self, snapshot: &RosterSnapshot) -> Result<(), SnapshotError> {
        if snapshot.version == 0 || snapshot.version > ROSTER_SNAPSHOT_VERSION {
            error!("unsupported roster snapshot version {}", snapshot.version);
            return Err(SnapshotError::UnsupportedVersion {
                found: snapshot.version,
                current: ROSTER_SNAPSHOT_VERSION,
            });
        }

        if snapshot.player_count != self.player_count() {
            error!(
                "invalid player count '{}', should be '{}'",
                snapshot.player_count,
                self.player_count()
            );
            return Err(SnapshotError::PlayerCountMismatch {
                found: snapshot.player_count,
                expected: self.player_count(),
            });
        }

        if snapshot.players.len() != snapshot.player_count {
            error!(
                "roster snapshot declares {} players but carries {}",
                snapshot.player_count,
                snapshot.players.len()
            );
            return Err(SnapshotError::RecordCountMismatch {
                declared: snapshot.player_count,
                records: snapshot.players.len(),
            });
        }

        for (player, record) in self.players_mut().iter_mut().zip(&snapshot.players) {
            player.restore(record);
        }
        Ok(())
    }
}
