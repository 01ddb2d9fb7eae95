//! Player roster.
//!
//! Contains the player arena, team factory collaborator, side descriptors,
//! and versioned roster snapshots.

pub mod list;
pub mod player;
pub mod side;
pub mod snapshot;
pub mod team;

pub use list::{PlayerList, PlayersInMask, RosterError};
pub use player::{
    NameKey, Player, PlayerAi, PlayerIndex, PlayerMask, PlayerSnapshot, PlayerType, Relationship,
    RelationshipFilter, MAX_PLAYER_COUNT,
};
pub use side::{
    keys, load_sides, load_sides_from_str, BuildInfo, BuildList, Dict, DictValue, SideInfo,
    SideParseError, SidesList, MAX_SLOTS,
};
pub use snapshot::{RosterSnapshot, SnapshotError, ROSTER_SNAPSHOT_VERSION};
pub use team::{default_team_name, Team, TeamFactory, TeamId, TeamTable};
