//! # Game State Tables
//!
//! The full reported state of the emulated server: one header record, a
//! player slot table and a team slot table.
//!
//! Mutation goes through [`GameState::set`], [`GameState::get`] and
//! [`GameState::clear`], which address a record with a [`Target`] and a field
//! by its wire name. These are the keyed operations the admin console drives.

use crate::error::{Result, StateError};
use crate::fields::{FieldSchema, PlayerField, ServerField, TeamField};
use crate::record::{checked_value, Record, ServerInfo, SlotTable};
use gsemu_core::EntityKind;
use std::fmt;

/// Default number of player slots (Battlefield 2 maximum)
pub const DEFAULT_PLAYER_SLOTS: usize = 64;

/// Default number of team slots
pub const DEFAULT_TEAM_SLOTS: usize = 2;

/// Addresses one record in the state tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    Server,
    Player(usize),
    Team(usize),
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Server => f.write_str("server"),
            Self::Player(index) => write!(f, "player[{}]", index),
            Self::Team(index) => write!(f, "team[{}]", index),
        }
    }
}

/// Server, player and team tables
///
/// # Invariants
/// - Slot counts are fixed at construction
/// - Every record of a kind shares that kind's field table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameState {
    pub server: ServerInfo,
    pub players: SlotTable<PlayerField>,
    pub teams: SlotTable<TeamField>,
}

impl GameState {
    /// Create empty tables with the given slot counts
    ///
    /// No header is set, every player slot is free and every team slot is
    /// free.
    pub fn new(player_slots: usize, team_slots: usize) -> Result<Self> {
        Ok(Self {
            server: ServerInfo::new(),
            players: SlotTable::new(player_slots)?,
            teams: SlotTable::new(team_slots)?,
        })
    }

    /// Create the default Project Reality style server
    ///
    /// Headers carry the values a stock Battlefield 2 1.5 server reports, all
    /// player slots are free and every team slot holds an empty team record.
    pub fn with_slots(player_slots: usize, team_slots: usize) -> Result<Self> {
        let mut state = Self::new(player_slots, team_slots)?;
        state.server = default_server_info();
        for index in 0..team_slots {
            state.teams.occupy(index)?;
        }
        Ok(state)
    }

    /// Overwrite a field of `target`, looked up by wire name
    ///
    /// Setting a field on a free player or team slot occupies that slot with
    /// an otherwise empty record.
    ///
    /// # Errors
    /// - `UnknownField` if `name` is not in the kind's schema
    /// - `SlotOutOfRange` if the slot index is past the end of the table
    /// - `InvalidValue` if `value` contains a NUL byte
    ///
    /// State is unchanged on error.
    pub fn set(&mut self, target: Target, name: &str, value: impl Into<String>) -> Result<()> {
        match target {
            Target::Server => self.server.set_by_name(name, value),
            Target::Player(index) => set_slot(&mut self.players, index, name, value),
            Target::Team(index) => set_slot(&mut self.teams, index, name, value),
        }?;
        tracing::debug!("Updated {} field {}", target, name);
        Ok(())
    }

    /// Read a field of `target`, looked up by wire name
    pub fn get(&self, target: Target, name: &str) -> Result<&str> {
        match target {
            Target::Server => self.server.get_by_name(name),
            Target::Player(index) => get_slot(&self.players, index, name),
            Target::Team(index) => get_slot(&self.teams, index, name),
        }
    }

    /// Free a player or team slot
    ///
    /// Clearing an already free slot is not an error.
    pub fn clear(&mut self, target: Target) -> Result<()> {
        match target {
            Target::Server => return Err(StateError::NotSlotted(EntityKind::Server)),
            Target::Player(index) => {
                self.players.clear(index)?;
            }
            Target::Team(index) => {
                self.teams.clear(index)?;
            }
        }
        tracing::debug!("Cleared {}", target);
        Ok(())
    }
}

impl Default for GameState {
    fn default() -> Self {
        let mut teams = SlotTable::with_len(DEFAULT_TEAM_SLOTS);
        for index in 0..DEFAULT_TEAM_SLOTS {
            teams.fill(index);
        }
        Self {
            server: default_server_info(),
            players: SlotTable::with_len(DEFAULT_PLAYER_SLOTS),
            teams,
        }
    }
}

/// Header values of the stock server
///
/// The game never gets updates any more, so the version is fixed. BF2 always
/// answers `openplaying` for the game mode.
pub fn default_server_info() -> ServerInfo {
    ServerInfo::new()
        .with(ServerField::HostName, "A PR Server")
        .with(ServerField::GameName, "battlefield2")
        .with(ServerField::GameVersion, "1.5.3153-802.0")
        .with(ServerField::GameMode, "openplaying")
        .with(ServerField::Os, "win32")
        .with(ServerField::TkMode, "Punish")
        .with(ServerField::Fps, "36")
}

fn set_slot<F: FieldSchema>(
    table: &mut SlotTable<F>,
    index: usize,
    name: &str,
    value: impl Into<String>,
) -> Result<()> {
    // Validate before touching the slot so a bad command never occupies it
    let field = F::from_name(name).ok_or_else(|| StateError::UnknownField {
        kind: F::KIND,
        name: name.to_string(),
    })?;
    let value = checked_value(F::KIND, name, value.into())?;
    table.occupy(index)?.set(field, value);
    Ok(())
}

fn get_slot<'a, F: FieldSchema>(table: &'a SlotTable<F>, index: usize, name: &str) -> Result<&'a str> {
    if index >= table.len() {
        return Err(StateError::SlotOutOfRange {
            kind: F::KIND,
            index,
            slots: table.len(),
        });
    }
    let record: &Record<F> = table
        .get(index)
        .ok_or(StateError::EmptySlot { kind: F::KIND, index })?;
    record.get_by_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gsemu_core::GsEmuError;

    #[test]
    fn test_default_state() {
        let state = GameState::default();
        assert_eq!(state.server.get(ServerField::HostName), "A PR Server");
        assert_eq!(state.server.get(ServerField::Fps), "36");
        assert_eq!(state.server.get(ServerField::MapName), "");
        assert_eq!(state.players.len(), DEFAULT_PLAYER_SLOTS);
        assert_eq!(state.players.occupied(), 0);
        assert_eq!(state.teams.occupied(), DEFAULT_TEAM_SLOTS);
    }

    #[test]
    fn test_with_slots_matches_default() {
        let state = GameState::with_slots(DEFAULT_PLAYER_SLOTS, DEFAULT_TEAM_SLOTS).unwrap();
        assert_eq!(state, GameState::default());
    }

    #[test]
    fn test_set_player_field() {
        let mut state = GameState::default();
        state.set(Target::Player(3), "player_", "Bob").unwrap();
        assert_eq!(state.players.value(3, PlayerField::Name), "Bob");
        assert_eq!(state.get(Target::Player(3), "player_").unwrap(), "Bob");
        assert_eq!(state.players.occupied(), 1);
    }

    #[test]
    fn test_set_out_of_range_is_unchanged() {
        let mut state = GameState::default();
        let before = state.clone();
        let err = state.set(Target::Player(64), "player_", "Bob").unwrap_err();
        assert!(matches!(err, StateError::SlotOutOfRange { index: 64, .. }));
        assert_eq!(state, before);
    }

    #[test]
    fn test_set_unknown_field_does_not_occupy() {
        let mut state = GameState::default();
        let before = state.clone();
        assert!(state.set(Target::Player(0), "nickname", "Bob").is_err());
        assert_eq!(state, before);
    }

    #[test]
    fn test_set_rejects_nul_value() {
        let mut state = GameState::default();
        let before = state.clone();

        let err = state.set(Target::Server, "hostname", "a\0b").unwrap_err();
        assert!(matches!(err, StateError::InvalidValue { .. }));
        // A rejected value must not occupy the free slot either
        let err = state.set(Target::Player(0), "player_", "x\0").unwrap_err();
        assert_eq!(
            err,
            StateError::InvalidValue {
                kind: EntityKind::Player,
                name: "player_".into()
            }
        );
        assert_eq!(state, before);
        assert!(matches!(GsEmuError::from(err), GsEmuError::InvalidData(_)));
    }

    #[test]
    fn test_set_server_field() {
        let mut state = GameState::default();
        state.set(Target::Server, "mapname", "kashan_desert").unwrap();
        assert_eq!(state.server.get(ServerField::MapName), "kashan_desert");
    }

    #[test]
    fn test_get_empty_slot() {
        let state = GameState::default();
        assert!(matches!(
            state.get(Target::Player(0), "player_"),
            Err(StateError::EmptySlot { index: 0, .. })
        ));
    }

    #[test]
    fn test_clear() {
        let mut state = GameState::default();
        state.set(Target::Player(1), "ping_", "50").unwrap();
        state.clear(Target::Player(1)).unwrap();
        assert_eq!(state.players.occupied(), 0);
        assert!(state.clear(Target::Player(1)).is_ok());
        assert_eq!(
            state.clear(Target::Server),
            Err(StateError::NotSlotted(EntityKind::Server))
        );
    }

    #[test]
    fn test_target_display() {
        assert_eq!(Target::Player(7).to_string(), "player[7]");
        assert_eq!(Target::Team(0).to_string(), "team[0]");
    }
}
