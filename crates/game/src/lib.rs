//! # GSEmu Game State
//!
//! This crate holds the state a query reply reports: server headers, player
//! slots and team slots.
//!
//! ## Modules
//!
//! - `fields` - Fixed field tables (name <-> index) per record kind
//! - `record` - Records and fixed-length slot tables
//! - `state` - The combined tables and keyed mutation
//! - `shared` - Reader/writer-locked handle shared across tasks
//! - `error` - State error types

pub mod error;
pub mod fields;
pub mod record;
pub mod shared;
pub mod state;

// Re-export commonly used types
pub use error::{Result, StateError};
pub use fields::{FieldSchema, PlayerField, ServerField, TeamField};
pub use record::{Player, Record, ServerInfo, SlotTable, Team, MAX_SLOTS};
pub use shared::SharedState;
pub use state::{default_server_info, GameState, Target, DEFAULT_PLAYER_SLOTS, DEFAULT_TEAM_SLOTS};
