//! Error types for the state tables

use gsemu_core::{EntityKind, GsEmuError};

/// Mutation and lookup failures
///
/// All of these are recoverable: callers that want the legacy no-op
/// behaviour simply ignore the error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StateError {
    /// No field with this name exists for the record kind
    #[error("Unknown {kind} field: {name}")]
    UnknownField { kind: EntityKind, name: String },

    /// Slot index past the end of the slot array
    #[error("{kind} slot {index} out of range (0..{slots})")]
    SlotOutOfRange {
        kind: EntityKind,
        index: usize,
        slots: usize,
    },

    /// Value cannot be carried as one nul-terminated wire token
    #[error("{kind} field {name}: value contains a NUL byte")]
    InvalidValue { kind: EntityKind, name: String },

    /// Slot exists but holds no record
    #[error("{kind} slot {index} is empty")]
    EmptySlot { kind: EntityKind, index: usize },

    /// Slot operation requested on the singleton server record
    #[error("{0} records are not slotted")]
    NotSlotted(EntityKind),

    /// Slot array would not be addressable by a one-byte cursor
    #[error("{kind} slot count {requested} exceeds maximum {max}")]
    TooManySlots {
        kind: EntityKind,
        requested: usize,
        max: usize,
    },
}

impl From<StateError> for GsEmuError {
    fn from(err: StateError) -> Self {
        match err {
            StateError::TooManySlots { .. } => GsEmuError::Config(err.to_string()),
            StateError::InvalidValue { .. } => GsEmuError::InvalidData(err.to_string()),
            _ => GsEmuError::NotFound(err.to_string()),
        }
    }
}

/// Result type for state operations
pub type Result<T> = std::result::Result<T, StateError>;
