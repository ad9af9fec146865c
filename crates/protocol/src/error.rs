//! Error types for the query protocol

use crate::encoder::Phase;
use gsemu_core::GsEmuError;

/// Encoder failures
///
/// Every variant is a defect or an unencodable state, never bad input from a
/// client. The request being served is abandoned; shared state is untouched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EncodeError {
    /// A single unit does not fit even in a fresh frame
    #[error("{phase:?} unit at field {field} slot {slot} exceeds frame capacity {capacity}")]
    TokenTooLarge {
        phase: Phase,
        field: usize,
        slot: usize,
        capacity: usize,
    },

    /// A value holds a NUL byte and would split into two tokens
    #[error("Token {token:?} contains a NUL byte")]
    EmbeddedNul { token: String },

    /// The frame reported more bytes than were requested
    #[error("Write count mismatch: expected {expected} bytes, frame reports {actual}")]
    WriteMismatch { expected: usize, actual: usize },

    /// Sequence index does not fit the 7-bit split counter
    #[error("Reply needs more than {max} frames")]
    TooManyFrames { max: usize },

    /// Slot cursor does not fit its one-byte wire field
    #[error("Slot cursor {slot} does not fit in one byte")]
    CursorOverflow { slot: usize },
}

impl From<EncodeError> for GsEmuError {
    fn from(err: EncodeError) -> Self {
        GsEmuError::Encoder(err.to_string())
    }
}

/// Inbound query rejected before encoding
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RequestError {
    #[error("Request too short: {len} bytes (minimum {min})")]
    TooShort { len: usize, min: usize },
}

impl From<RequestError> for GsEmuError {
    fn from(err: RequestError) -> Self {
        GsEmuError::Protocol(err.to_string())
    }
}

/// Reply frame or burst that cannot be decoded
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("Frame too short: {len} bytes")]
    ShortFrame { len: usize },

    #[error("Bad frame header")]
    BadHeader,

    #[error("Unknown phase tag {0:#04x}")]
    UnknownPhase(u8),

    #[error("Unterminated token at end of frame")]
    Truncated,

    #[error("Missing frame {0} in burst")]
    MissingFrame(usize),

    #[error("Duplicate frame {0} in burst")]
    DuplicateFrame(usize),

    #[error("Terminal flag on frame {index} of {count}")]
    MisplacedTerminal { index: usize, count: usize },

    #[error("Frames carry different timestamps")]
    TimestampMismatch,

    #[error("Field {field} resumes at slot {got}, expected {expected}")]
    CursorMismatch {
        field: String,
        expected: usize,
        got: usize,
    },

    #[error("Field {0} ends without a terminator")]
    UnterminatedField(String),

    #[error("Field {field} has more values than {slots} slots")]
    TooManyValues { field: String, slots: usize },
}

impl From<DecodeError> for GsEmuError {
    fn from(err: DecodeError) -> Self {
        GsEmuError::InvalidData(err.to_string())
    }
}
