//! # Query Reply Encoder
//!
//! Serializes a [`GameState`] into a burst of reply frames.
//!
//! ## Phases
//!
//! The reply is written in up to three phases, always in this order:
//!
//! | Phase   | Tag    | Layout                                             |
//! |---------|--------|----------------------------------------------------|
//! | Headers | `0x00` | `{name\0}{value\0}` per field, then `{\0}`          |
//! | Players | `0x01` | per field: `{name\0}{START}{value\0}..{\0}`, then `{\0}` |
//! | Teams   | `0x02` | same column layout as players                      |
//!
//! Player and team sections are column-major: one field at a time, every slot
//! from `START` to the end of the table, empty tokens for free slots. `START`
//! is one raw byte.
//!
//! ## Splitting
//!
//! Each phase step writes into the current frame until it runs out of room and
//! hands back a [`Cursor`]. The encoder then opens a new frame and calls the
//! same phase again from that cursor. A resumed phase writes its tag first, and
//! a resumed column repeats the field name with the slot it restarts from.
//!
//! Output is written in units that never straddle two frames:
//! - a header name/value pair
//! - a column preamble (field name + start slot)
//! - one slot value
//! - a column terminator or section sentinel
//!
//! A preamble or phase tag left without any unit after it is removed again.

use crate::error::EncodeError;
use crate::frame::{Frame, DEFAULT_FRAME_CAPACITY, MAX_FRAMES};
use bytes::Bytes;
use gsemu_core::Timestamp;
use gsemu_game::{FieldSchema, GameState, ServerField, ServerInfo, SlotTable};

/// Encoding stage; discriminant is the wire tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Phase {
    Headers = 0x00,
    Players = 0x01,
    Teams = 0x02,
}

impl Phase {
    pub const ALL: [Phase; 3] = [Phase::Headers, Phase::Players, Phase::Teams];

    #[inline]
    pub fn tag(self) -> u8 {
        self as u8
    }

    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0x00 => Some(Self::Headers),
            0x01 => Some(Self::Players),
            0x02 => Some(Self::Teams),
            _ => None,
        }
    }
}

/// Which phases a reply contains
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseSelection {
    pub headers: bool,
    pub players: bool,
    pub teams: bool,
}

impl PhaseSelection {
    pub const ALL: Self = Self::new(true, true, true);
    pub const HEADERS_ONLY: Self = Self::new(true, false, false);

    pub const fn new(headers: bool, players: bool, teams: bool) -> Self {
        Self {
            headers,
            players,
            teams,
        }
    }

    pub fn contains(&self, phase: Phase) -> bool {
        match phase {
            Phase::Headers => self.headers,
            Phase::Players => self.players,
            Phase::Teams => self.teams,
        }
    }

    /// Selected phases in wire order
    pub fn phases(self) -> impl Iterator<Item = Phase> {
        Phase::ALL.into_iter().filter(move |phase| self.contains(*phase))
    }
}

impl Default for PhaseSelection {
    fn default() -> Self {
        Self::ALL
    }
}

/// Resume position inside a phase
///
/// Headers only use `field`; columns use both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Cursor {
    pub field: usize,
    pub slot: usize,
}

/// Outcome of one phase step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Phase finished, sentinel written
    Complete,
    /// Frame is full; continue from this cursor in a new frame
    Suspended(Cursor),
}

/// Encodes one reply for one request
///
/// # Example
///
/// ```rust
/// use gsemu_core::Timestamp;
/// use gsemu_game::GameState;
/// use gsemu_protocol::{Encoder, PhaseSelection};
///
/// let state = GameState::default();
/// let frames = Encoder::new(&state, Timestamp::new([1, 2, 3, 4]))
///     .encode(PhaseSelection::ALL)
///     .unwrap();
/// assert!(!frames.is_empty());
/// ```
pub struct Encoder<'a> {
    state: &'a GameState,
    timestamp: Timestamp,
    capacity: usize,
}

impl<'a> Encoder<'a> {
    pub fn new(state: &'a GameState, timestamp: Timestamp) -> Self {
        Self {
            state,
            timestamp,
            capacity: DEFAULT_FRAME_CAPACITY,
        }
    }

    /// Use `capacity` payload bytes per frame instead of the default
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Encode the selected phases into finished datagrams
    ///
    /// # Returns
    /// Frames in sequence order; indices run from 0 and only the last frame
    /// carries the terminal flag. Selecting no phase yields one empty frame.
    ///
    /// # Errors
    /// - `TokenTooLarge` if a unit cannot fit even an empty frame
    /// - `TooManyFrames` if the reply needs more than [`MAX_FRAMES`] frames
    /// - `EmbeddedNul` if a value contains a NUL byte
    /// - `WriteMismatch` / `CursorOverflow` on internal contract breaches
    pub fn encode(&self, selection: PhaseSelection) -> Result<Vec<Bytes>, EncodeError> {
        let mut frames = Vec::new();
        let mut frame = self.new_frame();

        for phase in selection.phases() {
            let mut cursor = Cursor::default();
            loop {
                match self.encode_phase(&mut frame, phase, cursor)? {
                    Step::Complete => break,
                    Step::Suspended(next) => {
                        if frame.is_empty() {
                            return Err(EncodeError::TokenTooLarge {
                                phase,
                                field: next.field,
                                slot: next.slot,
                                capacity: self.capacity,
                            });
                        }
                        if frames.len() + 1 >= MAX_FRAMES {
                            return Err(EncodeError::TooManyFrames { max: MAX_FRAMES });
                        }
                        tracing::trace!(
                            "Frame {} full at {:?} field {} slot {}",
                            frames.len(),
                            phase,
                            next.field,
                            next.slot
                        );
                        frames.push(std::mem::replace(&mut frame, self.new_frame()));
                        cursor = next;
                    }
                }
            }
        }
        frames.push(frame);

        let count = frames.len();
        tracing::debug!("Encoded reply {} into {} frame(s)", self.timestamp, count);

        frames
            .into_iter()
            .enumerate()
            .map(|(index, frame)| frame.finish(index, index + 1 == count))
            .collect()
    }

    /// Run one phase step into `frame`, starting from `cursor`
    pub fn encode_phase(
        &self,
        frame: &mut Frame,
        phase: Phase,
        cursor: Cursor,
    ) -> Result<Step, EncodeError> {
        let start = frame.mark();
        if frame.put_u8(phase.tag()) != 1 {
            return Ok(Step::Suspended(cursor));
        }

        let step = match phase {
            Phase::Headers => encode_headers(frame, &self.state.server, cursor)?,
            Phase::Players => encode_columns(frame, &self.state.players, cursor)?,
            Phase::Teams => encode_columns(frame, &self.state.teams, cursor)?,
        };

        // Nothing of the phase fit behind its tag
        if frame.mark() == start + 1 {
            frame.truncate(start);
        }
        Ok(step)
    }

    fn new_frame(&self) -> Frame {
        Frame::new(self.timestamp, self.capacity)
    }
}

/// Piece of a unit
#[derive(Debug, Clone, Copy)]
enum Part<'s> {
    /// Nul-terminated string
    Token(&'s [u8]),
    /// Raw byte
    Byte(u8),
}

impl Part<'_> {
    fn len(&self) -> usize {
        match self {
            Part::Token(token) => token.len() + 1,
            Part::Byte(_) => 1,
        }
    }
}

/// Write every part of a unit, or none of it
///
/// # Returns
/// `Ok(true)` if the unit was written, `Ok(false)` if the frame is full (the
/// partial unit has been removed).
///
/// # Errors
/// `EmbeddedNul` before anything is written if a token contains a NUL byte
fn write_unit(frame: &mut Frame, parts: &[Part<'_>]) -> Result<bool, EncodeError> {
    for part in parts {
        if let Part::Token(token) = part {
            if token.contains(&0) {
                return Err(EncodeError::EmbeddedNul {
                    token: String::from_utf8_lossy(token).into_owned(),
                });
            }
        }
    }

    let mark = frame.mark();
    for part in parts {
        let written = match part {
            Part::Token(token) => frame.put_token(token),
            Part::Byte(byte) => frame.put_u8(*byte),
        };
        let wanted = part.len();
        if written > wanted {
            return Err(EncodeError::WriteMismatch {
                expected: wanted,
                actual: written,
            });
        }
        if written < wanted {
            frame.truncate(mark);
            return Ok(false);
        }
    }

    let expected: usize = parts.iter().map(Part::len).sum();
    let actual = frame.mark() - mark;
    if actual != expected {
        return Err(EncodeError::WriteMismatch { expected, actual });
    }
    Ok(true)
}

fn encode_headers(
    frame: &mut Frame,
    server: &ServerInfo,
    mut cursor: Cursor,
) -> Result<Step, EncodeError> {
    while let Some(field) = ServerField::from_index(cursor.field) {
        let pair = [
            Part::Token(field.name().as_bytes()),
            Part::Token(server.get(field).as_bytes()),
        ];
        if !write_unit(frame, &pair)? {
            return Ok(Step::Suspended(cursor));
        }
        cursor.field += 1;
    }

    if !write_unit(frame, &[Part::Token(b"")])? {
        return Ok(Step::Suspended(cursor));
    }
    Ok(Step::Complete)
}

fn encode_columns<F: FieldSchema>(
    frame: &mut Frame,
    table: &SlotTable<F>,
    mut cursor: Cursor,
) -> Result<Step, EncodeError> {
    while let Some(field) = F::from_index(cursor.field) {
        let start = u8::try_from(cursor.slot)
            .map_err(|_| EncodeError::CursorOverflow { slot: cursor.slot })?;

        let preamble = frame.mark();
        let header = [Part::Token(field.name().as_bytes()), Part::Byte(start)];
        if !write_unit(frame, &header)? {
            return Ok(Step::Suspended(cursor));
        }
        let body = frame.mark();

        while cursor.slot < table.len() {
            let value = table.value(cursor.slot, field);
            if !write_unit(frame, &[Part::Token(value.as_bytes())])? {
                drop_bare_preamble(frame, preamble, body);
                return Ok(Step::Suspended(cursor));
            }
            cursor.slot += 1;
        }

        if !write_unit(frame, &[Part::Token(b"")])? {
            drop_bare_preamble(frame, preamble, body);
            return Ok(Step::Suspended(cursor));
        }

        cursor.field += 1;
        cursor.slot = 0;
    }

    if !write_unit(frame, &[Part::Token(b"")])? {
        return Ok(Step::Suspended(cursor));
    }
    Ok(Step::Complete)
}

/// Remove a column preamble that no value followed
fn drop_bare_preamble(frame: &mut Frame, preamble: usize, body: usize) {
    if frame.mark() == body {
        frame.truncate(preamble);
    }
}
