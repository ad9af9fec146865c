//! # Reply Decoder
//!
//! Client-side inverse of the [`encoder`](crate::encoder): parses reply frames
//! and reassembles a burst into a [`QueryReply`].
//!
//! Empty value tokens look the same as column terminators on the wire, so
//! decoding player and team columns needs the slot counts of the table that
//! was encoded ([`Layout`]). A real client learns them from the
//! `maxplayers` header.

use crate::encoder::Phase;
use crate::error::DecodeError;
use crate::frame::{FRAME_HEADER_LEN, LAST_FRAME_FLAG, REPLY_TYPE, SPLIT_MARKER};
use bytes::{Buf, Bytes};
use gsemu_core::Timestamp;
use gsemu_game::GameState;

/// Slot counts of the encoded tables
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub player_slots: usize,
    pub team_slots: usize,
}

impl Layout {
    pub fn new(player_slots: usize, team_slots: usize) -> Self {
        Self {
            player_slots,
            team_slots,
        }
    }

    /// Layout of an existing state
    pub fn of(state: &GameState) -> Self {
        Self::new(state.players.len(), state.teams.len())
    }

    fn slots(&self, phase: Phase) -> usize {
        match phase {
            Phase::Players => self.player_slots,
            Phase::Teams => self.team_slots,
            Phase::Headers => 0,
        }
    }
}

/// One received reply datagram
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyFrame {
    pub timestamp: Timestamp,
    pub index: usize,
    pub last: bool,
    pub payload: Bytes,
}

impl ReplyFrame {
    /// Split a datagram into header fields and payload
    pub fn parse(data: &[u8]) -> Result<Self, DecodeError> {
        if data.len() < FRAME_HEADER_LEN {
            return Err(DecodeError::ShortFrame { len: data.len() });
        }
        if data[0] != REPLY_TYPE {
            return Err(DecodeError::BadHeader);
        }

        let timestamp = Timestamp::from_slice(&data[1..]).ok_or(DecodeError::BadHeader)?;
        let marker_start = 1 + Timestamp::LEN;
        if &data[marker_start..marker_start + SPLIT_MARKER.len()] != SPLIT_MARKER {
            return Err(DecodeError::BadHeader);
        }

        let seq = data[FRAME_HEADER_LEN - 1];
        Ok(Self {
            timestamp,
            index: usize::from(seq & !LAST_FRAME_FLAG),
            last: seq & LAST_FRAME_FLAG != 0,
            payload: Bytes::copy_from_slice(&data[FRAME_HEADER_LEN..]),
        })
    }
}

/// A column: field name and one value per slot
pub type Column = (String, Vec<String>);

/// Decoded reply transcript
///
/// Headers keep wire order; each column has one entry per slot, empty strings
/// for free slots. Phases that were not sent stay empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryReply {
    pub headers: Vec<(String, String)>,
    pub players: Vec<Column>,
    pub teams: Vec<Column>,
}

impl QueryReply {
    /// Look up a header value
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Look up a player column
    pub fn player_column(&self, name: &str) -> Option<&[String]> {
        find_column(&self.players, name)
    }

    /// Look up a team column
    pub fn team_column(&self, name: &str) -> Option<&[String]> {
        find_column(&self.teams, name)
    }

    /// Reassemble a complete burst
    ///
    /// Frames may be given in any order; they are decoded by sequence index.
    ///
    /// # Errors
    /// - `MissingFrame` / `DuplicateFrame` if the indices are not exactly
    ///   `0..count`, or the highest frame lacks the terminal flag
    /// - `MisplacedTerminal` if any other frame carries the flag
    /// - `TimestampMismatch` if the frames echo different timestamps
    /// - parse errors for malformed payloads
    pub fn assemble(mut frames: Vec<ReplyFrame>, layout: Layout) -> Result<Self, DecodeError> {
        frames.sort_by_key(|frame| frame.index);

        let count = frames.len();
        for (expected, frame) in frames.iter().enumerate() {
            if frame.index < expected {
                return Err(DecodeError::DuplicateFrame(frame.index));
            }
            if frame.index > expected {
                return Err(DecodeError::MissingFrame(expected));
            }
            if frame.last && expected + 1 != count {
                return Err(DecodeError::MisplacedTerminal {
                    index: expected,
                    count,
                });
            }
        }
        match frames.last() {
            Some(frame) if frame.last => {}
            _ => return Err(DecodeError::MissingFrame(count)),
        }
        if frames
            .windows(2)
            .any(|pair| pair[0].timestamp != pair[1].timestamp)
        {
            return Err(DecodeError::TimestampMismatch);
        }

        let mut assembler = Assembler::new(layout);
        for frame in frames {
            assembler.feed(frame.payload)?;
        }
        assembler.finish()
    }
}

fn find_column<'a>(columns: &'a [Column], name: &str) -> Option<&'a [String]> {
    columns
        .iter()
        .find(|(key, _)| key == name)
        .map(|(_, values)| values.as_slice())
}

/// Column whose terminator has not been seen yet
#[derive(Debug, Clone, Copy)]
struct OpenColumn {
    phase: Phase,
    next: usize,
}

struct Assembler {
    reply: QueryReply,
    layout: Layout,
    open: Option<OpenColumn>,
}

impl Assembler {
    fn new(layout: Layout) -> Self {
        Self {
            reply: QueryReply::default(),
            layout,
            open: None,
        }
    }

    fn feed(&mut self, mut payload: Bytes) -> Result<(), DecodeError> {
        while payload.has_remaining() {
            let tag = payload.get_u8();
            let phase = Phase::from_tag(tag).ok_or(DecodeError::UnknownPhase(tag))?;
            match phase {
                Phase::Headers => self.read_headers(&mut payload)?,
                Phase::Players | Phase::Teams => self.read_columns(&mut payload, phase)?,
            }
        }
        Ok(())
    }

    fn finish(self) -> Result<QueryReply, DecodeError> {
        self.check_closed()?;
        Ok(self.reply)
    }

    /// Header pairs up to the sentinel or the end of the frame
    fn read_headers(&mut self, payload: &mut Bytes) -> Result<(), DecodeError> {
        self.check_closed()?;
        while payload.has_remaining() {
            let name = read_token(payload)?;
            if name.is_empty() {
                break;
            }
            let value = read_token(payload)?;
            self.reply.headers.push((name, value));
        }
        Ok(())
    }

    /// Column fields up to the section sentinel or the end of the frame
    fn read_columns(&mut self, payload: &mut Bytes, phase: Phase) -> Result<(), DecodeError> {
        let slots = self.layout.slots(phase);

        while payload.has_remaining() {
            let name = read_token(payload)?;
            if name.is_empty() {
                self.check_closed()?;
                return Ok(());
            }
            if !payload.has_remaining() {
                return Err(DecodeError::Truncated);
            }
            let start = usize::from(payload.get_u8());

            let open = self.open;
            let expected = match open {
                Some(open) if open.phase == phase && self.last_name(phase) == Some(&name) => {
                    open.next
                }
                Some(_) => return Err(self.unterminated()),
                None => {
                    self.columns_mut(phase).push((name.clone(), Vec::new()));
                    0
                }
            };
            if start != expected {
                return Err(DecodeError::CursorMismatch {
                    field: name,
                    expected,
                    got: start,
                });
            }

            let mut slot = start;
            self.open = Some(OpenColumn { phase, next: slot });
            loop {
                if !payload.has_remaining() {
                    // Column continues in the next frame
                    return Ok(());
                }
                let token = read_token(payload)?;
                if slot == slots {
                    if !token.is_empty() {
                        return Err(DecodeError::TooManyValues { field: name, slots });
                    }
                    self.open = None;
                    break;
                }
                if let Some((_, values)) = self.columns_mut(phase).last_mut() {
                    values.push(token);
                }
                slot += 1;
                self.open = Some(OpenColumn { phase, next: slot });
            }
        }
        Ok(())
    }

    /// Fail if a column is still waiting for its terminator
    fn check_closed(&self) -> Result<(), DecodeError> {
        match self.open {
            Some(_) => Err(self.unterminated()),
            None => Ok(()),
        }
    }

    fn unterminated(&self) -> DecodeError {
        let name = self
            .open
            .and_then(|open| self.last_name(open.phase))
            .cloned()
            .unwrap_or_default();
        DecodeError::UnterminatedField(name)
    }

    fn last_name(&self, phase: Phase) -> Option<&String> {
        self.columns(phase).last().map(|(name, _)| name)
    }

    fn columns(&self, phase: Phase) -> &[Column] {
        match phase {
            Phase::Teams => &self.reply.teams,
            _ => &self.reply.players,
        }
    }

    fn columns_mut(&mut self, phase: Phase) -> &mut Vec<Column> {
        match phase {
            Phase::Teams => &mut self.reply.teams,
            _ => &mut self.reply.players,
        }
    }
}

/// Read one nul-terminated token
fn read_token(payload: &mut Bytes) -> Result<String, DecodeError> {
    let end = payload
        .iter()
        .position(|byte| *byte == 0)
        .ok_or(DecodeError::Truncated)?;
    let token = payload.split_to(end);
    payload.advance(1);
    Ok(String::from_utf8_lossy(&token).into_owned())
}
