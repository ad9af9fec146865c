//! # Reply Frames
//!
//! A [`Frame`] is one reply datagram under construction: a fixed header region
//! followed by a payload of at most `capacity` bytes.
//!
//! # Frame Format
//! ```text
//! {0x00}{TIMESTAMP 4 bytes}{"splitnum\0"}{SEQ}{PAYLOAD ...}
//! ```
//! - `SEQ` is the sequence index, with `0x80` set on the last frame of a burst
//! - The payload holds phase tags and nul-terminated tokens (see [`crate::encoder`])
//!
//! # Partial Writes
//!
//! [`Frame::put`] writes as many bytes as fit and reports the count, exactly
//! like a raw bounded buffer. Nothing is rolled back on a short write: callers
//! compare the returned count with what they asked for and use
//! [`Frame::mark`] / [`Frame::truncate`] to drop the partial tail.

use crate::error::EncodeError;
use bytes::{BufMut, Bytes, BytesMut};
use gsemu_core::Timestamp;

/// Reply type byte that opens every frame
pub const REPLY_TYPE: u8 = 0x00;

/// Literal that follows the timestamp in split replies
pub const SPLIT_MARKER: &[u8] = b"splitnum\0";

/// Bytes before the payload: type, timestamp, marker, sequence byte
pub const FRAME_HEADER_LEN: usize = 1 + Timestamp::LEN + SPLIT_MARKER.len() + 1;

/// Sequence byte flag for the last frame of a burst
pub const LAST_FRAME_FLAG: u8 = 0x80;

/// Frames per burst; the sequence index has 7 bits
pub const MAX_FRAMES: usize = LAST_FRAME_FLAG as usize;

/// Datagram size used when nothing else is configured
pub const DEFAULT_DATAGRAM_SIZE: usize = 1400;

/// Payload capacity for the default datagram size
pub const DEFAULT_FRAME_CAPACITY: usize = DEFAULT_DATAGRAM_SIZE - FRAME_HEADER_LEN;

/// Offset of the sequence byte in a finished frame
const SEQUENCE_OFFSET: usize = FRAME_HEADER_LEN - 1;

/// One reply datagram under construction
#[derive(Debug, Clone)]
pub struct Frame {
    buf: BytesMut,
    capacity: usize,
}

impl Frame {
    /// Start a frame echoing `timestamp` with room for `capacity` payload bytes
    pub fn new(timestamp: Timestamp, capacity: usize) -> Self {
        let mut buf = BytesMut::with_capacity(FRAME_HEADER_LEN + capacity);
        buf.put_u8(REPLY_TYPE);
        buf.put_slice(timestamp.as_bytes());
        buf.put_slice(SPLIT_MARKER);
        // Sequence byte is stamped in finish()
        buf.put_u8(0);

        Self { buf, capacity }
    }

    /// Payload capacity in bytes
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Payload bytes written so far
    #[inline]
    pub fn len(&self) -> usize {
        self.buf.len() - FRAME_HEADER_LEN
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Payload bytes still free
    #[inline]
    pub fn remaining(&self) -> usize {
        self.capacity - self.len()
    }

    /// Append as much of `data` as fits
    ///
    /// # Returns
    /// The number of bytes written: `data.len()` on success, less (possibly
    /// zero) when the frame ran out of room. A short write leaves the bytes
    /// that did fit in place.
    pub fn put(&mut self, data: &[u8]) -> usize {
        let n = data.len().min(self.remaining());
        self.buf.put_slice(&data[..n]);
        n
    }

    /// Append one raw byte; returns 1 or 0
    #[inline]
    pub fn put_u8(&mut self, byte: u8) -> usize {
        self.put(&[byte])
    }

    /// Append a nul-terminated token
    ///
    /// # Returns
    /// Bytes written; `token.len() + 1` when the whole token fit
    pub fn put_token(&mut self, token: &[u8]) -> usize {
        let written = self.put(token);
        if written < token.len() {
            return written;
        }
        written + self.put_u8(0)
    }

    /// Current payload position, for a later [`truncate`](Self::truncate)
    #[inline]
    pub fn mark(&self) -> usize {
        self.len()
    }

    /// Drop payload bytes written after `mark`
    #[inline]
    pub fn truncate(&mut self, mark: usize) {
        self.buf.truncate(FRAME_HEADER_LEN + mark);
    }

    /// Payload written so far
    pub fn payload(&self) -> &[u8] {
        &self.buf[FRAME_HEADER_LEN..]
    }

    /// Stamp the sequence byte and freeze the frame into a datagram
    ///
    /// # Errors
    /// `TooManyFrames` if `index` does not fit in 7 bits
    pub fn finish(mut self, index: usize, last: bool) -> Result<Bytes, EncodeError> {
        let seq = u8::try_from(index)
            .ok()
            .filter(|seq| *seq < LAST_FRAME_FLAG)
            .ok_or(EncodeError::TooManyFrames { max: MAX_FRAMES })?;

        self.buf[SEQUENCE_OFFSET] = if last { seq | LAST_FRAME_FLAG } else { seq };
        Ok(self.buf.freeze())
    }
}
