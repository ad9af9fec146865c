//! # Admin Console
//!
//! Reads command lines from any async byte stream (stdin in the binary) and
//! applies them to the [`SharedState`].
//!
//! Every command runs inside one exclusive lock section, so a query encoded
//! concurrently sees the state either before or after the command, never in
//! between. The console stops at end of input or on cancellation; neither
//! affects the query server.

use crate::command::Command;
use bytes::BytesMut;
use futures::StreamExt;
use gsemu_core::{GsEmuError, Result};
use gsemu_game::SharedState;
use std::io;
use tokio::io::AsyncRead;
use tokio_util::codec::{Decoder, FramedRead};
use tokio_util::sync::CancellationToken;

/// Newline-delimited command lines
///
/// Unlike a plain UTF-8 line codec this never fails on bad input: invalid
/// sequences are replaced, and NUL bytes pass through for the tokenizer.
/// A trailing `\r` is stripped.
#[derive(Debug, Clone, Default)]
pub struct CommandLineCodec {
    /// Bytes already searched for a newline
    next_index: usize,
}

impl CommandLineCodec {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Decoder for CommandLineCodec {
    type Item = String;
    type Error = io::Error;

    fn decode(&mut self, buf: &mut BytesMut) -> io::Result<Option<String>> {
        let Some(offset) = buf[self.next_index..].iter().position(|b| *b == b'\n') else {
            self.next_index = buf.len();
            return Ok(None);
        };

        let end = self.next_index + offset;
        self.next_index = 0;
        let line = buf.split_to(end + 1);
        Ok(Some(to_line(&line[..end])))
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> io::Result<Option<String>> {
        if let Some(line) = self.decode(buf)? {
            return Ok(Some(line));
        }
        self.next_index = 0;
        if buf.is_empty() {
            return Ok(None);
        }
        let line = buf.split();
        Ok(Some(to_line(&line)))
    }
}

fn to_line(bytes: &[u8]) -> String {
    let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
    String::from_utf8_lossy(bytes).into_owned()
}

/// Line counts of one console session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConsoleStats {
    /// Commands that changed the state
    pub applied: usize,
    /// Lines that failed to parse
    pub rejected: usize,
    /// Well-formed commands that addressed nothing
    pub ignored: usize,
}

/// Applies admin command lines to shared state
#[derive(Debug, Clone)]
pub struct AdminConsole {
    state: SharedState,
}

impl AdminConsole {
    pub fn new(state: SharedState) -> Self {
        Self { state }
    }

    /// Parse and apply one line
    ///
    /// # Returns
    /// The command that was applied, or `None` for a blank line
    ///
    /// # Errors
    /// - `Command` if the line does not parse
    /// - `NotFound` if the command names an unknown field or slot
    /// - `InvalidData` if the value cannot go on the wire
    ///
    /// The state is unchanged on error.
    pub fn apply(&self, line: &str) -> Result<Option<Command>> {
        let Some(command) = Command::parse(line)? else {
            return Ok(None);
        };
        self.state.write(|state| command.execute(state))?;
        Ok(Some(command))
    }

    /// Read and apply lines until end of input or cancellation
    ///
    /// Bad lines are logged and skipped; only a read error ends the loop
    /// early.
    pub async fn run<R>(&self, reader: R, cancel: CancellationToken) -> Result<ConsoleStats>
    where
        R: AsyncRead + Unpin,
    {
        let mut lines = FramedRead::new(reader, CommandLineCodec::new());
        let mut stats = ConsoleStats::default();
        tracing::info!("Admin console started");

        loop {
            let line = tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Admin console cancelled");
                    break;
                }
                line = lines.next() => line,
            };

            let line = match line {
                Some(Ok(line)) => line,
                Some(Err(e)) => {
                    tracing::error!("Admin input error: {}", e);
                    return Err(e.into());
                }
                None => {
                    tracing::info!("Admin input closed");
                    break;
                }
            };
            tracing::trace!("Admin line: {:?}", line);

            match self.apply(&line) {
                Ok(None) => {}
                Ok(Some(command)) => {
                    stats.applied += 1;
                    tracing::info!("Admin: {}", command);
                }
                Err(e @ GsEmuError::Command(_)) => {
                    stats.rejected += 1;
                    tracing::warn!("Admin: rejected line: {}", e);
                }
                Err(e) => {
                    stats.ignored += 1;
                    tracing::warn!("Admin: ignored: {}", e);
                }
            }
        }

        tracing::info!(
            "Admin console stopped ({} applied, {} ignored, {} rejected)",
            stats.applied,
            stats.ignored,
            stats.rejected
        );
        Ok(stats)
    }
}
