//! # GSEmu Admin Console
//!
//! Line-oriented commands that edit the shared game state while the query
//! server is running.
//!
//! - `command` - Tokenizing, parsing and applying one command line
//! - `console` - The async loop reading command lines from a stream

pub mod command;
pub mod console;

pub use command::{Command, CommandError};
pub use console::{AdminConsole, CommandLineCodec, ConsoleStats};
