//! # Admin Commands
//!
//! # Syntax
//! ```text
//! server_u <field> <value>
//! player_u <index> <field> <value>
//! team_u   <index> <field> <value>
//! player_d <index>
//! team_d   <index>
//! ```
//!
//! # Tokenizing
//! A line containing NUL bytes is split on NUL (`player_u\0<id>\0<key>\0<value>`,
//! the format game-side scripts emit); each token is trimmed and empty tokens
//! before the keyword are skipped. Any other line is split on whitespace,
//! and the value takes the rest of the line so it may contain spaces.
//!
//! # Failure Modes
//! Parse failures ([`CommandError`]) leave the state untouched. A well-formed
//! command naming an unknown field or a slot past the end of its table is a
//! no-op: [`Command::execute`] returns the [`StateError`] and changes nothing.

use gsemu_core::GsEmuError;
use gsemu_game::{GameState, StateError, Target};
use std::fmt;

const SERVER_UPDATE: &str = "server_u";
const PLAYER_UPDATE: &str = "player_u";
const TEAM_UPDATE: &str = "team_u";
const PLAYER_CLEAR: &str = "player_d";
const TEAM_CLEAR: &str = "team_d";

/// Command line rejected before touching the state
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    #[error("{command} expects {expected} tokens, got {got}")]
    WrongArity {
        command: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("{command}: invalid slot index {token:?}")]
    BadIndex { command: &'static str, token: String },
}

impl From<CommandError> for GsEmuError {
    fn from(err: CommandError) -> Self {
        GsEmuError::Command(err.to_string())
    }
}

/// One parsed admin command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Update {
        target: Target,
        field: String,
        value: String,
    },
    Clear {
        target: Target,
    },
}

impl Command {
    /// Parse one input line
    ///
    /// # Returns
    /// `Ok(None)` for a blank line
    ///
    /// # Errors
    /// - `UnknownCommand` for an unrecognized keyword
    /// - `WrongArity` if the token count does not match the keyword
    /// - `BadIndex` if a slot index is not a non-negative integer
    pub fn parse(line: &str) -> Result<Option<Self>, CommandError> {
        let line = line.trim_end_matches(['\r', '\n']);
        let Some(keyword) = keyword(line) else {
            return Ok(None);
        };

        let (command, arity) = match keyword {
            SERVER_UPDATE => (SERVER_UPDATE, 3),
            PLAYER_UPDATE => (PLAYER_UPDATE, 4),
            TEAM_UPDATE => (TEAM_UPDATE, 4),
            PLAYER_CLEAR => (PLAYER_CLEAR, 2),
            TEAM_CLEAR => (TEAM_CLEAR, 2),
            other => return Err(CommandError::UnknownCommand(other.to_string())),
        };

        let tokens = tokenize(line, arity);
        if tokens.len() != arity {
            return Err(CommandError::WrongArity {
                command,
                expected: arity,
                got: tokens.len(),
            });
        }

        let parsed = match command {
            SERVER_UPDATE => Self::Update {
                target: Target::Server,
                field: tokens[1].to_string(),
                value: tokens[2].to_string(),
            },
            PLAYER_UPDATE => Self::Update {
                target: Target::Player(parse_index(command, tokens[1])?),
                field: tokens[2].to_string(),
                value: tokens[3].to_string(),
            },
            TEAM_UPDATE => Self::Update {
                target: Target::Team(parse_index(command, tokens[1])?),
                field: tokens[2].to_string(),
                value: tokens[3].to_string(),
            },
            PLAYER_CLEAR => Self::Clear {
                target: Target::Player(parse_index(command, tokens[1])?),
            },
            _ => Self::Clear {
                target: Target::Team(parse_index(command, tokens[1])?),
            },
        };
        Ok(Some(parsed))
    }

    /// Apply the command to the state
    ///
    /// # Errors
    /// `UnknownField` / `SlotOutOfRange` when the command addresses nothing;
    /// the state is unchanged in that case.
    pub fn execute(&self, state: &mut GameState) -> Result<(), StateError> {
        match self {
            Self::Update {
                target,
                field,
                value,
            } => state.set(*target, field, value.as_str()),
            Self::Clear { target } => state.clear(*target),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Update {
                target,
                field,
                value,
            } => write!(f, "set {}.{} = {:?}", target, field, value),
            Self::Clear { target } => write!(f, "clear {}", target),
        }
    }
}

/// NUL-separated tokens with padding trimmed, leading empties skipped
fn nul_tokens(line: &str) -> impl Iterator<Item = &str> {
    line.split('\0')
        .map(str::trim)
        .skip_while(|token| token.is_empty())
}

/// First token of the line, if any
fn keyword(line: &str) -> Option<&str> {
    if line.contains('\0') {
        nul_tokens(line).next()
    } else {
        line.split_whitespace().next()
    }
}

/// Split a line into at most `arity` tokens
fn tokenize(line: &str, arity: usize) -> Vec<&str> {
    if line.contains('\0') {
        let mut tokens: Vec<&str> = nul_tokens(line).collect();
        // A trailing NUL terminates the last token rather than starting a new one
        if tokens.len() > arity && tokens.last() == Some(&"") {
            tokens.pop();
        }
        return tokens;
    }

    let mut tokens = Vec::with_capacity(arity);
    let mut rest = line.trim();
    while !rest.is_empty() {
        if tokens.len() + 1 == arity {
            tokens.push(rest);
            break;
        }
        let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        tokens.push(&rest[..end]);
        rest = rest[end..].trim_start();
    }
    tokens
}

fn parse_index(command: &'static str, token: &str) -> Result<usize, CommandError> {
    token.trim().parse().map_err(|_| CommandError::BadIndex {
        command,
        token: token.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use gsemu_game::PlayerField;

    fn update(target: Target, field: &str, value: &str) -> Command {
        Command::Update {
            target,
            field: field.into(),
            value: value.into(),
        }
    }

    #[test]
    fn test_parse_player_update() {
        assert_eq!(
            Command::parse("player_u 3 score_ 120").unwrap(),
            Some(update(Target::Player(3), "score_", "120"))
        );
    }

    #[test]
    fn test_value_takes_rest_of_line() {
        assert_eq!(
            Command::parse("player_u 0 player_   [PR] Some Name  \r\n").unwrap(),
            Some(update(Target::Player(0), "player_", "[PR] Some Name"))
        );
        assert_eq!(
            Command::parse("server_u hostname My Server").unwrap(),
            Some(update(Target::Server, "hostname", "My Server"))
        );
    }

    #[test]
    fn test_parse_nul_separated() {
        assert_eq!(
            Command::parse("player_u\x0012\x00ping_\x0045\n").unwrap(),
            Some(update(Target::Player(12), "ping_", "45"))
        );
        // Empty value and trailing terminator
        assert_eq!(
            Command::parse("team_u\x001\x00team_t\x00\x00").unwrap(),
            Some(update(Target::Team(1), "team_t", ""))
        );
        // Value with spaces survives NUL splitting
        assert_eq!(
            Command::parse("server_u\x00hostname\x00a b c").unwrap(),
            Some(update(Target::Server, "hostname", "a b c"))
        );
    }

    #[test]
    fn test_nul_tokens_are_trimmed() {
        assert_eq!(
            Command::parse("player_u \0 3 \0 score_ \0 5").unwrap(),
            Some(update(Target::Player(3), "score_", "5"))
        );
        assert_eq!(
            Command::parse("\0player_u\x003\x00score_\x005").unwrap(),
            Some(update(Target::Player(3), "score_", "5"))
        );

        let mut state = GameState::default();
        Command::parse(" \0player_u \0 3\0 score_\0 5 ")
            .unwrap()
            .unwrap()
            .execute(&mut state)
            .unwrap();
        assert_eq!(state.players.value(3, PlayerField::Score), "5");
    }

    #[test]
    fn test_parse_clear() {
        assert_eq!(
            Command::parse("player_d 7").unwrap(),
            Some(Command::Clear {
                target: Target::Player(7)
            })
        );
        assert_eq!(
            Command::parse("team_d\x000").unwrap(),
            Some(Command::Clear {
                target: Target::Team(0)
            })
        );
    }

    #[test]
    fn test_blank_lines() {
        assert_eq!(Command::parse("").unwrap(), None);
        assert_eq!(Command::parse("   \r\n").unwrap(), None);
        assert_eq!(Command::parse("\0\0").unwrap(), None);
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(
            Command::parse("kick 3"),
            Err(CommandError::UnknownCommand("kick".into()))
        );
        assert_eq!(
            Command::parse("player_u 3 score_"),
            Err(CommandError::WrongArity {
                command: "player_u",
                expected: 4,
                got: 3
            })
        );
        assert_eq!(
            Command::parse("player_u\x003\x00score_\x001\x00extra"),
            Err(CommandError::WrongArity {
                command: "player_u",
                expected: 4,
                got: 5
            })
        );
        assert_eq!(
            Command::parse("player_u -1 score_ 5"),
            Err(CommandError::BadIndex {
                command: "player_u",
                token: "-1".into()
            })
        );
        assert!(matches!(
            Command::parse("team_d two"),
            Err(CommandError::BadIndex { .. })
        ));
    }

    #[test]
    fn test_execute_update() {
        let mut state = GameState::default();
        Command::parse("player_u 5 player_ Delta")
            .unwrap()
            .unwrap()
            .execute(&mut state)
            .unwrap();
        assert_eq!(state.players.value(5, PlayerField::Name), "Delta");
    }

    #[test]
    fn test_execute_out_of_range_is_noop() {
        let mut state = GameState::default();
        let before = state.clone();

        let command = Command::parse("player_u 64 score_ 1").unwrap().unwrap();
        assert!(matches!(
            command.execute(&mut state),
            Err(StateError::SlotOutOfRange { .. })
        ));

        let command = Command::parse("player_u 1 kills_ 1").unwrap().unwrap();
        assert!(matches!(
            command.execute(&mut state),
            Err(StateError::UnknownField { .. })
        ));
        assert_eq!(state, before);
    }

    #[test]
    fn test_execute_clear() {
        let mut state = GameState::default();
        state.set(Target::Player(2), "player_", "Echo").unwrap();
        Command::Clear {
            target: Target::Player(2),
        }
        .execute(&mut state)
        .unwrap();
        assert_eq!(state.players.occupied(), 0);
    }

    #[test]
    fn test_display() {
        let command = update(Target::Team(1), "score_t", "12");
        assert_eq!(command.to_string(), "set team[1].score_t = \"12\"");
    }
}
