//! GSEmu Configuration Management
//!
//! Loads the optional `serveroptions.txt`-style settings file: `key = value`
//! lines, `#` comments and blank lines ignored.
//!
//! # Keys
//! - `workers` - number of query worker tasks
//! - `datagramsize` - reply datagram size in bytes, header included
//! - `recvbuffer` - socket receive buffer size in bytes
//! - `maxplayers` - player slot count; also reported as the `maxplayers` header
//! - `maxteams` - team slot count
//! - any server header name (`hostname`, `mapname`, `bf2_fps`, ...) overrides
//!   that header's startup value

use gsemu_core::{GsEmuError, Result};
use gsemu_game::{
    FieldSchema, GameState, ServerField, Target, DEFAULT_PLAYER_SLOTS, DEFAULT_TEAM_SLOTS,
    MAX_SLOTS,
};
use std::fs;
use std::path::Path;
use std::str::FromStr;

/// Default number of query workers
pub const DEFAULT_WORKERS: usize = 5;

/// Default reply datagram size
pub const DEFAULT_DATAGRAM_SIZE: usize = 1400;

/// Default socket receive buffer
pub const DEFAULT_RECV_BUFFER: usize = 256 * 1024;

/// Startup settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Query worker tasks (from "workers")
    pub workers: usize,
    /// Reply datagram size in bytes (from "datagramsize")
    pub datagram_size: usize,
    /// Socket receive buffer in bytes (from "recvbuffer")
    pub recv_buffer: usize,
    /// Player slots (from "maxplayers")
    pub max_players: usize,
    /// Team slots (from "maxteams")
    pub max_teams: usize,
    /// Header values to apply on top of the defaults, in file order
    pub headers: Vec<(ServerField, String)>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            datagram_size: DEFAULT_DATAGRAM_SIZE,
            recv_buffer: DEFAULT_RECV_BUFFER,
            max_players: DEFAULT_PLAYER_SLOTS,
            max_teams: DEFAULT_TEAM_SLOTS,
            headers: Vec::new(),
        }
    }
}

impl ServerConfig {
    /// Load settings from a file
    ///
    /// # Errors
    /// `Io` if the file cannot be read, `Config` if the result is invalid
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        tracing::debug!("Loaded config file {}", path.display());
        let config = Self::parse(&content);
        config.validate()?;
        Ok(config)
    }

    /// Parse settings text on top of the defaults
    ///
    /// Unparsable numbers keep their default and log a warning; unknown keys
    /// are skipped.
    pub fn parse(content: &str) -> Self {
        let mut config = Self::default();

        for line in content.lines() {
            let line = line.trim();

            // Skip comments and empty lines
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some(eq_pos) = line.find('=') {
                let key = line[..eq_pos].trim();
                let value = line[eq_pos + 1..].trim();
                config.parse_option(key, value);
            }
        }

        config
    }

    fn parse_option(&mut self, key: &str, value: &str) {
        match key {
            "workers" => self.workers = parse_number(key, value, self.workers),
            "datagramsize" => self.datagram_size = parse_number(key, value, self.datagram_size),
            "recvbuffer" => self.recv_buffer = parse_number(key, value, self.recv_buffer),
            "maxplayers" => {
                self.max_players = parse_number(key, value, self.max_players);
                self.headers
                    .push((ServerField::MaxPlayers, self.max_players.to_string()));
            }
            "maxteams" => self.max_teams = parse_number(key, value, self.max_teams),
            _ => match ServerField::from_name(key) {
                Some(field) => self.headers.push((field, value.into())),
                None => tracing::debug!("Unknown config option: {} = {}", key, value),
            },
        }
    }

    /// Check the settings are usable
    ///
    /// # Errors
    /// `Config` naming the first bad setting
    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(GsEmuError::Config("workers must be at least 1".into()));
        }
        if self.max_players > MAX_SLOTS {
            return Err(GsEmuError::Config(format!(
                "maxplayers {} exceeds {}",
                self.max_players, MAX_SLOTS
            )));
        }
        if self.max_teams > MAX_SLOTS {
            return Err(GsEmuError::Config(format!(
                "maxteams {} exceeds {}",
                self.max_teams, MAX_SLOTS
            )));
        }
        Ok(())
    }

    /// Build the startup game state
    ///
    /// Default headers, then every configured header override in file order.
    /// When no `maxplayers` header was configured it reports the slot count.
    pub fn build_state(&self) -> Result<GameState> {
        let mut state = GameState::with_slots(self.max_players, self.max_teams)?;
        if !self
            .headers
            .iter()
            .any(|(field, _)| *field == ServerField::MaxPlayers)
        {
            state
                .server
                .set(ServerField::MaxPlayers, self.max_players.to_string());
        }
        for (field, value) in &self.headers {
            state.set(Target::Server, field.name(), value.as_str())?;
        }
        Ok(state)
    }

    /// Display configuration summary
    pub fn display(&self) {
        tracing::info!("Server configuration:");
        tracing::info!("  Workers: {}", self.workers);
        tracing::info!("  Datagram size: {} bytes", self.datagram_size);
        tracing::info!("  Receive buffer: {} bytes", self.recv_buffer);
        tracing::info!("  Player slots: {}", self.max_players);
        tracing::info!("  Team slots: {}", self.max_teams);
        for (field, value) in &self.headers {
            tracing::info!("  {} = {}", field, value);
        }
    }
}

fn parse_number<T>(key: &str, value: &str, default: T) -> T
where
    T: FromStr + Copy,
{
    value.parse().unwrap_or_else(|_| {
        tracing::warn!("Invalid value for {}: {:?}, keeping default", key, value);
        default
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.workers, 5);
        assert_eq!(config.datagram_size, 1400);
        assert_eq!(config.max_players, 64);
        assert_eq!(config.max_teams, 2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_simple_config() {
        let config_text = r#"
# Test server
workers = 8
datagramsize = 1200
maxplayers = 32

hostname = Test Server
mapname=kashan_desert
"#;
        let config = ServerConfig::parse(config_text);
        assert_eq!(config.workers, 8);
        assert_eq!(config.datagram_size, 1200);
        assert_eq!(config.max_players, 32);
        assert_eq!(
            config.headers,
            vec![
                (ServerField::MaxPlayers, "32".to_string()),
                (ServerField::HostName, "Test Server".to_string()),
                (ServerField::MapName, "kashan_desert".to_string()),
            ]
        );
    }

    #[test]
    fn test_bad_values_keep_defaults() {
        let config = ServerConfig::parse("workers = many\nrecvbuffer = -1\nnot a setting\nfoo = bar");
        assert_eq!(config.workers, DEFAULT_WORKERS);
        assert_eq!(config.recv_buffer, DEFAULT_RECV_BUFFER);
        assert!(config.headers.is_empty());
    }

    #[test]
    fn test_validate() {
        let config = ServerConfig {
            workers: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(GsEmuError::Config(_))));

        let config = ServerConfig::parse("maxplayers = 300");
        assert!(matches!(config.validate(), Err(GsEmuError::Config(_))));
    }

    #[test]
    fn test_build_state() {
        let config = ServerConfig::parse("maxteams = 3\nhostname = Custom\nbf2_fps = 60");
        let state = config.build_state().unwrap();

        assert_eq!(state.players.len(), 64);
        assert_eq!(state.teams.len(), 3);
        assert_eq!(state.teams.occupied(), 3);
        assert_eq!(state.server.get(ServerField::HostName), "Custom");
        assert_eq!(state.server.get(ServerField::Fps), "60");
        assert_eq!(state.server.get(ServerField::MaxPlayers), "64");
        assert_eq!(state.server.get(ServerField::GameName), "battlefield2");
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "workers = 2").unwrap();
        writeln!(file, "maxplayers = 16").unwrap();
        writeln!(file, "gamevariant = pr").unwrap();

        let config = ServerConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.workers, 2);

        let state = config.build_state().unwrap();
        assert_eq!(state.players.len(), 16);
        assert_eq!(state.server.get(ServerField::MaxPlayers), "16");
        assert_eq!(state.server.get(ServerField::GameVariant), "pr");
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = ServerConfig::load_from_file(dir.path().join("missing.txt")).unwrap_err();
        assert!(matches!(err, GsEmuError::Io(_)));
    }

    #[test]
    fn test_load_invalid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "workers = 0").unwrap();
        assert!(matches!(
            ServerConfig::load_from_file(file.path()),
            Err(GsEmuError::Config(_))
        ));
    }
}
