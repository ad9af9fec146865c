//! # Network Configuration
//!
//! Socket and worker settings for the query server.
//!
//! # Example
//!
//! ```rust
//! use gsemu_network::NetworkConfig;
//!
//! let config = NetworkConfig {
//!     bind_address: "127.0.0.1:29900".parse().unwrap(),
//!     workers: 2,
//!     ..Default::default()
//! };
//! assert!(config.validate().is_ok());
//! ```

use gsemu_config::ServerConfig;
use gsemu_protocol::{DEFAULT_DATAGRAM_SIZE, FRAME_HEADER_LEN};
use std::net::{Ipv4Addr, SocketAddr};

/// Default query port of a Battlefield 2 server
pub const DEFAULT_QUERY_PORT: u16 = 29900;

/// Largest UDP payload over IPv4
pub const MAX_DATAGRAM_SIZE: usize = 65_507;

/// Query server settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkConfig {
    /// Address and port to bind the UDP socket to
    ///
    /// # Default
    /// `0.0.0.0:29900`
    pub bind_address: SocketAddr,

    /// Number of worker tasks receiving on the shared socket
    ///
    /// # Default
    /// 5
    pub workers: usize,

    /// Size of each reply datagram, frame header included
    ///
    /// # Default
    /// 1400 bytes, which keeps replies below a typical MTU
    pub datagram_size: usize,

    /// Kernel receive buffer requested for the socket
    ///
    /// # Default
    /// 256 KiB
    ///
    /// # Notes
    /// The kernel may clamp this; a refused size is logged, not fatal.
    pub recv_buffer_size: usize,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from((Ipv4Addr::UNSPECIFIED, DEFAULT_QUERY_PORT)),
            workers: gsemu_config::DEFAULT_WORKERS,
            datagram_size: DEFAULT_DATAGRAM_SIZE,
            recv_buffer_size: gsemu_config::DEFAULT_RECV_BUFFER,
        }
    }
}

impl NetworkConfig {
    /// Network settings from the loaded server configuration
    pub fn from_config(bind_address: SocketAddr, config: &ServerConfig) -> Self {
        Self {
            bind_address,
            workers: config.workers,
            datagram_size: config.datagram_size,
            recv_buffer_size: config.recv_buffer,
        }
    }

    /// Payload bytes available in each reply frame
    pub fn frame_capacity(&self) -> usize {
        self.datagram_size.saturating_sub(FRAME_HEADER_LEN)
    }

    /// Validate the configuration
    ///
    /// # Returns
    /// `Ok(())` if configuration is valid, `Err(String)` otherwise
    ///
    /// # Checks
    /// - `workers` must be > 0
    /// - `datagram_size` must exceed the frame header and fit a UDP datagram
    pub fn validate(&self) -> Result<(), String> {
        if self.workers == 0 {
            return Err("workers must be > 0".to_string());
        }

        if self.datagram_size <= FRAME_HEADER_LEN {
            return Err(format!(
                "datagram_size must be > {} (frame header)",
                FRAME_HEADER_LEN
            ));
        }

        if self.datagram_size > MAX_DATAGRAM_SIZE {
            return Err(format!("datagram_size must be <= {}", MAX_DATAGRAM_SIZE));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = NetworkConfig::default();
        assert_eq!(config.bind_address.port(), 29900);
        assert_eq!(config.workers, 5);
        assert_eq!(config.datagram_size, 1400);
        assert_eq!(config.frame_capacity(), 1385);
    }

    #[test]
    fn test_config_validation() {
        assert!(NetworkConfig::default().validate().is_ok());
    }

    #[test]
    fn test_invalid_workers() {
        let mut config = NetworkConfig::default();
        config.workers = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_datagram_size() {
        let mut config = NetworkConfig::default();
        config.datagram_size = FRAME_HEADER_LEN;
        assert!(config.validate().is_err());

        config.datagram_size = FRAME_HEADER_LEN + 1;
        assert!(config.validate().is_ok());

        config.datagram_size = MAX_DATAGRAM_SIZE + 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_server_config() {
        let server = ServerConfig::parse("workers = 3\ndatagramsize = 512");
        let config = NetworkConfig::from_config("127.0.0.1:4000".parse().unwrap(), &server);
        assert_eq!(config.workers, 3);
        assert_eq!(config.frame_capacity(), 512 - FRAME_HEADER_LEN);
        assert_eq!(config.bind_address.port(), 4000);
    }
}
