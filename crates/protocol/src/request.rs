//! Inbound query datagrams
//!
//! ```text
//! {PREFIX 3 bytes}{TIMESTAMP 4 bytes}{TRAILER ...}
//! ```
//! The prefix (protocol magic and request type) is not checked. The trailer
//! carries request flags this server does not interpret.

use crate::error::RequestError;
use bytes::Bytes;
use gsemu_core::Timestamp;

/// Length of the protocol/type prefix
pub const REQUEST_PREFIX_LEN: usize = 3;

/// Shortest datagram that carries a timestamp
pub const MIN_REQUEST_LEN: usize = REQUEST_PREFIX_LEN + Timestamp::LEN;

/// A parsed query request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRequest {
    pub prefix: [u8; REQUEST_PREFIX_LEN],
    pub timestamp: Timestamp,
    pub trailer: Bytes,
}

impl QueryRequest {
    /// Parse a raw datagram
    ///
    /// # Errors
    /// `TooShort` if the datagram has fewer than [`MIN_REQUEST_LEN`] bytes
    pub fn parse(data: &[u8]) -> Result<Self, RequestError> {
        if data.len() < MIN_REQUEST_LEN {
            return Err(RequestError::TooShort {
                len: data.len(),
                min: MIN_REQUEST_LEN,
            });
        }

        let mut prefix = [0u8; REQUEST_PREFIX_LEN];
        prefix.copy_from_slice(&data[..REQUEST_PREFIX_LEN]);
        let timestamp = Timestamp::from_slice(&data[REQUEST_PREFIX_LEN..MIN_REQUEST_LEN])
            .ok_or(RequestError::TooShort {
                len: data.len(),
                min: MIN_REQUEST_LEN,
            })?;

        Ok(Self {
            prefix,
            timestamp,
            trailer: Bytes::copy_from_slice(&data[MIN_REQUEST_LEN..]),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_request() {
        let data = [0xFE, 0xFD, 0x00, 0x10, 0x20, 0x30, 0x40, 0xFF, 0xFF, 0xFF, 0x01];
        let request = QueryRequest::parse(&data).unwrap();
        assert_eq!(request.prefix, [0xFE, 0xFD, 0x00]);
        assert_eq!(request.timestamp, Timestamp::new([0x10, 0x20, 0x30, 0x40]));
        assert_eq!(&request.trailer[..], &[0xFF, 0xFF, 0xFF, 0x01]);
    }

    #[test]
    fn test_parse_minimum() {
        let request = QueryRequest::parse(&[1, 2, 3, 4, 5, 6, 7]).unwrap();
        assert_eq!(request.timestamp.as_bytes(), &[4, 5, 6, 7]);
        assert!(request.trailer.is_empty());
    }

    #[test]
    fn test_too_short() {
        for len in 0..MIN_REQUEST_LEN {
            let data = vec![0u8; len];
            assert_eq!(
                QueryRequest::parse(&data),
                Err(RequestError::TooShort { len, min: 7 })
            );
        }
    }
}
