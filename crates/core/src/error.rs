//! Core error types for GSEmu

#[derive(thiserror::Error, Debug)]
pub enum GsEmuError {
    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Encoder invariant violated: {0}")]
    Encoder(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Command error: {0}")]
    Command(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

impl GsEmuError {
    /// True for defects in the encoder, as opposed to bad input from outside
    pub fn is_internal(&self) -> bool {
        matches!(self, GsEmuError::Encoder(_))
    }
}

pub type Result<T> = std::result::Result<T, GsEmuError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_internal_errors_are_distinguishable() {
        assert!(GsEmuError::Encoder("short write".into()).is_internal());
        assert!(!GsEmuError::Protocol("too short".into()).is_internal());
        assert!(!GsEmuError::NotFound("player_".into()).is_internal());
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::AddrInUse, "busy");
        let err: GsEmuError = io.into();
        assert!(matches!(err, GsEmuError::Io(_)));
        assert!(err.to_string().contains("busy"));
    }
}
