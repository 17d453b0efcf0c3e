//! Error types for control-port operations

use std::num::ParseIntError;
use thiserror::Error;

/// Result alias used throughout the control session
pub type ControlResult<T> = Result<T, ControlError>;

/// Errors that can occur while talking to the control port
#[derive(Debug, Error)]
pub enum ControlError {
    /// Underlying transport failed (write, read or dial)
    #[error("Transport error: {0}")]
    Io(#[from] std::io::Error),

    /// Peer closed the connection before a complete reply arrived
    #[error("Connection closed by peer")]
    ConnectionClosed,

    /// Peer answered with a non-success status code
    #[error("Protocol error {code}: {message}")]
    Protocol {
        /// Three-digit status code from the final reply line
        code: u16,
        /// Reply body as sent by the peer
        message: String,
    },

    /// Peer rejected the AUTHENTICATE command
    #[error("Authentication failed ({code}): {message}")]
    Authentication {
        /// Three-digit status code from the final reply line
        code: u16,
        /// Reason text supplied by the peer
        message: String,
    },

    /// Command line contained a line terminator
    #[error("Invalid command: {0:?}")]
    InvalidCommand(String),

    /// Reply did not follow the line grammar
    #[error("Malformed reply: {0}")]
    Malformed(String),

    /// Reply framing was lost or an earlier exchange was cut off mid-command;
    /// the connection has to be re-established
    #[error("Session out of sync with peer: {0}")]
    Desynchronized(String),

    /// Successful reply did not contain the requested key
    #[error("{0} not found")]
    NotFound(String),

    /// Value expected to be numeric was not
    #[error("Invalid integer for {key}: {value:?}")]
    Parse {
        key: String,
        value: String,
        #[source]
        source: ParseIntError,
    },
}

impl ControlError {
    /// Status code carried by the error, if the peer supplied one
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Protocol { code, .. } | Self::Authentication { code, .. } => Some(*code),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_error_display() {
        let err = ControlError::Protocol {
            code: 552,
            message: "Unrecognized key \"bogus\"".to_string(),
        };
        let text = err.to_string();
        assert!(text.contains("552"));
        assert!(text.contains("Unrecognized key"));
        assert_eq!(err.status_code(), Some(552));
    }

    #[test]
    fn test_not_found_names_key() {
        let err = ControlError::NotFound("missing".to_string());
        assert_eq!(err.to_string(), "missing not found");
        assert_eq!(err.status_code(), None);
    }

    #[test]
    fn test_desynchronized_has_no_status() {
        let err = ControlError::Desynchronized("an earlier exchange was interrupted".to_string());
        assert!(err.to_string().contains("out of sync"));
        assert_eq!(err.status_code(), None);
    }
}
