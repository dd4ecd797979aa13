//! Error types for ringcache

use std::fmt;
use std::io;

/// Result type alias for ringcache operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by peer fetches
///
/// The local cache and the hash ring never fail; only routing a key to a
/// remote owner can.
#[derive(Debug)]
pub enum Error {
    /// I/O error from the underlying transport
    Io(io::Error),

    /// Transport failure (connection refused, timeout, bad response)
    Transport(String),

    /// The peer does not serve the requested group
    UnknownGroup(String),

    /// The peer serves the group but does not hold the key
    NotFound {
        /// Group name
        group: String,
        /// Requested key
        key: String,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O error: {}", e),
            Error::Transport(msg) => write!(f, "Transport error: {}", msg),
            Error::UnknownGroup(group) => write!(f, "Unknown group: {}", group),
            Error::NotFound { group, key } => {
                write!(f, "Key not found: {} (group {})", key, group)
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_display_not_found() {
        let err = Error::NotFound {
            group: "scores".to_string(),
            key: "tom".to_string(),
        };
        assert_eq!(err.to_string(), "Key not found: tom (group scores)");
    }

    #[test]
    fn test_io_source() {
        let err: Error = io::Error::new(io::ErrorKind::TimedOut, "peer timed out").into();
        assert!(matches!(err, Error::Io(_)));
        assert!(err.source().is_some());
        assert!(Error::Transport("reset".to_string()).source().is_none());
    }
}
