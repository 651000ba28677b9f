use std::error::Error;
use std::fmt;

use faultline_layout::LayoutError;
use faultline_types::ProtocolError;

/// Why a snapshot fetch produced no snapshot.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchError {
    /// Transport failure, timeout, non-2xx status or unreadable body.
    Network(String),
    /// The body was read but does not describe a well-formed snapshot.
    Protocol(ProtocolError),
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network(message) => write!(f, "network error: {message}"),
            Self::Protocol(error) => write!(f, "protocol error: {error}"),
        }
    }
}

impl Error for FetchError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Network(_) => None,
            Self::Protocol(error) => Some(error),
        }
    }
}

impl From<ProtocolError> for FetchError {
    fn from(error: ProtocolError) -> Self {
        Self::Protocol(error)
    }
}

/// Why the graph on screen is not the latest one.
#[derive(Debug, Clone, PartialEq)]
pub enum RefreshError {
    Fetch(FetchError),
    Layout(LayoutError),
}

impl fmt::Display for RefreshError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fetch(error) => error.fmt(f),
            Self::Layout(error) => write!(f, "layout error: {error}"),
        }
    }
}

impl Error for RefreshError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Fetch(error) => Some(error),
            Self::Layout(error) => Some(error),
        }
    }
}
