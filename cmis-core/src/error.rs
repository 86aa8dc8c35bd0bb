//! Error taxonomy shared by every public operation
//!
//! Each operation either returns a fully valid result or fails with exactly
//! one of the kinds below. Transport failures are wrapped, never retried.

use crate::object::ObjectId;

/// Result type for client operations
pub type Result<T> = std::result::Result<T, CmisError>;

/// What the client knows about server-side state after a cancelled transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    /// Cancelled before the repository was contacted
    Unchanged,
    /// The repository may hold partially written content
    Unknown,
}

impl std::fmt::Display for ServerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServerState::Unchanged => write!(f, "unchanged"),
            ServerState::Unknown => write!(f, "unknown"),
        }
    }
}

/// Errors raised by the binding below the object model
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Protocol error: {0}")]
    Protocol(String),
}

/// Errors that can occur during repository operations
#[derive(Debug, thiserror::Error)]
pub enum CmisError {
    #[error("Operation not supported: {0}")]
    NotSupported(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Object not found: {0}")]
    ObjectNotFound(ObjectId),

    #[error("Transfer cancelled after {bytes_sent} bytes, server state {server_state}")]
    Cancelled {
        bytes_sent: u64,
        server_state: ServerState,
    },

    #[error("Transport failure: {0}")]
    TransportFailure(#[from] TransportError),
}

/// Fieldless discriminant of [`CmisError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotSupported,
    Conflict,
    InvalidState,
    PermissionDenied,
    ObjectNotFound,
    Cancelled,
    TransportFailure,
}

impl CmisError {
    /// Get the error kind
    pub fn kind(&self) -> ErrorKind {
        match self {
            CmisError::NotSupported(_) => ErrorKind::NotSupported,
            CmisError::Conflict(_) => ErrorKind::Conflict,
            CmisError::InvalidState(_) => ErrorKind::InvalidState,
            CmisError::PermissionDenied(_) => ErrorKind::PermissionDenied,
            CmisError::ObjectNotFound(_) => ErrorKind::ObjectNotFound,
            CmisError::Cancelled { .. } => ErrorKind::Cancelled,
            CmisError::TransportFailure(_) => ErrorKind::TransportFailure,
        }
    }

    /// Shorthand for a protocol-level transport failure
    pub fn protocol(message: impl Into<String>) -> Self {
        CmisError::TransportFailure(TransportError::Protocol(message.into()))
    }

    /// Server-side state after this error, when the error leaves it uncertain
    pub fn server_state(&self) -> Option<ServerState> {
        match self {
            CmisError::Cancelled { server_state, .. } => Some(*server_state),
            _ => None,
        }
    }
}

impl From<std::io::Error> for CmisError {
    fn from(e: std::io::Error) -> Self {
        CmisError::TransportFailure(TransportError::Io(e))
    }
}
