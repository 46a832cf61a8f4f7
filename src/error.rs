//! Error types for the control protocol client.
//!
//! Every failure of a connection or command surfaces as one variant of
//! [`ControlError`]. Reply codes are not errors at this layer; see
//! [`StatusCode`] and [`Reply::into_result`](crate::protocol::Reply::into_result)
//! for classifying them on the caller side.

use crate::types::ConnectionState;
use std::io;
use thiserror::Error;

/// The main error type for all control connection operations.
#[derive(Error, Debug)]
pub enum ControlError {
    /// The transport to the control port could not be established.
    #[error("Connection to {address} failed: {source}")]
    Connection {
        /// The `host:port` that was dialed.
        address: String,
        /// The underlying transport error.
        #[source]
        source: io::Error,
    },

    /// The AUTHENTICATE reply was absent, malformed, or not `250`.
    #[error("Authentication failed: {raw:?}")]
    Authentication {
        /// The raw data received in reply to AUTHENTICATE.
        raw: String,
    },

    /// A command was attempted without an authenticated connection.
    #[error("Not connected (call connect first)")]
    NotConnected,

    /// The socket reported an error while a command was outstanding.
    #[error("Transport error: {0}")]
    Transport(#[from] io::Error),

    /// Inbound data did not contain a reply line.
    #[error("Invalid response: {raw:?}")]
    InvalidResponse {
        /// The raw data received.
        raw: String,
    },

    /// The reply stream lost its line framing: a line outgrew the length
    /// limit, or the daemon hung up partway through one. The connection
    /// has been closed.
    #[error("Malformed reply stream, connection closed: {raw:?}")]
    MalformedStream {
        /// The partial line received before framing broke.
        raw: String,
    },

    /// The daemon closed the connection while a reply was awaited.
    #[error("Connection closed unexpectedly")]
    ConnectionClosed,

    /// Timeout waiting for the transport or a reply.
    #[error("Operation timed out")]
    Timeout,

    /// A previous exchange was cancelled before its reply was read.
    #[error("A previous command was interrupted before its reply arrived; connection closed")]
    Interrupted,

    /// The operation is not valid in the connection's current state.
    #[error("Invalid connection state: {0}")]
    InvalidState(ConnectionState),

    /// Invalid argument provided to a command.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A reply was classified as a failure by the caller.
    #[error("Command rejected (code {code}): {message}")]
    CommandRejected {
        /// The status code of the reply.
        code: u16,
        /// The reply message.
        message: String,
    },
}

impl ControlError {
    /// The raw inbound data attached to this error, if any.
    pub fn raw(&self) -> Option<&str> {
        match self {
            ControlError::Authentication { raw }
            | ControlError::InvalidResponse { raw }
            | ControlError::MalformedStream { raw } => Some(raw),
            _ => None,
        }
    }

    /// Whether this error left the connection closed.
    ///
    /// Only errors from an exchange on an authenticated connection qualify;
    /// a failed `connect` leaves the connection unauthenticated.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ControlError::Transport(_)
                | ControlError::MalformedStream { .. }
                | ControlError::ConnectionClosed
                | ControlError::Timeout
                | ControlError::Interrupted
        )
    }
}

/// Result type alias for control operations.
pub type Result<T> = std::result::Result<T, ControlError>;

/// Well-known reply codes, for callers that classify replies.
///
/// The connection itself never consults this table; it hands back every
/// reply as-is. [`Reply::into_result`](crate::protocol::Reply::into_result)
/// uses it to decide which codes become [`ControlError::CommandRejected`].
/// Codes outside the table map to [`StatusCode::Unknown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    /// `250`: the command was carried out.
    Ok = 250,
    /// `251`: accepted, nothing needed doing.
    OperationUnnecessary = 251,
    /// `252`: accepted, some resource ran short.
    ResourceExhaustedInfo = 252,
    /// `451`: refused for lack of resources; may work later.
    ResourceExhausted = 451,
    /// `500`: the line could not be parsed at all.
    SyntaxErrorProtocol = 500,
    /// `510`: unknown command keyword.
    UnrecognizedCommand = 510,
    /// `511`: known command the daemon does not implement.
    UnimplementedCommand = 511,
    /// `512`: malformed argument.
    SyntaxErrorArgument = 512,
    /// `513`: unknown argument.
    UnrecognizedArgument = 513,
    /// `514`: sent before AUTHENTICATE succeeded.
    AuthenticationRequired = 514,
    /// `515`: AUTHENTICATE rejected the secret.
    BadAuthentication = 515,
    /// `550`: generic failure.
    UnspecifiedError = 550,
    /// `551`: daemon-side internal failure.
    InternalError = 551,
    /// `552`: no such key, circuit, stream or router.
    UnrecognizedEntity = 552,
    /// `553`: SETCONF value refused.
    InvalidConfigValue = 553,
    /// `554`: descriptor refused.
    InvalidDescriptor = 554,
    /// `555`: entity exists but is not under controller management.
    UnmanagedEntity = 555,
    /// `650`: asynchronous event line, never a command reply.
    AsyncEvent = 650,
    /// Any code not listed above.
    Unknown = 0,
}

impl StatusCode {
    /// Look up `code`, falling back to [`StatusCode::Unknown`].
    pub fn from_u16(code: u16) -> Self {
        match code {
            250 => Self::Ok,
            251 => Self::OperationUnnecessary,
            252 => Self::ResourceExhaustedInfo,
            451 => Self::ResourceExhausted,
            500 => Self::SyntaxErrorProtocol,
            510 => Self::UnrecognizedCommand,
            511 => Self::UnimplementedCommand,
            512 => Self::SyntaxErrorArgument,
            513 => Self::UnrecognizedArgument,
            514 => Self::AuthenticationRequired,
            515 => Self::BadAuthentication,
            550 => Self::UnspecifiedError,
            551 => Self::InternalError,
            552 => Self::UnrecognizedEntity,
            553 => Self::InvalidConfigValue,
            554 => Self::InvalidDescriptor,
            555 => Self::UnmanagedEntity,
            650 => Self::AsyncEvent,
            _ => Self::Unknown,
        }
    }

    /// The `25x` codes: the daemon accepted the command.
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            Self::Ok | Self::OperationUnnecessary | Self::ResourceExhaustedInfo
        )
    }

    /// Neither a success nor an event line. Unknown codes count as errors.
    pub fn is_error(&self) -> bool {
        !self.is_success() && *self != Self::AsyncEvent
    }

    /// The numeric code; `0` for [`StatusCode::Unknown`].
    pub fn as_u16(&self) -> u16 {
        *self as u16
    }
}

impl From<u16> for StatusCode {
    fn from(code: u16) -> Self {
        StatusCode::from_u16(code)
    }
}
