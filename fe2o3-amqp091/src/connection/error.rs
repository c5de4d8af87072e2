use fe2o3_amqp091_types::{DecodeError, EncodeError};
use thiserror::Error;

use crate::connection::ConnectionState;
use crate::frames;

/// Engine-level errors
#[derive(Debug, Error)]
pub enum Error {
    /// The frame codec failed; fatal at the connection level
    #[error("Frame Error: {0}")]
    Frame(#[from] frames::Error),

    /// A payload failed to decode; fatal at the connection level
    #[error("Decode Error: {0}")]
    Decode(#[from] DecodeError),

    /// An outbound payload failed to encode
    #[error("Encode Error: {0}")]
    Encode(#[from] EncodeError),

    /// A connection URL failed to parse
    #[error("Url Error: {0}")]
    Url(#[from] url::ParseError),

    /// A connection URL parsed but does not describe an AMQP endpoint
    #[error("Invalid AMQP URL: {0}")]
    InvalidUrl(&'static str),

    /// The server speaks a different protocol version
    #[error("Protocol version mismatch: local {local:?}, remote {remote:?}")]
    ProtocolVersionMismatch {
        /// `(major, minor)` this engine speaks
        local: (u8, u8),
        /// `(major, minor)` the server announced
        remote: (u8, u8),
    },

    /// A frame arrived that is not legal in the current state
    #[error("Unexpected frame: {0}")]
    UnexpectedFrame(&'static str),

    /// The server offered no supported authentication mechanism, or
    /// challenged with one the credentials cannot answer
    #[error("Login error: {0}")]
    LoginError(String),

    /// Every channel number up to the negotiated channel-max is in use
    #[error("No free channels")]
    NoFreeChannels,

    /// The heartbeat monitor declared the connection stale
    #[error("Too many missed heartbeats")]
    HeartbeatTimeout,

    /// The channel number is not currently allocated
    #[error("Channel {0} is not open")]
    ChannelNotOpen(u16),

    /// The operation is not permitted in the current connection state
    #[error("Invalid connection state: {0:?}")]
    IllegalState(ConnectionState),
}
