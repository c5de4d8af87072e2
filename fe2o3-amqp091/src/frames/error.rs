use std::io;

use fe2o3_amqp091_types::{DecodeError, EncodeError};

/// Frame codec errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error surfaced through the codec traits
    #[error("IO Error {0:?}")]
    Io(#[from] io::Error),

    /// A frame payload failed to decode
    #[error("Decode Error: {0}")]
    Decode(#[from] DecodeError),

    /// A frame payload failed to encode
    #[error("Encode Error: {0}")]
    Encode(#[from] EncodeError),

    /// The frame type tag is not one of 1, 2, 3, 8
    #[error("unknown frame type {0}")]
    UnknownFrameType(u8),
}
