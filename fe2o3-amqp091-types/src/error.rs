//! Codec error types

use thiserror::Error;

/// Errors found while decoding wire data
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Ran off the end of the buffer
    #[error("ran off the end of the buffer")]
    ShortBuffer,

    /// Unknown field-table value tag
    #[error("unknown field table tag {0:#04x}")]
    BadTag(u8),

    /// The frame end marker is not 0xCE
    #[error("frame end marker is not 0xCE")]
    BadFraming,

    /// The `(class_id, method_id)` pair is not defined by AMQP 0-9-1
    #[error("unknown method: class {0}, method {1}")]
    UnknownMethod(u16, u16),

    /// A short string did not hold valid UTF-8
    #[error("short string is not valid UTF-8")]
    InvalidUtf8,
}

/// Errors found while encoding wire data
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    /// A short string field exceeded 255 bytes
    #[error("short string exceeds 255 bytes (got {0})")]
    ShortStringTooLong(usize),
}
