//! Protocol constants shared by the codec and the engine

/// Major protocol version
pub const MAJOR: u8 = 0;

/// Minor protocol version
pub const MINOR: u8 = 9;

/// Protocol revision
pub const REVISION: u8 = 1;

/// Default TCP port for plain AMQP
pub const PORT: u16 = 5672;

/// Frame type tag of a method frame
pub const FRAME_METHOD: u8 = 1;

/// Frame type tag of a content-header frame
pub const FRAME_HEADER: u8 = 2;

/// Frame type tag of a content-body frame
pub const FRAME_BODY: u8 = 3;

/// Frame type tag of a heartbeat frame
pub const FRAME_HEARTBEAT: u8 = 8;

/// Every frame ends with this marker octet
pub const FRAME_END: u8 = 0xCE;

/// Envelope bytes ahead of the payload: type tag, channel, payload length
pub const FRAME_HEADER_SIZE: u32 = 7;

/// Envelope bytes after the payload: the end marker
pub const FRAME_END_SIZE: u32 = 1;

/// Channel limit applied when the negotiated channel-max is zero
pub const CHANNEL_MAX: u16 = 32767;

/// Frame size limit applied before tuning completes
pub const FRAME_MAX: u32 = 131072;

/// Smallest frame-max a peer may impose; lower values are clamped up
pub const MIN_FRAME_MAX: u32 = 4096;

/// Reply code of a successful, deliberate shutdown
pub const REPLY_SUCCESS: u16 = 200;

/// Reply code when an operator forces the connection closed
pub const CONNECTION_FORCED: u16 = 320;

/// Reply code for a frame that is illegal in the current channel state
pub const UNEXPECTED_FRAME: u16 = 505;
