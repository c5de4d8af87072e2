//! AMQP 0-9-1 frame type and the corresponding encoder and decoder
//!
//! Every non-protocol-header frame is enveloped as a 1-byte type tag, a
//! 2-byte big-endian channel, a 4-byte big-endian payload length, the
//! payload, and the end marker `0xCE`. The decoder is incremental: it
//! holds no state of its own and reports "need more bytes" by returning
//! `Ok(None)`, so the caller owns the carry-over buffer.

use bytes::{Buf, BufMut, BytesMut};
use fe2o3_amqp091_types::definitions::{
    FRAME_BODY, FRAME_END, FRAME_END_SIZE, FRAME_HEADER, FRAME_HEADER_SIZE, FRAME_HEARTBEAT,
    FRAME_METHOD,
};
use fe2o3_amqp091_types::read::SliceReader;
use fe2o3_amqp091_types::{ContentHeader, DecodeError, Method};
use tokio_util::codec::{Decoder, Encoder};

use crate::Payload;

mod error;
pub mod protocol_header;

pub use error::Error;
use protocol_header::ProtocolHeader;

/// A single AMQP 0-9-1 frame
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    /// The 8-byte protocol header; the first bytes a client sends, and the
    /// server's reply when it rejects the proposed protocol version
    ProtocolHeader(ProtocolHeader),

    /// A method frame
    Method {
        /// Channel the method travels on; 0 for connection methods
        channel: u16,
        /// The typed method
        method: Method,
    },

    /// A content-header frame announcing a body of `header.body_size` bytes
    ContentHeader {
        /// Channel of the content-bearing method
        channel: u16,
        /// Body size and message properties
        header: ContentHeader,
    },

    /// One fragment of a content body
    ContentBody {
        /// Channel of the content-bearing method
        channel: u16,
        /// The fragment bytes
        payload: Payload,
    },

    /// A liveness probe; always on channel 0 with an empty payload
    Heartbeat,
}

impl Frame {
    /// Channel the frame addresses; protocol headers and heartbeats are 0
    pub fn channel(&self) -> u16 {
        match self {
            Frame::ProtocolHeader(_) | Frame::Heartbeat => 0,
            Frame::Method { channel, .. }
            | Frame::ContentHeader { channel, .. }
            | Frame::ContentBody { channel, .. } => *channel,
        }
    }
}

/// Encoder and decoder of AMQP 0-9-1 frames
#[derive(Debug, Default)]
pub struct FrameCodec {}

fn put_envelope(dst: &mut BytesMut, frame_type: u8, channel: u16, payload: &[u8]) {
    dst.put_u8(frame_type);
    dst.put_u16(channel);
    dst.put_u32(payload.len() as u32);
    dst.put_slice(payload);
    dst.put_u8(FRAME_END);
}

impl Encoder<Frame> for FrameCodec {
    type Error = Error;

    fn encode(&mut self, item: Frame, dst: &mut BytesMut) -> Result<(), Self::Error> {
        match item {
            Frame::ProtocolHeader(header) => {
                let raw: [u8; 8] = header.into();
                dst.put_slice(&raw);
            }
            Frame::Method { channel, method } => {
                let mut payload = BytesMut::new();
                method.encode(&mut payload)?;
                put_envelope(dst, FRAME_METHOD, channel, &payload);
            }
            Frame::ContentHeader { channel, header } => {
                let mut payload = BytesMut::new();
                header.encode(&mut payload)?;
                put_envelope(dst, FRAME_HEADER, channel, &payload);
            }
            Frame::ContentBody { channel, payload } => {
                put_envelope(dst, FRAME_BODY, channel, &payload);
            }
            Frame::Heartbeat => {
                put_envelope(dst, FRAME_HEARTBEAT, 0, &[]);
            }
        }
        Ok(())
    }
}

impl Decoder for FrameCodec {
    type Item = Frame;
    type Error = Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        // A server that rejects the proposed protocol version answers with a
        // bare protocol header instead of a frame.
        if src.starts_with(b"AMQP") {
            if src.len() < 8 {
                return Ok(None);
            }
            let mut raw = [0u8; 8];
            raw.copy_from_slice(&src[..8]);
            src.advance(8);
            return Ok(Some(Frame::ProtocolHeader(ProtocolHeader::from_wire(raw))));
        }

        if src.len() < FRAME_HEADER_SIZE as usize {
            return Ok(None);
        }
        let frame_type = src[0];
        let channel = u16::from_be_bytes([src[1], src[2]]);
        let length = u32::from_be_bytes([src[3], src[4], src[5], src[6]]) as usize;
        let total = FRAME_HEADER_SIZE as usize + length + FRAME_END_SIZE as usize;
        if src.len() < total {
            return Ok(None);
        }
        if src[total - 1] != FRAME_END {
            return Err(Error::Decode(DecodeError::BadFraming));
        }

        src.advance(FRAME_HEADER_SIZE as usize);
        let payload = src.split_to(length).freeze();
        src.advance(FRAME_END_SIZE as usize);

        let frame = match frame_type {
            FRAME_METHOD => {
                let mut reader = SliceReader::new(&payload);
                let class_id = reader.read_short()?;
                let method_id = reader.read_short()?;
                let method = Method::decode(class_id, method_id, &mut reader)?;
                Frame::Method { channel, method }
            }
            FRAME_HEADER => {
                let mut reader = SliceReader::new(&payload);
                let header = ContentHeader::decode(&mut reader)?;
                Frame::ContentHeader { channel, header }
            }
            FRAME_BODY => Frame::ContentBody { channel, payload },
            FRAME_HEARTBEAT => Frame::Heartbeat,
            other => return Err(Error::UnknownFrameType(other)),
        };
        Ok(Some(frame))
    }
}

#[cfg(test)]
mod tests {
    use bytes::BytesMut;
    use fe2o3_amqp091_types::methods::connection;
    use fe2o3_amqp091_types::{BasicProperties, ContentHeader, Method};
    use tokio_util::codec::{Decoder, Encoder};

    use super::{Frame, FrameCodec};
    use crate::frames::protocol_header::ProtocolHeader;

    fn encode(frame: Frame) -> BytesMut {
        let mut codec = FrameCodec::default();
        let mut dst = BytesMut::new();
        codec.encode(frame, &mut dst).unwrap();
        dst
    }

    #[test]
    fn test_heartbeat_frame_bytes() {
        let buf = encode(Frame::Heartbeat);
        assert_eq!(&buf[..], &[8, 0, 0, 0, 0, 0, 0, 0xCE]);
    }

    #[test]
    fn test_protocol_header_bytes() {
        let buf = encode(Frame::ProtocolHeader(ProtocolHeader::default()));
        assert_eq!(&buf[..], b"AMQP\x00\x00\x09\x01");
    }

    #[test]
    fn test_method_frame_roundtrip() {
        let frame = Frame::Method {
            channel: 0,
            method: Method::ConnectionTuneOk(connection::TuneOk {
                channel_max: 0,
                frame_max: 131072,
                heartbeat: 60,
            }),
        };
        let mut buf = encode(frame.clone());
        let total = buf.len();
        let decoded = FrameCodec::default().decode(&mut buf).unwrap().unwrap();
        assert_eq!(decoded, frame);
        // envelope accounts for 7 + payload + 1 bytes
        assert_eq!(total, 7 + 8 + 4 + 1);
    }

    #[test]
    fn test_content_header_roundtrip() {
        let frame = Frame::ContentHeader {
            channel: 3,
            header: ContentHeader::new(42, BasicProperties::default()),
        };
        let mut buf = encode(frame.clone());
        let decoded = FrameCodec::default().decode(&mut buf).unwrap().unwrap();
        assert_eq!(decoded, frame);
    }

    #[test]
    fn test_incomplete_frame_returns_none() {
        let frame = Frame::Heartbeat;
        let buf = encode(frame);
        let mut codec = FrameCodec::default();
        let mut partial = BytesMut::from(&buf[..5]);
        assert_eq!(codec.decode(&mut partial).unwrap(), None);
        partial.extend_from_slice(&buf[5..]);
        assert_eq!(codec.decode(&mut partial).unwrap(), Some(Frame::Heartbeat));
    }

    #[test]
    fn test_chunked_stream_yields_same_frames() {
        let mut stream = BytesMut::new();
        stream.extend_from_slice(&encode(Frame::Heartbeat));
        stream.extend_from_slice(&encode(Frame::Method {
            channel: 0,
            method: Method::ConnectionCloseOk(connection::CloseOk),
        }));
        stream.extend_from_slice(&encode(Frame::ContentBody {
            channel: 1,
            payload: bytes::Bytes::from_static(b"payload"),
        }));

        // feed the identical byte stream one byte at a time
        let mut codec = FrameCodec::default();
        let mut carry = BytesMut::new();
        let mut frames = Vec::new();
        for byte in stream.iter() {
            carry.extend_from_slice(&[*byte]);
            while let Some(frame) = codec.decode(&mut carry).unwrap() {
                frames.push(frame);
            }
        }
        assert_eq!(frames.len(), 3);
        assert_eq!(frames[0], Frame::Heartbeat);
        assert!(matches!(frames[1], Frame::Method { channel: 0, .. }));
        assert!(matches!(frames[2], Frame::ContentBody { channel: 1, .. }));
    }

    #[test]
    fn test_bad_end_marker() {
        let mut buf = encode(Frame::Heartbeat);
        let last = buf.len() - 1;
        buf[last] = 0x00;
        let err = FrameCodec::default().decode(&mut buf).unwrap_err();
        assert!(matches!(
            err,
            super::Error::Decode(fe2o3_amqp091_types::DecodeError::BadFraming)
        ));
    }

    #[test]
    fn test_server_version_reject_surfaces_header() {
        let mut buf = BytesMut::from(&b"AMQP\x00\x00\x08\x00"[..]);
        let decoded = FrameCodec::default().decode(&mut buf).unwrap().unwrap();
        assert_eq!(
            decoded,
            Frame::ProtocolHeader(ProtocolHeader::new(0, 8, 0))
        );
    }
}
