//! Shared mock transport and wire helpers for the engine tests
#![allow(dead_code)]

use std::time::Duration;

use bytes::BytesMut;
use fe2o3_amqp091::frames::{Frame, FrameCodec};
use fe2o3_amqp091::types::methods::connection;
use fe2o3_amqp091::types::Method;
use fe2o3_amqp091::{Connection, ConnectionParameters, Transport};
use tokio_util::codec::{Decoder, Encoder};

/// A transport that records everything the engine asks of it.
#[derive(Debug, Default)]
pub struct MockTransport {
    pub connected_to: Option<(String, u16)>,
    pub outbound: Vec<u8>,
    pub timers: Vec<Duration>,
    pub disconnects: usize,
    pub credentials_erased: bool,
}

impl Transport for MockTransport {
    fn connect(&mut self, host: &str, port: u16) {
        self.connected_to = Some((host.to_string(), port));
    }

    fn emit_bytes(&mut self, buf: &[u8]) {
        self.outbound.extend_from_slice(buf);
    }

    fn schedule_timer(&mut self, delay: Duration) {
        self.timers.push(delay);
    }

    fn disconnect(&mut self) {
        self.disconnects += 1;
    }

    fn erase_credentials(&mut self) {
        self.credentials_erased = true;
    }
}

/// Encodes one frame the way a broker would put it on the wire
pub fn frame_bytes(frame: Frame) -> Vec<u8> {
    let mut codec = FrameCodec::default();
    let mut buf = BytesMut::new();
    codec.encode(frame, &mut buf).unwrap();
    buf.to_vec()
}

/// Encodes a channel-0 method frame
pub fn server_method(method: Method) -> Vec<u8> {
    frame_bytes(Frame::Method { channel: 0, method })
}

/// Encodes a method frame on the given channel
pub fn channel_method(channel: u16, method: Method) -> Vec<u8> {
    frame_bytes(Frame::Method { channel, method })
}

/// Decodes a byte stream the engine emitted back into frames
pub fn decode_frames(bytes: &[u8]) -> Vec<Frame> {
    let mut codec = FrameCodec::default();
    let mut buf = BytesMut::from(bytes);
    let mut frames = Vec::new();
    while let Some(frame) = codec.decode(&mut buf).unwrap() {
        frames.push(frame);
    }
    assert!(buf.is_empty(), "trailing bytes after {} frames", frames.len());
    frames
}

/// Runs the full handshake against a mock broker answering with `tune`,
/// leaving the connection `Open` with an empty outbound buffer.
pub fn open_connection(
    parameters: ConnectionParameters,
    tune: connection::Tune,
) -> Connection<MockTransport> {
    let mut conn = Connection::open(parameters, MockTransport::default());
    conn.on_transport_connected();
    conn.on_bytes(&server_method(Method::ConnectionStart(
        connection::Start::default(),
    )))
    .unwrap();
    conn.on_bytes(&server_method(Method::ConnectionTune(tune)))
        .unwrap();
    conn.on_bytes(&server_method(Method::ConnectionOpenOk(
        connection::OpenOk::default(),
    )))
    .unwrap();
    assert!(conn.is_open());
    conn.transport_mut().outbound.clear();
    conn
}
