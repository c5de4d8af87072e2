#![deny(missing_docs, missing_debug_implementations)]

//! A sans-I/O implementation of the AMQP 0-9-1 protocol engine.
//!
//! The engine consumes opaque byte chunks, emits opaque byte chunks, and
//! schedules timer callbacks through an injected [`Transport`]; it never
//! touches a socket itself. A driver wires the two directions together:
//!
//! ```rust
//! use fe2o3_amqp091::{callbacks, Connection, ConnectionParameters, Transport};
//! use std::time::Duration;
//!
//! #[derive(Debug, Default)]
//! struct BufferedTransport {
//!     outbound: Vec<u8>,
//! }
//!
//! impl Transport for BufferedTransport {
//!     fn connect(&mut self, _host: &str, _port: u16) {}
//!     fn emit_bytes(&mut self, buf: &[u8]) {
//!         self.outbound.extend_from_slice(buf);
//!     }
//!     fn schedule_timer(&mut self, _delay: Duration) {}
//!     fn disconnect(&mut self) {}
//! }
//!
//! let parameters = ConnectionParameters {
//!     host: "localhost".into(),
//!     heartbeat: 60,
//!     ..Default::default()
//! };
//! let mut connection = Connection::open(parameters, BufferedTransport::default());
//! connection.add_on_open_callback(callbacks::callback(|conn, _dispatch| {
//!     conn.close(200, "done")
//! }));
//!
//! // the driver reports transport events:
//! connection.on_transport_connected(); // emits the protocol header
//! // connection.on_bytes(&chunk)?;     // whenever the socket yields bytes
//! // connection.on_timer_tick()?;      // whenever a scheduled timer fires
//! ```
//!
//! Everything the broker sends flows through [`Connection::on_bytes`]; the
//! engine answers by calling [`Transport::emit_bytes`] with fully framed
//! wire bytes. All waiting is expressed as callbacks registered in the
//! connection's callback registry.

pub mod auth;
pub mod callbacks;
pub mod channel;
pub mod connection;
pub mod frames;
pub mod transport;

pub mod types {
    //! Re-exporting `fe2o3-amqp091-types`
    pub use fe2o3_amqp091_types::*;
}

pub use auth::PlainCredentials;
pub use connection::{Connection, ConnectionParameters, Dispatch, Error};
pub use transport::Transport;

type Payload = bytes::Bytes;
