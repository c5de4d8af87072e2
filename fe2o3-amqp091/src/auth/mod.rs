//! Authentication credentials
//!
//! The connection holds a boxed [`Credentials`] object and consults it when
//! the server's `Connection.Start` (and, rarely, `Connection.Secure`)
//! arrives. Returning `None` means no mutually supported mechanism and
//! fails the handshake with a login error.

use bytes::Bytes;
use fe2o3_amqp091_types::methods::connection::{Secure, Start};

mod plain;
pub use plain::PlainCredentials;

/// Produces authentication responses during the connection handshake.
pub trait Credentials: Send {
    /// Picks a mechanism from `start.mechanisms` and builds the opaque
    /// response blob for `Connection.StartOk`. `None` signals that none of
    /// the offered mechanisms is supported.
    fn response_for(&self, start: &Start) -> Option<(String, Bytes)>;

    /// Answers a `Connection.Secure` challenge. The default supports no
    /// challenge round and returns `None`.
    fn challenge_response(&self, secure: &Secure) -> Option<Bytes> {
        let _ = secure;
        None
    }

    /// Invoked after `Connection.StartOk` is sent so the object may zero
    /// any retained credential material. The default does nothing.
    fn erase(&mut self) {}
}
