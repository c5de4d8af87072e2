//! The transport capability the engine is generic over
//!
//! The engine performs no I/O. Everything outward-facing goes through this
//! trait; everything inward-facing arrives through the engine's entry
//! points (`on_transport_connected`, `on_bytes`, `on_timer_tick`,
//! `on_transport_closed`). A driver — blocking socket, event loop, or test
//! harness — implements the trait and wires the two directions together.

use std::time::Duration;

/// Capabilities a byte transport must provide to the engine.
pub trait Transport {
    /// Initiates a connection. On success the driver must call
    /// [`Connection::on_transport_connected`](crate::Connection::on_transport_connected).
    fn connect(&mut self, host: &str, port: u16);

    /// Hands fully framed wire bytes to the transport. Must not block; the
    /// transport buffers and flushes as it sees fit.
    fn emit_bytes(&mut self, buf: &[u8]);

    /// Requests a single-shot timer. When it fires the driver must call
    /// [`Connection::on_timer_tick`](crate::Connection::on_timer_tick).
    fn schedule_timer(&mut self, delay: Duration);

    /// Tears the transport down. On completion the driver must call
    /// [`Connection::on_transport_closed`](crate::Connection::on_transport_closed).
    fn disconnect(&mut self);

    /// Invoked once credentials are no longer needed so the driver may
    /// scrub any retained copies. The default does nothing.
    fn erase_credentials(&mut self) {}
}
