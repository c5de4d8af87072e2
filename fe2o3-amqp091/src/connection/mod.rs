//! Implementation of the AMQP 0-9-1 connection engine
//!
//! The connection owns every other moving part: the frame codec and its
//! carry-over buffer, the channel table, the callback registry, the
//! heartbeat checker, and the injected transport and credentials. All
//! entry points are synchronous and none of them block; any waiting is a
//! callback registered for a future ingress event or timer tick.

use std::fmt;

use bytes::BytesMut;
use fe2o3_amqp091_types::definitions::{
    CHANNEL_MAX, FRAME_END_SIZE, FRAME_HEADER_SIZE, FRAME_MAX, MAJOR, MINOR, MIN_FRAME_MAX, PORT,
    REPLY_SUCCESS, UNEXPECTED_FRAME,
};
use fe2o3_amqp091_types::methods::{channel as channel_methods, connection as connection_methods};
use fe2o3_amqp091_types::{BasicProperties, ContentHeader, FieldTable, Method};
use slab::Slab;
use tokio_util::codec::{Decoder, Encoder};

use crate::auth::{Credentials, PlainCredentials};
use crate::callbacks::{Callback, CallbackRegistry, Entry, Key};
use crate::channel::{Channel, ChannelState};
use crate::frames::protocol_header::ProtocolHeader;
use crate::frames::{Frame, FrameCodec};
use crate::transport::Transport;
use crate::Payload;

pub mod builder;
mod error;
pub(crate) mod heartbeat;

pub use builder::Builder;
pub use error::Error;

use heartbeat::{HeartbeatChecker, Verdict};

/// Product name reported in `StartOk.client_properties`
const PRODUCT: &str = "fe2o3-amqp091";

/// Lifecycle of the connection as a whole
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Nothing has happened yet; the transport may still be connecting
    Init,

    /// The protocol header is being handed to the transport. This is the
    /// only state in which a protocol-header frame may be emitted.
    ProtocolHeaderSent,

    /// Header flushed; waiting for the server's `Connection.Start`
    AwaitingStart,

    /// `StartOk` sent; waiting for `Connection.Tune`
    AwaitingTune,

    /// `TuneOk` and `Open` sent; waiting for `Connection.OpenOk`
    AwaitingOpenOk,

    /// Fully open; channel work is permitted
    Open,

    /// A close is in flight, locally or remotely initiated
    Closing,

    /// Finished. Everything is ignored until an explicit [`Connection::reset`]
    Closed,
}

/// The event a callback is invoked with
#[derive(Debug, Clone)]
pub enum Dispatch {
    /// A method frame routed to this callback
    Method {
        /// Channel the method arrived on
        channel: u16,
        /// The decoded method
        method: Method,
    },

    /// A fully assembled content-bearing message
    Content {
        /// Channel the content arrived on
        channel: u16,
        /// The content header announcing the body
        header: ContentHeader,
        /// The reassembled body
        body: Payload,
    },

    /// The connection reached `Open`
    Opened,

    /// The connection closed with the recorded reply
    Closed {
        /// AMQP reply code, 200 for a deliberate shutdown
        reply_code: u16,
        /// Human-readable close reason
        reply_text: String,
    },

    /// A channel closed, remotely or in response to a local request
    ChannelClosed {
        /// The channel that closed
        channel: u16,
        /// AMQP reply code
        reply_code: u16,
        /// Human-readable close reason
        reply_text: String,
    },

    /// The connection failed; outstanding RPC callbacks see this once
    Failed {
        /// Description of the failure
        reason: String,
    },
}

/// Connection configuration.
///
/// Zero for `channel_max` or `heartbeat` means "no preference" during
/// tuning; the server's value wins.
#[derive(Debug, Clone)]
pub struct ConnectionParameters {
    /// Broker hostname
    pub host: String,

    /// Broker port; the protocol default 5672 when `None`
    pub port: Option<u16>,

    /// Virtual host to open
    pub virtual_host: String,

    /// Proposed channel limit, 0 for no preference
    pub channel_max: u16,

    /// Proposed frame size limit
    pub frame_max: u32,

    /// Proposed heartbeat interval in seconds, 0 to disable
    pub heartbeat: u16,
}

impl Default for ConnectionParameters {
    fn default() -> Self {
        Self {
            host: String::from("localhost"),
            port: None,
            virtual_host: String::from("/"),
            channel_max: 0,
            frame_max: FRAME_MAX,
            heartbeat: 0,
        }
    }
}

/// Observes connection lifecycle transitions.
///
/// This is the seam a reconnection policy plugs into; the engine itself
/// never reconnects. Combine `on_connection_closed` with
/// [`Connection::reset`] to rebuild the state record and dial again.
pub trait LifecycleHook: Send {
    /// The engine is about to ask the transport to connect
    fn on_connect_attempt(&mut self) {}

    /// The transport reported a successful connect
    fn on_transport_connected(&mut self) {}

    /// The connection ended, cleanly or not
    fn on_connection_closed(&mut self, reply_code: u16, reply_text: &str) {
        let _ = (reply_code, reply_text);
    }
}

/// The default hook: observes nothing, never reconnects
#[derive(Debug, Default, Clone, Copy)]
pub struct NullLifecycleHook;

impl LifecycleHook for NullLifecycleHook {}

/// Negotiates `0` as "no preference" for every tunable, including
/// `channel_max`, which the protocol permits.
fn combine<V>(client: V, server: V) -> V
where
    V: Copy + Ord + From<u8>,
{
    let zero = V::from(0);
    if client == zero {
        server
    } else if server == zero {
        client
    } else {
        V::min(client, server)
    }
}

/// The AMQP 0-9-1 protocol engine for one connection.
///
/// Generic over the injected [`Transport`]; see the crate root for how a
/// driver wires the entry points.
pub struct Connection<T: Transport> {
    transport: T,
    parameters: ConnectionParameters,
    credentials: Box<dyn Credentials>,
    hook: Box<dyn LifecycleHook>,

    state: ConnectionState,
    tuning: connection_methods::TuneOk,
    server_properties: Option<FieldTable>,
    known_hosts: Option<String>,
    close_reason: Option<(u16, String)>,

    channels: Slab<Channel>,
    callbacks: CallbackRegistry<T>,

    codec: FrameCodec,
    read_buffer: BytesMut,
    bytes_sent: u64,
    bytes_received: u64,
    heartbeat: Option<HeartbeatChecker>,
}

/* ------------------------------- Public API ------------------------------- */

impl<T: Transport> Connection<T> {
    /// Starts building a connection
    pub fn builder() -> Builder {
        Builder::new()
    }

    /// Creates the engine with default credentials (`guest`/`guest`) and
    /// asks the transport to connect. The driver must then feed transport
    /// events back in.
    pub fn open(parameters: ConnectionParameters, transport: T) -> Self {
        let mut connection = Self::from_parts(
            parameters,
            transport,
            Box::new(PlainCredentials::default()),
            Box::new(NullLifecycleHook),
        );
        connection.connect();
        connection
    }

    /// Whether the connection has completed the handshake and is usable
    pub fn is_open(&self) -> bool {
        matches!(self.state, ConnectionState::Open)
    }

    /// Current lifecycle state
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// The limits agreed during tuning; zeroed before `Connection.Tune`
    pub fn negotiated(&self) -> connection_methods::TuneOk {
        self.tuning
    }

    /// Properties the server reported in `Connection.Start`
    pub fn server_properties(&self) -> Option<&FieldTable> {
        self.server_properties.as_ref()
    }

    /// The `known_hosts` value from `Connection.OpenOk`
    pub fn known_hosts(&self) -> Option<&str> {
        self.known_hosts.as_deref()
    }

    /// Borrows the injected transport
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Mutably borrows the injected transport
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Total bytes handed to the transport
    pub fn bytes_sent(&self) -> u64 {
        self.bytes_sent
    }

    /// Total bytes received from the transport
    pub fn bytes_received(&self) -> u64 {
        self.bytes_received
    }

    /// Registers a callback for the connection reaching `Open`
    pub fn add_on_open_callback(&mut self, callback: Callback<T>) {
        self.callbacks.add(0, Key::OnOpen, callback, false);
    }

    /// Registers a callback for the connection closing
    pub fn add_on_close_callback(&mut self, callback: Callback<T>) {
        self.callbacks.add(0, Key::OnClose, callback, false);
    }

    /// Registers a callback under an arbitrary `(channel, key)`. Use
    /// [`Key::Receive`] to install a channel's default receive hook.
    pub fn add_callback(&mut self, channel: u16, key: Key, callback: Callback<T>, one_shot: bool) {
        self.callbacks.add(channel, key, callback, one_shot);
    }

    /// Removes a previously registered callback; absent entries are ignored
    pub fn remove_callback(&mut self, channel: u16, key: Key, callback: &Callback<T>) {
        self.callbacks.remove(channel, key, callback);
    }

    /// Opens a channel on the next free number and registers `on_open` for
    /// its `Channel.OpenOk`. Fails with [`Error::NoFreeChannels`] once every
    /// number up to the negotiated channel-max is taken.
    pub fn open_channel(&mut self, on_open: Callback<T>) -> Result<u16, Error> {
        if !self.is_open() {
            return Err(Error::IllegalState(self.state));
        }
        let limit = if self.tuning.channel_max == 0 {
            CHANNEL_MAX
        } else {
            self.tuning.channel_max
        };
        if self.channels.len() >= limit as usize {
            return Err(Error::NoFreeChannels);
        }
        let number = self.channels.vacant_key() as u16 + 1;
        let slot = self.channels.insert(Channel::new(number));
        match self.rpc(
            number,
            Method::ChannelOpen(channel_methods::Open::default()),
            &[channel_methods::OpenOk::KEY],
            on_open,
        ) {
            Ok(()) => Ok(number),
            Err(error) => {
                let _ = self.channels.remove(slot);
                Err(error)
            }
        }
    }

    /// Requests an orderly shutdown of one channel
    pub fn close_channel(
        &mut self,
        channel: u16,
        reply_code: u16,
        reply_text: &str,
    ) -> Result<(), Error> {
        if !self.is_open() {
            return Err(Error::IllegalState(self.state));
        }
        let slot = self.channel_slot(channel)?;
        self.emit_method(
            channel,
            Method::ChannelClose(channel_methods::Close {
                reply_code,
                reply_text: reply_text.to_string(),
                class_id: 0,
                method_id: 0,
            }),
        )?;
        if let Some(chan) = self.channels.get_mut(slot) {
            chan.state = ChannelState::Closing;
        }
        Ok(())
    }

    /// Emits a method frame and, when `content` is given, the content
    /// header and body frames that accompany it. The body is split into
    /// fragments no larger than the negotiated frame-max allows, emitted
    /// contiguously in order.
    pub fn send_method(
        &mut self,
        channel: u16,
        method: Method,
        content: Option<(BasicProperties, Payload)>,
    ) -> Result<(), Error> {
        if channel > 0 && !self.is_open() {
            return Err(Error::IllegalState(self.state));
        }
        self.emit_method(channel, method)?;

        if let Some((properties, body)) = content {
            let header = ContentHeader::new(body.len() as u64, properties);
            self.send_frame(Frame::ContentHeader { channel, header })?;

            let frame_max = if self.tuning.frame_max == 0 {
                FRAME_MAX
            } else {
                self.tuning.frame_max
            };
            let max_piece = (frame_max - FRAME_HEADER_SIZE - FRAME_END_SIZE) as usize;
            let mut rest = body;
            while !rest.is_empty() {
                let piece = rest.split_to(usize::min(rest.len(), max_piece));
                self.send_frame(Frame::ContentBody {
                    channel,
                    payload: piece,
                })?;
            }
        }
        Ok(())
    }

    /// Sends `method` after registering `callback` one-shot under each of
    /// `acceptable_replies`; the first matching reply fires the callback
    /// and cancels the sibling registrations.
    pub fn rpc(
        &mut self,
        channel: u16,
        method: Method,
        acceptable_replies: &[(u16, u16)],
        callback: Callback<T>,
    ) -> Result<(), Error> {
        // register before emitting so a fast reply cannot slip past
        for &reply in acceptable_replies {
            self.callbacks.add(channel, Key::Method(reply), callback.clone(), true);
        }
        match self.send_method(channel, method, None) {
            Ok(()) => Ok(()),
            Err(error) => {
                self.callbacks.remove_everywhere(channel, &callback);
                Err(error)
            }
        }
    }

    /// Requests an orderly shutdown of the whole connection: every open
    /// channel is closed first, and `Connection.Close` goes out once the
    /// last one confirms. Idempotent; calling again while closing or closed
    /// only logs a warning.
    pub fn close(&mut self, reply_code: u16, reply_text: &str) -> Result<(), Error> {
        match self.state {
            ConnectionState::Closing | ConnectionState::Closed => {
                #[cfg(feature = "tracing")]
                tracing::warn!("close invoked while closing or closed");
                #[cfg(feature = "log")]
                log::warn!("close invoked while closing or closed");
                Ok(())
            }
            ConnectionState::Open => {
                self.close_reason = Some((reply_code, reply_text.to_string()));
                self.state = ConnectionState::Closing;

                let numbers: Vec<u16> =
                    self.channels.iter().map(|(_, chan)| chan.number).collect();
                for number in numbers {
                    self.emit_method(
                        number,
                        Method::ChannelClose(channel_methods::Close {
                            reply_code,
                            reply_text: reply_text.to_string(),
                            class_id: 0,
                            method_id: 0,
                        }),
                    )?;
                    if let Some(chan) = self.channels.get_mut((number - 1) as usize) {
                        chan.state = ChannelState::Closing;
                    }
                }
                if self.channels.is_empty() {
                    self.on_close_ready()?;
                }
                Ok(())
            }
            _ => {
                // handshake never completed; no protocol ceremony to run
                self.state = ConnectionState::Closed;
                self.callbacks.clear();
                self.channels.clear();
                self.transport.disconnect();
                Ok(())
            }
        }
    }

    /// Rebuilds the entire state record and dials again. This is the only
    /// `Closed -> Init` path and is meant to be driven from a
    /// [`LifecycleHook`] implementing a reconnection policy.
    pub fn reset(&mut self) {
        if !matches!(self.state, ConnectionState::Closed) {
            #[cfg(feature = "tracing")]
            tracing::warn!("reset invoked while not closed");
            #[cfg(feature = "log")]
            log::warn!("reset invoked while not closed");
            return;
        }
        self.state = ConnectionState::Init;
        self.tuning = connection_methods::TuneOk::default();
        self.server_properties = None;
        self.known_hosts = None;
        self.close_reason = None;
        self.channels.clear();
        self.callbacks.clear();
        self.read_buffer.clear();
        self.bytes_sent = 0;
        self.bytes_received = 0;
        self.heartbeat = None;
        self.connect();
    }

    /* --------------------------- Transport events -------------------------- */

    /// The transport finished connecting: emit the protocol header. These
    /// are the very first bytes on the wire; nothing else may precede them.
    pub fn on_transport_connected(&mut self) {
        if !matches!(self.state, ConnectionState::Init) {
            #[cfg(feature = "tracing")]
            tracing::warn!(state = ?self.state, "transport connected in unexpected state");
            #[cfg(feature = "log")]
            log::warn!("transport connected in unexpected state {:?}", self.state);
            return;
        }
        self.state = ConnectionState::ProtocolHeaderSent;
        // cannot fail: the codec writes the 8 header bytes straight through
        let _ = self.send_frame(Frame::ProtocolHeader(ProtocolHeader::default()));
        self.state = ConnectionState::AwaitingStart;
        self.hook.on_transport_connected();
    }

    /// Bytes arrived from the transport. Complete frames are processed in
    /// arrival order; a partial frame is retained for the next chunk. Any
    /// error tears the connection down and is returned to the driver.
    pub fn on_bytes(&mut self, chunk: &[u8]) -> Result<(), Error> {
        if matches!(self.state, ConnectionState::Closed) {
            return Ok(());
        }
        self.bytes_received += chunk.len() as u64;
        self.read_buffer.extend_from_slice(chunk);

        loop {
            match self.codec.decode(&mut self.read_buffer) {
                Ok(Some(frame)) => {
                    #[cfg(feature = "tracing")]
                    tracing::trace!(frame = ?frame, "RECV");
                    #[cfg(feature = "log")]
                    log::trace!("RECV frame = {:?}", frame);
                    if let Err(error) = self.handle_frame(frame) {
                        return Err(self.teardown(error));
                    }
                    if matches!(self.state, ConnectionState::Closed) {
                        self.read_buffer.clear();
                        return Ok(());
                    }
                }
                Ok(None) => return Ok(()),
                Err(error) => return Err(self.teardown(Error::from(error))),
            }
        }
    }

    /// A scheduled timer fired. Drives the heartbeat monitor: emits a probe
    /// and reschedules, or declares the connection stale after too many
    /// idle intervals.
    pub fn on_timer_tick(&mut self) -> Result<(), Error> {
        if matches!(
            self.state,
            ConnectionState::Closing | ConnectionState::Closed
        ) {
            return Ok(());
        }
        let bytes_received = self.bytes_received;
        let bytes_sent = self.bytes_sent;
        let Some(checker) = self.heartbeat.as_mut() else {
            return Ok(());
        };
        let verdict = checker.send_and_check(bytes_received, bytes_sent);
        let interval = checker.timer_interval();

        match verdict {
            Verdict::Stale => Err(self.teardown(Error::HeartbeatTimeout)),
            Verdict::Send => {
                self.send_frame(Frame::Heartbeat)?;
                if let Some(checker) = self.heartbeat.as_mut() {
                    checker.sent();
                }
                self.transport.schedule_timer(interval);
                Ok(())
            }
        }
    }

    /// The transport reported closure. If a clean close already completed
    /// this is a no-op; otherwise the stream died under us and outstanding
    /// callbacks are failed.
    pub fn on_transport_closed(&mut self) {
        if matches!(self.state, ConnectionState::Closed) {
            return;
        }
        self.fail_connection("transport closed unexpectedly", false);
    }
}

/* ------------------------------- Private API ------------------------------ */

impl<T: Transport> Connection<T> {
    pub(crate) fn from_parts(
        parameters: ConnectionParameters,
        transport: T,
        credentials: Box<dyn Credentials>,
        hook: Box<dyn LifecycleHook>,
    ) -> Self {
        Self {
            transport,
            parameters,
            credentials,
            hook,
            state: ConnectionState::Init,
            tuning: connection_methods::TuneOk::default(),
            server_properties: None,
            known_hosts: None,
            close_reason: None,
            channels: Slab::new(),
            callbacks: CallbackRegistry::new(),
            codec: FrameCodec::default(),
            read_buffer: BytesMut::new(),
            bytes_sent: 0,
            bytes_received: 0,
            heartbeat: None,
        }
    }

    pub(crate) fn connect(&mut self) {
        self.hook.on_connect_attempt();
        let host = self.parameters.host.clone();
        let port = self.parameters.port.unwrap_or(PORT);
        self.transport.connect(&host, port);
    }

    fn send_frame(&mut self, frame: Frame) -> Result<(), Error> {
        // nothing may precede the protocol header on the wire
        match (&frame, self.state) {
            (Frame::ProtocolHeader(_), ConnectionState::ProtocolHeaderSent) => {}
            (Frame::ProtocolHeader(_), state) => return Err(Error::IllegalState(state)),
            (_, state @ (ConnectionState::Init | ConnectionState::ProtocolHeaderSent)) => {
                return Err(Error::IllegalState(state))
            }
            _ => {}
        }
        #[cfg(feature = "tracing")]
        tracing::trace!(frame = ?frame, "SEND");
        #[cfg(feature = "log")]
        log::trace!("SEND frame = {:?}", frame);

        let mut buf = BytesMut::new();
        self.codec.encode(frame, &mut buf)?;
        self.bytes_sent += buf.len() as u64;
        self.transport.emit_bytes(&buf);
        Ok(())
    }

    fn emit_method(&mut self, channel: u16, method: Method) -> Result<(), Error> {
        self.send_frame(Frame::Method { channel, method })
    }

    fn channel_slot(&self, channel: u16) -> Result<usize, Error> {
        let slot = (channel as usize)
            .checked_sub(1)
            .ok_or(Error::ChannelNotOpen(channel))?;
        if self.channels.contains(slot) {
            Ok(slot)
        } else {
            Err(Error::ChannelNotOpen(channel))
        }
    }

    /// Invokes every callback under `(channel, key)` in registration order.
    /// Returns whether any entry was registered. Entries added during the
    /// dispatch only see future events; one-shot entries are removed from
    /// every key of the channel once fired.
    fn process(&mut self, channel: u16, key: Key, dispatch: &Dispatch) -> bool {
        let entries = self.callbacks.take(channel, key);
        if entries.is_empty() {
            return false;
        }
        let mut survivors = Vec::new();
        let mut fired_one_shots = Vec::new();
        for entry in entries {
            let result = {
                let mut callback = entry.callback.lock();
                (&mut *callback)(self, dispatch)
            };
            if let Err(_error) = result {
                #[cfg(feature = "tracing")]
                tracing::warn!(error = %_error, "error in user callback");
                #[cfg(feature = "log")]
                log::warn!("error in user callback: {}", _error);
            }
            if entry.one_shot {
                fired_one_shots.push(entry.callback);
            } else {
                survivors.push(entry);
            }
        }
        self.callbacks.restore(channel, key, survivors);
        for callback in fired_one_shots {
            self.callbacks.remove_everywhere(channel, &callback);
        }
        true
    }

    fn handle_frame(&mut self, frame: Frame) -> Result<(), Error> {
        match frame {
            Frame::ProtocolHeader(remote) => Err(Error::ProtocolVersionMismatch {
                local: (MAJOR, MINOR),
                remote: remote.version(),
            }),
            Frame::Heartbeat => {
                if let Some(checker) = self.heartbeat.as_mut() {
                    checker.received();
                }
                Ok(())
            }
            Frame::Method { channel: 0, method } => self.handle_connection_method(method),
            Frame::Method { channel, method } => self.handle_channel_method(channel, method),
            Frame::ContentHeader { channel, header } => {
                self.handle_content_header(channel, header)
            }
            Frame::ContentBody { channel, payload } => {
                self.handle_content_body(channel, payload)
            }
        }
    }

    /* --------------------- Channel 0: the state machine --------------------- */

    fn handle_connection_method(&mut self, method: Method) -> Result<(), Error> {
        match method {
            Method::ConnectionStart(start) => self.on_connection_start(start),
            Method::ConnectionSecure(secure) => self.on_connection_secure(secure),
            Method::ConnectionTune(tune) => self.on_connection_tune(tune),
            Method::ConnectionOpenOk(open_ok) => self.on_connection_open_ok(open_ok),
            Method::ConnectionClose(close) => self.on_remote_close(close),
            Method::ConnectionCloseOk(_) => self.on_connection_close_ok(),
            other => {
                let key = Key::Method(other.key());
                let dispatch = Dispatch::Method {
                    channel: 0,
                    method: other,
                };
                if self.process(0, key, &dispatch) {
                    Ok(())
                } else {
                    Err(Error::UnexpectedFrame("unsolicited method on channel 0"))
                }
            }
        }
    }

    fn on_connection_start(&mut self, start: connection_methods::Start) -> Result<(), Error> {
        if !matches!(self.state, ConnectionState::AwaitingStart) {
            return Err(Error::UnexpectedFrame("Connection.Start outside handshake"));
        }
        if (start.version_major, start.version_minor) != (MAJOR, MINOR) {
            return Err(Error::ProtocolVersionMismatch {
                local: (MAJOR, MINOR),
                remote: (start.version_major, start.version_minor),
            });
        }

        let response = self.credentials.response_for(&start);
        self.server_properties = Some(start.server_properties);
        let (mechanism, response) = response.ok_or_else(|| {
            Error::LoginError(String::from(
                "no mutually supported authentication mechanism",
            ))
        })?;

        let mut client_properties = FieldTable::new();
        client_properties.insert("product", PRODUCT);
        client_properties.insert("version", env!("CARGO_PKG_VERSION"));
        client_properties.insert("platform", "Rust");

        self.emit_method(
            0,
            Method::ConnectionStartOk(connection_methods::StartOk {
                client_properties,
                mechanism,
                response,
                locale: String::from("en_US"),
            }),
        )?;
        // the blob is on the wire; nothing needs the secret anymore
        self.credentials.erase();
        self.transport.erase_credentials();
        self.state = ConnectionState::AwaitingTune;
        Ok(())
    }

    fn on_connection_secure(&mut self, secure: connection_methods::Secure) -> Result<(), Error> {
        if !matches!(self.state, ConnectionState::AwaitingTune) {
            return Err(Error::UnexpectedFrame("Connection.Secure outside handshake"));
        }
        let response = self.credentials.challenge_response(&secure).ok_or_else(|| {
            Error::LoginError(String::from("server issued an unanswerable challenge"))
        })?;
        self.emit_method(
            0,
            Method::ConnectionSecureOk(connection_methods::SecureOk { response }),
        )
    }

    fn on_connection_tune(&mut self, tune: connection_methods::Tune) -> Result<(), Error> {
        if !matches!(self.state, ConnectionState::AwaitingTune) {
            return Err(Error::UnexpectedFrame("Connection.Tune outside handshake"));
        }

        let channel_max = combine(self.parameters.channel_max, tune.channel_max);
        let mut frame_max = combine(self.parameters.frame_max, tune.frame_max);
        if frame_max != 0 && frame_max < MIN_FRAME_MAX {
            // undersized limits are accepted but silently raised to the floor
            #[cfg(feature = "tracing")]
            tracing::warn!(frame_max, "tuned frame-max below the minimum, clamping");
            #[cfg(feature = "log")]
            log::warn!("tuned frame-max {} below the minimum, clamping", frame_max);
            frame_max = MIN_FRAME_MAX;
        }
        let heartbeat = combine(self.parameters.heartbeat, tune.heartbeat);

        self.tuning = connection_methods::TuneOk {
            channel_max,
            frame_max,
            heartbeat,
        };
        if heartbeat > 0 {
            let checker = HeartbeatChecker::new(heartbeat);
            self.transport.schedule_timer(checker.timer_interval());
            self.heartbeat = Some(checker);
        }

        self.emit_method(0, Method::ConnectionTuneOk(self.tuning))?;
        self.emit_method(
            0,
            Method::ConnectionOpen(connection_methods::Open {
                virtual_host: self.parameters.virtual_host.clone(),
                capabilities: String::new(),
                insist: true,
            }),
        )?;
        self.state = ConnectionState::AwaitingOpenOk;
        Ok(())
    }

    fn on_connection_open_ok(
        &mut self,
        open_ok: connection_methods::OpenOk,
    ) -> Result<(), Error> {
        if !matches!(self.state, ConnectionState::AwaitingOpenOk) {
            return Err(Error::UnexpectedFrame("Connection.OpenOk outside handshake"));
        }
        self.known_hosts = Some(open_ok.known_hosts);
        self.state = ConnectionState::Open;
        self.process(0, Key::OnOpen, &Dispatch::Opened);
        Ok(())
    }

    fn on_remote_close(&mut self, close: connection_methods::Close) -> Result<(), Error> {
        // a server-initiated close supersedes any in-flight local close
        self.close_reason = Some((close.reply_code, close.reply_text.clone()));
        self.state = ConnectionState::Closing;

        // outstanding RPCs will never see their reply
        let failed = Dispatch::Failed {
            reason: format!(
                "connection closed by server: ({}) {}",
                close.reply_code, close.reply_text
            ),
        };
        let pending = self.callbacks.drain_pending();
        self.fail_entries(pending, &failed);

        let numbers: Vec<u16> = self.channels.iter().map(|(_, chan)| chan.number).collect();
        for number in numbers {
            let dispatch = Dispatch::ChannelClosed {
                channel: number,
                reply_code: close.reply_code,
                reply_text: close.reply_text.clone(),
            };
            self.process(number, Key::OnClose, &dispatch);
            self.callbacks.drop_channel(number);
        }
        self.channels.clear();

        self.emit_method(0, Method::ConnectionCloseOk(connection_methods::CloseOk))?;
        self.finish_close();
        Ok(())
    }

    fn on_connection_close_ok(&mut self) -> Result<(), Error> {
        if !matches!(self.state, ConnectionState::Closing) {
            return Err(Error::UnexpectedFrame("Connection.CloseOk outside close"));
        }
        self.finish_close();
        Ok(())
    }

    /// Once each channel has confirmed, tell the broker we are leaving
    fn on_close_ready(&mut self) -> Result<(), Error> {
        let (reply_code, reply_text) = self
            .close_reason
            .clone()
            .unwrap_or((REPLY_SUCCESS, String::from("Normal shutdown")));
        self.emit_method(
            0,
            Method::ConnectionClose(connection_methods::Close {
                reply_code,
                reply_text,
                class_id: 0,
                method_id: 0,
            }),
        )
    }

    fn finish_close(&mut self) {
        self.state = ConnectionState::Closed;
        let (reply_code, reply_text) = self
            .close_reason
            .clone()
            .unwrap_or((REPLY_SUCCESS, String::from("Normal shutdown")));
        let dispatch = Dispatch::Closed {
            reply_code,
            reply_text: reply_text.clone(),
        };
        self.process(0, Key::OnClose, &dispatch);
        self.hook.on_connection_closed(reply_code, &reply_text);
        self.callbacks.clear();
        self.channels.clear();
        self.transport.disconnect();
    }

    /// Invokes entries already removed from the registry with `dispatch`,
    /// swallowing callback errors
    fn fail_entries(&mut self, entries: Vec<Entry<T>>, dispatch: &Dispatch) {
        for entry in entries {
            let result = {
                let mut callback = entry.callback.lock();
                (&mut *callback)(self, dispatch)
            };
            if let Err(_error) = result {
                #[cfg(feature = "tracing")]
                tracing::warn!(error = %_error, "error in user callback");
                #[cfg(feature = "log")]
                log::warn!("error in user callback: {}", _error);
            }
        }
    }

    /// Fatal-path shutdown: fail outstanding RPCs, notify close handlers
    /// and the lifecycle hook, release everything.
    fn fail_connection(&mut self, reason: &str, request_disconnect: bool) {
        self.state = ConnectionState::Closed;
        let dispatch = Dispatch::Failed {
            reason: reason.to_string(),
        };
        let pending = self.callbacks.drain_pending();
        self.fail_entries(pending, &dispatch);
        self.process(0, Key::OnClose, &dispatch);
        self.hook.on_connection_closed(0, reason);
        self.callbacks.clear();
        self.channels.clear();
        self.read_buffer.clear();
        if request_disconnect {
            self.transport.disconnect();
        }
    }

    fn teardown(&mut self, error: Error) -> Error {
        if !matches!(self.state, ConnectionState::Closed) {
            #[cfg(feature = "tracing")]
            tracing::warn!(error = %error, "tearing down connection");
            #[cfg(feature = "log")]
            log::warn!("tearing down connection: {}", error);
            self.fail_connection(&error.to_string(), true);
        }
        error
    }

    /* ---------------------- Channels 1..: the multiplexer -------------------- */

    fn handle_channel_method(&mut self, channel: u16, method: Method) -> Result<(), Error> {
        if !matches!(
            self.state,
            ConnectionState::Open | ConnectionState::Closing
        ) {
            return Err(Error::UnexpectedFrame(
                "channel method before connection is open",
            ));
        }
        let slot = self.channel_slot(channel)?;

        match &method {
            Method::ChannelOpenOk(_) => {
                if let Some(chan) = self.channels.get_mut(slot) {
                    chan.state = ChannelState::Open;
                }
            }
            Method::ChannelFlow(flow) => {
                // honor the peer's pause/resume and confirm it
                let active = flow.active;
                if let Some(chan) = self.channels.get_mut(slot) {
                    chan.active = active;
                }
                self.emit_method(
                    channel,
                    Method::ChannelFlowOk(channel_methods::FlowOk { active }),
                )?;
            }
            Method::ChannelClose(close) => {
                // the server closed the channel under us: acknowledge,
                // fail its outstanding RPCs, notify, release the number
                let reply_code = close.reply_code;
                let reply_text = close.reply_text.clone();
                self.emit_method(channel, Method::ChannelCloseOk(channel_methods::CloseOk))?;
                let failed = Dispatch::Failed {
                    reason: format!(
                        "channel {} closed by server: ({}) {}",
                        channel, reply_code, reply_text
                    ),
                };
                let pending = self.callbacks.drain_pending_for(channel);
                self.fail_entries(pending, &failed);
                let dispatch = Dispatch::ChannelClosed {
                    channel,
                    reply_code,
                    reply_text,
                };
                self.process(channel, Key::OnClose, &dispatch);
                self.callbacks.drop_channel(channel);
                let _ = self.channels.remove(slot);
                return Ok(());
            }
            Method::ChannelCloseOk(_) => {
                let key = Key::Method(method.key());
                let dispatch = Dispatch::Method {
                    channel,
                    method: method.clone(),
                };
                self.process(channel, key, &dispatch);
                self.callbacks.drop_channel(channel);
                let _ = self.channels.remove(slot);
                if matches!(self.state, ConnectionState::Closing) && self.channels.is_empty() {
                    self.on_close_ready()?;
                }
                return Ok(());
            }
            _ => {}
        }

        let key = Key::Method(method.key());
        let dispatch = Dispatch::Method { channel, method };
        if self.process(channel, key, &dispatch) {
            return Ok(());
        }
        if !self.process(channel, Key::Receive, &dispatch) {
            #[cfg(feature = "tracing")]
            tracing::trace!(channel, "method frame with no registered handler");
            #[cfg(feature = "log")]
            log::trace!("method frame with no registered handler on channel {}", channel);
        }
        Ok(())
    }

    fn handle_content_header(
        &mut self,
        channel: u16,
        header: ContentHeader,
    ) -> Result<(), Error> {
        if !self.is_open() {
            return Err(Error::UnexpectedFrame("content before connection is open"));
        }
        let slot = self.channel_slot(channel)?;
        let Some(chan) = self.channels.get_mut(slot) else {
            return Err(Error::ChannelNotOpen(channel));
        };
        if chan.is_awaiting_content() {
            return self.channel_exception(channel, "content header while a body is pending");
        }
        if let Some((header, body)) = chan.begin_content(header) {
            let dispatch = Dispatch::Content {
                channel,
                header,
                body,
            };
            self.process(channel, Key::Receive, &dispatch);
        }
        Ok(())
    }

    fn handle_content_body(&mut self, channel: u16, payload: Payload) -> Result<(), Error> {
        if !self.is_open() {
            return Err(Error::UnexpectedFrame("content before connection is open"));
        }
        let slot = self.channel_slot(channel)?;
        let Some(chan) = self.channels.get_mut(slot) else {
            return Err(Error::ChannelNotOpen(channel));
        };
        if !chan.is_awaiting_content() {
            return self.channel_exception(channel, "content body without a pending header");
        }
        if let Some((header, body)) = chan.append_body(&payload) {
            let dispatch = Dispatch::Content {
                channel,
                header,
                body,
            };
            self.process(channel, Key::Receive, &dispatch);
        }
        Ok(())
    }

    /// A protocol offense scoped to one channel: close it with 505 and let
    /// the connection live on
    fn channel_exception(&mut self, channel: u16, text: &str) -> Result<(), Error> {
        self.emit_method(
            channel,
            Method::ChannelClose(channel_methods::Close {
                reply_code: UNEXPECTED_FRAME,
                reply_text: text.to_string(),
                class_id: 0,
                method_id: 0,
            }),
        )?;
        if let Ok(slot) = self.channel_slot(channel) {
            if let Some(chan) = self.channels.get_mut(slot) {
                chan.state = ChannelState::Closing;
            }
        }
        Ok(())
    }
}

impl<T: Transport> fmt::Debug for Connection<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("state", &self.state)
            .field("tuning", &self.tuning)
            .field("channels", &self.channels.len())
            .field("bytes_sent", &self.bytes_sent)
            .field("bytes_received", &self.bytes_received)
            .finish_non_exhaustive()
    }
}
