//! Per-channel state owned by the connection
//!
//! A channel holds only its number, lifecycle state, flow flag, and the
//! inbound content assembly buffer. It calls nothing itself; the connection
//! routes frames to it and reads the results back, so there is no
//! channel-to-connection back-reference.

use bytes::BytesMut;
use fe2o3_amqp091_types::ContentHeader;

use crate::Payload;

/// Lifecycle of a single channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    /// `Channel.Open` sent, waiting for `Channel.OpenOk`
    Opening,

    /// Ready for use
    Open,

    /// `Channel.Close` sent, waiting for `Channel.CloseOk`
    Closing,

    /// Fully closed; the record is removed right after entering this state
    Closed,
}

#[derive(Debug)]
struct ContentAssembly {
    header: ContentHeader,
    accumulated: BytesMut,
}

/// A single channel multiplexed over the connection
#[derive(Debug)]
pub(crate) struct Channel {
    pub(crate) number: u16,
    pub(crate) state: ChannelState,
    /// Flow control; the peer may pause delivery with `Channel.Flow`
    pub(crate) active: bool,
    awaiting: Option<ContentAssembly>,
}

impl Channel {
    pub(crate) fn new(number: u16) -> Self {
        Self {
            number,
            state: ChannelState::Opening,
            active: true,
            awaiting: None,
        }
    }

    /// Whether a content header has been received and the body is still
    /// incomplete
    pub(crate) fn is_awaiting_content(&self) -> bool {
        self.awaiting.is_some()
    }

    /// Accepts a content header. Returns the completed message immediately
    /// when the declared body size is zero; otherwise switches the channel
    /// into the awaiting-body substate.
    pub(crate) fn begin_content(
        &mut self,
        header: ContentHeader,
    ) -> Option<(ContentHeader, Payload)> {
        if header.body_size == 0 {
            return Some((header, Payload::new()));
        }
        self.awaiting = Some(ContentAssembly {
            header,
            accumulated: BytesMut::new(),
        });
        None
    }

    /// Appends a body fragment. Returns the assembled `(header, body)` once
    /// the accumulated length reaches the declared body size.
    pub(crate) fn append_body(&mut self, fragment: &[u8]) -> Option<(ContentHeader, Payload)> {
        let assembly = self.awaiting.as_mut()?;
        assembly.accumulated.extend_from_slice(fragment);
        if (assembly.accumulated.len() as u64) < assembly.header.body_size {
            return None;
        }
        let assembly = self.awaiting.take()?;
        Some((assembly.header, assembly.accumulated.freeze()))
    }
}
