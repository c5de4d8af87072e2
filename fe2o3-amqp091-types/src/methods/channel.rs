//! Methods of the Channel class (class id 20)

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{DecodeError, EncodeError};
use crate::read::SliceReader;
use crate::write::BufMutExt;

/// Class id of the Channel class
pub const CLASS_ID: u16 = 20;

/// Opens a channel for use.
/// `<method name="open" synchronous="1" index="10"/>`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Open {
    /// `<field name="out-of-band" domain="shortstr"/>` — deprecated, empty
    pub out_of_band: String,
}

impl Open {
    pub(crate) fn encode(&self, dst: &mut BytesMut) -> Result<(), EncodeError> {
        dst.put_shortstr(&self.out_of_band)?;
        Ok(())
    }

    pub(crate) fn decode(reader: &mut SliceReader<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            out_of_band: reader.read_shortstr()?,
        })
    }
}

/// Confirms the channel is ready.
/// `<method name="open-ok" synchronous="1" index="11"/>`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OpenOk {
    /// `<field name="channel-id" domain="longstr"/>` — deprecated
    pub channel_id: Bytes,
}

impl OpenOk {
    pub(crate) fn encode(&self, dst: &mut BytesMut) -> Result<(), EncodeError> {
        dst.put_longstr(&self.channel_id);
        Ok(())
    }

    pub(crate) fn decode(reader: &mut SliceReader<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            channel_id: reader.read_longstr()?,
        })
    }
}

/// Asks the peer to pause or restart content delivery.
/// `<method name="flow" synchronous="1" index="20"/>`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Flow {
    /// `<field name="active" domain="bit"/>`
    pub active: bool,
}

impl Flow {
    pub(crate) fn encode(&self, dst: &mut BytesMut) -> Result<(), EncodeError> {
        dst.put_u8(self.active as u8);
        Ok(())
    }

    pub(crate) fn decode(reader: &mut SliceReader<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            active: reader.read_octet()? & 1 != 0,
        })
    }
}

/// Confirms a flow request.
/// `<method name="flow-ok" index="21"/>`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlowOk {
    /// `<field name="active" domain="bit"/>`
    pub active: bool,
}

impl FlowOk {
    pub(crate) fn encode(&self, dst: &mut BytesMut) -> Result<(), EncodeError> {
        dst.put_u8(self.active as u8);
        Ok(())
    }

    pub(crate) fn decode(reader: &mut SliceReader<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            active: reader.read_octet()? & 1 != 0,
        })
    }
}

/// Requests an orderly channel shutdown.
/// `<method name="close" synchronous="1" index="40"/>`
#[derive(Debug, Clone, PartialEq)]
pub struct Close {
    /// `<field name="reply-code" domain="reply-code"/>`
    pub reply_code: u16,

    /// `<field name="reply-text" domain="reply-text"/>`
    pub reply_text: String,

    /// `<field name="class-id" domain="class-id"/>` — offending method, or 0
    pub class_id: u16,

    /// `<field name="method-id" domain="method-id"/>` — offending method, or 0
    pub method_id: u16,
}

impl Close {
    pub(crate) fn encode(&self, dst: &mut BytesMut) -> Result<(), EncodeError> {
        dst.put_u16(self.reply_code);
        dst.put_shortstr(&self.reply_text)?;
        dst.put_u16(self.class_id);
        dst.put_u16(self.method_id);
        Ok(())
    }

    pub(crate) fn decode(reader: &mut SliceReader<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            reply_code: reader.read_short()?,
            reply_text: reader.read_shortstr()?,
            class_id: reader.read_short()?,
            method_id: reader.read_short()?,
        })
    }
}

/// Confirms a channel shutdown.
/// `<method name="close-ok" synchronous="1" index="41"/>`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CloseOk;

impl CloseOk {
    pub(crate) fn encode(&self, _dst: &mut BytesMut) -> Result<(), EncodeError> {
        Ok(())
    }

    pub(crate) fn decode(_reader: &mut SliceReader<'_>) -> Result<Self, DecodeError> {
        Ok(Self)
    }
}
