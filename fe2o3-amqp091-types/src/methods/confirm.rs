//! Methods of the Confirm class (class id 85), a RabbitMQ extension
//!
//! Publisher confirms: once selected, the broker acks or nacks every
//! publish on the channel.

use bytes::{BufMut, BytesMut};

use crate::error::{DecodeError, EncodeError};
use crate::read::SliceReader;

/// Class id of the Confirm class
pub const CLASS_ID: u16 = 85;

/// Puts the channel into confirm mode.
/// `<method name="select" synchronous="1" index="10"/>`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Select {
    /// `<field name="nowait" domain="bit"/>`
    pub nowait: bool,
}

impl Select {
    pub(crate) fn encode(&self, dst: &mut BytesMut) -> Result<(), EncodeError> {
        dst.put_u8(self.nowait as u8);
        Ok(())
    }

    pub(crate) fn decode(reader: &mut SliceReader<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            nowait: reader.read_octet()? & 1 != 0,
        })
    }
}

/// Confirms confirm mode.
/// `<method name="select-ok" index="11"/>`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SelectOk;

impl SelectOk {
    pub(crate) fn encode(&self, _dst: &mut BytesMut) -> Result<(), EncodeError> {
        Ok(())
    }

    pub(crate) fn decode(_reader: &mut SliceReader<'_>) -> Result<Self, DecodeError> {
        Ok(Self)
    }
}
