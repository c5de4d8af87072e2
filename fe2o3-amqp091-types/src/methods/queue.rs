//! Methods of the Queue class (class id 50)

use bytes::{BufMut, BytesMut};

use crate::error::{DecodeError, EncodeError};
use crate::field_table::FieldTable;
use crate::read::SliceReader;
use crate::write::BufMutExt;

/// Class id of the Queue class
pub const CLASS_ID: u16 = 50;

/// Creates a queue or verifies an existing one.
/// `<method name="declare" synchronous="1" index="10"/>`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Declare {
    /// `<field name="ticket" domain="access-ticket"/>` — deprecated, 0
    pub ticket: u16,

    /// `<field name="queue" domain="queue-name"/>` — empty for a server name
    pub queue: String,

    /// `<field name="passive" domain="bit"/>`
    pub passive: bool,

    /// `<field name="durable" domain="bit"/>`
    pub durable: bool,

    /// `<field name="exclusive" domain="bit"/>`
    pub exclusive: bool,

    /// `<field name="auto-delete" domain="bit"/>`
    pub auto_delete: bool,

    /// `<field name="no-wait" domain="no-wait"/>`
    pub nowait: bool,

    /// `<field name="arguments" domain="table"/>`
    pub arguments: FieldTable,
}

impl Declare {
    pub(crate) fn encode(&self, dst: &mut BytesMut) -> Result<(), EncodeError> {
        dst.put_u16(self.ticket);
        dst.put_shortstr(&self.queue)?;
        let mut bits = 0u8;
        bits |= self.passive as u8;
        bits |= (self.durable as u8) << 1;
        bits |= (self.exclusive as u8) << 2;
        bits |= (self.auto_delete as u8) << 3;
        bits |= (self.nowait as u8) << 4;
        dst.put_u8(bits);
        self.arguments.encode(dst)
    }

    pub(crate) fn decode(reader: &mut SliceReader<'_>) -> Result<Self, DecodeError> {
        let ticket = reader.read_short()?;
        let queue = reader.read_shortstr()?;
        let bits = reader.read_octet()?;
        Ok(Self {
            ticket,
            queue,
            passive: bits & 1 != 0,
            durable: bits & (1 << 1) != 0,
            exclusive: bits & (1 << 2) != 0,
            auto_delete: bits & (1 << 3) != 0,
            nowait: bits & (1 << 4) != 0,
            arguments: FieldTable::decode(reader)?,
        })
    }
}

/// Confirms a queue declaration with its current depth.
/// `<method name="declare-ok" synchronous="1" index="11"/>`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeclareOk {
    /// `<field name="queue" domain="queue-name"/>`
    pub queue: String,

    /// `<field name="message-count" domain="message-count"/>`
    pub message_count: u32,

    /// `<field name="consumer-count" domain="long"/>`
    pub consumer_count: u32,
}

impl DeclareOk {
    pub(crate) fn encode(&self, dst: &mut BytesMut) -> Result<(), EncodeError> {
        dst.put_shortstr(&self.queue)?;
        dst.put_u32(self.message_count);
        dst.put_u32(self.consumer_count);
        Ok(())
    }

    pub(crate) fn decode(reader: &mut SliceReader<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            queue: reader.read_shortstr()?,
            message_count: reader.read_long()?,
            consumer_count: reader.read_long()?,
        })
    }
}

/// Binds a queue to an exchange.
/// `<method name="bind" synchronous="1" index="20"/>`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bind {
    /// `<field name="ticket" domain="access-ticket"/>` — deprecated, 0
    pub ticket: u16,

    /// `<field name="queue" domain="queue-name"/>`
    pub queue: String,

    /// `<field name="exchange" domain="exchange-name"/>`
    pub exchange: String,

    /// `<field name="routing-key" domain="shortstr"/>`
    pub routing_key: String,

    /// `<field name="no-wait" domain="no-wait"/>`
    pub nowait: bool,

    /// `<field name="arguments" domain="table"/>`
    pub arguments: FieldTable,
}

impl Bind {
    pub(crate) fn encode(&self, dst: &mut BytesMut) -> Result<(), EncodeError> {
        dst.put_u16(self.ticket);
        dst.put_shortstr(&self.queue)?;
        dst.put_shortstr(&self.exchange)?;
        dst.put_shortstr(&self.routing_key)?;
        dst.put_u8(self.nowait as u8);
        self.arguments.encode(dst)
    }

    pub(crate) fn decode(reader: &mut SliceReader<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            ticket: reader.read_short()?,
            queue: reader.read_shortstr()?,
            exchange: reader.read_shortstr()?,
            routing_key: reader.read_shortstr()?,
            nowait: reader.read_octet()? & 1 != 0,
            arguments: FieldTable::decode(reader)?,
        })
    }
}

/// Confirms a queue binding.
/// `<method name="bind-ok" synchronous="1" index="21"/>`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BindOk;

impl BindOk {
    pub(crate) fn encode(&self, _dst: &mut BytesMut) -> Result<(), EncodeError> {
        Ok(())
    }

    pub(crate) fn decode(_reader: &mut SliceReader<'_>) -> Result<Self, DecodeError> {
        Ok(Self)
    }
}

/// Discards all messages in a queue.
/// `<method name="purge" synchronous="1" index="30"/>`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Purge {
    /// `<field name="ticket" domain="access-ticket"/>` — deprecated, 0
    pub ticket: u16,

    /// `<field name="queue" domain="queue-name"/>`
    pub queue: String,

    /// `<field name="no-wait" domain="no-wait"/>`
    pub nowait: bool,
}

impl Purge {
    pub(crate) fn encode(&self, dst: &mut BytesMut) -> Result<(), EncodeError> {
        dst.put_u16(self.ticket);
        dst.put_shortstr(&self.queue)?;
        dst.put_u8(self.nowait as u8);
        Ok(())
    }

    pub(crate) fn decode(reader: &mut SliceReader<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            ticket: reader.read_short()?,
            queue: reader.read_shortstr()?,
            nowait: reader.read_octet()? & 1 != 0,
        })
    }
}

/// Reports the number of purged messages.
/// `<method name="purge-ok" synchronous="1" index="31"/>`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PurgeOk {
    /// `<field name="message-count" domain="message-count"/>`
    pub message_count: u32,
}

impl PurgeOk {
    pub(crate) fn encode(&self, dst: &mut BytesMut) -> Result<(), EncodeError> {
        dst.put_u32(self.message_count);
        Ok(())
    }

    pub(crate) fn decode(reader: &mut SliceReader<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            message_count: reader.read_long()?,
        })
    }
}

/// Deletes a queue.
/// `<method name="delete" synchronous="1" index="40"/>`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Delete {
    /// `<field name="ticket" domain="access-ticket"/>` — deprecated, 0
    pub ticket: u16,

    /// `<field name="queue" domain="queue-name"/>`
    pub queue: String,

    /// `<field name="if-unused" domain="bit"/>`
    pub if_unused: bool,

    /// `<field name="if-empty" domain="bit"/>`
    pub if_empty: bool,

    /// `<field name="no-wait" domain="no-wait"/>`
    pub nowait: bool,
}

impl Delete {
    pub(crate) fn encode(&self, dst: &mut BytesMut) -> Result<(), EncodeError> {
        dst.put_u16(self.ticket);
        dst.put_shortstr(&self.queue)?;
        let bits = self.if_unused as u8 | (self.if_empty as u8) << 1 | (self.nowait as u8) << 2;
        dst.put_u8(bits);
        Ok(())
    }

    pub(crate) fn decode(reader: &mut SliceReader<'_>) -> Result<Self, DecodeError> {
        let ticket = reader.read_short()?;
        let queue = reader.read_shortstr()?;
        let bits = reader.read_octet()?;
        Ok(Self {
            ticket,
            queue,
            if_unused: bits & 1 != 0,
            if_empty: bits & (1 << 1) != 0,
            nowait: bits & (1 << 2) != 0,
        })
    }
}

/// Reports the number of deleted messages.
/// `<method name="delete-ok" synchronous="1" index="41"/>`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeleteOk {
    /// `<field name="message-count" domain="message-count"/>`
    pub message_count: u32,
}

impl DeleteOk {
    pub(crate) fn encode(&self, dst: &mut BytesMut) -> Result<(), EncodeError> {
        dst.put_u32(self.message_count);
        Ok(())
    }

    pub(crate) fn decode(reader: &mut SliceReader<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            message_count: reader.read_long()?,
        })
    }
}

/// Removes a queue binding.
/// `<method name="unbind" synchronous="1" index="50"/>`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Unbind {
    /// `<field name="ticket" domain="access-ticket"/>` — deprecated, 0
    pub ticket: u16,

    /// `<field name="queue" domain="queue-name"/>`
    pub queue: String,

    /// `<field name="exchange" domain="exchange-name"/>`
    pub exchange: String,

    /// `<field name="routing-key" domain="shortstr"/>`
    pub routing_key: String,

    /// `<field name="arguments" domain="table"/>`
    pub arguments: FieldTable,
}

impl Unbind {
    pub(crate) fn encode(&self, dst: &mut BytesMut) -> Result<(), EncodeError> {
        dst.put_u16(self.ticket);
        dst.put_shortstr(&self.queue)?;
        dst.put_shortstr(&self.exchange)?;
        dst.put_shortstr(&self.routing_key)?;
        self.arguments.encode(dst)
    }

    pub(crate) fn decode(reader: &mut SliceReader<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            ticket: reader.read_short()?,
            queue: reader.read_shortstr()?,
            exchange: reader.read_shortstr()?,
            routing_key: reader.read_shortstr()?,
            arguments: FieldTable::decode(reader)?,
        })
    }
}

/// Confirms removal of a queue binding.
/// `<method name="unbind-ok" synchronous="1" index="51"/>`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UnbindOk;

impl UnbindOk {
    pub(crate) fn encode(&self, _dst: &mut BytesMut) -> Result<(), EncodeError> {
        Ok(())
    }

    pub(crate) fn decode(_reader: &mut SliceReader<'_>) -> Result<Self, DecodeError> {
        Ok(Self)
    }
}
