//! Methods of the Exchange class (class id 40)

use bytes::{BufMut, BytesMut};

use crate::error::{DecodeError, EncodeError};
use crate::field_table::FieldTable;
use crate::read::SliceReader;
use crate::write::BufMutExt;

/// Class id of the Exchange class
pub const CLASS_ID: u16 = 40;

/// Creates an exchange or verifies an existing one.
/// `<method name="declare" synchronous="1" index="10"/>`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Declare {
    /// `<field name="ticket" domain="access-ticket"/>` — deprecated, 0
    pub ticket: u16,

    /// `<field name="exchange" domain="exchange-name"/>`
    pub exchange: String,

    /// `<field name="type" domain="shortstr"/>` — direct, fanout, topic, headers
    pub kind: String,

    /// `<field name="passive" domain="bit"/>`
    pub passive: bool,

    /// `<field name="durable" domain="bit"/>`
    pub durable: bool,

    /// `<field name="auto-delete" domain="bit"/>`
    pub auto_delete: bool,

    /// `<field name="internal" domain="bit"/>`
    pub internal: bool,

    /// `<field name="no-wait" domain="no-wait"/>`
    pub nowait: bool,

    /// `<field name="arguments" domain="table"/>`
    pub arguments: FieldTable,
}

impl Declare {
    pub(crate) fn encode(&self, dst: &mut BytesMut) -> Result<(), EncodeError> {
        dst.put_u16(self.ticket);
        dst.put_shortstr(&self.exchange)?;
        dst.put_shortstr(&self.kind)?;
        let mut bits = 0u8;
        bits |= self.passive as u8;
        bits |= (self.durable as u8) << 1;
        bits |= (self.auto_delete as u8) << 2;
        bits |= (self.internal as u8) << 3;
        bits |= (self.nowait as u8) << 4;
        dst.put_u8(bits);
        self.arguments.encode(dst)
    }

    pub(crate) fn decode(reader: &mut SliceReader<'_>) -> Result<Self, DecodeError> {
        let ticket = reader.read_short()?;
        let exchange = reader.read_shortstr()?;
        let kind = reader.read_shortstr()?;
        let bits = reader.read_octet()?;
        Ok(Self {
            ticket,
            exchange,
            kind,
            passive: bits & 1 != 0,
            durable: bits & (1 << 1) != 0,
            auto_delete: bits & (1 << 2) != 0,
            internal: bits & (1 << 3) != 0,
            nowait: bits & (1 << 4) != 0,
            arguments: FieldTable::decode(reader)?,
        })
    }
}

/// Confirms an exchange declaration.
/// `<method name="declare-ok" synchronous="1" index="11"/>`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeclareOk;

impl DeclareOk {
    pub(crate) fn encode(&self, _dst: &mut BytesMut) -> Result<(), EncodeError> {
        Ok(())
    }

    pub(crate) fn decode(_reader: &mut SliceReader<'_>) -> Result<Self, DecodeError> {
        Ok(Self)
    }
}

/// Deletes an exchange.
/// `<method name="delete" synchronous="1" index="20"/>`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Delete {
    /// `<field name="ticket" domain="access-ticket"/>` — deprecated, 0
    pub ticket: u16,

    /// `<field name="exchange" domain="exchange-name"/>`
    pub exchange: String,

    /// `<field name="if-unused" domain="bit"/>`
    pub if_unused: bool,

    /// `<field name="no-wait" domain="no-wait"/>`
    pub nowait: bool,
}

impl Delete {
    pub(crate) fn encode(&self, dst: &mut BytesMut) -> Result<(), EncodeError> {
        dst.put_u16(self.ticket);
        dst.put_shortstr(&self.exchange)?;
        let bits = self.if_unused as u8 | (self.nowait as u8) << 1;
        dst.put_u8(bits);
        Ok(())
    }

    pub(crate) fn decode(reader: &mut SliceReader<'_>) -> Result<Self, DecodeError> {
        let ticket = reader.read_short()?;
        let exchange = reader.read_shortstr()?;
        let bits = reader.read_octet()?;
        Ok(Self {
            ticket,
            exchange,
            if_unused: bits & 1 != 0,
            nowait: bits & (1 << 1) != 0,
        })
    }
}

/// Confirms an exchange deletion.
/// `<method name="delete-ok" synchronous="1" index="21"/>`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeleteOk;

impl DeleteOk {
    pub(crate) fn encode(&self, _dst: &mut BytesMut) -> Result<(), EncodeError> {
        Ok(())
    }

    pub(crate) fn decode(_reader: &mut SliceReader<'_>) -> Result<Self, DecodeError> {
        Ok(Self)
    }
}

/// Binds an exchange to another exchange.
/// `<method name="bind" synchronous="1" index="30"/>`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bind {
    /// `<field name="ticket" domain="access-ticket"/>` — deprecated, 0
    pub ticket: u16,

    /// `<field name="destination" domain="exchange-name"/>`
    pub destination: String,

    /// `<field name="source" domain="exchange-name"/>`
    pub source: String,

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
        dst.put_shortstr(&self.destination)?;
        dst.put_shortstr(&self.source)?;
        dst.put_shortstr(&self.routing_key)?;
        dst.put_u8(self.nowait as u8);
        self.arguments.encode(dst)
    }

    pub(crate) fn decode(reader: &mut SliceReader<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            ticket: reader.read_short()?,
            destination: reader.read_shortstr()?,
            source: reader.read_shortstr()?,
            routing_key: reader.read_shortstr()?,
            nowait: reader.read_octet()? & 1 != 0,
            arguments: FieldTable::decode(reader)?,
        })
    }
}

/// Confirms an exchange-to-exchange binding.
/// `<method name="bind-ok" synchronous="1" index="31"/>`
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

/// Removes an exchange-to-exchange binding.
/// `<method name="unbind" synchronous="1" index="40"/>`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Unbind {
    /// `<field name="ticket" domain="access-ticket"/>` — deprecated, 0
    pub ticket: u16,

    /// `<field name="destination" domain="exchange-name"/>`
    pub destination: String,

    /// `<field name="source" domain="exchange-name"/>`
    pub source: String,

    /// `<field name="routing-key" domain="shortstr"/>`
    pub routing_key: String,

    /// `<field name="no-wait" domain="no-wait"/>`
    pub nowait: bool,

    /// `<field name="arguments" domain="table"/>`
    pub arguments: FieldTable,
}

impl Unbind {
    pub(crate) fn encode(&self, dst: &mut BytesMut) -> Result<(), EncodeError> {
        dst.put_u16(self.ticket);
        dst.put_shortstr(&self.destination)?;
        dst.put_shortstr(&self.source)?;
        dst.put_shortstr(&self.routing_key)?;
        dst.put_u8(self.nowait as u8);
        self.arguments.encode(dst)
    }

    pub(crate) fn decode(reader: &mut SliceReader<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            ticket: reader.read_short()?,
            destination: reader.read_shortstr()?,
            source: reader.read_shortstr()?,
            routing_key: reader.read_shortstr()?,
            nowait: reader.read_octet()? & 1 != 0,
            arguments: FieldTable::decode(reader)?,
        })
    }
}

/// Confirms removal of an exchange-to-exchange binding.
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
