//! Methods of the Basic class (class id 60)
//!
//! `Publish`, `Deliver`, `GetOk`, and `Return` are content-bearing: a
//! content header and body frames follow them on the wire.

use bytes::{BufMut, BytesMut};

use crate::error::{DecodeError, EncodeError};
use crate::field_table::FieldTable;
use crate::read::SliceReader;
use crate::write::BufMutExt;

/// Class id of the Basic class
pub const CLASS_ID: u16 = 60;

/// Sets prefetch limits for a channel or the whole connection.
/// `<method name="qos" synchronous="1" index="10"/>`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Qos {
    /// `<field name="prefetch-size" domain="long"/>` — window in octets, 0 = none
    pub prefetch_size: u32,

    /// `<field name="prefetch-count" domain="short"/>` — window in messages
    pub prefetch_count: u16,

    /// `<field name="global" domain="bit"/>`
    pub global: bool,
}

impl Qos {
    pub(crate) fn encode(&self, dst: &mut BytesMut) -> Result<(), EncodeError> {
        dst.put_u32(self.prefetch_size);
        dst.put_u16(self.prefetch_count);
        dst.put_u8(self.global as u8);
        Ok(())
    }

    pub(crate) fn decode(reader: &mut SliceReader<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            prefetch_size: reader.read_long()?,
            prefetch_count: reader.read_short()?,
            global: reader.read_octet()? & 1 != 0,
        })
    }
}

/// Confirms the prefetch limits.
/// `<method name="qos-ok" synchronous="1" index="11"/>`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QosOk;

impl QosOk {
    pub(crate) fn encode(&self, _dst: &mut BytesMut) -> Result<(), EncodeError> {
        Ok(())
    }

    pub(crate) fn decode(_reader: &mut SliceReader<'_>) -> Result<Self, DecodeError> {
        Ok(Self)
    }
}

/// Starts a consumer on a queue.
/// `<method name="consume" synchronous="1" index="20"/>`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Consume {
    /// `<field name="ticket" domain="access-ticket"/>` — deprecated, 0
    pub ticket: u16,

    /// `<field name="queue" domain="queue-name"/>`
    pub queue: String,

    /// `<field name="consumer-tag" domain="consumer-tag"/>` — empty for a server tag
    pub consumer_tag: String,

    /// `<field name="no-local" domain="no-local"/>`
    pub no_local: bool,

    /// `<field name="no-ack" domain="no-ack"/>`
    pub no_ack: bool,

    /// `<field name="exclusive" domain="bit"/>`
    pub exclusive: bool,

    /// `<field name="no-wait" domain="no-wait"/>`
    pub nowait: bool,

    /// `<field name="arguments" domain="table"/>`
    pub arguments: FieldTable,
}

impl Consume {
    pub(crate) fn encode(&self, dst: &mut BytesMut) -> Result<(), EncodeError> {
        dst.put_u16(self.ticket);
        dst.put_shortstr(&self.queue)?;
        dst.put_shortstr(&self.consumer_tag)?;
        let mut bits = 0u8;
        bits |= self.no_local as u8;
        bits |= (self.no_ack as u8) << 1;
        bits |= (self.exclusive as u8) << 2;
        bits |= (self.nowait as u8) << 3;
        dst.put_u8(bits);
        self.arguments.encode(dst)
    }

    pub(crate) fn decode(reader: &mut SliceReader<'_>) -> Result<Self, DecodeError> {
        let ticket = reader.read_short()?;
        let queue = reader.read_shortstr()?;
        let consumer_tag = reader.read_shortstr()?;
        let bits = reader.read_octet()?;
        Ok(Self {
            ticket,
            queue,
            consumer_tag,
            no_local: bits & 1 != 0,
            no_ack: bits & (1 << 1) != 0,
            exclusive: bits & (1 << 2) != 0,
            nowait: bits & (1 << 3) != 0,
            arguments: FieldTable::decode(reader)?,
        })
    }
}

/// Confirms a consumer with its tag.
/// `<method name="consume-ok" synchronous="1" index="21"/>`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConsumeOk {
    /// `<field name="consumer-tag" domain="consumer-tag"/>`
    pub consumer_tag: String,
}

impl ConsumeOk {
    pub(crate) fn encode(&self, dst: &mut BytesMut) -> Result<(), EncodeError> {
        dst.put_shortstr(&self.consumer_tag)?;
        Ok(())
    }

    pub(crate) fn decode(reader: &mut SliceReader<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            consumer_tag: reader.read_shortstr()?,
        })
    }
}

/// Ends a consumer.
/// `<method name="cancel" synchronous="1" index="30"/>`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cancel {
    /// `<field name="consumer-tag" domain="consumer-tag"/>`
    pub consumer_tag: String,

    /// `<field name="no-wait" domain="no-wait"/>`
    pub nowait: bool,
}

impl Cancel {
    pub(crate) fn encode(&self, dst: &mut BytesMut) -> Result<(), EncodeError> {
        dst.put_shortstr(&self.consumer_tag)?;
        dst.put_u8(self.nowait as u8);
        Ok(())
    }

    pub(crate) fn decode(reader: &mut SliceReader<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            consumer_tag: reader.read_shortstr()?,
            nowait: reader.read_octet()? & 1 != 0,
        })
    }
}

/// Confirms a consumer cancellation.
/// `<method name="cancel-ok" synchronous="1" index="31"/>`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CancelOk {
    /// `<field name="consumer-tag" domain="consumer-tag"/>`
    pub consumer_tag: String,
}

impl CancelOk {
    pub(crate) fn encode(&self, dst: &mut BytesMut) -> Result<(), EncodeError> {
        dst.put_shortstr(&self.consumer_tag)?;
        Ok(())
    }

    pub(crate) fn decode(reader: &mut SliceReader<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            consumer_tag: reader.read_shortstr()?,
        })
    }
}

/// Publishes a message to an exchange. Content-bearing.
/// `<method name="publish" content="1" index="40"/>`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Publish {
    /// `<field name="ticket" domain="access-ticket"/>` — deprecated, 0
    pub ticket: u16,

    /// `<field name="exchange" domain="exchange-name"/>` — empty for the default
    pub exchange: String,

    /// `<field name="routing-key" domain="shortstr"/>`
    pub routing_key: String,

    /// `<field name="mandatory" domain="bit"/>`
    pub mandatory: bool,

    /// `<field name="immediate" domain="bit"/>`
    pub immediate: bool,
}

impl Publish {
    pub(crate) fn encode(&self, dst: &mut BytesMut) -> Result<(), EncodeError> {
        dst.put_u16(self.ticket);
        dst.put_shortstr(&self.exchange)?;
        dst.put_shortstr(&self.routing_key)?;
        let bits = self.mandatory as u8 | (self.immediate as u8) << 1;
        dst.put_u8(bits);
        Ok(())
    }

    pub(crate) fn decode(reader: &mut SliceReader<'_>) -> Result<Self, DecodeError> {
        let ticket = reader.read_short()?;
        let exchange = reader.read_shortstr()?;
        let routing_key = reader.read_shortstr()?;
        let bits = reader.read_octet()?;
        Ok(Self {
            ticket,
            exchange,
            routing_key,
            mandatory: bits & 1 != 0,
            immediate: bits & (1 << 1) != 0,
        })
    }
}

/// Returns an undeliverable message to the publisher. Content-bearing.
/// `<method name="return" content="1" index="50"/>`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Return {
    /// `<field name="reply-code" domain="reply-code"/>`
    pub reply_code: u16,

    /// `<field name="reply-text" domain="reply-text"/>`
    pub reply_text: String,

    /// `<field name="exchange" domain="exchange-name"/>`
    pub exchange: String,

    /// `<field name="routing-key" domain="shortstr"/>`
    pub routing_key: String,
}

impl Return {
    pub(crate) fn encode(&self, dst: &mut BytesMut) -> Result<(), EncodeError> {
        dst.put_u16(self.reply_code);
        dst.put_shortstr(&self.reply_text)?;
        dst.put_shortstr(&self.exchange)?;
        dst.put_shortstr(&self.routing_key)?;
        Ok(())
    }

    pub(crate) fn decode(reader: &mut SliceReader<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            reply_code: reader.read_short()?,
            reply_text: reader.read_shortstr()?,
            exchange: reader.read_shortstr()?,
            routing_key: reader.read_shortstr()?,
        })
    }
}

/// Delivers a message to a consumer. Content-bearing.
/// `<method name="deliver" content="1" index="60"/>`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Deliver {
    /// `<field name="consumer-tag" domain="consumer-tag"/>`
    pub consumer_tag: String,

    /// `<field name="delivery-tag" domain="delivery-tag"/>`
    pub delivery_tag: u64,

    /// `<field name="redelivered" domain="redelivered"/>`
    pub redelivered: bool,

    /// `<field name="exchange" domain="exchange-name"/>`
    pub exchange: String,

    /// `<field name="routing-key" domain="shortstr"/>`
    pub routing_key: String,
}

impl Deliver {
    pub(crate) fn encode(&self, dst: &mut BytesMut) -> Result<(), EncodeError> {
        dst.put_shortstr(&self.consumer_tag)?;
        dst.put_u64(self.delivery_tag);
        dst.put_u8(self.redelivered as u8);
        dst.put_shortstr(&self.exchange)?;
        dst.put_shortstr(&self.routing_key)?;
        Ok(())
    }

    pub(crate) fn decode(reader: &mut SliceReader<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            consumer_tag: reader.read_shortstr()?,
            delivery_tag: reader.read_longlong()?,
            redelivered: reader.read_octet()? & 1 != 0,
            exchange: reader.read_shortstr()?,
            routing_key: reader.read_shortstr()?,
        })
    }
}

/// Synchronously fetches one message.
/// `<method name="get" synchronous="1" index="70"/>`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Get {
    /// `<field name="ticket" domain="access-ticket"/>` — deprecated, 0
    pub ticket: u16,

    /// `<field name="queue" domain="queue-name"/>`
    pub queue: String,

    /// `<field name="no-ack" domain="no-ack"/>`
    pub no_ack: bool,
}

impl Get {
    pub(crate) fn encode(&self, dst: &mut BytesMut) -> Result<(), EncodeError> {
        dst.put_u16(self.ticket);
        dst.put_shortstr(&self.queue)?;
        dst.put_u8(self.no_ack as u8);
        Ok(())
    }

    pub(crate) fn decode(reader: &mut SliceReader<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            ticket: reader.read_short()?,
            queue: reader.read_shortstr()?,
            no_ack: reader.read_octet()? & 1 != 0,
        })
    }
}

/// Hands over one fetched message. Content-bearing.
/// `<method name="get-ok" synchronous="1" content="1" index="71"/>`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GetOk {
    /// `<field name="delivery-tag" domain="delivery-tag"/>`
    pub delivery_tag: u64,

    /// `<field name="redelivered" domain="redelivered"/>`
    pub redelivered: bool,

    /// `<field name="exchange" domain="exchange-name"/>`
    pub exchange: String,

    /// `<field name="routing-key" domain="shortstr"/>`
    pub routing_key: String,

    /// `<field name="message-count" domain="message-count"/>`
    pub message_count: u32,
}

impl GetOk {
    pub(crate) fn encode(&self, dst: &mut BytesMut) -> Result<(), EncodeError> {
        dst.put_u64(self.delivery_tag);
        dst.put_u8(self.redelivered as u8);
        dst.put_shortstr(&self.exchange)?;
        dst.put_shortstr(&self.routing_key)?;
        dst.put_u32(self.message_count);
        Ok(())
    }

    pub(crate) fn decode(reader: &mut SliceReader<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            delivery_tag: reader.read_longlong()?,
            redelivered: reader.read_octet()? & 1 != 0,
            exchange: reader.read_shortstr()?,
            routing_key: reader.read_shortstr()?,
            message_count: reader.read_long()?,
        })
    }
}

/// Reports an empty queue in response to a get.
/// `<method name="get-empty" synchronous="1" index="72"/>`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GetEmpty {
    /// `<field name="cluster-id" domain="shortstr"/>` — deprecated, empty
    pub cluster_id: String,
}

impl GetEmpty {
    pub(crate) fn encode(&self, dst: &mut BytesMut) -> Result<(), EncodeError> {
        dst.put_shortstr(&self.cluster_id)?;
        Ok(())
    }

    pub(crate) fn decode(reader: &mut SliceReader<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            cluster_id: reader.read_shortstr()?,
        })
    }
}

/// Acknowledges one or more deliveries.
/// `<method name="ack" index="80"/>`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Ack {
    /// `<field name="delivery-tag" domain="delivery-tag"/>`
    pub delivery_tag: u64,

    /// `<field name="multiple" domain="bit"/>`
    pub multiple: bool,
}

impl Ack {
    pub(crate) fn encode(&self, dst: &mut BytesMut) -> Result<(), EncodeError> {
        dst.put_u64(self.delivery_tag);
        dst.put_u8(self.multiple as u8);
        Ok(())
    }

    pub(crate) fn decode(reader: &mut SliceReader<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            delivery_tag: reader.read_longlong()?,
            multiple: reader.read_octet()? & 1 != 0,
        })
    }
}

/// Rejects a single delivery.
/// `<method name="reject" index="90"/>`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Reject {
    /// `<field name="delivery-tag" domain="delivery-tag"/>`
    pub delivery_tag: u64,

    /// `<field name="requeue" domain="bit"/>`
    pub requeue: bool,
}

impl Reject {
    pub(crate) fn encode(&self, dst: &mut BytesMut) -> Result<(), EncodeError> {
        dst.put_u64(self.delivery_tag);
        dst.put_u8(self.requeue as u8);
        Ok(())
    }

    pub(crate) fn decode(reader: &mut SliceReader<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            delivery_tag: reader.read_longlong()?,
            requeue: reader.read_octet()? & 1 != 0,
        })
    }
}

/// Redelivers unacknowledged messages without confirmation. Deprecated.
/// `<method name="recover-async" index="100"/>`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecoverAsync {
    /// `<field name="requeue" domain="bit"/>`
    pub requeue: bool,
}

impl RecoverAsync {
    pub(crate) fn encode(&self, dst: &mut BytesMut) -> Result<(), EncodeError> {
        dst.put_u8(self.requeue as u8);
        Ok(())
    }

    pub(crate) fn decode(reader: &mut SliceReader<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            requeue: reader.read_octet()? & 1 != 0,
        })
    }
}

/// Redelivers unacknowledged messages.
/// `<method name="recover" synchronous="1" index="110"/>`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Recover {
    /// `<field name="requeue" domain="bit"/>`
    pub requeue: bool,
}

impl Recover {
    pub(crate) fn encode(&self, dst: &mut BytesMut) -> Result<(), EncodeError> {
        dst.put_u8(self.requeue as u8);
        Ok(())
    }

    pub(crate) fn decode(reader: &mut SliceReader<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            requeue: reader.read_octet()? & 1 != 0,
        })
    }
}

/// Confirms a recover.
/// `<method name="recover-ok" synchronous="1" index="111"/>`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecoverOk;

impl RecoverOk {
    pub(crate) fn encode(&self, _dst: &mut BytesMut) -> Result<(), EncodeError> {
        Ok(())
    }

    pub(crate) fn decode(_reader: &mut SliceReader<'_>) -> Result<Self, DecodeError> {
        Ok(Self)
    }
}

/// Negatively acknowledges one or more deliveries. RabbitMQ extension.
/// `<method name="nack" index="120"/>`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Nack {
    /// `<field name="delivery-tag" domain="delivery-tag"/>`
    pub delivery_tag: u64,

    /// `<field name="multiple" domain="bit"/>`
    pub multiple: bool,

    /// `<field name="requeue" domain="bit"/>`
    pub requeue: bool,
}

impl Nack {
    pub(crate) fn encode(&self, dst: &mut BytesMut) -> Result<(), EncodeError> {
        dst.put_u64(self.delivery_tag);
        let bits = self.multiple as u8 | (self.requeue as u8) << 1;
        dst.put_u8(bits);
        Ok(())
    }

    pub(crate) fn decode(reader: &mut SliceReader<'_>) -> Result<Self, DecodeError> {
        let delivery_tag = reader.read_longlong()?;
        let bits = reader.read_octet()?;
        Ok(Self {
            delivery_tag,
            multiple: bits & 1 != 0,
            requeue: bits & (1 << 1) != 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use bytes::BytesMut;

    use super::{Deliver, Nack, Publish};
    use crate::read::SliceReader;

    #[test]
    fn test_publish_roundtrip() {
        let publish = Publish {
            exchange: "logs".into(),
            routing_key: "info".into(),
            mandatory: true,
            ..Default::default()
        };
        let mut buf = BytesMut::new();
        publish.encode(&mut buf).unwrap();
        let decoded = Publish::decode(&mut SliceReader::new(&buf)).unwrap();
        assert_eq!(decoded, publish);
    }

    #[test]
    fn test_deliver_roundtrip() {
        let deliver = Deliver {
            consumer_tag: "ctag-1".into(),
            delivery_tag: 7,
            redelivered: true,
            exchange: "logs".into(),
            routing_key: "info".into(),
        };
        let mut buf = BytesMut::new();
        deliver.encode(&mut buf).unwrap();
        let decoded = Deliver::decode(&mut SliceReader::new(&buf)).unwrap();
        assert_eq!(decoded, deliver);
    }

    #[test]
    fn test_nack_bit_pair() {
        let nack = Nack {
            delivery_tag: 1,
            multiple: false,
            requeue: true,
        };
        let mut buf = BytesMut::new();
        nack.encode(&mut buf).unwrap();
        assert_eq!(buf[8], 0b10);
    }
}
