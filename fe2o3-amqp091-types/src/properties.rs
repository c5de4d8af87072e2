//! Content-header payload and the Basic properties block
//!
//! A content-bearing method is followed on the wire by exactly one content
//! header carrying the body size and a properties block, then by zero or
//! more body frames. Property presence is driven by a 16-bit flags word;
//! present fields follow in declared order.

use bytes::{BufMut, BytesMut};

use crate::error::{DecodeError, EncodeError};
use crate::field_table::{FieldTable, Timestamp};
use crate::methods::basic;
use crate::read::SliceReader;
use crate::write::BufMutExt;

const FLAG_CONTENT_TYPE: u16 = 1 << 15;
const FLAG_CONTENT_ENCODING: u16 = 1 << 14;
const FLAG_HEADERS: u16 = 1 << 13;
const FLAG_DELIVERY_MODE: u16 = 1 << 12;
const FLAG_PRIORITY: u16 = 1 << 11;
const FLAG_CORRELATION_ID: u16 = 1 << 10;
const FLAG_REPLY_TO: u16 = 1 << 9;
const FLAG_EXPIRATION: u16 = 1 << 8;
const FLAG_MESSAGE_ID: u16 = 1 << 7;
const FLAG_TIMESTAMP: u16 = 1 << 6;
const FLAG_MESSAGE_TYPE: u16 = 1 << 5;
const FLAG_USER_ID: u16 = 1 << 4;
const FLAG_APP_ID: u16 = 1 << 3;
const FLAG_CLUSTER_ID: u16 = 1 << 2;

/// The optional properties of a Basic message
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BasicProperties {
    /// MIME content type
    pub content_type: Option<String>,

    /// MIME content encoding
    pub content_encoding: Option<String>,

    /// Application headers
    pub headers: Option<FieldTable>,

    /// 1 = non-persistent, 2 = persistent
    pub delivery_mode: Option<u8>,

    /// Priority, 0 to 9
    pub priority: Option<u8>,

    /// Application correlation identifier
    pub correlation_id: Option<String>,

    /// Address to reply to
    pub reply_to: Option<String>,

    /// Message expiration specification
    pub expiration: Option<String>,

    /// Application message identifier
    pub message_id: Option<String>,

    /// Message timestamp
    pub timestamp: Option<Timestamp>,

    /// Message type name (the grammar's `type` field)
    pub message_type: Option<String>,

    /// Creating user id
    pub user_id: Option<String>,

    /// Creating application id
    pub app_id: Option<String>,

    /// Intra-cluster routing identifier — deprecated
    pub cluster_id: Option<String>,
}

impl BasicProperties {
    fn flags(&self) -> u16 {
        let mut flags = 0;
        if self.content_type.is_some() {
            flags |= FLAG_CONTENT_TYPE;
        }
        if self.content_encoding.is_some() {
            flags |= FLAG_CONTENT_ENCODING;
        }
        if self.headers.is_some() {
            flags |= FLAG_HEADERS;
        }
        if self.delivery_mode.is_some() {
            flags |= FLAG_DELIVERY_MODE;
        }
        if self.priority.is_some() {
            flags |= FLAG_PRIORITY;
        }
        if self.correlation_id.is_some() {
            flags |= FLAG_CORRELATION_ID;
        }
        if self.reply_to.is_some() {
            flags |= FLAG_REPLY_TO;
        }
        if self.expiration.is_some() {
            flags |= FLAG_EXPIRATION;
        }
        if self.message_id.is_some() {
            flags |= FLAG_MESSAGE_ID;
        }
        if self.timestamp.is_some() {
            flags |= FLAG_TIMESTAMP;
        }
        if self.message_type.is_some() {
            flags |= FLAG_MESSAGE_TYPE;
        }
        if self.user_id.is_some() {
            flags |= FLAG_USER_ID;
        }
        if self.app_id.is_some() {
            flags |= FLAG_APP_ID;
        }
        if self.cluster_id.is_some() {
            flags |= FLAG_CLUSTER_ID;
        }
        flags
    }

    /// Encodes the flags word then every present field in declared order
    pub fn encode(&self, dst: &mut BytesMut) -> Result<(), EncodeError> {
        dst.put_u16(self.flags());
        if let Some(v) = &self.content_type {
            dst.put_shortstr(v)?;
        }
        if let Some(v) = &self.content_encoding {
            dst.put_shortstr(v)?;
        }
        if let Some(v) = &self.headers {
            v.encode(dst)?;
        }
        if let Some(v) = self.delivery_mode {
            dst.put_u8(v);
        }
        if let Some(v) = self.priority {
            dst.put_u8(v);
        }
        if let Some(v) = &self.correlation_id {
            dst.put_shortstr(v)?;
        }
        if let Some(v) = &self.reply_to {
            dst.put_shortstr(v)?;
        }
        if let Some(v) = &self.expiration {
            dst.put_shortstr(v)?;
        }
        if let Some(v) = &self.message_id {
            dst.put_shortstr(v)?;
        }
        if let Some(v) = self.timestamp {
            dst.put_u64(v.0);
        }
        if let Some(v) = &self.message_type {
            dst.put_shortstr(v)?;
        }
        if let Some(v) = &self.user_id {
            dst.put_shortstr(v)?;
        }
        if let Some(v) = &self.app_id {
            dst.put_shortstr(v)?;
        }
        if let Some(v) = &self.cluster_id {
            dst.put_shortstr(v)?;
        }
        Ok(())
    }

    /// Decodes the flags word then every flagged field
    pub fn decode(reader: &mut SliceReader<'_>) -> Result<Self, DecodeError> {
        let flags = reader.read_short()?;
        let mut properties = Self::default();
        if flags & FLAG_CONTENT_TYPE != 0 {
            properties.content_type = Some(reader.read_shortstr()?);
        }
        if flags & FLAG_CONTENT_ENCODING != 0 {
            properties.content_encoding = Some(reader.read_shortstr()?);
        }
        if flags & FLAG_HEADERS != 0 {
            properties.headers = Some(FieldTable::decode(reader)?);
        }
        if flags & FLAG_DELIVERY_MODE != 0 {
            properties.delivery_mode = Some(reader.read_octet()?);
        }
        if flags & FLAG_PRIORITY != 0 {
            properties.priority = Some(reader.read_octet()?);
        }
        if flags & FLAG_CORRELATION_ID != 0 {
            properties.correlation_id = Some(reader.read_shortstr()?);
        }
        if flags & FLAG_REPLY_TO != 0 {
            properties.reply_to = Some(reader.read_shortstr()?);
        }
        if flags & FLAG_EXPIRATION != 0 {
            properties.expiration = Some(reader.read_shortstr()?);
        }
        if flags & FLAG_MESSAGE_ID != 0 {
            properties.message_id = Some(reader.read_shortstr()?);
        }
        if flags & FLAG_TIMESTAMP != 0 {
            properties.timestamp = Some(Timestamp(reader.read_longlong()?));
        }
        if flags & FLAG_MESSAGE_TYPE != 0 {
            properties.message_type = Some(reader.read_shortstr()?);
        }
        if flags & FLAG_USER_ID != 0 {
            properties.user_id = Some(reader.read_shortstr()?);
        }
        if flags & FLAG_APP_ID != 0 {
            properties.app_id = Some(reader.read_shortstr()?);
        }
        if flags & FLAG_CLUSTER_ID != 0 {
            properties.cluster_id = Some(reader.read_shortstr()?);
        }
        Ok(properties)
    }
}

/// The payload of a content-header frame
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContentHeader {
    /// Class of the content-bearing method; only Basic carries content
    pub class_id: u16,

    /// Total size of the body that follows, possibly split across frames
    pub body_size: u64,

    /// The message properties block
    pub properties: BasicProperties,
}

impl ContentHeader {
    /// Creates a Basic content header
    pub fn new(body_size: u64, properties: BasicProperties) -> Self {
        Self {
            class_id: basic::CLASS_ID,
            body_size,
            properties,
        }
    }

    /// Encodes class id, weight (always 0), body size, and properties
    pub fn encode(&self, dst: &mut BytesMut) -> Result<(), EncodeError> {
        dst.put_u16(self.class_id);
        dst.put_u16(0); // weight, deprecated
        dst.put_u64(self.body_size);
        self.properties.encode(dst)
    }

    /// Decodes a content-header payload; the weight field is ignored
    pub fn decode(reader: &mut SliceReader<'_>) -> Result<Self, DecodeError> {
        let class_id = reader.read_short()?;
        let _weight = reader.read_short()?;
        let body_size = reader.read_longlong()?;
        if class_id != basic::CLASS_ID {
            return Err(DecodeError::UnknownMethod(class_id, 0));
        }
        let properties = BasicProperties::decode(reader)?;
        Ok(Self {
            class_id,
            body_size,
            properties,
        })
    }
}

#[cfg(test)]
mod tests {
    use bytes::BytesMut;

    use super::{BasicProperties, ContentHeader};
    use crate::field_table::{FieldTable, Timestamp};
    use crate::read::SliceReader;

    #[test]
    fn test_sparse_properties_roundtrip() {
        let mut headers = FieldTable::new();
        headers.insert("retry", 3i32);
        let properties = BasicProperties {
            content_type: Some("application/json".into()),
            delivery_mode: Some(2),
            headers: Some(headers),
            timestamp: Some(Timestamp(1_577_836_800)),
            ..Default::default()
        };
        let mut buf = BytesMut::new();
        properties.encode(&mut buf).unwrap();
        let decoded = BasicProperties::decode(&mut SliceReader::new(&buf)).unwrap();
        assert_eq!(decoded, properties);
    }

    #[test]
    fn test_empty_properties_is_zero_flags() {
        let properties = BasicProperties::default();
        let mut buf = BytesMut::new();
        properties.encode(&mut buf).unwrap();
        assert_eq!(&buf[..], &[0, 0]);
    }

    #[test]
    fn test_content_header_layout() {
        let header = ContentHeader::new(10_000, BasicProperties::default());
        let mut buf = BytesMut::new();
        header.encode(&mut buf).unwrap();
        // class 60, weight 0, size 10000, no flags
        assert_eq!(
            &buf[..],
            &[0, 60, 0, 0, 0, 0, 0, 0, 0, 0, 0x27, 0x10, 0, 0]
        );
        let decoded = ContentHeader::decode(&mut SliceReader::new(&buf)).unwrap();
        assert_eq!(decoded, header);
    }
}
