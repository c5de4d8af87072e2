//! Methods of the Connection class (class id 10)
//!
//! These only ever travel on channel 0 and drive the handshake, tuning, and
//! shutdown of a connection.

use bytes::{BufMut, Bytes, BytesMut};

use crate::definitions::{MAJOR, MINOR};
use crate::error::{DecodeError, EncodeError};
use crate::field_table::FieldTable;
use crate::read::SliceReader;
use crate::write::BufMutExt;

/// Class id of the Connection class
pub const CLASS_ID: u16 = 10;

/// Opens the handshake after the protocol header exchange.
/// `<method name="start" synchronous="1" index="10"/>`
#[derive(Debug, Clone, PartialEq)]
pub struct Start {
    /// `<field name="version-major" domain="octet"/>`
    pub version_major: u8,

    /// `<field name="version-minor" domain="octet"/>`
    pub version_minor: u8,

    /// `<field name="server-properties" domain="peer-properties"/>`
    pub server_properties: FieldTable,

    /// `<field name="mechanisms" domain="longstr"/>` — space-separated names
    pub mechanisms: Bytes,

    /// `<field name="locales" domain="longstr"/>`
    pub locales: Bytes,
}

impl Default for Start {
    fn default() -> Self {
        Self {
            version_major: MAJOR,
            version_minor: MINOR,
            server_properties: FieldTable::new(),
            mechanisms: Bytes::from_static(b"PLAIN"),
            locales: Bytes::from_static(b"en_US"),
        }
    }
}

impl Start {
    pub(crate) fn encode(&self, dst: &mut BytesMut) -> Result<(), EncodeError> {
        dst.put_u8(self.version_major);
        dst.put_u8(self.version_minor);
        self.server_properties.encode(dst)?;
        dst.put_longstr(&self.mechanisms);
        dst.put_longstr(&self.locales);
        Ok(())
    }

    pub(crate) fn decode(reader: &mut SliceReader<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            version_major: reader.read_octet()?,
            version_minor: reader.read_octet()?,
            server_properties: FieldTable::decode(reader)?,
            mechanisms: reader.read_longstr()?,
            locales: reader.read_longstr()?,
        })
    }
}

/// Selects a security mechanism and locale.
/// `<method name="start-ok" synchronous="1" index="11"/>`
#[derive(Debug, Clone, PartialEq)]
pub struct StartOk {
    /// `<field name="client-properties" domain="peer-properties"/>`
    pub client_properties: FieldTable,

    /// `<field name="mechanism" domain="shortstr"/>`
    pub mechanism: String,

    /// `<field name="response" domain="longstr"/>` — opaque security blob
    pub response: Bytes,

    /// `<field name="locale" domain="shortstr"/>`
    pub locale: String,
}

impl StartOk {
    pub(crate) fn encode(&self, dst: &mut BytesMut) -> Result<(), EncodeError> {
        self.client_properties.encode(dst)?;
        dst.put_shortstr(&self.mechanism)?;
        dst.put_longstr(&self.response);
        dst.put_shortstr(&self.locale)?;
        Ok(())
    }

    pub(crate) fn decode(reader: &mut SliceReader<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            client_properties: FieldTable::decode(reader)?,
            mechanism: reader.read_shortstr()?,
            response: reader.read_longstr()?,
            locale: reader.read_shortstr()?,
        })
    }
}

/// A further security challenge from the server.
/// `<method name="secure" synchronous="1" index="20"/>`
#[derive(Debug, Clone, PartialEq)]
pub struct Secure {
    /// `<field name="challenge" domain="longstr"/>`
    pub challenge: Bytes,
}

impl Secure {
    pub(crate) fn encode(&self, dst: &mut BytesMut) -> Result<(), EncodeError> {
        dst.put_longstr(&self.challenge);
        Ok(())
    }

    pub(crate) fn decode(reader: &mut SliceReader<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            challenge: reader.read_longstr()?,
        })
    }
}

/// The response to a security challenge.
/// `<method name="secure-ok" synchronous="1" index="21"/>`
#[derive(Debug, Clone, PartialEq)]
pub struct SecureOk {
    /// `<field name="response" domain="longstr"/>`
    pub response: Bytes,
}

impl SecureOk {
    pub(crate) fn encode(&self, dst: &mut BytesMut) -> Result<(), EncodeError> {
        dst.put_longstr(&self.response);
        Ok(())
    }

    pub(crate) fn decode(reader: &mut SliceReader<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            response: reader.read_longstr()?,
        })
    }
}

/// Proposes connection limits. Zero means "no preference".
/// `<method name="tune" synchronous="1" index="30"/>`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tune {
    /// `<field name="channel-max" domain="short"/>`
    pub channel_max: u16,

    /// `<field name="frame-max" domain="long"/>`
    pub frame_max: u32,

    /// `<field name="heartbeat" domain="short"/>` — seconds
    pub heartbeat: u16,
}

impl Tune {
    pub(crate) fn encode(&self, dst: &mut BytesMut) -> Result<(), EncodeError> {
        dst.put_u16(self.channel_max);
        dst.put_u32(self.frame_max);
        dst.put_u16(self.heartbeat);
        Ok(())
    }

    pub(crate) fn decode(reader: &mut SliceReader<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            channel_max: reader.read_short()?,
            frame_max: reader.read_long()?,
            heartbeat: reader.read_short()?,
        })
    }
}

/// Confirms the limits both peers will honor.
/// `<method name="tune-ok" synchronous="1" index="31"/>`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TuneOk {
    /// `<field name="channel-max" domain="short"/>`
    pub channel_max: u16,

    /// `<field name="frame-max" domain="long"/>`
    pub frame_max: u32,

    /// `<field name="heartbeat" domain="short"/>` — seconds
    pub heartbeat: u16,
}

impl TuneOk {
    pub(crate) fn encode(&self, dst: &mut BytesMut) -> Result<(), EncodeError> {
        dst.put_u16(self.channel_max);
        dst.put_u32(self.frame_max);
        dst.put_u16(self.heartbeat);
        Ok(())
    }

    pub(crate) fn decode(reader: &mut SliceReader<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            channel_max: reader.read_short()?,
            frame_max: reader.read_long()?,
            heartbeat: reader.read_short()?,
        })
    }
}

/// Opens a connection to a virtual host.
/// `<method name="open" synchronous="1" index="40"/>`
#[derive(Debug, Clone, PartialEq)]
pub struct Open {
    /// `<field name="virtual-host" domain="path"/>`
    pub virtual_host: String,

    /// `<field name="capabilities" domain="shortstr"/>` — deprecated, empty
    pub capabilities: String,

    /// `<field name="insist" domain="bit"/>` — deprecated
    pub insist: bool,
}

impl Default for Open {
    fn default() -> Self {
        Self {
            virtual_host: String::from("/"),
            capabilities: String::new(),
            insist: true,
        }
    }
}

impl Open {
    pub(crate) fn encode(&self, dst: &mut BytesMut) -> Result<(), EncodeError> {
        dst.put_shortstr(&self.virtual_host)?;
        dst.put_shortstr(&self.capabilities)?;
        dst.put_u8(self.insist as u8);
        Ok(())
    }

    pub(crate) fn decode(reader: &mut SliceReader<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            virtual_host: reader.read_shortstr()?,
            capabilities: reader.read_shortstr()?,
            insist: reader.read_octet()? & 1 != 0,
        })
    }
}

/// Confirms the virtual host is open.
/// `<method name="open-ok" synchronous="1" index="41"/>`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OpenOk {
    /// `<field name="known-hosts" domain="known-hosts"/>` — deprecated
    pub known_hosts: String,
}

impl OpenOk {
    pub(crate) fn encode(&self, dst: &mut BytesMut) -> Result<(), EncodeError> {
        dst.put_shortstr(&self.known_hosts)?;
        Ok(())
    }

    pub(crate) fn decode(reader: &mut SliceReader<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            known_hosts: reader.read_shortstr()?,
        })
    }
}

/// Requests an orderly connection shutdown.
/// `<method name="close" synchronous="1" index="50"/>`
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

/// Confirms a connection shutdown.
/// `<method name="close-ok" synchronous="1" index="51"/>`
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

#[cfg(test)]
mod tests {
    use bytes::BytesMut;

    use super::{Start, StartOk, Tune};
    use crate::field_table::FieldTable;
    use crate::read::SliceReader;

    #[test]
    fn test_start_roundtrip() {
        let mut server_properties = FieldTable::new();
        server_properties.insert("product", "RabbitMQ");
        let start = Start {
            server_properties,
            ..Default::default()
        };
        let mut buf = BytesMut::new();
        start.encode(&mut buf).unwrap();
        let decoded = Start::decode(&mut SliceReader::new(&buf)).unwrap();
        assert_eq!(decoded, start);
    }

    #[test]
    fn test_start_ok_credentials_blob_is_binary() {
        let start_ok = StartOk {
            client_properties: FieldTable::new(),
            mechanism: "PLAIN".into(),
            response: bytes::Bytes::from_static(b"\0guest\0guest"),
            locale: "en_US".into(),
        };
        let mut buf = BytesMut::new();
        start_ok.encode(&mut buf).unwrap();
        let decoded = StartOk::decode(&mut SliceReader::new(&buf)).unwrap();
        assert_eq!(decoded.response, start_ok.response);
    }

    #[test]
    fn test_tune_layout() {
        let tune = Tune {
            channel_max: 0,
            frame_max: 131072,
            heartbeat: 60,
        };
        let mut buf = BytesMut::new();
        tune.encode(&mut buf).unwrap();
        assert_eq!(&buf[..], &[0, 0, 0, 2, 0, 0, 0, 60]);
    }
}
