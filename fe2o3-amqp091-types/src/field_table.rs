//! The recursive field-table value type
//!
//! Field tables carry `client-properties`, `server-properties`, and the
//! argument maps of queue/exchange operations. A table is framed as a u32
//! byte length followed by `keylen|key|tag|value` records; values are tagged
//! with a single ASCII letter.

use bytes::{BufMut, Bytes, BytesMut};
use indexmap::IndexMap;
use ordered_float::OrderedFloat;

use crate::error::{DecodeError, EncodeError};
use crate::read::SliceReader;
use crate::write::BufMutExt;

/// POSIX timestamp in whole seconds, UTC
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(pub u64);

/// Fixed-point decimal; the value is `mantissa * 10^-scale`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Decimal {
    /// Unsigned number of decimal digits after the point
    pub scale: u8,
    /// Unsigned raw value before scaling
    pub mantissa: u32,
}

/// A single tagged value in a field table
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// `t`: boolean
    Boolean(bool),
    /// `b`: signed 8-bit integer
    ShortShortInt(i8),
    /// `B`: unsigned 8-bit integer
    ShortShortUint(u8),
    /// `U`: signed 16-bit integer
    ShortInt(i16),
    /// `u`: unsigned 16-bit integer
    ShortUint(u16),
    /// `I`: signed 32-bit integer
    LongInt(i32),
    /// `L`: signed 64-bit integer
    LongLongInt(i64),
    /// `l`: unsigned 64-bit integer
    LongLongUint(u64),
    /// `f`: IEEE 754 single
    Float(OrderedFloat<f32>),
    /// `d`: IEEE 754 double
    Double(OrderedFloat<f64>),
    /// `D`: fixed-point decimal
    Decimal(Decimal),
    /// `S`: long string; may hold arbitrary binary
    LongString(Bytes),
    /// `T`: POSIX timestamp in seconds
    Timestamp(Timestamp),
    /// `F`: nested table
    Table(FieldTable),
    /// `A`: array of tagged values
    Array(Vec<FieldValue>),
    /// `x`: byte array
    ByteArray(Bytes),
    /// `V`: no value
    Void,
}

impl FieldValue {
    fn tag(&self) -> u8 {
        match self {
            FieldValue::Boolean(_) => b't',
            FieldValue::ShortShortInt(_) => b'b',
            FieldValue::ShortShortUint(_) => b'B',
            FieldValue::ShortInt(_) => b'U',
            FieldValue::ShortUint(_) => b'u',
            FieldValue::LongInt(_) => b'I',
            FieldValue::LongLongInt(_) => b'L',
            FieldValue::LongLongUint(_) => b'l',
            FieldValue::Float(_) => b'f',
            FieldValue::Double(_) => b'd',
            FieldValue::Decimal(_) => b'D',
            FieldValue::LongString(_) => b'S',
            FieldValue::Timestamp(_) => b'T',
            FieldValue::Table(_) => b'F',
            FieldValue::Array(_) => b'A',
            FieldValue::ByteArray(_) => b'x',
            FieldValue::Void => b'V',
        }
    }

    /// Encodes the tag octet followed by the value data
    pub fn encode(&self, dst: &mut BytesMut) -> Result<(), EncodeError> {
        dst.put_u8(self.tag());
        match self {
            FieldValue::Boolean(v) => dst.put_u8(*v as u8),
            FieldValue::ShortShortInt(v) => dst.put_i8(*v),
            FieldValue::ShortShortUint(v) => dst.put_u8(*v),
            FieldValue::ShortInt(v) => dst.put_i16(*v),
            FieldValue::ShortUint(v) => dst.put_u16(*v),
            FieldValue::LongInt(v) => dst.put_i32(*v),
            FieldValue::LongLongInt(v) => dst.put_i64(*v),
            FieldValue::LongLongUint(v) => dst.put_u64(*v),
            FieldValue::Float(v) => dst.put_f32(v.into_inner()),
            FieldValue::Double(v) => dst.put_f64(v.into_inner()),
            FieldValue::Decimal(v) => {
                dst.put_u8(v.scale);
                dst.put_u32(v.mantissa);
            }
            FieldValue::LongString(v) => dst.put_longstr(v),
            FieldValue::Timestamp(v) => dst.put_u64(v.0),
            FieldValue::Table(v) => v.encode(dst)?,
            FieldValue::Array(values) => {
                let mut inner = BytesMut::new();
                for value in values {
                    value.encode(&mut inner)?;
                }
                dst.put_u32(inner.len() as u32);
                dst.extend_from_slice(&inner);
            }
            FieldValue::ByteArray(v) => dst.put_longstr(v),
            FieldValue::Void => {}
        }
        Ok(())
    }

    /// Decodes a tag octet and the value data that follows it
    pub fn decode(reader: &mut SliceReader<'_>) -> Result<Self, DecodeError> {
        let tag = reader.read_octet()?;
        let value = match tag {
            b't' => FieldValue::Boolean(reader.read_octet()? != 0),
            b'b' => FieldValue::ShortShortInt(reader.read_signed_octet()?),
            b'B' => FieldValue::ShortShortUint(reader.read_octet()?),
            b'U' => FieldValue::ShortInt(reader.read_signed_short()?),
            b'u' => FieldValue::ShortUint(reader.read_short()?),
            b'I' => FieldValue::LongInt(reader.read_signed_long()?),
            b'L' => FieldValue::LongLongInt(reader.read_signed_longlong()?),
            b'l' => FieldValue::LongLongUint(reader.read_longlong()?),
            b'f' => FieldValue::Float(OrderedFloat(reader.read_float()?)),
            b'd' => FieldValue::Double(OrderedFloat(reader.read_double()?)),
            b'D' => FieldValue::Decimal(Decimal {
                scale: reader.read_octet()?,
                mantissa: reader.read_long()?,
            }),
            b'S' => FieldValue::LongString(reader.read_longstr()?),
            b'T' => FieldValue::Timestamp(Timestamp(reader.read_longlong()?)),
            b'F' => FieldValue::Table(FieldTable::decode(reader)?),
            b'A' => {
                let size = reader.read_long()? as usize;
                let raw = reader.read_bytes(size)?;
                let mut inner = SliceReader::new(raw);
                let mut values = Vec::new();
                while !inner.is_empty() {
                    values.push(FieldValue::decode(&mut inner)?);
                }
                FieldValue::Array(values)
            }
            b'x' => FieldValue::ByteArray(reader.read_longstr()?),
            b'V' => FieldValue::Void,
            other => return Err(DecodeError::BadTag(other)),
        };
        Ok(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::LongString(Bytes::copy_from_slice(value.as_bytes()))
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::LongString(Bytes::from(value.into_bytes()))
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        FieldValue::LongInt(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Boolean(value)
    }
}

impl From<FieldTable> for FieldValue {
    fn from(value: FieldTable) -> Self {
        FieldValue::Table(value)
    }
}

/// A mapping from short-string keys to tagged values
///
/// Encode order follows insertion order; the decoder makes no ordering
/// assumption.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldTable(IndexMap<String, FieldValue>);

impl FieldTable {
    /// Creates an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a key-value pair, returning any value previously stored
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Option<FieldValue> {
        self.0.insert(key.into(), value.into())
    }

    /// Looks up a value by key
    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.0.get(key)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the table has no entries
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldValue)> {
        self.0.iter()
    }

    /// Encodes the u32 byte length then every record
    pub fn encode(&self, dst: &mut BytesMut) -> Result<(), EncodeError> {
        let mut inner = BytesMut::new();
        for (key, value) in &self.0 {
            inner.put_shortstr(key)?;
            value.encode(&mut inner)?;
        }
        dst.put_u32(inner.len() as u32);
        dst.extend_from_slice(&inner);
        Ok(())
    }

    /// Decodes the u32 byte length then that many bytes of records
    pub fn decode(reader: &mut SliceReader<'_>) -> Result<Self, DecodeError> {
        let size = reader.read_long()? as usize;
        let raw = reader.read_bytes(size)?;
        let mut inner = SliceReader::new(raw);
        let mut table = IndexMap::new();
        while !inner.is_empty() {
            let key = inner.read_shortstr()?;
            let value = FieldValue::decode(&mut inner)?;
            table.insert(key, value);
        }
        Ok(Self(table))
    }
}

impl FromIterator<(String, FieldValue)> for FieldTable {
    fn from_iter<I: IntoIterator<Item = (String, FieldValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
