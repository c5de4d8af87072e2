//! Write-side helpers for the AMQP string types

use bytes::BufMut;

use crate::error::EncodeError;

/// Extends [`BufMut`] with the two length-prefixed string encodings.
pub trait BufMutExt: BufMut {
    /// Writes a short string: 1-byte length then the UTF-8 bytes
    fn put_shortstr(&mut self, value: &str) -> Result<(), EncodeError> {
        if value.len() > u8::MAX as usize {
            return Err(EncodeError::ShortStringTooLong(value.len()));
        }
        self.put_u8(value.len() as u8);
        self.put_slice(value.as_bytes());
        Ok(())
    }

    /// Writes a long string: 4-byte length then the raw bytes
    fn put_longstr(&mut self, value: &[u8]) {
        self.put_u32(value.len() as u32);
        self.put_slice(value);
    }
}

impl<T: BufMut> BufMutExt for T {}

#[cfg(test)]
mod tests {
    use bytes::BytesMut;

    use super::BufMutExt;
    use crate::error::EncodeError;

    #[test]
    fn test_put_shortstr() {
        let mut buf = BytesMut::new();
        buf.put_shortstr("abc").unwrap();
        assert_eq!(&buf[..], &[3, b'a', b'b', b'c']);
    }

    #[test]
    fn test_put_shortstr_too_long() {
        let mut buf = BytesMut::new();
        let long = "x".repeat(256);
        assert_eq!(
            buf.put_shortstr(&long),
            Err(EncodeError::ShortStringTooLong(256))
        );
    }

    #[test]
    fn test_put_longstr() {
        let mut buf = BytesMut::new();
        buf.put_longstr(b"ab");
        assert_eq!(&buf[..], &[0, 0, 0, 2, b'a', b'b']);
    }
}
