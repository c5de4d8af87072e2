//! The PLAIN mechanism

use bytes::{BufMut, Bytes};
use fe2o3_amqp091_types::methods::connection::Start;

use super::Credentials;

pub(crate) const PLAIN: &str = "PLAIN";

/// Username/password credentials for the PLAIN mechanism.
///
/// The default is `guest`/`guest`, which matches a stock RabbitMQ install.
#[derive(Debug, Clone)]
pub struct PlainCredentials {
    /// Username
    pub username: String,
    /// Password
    pub password: String,
}

impl PlainCredentials {
    /// Creates PLAIN credentials
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    fn response_blob(&self) -> Bytes {
        let username = self.username.as_bytes();
        let password = self.password.as_bytes();
        let mut buf = Vec::with_capacity(username.len() + password.len() + 2);
        buf.put_u8(0);
        buf.put_slice(username);
        buf.put_u8(0);
        buf.put_slice(password);
        Bytes::from(buf)
    }
}

impl Default for PlainCredentials {
    fn default() -> Self {
        Self::new("guest", "guest")
    }
}

impl Credentials for PlainCredentials {
    fn response_for(&self, start: &Start) -> Option<(String, Bytes)> {
        let offered = String::from_utf8_lossy(&start.mechanisms);
        if !offered.split_whitespace().any(|m| m == PLAIN) {
            return None;
        }
        Some((PLAIN.to_string(), self.response_blob()))
    }

    fn erase(&mut self) {
        // overwrite rather than rely on drop so long-lived connections do
        // not keep the secret around
        self.username = String::new();
        self.password = String::new();
    }
}

#[cfg(test)]
mod tests {
    use fe2o3_amqp091_types::methods::connection::Start;

    use super::{Credentials, PlainCredentials};

    #[test]
    fn test_plain_response_blob() {
        let credentials = PlainCredentials::new("user", "example");
        let start = Start::default();
        let (mechanism, response) = credentials.response_for(&start).unwrap();
        assert_eq!(mechanism, "PLAIN");
        assert_eq!(&response[..], b"\0user\0example");
    }

    #[test]
    fn test_mechanism_not_offered() {
        let credentials = PlainCredentials::default();
        let start = Start {
            mechanisms: bytes::Bytes::from_static(b"EXTERNAL AMQPLAIN"),
            ..Default::default()
        };
        assert!(credentials.response_for(&start).is_none());
    }

    #[test]
    fn test_erase_clears_material() {
        let mut credentials = PlainCredentials::default();
        credentials.erase();
        assert!(credentials.username.is_empty());
        assert!(credentials.password.is_empty());
    }
}
