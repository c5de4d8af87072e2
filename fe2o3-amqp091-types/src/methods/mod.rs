//! The closed sum of AMQP 0-9-1 methods
//!
//! One variant per `(class_id, method_id)` pair the protocol defines, so
//! encode and decode are total functions on the sum and dispatch never
//! inspects types at runtime.

pub mod basic;
pub mod channel;
pub mod confirm;
pub mod connection;
pub mod exchange;
pub mod queue;
pub mod tx;

use bytes::{BufMut, BytesMut};

use crate::error::{DecodeError, EncodeError};
use crate::read::SliceReader;

macro_rules! method_sum {
    ($( ($class:literal, $method:literal) => $variant:ident($args:ty), )+) => {
        /// Every method defined by AMQP 0-9-1
        #[derive(Debug, Clone, PartialEq)]
        pub enum Method {
            $(
                #[doc = concat!("Class ", stringify!($class), ", method ", stringify!($method))]
                $variant($args),
            )+
        }

        impl Method {
            /// Class id of the wrapped method
            pub fn class_id(&self) -> u16 {
                match self {
                    $( Method::$variant(_) => $class, )+
                }
            }

            /// Method id of the wrapped method
            pub fn method_id(&self) -> u16 {
                match self {
                    $( Method::$variant(_) => $method, )+
                }
            }

            /// The `(class_id, method_id)` discriminator
            pub fn key(&self) -> (u16, u16) {
                (self.class_id(), self.method_id())
            }

            /// Encodes class id, method id, and the positional arguments
            pub fn encode(&self, dst: &mut BytesMut) -> Result<(), EncodeError> {
                dst.put_u16(self.class_id());
                dst.put_u16(self.method_id());
                match self {
                    $( Method::$variant(args) => args.encode(dst), )+
                }
            }

            /// Decodes the arguments of `(class_id, method_id)` from `reader`
            pub fn decode(
                class_id: u16,
                method_id: u16,
                reader: &mut SliceReader<'_>,
            ) -> Result<Self, DecodeError> {
                match (class_id, method_id) {
                    $( ($class, $method) => Ok(Method::$variant(<$args>::decode(reader)?)), )+
                    _ => Err(DecodeError::UnknownMethod(class_id, method_id)),
                }
            }
        }

        $(
            impl $args {
                /// The `(class_id, method_id)` discriminator of this method
                pub const KEY: (u16, u16) = ($class, $method);
            }
        )+
    };
}

method_sum! {
    (10, 10) => ConnectionStart(connection::Start),
    (10, 11) => ConnectionStartOk(connection::StartOk),
    (10, 20) => ConnectionSecure(connection::Secure),
    (10, 21) => ConnectionSecureOk(connection::SecureOk),
    (10, 30) => ConnectionTune(connection::Tune),
    (10, 31) => ConnectionTuneOk(connection::TuneOk),
    (10, 40) => ConnectionOpen(connection::Open),
    (10, 41) => ConnectionOpenOk(connection::OpenOk),
    (10, 50) => ConnectionClose(connection::Close),
    (10, 51) => ConnectionCloseOk(connection::CloseOk),
    (20, 10) => ChannelOpen(channel::Open),
    (20, 11) => ChannelOpenOk(channel::OpenOk),
    (20, 20) => ChannelFlow(channel::Flow),
    (20, 21) => ChannelFlowOk(channel::FlowOk),
    (20, 40) => ChannelClose(channel::Close),
    (20, 41) => ChannelCloseOk(channel::CloseOk),
    (40, 10) => ExchangeDeclare(exchange::Declare),
    (40, 11) => ExchangeDeclareOk(exchange::DeclareOk),
    (40, 20) => ExchangeDelete(exchange::Delete),
    (40, 21) => ExchangeDeleteOk(exchange::DeleteOk),
    (40, 30) => ExchangeBind(exchange::Bind),
    (40, 31) => ExchangeBindOk(exchange::BindOk),
    (40, 40) => ExchangeUnbind(exchange::Unbind),
    (40, 51) => ExchangeUnbindOk(exchange::UnbindOk),
    (50, 10) => QueueDeclare(queue::Declare),
    (50, 11) => QueueDeclareOk(queue::DeclareOk),
    (50, 20) => QueueBind(queue::Bind),
    (50, 21) => QueueBindOk(queue::BindOk),
    (50, 30) => QueuePurge(queue::Purge),
    (50, 31) => QueuePurgeOk(queue::PurgeOk),
    (50, 40) => QueueDelete(queue::Delete),
    (50, 41) => QueueDeleteOk(queue::DeleteOk),
    (50, 50) => QueueUnbind(queue::Unbind),
    (50, 51) => QueueUnbindOk(queue::UnbindOk),
    (60, 10) => BasicQos(basic::Qos),
    (60, 11) => BasicQosOk(basic::QosOk),
    (60, 20) => BasicConsume(basic::Consume),
    (60, 21) => BasicConsumeOk(basic::ConsumeOk),
    (60, 30) => BasicCancel(basic::Cancel),
    (60, 31) => BasicCancelOk(basic::CancelOk),
    (60, 40) => BasicPublish(basic::Publish),
    (60, 50) => BasicReturn(basic::Return),
    (60, 60) => BasicDeliver(basic::Deliver),
    (60, 70) => BasicGet(basic::Get),
    (60, 71) => BasicGetOk(basic::GetOk),
    (60, 72) => BasicGetEmpty(basic::GetEmpty),
    (60, 80) => BasicAck(basic::Ack),
    (60, 90) => BasicReject(basic::Reject),
    (60, 100) => BasicRecoverAsync(basic::RecoverAsync),
    (60, 110) => BasicRecover(basic::Recover),
    (60, 111) => BasicRecoverOk(basic::RecoverOk),
    (60, 120) => BasicNack(basic::Nack),
    (85, 10) => ConfirmSelect(confirm::Select),
    (85, 11) => ConfirmSelectOk(confirm::SelectOk),
    (90, 10) => TxSelect(tx::Select),
    (90, 11) => TxSelectOk(tx::SelectOk),
    (90, 20) => TxCommit(tx::Commit),
    (90, 21) => TxCommitOk(tx::CommitOk),
    (90, 30) => TxRollback(tx::Rollback),
    (90, 31) => TxRollbackOk(tx::RollbackOk),
}

#[cfg(test)]
mod tests {
    use bytes::BytesMut;

    use super::{queue, Method};
    use crate::error::DecodeError;
    use crate::field_table::FieldTable;
    use crate::read::SliceReader;

    fn roundtrip(method: Method) -> Method {
        let mut buf = BytesMut::new();
        method.encode(&mut buf).unwrap();
        let mut reader = SliceReader::new(&buf);
        let class_id = reader.read_short().unwrap();
        let method_id = reader.read_short().unwrap();
        let decoded = Method::decode(class_id, method_id, &mut reader).unwrap();
        assert!(reader.is_empty());
        decoded
    }

    #[test]
    fn test_key_matches_wire_prefix() {
        let method = Method::TxCommit(super::tx::Commit);
        let mut buf = BytesMut::new();
        method.encode(&mut buf).unwrap();
        assert_eq!(&buf[..], &[0, 90, 0, 20]);
        assert_eq!(method.key(), (90, 20));
    }

    #[test]
    fn test_unknown_method() {
        let mut reader = SliceReader::new(&[]);
        assert_eq!(
            Method::decode(10, 255, &mut reader),
            Err(DecodeError::UnknownMethod(10, 255))
        );
    }

    #[test]
    fn test_queue_declare_roundtrip() {
        let mut arguments = FieldTable::new();
        arguments.insert("x-max-length", 1000i32);
        let method = Method::QueueDeclare(queue::Declare {
            ticket: 0,
            queue: "work".into(),
            passive: false,
            durable: true,
            exclusive: false,
            auto_delete: true,
            nowait: false,
            arguments,
        });
        assert_eq!(roundtrip(method.clone()), method);
    }
}
