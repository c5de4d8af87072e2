#![deny(missing_docs, missing_debug_implementations)]

//! Implements the AMQP 0-9-1 wire data types: method classes, the field-table
//! value type, content-header properties, and the positional primitive codec
//! they share.

pub mod definitions;
pub mod error;
pub mod field_table;
pub mod methods;
pub mod properties;
pub mod read;
pub mod write;

pub use error::{DecodeError, EncodeError};
pub use field_table::{Decimal, FieldTable, FieldValue, Timestamp};
pub use methods::Method;
pub use properties::{BasicProperties, ContentHeader};
