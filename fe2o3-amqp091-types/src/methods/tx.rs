//! Methods of the Tx class (class id 90)
//!
//! Standard transactions: select a channel into transactional mode, then
//! commit or roll back batches of publishes and acks.

use bytes::BytesMut;

use crate::error::{DecodeError, EncodeError};
use crate::read::SliceReader;

/// Class id of the Tx class
pub const CLASS_ID: u16 = 90;

/// Puts the channel into transactional mode.
/// `<method name="select" synchronous="1" index="10"/>`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Select;

impl Select {
    pub(crate) fn encode(&self, _dst: &mut BytesMut) -> Result<(), EncodeError> {
        Ok(())
    }

    pub(crate) fn decode(_reader: &mut SliceReader<'_>) -> Result<Self, DecodeError> {
        Ok(Self)
    }
}

/// Confirms transactional mode.
/// `<method name="select-ok" synchronous="1" index="11"/>`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SelectOk;

impl SelectOk {
    pub(crate) fn encode(&self, _dst: &mut BytesMut) -> Result<(), EncodeError> {
        Ok(())
    }

    pub(crate) fn decode(_reader: &mut SliceReader<'_>) -> Result<Self, DecodeError> {
        Ok(Self)
    }
}

/// Commits the current transaction.
/// `<method name="commit" synchronous="1" index="20"/>`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Commit;

impl Commit {
    pub(crate) fn encode(&self, _dst: &mut BytesMut) -> Result<(), EncodeError> {
        Ok(())
    }

    pub(crate) fn decode(_reader: &mut SliceReader<'_>) -> Result<Self, DecodeError> {
        Ok(Self)
    }
}

/// Confirms a commit.
/// `<method name="commit-ok" synchronous="1" index="21"/>`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommitOk;

impl CommitOk {
    pub(crate) fn encode(&self, _dst: &mut BytesMut) -> Result<(), EncodeError> {
        Ok(())
    }

    pub(crate) fn decode(_reader: &mut SliceReader<'_>) -> Result<Self, DecodeError> {
        Ok(Self)
    }
}

/// Abandons the current transaction.
/// `<method name="rollback" synchronous="1" index="30"/>`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Rollback;

impl Rollback {
    pub(crate) fn encode(&self, _dst: &mut BytesMut) -> Result<(), EncodeError> {
        Ok(())
    }

    pub(crate) fn decode(_reader: &mut SliceReader<'_>) -> Result<Self, DecodeError> {
        Ok(Self)
    }
}

/// Confirms a rollback.
/// `<method name="rollback-ok" synchronous="1" index="31"/>`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RollbackOk;

impl RollbackOk {
    pub(crate) fn encode(&self, _dst: &mut BytesMut) -> Result<(), EncodeError> {
        Ok(())
    }

    pub(crate) fn decode(_reader: &mut SliceReader<'_>) -> Result<Self, DecodeError> {
        Ok(Self)
    }
}
