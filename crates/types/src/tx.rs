//! Opaque transaction bytes.
//!
//! A [`Tx`] is an arbitrary byte string as submitted by a user or relayed by
//! a peer. The staging subsystem never interprets the contents; validity is
//! the application's verdict. Cloning is cheap (`bytes::Bytes` refcount).

use crate::key::TxKey;
use bytes::Bytes;
use std::fmt;

/// An opaque transaction.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct Tx(Bytes);

impl Tx {
    /// Creates a transaction from raw bytes.
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self(bytes.into())
    }

    /// Computes the key identifying this transaction.
    pub fn key(&self) -> TxKey {
        TxKey::digest(&self.0)
    }

    /// Returns the raw length in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the transaction carries no bytes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the raw bytes.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Serialized size of this transaction as a length-delimited bytes
    /// field: one byte of field tag, the varint length prefix, then the
    /// payload. Block byte budgets are enforced against this size so that
    /// the assembled block body is bit-exact.
    pub fn wire_size(&self) -> usize {
        1 + varint_len(self.0.len() as u64) + self.0.len()
    }
}

/// Number of bytes a value occupies as a protobuf varint.
fn varint_len(mut n: u64) -> usize {
    let mut len = 1;
    while n >= 0x80 {
        n >>= 7;
        len += 1;
    }
    len
}

impl From<Vec<u8>> for Tx {
    fn from(bytes: Vec<u8>) -> Self {
        Self(Bytes::from(bytes))
    }
}

impl From<&[u8]> for Tx {
    fn from(bytes: &[u8]) -> Self {
        Self(Bytes::copy_from_slice(bytes))
    }
}

impl From<Bytes> for Tx {
    fn from(bytes: Bytes) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for Tx {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for Tx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tx(0x{})", hex::encode(&self.0))
    }
}

impl fmt::Display for Tx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(&self.0))
    }
}
