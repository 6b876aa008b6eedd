//! # Forge Core Types
//!
//! Core transaction types shared by the Forge Core staging subsystem:
//! - [`Tx`] - An opaque transaction as raw bytes
//! - [`TxKey`] - The fixed-size Keccak256 digest identifying a transaction
//!
//! Transactions are never interpreted here; identity, deduplication, and
//! wire-size accounting are the only concerns.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod key;
pub mod tx;

pub use key::{TxKey, KEY_SIZE};
pub use tx::Tx;

/// Result type alias for type construction
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur constructing core types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A byte slice had the wrong length for the target type
    #[error("invalid length: expected {expected} bytes, got {actual}")]
    InvalidLength {
        /// Expected number of bytes
        expected: usize,
        /// Actual number of bytes
        actual: usize,
    },

    /// A hex string could not be decoded
    #[error("invalid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),
}
