//! Error types for the staging subsystem.

use forgecore_types::TxKey;
use thiserror::Error;

/// Errors that can occur in mempool operations.
///
/// Admission errors are returned synchronously to the submitter so a peer
/// can be penalized or an RPC client informed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MempoolError {
    /// A single transaction exceeded the per-tx byte limit
    #[error("tx too large: max {max} bytes, got {actual} bytes")]
    TxTooLarge {
        /// Configured per-tx limit
        max: usize,
        /// Size of the rejected tx
        actual: usize,
    },

    /// The pool is at its count or byte capacity
    #[error(
        "mempool is full: {num_txs} txs (max {max_txs}), {txs_bytes} bytes (max {max_txs_bytes})"
    )]
    MempoolIsFull {
        /// Transactions currently held
        num_txs: usize,
        /// Configured tx count cap
        max_txs: usize,
        /// Bytes currently held
        txs_bytes: u64,
        /// Configured byte cap
        max_txs_bytes: u64,
    },

    /// The configured precheck filter rejected the transaction
    #[error("tx rejected by precheck: {0}")]
    PreCheck(String),

    /// The configured postcheck filter rejected the app's response
    #[error("tx rejected by postcheck: {0}")]
    PostCheck(String),

    /// The transaction was already seen; the existing entry was tagged
    /// with the new sender
    #[error("tx already exists in cache")]
    TxInCache,

    /// No transaction with the given key is held
    #[error("tx not found: {0}")]
    NoSuchTx(TxKey),

    /// The application connection reported a transport error
    #[error("application connection error: {0}")]
    AppConnection(String),

    /// An update supplied mismatched transaction and response lists
    #[error("update with {txs} txs but {responses} responses")]
    ResponseMismatch {
        /// Number of committed txs supplied
        txs: usize,
        /// Number of responses supplied
        responses: usize,
    },

    /// The configuration failed validation
    #[error("invalid mempool configuration: {0}")]
    InvalidConfig(String),
}

impl MempoolError {
    /// True when the error came from the configured precheck filter.
    /// Callers batching admissions may skip these rather than abort.
    pub fn is_pre_check(&self) -> bool {
        matches!(self, Self::PreCheck(_))
    }
}

/// Errors that can occur admitting a transaction into the sidecar.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SidecarError {
    /// The bundle targets a height other than the current auction height
    #[error("bundle targets height {desired}, auction is at height {auction}")]
    WrongHeight {
        /// Height the bundle asked for
        desired: u64,
        /// Height the auction is firing for
        auction: u64,
    },

    /// A bundle already exists with a different declared size
    #[error("bundle {bundle_id} declared size {existing}, got conflicting size {declared}")]
    BundleSizeConflict {
        /// Bundle identifier
        bundle_id: u64,
        /// Size fixed by the first admission
        existing: u64,
        /// Conflicting size on the rejected admission
        declared: u64,
    },

    /// The slot at this order is already filled
    #[error("bundle {bundle_id} already holds order {order}")]
    DuplicateBundleOrder {
        /// Bundle identifier
        bundle_id: u64,
        /// Duplicated order
        order: u64,
    },

    /// Bundles must declare at least one transaction
    #[error("bundle size must be at least 1")]
    InvalidBundleSize,

    /// The order lies outside the declared bundle size
    #[error("bundle order {order} out of range for bundle of size {size}")]
    OrderOutOfRange {
        /// Rejected order
        order: u64,
        /// Declared bundle size
        size: u64,
    },
}
