//! Requests sent to the application and the responses it returns.

use bytes::Bytes;
use forgecore_types::Tx;

/// Response code signalling success. Any other code is a rejection.
pub const CODE_TYPE_OK: u32 = 0;

/// Distinguishes a first-time validity probe from the re-validation of a
/// transaction the mempool already holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CheckTxKind {
    /// First probe of a newly submitted transaction
    #[default]
    New,
    /// Re-probe of a held transaction after a block was committed
    Recheck,
}

/// Validity probe for a transaction prior to block inclusion.
#[derive(Debug, Clone)]
pub struct RequestCheckTx {
    /// The transaction under scrutiny
    pub tx: Tx,
    /// Probe kind
    pub kind: CheckTxKind,
}

/// Application verdict on a [`RequestCheckTx`].
#[derive(Debug, Clone, Default)]
pub struct ResponseCheckTx {
    /// `CODE_TYPE_OK` accepts the transaction; anything else rejects it
    pub code: u32,
    /// Arbitrary response payload
    pub data: Bytes,
    /// Human-readable output, useful on rejection
    pub log: String,
    /// Gas the transaction declares wanting; budgets block assembly
    pub gas_wanted: i64,
}

impl ResponseCheckTx {
    /// True when the application accepted the transaction.
    pub fn is_ok(&self) -> bool {
        self.code == CODE_TYPE_OK
    }

    /// True when the application rejected the transaction.
    pub fn is_err(&self) -> bool {
        !self.is_ok()
    }
}

/// Execution of a transaction inside a committed block.
#[derive(Debug, Clone)]
pub struct RequestDeliverTx {
    /// The transaction to execute
    pub tx: Tx,
}

/// Application verdict on a [`RequestDeliverTx`].
#[derive(Debug, Clone, Default)]
pub struct ResponseDeliverTx {
    /// `CODE_TYPE_OK` on successful execution
    pub code: u32,
    /// Arbitrary response payload
    pub data: Bytes,
    /// Human-readable output
    pub log: String,
}

impl ResponseDeliverTx {
    /// True when execution succeeded.
    pub fn is_ok(&self) -> bool {
        self.code == CODE_TYPE_OK
    }

    /// True when execution failed.
    pub fn is_err(&self) -> bool {
        !self.is_ok()
    }
}

/// Application state hash after a commit.
#[derive(Debug, Clone, Default)]
pub struct ResponseCommit {
    /// Digest of the committed application state
    pub data: Bytes,
}

/// A request to the application.
#[derive(Debug, Clone)]
pub enum Request {
    /// Validity probe
    CheckTx(RequestCheckTx),
    /// Transaction execution
    DeliverTx(RequestDeliverTx),
    /// State commit
    Commit,
    /// Queue drain marker; answered once all prior requests are processed
    Flush,
}

/// A response from the application.
#[derive(Debug, Clone)]
pub enum Response {
    /// Verdict on a validity probe
    CheckTx(ResponseCheckTx),
    /// Verdict on an execution
    DeliverTx(ResponseDeliverTx),
    /// State hash after a commit
    Commit(ResponseCommit),
    /// Drain marker acknowledgement
    Flush,
}
