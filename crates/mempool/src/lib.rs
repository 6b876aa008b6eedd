//! # Forge Core Mempool
//!
//! Two-tier transaction staging for the Forge Core node:
//!
//! - **[`Mempool`]** - The general pool: admits transactions through the
//!   application's `CheckTx`, buffers them in insertion order, reaps under
//!   byte/gas budgets for block proposals, and rechecks survivors after
//!   every committed block
//! - **[`Sidecar`]** - The priority sidecar: assembles externally ordered
//!   transaction bundles targeted at the next auction height and reaps only
//!   complete bundles, in bundle order
//!
//! Both subsystems share the duplicate-suppression [`TxCache`], the
//! capacity-1 "transactions available" edge signal that wakes the proposer,
//! and Prometheus [`Metrics`]. They hold no references into each other and
//! take no common locks.
//!
//! ## Admission pipeline
//!
//! `check_tx` gates in order: single-tx size, pool capacity, the configured
//! precheck filter, the seen-key cache, and finally the application probe.
//! The probe is asynchronous: `check_tx` returns once the request is
//! enqueued and the outcome lands on the client's dispatch thread.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod cache;
pub mod clist;
pub mod config;
mod error;
pub mod filter;
pub mod mempool;
pub mod metrics;
pub mod notify;
pub mod sentinel;
pub mod sidecar;
pub mod tx;

pub use cache::TxCache;
pub use config::MempoolConfig;
pub use error::{MempoolError, SidecarError};
pub use filter::{post_check_max_gas, pre_check_max_bytes, PostCheckFn, PreCheckFn};
pub use mempool::{CheckTxCallback, Mempool};
pub use metrics::Metrics;
pub use sentinel::{register_peer, SentinelConfig};
pub use sidecar::Sidecar;
pub use tx::{MempoolTx, TxInfo, UNKNOWN_SENDER_ID};

/// Result type alias for mempool operations
pub type Result<T> = std::result::Result<T, MempoolError>;
