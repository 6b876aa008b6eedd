//! Staging subsystem configuration.

use crate::error::MempoolError;
use crate::Result;
use serde::{Deserialize, Serialize};

/// Configuration for the mempool and its admission quotas.
///
/// Loaded as the `[mempool]` section of the node's TOML configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MempoolConfig {
    /// Maximum number of transactions held
    pub size: usize,

    /// Cap on the total bytes of all held transactions
    pub max_txs_bytes: u64,

    /// Reject any single transaction larger than this many bytes
    pub max_tx_bytes: usize,

    /// Capacity of the duplicate-suppression cache. Independent of `size`;
    /// too small causes replay amplification, too large wastes memory
    pub cache_size: usize,

    /// Keep keys of failed transactions in the cache, preventing replay of
    /// known-bad transactions at the cost of blocking their resubmission
    pub keep_invalid_txs_in_cache: bool,

    /// Re-run CheckTx on surviving transactions after each committed block
    pub recheck: bool,
}

impl Default for MempoolConfig {
    fn default() -> Self {
        Self {
            size: 5_000,
            max_txs_bytes: 1_073_741_824, // 1 GiB
            max_tx_bytes: 1_048_576,      // 1 MiB
            cache_size: 10_000,
            keep_invalid_txs_in_cache: false,
            recheck: true,
        }
    }
}

impl MempoolConfig {
    /// Validates that the quotas are internally consistent.
    pub fn validate(&self) -> Result<()> {
        if self.size == 0 {
            return Err(MempoolError::InvalidConfig(
                "size must be at least 1".into(),
            ));
        }
        if self.max_tx_bytes == 0 {
            return Err(MempoolError::InvalidConfig(
                "max_tx_bytes must be at least 1".into(),
            ));
        }
        if self.max_txs_bytes < self.max_tx_bytes as u64 {
            return Err(MempoolError::InvalidConfig(format!(
                "max_txs_bytes ({}) smaller than max_tx_bytes ({})",
                self.max_txs_bytes, self.max_tx_bytes
            )));
        }
        Ok(())
    }
}
