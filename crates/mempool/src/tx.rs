//! Staged transaction wrapper and admission metadata.

use forgecore_types::Tx;
use std::collections::HashSet;

/// Sender tag for transactions submitted over local RPC, where no peer
/// attribution exists.
pub const UNKNOWN_SENDER_ID: u16 = 0;

/// A transaction held by the mempool or sidecar.
#[derive(Debug, Clone)]
pub struct MempoolTx {
    /// Raw transaction bytes
    pub tx: Tx,
    /// Gas the application reported wanting for this tx
    pub gas_wanted: i64,
    /// Block height at which the tx was admitted
    pub height: u64,
    /// Peers that have sent this tx; the reactor consults this to avoid
    /// gossiping a tx back to its senders
    senders: HashSet<u16>,
}

impl MempoolTx {
    pub(crate) fn new(tx: Tx, gas_wanted: i64, height: u64, sender_id: u16) -> Self {
        let mut senders = HashSet::new();
        senders.insert(sender_id);
        Self {
            tx,
            gas_wanted,
            height,
            senders,
        }
    }

    /// True if the given peer has sent this transaction.
    pub fn has_sender(&self, sender_id: u16) -> bool {
        self.senders.contains(&sender_id)
    }

    pub(crate) fn add_sender(&mut self, sender_id: u16) {
        self.senders.insert(sender_id);
    }
}

/// Admission metadata attached by the caller.
#[derive(Debug, Clone, Copy, Default)]
pub struct TxInfo {
    /// Opaque peer tag; [`UNKNOWN_SENDER_ID`] for local RPC
    pub sender_id: u16,
    /// Sidecar only: block height the bundle targets
    pub desired_height: u64,
    /// Sidecar only: bundle identifier within the target height
    pub bundle_id: u64,
    /// Sidecar only: position of this tx within its bundle
    pub bundle_order: u64,
    /// Sidecar only: declared total number of txs in the bundle
    pub bundle_size: u64,
}
