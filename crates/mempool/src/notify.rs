//! One-shot per-height "transactions available" signal.
//!
//! The sole mechanism by which the consensus loop wakes up for block
//! building. Edge-triggered: after enabling, exactly one signal fires per
//! height at which at least one transaction was admitted; `update` re-arms
//! the latch for the next height. The send is non-blocking on a capacity-1
//! channel, so a slow reader coalesces edges instead of blocking admission.

use crossbeam_channel::{bounded, Receiver, Sender};

/// Per-height availability latch over a capacity-1 channel.
#[derive(Default)]
pub struct TxsAvailableNotifier {
    channel: Option<(Sender<()>, Receiver<()>)>,
    notified: bool,
}

impl TxsAvailableNotifier {
    /// Creates a disabled notifier; [`notify`](Self::notify) is a no-op
    /// until [`enable`](Self::enable) is called.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the signalling channel. Idempotent.
    pub fn enable(&mut self) {
        if self.channel.is_none() {
            self.channel = Some(bounded(1));
        }
    }

    /// True once [`enable`](Self::enable) has been called.
    pub fn enabled(&self) -> bool {
        self.channel.is_some()
    }

    /// Receiver for the per-height edge; `None` before enabling.
    pub fn receiver(&self) -> Option<Receiver<()>> {
        self.channel.as_ref().map(|(_, rx)| rx.clone())
    }

    /// Fires the edge if enabled and not yet fired this height.
    pub fn notify(&mut self) {
        if self.notified {
            return;
        }
        if let Some((tx, _)) = &self.channel {
            self.notified = true;
            let _ = tx.try_send(());
        }
    }

    /// Re-arms the latch for a new height.
    pub fn reset(&mut self) {
        self.notified = false;
    }
}
