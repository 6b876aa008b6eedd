//! Priority transaction sidecar.
//!
//! Stages externally ordered transaction bundles targeted at the next
//! auction height. The sidecar performs no priority comparison of its own:
//! it enforces structural completeness of bundles whose internal order the
//! producer already decided, and reaps complete bundles in ascending
//! bundle-id order. Incomplete bundles are invisible to the proposer.
//!
//! Bundle state is scoped to a single height; advancing the auction height
//! on update garbage-collects everything below it.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::sync::Arc;

use crossbeam_channel::Receiver;
use forgecore_abci::ResponseDeliverTx;
use forgecore_types::Tx;
use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::error::SidecarError;
use crate::metrics::Metrics;
use crate::notify::TxsAvailableNotifier;
use crate::tx::{MempoolTx, TxInfo};

/// Ordered bundle staged for a single auction height.
#[derive(Debug, Clone)]
struct Bundle {
    /// Declared number of txs; fixed by the first admission
    size: u64,
    /// Filled slots, keyed by order
    txs: BTreeMap<u64, MempoolTx>,
}

impl Bundle {
    fn is_complete(&self) -> bool {
        // Orders are range-checked and duplicate-free, so the count alone
        // decides completeness.
        self.txs.len() as u64 == self.size
    }
}

/// The bundle staging subsystem.
///
/// Cheap to clone; all clones share state. Exercised by many concurrent
/// producers and one consumer.
#[derive(Clone)]
pub struct Sidecar {
    shared: Arc<Shared>,
}

struct Shared {
    metrics: Metrics,
    state: Mutex<State>,
}

struct State {
    height_for_firing_auction: u64,
    /// height -> bundle_id -> bundle
    bundles: BTreeMap<u64, BTreeMap<u64, Bundle>>,
    notifier: TxsAvailableNotifier,
}

impl State {
    fn total_txs(&self) -> usize {
        self.bundles
            .values()
            .flat_map(|bundles| bundles.values())
            .map(|bundle| bundle.txs.len())
            .sum()
    }
}

impl Sidecar {
    /// Creates a sidecar auctioning for `height + 1`.
    pub fn new(height: u64, metrics: Metrics) -> Self {
        Self {
            shared: Arc::new(Shared {
                metrics,
                state: Mutex::new(State {
                    height_for_firing_auction: height + 1,
                    bundles: BTreeMap::new(),
                    notifier: TxsAvailableNotifier::new(),
                }),
            }),
        }
    }

    /// Admits one transaction of a bundle.
    ///
    /// The bundle must target the current auction height exactly; heights
    /// below and above are rejected alike. The first admission of a bundle
    /// fixes its declared size, and each `(bundle_id, order)` slot can be
    /// filled once.
    pub fn add_tx(&self, tx: Tx, tx_info: TxInfo) -> std::result::Result<(), SidecarError> {
        let mut st = self.shared.state.lock();
        let auction = st.height_for_firing_auction;

        if tx_info.desired_height != auction {
            return Err(SidecarError::WrongHeight {
                desired: tx_info.desired_height,
                auction,
            });
        }
        if tx_info.bundle_size == 0 {
            return Err(SidecarError::InvalidBundleSize);
        }
        if tx_info.bundle_order >= tx_info.bundle_size {
            return Err(SidecarError::OrderOutOfRange {
                order: tx_info.bundle_order,
                size: tx_info.bundle_size,
            });
        }

        let bundle = st
            .bundles
            .entry(auction)
            .or_default()
            .entry(tx_info.bundle_id)
            .or_insert_with(|| Bundle {
                size: tx_info.bundle_size,
                txs: BTreeMap::new(),
            });

        if bundle.size != tx_info.bundle_size {
            return Err(SidecarError::BundleSizeConflict {
                bundle_id: tx_info.bundle_id,
                existing: bundle.size,
                declared: tx_info.bundle_size,
            });
        }
        if bundle.txs.contains_key(&tx_info.bundle_order) {
            return Err(SidecarError::DuplicateBundleOrder {
                bundle_id: tx_info.bundle_id,
                order: tx_info.bundle_order,
            });
        }

        trace!(
            height = auction,
            bundle_id = tx_info.bundle_id,
            order = tx_info.bundle_order,
            size = tx_info.bundle_size,
            "staged bundle tx"
        );
        bundle.txs.insert(
            tx_info.bundle_order,
            MempoolTx::new(tx, 0, auction, tx_info.sender_id),
        );

        self.shared.metrics.size.set(st.total_txs() as i64);
        st.notifier.notify();
        Ok(())
    }

    /// Reaps the complete bundles at the current auction height, ascending
    /// by bundle id and, within each bundle, by order. Incomplete bundles
    /// are silently skipped. Non-destructive.
    pub fn reap_max_txs(&self) -> Vec<MempoolTx> {
        let st = self.shared.state.lock();
        let mut reaped = Vec::new();
        if let Some(bundles) = st.bundles.get(&st.height_for_firing_auction) {
            for (bundle_id, bundle) in bundles {
                if !bundle.is_complete() {
                    trace!(
                        bundle_id,
                        filled = bundle.txs.len(),
                        size = bundle.size,
                        "skipping incomplete bundle"
                    );
                    continue;
                }
                reaped.extend(bundle.txs.values().cloned());
            }
        }
        reaped
    }

    /// Applies a committed block: the auction now fires for `height + 1`
    /// and all bundle state below it is dropped. The committed txs and
    /// responses are accepted for symmetry with the mempool's update and
    /// ignored; bundle state is height-scoped, so a new auction height
    /// already invalidates everything the block could have consumed.
    pub fn update(&self, height: u64, _txs: &[Tx], _responses: &[ResponseDeliverTx]) {
        let mut st = self.shared.state.lock();
        st.notifier.reset();

        let next = height + 1;
        if next > st.height_for_firing_auction {
            st.height_for_firing_auction = next;
            st.bundles.retain(|h, _| *h >= next);
            debug!(auction_height = next, "advanced auction height");
        }
        self.shared.metrics.size.set(st.total_txs() as i64);
    }

    /// Drops all bundles at all heights.
    pub fn flush(&self) {
        let mut st = self.shared.state.lock();
        st.bundles.clear();
        self.shared.metrics.size.set(0);
    }

    /// Total number of staged transactions, complete or not.
    pub fn size(&self) -> usize {
        self.shared.state.lock().total_txs()
    }

    /// Number of bundles at the current auction height, incomplete ones
    /// included.
    pub fn num_bundles(&self) -> usize {
        let st = self.shared.state.lock();
        st.bundles
            .get(&st.height_for_firing_auction)
            .map(BTreeMap::len)
            .unwrap_or(0)
    }

    /// The next block height the sidecar accepts bundles for.
    pub fn height_for_firing_auction(&self) -> u64 {
        self.shared.state.lock().height_for_firing_auction
    }

    /// Turns on the per-height availability signal.
    pub fn enable_txs_available(&self) {
        self.shared.state.lock().notifier.enable();
    }

    /// Receiver firing once per height at which at least one bundle tx was
    /// admitted; `None` until enabled.
    pub fn txs_available(&self) -> Option<Receiver<()>> {
        self.shared.state.lock().notifier.receiver()
    }

    /// Debug dump of the staged bundles.
    pub fn pretty_print_bundles(&self) -> String {
        let st = self.shared.state.lock();
        let mut out = String::new();
        for (height, bundles) in &st.bundles {
            for (bundle_id, bundle) in bundles {
                let _ = writeln!(
                    out,
                    "height {} bundle {}: {}/{} txs",
                    height,
                    bundle_id,
                    bundle.txs.len(),
                    bundle.size
                );
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_sidecar() -> Sidecar {
        Sidecar::new(0, Metrics::new("test_sidecar").unwrap())
    }

    fn bundle_tx_info(bundle_id: u64, order: u64, size: u64) -> TxInfo {
        TxInfo {
            sender_id: 0,
            desired_height: 1,
            bundle_id,
            bundle_order: order,
            bundle_size: size,
        }
    }

    #[test]
    fn test_auction_height_starts_above_construction_height() {
        let sidecar = new_sidecar();
        assert_eq!(sidecar.height_for_firing_auction(), 1);
    }

    #[test]
    fn test_add_tx_validations() {
        let sidecar = new_sidecar();

        // Height 0 and future heights are both rejected.
        let err = sidecar
            .add_tx(
                Tx::from(vec![1]),
                TxInfo {
                    desired_height: 0,
                    bundle_size: 1,
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert_eq!(
            err,
            SidecarError::WrongHeight {
                desired: 0,
                auction: 1
            }
        );
        assert!(sidecar
            .add_tx(
                Tx::from(vec![1]),
                TxInfo {
                    desired_height: 2,
                    bundle_size: 1,
                    ..Default::default()
                },
            )
            .is_err());

        // Empty bundles never materialize.
        assert_eq!(
            sidecar.add_tx(Tx::from(vec![1]), bundle_tx_info(0, 0, 0)),
            Err(SidecarError::InvalidBundleSize)
        );

        // Orders outside [0, size) are rejected.
        assert_eq!(
            sidecar.add_tx(Tx::from(vec![1]), bundle_tx_info(0, 3, 3)),
            Err(SidecarError::OrderOutOfRange { order: 3, size: 3 })
        );

        assert_eq!(sidecar.size(), 0);
    }

    #[test]
    fn test_size_conflict_and_duplicate_order() {
        let sidecar = new_sidecar();
        sidecar
            .add_tx(Tx::from(vec![1]), bundle_tx_info(0, 0, 2))
            .unwrap();

        assert_eq!(
            sidecar.add_tx(Tx::from(vec![2]), bundle_tx_info(0, 1, 3)),
            Err(SidecarError::BundleSizeConflict {
                bundle_id: 0,
                existing: 2,
                declared: 3
            })
        );
        assert_eq!(
            sidecar.add_tx(Tx::from(vec![3]), bundle_tx_info(0, 0, 2)),
            Err(SidecarError::DuplicateBundleOrder {
                bundle_id: 0,
                order: 0
            })
        );
        assert_eq!(sidecar.size(), 1);
    }

    #[test]
    fn test_pretty_print_bundles() {
        let sidecar = new_sidecar();
        sidecar
            .add_tx(Tx::from(vec![1]), bundle_tx_info(4, 0, 2))
            .unwrap();
        let dump = sidecar.pretty_print_bundles();
        assert!(dump.contains("height 1 bundle 4: 1/2 txs"));
    }
}
