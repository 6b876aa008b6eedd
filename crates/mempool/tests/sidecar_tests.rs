//! End-to-end tests for the bundle sidecar.

use std::time::Duration;

use crossbeam_channel::Receiver;
use forgecore_abci::{ResponseDeliverTx, CODE_TYPE_OK};
use forgecore_mempool::{Metrics, Sidecar, SidecarError, TxInfo, UNKNOWN_SENDER_ID};
use forgecore_types::Tx;
use rand::RngCore;

fn new_sidecar() -> Sidecar {
    Sidecar::new(0, Metrics::new("sidecar_under_test").unwrap())
}

fn random_tx() -> Tx {
    let mut bytes = vec![0u8; 20];
    rand::thread_rng().fill_bytes(&mut bytes);
    Tx::from(bytes)
}

fn deliver_ok_responses(n: usize) -> Vec<ResponseDeliverTx> {
    (0..n)
        .map(|_| ResponseDeliverTx {
            code: CODE_TYPE_OK,
            ..Default::default()
        })
        .collect()
}

/// Adds one bundle tx at the current auction height and returns it.
fn add_tx(
    sidecar: &Sidecar,
    bundle_id: u64,
    order: u64,
    size: u64,
) -> Result<Tx, SidecarError> {
    let tx = random_tx();
    sidecar.add_tx(
        tx.clone(),
        TxInfo {
            sender_id: UNKNOWN_SENDER_ID,
            desired_height: sidecar.height_for_firing_auction(),
            bundle_id,
            bundle_order: order,
            bundle_size: size,
        },
    )?;
    Ok(tx)
}

/// Adds `count` complete bundles of `size` txs with ids starting at
/// `first_id`, in order.
fn add_bundles(sidecar: &Sidecar, first_id: u64, count: u64, size: u64) -> Vec<Tx> {
    let mut txs = Vec::new();
    for bundle_id in first_id..first_id + count {
        for order in 0..size {
            txs.push(add_tx(sidecar, bundle_id, order, size).unwrap());
        }
    }
    txs
}

fn ensure_fire(rx: &Receiver<()>, timeout_ms: u64) {
    assert!(
        rx.recv_timeout(Duration::from_millis(timeout_ms)).is_ok(),
        "expected availability signal"
    );
}

fn ensure_no_fire(rx: &Receiver<()>, timeout_ms: u64) {
    assert!(
        rx.recv_timeout(Duration::from_millis(timeout_ms)).is_err(),
        "expected no availability signal"
    );
}

#[test]
fn test_basic_add_multiple_bundles() {
    let sidecar = new_sidecar();
    for &count in &[0u64, 1, 5, 0, 100] {
        add_bundles(&sidecar, 0, count, 10);
        sidecar.reap_max_txs();
        assert_eq!(sidecar.num_bundles(), count as usize);
        sidecar.flush();
    }
}

#[test]
fn test_reap_assembles_bundles_admitted_out_of_order() {
    let sidecar = new_sidecar();

    // 1. A size-1 bundle: order 1 is out of range, order 0 completes it.
    {
        assert!(matches!(
            add_tx(&sidecar, 0, 1, 1),
            Err(SidecarError::OrderOutOfRange { .. })
        ));
        add_tx(&sidecar, 0, 0, 1).unwrap();
        assert_eq!(sidecar.reap_max_txs().len(), 1);
        sidecar.flush();
    }

    // 2. A size-2 bundle filled in reverse still reaps in order.
    {
        let second = add_tx(&sidecar, 0, 1, 2).unwrap();
        let first = add_tx(&sidecar, 0, 0, 2).unwrap();
        let reaped = sidecar.reap_max_txs();
        assert_eq!(reaped.len(), 2);
        assert_eq!(reaped[0].tx, first);
        assert_eq!(reaped[1].tx, second);
        sidecar.flush();
    }

    // 3. Non-sequential fills never complete.
    {
        add_tx(&sidecar, 0, 3, 5).unwrap();
        add_tx(&sidecar, 0, 1, 5).unwrap();
        assert_eq!(sidecar.reap_max_txs().len(), 0);
        assert_eq!(sidecar.num_bundles(), 1);
        sidecar.flush();
    }

    // 4. Three complete bundles admitted out of order reap as
    //    bundle0[0..2], bundle1[0..2], bundle2[0..3].
    {
        let b2_2 = add_tx(&sidecar, 2, 2, 3).unwrap();
        let b2_0 = add_tx(&sidecar, 2, 0, 3).unwrap();
        let b2_1 = add_tx(&sidecar, 2, 1, 3).unwrap();

        let b0_1 = add_tx(&sidecar, 0, 1, 2).unwrap();
        let b0_0 = add_tx(&sidecar, 0, 0, 2).unwrap();

        let b1_1 = add_tx(&sidecar, 1, 1, 2).unwrap();
        let b1_0 = add_tx(&sidecar, 1, 0, 2).unwrap();

        let reaped: Vec<Tx> = sidecar.reap_max_txs().into_iter().map(|m| m.tx).collect();
        assert_eq!(reaped, vec![b0_0, b0_1, b1_0, b1_1, b2_0, b2_1, b2_2]);
        sidecar.flush();
    }

    // 5. Incomplete, ill-ordered, and wrong-height bundles reap nothing.
    {
        // Size not filled.
        add_tx(&sidecar, 2, 0, 3).unwrap();
        add_tx(&sidecar, 2, 1, 3).unwrap();

        // Orders leaving gaps, one out of range.
        add_tx(&sidecar, 0, 2, 3).unwrap();
        add_tx(&sidecar, 0, 0, 3).unwrap();
        assert!(matches!(
            add_tx(&sidecar, 0, 3, 3),
            Err(SidecarError::OrderOutOfRange { .. })
        ));

        // Wrong heights, below and above the auction.
        for desired_height in [0u64, 2] {
            let err = sidecar
                .add_tx(
                    random_tx(),
                    TxInfo {
                        sender_id: UNKNOWN_SENDER_ID,
                        desired_height,
                        bundle_id: 1,
                        bundle_order: 0,
                        bundle_size: 2,
                    },
                )
                .unwrap_err();
            assert_eq!(
                err,
                SidecarError::WrongHeight {
                    desired: desired_height,
                    auction: 1
                }
            );
        }

        assert_eq!(sidecar.reap_max_txs().len(), 0);
        sidecar.flush();
    }
}

#[test]
fn test_reap_skips_incomplete_but_counts_them() {
    let sidecar = new_sidecar();

    add_bundles(&sidecar, 0, 1, 4);
    // Bundle 1 misses its last slot.
    add_tx(&sidecar, 1, 0, 2).unwrap();

    assert_eq!(sidecar.num_bundles(), 2);
    assert_eq!(sidecar.size(), 5);

    let reaped = sidecar.reap_max_txs();
    assert_eq!(reaped.len(), 4);
}

#[test]
fn test_sidecar_update() {
    let sidecar = new_sidecar();
    add_tx(&sidecar, 0, 0, 2).unwrap();
    add_tx(&sidecar, 0, 1, 2).unwrap();

    // A stale height does not advance the auction or drop state.
    sidecar.update(0, &[Tx::from(vec![0x02])], &deliver_ok_responses(1));
    assert_eq!(sidecar.height_for_firing_auction(), 1);
    assert_eq!(sidecar.size(), 2);

    // Committing height 1 advances the auction and drops the bundles
    // staged below it.
    sidecar.update(1, &[Tx::from(vec![0x02])], &deliver_ok_responses(1));
    assert_eq!(sidecar.height_for_firing_auction(), 2);
    assert_eq!(sidecar.size(), 0);
    assert_eq!(sidecar.num_bundles(), 0);
}

#[test]
fn test_sidecar_txs_available() {
    let sidecar = new_sidecar();
    sidecar.enable_txs_available();
    let available = sidecar.txs_available().unwrap();
    let timeout_ms = 500;

    // With no bundles it should not fire.
    ensure_no_fire(&available, timeout_ms);

    // A burst of bundles fires exactly once.
    add_bundles(&sidecar, 0, 100, 10);
    ensure_fire(&available, timeout_ms);
    ensure_no_fire(&available, timeout_ms);

    // More bundles at the same height stay silent.
    add_bundles(&sidecar, 100, 50, 10);
    ensure_no_fire(&available, timeout_ms);

    // A committed block re-arms the latch but leaves nothing staged, so
    // nothing fires.
    sidecar.update(2, &[], &[]);
    ensure_no_fire(&available, timeout_ms);
    assert_eq!(sidecar.size(), 0);

    // Fresh bundles at the new auction height fire once again.
    add_bundles(&sidecar, 0, 100, 10);
    ensure_fire(&available, timeout_ms);
    ensure_no_fire(&available, timeout_ms);
}

#[test]
fn test_concurrent_producers_fill_exactly_one_bundle_set() {
    let sidecar = new_sidecar();

    let num_producers = 15;
    let bundles_per_producer = 5u64;
    let txs_per_bundle = 10u64;

    let threads: Vec<_> = (0..num_producers)
        .map(|_| {
            let handle = sidecar.clone();
            std::thread::spawn(move || {
                for bundle_id in 0..bundles_per_producer {
                    for order in 0..txs_per_bundle {
                        // Losers of a slot race get DuplicateBundleOrder;
                        // exactly one admission per slot wins.
                        let _ = handle.add_tx(
                            random_tx(),
                            TxInfo {
                                sender_id: UNKNOWN_SENDER_ID,
                                desired_height: handle.height_for_firing_auction(),
                                bundle_id,
                                bundle_order: order,
                                bundle_size: txs_per_bundle,
                            },
                        );
                    }
                }
            })
        })
        .collect();
    for t in threads {
        t.join().unwrap();
    }

    let reaped = sidecar.reap_max_txs();
    assert_eq!(
        reaped.len() as u64,
        bundles_per_producer * txs_per_bundle,
        "every slot must be filled exactly once"
    );
    assert_eq!(sidecar.num_bundles(), bundles_per_producer as usize);
    assert_eq!(sidecar.size() as u64, bundles_per_producer * txs_per_bundle);
}
