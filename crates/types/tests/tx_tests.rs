//! Tests for transaction identity and wire-size accounting.

use forgecore_types::{Tx, TxKey, KEY_SIZE};

#[test]
fn test_equal_bytes_equal_keys() {
    let a = Tx::from(vec![1, 2, 3, 4]);
    let b = Tx::from(vec![1, 2, 3, 4]);
    let c = Tx::from(vec![1, 2, 3, 5]);

    assert_eq!(a.key(), b.key());
    assert_ne!(a.key(), c.key());
}

#[test]
fn test_key_size() {
    let key = Tx::from(vec![0xFF]).key();
    assert_eq!(key.as_bytes().len(), KEY_SIZE);
}

#[test]
fn test_key_display_roundtrip() {
    let key = Tx::from(vec![7u8; 20]).key();
    let parsed: TxKey = key.to_hex().parse().unwrap();
    assert_eq!(key, parsed);
}

#[test]
fn test_wire_size_is_additive_per_tx() {
    // Twenty 20-byte txs frame to 22 wire bytes each; the block byte budget
    // accumulates exactly this figure.
    let txs: Vec<Tx> = (0..20u8).map(|i| Tx::from(vec![i; 20])).collect();
    let total: usize = txs.iter().map(Tx::wire_size).sum();
    assert_eq!(total, 440);
}
