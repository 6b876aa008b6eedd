//! Minimal in-memory key/value application.
//!
//! Accepts every transaction with `gas_wanted = 1`, stores `key=value`
//! payloads on delivery (a bare payload stores itself under itself), and
//! commits to an 8-byte digest of the entry count. Used by tests and
//! examples as a stand-in for a real application.

use crate::app::Application;
use crate::types::{
    RequestCheckTx, RequestDeliverTx, ResponseCheckTx, ResponseCommit, ResponseDeliverTx,
    CODE_TYPE_OK,
};
use bytes::Bytes;
use parking_lot::Mutex;
use std::collections::HashMap;

/// In-memory key/value application.
#[derive(Default)]
pub struct KvStoreApp {
    store: Mutex<HashMap<Vec<u8>, Vec<u8>>>,
}

impl KvStoreApp {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up a stored value.
    pub fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.store.lock().get(key).cloned()
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.store.lock().len()
    }

    /// True when nothing has been delivered yet.
    pub fn is_empty(&self) -> bool {
        self.store.lock().is_empty()
    }
}

impl Application for KvStoreApp {
    fn check_tx(&self, _req: &RequestCheckTx) -> ResponseCheckTx {
        ResponseCheckTx {
            code: CODE_TYPE_OK,
            gas_wanted: 1,
            ..Default::default()
        }
    }

    fn deliver_tx(&self, req: &RequestDeliverTx) -> ResponseDeliverTx {
        let bytes = req.tx.as_bytes();
        let (key, value) = match bytes.iter().position(|&b| b == b'=') {
            Some(idx) => (bytes[..idx].to_vec(), bytes[idx + 1..].to_vec()),
            None => (bytes.to_vec(), bytes.to_vec()),
        };
        self.store.lock().insert(key, value);
        ResponseDeliverTx {
            code: CODE_TYPE_OK,
            ..Default::default()
        }
    }

    fn commit(&self) -> ResponseCommit {
        let count = self.store.lock().len() as u64;
        ResponseCommit {
            data: Bytes::copy_from_slice(&count.to_be_bytes()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use forgecore_types::Tx;

    #[test]
    fn test_check_tx_wants_one_gas() {
        let app = KvStoreApp::new();
        let res = app.check_tx(&RequestCheckTx {
            tx: Tx::from(vec![1, 2, 3]),
            kind: Default::default(),
        });
        assert!(res.is_ok());
        assert_eq!(res.gas_wanted, 1);
    }

    #[test]
    fn test_deliver_stores_pairs() {
        let app = KvStoreApp::new();
        app.deliver_tx(&RequestDeliverTx {
            tx: Tx::from(&b"name=forge"[..]),
        });
        assert_eq!(app.get(b"name"), Some(b"forge".to_vec()));

        app.deliver_tx(&RequestDeliverTx {
            tx: Tx::from(&b"bare"[..]),
        });
        assert_eq!(app.get(b"bare"), Some(b"bare".to_vec()));
    }

    #[test]
    fn test_commit_hash_is_eight_bytes() {
        let app = KvStoreApp::new();
        app.deliver_tx(&RequestDeliverTx {
            tx: Tx::from(&b"a=1"[..]),
        });
        let res = app.commit();
        assert_eq!(res.data.len(), 8);
        assert_eq!(res.data.as_ref(), 1u64.to_be_bytes());
    }
}
