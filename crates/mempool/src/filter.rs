//! Admission filters applied around the application's CheckTx.
//!
//! A precheck runs before the app probe and short-circuits admission; a
//! postcheck runs on the app's response and can veto an otherwise accepted
//! transaction. Both are replaceable on every `update`, letting consensus
//! track changing block limits.

use forgecore_abci::ResponseCheckTx;
use forgecore_types::Tx;
use std::sync::Arc;

/// Filter applied before the application probe.
pub type PreCheckFn = Arc<dyn Fn(&Tx) -> std::result::Result<(), String> + Send + Sync>;

/// Filter applied to the application's CheckTx response.
pub type PostCheckFn =
    Arc<dyn Fn(&Tx, &ResponseCheckTx) -> std::result::Result<(), String> + Send + Sync>;

/// Rejects transactions whose wire size exceeds `max_bytes`.
///
/// The wire size includes the length-delimited framing so the limit maps
/// one-to-one onto the block byte budget.
pub fn pre_check_max_bytes(max_bytes: u64) -> PreCheckFn {
    Arc::new(move |tx: &Tx| {
        let size = tx.wire_size() as u64;
        if size > max_bytes {
            return Err(format!(
                "tx size {} exceeds block limit {}",
                size, max_bytes
            ));
        }
        Ok(())
    })
}

/// Rejects responses wanting more gas than `max_gas`. Negative means
/// unlimited.
pub fn post_check_max_gas(max_gas: i64) -> PostCheckFn {
    Arc::new(move |_tx: &Tx, res: &ResponseCheckTx| {
        if max_gas > -1 && res.gas_wanted > max_gas {
            return Err(format!(
                "gas wanted {} exceeds block limit {}",
                res.gas_wanted, max_gas
            ));
        }
        Ok(())
    })
}
