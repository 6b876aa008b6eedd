//! Application-side interface consumed by in-process clients.

use crate::types::{
    RequestCheckTx, RequestDeliverTx, ResponseCheckTx, ResponseCommit, ResponseDeliverTx,
};

/// The state machine behind a client.
///
/// Implementations must be safe to call from the client's dispatch thread
/// while other threads enqueue requests.
pub trait Application: Send + Sync + 'static {
    /// Judges a transaction's validity prior to block inclusion.
    fn check_tx(&self, req: &RequestCheckTx) -> ResponseCheckTx;

    /// Executes a transaction against application state.
    fn deliver_tx(&self, req: &RequestDeliverTx) -> ResponseDeliverTx;

    /// Persists the current state and returns its digest.
    fn commit(&self) -> ResponseCommit;
}
