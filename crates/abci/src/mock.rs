//! Scripted client for failure-injection tests.
//!
//! Records every enqueued request and performs no dispatch of its own: the
//! test primes responses and drives the global callback by hand, including
//! deliberately skipping responses to simulate an application dropping
//! them.

use crate::client::{Client, ClientError, ResponseCallback};
use crate::reqres::ReqRes;
use crate::types::{
    Request, RequestCheckTx, RequestDeliverTx, Response, ResponseCheckTx, ResponseCommit,
    ResponseDeliverTx,
};
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;

/// Client whose behavior is fully scripted by the test.
#[derive(Default)]
pub struct MockClient {
    requests: Mutex<Vec<Arc<ReqRes>>>,
    callback: RwLock<Option<ResponseCallback>>,
    next_check_tx: Mutex<Option<ResponseCheckTx>>,
    error: Mutex<Option<ClientError>>,
}

impl MockClient {
    /// Creates an empty mock.
    pub fn new() -> Self {
        Self::default()
    }

    /// Primes the response attached to subsequent `check_tx_async` calls.
    /// The response is recorded on the returned [`ReqRes`] without firing
    /// any callback, so per-request callbacks attached afterwards fire
    /// immediately while the global callback stays silent.
    pub fn prime_check_tx(&self, response: ResponseCheckTx) {
        *self.next_check_tx.lock() = Some(response);
    }

    /// Clears any primed check-tx response; later requests stay pending.
    pub fn clear_primed(&self) {
        self.next_check_tx.lock().take();
    }

    /// Every request enqueued so far, in order.
    pub fn requests(&self) -> Vec<Arc<ReqRes>> {
        self.requests.lock().clone()
    }

    /// The check-tx requests of the given kind enqueued so far.
    pub fn check_tx_requests(&self, kind: crate::types::CheckTxKind) -> Vec<RequestCheckTx> {
        self.requests
            .lock()
            .iter()
            .filter_map(|rr| match rr.request() {
                Request::CheckTx(req) if req.kind == kind => Some(req.clone()),
                _ => None,
            })
            .collect()
    }

    /// The global response callback installed by the subsystem under test.
    pub fn response_callback(&self) -> Option<ResponseCallback> {
        self.callback.read().clone()
    }

    /// Delivers a response through the global callback, exactly as a
    /// dispatch thread would for a response the application did not drop.
    pub fn deliver(&self, req: &Request, res: &Response) {
        if let Some(cb) = self.response_callback() {
            cb(req, res);
        }
    }

    /// Injects a transport error to be returned by [`Client::error`].
    pub fn set_error(&self, err: ClientError) {
        *self.error.lock() = Some(err);
    }

    fn record(&self, request: Request) -> Arc<ReqRes> {
        let reqres = Arc::new(ReqRes::new(request));
        self.requests.lock().push(Arc::clone(&reqres));
        reqres
    }
}

impl Client for MockClient {
    fn check_tx_async(&self, req: RequestCheckTx) -> Arc<ReqRes> {
        let reqres = self.record(Request::CheckTx(req));
        if let Some(res) = self.next_check_tx.lock().clone() {
            reqres.set_response(Response::CheckTx(res));
        }
        reqres
    }

    fn flush_async(&self) -> Arc<ReqRes> {
        let reqres = self.record(Request::Flush);
        reqres.set_response(Response::Flush);
        reqres
    }

    fn deliver_tx_sync(&self, _req: RequestDeliverTx) -> Result<ResponseDeliverTx, ClientError> {
        Ok(ResponseDeliverTx::default())
    }

    fn commit_sync(&self) -> Result<ResponseCommit, ClientError> {
        Ok(ResponseCommit::default())
    }

    fn flush_sync(&self) -> Result<(), ClientError> {
        Ok(())
    }

    fn set_response_callback(&self, cb: ResponseCallback) {
        *self.callback.write() = Some(cb);
    }

    fn error(&self) -> Option<ClientError> {
        self.error.lock().clone()
    }

    fn stop(&self) {}
}
